//! The reactor: one task serializing X events, IPC requests and config
//! reloads over the state engine.
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;

use crate::display_servers::DisplayServer;
use crate::ipc::{IpcRequest, IpcServer};
use crate::manager::Manager;

impl<SERVER: DisplayServer> Manager<SERVER> {
    pub async fn event_loop(
        mut self,
        mut ipc: IpcServer,
        mut requests: mpsc::Receiver<IpcRequest>,
        mut reloads: mpsc::UnboundedReceiver<()>,
    ) {
        // Replay the configuration before the first event.
        if let Err(err) = self.run_config().await {
            tracing::warn!("initial config run failed: {err}");
        }
        self.update_display();
        self.flush_events(&ipc);

        while self.state.running && self.display_server.alive() {
            tokio::select! {
                _ = self.display_server.wait_readable() => {
                    for event in self.display_server.get_next_events() {
                        self.display_event_handler(event);
                    }
                }
                Some(request) = requests.recv() => {
                    let reply = self.exec_request(&request.line).await;
                    // The reply goes through the same per-client queue as
                    // events, so each client sees it before what follows.
                    ipc.reply(request.client, &reply);
                }
                Some(()) = reloads.recv() => {
                    if let Err(err) = self.reload().await {
                        tracing::warn!("config reload failed: {err}");
                    }
                }
            }

            // A key binding may have asked for a reload mid-dispatch.
            if self.reload_requested {
                self.reload_requested = false;
                if let Err(err) = self.reload().await {
                    tracing::warn!("config reload failed: {err}");
                }
            }

            self.update_display();
            self.flush_events(&ipc);

            if self.reap_requested.swap(false, Ordering::SeqCst) {
                self.children.remove_finished_children();
            }
        }

        // Orderly shutdown: hand every client back to the root, close the
        // subscribers, remove the socket.
        if self.state.running {
            // the connection died rather than a `quit` command
            self.state.begin_shutdown();
        }
        self.update_display();
        ipc.shutdown().await;
        tracing::info!("mywm shut down");
    }

    fn flush_events(&mut self, ipc: &IpcServer) {
        while let Some(event) = self.state.events.pop_front() {
            ipc.broadcast(&event.to_line());
        }
    }
}
