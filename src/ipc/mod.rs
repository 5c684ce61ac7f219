//! The control socket: line-oriented requests in, JSON event lines out.
//!
//! Every connected client is a subscriber. Requests are forwarded into the
//! reactor's bounded command queue; replies and broadcasts travel through a
//! per-client outbound channel so a client always sees its `OK` before the
//! events its command caused. A client whose outbound channel fills up is
//! dropped rather than ever blocking the reactor.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{unix::OwnedWriteHalf, UnixListener, UnixStream};
use tokio::sync::mpsc;

use crate::errors::Result;

/// Capacity of the reactor's command queue.
const REQUEST_QUEUE: usize = 64;

/// Outbound lines buffered per client before it is considered stuck.
const CLIENT_BUFFER: usize = 256;

pub type ClientId = u64;

/// One request line read from a client.
#[derive(Debug)]
pub struct IpcRequest {
    pub client: ClientId,
    pub line: String,
}

type Clients = Arc<Mutex<HashMap<ClientId, mpsc::Sender<String>>>>;

pub struct IpcServer {
    clients: Clients,
    accept_task: tokio::task::JoinHandle<()>,
    socket_file: PathBuf,
}

/// The control socket path: `$XDG_RUNTIME_DIR/mywm.sock`, falling back to
/// `/tmp/mywm.sock`.
#[must_use]
pub fn socket_file() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(|dir| Path::new(&dir).join("mywm.sock"))
        .unwrap_or_else(|| PathBuf::from("/tmp/mywm.sock"))
}

impl IpcServer {
    /// Bind the socket (unlinking a stale one) and start accepting.
    /// Returns the server handle and the reactor's request queue.
    pub async fn listen(socket_file: PathBuf) -> Result<(Self, mpsc::Receiver<IpcRequest>)> {
        Self::listen_with(socket_file, CLIENT_BUFFER).await
    }

    pub(crate) async fn listen_with(
        socket_file: PathBuf,
        client_buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<IpcRequest>)> {
        let listener = match UnixListener::bind(&socket_file) {
            Ok(listener) => listener,
            Err(_) => {
                tokio::fs::remove_file(&socket_file).await?;
                UnixListener::bind(&socket_file)?
            }
        };
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
        let clients: Clients = Arc::default();

        let accept_clients = clients.clone();
        let accept_task = tokio::spawn(async move {
            let mut next_id: ClientId = 0;
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        let id = next_id;
                        next_id += 1;
                        serve_client(id, stream, &accept_clients, &request_tx, client_buffer);
                    }
                    Err(e) => tracing::error!("accept failed = {:?}", e),
                }
            }
        });

        Ok((
            Self {
                clients,
                accept_task,
                socket_file,
            },
            request_rx,
        ))
    }

    /// Queue a reply line for one client. The per-client channel keeps it
    /// ordered before any broadcast that follows.
    pub fn reply(&self, client: ClientId, line: &str) {
        let mut clients = self.clients.lock().expect("ipc client table poisoned");
        if let Some(tx) = clients.get(&client) {
            if tx.try_send(format!("{line}\n")).is_err() {
                clients.remove(&client);
            }
        }
    }

    /// Fan one event line out to every subscriber. Clients that cannot keep
    /// up are dropped; the reactor never blocks here.
    pub fn broadcast(&self, line: &str) {
        let mut clients = self.clients.lock().expect("ipc client table poisoned");
        clients.retain(|_, tx| tx.try_send(line.to_string()).is_ok());
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.lock().expect("ipc client table poisoned").len()
    }

    /// Explicitly shutdown the server to perform cleanup.
    pub async fn shutdown(&mut self) {
        self.accept_task.abort();
        let _ = (&mut self.accept_task).await;
        self.clients
            .lock()
            .expect("ipc client table poisoned")
            .clear();
        tokio::fs::remove_file(&self.socket_file).await.ok();
    }
}

fn serve_client(
    id: ClientId,
    stream: UnixStream,
    clients: &Clients,
    request_tx: &mpsc::Sender<IpcRequest>,
    client_buffer: usize,
) {
    let (read_half, write_half) = stream.into_split();
    let (out_tx, out_rx) = mpsc::channel::<String>(client_buffer);
    clients
        .lock()
        .expect("ipc client table poisoned")
        .insert(id, out_tx);

    tokio::spawn(write_loop(out_rx, write_half));

    let clients = clients.clone();
    let request_tx = request_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if request_tx.send(IpcRequest { client: id, line }).await.is_err() {
                break;
            }
        }
        // disconnected: drop the outbound channel so the writer stops
        clients.lock().expect("ipc client table poisoned").remove(&id);
    });
}

async fn write_loop(mut out_rx: mpsc::Receiver<String>, mut write_half: OwnedWriteHalf) {
    while let Some(line) = out_rx.recv().await {
        if write_half.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
    let _ = write_half.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WmEvent;
    use crate::utils::test::temp_path;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    async fn bound_server(buffer: usize) -> (IpcServer, mpsc::Receiver<IpcRequest>, PathBuf) {
        let path = temp_path().await.unwrap();
        let (server, rx) = IpcServer::listen_with(path.clone(), buffer).await.unwrap();
        (server, rx, path)
    }

    #[tokio::test]
    async fn replies_come_before_the_events_they_caused() {
        let (server, mut requests, path) = bound_server(16).await;

        let mut client = BufReader::new(UnixStream::connect(&path).await.unwrap());
        client.get_mut().write_all(b"togglebar\n").await.unwrap();

        let request = requests.recv().await.unwrap();
        assert_eq!(request.line, "togglebar");

        // what the reactor does: reply first, then broadcast
        server.reply(request.client, "OK");
        server.broadcast(&WmEvent::BarToggle { visible: false }.to_line());

        let mut line = String::new();
        client.read_line(&mut line).await.unwrap();
        assert_eq!(line, "OK\n");
        line.clear();
        client.read_line(&mut line).await.unwrap();
        assert_eq!(
            line,
            "{\"event\":\"bar-toggle\",\"payload\":{\"visible\":false}}\n"
        );

        drop(server);
    }

    #[tokio::test]
    async fn every_subscriber_receives_broadcasts() {
        let (server, _requests, path) = bound_server(16).await;

        let mut first = BufReader::new(UnixStream::connect(&path).await.unwrap());
        let mut second = BufReader::new(UnixStream::connect(&path).await.unwrap());
        // wait for both to be registered
        while server.client_count() < 2 {
            tokio::task::yield_now().await;
        }

        let event = WmEvent::Workspace {
            active: 1,
            occupied: vec![1],
        }
        .to_line();
        server.broadcast(&event);

        for client in [&mut first, &mut second] {
            let mut line = String::new();
            client.read_line(&mut line).await.unwrap();
            assert_eq!(line, event);
        }

        drop(server);
    }

    #[tokio::test]
    async fn a_subscriber_that_never_reads_is_dropped() {
        let (server, _requests, path) = bound_server(2).await;

        let _stuck = UnixStream::connect(&path).await.unwrap();
        let mut live = BufReader::new(UnixStream::connect(&path).await.unwrap());
        while server.client_count() < 2 {
            tokio::task::yield_now().await;
        }

        // Enough large lines to fill the stuck client's socket buffer and
        // then its bounded channel; the live client keeps reading.
        let big = format!("{}\n", "x".repeat(64 * 1024));
        let reader = tokio::spawn(async move {
            let mut got = 0;
            let mut line = String::new();
            while got < 64 {
                line.clear();
                if live.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                got += 1;
            }
            got
        });
        for _ in 0..64 {
            server.broadcast(&big);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(server.client_count(), 1, "the stuck client was dropped");
        assert_eq!(reader.await.unwrap(), 64, "the live client got every line");

        drop(server);
    }

    #[tokio::test]
    async fn socket_cleanup() {
        let (mut server, _requests, path) = bound_server(16).await;
        assert!(path.exists());
        server.shutdown().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn socket_already_bound() {
        let path = temp_path().await.unwrap();
        let (old, _old_rx) = IpcServer::listen_with(path.clone(), 16).await.unwrap();

        // a stale socket file is unlinked and rebound
        let (mut server, _rx) = IpcServer::listen(path.clone()).await.unwrap();
        server.shutdown().await;
        assert!(!path.exists());

        drop(old);
    }
}
