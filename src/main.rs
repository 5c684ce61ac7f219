use mywm::config;
use mywm::display_servers::X11rbDisplayServer;
use mywm::ipc::{self, IpcServer};
use mywm::Manager;

fn main() {
    mywm::logging::setup_logging();
    tracing::info!("mywm booting");

    let rt = tokio::runtime::Runtime::new().expect("ERROR: couldn't init Tokio runtime");
    let _rt_guard = rt.enter();

    let display_server = match X11rbDisplayServer::new() {
        Ok(server) => server,
        Err(err) => {
            tracing::error!("cannot take over the display: {err}");
            std::process::exit(1);
        }
    };

    let config_path = match config::config_file() {
        Ok(path) => path,
        Err(err) => {
            tracing::error!("cannot resolve the config path: {err}");
            std::process::exit(1);
        }
    };

    let manager = Manager::new(display_server, config_path.clone());
    manager.register_child_hook();

    rt.block_on(async move {
        let (ipc, requests) = match IpcServer::listen(ipc::socket_file()).await {
            Ok(bound) => bound,
            Err(err) => {
                tracing::error!("cannot bind the control socket: {err}");
                std::process::exit(1);
            }
        };
        let reloads = config::spawn_watcher(config_path);
        manager.event_loop(ipc, requests, reloads).await;
    });
}
