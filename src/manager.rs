//! Ties the state engine to a display server and the child-process table.
use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, Arc};

use crate::command::{parse_command, Command};
use crate::config;
use crate::display_servers::DisplayServer;
use crate::errors::{MywmError, Result};
use crate::state::State;
use crate::utils::child_process::{self, Children};

/// Maintains current program state.
pub struct Manager<SERVER> {
    pub state: State,
    pub display_server: SERVER,
    pub children: Children,
    pub reap_requested: Arc<AtomicBool>,
    pub reload_requested: bool,
    pub config_path: PathBuf,
}

impl<SERVER: DisplayServer> Manager<SERVER> {
    pub fn new(display_server: SERVER, config_path: PathBuf) -> Self {
        Self {
            state: State::new(display_server.monitors()),
            display_server,
            children: Children::new(),
            reap_requested: Arc::default(),
            reload_requested: false,
            config_path,
        }
    }

    pub fn register_child_hook(&self) {
        child_process::register_child_hook(self.reap_requested.clone());
    }

    /// Drain queued display actions. Action responses (frame creation) are
    /// fed straight back through the event handler.
    pub fn update_display(&mut self) {
        while let Some(act) = self.state.actions.pop_front() {
            if let Some(event) = self.display_server.execute_action(act) {
                self.display_event_handler(event);
            }
        }
        self.display_server.flush();
    }

    /// Parse and run one protocol line (key bindings, config replay).
    pub fn dispatch_line(&mut self, line: &str) -> Result<()> {
        let command = parse_command(line)?;
        self.command_handler(&command)
    }

    /// Execute one IPC request and produce its reply line.
    pub async fn exec_request(&mut self, line: &str) -> String {
        let result = match parse_command(line) {
            // Reload needs to await the config source; everything else is
            // synchronous on the reactor.
            Ok(Command::ReloadConfig) => self.reload().await,
            Ok(command) => self.command_handler(&command),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => "OK".to_string(),
            Err(err) => format!("ERR {}", err.reply_reason()),
        }
    }

    /// Run the config source once, feeding its lines through the command
    /// dispatcher. Lines that fail to apply are logged and skipped; a
    /// non-zero exit from the source is reported after the rest applied.
    pub async fn run_config(&mut self) -> Result<()> {
        let run = config::run_once(&self.config_path).await?;
        for line in &run.lines {
            match parse_command(line) {
                // A config that asks for its own replay would recurse.
                Ok(Command::ReloadConfig) => {
                    tracing::warn!("ignoring reload-config inside the config source");
                }
                Ok(command) => {
                    if let Err(err) = self.command_handler(&command) {
                        tracing::warn!("config line {line:?} failed: {err}");
                    }
                }
                Err(err) => tracing::warn!("config line {line:?} rejected: {err}"),
            }
        }
        match run.failed {
            Some(code) => Err(MywmError::ConfigExit(code)),
            None => Ok(()),
        }
    }

    /// `reload-config`: reset mutable configuration, then replay.
    pub async fn reload(&mut self) -> Result<()> {
        self.state.reset_config();
        self.run_config().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use crate::display_servers::MockDisplayServer;
    use crate::models::Xyhw;
    use crate::utils::test::temp_path;

    async fn write_config(content: &str) -> PathBuf {
        let path = temp_path().await.unwrap();
        tokio::fs::write(&path, content).await.unwrap();
        let mut perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        perms.set_mode(0o755);
        tokio::fs::set_permissions(&path, perms).await.unwrap();
        path
    }

    fn manager(config_path: PathBuf) -> Manager<MockDisplayServer> {
        let server = MockDisplayServer::new(vec![Xyhw::new(0, 0, 1000, 800)]);
        Manager::new(server, config_path)
    }

    #[tokio::test]
    async fn reload_replaces_bindings_from_a_reset_slate() {
        let config = write_config("#!/bin/sh\necho 'bind Mod4-q \"spawn foo\"'\n").await;
        let mut m = manager(config);

        // the pre-reload binding must not survive the reset
        m.dispatch_line("bind Mod4-q close").unwrap();
        m.dispatch_line("set-gap 12").unwrap();

        m.reload().await.unwrap();
        assert_eq!(m.state.config.keybinds.len(), 1);
        assert_eq!(
            m.state.config.keybinds.values().next().unwrap(),
            "spawn foo"
        );
        assert_eq!(m.state.config.gap, 0, "gap resets to the default");
        assert!(m
            .state
            .actions
            .iter()
            .any(|a| matches!(a, crate::DisplayAction::UngrabAll)));
    }

    #[tokio::test]
    async fn failing_config_keeps_the_lines_that_applied() {
        let config = write_config("#!/bin/sh\necho 'set-gap 8'\nexit 2\n").await;
        let mut m = manager(config);

        let err = m.reload().await.unwrap_err();
        assert_eq!(err.reply_reason(), "config 2");
        assert_eq!(m.state.config.gap, 8);
    }

    #[tokio::test]
    async fn exec_request_replies_ok_and_err() {
        let config = write_config("#!/bin/sh\n").await;
        let mut m = manager(config);

        assert_eq!(m.exec_request("set-gap 4").await, "OK");
        assert_eq!(m.exec_request("view ws 99").await, "ERR unknown-workspace");
        assert_eq!(m.exec_request("frobnicate").await, "ERR unknown");
        assert_eq!(m.exec_request("reload-config").await, "OK");
    }
}
