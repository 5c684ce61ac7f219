//! Routes display-server events into state mutations.
use crate::display_servers::DisplayServer;
use crate::manager::Manager;
use crate::DisplayEvent;

impl<SERVER: DisplayServer> Manager<SERVER> {
    pub fn display_event_handler(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::WindowCreate(spec) => self.state.adopt(spec),
            DisplayEvent::WindowDestroy(id) => self.state.remove_window(id),
            DisplayEvent::FrameCreated { client, frame } => self.state.attach_frame(client, frame),
            DisplayEvent::EnterWindow(id) => {
                if self.state.windows.contains_key(&id) {
                    self.state.focus_window(Some(id));
                }
            }
            DisplayEvent::KeyCombo(mods, keysym) => {
                // Unknown combos are ignored silently.
                if let Some(command) = self.state.lookup_key(mods, keysym) {
                    if let Err(err) = self.dispatch_line(&command) {
                        tracing::warn!("bound command {command:?} failed: {err}");
                    }
                }
            }
            DisplayEvent::ButtonCombo(mods, button) => {
                if let Some(command) = self.state.lookup_button(mods, button) {
                    if let Err(err) = self.dispatch_line(&command) {
                        tracing::warn!("bound command {command:?} failed: {err}");
                    }
                }
            }
            DisplayEvent::StrutUpdate(dock, strut) => self.state.update_strut(dock, strut),
            DisplayEvent::StrutRemove(dock) => self.state.remove_strut(dock),
        }
    }
}
