#[cfg(test)]
mod mock_display_server;
mod x11rb_display_server;

use std::future::Future;
use std::pin::Pin;

#[cfg(test)]
pub use mock_display_server::MockDisplayServer;
pub use x11rb_display_server::X11rbDisplayServer;

use crate::display_action::DisplayAction;
use crate::models::Xyhw;
use crate::DisplayEvent;

/// The seam between the state engine and the X server.
///
/// Implementations never hold state-engine references; the reactor shuttles
/// events one way and actions the other.
pub trait DisplayServer {
    /// Drain every event the server has ready. Never blocks.
    fn get_next_events(&mut self) -> Vec<DisplayEvent>;

    /// Perform one queued action. May answer with a follow-up event
    /// (frame creation reports the allocated frame window).
    fn execute_action(&mut self, act: DisplayAction) -> Option<DisplayEvent>;

    /// Resolves once the connection may have events to read.
    fn wait_readable(&self) -> Pin<Box<dyn Future<Output = ()> + Send>>;

    /// Monitor rectangles in root coordinates, in id order.
    fn monitors(&self) -> Vec<Xyhw>;

    /// False once the connection is lost; the reactor shuts down.
    fn alive(&self) -> bool;

    fn flush(&self);
}
