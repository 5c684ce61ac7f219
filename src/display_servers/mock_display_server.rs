//! A display server that records actions instead of talking to X.
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use super::DisplayServer;
use crate::display_action::DisplayAction;
use crate::models::Xyhw;
use crate::DisplayEvent;

/// Frame ids handed out by the mock are the client id plus this offset.
pub const MOCK_FRAME_OFFSET: u32 = 0x0100_0000;

pub struct MockDisplayServer {
    pub screens: Vec<Xyhw>,
    /// Every action the state engine issued, in order.
    pub actions: Vec<DisplayAction>,
    /// Events for the next `get_next_events` call; tests push here.
    pub queued: VecDeque<DisplayEvent>,
}

impl MockDisplayServer {
    #[must_use]
    pub fn new(screens: Vec<Xyhw>) -> Self {
        Self {
            screens,
            actions: Vec::new(),
            queued: VecDeque::new(),
        }
    }
}

impl DisplayServer for MockDisplayServer {
    fn get_next_events(&mut self) -> Vec<DisplayEvent> {
        self.queued.drain(..).collect()
    }

    fn execute_action(&mut self, act: DisplayAction) -> Option<DisplayEvent> {
        let response = match &act {
            DisplayAction::CreateFrame { window, .. } => Some(DisplayEvent::FrameCreated {
                client: *window,
                frame: *window + MOCK_FRAME_OFFSET,
            }),
            _ => None,
        };
        self.actions.push(act);
        response
    }

    fn wait_readable(&self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(std::future::pending())
    }

    fn monitors(&self) -> Vec<Xyhw> {
        self.screens.clone()
    }

    fn alive(&self) -> bool {
        true
    }

    fn flush(&self) {}
}
