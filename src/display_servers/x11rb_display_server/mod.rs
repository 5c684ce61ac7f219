//! The real display server: x11rb over a Unix socket, with a mio-based
//! readability notifier feeding the reactor.
mod event_translate;
mod xatom;
mod xwrap;

use std::future::Future;
use std::pin::Pin;

use super::DisplayServer;
use crate::display_action::DisplayAction;
use crate::errors::Result;
use crate::models::Xyhw;
use crate::DisplayEvent;
use xwrap::XWrap;

pub struct X11rbDisplayServer {
    xw: XWrap,
}

impl X11rbDisplayServer {
    /// Connect and take ownership of the root window.
    ///
    /// # Errors
    ///
    /// Fails when the display is unreachable or another window manager is
    /// already running.
    pub fn new() -> Result<Self> {
        let mut xw = XWrap::new()?;
        xw.init()?;
        Ok(Self { xw })
    }

    fn run_action(&mut self, act: DisplayAction) -> Result<Option<DisplayEvent>> {
        match act {
            DisplayAction::CreateFrame { window, geometry } => {
                let frame = self.xw.create_frame(window, geometry)?;
                return Ok(Some(DisplayEvent::FrameCreated { client: window, frame }));
            }
            DisplayAction::DestroyFrame { window } => self.xw.teardown_frame(window)?,
            DisplayAction::MoveResizeFrame {
                window,
                geometry,
                borderless,
            } => self.xw.move_resize_frame(window, geometry, borderless)?,
            DisplayAction::MapFrame(window) => self.xw.map_frame(window)?,
            DisplayAction::UnmapFrame(window) => self.xw.unmap_frame(window)?,
            DisplayAction::FocusWindow(window) => self.xw.focus(window)?,
            DisplayAction::CloseWindow(window) => self.xw.close(window)?,
            DisplayAction::Raise(window) => self.xw.raise_frame(window)?,
            DisplayAction::SetAppearance(appearance) => self.xw.set_appearance(appearance)?,
            DisplayAction::GrabKey { mods, keysym } => self.xw.grab_key(mods, keysym)?,
            DisplayAction::GrabButton { mods, button } => self.xw.grab_button(mods, button)?,
            DisplayAction::UngrabAll => self.xw.ungrab_all()?,
            DisplayAction::SetCurrentDesktop(desktop) => self.xw.set_current_desktop(desktop)?,
            DisplayAction::SetDesktopNames(names) => self.xw.set_desktop_names(&names)?,
        }
        Ok(None)
    }
}

impl DisplayServer for X11rbDisplayServer {
    fn get_next_events(&mut self) -> Vec<DisplayEvent> {
        let mut events = Vec::new();
        while let Some(raw) = self.xw.poll_event() {
            if let Some(event) = event_translate::translate(raw, &mut self.xw) {
                events.push(event);
            }
        }
        events
    }

    fn execute_action(&mut self, act: DisplayAction) -> Option<DisplayEvent> {
        match self.run_action(act) {
            Ok(event) => event,
            Err(err) => {
                tracing::error!("display action failed: {err}");
                None
            }
        }
    }

    fn wait_readable(&self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let task_notify = self.xw.task_notify.clone();
        Box::pin(async move {
            task_notify.notified().await;
        })
    }

    fn monitors(&self) -> Vec<Xyhw> {
        self.xw.monitors()
    }

    fn alive(&self) -> bool {
        self.xw.alive
    }

    fn flush(&self) {
        self.xw.flush();
    }
}
