use crate::models::{FrameAppearance, WindowId, Xyhw};
use crate::utils::modmask_lookup::ModMask;

/// Actions queued by the state engine for the display server to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayAction {
    /// Allocate a decoration window and reparent the client into it.
    /// The server answers with [`DisplayEvent::FrameCreated`].
    ///
    /// [`DisplayEvent::FrameCreated`]: crate::DisplayEvent::FrameCreated
    CreateFrame { window: WindowId, geometry: Xyhw },
    /// Reparent the client back to the root and destroy the frame.
    DestroyFrame { window: WindowId },
    /// Configure the frame and the inset client, then redraw borders.
    /// `borderless` collapses both borders (fullscreen).
    MoveResizeFrame {
        window: WindowId,
        geometry: Xyhw,
        borderless: bool,
    },
    MapFrame(WindowId),
    UnmapFrame(WindowId),
    /// Give input focus and update `_NET_ACTIVE_WINDOW`.
    FocusWindow(WindowId),
    /// Ask the client to close via `WM_DELETE_WINDOW`.
    CloseWindow(WindowId),
    /// Raise a frame to the top of the stack.
    Raise(WindowId),
    /// New border widths/colors; redraw every live frame.
    SetAppearance(FrameAppearance),
    GrabKey { mods: ModMask, keysym: u32 },
    GrabButton { mods: ModMask, button: u8 },
    /// Drop every key and button grab (config reload).
    UngrabAll,
    SetCurrentDesktop(usize),
    SetDesktopNames(Vec<String>),
}
