use crate::models::{Strut, WindowId, Xyhw};
use crate::utils::modmask_lookup::ModMask;

/// What the display server learned about a client asking to be mapped.
#[derive(Debug, Clone, Default)]
pub struct WindowSpec {
    pub id: WindowId,
    pub class: Option<String>,
    pub title: Option<String>,
    pub pid: Option<u32>,
    /// Dialog/transient clients start floating.
    pub hint_floating: bool,
    /// The geometry the client asked for before mapping.
    pub requested: Option<Xyhw>,
}

/// Events flowing from the display server into the reactor.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    WindowCreate(WindowSpec),
    WindowDestroy(WindowId),
    /// The frame allocated for a client during adoption.
    FrameCreated { client: WindowId, frame: u32 },
    KeyCombo(ModMask, u32),
    ButtonCombo(ModMask, u8),
    /// The pointer entered a managed window (focus follows).
    EnterWindow(WindowId),
    /// A dock published or updated its reserved screen edge.
    StrutUpdate(WindowId, Strut),
    StrutRemove(WindowId),
}
