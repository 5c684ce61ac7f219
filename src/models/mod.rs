mod dto;
mod frame;
mod monitor;
mod rule;
mod scratchpad;
mod window;
mod workspace;
mod xyhw;

pub use dto::WmEvent;
pub use frame::{hex_color_pixel, sanitize_hex_color, Frame, FrameAppearance};
pub use monitor::{Monitor, Strut};
pub use rule::{first_match, Area, Rule};
pub use scratchpad::{ActiveScratchPad, ScratchPad};
pub use window::{Window, WindowId};
pub use workspace::Workspace;
pub use xyhw::{Axis, Xyhw};
