use serde::{Deserialize, Serialize};

use crate::models::WindowId;

/// A named scratchpad registration: `scratch <name>:<spawn-command>`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScratchPad {
    pub name: String,
    pub spawn: String,
}

/// A scratchpad whose command has been launched. The window is matched on
/// adoption by `_NET_WM_PID` against the child's pid.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ActiveScratchPad {
    pub pid: Option<u32>,
    pub window: Option<WindowId>,
    pub shown: bool,
}
