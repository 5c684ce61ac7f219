use serde::{Deserialize, Serialize};

use crate::models::Xyhw;

/// Per-edge pixel reservations claimed by dock windows, in root coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Strut {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Strut {
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            left: self.left.max(other.left),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A physical output and the workspaces assigned to it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Monitor {
    pub id: usize,
    pub rect: Xyhw,
    /// Ordered workspace indices hosted here.
    pub workspaces: Vec<usize>,
    /// Combined reservation of all docks on this monitor.
    pub strut: Strut,
}

impl Monitor {
    #[must_use]
    pub fn new(id: usize, rect: Xyhw) -> Self {
        Self {
            id,
            rect,
            workspaces: Vec::new(),
            strut: Strut::default(),
        }
    }

    /// The monitor rect minus dock reservations. The layout shrinks this
    /// further by the outer gap.
    #[must_use]
    pub fn usable_rect(&self) -> Xyhw {
        self.rect.without_struts(
            self.strut.left,
            self.strut.right,
            self.strut.top,
            self.strut.bottom,
        )
    }
}
