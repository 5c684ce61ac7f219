use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::layouts::BspTree;
use crate::models::WindowId;

/// A workspace: an ordered tiled set (owned by its BSP tree), a floating
/// set, and the monitor currently hosting it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Workspace {
    pub index: usize,
    pub label: String,
    pub tree: BspTree,
    pub floating: HashSet<WindowId>,
    pub monitor: usize,
    pub visible: bool,
}

impl Workspace {
    #[must_use]
    pub fn new(index: usize, label: &str, monitor: usize) -> Self {
        Self {
            index,
            label: label.to_string(),
            tree: BspTree::default(),
            floating: HashSet::new(),
            monitor,
            visible: false,
        }
    }

    /// Every window hosted here, tiled first in layout order.
    #[must_use]
    pub fn windows(&self) -> Vec<WindowId> {
        let mut all = self.tree.windows();
        all.extend(self.floating.iter().copied());
        all
    }

    #[must_use]
    pub fn contains(&self, id: WindowId) -> bool {
        self.floating.contains(&id) || self.tree.contains(id)
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        !self.tree.is_empty() || !self.floating.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Xyhw;

    #[test]
    fn occupancy_counts_tiled_and_floating() {
        let mut ws = Workspace::new(1, "dev", 0);
        assert!(!ws.is_occupied());

        ws.tree.insert(10, None, Xyhw::new(0, 0, 800, 600));
        assert!(ws.is_occupied());
        assert!(ws.contains(10));

        ws.tree.remove(10);
        ws.floating.insert(11);
        assert!(ws.is_occupied());
        assert!(ws.contains(11));
        assert!(!ws.contains(10));
    }
}
