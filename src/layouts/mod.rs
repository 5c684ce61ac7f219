//! The binary-space-partitioning tree backing each workspace's tiled set.
//!
//! Nodes live in a `Vec` arena addressed by index; leaves carry window ids.
//! Removal collapses the leaf's parent into its sibling, insertion splits a
//! leaf along the longer dimension of its current rectangle.
use serde::{Deserialize, Serialize};

use crate::models::{Axis, WindowId, Xyhw};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
enum NodeKind {
    Split {
        axis: Axis,
        ratio: f32,
        first: usize,
        second: usize,
    },
    Leaf {
        window: WindowId,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
struct Node {
    parent: Option<usize>,
    kind: NodeKind,
}

/// Where a leaf sat before removal, so a float toggle can put the window
/// back into the exact split it came out of.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LeafSlot {
    /// Path from the root to the split that was collapsed away.
    pub path: Vec<Side>,
    pub axis: Axis,
    pub ratio: f32,
    /// Which side of that split the leaf occupied.
    pub side: Side,
}

/// A per-workspace BSP arena. Leaves correspond 1-to-1 with tiled windows.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BspTree {
    nodes: Vec<Option<Node>>,
    root: Option<usize>,
    free: Vec<usize>,
}

impl BspTree {
    fn alloc(&mut self, node: Node) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx] = None;
        self.free.push(idx);
    }

    fn node(&self, idx: usize) -> &Node {
        self.nodes[idx].as_ref().expect("dangling bsp node index")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        self.nodes[idx].as_mut().expect("dangling bsp node index")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows().len()
    }

    #[must_use]
    pub fn contains(&self, window: WindowId) -> bool {
        self.leaf_of(window).is_some()
    }

    /// The tiled windows in layout order (in-order leaf traversal).
    #[must_use]
    pub fn windows(&self) -> Vec<WindowId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_windows(root, &mut out);
        }
        out
    }

    fn collect_windows(&self, idx: usize, out: &mut Vec<WindowId>) {
        match &self.node(idx).kind {
            NodeKind::Leaf { window } => out.push(*window),
            NodeKind::Split { first, second, .. } => {
                let (first, second) = (*first, *second);
                self.collect_windows(first, out);
                self.collect_windows(second, out);
            }
        }
    }

    fn leaf_of(&self, window: WindowId) -> Option<usize> {
        self.nodes.iter().position(|n| {
            matches!(n, Some(Node { kind: NodeKind::Leaf { window: w }, .. }) if *w == window)
        })
    }

    /// The leftmost leaf. Ties for "first" always follow insertion order.
    fn first_leaf(&self) -> Option<usize> {
        let mut idx = self.root?;
        loop {
            match &self.node(idx).kind {
                NodeKind::Leaf { .. } => return Some(idx),
                NodeKind::Split { first, .. } => idx = *first,
            }
        }
    }

    #[must_use]
    pub fn first_window(&self) -> Option<WindowId> {
        let idx = self.first_leaf()?;
        match self.node(idx).kind {
            NodeKind::Leaf { window } => Some(window),
            NodeKind::Split { .. } => None,
        }
    }

    /// Insert `window` by splitting the leaf of `at` (falling back to the
    /// first leaf) along the longer dimension of its rectangle within
    /// `usable`. The new window takes the second half.
    pub fn insert(&mut self, window: WindowId, at: Option<WindowId>, usable: Xyhw) {
        let Some(target) = at.and_then(|id| self.leaf_of(id)).or_else(|| self.first_leaf()) else {
            let root = self.alloc(Node {
                parent: None,
                kind: NodeKind::Leaf { window },
            });
            self.root = Some(root);
            return;
        };

        let axis = self.rect_of(target, usable).longer_axis();
        self.split_leaf(target, window, axis, 0.5, Side::Second);
    }

    /// Turn the subtree at `target` into a split: a new leaf for `window`
    /// on `side`, the old subtree on the opposite side.
    fn split_leaf(&mut self, target: usize, window: WindowId, axis: Axis, ratio: f32, side: Side) {
        let old_kind = self.node(target).kind;
        let moved = self.alloc(Node {
            parent: Some(target),
            kind: old_kind,
        });
        self.reparent_children(moved);
        let leaf = self.alloc(Node {
            parent: Some(target),
            kind: NodeKind::Leaf { window },
        });
        let (first, second) = match side {
            Side::First => (leaf, moved),
            Side::Second => (moved, leaf),
        };
        self.node_mut(target).kind = NodeKind::Split {
            axis,
            ratio,
            first,
            second,
        };
    }

    /// Point the children of a split at its (possibly new) index.
    fn reparent_children(&mut self, idx: usize) {
        if let NodeKind::Split { first, second, .. } = self.node(idx).kind {
            self.node_mut(first).parent = Some(idx);
            self.node_mut(second).parent = Some(idx);
        }
    }

    /// Remove `window`, collapsing its parent split into the sibling.
    /// Returns the slot it vacated when it had a parent.
    pub fn remove(&mut self, window: WindowId) -> Option<LeafSlot> {
        let leaf = self.leaf_of(window)?;
        let Some(parent) = self.node(leaf).parent else {
            self.release(leaf);
            self.root = None;
            return None;
        };

        let NodeKind::Split {
            axis,
            ratio,
            first,
            second,
        } = self.node(parent).kind
        else {
            unreachable!("leaf parent is always a split");
        };
        let (side, sibling) = if first == leaf {
            (Side::First, second)
        } else {
            (Side::Second, first)
        };
        let slot = LeafSlot {
            path: self.path_to(parent),
            axis,
            ratio,
            side,
        };

        // Promote the sibling subtree into the parent's position.
        let sibling_kind = self.node(sibling).kind;
        self.node_mut(parent).kind = sibling_kind;
        self.reparent_children(parent);
        self.release(leaf);
        self.release(sibling);
        Some(slot)
    }

    fn path_to(&self, idx: usize) -> Vec<Side> {
        let mut path = Vec::new();
        let mut current = idx;
        while let Some(parent) = self.node(current).parent {
            match self.node(parent).kind {
                NodeKind::Split { first, .. } if first == current => path.push(Side::First),
                NodeKind::Split { .. } => path.push(Side::Second),
                NodeKind::Leaf { .. } => unreachable!("parent is always a split"),
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// Re-insert `window` into the slot returned by a previous [`remove`].
    /// Falls back to a plain insert when the tree has changed shape since.
    ///
    /// [`remove`]: BspTree::remove
    pub fn insert_at(&mut self, window: WindowId, slot: &LeafSlot, usable: Xyhw) {
        let Some(mut idx) = self.root else {
            self.insert(window, None, usable);
            return;
        };
        for side in &slot.path {
            match self.node(idx).kind {
                NodeKind::Split { first, second, .. } => {
                    idx = match side {
                        Side::First => first,
                        Side::Second => second,
                    };
                }
                NodeKind::Leaf { .. } => {
                    self.insert(window, None, usable);
                    return;
                }
            }
        }
        self.split_leaf(idx, window, slot.axis, slot.ratio, slot.side);
    }

    /// Exchange the windows of two leaves.
    pub fn swap(&mut self, a: WindowId, b: WindowId) -> bool {
        let (Some(la), Some(lb)) = (self.leaf_of(a), self.leaf_of(b)) else {
            return false;
        };
        if la == lb {
            return false;
        }
        self.node_mut(la).kind = NodeKind::Leaf { window: b };
        self.node_mut(lb).kind = NodeKind::Leaf { window: a };
        true
    }

    /// Swap `window` into the first leaf slot.
    pub fn promote(&mut self, window: WindowId) -> bool {
        match self.first_window() {
            Some(first) if first != window => self.swap(window, first),
            _ => false,
        }
    }

    /// Adjust the ratio of the nearest ancestor split whose axis matches the
    /// non-zero delta. Pixel deltas are converted against the split's own
    /// rectangle; the ratio is clamped to `[0.1, 0.9]`.
    pub fn resize(&mut self, window: WindowId, dx: i32, dy: i32, usable: Xyhw, gap: i32) -> bool {
        let mut changed = false;
        if dx != 0 {
            changed |= self.resize_axis(window, Axis::Horizontal, dx, usable, gap);
        }
        if dy != 0 {
            changed |= self.resize_axis(window, Axis::Vertical, dy, usable, gap);
        }
        changed
    }

    fn resize_axis(&mut self, window: WindowId, axis: Axis, delta: i32, usable: Xyhw, gap: i32) -> bool {
        let Some(leaf) = self.leaf_of(window) else {
            return false;
        };
        let mut child = leaf;
        let mut ancestor = self.node(leaf).parent;
        while let Some(idx) = ancestor {
            if let NodeKind::Split {
                axis: split_axis,
                first,
                ..
            } = self.node(idx).kind
            {
                if split_axis == axis {
                    let rect = self.rect_of(idx, usable.shrink(gap / 2));
                    let span = match axis {
                        Axis::Horizontal => rect.w,
                        Axis::Vertical => rect.h,
                    };
                    if span <= 0 {
                        return false;
                    }
                    // Growing the focused window means growing whichever
                    // side of the split it descends from.
                    let signed = if self.descends_from(leaf, first) || first == leaf {
                        delta
                    } else {
                        -delta
                    };
                    let step = signed as f32 / span as f32;
                    if let NodeKind::Split { ratio, .. } = &mut self.node_mut(idx).kind {
                        *ratio = (*ratio + step).clamp(0.1, 0.9);
                    }
                    return true;
                }
            }
            child = idx;
            ancestor = self.node(child).parent;
        }
        false
    }

    fn descends_from(&self, mut idx: usize, ancestor: usize) -> bool {
        while let Some(parent) = self.node(idx).parent {
            if parent == ancestor {
                return true;
            }
            idx = parent;
        }
        false
    }

    /// The rectangle the subtree at `idx` occupies inside `outer`.
    fn rect_of(&self, idx: usize, outer: Xyhw) -> Xyhw {
        let path = self.path_to(idx);
        let mut rect = outer;
        let mut current = self.root.expect("rect_of on empty tree");
        for side in path {
            if let NodeKind::Split {
                axis,
                ratio,
                first,
                second,
            } = self.node(current).kind
            {
                let (a, b) = rect.split(axis, ratio);
                match side {
                    Side::First => {
                        rect = a;
                        current = first;
                    }
                    Side::Second => {
                        rect = b;
                        current = second;
                    }
                }
            }
        }
        rect
    }

    /// Partition the usable rectangle into one geometry per tiled window.
    ///
    /// The usable rect is first shrunk by `gap/2` on its outer boundary and
    /// every leaf rect by `gap/2` per side, which yields a uniform `gap`
    /// between neighbors and around the screen edge.
    #[must_use]
    pub fn rects(&self, usable: Xyhw, gap: i32) -> Vec<(WindowId, Xyhw)> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_rects(root, usable.shrink(gap / 2), gap, &mut out);
        }
        out
    }

    fn collect_rects(&self, idx: usize, rect: Xyhw, gap: i32, out: &mut Vec<(WindowId, Xyhw)>) {
        match self.node(idx).kind {
            NodeKind::Leaf { window } => out.push((window, rect.shrink(gap / 2))),
            NodeKind::Split {
                axis,
                ratio,
                first,
                second,
            } => {
                let (a, b) = rect.split(axis, ratio);
                self.collect_rects(first, a, gap, out);
                self.collect_rects(second, b, gap, out);
            }
        }
    }
}
