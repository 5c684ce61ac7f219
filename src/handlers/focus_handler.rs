//! Focus bookkeeping. Every focus change, whatever its cause, emits one
//! `focus` event.
use crate::command::Direction;
use crate::display_action::DisplayAction;
use crate::models::{WindowId, WmEvent};
use crate::state::State;

impl State {
    /// Move focus, notify the display server and the subscribers.
    /// A no-op when focus is already there.
    pub fn focus_window(&mut self, id: Option<WindowId>) {
        if self.focused == id {
            return;
        }
        self.focused = id;
        if let Some(id) = id {
            if let Some(window) = self.windows.get(&id) {
                self.focused_monitor = self
                    .workspaces
                    .get(&window.workspace)
                    .map(|ws| ws.monitor)
                    .unwrap_or(self.focused_monitor);
                let title = window.title.clone().unwrap_or_default();
                self.actions.push_back(DisplayAction::FocusWindow(id));
                self.events.push_back(WmEvent::Focus { win: id, title });
            }
        }
    }

    /// `focus <dir>`: focus the nearest window strictly in that direction.
    /// Focus is unchanged when there is none.
    pub fn focus_dir(&mut self, dir: Direction) {
        let Some(from) = self.focused else {
            return;
        };
        if let Some(neighbor) = self.directional_neighbor(from, dir, false) {
            self.focus_window(Some(neighbor));
        }
    }

    /// The window whose frame center lies strictly in direction `dir` from
    /// the focused frame's center, minimizing Manhattan distance; ties go
    /// to the smaller perpendicular offset.
    #[must_use]
    pub fn directional_neighbor(
        &self,
        from: WindowId,
        dir: Direction,
        tiled_only: bool,
    ) -> Option<WindowId> {
        let window = self.windows.get(&from)?;
        let workspace = self.workspaces.get(&window.workspace)?;
        let (fx, fy) = window.center();

        let mut best: Option<(i32, i32, WindowId)> = None;
        for id in workspace.windows() {
            if id == from {
                continue;
            }
            let Some(candidate) = self.windows.get(&id) else {
                continue;
            };
            if candidate.scratch || (tiled_only && candidate.floating) {
                continue;
            }
            let (cx, cy) = candidate.center();
            let (forward, perp) = match dir {
                Direction::Left => (fx - cx, (cy - fy).abs()),
                Direction::Right => (cx - fx, (cy - fy).abs()),
                Direction::Up => (fy - cy, (cx - fx).abs()),
                Direction::Down => (cy - fy, (cx - fx).abs()),
            };
            if forward <= 0 {
                continue;
            }
            let manhattan = forward + perp;
            let better = match best {
                None => true,
                Some((m, p, _)) => manhattan < m || (manhattan == m && perp < p),
            };
            if better {
                best = Some((manhattan, perp, id));
            }
        }
        best.map(|(_, _, id)| id)
    }
}
