//! Adoption of new clients and removal of dead ones.
use crate::display_action::DisplayAction;
use crate::display_event::WindowSpec;
use crate::models::{first_match, Area, Rule, Window, WindowId, Xyhw};
use crate::state::State;

impl State {
    /// Bring a mapped-requested client under management: rule matching,
    /// frame creation, placement, focus.
    pub fn adopt(&mut self, spec: WindowSpec) {
        if self.windows.contains_key(&spec.id) {
            return;
        }
        let mut window = Window::new(spec.id, spec.class.clone(), spec.title.clone());
        window.pid = spec.pid;

        // A client spawned for a scratchpad bypasses the tiling order.
        if let Some(name) = self.scratchpad_for_pid(spec.pid) {
            self.adopt_scratchpad(window, &name);
            return;
        }

        let rule = self
            .take_spawn_hint(spec.pid)
            .or_else(|| first_match(&self.config.rules, spec.class.as_deref(), spec.title.as_deref()).cloned());

        let mut target = self.active_workspace();
        if let Some(rule) = &rule {
            // Unknown targets in a rule are ignored; the rest still applies.
            if let Some(ws) = rule.workspace {
                if self.workspaces.contains_key(&ws) {
                    target = ws;
                }
            }
            if let Some(monitor) = rule.monitor {
                if monitor < self.monitors.len() {
                    self.rehost_workspace(target, monitor);
                }
            }
        }

        let floating = spec.hint_floating || rule.as_ref().and_then(|r| r.floating).unwrap_or(false);
        let area = rule.as_ref().and_then(|r| r.area);
        window.workspace = target;

        let monitor_rect = {
            let monitor = self.workspaces[&target].monitor;
            self.monitors[monitor].rect
        };
        if floating {
            window.floating = true;
            let base = spec
                .requested
                .filter(|g| g.w > 1 && g.h > 1)
                .unwrap_or_else(|| monitor_rect.centered_fraction(1.0 / 3.0, 1.0 / 3.0));
            let rect = match area {
                Some(area) => place_in_area(monitor_rect, base, area),
                None => base,
            };
            window.geom_floating = Some(rect);
        }

        window.frame.geometry = window.visible_geometry();
        let visible = self.workspaces[&target].visible;
        window.mapped = visible;
        let id = window.id;
        let geometry = window.frame.geometry;
        self.windows.insert(id, window);
        {
            let usable = self.usable_rect_of(target);
            let focused = self.focused;
            let ws = self.workspaces.get_mut(&target).expect("target exists");
            if floating {
                ws.floating.insert(id);
            } else {
                ws.tree.insert(id, focused, usable);
            }
        }

        self.actions
            .push_back(DisplayAction::CreateFrame { window: id, geometry });
        if visible {
            self.apply_layout(target);
            self.actions.push_back(DisplayAction::MapFrame(id));
            self.focus_window(Some(id));
        }
        self.emit_workspace_event(false);
    }

    fn adopt_scratchpad(&mut self, mut window: Window, name: &str) {
        let rect = self.monitors[self.focused_monitor]
            .rect
            .centered_fraction(0.8, 0.6);
        window.scratch = true;
        window.floating = true;
        window.workspace = self.active_workspace();
        window.geom_floating = Some(rect);
        window.frame.geometry = rect;
        window.mapped = true;
        let id = window.id;
        self.windows.insert(id, window);
        if let Some(entry) = self.active_scratchpads.get_mut(name) {
            entry.window = Some(id);
            entry.shown = true;
        }
        self.actions
            .push_back(DisplayAction::CreateFrame { window: id, geometry: rect });
        self.actions.push_back(DisplayAction::MapFrame(id));
        self.actions.push_back(DisplayAction::Raise(id));
        self.focus_window(Some(id));
        // scratchpads never count towards occupancy
    }

    fn scratchpad_for_pid(&self, pid: Option<u32>) -> Option<String> {
        let pid = pid?;
        self.active_scratchpads
            .iter()
            .find(|(_, active)| active.pid == Some(pid) && active.window.is_none())
            .map(|(name, _)| name.clone())
    }

    fn take_spawn_hint(&mut self, pid: Option<u32>) -> Option<Rule> {
        let pid = pid?;
        let index = self.spawn_hints.iter().position(|(p, _)| *p == pid)?;
        Some(self.spawn_hints.remove(index).1)
    }

    /// Move `workspace` to `monitor` without touching visibility; used by
    /// rules that pin a workspace to a monitor.
    fn rehost_workspace(&mut self, workspace: usize, monitor: usize) {
        let Some(ws) = self.workspaces.get(&workspace) else {
            return;
        };
        let old = ws.monitor;
        if old == monitor {
            return;
        }
        let was_visible = ws.visible;
        if let Some(mon) = self.monitors.get_mut(old) {
            mon.workspaces.retain(|&idx| idx != workspace);
        }
        self.monitors[monitor].workspaces.push(workspace);
        if let Some(ws) = self.workspaces.get_mut(&workspace) {
            ws.monitor = monitor;
            // Never steal visibility from what the monitor already shows.
            if was_visible && self.monitors[monitor].workspaces.len() > 1 {
                ws.visible = false;
            }
        }
        if was_visible && !self.workspaces[&workspace].visible {
            self.unmap_workspace_frames(workspace);
        }
    }

    /// The display server reports the frame it allocated during adoption.
    pub fn attach_frame(&mut self, client: WindowId, frame: u32) {
        if let Some(window) = self.windows.get_mut(&client) {
            window.frame.id = Some(frame);
        }
    }

    /// Drop a window that went away (unmap, destroy, or a failed X call).
    pub fn remove_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.remove(&id) else {
            return;
        };
        self.actions.push_back(DisplayAction::DestroyFrame { window: id });

        if window.scratch {
            for active in self.active_scratchpads.values_mut() {
                if active.window == Some(id) {
                    active.window = None;
                    active.shown = false;
                }
            }
            if self.focused == Some(id) {
                self.focused = None;
                let next = self.first_on_active();
                self.focus_window(next);
            }
            return;
        }

        let workspace = window.workspace;
        if let Some(ws) = self.workspaces.get_mut(&workspace) {
            if window.floating {
                ws.floating.remove(&id);
            } else {
                ws.tree.remove(id);
            }
        }
        self.apply_layout(workspace);
        if self.focused == Some(id) {
            self.focused = None;
            let next = self
                .workspaces
                .get(&workspace)
                .filter(|ws| ws.visible)
                .and_then(|ws| ws.tree.first_window().or_else(|| ws.floating.iter().next().copied()));
            self.focus_window(next);
        }
        self.emit_workspace_event(false);
    }

    fn first_on_active(&self) -> Option<WindowId> {
        let active = self.active_workspace();
        self.workspaces
            .get(&active)
            .and_then(|ws| ws.tree.first_window().or_else(|| ws.floating.iter().next().copied()))
    }
}

/// Position a floating rectangle inside the named region of the monitor.
fn place_in_area(monitor: Xyhw, size: Xyhw, area: Area) -> Xyhw {
    let (w, h) = (size.w, size.h);
    let (x, y) = match area {
        Area::Center => (
            monitor.x + (monitor.w - w) / 2,
            monitor.y + (monitor.h - h) / 2,
        ),
        Area::Left => (monitor.x, monitor.y + (monitor.h - h) / 2),
        Area::Right => (
            monitor.x + monitor.w - w,
            monitor.y + (monitor.h - h) / 2,
        ),
        Area::Top => (monitor.x + (monitor.w - w) / 2, monitor.y),
        Area::Bottom => (
            monitor.x + (monitor.w - w) / 2,
            monitor.y + monitor.h - h,
        ),
    };
    Xyhw::new(x, y, w, h)
}
