//! The authoritative owner of the window/workspace/monitor maps.
//!
//! Every mutation runs on the reactor; the display server and the IPC
//! broadcast only see the queues this module fills.
use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::command::Direction;
use crate::config::Config;
use crate::display_action::DisplayAction;
use crate::errors::{MywmError, Result};
use crate::models::{
    ActiveScratchPad, Monitor, Rule, ScratchPad, Strut, Window, WindowId, WmEvent, Workspace, Xyhw,
};
use crate::utils::modmask_lookup::{self, ModMask};
use crate::utils::xkeysym_lookup;

/// How many workspaces exist before `set-workspaces` replaces the set.
const DEFAULT_WORKSPACES: usize = 9;

/// Floating windows translate by this fraction of the monitor per `move`.
const FLOAT_MOVE_FRACTION: i32 = 20; // 1/20 = 5%

/// What `scratch toggle` asks the manager to do next.
#[derive(Debug, PartialEq, Eq)]
pub enum ScratchToggle {
    Done,
    /// No live client yet: spawn this command and remember its pid.
    Spawn(String),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct State {
    pub windows: HashMap<WindowId, Window>,
    pub workspaces: BTreeMap<usize, Workspace>,
    pub monitors: Vec<Monitor>,
    pub focused: Option<WindowId>,
    pub focused_monitor: usize,
    pub config: Config,
    pub active_scratchpads: HashMap<String, ActiveScratchPad>,
    /// Placement overrides from `spawn`, keyed by the child's pid and
    /// consumed by the first adoption that matches.
    pub spawn_hints: Vec<(u32, Rule)>,
    /// Struts currently claimed by dock windows.
    pub docks: HashMap<WindowId, Strut>,
    pub bar_visible: bool,
    pub running: bool,
    #[serde(skip)]
    pub actions: VecDeque<DisplayAction>,
    #[serde(skip)]
    pub events: VecDeque<WmEvent>,
    #[serde(skip)]
    last_workspace_payload: Option<(usize, Vec<usize>)>,
}

impl State {
    #[must_use]
    pub fn new(monitor_rects: Vec<Xyhw>) -> Self {
        let rects = if monitor_rects.is_empty() {
            vec![Xyhw::new(0, 0, 800, 600)]
        } else {
            monitor_rects
        };
        let mut monitors: Vec<Monitor> = rects
            .into_iter()
            .enumerate()
            .map(|(id, rect)| Monitor::new(id, rect))
            .collect();

        let mut workspaces = BTreeMap::new();
        for index in 1..=DEFAULT_WORKSPACES {
            let mut ws = Workspace::new(index, &index.to_string(), 0);
            ws.visible = index == 1;
            monitors[0].workspaces.push(index);
            workspaces.insert(index, ws);
        }

        let mut actions = VecDeque::new();
        actions.push_back(DisplayAction::SetDesktopNames(
            workspaces.values().map(|ws| ws.label.clone()).collect(),
        ));
        actions.push_back(DisplayAction::SetCurrentDesktop(0));

        Self {
            windows: HashMap::new(),
            workspaces,
            monitors,
            focused: None,
            focused_monitor: 0,
            config: Config::default(),
            active_scratchpads: HashMap::new(),
            spawn_hints: Vec::new(),
            docks: HashMap::new(),
            bar_visible: true,
            running: true,
            actions,
            events: VecDeque::new(),
            last_workspace_payload: None,
        }
    }

    fn err(reason: &str) -> MywmError {
        MywmError::Protocol(reason.to_string())
    }

    // ---- workspace / monitor helpers -----------------------------------

    /// The visible workspace of a monitor, if it has one.
    #[must_use]
    pub fn visible_on(&self, monitor: usize) -> Option<usize> {
        self.monitors.get(monitor)?.workspaces.iter().copied().find(
            |idx| matches!(self.workspaces.get(idx), Some(ws) if ws.visible),
        )
    }

    /// The workspace the user is looking at: the visible one on the
    /// focused monitor.
    #[must_use]
    pub fn active_workspace(&self) -> usize {
        self.visible_on(self.focused_monitor)
            .or_else(|| self.workspaces.values().find(|ws| ws.visible).map(|ws| ws.index))
            .unwrap_or_else(|| self.workspaces.keys().next().copied().unwrap_or(1))
    }

    #[must_use]
    pub fn occupied_workspaces(&self) -> Vec<usize> {
        self.workspaces
            .values()
            .filter(|ws| ws.is_occupied())
            .map(|ws| ws.index)
            .collect()
    }

    pub(crate) fn usable_rect_of(&self, workspace: usize) -> Xyhw {
        self.workspaces
            .get(&workspace)
            .and_then(|ws| self.monitors.get(ws.monitor))
            .map(Monitor::usable_rect)
            .unwrap_or_default()
    }

    fn monitor_rect_of(&self, workspace: usize) -> Xyhw {
        self.workspaces
            .get(&workspace)
            .and_then(|ws| self.monitors.get(ws.monitor))
            .map(|m| m.rect)
            .unwrap_or_default()
    }

    /// The 0-based EWMH desktop number of a workspace index.
    fn desktop_number(&self, workspace: usize) -> usize {
        self.workspaces.keys().position(|&k| k == workspace).unwrap_or(0)
    }

    // ---- event emission -------------------------------------------------

    /// Queue one `workspace` event. Non-forced emission is suppressed when
    /// the payload equals the previous one, so occupancy-neutral mutations
    /// stay silent.
    pub fn emit_workspace_event(&mut self, force: bool) {
        let payload = (self.active_workspace(), self.occupied_workspaces());
        if force || self.last_workspace_payload.as_ref() != Some(&payload) {
            self.events.push_back(WmEvent::Workspace {
                active: payload.0,
                occupied: payload.1.clone(),
            });
            self.last_workspace_payload = Some(payload);
        }
    }

    pub fn toggle_bar(&mut self) {
        self.bar_visible = !self.bar_visible;
        self.events.push_back(WmEvent::BarToggle {
            visible: self.bar_visible,
        });
    }

    // ---- layout ---------------------------------------------------------

    /// Recompute and push geometries for a workspace, if visible.
    pub fn apply_layout(&mut self, workspace: usize) {
        let Some(ws) = self.workspaces.get(&workspace) else {
            return;
        };
        if !ws.visible {
            return;
        }
        let usable = self.usable_rect_of(workspace);
        let monitor_rect = self.monitor_rect_of(workspace);
        let placements = ws.tree.rects(usable, self.config.gap);
        let floating: Vec<WindowId> = ws.floating.iter().copied().collect();

        for (id, rect) in placements {
            let Some(window) = self.windows.get_mut(&id) else {
                continue;
            };
            window.tiled = rect;
            if window.fullscreen {
                continue;
            }
            window.frame.geometry = rect;
            self.actions.push_back(DisplayAction::MoveResizeFrame {
                window: id,
                geometry: rect,
                borderless: false,
            });
        }
        for id in floating {
            let Some(window) = self.windows.get_mut(&id) else {
                continue;
            };
            if window.fullscreen {
                continue;
            }
            let rect = window.visible_geometry();
            window.frame.geometry = rect;
            self.actions.push_back(DisplayAction::MoveResizeFrame {
                window: id,
                geometry: rect,
                borderless: false,
            });
        }

        // Fullscreen frames cover the whole monitor and stack on top.
        let fullscreen: Vec<WindowId> = self
            .workspaces
            .get(&workspace)
            .map(|ws| {
                ws.windows()
                    .into_iter()
                    .filter(|id| matches!(self.windows.get(id), Some(w) if w.fullscreen))
                    .collect()
            })
            .unwrap_or_default();
        for id in fullscreen {
            if let Some(window) = self.windows.get_mut(&id) {
                window.frame.geometry = monitor_rect;
            }
            self.actions.push_back(DisplayAction::MoveResizeFrame {
                window: id,
                geometry: monitor_rect,
                borderless: true,
            });
            self.actions.push_back(DisplayAction::Raise(id));
        }
    }

    fn map_workspace_frames(&mut self, workspace: usize) {
        let ids: Vec<WindowId> = self
            .workspaces
            .get(&workspace)
            .map(Workspace::windows)
            .unwrap_or_default();
        for id in ids {
            if let Some(w) = self.windows.get_mut(&id) {
                w.mapped = true;
            }
            self.actions.push_back(DisplayAction::MapFrame(id));
        }
    }

    pub(crate) fn unmap_workspace_frames(&mut self, workspace: usize) {
        let ids: Vec<WindowId> = self
            .workspaces
            .get(&workspace)
            .map(Workspace::windows)
            .unwrap_or_default();
        for id in ids {
            if let Some(w) = self.windows.get_mut(&id) {
                w.mapped = false;
            }
            self.actions.push_back(DisplayAction::UnmapFrame(id));
        }
    }

    // ---- workspace operations ------------------------------------------

    /// `view ws <n>`: make `n` the visible workspace on its host monitor.
    pub fn view_workspace(&mut self, n: usize) -> Result<()> {
        let Some(ws) = self.workspaces.get(&n) else {
            return Err(Self::err("unknown-workspace"));
        };
        let monitor = ws.monitor;
        let previous = self.visible_on(monitor);
        if previous == Some(n) {
            self.focused_monitor = monitor;
            self.emit_workspace_event(true);
            return Ok(());
        }

        if let Some(prev) = previous {
            if let Some(ws) = self.workspaces.get_mut(&prev) {
                ws.visible = false;
            }
            self.unmap_workspace_frames(prev);
        }
        if let Some(ws) = self.workspaces.get_mut(&n) {
            ws.visible = true;
        }
        self.map_workspace_frames(n);
        self.focused_monitor = monitor;
        self.apply_layout(n);
        let desktop = self.desktop_number(n);
        self.actions.push_back(DisplayAction::SetCurrentDesktop(desktop));

        let next_focus = self
            .workspaces
            .get(&n)
            .and_then(|ws| ws.tree.first_window().or_else(|| ws.floating.iter().next().copied()));
        self.focus_window(next_focus);
        self.emit_workspace_event(true);
        Ok(())
    }

    /// `send ws <n>`: move the focused window to workspace `n`.
    pub fn send_to_workspace(&mut self, n: usize) -> Result<()> {
        if !self.workspaces.contains_key(&n) {
            return Err(Self::err("unknown-workspace"));
        }
        let Some(id) = self.focused else {
            return Ok(());
        };
        let (source, floating, scratch) = match self.windows.get(&id) {
            Some(w) => (w.workspace, w.floating, w.scratch),
            None => return Ok(()),
        };
        if scratch || source == n {
            return Ok(());
        }

        if let Some(ws) = self.workspaces.get_mut(&source) {
            if floating {
                ws.floating.remove(&id);
            } else {
                ws.tree.remove(id);
            }
        }
        let usable = self.usable_rect_of(n);
        let target_visible = self.workspaces.get(&n).map(|ws| ws.visible).unwrap_or(false);
        if let Some(ws) = self.workspaces.get_mut(&n) {
            if floating {
                ws.floating.insert(id);
            } else {
                ws.tree.insert(id, None, usable);
            }
        }
        if let Some(w) = self.windows.get_mut(&id) {
            w.workspace = n;
            w.tiled_slot = None;
            w.mapped = target_visible;
        }
        if target_visible {
            self.actions.push_back(DisplayAction::MapFrame(id));
            self.apply_layout(n);
        } else {
            self.actions.push_back(DisplayAction::UnmapFrame(id));
        }
        self.apply_layout(source);

        let next_focus = self
            .workspaces
            .get(&source)
            .and_then(|ws| ws.tree.first_window().or_else(|| ws.floating.iter().next().copied()));
        self.focus_window(next_focus);
        self.emit_workspace_event(false);
        Ok(())
    }

    /// `move-ws <n> monitor <m>`: relocate a workspace to another monitor.
    pub fn move_workspace_to_monitor(&mut self, n: usize, m: usize) -> Result<()> {
        if !self.workspaces.contains_key(&n) {
            return Err(Self::err("unknown-workspace"));
        }
        if m >= self.monitors.len() {
            return Err(Self::err("unknown-monitor"));
        }
        let old_monitor = self.workspaces[&n].monitor;
        if old_monitor == m {
            return Ok(());
        }
        let was_visible = self.workspaces[&n].visible;

        if let Some(mon) = self.monitors.get_mut(old_monitor) {
            mon.workspaces.retain(|&idx| idx != n);
        }
        self.monitors[m].workspaces.push(n);
        if let Some(ws) = self.workspaces.get_mut(&n) {
            ws.monitor = m;
            ws.visible = false;
        }
        if was_visible {
            self.unmap_workspace_frames(n);
        }

        // A monitor with nothing visible yet shows the arrival.
        if self.visible_on(m).is_none() {
            if let Some(ws) = self.workspaces.get_mut(&n) {
                ws.visible = true;
            }
            self.map_workspace_frames(n);
            self.apply_layout(n);
        }
        self.emit_workspace_event(false);
        Ok(())
    }

    /// `set-workspaces`: replace the workspace set. Windows on removed
    /// workspaces migrate to the lowest surviving one.
    pub fn set_workspaces(&mut self, list: &[(usize, String)]) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (index, _) in list {
            if !seen.insert(*index) {
                return Err(Self::err("bad-arg"));
            }
        }

        let mut new_map = BTreeMap::new();
        for (index, label) in list {
            match self.workspaces.remove(index) {
                Some(mut ws) => {
                    ws.label = label.clone();
                    new_map.insert(*index, ws);
                }
                None => {
                    let ws = Workspace::new(*index, label, 0);
                    self.monitors[0].workspaces.push(*index);
                    new_map.insert(*index, ws);
                }
            }
        }

        let fallback = *new_map.keys().next().expect("parser rejects an empty set");
        let removed: Vec<Workspace> = std::mem::take(&mut self.workspaces).into_values().collect();
        self.workspaces = new_map;
        let fallback_visible = self.workspaces[&fallback].visible;
        for old in removed {
            for mon in &mut self.monitors {
                mon.workspaces.retain(|&idx| idx != old.index);
            }
            for id in old.windows() {
                let floating = old.floating.contains(&id);
                let usable = self.usable_rect_of(fallback);
                if let Some(ws) = self.workspaces.get_mut(&fallback) {
                    if floating {
                        ws.floating.insert(id);
                    } else {
                        ws.tree.insert(id, None, usable);
                    }
                }
                if let Some(w) = self.windows.get_mut(&id) {
                    w.workspace = fallback;
                    w.tiled_slot = None;
                    // frames follow the fallback's visibility
                    if fallback_visible != w.mapped {
                        w.mapped = fallback_visible;
                        self.actions.push_back(if fallback_visible {
                            DisplayAction::MapFrame(id)
                        } else {
                            DisplayAction::UnmapFrame(id)
                        });
                    }
                }
            }
        }
        // Keep monitor workspace lists pruned to live workspaces and give
        // every monitor something visible when it has anything at all.
        let live: Vec<usize> = self.workspaces.keys().copied().collect();
        for mon in &mut self.monitors {
            mon.workspaces.retain(|idx| live.contains(idx));
        }
        for monitor in 0..self.monitors.len() {
            if self.visible_on(monitor).is_none() {
                if let Some(first) = self.monitors[monitor].workspaces.first().copied() {
                    if let Some(ws) = self.workspaces.get_mut(&first) {
                        ws.visible = true;
                    }
                    self.map_workspace_frames(first);
                    self.apply_layout(first);
                }
            }
        }
        if self
            .focused
            .map(|id| !self.windows.contains_key(&id))
            .unwrap_or(false)
        {
            self.focused = None;
        }

        let labels = self.workspaces.values().map(|ws| ws.label.clone()).collect();
        self.actions.push_back(DisplayAction::SetDesktopNames(labels));
        let desktop = self.desktop_number(self.active_workspace());
        self.actions.push_back(DisplayAction::SetCurrentDesktop(desktop));
        for index in self.workspaces.keys().copied().collect::<Vec<_>>() {
            self.apply_layout(index);
        }
        self.emit_workspace_event(false);
        Ok(())
    }

    // ---- window operations ----------------------------------------------

    /// `move <dir>`: swap a tiled window with its directional neighbor, or
    /// translate a floating one by 5% of the monitor.
    pub fn move_dir(&mut self, dir: Direction) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        let workspace = window.workspace;
        if window.floating {
            let mon = self.monitor_rect_of(workspace);
            let (dx, dy) = match dir {
                Direction::Left => (-mon.w / FLOAT_MOVE_FRACTION, 0),
                Direction::Right => (mon.w / FLOAT_MOVE_FRACTION, 0),
                Direction::Up => (0, -mon.h / FLOAT_MOVE_FRACTION),
                Direction::Down => (0, mon.h / FLOAT_MOVE_FRACTION),
            };
            if let Some(w) = self.windows.get_mut(&id) {
                let mut g = w.visible_geometry();
                g.x += dx;
                g.y += dy;
                w.geom_floating = Some(g);
                w.frame.geometry = g;
                self.actions.push_back(DisplayAction::MoveResizeFrame {
                    window: id,
                    geometry: g,
                    borderless: false,
                });
            }
            return;
        }

        let Some(neighbor) = self.directional_neighbor(id, dir, true) else {
            return;
        };
        if let Some(ws) = self.workspaces.get_mut(&workspace) {
            ws.tree.swap(id, neighbor);
        }
        self.apply_layout(workspace);
    }

    /// `resize ±dx ±dy`.
    pub fn resize(&mut self, dx: i32, dy: i32) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        let workspace = window.workspace;
        if window.floating {
            if let Some(w) = self.windows.get_mut(&id) {
                let mut g = w.visible_geometry();
                g.w = (g.w + dx).max(32);
                g.h = (g.h + dy).max(32);
                w.geom_floating = Some(g);
                w.frame.geometry = g;
                self.actions.push_back(DisplayAction::MoveResizeFrame {
                    window: id,
                    geometry: g,
                    borderless: false,
                });
            }
            return;
        }
        let usable = self.usable_rect_of(workspace);
        let gap = self.config.gap;
        let changed = self
            .workspaces
            .get_mut(&workspace)
            .map(|ws| ws.tree.resize(id, dx, dy, usable, gap))
            .unwrap_or(false);
        if changed {
            self.apply_layout(workspace);
        }
    }

    /// `float toggle`.
    pub fn toggle_float(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        if window.scratch {
            return;
        }
        let workspace = window.workspace;
        let was_floating = window.floating;
        let usable = self.usable_rect_of(workspace);
        let monitor_rect = self.monitor_rect_of(workspace);

        if was_floating {
            if let Some(ws) = self.workspaces.get_mut(&workspace) {
                ws.floating.remove(&id);
            }
            let slot = self.windows.get_mut(&id).and_then(|w| {
                w.floating = false;
                w.tiled_slot.take()
            });
            if let Some(ws) = self.workspaces.get_mut(&workspace) {
                match slot {
                    Some(slot) => ws.tree.insert_at(id, &slot, usable),
                    None => ws.tree.insert(id, None, usable),
                }
            }
            self.apply_layout(workspace);
        } else {
            let slot = self
                .workspaces
                .get_mut(&workspace)
                .and_then(|ws| ws.tree.remove(id));
            if let Some(ws) = self.workspaces.get_mut(&workspace) {
                ws.floating.insert(id);
            }
            if let Some(w) = self.windows.get_mut(&id) {
                w.floating = true;
                w.tiled_slot = slot;
                if w.geom_floating.is_none() {
                    w.geom_floating = Some(monitor_rect.centered_fraction(1.0 / 3.0, 1.0 / 3.0));
                }
            }
            self.apply_layout(workspace);
            self.actions.push_back(DisplayAction::Raise(id));
        }
    }

    /// `fullscreen toggle`.
    pub fn toggle_fullscreen(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.fullscreen = !window.fullscreen;
        let workspace = window.workspace;
        self.apply_layout(workspace);
    }

    /// `close`: ask the focused client to quit; state changes arrive later
    /// as a destroy notification.
    pub fn close_focused(&mut self) {
        if let Some(id) = self.focused {
            self.actions.push_back(DisplayAction::CloseWindow(id));
        }
    }

    // ---- scratchpads ----------------------------------------------------

    pub fn register_scratchpad(&mut self, name: &str, spawn: &str) {
        let pad = ScratchPad {
            name: name.to_string(),
            spawn: spawn.to_string(),
        };
        match self.config.scratchpads.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = pad,
            None => self.config.scratchpads.push(pad),
        }
    }

    /// `scratch toggle <name>`.
    pub fn toggle_scratchpad(&mut self, name: &str) -> Result<ScratchToggle> {
        let Some(pad) = self.config.scratchpads.iter().find(|p| p.name == name).cloned() else {
            return Err(Self::err("unknown-scratch"));
        };
        let entry = self.active_scratchpads.entry(name.to_string()).or_default();
        let live = entry.window.filter(|id| self.windows.contains_key(id));
        let Some(id) = live else {
            return Ok(ScratchToggle::Spawn(pad.spawn));
        };

        if entry.shown {
            entry.shown = false;
            if let Some(w) = self.windows.get_mut(&id) {
                w.mapped = false;
            }
            self.actions.push_back(DisplayAction::UnmapFrame(id));
            let next = {
                let active = self.active_workspace();
                self.workspaces.get(&active).and_then(|ws| {
                    ws.tree
                        .first_window()
                        .or_else(|| ws.floating.iter().next().copied())
                })
            };
            self.focus_window(next);
        } else {
            entry.shown = true;
            let rect = self.monitors[self.focused_monitor]
                .rect
                .centered_fraction(0.8, 0.6);
            if let Some(w) = self.windows.get_mut(&id) {
                w.geom_floating = Some(rect);
                w.frame.geometry = rect;
                w.mapped = true;
            }
            self.actions.push_back(DisplayAction::MoveResizeFrame {
                window: id,
                geometry: rect,
                borderless: false,
            });
            self.actions.push_back(DisplayAction::MapFrame(id));
            self.actions.push_back(DisplayAction::Raise(id));
            self.focus_window(Some(id));
        }
        Ok(ScratchToggle::Done)
    }

    /// Remember the pid of the child spawned for a scratchpad.
    pub fn record_scratchpad_pid(&mut self, name: &str, pid: Option<u32>) {
        let entry = self.active_scratchpads.entry(name.to_string()).or_default();
        entry.pid = pid;
    }

    // ---- appearance -----------------------------------------------------

    pub fn set_gap(&mut self, gap: i32) {
        if self.config.gap == gap {
            return;
        }
        self.config.gap = gap;
        for index in self.workspaces.keys().copied().collect::<Vec<_>>() {
            self.apply_layout(index);
        }
    }

    pub fn set_border(&mut self, kind: crate::command::BorderKind, width: i32) {
        let appearance = &mut self.config.appearance;
        match kind {
            crate::command::BorderKind::Inner => appearance.inner_width = width,
            crate::command::BorderKind::Outer => appearance.outer_width = width,
        }
        self.actions
            .push_back(DisplayAction::SetAppearance(appearance.clone()));
    }

    pub fn set_color(&mut self, kind: crate::command::BorderKind, color: &str) {
        let appearance = &mut self.config.appearance;
        match kind {
            crate::command::BorderKind::Inner => appearance.inner_color = color.to_string(),
            crate::command::BorderKind::Outer => appearance.outer_color = color.to_string(),
        }
        self.actions
            .push_back(DisplayAction::SetAppearance(appearance.clone()));
    }

    // ---- bindings -------------------------------------------------------

    /// `bind <combo> <command>`: last write wins, and the grab is issued
    /// for the new combo.
    pub fn bind(&mut self, combo: &str, command: &str) -> Result<()> {
        let (mods, key) =
            modmask_lookup::parse_combo(combo).ok_or_else(|| Self::err("bad-combo"))?;
        if let Some(button) = xkeysym_lookup::into_button(&key) {
            self.config
                .mousebinds
                .insert((mods, button), command.to_string());
            self.actions.push_back(DisplayAction::GrabButton { mods, button });
        } else {
            let keysym = xkeysym_lookup::into_keysym(&key).ok_or_else(|| Self::err("bad-combo"))?;
            self.config
                .keybinds
                .insert((mods, keysym), command.to_string());
            self.actions.push_back(DisplayAction::GrabKey { mods, keysym });
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup_key(&self, mods: ModMask, keysym: u32) -> Option<String> {
        self.config.keybinds.get(&(mods, keysym)).cloned()
    }

    #[must_use]
    pub fn lookup_button(&self, mods: ModMask, button: u8) -> Option<String> {
        self.config.mousebinds.get(&(mods, button)).cloned()
    }

    // ---- configuration reset (reload) -----------------------------------

    /// The reload reset: bindings (with ungrab), rules, appearance and
    /// scratchpad registrations return to defaults; windows, focus and the
    /// workspace set stay untouched.
    pub fn reset_config(&mut self) {
        self.config.reset();
        self.actions.push_back(DisplayAction::UngrabAll);
        self.actions
            .push_back(DisplayAction::SetAppearance(self.config.appearance.clone()));
        for index in self.workspaces.keys().copied().collect::<Vec<_>>() {
            self.apply_layout(index);
        }
    }

    // ---- struts ---------------------------------------------------------

    pub fn update_strut(&mut self, dock: WindowId, strut: Strut) {
        self.docks.insert(dock, strut);
        self.recompute_struts();
    }

    pub fn remove_strut(&mut self, dock: WindowId) {
        if self.docks.remove(&dock).is_some() {
            self.recompute_struts();
        }
    }

    /// Translate root-edge reservations into per-monitor insets and reflow.
    fn recompute_struts(&mut self) {
        let root_w = self
            .monitors
            .iter()
            .map(|m| m.rect.x + m.rect.w)
            .max()
            .unwrap_or(0);
        let root_h = self
            .monitors
            .iter()
            .map(|m| m.rect.y + m.rect.h)
            .max()
            .unwrap_or(0);
        for mon in &mut self.monitors {
            let mut strut = Strut::default();
            for dock in self.docks.values() {
                let from_left = (dock.left - mon.rect.x).clamp(0, mon.rect.w);
                let from_right =
                    (dock.right - (root_w - (mon.rect.x + mon.rect.w))).clamp(0, mon.rect.w);
                let from_top = (dock.top - mon.rect.y).clamp(0, mon.rect.h);
                let from_bottom =
                    (dock.bottom - (root_h - (mon.rect.y + mon.rect.h))).clamp(0, mon.rect.h);
                strut = strut.max(Strut {
                    left: from_left,
                    right: from_right,
                    top: from_top,
                    bottom: from_bottom,
                });
            }
            mon.strut = strut;
        }
        for index in self.workspaces.keys().copied().collect::<Vec<_>>() {
            self.apply_layout(index);
        }
    }

    // ---- shutdown -------------------------------------------------------

    /// Queue the teardown of every frame; the reactor runs the actions and
    /// then drops the connection.
    pub fn begin_shutdown(&mut self) {
        self.running = false;
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            self.actions.push_back(DisplayAction::DestroyFrame { window: id });
        }
    }
}
