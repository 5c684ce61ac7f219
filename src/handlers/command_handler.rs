//! Processes protocol commands against the state engine.
use crate::command::Command;
use crate::display_servers::DisplayServer;
use crate::errors::Result;
use crate::manager::Manager;
use crate::models::{Area, Rule};
use crate::state::ScratchToggle;
use crate::utils::child_process::exec_shell;

impl<SERVER: DisplayServer> Manager<SERVER> {
    /// Processes a command and invokes the associated state operation.
    /// `Ok(())` becomes the `OK` reply; errors carry the `ERR` reason.
    pub fn command_handler(&mut self, command: &Command) -> Result<()> {
        let state = &mut self.state;
        match command {
            Command::SetWorkspaces(list) => state.set_workspaces(list),
            Command::Bind { combo, command } => state.bind(combo, command),
            Command::Rule(rule) => {
                state.config.rules.push(rule.clone());
                Ok(())
            }
            Command::RegisterScratchPad { name, spawn } => {
                state.register_scratchpad(name, spawn);
                Ok(())
            }
            Command::SetGap(gap) => {
                state.set_gap(*gap);
                Ok(())
            }
            Command::SetBorder { kind, width } => {
                state.set_border(*kind, *width);
                Ok(())
            }
            Command::SetColor { kind, color } => {
                state.set_color(*kind, color);
                Ok(())
            }
            Command::BarShowOccupiedOnly(flag) => {
                state.config.show_occupied_only = *flag;
                Ok(())
            }
            Command::Spawn { cmd, hints } => self.spawn(cmd, hints),
            Command::FocusDir(dir) => {
                state.focus_dir(*dir);
                Ok(())
            }
            Command::MoveDir(dir) => {
                state.move_dir(*dir);
                Ok(())
            }
            Command::Resize { dx, dy } => {
                state.resize(*dx, *dy);
                Ok(())
            }
            Command::ToggleFloat => {
                state.toggle_float();
                Ok(())
            }
            Command::CloseFocused => {
                state.close_focused();
                Ok(())
            }
            Command::ViewWorkspace(n) => state.view_workspace(*n),
            Command::SendToWorkspace(n) => state.send_to_workspace(*n),
            Command::MoveWorkspaceToMonitor { workspace, monitor } => {
                state.move_workspace_to_monitor(*workspace, *monitor)
            }
            Command::ToggleBar => {
                state.toggle_bar();
                Ok(())
            }
            Command::ToggleFullscreen => {
                state.toggle_fullscreen();
                Ok(())
            }
            Command::ToggleScratchPad(name) => self.toggle_scratchpad(name),
            Command::ReloadConfig => {
                // Async work; the reactor performs it when the flag is set.
                self.reload_requested = true;
                Ok(())
            }
            Command::Quit => {
                self.state.begin_shutdown();
                Ok(())
            }
        }
    }

    /// `spawn <cmd> [key=value...]`: launch a child and remember placement
    /// hints for the window it will map.
    fn spawn(&mut self, cmd: &str, hints: &[(String, String)]) -> Result<()> {
        let pid = exec_shell(cmd, &mut self.children);
        let rule = hints_to_rule(hints);
        if let (Some(pid), Some(rule)) = (pid, rule) {
            self.state.spawn_hints.push((pid, rule));
        }
        Ok(())
    }

    fn toggle_scratchpad(&mut self, name: &str) -> Result<()> {
        match self.state.toggle_scratchpad(name)? {
            ScratchToggle::Done => Ok(()),
            ScratchToggle::Spawn(cmdline) => {
                let pid = exec_shell(&cmdline, &mut self.children);
                self.state.record_scratchpad_pid(name, pid);
                Ok(())
            }
        }
    }
}

/// Spawn hints reuse the rule override shape; unknown keys are ignored.
fn hints_to_rule(hints: &[(String, String)]) -> Option<Rule> {
    let mut rule = Rule::default();
    let mut any = false;
    for (key, value) in hints {
        match key.as_str() {
            "workspace" => {
                rule.workspace = value.parse().ok();
                any |= rule.workspace.is_some();
            }
            "monitor" => {
                rule.monitor = value.parse().ok();
                any |= rule.monitor.is_some();
            }
            "float" => {
                rule.floating = value.parse().ok();
                any |= rule.floating.is_some();
            }
            "area" => {
                rule.area = Area::parse(value);
                any |= rule.area.is_some();
            }
            _ => {}
        }
    }
    any.then_some(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::display_action::DisplayAction;
    use crate::display_event::WindowSpec;
    use crate::display_servers::MockDisplayServer;
    use crate::models::{WmEvent, Xyhw};
    use crate::DisplayEvent;

    fn manager() -> Manager<MockDisplayServer> {
        let server =
            MockDisplayServer::new(vec![Xyhw::new(0, 0, 1000, 800), Xyhw::new(1000, 0, 800, 600)]);
        Manager::new(server, std::path::PathBuf::from("/dev/null"))
    }

    fn run(manager: &mut Manager<MockDisplayServer>, line: &str) {
        let command = parse_command(line).expect("test command parses");
        manager.command_handler(&command).expect("test command applies");
        manager.update_display();
    }

    fn adopt(manager: &mut Manager<MockDisplayServer>, id: u32, class: &str) {
        manager.display_event_handler(DisplayEvent::WindowCreate(WindowSpec {
            id,
            class: Some(class.to_string()),
            title: Some(class.to_lowercase()),
            ..WindowSpec::default()
        }));
        manager.update_display();
    }

    fn drain_events(manager: &mut Manager<MockDisplayServer>) -> Vec<WmEvent> {
        manager.state.events.drain(..).collect()
    }

    fn drain_actions(manager: &mut Manager<MockDisplayServer>) -> Vec<DisplayAction> {
        std::mem::take(&mut manager.display_server.actions)
    }

    #[test]
    fn adoption_tiles_two_clients_with_uniform_gaps() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        run(&mut m, "set-gap 10");
        run(&mut m, "set-border inner 3");
        run(&mut m, "set-border outer 6");
        drain_events(&mut m);

        adopt(&mut m, 100, "Xterm");
        let events = drain_events(&mut m);
        assert!(events.contains(&WmEvent::Workspace {
            active: 1,
            occupied: vec![1]
        }));

        adopt(&mut m, 101, "Xterm");
        let events = drain_events(&mut m);
        // occupancy did not change: no second workspace event
        assert!(!events
            .iter()
            .any(|e| matches!(e, WmEvent::Workspace { .. })));

        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(10, 10, 485, 780));
        assert_eq!(m.state.windows[&101].tiled, Xyhw::new(505, 10, 485, 780));
    }

    #[test]
    fn rules_place_windows_on_hidden_workspaces() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        adopt(&mut m, 100, "Xterm");
        drain_events(&mut m);
        run(&mut m, "rule class=Firefox workspace=2 monitor=1");

        adopt(&mut m, 200, "Firefox");
        let w = &m.state.windows[&200];
        assert_eq!(w.workspace, 2);
        assert!(!w.mapped);
        assert_eq!(m.state.workspaces[&2].monitor, 1);

        let events = drain_events(&mut m);
        assert!(events.contains(&WmEvent::Workspace {
            active: 1,
            occupied: vec![1, 2]
        }));

        // hidden until `view ws 2`
        let actions = drain_actions(&mut m);
        assert!(!actions.contains(&DisplayAction::MapFrame(200)));

        run(&mut m, "view ws 2");
        assert!(m.state.windows[&200].mapped);
    }

    #[test]
    fn rules_with_unknown_targets_apply_the_valid_rest() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        run(&mut m, "rule class=Gimp workspace=9 float=true");
        adopt(&mut m, 300, "Gimp");
        let w = &m.state.windows[&300];
        // workspace 9 does not exist: stays on the active one, but floats
        assert_eq!(w.workspace, 1);
        assert!(w.floating);
    }

    #[test]
    fn directional_focus_moves_and_then_stops() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        assert_eq!(m.state.focused, Some(101));

        run(&mut m, "focus left");
        assert_eq!(m.state.focused, Some(100));

        drain_events(&mut m);
        run(&mut m, "focus left");
        // nothing further left: focus unchanged, no event
        assert_eq!(m.state.focused, Some(100));
        assert!(drain_events(&mut m).is_empty());

        run(&mut m, "focus right");
        assert_eq!(m.state.focused, Some(101));
        let events = drain_events(&mut m);
        assert!(events.contains(&WmEvent::Focus {
            win: 101,
            title: "xterm".into()
        }));
    }

    #[test]
    fn float_toggle_round_trips_through_the_center_third() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        run(&mut m, "focus left");
        let tiled_before = m.state.windows[&100].tiled;

        run(&mut m, "float toggle");
        let w = &m.state.windows[&100];
        assert!(w.floating);
        // center third of the 1000x800 monitor
        assert_eq!(w.geom_floating, Some(Xyhw::new(333, 267, 333, 266)));
        // the other window now fills the usable rect
        assert_eq!(m.state.windows[&101].tiled, Xyhw::new(0, 0, 1000, 800));

        run(&mut m, "float toggle");
        let w = &m.state.windows[&100];
        assert!(!w.floating);
        assert_eq!(w.tiled, tiled_before);
        assert_eq!(m.state.windows[&101].tiled, Xyhw::new(500, 0, 500, 800));
    }

    #[test]
    fn move_swaps_tiled_windows() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        run(&mut m, "focus left");

        run(&mut m, "move right");
        assert_eq!(m.state.workspaces[&1].tree.windows(), vec![101, 100]);
        assert_eq!(m.state.windows[&100].tiled.x, 500);
    }

    #[test]
    fn move_translates_floating_windows_by_five_percent() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        run(&mut m, "float toggle");
        let before = m.state.windows[&100].geom_floating.unwrap();

        run(&mut m, "move right");
        let after = m.state.windows[&100].geom_floating.unwrap();
        assert_eq!(after.x - before.x, 50); // 5% of 1000
        assert_eq!(after.y, before.y);
    }

    #[test]
    fn resizing_a_lone_tiled_window_is_a_no_op() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        drain_actions(&mut m);
        run(&mut m, "resize +50x +0y");
        assert!(drain_actions(&mut m).is_empty());
    }

    #[test]
    fn resize_reflows_the_split() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        run(&mut m, "resize +100x +0y");
        assert_eq!(m.state.windows[&101].tiled.w, 600);
        assert_eq!(m.state.windows[&100].tiled.w, 400);
    }

    #[test]
    fn set_gap_twice_is_a_no_op() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        run(&mut m, "set-gap 10");
        drain_actions(&mut m);
        run(&mut m, "set-gap 10");
        assert!(drain_actions(&mut m).is_empty());
    }

    #[test]
    fn zero_gap_eliminates_gaps_exactly() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        run(&mut m, "set-gap 0");
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(0, 0, 500, 800));
        assert_eq!(m.state.windows[&101].tiled, Xyhw::new(500, 0, 500, 800));
    }

    #[test]
    fn view_unknown_workspace_is_rejected() {
        let mut m = manager();
        let err = m
            .command_handler(&Command::ViewWorkspace(99))
            .unwrap_err();
        assert_eq!(err.reply_reason(), "unknown-workspace");
    }

    #[test]
    fn viewing_twice_repeats_the_occupancy_event() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        drain_events(&mut m);

        run(&mut m, "view ws 1");
        let first = drain_events(&mut m);
        run(&mut m, "view ws 1");
        let second = drain_events(&mut m);
        let payload = WmEvent::Workspace {
            active: 1,
            occupied: vec![1],
        };
        assert!(first.contains(&payload));
        assert!(second.contains(&payload));
    }

    #[test]
    fn send_moves_the_focused_window_and_unmaps_it() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        drain_events(&mut m);

        run(&mut m, "send ws 2");
        assert_eq!(m.state.windows[&101].workspace, 2);
        assert!(!m.state.windows[&101].mapped);
        assert_eq!(m.state.focused, Some(100));
        // the remaining window reclaims the whole usable rect
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(0, 0, 1000, 800));
        let events = drain_events(&mut m);
        assert!(events.contains(&WmEvent::Workspace {
            active: 1,
            occupied: vec![1, 2]
        }));
    }

    #[test]
    fn moving_a_workspace_to_an_idle_monitor_shows_it_there() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        adopt(&mut m, 100, "Xterm");
        run(&mut m, "send ws 2");

        run(&mut m, "move-ws 2 monitor 1");
        let ws = &m.state.workspaces[&2];
        assert_eq!(ws.monitor, 1);
        assert!(ws.visible, "an idle monitor shows the arriving workspace");
        assert!(m.state.windows[&100].mapped);
        // geometry now derives from the second monitor
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(1000, 0, 800, 600));
    }

    #[test]
    fn bindings_are_last_write_wins() {
        let mut m = manager();
        run(&mut m, "bind Mod4-q close");
        run(&mut m, "bind Mod4-q 'spawn foo'");
        assert_eq!(m.state.config.keybinds.len(), 1);
        let bound = m.state.config.keybinds.values().next().unwrap();
        assert_eq!(bound, "spawn foo");
    }

    #[test]
    fn bad_combos_are_rejected() {
        let mut m = manager();
        let err = m
            .command_handler(&Command::Bind {
                combo: "Hyper-q".into(),
                command: "close".into(),
            })
            .unwrap_err();
        assert_eq!(err.reply_reason(), "bad-combo");
    }

    #[test]
    fn bar_toggle_flips_and_reports() {
        let mut m = manager();
        drain_events(&mut m);
        run(&mut m, "togglebar");
        assert!(!m.state.bar_visible);
        assert_eq!(
            drain_events(&mut m),
            vec![WmEvent::BarToggle { visible: false }]
        );
        run(&mut m, "togglebar");
        assert!(m.state.bar_visible);
        assert_eq!(
            drain_events(&mut m),
            vec![WmEvent::BarToggle { visible: true }]
        );
    }

    #[test]
    fn fullscreen_covers_the_monitor_borderless() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        drain_actions(&mut m);

        run(&mut m, "fullscreen toggle");
        let actions = drain_actions(&mut m);
        assert!(actions.contains(&DisplayAction::MoveResizeFrame {
            window: 101,
            geometry: Xyhw::new(0, 0, 1000, 800),
            borderless: true,
        }));
        assert!(actions.contains(&DisplayAction::Raise(101)));

        run(&mut m, "fullscreen toggle");
        assert!(!m.state.windows[&101].fullscreen);
        assert_eq!(m.state.windows[&101].tiled.x, 500);
    }

    #[test]
    fn scratchpad_spawns_then_toggles_visibility() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        run(&mut m, "scratch term:true");

        run(&mut m, "scratch toggle term");
        let pid = m.state.active_scratchpads["term"].pid.expect("spawned");

        // the spawned client maps and is matched by pid
        m.display_event_handler(DisplayEvent::WindowCreate(WindowSpec {
            id: 500,
            class: Some("Scratch".into()),
            pid: Some(pid),
            ..WindowSpec::default()
        }));
        m.update_display();
        let w = &m.state.windows[&500];
        assert!(w.scratch);
        assert!(w.mapped);
        // 80% x 60%, centered on the focused monitor
        assert_eq!(w.geom_floating, Some(Xyhw::new(100, 160, 800, 480)));
        assert_eq!(m.state.focused, Some(500));
        // scratchpads never show up in occupancy
        assert_eq!(m.state.occupied_workspaces(), vec![1]);

        run(&mut m, "scratch toggle term");
        assert!(!m.state.windows[&500].mapped);
        assert_eq!(m.state.focused, Some(100));

        run(&mut m, "scratch toggle term");
        assert!(m.state.windows[&500].mapped);
        assert_eq!(m.state.focused, Some(500));
    }

    #[test]
    fn unknown_scratchpads_are_rejected() {
        let mut m = manager();
        let err = m
            .command_handler(&Command::ToggleScratchPad("nope".into()))
            .unwrap_err();
        assert_eq!(err.reply_reason(), "unknown-scratch");
    }

    #[test]
    fn adopting_a_window_without_class_or_title_is_safe() {
        let mut m = manager();
        run(&mut m, "rule class=Firefox workspace=2");
        m.display_event_handler(DisplayEvent::WindowCreate(WindowSpec {
            id: 700,
            ..WindowSpec::default()
        }));
        m.update_display();
        // class-bearing rules never match a classless window
        assert_eq!(m.state.windows[&700].workspace, 1);
    }

    #[test]
    fn quit_tears_down_every_frame() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        drain_actions(&mut m);

        run(&mut m, "quit");
        assert!(!m.state.running);
        let actions = drain_actions(&mut m);
        assert!(actions.contains(&DisplayAction::DestroyFrame { window: 100 }));
        assert!(actions.contains(&DisplayAction::DestroyFrame { window: 101 }));
    }

    #[test]
    fn removing_a_window_reflows_and_refocuses() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        drain_events(&mut m);

        m.display_event_handler(DisplayEvent::WindowDestroy(101));
        m.update_display();
        assert!(!m.state.windows.contains_key(&101));
        assert_eq!(m.state.focused, Some(100));
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(0, 0, 1000, 800));
        // occupancy unchanged ([1] before and after): no event
        let events = drain_events(&mut m);
        assert!(events.iter().all(|e| !matches!(
            e,
            WmEvent::Workspace { .. }
        )));
    }

    #[test]
    fn key_events_dispatch_bound_commands() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        run(&mut m, "bind Mod4-b togglebar");
        let (&(mods, keysym), _) = m.state.config.keybinds.iter().next().unwrap();

        drain_events(&mut m);
        m.display_event_handler(DisplayEvent::KeyCombo(mods, keysym));
        assert!(!m.state.bar_visible);

        // an unbound combo is silently ignored
        m.display_event_handler(DisplayEvent::KeyCombo(mods, keysym + 1));
        assert!(!m.state.bar_visible);
    }

    #[test]
    fn struts_shrink_the_usable_rect() {
        let mut m = manager();
        adopt(&mut m, 100, "Xterm");
        m.display_event_handler(DisplayEvent::StrutUpdate(
            900,
            crate::models::Strut {
                top: 24,
                ..crate::models::Strut::default()
            },
        ));
        m.update_display();
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(0, 24, 1000, 776));

        m.display_event_handler(DisplayEvent::StrutRemove(900));
        m.update_display();
        assert_eq!(m.state.windows[&100].tiled, Xyhw::new(0, 0, 1000, 800));
    }

    /// Every managed window sits in exactly one workspace's tiled sequence
    /// or floating set (scratchpads in neither), whatever was done to it.
    fn assert_single_residence(m: &Manager<MockDisplayServer>) {
        for (id, window) in &m.state.windows {
            let mut holders = 0;
            for ws in m.state.workspaces.values() {
                if ws.tree.contains(*id) {
                    holders += 1;
                }
                if ws.floating.contains(id) {
                    holders += 1;
                }
            }
            let expected = usize::from(!window.scratch);
            assert_eq!(holders, expected, "window {id} held {holders} times");
        }
    }

    #[test]
    fn windows_always_live_in_exactly_one_workspace() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web 3:misc");
        adopt(&mut m, 100, "Xterm");
        adopt(&mut m, 101, "Xterm");
        adopt(&mut m, 102, "Firefox");
        assert_single_residence(&m);

        run(&mut m, "float toggle");
        assert_single_residence(&m);
        run(&mut m, "send ws 2");
        assert_single_residence(&m);
        run(&mut m, "float toggle");
        assert_single_residence(&m);
        run(&mut m, "view ws 2");
        run(&mut m, "move left");
        assert_single_residence(&m);
        run(&mut m, "set-workspaces 1:dev");
        assert_single_residence(&m);
        for (_, w) in &m.state.windows {
            assert_eq!(w.workspace, 1);
        }
    }

    #[test]
    fn spawn_hints_place_the_spawned_client() {
        let mut m = manager();
        run(&mut m, "set-workspaces 1:dev 2:web");
        run(&mut m, "spawn true workspace=2");
        let (pid, _) = m.state.spawn_hints[0];

        m.display_event_handler(DisplayEvent::WindowCreate(WindowSpec {
            id: 800,
            class: Some("Spawned".into()),
            pid: Some(pid),
            ..WindowSpec::default()
        }));
        m.update_display();
        assert_eq!(m.state.windows[&800].workspace, 2);
        assert!(m.state.spawn_hints.is_empty());
    }
}
