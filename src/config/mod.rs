//! Mutable configuration and its reset-to-defaults policy.
mod loader;
mod watcher;

pub use loader::{run_once, ConfigRun};
pub use watcher::spawn_watcher;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::{FrameAppearance, Rule, ScratchPad};
use crate::utils::modmask_lookup::ModMask;

/// Everything `reload-config` resets before replaying the config source.
///
/// Runtime state (windows, focus, workspaces) deliberately lives elsewhere.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    pub gap: i32,
    pub appearance: FrameAppearance,
    pub rules: Vec<Rule>,
    pub scratchpads: Vec<ScratchPad>,
    pub show_occupied_only: bool,
    /// keycombo (clean modifier mask, keysym) -> command line
    pub keybinds: HashMap<(ModMask, u32), String>,
    /// buttoncombo (clean modifier mask, button) -> command line
    pub mousebinds: HashMap<(ModMask, u8), String>,
}

impl Config {
    /// Back to defaults; used by `reload-config` before the replay.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The executable configuration source: `$XDG_CONFIG_HOME/mywm/config`.
pub fn config_file() -> Result<PathBuf> {
    let base = xdg::BaseDirectories::with_prefix("mywm")?;
    Ok(base.place_config_file("config")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let mut config = Config {
            gap: 12,
            show_occupied_only: true,
            ..Config::default()
        };
        config.rules.push(Rule {
            class: Some("Firefox".into()),
            ..Rule::default()
        });
        config
            .keybinds
            .insert((ModMask::Super, 0xff0d), "spawn xterm".into());

        config.reset();
        assert_eq!(config.gap, 0);
        assert!(!config.show_occupied_only);
        assert!(config.rules.is_empty());
        assert!(config.keybinds.is_empty());
        assert_eq!(config.appearance, FrameAppearance::default());
    }
}
