//! Events published to IPC subscribers, one JSON object per line.
use serde::{Deserialize, Serialize};

use crate::models::WindowId;

/// A state-change notification for bars and scripts.
///
/// Serializes as `{"event":"<name>","payload":{...}}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum WmEvent {
    Workspace {
        active: usize,
        occupied: Vec<usize>,
    },
    Focus {
        win: WindowId,
        title: String,
    },
    BarToggle {
        visible: bool,
    },
}

impl WmEvent {
    /// The wire form: one JSON object, newline terminated.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut json = serde_json::to_string(self).expect("event serialization cannot fail");
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_event_wire_format() {
        let ev = WmEvent::Workspace {
            active: 1,
            occupied: vec![1, 2],
        };
        assert_eq!(
            ev.to_line(),
            "{\"event\":\"workspace\",\"payload\":{\"active\":1,\"occupied\":[1,2]}}\n"
        );
    }

    #[test]
    fn bar_toggle_event_wire_format() {
        let ev = WmEvent::BarToggle { visible: false };
        assert_eq!(
            ev.to_line(),
            "{\"event\":\"bar-toggle\",\"payload\":{\"visible\":false}}\n"
        );
    }

    #[test]
    fn focus_event_wire_format() {
        let ev = WmEvent::Focus {
            win: 77,
            title: "xterm".into(),
        };
        assert_eq!(
            ev.to_line(),
            "{\"event\":\"focus\",\"payload\":{\"win\":77,\"title\":\"xterm\"}}\n"
        );
    }
}
