use serde::{Deserialize, Serialize};

use crate::models::Xyhw;

/// The decoration window wrapped around one client.
///
/// The frame window id is allocated by the display server when the client is
/// adopted; widths and colors mirror the global appearance at draw time.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Frame {
    /// The manager-created X window the client is reparented into.
    /// `None` until the display server reports creation.
    pub id: Option<u32>,
    pub geometry: Xyhw,
}

/// Border widths and colors shared by every frame.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FrameAppearance {
    pub inner_width: i32,
    pub outer_width: i32,
    pub inner_color: String,
    pub outer_color: String,
}

impl Default for FrameAppearance {
    fn default() -> Self {
        Self {
            inner_width: 2,
            outer_width: 4,
            inner_color: "#222222".to_string(),
            outer_color: "#111111".to_string(),
        }
    }
}

impl FrameAppearance {
    /// Total inset of the client inside its frame, per side.
    #[must_use]
    pub const fn inset(&self) -> i32 {
        self.inner_width + self.outer_width
    }
}

/// Validate and canonicalize a `#rrggbb` color token.
pub fn sanitize_hex_color(raw: &str) -> Option<String> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", hex.to_ascii_lowercase()))
}

/// Parse a canonical `#rrggbb` into a truecolor pixel value.
#[must_use]
pub fn hex_color_pixel(color: &str) -> u32 {
    u32::from_str_radix(color.trim_start_matches('#'), 16).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_canonicalized() {
        assert_eq!(sanitize_hex_color("#A0b1C2"), Some("#a0b1c2".to_string()));
        assert_eq!(sanitize_hex_color("#fff"), None);
        assert_eq!(sanitize_hex_color("a0b1c2"), None);
        assert_eq!(sanitize_hex_color("#a0b1cg"), None);
    }

    #[test]
    fn pixels_from_hex() {
        assert_eq!(hex_color_pixel("#ff8000"), 0x00ff_8000);
        assert_eq!(hex_color_pixel("#000000"), 0);
    }

    #[test]
    fn inset_is_both_borders() {
        let appearance = FrameAppearance {
            inner_width: 3,
            outer_width: 6,
            ..FrameAppearance::default()
        };
        assert_eq!(appearance.inset(), 9);
    }
}
