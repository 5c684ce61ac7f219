//! Modifier masks for key and button combos.
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The modifiers a combo token may name.
    ///
    /// The bit values are internal; [`to_x_mask`] and [`from_x_state`]
    /// translate to and from the X wire encoding.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 {
        const Shift = 1 << 0;
        const Control = 1 << 1;
        /// `Mod1` in combo syntax.
        const Alt = 1 << 2;
        const Mod3 = 1 << 3;
        /// `Mod4` in combo syntax.
        const Super = 1 << 4;
        const Mod5 = 1 << 5;
    }
}

/// Our modifiers paired with their X wire bits. Caps lock (bit 1) and num
/// lock (bit 4) have no entry: combos cannot bind them and event state is
/// matched as if they were up.
const X_WIRE_BITS: [(u16, ModMask); 6] = [
    (1 << 0, ModMask::Shift),
    (1 << 2, ModMask::Control),
    (1 << 3, ModMask::Alt),
    (1 << 5, ModMask::Mod3),
    (1 << 6, ModMask::Super),
    (1 << 7, ModMask::Mod5),
];

fn modifier_from_name(name: &str) -> Option<ModMask> {
    match name {
        "Shift" => Some(ModMask::Shift),
        "Ctrl" | "Control" => Some(ModMask::Control),
        "Mod1" | "Alt" => Some(ModMask::Alt),
        "Mod3" => Some(ModMask::Mod3),
        "Mod4" | "Super" => Some(ModMask::Super),
        "Mod5" => Some(ModMask::Mod5),
        _ => None,
    }
}

/// Split a combo token like `Mod4-Shift-Return` into its modifier mask and
/// the trailing key name. `None` when a modifier is unknown or the key name
/// is missing.
#[must_use]
pub fn parse_combo(token: &str) -> Option<(ModMask, String)> {
    let (modifiers, key) = match token.rsplit_once('-') {
        Some(split) => split,
        None => ("", token),
    };
    if key.is_empty() {
        return None;
    }
    let mut mask = ModMask::empty();
    for part in modifiers.split('-').filter(|part| !part.is_empty()) {
        mask |= modifier_from_name(part)?;
    }
    Some((mask, key.to_string()))
}

/// Our mask in X wire order, for grabs.
#[must_use]
pub fn to_x_mask(mask: ModMask) -> u16 {
    X_WIRE_BITS
        .iter()
        .filter(|&&(_, modifier)| mask.contains(modifier))
        .map(|&(bit, _)| bit)
        .sum()
}

/// An X event state as our mask. Lock bits fall away because the table
/// never mentions them.
#[must_use]
pub fn from_x_state(state: u16) -> ModMask {
    X_WIRE_BITS
        .iter()
        .fold(ModMask::empty(), |mask, &(bit, modifier)| {
            if state & bit != 0 {
                mask | modifier
            } else {
                mask
            }
        })
}

// bitflags does not derive serde; round-trip through the raw bits.

impl Serialize for ModMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u16::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combos_split_into_mask_and_key() {
        assert_eq!(
            parse_combo("Mod4-Return"),
            Some((ModMask::Super, "Return".to_string()))
        );
        assert_eq!(
            parse_combo("Mod4-Shift-q"),
            Some((ModMask::Super | ModMask::Shift, "q".to_string()))
        );
        assert_eq!(
            parse_combo("minus"),
            Some((ModMask::empty(), "minus".to_string()))
        );
    }

    #[test]
    fn bad_combos_are_rejected() {
        assert_eq!(parse_combo("Hyper-x"), None);
        assert_eq!(parse_combo("Mod4-"), None);
        assert_eq!(parse_combo(""), None);
    }

    #[test]
    fn every_modifier_survives_the_wire_round_trip() {
        for (_, modifier) in X_WIRE_BITS {
            assert_eq!(from_x_state(to_x_mask(modifier)), modifier);
        }
    }

    #[test]
    fn lock_bits_never_reach_the_mask() {
        let caps = 1 << 1;
        let num = 1 << 4;
        let state = to_x_mask(ModMask::Super | ModMask::Shift) | caps | num;
        assert_eq!(from_x_state(state), ModMask::Super | ModMask::Shift);
    }
}
