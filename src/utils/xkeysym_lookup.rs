//! Key name to X keysym translation.
use xkbcommon::xkb::{keysym_from_name, Keysym, KEYSYM_NO_FLAGS};

/// Look up the keysym for an X11 key name (`Return`, `h`, `1`, `minus`, ...).
#[must_use]
pub fn into_keysym(name: &str) -> Option<u32> {
    let sym = keysym_from_name(name, KEYSYM_NO_FLAGS);
    if sym == Keysym::NoSymbol {
        return None;
    }
    Some(sym.raw())
}

/// Mouse button names used in button combos (`Button1` .. `Button5`).
#[must_use]
pub fn into_button(name: &str) -> Option<u8> {
    let n: u8 = name.strip_prefix("Button")?.parse().ok()?;
    (1..=5).contains(&n).then_some(n)
}
