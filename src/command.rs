//! The control protocol: one shell-quoted command per line.
use serde::{Deserialize, Serialize};

use crate::errors::{MywmError, Result};
use crate::models::{sanitize_hex_color, Area, Rule};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderKind {
    Inner,
    Outer,
}

/// A parsed protocol request (see the request grammar in the README).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Command {
    SetWorkspaces(Vec<(usize, String)>),
    Bind { combo: String, command: String },
    Rule(Rule),
    RegisterScratchPad { name: String, spawn: String },
    SetGap(i32),
    SetBorder { kind: BorderKind, width: i32 },
    SetColor { kind: BorderKind, color: String },
    BarShowOccupiedOnly(bool),
    Spawn { cmd: String, hints: Vec<(String, String)> },
    FocusDir(Direction),
    MoveDir(Direction),
    Resize { dx: i32, dy: i32 },
    ToggleFloat,
    CloseFocused,
    ViewWorkspace(usize),
    SendToWorkspace(usize),
    MoveWorkspaceToMonitor { workspace: usize, monitor: usize },
    ToggleBar,
    ToggleFullscreen,
    ToggleScratchPad(String),
    ReloadConfig,
    Quit,
}

/// Parse one request line into a [`Command`].
///
/// Errors carry the short reason used in `ERR <reason>` replies.
pub fn parse_command(line: &str) -> Result<Command> {
    let tokens = tokenize(line)?;
    let Some((verb, args)) = tokens.split_first() else {
        return Err(err("empty"));
    };
    match verb.as_str() {
        "set-workspaces" => build_set_workspaces(args),
        "bind" => build_bind(args),
        "rule" => build_rule(args),
        "scratch" => build_scratch(args),
        "set-gap" => Ok(Command::SetGap(int_arg(args, 0)?)),
        "set-border" => Ok(Command::SetBorder {
            kind: border_kind(args)?,
            width: int_arg(args, 1)?,
        }),
        "set-color" => build_set_color(args),
        "bar" => build_bar(args),
        "spawn" => build_spawn(args),
        "focus" => Ok(Command::FocusDir(direction(args)?)),
        "move" => Ok(Command::MoveDir(direction(args)?)),
        "resize" => build_resize(args),
        "float" => expecting(args, "toggle", Command::ToggleFloat),
        "close" => Ok(Command::CloseFocused),
        "view" => Ok(Command::ViewWorkspace(ws_arg(args)?)),
        "send" => Ok(Command::SendToWorkspace(ws_arg(args)?)),
        "move-ws" => build_move_ws(args),
        "togglebar" => Ok(Command::ToggleBar),
        "fullscreen" => expecting(args, "toggle", Command::ToggleFullscreen),
        "reload-config" => Ok(Command::ReloadConfig),
        "quit" => Ok(Command::Quit),
        _ => Err(err("unknown")),
    }
}

fn err(reason: &str) -> MywmError {
    MywmError::Protocol(reason.to_string())
}

fn arg<'a>(args: &'a [String], index: usize) -> Result<&'a str> {
    args.get(index).map(String::as_str).ok_or_else(|| err("missing-arg"))
}

fn int_arg(args: &[String], index: usize) -> Result<i32> {
    arg(args, index)?.parse().map_err(|_| err("bad-arg"))
}

fn direction(args: &[String]) -> Result<Direction> {
    match arg(args, 0)? {
        "left" => Ok(Direction::Left),
        "right" => Ok(Direction::Right),
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        _ => Err(err("bad-arg")),
    }
}

fn border_kind(args: &[String]) -> Result<BorderKind> {
    match arg(args, 0)? {
        "inner" => Ok(BorderKind::Inner),
        "outer" => Ok(BorderKind::Outer),
        _ => Err(err("bad-arg")),
    }
}

fn expecting(args: &[String], literal: &str, command: Command) -> Result<Command> {
    if arg(args, 0)? == literal {
        Ok(command)
    } else {
        Err(err("bad-arg"))
    }
}

/// `view ws <n>` / `send ws <n>`.
fn ws_arg(args: &[String]) -> Result<usize> {
    if arg(args, 0)? != "ws" {
        return Err(err("bad-arg"));
    }
    arg(args, 1)?.parse().map_err(|_| err("bad-arg"))
}

fn build_set_workspaces(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Err(err("missing-arg"));
    }
    let mut workspaces = Vec::with_capacity(args.len());
    for token in args {
        let (index, label) = token.split_once(':').ok_or_else(|| err("bad-arg"))?;
        let index: usize = index.parse().map_err(|_| err("bad-arg"))?;
        if index == 0 || label.is_empty() {
            return Err(err("bad-arg"));
        }
        workspaces.push((index, label.to_string()));
    }
    Ok(Command::SetWorkspaces(workspaces))
}

fn build_bind(args: &[String]) -> Result<Command> {
    let combo = arg(args, 0)?.to_string();
    if args.len() < 2 {
        return Err(err("missing-arg"));
    }
    // The remainder of the line is the bound command, re-joined so that
    // `bind Mod4-Return spawn xterm` round-trips.
    let command = args[1..].join(" ");
    Ok(Command::Bind { combo, command })
}

fn build_rule(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Err(err("missing-arg"));
    }
    let mut rule = Rule::default();
    for pair in args {
        let (key, value) = pair.split_once('=').ok_or_else(|| err("bad-arg"))?;
        match key {
            "class" => rule.class = Some(value.to_string()),
            "title" => rule.title = Some(value.to_string()),
            "workspace" => rule.workspace = Some(value.parse().map_err(|_| err("bad-arg"))?),
            "monitor" => rule.monitor = Some(value.parse().map_err(|_| err("bad-arg"))?),
            "float" => rule.floating = Some(value.parse().map_err(|_| err("bad-arg"))?),
            "area" => rule.area = Some(Area::parse(value).ok_or_else(|| err("bad-arg"))?),
            _ => return Err(err("bad-arg")),
        }
    }
    if rule.class.is_none() && rule.title.is_none() {
        return Err(err("bad-arg"));
    }
    Ok(Command::Rule(rule))
}

/// `scratch <name>:<spawn-command>` registers, `scratch toggle <name>` toggles.
fn build_scratch(args: &[String]) -> Result<Command> {
    match arg(args, 0)? {
        "toggle" => Ok(Command::ToggleScratchPad(arg(args, 1)?.to_string())),
        registration => {
            let (name, spawn) = registration.split_once(':').ok_or_else(|| err("bad-arg"))?;
            if name.is_empty() || spawn.is_empty() {
                return Err(err("bad-arg"));
            }
            Ok(Command::RegisterScratchPad {
                name: name.to_string(),
                spawn: spawn.to_string(),
            })
        }
    }
}

fn build_set_color(args: &[String]) -> Result<Command> {
    let kind = border_kind(args)?;
    let color = sanitize_hex_color(arg(args, 1)?).ok_or_else(|| err("bad-arg"))?;
    Ok(Command::SetColor { kind, color })
}

fn build_bar(args: &[String]) -> Result<Command> {
    if arg(args, 0)? != "show-occupied-only" {
        return Err(err("bad-arg"));
    }
    let flag = arg(args, 1)?.parse().map_err(|_| err("bad-arg"))?;
    Ok(Command::BarShowOccupiedOnly(flag))
}

fn build_spawn(args: &[String]) -> Result<Command> {
    let cmd = arg(args, 0)?.to_string();
    let mut hints = Vec::new();
    for pair in &args[1..] {
        let (key, value) = pair.split_once('=').ok_or_else(|| err("bad-arg"))?;
        hints.push((key.to_string(), value.to_string()));
    }
    Ok(Command::Spawn { cmd, hints })
}

/// `resize ±Nx ±Ny`, e.g. `resize +50x -20y`.
fn build_resize(args: &[String]) -> Result<Command> {
    let dx = delta_arg(arg(args, 0)?, 'x')?;
    let dy = delta_arg(arg(args, 1)?, 'y')?;
    Ok(Command::Resize { dx, dy })
}

fn delta_arg(token: &str, suffix: char) -> Result<i32> {
    let digits = token.strip_suffix(suffix).ok_or_else(|| err("bad-arg"))?;
    if !digits.starts_with('+') && !digits.starts_with('-') {
        return Err(err("bad-arg"));
    }
    digits.parse().map_err(|_| err("bad-arg"))
}

fn build_move_ws(args: &[String]) -> Result<Command> {
    let workspace = arg(args, 0)?.parse().map_err(|_| err("bad-arg"))?;
    if arg(args, 1)? != "monitor" {
        return Err(err("bad-arg"));
    }
    let monitor = arg(args, 2)?.parse().map_err(|_| err("bad-arg"))?;
    Ok(Command::MoveWorkspaceToMonitor { workspace, monitor })
}

/// Split a request line into tokens, honoring single quotes, double quotes
/// and backslash escapes.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some('\'') if c == '\'' => quote = None,
            Some('"') if c == '"' => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| err("bad-quote"))?;
                    current.push(escaped);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err(err("bad-quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(line: &str) -> String {
        parse_command(line).unwrap_err().reply_reason()
    }

    #[test]
    fn parse_good_commands() {
        assert_eq!(
            parse_command("set-workspaces 1:dev 2:web").unwrap(),
            Command::SetWorkspaces(vec![(1, "dev".into()), (2, "web".into())])
        );
        assert_eq!(
            parse_command("bind Mod4-Return spawn xterm").unwrap(),
            Command::Bind {
                combo: "Mod4-Return".into(),
                command: "spawn xterm".into()
            }
        );
        assert_eq!(parse_command("set-gap 10").unwrap(), Command::SetGap(10));
        assert_eq!(
            parse_command("set-border inner 3").unwrap(),
            Command::SetBorder {
                kind: BorderKind::Inner,
                width: 3
            }
        );
        assert_eq!(
            parse_command("set-color outer #A1B2C3").unwrap(),
            Command::SetColor {
                kind: BorderKind::Outer,
                color: "#a1b2c3".into()
            }
        );
        assert_eq!(
            parse_command("focus left").unwrap(),
            Command::FocusDir(Direction::Left)
        );
        assert_eq!(
            parse_command("resize +50x -20y").unwrap(),
            Command::Resize { dx: 50, dy: -20 }
        );
        assert_eq!(parse_command("float toggle").unwrap(), Command::ToggleFloat);
        assert_eq!(
            parse_command("view ws 2").unwrap(),
            Command::ViewWorkspace(2)
        );
        assert_eq!(
            parse_command("send ws 3").unwrap(),
            Command::SendToWorkspace(3)
        );
        assert_eq!(
            parse_command("move-ws 2 monitor 1").unwrap(),
            Command::MoveWorkspaceToMonitor {
                workspace: 2,
                monitor: 1
            }
        );
        assert_eq!(parse_command("togglebar").unwrap(), Command::ToggleBar);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn parse_rule_pairs() {
        let Command::Rule(rule) = parse_command("rule class=Firefox workspace=2 monitor=1").unwrap()
        else {
            panic!("expected a rule");
        };
        assert_eq!(rule.class.as_deref(), Some("Firefox"));
        assert_eq!(rule.workspace, Some(2));
        assert_eq!(rule.monitor, Some(1));
        assert_eq!(rule.floating, None);
    }

    #[test]
    fn parse_scratch_forms() {
        assert_eq!(
            parse_command("scratch term:xterm -name scratchterm").unwrap(),
            Command::RegisterScratchPad {
                name: "term".into(),
                spawn: "xterm -name scratchterm".into()
            }
        );
        assert_eq!(
            parse_command("scratch toggle term").unwrap(),
            Command::ToggleScratchPad("term".into())
        );
    }

    #[test]
    fn quoted_arguments_hold_whitespace() {
        assert_eq!(
            parse_command("spawn 'xterm -T \"my term\"'").unwrap(),
            Command::Spawn {
                cmd: "xterm -T \"my term\"".into(),
                hints: vec![]
            }
        );
        assert_eq!(
            parse_command("spawn \"firefox --new-window\" workspace=2").unwrap(),
            Command::Spawn {
                cmd: "firefox --new-window".into(),
                hints: vec![("workspace".into(), "2".into())]
            }
        );
    }

    #[test]
    fn unknown_verbs_are_rejected() {
        assert_eq!(reason("frobnicate now"), "unknown");
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert_eq!(reason("set-gap"), "missing-arg");
        assert_eq!(reason("set-gap many"), "bad-arg");
        assert_eq!(reason("set-border middle 3"), "bad-arg");
        assert_eq!(reason("set-color inner red"), "bad-arg");
        assert_eq!(reason("focus sideways"), "bad-arg");
        assert_eq!(reason("resize 50x +20y"), "bad-arg");
        assert_eq!(reason("view workspace 2"), "bad-arg");
        assert_eq!(reason("rule workspace=2"), "bad-arg");
        assert_eq!(reason("set-workspaces 0:zero"), "bad-arg");
        assert_eq!(reason("spawn 'unterminated"), "bad-quote");
    }
}
