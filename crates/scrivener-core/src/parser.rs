//! Command line parsing.
//!
//! Grammar: `<NAME> [arguments]`, name matched case-insensitively.
//!
//! ```text
//! MOVE <offset>
//! SELECT <start> <end>
//! INSERT <text>        INSERT "<text>"
//! DELETE
//! ```
//!
//! Parsing is a pure `&str -> Command` function. Range ordering and bounds
//! depend on the buffer, so those checks belong to the executor.

use crate::command::{Command, CommandError};

/// Parses one command line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CommandError::InvalidCommandFormat(
            "empty command".to_string(),
        ));
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (trimmed, ""),
    };

    match name.to_ascii_uppercase().as_str() {
        "MOVE" => parse_move(rest),
        "SELECT" => parse_select(rest),
        "INSERT" => parse_insert(rest),
        // Arguments are ignored.
        "DELETE" => Ok(Command::Delete),
        _ => Err(CommandError::UnknownCommand(name.to_string())),
    }
}

fn parse_move(args: &str) -> Result<Command, CommandError> {
    const EXPECTED: &str = "one non-negative offset";

    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err(CommandError::MissingArgument {
            command: "MOVE",
            expected: EXPECTED,
        }),
        [position] => {
            let position = parse_offset(position).ok_or_else(|| invalid("MOVE", args, EXPECTED))?;
            Ok(Command::Move { position })
        }
        _ => Err(invalid("MOVE", args, EXPECTED)),
    }
}

fn parse_select(args: &str) -> Result<Command, CommandError> {
    const EXPECTED: &str = "two non-negative offsets: start end";

    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err(CommandError::MissingArgument {
            command: "SELECT",
            expected: EXPECTED,
        }),
        [start, end] => {
            let start = parse_offset(start).ok_or_else(|| invalid("SELECT", args, EXPECTED))?;
            let end = parse_offset(end).ok_or_else(|| invalid("SELECT", args, EXPECTED))?;
            Ok(Command::Select { start, end })
        }
        _ => Err(invalid("SELECT", args, EXPECTED)),
    }
}

fn parse_insert(args: &str) -> Result<Command, CommandError> {
    let text = unquote(args);
    if text.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "INSERT",
            expected: "text to insert",
        });
    }
    Ok(Command::Insert {
        text: text.to_string(),
    })
}

/// Strips one pair of surrounding double quotes. No escapes are processed.
fn unquote(args: &str) -> &str {
    if args.len() >= 2 && args.starts_with('"') && args.ends_with('"') {
        &args[1..args.len() - 1]
    } else {
        args
    }
}

/// Accepts plain ASCII digits only: no sign, no separators.
fn parse_offset(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn invalid(command: &'static str, args: &str, expected: &'static str) -> CommandError {
    CommandError::InvalidArguments {
        command,
        args: args.to_string(),
        expected,
    }
}
