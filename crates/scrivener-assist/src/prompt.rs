//! Building requests and reading replies.

use crate::message::{AssistRequest, ChatMessage};

/// Default system prompt describing the command language.
pub const SYSTEM_PROMPT: &str = "\
You edit a text buffer by emitting commands, one per line, and nothing else.

Commands:
  MOVE <offset>          put the cursor at an absolute character offset
  SELECT <start> <end>   select characters start..end (the cursor does not move)
  INSERT <text>          insert at the cursor, or replace the selection
  DELETE                 delete the selection, or the character before the cursor

Offsets count characters from 0 at the start of the buffer; each line break
is one character. Use the numbered listing to compute offsets on other lines.
Wrap INSERT text in double quotes to keep leading or trailing spaces. There
are no escape sequences. After INSERT the cursor sits after the inserted text;
after DELETE it sits where the removed text started.";

/// Builds the message list for one instruction.
pub fn build_request(system_prompt: &str, context: &str, instruction: &str) -> AssistRequest {
    let user = format!(
        "Editor state:\n{}\nInstruction: {}",
        context,
        instruction.trim()
    );
    AssistRequest {
        messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user)],
    }
}

/// Splits reply text into command lines.
///
/// Blank lines are dropped, and so are Markdown fence lines when
/// `strip_code_fences` is set. Lines are otherwise left as they are for
/// the parser to judge.
pub fn extract_commands(text: &str, strip_code_fences: bool) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !(strip_code_fences && line.starts_with("```")))
        .map(str::to_string)
        .collect()
}
