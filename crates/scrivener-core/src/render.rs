//! Editor context rendering.
//!
//! Turns a `BufferState` into the text block the assistant reads before
//! it emits commands. The numbered listing is there so it can work out
//! absolute offsets for lines other than the current one.
//!
//! ```text
//! Total lines: 2
//! Cursor: line 1, column 5 (absolute offset 5)
//! Current line: hello| world
//! Content:
//!    1 | hello world
//!    2 | bye
//! ```

use scrivener_buffer::BufferState;

use crate::config::RenderConfig;

/// Renders the context block for `state`.
pub fn render_context(state: &BufferState, config: &RenderConfig) -> String {
    let content = state.content();
    let lines = content.lines();
    // cursor <= len is a BufferState invariant
    let position = content.position_of(state.cursor()).unwrap_or_default();

    let mut out = String::new();
    out.push_str(&format!("Total lines: {}\n", content.line_count()));
    out.push_str(&format!(
        "Cursor: line {}, column {} (absolute offset {})\n",
        position.line + 1,
        position.column,
        state.cursor()
    ));

    if let Some(selected) = state.selected_text() {
        out.push_str(&format!(
            "Selection: {} ({} chars): {:?}\n",
            state.selection(),
            state.selection().len(),
            selected
        ));
    }

    let current = lines.get(position.line).map(String::as_str).unwrap_or("");
    out.push_str(&format!(
        "Current line: {}\n",
        with_marker(current, position.column, &config.cursor_marker)
    ));

    out.push_str("Content:\n");
    let width = config.line_number_width;
    for (idx, line) in lines.iter().enumerate() {
        out.push_str(&format!("{:>width$} | {}\n", idx + 1, line));
    }

    out
}

/// Inserts `marker` at character column `column` of `line`.
fn with_marker(line: &str, column: usize, marker: &str) -> String {
    let split = line
        .char_indices()
        .nth(column)
        .map(|(byte, _)| byte)
        .unwrap_or(line.len());

    let mut marked = String::with_capacity(line.len() + marker.len());
    marked.push_str(&line[..split]);
    marked.push_str(marker);
    marked.push_str(&line[split..]);
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_buffer::Selection;

    fn render(state: &BufferState) -> String {
        render_context(state, &RenderConfig::default())
    }

    #[test]
    fn test_render_single_line() {
        let state = BufferState::from("hello world").with_cursor(5).unwrap();
        let out = render(&state);

        assert!(out.contains("Total lines: 1\n"));
        assert!(out.contains("Cursor: line 1, column 5 (absolute offset 5)\n"));
        assert!(out.contains("Current line: hello| world\n"));
        assert!(out.contains("   1 | hello world\n"));
        assert!(!out.contains("Selection:"));
    }

    #[test]
    fn test_render_multi_line() {
        let state = BufferState::from("ab\ncde\n").with_cursor(4).unwrap();
        let out = render(&state);

        assert!(out.contains("Total lines: 3\n"));
        assert!(out.contains("Cursor: line 2, column 1 (absolute offset 4)\n"));
        assert!(out.contains("Current line: c|de\n"));
        assert!(out.ends_with("   1 | ab\n   2 | cde\n   3 | \n"));
    }

    #[test]
    fn test_render_cursor_at_end_of_line() {
        let state = BufferState::from("ab\ncd").with_cursor(2).unwrap();
        assert!(render(&state).contains("Current line: ab|\n"));
    }

    #[test]
    fn test_render_selection() {
        let state = BufferState::from("hello world")
            .with_selection(Selection::new(6, 11).unwrap())
            .unwrap();
        assert!(render(&state).contains("Selection: 6-11 (5 chars): \"world\"\n"));
    }

    #[test]
    fn test_render_empty_buffer() {
        let out = render(&BufferState::default());
        assert!(out.contains("Total lines: 1\n"));
        assert!(out.contains("Current line: |\n"));
    }

    #[test]
    fn test_custom_marker_and_width() {
        let config = RenderConfig {
            cursor_marker: "▮".to_string(),
            line_number_width: 2,
        };
        let state = BufferState::from("héllo").with_cursor(2).unwrap();
        let out = render_context(&state, &config);
        assert!(out.contains("Current line: hé▮llo\n"));
        assert!(out.contains(" 1 | héllo\n"));
    }
}
