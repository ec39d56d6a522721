use scribe_core::Message;

/// Build the summarization prompt for one window.
///
/// Layout: the instruction, then the previous summary anchor if one exists,
/// then one `role: content` line per window message in ascending id order.
pub fn build_prompt(instruction: &str, previous_summary: Option<&Message>, window: &[Message]) -> String {
    let mut lines = Vec::with_capacity(window.len() + 2);
    let instruction = instruction.trim();
    if !instruction.is_empty() {
        lines.push(instruction.to_string());
    }
    if let Some(summary) = previous_summary {
        lines.push(format!("Previous summary: {}", summary.content.trim()));
    }
    // Window lines go in exactly as stored.
    lines.extend(window.iter().map(Message::transcript_line));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scribe_core::Role;

    fn msg(id: i64, role: Role, content: &str) -> Message {
        Message {
            id,
            session_id: "s".into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_lists_window_in_order() {
        let window = vec![
            msg(1, Role::User, "hi"),
            msg(2, Role::Assistant, "hello, how can I help?"),
            msg(3, Role::User, "tell me about rust"),
        ];
        let prompt = build_prompt("Summarize:", None, &window);
        assert_eq!(
            prompt,
            "Summarize:\nuser: hi\nassistant: hello, how can I help?\nuser: tell me about rust"
        );
    }

    #[test]
    fn test_window_content_is_not_trimmed() {
        let window = vec![
            msg(1, Role::User, "  indented question"),
            msg(2, Role::Assistant, "answer with trailing space "),
        ];
        let prompt = build_prompt("  Summarize:\n", None, &window);
        assert_eq!(
            prompt,
            "Summarize:\nuser:   indented question\nassistant: answer with trailing space "
        );
    }

    #[test]
    fn test_prompt_carries_previous_summary() {
        let previous = msg(7, Role::Summary, "  the user is learning rust  ");
        let window = vec![msg(8, Role::User, "what about lifetimes?")];
        let prompt = build_prompt("Summarize:", Some(&previous), &window);
        assert_eq!(
            prompt,
            "Summarize:\nPrevious summary: the user is learning rust\nuser: what about lifetimes?"
        );
    }
}
