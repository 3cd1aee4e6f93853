//! Conversation history windowing.
//!
//! Bounds the history sent per model request: at most `max_messages`
//! messages, each capped to `max_chars` characters, with one synthetic
//! system message summarizing anything dropped. The caller's history is
//! never mutated; windowing returns a fresh list.

use crate::message::{ConversationMessage, MessageRole};

/// Default maximum number of history messages per request.
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Default per-message character cap.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;

const TRUNCATION_MARKER: char = '…';
const OMITTED_PREFIX: &str = "[Earlier context omitted: ";

/// Windows a conversation history for one model request.
///
/// Returns at most `max_messages + 1` messages: when the history is
/// longer than `max_messages`, only the most recent `max_messages` are
/// kept and one synthetic system message stating how many were omitted
/// is prepended. Each message's text is capped to `max_chars` characters
/// total, marker included. Idempotent: re-applying to its own output is
/// a no-op.
pub fn window_history(
    messages: &[ConversationMessage],
    max_messages: usize,
    max_chars: usize,
) -> Vec<ConversationMessage> {
    // A summary marker left by a previous pass is absorbed into this
    // pass's marker, so markers never stack and the count stays exact.
    let (carried, messages) = match messages.first() {
        Some(first)
            if first.role == MessageRole::System && first.content.starts_with(OMITTED_PREFIX) =>
        {
            (parse_omitted_count(&first.content), &messages[1..])
        }
        _ => (0, messages),
    };

    let omitted = messages.len().saturating_sub(max_messages) + carried;
    let kept = &messages[messages.len().saturating_sub(max_messages)..];

    let mut windowed = Vec::with_capacity(kept.len() + 1);
    if omitted > 0 {
        windowed.push(ConversationMessage::system(format!(
            "{OMITTED_PREFIX}{omitted} earlier messages]"
        )));
    }
    windowed.extend(kept.iter().map(|message| cap_message(message, max_chars)));
    windowed
}

fn parse_omitted_count(content: &str) -> usize {
    content[OMITTED_PREFIX.len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

fn cap_message(message: &ConversationMessage, max_chars: usize) -> ConversationMessage {
    if message.content.chars().count() <= max_chars {
        return message.clone();
    }

    let mut content: String = message
        .content
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect();
    content.push(TRUNCATION_MARKER);
    ConversationMessage {
        role: message.role,
        content,
        timestamp: message.timestamp.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(count: usize) -> Vec<ConversationMessage> {
        (0..count)
            .map(|i| ConversationMessage::user(format!("message {i}")))
            .collect()
    }

    #[test]
    fn short_history_passes_through() {
        let messages = history(5);
        let windowed = window_history(&messages, 10, 100);
        assert_eq!(windowed, messages);
    }

    #[test]
    fn long_history_keeps_most_recent_plus_marker() {
        let messages = history(30);
        let windowed = window_history(&messages, 10, 100);

        assert_eq!(windowed.len(), 11);
        assert_eq!(windowed[0].role, MessageRole::System);
        assert!(windowed[0].content.contains("20 earlier messages"));
        assert_eq!(windowed[1].content, "message 20");
        assert_eq!(windowed[10].content, "message 29");
    }

    #[test]
    fn output_never_exceeds_max_plus_one() {
        for count in [0, 1, 10, 11, 50] {
            let windowed = window_history(&history(count), 10, 100);
            assert!(windowed.len() <= 11);
        }
    }

    #[test]
    fn messages_are_capped_with_marker() {
        let messages = vec![ConversationMessage::user("x".repeat(50))];
        let windowed = window_history(&messages, 10, 20);

        assert_eq!(windowed[0].content.chars().count(), 20);
        assert!(windowed[0].content.ends_with('…'));
    }

    #[test]
    fn windowing_is_idempotent() {
        let messages = history(30);
        let once = window_history(&messages, 10, 12);
        let twice = window_history(&once, 10, 12);
        assert_eq!(once, twice);
    }

    #[test]
    fn regrown_marked_history_folds_counts_into_one_marker() {
        // A previously windowed history whose tail has grown past the
        // window again: the old marker's count must be absorbed, never
        // stacked as a second marker.
        let mut messages = vec![ConversationMessage::system(
            "[Earlier context omitted: 5 earlier messages]",
        )];
        messages.extend(history(25));

        let windowed = window_history(&messages, 10, 100);

        assert_eq!(windowed.len(), 11);
        assert_eq!(windowed[0].role, MessageRole::System);
        // 5 carried + 15 newly omitted.
        assert!(windowed[0].content.contains("20 earlier messages"));
        let markers = windowed
            .iter()
            .filter(|m| m.content.starts_with("[Earlier context omitted:"))
            .count();
        assert_eq!(markers, 1);
        assert_eq!(windowed[10].content, "message 24");
    }

    #[test]
    fn ordering_is_preserved() {
        let messages = history(15);
        let windowed = window_history(&messages, 10, 100);
        let contents: Vec<_> = windowed[1..].iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<_> = (5..15).map(|i| format!("message {i}")).collect();
        assert_eq!(contents, expected);
    }
}
