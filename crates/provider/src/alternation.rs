//! Role alternation for reasoner-style models
//!
//! Some models reject a conversation unless every `system` turn comes first
//! and the rest strictly alternates `user`/`assistant`, starting and ending
//! with `user`.

use crate::{Message, Role};

/// Filler `user` turn injected where the alternation would break
pub const CONTINUATION_PROMPT: &str =
    "Continue the discovery and propose the next action as JSON.";

/// Reshape `messages` into the alternating form.
///
/// System turns are hoisted in their original order. A run of user turns
/// keeps only the latest one; an assistant turn that would follow another
/// assistant turn (or open the sequence) gets a filler user turn before it,
/// and a filler is appended when the sequence would end on the assistant.
pub fn reshape_alternating(messages: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .cloned()
        .collect();

    let mut turns: Vec<Message> = Vec::new();
    for msg in messages.iter().filter(|m| m.role != Role::System) {
        match (turns.last().map(|t| t.role), msg.role) {
            (Some(Role::User), Role::User) => {
                turns.pop();
            }
            (None, Role::Assistant) | (Some(Role::Assistant), Role::Assistant) => {
                turns.push(Message::user(CONTINUATION_PROMPT));
            }
            _ => {}
        }
        turns.push(msg.clone());
    }

    if turns.last().map(|t| t.role) != Some(Role::User) {
        turns.push(Message::user(CONTINUATION_PROMPT));
    }

    out.extend(turns);
    out
}

/// Whether `messages` already satisfy the alternation rule
pub fn is_alternating(messages: &[Message]) -> bool {
    let first_turn = messages
        .iter()
        .position(|m| m.role != Role::System)
        .unwrap_or(messages.len());
    let turns = &messages[first_turn..];

    turns.len() % 2 == 1
        && turns.iter().enumerate().all(|(i, m)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            m.role == expected
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_already_alternating_unchanged() {
        let messages = vec![
            Message::system("rules"),
            Message::user("task"),
            Message::assistant("{}"),
            Message::user("next"),
        ];

        let reshaped = reshape_alternating(&messages);
        assert_eq!(reshaped, messages);
        assert!(is_alternating(&reshaped));
    }

    #[test]
    fn test_system_messages_hoisted() {
        let messages = vec![
            Message::system("rules"),
            Message::user("task"),
            Message::assistant("{\"action\":\"modify_fields\"}"),
            Message::system("Current field status:\n[]"),
        ];

        let reshaped = reshape_alternating(&messages);
        assert_eq!(
            roles(&reshaped),
            vec![
                Role::System,
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(reshaped[1].content, "Current field status:\n[]");
        assert_eq!(reshaped[4].content, CONTINUATION_PROMPT);
        assert!(is_alternating(&reshaped));
    }

    #[test]
    fn test_consecutive_assistants_get_filler() {
        let messages = vec![
            Message::user("task"),
            Message::assistant("a1"),
            Message::assistant("a2"),
        ];

        let reshaped = reshape_alternating(&messages);
        assert_eq!(
            roles(&reshaped),
            vec![
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(reshaped[2].content, CONTINUATION_PROMPT);
        assert_eq!(reshaped[3].content, "a2");
    }

    #[test]
    fn test_consecutive_users_keep_latest() {
        let messages = vec![Message::user("old"), Message::user("new")];

        let reshaped = reshape_alternating(&messages);
        assert_eq!(reshaped, vec![Message::user("new")]);
    }

    #[test]
    fn test_leading_assistant_gets_filler() {
        let messages = vec![Message::system("s"), Message::assistant("a")];

        let reshaped = reshape_alternating(&messages);
        assert_eq!(
            roles(&reshaped),
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert!(is_alternating(&reshaped));
    }

    #[test]
    fn test_only_system_messages() {
        let reshaped = reshape_alternating(&[Message::system("s")]);
        assert_eq!(
            reshaped,
            vec![Message::system("s"), Message::user(CONTINUATION_PROMPT)]
        );
    }

    #[test]
    fn test_is_alternating_rejects_trailing_assistant() {
        let messages = vec![Message::user("u"), Message::assistant("a")];
        assert!(!is_alternating(&messages));
    }

    #[test]
    fn test_is_alternating_rejects_late_system() {
        let messages = vec![Message::user("u"), Message::system("s")];
        assert!(!is_alternating(&messages));
    }
}
