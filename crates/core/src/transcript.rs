use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a turn is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The ordered, append-only conversation log of a session.
///
/// Turns can only be added at the end. The only way to drop entries is
/// [`Transcript::seed`], which starts a fresh log for a new session.
/// On the wire a transcript is a plain JSON array of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the log to a single system turn.
    pub fn seed(&mut self, system_prompt: impl Into<String>) {
        self.turns.clear();
        self.turns.push(Turn::system(system_prompt));
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Turns meant for display: everything except `system` turns, in order.
    pub fn visible(&self) -> impl Iterator<Item = &Turn> + Clone {
        self.turns.iter().filter(|t| t.role != Role::System)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Plain-text rendering used by the batch evaluation endpoint.
    /// System turns are left out.
    pub fn render_plain(&self) -> String {
        self.visible()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Turn>> for Transcript {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_resets_to_single_system_turn() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("left over"));
        transcript.append(Turn::assistant("from before"));

        transcript.seed("You are an interviewer.");

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0], Turn::system("You are an interviewer."));
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.seed("sys");
        transcript.append(Turn::user("one"));
        transcript.append(Turn::assistant("two"));
        transcript.append(Turn::user("three"));

        let contents: Vec<&str> = transcript.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "one", "two", "three"]);
        assert_eq!(transcript.last(), Some(&Turn::user("three")));
    }

    #[test]
    fn visible_skips_system_turns_and_is_restartable() {
        let mut transcript = Transcript::new();
        transcript.seed("sys");
        transcript.append(Turn::user("hello"));
        transcript.append(Turn::assistant("question?"));
        transcript.append(Turn::system("rubric"));
        transcript.append(Turn::user("evaluate please"));

        let visible = transcript.visible();
        let first: Vec<_> = visible.clone().map(|t| t.content.clone()).collect();
        let second: Vec<_> = visible.map(|t| t.content.clone()).collect();

        assert_eq!(first, vec!["hello", "question?", "evaluate please"]);
        assert_eq!(first, second);
        // Deriving the view does not touch the log.
        assert_eq!(transcript.len(), 5);
    }

    #[test]
    fn serializes_as_array_with_lowercase_roles() {
        let mut transcript = Transcript::new();
        transcript.seed("sys");
        transcript.append(Turn::assistant("Tell me about yourself."));

        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": "sys"},
                {"role": "assistant", "content": "Tell me about yourself."}
            ])
        );
    }

    #[test]
    fn render_plain_lists_visible_turns() {
        let transcript = Transcript::from(vec![
            Turn::system("hidden"),
            Turn::assistant("Why Rust?"),
            Turn::user("Memory safety."),
        ]);

        assert_eq!(
            transcript.render_plain(),
            "assistant: Why Rust?\nuser: Memory safety."
        );
    }
}
