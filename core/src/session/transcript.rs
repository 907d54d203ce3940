//! Conversation transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One line of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of a session's exchanges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, role: Role, text: S) {
        self.entries.push(TranscriptEntry {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything; only a session reset does this
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order() {
        let mut transcript = Transcript::new();
        transcript.push(Role::User, "hi");
        transcript.push(Role::Assistant, "hello");

        let roles: Vec<Role> = transcript.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(transcript.entries()[1].text, "hello");

        transcript.clear();
        assert!(transcript.is_empty());
    }
}
