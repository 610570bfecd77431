//! Message Log
//!
//! Append-only transcript of the conversation. Sequence numbers start at 1 and
//! strictly increase; a message is never edited, reordered or removed once
//! appended. The workflow session is the only writer; renderers read through
//! [`MessageLog::iter`] or [`MessageLog::since`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a transcript entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed or clicked by the user
    User,

    /// Produced by the assistant, the backend or the live channel
    System,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::User => write!(f, "user"),
            Origin::System => write!(f, "system"),
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
    pub sequence: u64,
    pub at: DateTime<Utc>,
}

/// Append-only ordered record of exchanged messages
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its sequence number
    ///
    /// Reads the current tail, appends and advances in one step; callers hold
    /// `&mut self`, so no other append can interleave.
    pub fn append(&mut self, origin: Origin, text: impl Into<String>) -> u64 {
        let sequence = self.last_sequence().map_or(1, |last| last + 1);
        self.messages.push(Message {
            origin,
            text: text.into(),
            sequence,
            at: Utc::now(),
        });
        sequence
    }

    /// Iterate over all messages in sequence order
    ///
    /// The iterator is lazy and finite; call again to restart from the top.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Messages appended strictly after `sequence`
    pub fn since(&self, sequence: u64) -> &[Message] {
        let start = self.messages.partition_point(|m| m.sequence <= sequence);
        &self.messages[start..]
    }

    /// Look up a message by sequence number
    pub fn get(&self, sequence: u64) -> Option<&Message> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.messages.get(index)
    }

    /// Sequence number of the most recent message
    pub fn last_sequence(&self) -> Option<u64> {
        self.messages.last().map(|m| m.sequence)
    }

    /// Most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copy the transcript out for a renderer snapshot
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_increasing_sequences() {
        let mut log = MessageLog::new();
        assert_eq!(log.last_sequence(), None);

        let first = log.append(Origin::System, "HELLO WELCOME !!!");
        let second = log.append(Origin::User, "hi");
        let third = log.append(Origin::System, "How can I help?");

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(log.len(), 3);
        assert_eq!(log.last_sequence(), Some(3));
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut log = MessageLog::new();
        log.append(Origin::User, "a");
        log.append(Origin::System, "b");

        let first_pass: Vec<_> = log.iter().map(|m| m.text.clone()).collect();
        let second_pass: Vec<_> = (&log).into_iter().map(|m| m.text.clone()).collect();

        assert_eq!(first_pass, vec!["a", "b"]);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_since_returns_only_newer_messages() {
        let mut log = MessageLog::new();
        for text in ["one", "two", "three", "four"] {
            log.append(Origin::User, text);
        }

        let newer: Vec<_> = log.since(2).iter().map(|m| m.text.as_str()).collect();
        assert_eq!(newer, vec!["three", "four"]);
        assert_eq!(log.since(0).len(), 4);
        assert!(log.since(4).is_empty());
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn test_get_by_sequence() {
        let mut log = MessageLog::new();
        log.append(Origin::User, "Yes");
        log.append(Origin::System, "ok");

        assert_eq!(log.get(1).map(|m| m.text.as_str()), Some("Yes"));
        assert_eq!(log.get(2).map(|m| m.origin), Some(Origin::System));
        assert!(log.get(0).is_none());
        assert!(log.get(3).is_none());
    }
}
