//! Free-text normalization
//!
//! Typing "yes" or "no" while the assistant waits for that answer must act
//! exactly like pressing the button. The session routes recognized text
//! through the same handler as the button event.

use serde::Serialize;

/// Answer to the additional-tests question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reply {
    Yes,
    No,
}

impl Reply {
    /// Transcript text recorded for the answer
    pub fn transcript_text(self) -> &'static str {
        match self {
            Reply::Yes => "Yes",
            Reply::No => "No",
        }
    }
}

/// Recognize a yes/no answer in free text
///
/// Case-insensitive; surrounding whitespace is ignored. Anything else,
/// including "yes please", is not an answer.
pub fn parse_reply(text: &str) -> Option<Reply> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("yes") {
        Some(Reply::Yes)
    } else if text.eq_ignore_ascii_case("no") {
        Some(Reply::No)
    } else {
        None
    }
}
