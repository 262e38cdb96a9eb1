//! Shared types for the comment eligibility pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a comment reads as a question or a statement.
///
/// Drives template selection: questions get the question template,
/// statements get one of two equivalent statement templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Question,
    Statement,
}

/// Why a comment was passed over. Skips are policy, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Below the minimum text length (low-signal comment).
    TooShort { length: usize, minimum: usize },
    /// Thread already has more replies than we pile onto.
    ThreadTooActive { replies: u32, ceiling: u32 },
    /// We replied to this author within the cooldown period.
    AuthorOnCooldown { last_replied_at: DateTime<Utc> },
    /// No configured keyword appears in the text.
    NoKeywordMatch,
}

impl SkipReason {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::ThreadTooActive { .. } => "thread_too_active",
            Self::AuthorOnCooldown { .. } => "author_on_cooldown",
            Self::NoKeywordMatch => "no_keyword_match",
        }
    }
}

/// Pipeline verdict for one comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Worth replying to: the first matching keyword (in configured list
    /// order) and the question/statement classification.
    Eligible {
        keyword: String,
        classification: Classification,
    },
    /// Deliberately passed over.
    Skip(SkipReason),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }
}
