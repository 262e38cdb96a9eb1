//! Comment eligibility chain and question classifier.
//!
//! An ordered filter chain that short-circuits on the first failing
//! predicate: length → existing-reply ceiling → author cooldown → keyword
//! match. The order is an efficiency choice; the predicates are
//! independent, so reordering would not change the verdicts.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::BotConfig;
use crate::pipeline::types::{Classification, SkipReason, Verdict};
use crate::platform::Comment;
use crate::store::CooldownMap;

/// Lead-in phrases that mark a comment as a question even without a `?`.
const INTERROGATIVE_LEAD_INS: [&str; 8] = [
    "how ", "what ", "when ", "where ", "why ", "can you", "could you", "would you",
];

/// Stateless filter chain configured once per run.
pub struct EligibilityPipeline {
    min_comment_length: usize,
    max_existing_replies: u32,
    cooldown: Duration,
    keywords: Vec<String>,
}

impl EligibilityPipeline {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            min_comment_length: config.min_comment_length,
            max_existing_replies: config.max_existing_replies,
            cooldown: Duration::days(config.cooldown_days),
            keywords: config.keywords.clone(),
        }
    }

    /// Run one comment through the filter chain.
    ///
    /// `cooldowns` is the current author → last-replied-at map; `now` is
    /// injected so tests can pin the clock.
    pub fn evaluate(
        &self,
        comment: &Comment,
        cooldowns: &CooldownMap,
        now: DateTime<Utc>,
    ) -> Verdict {
        if comment.text.len() < self.min_comment_length {
            return self.skip(
                comment,
                SkipReason::TooShort {
                    length: comment.text.len(),
                    minimum: self.min_comment_length,
                },
            );
        }

        // Strictly-greater: a thread at exactly the ceiling is still engaged.
        if comment.reply_count > self.max_existing_replies {
            return self.skip(
                comment,
                SkipReason::ThreadTooActive {
                    replies: comment.reply_count,
                    ceiling: self.max_existing_replies,
                },
            );
        }

        // Comments without an author id cannot be cooldown-tracked and
        // pass this predicate.
        if let Some(author_id) = &comment.author_id {
            if let Some(&last) = cooldowns.get(author_id) {
                if now.signed_duration_since(last) < self.cooldown {
                    return self.skip(
                        comment,
                        SkipReason::AuthorOnCooldown {
                            last_replied_at: last,
                        },
                    );
                }
            }
        }

        let Some(keyword) = first_keyword(&comment.text, &self.keywords) else {
            return self.skip(comment, SkipReason::NoKeywordMatch);
        };

        let classification = classify(&comment.text);
        debug!(
            comment_id = %comment.id,
            keyword = %keyword,
            classification = ?classification,
            "Comment eligible"
        );
        Verdict::Eligible {
            keyword: keyword.to_string(),
            classification,
        }
    }

    fn skip(&self, comment: &Comment, reason: SkipReason) -> Verdict {
        debug!(comment_id = %comment.id, reason = reason.label(), "Comment skipped");
        Verdict::Skip(reason)
    }
}

/// First configured keyword (in list order) appearing in `text` as a
/// case-insensitive substring. List order is the tie-break, not "best"
/// match.
pub fn first_keyword<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .find(|k| lower.contains(&k.to_lowercase()))
        .map(String::as_str)
}

/// A comment is a question if it contains a literal `?` or any
/// interrogative lead-in phrase, case-insensitively.
pub fn classify(text: &str) -> Classification {
    if text.contains('?') {
        return Classification::Question;
    }
    let lower = text.to_lowercase();
    if INTERROGATIVE_LEAD_INS.iter().any(|p| lower.contains(p)) {
        Classification::Question
    } else {
        Classification::Statement
    }
}
