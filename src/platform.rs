//! Platform collaborator seam.
//!
//! The engine never talks to a content platform directly; it consumes this
//! trait. A production deployment supplies an implementation backed by the
//! platform's API (channel lookup, video/comment listing, comment insert);
//! tests supply scripted stubs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A published unit of content (e.g. a video) with its own comment thread.
///
/// Platform-owned and immutable; the engine only observes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform-assigned id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
}

/// A single top-level comment on a content item.
///
/// Transient: fetched per item per run, never persisted individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Platform-assigned comment id (used as the reply parent).
    pub id: String,
    /// Author's channel id. The platform omits this for some accounts;
    /// such comments bypass the cooldown check.
    pub author_id: Option<String>,
    /// Raw comment text.
    pub text: String,
    /// Number of replies already on the comment.
    pub reply_count: u32,
}

/// External content-platform operations the engine requires.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Resolve the configured channel handle to a platform channel id.
    async fn resolve_channel_id(&self) -> Result<String, PlatformError>;

    /// List recent content items for a channel, most recent first.
    async fn list_recent_items(
        &self,
        channel_id: &str,
        max_results: u32,
        published_after: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>, PlatformError>;

    /// List top-level comments on an item, in chronological order.
    async fn list_comments(
        &self,
        item_id: &str,
        max_results: u32,
    ) -> Result<Vec<Comment>, PlatformError>;

    /// Post a reply under the given comment.
    async fn post_reply(&self, comment_id: &str, text: &str) -> Result<(), PlatformError>;
}
