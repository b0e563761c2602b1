// Trait abstractions over the live feed's item tree.
//
// The feed is a mutable external surface the extractor only ever queries.
// ItemElement/FeedItem/FeedSession keep that surface injectable, so the
// pipeline runs against fixture-backed fakes in tests and against a real
// page driver in deployment. Extraction logic never touches a concrete
// page structure directly.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One interactive control or labeled element inside a feed item.
pub trait ItemElement: Send + Sync {
    /// Visible text content, untrimmed.
    fn text(&self) -> String;

    /// Accessible label; empty string when the element exposes none.
    fn label(&self) -> String;
}

/// One unit of feed content subject to extraction.
///
/// The core assumes nothing about the underlying markup beyond the stable
/// identifying markers for like/unlike, repost/unrepost, reply, the views
/// counter, and a permalink-bearing timestamp anchor.
pub trait FeedItem: Send + Sync {
    /// Look up a descendant element by its stable identifying marker.
    fn find(&self, marker: &str) -> Option<Arc<dyn ItemElement>>;

    /// The item's action controls in on-screen order
    /// (reply, repost, like, then views when present).
    fn action_controls(&self) -> Vec<Arc<dyn ItemElement>>;

    /// Distinct body-text blocks in document order. When an item quotes
    /// another post, the quoted text appears as the second block.
    fn body_blocks(&self) -> Vec<String>;

    /// The item's entire visible text.
    fn text_content(&self) -> String;

    /// Accessible labels exposed by icon/graphic elements within the item.
    fn graphic_labels(&self) -> Vec<String>;

    /// Machine timestamp of the post, when resolvable.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Permalink carried by the timestamp anchor.
    fn permalink(&self) -> Option<String>;

    /// Raw author element text (may span multiple lines).
    fn author_text(&self) -> Option<String>;
}

/// A scrollable view onto the continuously-mutating feed. One scan owns one
/// session; no two scans share a session concurrently.
#[async_trait]
pub trait FeedSession: Send + Sync {
    /// Snapshot of the items currently in the viewport.
    fn visible_items(&self) -> Vec<Arc<dyn FeedItem>>;

    /// Return the viewport to the top of the feed.
    async fn reset_viewport(&self);

    /// Advance the viewport by a fixed fraction of one screenful.
    async fn advance_viewport(&self);
}
