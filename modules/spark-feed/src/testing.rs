// Test fixtures for the feed pipeline.
//
// Three fakes matching the three trait boundaries:
// - FixtureElement (ItemElement): canned text + accessible label
// - FixtureItem (FeedItem): builder-assembled item tree
// - FixtureFeed (FeedSession): paged viewport over fixture items
//
// Plus RecordingSink (CandidateSink) for dispatch assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use spark_common::types::Candidate;

use crate::dispatch::CandidateSink;
use crate::item::{FeedItem, FeedSession, ItemElement};

// ---------------------------------------------------------------------------
// FixtureElement
// ---------------------------------------------------------------------------

pub struct FixtureElement {
    text: String,
    label: String,
}

impl FixtureElement {
    pub fn new(text: &str, label: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            label: label.to_string(),
        })
    }
}

impl ItemElement for FixtureElement {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

// ---------------------------------------------------------------------------
// FixtureItem
// ---------------------------------------------------------------------------

/// Builder-style fake feed item. `metric()` registers an element under a
/// marker; `control()` appends to the positional action group.
pub struct FixtureItem {
    markers: HashMap<String, Arc<FixtureElement>>,
    controls: Vec<Arc<FixtureElement>>,
    body_blocks: Vec<String>,
    extra_text: Vec<String>,
    graphic_labels: Vec<String>,
    timestamp: Option<DateTime<Utc>>,
    permalink: Option<String>,
    author: Option<String>,
}

impl FixtureItem {
    pub fn new(permalink: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            markers: HashMap::new(),
            controls: Vec::new(),
            body_blocks: Vec::new(),
            extra_text: Vec::new(),
            graphic_labels: Vec::new(),
            timestamp: Some(created_at),
            permalink: Some(permalink.to_string()),
            author: None,
        }
    }

    pub fn without_timestamp(permalink: &str) -> Self {
        let mut item = Self::new(permalink, Utc::now());
        item.timestamp = None;
        item
    }

    pub fn without_permalink(created_at: DateTime<Utc>) -> Self {
        let mut item = Self::new("", created_at);
        item.permalink = None;
        item
    }

    /// Append a body-text block. The second block registers as quoted text.
    pub fn body(mut self, text: &str) -> Self {
        self.body_blocks.push(text.to_string());
        self
    }

    pub fn author(mut self, text: &str) -> Self {
        self.author = Some(text.to_string());
        self
    }

    pub fn metric(mut self, marker: &str, text: &str, label: &str) -> Self {
        self.markers
            .insert(marker.to_string(), FixtureElement::new(text, label));
        self
    }

    pub fn control(mut self, text: &str, label: &str) -> Self {
        self.controls.push(FixtureElement::new(text, label));
        self
    }

    pub fn extra_text(mut self, text: &str) -> Self {
        self.extra_text.push(text.to_string());
        self
    }

    pub fn graphic_label(mut self, label: &str) -> Self {
        self.graphic_labels.push(label.to_string());
        self
    }
}

impl FeedItem for FixtureItem {
    fn find(&self, marker: &str) -> Option<Arc<dyn ItemElement>> {
        self.markers
            .get(marker)
            .map(|el| el.clone() as Arc<dyn ItemElement>)
    }

    fn action_controls(&self) -> Vec<Arc<dyn ItemElement>> {
        self.controls
            .iter()
            .map(|el| el.clone() as Arc<dyn ItemElement>)
            .collect()
    }

    fn body_blocks(&self) -> Vec<String> {
        self.body_blocks.clone()
    }

    fn text_content(&self) -> String {
        let mut parts = self.body_blocks.clone();
        parts.extend(self.extra_text.clone());
        parts.join("\n")
    }

    fn graphic_labels(&self) -> Vec<String> {
        self.graphic_labels.clone()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn permalink(&self) -> Option<String> {
        self.permalink.clone()
    }

    fn author_text(&self) -> Option<String> {
        self.author.clone()
    }
}

// ---------------------------------------------------------------------------
// FixtureFeed
// ---------------------------------------------------------------------------

/// Paged fake feed: each viewport advance reveals the next page of items.
/// The last page repeats once the feed is exhausted, like a real timeline
/// that has stopped loading new content.
pub struct FixtureFeed {
    pages: Vec<Vec<Arc<FixtureItem>>>,
    cursor: Mutex<usize>,
    resets: AtomicU32,
}

impl FixtureFeed {
    pub fn new(pages: Vec<Vec<FixtureItem>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(Arc::new).collect())
                .collect(),
            cursor: Mutex::new(0),
            resets: AtomicU32::new(0),
        }
    }

    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FeedSession for FixtureFeed {
    fn visible_items(&self) -> Vec<Arc<dyn FeedItem>> {
        let cursor = *self.cursor.lock().unwrap();
        match self.pages.get(cursor) {
            Some(page) => page
                .iter()
                .map(|item| item.clone() as Arc<dyn FeedItem>)
                .collect(),
            None => Vec::new(),
        }
    }

    async fn reset_viewport(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
        *self.cursor.lock().unwrap() = 0;
    }

    async fn advance_viewport(&self) {
        let mut cursor = self.cursor.lock().unwrap();
        if *cursor + 1 < self.pages.len() {
            *cursor += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Records submitted candidates; can be told to fail specific permalinks to
/// exercise partial-dispatch-failure handling.
#[derive(Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<Candidate>>,
    fail_permalinks: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, permalink: &str) -> Self {
        self.fail_permalinks
            .lock()
            .unwrap()
            .push(permalink.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<Candidate> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateSink for RecordingSink {
    async fn submit(&self, candidate: &Candidate) -> Result<()> {
        if self
            .fail_permalinks
            .lock()
            .unwrap()
            .contains(&candidate.permalink_url)
        {
            anyhow::bail!("RecordingSink: configured failure for {}", candidate.permalink_url);
        }
        self.submitted.lock().unwrap().push(candidate.clone());
        Ok(())
    }
}
