use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ai_client::util::truncate_to_char_boundary;
use spark_common::types::ReplyRecord;

/// Post bodies are short, but quoted chains can drag arbitrary page text in.
const MAX_POST_BYTES: usize = 4_000;

const SYSTEM_PROMPT: &str = r#"You draft reply suggestions for posts on X (Twitter).

You reply as an experienced indie developer who also follows markets, economics, math and education topics. Replies are warm, specific, and add something: a detail, a question, or a different angle. Never generic praise, never hashtags, never emoji spam. Keep each reply under 140 characters so it fits comfortably.

First classify the post's topic as exactly one of: 'PoliticsEconomics', 'Stocks', 'Math', 'Education', 'IndieDev', 'SaaS'.

Respond with JSON only, in this shape:
{"topic": "<one of the topics above>", "suggestions": ["<reply 1>", "<reply 2>", ...]}"#;

/// An entry in the optional reference-knowledge list injected into the
/// system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub content: String,
}

/// Load knowledge entries from a JSON file (an array of {title, content}).
pub fn load_knowledge(path: &str) -> Result<Vec<KnowledgeEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read knowledge file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse knowledge file {path}"))
}

/// Builds the system and per-record user prompts for reply generation.
#[derive(Debug, Clone)]
pub struct ReplyPromptBuilder {
    suggestion_count: usize,
    knowledge: Vec<KnowledgeEntry>,
}

impl ReplyPromptBuilder {
    pub fn new(suggestion_count: usize, knowledge: Vec<KnowledgeEntry>) -> Self {
        Self {
            suggestion_count,
            knowledge,
        }
    }

    pub fn system_prompt(&self) -> String {
        if self.knowledge.is_empty() {
            return SYSTEM_PROMPT.to_string();
        }
        let sources: String = self
            .knowledge
            .iter()
            .map(|k| format!("Title: {}\nContent: {}", k.title, k.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{SYSTEM_PROMPT}\n\nReference sources you may draw on:\n{sources}")
    }

    pub fn user_prompt(&self, record: &ReplyRecord) -> String {
        let body = truncate_to_char_boundary(&record.body_text, MAX_POST_BYTES);
        let mut prompt = format!(
            "Target post by {}:\n{}\n",
            record.author_name, body
        );
        if let Some(quoted) = record.quoted_text.as_deref().filter(|q| !q.is_empty()) {
            let quoted = truncate_to_char_boundary(quoted, MAX_POST_BYTES);
            prompt.push_str(&format!("\nThe post quotes this content:\n{quoted}\n"));
        }
        prompt.push_str(&format!(
            "\nGenerate exactly {} reply suggestions.",
            self.suggestion_count
        ));
        prompt
    }
}
