//! Research stage: topic → evidence set.
//!
//! Fetches web hits for the topic, asks the model to summarize them into a
//! raw narrative, and persists the whole evidence set. When the model is
//! unavailable or returns a degenerate reply, the narrative is synthesized
//! from the hits themselves.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::prompts::RESEARCHER_SYSTEM_PROMPT;
use crate::search::{SearchHit, SearchProvider};
use crate::stages::clip;
use crate::store::{slug, OutputStore};

/// Sentinel narrative for a topic with no search hits.
const NO_RESULTS_ANALYSIS: &str = "No results found";

/// Replies the model backend produces when it has nothing to say; treated
/// the same as an error.
const DEGENERATE_REPLIES: [&str; 3] = ["", "[]", "{}"];

/// Evidence gathered for one topic. Immutable once returned; hit order is
/// the collaborator's ranking and is significant for downstream top-N
/// truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSet {
    pub topic: String,

    /// ISO-8601 UTC timestamp of when the research ran.
    pub timestamp: String,

    pub hits: Vec<SearchHit>,

    /// Model-produced (or fallback) narrative over the hits.
    pub raw: String,

    /// Alias of `raw` kept in the persisted artifact for readers that expect
    /// an `analysis` field.
    pub analysis: String,
}

impl EvidenceSet {
    fn empty(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            hits: Vec::new(),
            raw: String::new(),
            analysis: NO_RESULTS_ANALYSIS.to_string(),
        }
    }
}

/// The research stage.
pub struct Researcher {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
    store: OutputStore,
    model: String,
}

impl Researcher {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        store: OutputStore,
        model: impl Into<String>,
    ) -> Self {
        Self { llm, search, store, model: model.into() }
    }

    /// Gather evidence for `topic` using up to `top_k` search hits.
    ///
    /// Zero hits yields a sentinel evidence set with empty `hits`/`raw`;
    /// callers treat that as a terminal pipeline failure, so nothing is
    /// persisted for it.
    pub async fn run(&self, topic: &str, top_k: usize) -> EvidenceSet {
        info!(topic = %topic, "Starting research");

        let hits = self.search.search(topic, top_k).await;
        info!(count = hits.len(), "Search results collected");

        if hits.is_empty() {
            warn!(topic = %topic, "No search results found");
            return EvidenceSet::empty(topic);
        }

        let raw = match self.summarize(topic, &hits).await {
            Some(text) => text,
            None => self.fallback_narrative(topic, &hits),
        };

        let evidence = EvidenceSet {
            topic: topic.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            analysis: raw.clone(),
            raw,
            hits,
        };

        if let Some(path) = self
            .store
            .save_json(&evidence, &format!("research_{}", slug(topic)))
        {
            info!(path = %path.display(), "Research saved");
        }

        evidence
    }

    /// Primary path: ask the model for key insights over the hit list.
    /// Returns `None` on any error or degenerate reply.
    async fn summarize(&self, topic: &str, hits: &[SearchHit]) -> Option<String> {
        let mut prompt = format!("Analyze these search results about \"{topic}\":\n\n");
        for (i, hit) in hits.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, hit.title));
            prompt.push_str(&format!("   URL: {}\n", hit.url));
            prompt.push_str(&format!("   Info: {}\n\n", clip(&hit.snippet, 200)));
        }
        prompt.push_str("\nProvide 3-5 key insights about this topic in simple bullet points.");

        let request = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage::system(RESEARCHER_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
        )
        .with_temperature(0.3)
        .with_max_tokens(500);

        match self.llm.complete(request).await {
            Ok(response) => {
                let text = response.content;
                if DEGENERATE_REPLIES.contains(&text.trim()) {
                    warn!("Model returned an empty reply, using fallback narrative");
                    None
                } else {
                    info!(chars = text.chars().count(), "Research summary received");
                    Some(text)
                }
            }
            Err(e) => {
                warn!(error = %e, "Research model call failed, using fallback narrative");
                None
            }
        }
    }

    /// Deterministic narrative built from the first 3 hits.
    fn fallback_narrative(&self, topic: &str, hits: &[SearchHit]) -> String {
        let mut narrative = format!("Analysis of '{topic}':\n\n");
        narrative.push_str(&format!("Found {} relevant sources:\n\n", hits.len()));
        for (i, hit) in hits.iter().take(3).enumerate() {
            narrative.push_str(&format!("{}. {}\n", i + 1, hit.title));
            narrative.push_str(&format!("   Source: {}\n\n", hit.url));
        }
        narrative
    }
}
