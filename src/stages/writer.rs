//! Writing stage: analysis + evidence → Markdown report draft.
//!
//! On rewrite attempts the previous critique's feedback is quoted verbatim
//! in the prompt, the temperature goes up (more exploratory rewrite) and the
//! output budget grows (room for the content the feedback calls out). The
//! fallback report always carries the same section structure the model was
//! asked for, so the critic has comparable material to score either way.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::prompts::WRITER_SYSTEM_PROMPT;
use crate::search::SearchHit;
use crate::stages::clip;
use crate::store::OutputStore;

/// Minimum usable draft length; anything shorter (after trimming) is
/// replaced by the structured fallback report.
const MIN_DRAFT_CHARS: usize = 50;

/// Title used when neither an explicit title nor a topic is available.
const GENERIC_TITLE: &str = "Automated Report";

/// Input to one writing attempt: evidence fields merged with the analysis
/// summary, plus the previous attempt's feedback on rewrites.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub topic: String,
    pub title: Option<String>,
    pub author: String,
    pub hits: Vec<SearchHit>,
    pub analysis: String,
    pub previous_feedback: Option<String>,
}

/// The writing stage.
pub struct Writer {
    llm: Arc<dyn LlmClient>,
    store: OutputStore,
    model: String,
}

impl Writer {
    pub fn new(llm: Arc<dyn LlmClient>, store: OutputStore, model: impl Into<String>) -> Self {
        Self { llm, store, model: model.into() }
    }

    /// Produce a Markdown report draft. Never fails: a model error or an
    /// unusably short reply degrades to a deterministic structured report.
    pub async fn run(&self, request: &DraftRequest) -> String {
        info!(sources = request.hits.len(), "Starting report writing");

        let title = request
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| Some(request.topic.clone()).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| GENERIC_TITLE.to_string());
        let today = Utc::now().date_naive().to_string();

        if request.hits.is_empty() {
            warn!("No research hits available, writing minimal report");
            return self.minimal_report(&title, &request.author, &today);
        }

        let draft = match self.compose(request, &title, &today).await {
            Some(markdown) => markdown,
            None => self.structured_report(&title, &request.author, &today, request),
        };

        if let Some(path) = self.store.save_text(&draft, "report.md") {
            info!(path = %path.display(), "Draft saved");
        }

        draft
    }

    /// Primary path. Returns `None` on error or an unusably short reply.
    async fn compose(&self, request: &DraftRequest, title: &str, today: &str) -> Option<String> {
        let mut prompt = format!(
            "Write a professional report about: {title}\n\n\
             Author: {}\n\
             Date: {today}\n\n\
             Research Summary:\n{}\n\n\
             Sources:\n",
            request.author,
            clip(&request.analysis, 1000)
        );

        for (i, hit) in request.hits.iter().take(5).enumerate() {
            prompt.push_str(&format!("{}. {} - {}\n", i + 1, hit.title, hit.url));
        }

        if let Some(feedback) = &request.previous_feedback {
            prompt.push_str(&format!(
                "\n\nIMPORTANT - Previous version had issues. \
                 Please improve based on this feedback:\n{feedback}\n\n\
                 Make sure to address all the points mentioned above.\n"
            ));
            info!("Including previous feedback in prompt");
        }

        prompt.push_str(
            "\n\nWrite a markdown report with:\n\
             1. Introduction (2-3 sentences)\n\
             2. Main Findings (bullet points)\n\
             3. Detailed Analysis\n\
             4. Conclusion (2-3 sentences)\n\
             5. References\n\n\
             Keep it professional, well-structured, and comprehensive.",
        );

        let is_rewrite = request.previous_feedback.is_some();
        let chat = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage::system(WRITER_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
        )
        .with_temperature(if is_rewrite { 0.7 } else { 0.5 })
        .with_max_tokens(if is_rewrite { 1500 } else { 1000 });

        match self.llm.complete(chat).await {
            Ok(response) => {
                let markdown = response.content;
                if markdown.trim().chars().count() < MIN_DRAFT_CHARS {
                    warn!("Model draft too short, using structured fallback");
                    None
                } else {
                    info!(chars = markdown.chars().count(), "Draft received");
                    Some(markdown)
                }
            }
            Err(e) => {
                warn!(error = %e, "Writer model call failed, using structured fallback");
                None
            }
        }
    }

    /// Deterministic structured report with the same sections the model was
    /// asked for. Always valid, non-empty Markdown.
    fn structured_report(
        &self,
        title: &str,
        author: &str,
        date: &str,
        request: &DraftRequest,
    ) -> String {
        let hits = &request.hits;
        let mut md = format!("# {title}\n\n**Author:** {author}  \n**Date:** {date}  \n\n---\n\n");

        md.push_str("## Introduction\n\n");
        md.push_str(&format!(
            "This report presents comprehensive research findings on {title}. \
             The analysis is based on {} authoritative sources from various publications. \
             This document aims to provide a thorough understanding of the subject matter.\n\n",
            hits.len()
        ));

        md.push_str("## Key Findings\n\n");
        if !request.analysis.is_empty() {
            for line in request.analysis.lines().take(10) {
                let line = line.trim();
                if !line.is_empty() && line.chars().count() > 20 {
                    md.push_str(&format!("- {line}\n"));
                }
            }
        } else {
            for hit in hits.iter().take(5) {
                md.push_str(&format!(
                    "- **{}**: {}...\n",
                    hit.title,
                    clip(&hit.snippet, 200)
                ));
            }
        }

        md.push_str(&format!(
            "\n## Detailed Analysis\n\n\
             The research on {title} reveals several important aspects:\n\n"
        ));
        for (i, hit) in hits.iter().take(3).enumerate() {
            let snippet = if hit.snippet.is_empty() {
                "No description available"
            } else {
                &hit.snippet
            };
            md.push_str(&format!("### {}. {}\n\n", i + 1, hit.title));
            md.push_str(&format!("{snippet}...\n\n"));
            md.push_str(&format!("*Source: [{}]({})*\n\n", hit.url, hit.url));
        }

        md.push_str("## Conclusion\n\n");
        md.push_str(&format!(
            "Based on the comprehensive research conducted, {title} demonstrates significant \
             relevance in current discussions and developments. The findings suggest that \
             further investigation and continued monitoring of this topic would be beneficial. \
             This report provides a solid foundation for understanding the key aspects and \
             implications.\n\n"
        ));

        md.push_str("## References\n\n");
        for (i, hit) in hits.iter().enumerate() {
            md.push_str(&format!("{}. [{}]({})\n", i + 1, hit.title, hit.url));
        }

        md
    }

    /// Minimal report when no evidence exists at all.
    fn minimal_report(&self, title: &str, author: &str, date: &str) -> String {
        format!(
            "# {title}\n\n**Author:** {author}  \n**Date:** {date}  \n\n---\n\n\
             ## Note\n\nNo research data was available for this report.\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OfflineLlm;

    fn hits(n: usize) -> Vec<SearchHit> {
        (1..=n)
            .map(|i| SearchHit {
                title: format!("Source {i}"),
                url: format!("https://example.com/{i}"),
                snippet: format!("A reasonably descriptive snippet for source number {i}."),
            })
            .collect()
    }

    fn request(hit_count: usize, feedback: Option<&str>) -> DraftRequest {
        DraftRequest {
            topic: "rust adoption".to_string(),
            title: None,
            author: "AutoAgent".to_string(),
            hits: hits(hit_count),
            analysis: "The sources agree that adoption of the technology keeps growing.\n\
                       Tooling quality was called out repeatedly as the main driver."
                .to_string(),
            previous_feedback: feedback.map(str::to_string),
        }
    }

    fn writer(reply: &str, dir: &std::path::Path) -> Writer {
        Writer::new(
            Arc::new(OfflineLlm::with_reply(reply)),
            OutputStore::new(dir),
            "gemma3:latest",
        )
    }

    #[tokio::test]
    async fn test_title_defaults_to_topic() {
        let dir = tempfile::tempdir().unwrap();
        let stage = writer("[]", dir.path());

        let draft = stage.run(&request(2, None)).await;
        assert!(draft.starts_with("# rust adoption"));
    }

    #[tokio::test]
    async fn test_generic_title_when_topic_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stage = writer("[]", dir.path());

        let mut req = request(0, None);
        req.topic = String::new();

        let draft = stage.run(&req).await;
        assert!(draft.starts_with("# Automated Report"));
    }

    #[tokio::test]
    async fn test_no_hits_yields_minimal_report() {
        let dir = tempfile::tempdir().unwrap();
        let stage = writer("[]", dir.path());

        let draft = stage.run(&request(0, None)).await;

        assert!(draft.contains("## Note"));
        assert!(draft.contains("No research data was available"));
        // Minimal reports are not persisted as drafts.
        assert!(!dir.path().join("report.md").exists());
    }

    #[tokio::test]
    async fn test_short_model_reply_degrades_to_structured_report() {
        let dir = tempfile::tempdir().unwrap();
        let stage = writer("too short", dir.path());

        let draft = stage.run(&request(5, None)).await;

        for section in [
            "## Introduction",
            "## Key Findings",
            "## Detailed Analysis",
            "## Conclusion",
            "## References",
        ] {
            assert!(draft.contains(section), "missing section {section}");
        }
        // All 5 sources are referenced, the detailed analysis covers 3.
        assert!(draft.contains("5. [Source 5](https://example.com/5)"));
        assert!(draft.contains("### 3. Source 3"));
        assert!(!draft.contains("### 4."));
        assert!(dir.path().join("report.md").exists());
    }

    #[tokio::test]
    async fn test_model_draft_kept_when_long_enough() {
        let dir = tempfile::tempdir().unwrap();
        let body = "# Custom Report\n\nA model-written draft that is clearly long enough to keep.";
        let stage = writer(body, dir.path());

        let draft = stage.run(&request(2, None)).await;
        assert_eq!(draft, body);
    }

    #[tokio::test]
    async fn test_fallback_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let stage = writer("[]", dir.path());
        let req = request(3, None);

        let a = stage.run(&req).await;
        let b = stage.run(&req).await;
        assert_eq!(a, b);
    }
}
