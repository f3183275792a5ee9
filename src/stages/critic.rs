//! Critique stage: Markdown report → scored verdict.
//!
//! The model is asked for a `Score:` / `Feedback:` formatted reply. A reply
//! whose score cannot be parsed is discarded wholesale (a partially-parsed
//! score without feedback is not acceptable) and replaced by a deterministic
//! heuristic over the report's length and markup. The verdict is always
//! persisted, whichever path produced it.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::prompts::CRITIC_SYSTEM_PROMPT;
use crate::stages::clip;
use crate::store::OutputStore;

/// Default passing threshold.
const DEFAULT_THRESHOLD: u8 = 70;

/// Reports under this many characters are not worth scoring.
const MIN_REPORT_CHARS: usize = 50;

/// Fixed score for a report too short to critique.
const TOO_SHORT_SCORE: u8 = 40;

/// One attempt's quality verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueVerdict {
    /// Quality score in [0, 100].
    pub score: u8,

    /// Improvement suggestions carried into the next writing attempt.
    pub feedback: String,

    /// Whether the report clears the quality gate (`score >= threshold`).
    pub passed: bool,

    /// Threshold in force when the verdict was produced.
    pub threshold: u8,

    /// Character length of the critiqued report.
    pub report_length: usize,
}

/// The critique stage.
pub struct Critic {
    llm: Arc<dyn LlmClient>,
    store: OutputStore,
    model: String,
    threshold: u8,
}

impl Critic {
    pub fn new(llm: Arc<dyn LlmClient>, store: OutputStore, model: impl Into<String>) -> Self {
        Self {
            llm,
            store,
            model: model.into(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Current passing threshold.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Update the passing threshold, clamped to [0, 100].
    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold.min(100);
        info!(threshold = self.threshold, "Threshold updated");
    }

    /// Score a Markdown report and persist the verdict.
    pub async fn run(&self, markdown: &str) -> CritiqueVerdict {
        info!("Starting report critique");

        let report_length = markdown.chars().count();

        if report_length < MIN_REPORT_CHARS {
            warn!("Report too short to critique properly");
            return self.finish(
                TOO_SHORT_SCORE,
                "The report is too short and needs more details.".to_string(),
                report_length,
            );
        }

        let (score, feedback) = match self.ask_model(markdown).await {
            Some(parsed) => parsed,
            None => (
                heuristic_score(markdown),
                heuristic_feedback(markdown),
            ),
        };

        self.finish(score, feedback, report_length)
    }

    fn finish(&self, score: u8, feedback: String, report_length: usize) -> CritiqueVerdict {
        let passed = score >= self.threshold;

        let verdict = CritiqueVerdict {
            score,
            feedback,
            passed,
            threshold: self.threshold,
            report_length,
        };

        self.store.save_json(&verdict, "critique");
        info!(score, passed, "Critique recorded");

        verdict
    }

    /// Primary path: model critique, then strict parsing. Returns `None`
    /// when the call fails or no score could be parsed.
    async fn ask_model(&self, markdown: &str) -> Option<(u8, String)> {
        let prompt = format!(
            "Evaluate this report and provide:\n\
             1. Score (0-100)\n\
             2. Specific feedback for improvement\n\n\
             Report preview:\n{}\n\n\
             Respond in this format:\n\
             Score: [number]\n\
             Feedback: [your suggestions]\n\n\
             Be specific and constructive.\n",
            clip(markdown, 1500)
        );

        let request = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage::system(CRITIC_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
        )
        .with_temperature(0.3)
        .with_max_tokens(300);

        match self.llm.complete(request).await {
            Ok(response) => {
                info!(chars = response.content.chars().count(), "Critique received");
                let parsed = parse_verdict(&response.content);
                if parsed.is_none() {
                    warn!("Could not parse model critique, using heuristic scoring");
                }
                parsed
            }
            Err(e) => {
                warn!(error = %e, "Critique model call failed, using heuristic scoring");
                None
            }
        }
    }
}

/// Extract `(score, feedback)` from a model reply. Returns `None` when no
/// score line parses; a score without feedback is still acceptable, feedback
/// without a score is not.
fn parse_verdict(text: &str) -> Option<(u8, String)> {
    let number = Regex::new(r"\d+").ok()?;

    let mut score = None;
    let mut feedback = String::new();

    for line in text.lines() {
        let lower = line.to_lowercase();
        if lower.contains("score:") {
            if let Some(m) = number.find(line) {
                let value: u64 = m.as_str().parse().unwrap_or(100);
                score = Some(value.min(100) as u8);
            }
        } else if lower.contains("feedback:") {
            if let Some((_, rest)) = line.split_once(':') {
                feedback = rest.trim().to_string();
            }
        }
    }

    if feedback.is_empty() {
        if let Some(start) = text.to_lowercase().find("feedback:") {
            feedback = text[start + "feedback:".len()..].trim().to_string();
        }
    }

    score.map(|s| (s, feedback))
}

/// Deterministic score from report length and markup presence, capped at 100.
fn heuristic_score(markdown: &str) -> u8 {
    let length = markdown.chars().count();
    let mut score: u32 = 50;

    if length > 500 {
        score += 10;
    }
    if length > 1000 {
        score += 10;
    }
    if markdown.contains("##") {
        score += 10;
    }
    if markdown.contains("###") {
        score += 5;
    }
    if markdown.contains("http") || markdown.contains('[') {
        score += 10;
    }
    if markdown.contains("**") || markdown.contains('*') {
        score += 5;
    }

    score.min(100) as u8
}

/// Concrete gap list for the heuristic path, or a ready-for-publishing note
/// when nothing applies.
fn heuristic_feedback(markdown: &str) -> String {
    let mut issues = Vec::new();

    if markdown.chars().count() < 500 {
        issues.push("- The report is short; consider adding more detailed content.");
    }
    if !markdown.contains("##") {
        issues.push("- Add headings to structure the content.");
    }
    if !markdown.contains("http") && !markdown.contains('[') {
        issues.push("- Add references or sources.");
    }
    if !markdown.contains("**") && !markdown.contains('*') {
        issues.push("- Use formatting (bold/italic) to improve readability.");
    }

    if issues.is_empty() {
        "The report is generally good and ready for publishing.".to_string()
    } else {
        format!("Suggested Improvements:\n{}", issues.join("\n"))
    }
}
