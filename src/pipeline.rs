//! Pipeline orchestrator.
//!
//! Sequences Researcher → Analyst → Writer ⇄ Critic and owns the
//! quality-gated rewrite loop. Data flows strictly forward except for one
//! backward edge: a failed critique's feedback is merged into the next
//! writing attempt. The loop is bounded by `max_retries` and keeps the last
//! draft and verdict when the budget is exhausted (last-attempt-wins, not
//! best-of-N).
//!
//! State machine per run:
//! `RESEARCH → ANALYZE → WRITE_AND_CRITIQUE(attempt) → EXPORT | FAILED`

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::llm::LlmClient;
use crate::render::render_html;
use crate::search::SearchProvider;
use crate::stages::analyst::{Analyst, AnalysisResult};
use crate::stages::critic::{Critic, CritiqueVerdict};
use crate::stages::researcher::{EvidenceSet, Researcher};
use crate::stages::writer::{DraftRequest, Writer};
use crate::store::{slug, OutputStore};

/// Drafts under this many characters are not worth critiquing.
const MIN_SCOREABLE_DRAFT_CHARS: usize = 100;

/// Default author credited on generated reports.
pub const DEFAULT_AUTHOR: &str = "AutoAgent";

/// One pipeline invocation: a topic plus presentation options.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub topic: String,
    pub title: Option<String>,
    pub author: String,
    /// Maximum number of rewrites after the first attempt. The loop runs at
    /// most `max_retries + 1` write/critique cycles.
    pub max_retries: u32,
}

impl PipelineRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            title: None,
            author: DEFAULT_AUTHOR.to_string(),
            max_retries: 2,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Terminal result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Where the research evidence was persisted.
    pub research_path: PathBuf,

    /// Final Markdown report path (`None` if the write failed; the run still
    /// succeeds).
    pub report_path: Option<PathBuf>,

    /// Final HTML report path.
    pub html_path: Option<PathBuf>,

    /// Final quality score in [0, 100].
    pub score: u8,

    /// Whether the final draft cleared the quality gate.
    pub passed: bool,

    /// Feedback attached to the final verdict.
    pub feedback: String,

    /// Number of search hits the report was based on.
    pub hits_count: usize,

    /// Write/critique cycles spent (1 ..= max_retries + 1).
    pub attempts: u32,
}

/// Working record of one run. Owned exclusively by `Pipeline::run` for the
/// lifetime of that invocation; nothing is shared across runs.
struct PipelineState {
    topic: String,
    title: Option<String>,
    author: String,
    evidence: EvidenceSet,
    analysis: AnalysisResult,
    draft: Option<String>,
    verdict: Option<CritiqueVerdict>,
    attempt: u32,
    max_retries: u32,
}

/// The orchestrator. Construct once with the collaborators, run once per
/// topic.
pub struct Pipeline {
    researcher: Researcher,
    analyst: Analyst,
    writer: Writer,
    critic: Critic,
    store: OutputStore,
    max_search_results: usize,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        store: OutputStore,
        config: Config,
    ) -> Self {
        Self {
            researcher: Researcher::new(
                llm.clone(),
                search,
                store.clone(),
                &config.researcher_model,
            ),
            analyst: Analyst::new(llm.clone(), &config.analyst_model),
            writer: Writer::new(llm.clone(), store.clone(), &config.writer_model),
            critic: Critic::new(llm, store.clone(), &config.critic_model),
            store,
            max_search_results: config.max_search_results,
        }
    }

    /// Current quality-gate threshold.
    pub fn quality_threshold(&self) -> u8 {
        self.critic.threshold()
    }

    /// Adjust the quality-gate threshold (clamped to [0, 100]).
    pub fn set_quality_threshold(&mut self, threshold: u8) {
        self.critic.set_threshold(threshold);
    }

    /// Run the full pipeline for one topic.
    ///
    /// Fatal outcomes (zero search hits, no scoreable draft ever produced)
    /// surface as `Err`; every model-level failure inside the stages degrades
    /// to deterministic output and the run still succeeds.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineReport, PipelineError> {
        info!(topic = %request.topic, "Pipeline started");

        // RESEARCH
        info!("PHASE 1: RESEARCH");
        let evidence = self
            .researcher
            .run(&request.topic, self.max_search_results)
            .await;

        let hits_count = evidence.hits.len();
        info!(hits = hits_count, "Research phase complete");

        if hits_count == 0 {
            error!(topic = %request.topic, "No search results found, aborting");
            return Err(PipelineError::NoSearchResults);
        }

        // ANALYZE
        info!("PHASE 2: ANALYSIS");
        let analysis = self.analyst.run(&evidence).await;
        info!(sources = analysis.source_count, "Analysis phase complete");

        let mut state = PipelineState {
            topic: request.topic,
            title: request.title,
            author: request.author,
            evidence,
            analysis,
            draft: None,
            verdict: None,
            attempt: 0,
            max_retries: request.max_retries,
        };

        // WRITE_AND_CRITIQUE loop
        info!("PHASE 3: WRITING");
        self.write_and_critique(&mut state).await;

        let verdict = state.verdict.ok_or(PipelineError::NoUsableDraft)?;
        let draft = state.draft.ok_or(PipelineError::NoUsableDraft)?;

        // EXPORT: last attempt wins, even if an earlier one scored higher.
        info!("PHASE 5: EXPORT");
        let display_title = state.title.as_deref().unwrap_or(&state.topic);

        let report_path = self.store.save_text(&draft, "final_report.md");
        let html = render_html(display_title, &state.author, verdict.score, &draft);
        let html_path = self.store.save_text(&html, "final_report.html");

        info!(
            score = verdict.score,
            passed = verdict.passed,
            attempts = state.attempt,
            "Pipeline completed"
        );

        Ok(PipelineReport {
            research_path: self
                .store
                .json_path(&format!("research_{}", slug(&state.topic))),
            report_path,
            html_path,
            score: verdict.score,
            passed: verdict.passed,
            feedback: verdict.feedback,
            hits_count,
            attempts: state.attempt,
        })
    }

    /// The rewrite loop: at most `max_retries + 1` attempts, feedback from a
    /// failed critique carried verbatim into the next attempt's prompt.
    async fn write_and_critique(&self, state: &mut PipelineState) {
        let max_attempts = state.max_retries + 1;

        while state.attempt < max_attempts {
            state.attempt += 1;
            info!(attempt = state.attempt, max_attempts, "Writing attempt");

            let previous_feedback = if state.attempt > 1 {
                let feedback = state
                    .verdict
                    .as_ref()
                    .map(|v| v.feedback.clone())
                    .filter(|f| !f.is_empty());
                if let Some(f) = &feedback {
                    info!(feedback = %crate::stages::clip(f, 100), "Rewriting with feedback");
                }
                feedback
            } else {
                None
            };

            let draft_request = DraftRequest {
                topic: state.topic.clone(),
                title: state.title.clone(),
                author: state.author.clone(),
                hits: state.evidence.hits.clone(),
                analysis: state.analysis.summary.clone(),
                previous_feedback,
            };

            let draft = self.writer.run(&draft_request).await;

            if draft.chars().count() < MIN_SCOREABLE_DRAFT_CHARS {
                warn!(attempt = state.attempt, "Writer produced minimal content");
                // A degenerate draft is not worth scoring; spend the attempt
                // and move on, or exit with whatever verdict already exists.
                continue;
            }

            info!(chars = draft.chars().count(), "Report generated");
            state.draft = Some(draft);

            info!(attempt = state.attempt, "PHASE 4: CRITIQUE");
            let verdict = self
                .critic
                .run(state.draft.as_deref().unwrap_or_default())
                .await;

            info!(score = verdict.score, passed = verdict.passed, "Critique complete");

            let passed = verdict.passed;
            state.verdict = Some(verdict);

            if passed {
                info!("Report passed quality check");
                return;
            }

            if state.attempt < max_attempts {
                info!("Score below threshold, retrying with improvements");
            } else {
                warn!("Max retries reached, using last version");
            }
        }
    }
}
