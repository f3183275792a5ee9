//! Pipeline-fatal error types.
//!
//! Only two conditions abort a run: a topic with zero search hits, and a
//! retry loop that never produced a scoreable draft. Everything else is
//! handled inside the stages by deterministic degradation or by the rewrite
//! loop itself.

use thiserror::Error;

/// Errors that terminate a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The search collaborator returned no hits for the topic. No amount of
    /// rewriting compensates for absent evidence, so this is never retried.
    #[error("No search results found")]
    NoSearchResults,

    /// Every writing attempt produced a draft too short to critique, so the
    /// loop ended without a verdict.
    #[error("Writer never produced a scoreable draft")]
    NoUsableDraft,
}
