//! # autoreport
//!
//! An automated research-report pipeline: four model-backed stages
//! (research, analysis, writing, critique) sequenced by an orchestrator
//! with a quality-gated rewrite loop.
//!
//! Every stage carries a deterministic offline fallback, so the pipeline
//! produces a complete, scoreable report even when the model backend is
//! unreachable or returns unusable text.
//!
//! ## Quick start
//! ```rust,ignore
//! use std::sync::Arc;
//! use autoreport::{Config, DuckDuckGoSearch, OllamaClient, OutputStore, Pipeline, PipelineRequest};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(OllamaClient::new(&config.ollama_host));
//! let search = Arc::new(DuckDuckGoSearch::new());
//! let store = OutputStore::new(&config.output_dir);
//! let pipeline = Pipeline::new(llm, search, store, config);
//!
//! let report = pipeline.run(PipelineRequest::new("Rust async runtimes")).await?;
//! println!("score: {}/100", report.score);
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod search;
pub mod stages;
pub mod store;

pub use config::Config;
pub use error::PipelineError;
pub use llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmError, OfflineLlm, OllamaClient, Role};
pub use pipeline::{Pipeline, PipelineReport, PipelineRequest};
pub use search::{DuckDuckGoSearch, SearchHit, SearchProvider};
pub use stages::analyst::{Analyst, AnalysisResult};
pub use stages::critic::{Critic, CritiqueVerdict};
pub use stages::researcher::{EvidenceSet, Researcher};
pub use stages::writer::{DraftRequest, Writer};
pub use store::OutputStore;
