//! autoreport CLI.
//!
//! Runs the research → analysis → writing → critique pipeline for a topic
//! and prints where the final report landed. Requires a local Ollama server
//! unless `--offline` is passed, in which case every stage degrades to its
//! deterministic fallback and still produces a complete report.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use autoreport::{
    Config, DuckDuckGoSearch, LlmClient, OfflineLlm, OllamaClient, OutputStore, Pipeline,
    PipelineError, PipelineRequest,
};

#[derive(Parser, Debug)]
#[command(
    name = "autoreport",
    version,
    about = "Automated research-report pipeline with a quality-gated rewrite loop",
    long_about = r#"
autoreport researches a topic on the web, analyzes the findings, writes a
Markdown report and critiques it. Reports scoring below the quality threshold
are rewritten with the critique's feedback, up to the retry budget.

PREREQUISITES (online mode):
  1. Install Ollama: https://ollama.ai
  2. Pull the models: ollama pull llama3.2:1b && ollama pull gemma3
  3. Start Ollama: ollama serve

EXAMPLES:
  autoreport "Rust async runtimes"
  autoreport --title "State of Rust" --author "Research Team" "Rust in 2026"
  autoreport --offline --max-retries 0 "Anything"   # no model backend needed
"#
)]
struct Args {
    /// The topic to research
    #[arg(value_name = "TOPIC")]
    topic: String,

    /// Custom report title (defaults to the topic)
    #[arg(short, long)]
    title: Option<String>,

    /// Report author name
    #[arg(short, long, default_value = "AutoAgent", env = "REPORT_AUTHOR")]
    author: String,

    /// Maximum rewrites when the critique score is below the threshold
    #[arg(long, default_value_t = 2, env = "MAX_RETRIES")]
    max_retries: u32,

    /// Quality-gate threshold (0-100)
    #[arg(long, env = "QUALITY_THRESHOLD")]
    threshold: Option<u8>,

    /// Run without a model backend (deterministic fallback output)
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Enable verbose/debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env()?;
    config.validate()?;

    autoreport::logging::init(args.verbose, Path::new(&config.output_dir));

    info!(
        topic = %args.topic,
        offline = args.offline,
        "autoreport starting"
    );

    let llm: Arc<dyn LlmClient> = if args.offline {
        Arc::new(OfflineLlm::new())
    } else {
        Arc::new(OllamaClient::new(&config.ollama_host))
    };
    let search = Arc::new(DuckDuckGoSearch::new());
    let store = OutputStore::new(&config.output_dir);

    let mut pipeline = Pipeline::new(llm, search, store, config);
    if let Some(threshold) = args.threshold {
        pipeline.set_quality_threshold(threshold);
    }

    let mut request = PipelineRequest::new(&args.topic)
        .with_author(&args.author)
        .with_max_retries(args.max_retries);
    if let Some(title) = &args.title {
        request = request.with_title(title);
    }

    match pipeline.run(request).await {
        Ok(report) => {
            println!("\n{}", "=".repeat(60));
            println!("PIPELINE COMPLETED SUCCESSFULLY");
            println!("{}", "=".repeat(60));
            if let Some(path) = &report.report_path {
                println!("Report:   {}", path.display());
            }
            if let Some(path) = &report.html_path {
                println!("HTML:     {}", path.display());
            }
            println!("Research: {}", report.research_path.display());
            println!("Score:    {}/100", report.score);
            println!(
                "Quality:  {}",
                if report.passed { "PASSED" } else { "ACCEPTABLE" }
            );
            println!("Sources:  {}", report.hits_count);
            println!("Attempts: {}", report.attempts);
            if !report.feedback.is_empty() {
                println!("Feedback: {}", report.feedback);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            eprintln!("\nPipeline failed: {e}");

            if matches!(e, PipelineError::NoSearchResults) {
                eprintln!("\nTip: try a broader topic, or check your network connection.");
            } else if !args.offline {
                eprintln!("\nTip: make sure Ollama is running (`ollama serve`),");
                eprintln!("     or rerun with --offline for fallback output.");
            }

            Err(e.into())
        }
    }
}
