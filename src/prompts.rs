//! System prompts for each pipeline stage.

/// Preamble for the research stage's evidence summarization call.
pub const RESEARCHER_SYSTEM_PROMPT: &str =
    "You are a research analyst. Provide clear, concise insights.";

/// Preamble for the analysis stage.
pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are a data analyst. Provide clear, structured insights.";

/// Preamble for the writing stage.
pub const WRITER_SYSTEM_PROMPT: &str = "\
You are a professional report writer. Write clear, well-structured reports in markdown format.

Your reports should include:
- Clear introduction
- Main findings with bullet points
- Conclusion
- References

Use professional language and proper markdown formatting.";

/// Preamble for the critique stage.
pub const CRITIC_SYSTEM_PROMPT: &str =
    "You are a professional report critic. Provide constructive feedback.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_not_empty() {
        for prompt in [
            RESEARCHER_SYSTEM_PROMPT,
            ANALYST_SYSTEM_PROMPT,
            WRITER_SYSTEM_PROMPT,
            CRITIC_SYSTEM_PROMPT,
        ] {
            assert!(!prompt.is_empty());
        }
    }
}
