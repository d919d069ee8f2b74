//! Explanation synthesis
//!
//! Turns a result set back into answer text. The provider gets the first
//! shot; if it fails the rows are rendered locally, and if there are no rows
//! a fixed message is returned. Every path yields some answer text, so a
//! question that survived execution never dies at the explanation step.

use crate::executor::ResultSet;
use crate::llm::CompletionProvider;
use crate::prompts::{build_explanation_prompt, render_preview_table};
use regex::Regex;
use tracing::warn;

pub const NO_RESULTS: &str = "No results.";

lazy_static::lazy_static! {
    static ref FENCED: Regex = Regex::new(r"(?s)```.*?```").unwrap();
}

/// Produce answer text for the question given its results. Never fails.
pub async fn synthesize(
    provider: &dyn CompletionProvider,
    question: &str,
    results: &ResultSet,
) -> String {
    let prompt = build_explanation_prompt(question, &results.columns, &results.rows);
    match provider.complete(&prompt).await {
        Ok(content) => FENCED.replace_all(&content, "").trim().to_string(),
        Err(e) => {
            warn!("explanation call failed, rendering results locally: {}", e);
            local_fallback(results)
        }
    }
}

fn local_fallback(results: &ResultSet) -> String {
    if results.is_empty() {
        NO_RESULTS.to_string()
    } else {
        render_preview_table(&results.columns, &results.rows)
    }
}
