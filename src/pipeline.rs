//! Ask pipeline
//!
//! End-to-end orchestration for one question: schema context, SQL generation,
//! extraction, validation, bounded execution, explanation, audit append. The
//! stages are strictly sequential because each consumes the previous stage's
//! output. Concurrent questions are independent; the only shared state is the
//! audit sink, which serializes its own appends.

use crate::db::ConnectionDescriptor;
use crate::error::{AskError, Result};
use crate::executor::{self, ExecutionOptions, ResultSet, DEFAULT_ROW_CAP, DEFAULT_STATEMENT_TIMEOUT};
use crate::explain;
use crate::extract::extract_sql;
use crate::llm::CompletionProvider;
use crate::prompts::build_sql_prompt;
use crate::report::{QaRecord, QaReporter};
use crate::safety::{validate, ValidationVerdict};
use crate::schema::{self, SchemaDescription, DEFAULT_SAMPLE_LIMIT};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pipeline knobs: how many sample rows feed the prompt, how many result
/// rows may come back, and how long a statement may run.
#[derive(Debug, Clone)]
pub struct AskConfig {
    pub sample_limit: usize,
    pub row_cap: usize,
    pub statement_timeout: Option<Duration>,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            row_cap: DEFAULT_ROW_CAP,
            statement_timeout: Some(DEFAULT_STATEMENT_TIMEOUT),
        }
    }
}

/// What a successfully answered question produces: the answer text, the SQL
/// that was accepted and run, and the capped result rows.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub answer: String,
    pub sql: String,
    pub results: ResultSet,
}

/// The pipeline itself. Holds the completion provider and, optionally, the
/// audit sink; connection descriptors are passed per question.
pub struct AskPipeline {
    provider: Arc<dyn CompletionProvider>,
    reporter: Option<Arc<QaReporter>>,
    config: AskConfig,
}

impl AskPipeline {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            reporter: None,
            config: AskConfig::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<QaReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_config(mut self, config: AskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AskConfig {
        &self.config
    }

    /// Answer one question. A cached schema skips introspection; otherwise
    /// the schema is read fresh from the database (degrading to an error-text
    /// schema if the database is unreachable, so translation is still tried).
    ///
    /// Exactly one audit record is appended per success. Failed or rejected
    /// questions append nothing.
    pub async fn ask(
        &self,
        descriptor: &ConnectionDescriptor,
        cached_schema: Option<&SchemaDescription>,
        question: &str,
    ) -> Result<AskOutcome> {
        info!(question = %question, "processing question");

        let introspected;
        let context = match cached_schema {
            Some(ready) => ready,
            None => {
                introspected = schema::introspect(descriptor, self.config.sample_limit).await;
                &introspected
            }
        };

        let prompt = build_sql_prompt(&context.text, question);
        let completion = self.provider.complete(&prompt).await?;

        let candidate = extract_sql(&completion).ok_or(AskError::Extraction)?;
        debug!(sql = %candidate, "extracted SQL candidate");

        if let ValidationVerdict::Rejected { reason } = validate(&candidate) {
            warn!(reason = %reason, "SQL candidate rejected");
            return Err(AskError::Rejected { reason });
        }

        let options = ExecutionOptions {
            row_cap: self.config.row_cap,
            statement_timeout: self.config.statement_timeout,
        };
        let results = executor::execute(descriptor, &candidate, &options).await?;

        let answer = explain::synthesize(self.provider.as_ref(), question, &results).await;

        if let Some(reporter) = &self.reporter {
            reporter.append(&QaRecord::new(question, answer.clone(), Some(candidate.clone())))?;
        }

        info!(rows = results.rows.len(), "question answered");
        Ok(AskOutcome {
            answer,
            sql: candidate,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AskConfig::default();
        assert_eq!(config.sample_limit, 50);
        assert_eq!(config.row_cap, 20);
        assert_eq!(config.statement_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_with_config_overrides() {
        struct NoProvider;

        #[async_trait::async_trait]
        impl CompletionProvider for NoProvider {
            async fn complete(&self, _p: &crate::prompts::Prompt) -> Result<String> {
                Err(AskError::Provider {
                    status: None,
                    message: "unused".to_string(),
                })
            }
        }

        let pipeline = AskPipeline::new(Arc::new(NoProvider)).with_config(AskConfig {
            sample_limit: 5,
            row_cap: 3,
            statement_timeout: None,
        });
        assert_eq!(pipeline.config().row_cap, 3);
        assert_eq!(pipeline.config().statement_timeout, None);
    }
}
