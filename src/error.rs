use thiserror::Error;

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Connection error: {message}{}", .sql.as_deref().map(|s| format!(" (statement: {s})")).unwrap_or_default())]
    Connection {
        message: String,
        sql: Option<String>,
    },

    #[error("Provider error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("No SQL statement could be extracted from the model output")]
    Extraction,

    #[error("Generated SQL was rejected: {reason}")]
    Rejected { reason: String },

    #[error("SQL execution error: {message} (statement: {sql})")]
    Execution { message: String, sql: String },

    #[error("Audit record error: {0}")]
    Audit(String),
}

impl AskError {
    /// Short machine-readable kind for callers that surface errors over a wire.
    pub fn kind(&self) -> &'static str {
        match self {
            AskError::Connection { .. } => "connection_failure",
            AskError::Provider { .. } => "provider_failure",
            AskError::Extraction => "extraction_failure",
            AskError::Rejected { .. } => "validation_rejected",
            AskError::Execution { .. } => "execution_failure",
            AskError::Audit(_) => "audit_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, AskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_distinct() {
        let errors = [
            AskError::Connection {
                message: "down".to_string(),
                sql: None,
            },
            AskError::Provider {
                status: Some(502),
                message: "bad gateway".to_string(),
            },
            AskError::Extraction,
            AskError::Rejected {
                reason: "forbidden keyword DROP".to_string(),
            },
            AskError::Execution {
                message: "unknown column".to_string(),
                sql: "SELECT x FROM t".to_string(),
            },
            AskError::Audit("disk full".to_string()),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_provider_error_includes_status() {
        let err = AskError::Provider {
            status: Some(429),
            message: "rate limited".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }

    #[test]
    fn test_provider_error_without_status() {
        let err = AskError::Provider {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(!err.to_string().contains("status"));
    }

    #[test]
    fn test_connection_error_includes_statement() {
        let err = AskError::Connection {
            message: "Connection refused".to_string(),
            sql: Some("SELECT 1 LIMIT 20".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("Connection refused"));
        assert!(text.contains("SELECT 1 LIMIT 20"));
    }

    #[test]
    fn test_connection_error_without_statement() {
        let err = AskError::Connection {
            message: "access denied".to_string(),
            sql: None,
        };
        assert!(!err.to_string().contains("statement"));
    }

    #[test]
    fn test_execution_error_pairs_message_and_sql() {
        let err = AskError::Execution {
            message: "unknown column 'nope'".to_string(),
            sql: "SELECT nope FROM t".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("unknown column"));
        assert!(text.contains("SELECT nope FROM t"));
    }
}
