//! Safety validation
//!
//! Lexical allow/deny gate over extracted SQL before anything touches the
//! database. The rules are deliberately conservative: normalize whitespace,
//! uppercase, reject stacked statements and mutating keywords, then require a
//! SELECT. False rejects are fine. This is not a SQL parser and does not try
//! to be one.

use itertools::Itertools;

/// Mutating keywords, matched with a trailing space so column names such as
/// `updated_at` or `created_at` are not caught.
const FORBIDDEN_KEYWORDS: [&str; 10] = [
    "INSERT ", "UPDATE ", "DELETE ", "DROP ", "ALTER ", "TRUNCATE ", "CREATE ", "REPLACE ",
    "GRANT ", "REVOKE ",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationVerdict {
    Accepted,
    Rejected { reason: String },
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted)
    }
}

/// Judge one SQL candidate. Every rejection carries the rule that fired.
pub fn validate(sql: &str) -> ValidationVerdict {
    let normalized = sql.split_whitespace().join(" ").to_uppercase();
    if normalized.is_empty() {
        return ValidationVerdict::Rejected {
            reason: "empty statement".to_string(),
        };
    }

    if normalized.matches(';').count() > 1 {
        return ValidationVerdict::Rejected {
            reason: "multiple statements are not allowed".to_string(),
        };
    }

    for keyword in FORBIDDEN_KEYWORDS {
        if normalized.contains(keyword) {
            return ValidationVerdict::Rejected {
                reason: format!("forbidden keyword {}", keyword.trim()),
            };
        }
    }

    if normalized.contains("SELECT") {
        ValidationVerdict::Accepted
    } else {
        ValidationVerdict::Rejected {
            reason: "not a SELECT statement".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        assert!(validate("SELECT * FROM users").is_accepted());
        assert!(validate("select id from t where x = 1").is_accepted());
    }

    #[test]
    fn test_accepts_single_trailing_terminator() {
        assert!(validate("SELECT * FROM users;").is_accepted());
    }

    #[test]
    fn test_accepts_cte() {
        assert!(validate("WITH top AS (SELECT id FROM t) SELECT * FROM top").is_accepted());
    }

    #[test]
    fn test_rejects_every_mutating_keyword() {
        let statements = [
            "INSERT INTO t VALUES (1)",
            "UPDATE t SET a = 1",
            "DELETE FROM t",
            "DROP TABLE t",
            "ALTER TABLE t ADD c INT",
            "TRUNCATE TABLE t",
            "CREATE TABLE t (a INT)",
            "REPLACE INTO t VALUES (1)",
            "GRANT ALL ON t TO joe",
            "REVOKE ALL ON t FROM joe",
        ];
        for sql in statements {
            assert!(!validate(sql).is_accepted(), "accepted: {}", sql);
        }
    }

    #[test]
    fn test_rejects_stacked_statements() {
        let verdict = validate("SELECT 1; DROP TABLE users;");
        assert_eq!(
            verdict,
            ValidationVerdict::Rejected {
                reason: "multiple statements are not allowed".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_names_the_keyword() {
        let verdict = validate("SELECT 1 FROM t WHERE EXISTS (DELETE FROM u)");
        assert_eq!(
            verdict,
            ValidationVerdict::Rejected {
                reason: "forbidden keyword DELETE".to_string()
            }
        );
    }

    #[test]
    fn test_keyword_lookalike_columns_pass() {
        assert!(validate("SELECT updated_at, created_at FROM orders").is_accepted());
        assert!(validate("SELECT inserted FROM log").is_accepted());
    }

    #[test]
    fn test_whitespace_is_normalized_before_matching() {
        assert!(!validate("DELETE\n\tFROM t").is_accepted());
    }

    #[test]
    fn test_rejects_non_select_text() {
        let verdict = validate("SHOW TABLES");
        assert_eq!(
            verdict,
            ValidationVerdict::Rejected {
                reason: "not a SELECT statement".to_string()
            }
        );
        assert!(!validate("   ").is_accepted());
    }
}
