//! SQL extraction
//!
//! Completion text rarely arrives as bare SQL. It shows up fenced, labeled,
//! wrapped in markup or buried in prose, so extraction strips HTML-like tags
//! and then runs a ladder of independent matchers, strict formats first, and
//! the first hit wins. No hit means no candidate; the caller treats that as a
//! failure rather than running an empty statement.

use regex::Regex;

lazy_static::lazy_static! {
    static ref HTML_TAGS: Regex = Regex::new(r"</?[^>]+>").unwrap();
    static ref SQL_FENCE: Regex = Regex::new(r"(?is)```sql\s*(.*?)```").unwrap();
    static ref ANY_FENCE: Regex = Regex::new(r"(?s)```\s*(.*?)```").unwrap();
    static ref SELECT_WORD: Regex = Regex::new(r"(?i)\bSELECT\b").unwrap();
    static ref LABEL_END: Regex = Regex::new(r"Explanation:|ANSWER:|Answer:").unwrap();
    static ref SELECT_TO_TERMINATOR: Regex = Regex::new(r"(?i)(SELECT[\s\S]*?);").unwrap();
    static ref SELECT_TO_END: Regex = Regex::new(r"(?i)(SELECT[\s\S]*)").unwrap();
}

/// Pull one SQL candidate out of raw completion text, or nothing.
pub fn extract_sql(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let stripped = HTML_TAGS.replace_all(text, "");

    labeled_fence(&stripped)
        .or_else(|| generic_fence(&stripped))
        .or_else(|| sql_label(&stripped))
        .or_else(|| terminated_select(&stripped))
        .or_else(|| trailing_select(&stripped))
}

/// A ```sql fence. Its contents are taken verbatim, SELECT or not.
fn labeled_fence(text: &str) -> Option<String> {
    SQL_FENCE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// A bare ``` fence, accepted only when its body contains SELECT.
fn generic_fence(text: &str) -> Option<String> {
    let caps = ANY_FENCE.captures(text)?;
    let candidate = caps[1].trim();
    SELECT_WORD
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// Text after a literal `SQL:` label, cut at the first
/// `Explanation:`/`ANSWER:`/`Answer:` label, accepted only with SELECT.
fn sql_label(text: &str) -> Option<String> {
    let after = text.splitn(2, "SQL:").nth(1)?;
    let cut = match LABEL_END.find(after) {
        Some(m) => &after[..m.start()],
        None => after,
    };
    SELECT_WORD
        .is_match(cut)
        .then(|| cut.trim().to_string())
}

/// The shortest span from the first SELECT to a statement terminator.
fn terminated_select(text: &str) -> Option<String> {
    SELECT_TO_TERMINATOR
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Last resort: the first SELECT to the end of the text.
fn trailing_select(text: &str) -> Option<String> {
    SELECT_TO_END
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_fence_matcher() {
        assert_eq!(
            labeled_fence("```sql\nSELECT 1\n```").unwrap(),
            "SELECT 1"
        );
        assert_eq!(labeled_fence("```\nSELECT 1\n```"), None);
    }

    #[test]
    fn test_generic_fence_matcher_requires_select() {
        assert_eq!(
            generic_fence("```\nSELECT id FROM t\n```").unwrap(),
            "SELECT id FROM t"
        );
        assert_eq!(generic_fence("```\njust some text\n```"), None);
    }

    #[test]
    fn test_sql_label_matcher_cuts_at_labels() {
        assert_eq!(
            sql_label("SQL: SELECT count(*) FROM orders Explanation: counts them").unwrap(),
            "SELECT count(*) FROM orders"
        );
        assert_eq!(
            sql_label("SQL: SELECT city FROM stores\nAnswer: listed").unwrap(),
            "SELECT city FROM stores"
        );
        assert_eq!(sql_label("SQL: no query needed here"), None);
        assert_eq!(sql_label("nothing labeled"), None);
    }

    #[test]
    fn test_terminated_select_matcher_is_lazy() {
        assert_eq!(
            terminated_select("SELECT a FROM b; SELECT c FROM d;").unwrap(),
            "SELECT a FROM b"
        );
        assert_eq!(terminated_select("SELECT a FROM b"), None);
    }

    #[test]
    fn test_trailing_select_matcher() {
        assert_eq!(
            trailing_select("Sure. SELECT total FROM sales ORDER BY total DESC").unwrap(),
            "SELECT total FROM sales ORDER BY total DESC"
        );
        assert_eq!(trailing_select("no query words"), None);
    }

    #[test]
    fn test_sql_fence_wins_over_everything() {
        let text = "SQL: SELECT wrong FROM x\n```sql\nSELECT right FROM y\n```";
        assert_eq!(extract_sql(text).unwrap(), "SELECT right FROM y");
    }

    #[test]
    fn test_fence_label_is_case_insensitive() {
        assert_eq!(extract_sql("```SQL\nSELECT 1\n```").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_html_tags_are_stripped_first() {
        let text = "<p>```sql\nSELECT name FROM users\n```</p>";
        assert_eq!(extract_sql(text).unwrap(), "SELECT name FROM users");
    }

    #[test]
    fn test_non_select_fence_falls_through_to_prose() {
        let text = "```\nhere is prose\n```\nOtherwise try SELECT id FROM t; thanks";
        assert_eq!(extract_sql(text).unwrap(), "SELECT id FROM t");
    }

    #[test]
    fn test_lowercase_select_in_prose() {
        assert_eq!(extract_sql("try select id from t").unwrap(), "select id from t");
    }

    #[test]
    fn test_no_sql_anywhere() {
        assert_eq!(extract_sql("The schema has three tables."), None);
        assert_eq!(extract_sql(""), None);
    }
}
