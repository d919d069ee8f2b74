//! Prompt construction
//!
//! Pure builders for the two completion contracts: SQL generation and
//! result explanation. Both are deterministic functions of their inputs so a
//! repeated question with an unchanged schema produces byte-identical
//! prompts.

use crate::value::SqlValue;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

/// System message sent with every completion request.
pub const SYSTEM_PROMPT: &str = "You are an expert SQL assistant that writes valid MySQL SELECT queries when data retrieval is needed.";

/// Which contract a prompt was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PromptKind {
    SqlGeneration,
    Explanation,
}

/// A rendered prompt, tagged with its contract.
#[derive(Debug, Clone, Serialize)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

/// Build the SQL-generation prompt: full schema text, the question, and the
/// output contract (one raw SELECT, no fences, no commentary).
pub fn build_sql_prompt(schema_text: &str, question: &str) -> Prompt {
    let text = format!(
        r#"You are an expert MySQL database developer with decades of experience writing perfectly valid, production-grade SQL queries. You never make syntax errors, you never assume non-existent data, and you always strictly follow the provided schema.

Input Provided:

Full MySQL database schema with exact table names, column names, and their data types.

Sample rows from each table to understand the relationships and content.

A natural language question (which can be simple or very complex).

Your Task:

Generate exactly ONE fully correct, optimized MySQL SELECT statement that answers the question.

Use only the provided schema and sample data — never invent or assume any table, column, or alias.

Ensure the query is syntactically perfect for MySQL and executes without error.

Use proper JOINs, GROUP BY, ORDER BY, LIMIT, subqueries, date functions, aggregations, CASE expressions, window functions, or any advanced SQL techniques required.

Handle all possible query types:

Filtering

Sorting

Aggregating

Ranking

Nested queries

Conditional logic

Percentages and ratios

Time-series analysis

Top/Bottom N results

Multi-step logic with subqueries or CTEs

Preserve exact case and spelling of table and column names from the schema.

No placeholders — always use actual names from the provided schema.

Query must be production-ready, fully optimized, and logically accurate.

Output Rules:

Output only the raw SQL query text.

Do not include Markdown formatting, triple backticks, or the word “sql”.

Do not include any explanation, commentary, or restatement of the question.

Do not output anything before or after the SQL query.

Schema and samples:
{}

User question:
{}

Constraints:
- Only a single SELECT statement, do not output multiple statements.
- Do NOT output any explanation, only the code block with the SQL."#,
        schema_text, question
    );
    Prompt {
        kind: PromptKind::SqlGeneration,
        text,
    }
}

/// Build the explanation prompt: the question, the ordered column list, and a
/// preformatted preview of the result rows. The contract forbids SQL, code
/// fences, and reformatting of values.
pub fn build_explanation_prompt(
    question: &str,
    columns: &[String],
    rows: &[HashMap<String, SqlValue>],
) -> Prompt {
    let text = format!(
        r#"Provide the answer to the user's question **only** in clean, plain text.

Rules:
- If there are multiple rows in results, format them as a neat table without extra commentary.
- Do not add SQL, code blocks, or explanations.
- Keep it exactly in the same style as the data — no extra words.
- Preserve numbers, currency symbols, and text exactly as they appear in the data.

Question: {}

Columns: {:?}
Data:
{}"#,
        question,
        columns,
        render_preview_table(columns, rows)
    );
    Prompt {
        kind: PromptKind::Explanation,
        text,
    }
}

/// Render rows as a pipe-separated preview: a header line of column names,
/// then one line per row in column order. Cells for columns a row does not
/// carry are left empty. Empty input renders as an empty string.
pub fn render_preview_table(columns: &[String], rows: &[HashMap<String, SqlValue>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let header = columns.iter().join(" | ");
    let body = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| row.get(col).map(|v| v.to_string()).unwrap_or_default())
                .join(" | ")
        })
        .join("\n");
    format!("{}\n{}", header, body)
}
