//! Schema introspection
//!
//! Reads table/column metadata and a bounded number of sample rows from the
//! connected database and renders them as the textual schema block embedded in
//! the SQL-generation prompt. One unreadable table never aborts the scan, and
//! a dead database yields a degraded error-text schema instead of a failure:
//! translation should still be attempted with whatever context exists.

use crate::db::{self, ConnectionDescriptor};
use crate::value::{decode_cell, SqlValue};
use itertools::Itertools;
use serde::Serialize;
use sqlx::mysql::MySqlConnection;
use sqlx::{Column, Connection, Row};
use std::collections::HashMap;
use tracing::{info, warn};

pub const DEFAULT_SAMPLE_LIMIT: usize = 50;

const NO_SAMPLES_NOTE: &str = "(no sample rows or inaccessible)\n";

/// One table: its column names and up to `sample_limit` rows.
#[derive(Debug, Clone, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub samples: Vec<HashMap<String, SqlValue>>,
}

/// The schema as consumed by prompt construction: the serialized text plus the
/// structured form it was rendered from. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescription {
    pub text: String,
    pub tables: Vec<TableDescriptor>,
}

/// Read the schema and samples for every table in the target database.
///
/// Opens and closes one connection. Never returns an error: a failed
/// connection or scan produces an `Error fetching schema: …` text with no
/// tables, which callers pass on as degraded prompt context.
pub async fn introspect(
    descriptor: &ConnectionDescriptor,
    sample_limit: usize,
) -> SchemaDescription {
    let mut conn = match db::connect(descriptor).await {
        Ok(conn) => conn,
        Err(e) => return degraded(e.to_string()),
    };

    let scanned = scan(&mut conn, sample_limit).await;
    let _ = conn.close().await;

    match scanned {
        Ok(schema) => {
            info!(tables = schema.tables.len(), "schema introspected");
            schema
        }
        Err(e) => {
            warn!("schema introspection failed: {}", e);
            degraded(e.to_string())
        }
    }
}

async fn scan(
    conn: &mut MySqlConnection,
    sample_limit: usize,
) -> Result<SchemaDescription, sqlx::Error> {
    let table_rows = sqlx::query("SHOW TABLES").fetch_all(&mut *conn).await?;
    let names: Vec<String> = table_rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>(0).ok())
        .collect();

    let mut text = String::new();
    let mut tables = Vec::new();

    for name in names {
        let columns = match sqlx::query(&format!("SHOW COLUMNS FROM {}", quote_ident(&name)))
            .fetch_all(&mut *conn)
            .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| row.try_get::<String, _>(0).ok())
                .collect(),
            Err(e) => {
                warn!(table = %name, "column listing failed: {}", e);
                Vec::new()
            }
        };
        text.push_str(&header_line(&name, &columns));

        let mut samples = Vec::new();
        match sqlx::query(&format!(
            "SELECT * FROM {} LIMIT {}",
            quote_ident(&name),
            sample_limit
        ))
        .fetch_all(&mut *conn)
        .await
        {
            Ok(rows) => {
                for row in &rows {
                    let ordered: Vec<(String, SqlValue)> = row
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(i, col)| (col.name().to_string(), decode_cell(row, i)))
                        .collect();
                    text.push_str(&row_line(&ordered));
                    samples.push(ordered.into_iter().collect());
                }
            }
            Err(e) => {
                warn!(table = %name, "sample fetch failed: {}", e);
                text.push_str(NO_SAMPLES_NOTE);
            }
        }

        tables.push(TableDescriptor {
            name,
            columns,
            samples,
        });
    }

    Ok(SchemaDescription { text, tables })
}

fn degraded(message: String) -> SchemaDescription {
    SchemaDescription {
        text: format!("Error fetching schema: {}", message),
        tables: Vec::new(),
    }
}

fn header_line(name: &str, columns: &[String]) -> String {
    format!("Table `{}`: columns = ({})\n", name, columns.iter().join(", "))
}

fn row_line(values: &[(String, SqlValue)]) -> String {
    format!(
        "| {} |\n",
        values.iter().map(|(_, v)| v.to_string()).join(" | ")
    )
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
