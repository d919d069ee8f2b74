//! Natural-language questions answered against a MySQL database.
//!
//! The pipeline introspects the schema, asks a completion provider for a
//! single SELECT, screens it lexically, executes it with a row cap, and turns
//! the rows back into plain-text answers. See [`pipeline::AskPipeline`].

pub mod db;
pub mod error;
pub mod executor;
pub mod explain;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod safety;
pub mod schema;
pub mod value;

pub use error::{AskError, Result};
pub use pipeline::{AskConfig, AskOutcome, AskPipeline};
