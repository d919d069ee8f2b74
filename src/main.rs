use anyhow::Result;
use askdb::db::{self, ConnectionDescriptor, DEFAULT_MYSQL_PORT};
use askdb::executor::DEFAULT_ROW_CAP;
use askdb::llm::LlmClient;
use askdb::pipeline::{AskConfig, AskPipeline};
use askdb::report::{QaReporter, DEFAULT_REPORT_PATH};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Ask a natural-language question against a MySQL database")]
struct Args {
    /// The question in natural language
    question: String,

    /// Database host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Database port
    #[arg(long, default_value_t = DEFAULT_MYSQL_PORT)]
    port: u16,

    /// Database user
    #[arg(short, long)]
    user: String,

    /// Database password (or set MYSQL_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Target database name
    #[arg(short, long)]
    database: String,

    /// Where the QA report is appended
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,

    /// Skip writing the QA report
    #[arg(long)]
    no_report: bool,

    /// Cap on returned rows
    #[arg(long, default_value_t = DEFAULT_ROW_CAP)]
    limit: usize,

    /// Print the full outcome (answer, sql, rows) as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let password = args
        .password
        .or_else(|| std::env::var("MYSQL_PASSWORD").ok())
        .unwrap_or_default();
    let descriptor = ConnectionDescriptor::new(&args.host, &args.user, &password, &args.database)
        .with_port(args.port);

    if let Err(e) = db::ping(&descriptor).await {
        eprintln!("{}: {}", e.kind(), e);
        std::process::exit(1);
    }
    info!(database = %args.database, "database connection verified");

    let provider = match LlmClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            std::process::exit(1);
        }
    };

    let mut pipeline = AskPipeline::new(provider).with_config(AskConfig {
        row_cap: args.limit,
        ..Default::default()
    });
    if !args.no_report {
        pipeline = pipeline.with_reporter(Arc::new(QaReporter::new(&args.report)));
    }

    match pipeline.ask(&descriptor, None, &args.question).await {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.answer);
                info!(sql = %outcome.sql, "executed SQL");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            std::process::exit(1);
        }
    }
}
