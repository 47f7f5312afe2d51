//! askdb CLI
//!
//! Ask analytics questions in natural language against a read-only SQLite
//! database, or run and diagnose queries directly.

use askdb::analyze::diagnose;
use askdb::guard::{check_question, validate_query};
use askdb::pipeline::{Pipeline, PipelineOptions, PipelineResponse};
use askdb::render::{format_plan, format_table, to_csv, DEFAULT_MAX_ROWS};
use askdb::schema::SchemaDescription;
use askdb::store::{QueryStore, SqliteStore};
use askdb::Config;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// askdb - guarded natural-language analytics over SQLite
#[derive(Parser)]
#[command(name = "askdb")]
#[command(
    about = "Ask questions of a read-only SQLite database with guardrails and query plan diagnosis",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Database path (overrides ASKDB_DB_PATH and the config file)
    #[arg(long, env = "ASKDB_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Config file (JSON or YAML); environment variables are used otherwise
    #[arg(long, env = "ASKDB_CONFIG")]
    config: Option<PathBuf>,

    /// Log as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a natural language question
    Ask {
        /// Question in natural language
        question: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate, run and diagnose a SQL query
    Query {
        /// SQL query string
        sql: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the query plan and notes without running the query
    Explain {
        /// SQL query string
        sql: String,
    },

    /// Run the topic prefilter on a question
    CheckQuestion {
        /// Question text
        text: String,
    },

    /// Run the safety validator on a query
    CheckSql {
        /// SQL query string
        sql: String,
    },

    /// Print the schema description given to the translator
    Schema {
        /// Introspect the database instead
        #[arg(long)]
        live: bool,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Rows shown in table output
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    max_rows: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Ask { question, output } => {
            let pipeline = Pipeline::from_config(&config)?;
            let response = pipeline.ask(question).await;
            finish(&response, &output)?;
        }
        Commands::Query { sql, output } => {
            let store = SqliteStore::open(&config.db_path)?;
            let options = PipelineOptions::from_config(&config);
            let pipeline = Pipeline::without_translator(Arc::new(store), options);
            let response = pipeline.run_query(sql).await;
            finish(&response, &output)?;
        }
        Commands::Explain { sql } => {
            cmd_explain(&config, &sql).await?;
        }
        Commands::CheckQuestion { text } => {
            cmd_check_question(&text);
        }
        Commands::CheckSql { sql } => {
            cmd_check_sql(&sql);
        }
        Commands::Schema { live } => {
            cmd_schema(&config, live).await?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("ASKDB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string());
            Config::load(&path)?
        }
        None => Config::from_env()?,
    };

    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }
    // Expand ~ in path
    let expanded = shellexpand::tilde(&config.db_path.to_string_lossy()).to_string();
    config.db_path = PathBuf::from(expanded);

    Ok(config)
}

/// Print a response in the requested format; non-success exits with status 1.
fn finish(response: &PipelineResponse, output: &OutputArgs) -> anyhow::Result<()> {
    match output.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Csv => {
            if !response.is_success() {
                eprintln!("✗ {}", response.error_message.as_deref().unwrap_or("request failed"));
            } else {
                print!("{}", to_csv(&response.columns, &response.rows)?);
            }
        }
        OutputFormat::Table => print_report(response, output.max_rows),
    }

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(response: &PipelineResponse, max_rows: usize) {
    if let Some(understood) = &response.understood_question {
        println!("Understood: {}", understood);
    }
    if let Some(clarification) = &response.clarification {
        println!("⚠ Clarification: {}", clarification);
    }
    if let Some(sql) = &response.query_text {
        println!("SQL: {}", sql);
    }
    if let Some(explanation) = &response.explanation {
        println!("Explanation: {}", explanation);
    }
    println!();

    println!("{}", format_table(response, max_rows));

    if response.is_success() {
        println!();
        println!("{}", format_plan(&response.plan, &response.performance_notes));
    }

    if let Some(usage) = &response.usage {
        println!();
        println!(
            "Tokens: {} prompt + {} completion = {}",
            usage.prompt_units, usage.completion_units, usage.total_units
        );
    }
}

async fn cmd_explain(config: &Config, sql: &str) -> anyhow::Result<()> {
    let verdict = validate_query(sql);
    if !verdict.is_safe {
        println!("✗ {}", verdict.reason.unwrap_or_default());
        std::process::exit(1);
    }

    let store = SqliteStore::open(&config.db_path)?;
    let diagnosis = diagnose(&store, sql, config.explain_timeout()).await;
    println!("{}", format_plan(&diagnosis.plan, &diagnosis.notes));

    Ok(())
}

fn cmd_check_question(text: &str) {
    let verdict = check_question(text);
    match verdict.reason() {
        Some(reason) => println!("✗ Blocked: {}", reason),
        None => println!("✓ Question allowed"),
    }
}

fn cmd_check_sql(sql: &str) {
    let verdict = validate_query(sql);
    match verdict.reason {
        Some(reason) => println!("✗ {}", reason),
        None => println!("✓ Query is safe to run"),
    }
}

async fn cmd_schema(config: &Config, live: bool) -> anyhow::Result<()> {
    let schema = if live {
        let store = SqliteStore::open(&config.db_path)?;
        SchemaDescription::introspect(&store as &dyn QueryStore).await?
    } else {
        SchemaDescription::resolve(config)?
    };

    print!("{}", schema);
    if !schema.text.ends_with('\n') {
        println!();
    }

    Ok(())
}
