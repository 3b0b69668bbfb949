//! querykit
//!
//! Parses a query string against a set of rules and prints the resulting
//! SELECT statement with its arguments, or runs its COUNT against PostgreSQL.
//!
//! ```text
//! querykit --table users --rule name --rule age:int \
//!     --query 'name=John&age:GTE=18&sort=-age&limit=10'
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qk_core::{ParserConfig, PlaceholderStyle};
use qk_db::{Database, DatabaseConfig, QueryExecutor};
use qk_queries::validations::{self, RuleKey, Validations};
use qk_queries::{QueryParams, QuerySpec, Value};

#[derive(Parser, Debug)]
#[command(name = "querykit", version, about = "Render a filter query string as parameterized SQL")]
struct Cli {
    /// Raw query string, e.g. `name=John&sort=-age`
    #[arg(short, long, conflicts_with = "url", required_unless_present = "url")]
    query: Option<String>,

    /// Full URL whose query part is parsed
    #[arg(short, long)]
    url: Option<String>,

    /// Table to select from
    #[arg(short, long)]
    table: String,

    /// Allowed field as `key` or `key=a,b,c` to restrict values
    #[arg(short, long = "rule", value_name = "KEY[=VALUES]")]
    rules: Vec<String>,

    /// Skip filters on fields without a rule
    #[arg(long)]
    ignore_unknown: bool,

    /// Placeholder style: question or dollar
    #[arg(long, value_parser = parse_placeholder)]
    placeholder: Option<PlaceholderStyle>,

    /// Print the statement as JSON
    #[arg(long)]
    json: bool,

    /// Count the matching rows in the database instead of printing SQL
    #[arg(long)]
    count: bool,

    /// Database to count against, defaults to DATABASE_URL
    #[arg(long, requires = "count")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = ParserConfig::from_env().context("invalid parser configuration")?;
    if cli.ignore_unknown {
        config.ignore_unknown_filters = true;
    }
    if let Some(style) = cli.placeholder {
        config.placeholder = style;
    }

    let params = match (&cli.query, &cli.url) {
        (Some(query), _) => QueryParams::from_query_str(query),
        (None, Some(url)) => QueryParams::from_url(url)?,
        (None, None) => bail!("either --query or --url is required"),
    };

    let rules = parse_rules(&cli.rules)?;
    info!(keys = params.len(), rules = rules.len(), "Parsing query");

    let mut spec = QuerySpec::with(params, rules).with_config(config);
    spec.parse()?;

    if cli.count {
        let db_config = match cli.database_url {
            Some(ref url) => DatabaseConfig::with_url(url),
            None => DatabaseConfig::from_env(),
        };
        let db = Database::connect(&db_config)
            .await
            .context("failed to connect to database")?;
        let total = QueryExecutor::new(db.pool()).count(&spec, &cli.table).await;
        db.close().await;

        let total = total?;
        if cli.json {
            println!("{}", serde_json::json!({ "total": total }));
        } else {
            println!("{total}");
        }
        return Ok(());
    }

    let statement = spec.statement(&cli.table);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&statement)?);
    } else {
        println!("{}", statement.sql);
        println!("args: {}", serde_json::to_string(&statement.args)?);
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,qk_queries=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn parse_placeholder(s: &str) -> Result<PlaceholderStyle, String> {
    PlaceholderStyle::from_str(s).ok_or_else(|| format!("unknown placeholder style: {s}"))
}

/// Build the registry from `--rule` flags
fn parse_rules(flags: &[String]) -> anyhow::Result<Validations> {
    let mut rules = Validations::new();

    for flag in flags {
        match flag.split_once('=') {
            None => rules.insert(flag.as_str(), None),
            Some((key, scope)) => {
                let kind = RuleKey::parse(key).kind;
                let allowed = scope
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        kind.convert(s)
                            .with_context(|| format!("rule {key}: {s:?} is not a valid {}", kind.as_str()))
                    })
                    .collect::<anyhow::Result<Vec<Value>>>()?;

                if allowed.is_empty() {
                    bail!("rule {key}: empty value list");
                }
                rules.insert(key, Some(validations::one_of(allowed)));
            }
        }
    }

    Ok(rules)
}
