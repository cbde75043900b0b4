use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mongo_nlq::config::{Config, Interface};
use mongo_nlq::render::render_report;
use mongo_nlq::store::MongoStore;
use mongo_nlq::{NlqError, NlqService};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();

    let store = Arc::new(
        MongoStore::connect(&config)
            .await
            .context("Failed to connect to MongoDB")?,
    );
    let service = Arc::new(NlqService::new(&config, store)?);

    match config.server.interface {
        Interface::Http => {
            let bind: SocketAddr = config
                .server
                .http_bind
                .parse()
                .with_context(|| format!("Invalid NLQ_HTTP_BIND '{}'", config.server.http_bind))?;

            let router = mongo_nlq::http::router(service, config.server.bearer_token.clone());
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(
                %bind,
                auth = %config.server.bearer_token.as_deref().map(|_| "bearer").unwrap_or("none"),
                "Starting HTTP server"
            );

            axum::serve(listener, router).await?;
            Ok(())
        }
        Interface::Cli => {
            let args: Vec<String> = std::env::args().skip(1).collect();
            if !args.is_empty() {
                return answer(&service, &args.join(" ")).await;
            }

            println!("{}", "Talk to MongoDB (`sample_analytics`)".bold());
            println!("Ask questions about `accounts`, `customers`, or `transactions` (Ctrl-D to quit)");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                eprint!("> ");
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = answer(&service, &line).await {
                    eprintln!("{} {e:#}", "error:".red().bold());
                }
            }
            Ok(())
        }
    }
}

async fn answer(service: &NlqService, question: &str) -> Result<()> {
    eprintln!("{}", "Generating MongoDB query...".dimmed());
    match service.ask(question).await {
        Ok(report) => {
            println!("{}", render_report(&report));
            Ok(())
        }
        Err(NlqError::Validation(msg)) => {
            eprintln!("{} {msg}", "invalid question:".yellow());
            Ok(())
        }
        Err(e) => Err(e).context("Query generation failed"),
    }
}
