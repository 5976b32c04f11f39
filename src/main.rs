//! NLQ Gateway entry point.

use clap::{Parser, Subcommand};
use nlq_gateway::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

/// Natural-language to SQL command gateway
#[derive(Parser, Debug)]
#[command(name = "nlq-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default)
    Serve {
        /// Bind address. If not specified, uses config file value.
        #[arg(long)]
        host: Option<String>,
        /// HTTP port. If not specified, uses config file value.
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable JSON logging format
        #[arg(long)]
        json_logs: bool,
    },
    /// Answer one question against the configured database
    Ask {
        /// Question in plain language
        question: String,
    },
    /// Print the prompt that would be sent for a question
    Prompt {
        /// Question in plain language
        question: String,
    },
    /// Print the schema description given to the model
    Schema,
    /// Issue an access token for the protected endpoints
    Token {
        /// Staff member id
        id: i64,
        /// Staff username
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let is_serve = matches!(args.command, Some(Command::Serve { .. }) | None);
    if !is_serve {
        // Minimal logging for one-shot commands
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match args.command {
        Some(Command::Serve {
            host,
            port,
            json_logs,
        }) => {
            init_server_tracing(&config, json_logs);
            cli::run_serve(config, host, port).await
        }
        Some(Command::Ask { question }) => cli::run_ask(config, question, args.json).await,
        Some(Command::Prompt { question }) => cli::run_prompt(question),
        Some(Command::Schema) => cli::run_schema(),
        Some(Command::Token { id, username }) => cli::run_token(config, id, username),
        None => {
            init_server_tracing(&config, false);
            cli::run_serve(config, None, None).await
        }
    }
}

fn init_server_tracing(config: &Config, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if json_logs || config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
