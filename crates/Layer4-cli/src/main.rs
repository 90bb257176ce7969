//! Prism CLI - Main entry point

mod cli;

use clap::{Args as ClapArgs, Parser, Subcommand};
use prism_foundation::PrismConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prism - prompt-driven content transformation with cached LLM calls
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform text, a URL or a file with a prompt
    Transform {
        #[command(flatten)]
        transformer: TransformerArgs,

        #[command(flatten)]
        input: InputArgs,

        /// Skip the result cache
        #[arg(long)]
        no_cache: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch a URL through the content cache and print the body
    Fetch {
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Print the cache identity of a transformer (and the key for an input)
    Key {
        #[command(flatten)]
        transformer: TransformerArgs,

        #[command(flatten)]
        input: OptionalInputArgs,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Transformer definition shared by `transform` and `key`
#[derive(ClapArgs, Debug, Clone)]
pub struct TransformerArgs {
    /// Instruction sent to the model
    #[arg(short, long)]
    pub prompt: String,

    /// Transformer name (cache discriminator)
    #[arg(long, default_value = "cli")]
    pub name: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Provider (openai, anthropic, groq, ollama, gemini, mistral, deepseek, xai)
    #[arg(long)]
    pub provider: Option<String>,

    #[arg(short, long)]
    pub model: Option<String>,

    #[arg(short, long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// Request timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<i64>,

    /// JSON Schema file for structured output
    #[arg(long)]
    pub schema: Option<std::path::PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    #[arg(long)]
    pub text: Option<String>,

    /// Fetched before transforming
    #[arg(long)]
    pub url: Option<String>,

    /// Image or document file
    #[arg(long)]
    pub file: Option<std::path::PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
#[group(required = false, multiple = false)]
pub struct OptionalInputArgs {
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "prism=debug" } else { "prism=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config = PrismConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        let mut config = PrismConfig::default();
        config.apply_env_overrides();
        config
    });

    match args.command {
        Command::Transform {
            transformer,
            input,
            no_cache,
            json,
        } => {
            let config = if no_cache { config.without_cache() } else { config };
            cli::transform(config, &transformer, input.into(), json).await
        }
        Command::Fetch {
            url,
            method,
            headers,
            body,
        } => cli::fetch(&config, &url, &method, &headers, body).await,
        Command::Key { transformer, input } => {
            cli::key(&config, &transformer, input.into_source())
        }
        Command::Config => cli::show_config(&config),
    }
}

impl From<InputArgs> for cli::Source {
    fn from(input: InputArgs) -> Self {
        OptionalInputArgs {
            text: input.text,
            url: input.url,
            file: input.file,
        }
        .into_source()
        .unwrap_or(cli::Source::Text(String::new()))
    }
}

impl OptionalInputArgs {
    fn into_source(self) -> Option<cli::Source> {
        match (self.text, self.url, self.file) {
            (Some(text), _, _) => Some(cli::Source::Text(text)),
            (_, Some(url), _) => Some(cli::Source::Url(url)),
            (_, _, Some(path)) => Some(cli::Source::File(path)),
            _ => None,
        }
    }
}
