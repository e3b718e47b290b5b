//! notify-relay - infrastructure notification relay
//!
//! Reads a notification event, renders it as a chat message and posts it to
//! the configured webhook.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use notify_format::{decide, parse_event};
use notify_relay::{KmsDecryptor, Relay, RelayConfig, render_event};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "notify-relay")]
#[command(about = "Relays infrastructure notifications to a chat webhook")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "NOTIFY_RELAY_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay an event to the webhook
    Handle {
        #[command(flatten)]
        event: EventArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Render an event without delivering it
    Render {
        #[command(flatten)]
        event: EventArgs,

        /// Channel to set on the rendered message
        #[arg(long)]
        channel: Option<String>,
    },

    /// Print the category chosen for each record of an event
    Classify {
        #[command(flatten)]
        event: EventArgs,

        /// Print one JSON decision per line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct EventArgs {
    /// Event document path, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    event: PathBuf,
}

#[derive(Args)]
struct ConfigOverrides {
    /// Plaintext hook URL
    #[arg(long)]
    plain_hook_url: Option<String>,

    /// Base64 KMS ciphertext of the hook URL
    #[arg(long)]
    encrypted_hook_url: Option<String>,

    /// Channel to post to
    #[arg(long)]
    channel: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    fn apply(self, mut config: RelayConfig) -> RelayConfig {
        if let Some(url) = self.plain_hook_url {
            config = config.with_plain_hook_url(url);
        }
        if let Some(blob) = self.encrypted_hook_url {
            config = config.with_encrypted_hook_url(blob);
        }
        if let Some(channel) = self.channel {
            config = config.with_channel_override(channel);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Handle { event, overrides } => handle(&event, overrides).await,
        Commands::Render { event, channel } => {
            let document = read_event(&event)?;
            for message in render_event(&document, channel.as_deref())? {
                println!("{}", serde_json::to_string_pretty(&message)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Classify { event, json } => {
            let document = read_event(&event)?;
            for (index, envelope) in parse_event(&document)?.iter().enumerate() {
                let decision = decide(envelope);
                if json {
                    println!("{}", serde_json::to_string(&decision)?);
                } else {
                    println!("{index}\t{}\t{}", decision.category, decision.rule);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn handle(event: &EventArgs, overrides: ConfigOverrides) -> anyhow::Result<ExitCode> {
    let config = overrides.apply(RelayConfig::from_env()?);
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return Ok(ExitCode::FAILURE);
    }

    let document = read_event(event)?;
    let relay = Relay::new(config, KmsDecryptor::new())?;

    match relay.handle_event(&document).await {
        Ok(outcomes) => {
            let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
            info!(
                records = outcomes.len(),
                delivered,
                rejected = outcomes.len() - delivered,
                "event handled"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, retryable = e.is_retryable(), "event not handled");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_event(args: &EventArgs) -> anyhow::Result<String> {
    if args.event.as_os_str() == "-" {
        let mut document = String::new();
        io::stdin()
            .read_to_string(&mut document)
            .context("failed to read event from stdin")?;
        Ok(document)
    } else {
        std::fs::read_to_string(&args.event)
            .with_context(|| format!("failed to read event from {}", args.event.display()))
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("notify_relay=info".parse()?);
    let text = (format == LogFormat::Text).then(|| fmt::layer().with_writer(io::stderr));
    let json = (format == LogFormat::Json).then(|| fmt::layer().json().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
    Ok(())
}
