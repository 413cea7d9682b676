//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use veil_core::{
    Inbox, InMemoryKeyStore, KeyStore, MemoryRelay, Messenger, NotRecoverable, SendError,
    Transport,
};
use veil_crypto::{recipient_tag, Envelope, Identity, Layer};

use crate::config::{CliOverrides, Config};
use crate::identity::IdentityManager;
use crate::output::{DemoReport, OutputFormat, OutputFormatter};
use crate::ExitCode;

/// Veil - private messages over untrusted relays
#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(version, about = "Seal, wrap and open private messages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet (overrides config)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (per-layer tracing)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Identity file path (overrides config)
    #[arg(long, global = true)]
    pub identity_file: Option<PathBuf>,

    /// Push the wrapped timestamp back by up to this many seconds
    #[arg(long, global = true, env = "VEIL_JITTER_SECS")]
    pub jitter: Option<u64>,
}

impl Cli {
    /// CLI flags that take precedence over the config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_format: self.output.map(|f| f.to_string()),
            debug: self.debug.then_some(true),
            jitter_secs: self.jitter,
            key_path: self.identity_file.clone(),
        }
    }

    /// Execute the CLI command with a resolved configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let format = config.output.format.parse().unwrap_or_default();
        let formatter = OutputFormatter::new(format, self.verbose);

        match self.command {
            Commands::Identity(args) => args.execute(&config, &formatter),
            Commands::Send(args) => args.execute(&config, &formatter).await,
            Commands::Receive(args) => args.execute(&config, &formatter).await,
            Commands::Inspect(args) => args.execute(&formatter).await,
            Commands::Demo(args) => args.execute(&config, &formatter).await,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the local identity
    Identity(IdentityArgs),
    /// Build, seal and wrap a message for a recipient
    Send(SendArgs),
    /// Open a wrapped envelope addressed to the local identity
    Receive(ReceiveArgs),
    /// Show what a relay can see of an envelope
    Inspect(InspectArgs),
    /// Send a message through an in-process relay and receive it
    Demo(DemoArgs),
}

/// Arguments for the identity command
#[derive(Parser, Debug)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub action: IdentityAction,
}

/// Identity subcommands
#[derive(Subcommand, Debug)]
pub enum IdentityAction {
    /// Show the configured identity
    Show,
    /// Generate a new identity and print its keys (nothing is written)
    Generate,
}

impl IdentityArgs {
    pub fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let (manager, command) = match self.action {
            IdentityAction::Show => (load_identity(config)?, "identity show"),
            IdentityAction::Generate => {
                formatter.progress("Generating identity...");
                (IdentityManager::generate(), "identity generate")
            }
        };

        print_nonempty(&formatter.format_identity(&manager.display_info(), command));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the send command
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Recipient public key (64 hex chars)
    #[arg(long)]
    pub to: String,

    /// Message text (read from stdin when omitted)
    pub message: Option<String>,

    /// Write the wrapped envelope to a file instead of stdout
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

impl SendArgs {
    pub async fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let manager = load_identity(config)?;
        let message = match self.message {
            Some(message) => message,
            None => String::from_utf8(read_input(None).await?).context("message is not UTF-8")?,
        };

        formatter.progress("Sealing and wrapping...");
        let messenger = Messenger::new(config.pipeline);
        let wrapped = match messenger.send_to_hex(manager.identity(), &self.to, &message) {
            Ok(wrapped) => wrapped,
            Err(SendError::InvalidKey(e)) => {
                formatter.error(&format!("Invalid recipient key: {e}"));
                return Ok(ExitCode::InvalidInput);
            }
            Err(e) => return Err(e.into()),
        };
        let wire = wrapped.to_json()?;

        match self.out {
            Some(path) => {
                tokio::fs::write(&path, wire.as_bytes())
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                formatter.success(&format!("Wrapped envelope {} written to {}", wrapped.id_hex(), path.display()));
            }
            None => print_nonempty(&formatter.format_wrapped(&wire)),
        }
        Ok(ExitCode::Success)
    }
}

/// Arguments for the receive command
#[derive(Parser, Debug)]
pub struct ReceiveArgs {
    /// File holding the wrapped envelope JSON (stdin when omitted)
    pub input: Option<PathBuf>,
}

impl ReceiveArgs {
    pub async fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let manager = load_identity(config)?;
        let Some(envelope) = parse_envelope(&read_input(self.input.as_deref()).await?, formatter) else {
            return Ok(ExitCode::InvalidInput);
        };

        match Messenger::new(config.pipeline).receive(manager.identity(), &envelope) {
            Ok(message) => {
                print_nonempty(&formatter.format_received(&message));
                Ok(ExitCode::Success)
            }
            Err(NotRecoverable) => {
                formatter.error(&NotRecoverable.to_string());
                Ok(ExitCode::NotRecoverable)
            }
        }
    }
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// File holding the envelope JSON (stdin when omitted)
    pub input: Option<PathBuf>,
}

impl InspectArgs {
    pub async fn execute(self, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let Some(envelope) = parse_envelope(&read_input(self.input.as_deref()).await?, formatter) else {
            return Ok(ExitCode::InvalidInput);
        };
        print_nonempty(&formatter.format_summary(&envelope));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the demo command
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Message to send from a fresh sender to a fresh receiver
    #[arg(default_value = "hello")]
    pub message: String,

    /// Undecryptable envelopes to push at the receiver before the real one
    #[arg(long, default_value_t = 0)]
    pub noise: usize,
}

impl DemoArgs {
    pub async fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let keys = InMemoryKeyStore::new();
        let sender_pub = keys.insert("sender", Identity::generate()).await?;
        let receiver_pub = keys.insert("receiver", Identity::generate()).await?;
        let sender = keys.identity("sender").await?;
        let receiver = keys.identity("receiver").await?;

        let relay = MemoryRelay::new("memory://demo", config.relay.channel_capacity);
        let subscription = relay.subscribe(&receiver_pub).await?;
        let messenger = Messenger::new(config.pipeline);

        formatter.progress(&format!("Injecting {} noise envelopes...", self.noise));
        let now = veil_core::protocol::now_unix();
        for _ in 0..self.noise {
            let stranger = Identity::generate();
            let junk = Envelope::build(
                Layer::Wrapped,
                stranger.public_key().clone(),
                vec![recipient_tag(&receiver_pub)],
                "noise",
                now,
            )
            .sign(&stranger)?;
            relay.inject(junk);
        }

        formatter.progress("Publishing wrapped message...");
        let wrapped = messenger.send(&sender, &receiver_pub, &self.message)?;
        let acks = relay.publish(&wrapped).await?;
        if !acks.iter().any(|ack| ack.accepted) {
            formatter.error("relay rejected the envelope");
            return Ok(ExitCode::GeneralError);
        }

        let mut received = Vec::new();
        let stats = Inbox::new(messenger)
            .run_until(subscription, &receiver, 1, |message| received.push(message))
            .await;

        let report = DemoReport::new(
            sender_pub.to_hex(),
            receiver_pub.to_hex(),
            &relay.published().await,
            &received,
            stats,
        );
        print_nonempty(&formatter.format_demo(&report));
        Ok(ExitCode::Success)
    }
}

fn load_identity(config: &Config) -> anyhow::Result<IdentityManager> {
    let manager = IdentityManager::resolve(config.identity.key_path.as_deref())?;
    tracing::debug!(source = %manager.source(), "using identity");
    Ok(manager)
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await.context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Parse an envelope, reporting bad input through the formatter.
fn parse_envelope(bytes: &[u8], formatter: &OutputFormatter) -> Option<Envelope> {
    match Envelope::from_json(bytes) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            formatter.error(&format!("Not an envelope: {e}"));
            None
        }
    }
}

fn print_nonempty(s: &str) {
    if !s.is_empty() {
        println!("{s}");
    }
}
