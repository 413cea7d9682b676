//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use veil_core::{InboxStats, ReceivedMessage};
use veil_crypto::Envelope;

use crate::identity::IdentityInfo;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }

    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::success(data)
        }
    }
}

impl JsonResponse<()> {
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// A recovered message as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedOutput {
    pub sender: String,
    pub sent_at: u64,
    pub message_id: String,
    pub message: String,
}

impl From<&ReceivedMessage> for ReceivedOutput {
    fn from(m: &ReceivedMessage) -> Self {
        Self {
            sender: m.original_sender.to_hex(),
            sent_at: m.sent_at,
            message_id: hex::encode(m.message_id),
            message: m.plaintext.clone(),
        }
    }
}

/// What a relay or observer can read from an envelope
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeSummary {
    pub id: String,
    pub kind: u16,
    pub layer: String,
    pub author: String,
    pub recipient: Option<String>,
    pub created_at: u64,
    pub content_len: usize,
    pub signature_valid: bool,
}

impl From<&Envelope> for EnvelopeSummary {
    fn from(e: &Envelope) -> Self {
        Self {
            id: e.id_hex(),
            kind: e.layer.tag(),
            layer: e.layer.name().to_string(),
            author: e.author_pubkey.to_hex(),
            recipient: e.recipient().map(|p| p.to_hex()),
            created_at: e.created_at,
            content_len: e.content.len(),
            signature_valid: e.verify(),
        }
    }
}

/// Result of an in-process relay run
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub sender: String,
    pub receiver: String,
    pub published: Vec<EnvelopeSummary>,
    pub received: Vec<ReceivedOutput>,
    pub delivered: u64,
    pub dropped: u64,
}

impl DemoReport {
    pub fn new(
        sender: String,
        receiver: String,
        published: &[Envelope],
        received: &[ReceivedMessage],
        stats: InboxStats,
    ) -> Self {
        Self {
            sender,
            receiver,
            published: published.iter().map(EnvelopeSummary::from).collect(),
            received: received.iter().map(ReceivedOutput::from).collect(),
            delivered: stats.delivered,
            dropped: stats.dropped,
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    pub fn format_identity(&self, info: &IdentityInfo, command: &str) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec!["Public Key", &info.public_key]);
                table.add_row(vec!["Source", &info.source]);
                if let Some(secret) = &info.secret_key {
                    table.add_row(vec!["Secret Key", secret]);
                }
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(info, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Wrapped envelope ready for publishing. Table mode prints the bare wire
    /// record so it can be piped into `veil receive`.
    pub fn format_wrapped(&self, wire_json: &str) -> String {
        match self.format {
            OutputFormat::Table => wire_json.to_string(),
            OutputFormat::Json => match serde_json::from_str::<serde_json::Value>(wire_json) {
                Ok(value) => self.to_json_response(&value, "send"),
                Err(e) => self.to_json(&JsonResponse::<()>::error(&e.to_string())),
            },
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_received(&self, message: &ReceivedMessage) -> String {
        let out = ReceivedOutput::from(message);
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec!["From", &out.sender]);
                table.add_row(vec!["Sent At", &format_unix(out.sent_at)]);
                table.add_row(vec!["Message ID", &out.message_id]);
                table.add_row(vec!["Message", &out.message]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(&out, "receive"),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_summary(&self, envelope: &Envelope) -> String {
        let summary = EnvelopeSummary::from(envelope);
        match self.format {
            OutputFormat::Table => {
                let mut table = property_table();
                table.add_row(vec!["ID", &summary.id]);
                table.add_row(vec!["Kind", &format!("{} ({})", summary.kind, summary.layer)]);
                table.add_row(vec!["Author", &summary.author]);
                table.add_row(vec![
                    "Recipient",
                    summary.recipient.as_deref().unwrap_or("-"),
                ]);
                table.add_row(vec!["Created At", &format_unix(summary.created_at)]);
                table.add_row(vec!["Content Bytes", &summary.content_len.to_string()]);
                table.add_row(vec!["Signature", if summary.signature_valid { "valid" } else { "INVALID" }]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(&summary, "inspect"),
            OutputFormat::Quiet => String::new(),
        }
    }

    pub fn format_demo(&self, report: &DemoReport) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut published = Table::new();
                published.load_preset(UTF8_FULL);
                published.set_header(vec!["Relay Saw: Author", "Kind", "Created At", "Bytes"]);
                for e in &report.published {
                    published.add_row(vec![
                        short_hex(&e.author),
                        e.kind.to_string(),
                        format_unix(e.created_at),
                        e.content_len.to_string(),
                    ]);
                }

                let mut received = Table::new();
                received.load_preset(UTF8_FULL);
                received.set_header(vec!["Receiver Got: From", "Message"]);
                for m in &report.received {
                    received.add_row(vec![short_hex(&m.sender), m.message.clone()]);
                }

                format!(
                    "Sender:   {}\nReceiver: {}\n{published}\n{received}\nDelivered: {}  Dropped: {}",
                    report.sender, report.receiver, report.delivered, report.dropped
                )
            }
            OutputFormat::Json => self.to_json_response(report, "demo"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Progress message, only shown in verbose table mode
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Table => eprintln!("✗ {message}"),
            OutputFormat::Json => println!("{}", self.to_json(&JsonResponse::<()>::error(message))),
            OutputFormat::Quiet => {}
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        self.to_json(&JsonResponse::success_with_command(value, command))
    }
}

fn property_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    table
}

fn format_unix(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::<chrono::Utc>::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn short_hex(hex: &str) -> String {
    match hex.get(..12) {
        Some(prefix) => format!("{prefix}…"),
        None => hex.to_string(),
    }
}
