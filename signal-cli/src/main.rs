//! signal-cli — terminal client for the Silent Signal HTTP API
//!
//! # Subcommands
//! - `chat <message> [--hr N] [--br N] [--anxiety N] [--status S] [--json]`
//! - `log --hr N --br N --anxiety-score N --cognitive-load N --status S`
//! - `history [--json]`                         — last stored vitals readings
//! - `book <expert> <date> [--user NAME]`       — book a consultation
//! - `status`                                   — show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "signal-cli",
    version,
    about = "Silent Signal — chat, log vitals and book experts from the terminal"
)]
struct Cli {
    /// Silent Signal server URL (overrides SIGNAL_HTTP_URL env var)
    #[arg(long, env = "SIGNAL_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a chat message with optional live vitals
    Chat {
        message: String,

        #[arg(long)]
        hr: Option<i64>,

        #[arg(long)]
        br: Option<i64>,

        /// Anxiety percentage (0-100)
        #[arg(long)]
        anxiety: Option<i64>,

        #[arg(long)]
        status: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Store a vitals reading
    Log {
        #[arg(long)]
        hr: i32,

        #[arg(long)]
        br: i32,

        #[arg(long)]
        anxiety_score: i32,

        #[arg(long)]
        cognitive_load: i32,

        #[arg(long)]
        status: String,
    },

    /// Show the most recent vitals readings
    History {
        #[arg(long)]
        json: bool,
    },

    /// Book an expert consultation
    Book {
        expert: String,
        date: String,

        #[arg(long)]
        user: Option<String>,
    },

    /// Show Silent Signal server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub agent: String,
    pub response: String,
    pub action: String,
    pub sentiment: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub hr: i64,
    pub br: i64,
    pub anxiety_score: i64,
    pub cognitive_load: i64,
    pub status: String,
}

// ============================================================================
// Formatting
// ============================================================================

/// Vitals object for the chat request; unset readings are left out.
pub fn build_vitals(
    hr: Option<i64>,
    br: Option<i64>,
    anxiety: Option<i64>,
    status: Option<&str>,
) -> serde_json::Value {
    let mut vitals = serde_json::Map::new();
    if let Some(v) = hr {
        vitals.insert("hr".to_string(), v.into());
    }
    if let Some(v) = br {
        vitals.insert("br".to_string(), v.into());
    }
    if let Some(v) = anxiety {
        vitals.insert("anxiety".to_string(), v.into());
    }
    if let Some(v) = status {
        vitals.insert("status".to_string(), v.into());
    }
    serde_json::Value::Object(vitals)
}

pub fn format_chat_reply(reply: &ChatReply) -> String {
    let mut out = format!("[{}] {}", reply.agent, reply.response);
    if reply.action != "none" {
        out.push_str(&format!("\n→ action: {}", reply.action));
    }
    if let Some(sentiment) = &reply.sentiment {
        out.push_str(&format!("\n  sentiment: {}", sentiment));
    }
    if let Some(audio) = &reply.audio {
        out.push_str(&format!("\n  audio: {} base64 chars", audio.len()));
    }
    out
}

pub fn format_history_row(entry: &HistoryEntry) -> String {
    // "2026-10-16T09:30:00.123Z" → "2026-10-16 09:30:00"
    let when: String = entry.timestamp.replace('T', " ").chars().take(19).collect();
    format!(
        "{}  HR {:>3}  BR {:>2}  anxiety {:>3}%  load {:>3}  {}",
        when, entry.hr, entry.br, entry.anxiety_score, entry.cognitive_load, entry.status
    )
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?)
}

fn post(server: &str, route: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, route);
    let resp = match client()?.post(&url).json(body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("signal-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("signal-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

fn do_chat(server: &str, message: &str, vitals: serde_json::Value, json_output: bool) -> anyhow::Result<()> {
    let body = serde_json::json!({ "message": message, "vitals": vitals });
    let value = post(server, "/api/agent/chat", &body)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let reply: ChatReply = serde_json::from_value(value)?;
    println!("{}", format_chat_reply(&reply));
    Ok(())
}

fn do_log(server: &str, body: serde_json::Value) -> anyhow::Result<()> {
    let value = post(server, "/api/logs", &body)?;
    println!("Stored reading {}", value["id"].as_str().unwrap_or("?"));
    Ok(())
}

fn do_history(server: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/api/history", server);
    let resp = match client()?.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("signal-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        eprintln!("signal-cli: server returned {}", resp.status());
        std::process::exit(1);
    }

    let value: serde_json::Value = resp.json()?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let entries: Vec<HistoryEntry> = serde_json::from_value(value)?;

    if entries.is_empty() {
        eprintln!("No readings stored yet");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_history_row(entry));
    }
    Ok(())
}

fn do_book(server: &str, expert: &str, date: &str, user: Option<&str>) -> anyhow::Result<()> {
    let mut body = serde_json::json!({ "expert_name": expert, "consultation_date": date });
    if let Some(u) = user {
        body["user_name"] = u.into();
    }
    let value = post(server, "/api/bookings", &body)?;
    println!(
        "Booking {}: {} on {}",
        value["status"].as_str().unwrap_or("?"),
        expert,
        date
    );
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);

    match client()?.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Silent Signal: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:       {}", body["version"].as_str().unwrap_or("?"));
            println!("Model:         {}", body["model"].as_str().unwrap_or("offline"));
            println!("Sentiment:     {}", body["sentiment"].as_bool().unwrap_or(false));
            println!("Speech:        {}", body["speech"].as_bool().unwrap_or(false));
            println!("Store:         {}", body["store"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("signal-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("signal-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Chat {
            message,
            hr,
            br,
            anxiety,
            status,
            json,
        } => do_chat(
            &server,
            &message,
            build_vitals(hr, br, anxiety, status.as_deref()),
            json,
        ),
        Commands::Log {
            hr,
            br,
            anxiety_score,
            cognitive_load,
            status,
        } => do_log(
            &server,
            serde_json::json!({
                "hr": hr,
                "br": br,
                "anxiety_score": anxiety_score,
                "cognitive_load": cognitive_load,
                "status": status,
            }),
        ),
        Commands::History { json } => do_history(&server, json),
        Commands::Book { expert, date, user } => do_book(&server, &expert, &date, user.as_deref()),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("signal-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
