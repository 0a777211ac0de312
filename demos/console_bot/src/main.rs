//! Console Bot Example
//!
//! Runs the full karma handler chain against a terminal instead of a chat
//! server. Each stdin line is one message in the form `Sender Name: text`;
//! replies are printed to stdout.
//!
//! ```text
//! $ cargo run -p console-bot -- --config demos/console_bot/karma.toml \
//!       --roster demos/console_bot/roster.json
//! Alice Liddell: bob++
//! [lobby] w00t! @bob now at 1!
//! Bob Stone: @karma echo hi there
//! [lobby] hi there
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use karma::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Chat with the karma bot from a terminal")]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of roster entries to load into the directory.
    #[arg(short, long)]
    roster: Option<PathBuf>,

    /// Channel name messages are posted in.
    #[arg(long, default_value = "lobby")]
    channel: String,
}

/// Prints replies to stdout.
struct ConsoleTransport {
    stdout: Mutex<tokio::io::Stdout>,
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn respond(&self, channel: &str, text: &str) -> TransportResult<()> {
        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(format!("[{channel}] {text}\n").as_bytes())
            .await?;
        stdout.flush().await?;
        Ok(())
    }
}

fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("1_1@chat.example.com", "Alice Liddell", "alice"),
        RosterEntry::new("1_2@chat.example.com", "Bob Stone", "bob"),
        RosterEntry::new("1_99@chat.example.com", "Karma Bot", "karma"),
    ]
}

fn load_roster(path: Option<&PathBuf>) -> Result<Vec<RosterEntry>> {
    let Some(path) = path else {
        return Ok(default_roster());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing roster {}", path.display()))
}

/// Splits `"Sender Name: text"`.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (from, text) = line.split_once(':')?;
    let from = from.trim();
    if from.is_empty() {
        return None;
    }
    Some((from, text.trim_start()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let transport = Arc::new(ConsoleTransport {
        stdout: Mutex::new(tokio::io::stdout()),
    });

    let mut builder = KarmaRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build(transport)?;
    runtime.refresh_roster(&load_roster(args.roster.as_ref())?).await?;

    let (tx, rx) = mpsc::channel(64);
    let channel = args.channel.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some((from, text)) = parse_line(&line) else {
                        warn!(%line, "Expected `Sender Name: text`");
                        continue;
                    };
                    if tx
                        .send(InboundMessage::new(channel.as_str(), from, text))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });

    runtime.run(rx).await?;
    reader.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("Alice Liddell: bob++"),
            Some(("Alice Liddell", "bob++"))
        );
        assert_eq!(
            parse_line("Bob: @karma echo a: b"),
            Some(("Bob", "@karma echo a: b"))
        );
        assert_eq!(parse_line("no separator"), None);
        assert_eq!(parse_line(" : text"), None);
    }
}
