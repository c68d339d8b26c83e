//! CLI channel: stdin/stdout REPL for the simulator.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

const PROMPT: &str = "> ";

/// Reads lines from stdin and writes replies to stdout. Status lines go to
/// stderr so stdout stays a clean conversation log.
#[derive(Debug, Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            eprint!("{PROMPT}");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("{PROMPT}");
                            continue;
                        }
                        if tx.send(IncomingMessage::new("cli", "local-user", line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: Option<&IncomingMessage>,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", response.content);
        eprint!("{PROMPT}");
        Ok(())
    }

    async fn send_status(&self, status: StatusUpdate) -> Result<(), ChannelError> {
        match status {
            StatusUpdate::Thinking(msg) => eprintln!("⏳ {msg}"),
            StatusUpdate::Activity {
                agent,
                action,
                ticket_id,
            } => match ticket_id {
                Some(ticket) => eprintln!("✅ [{agent}] {action} ({ticket})"),
                None => eprintln!("✅ [{agent}] {action}"),
            },
            StatusUpdate::StageChanged {
                case_id,
                stage,
                progress,
            } => eprintln!("📈 {case_id} → {stage} ({progress}%)"),
            StatusUpdate::Notice { level, message } => eprintln!("🔔 {level}: {message}"),
            StatusUpdate::Status(msg) => eprintln!("ℹ️  {msg}"),
        }
        Ok(())
    }
}
