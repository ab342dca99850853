//! Local console channel: one command per line on stdin, replies on stdout.

use crate::ChannelAdapter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fetchbot_commands::CommandRouter;
use fetchbot_core::InboundMessage;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

pub const CHANNEL_NAME: &str = "console";
const PROMPT: &str = "> ";

pub struct ConsoleAdapter {
    router: Arc<CommandRouter>,
}

impl ConsoleAdapter {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ChannelAdapter for ConsoleAdapter {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<()> {
        let handled = run_console(&self.router, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        info!(handled, "Console session ended");
        Ok(())
    }
}

/// Read lines until EOF, `exit` or `quit`, writing one reply per command.
///
/// Returns the number of commands dispatched.
pub async fn run_console<R, W>(router: &CommandRouter, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;

    loop {
        output.write_all(PROMPT.as_bytes()).await.context("Failed to write prompt")?;
        output.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read console input")? else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "exit" | "quit") {
            break;
        }

        let reply = router.handle(&InboundMessage::new(CHANNEL_NAME, "local", line)).await;
        output.write_all(reply.text.as_bytes()).await?;
        output.write_all(b"\n").await?;
        handled += 1;
    }

    output.flush().await?;
    Ok(handled)
}
