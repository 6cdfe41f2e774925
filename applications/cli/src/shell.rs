//! Interactive command loop
//!
//! Reads line commands, forwards playback changes to the session and answers
//! local queries (`status`, `queue`, `help`) from the published snapshot.

use crate::commands::{Command, CommandError, HELP};
use crate::render::{describe_event, queue_listing, status_line};
use encore_playback::{SessionCommand, SessionEvent, SessionHandle};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    handle: SessionHandle,
}

impl Shell {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        writeln!(out, "type 'help' for commands")?;

        while let Some(line) = lines.next_line().await? {
            if self.handle_line(&line, out).await? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply one input line
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                return Ok(Flow::Continue);
            }
        };

        if let Some(session_command) = command.to_session_command() {
            // Commands are applied in order, so the id read here is the one removed
            let removed = match &session_command {
                SessionCommand::RemoveTrack(index) => self
                    .handle
                    .snapshot()
                    .queue
                    .get(*index)
                    .map(|track| track.id.clone()),
                _ => None,
            };

            match self.handle.execute(session_command).await {
                Ok(()) => {
                    if let Some(id) = removed {
                        writeln!(out, "removed {}", id)?;
                    }
                }
                Err(e) => writeln!(out, "error: {}", e)?,
            }
            return Ok(Flow::Continue);
        }

        match command {
            Command::Status => writeln!(out, "{}", status_line(&self.handle.snapshot()))?,
            Command::Queue => {
                let snapshot = self.handle.snapshot();
                writeln!(out, "{}", queue_listing(&snapshot.queue, snapshot.queue_index))?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            other => debug!("Command {:?} has no local handler", other),
        }
        Ok(Flow::Continue)
    }
}

/// Print session events to stdout until the session goes away
pub fn spawn_event_printer(mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(error) = event.as_error() {
                        debug!("Session reported: {}", error);
                    }
                    if let Some(text) = describe_event(&event) {
                        println!("  {}", text);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event printer fell behind, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
