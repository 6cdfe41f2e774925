//! Line command parsing
//!
//! One command per line, words separated by whitespace. Commands that change
//! playback map onto a [`SessionCommand`]; the rest are handled by the shell.

use encore_playback::SessionCommand;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Select a track by id
    Play(String),
    Toggle,
    Next,
    Prev,
    /// Seek to seconds
    Seek(f64),
    /// Start or finish a drag on the position control
    Scrub(bool),
    /// Move the dragged position to seconds
    Drag(f64),
    Mode,
    Like,
    /// Remove the queue entry at an index
    Remove(usize),
    Route,
    Stop,
    Queue,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{command}': invalid {argument} '{value}'")]
    InvalidArgument {
        command: &'static str,
        argument: &'static str,
        value: String,
    },

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(&'static str),
}

pub const HELP: &str = "\
commands:
  play <id>        select a track from the queue
  toggle           play / pause
  next, prev       skip forward / back
  seek <secs>      jump within the current track
  scrub on|off     start or finish dragging the position
  drag <secs>      move the dragged position
  mode             cycle repeat all -> repeat one -> shuffle
  like             like / unlike the current track
  queue            list the queue
  remove <index>   remove a queue entry
  route            pick an output route
  stop             stop and unload
  status           show the current state
  quit             exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let rest: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "play" | "p" => {
                let id = rest.join(" ");
                if id.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "play",
                        argument: "a track id",
                    });
                }
                return Ok(Command::Play(id));
            }
            "seek" => Command::Seek(parse_seconds("seek", &rest)?),
            "drag" => Command::Drag(parse_seconds("drag", &rest)?),
            "scrub" => Command::Scrub(parse_switch(&rest)?),
            "remove" | "rm" => Command::Remove(parse_index(&rest)?),
            "toggle" | "t" => no_args("toggle", &rest, Command::Toggle)?,
            "next" | "n" => no_args("next", &rest, Command::Next)?,
            "prev" | "previous" => no_args("prev", &rest, Command::Prev)?,
            "mode" | "m" => no_args("mode", &rest, Command::Mode)?,
            "like" => no_args("like", &rest, Command::Like)?,
            "route" => no_args("route", &rest, Command::Route)?,
            "stop" => no_args("stop", &rest, Command::Stop)?,
            "queue" | "q" => no_args("queue", &rest, Command::Queue)?,
            "status" | "s" => no_args("status", &rest, Command::Status)?,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl Command {
    /// Session command this maps to, if it changes playback
    pub fn to_session_command(&self) -> Option<SessionCommand> {
        let command = match self {
            Command::Play(id) => SessionCommand::SelectTrack(id.clone()),
            Command::Toggle => SessionCommand::TogglePlayPause,
            Command::Next => SessionCommand::Next,
            Command::Prev => SessionCommand::Previous,
            Command::Seek(time) => SessionCommand::Seek(*time),
            Command::Scrub(on) => SessionCommand::SetScrubbing(*on),
            Command::Drag(time) => SessionCommand::ScrubTo(*time),
            Command::Mode => SessionCommand::CyclePlaybackMode,
            Command::Like => SessionCommand::ToggleLike,
            Command::Remove(index) => SessionCommand::RemoveTrack(*index),
            Command::Route => SessionCommand::PresentRoutePicker,
            Command::Stop => SessionCommand::Stop,
            Command::Queue | Command::Status | Command::Help | Command::Quit => return None,
        };
        Some(command)
    }
}

fn no_args(command: &'static str, rest: &[&str], parsed: Command) -> Result<Command, CommandError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnexpectedArgument(command))
    }
}

/// Seconds as a plain number or `m:ss`
fn parse_seconds(command: &'static str, rest: &[&str]) -> Result<f64, CommandError> {
    let [value] = rest else {
        return Err(CommandError::MissingArgument {
            command,
            argument: "a time in seconds",
        });
    };

    let invalid = || CommandError::InvalidArgument {
        command,
        argument: "time",
        value: (*value).to_string(),
    };

    let seconds = match value.split_once(':') {
        Some((minutes, secs)) => {
            let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
            let secs: f64 = secs.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&secs) {
                return Err(invalid());
            }
            f64::from(minutes) * 60.0 + secs
        }
        None => value.parse().map_err(|_| invalid())?,
    };

    if seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(invalid())
    }
}

fn parse_switch(rest: &[&str]) -> Result<bool, CommandError> {
    let [value] = rest else {
        return Err(CommandError::MissingArgument {
            command: "scrub",
            argument: "'on' or 'off'",
        });
    };
    match value.to_ascii_lowercase().as_str() {
        "on" | "start" => Ok(true),
        "off" | "end" => Ok(false),
        _ => Err(CommandError::InvalidArgument {
            command: "scrub",
            argument: "switch",
            value: (*value).to_string(),
        }),
    }
}

fn parse_index(rest: &[&str]) -> Result<usize, CommandError> {
    let [value] = rest else {
        return Err(CommandError::MissingArgument {
            command: "remove",
            argument: "a queue index",
        });
    };
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command: "remove",
        argument: "index",
        value: (*value).to_string(),
    })
}
