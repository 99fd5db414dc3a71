//! Line-oriented console front end
//!
//! Each input line is one intent. Entries are addressed by their 1-based
//! position in the list and schedule windows by their 1-based slot.
//!
//! ```text
//! add https://youtu.be/abc123 3 10
//! window 1 start 08:00
//! schedule on
//! start
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::playback::entries::parse_count;
use crate::playback::{Controls, EngineHandle, EntryField, MediaEntry, SequencerSnapshot};
use crate::schedule::WindowField;

pub const HELP: &str = "\
commands:
  start                               begin playback (honors the schedule)
  stop                                stop playback
  add <url> [loops] [delay]           append an entry (loops 0 = forever)
  remove <n>                          remove entry n
  edit <n> url|loop|delay <value>     change one field of entry n
  schedule on|off|toggle              enable or disable schedule gating
  window <n> start|stop <HH:MM|->     set or clear one end of window n
  list                                show entries and windows
  status                              show state and status line
  help                                this text
  quit                                shut down";

/// What to do with the schedule flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    On,
    Off,
    Toggle,
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Add {
        url: String,
        loop_count: u32,
        delay_seconds: u32,
    },
    Remove(usize),
    Edit {
        position: usize,
        field: EntryField,
        value: String,
    },
    Schedule(ScheduleAction),
    Window {
        slot: usize,
        field: WindowField,
        value: String,
    },
    List,
    Status,
    Help,
    Quit,
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(Vec<String>),
    Quit,
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidCommand(msg.into())
}

fn position(word: Option<&str>, what: &str) -> Result<usize> {
    word.and_then(|w| w.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| invalid(format!("expected {} number (1-based)", what)))
}

/// Parse one line; blank lines and `#` comments yield `None`
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();

    let command = match verb.as_str() {
        "start" | "play" => Command::Start,
        "stop" => Command::Stop,
        "add" => {
            let url = words.next().unwrap_or_default().to_string();
            Command::Add {
                url,
                loop_count: words.next().map(parse_count).unwrap_or(1),
                delay_seconds: words.next().map(parse_count).unwrap_or(0),
            }
        }
        "remove" | "rm" => Command::Remove(position(words.next(), "entry")?),
        "edit" => {
            let position = position(words.next(), "entry")?;
            let field = words
                .next()
                .ok_or_else(|| invalid("expected url, loop or delay"))?
                .parse()?;
            Command::Edit {
                position,
                field,
                value: words.collect::<Vec<_>>().join(" "),
            }
        }
        "schedule" => match words.next().map(|w| w.to_ascii_lowercase()).as_deref() {
            Some("on") => Command::Schedule(ScheduleAction::On),
            Some("off") => Command::Schedule(ScheduleAction::Off),
            Some("toggle") | None => Command::Schedule(ScheduleAction::Toggle),
            Some(other) => return Err(invalid(format!("schedule {}", other))),
        },
        "window" => {
            let slot = position(words.next(), "window")?;
            let field = words
                .next()
                .ok_or_else(|| invalid("expected start or stop"))?
                .parse()?;
            let value = match words.next() {
                None | Some("-") => String::new(),
                Some(v) => v.to_string(),
            };
            Command::Window { slot, field, value }
        }
        "list" | "ls" => Command::List,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(invalid(other)),
    };
    Ok(Some(command))
}

/// Render entries and windows for `list`
pub fn render_list(snapshot: &SequencerSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in snapshot.entries.iter().enumerate() {
        let marker = if snapshot.current_entry_id == Some(entry.id) {
            ">"
        } else {
            " "
        };
        let url = if entry.is_valid() {
            entry.url.as_str()
        } else {
            "(empty)"
        };
        let loops = match entry.loop_count {
            0 => "forever".to_string(),
            n => n.to_string(),
        };
        lines.push(format!(
            "{}{:>2}. {}  loops: {}  delay: {}s",
            marker,
            i + 1,
            url,
            loops,
            entry.delay_seconds
        ));
    }

    let schedule = match snapshot.schedule_enabled {
        true => "on",
        false => "off",
    };
    lines.push(format!("schedule: {}", schedule));
    for window in snapshot.windows.iter().filter(|w| w.is_active()) {
        lines.push(format!("  {}", window));
    }
    lines
}

/// Render state and status for `status`
pub fn render_status(snapshot: &SequencerSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("state: {}", snapshot.state),
        format!("status: {}", snapshot.status),
    ];
    if snapshot.state.is_running() {
        lines.push(format!(
            "position: {} (loop {})",
            snapshot.current_valid_index + 1,
            snapshot.loops_completed + 1
        ));
    }
    lines
}

async fn entry_at(handle: &EngineHandle, position: usize) -> Result<MediaEntry> {
    let snapshot = handle.snapshot().await?;
    snapshot
        .entries
        .get(position - 1)
        .cloned()
        .ok_or_else(|| invalid(format!("no entry {}", position)))
}

/// Whether the presentation controls currently allow `command`
pub fn allowed(command: &Command, controls: &Controls) -> bool {
    match command {
        Command::Add { .. } => controls.add_entry,
        Command::Remove(_) => controls.remove_entry,
        Command::Edit { .. } => controls.edit_entry,
        Command::Schedule(_) => controls.toggle_schedule,
        Command::Window { .. } => controls.edit_schedule,
        _ => true,
    }
}

/// Apply one command through the engine
///
/// List and schedule edits are refused while a run is in progress, the same
/// way the controls for them are disabled.
pub async fn execute(handle: &EngineHandle, command: Command) -> Result<Outcome> {
    debug!("Console command: {:?}", command);
    let mut out = Vec::new();

    if !matches!(command, Command::Quit | Command::Help) {
        let controls = handle.snapshot().await?.controls;
        if !allowed(&command, &controls) {
            return Err(Error::InvalidState(
                "not available now (stop playback, or enable the schedule first)".into(),
            ));
        }
    }

    match command {
        Command::Start => handle.start()?,
        Command::Stop => handle.stop()?,
        Command::Add {
            url,
            loop_count,
            delay_seconds,
        } => {
            handle
                .add_entry(MediaEntry::new(url, loop_count, delay_seconds))
                .await?;
        }
        Command::Remove(position) => {
            let entry = entry_at(handle, position).await?;
            handle.remove_entry(entry.id).await?;
        }
        Command::Edit {
            position,
            field,
            value,
        } => {
            let entry = entry_at(handle, position).await?;
            handle.edit_entry(entry.id, field, &value).await?;
        }
        Command::Schedule(action) => {
            let enabled = match action {
                ScheduleAction::On => {
                    handle.set_schedule_enabled(true)?;
                    true
                }
                ScheduleAction::Off => {
                    handle.set_schedule_enabled(false)?;
                    false
                }
                ScheduleAction::Toggle => handle.toggle_schedule().await?,
            };
            out.push(format!("schedule {}", if enabled { "on" } else { "off" }));
        }
        Command::Window { slot, field, value } => {
            handle.edit_schedule_window(slot - 1, field, &value).await?;
        }
        Command::List => out = render_list(&handle.snapshot().await?),
        Command::Status => out = render_status(&handle.snapshot().await?),
        Command::Help => out.push(HELP.to_string()),
        Command::Quit => return Ok(Outcome::Quit),
    }
    Ok(Outcome::Continue(out))
}

/// Read commands from `reader` until EOF or `quit`
///
/// Bad commands are reported and skipped. Returns an error only if the
/// engine goes away.
pub async fn run<R>(handle: &EngineHandle, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(handle, command).await {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Continue(out)) => {
                for line in out {
                    println!("{}", line);
                }
            }
            Err(Error::ChannelClosed) => return Err(Error::ChannelClosed),
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}
