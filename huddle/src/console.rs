//! Line-based console that drives the router.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, bail};
use huddle_core::participant::{ParticipantDirectory, ParticipantSlot};
use huddle_core::session::SessionMode;
use huddle_core::{DeliveryRouter, SendOutcome, SendRequest};
use huddle_protocol::{ChatMessage, Packet};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::session::DemoSession;

const HELP: &str = "commands: <text> | /team <text> | /msg <slot> <text> | /recv <slot> <text> \
                    | /leave <slot> | /session on|off | /mode activity|open | /quit";

/// One parsed console line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Send to everyone, or to the team.
    Say {
        /// Message text.
        text: String,
        /// Team chat.
        team_only: bool,
    },
    /// Send to one participant.
    Whisper {
        /// Recipient.
        slot: ParticipantSlot,
        /// Message text.
        text: String,
    },
    /// Pretend a remote participant sent something.
    Receive {
        /// Sender.
        slot: ParticipantSlot,
        /// Message text.
        text: String,
    },
    /// Disconnect a remote participant.
    Leave(ParticipantSlot),
    /// Start or end the session.
    Session(bool),
    /// Switch team rules.
    Mode(SessionMode),
    /// Print usage.
    Help,
    /// Exit.
    Quit,
}

fn parse_slot(arg: Option<&str>) -> anyhow::Result<ParticipantSlot> {
    let arg = arg.context("missing slot")?;
    let slot = arg.parse().with_context(|| format!("invalid slot {arg:?}"))?;
    Ok(ParticipantSlot(slot))
}

fn split_slot_and_text(rest: &str) -> anyhow::Result<(ParticipantSlot, String)> {
    let mut parts = rest.splitn(2, ' ');
    let slot = parse_slot(parts.next().filter(|part| !part.is_empty()))?;
    let text = parts.next().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        bail!("missing message text");
    }
    Ok((slot, text.to_string()))
}

/// Parses a console line; `None` for blank lines.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say {
            text: line.to_string(),
            team_only: false,
        }));
    };

    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();
    let parsed = match name {
        "team" if !rest.is_empty() => Command::Say {
            text: rest.to_string(),
            team_only: true,
        },
        "team" => bail!("missing message text"),
        "msg" => {
            let (slot, text) = split_slot_and_text(rest)?;
            Command::Whisper { slot, text }
        }
        "recv" => {
            let (slot, text) = split_slot_and_text(rest)?;
            Command::Receive { slot, text }
        }
        "leave" => Command::Leave(parse_slot(Some(rest))?),
        "session" => match rest {
            "on" => Command::Session(true),
            "off" => Command::Session(false),
            other => bail!("expected on or off, got {other:?}"),
        },
        "mode" => match rest {
            "activity" => Command::Mode(SessionMode::Activity),
            "open" => Command::Mode(SessionMode::OpenWorld),
            other => bail!("expected activity or open, got {other:?}"),
        },
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command /{other}"),
    };
    Ok(Some(parsed))
}

fn report(outcome: &SendOutcome) {
    log::info!(
        "Message {} delivered to {} participant(s), {} failed ({})",
        outcome.message_id,
        outcome.delivered.len(),
        outcome.failed.len(),
        outcome.verdict
    );
}

/// Runs one command. Returns `false` when the console should stop.
fn execute(
    router: &DeliveryRouter,
    session: &DemoSession,
    command: Command,
) -> anyhow::Result<bool> {
    match command {
        Command::Say { text, team_only } => {
            report(&router.send(SendRequest::new(text).team_only(team_only))?);
        }
        Command::Whisper { slot, text } => {
            report(&router.send(SendRequest::new(text).to(slot))?);
        }
        Command::Receive { slot, text } => {
            let sender = session
                .by_slot(slot)
                .with_context(|| format!("no participant in slot {slot}"))?;
            let bytes = ChatMessage::new(sender.handle, text, false)?.encode();
            let inbound = router.receive(sender.connection, &bytes)?;
            log::debug!("Inbound from {} classified {}", inbound.sender.name, inbound.verdict);
        }
        Command::Leave(slot) => {
            let participant = session
                .leave(slot)
                .with_context(|| format!("no participant in slot {slot}"))?;
            router.participant_left(participant.id);
            log::info!("{} left the session", participant.name);
        }
        Command::Session(active) => session.set_active(active),
        Command::Mode(mode) => session.set_mode(mode),
        Command::Help => log::info!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Feeds lines from the reader `open` returns into a channel, on a detached
/// thread. A read blocked there never holds up runtime shutdown.
pub fn spawn_line_reader<R, F>(open: F) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead,
    F: FnOnce() -> R + Send + 'static,
{
    let (lines_tx, lines_rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in open().lines() {
                if lines_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(lines_rx)
}

/// Runs commands from `lines` until `/quit`, end of input or cancellation.
pub async fn run(
    router: Arc<DeliveryRouter>,
    session: Arc<DemoSession>,
    mut lines: mpsc::Receiver<io::Result<String>>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("{HELP}");
    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line.transpose()? else {
            break;
        };

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                log::warn!("{err}");
                continue;
            }
        };
        match execute(&router, &session, command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => log::warn!("{err:#}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use huddle_core::session::SessionOracle;
    use huddle_core::{RelayConfig, job_queue};

    use super::*;

    fn console_parts() -> (Arc<DeliveryRouter>, Arc<DemoSession>) {
        let mut config = RelayConfig::default();
        config.log.log_chat_messages = false;
        let session = Arc::new(DemoSession::new("me"));
        let (guard, _pump) = job_queue(4);
        let router = DeliveryRouter::new(session.collaborators(), guard, &config);
        (Arc::new(router), session)
    }

    #[tokio::test]
    async fn cancellation_stops_a_console_waiting_for_input() {
        let (router, session) = console_parts();
        let (_input, lines) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run(router, session, lines, shutdown),
        )
        .await;
        assert!(finished.unwrap().is_ok());
    }

    #[tokio::test]
    async fn reader_lines_drive_commands_until_quit() {
        let (router, session) = console_parts();
        let input = Cursor::new("/session off\n/quit\n/session on\n");
        let lines = spawn_line_reader(move || input).unwrap();

        run(router, session.clone(), lines, CancellationToken::new())
            .await
            .unwrap();
        assert!(!session.is_session_active());
    }

    #[test]
    fn plain_text_is_a_global_message() {
        assert_eq!(
            parse("  hello there ").unwrap(),
            Some(Command::Say {
                text: "hello there".to_string(),
                team_only: false
            })
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn slot_commands_split_slot_and_text() {
        assert_eq!(
            parse("/msg 3 meet at the pier").unwrap(),
            Some(Command::Whisper {
                slot: ParticipantSlot(3),
                text: "meet at the pier".to_string()
            })
        );
        assert_eq!(
            parse("/recv 1 hi").unwrap(),
            Some(Command::Receive {
                slot: ParticipantSlot(1),
                text: "hi".to_string()
            })
        );
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(parse("/msg x hi").is_err());
        assert!(parse("/msg 3").is_err());
        assert!(parse("/team").is_err());
        assert!(parse("/session maybe").is_err());
        assert!(parse("/dance").is_err());
    }

    #[test]
    fn session_controls_parse() {
        assert_eq!(
            parse("/team go").unwrap(),
            Some(Command::Say {
                text: "go".to_string(),
                team_only: true
            })
        );
        assert_eq!(
            parse("/leave 2").unwrap(),
            Some(Command::Leave(ParticipantSlot(2)))
        );
        assert_eq!(
            parse("/session off").unwrap(),
            Some(Command::Session(false))
        );
        assert_eq!(
            parse("/mode activity").unwrap(),
            Some(Command::Mode(SessionMode::Activity))
        );
        assert_eq!(parse("/quit").unwrap(), Some(Command::Quit));
    }
}
