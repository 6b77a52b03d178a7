use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::Result;
use stepchord_core::{tables, Session, Signal};
use stepchord_services::Engine;

use crate::parser::{parse_line, Action, ParseContext, HELP};

/// Read commands line by line until `quit` or end of input
pub fn run(engine: &mut Engine, ctx: ParseContext, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    writeln!(out, "stepchord ready. Type 'help' for commands.")?;
    for line in input.lines() {
        let line = line?;
        let action = match parse_line(&line, &ctx) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };

        match action {
            Action::Quit => break,
            Action::Help => writeln!(out, "{}", HELP)?,
            Action::Show => {
                let text = engine.with_session(|s| render(s)).unwrap_or_default();
                write!(out, "{}", text)?;
            }
            Action::Detect => match engine.with_session(|s| s.detect_selection()) {
                Some(Ok(label)) => writeln!(out, "{}", label)?,
                Some(Err(e)) => writeln!(out, "error: {}", e)?,
                None => writeln!(out, "error: session unavailable")?,
            },
            Action::Progressions => {
                for p in tables().progressions() {
                    writeln!(out, "{:<10} {} (in {})", p.name, p.symbols.join(" "), p.default_key)?;
                }
            }
            Action::Run(command) => match engine.handle(command) {
                Ok(response) => writeln!(out, "{}", describe(&response.signal))?,
                Err(e) => writeln!(out, "error: {}", e)?,
            },
        }
    }
    Ok(())
}

fn describe(signal: &Signal) -> String {
    match signal {
        Signal::Applied => "ok".to_string(),
        Signal::TrackCreated(id) => format!("track {}", id.0),
        Signal::NotesAdded(ids) => {
            let ids: Vec<String> = ids.iter().map(|id| id.0.to_string()).collect();
            format!("added {}", ids.join(", "))
        }
        Signal::Started(_) => "started".to_string(),
        Signal::Stopped => "stopped".to_string(),
        Signal::Captured { step } => format!("captured at step {}", step),
        Signal::Recorded { notes } => format!("recorded {} notes", notes),
        Signal::NothingRecorded => "nothing recorded".to_string(),
        Signal::NothingSelected => "nothing selected".to_string(),
        Signal::ClipboardEmpty => "clipboard empty".to_string(),
        Signal::NothingToUndo => "nothing to undo".to_string(),
        Signal::NothingToRedo => "nothing to redo".to_string(),
        Signal::Ignored => "no change".to_string(),
    }
}

/// Transport line, track list, then the active track's notes
fn render(session: &Session) -> String {
    let mut s = String::new();
    let scheduler = session.scheduler();
    let snap = session
        .snap()
        .map_or_else(|| "off".to_string(), |u| u.0.to_string());
    let _ = writeln!(
        s,
        "{:?} {} BPM step {}/{} key {} snap {}{}",
        session.transport_state(),
        scheduler.bpm(),
        scheduler.current_step(),
        scheduler.total_steps(),
        session.key(),
        snap,
        if session.chord_mode() { " chord-mode" } else { "" },
    );

    let active = session.active_track();
    for track in &session.document().tracks {
        let _ = writeln!(
            s,
            "{} {:>3} {:<12} [{}] vol {:.0} pan {:+.2}{}{}",
            if Some(track.id) == active { "*" } else { " " },
            track.id.0,
            track.name,
            track.instrument_id,
            track.volume,
            track.pan,
            if track.muted { " M" } else { "" },
            if track.solo { " S" } else { "" },
        );
    }

    let Some(track) = active.and_then(|id| session.document().track(id).ok()) else {
        return s;
    };
    let mut notes: Vec<_> = track.notes.iter().collect();
    notes.sort_by(|a, b| a.step.total_cmp(&b.step).then(b.pitch().midi().cmp(&a.pitch().midi())));
    for n in notes {
        let _ = writeln!(
            s,
            "    #{:<4} {:<4} step {:<6} len {:<4} vel {:>3}{}",
            n.id.0,
            n.pitch().to_string(),
            n.step,
            n.length,
            n.velocity,
            if session.selection().contains(n.id) { " *" } else { "" },
        );
    }
    s
}
