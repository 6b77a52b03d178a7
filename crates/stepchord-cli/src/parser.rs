//! Text command parser for the REPL

use stepchord_core::theory::Mode;
use stepchord_core::{ArpMode, Command, NoteId, Pitch, PitchClass, SelectionBox, SnapUnit, TrackId, Transform};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{command}: missing {what}")]
    Missing { command: &'static str, what: &'static str },
    #[error("{command}: invalid {what} '{value}'")]
    Invalid {
        command: &'static str,
        what: &'static str,
        value: String,
    },
}

/// What a line asks the REPL to do
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Run(Command),
    Show,
    Detect,
    Progressions,
    Help,
    Quit,
}

/// Defaults the parser fills in for omitted arguments
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub default_octave: i8,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self { default_octave: 4 }
    }
}

struct Args<'a> {
    command: &'static str,
    words: std::slice::Iter<'a, &'a str>,
}

impl<'a> Args<'a> {
    fn next(&mut self, what: &'static str) -> Result<&'a str, ParseError> {
        self.words
            .next()
            .copied()
            .ok_or(ParseError::Missing { command: self.command, what })
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &'static str) -> Result<T, ParseError> {
        let word = self.next(what)?;
        self.value(word, what)
    }

    fn parse_or<T: std::str::FromStr>(&mut self, what: &'static str, default: T) -> Result<T, ParseError> {
        match self.words.next() {
            Some(word) => self.value(word, what),
            None => Ok(default),
        }
    }

    fn value<T: std::str::FromStr>(&self, word: &str, what: &'static str) -> Result<T, ParseError> {
        word.parse().map_err(|_| ParseError::Invalid {
            command: self.command,
            what,
            value: word.to_string(),
        })
    }

    fn track(&mut self) -> Result<TrackId, ParseError> {
        self.parse("track id").map(TrackId)
    }

    fn note(&mut self) -> Result<NoteId, ParseError> {
        self.parse("note id").map(NoteId)
    }

    fn switch(&mut self) -> Result<bool, ParseError> {
        match self.next("on|off")? {
            "on" => Ok(true),
            "off" => Ok(false),
            other => Err(ParseError::Invalid {
                command: self.command,
                what: "on|off",
                value: other.to_string(),
            }),
        }
    }

    /// Remaining words joined, for names with spaces
    fn rest(&mut self, what: &'static str) -> Result<String, ParseError> {
        let words: Vec<&str> = self.words.by_ref().copied().collect();
        if words.is_empty() {
            return Err(ParseError::Missing { command: self.command, what });
        }
        Ok(words.join(" "))
    }
}

fn arp_mode(word: &str) -> Option<ArpMode> {
    match word {
        "up" => Some(ArpMode::Up),
        "down" => Some(ArpMode::Down),
        "updown" | "up-down" => Some(ArpMode::UpDown),
        "random" => Some(ArpMode::Random),
        _ => None,
    }
}

fn mode(word: &str) -> Option<Mode> {
    match word {
        "major" | "maj" => Some(Mode::Major),
        "minor" | "min" => Some(Mode::Minor),
        _ => None,
    }
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, ctx: &ParseContext) -> Result<Option<Action>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let (head, tail) = (words[0].to_lowercase(), &words[1..]);

    macro_rules! args {
        ($name:literal) => {
            Args { command: $name, words: tail.iter() }
        };
    }

    let command = match head.as_str() {
        "help" | "?" => return Ok(Some(Action::Help)),
        "quit" | "exit" | "q" => return Ok(Some(Action::Quit)),
        "show" | "ls" => return Ok(Some(Action::Show)),
        "detect" => return Ok(Some(Action::Detect)),
        "progs" => return Ok(Some(Action::Progressions)),

        // Tracks
        "track" => {
            let mut a = args!("track");
            let instrument_id = a.next("instrument")?.to_string();
            let name = a.rest("name")?;
            Command::CreateTrack { name, instrument_id }
        }
        "select" => Command::SelectTrack(args!("select").track()?),
        "dup" => Command::DuplicateTrack(args!("dup").track()?),
        "rmtrack" => Command::RemoveTrack(args!("rmtrack").track()?),
        "rename" => {
            let mut a = args!("rename");
            let track = a.track()?;
            Command::RenameTrack { track, name: a.rest("name")? }
        }
        "mute" => {
            let mut a = args!("mute");
            Command::SetMute { track: a.track()?, muted: a.switch()? }
        }
        "solo" => {
            let mut a = args!("solo");
            Command::SetSolo { track: a.track()?, solo: a.switch()? }
        }
        "vol" => {
            let mut a = args!("vol");
            Command::SetVolume { track: a.track()?, volume: a.parse("volume")? }
        }
        "pan" => {
            let mut a = args!("pan");
            Command::SetPan { track: a.track()?, pan: a.parse("pan")? }
        }

        // Notes
        "add" => {
            let mut a = args!("add");
            let pitch: Pitch = a.parse("pitch")?;
            Command::AddNote { pitch, step: a.parse("step")? }
        }
        "rm" => Command::RemoveNote(args!("rm").note()?),
        "move" => {
            let mut a = args!("move");
            let id = a.note()?;
            let step = a.parse("step")?;
            Command::MoveNote { id, step, pitch: a.parse("pitch")? }
        }
        "resize" => {
            let mut a = args!("resize");
            Command::ResizeNote { id: a.note()?, length: a.parse("length")? }
        }
        "clear" => {
            let mut a = args!("clear");
            Command::ClearRegion { from: a.parse("from step")?, to: a.parse("to step")? }
        }
        "press" => Command::NoteOn(args!("press").parse("pitch")?),

        // Harmony
        "key" => Command::SetKey(args!("key").parse::<PitchClass>("key")?),
        "prog" => Command::SetProgression(args!("prog").next("progression")?.to_string()),
        "inv" => Command::SetInversion(args!("inv").parse("inversion")?),
        "chordmode" => Command::ToggleChordMode,
        "chord" => {
            let mut a = args!("chord");
            let symbol = a.next("symbol")?.to_string();
            let step = a.parse("step")?;
            Command::InsertChord { symbol, step, octave: a.parse_or("octave", ctx.default_octave)? }
        }
        "insprog" => {
            let mut a = args!("insprog");
            let step = a.parse("step")?;
            let octave = a.parse_or("octave", ctx.default_octave)?;
            Command::InsertProgression { step, octave, steps_per_chord: a.parse_or("steps per chord", 4.0)? }
        }

        // Transport
        "play" => Command::PlayToggle,
        "stop" => Command::Stop,
        "rec" => Command::StartRecording,
        "endrec" => Command::StopRecording,
        "bpm" => Command::SetBpm(args!("bpm").parse("bpm")?),

        // Editing
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "box" => {
            let mut a = args!("box");
            let from: f64 = a.parse("from step")?;
            let to: f64 = a.parse("to step")?;
            let low: Pitch = a.parse("low pitch")?;
            let high: Pitch = a.parse("high pitch")?;
            let additive = matches!(a.words.next(), Some(&"+"));
            Command::SelectBox {
                region: SelectionBox::from_corners((from, low.piano_row()), (to, high.piano_row())),
                additive,
            }
        }
        "all" => Command::SelectAll,
        "none" => Command::ClearSelection,
        "copy" => Command::Copy,
        "paste" => Command::Paste { at_step: args!("paste").parse("step")? },
        "del" => Command::DeleteSelection,
        "snap" => {
            let mut a = args!("snap");
            match a.next("unit or toggle")? {
                "toggle" => Command::ToggleSnap,
                unit => Command::SetSnap(SnapUnit(a.value(unit, "unit")?)),
            }
        }

        // Transforms
        "transpose" => Command::Apply(Transform::Transpose { semitones: args!("transpose").parse("semitones")? }),
        "humanize" => Command::Apply(Transform::Humanize { amount_percent: args!("humanize").parse("amount")? }),
        "swing" => Command::Apply(Transform::Swing { swing_percent: args!("swing").parse("amount")? }),
        "quantize" => Command::Apply(Transform::Quantize),
        "vel" => Command::Apply(Transform::SetVelocity { velocity: args!("vel").parse("velocity")? }),
        "arp" => {
            let mut a = args!("arp");
            let word = a.next("mode")?;
            let mode = arp_mode(word).ok_or_else(|| ParseError::Invalid {
                command: "arp",
                what: "mode",
                value: word.to_string(),
            })?;
            Command::Apply(Transform::Arpeggiate { mode, step_spacing: a.parse_or("spacing", 1.0)? })
        }
        "fit" => {
            let mut a = args!("fit");
            let key: PitchClass = a.parse("key")?;
            let word = a.words.next().copied().unwrap_or("major");
            let mode = mode(word).ok_or_else(|| ParseError::Invalid {
                command: "fit",
                what: "mode",
                value: word.to_string(),
            })?;
            Command::Apply(Transform::FitToKey { key, mode })
        }

        _ => return Err(ParseError::UnknownCommand(words[0].to_string())),
    };
    Ok(Some(Action::Run(command)))
}

pub const HELP: &str = "\
tracks:     track <instrument> <name> | select <id> | dup <id> | rmtrack <id>
            rename <id> <name> | mute <id> on|off | solo <id> on|off
            vol <id> <0-100> | pan <id> <-1..1>
notes:      add <pitch> <step> | rm <id> | move <id> <step> <pitch>
            resize <id> <len> | clear <from> <to> | press <pitch>
harmony:    key <pc> | prog <name> | progs | inv <0-3> | chordmode
            chord <symbol> <step> [octave] | insprog <step> [octave] [steps]
transport:  play | stop | rec | endrec | bpm <n>
editing:    undo | redo | all | none | box <from> <to> <low> <high> [+]
            copy | paste <step> | del | snap <unit>|toggle | detect
transforms: transpose <n> | humanize <pct> | swing <pct> | quantize
            vel <n> | arp up|down|updown|random [spacing] | fit <key> [major|minor]
other:      show | help | quit";
