//! Song file parser
//!
//! One command per line, fields separated by whitespace, `#` starts a
//! comment:
//!
//! ```text
//! N ins dur pitch    note (pitch 0 is a rest)
//! O ins              note off
//! P ins amount       pan, 0 = left, 1 = right
//! V ins amount       volume
//! W ins shape        waveform: 0 triangle, 1 saw, 2 pulse
//! A|D|S|R ins amount envelope attack / decay / sustain / release
//! T bpm              tempo (tempo clock only)
//! J cursor           jump to command number `cursor`
//! ```
//!
//! Jump targets count commands, not lines. Lines that fail to parse are
//! logged and skipped.

use std::{fmt::Display, str::FromStr, str::SplitWhitespace};

use color_eyre::eyre::{bail, eyre, Result as EyreResult};
use stepwise::sequencing::SynthCommand;
use tracing::{debug, warn};

/// Highest number of instruments a song may address.
pub const MAX_INSTRUMENTS: usize = 32;

#[derive(Debug, Default)]
pub struct Song {
    pub commands: Vec<SynthCommand>,
    /// One past the highest instrument index used.
    pub instruments: usize,
}

pub fn parse(source: &str) -> Song {
    let mut song = Song::default();

    for (number, line) in source.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(command) => {
                if let Some(index) = command.instrument() {
                    song.instruments = song.instruments.max(index + 1);
                }
                song.commands.push(command);
            }
            Err(err) => warn!(line = number + 1, %err, "skipping song line"),
        }
    }

    debug!(
        commands = song.commands.len(),
        instruments = song.instruments,
        "song parsed"
    );
    song
}

fn field<T>(fields: &mut SplitWhitespace<'_>, name: &str) -> EyreResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = fields.next().ok_or_else(|| eyre!("missing {name}"))?;
    raw.parse().map_err(|err| eyre!("bad {name} `{raw}`: {err}"))
}

fn instrument(fields: &mut SplitWhitespace<'_>) -> EyreResult<Option<usize>> {
    let index: usize = field(fields, "instrument")?;
    if index >= MAX_INSTRUMENTS {
        bail!("instrument {index} is over the limit of {MAX_INSTRUMENTS}");
    }
    Ok(Some(index))
}

fn parse_line(line: &str) -> EyreResult<SynthCommand> {
    let mut fields = line.split_whitespace();
    let op = fields.next().ok_or_else(|| eyre!("empty line"))?;
    let f = &mut fields;

    let command = match op {
        "N" => {
            let instrument = instrument(f)?;
            let duration = field(f, "duration")?;
            let pitch = field(f, "pitch")?;
            SynthCommand::Note {
                instrument,
                voice: 0,
                pitch,
                duration,
            }
        }
        "O" => SynthCommand::NoteOff {
            instrument: instrument(f)?,
            voice: 0,
        },
        "P" => SynthCommand::Pan {
            instrument: instrument(f)?,
            pan: field(f, "amount")?,
        },
        "V" => SynthCommand::Volume {
            instrument: instrument(f)?,
            volume: field(f, "amount")?,
        },
        "W" => SynthCommand::Waveshape {
            instrument: instrument(f)?,
            index: field(f, "shape")?,
        },
        "A" => SynthCommand::Attack {
            instrument: instrument(f)?,
            seconds: field(f, "amount")?,
        },
        "D" => SynthCommand::Decay {
            instrument: instrument(f)?,
            seconds: field(f, "amount")?,
        },
        "S" => SynthCommand::Sustain {
            instrument: instrument(f)?,
            level: field(f, "amount")?,
        },
        "R" => SynthCommand::Release {
            instrument: instrument(f)?,
            seconds: field(f, "amount")?,
        },
        "T" => SynthCommand::Tempo {
            bpm: field(f, "bpm")?,
        },
        "J" => SynthCommand::Jump {
            cursor: field(f, "cursor")?,
        },
        other => bail!("unknown command `{other}`"),
    };

    if let Some(extra) = fields.next() {
        bail!("unexpected trailing field `{extra}`");
    }
    Ok(command)
}
