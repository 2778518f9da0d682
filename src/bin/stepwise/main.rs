//! stepwise - play a command-stream song file
//!
//! Run with: cargo run -- song.txt

mod audio;
mod song;

use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use cpal::traits::StreamTrait;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal,
};
use stepwise::{
    dsp::{Envelope, Oscillator, OscillatorSwitch},
    engine::Controller,
    sequencing::{CommandStream, Sequencer, SynthCommand, SynthProcessor, TimeManager},
    synth::{DeviceManager, Instrument, Voice},
    Engine, EngineConfig,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audio::Output;

/// Play a song file through the default audio output
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Song file, one command per line
    song: PathBuf,

    /// Output sample rate in Hz (device default if omitted)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frames per audio callback (device default if omitted)
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Tempo for the step grid
    #[arg(long, default_value_t = 120.0)]
    bpm: f32,

    /// Step on a fixed tempo grid instead of following note durations
    #[arg(long)]
    grid: bool,

    /// Stop at the end of the song instead of looping
    #[arg(long)]
    no_loop: bool,
}

/// Mono instrument every song part is cloned from: a triangle, saw and
/// pulse behind a switch, with a long plucked envelope.
fn prototype() -> Instrument {
    let oscillators = OscillatorSwitch::new()
        .with(Oscillator::triangle())
        .with(Oscillator::saw())
        .with(Oscillator::pulse(0.5));
    Instrument::mono(Voice::new(
        oscillators.into(),
        Envelope::adsr(0.01, 2.0, 0.2, 0.5),
    ))
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepwise=info")))
        .init();

    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.song)
        .wrap_err_with(|| format!("failed to read {}", cli.song.display()))?;
    let song = song::parse(&source);
    info!(
        commands = song.commands.len(),
        instruments = song.instruments,
        "loaded {}",
        cli.song.display()
    );

    let output = Output::open(cli.sample_rate, cli.buffer_size)?;

    let mut config = EngineConfig::default()
        .with_sample_rate(output.sample_rate())
        .with_bpm(cli.bpm)
        .with_looping(!cli.no_loop);
    if let Some(frames) = cli.buffer_size {
        config = config.with_buffer_size(frames);
    }
    config.validate()?;

    let mut devices = DeviceManager::new();
    let proto = prototype();
    for _ in 0..song.instruments {
        devices.clone_instrument(&proto);
    }

    let time = if cli.grid {
        config.tempo_clock()?
    } else {
        TimeManager::event_based()
    };
    let mut stream = CommandStream::with_commands(song.commands, config.looping);
    if !config.looping {
        // A one-shot stream stops on its last command without playing it.
        stream.add(SynthCommand::Wait { duration: 0.0 });
    }
    let sequencer = Sequencer::new(time, stream, SynthProcessor::new(config.sample_rate));

    let engine = Engine::new(&config, sequencer, devices)?;
    let (mut controller, rx) = engine.controller(64);

    let audio = output.start(&config, engine, rx)?;
    audio.play().wrap_err("failed to start audio stream")?;

    println!("=== stepwise ===");
    println!("p: play/pause   s: stop   q: quit");
    println!();

    controller.transport().play();

    terminal::enable_raw_mode().wrap_err("failed to enter raw mode")?;
    let result = run_keys(&mut controller);
    terminal::disable_raw_mode().wrap_err("failed to leave raw mode")?;

    result
}

fn run_keys(controller: &mut Controller) -> EyreResult<()> {
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('p') => {
                controller.transport().toggle();
            }
            KeyCode::Char('s') => {
                if let Err(err) = controller.stop() {
                    warn!(%err, "stop not delivered");
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            _ => {}
        }
    }
}
