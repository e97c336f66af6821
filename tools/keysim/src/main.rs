use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use keybed::velocity::{MAX_VEL_MICROS, MAX_VEL_OUT, MIN_VEL_MICROS, MIN_VEL_OUT, VelocityCurve};
use keybed::{NoteEvent, NoteMode, UsbMidiPacket, midi};
use tracing_subscriber::EnvFilter;

use keysim::script;
use keysim::sim::Simulator;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a key script through the note state machines and print every packet sent
    Replay {
        script: PathBuf,

        /// Key behaviour. Defaults to the one keybed was built with.
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// MIDI channel, 1-16
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=16))]
        channel: u8,

        #[arg(long, value_enum, default_value_t = Format::Hex)]
        format: Format,
    },

    /// Print the velocity for a range of contact gaps
    Curve {
        #[arg(long, default_value_t = 0)]
        from: u32,

        #[arg(long, default_value_t = MAX_VEL_MICROS)]
        to: u32,

        #[arg(long, default_value_t = 2_000)]
        step: u32,

        /// Fastest resolved gap in µs
        #[arg(long, default_value_t = MIN_VEL_MICROS)]
        min_micros: u32,

        /// Slowest resolved gap in µs
        #[arg(long, default_value_t = MAX_VEL_MICROS)]
        max_micros: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Digital,
    Velocity,
}

impl From<Mode> for NoteMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Digital => NoteMode::Digital,
            Mode::Velocity => NoteMode::Velocity,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Raw USB-MIDI bytes
    Hex,
    /// One readable line per message
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay { script, mode, channel, format } => {
            let mode = mode.map(NoteMode::from).unwrap_or(NoteMode::DEFAULT);
            replay(&script, mode, channel, format)
        }
        Commands::Curve { from, to, step, min_micros, max_micros } => {
            curve(from, to, step, min_micros, max_micros)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn replay(path: &Path, mode: NoteMode, channel: u8, format: Format) -> Result<()> {
    let _span = tracing::info_span!("replay", script = %path.display(), ?mode).entered();

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key script {}", path.display()))?;
    let lines = script::parse(&source)?;
    tracing::info!(lines = lines.len(), "script parsed");

    let mut sim = Simulator::new(mode, midi::channel(channel - 1));
    sim.run(&lines)?;

    let summary = sim.finish();
    for packet in &summary.packets {
        match format {
            Format::Hex => println!("{packet}"),
            Format::Text => println!("{}", describe(packet)),
        }
    }

    tracing::info!(
        packets = summary.sent,
        polls = summary.polls,
        elapsed_us = summary.elapsed_us,
        "replay finished"
    );
    Ok(())
}

/// `note-on ch=1 note=60 vel=100`
fn describe(packet: &UsbMidiPacket) -> String {
    let kind = match packet.event {
        NoteEvent::On => "note-on",
        NoteEvent::Off => "note-off",
    };
    format!(
        "{kind} ch={} note={} vel={}",
        packet.channel.index() + 1,
        u8::from(packet.note),
        u8::from(packet.velocity)
    )
}

fn curve(from: u32, to: u32, step: u32, min_micros: u32, max_micros: u32) -> Result<()> {
    if step == 0 {
        bail!("--step must be greater than 0");
    }
    if from > to {
        bail!("--from ({from}) is past --to ({to})");
    }
    let Some(curve) = VelocityCurve::new(min_micros, max_micros, MIN_VEL_OUT, MAX_VEL_OUT) else {
        bail!("--min-micros ({min_micros}) must be below --max-micros ({max_micros})");
    };

    let mut delta = from;
    loop {
        println!("{delta} {}", curve.velocity(delta));
        match delta.checked_add(step) {
            Some(next) if next <= to => delta = next,
            _ => break,
        }
    }
    Ok(())
}
