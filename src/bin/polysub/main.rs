//! polysub - polyphonic subtractive synth
//!
//! Run with: cargo run -- play

mod bounce;
mod keyboard;
mod midi_input;
mod play;
mod sink;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use polysub::{
    synth::{ReleasePolicy, StealPolicy},
    EngineConfig,
};

#[derive(Parser)]
#[command(name = "polysub", about = "Polyphonic subtractive synthesizer")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct EngineArgs {
    /// Size of the voice pool.
    #[arg(long, global = true, default_value_t = 8)]
    voices: usize,
    /// Frames rendered per block.
    #[arg(long, global = true, default_value_t = 64)]
    block_size: usize,
    /// What to do when every voice is busy.
    #[arg(long, global = true, value_enum, default_value_t = StealArg::Oldest)]
    steal: StealArg,
    /// Which voices a note-off releases.
    #[arg(long, global = true, value_enum, default_value_t = ReleaseArg::Matched)]
    release: ReleaseArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum StealArg {
    /// Restart the longest-held voice.
    Oldest,
    /// Ignore the new note.
    Drop,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReleaseArg {
    /// Release only the voice playing that note.
    Matched,
    /// Release every held voice.
    All,
}

impl EngineArgs {
    fn to_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_voices(self.voices)
            .with_block_size(self.block_size)
            .with_steal_policy(match self.steal {
                StealArg::Oldest => StealPolicy::Oldest,
                StealArg::Drop => StealPolicy::Drop,
            })
            .with_release_policy(match self.release {
                ReleaseArg::Matched => ReleasePolicy::PitchMatched,
                ReleaseArg::All => ReleasePolicy::ReleaseAll,
            })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Play live from the computer keyboard and an optional MIDI device.
    Play {
        /// Raw MIDI device node; defaults to scanning /dev/snd.
        #[arg(long)]
        midi_device: Option<PathBuf>,
        /// Index into the scanned MIDI ports.
        #[arg(long)]
        midi_port: Option<usize>,
        /// MIDI channel to listen on (1-16); all channels when omitted.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
        channel: Option<u8>,
        /// Do not open any MIDI input.
        #[arg(long)]
        no_midi: bool,
    },
    /// Render notes offline and print level statistics.
    Bounce(bounce::BounceArgs),
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.engine.to_config();

    match cli.command {
        Command::Play {
            midi_device,
            midi_port,
            channel,
            no_midi,
        } => {
            let midi = if no_midi {
                None
            } else {
                Some(midi_input::MidiOptions {
                    device: midi_device,
                    port: midi_port,
                    channel: channel.map(|ch| ch - 1),
                })
            };
            play::run(config, midi)
        }
        Command::Bounce(args) => bounce::run(config, &args),
    }
}
