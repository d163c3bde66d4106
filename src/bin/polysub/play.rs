//! Live mode: keyboard and MIDI in, cpal out.

use std::{
    collections::HashMap,
    io::{self, Write},
    sync::mpsc::{self, Receiver},
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    cursor,
    event::{
        self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use polysub::{
    runtime::{Controller, Engine},
    synth::SynthMessage,
    EngineConfig, EngineError,
};

use super::{
    keyboard::{map_key, Action, Octave},
    midi_input::{self, MidiOptions},
    sink,
};

/// Without key-release events a key press holds its note this long; key
/// repeat extends it.
const FALLBACK_HOLD: Duration = Duration::from_millis(400);

/// Raw mode for the lifetime of the guard.
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> EyreResult<Self> {
        terminal::enable_raw_mode().wrap_err("failed to enable raw mode")?;
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

fn status(msg: &str) -> io::Result<()> {
    let mut out = io::stdout();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(msg)
    )?;
    out.flush()
}

/// Held keyboard keys, by semitone. Each entry keeps the note it started,
/// so an octave change cannot strand a note, and the auto-release deadline
/// used when the terminal cannot report key releases.
struct HeldKeys {
    keys: HashMap<u8, (u8, Option<Instant>)>,
    release_events: bool,
}

impl HeldKeys {
    fn press(&mut self, semitone: u8, note: u8, controller: &mut Controller) -> Result<(), EngineError> {
        let deadline = (!self.release_events).then(|| Instant::now() + FALLBACK_HOLD);
        match self.keys.get_mut(&semitone) {
            Some(entry) => entry.1 = deadline,
            None => {
                self.keys.insert(semitone, (note, deadline));
                controller.note_on(note, 100)?;
            }
        }
        Ok(())
    }

    fn release(&mut self, semitone: u8, controller: &mut Controller) -> Result<(), EngineError> {
        if let Some((note, _)) = self.keys.remove(&semitone) {
            controller.note_off(note)?;
        }
        Ok(())
    }

    fn expire(&mut self, now: Instant, controller: &mut Controller) -> Result<(), EngineError> {
        let expired: Vec<u8> = self
            .keys
            .iter()
            .filter(|(_, (_, deadline))| deadline.is_some_and(|d| d <= now))
            .map(|(&semitone, _)| semitone)
            .collect();
        for semitone in expired {
            self.release(semitone, controller)?;
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.keys.clear();
    }
}

pub fn run(config: EngineConfig, midi: Option<MidiOptions>) -> EyreResult<()> {
    let output = sink::open_default(config.block_size)?;
    let config = config
        .with_sample_rate(output.sample_rate)
        .with_channels(output.channels);

    println!("=== polysub ===");
    println!("Output: {}", output.device_name);
    println!("Sample rate: {} Hz", config.sample_rate);
    println!("Channels: {}", config.channels);
    println!("Voices: {}", config.voices);

    let mut engine =
        Engine::spawn(&config, output.sink).wrap_err("failed to start the engine")?;

    let (midi_tx, midi_rx) = mpsc::channel();
    if let Some(options) = midi {
        match midi_input::spawn(&options, midi_tx, engine.token().clone()) {
            Ok(path) => println!("MIDI: {}", path.display()),
            Err(err) => log::warn!("{err}; continuing with keyboard only"),
        }
    }

    println!();
    println!("Keys a..l play, z/x octave, space all-off, esc quits");
    println!();

    let result = control_loop(&mut engine, &midi_rx);

    let _ = engine.controller().all_notes_off();
    let stopped = engine.shutdown();
    drop(output.stream);

    result?;
    let stopped = stopped.wrap_err("render thread failed")?;
    println!(
        "\r\nRendered {:.1} s of audio",
        stopped.report.frames as f32 / config.sample_rate
    );
    Ok(())
}

fn control_loop(
    engine: &mut Engine<sink::CpalSink>,
    midi_rx: &Receiver<SynthMessage>,
) -> EyreResult<()> {
    let guard = TerminalGuard::enter()?;
    let mut held = HeldKeys {
        keys: HashMap::new(),
        release_events: guard.enhanced,
    };
    let mut octave = Octave::default();

    while engine.is_running() {
        for msg in midi_rx.try_iter() {
            forward(engine.controller(), msg);
        }

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(engine, &key, &mut held, &mut octave)? {
                    break;
                }
            }
        }

        if let Err(err) = held.expire(Instant::now(), engine.controller()) {
            log::warn!("{err}");
        }
    }

    Ok(())
}

fn forward(controller: &mut Controller, msg: SynthMessage) {
    if let Err(err) = controller.send(msg) {
        log::warn!("{err}");
    }
}

/// Returns true when the user asked to quit.
fn handle_key(
    engine: &mut Engine<sink::CpalSink>,
    key: &KeyEvent,
    held: &mut HeldKeys,
    octave: &mut Octave,
) -> EyreResult<bool> {
    let Some(action) = map_key(key) else {
        return Ok(false);
    };

    let outcome = match (action, key.kind) {
        (Action::Note(semitone), KeyEventKind::Press | KeyEventKind::Repeat) => {
            held.press(semitone, octave.note(semitone), engine.controller())
        }
        (Action::Note(semitone), KeyEventKind::Release) => {
            held.release(semitone, engine.controller())
        }
        (_, KeyEventKind::Release) => Ok(()),
        (Action::Quit, _) => return Ok(true),
        (Action::Panic, _) => {
            held.clear();
            status("all notes off")?;
            engine.controller().all_notes_off()
        }
        (Action::Octave(delta), _) => {
            let shift = octave.shift(delta);
            status(&format!("octave: {shift:+}"))?;
            Ok(())
        }
        (Action::Edit(edit), _) => {
            let msg = edit.apply(engine.params());
            status(&msg)?;
            Ok(())
        }
    };

    if let Err(err) = outcome {
        log::warn!("{err}");
    }
    Ok(false)
}
