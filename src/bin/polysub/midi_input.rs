//! Raw MIDI input from ALSA device nodes (`/dev/snd/midiC*D*`).

use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
    sync::mpsc::Sender,
    thread,
};

use polysub::{
    io::{midi_to_synth, select_port, MidiParser},
    runtime::RunToken,
    synth::SynthMessage,
    EngineError,
};

const DEVICE_DIR: &str = "/dev/snd";

pub struct MidiOptions {
    pub device: Option<PathBuf>,
    pub port: Option<usize>,
    /// Zero-based channel filter; `None` listens on all channels.
    pub channel: Option<u8>,
}

/// Raw MIDI nodes under `dir`, sorted by name.
fn scan_ports(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut ports: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("midiC"))
        })
        .collect();
    ports.sort();
    ports
}

fn resolve_device(options: &MidiOptions) -> Result<PathBuf, EngineError> {
    if let Some(device) = &options.device {
        return Ok(device.clone());
    }

    let ports = scan_ports(Path::new(DEVICE_DIR));
    let names: Vec<String> = ports.iter().map(|p| p.display().to_string()).collect();
    let index = select_port(&names, options.port)?;
    Ok(ports[index].clone())
}

/// Open the MIDI device and forward note events to `tx` from a detached
/// reader thread. The thread ends when the device closes or the receiver is
/// dropped. Cancelling the token is only noticed once the blocking read
/// returns, so on a silent device the thread stays parked in `read` until
/// the next byte arrives or the process exits.
pub fn spawn(
    options: &MidiOptions,
    tx: Sender<SynthMessage>,
    token: RunToken,
) -> Result<PathBuf, EngineError> {
    let path = resolve_device(options)?;
    let file = File::open(&path).map_err(|err| {
        log::warn!("cannot open {}: {err}", path.display());
        EngineError::NoMidiDevice
    })?;
    let channel = options.channel;

    thread::Builder::new()
        .name("polysub-midi".into())
        .spawn(move || read_loop(file, channel, &tx, &token))
        .map_err(EngineError::Spawn)?;

    Ok(path)
}

/// Forwards the bytes of each completed read, then checks `token` before
/// reading again.
fn read_loop(mut input: impl Read, channel: Option<u8>, tx: &Sender<SynthMessage>, token: &RunToken) {
    let mut parser = MidiParser::new();
    let mut buf = [0u8; 64];

    while token.is_running() {
        let n = match input.read(&mut buf) {
            Ok(0) => {
                log::warn!("MIDI device closed");
                return;
            }
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                log::warn!("MIDI read failed: {err}");
                return;
            }
        };

        for &byte in &buf[..n] {
            let Some(msg) = parser.push(byte).and_then(|ev| midi_to_synth(ev, channel)) else {
                continue;
            };
            if tx.send(msg).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn forwards_note_events_from_stream() {
        let bytes: &[u8] = &[0x90, 60, 100, 0xB0, 7, 100, 0x91, 62, 90, 0x80, 60, 0];
        let (tx, rx) = mpsc::channel();

        read_loop(bytes, Some(0), &tx, &RunToken::new());

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                SynthMessage::NoteOn { note: 60, velocity: 100 },
                SynthMessage::NoteOff { note: 60 },
            ]
        );
    }

    #[test]
    fn missing_directory_has_no_ports() {
        assert!(scan_ports(Path::new("/nonexistent/polysub")).is_empty());
    }

    /// Cancels the token during its first read, as a shutdown racing an
    /// incoming byte would. A second read fails the test.
    struct CancelOnRead {
        token: RunToken,
        reads: usize,
    }

    impl Read for CancelOnRead {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            assert_eq!(self.reads, 1, "read again after cancellation");
            self.token.cancel();
            let msg = [0x90, 64, 80];
            buf[..msg.len()].copy_from_slice(&msg);
            Ok(msg.len())
        }
    }

    #[test]
    fn cancellation_is_seen_after_pending_read_returns() {
        let token = RunToken::new();
        let mut input = CancelOnRead { token: token.clone(), reads: 0 };
        let (tx, rx) = mpsc::channel();

        read_loop(&mut input, None, &tx, &token);

        assert_eq!(input.reads, 1);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![SynthMessage::NoteOn { note: 64, velocity: 80 }]
        );
    }

    #[test]
    fn cancelled_token_skips_reading() {
        let token = RunToken::new();
        token.cancel();
        let (tx, rx) = mpsc::channel();

        read_loop(&[0x90u8, 60, 100][..], None, &tx, &token);

        assert!(rx.try_recv().is_err());
    }
}
