//! MIDI 1.0 channel-voice decoding.
//!
//! Only the messages the synth can act on are decoded. Everything else
//! (aftertouch, system common, SysEx) is consumed and discarded so that the
//! byte stream stays in sync.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one complete channel message.
    ///
    /// A note-on with velocity 0 is a note-off, as running-status senders
    /// rely on it.
    pub fn from_bytes(status: u8, d1: u8, d2: u8) -> Option<Self> {
        let channel = status & 0x0F;
        let d1 = d1 & 0x7F;
        let d2 = d2 & 0x7F;

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                key: d1,
                velocity: d2,
            }),
            0x90 if d2 == 0 => Some(Self::NoteOff {
                channel,
                key: d1,
                velocity: 0,
            }),
            0x90 => Some(Self::NoteOn {
                channel,
                key: d1,
                velocity: d2,
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                controller: d1,
                value: d2,
            }),
            0xC0 => Some(Self::ProgramChange {
                channel,
                program: d1,
            }),
            0xE0 => {
                let raw = ((d2 as i16) << 7) | d1 as i16;
                Some(Self::PitchBend {
                    channel,
                    value: raw - 8192,
                })
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::PitchBend { channel, .. }
            | Self::ProgramChange { channel, .. } => channel,
        }
    }
}

/// Data bytes that follow a status byte, or `None` for system messages.
fn data_len(status: u8) -> Option<usize> {
    match status & 0xF0 {
        0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => Some(2),
        0xC0 | 0xD0 => Some(1),
        _ => None,
    }
}

/// Streaming decoder for a raw MIDI byte stream.
///
/// Keeps running status across messages, lets realtime bytes (0xF8..=0xFF)
/// pass through without disturbing a message in progress, and skips SysEx
/// payloads up to the terminating 0xF7.
#[derive(Debug, Default)]
pub struct MidiParser {
    running_status: Option<u8>,
    data: [u8; 2],
    filled: usize,
    in_sysex: bool,
}

impl MidiParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns an event when a message completes.
    pub fn push(&mut self, byte: u8) -> Option<MidiEvent> {
        if byte >= 0xF8 {
            return None;
        }

        if byte & 0x80 != 0 {
            self.filled = 0;
            match byte {
                0xF0 => {
                    self.in_sysex = true;
                    self.running_status = None;
                }
                0xF7 => self.in_sysex = false,
                0xF1..=0xF6 => {
                    // System common cancels running status.
                    self.in_sysex = false;
                    self.running_status = None;
                }
                _ => {
                    self.in_sysex = false;
                    self.running_status = Some(byte);
                }
            }
            return None;
        }

        if self.in_sysex {
            return None;
        }

        let status = self.running_status?;
        let needed = data_len(status)?;

        self.data[self.filled] = byte;
        self.filled += 1;
        if self.filled < needed {
            return None;
        }

        self.filled = 0;
        MidiEvent::from_bytes(status, self.data[0], if needed == 2 { self.data[1] } else { 0 })
    }

    /// Feed a slice; each decoded event is passed to `f`.
    pub fn feed(&mut self, bytes: &[u8], mut f: impl FnMut(MidiEvent)) {
        for &byte in bytes {
            if let Some(event) = self.push(byte) {
                f(event);
            }
        }
    }
}
