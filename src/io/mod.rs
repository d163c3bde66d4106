// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;
pub mod port;

pub use converter::{midi_note_to_freq, midi_to_synth};
pub use midi::{MidiEvent, MidiParser};
pub use port::select_port;
