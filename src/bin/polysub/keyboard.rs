//! Computer-keyboard layout: two rows of piano keys plus parameter keys.
//!
//! ```text
//!  w e   t y u   o        z/x  octave down/up     1/2  osc waveform
//! a s d f g h j k l       [/]  cutoff             -/=  resonance
//!                         ,/.  osc2 detune        ;/'  filter env depth
//!                         c/v  cross-mod          n/m  release
//!                         space  all notes off    esc  quit
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use polysub::params::VoiceParams;

pub const BASE_NOTE: u8 = 60;
const MAX_OCTAVE_SHIFT: i8 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Semitones above the current octave's C.
    Note(u8),
    Octave(i8),
    Edit(ParamEdit),
    Panic,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEdit {
    ToggleWaveform(usize),
    Cutoff(f32),
    Resonance(f32),
    Detune(f32),
    FegAmount(f32),
    Xmod(f32),
    Release(f32),
}

pub fn map_key(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') => Action::Panic,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'a' => Action::Note(0),
            'w' => Action::Note(1),
            's' => Action::Note(2),
            'e' => Action::Note(3),
            'd' => Action::Note(4),
            'f' => Action::Note(5),
            't' => Action::Note(6),
            'g' => Action::Note(7),
            'y' => Action::Note(8),
            'h' => Action::Note(9),
            'u' => Action::Note(10),
            'j' => Action::Note(11),
            'k' => Action::Note(12),
            'o' => Action::Note(13),
            'l' => Action::Note(14),
            'z' => Action::Octave(-1),
            'x' => Action::Octave(1),
            '1' => Action::Edit(ParamEdit::ToggleWaveform(0)),
            '2' => Action::Edit(ParamEdit::ToggleWaveform(1)),
            '[' => Action::Edit(ParamEdit::Cutoff(0.9)),
            ']' => Action::Edit(ParamEdit::Cutoff(1.1)),
            '-' => Action::Edit(ParamEdit::Resonance(-0.05)),
            '=' => Action::Edit(ParamEdit::Resonance(0.05)),
            ',' => Action::Edit(ParamEdit::Detune(-0.005)),
            '.' => Action::Edit(ParamEdit::Detune(0.005)),
            ';' => Action::Edit(ParamEdit::FegAmount(-250.0)),
            '\'' => Action::Edit(ParamEdit::FegAmount(250.0)),
            'c' => Action::Edit(ParamEdit::Xmod(-0.1)),
            'v' => Action::Edit(ParamEdit::Xmod(0.1)),
            'n' => Action::Edit(ParamEdit::Release(-0.05)),
            'm' => Action::Edit(ParamEdit::Release(0.05)),
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

impl ParamEdit {
    /// Apply the edit and describe the new value.
    pub fn apply(self, params: &VoiceParams) -> String {
        match self {
            ParamEdit::ToggleWaveform(osc) => {
                params.toggle_osc_waveform(osc);
                let wave = params.osc(osc).map(|o| o.waveform());
                format!("osc{} waveform: {:?}", osc + 1, wave.unwrap_or_default())
            }
            ParamEdit::Cutoff(factor) => {
                params.set_cutoff(params.cutoff() * factor);
                format!("cutoff: {:.0} Hz", params.cutoff())
            }
            ParamEdit::Resonance(delta) => {
                params.set_resonance(params.resonance() + delta);
                format!("resonance: {:.2}", params.resonance())
            }
            ParamEdit::Detune(delta) => {
                let current = params.osc(1).map_or(1.0, |o| o.detune());
                params.set_osc_detune(1, current + delta);
                let detune = params.osc(1).map_or(1.0, |o| o.detune());
                format!("osc2 detune: {detune:.3}")
            }
            ParamEdit::FegAmount(delta) => {
                params.set_feg_amount(params.feg_amount() + delta);
                format!("filter env depth: {:.0} Hz", params.feg_amount())
            }
            ParamEdit::Xmod(delta) => {
                params.set_xmod_amount(params.xmod_amount() + delta);
                format!("cross-mod: {:.1}", params.xmod_amount())
            }
            ParamEdit::Release(delta) => {
                params.set_aeg_release(params.aeg().release() + delta);
                format!("release: {:.2} s", params.aeg().release())
            }
        }
    }
}

/// Tracks the keyboard octave.
#[derive(Debug, Default)]
pub struct Octave {
    shift: i8,
}

impl Octave {
    pub fn shift(&mut self, delta: i8) -> i8 {
        self.shift = (self.shift + delta).clamp(-MAX_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT);
        self.shift
    }

    pub fn note(&self, semitone: u8) -> u8 {
        let note = BASE_NOTE as i16 + self.shift as i16 * 12 + semitone as i16;
        note.clamp(0, 127) as u8
    }
}
