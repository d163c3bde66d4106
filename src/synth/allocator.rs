//! Round-robin voice allocation over a fixed pool.
//!
//! The allocator only tracks slots; the voices themselves live in an arena
//! owned by the caller and are passed in on every call. Slot `i` always maps to
//! `voices[i]`.
//!
//! ```text
//!   cursor ─┐
//!           ▼
//!   [ 0:busy ][ 1:free ][ 2:busy ][ 3:free ]
//!                 ▲
//!   note_on scans 1, 2, 3, 0 and takes slot 1; cursor moves to 2
//! ```
//!
//! A slot is freed as soon as its note is released. The voice keeps ringing
//! out its release tail and is retriggered in place (from its current envelope
//! level) when the slot comes round again.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::io::converter::midi_note_to_freq;

/// What to do with a note-on when every slot is in use.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Restart the slot whose note was triggered longest ago.
    #[default]
    Oldest,
    /// Ignore the new note.
    Drop,
}

/// How note-offs are matched to slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// Release the oldest slot holding the same note.
    #[default]
    PitchMatched,
    /// Release every in-use slot regardless of note.
    ReleaseAll,
}

/// Outcome of a note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Assigned(usize),
    Stolen(usize),
    Dropped,
}

impl Allocation {
    pub fn slot(self) -> Option<usize> {
        match self {
            Allocation::Assigned(slot) | Allocation::Stolen(slot) => Some(slot),
            Allocation::Dropped => None,
        }
    }
}

/// Anything the allocator can start and release.
pub trait Playable {
    fn start(&mut self, frequency: f32, velocity: f32);
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    in_use: bool,
    note: u8,
    triggered_at: u64,
}

pub struct VoiceAllocator {
    slots: Vec<Slot>,
    cursor: usize,
    clock: u64,
    steal_policy: StealPolicy,
    release_policy: ReleasePolicy,
}

impl VoiceAllocator {
    pub fn new(voices: usize) -> Self {
        Self {
            slots: vec![Slot::default(); voices.max(1)],
            cursor: 0,
            clock: 0,
            steal_policy: StealPolicy::default(),
            release_policy: ReleasePolicy::default(),
        }
    }

    pub fn with_steal_policy(mut self, policy: StealPolicy) -> Self {
        self.steal_policy = policy;
        self
    }

    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    /// Assign `note` to a voice.
    ///
    /// Scans from the cursor for the first free slot. When the pool is full the
    /// steal policy decides between restarting the oldest slot and dropping.
    pub fn note_on<V: Playable>(&mut self, voices: &mut [V], note: u8, velocity: u8) -> Allocation {
        let n = self.slots.len().min(voices.len());
        if n == 0 {
            return Allocation::Dropped;
        }

        let free = (0..n)
            .map(|offset| (self.cursor + offset) % n)
            .find(|&slot| !self.slots[slot].in_use);

        let allocation = match (free, self.steal_policy) {
            (Some(slot), _) => Allocation::Assigned(slot),
            (None, StealPolicy::Oldest) => match self.oldest_in_use(n) {
                Some(slot) => Allocation::Stolen(slot),
                None => Allocation::Dropped,
            },
            (None, StealPolicy::Drop) => Allocation::Dropped,
        };

        if let Some(slot) = allocation.slot() {
            self.clock += 1;
            self.slots[slot] = Slot {
                in_use: true,
                note,
                triggered_at: self.clock,
            };
            voices[slot].start(midi_note_to_freq(note), velocity as f32 / 127.0);
            self.cursor = (slot + 1) % n;
        }

        allocation
    }

    /// Release `note`. Returns how many slots were released; zero is not an error.
    pub fn note_off<V: Playable>(&mut self, voices: &mut [V], note: u8) -> usize {
        match self.release_policy {
            ReleasePolicy::PitchMatched => {
                let n = self.slots.len().min(voices.len());
                let matched = (0..n)
                    .filter(|&slot| self.slots[slot].in_use && self.slots[slot].note == note)
                    .min_by_key(|&slot| self.slots[slot].triggered_at);

                match matched {
                    Some(slot) => {
                        self.release_slot(voices, slot);
                        1
                    }
                    None => 0,
                }
            }
            ReleasePolicy::ReleaseAll => self.all_notes_off(voices),
        }
    }

    /// Release every in-use slot.
    pub fn all_notes_off<V: Playable>(&mut self, voices: &mut [V]) -> usize {
        let n = self.slots.len().min(voices.len());
        let mut released = 0;
        for slot in 0..n {
            if self.slots[slot].in_use {
                self.release_slot(voices, slot);
                released += 1;
            }
        }
        released
    }

    fn release_slot<V: Playable>(&mut self, voices: &mut [V], slot: usize) {
        voices[slot].release();
        self.slots[slot].in_use = false;
    }

    fn oldest_in_use(&self, n: usize) -> Option<usize> {
        (0..n)
            .filter(|&slot| self.slots[slot].in_use)
            .min_by_key(|&slot| self.slots[slot].triggered_at)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    pub fn is_in_use(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.in_use)
    }

    /// The note held by `slot`, if it is in use.
    pub fn slot_note(&self, slot: usize) -> Option<u8> {
        self.slots
            .get(slot)
            .filter(|s| s.in_use)
            .map(|s| s.note)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn steal_policy(&self) -> StealPolicy {
        self.steal_policy
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }
}
