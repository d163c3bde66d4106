// Purpose: Voice management, polyphony, note handling
// This layer sits above the DSP primitives and manages the voice pool

pub mod allocator;
pub mod message;
pub mod poly;
pub mod voice;

pub use allocator::{Allocation, Playable, ReleasePolicy, StealPolicy, VoiceAllocator};
pub use message::{MessageReceiver, SynthMessage};
pub use poly::PolySynth;
pub use voice::Voice;
