#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod client;
pub mod error;
pub mod melody;
pub mod note;
pub mod player;

pub use error::{NoteError, PlayError};
pub use melody::{Melody, MelodyEntry};
pub use note::{NoteResolver, Pitch, Reference, Tone};
pub use player::{InvalidNotePolicy, MelodyPlayer, PlaybackSummary, ToneOutput};
