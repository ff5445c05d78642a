use thiserror::Error;

/// Reasons a note token or tuning cannot be resolved to a pitch
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoteError {
    #[error("note token must be 2 or 3 characters long, got {0}")]
    InvalidToken(usize),

    #[error("invalid note letter {0:?}, expected one of A-G")]
    InvalidNoteLetter(char),

    #[error("invalid octave {0:?}, expected a digit 0-9")]
    InvalidOctave(char),

    #[error("reference pitch must be a positive, finite frequency")]
    InvalidReference,
}

/// Failure while playing a melody
#[derive(Error, Debug)]
pub enum PlayError<E> {
    /// Entry `index` could not be resolved and the player was set to abort
    #[error("melody entry {index}: {source}")]
    Note { index: usize, source: NoteError },

    /// The tone peripheral reported a failure
    #[error("tone output failed: {0}")]
    Output(E),
}
