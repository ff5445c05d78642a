//! Note-name parsing and equal-tempered frequency resolution.
//!
//! A note token is a letter (`A`-`G`), an octave digit (`0`-`9`) and an optional
//! accidental (`#` sharp, `b` flat), e.g. `"C4"` or `"A4#"`. The literal `"_"`
//! is a rest.

use core::{fmt::Display, num::NonZeroU8, str::FromStr};

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::NoteError;

/// Token that denotes silence instead of a pitch
pub const REST: &str = "_";

/// Frequency of C at octave 0
pub const C0_HZ: f32 = 16.35;

/// Frequency of A at octave 4
pub const A4_HZ: f32 = 440.0;

pub const SEMITONES_PER_OCTAVE: u8 = 12;

/// Note letter, decoded straight from the token's ASCII byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Letter {
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
}

impl Letter {
    /// Semitones above C within the octave
    pub const fn diatonic(self) -> i16 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Position of the letter counted from C, one step per letter
    pub const fn compressed(self) -> i16 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    const fn symbol(self) -> char {
        self as u8 as char
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    /// Any character other than `#` or `b` leaves the note natural
    pub const fn from_char(c: char) -> Self {
        match c {
            '#' => Accidental::Sharp,
            'b' => Accidental::Flat,
            _ => Accidental::Natural,
        }
    }

    pub const fn semitones(self) -> i16 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A parsed, pitched note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    pub letter: Letter,
    /// 0-9
    pub octave: u8,
    pub accidental: Accidental,
}

impl Note {
    /// Semitones between this note and the anchor note of `reference`
    pub const fn semitone_offset(&self, reference: Reference) -> i16 {
        self.octave as i16 * SEMITONES_PER_OCTAVE as i16 + reference.base_offset(self.letter)
            - reference.anchor()
            + self.accidental.semitones()
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let accidental = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        };
        write!(f, "{}{}{}", self.letter.symbol(), self.octave, accidental)
    }
}

/// A melody token: either a rest or a pitched note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Token {
    Rest,
    Note(Note),
}

impl FromStr for Token {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == REST {
            return Ok(Token::Rest);
        }

        let len = s.chars().count();
        if !(2..=3).contains(&len) {
            return Err(NoteError::InvalidToken(len));
        }

        let mut chars = s.chars();

        // Length was checked above, so the first two characters exist
        let (Some(letter), Some(octave)) = (chars.next(), chars.next()) else {
            return Err(NoteError::InvalidToken(len));
        };

        let letter = u8::try_from(letter)
            .ok()
            .and_then(|byte| Letter::try_from_primitive(byte).ok())
            .ok_or(NoteError::InvalidNoteLetter(letter))?;

        let octave = octave
            .to_digit(10)
            .ok_or(NoteError::InvalidOctave(octave))? as u8;

        let accidental = chars.next().map(Accidental::from_char).unwrap_or_default();

        Ok(Token::Note(Note {
            letter,
            octave,
            accidental,
        }))
    }
}

/// Note-numbering convention together with the pitch it is anchored to.
///
/// `C0` is the diatonic scale counted from C at octave 0 (16.35 Hz).
///
/// `A4` counts letters one step apart (C=0 .. B=6) and anchors on A at octave 4
/// (440 Hz). That table does not agree with the equal-tempered formula: only
/// A in octave 4 lands on a correct pitch, and `E#` / `F` coincide while `D` is
/// a single semitone above `C`. It is kept because existing melodies were
/// written against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum Reference {
    #[default]
    C0,
    A4,
}

impl Reference {
    pub const fn default_hz(self) -> f32 {
        match self {
            Reference::C0 => C0_HZ,
            Reference::A4 => A4_HZ,
        }
    }

    const fn base_offset(self, letter: Letter) -> i16 {
        match self {
            Reference::C0 => letter.diatonic(),
            Reference::A4 => letter.compressed(),
        }
    }

    /// Absolute number of the note that sounds at the reference pitch
    const fn anchor(self) -> i16 {
        match self {
            Reference::C0 => 0,
            Reference::A4 => 4 * SEMITONES_PER_OCTAVE as i16 + Letter::A.compressed(),
        }
    }
}

/// Result of resolving a token to a semitone offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pitch {
    Rest,
    Offset(i16),
}

/// Result of resolving a token to a frequency
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tone {
    Silence,
    Hz(f32),
}

/// `reference_hz * 2^(offset / semitones_per_octave)`, with a real-valued exponent
pub fn equal_tempered(offset: i16, reference_hz: f32, semitones_per_octave: NonZeroU8) -> f32 {
    let exponent = f32::from(offset) / f32::from(semitones_per_octave.get());
    reference_hz * libm::powf(2.0, exponent)
}

/// Maps note tokens to frequencies under one fixed numbering convention
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteResolver {
    reference: Reference,
    reference_hz: f32,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    semitones_per_octave: NonZeroU8,
}

impl Default for NoteResolver {
    fn default() -> Self {
        Self::new(Reference::default())
    }
}

impl NoteResolver {
    pub const fn new(reference: Reference) -> Self {
        Self {
            reference,
            reference_hz: reference.default_hz(),
            semitones_per_octave: match NonZeroU8::new(SEMITONES_PER_OCTAVE) {
                Some(n) => n,
                None => unreachable!(),
            },
        }
    }

    /// Overrides the frequency of the anchor note. The frequency must be
    /// positive and finite, so every resolved pitch is too.
    pub fn with_reference_hz(mut self, reference_hz: f32) -> Result<Self, NoteError> {
        if !(reference_hz.is_finite() && reference_hz > 0.0) {
            return Err(NoteError::InvalidReference);
        }

        self.reference_hz = reference_hz;
        Ok(self)
    }

    pub const fn with_semitones_per_octave(mut self, semitones_per_octave: NonZeroU8) -> Self {
        self.semitones_per_octave = semitones_per_octave;
        self
    }

    pub const fn reference(&self) -> Reference {
        self.reference
    }

    pub const fn reference_hz(&self) -> f32 {
        self.reference_hz
    }

    pub fn resolve_semitone_offset(&self, token: &str) -> Result<Pitch, NoteError> {
        match token.parse::<Token>()? {
            Token::Rest => Ok(Pitch::Rest),
            Token::Note(note) => Ok(Pitch::Offset(note.semitone_offset(self.reference))),
        }
    }

    /// Resolves `token` to a frequency. Invalid tokens are returned as errors;
    /// deciding whether they become silence is up to the caller.
    pub fn resolve_frequency(&self, token: &str) -> Result<Tone, NoteError> {
        match self.resolve_semitone_offset(token)? {
            Pitch::Rest => Ok(Tone::Silence),
            Pitch::Offset(offset) => Ok(Tone::Hz(equal_tempered(
                offset,
                self.reference_hz,
                self.semitones_per_octave,
            ))),
        }
    }
}
