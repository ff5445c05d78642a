use std::{num::NonZeroU8, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use smartpot_music::{
    note::SEMITONES_PER_OCTAVE, InvalidNotePolicy, MelodyEntry, NoteError, NoteResolver,
    Reference,
};

#[derive(Deserialize, Debug)]
pub struct SongConfig {
    /// How note names map to frequencies
    #[serde(default)]
    pub tuning: TuningConfig,

    /// What to do with notes that cannot be resolved
    #[serde(default)]
    pub on_invalid: InvalidNotePolicy,

    /// Notes to play, in order, as `[token, duration_ms]` pairs
    pub melody: Vec<NoteConfig>,
}

#[derive(Deserialize, Debug)]
pub struct TuningConfig {
    #[serde(default)]
    pub reference: Reference,

    /// Overrides the reference pitch (16.35 Hz for `c0`, 440 Hz for `a4`)
    #[serde(default)]
    pub reference_hz: Option<f32>,

    #[serde(default = "default_semitones_per_octave")]
    pub semitones_per_octave: NonZeroU8,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            reference: Reference::default(),
            reference_hz: None,
            semitones_per_octave: default_semitones_per_octave(),
        }
    }
}

fn default_semitones_per_octave() -> NonZeroU8 {
    NonZeroU8::new(SEMITONES_PER_OCTAVE).unwrap_or(NonZeroU8::MIN)
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct NoteConfig(pub String, pub u32);

impl TuningConfig {
    pub fn resolver(&self) -> Result<NoteResolver, NoteError> {
        let resolver = NoteResolver::new(self.reference)
            .with_semitones_per_octave(self.semitones_per_octave);

        match self.reference_hz {
            Some(hz) => resolver.with_reference_hz(hz),
            None => Ok(resolver),
        }
    }
}

impl SongConfig {
    /// Melody entries borrowing the tokens of this configuration
    pub fn entries(&self) -> Vec<MelodyEntry<'_>> {
        self.melody
            .iter()
            .map(|NoteConfig(token, duration_ms)| MelodyEntry::new(token, *duration_ms))
            .collect()
    }
}

pub fn parse_song_config(path: &Path) -> Result<SongConfig> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "song configuration file `{}` does not exist",
            path.display()
        ));
    }

    let config_file = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{}`", path.display()))?;

    parse_song_config_str(&config_file)
        .with_context(|| format!("could not parse file `{}`", path.display()))
}

/// Parses a JSONC song configuration (JSON with comments and trailing commas)
pub fn parse_song_config_str(text: &str) -> Result<SongConfig> {
    let value = jsonc_parser::parse_to_serde_value(text, &Default::default())?
        .context("song configuration is empty")?;

    let config: SongConfig = serde_json::from_value(value)?;

    anyhow::ensure!(!config.melody.is_empty(), "song has no notes");

    config.tuning.resolver().context("invalid tuning")?;

    Ok(config)
}
