use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::PlayError,
    melody::Melody,
    note::{NoteResolver, Tone},
};

/// A peripheral that can emit a single tone at a time (a buzzer)
pub trait ToneOutput {
    type Error;

    /// Starts emitting `frequency_hz`, replacing any active tone
    fn set_tone(&mut self, frequency_hz: f32) -> Result<(), Self::Error>;

    /// Silences the peripheral. Must be harmless when nothing is playing.
    fn stop_tone(&mut self) -> Result<(), Self::Error>;
}

impl<T: ToneOutput + ?Sized> ToneOutput for &mut T {
    type Error = T::Error;

    fn set_tone(&mut self, frequency_hz: f32) -> Result<(), Self::Error> {
        (**self).set_tone(frequency_hz)
    }

    fn stop_tone(&mut self) -> Result<(), Self::Error> {
        (**self).stop_tone()
    }
}

/// What the player does with an entry whose token cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum InvalidNotePolicy {
    /// Stop playback and report the entry
    #[default]
    Abort,

    /// Play the entry as a rest of the same duration
    Silence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackSummary {
    /// Entries that produced a tone
    pub notes: usize,
    pub rests: usize,
    /// Invalid entries played as silence
    pub skipped: usize,
    /// Sum of the durations waited for
    pub elapsed_ms: u64,
    /// False when playback was interrupted between entries
    pub completed: bool,
}

/// Plays melodies on a tone peripheral, blocking the calling thread.
///
/// Every entry ends with `stop_tone`, so a tone never carries over into the next
/// entry and only one frequency is ever active.
pub struct MelodyPlayer<O, D> {
    output: O,
    delay: D,
    resolver: NoteResolver,
    policy: InvalidNotePolicy,
}

impl<O, D> MelodyPlayer<O, D>
where
    O: ToneOutput,
    D: DelayNs,
{
    pub fn new(output: O, delay: D, resolver: NoteResolver) -> Self {
        Self {
            output,
            delay,
            resolver,
            policy: InvalidNotePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InvalidNotePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Gives back the peripheral and the delay
    pub fn into_parts(self) -> (O, D) {
        (self.output, self.delay)
    }

    pub fn play(&mut self, melody: &Melody<'_>) -> Result<PlaybackSummary, PlayError<O::Error>> {
        self.play_while(melody, || true)
    }

    /// Plays `melody`, asking `keep_going` before each entry. Entry boundaries
    /// are the only points where playback can be interrupted.
    pub fn play_while<F>(
        &mut self,
        melody: &Melody<'_>,
        mut keep_going: F,
    ) -> Result<PlaybackSummary, PlayError<O::Error>>
    where
        F: FnMut() -> bool,
    {
        let mut summary = PlaybackSummary::default();

        for (index, entry) in melody.entries().iter().enumerate() {
            if !keep_going() {
                debug!(index, "playback interrupted");
                self.output.stop_tone().map_err(PlayError::Output)?;
                return Ok(summary);
            }

            let tone = match self.resolver.resolve_frequency(entry.token) {
                Ok(Tone::Hz(hz)) => Some(hz),
                Ok(Tone::Silence) => {
                    summary.rests += 1;
                    None
                }
                Err(source) => match self.policy {
                    InvalidNotePolicy::Abort => {
                        return Err(PlayError::Note { index, source });
                    }
                    InvalidNotePolicy::Silence => {
                        warn!(index, token = entry.token, "unplayable note, resting instead");
                        summary.skipped += 1;
                        None
                    }
                },
            };

            if let Some(hz) = tone {
                debug!(index, hz, duration_ms = entry.duration_ms, "tone");
                self.output.set_tone(hz).map_err(PlayError::Output)?;
                summary.notes += 1;
            }

            self.delay.delay_ms(entry.duration_ms);
            self.output.stop_tone().map_err(PlayError::Output)?;

            summary.elapsed_ms += u64::from(entry.duration_ms);
        }

        summary.completed = true;

        Ok(summary)
    }
}
