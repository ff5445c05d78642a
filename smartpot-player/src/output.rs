use std::{convert::Infallible, thread, time::Duration};

use embedded_hal::delay::DelayNs;
use tracing::info;

use smartpot_music::ToneOutput;

/// Stand-in buzzer that logs tones instead of making sound
#[derive(Debug, Default)]
pub struct ConsoleBuzzer {
    active: Option<f32>,
    tones_played: usize,
}

impl ConsoleBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<f32> {
        self.active
    }

    pub fn tones_played(&self) -> usize {
        self.tones_played
    }
}

impl ToneOutput for ConsoleBuzzer {
    type Error = Infallible;

    fn set_tone(&mut self, frequency_hz: f32) -> Result<(), Self::Error> {
        info!("♪ {:>8.2} Hz", frequency_hz);
        self.active = Some(frequency_hz);
        self.tones_played += 1;
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<(), Self::Error> {
        self.active = None;
        Ok(())
    }
}

/// Blocking delay backed by `thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms.into()));
    }
}
