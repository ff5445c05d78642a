#![no_std]

extern crate alloc;

use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Messages sent from the host to the buzzer device
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmartPotS2CMessage {
    /// Opens (or restarts) a session
    Hello,

    /// Start emitting the given tone, replacing any active one
    Tone(ToneEvent),

    /// Silence the buzzer
    Stop,

    /// Close the session, silencing the buzzer
    End,
}

/// Messages sent from the buzzer device back to the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmartPotC2SMessage {
    HelloAck,
    ToneAck,
    StopAck,
    EndAck,
    Error(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] String),
}

/// A tone to emit on the device's buzzer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToneEvent {
    /// Frequency in hertz, strictly positive
    pub frequency_hz: f32,
}

/// Number of bytes in the little-endian length prefix of each frame
pub const FRAME_HEADER_LEN: usize = 2;
