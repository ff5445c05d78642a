use std::{
    collections::VecDeque,
    convert::Infallible,
    io::{Read, Write},
};

use embedded_hal::delay::DelayNs;
use smartpot_music::{
    client::{ClientState, ToneClient},
    melody::ALARM,
    InvalidNotePolicy, Melody, MelodyEntry, MelodyPlayer, NoteResolver, PlayError, ToneOutput,
};
use smartpot_player::io::{encode_frame, read_frame, Client};
use smartpot_proto::FRAME_HEADER_LEN;

/// What the device-side buzzer was told to do
#[derive(Debug, Default)]
struct DeviceBuzzer {
    active: Option<f32>,
    tones: Vec<f32>,
    stops: usize,
}

impl ToneOutput for DeviceBuzzer {
    type Error = Infallible;

    fn set_tone(&mut self, frequency_hz: f32) -> Result<(), Self::Error> {
        assert_eq!(self.active, None, "tone started over an active tone");
        self.active = Some(frequency_hz);
        self.tones.push(frequency_hz);
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<(), Self::Error> {
        self.active = None;
        self.stops += 1;
        Ok(())
    }
}

/// A serial port whose far end is a `ToneClient`
struct LoopbackPort {
    device: ToneClient<DeviceBuzzer>,
    inbound: Vec<u8>,
    outbound: VecDeque<u8>,
}

impl LoopbackPort {
    fn new() -> Self {
        Self {
            device: ToneClient::new(DeviceBuzzer::default()),
            inbound: Vec::new(),
            outbound: VecDeque::new(),
        }
    }

    fn pump(&mut self) {
        while self.inbound.len() >= FRAME_HEADER_LEN {
            let len = u16::from_le_bytes([self.inbound[0], self.inbound[1]]) as usize;
            if self.inbound.len() < FRAME_HEADER_LEN + len {
                return;
            }

            let frame: Vec<u8> = self.inbound.drain(..FRAME_HEADER_LEN + len).collect();
            let message = read_frame(&mut &frame[..]).unwrap();
            let reply = self.device.handle(message);
            self.outbound.extend(encode_frame(&reply).unwrap());
        }
    }
}

impl Read for LoopbackPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.outbound.read(buf)
    }
}

impl Write for LoopbackPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inbound.extend_from_slice(buf);
        self.pump();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingDelay {
    total_ms: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

#[test]
fn alarm_over_serial_reaches_the_device() {
    let mut client = Client::new(LoopbackPort::new());
    client.connect().unwrap();

    let mut player = MelodyPlayer::new(&mut client, CountingDelay::default(), NoteResolver::default());
    let summary = player.play(&ALARM).unwrap();
    let (_, delay) = player.into_parts();

    client.end().unwrap();

    assert!(summary.completed);
    assert_eq!(delay.total_ms, 3200);

    let device = client.into_port().device;
    assert_eq!(device.state(), ClientState::WaitingForHello);

    let buzzer = device.into_output();
    assert_eq!(buzzer.tones.len(), 3);
    assert!(buzzer.tones.iter().all(|hz| *hz == buzzer.tones[0]));
    assert_eq!(buzzer.active, None);
    // One stop per entry plus the end of the session
    assert_eq!(buzzer.stops, ALARM.len() + 1);
}

#[test]
fn playing_without_a_session_fails_on_the_device() {
    let mut client = Client::new(LoopbackPort::new());

    let mut player = MelodyPlayer::new(&mut client, CountingDelay::default(), NoteResolver::default());
    let err = player.play(&ALARM).unwrap_err();

    match err {
        PlayError::Output(e) => assert!(e.to_string().contains("unexpected tone packet")),
        other => panic!("expected an output error, got {other:?}"),
    }
}

#[test]
fn invalid_notes_rest_over_serial_when_configured() {
    let entries = [
        MelodyEntry::new("E5", 100),
        MelodyEntry::new("X9", 100),
        MelodyEntry::new("E5b", 100),
    ];

    let mut client = Client::new(LoopbackPort::new());
    client.connect().unwrap();

    let mut player = MelodyPlayer::new(&mut client, CountingDelay::default(), NoteResolver::default())
        .with_policy(InvalidNotePolicy::Silence);
    let summary = player.play(&Melody::new(&entries)).unwrap();
    drop(player);

    assert_eq!(summary.notes, 2);
    assert_eq!(summary.skipped, 1);

    let buzzer = client.into_port().device.into_output();
    assert_eq!(buzzer.tones.len(), 2);
    assert!(buzzer.tones[0] > buzzer.tones[1]);
}
