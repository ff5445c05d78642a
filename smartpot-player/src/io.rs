use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use smartpot_music::ToneOutput;
use smartpot_proto::{SmartPotC2SMessage, SmartPotS2CMessage, ToneEvent, FRAME_HEADER_LEN};

#[macro_export]
macro_rules! pause {
    () => {
        $crate::io::pause_impl(None)
    };
    ($($arg:tt)*) => {
        $crate::io::pause_impl(Some(&format!($($arg)*)))
    };
}

/// Blocks until a key is pressed
pub fn pause_impl(message: Option<&str>) -> Result<()> {
    use std::io::{stdin, stdout};
    use termion::input::TermRead;
    use termion::raw::IntoRawMode;

    println!("{}", message.unwrap_or("Press any key to continue..."));

    let mut stdout = stdout().into_raw_mode()?;
    stdout.flush()?;
    stdin().events().next().transpose()?;

    Ok(())
}

/// Encodes `message` as a length-prefixed CBOR frame
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    ciborium::into_writer(message, &mut data)?;

    let len = u16::try_from(data.len()).context("message too large for a single frame")?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + data.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend(data);

    Ok(frame)
}

/// Reads exactly one length-prefixed CBOR frame from `reader`
pub fn read_frame<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<T> {
    let mut len_buf = [0u8; FRAME_HEADER_LEN];
    reader
        .read_exact(&mut len_buf)
        .context("timed out waiting for client response")?;
    let len = u16::from_le_bytes(len_buf) as usize;

    let mut message_buf = vec![0u8; len];
    reader
        .read_exact(&mut message_buf)
        .with_context(|| format!("expected {} bytes from client", len))?;

    Ok(ciborium::from_reader(&message_buf[..])?)
}

/// Host end of the serial link to a SmartPot buzzer
pub struct Client<P> {
    port: P,
}

impl<P: Read + Write> Client<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn into_port(self) -> P {
        self.port
    }

    pub fn send(&mut self, message: SmartPotS2CMessage) -> Result<()> {
        debug!(?message, "send");

        let frame = encode_frame(&message)?;
        self.port.write_all(&frame)?;
        self.port.flush()?;

        Ok(())
    }

    pub fn receive(&mut self) -> Result<SmartPotC2SMessage> {
        let message = read_frame(&mut self.port)?;

        debug!(?message, "receive");

        Ok(message)
    }

    /// Sends `message` and fails unless the client answers with `expected`
    pub fn request(
        &mut self,
        message: SmartPotS2CMessage,
        expected: SmartPotC2SMessage,
    ) -> Result<()> {
        self.send(message)?;

        match self.receive()? {
            reply if reply == expected => Ok(()),
            SmartPotC2SMessage::Error(e) => bail!("client reported an error: {e}"),
            reply => bail!("expected {expected:?} from client, got {reply:?}"),
        }
    }

    /// Opens a session with the client
    pub fn connect(&mut self) -> Result<()> {
        self.request(SmartPotS2CMessage::Hello, SmartPotC2SMessage::HelloAck)
            .context("could not connect to client")
    }

    /// Closes the session, silencing the buzzer
    pub fn end(&mut self) -> Result<()> {
        self.request(SmartPotS2CMessage::End, SmartPotC2SMessage::EndAck)
    }
}

impl<P: Read + Write> ToneOutput for Client<P> {
    type Error = anyhow::Error;

    fn set_tone(&mut self, frequency_hz: f32) -> Result<()> {
        self.request(
            SmartPotS2CMessage::Tone(ToneEvent { frequency_hz }),
            SmartPotC2SMessage::ToneAck,
        )
    }

    fn stop_tone(&mut self) -> Result<()> {
        self.request(SmartPotS2CMessage::Stop, SmartPotC2SMessage::StopAck)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Replays canned client replies and records everything written
    struct ScriptedPort {
        replies: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(replies: &[SmartPotC2SMessage]) -> Self {
            let mut bytes = Vec::new();
            for reply in replies {
                bytes.extend(encode_frame(reply).unwrap());
            }

            Self {
                replies: Cursor::new(bytes),
                written: Vec::new(),
            }
        }

        fn sent(&self) -> Vec<SmartPotS2CMessage> {
            let mut reader = &self.written[..];
            let mut messages = Vec::new();
            while !reader.is_empty() {
                messages.push(read_frame(&mut reader).unwrap());
            }
            messages
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.replies.read(buf)
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn frame_starts_with_little_endian_length() {
        let frame = encode_frame(&SmartPotS2CMessage::Hello).unwrap();

        let len = u16::from_le_bytes([frame[0], frame[1]]) as usize;
        assert_eq!(len, frame.len() - FRAME_HEADER_LEN);
    }

    #[test]
    fn tone_output_speaks_the_protocol() {
        let port = ScriptedPort::new(&[
            SmartPotC2SMessage::HelloAck,
            SmartPotC2SMessage::ToneAck,
            SmartPotC2SMessage::StopAck,
            SmartPotC2SMessage::EndAck,
        ]);
        let mut client = Client::new(port);

        client.connect().unwrap();
        client.set_tone(261.6).unwrap();
        client.stop_tone().unwrap();
        client.end().unwrap();

        assert_eq!(
            client.into_port().sent(),
            vec![
                SmartPotS2CMessage::Hello,
                SmartPotS2CMessage::Tone(ToneEvent {
                    frequency_hz: 261.6
                }),
                SmartPotS2CMessage::Stop,
                SmartPotS2CMessage::End,
            ]
        );
    }

    #[test]
    fn client_errors_surface_as_failures() {
        let port = ScriptedPort::new(&[SmartPotC2SMessage::Error("unexpected tone packet".into())]);
        let mut client = Client::new(port);

        let err = client.set_tone(440.0).unwrap_err();

        assert!(err.to_string().contains("unexpected tone packet"));
    }

    #[test]
    fn wrong_ack_is_rejected() {
        let port = ScriptedPort::new(&[SmartPotC2SMessage::StopAck]);
        let mut client = Client::new(port);

        assert!(client.set_tone(440.0).is_err());
    }

    #[test]
    fn silent_client_times_out() {
        let mut client = Client::new(ScriptedPort::new(&[]));

        let err = client.connect().unwrap_err();

        assert!(format!("{err:#}").contains("timed out"));
    }
}
