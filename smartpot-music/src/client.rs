//! Device side of the serial buzzer link: applies host messages to a local
//! [`ToneOutput`] and produces the reply for each one.

use alloc::{format, string::ToString};
use core::fmt::Display;

use smartpot_proto::{SmartPotC2SMessage, SmartPotS2CMessage, ToneEvent};
use tracing::{info, warn};

use crate::player::ToneOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientState {
    WaitingForHello,
    Playing,
}

pub struct ToneClient<O> {
    output: O,
    state: ClientState,
}

impl<O> ToneClient<O>
where
    O: ToneOutput,
    O::Error: Display,
{
    pub fn new(output: O) -> Self {
        Self {
            output,
            state: ClientState::WaitingForHello,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Handles one message from the host and returns the reply to send back
    pub fn handle(&mut self, message: SmartPotS2CMessage) -> SmartPotC2SMessage {
        match message {
            SmartPotS2CMessage::Hello => {
                if self.state != ClientState::WaitingForHello {
                    warn!("resetting state due to new hello packet");

                    if let Err(e) = self.output.stop_tone() {
                        return SmartPotC2SMessage::Error(format!("could not reset buzzer: {e}"));
                    }
                }

                info!("connected to host");

                self.state = ClientState::Playing;
                SmartPotC2SMessage::HelloAck
            }
            SmartPotS2CMessage::Tone(ToneEvent { frequency_hz }) => {
                if self.state != ClientState::Playing {
                    return SmartPotC2SMessage::Error("unexpected tone packet".to_string());
                }

                if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
                    return SmartPotC2SMessage::Error(format!(
                        "invalid tone frequency {frequency_hz}"
                    ));
                }

                match self.output.set_tone(frequency_hz) {
                    Ok(()) => SmartPotC2SMessage::ToneAck,
                    Err(e) => SmartPotC2SMessage::Error(format!("could not set tone: {e}")),
                }
            }
            SmartPotS2CMessage::Stop => {
                if self.state != ClientState::Playing {
                    return SmartPotC2SMessage::Error("unexpected stop packet".to_string());
                }

                match self.output.stop_tone() {
                    Ok(()) => SmartPotC2SMessage::StopAck,
                    Err(e) => SmartPotC2SMessage::Error(format!("could not stop tone: {e}")),
                }
            }
            SmartPotS2CMessage::End => {
                if self.state != ClientState::Playing {
                    return SmartPotC2SMessage::Error("unexpected end packet".to_string());
                }

                self.state = ClientState::WaitingForHello;

                match self.output.stop_tone() {
                    Ok(()) => SmartPotC2SMessage::EndAck,
                    Err(e) => SmartPotC2SMessage::Error(format!("could not stop tone: {e}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};
    use core::convert::Infallible;

    use super::*;

    #[derive(Default)]
    struct Buzzer {
        active: Option<f32>,
        history: Vec<Option<f32>>,
    }

    impl ToneOutput for Buzzer {
        type Error = Infallible;

        fn set_tone(&mut self, frequency_hz: f32) -> Result<(), Self::Error> {
            self.active = Some(frequency_hz);
            self.history.push(self.active);
            Ok(())
        }

        fn stop_tone(&mut self) -> Result<(), Self::Error> {
            self.active = None;
            self.history.push(self.active);
            Ok(())
        }
    }

    fn tone(frequency_hz: f32) -> SmartPotS2CMessage {
        SmartPotS2CMessage::Tone(ToneEvent { frequency_hz })
    }

    #[test]
    fn session_round_trip() {
        let mut client = ToneClient::new(Buzzer::default());

        assert_eq!(client.handle(SmartPotS2CMessage::Hello), SmartPotC2SMessage::HelloAck);
        assert_eq!(client.state(), ClientState::Playing);
        assert_eq!(client.handle(tone(440.0)), SmartPotC2SMessage::ToneAck);
        assert_eq!(client.handle(SmartPotS2CMessage::Stop), SmartPotC2SMessage::StopAck);
        assert_eq!(client.handle(SmartPotS2CMessage::End), SmartPotC2SMessage::EndAck);
        assert_eq!(client.state(), ClientState::WaitingForHello);

        let buzzer = client.into_output();
        assert_eq!(buzzer.active, None);
        assert_eq!(buzzer.history, vec![Some(440.0), None, None]);
    }

    #[test]
    fn messages_before_hello_are_rejected() {
        let mut client = ToneClient::new(Buzzer::default());

        for message in [tone(440.0), SmartPotS2CMessage::Stop, SmartPotS2CMessage::End] {
            assert!(matches!(client.handle(message), SmartPotC2SMessage::Error(_)));
        }

        assert!(client.into_output().history.is_empty());
    }

    #[test]
    fn second_hello_silences_the_buzzer() {
        let mut client = ToneClient::new(Buzzer::default());

        client.handle(SmartPotS2CMessage::Hello);
        client.handle(tone(523.25));

        assert_eq!(client.handle(SmartPotS2CMessage::Hello), SmartPotC2SMessage::HelloAck);
        assert_eq!(client.into_output().active, None);
    }

    #[test]
    fn nonsense_frequencies_are_rejected() {
        let mut client = ToneClient::new(Buzzer::default());
        client.handle(SmartPotS2CMessage::Hello);

        for frequency_hz in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                client.handle(tone(frequency_hz)),
                SmartPotC2SMessage::Error(_)
            ));
        }

        assert_eq!(client.into_output().active, None);
    }
}
