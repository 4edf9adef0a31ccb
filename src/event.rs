//! Domain events delivered to the consumer of a link.
//!
//! [`interpret`] maps a validated `(command, payload)` pair to a
//! [`DomainEvent`]. Every validated frame produces exactly one event; command
//! codes the host does not understand are passed through as
//! [`DomainEvent::UnknownCommand`] instead of being dropped.

use bytes::Bytes;
use serde::Serialize;

use crate::codec::{NfcUid, ThermalCodec, ThermalFrame};
use crate::error::Result;
use crate::protocol::{commands, Frame};

/// A decoded, typed result from the sensor board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A tag was presented to the NFC reader.
    NfcUid(NfcUid),
    /// A full thermal capture.
    ThermalFrame(ThermalFrame),
    /// A valid frame with a command code the host does not interpret.
    UnknownCommand {
        command: u8,
        #[serde(serialize_with = "serialize_payload")]
        payload: Bytes,
    },
    /// The link failed; no further events follow.
    LinkError(String),
}

impl DomainEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::NfcUid(_) => "nfc_uid",
            DomainEvent::ThermalFrame(_) => "thermal_frame",
            DomainEvent::UnknownCommand { .. } => "unknown_command",
            DomainEvent::LinkError(_) => "link_error",
        }
    }
}

fn serialize_payload<S: serde::Serializer>(
    payload: &Bytes,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(payload.iter())
}

/// Interpret a validated payload according to its command code.
///
/// Fails only with [`LinkError::MalformedThermalPayload`](crate::LinkError)
/// when a thermal report is not 128 bytes long, which the decoder already
/// rules out.
pub fn interpret(command: u8, payload: Bytes) -> Result<DomainEvent> {
    match command {
        commands::NFC_UID => Ok(DomainEvent::NfcUid(NfcUid::new(payload.to_vec()))),
        commands::THERMAL_FRAME => Ok(DomainEvent::ThermalFrame(ThermalCodec::decode(&payload)?)),
        _ => Ok(DomainEvent::UnknownCommand { command, payload }),
    }
}

/// Interpret a decoded frame.
pub fn interpret_frame(frame: Frame) -> Result<DomainEvent> {
    interpret(frame.command, frame.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::protocol::THERMAL_PAYLOAD_SIZE;

    #[test]
    fn test_nfc_uid() {
        let event = interpret(commands::NFC_UID, Bytes::from_static(&[0x11, 0x22])).unwrap();
        match event {
            DomainEvent::NfcUid(uid) => assert_eq!(uid.to_hex(), "11 22"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_empty_uid_is_valid() {
        let event = interpret(commands::NFC_UID, Bytes::new()).unwrap();
        assert_eq!(event, DomainEvent::NfcUid(NfcUid::new(Vec::new())));
    }

    #[test]
    fn test_thermal_frame() {
        let mut payload = vec![0u8; THERMAL_PAYLOAD_SIZE];
        payload[126] = 0x09;
        payload[127] = 0xC4;

        let event = interpret(commands::THERMAL_FRAME, Bytes::from(payload)).unwrap();
        match event {
            DomainEvent::ThermalFrame(frame) => {
                assert_eq!(frame.get(7, 7), 25.0);
                assert_eq!(frame.get(0, 0), 0.0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_short_thermal_payload_is_invariant_violation() {
        let result = interpret(commands::THERMAL_FRAME, Bytes::from(vec![0u8; 10]));
        assert!(matches!(
            result,
            Err(LinkError::MalformedThermalPayload { len: 10 })
        ));
    }

    #[test]
    fn test_unknown_command_passthrough() {
        let event = interpret(0x42, Bytes::from_static(&[0xFF])).unwrap();
        assert_eq!(
            event,
            DomainEvent::UnknownCommand {
                command: 0x42,
                payload: Bytes::from_static(&[0xFF]),
            }
        );
        assert_eq!(event.kind(), "unknown_command");
    }

    #[test]
    fn test_capture_request_echo_is_unknown() {
        // The board never sends 0x10; if it shows up it is passed through.
        let event = interpret(commands::THERMAL_CAPTURE, Bytes::new()).unwrap();
        assert!(matches!(
            event,
            DomainEvent::UnknownCommand { command: 0x10, .. }
        ));
    }

    #[test]
    fn test_interpret_frame() {
        let frame = Frame::from_parts(commands::NFC_UID, &[0xAB]);
        let event = interpret_frame(frame).unwrap();
        assert_eq!(event.kind(), "nfc_uid");
    }

    #[test]
    fn test_json_shape() {
        let uid = DomainEvent::NfcUid(NfcUid::new([0x01, 0x02]));
        assert_eq!(
            serde_json::to_string(&uid).unwrap(),
            r#"{"type":"nfc_uid","data":"01 02"}"#
        );

        let unknown = DomainEvent::UnknownCommand {
            command: 0x42,
            payload: Bytes::from_static(&[0xFF]),
        };
        assert_eq!(
            serde_json::to_string(&unknown).unwrap(),
            r#"{"type":"unknown_command","data":{"command":66,"payload":[255]}}"#
        );

        let error = DomainEvent::LinkError("gone".into());
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"type":"link_error","data":"gone"}"#
        );
    }
}
