//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The handler never touches JSON directly: it asks a [`Codec`] to turn
//! a frame into a [`ClientAction`](crate::ClientAction) and a
//! [`ServerEvent`](crate::ServerEvent) into a frame. Swapping the wire
//! format means swapping the codec.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to frames and decodes frames back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame back into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON text, which is what browser clients send.
///
/// ```rust
/// use invigil_protocol::{ClientAction, Codec, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
/// let frame = br#"{"action":"start_game_request","data":{"room_code":"abc234"}}"#;
/// let action: ClientAction = codec.decode(frame).unwrap();
/// assert_eq!(
///     action,
///     ClientAction::StartGameRequest { room_code: RoomCode::new("ABC234") }
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
