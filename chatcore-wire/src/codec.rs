use bincode::ErrorKind;

use crate::error::WireError;
use crate::message::{WSMessage, WIRE_TAG_COUNT};

/// Encode an envelope into a single binary frame payload.
///
/// The result is meant to be written as one binary websocket frame; the
/// codec does not add its own length prefix because the websocket transport
/// already frames messages.
pub fn encode(msg: &WSMessage) -> Result<Vec<u8>, WireError> {
    bincode::serialize(msg).map_err(|e| WireError::Truncated(e.to_string()))
}

/// Decode a single binary frame payload back into an envelope.
///
/// bincode encodes an enum's discriminant as a leading `u32`; that tag is
/// checked against [`WIRE_TAG_COUNT`] before attempting a full decode, so a
/// frame naming a variant this build doesn't know about is reported as
/// `UnknownTag` rather than a generic decode failure. A bad UTF-8 string
/// payload is reported as `Utf8`; anything else (short reads, bad lengths)
/// is `Truncated`.
pub fn decode(bytes: &[u8]) -> Result<WSMessage, WireError> {
    if bytes.len() < 4 {
        return Err(WireError::Truncated("frame too short for a tag".to_string()));
    }
    let tag = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if tag >= WIRE_TAG_COUNT {
        return Err(WireError::UnknownTag(tag as u8));
    }
    bincode::deserialize(bytes).map_err(|err| match *err {
        ErrorKind::InvalidUtf8Encoding(_) => WireError::Utf8,
        ref other => WireError::Truncated(other.to_string()),
    })
}
