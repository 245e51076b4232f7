use dispatch_sdk::{Codec, CodecError, Value};

/// Decodes response bodies as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(raw).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}
