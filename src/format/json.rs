//! JSON codec.

use std::io::{Read, Write};

use serde_json::Value;

use super::{Format, FormatError};

/// JSON via `serde_json`. Files are written pretty-printed, strings compact.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Format for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn decode_reader(&self, reader: &mut dyn Read) -> Result<Value, FormatError> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn decode_str(&self, input: &str) -> Result<Value, FormatError> {
        Ok(serde_json::from_str(input)?)
    }

    fn encode_writer(&self, value: &Value, writer: &mut dyn Write) -> Result<(), FormatError> {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn encode_string(&self, value: &Value) -> Result<String, FormatError> {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let value = json!({"a": 1, "b": [2, 3, {"test": "this"}], "c": {"d": "e"}, "n": null});

        let encoded = Json.encode_string(&value).unwrap();
        assert!(encoded.starts_with('{'));
        assert_eq!(Json.decode_str(&encoded).unwrap(), value);

        let mut buf = Vec::new();
        Json.encode_writer(&value, &mut buf).unwrap();
        assert_eq!(Json.decode_reader(&mut buf.as_slice()).unwrap(), value);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(Json.decode_str("{not json"), Err(FormatError::Json(_))));
    }
}
