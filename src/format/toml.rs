//! TOML codec.
//!
//! TOML has no null, so mappings holding `null` fail to encode.

use std::io::{Read, Write};

use serde_json::Value;

use super::{Format, FormatError};

#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

impl Format for Toml {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn decode_reader(&self, reader: &mut dyn Read) -> Result<Value, FormatError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.decode_str(&content)
    }

    fn decode_str(&self, input: &str) -> Result<Value, FormatError> {
        Ok(toml::from_str(input)?)
    }

    fn encode_writer(&self, value: &Value, writer: &mut dyn Write) -> Result<(), FormatError> {
        let encoded = self.encode_string(value)?;
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    }

    fn encode_string(&self, value: &Value) -> Result<String, FormatError> {
        Ok(toml::to_string(value)?)
    }
}
