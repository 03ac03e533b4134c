//! YAML codec, the default format.

use std::io::{Read, Write};

use serde_json::Value;

use super::{Format, FormatError};

#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl Format for Yaml {
    fn name(&self) -> &'static str {
        "yml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn decode_reader(&self, reader: &mut dyn Read) -> Result<Value, FormatError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    fn decode_str(&self, input: &str) -> Result<Value, FormatError> {
        Ok(serde_yaml::from_str(input)?)
    }

    fn encode_writer(&self, value: &Value, writer: &mut dyn Write) -> Result<(), FormatError> {
        Ok(serde_yaml::to_writer(writer, value)?)
    }

    fn encode_string(&self, value: &Value) -> Result<String, FormatError> {
        Ok(serde_yaml::to_string(value)?)
    }
}
