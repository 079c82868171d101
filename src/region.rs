//! Region records
//!
//! A record is a single line holding the four native-space components of a
//! rectangle, `x y width height`, each with two fractional digits. Records
//! carry no version and are not bounds-checked when read.

use crate::error::ParseError;
use crate::geometry::NativeRect;
use std::io::ErrorKind;
use std::path::Path;

/// Region file read in reuse mode, relative to the working directory
pub const SAVED_REGION_FILE: &str = "region.txt";

pub fn serialize(rect: &NativeRect) -> String {
    format!(
        "{:.2} {:.2} {:.2} {:.2}",
        rect.x, rect.y, rect.width, rect.height
    )
}

pub fn deserialize(text: &str) -> Result<NativeRect, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 4 {
        return Err(ParseError::MalformedRecord(format!(
            "expected 4 values, found {}",
            tokens.len()
        )));
    }

    let mut values = [0.0f64; 4];
    for (value, token) in values.iter_mut().zip(&tokens) {
        *value = token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::MalformedRecord(format!("not a number: {:?}", token)))?;
    }

    let [x, y, width, height] = values;
    Ok(NativeRect::new(x, y, width, height))
}

/// Write a record, replacing whatever was there
pub fn save(path: &Path, rect: &NativeRect) -> std::io::Result<()> {
    std::fs::write(path, serialize(rect))
}

pub fn load(path: &Path) -> Result<NativeRect, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ParseError::NotFound(path.to_path_buf()),
        _ => ParseError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    deserialize(&text)
}
