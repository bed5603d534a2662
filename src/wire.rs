//! Byte-level encoding shared by the binary protocol messages.
//!
//! Vectors are packed as little-endian float32, numeric array properties as
//! little-endian float64. Whole messages are framed with bincode.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, WeftError};

/// Pack a vector as 4-byte little-endian floats.
pub fn f32s_to_bytes(values: &[f32]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(values.len() * 4);
    for &value in values {
        // Writing into a Vec cannot fail.
        let _ = buffer.write_f32::<LittleEndian>(value);
    }
    buffer
}

/// Unpack a buffer produced by [`f32s_to_bytes`].
pub fn bytes_to_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(WeftError::invalid_input(format!(
            "float32 buffer length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    let mut reader = Cursor::new(bytes);
    let mut values = Vec::with_capacity(bytes.len() / 4);
    for _ in 0..bytes.len() / 4 {
        values.push(reader.read_f32::<LittleEndian>()?);
    }
    Ok(values)
}

/// Pack numbers as 8-byte little-endian floats.
pub fn f64s_to_bytes(values: &[f64]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(values.len() * 8);
    for &value in values {
        let _ = buffer.write_f64::<LittleEndian>(value);
    }
    buffer
}

/// Unpack a buffer produced by [`f64s_to_bytes`].
pub fn bytes_to_f64s(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(WeftError::invalid_input(format!(
            "float64 buffer length {} is not a multiple of 8",
            bytes.len()
        )));
    }
    let mut reader = Cursor::new(bytes);
    let mut values = Vec::with_capacity(bytes.len() / 8);
    for _ in 0..bytes.len() / 8 {
        values.push(reader.read_f64::<LittleEndian>()?);
    }
    Ok(values)
}

/// Frame a binary protocol message.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(message)?)
}

/// Read back a frame produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}
