//! Work with the DICOM `AttributeTag` value representation.

use crate::{DataElementTag, DataError};

/// Parses an `AttributeTag` value into a list of data element tags. Each tag
/// is a pair of little endian 16-bit integers.
///
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<DataElementTag>, DataError> {
  if bytes.len() % 4 != 0 {
    return Err(DataError::new_value_invalid(
      "AttributeTag data length is not a multiple of 4".to_string(),
    ));
  }

  Ok(
    bytes
      .chunks_exact(4)
      .map(|chunk| {
        DataElementTag::new(
          u16::from_le_bytes([chunk[0], chunk[1]]),
          u16::from_le_bytes([chunk[2], chunk[3]]),
        )
      })
      .collect(),
  )
}

/// Serializes a list of data element tags into an `AttributeTag` value.
///
pub fn to_bytes(values: &[DataElementTag]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(values.len() * 4);

  for tag in values {
    bytes.extend_from_slice(&tag.group.to_le_bytes());
    bytes.extend_from_slice(&tag.element.to_le_bytes());
  }

  bytes
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(from_bytes(&[]), Ok(vec![]));

    assert_eq!(
      from_bytes(&[0x10, 0x48, 0xFE, 0x00, 0x52, 0x30, 0x41, 0x9A]),
      Ok(vec![
        DataElementTag::new(0x4810, 0x00FE),
        DataElementTag::new(0x3052, 0x9A41)
      ])
    );

    assert_eq!(
      from_bytes(&[0x00, 0x01]),
      Err(DataError::new_value_invalid(
        "AttributeTag data length is not a multiple of 4".to_string()
      ))
    );
  }

  #[test]
  fn round_trip_test() {
    let tags = vec![
      DataElementTag::new(0x0008, 0x0020),
      DataElementTag::new(0x7FE0, 0x0010),
    ];

    assert_eq!(from_bytes(&to_bytes(&tags)), Ok(tags));
  }
}
