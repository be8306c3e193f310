//! Work with the DICOM `DecimalString` value representation.

use crate::DataError;

/// Parses a `DecimalString` value into a list of floats.
///
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<f64>, DataError> {
  let decimal_string = std::str::from_utf8(bytes).map_err(|_| {
    DataError::new_value_invalid("DecimalString is invalid UTF-8".to_string())
  })?;

  let decimal_string = decimal_string.trim_matches('\0');

  decimal_string
    .split('\\')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::parse::<f64>)
    .collect::<Result<Vec<f64>, _>>()
    .map_err(|_| {
      DataError::new_value_invalid(format!(
        "DecimalString is invalid: '{}'",
        decimal_string
      ))
    })
}

/// Serializes a list of floats into a `DecimalString` value. Each value is
/// limited to 16 characters, using exponential notation when it is shorter.
///
pub fn to_bytes(values: &[f64]) -> Vec<u8> {
  let values: Vec<String> = values
    .iter()
    .map(|f| {
      let decimal = f.to_string();
      let exponential = format!("{:e}", f);

      if decimal.len() < exponential.len() {
        // Trim unnecessary trailing zeros and decimal points
        let trimmed = if decimal.contains('.') {
          decimal.trim_end_matches('0').trim_end_matches('.')
        } else {
          &decimal
        };

        trimmed[0..core::cmp::min(trimmed.len(), 16)].to_string()
      } else {
        exponential
      }
    })
    .collect();

  let mut bytes = values.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x20);
  }

  bytes
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(from_bytes(&[]), Ok(vec![]));
    assert_eq!(from_bytes(b"  1.2"), Ok(vec![1.2]));
    assert_eq!(from_bytes(b"127."), Ok(vec![127.0]));
    assert_eq!(from_bytes(b"-1024"), Ok(vec![-1024.0]));
    assert_eq!(from_bytes(b"  1.2\\4.5"), Ok(vec![1.2, 4.5]));
    assert_eq!(from_bytes(b"1.868344208e-10"), Ok(vec![1.868344208e-10]));

    assert_eq!(
      from_bytes(b"1.A"),
      Err(DataError::new_value_invalid(
        "DecimalString is invalid: '1.A'".to_string()
      ))
    );

    assert_eq!(
      from_bytes(&[0xD0]),
      Err(DataError::new_value_invalid(
        "DecimalString is invalid UTF-8".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(to_bytes(&[]), Vec::<u8>::new());
    assert_eq!(to_bytes(&[0.0]), b"0 ".to_vec());
    assert_eq!(to_bytes(&[1.2]), b"1.2 ".to_vec());
    assert_eq!(to_bytes(&[1.2, 3.4]), b"1.2\\3.4 ".to_vec());
    assert_eq!(to_bytes(&[1.868344208e-10]), b"1.868344208e-10 ".to_vec());
    assert_eq!(to_bytes(&[1.123456789123456]), b"1.12345678912345".to_vec());
  }
}
