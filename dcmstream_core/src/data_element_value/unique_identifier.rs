//! Work with the DICOM `UniqueIdentifier` value representation.

use regex::Regex;

use crate::DataError;

/// Serializes a list of UIDs into a `UniqueIdentifier` value. A NUL byte is
/// used as padding.
///
pub fn to_bytes(uids: &[&str]) -> Result<Vec<u8>, DataError> {
  if uids.iter().any(|uid| !is_valid(uid)) {
    return Err(DataError::new_value_invalid(
      "UniqueIdentifier is invalid".to_string(),
    ));
  }

  let mut bytes = uids.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x00);
  }

  Ok(bytes)
}

static UID_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
  Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").unwrap()
});

/// Returns whether the given string is a valid UID: 1-64 characters of
/// dotted decimal, with no leading zeros in a digit sequence unless the zero
/// is the only digit.
///
pub fn is_valid(uid: &str) -> bool {
  !uid.is_empty() && uid.len() <= 64 && UID_REGEX.is_match(uid)
}

/// Generates a new random UID with the given prefix. The new UID is 64
/// characters long. A non-empty prefix must itself be a valid UID of at
/// most 60 characters.
///
#[allow(clippy::result_unit_err)]
pub fn new(prefix: &str) -> Result<String, ()> {
  use rand::Rng;

  if prefix.len() > 60 || (!prefix.is_empty() && !is_valid(prefix)) {
    return Err(());
  }

  let mut rng = rand::thread_rng();

  let mut uid = prefix.to_string();
  if !uid.is_empty() {
    uid.push('.');
  }

  // The first digit after the prefix is non-zero so no leading zero is
  // possible
  uid.push(char::from(rng.gen_range(b'1'..=b'9')));

  while uid.len() < 64 {
    uid.push(char::from(rng.gen_range(b'0'..=b'9')));
  }

  Ok(uid)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn is_valid_test() {
    assert!(is_valid("1.2.840.10008.1.2"));
    assert!(is_valid("0"));
    assert!(!is_valid(""));
    assert!(!is_valid("1.00"));
    assert!(!is_valid("1."));
    assert!(!is_valid(&"1".repeat(65)));
  }

  #[test]
  fn to_bytes_test() {
    let invalid_uid_error = Err(DataError::new_value_invalid(
      "UniqueIdentifier is invalid".to_string(),
    ));

    assert_eq!(to_bytes(&[]), Ok(vec![]));
    assert_eq!(to_bytes(&["1.0"]), Ok(b"1.0\0".to_vec()));
    assert_eq!(to_bytes(&["1.2", "3.4"]), Ok(b"1.2\\3.4\0".to_vec()));
    assert_eq!(to_bytes(&[""]), invalid_uid_error.clone());
    assert_eq!(to_bytes(&["1.00"]), invalid_uid_error);
  }

  #[test]
  fn new_test() {
    for _ in 0..100 {
      assert!(is_valid(&new("").unwrap()));
      assert!(is_valid(&new("1111.2222").unwrap()));
    }

    let uid = new("1111.2222").unwrap();
    assert!(uid.starts_with("1111.2222."));
    assert_eq!(uid.len(), 64);

    assert_eq!(new(&"1".repeat(61)), Err(()));
    assert_eq!(new("1."), Err(()));
  }
}
