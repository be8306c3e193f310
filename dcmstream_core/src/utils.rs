/// Formats a byte slice in hexadecimal, e.g. `[1A 2B 3C 4D]`. If the slice
/// is longer than `max_length` bytes then the output is truncated with a
/// trailing ellipsis, e.g. `[1A 2B 3C 4D …]`.
///
pub fn inspect_u8_slice(bytes: &[u8], max_length: usize) -> String {
  let byte_count = core::cmp::min(max_length, bytes.len());

  let s = bytes[0..byte_count]
    .iter()
    .map(|byte| format!("{:02X}", byte))
    .collect::<Vec<_>>()
    .join(" ");

  if byte_count == bytes.len() {
    format!("[{}]", s)
  } else {
    format!("[{} …]", s)
  }
}

/// Removes trailing space and NUL characters from a string slice. These are
/// the two padding characters that appear at the end of DICOM string values.
///
pub fn trim_end_padding(s: &str) -> &str {
  s.trim_end_matches(['\0', ' '])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inspect_u8_slice_test() {
    assert_eq!(inspect_u8_slice(&[0xD1, 0x96, 0x33], 100), "[D1 96 33]");
    assert_eq!(
      inspect_u8_slice(&[0xD1, 0x96, 0x33, 0x44], 3),
      "[D1 96 33 …]"
    );
  }

  #[test]
  fn trim_end_padding_test() {
    assert_eq!(trim_end_padding("ABC \0 "), "ABC");
    assert_eq!(trim_end_padding(" ABC"), " ABC");
  }
}
