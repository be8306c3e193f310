//! Decoder functions that convert the next bytes of encoded string data into
//! a Unicode codepoint. Each function returns the decoded character and the
//! remaining bytes, and errors only when given no bytes. Invalid bytes
//! decode to U+FFFD.

/// ISO 646 / US-ASCII, the DICOM default repertoire.
///
pub fn iso_ir_6(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = if *byte < 0x80 {
        char::from(*byte)
      } else {
        char::REPLACEMENT_CHARACTER
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// ISO 8859-1, Latin-1. Every byte maps directly to the codepoint of the
/// same value.
///
pub fn iso_8859_1(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => Ok((char::from(*byte), rest)),
    _ => Err(()),
  }
}

/// ISO 8859-5, Latin/Cyrillic.
///
pub fn iso_8859_5(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = match *byte {
        0x00..=0x9F | 0xA0 | 0xAD => char::from(*byte),
        0xF0 => '\u{2116}',
        0xFD => '\u{00A7}',
        b => codepoint(0x360 + u32::from(b)),
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// ISO 8859-9, Latin-5. Identical to Latin-1 apart from six Turkish
/// letters.
///
pub fn iso_8859_9(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = match *byte {
        0xD0 => '\u{011E}',
        0xDD => '\u{0130}',
        0xDE => '\u{015E}',
        0xF0 => '\u{011F}',
        0xFD => '\u{0131}',
        0xFE => '\u{015F}',
        b => char::from(b),
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// ISO 8859-15, Latin-9. Identical to Latin-1 apart from eight positions.
///
pub fn iso_8859_15(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = match *byte {
        0xA4 => '\u{20AC}',
        0xA6 => '\u{0160}',
        0xA8 => '\u{0161}',
        0xB4 => '\u{017D}',
        0xB8 => '\u{017E}',
        0xBC => '\u{0152}',
        0xBD => '\u{0153}',
        0xBE => '\u{0178}',
        b => char::from(b),
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// ISO 8859-8, Latin/Hebrew.
///
pub fn iso_8859_8(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = match *byte {
        0x00..=0x9F | 0xA0 => char::from(*byte),
        0xAA => '\u{00D7}',
        0xBA => '\u{00F7}',
        0xA2..=0xBE => char::from(*byte),
        0xDF => '\u{2017}',
        b @ 0xE0..=0xFA => codepoint(0x05D0 + u32::from(b) - 0xE0),
        _ => char::REPLACEMENT_CHARACTER,
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// ISO 8859-11 / TIS 620-2533, Latin/Thai.
///
pub fn iso_8859_11(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => {
      let c = match *byte {
        0x00..=0x9F | 0xA0 => char::from(*byte),
        b @ 0xA1..=0xDA => codepoint(0x0E01 + u32::from(b) - 0xA1),
        b @ 0xDF..=0xFB => codepoint(0x0E3F + u32::from(b) - 0xDF),
        _ => char::REPLACEMENT_CHARACTER,
      };

      Ok((c, rest))
    }

    _ => Err(()),
  }
}

/// JIS X 0201, romaji and halfwidth katakana.
///
pub fn jis_x_0201(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => Ok((jis_x_0201_char(*byte, false), rest)),
    _ => Err(()),
  }
}

/// JIS X 0201 variant that decodes 0x5C as a backslash instead of the yen
/// sign. Used when decoding strings where the backslash is a multiplicity
/// or person name delimiter.
///
pub fn jis_x_0201_allowing_backslash(
  bytes: &[u8],
) -> Result<(char, &[u8]), ()> {
  match bytes {
    [byte, rest @ ..] => Ok((jis_x_0201_char(*byte, true), rest)),
    _ => Err(()),
  }
}

fn jis_x_0201_char(byte: u8, allow_backslash: bool) -> char {
  match byte {
    0x5C if !allow_backslash => '\u{00A5}',
    0x7E => '\u{203E}',
    0x00..=0x7F => char::from(byte),
    b @ 0xA1..=0xDF => codepoint(0xFF61 + u32::from(b) - 0xA1),
    _ => char::REPLACEMENT_CHARACTER,
  }
}

/// UTF-8. Invalid byte sequences decode to U+FFFD one byte at a time.
///
pub fn utf8(bytes: &[u8]) -> Result<(char, &[u8]), ()> {
  let first = *bytes.first().ok_or(())?;

  let length = match first {
    0x00..=0x7F => 1,
    0xC2..=0xDF => 2,
    0xE0..=0xEF => 3,
    0xF0..=0xF4 => 4,
    _ => return Ok((char::REPLACEMENT_CHARACTER, &bytes[1..])),
  };

  if bytes.len() < length {
    return Ok((char::REPLACEMENT_CHARACTER, &bytes[bytes.len()..]));
  }

  match std::str::from_utf8(&bytes[0..length]) {
    Ok(s) => Ok((s.chars().next().unwrap(), &bytes[length..])),
    Err(_) => Ok((char::REPLACEMENT_CHARACTER, &bytes[1..])),
  }
}

fn codepoint(value: u32) -> char {
  char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decode_all(
    mut bytes: &[u8],
    decoder: fn(&[u8]) -> Result<(char, &[u8]), ()>,
  ) -> String {
    let mut s = String::new();

    while let Ok((c, rest)) = decoder(bytes) {
      s.push(c);
      bytes = rest;
    }

    s
  }

  #[test]
  fn iso_ir_6_test() {
    assert_eq!(decode_all(b"Hello", iso_ir_6), "Hello");
    assert_eq!(decode_all(&[0x41, 0xD1], iso_ir_6), "A\u{FFFD}");
  }

  #[test]
  fn iso_8859_1_test() {
    assert_eq!(
      decode_all(&[0x4A, 0xE9, 0x72, 0xF4, 0x6D, 0x65], iso_8859_1),
      "Jérôme"
    );
  }

  #[test]
  fn iso_8859_5_test() {
    assert_eq!(decode_all(&[0xB0, 0xE0, 0xA1, 0xF1], iso_8859_5), "АрЁё");
    assert_eq!(decode_all(&[0xF0, 0xFD], iso_8859_5), "\u{2116}\u{00A7}");
  }

  #[test]
  fn iso_8859_8_test() {
    assert_eq!(
      decode_all(&[0xF9, 0xE8, 0xF8, 0xE5], iso_8859_8),
      "\u{05E9}\u{05D8}\u{05E8}\u{05D5}"
    );
  }

  #[test]
  fn iso_8859_11_test() {
    assert_eq!(
      decode_all(&[0xA1, 0xD2, 0xC3], iso_8859_11),
      "\u{0E01}\u{0E32}\u{0E23}"
    );
  }

  #[test]
  fn jis_x_0201_test() {
    assert_eq!(
      decode_all(&[0xD4, 0xCF, 0xC0, 0xDE], jis_x_0201),
      "\u{FF94}\u{FF8F}\u{FF80}\u{FF9E}"
    );

    assert_eq!(decode_all(&[0x5C, 0x7E], jis_x_0201), "\u{00A5}\u{203E}");

    assert_eq!(
      decode_all(&[0x5C], jis_x_0201_allowing_backslash),
      "\\"
    );
  }

  #[test]
  fn utf8_test() {
    assert_eq!(decode_all("Jérôme".as_bytes(), utf8), "Jérôme");
    assert_eq!(decode_all(&[0x41, 0xFF, 0x42], utf8), "A\u{FFFD}B");
    assert_eq!(decode_all(&[0xE2, 0x82], utf8), "\u{FFFD}");
  }
}
