//! Decodes DICOM string data that uses a Specific Character Set into a
//! UTF-8 string.

mod internal;

use internal::character_set::{self, CharacterSet, CodeElement};

/// The type of string being decoded. This determines which characters act
/// as delimiters that reset the active character set while decoding strings
/// that use ISO 2022 escape sequences.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StringType {
  /// A single-valued string without multiplicity: the `ShortText`,
  /// `LongText`, and `UnlimitedText` VRs. Only control characters are
  /// delimiters.
  SingleValue,

  /// A multi-valued string: the `LongString`, `ShortString`, and
  /// `UnlimitedCharacters` VRs. Control characters and the backslash are
  /// delimiters.
  MultiValue,

  /// A person name: the `PersonName` VR. Control characters, backslash,
  /// caret, and equals sign are delimiters.
  PersonName,
}

type CodeElementPair = (Option<CodeElement>, Option<CodeElement>);

/// A parsed *'(0008,0005) Specific Character Set'* value: a list of one or
/// more character sets. Multiple character sets mean that ISO 2022 Code
/// Extension escape sequences may occur in encoded string data.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SpecificCharacterSet(Vec<&'static CharacterSet>);

impl SpecificCharacterSet {
  /// Parses the raw value of a *'(0008,0005) Specific Character Set'* data
  /// element.
  ///
  pub fn from_string(specific_character_set: &str) -> Result<Self, String> {
    let mut terms: Vec<String> = specific_character_set
      .split('\\')
      .map(|s| s.trim().to_string())
      .collect();

    // An empty first value defaults to the DICOM default repertoire
    if terms.first().map(String::as_str) == Some("") {
      terms[0] = if terms.len() == 1 {
        "ISO_IR 6".to_string()
      } else {
        "ISO 2022 IR 6".to_string()
      };
    }

    let mut charsets = terms
      .iter()
      .map(|term| character_set::from_string(term))
      .collect::<Result<Vec<&'static CharacterSet>, String>>()?;

    match charsets.as_slice() {
      [_] => Ok(Self(charsets)),

      // Multiple values all need to support Code Extensions
      _ => {
        let has_non_iso_2022_charset = charsets.iter().any(|charset| {
          !matches!(charset, CharacterSet::SingleByteWithExtensions { .. })
        });

        if has_non_iso_2022_charset {
          return Err(
            "SpecificCharacterSet has multiple non-ISO 2022 values"
              .to_string(),
          );
        }

        // Append ISO 2022 IR 6 if not specified so its escape sequence is
        // always recognized. Not mandated by the standard, but improves
        // compatibility.
        if !charsets.contains(&&character_set::ISO_2022_IR_6) {
          charsets.push(&character_set::ISO_2022_IR_6);
        }

        Ok(Self(charsets))
      }
    }
  }

  /// Returns whether this specific character set is byte compatible with
  /// UTF-8, which is the case for the default repertoire and for UTF-8
  /// itself.
  ///
  pub fn is_utf8_compatible(&self) -> bool {
    self.0.len() == 1
      && (self.0[0] == &character_set::ISO_IR_6
        || self.0[0] == &character_set::ISO_IR_192)
  }

  /// Decodes encoded string bytes into a string. Trailing NUL and space
  /// padding is removed, and invalid bytes decode to U+FFFD.
  ///
  pub fn decode_bytes(&self, bytes: &[u8], string_type: StringType) -> String {
    let mut s = match self.0.as_slice() {
      [CharacterSet::SingleByteWithoutExtensions {
        defined_term,
        decoder,
      }] => {
        // ISO_IR 13 strings with multiplicity decode 0x5C as a backslash
        // so the delimiter survives
        let decoder = if *defined_term == "ISO_IR 13"
          && string_type != StringType::SingleValue
        {
          internal::decoders::jis_x_0201_allowing_backslash
        } else {
          *decoder
        };

        character_set::decode_bytes(bytes, decoder)
      }

      [CharacterSet::MultiByteWithoutExtensions { decoder, .. }] => {
        character_set::decode_bytes(bytes, *decoder)
      }

      _ => self.decode_iso_2022_bytes(bytes, string_type),
    };

    while s.ends_with(['\0', ' ']) {
      s.pop();
    }

    s
  }

  /// Decodes bytes that may contain ISO 2022 escape sequences switching the
  /// active G0/G1 code elements.
  ///
  fn decode_iso_2022_bytes(
    &self,
    mut bytes: &[u8],
    string_type: StringType,
  ) -> String {
    let mut s = String::with_capacity(bytes.len());
    let mut active = self.default_code_elements();

    loop {
      match bytes {
        [] => return s,

        [0x1B, rest @ ..] => {
          bytes = self.apply_escape_sequence(rest, &mut active);
        }

        _ => {
          let decoder = match (bytes, &active) {
            // Bytes with the high bit set use the active G1 code element
            ([byte, ..], (_, Some(g1))) if *byte >= 0x80 => g1.decoder,

            (_, (Some(g0), _)) => g0.decoder,

            _ => internal::decoders::iso_ir_6,
          };

          // Decoders only error when fed no bytes
          let (c, rest) = decoder(bytes).unwrap();

          // Delimiters reset the code elements to their initial state
          let is_delimiter = match c {
            '\u{9}' | '\u{A}' | '\u{C}' | '\u{D}' => true,
            '\\' => string_type != StringType::SingleValue,
            '=' | '^' => string_type == StringType::PersonName,
            _ => false,
          };

          if is_delimiter {
            active = self.default_code_elements();
          }

          s.push(c);
          bytes = rest;
        }
      }
    }
  }

  /// Returns the initial G0 and G1 code elements, i.e. those of the first
  /// character set. These are also restored whenever a delimiter occurs.
  ///
  fn default_code_elements(&self) -> CodeElementPair {
    self.0[0].code_elements()
  }

  /// Applies the escape sequence at the start of `bytes` to the active code
  /// elements. Escape sequences that don't match any available character
  /// set are ignored.
  ///
  fn apply_escape_sequence<'a>(
    &self,
    bytes: &'a [u8],
    active: &mut CodeElementPair,
  ) -> &'a [u8] {
    for charset in self.0.iter() {
      let (g0, g1) = charset.code_elements();

      if let Some(g0) = g0 {
        if let Some(rest) = bytes.strip_prefix(g0.escape_sequence) {
          active.0 = Some(g0);
          return rest;
        }
      }

      if let Some(g1) = g1 {
        if let Some(rest) = bytes.strip_prefix(g1.escape_sequence) {
          active.1 = Some(g1);
          return rest;
        }
      }
    }

    bytes
  }
}

/// Replaces all bytes greater than 0x7F with 0x3F, the question mark. Used
/// to ensure that only valid ISO 646 bytes are present in string values
/// restricted to the default repertoire.
///
pub fn sanitize_default_charset_bytes(bytes: &mut [u8]) {
  for b in bytes.iter_mut() {
    if *b > 0x7F {
      *b = 0x3F;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decode(term: &str, bytes: &[u8], string_type: StringType) -> String {
    SpecificCharacterSet::from_string(term)
      .unwrap()
      .decode_bytes(bytes, string_type)
  }

  #[test]
  fn from_string_test() {
    assert!(SpecificCharacterSet::from_string("").is_ok());
    assert!(SpecificCharacterSet::from_string("ISO_IR 144").is_ok());
    assert!(SpecificCharacterSet::from_string("\\ISO 2022 IR 144").is_ok());
    assert!(
      SpecificCharacterSet::from_string("ISO 2022 IR 13\\ISO 2022 IR 100")
        .is_ok()
    );

    assert!(SpecificCharacterSet::from_string("\\ISO_IR 144").is_err());
    assert!(
      SpecificCharacterSet::from_string("ISO_IR 6\\ISO 2022 IR 100").is_err()
    );
    assert!(
      SpecificCharacterSet::from_string("ISO_IR 192\\ISO 2022 IR 100")
        .is_err()
    );
    assert!(SpecificCharacterSet::from_string("ISO_IR 90210").is_err());
    assert!(SpecificCharacterSet::from_string("ISO 2022 IR 87").is_err());
  }

  #[test]
  fn is_utf8_compatible_test() {
    let is_compatible = |term: &str| {
      SpecificCharacterSet::from_string(term)
        .unwrap()
        .is_utf8_compatible()
    };

    assert!(is_compatible("ISO_IR 6"));
    assert!(is_compatible("ISO_IR 192"));
    assert!(!is_compatible("ISO_IR 100"));
  }

  #[test]
  fn decode_single_byte_test() {
    assert_eq!(
      decode("ISO_IR 6", b"Hello", StringType::SingleValue),
      "Hello"
    );

    assert_eq!(
      decode(
        "ISO_IR 100",
        &[0x42, 0x75, 0x63, 0x5E, 0x4A, 0xE9, 0x72, 0xF4, 0x6D, 0x65],
        StringType::PersonName,
      ),
      "Buc^Jérôme"
    );

    assert_eq!(
      decode("ISO_IR 144", &[0xBB, 0xEE, 0xDA, 0x30], StringType::MultiValue),
      "Люк0"
    );

    assert_eq!(
      decode("ISO_IR 192", "Παπ".as_bytes(), StringType::SingleValue),
      "Παπ"
    );
  }

  #[test]
  fn decode_trims_trailing_padding_test() {
    assert_eq!(
      decode("ISO_IR 6", b"ABC \0 ", StringType::SingleValue),
      "ABC"
    );
  }

  #[test]
  fn decode_invalid_bytes_test() {
    assert_eq!(
      decode("ISO_IR 6", &[0x41, 0xD1], StringType::SingleValue),
      "A\u{FFFD}"
    );
  }

  #[test]
  fn decode_iso_2022_escape_sequences_test() {
    // Switch to the Cyrillic G1 code element partway through the string
    assert_eq!(
      decode(
        "ISO 2022 IR 6\\ISO 2022 IR 144",
        &[0x41, 0x1B, 0x2D, 0x4C, 0xBB, 0xEE, 0xDA],
        StringType::SingleValue,
      ),
      "AЛюк"
    );

    // Unrecognized escape sequences are ignored
    assert_eq!(
      decode(
        "ISO 2022 IR 6\\ISO 2022 IR 144",
        &[0x1B, 0x2D, 0x46, 0x41],
        StringType::SingleValue,
      ),
      "A"
    );
  }

  #[test]
  fn decode_delimiter_resets_code_elements_test() {
    // The backslash delimiter resets the active G1 code element in a
    // multi-valued string, so the byte after the delimiter no longer
    // decodes as Cyrillic
    let charset =
      SpecificCharacterSet::from_string("ISO 2022 IR 6\\ISO 2022 IR 144")
        .unwrap();

    let bytes = [0x1B, 0x2D, 0x4C, 0xBB, 0x5C, 0xBB];

    assert_eq!(
      charset.decode_bytes(&bytes, StringType::MultiValue),
      "Л\\\u{FFFD}"
    );

    // In a single-valued string the backslash is not a delimiter, so the
    // Cyrillic G1 code element stays active
    assert_eq!(
      charset.decode_bytes(&bytes, StringType::SingleValue),
      "Л\\Л"
    );
  }

  #[test]
  fn sanitize_default_charset_bytes_test() {
    let mut bytes = vec![0x41, 0xD1, 0x42];
    sanitize_default_charset_bytes(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x3F, 0x42]);
  }
}
