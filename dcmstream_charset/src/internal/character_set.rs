//! Descriptors for the supported DICOM character sets, along with the lookup
//! from a Specific Character Set defined term to its descriptor.

use crate::internal::decoders;

/// A single character set as defined by the DICOM standard, holding the
/// metadata needed to decode data that uses it.
///
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum CharacterSet {
  SingleByteWithoutExtensions {
    defined_term: &'static str,
    decoder: DecodeNextCodepointFn,
  },

  SingleByteWithExtensions {
    defined_term: &'static str,
    code_element_g0: CodeElement,
    code_element_g1: Option<CodeElement>,
  },

  MultiByteWithoutExtensions {
    defined_term: &'static str,
    decoder: DecodeNextCodepointFn,
  },
}

impl CharacterSet {
  /// Returns the G0 and G1 code elements of a character set. Character sets
  /// without Code Extension support have no code elements.
  ///
  pub fn code_elements(&self) -> (Option<CodeElement>, Option<CodeElement>) {
    match self {
      CharacterSet::SingleByteWithExtensions {
        code_element_g0,
        code_element_g1,
        ..
      } => (Some(*code_element_g0), *code_element_g1),

      _ => (None, None),
    }
  }
}

/// A G0 or G1 code element: its ISO 2022 escape sequence (two or three
/// bytes, following the ESC byte itself) and its decoder function.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CodeElement {
  pub escape_sequence: &'static [u8],
  pub decoder: DecodeNextCodepointFn,
}

/// A function that decodes the next codepoint from the given bytes,
/// returning it with the remaining bytes. Errors only when given no bytes.
///
pub type DecodeNextCodepointFn = fn(&[u8]) -> Result<(char, &[u8]), ()>;

/// ISO IR 6, also known as ISO 646 and US-ASCII.
///
pub const ISO_IR_6: CharacterSet = CharacterSet::SingleByteWithoutExtensions {
  defined_term: "ISO_IR 6",
  decoder: decoders::iso_ir_6,
};

/// ISO IR 100, also known as ISO 8859-1 and Latin-1.
///
pub const ISO_IR_100: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 100",
    decoder: decoders::iso_8859_1,
  };

/// ISO IR 144, also known as ISO 8859-5, Latin/Cyrillic.
///
pub const ISO_IR_144: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 144",
    decoder: decoders::iso_8859_5,
  };

/// ISO IR 148, also known as ISO 8859-9 and Latin-5.
///
pub const ISO_IR_148: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 148",
    decoder: decoders::iso_8859_9,
  };

/// ISO IR 203, also known as ISO 8859-15 and Latin-9.
///
pub const ISO_IR_203: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 203",
    decoder: decoders::iso_8859_15,
  };

/// ISO IR 138, also known as ISO 8859-8, Latin/Hebrew.
///
pub const ISO_IR_138: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 138",
    decoder: decoders::iso_8859_8,
  };

/// ISO IR 166, also known as ISO 8859-11 and TIS 620-2533, Latin/Thai.
///
pub const ISO_IR_166: CharacterSet =
  CharacterSet::SingleByteWithoutExtensions {
    defined_term: "ISO_IR 166",
    decoder: decoders::iso_8859_11,
  };

/// ISO IR 13, also known as JIS X 0201, romaji and halfwidth katakana.
///
pub const ISO_IR_13: CharacterSet = CharacterSet::SingleByteWithoutExtensions {
  defined_term: "ISO_IR 13",
  decoder: decoders::jis_x_0201,
};

/// ISO IR 192, i.e. UTF-8.
///
pub const ISO_IR_192: CharacterSet =
  CharacterSet::MultiByteWithoutExtensions {
    defined_term: "ISO_IR 192",
    decoder: decoders::utf8,
  };

const ISO_IR_6_CODE_ELEMENT: CodeElement = CodeElement {
  escape_sequence: &[0x28, 0x42],
  decoder: decoders::iso_ir_6,
};

/// ISO 2022 IR 6, US-ASCII with Code Extensions.
///
pub const ISO_2022_IR_6: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 6",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: None,
  };

/// ISO 2022 IR 100, Latin-1 with Code Extensions.
///
pub const ISO_2022_IR_100: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 100",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x41],
      decoder: decoders::iso_8859_1,
    }),
  };

/// ISO 2022 IR 144, Latin/Cyrillic with Code Extensions.
///
pub const ISO_2022_IR_144: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 144",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x4C],
      decoder: decoders::iso_8859_5,
    }),
  };

/// ISO 2022 IR 148, Latin-5 with Code Extensions.
///
pub const ISO_2022_IR_148: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 148",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x4D],
      decoder: decoders::iso_8859_9,
    }),
  };

/// ISO 2022 IR 203, Latin-9 with Code Extensions.
///
pub const ISO_2022_IR_203: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 203",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x62],
      decoder: decoders::iso_8859_15,
    }),
  };

/// ISO 2022 IR 138, Latin/Hebrew with Code Extensions.
///
pub const ISO_2022_IR_138: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 138",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x48],
      decoder: decoders::iso_8859_8,
    }),
  };

/// ISO 2022 IR 166, Latin/Thai with Code Extensions.
///
pub const ISO_2022_IR_166: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 166",
    code_element_g0: ISO_IR_6_CODE_ELEMENT,
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x2D, 0x54],
      decoder: decoders::iso_8859_11,
    }),
  };

/// ISO 2022 IR 13, JIS X 0201 with Code Extensions.
///
pub const ISO_2022_IR_13: CharacterSet =
  CharacterSet::SingleByteWithExtensions {
    defined_term: "ISO 2022 IR 13",
    code_element_g0: CodeElement {
      escape_sequence: &[0x28, 0x4A],
      decoder: decoders::jis_x_0201,
    },
    code_element_g1: Some(CodeElement {
      escape_sequence: &[0x29, 0x49],
      decoder: decoders::jis_x_0201,
    }),
  };

/// Defined terms that name valid DICOM character sets whose code tables are
/// not carried by this library.
///
const UNSUPPORTED_TERMS: [&str; 17] = [
  "ISO IR 101",
  "ISO IR 109",
  "ISO IR 110",
  "ISO IR 126",
  "ISO IR 127",
  "ISO 2022 IR 101",
  "ISO 2022 IR 109",
  "ISO 2022 IR 110",
  "ISO 2022 IR 126",
  "ISO 2022 IR 127",
  "ISO 2022 IR 87",
  "ISO 2022 IR 159",
  "ISO 2022 IR 149",
  "ISO 2022 IR 58",
  "GB18030",
  "GBK",
  "GB2312",
];

/// Converts a Specific Character Set defined term into its character set
/// descriptor. The term is matched case-insensitively, tolerating the
/// underscore/space variations seen in the wild.
///
pub fn from_string(term: &str) -> Result<&'static CharacterSet, String> {
  let normalized = term.to_uppercase().replace('_', " ");

  let charset = match normalized.as_str() {
    "ISO IR 6" => Some(&ISO_IR_6),
    "ISO IR 100" => Some(&ISO_IR_100),
    "ISO IR 144" => Some(&ISO_IR_144),
    "ISO IR 148" => Some(&ISO_IR_148),
    "ISO IR 203" => Some(&ISO_IR_203),
    "ISO IR 138" => Some(&ISO_IR_138),
    "ISO IR 166" => Some(&ISO_IR_166),
    "ISO IR 13" => Some(&ISO_IR_13),
    "ISO IR 192" => Some(&ISO_IR_192),
    "ISO 2022 IR 6" => Some(&ISO_2022_IR_6),
    "ISO 2022 IR 100" => Some(&ISO_2022_IR_100),
    "ISO 2022 IR 144" => Some(&ISO_2022_IR_144),
    "ISO 2022 IR 148" => Some(&ISO_2022_IR_148),
    "ISO 2022 IR 203" => Some(&ISO_2022_IR_203),
    "ISO 2022 IR 138" => Some(&ISO_2022_IR_138),
    "ISO 2022 IR 166" => Some(&ISO_2022_IR_166),
    "ISO 2022 IR 13" => Some(&ISO_2022_IR_13),
    _ => None,
  };

  match charset {
    Some(charset) => Ok(charset),

    None if UNSUPPORTED_TERMS.contains(&normalized.as_str()) => Err(format!(
      "Character set '{}' has no code table in this library",
      term
    )),

    None => Err(format!("Unrecognized character set: '{}'", term)),
  }
}

/// Decodes bytes into a string using a single decoder function.
///
pub fn decode_bytes(
  mut bytes: &[u8],
  decoder: DecodeNextCodepointFn,
) -> String {
  let mut s = String::with_capacity(bytes.len());

  while let Ok((c, rest)) = decoder(bytes) {
    s.push(c);
    bytes = rest;
  }

  s
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_string_test() {
    assert_eq!(from_string("ISO_IR 100"), Ok(&ISO_IR_100));
    assert_eq!(from_string("ISO IR 100"), Ok(&ISO_IR_100));
    assert!(from_string("iso-ir 100").is_err());
    assert_eq!(from_string("ISO 2022 IR 6"), Ok(&ISO_2022_IR_6));

    assert!(from_string("ISO 2022 IR 87").is_err());
    assert!(from_string("ISO_IR 90210").is_err());
  }
}
