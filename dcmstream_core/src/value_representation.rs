//! DICOM value representations (VRs).
//!
//! Ref: PS3.5 6.2.

/// All DICOM value representations (VRs).
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRepresentation {
  AgeString,
  ApplicationEntity,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  ShortText,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  Time,
  UniqueIdentifier,
  UniversalResourceIdentifier,
  Unknown,
  UnlimitedCharacters,
  UnlimitedText,
  UnsignedLong,
  UnsignedShort,
  UnsignedVeryLong,
}

/// Restrictions on the length of data stored for a value representation.
/// These are enforced when creating new values, not when reading.
///
#[derive(Debug, PartialEq)]
pub struct LengthRequirements {
  /// The maximum number of bytes a value can have.
  pub bytes_max: usize,

  /// A number that the number of bytes must be an exact multiple of, if
  /// applicable.
  pub bytes_multiple_of: Option<usize>,

  /// For string VRs, a limit on the number of characters. In multi-valued
  /// string VRs this applies to each value individually.
  pub string_characters_max: Option<usize>,
}

impl core::fmt::Display for ValueRepresentation {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.write_str(core::str::from_utf8(&self.to_bytes()).unwrap())
  }
}

use ValueRepresentation::*;

impl ValueRepresentation {
  /// Converts two bytes, e.g. `b"DA"`, into a value representation.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ()> {
    let bytes: [u8; 2] = bytes.try_into().map_err(|_| ())?;

    match &bytes {
      b"AE" => Ok(ApplicationEntity),
      b"AS" => Ok(AgeString),
      b"AT" => Ok(AttributeTag),
      b"CS" => Ok(CodeString),
      b"DA" => Ok(Date),
      b"DS" => Ok(DecimalString),
      b"DT" => Ok(DateTime),
      b"FD" => Ok(FloatingPointDouble),
      b"FL" => Ok(FloatingPointSingle),
      b"IS" => Ok(IntegerString),
      b"LO" => Ok(LongString),
      b"LT" => Ok(LongText),
      b"OB" => Ok(OtherByteString),
      b"OD" => Ok(OtherDoubleString),
      b"OF" => Ok(OtherFloatString),
      b"OL" => Ok(OtherLongString),
      b"OV" => Ok(OtherVeryLongString),
      b"OW" => Ok(OtherWordString),
      b"PN" => Ok(PersonName),
      b"SH" => Ok(ShortString),
      b"SL" => Ok(SignedLong),
      b"SQ" => Ok(Sequence),
      b"SS" => Ok(SignedShort),
      b"ST" => Ok(ShortText),
      b"SV" => Ok(SignedVeryLong),
      b"TM" => Ok(Time),
      b"UC" => Ok(UnlimitedCharacters),
      b"UI" => Ok(UniqueIdentifier),
      b"UL" => Ok(UnsignedLong),
      b"UN" => Ok(Unknown),
      b"UR" => Ok(UniversalResourceIdentifier),
      b"US" => Ok(UnsignedShort),
      b"UT" => Ok(UnlimitedText),
      b"UV" => Ok(UnsignedVeryLong),
      _ => Err(()),
    }
  }

  /// Returns the two-byte character representation of a VR.
  ///
  pub fn to_bytes(&self) -> [u8; 2] {
    *match self {
      AgeString => b"AS",
      ApplicationEntity => b"AE",
      AttributeTag => b"AT",
      CodeString => b"CS",
      Date => b"DA",
      DateTime => b"DT",
      DecimalString => b"DS",
      FloatingPointDouble => b"FD",
      FloatingPointSingle => b"FL",
      IntegerString => b"IS",
      LongString => b"LO",
      LongText => b"LT",
      OtherByteString => b"OB",
      OtherDoubleString => b"OD",
      OtherFloatString => b"OF",
      OtherLongString => b"OL",
      OtherVeryLongString => b"OV",
      OtherWordString => b"OW",
      PersonName => b"PN",
      Sequence => b"SQ",
      ShortString => b"SH",
      ShortText => b"ST",
      SignedLong => b"SL",
      SignedShort => b"SS",
      SignedVeryLong => b"SV",
      Time => b"TM",
      UniqueIdentifier => b"UI",
      UniversalResourceIdentifier => b"UR",
      Unknown => b"UN",
      UnlimitedCharacters => b"UC",
      UnlimitedText => b"UT",
      UnsignedLong => b"UL",
      UnsignedShort => b"US",
      UnsignedVeryLong => b"UV",
    }
  }

  /// Returns the human-readable name of a value representation, e.g.
  /// `"CodeString"`.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      AgeString => "AgeString",
      ApplicationEntity => "ApplicationEntity",
      AttributeTag => "AttributeTag",
      CodeString => "CodeString",
      Date => "Date",
      DateTime => "DateTime",
      DecimalString => "DecimalString",
      FloatingPointDouble => "FloatingPointDouble",
      FloatingPointSingle => "FloatingPointSingle",
      IntegerString => "IntegerString",
      LongString => "LongString",
      LongText => "LongText",
      OtherByteString => "OtherByteString",
      OtherDoubleString => "OtherDoubleString",
      OtherFloatString => "OtherFloatString",
      OtherLongString => "OtherLongString",
      OtherVeryLongString => "OtherVeryLongString",
      OtherWordString => "OtherWordString",
      PersonName => "PersonName",
      Sequence => "Sequence",
      ShortString => "ShortString",
      ShortText => "ShortText",
      SignedLong => "SignedLong",
      SignedShort => "SignedShort",
      SignedVeryLong => "SignedVeryLong",
      Time => "Time",
      UniqueIdentifier => "UniqueIdentifier",
      UniversalResourceIdentifier => "UniversalResourceIdentifier",
      Unknown => "Unknown",
      UnlimitedCharacters => "UnlimitedCharacters",
      UnlimitedText => "UnlimitedText",
      UnsignedLong => "UnsignedLong",
      UnsignedShort => "UnsignedShort",
      UnsignedVeryLong => "UnsignedVeryLong",
    }
  }

  /// Returns whether a value representation stores string data.
  ///
  pub fn is_string(self) -> bool {
    matches!(
      self,
      AgeString
        | ApplicationEntity
        | CodeString
        | Date
        | DateTime
        | DecimalString
        | IntegerString
        | LongString
        | LongText
        | PersonName
        | ShortString
        | ShortText
        | Time
        | UniqueIdentifier
        | UniversalResourceIdentifier
        | UnlimitedCharacters
        | UnlimitedText
    )
  }

  /// Returns whether a value representation stores string data that is
  /// decoded through the Specific Character Set and can therefore hold any
  /// Unicode codepoint once converted to UTF-8.
  ///
  pub fn is_encoded_string(self) -> bool {
    matches!(
      self,
      LongString
        | LongText
        | PersonName
        | ShortString
        | ShortText
        | UnlimitedCharacters
        | UnlimitedText
    )
  }

  /// Appends the padding byte for this value representation if the given
  /// bytes are of odd length. `UI` pads with a NUL byte, other string VRs
  /// pad with a space, and binary VRs are not padded.
  ///
  pub fn pad_bytes_to_even_length(self, bytes: &mut Vec<u8>) {
    if bytes.len() % 2 == 0 {
      return;
    }

    if self == UniqueIdentifier {
      bytes.push(0);
    } else if self.is_string() {
      bytes.push(0x20);
    }
  }

  /// Returns the length requirements for a value representation.
  ///
  pub fn length_requirements(self) -> LengthRequirements {
    let (bytes_max, bytes_multiple_of, string_characters_max) = match self {
      AgeString => (4, None, None),
      ApplicationEntity => (16, None, None),
      AttributeTag => (0xFFFC, Some(4), None),
      CodeString => (0xFFFE, None, Some(16)),
      Date => (8, None, None),
      DateTime => (26, None, None),
      DecimalString => (0xFFFE, None, Some(16)),
      FloatingPointDouble => (0xFFF8, Some(8), None),
      FloatingPointSingle => (0xFFFC, Some(4), None),
      IntegerString => (0xFFFE, None, Some(12)),
      LongString => (0xFFFE, None, Some(64)),
      LongText => (0xFFFE, None, Some(10_240)),
      OtherByteString => (0xFFFFFFFE, Some(2), None),
      OtherDoubleString => (0xFFFFFFF8, Some(8), None),
      OtherFloatString => (0xFFFFFFFC, Some(4), None),
      OtherLongString => (0xFFFFFFFC, Some(4), None),
      OtherVeryLongString => (0xFFFFFFF8, Some(8), None),
      OtherWordString => (0xFFFFFFFE, Some(2), None),
      PersonName => (0xFFFE, None, Some(324)),
      Sequence => (0, None, None),
      ShortString => (0xFFFE, None, Some(16)),
      ShortText => (0xFFFE, None, Some(1024)),
      SignedLong => (0xFFFC, Some(4), None),
      SignedShort => (0xFFFE, Some(2), None),
      SignedVeryLong => (0xFFFFFFF8, Some(8), None),
      Time => (14, None, None),
      UniqueIdentifier => (0xFFFE, None, Some(64)),
      UniversalResourceIdentifier => (0xFFFFFFFE, None, None),
      Unknown => (0xFFFFFFFE, None, None),
      UnlimitedCharacters => (0xFFFFFFFE, None, None),
      UnlimitedText => (0xFFFFFFFE, None, None),
      UnsignedLong => (0xFFFC, Some(4), None),
      UnsignedShort => (0xFFFE, Some(2), None),
      UnsignedVeryLong => (0xFFF8, Some(8), None),
    };

    LengthRequirements {
      bytes_max,
      bytes_multiple_of,
      string_characters_max,
    }
  }

  /// Swaps the endianness of data stored with this value representation.
  /// VRs that store 8-bit or string data are unaffected.
  ///
  pub fn swap_endianness(self, bytes: &mut [u8]) {
    let word_size = match self {
      AttributeTag | OtherWordString | SignedShort | UnsignedShort => 2,

      FloatingPointSingle | OtherFloatString | OtherLongString | SignedLong
      | UnsignedLong => 4,

      FloatingPointDouble | OtherDoubleString | OtherVeryLongString
      | SignedVeryLong | UnsignedVeryLong => 8,

      _ => return,
    };

    for word in bytes.chunks_exact_mut(word_size) {
      word.reverse();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_to_bytes_test() {
    for vr in [
      AgeString,
      ApplicationEntity,
      AttributeTag,
      CodeString,
      Date,
      DateTime,
      DecimalString,
      FloatingPointDouble,
      FloatingPointSingle,
      IntegerString,
      LongString,
      LongText,
      OtherByteString,
      OtherDoubleString,
      OtherFloatString,
      OtherLongString,
      OtherVeryLongString,
      OtherWordString,
      PersonName,
      Sequence,
      ShortString,
      ShortText,
      SignedLong,
      SignedShort,
      SignedVeryLong,
      Time,
      UniqueIdentifier,
      UniversalResourceIdentifier,
      Unknown,
      UnlimitedCharacters,
      UnlimitedText,
      UnsignedLong,
      UnsignedShort,
      UnsignedVeryLong,
    ] {
      assert_eq!(ValueRepresentation::from_bytes(&vr.to_bytes()), Ok(vr));
    }

    assert_eq!(ValueRepresentation::from_bytes(b"XY"), Err(()));
    assert_eq!(ValueRepresentation::from_bytes(b"A"), Err(()));
  }

  #[test]
  fn to_string_test() {
    assert_eq!(AgeString.to_string(), "AS");
    assert_eq!(OtherVeryLongString.to_string(), "OV");
  }

  #[test]
  fn pad_bytes_to_even_length_test() {
    let mut bytes = vec![0x41];
    LongText.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x20]);

    let mut bytes = vec![0x41];
    UniqueIdentifier.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x00]);

    let mut bytes = vec![0x41];
    OtherByteString.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41]);

    let mut bytes = vec![0x41, 0x42];
    LongText.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, vec![0x41, 0x42]);
  }

  #[test]
  fn swap_endianness_test() {
    let mut bytes = [0, 1, 2, 3];
    SignedShort.swap_endianness(&mut bytes);
    assert_eq!(bytes, [1, 0, 3, 2]);

    let mut bytes = [0, 1, 2, 3, 4, 5, 6, 7];
    UnsignedLong.swap_endianness(&mut bytes);
    assert_eq!(bytes, [3, 2, 1, 0, 7, 6, 5, 4]);

    let mut bytes = [0, 1, 2, 3, 4, 5, 6, 7];
    FloatingPointDouble.swap_endianness(&mut bytes);
    assert_eq!(bytes, [7, 6, 5, 4, 3, 2, 1, 0]);

    let mut bytes = [0, 1, 2, 3];
    OtherByteString.swap_endianness(&mut bytes);
    assert_eq!(bytes, [0, 1, 2, 3]);
  }
}
