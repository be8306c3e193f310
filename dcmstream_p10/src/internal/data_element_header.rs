//! The header of a single data element: its tag, VR, and value length.

use dcmstream_core::{DataElementTag, ValueRepresentation, dictionary};

/// A data element header. The VR is `None` for tags that don't carry one,
/// i.e. items and the item/sequence delimiters.
///
#[derive(Debug, PartialEq)]
pub struct DataElementHeader {
  pub tag: DataElementTag,
  pub vr: Option<ValueRepresentation>,
  pub length: ValueLength,
}

/// A value length as stored in DICOM P10: either a defined `u32` length, or
/// the undefined length `0xFFFFFFFF`.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueLength {
  Defined { length: u32 },
  Undefined,
}

impl ValueLength {
  /// Constructs a value length from a raw `u32`. `0xFFFFFFFF` is the
  /// undefined length.
  ///
  pub fn new(length: u32) -> Self {
    match length {
      0xFFFFFFFF => Self::Undefined,
      _ => Self::Defined { length },
    }
  }

  /// Returns the raw `u32` form of a value length.
  ///
  pub fn to_u32(self) -> u32 {
    match self {
      Self::Defined { length } => length,
      Self::Undefined => 0xFFFFFFFF,
    }
  }

  pub const ZERO: ValueLength = ValueLength::Defined { length: 0 };
}

impl core::fmt::Display for ValueLength {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::Defined { length } => write!(f, "{} bytes", length),
      Self::Undefined => write!(f, "UNDEFINED"),
    }
  }
}

/// The two sizes that a value length can be stored with in explicit VR
/// transfer syntaxes.
///
pub enum ValueLengthSize {
  U16,
  U32,
}

impl ValueLengthSize {
  /// The maximum value length representable at this size. `0xFFFFFFFF` is
  /// excluded because it encodes the undefined length.
  ///
  pub fn max_length(&self) -> usize {
    match self {
      Self::U16 => 0xFFFF,
      Self::U32 => 0xFFFFFFFE,
    }
  }
}

impl DataElementHeader {
  /// Returns the size of the stored value length for a VR in explicit VR
  /// transfer syntaxes. Ref: PS3.5 7.1.2.
  ///
  pub fn value_length_size(vr: ValueRepresentation) -> ValueLengthSize {
    match vr {
      ValueRepresentation::OtherByteString
      | ValueRepresentation::OtherDoubleString
      | ValueRepresentation::OtherFloatString
      | ValueRepresentation::OtherLongString
      | ValueRepresentation::OtherVeryLongString
      | ValueRepresentation::OtherWordString
      | ValueRepresentation::Sequence
      | ValueRepresentation::SignedVeryLong
      | ValueRepresentation::UniversalResourceIdentifier
      | ValueRepresentation::Unknown
      | ValueRepresentation::UnlimitedCharacters
      | ValueRepresentation::UnlimitedText
      | ValueRepresentation::UnsignedVeryLong => ValueLengthSize::U32,

      _ => ValueLengthSize::U16,
    }
  }
}

impl core::fmt::Display for DataElementHeader {
  /// Formats a data element header as `"(GROUP,ELEMENT) VR NAME"`, e.g.
  /// `"(0008,0020) DA StudyDate"`.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let tag_name = dictionary::tag_name(self.tag, None);

    match self.vr {
      Some(vr) => write!(f, "{} {} {}", self.tag, vr, tag_name),
      None => write!(f, "{} {}", self.tag, tag_name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementHeader {
        tag: dictionary::PATIENT_AGE.tag,
        vr: Some(ValueRepresentation::AgeString),
        length: ValueLength::ZERO,
      }
      .to_string(),
      "(0010,1010) AS PatientAge"
    );

    assert_eq!(
      DataElementHeader {
        tag: dictionary::ITEM.tag,
        vr: None,
        length: ValueLength::ZERO,
      }
      .to_string(),
      "(FFFE,E000) Item"
    );
  }

  #[test]
  fn value_length_test() {
    assert_eq!(ValueLength::new(0), ValueLength::ZERO);
    assert_eq!(ValueLength::new(0xFFFFFFFF), ValueLength::Undefined);
    assert_eq!(ValueLength::new(123).to_u32(), 123);
    assert_eq!(ValueLength::Undefined.to_u32(), 0xFFFFFFFF);
  }
}
