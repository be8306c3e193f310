//! Tracks where in the hierarchy of sequences and items a DICOM P10 read is
//! up to, along with the data needed to correctly interpret incoming data
//! elements at that location:
//!
//! 1. End offsets of defined-length sequences and items, so that defined
//!    lengths can be converted to undefined lengths with explicit
//!    delimiters.
//!
//! 2. The active Specific Character Set used to decode string values that
//!    aren't UTF-8. Set by *'(0008,0005) Specific Character Set'*, most
//!    commonly in the root data set, but overridable inside sequence items.
//!
//! 3. The values of data elements needed to determine the VR of later data
//!    elements in the 'Implicit VR Little Endian' transfer syntax, e.g.
//!    *'(0028,0103) Pixel Representation'* decides whether
//!    *'(0028,0106) Smallest Image Pixel Value'* is US or SS.

use std::collections::BTreeMap;

use dcmstream_charset::{SpecificCharacterSet, StringType};
use dcmstream_core::{
  DataElementTag, RcBytes, ValueRepresentation, dictionary, utils,
};

use crate::{P10Error, P10Token, internal::data_element_header::ValueLength};

/// A P10 location is a stack of entries, with the current innermost one at
/// the end. The root data set entry is always present at the start.
///
#[derive(Debug)]
pub struct P10Location {
  entries: Vec<LocationEntry>,
}

#[derive(Debug)]
enum LocationEntry {
  RootDataSet {
    clarifying_elements: ClarifyingElements,
    last_data_element_tag: DataElementTag,
  },
  Sequence {
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
    item_count: usize,
  },
  Item {
    clarifying_elements: ClarifyingElements,
    last_data_element_tag: DataElementTag,
    ends_at: Option<u64>,
  },
}

/// The data elements whose values clarify how subsequent data elements are
/// read: string decoding and implicit VR determination.
///
#[derive(Clone, Debug)]
struct ClarifyingElements {
  specific_character_set: SpecificCharacterSet,
  bits_allocated: Option<u16>,
  pixel_representation: Option<u16>,
  waveform_bits_stored: Option<u16>,
  waveform_bits_allocated: Option<u16>,
  private_creators: BTreeMap<DataElementTag, String>,
}

impl Default for ClarifyingElements {
  fn default() -> Self {
    Self {
      specific_character_set: SpecificCharacterSet::from_string("ISO_IR 6")
        .unwrap(),
      bits_allocated: None,
      pixel_representation: None,
      waveform_bits_stored: None,
      waveform_bits_allocated: None,
      private_creators: BTreeMap::new(),
    }
  }
}

impl ClarifyingElements {
  fn private_creator_for_tag(&self, tag: DataElementTag) -> Option<&str> {
    if !tag.is_private() {
      return None;
    }

    let private_creator_tag = DataElementTag::new(tag.group, tag.element >> 8);

    self
      .private_creators
      .get(&private_creator_tag)
      .map(String::as_str)
  }
}

/// Returns whether a data element is a clarifying data element whose value
/// needs to be materialized by the read process and stored in the location.
///
pub fn is_clarifying_data_element(tag: DataElementTag) -> bool {
  tag == dictionary::SPECIFIC_CHARACTER_SET.tag
    || tag == dictionary::BITS_ALLOCATED.tag
    || tag == dictionary::PIXEL_REPRESENTATION.tag
    || tag == dictionary::WAVEFORM_BITS_STORED.tag
    || tag == dictionary::WAVEFORM_BITS_ALLOCATED.tag
    || tag.is_private_creator()
}

impl P10Location {
  /// Creates a new P10 location holding only the root data set entry.
  ///
  pub fn new() -> Self {
    Self {
      entries: vec![LocationEntry::RootDataSet {
        clarifying_elements: ClarifyingElements::default(),
        last_data_element_tag: DataElementTag::ZERO,
      }],
    }
  }

  /// Checks that the given tag is greater than the previous data element's
  /// tag at the current location. Data elements in a data set or sequence
  /// item must appear in ascending order, and enforcing this matters for
  /// streaming reads because lower tags clarify the interpretation of
  /// higher ones.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn check_data_element_ordering(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), ()> {
    match self.entries.last_mut() {
      Some(LocationEntry::RootDataSet {
        last_data_element_tag,
        ..
      })
      | Some(LocationEntry::Item {
        last_data_element_tag,
        ..
      }) => {
        if tag > *last_data_element_tag {
          *last_data_element_tag = tag;
          Ok(())
        } else {
          Err(())
        }
      }

      Some(LocationEntry::Sequence { .. }) => Ok(()),

      None => Err(()),
    }
  }

  /// Returns whether any sequence in the location forces the use of the
  /// 'Implicit VR Little Endian' transfer syntax, which happens when a
  /// sequence was read from an explicit VR of `UN` with undefined length.
  ///
  /// Ref: DICOM Correction Proposal CP-246.
  ///
  pub fn is_implicit_vr_forced(&self) -> bool {
    self.entries.iter().any(|entry| {
      matches!(
        entry,
        LocationEntry::Sequence {
          is_implicit_vr: true,
          ..
        }
      )
    })
  }

  /// Swaps the endianness of value bytes for the given tag and VR.
  ///
  /// Pixel data and waveform data with a VR of OW but a bits allocated
  /// value of 32 or 64 actually store 32/64-bit words, so they swap at
  /// that width rather than the 16 bits the VR indicates.
  ///
  pub fn swap_endianness(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    data: &mut [u8],
  ) {
    let vr = if vr == ValueRepresentation::OtherWordString {
      let bits_allocated = if tag == dictionary::PIXEL_DATA.tag {
        self.clarifying_elements().bits_allocated
      } else if tag == dictionary::WAVEFORM_DATA.tag {
        self.clarifying_elements().waveform_bits_allocated
      } else {
        None
      };

      match bits_allocated {
        Some(32) => ValueRepresentation::UnsignedLong,
        Some(64) => ValueRepresentation::UnsignedVeryLong,
        _ => vr,
      }
    } else {
      vr
    };

    vr.swap_endianness(data);
  }

  /// Returns the next delimiter token pending for this location, i.e. when
  /// the entry at the head has a defined-length end offset that the read
  /// position has reached. This is how defined lengths become undefined
  /// lengths with explicit delimiters.
  ///
  pub fn next_delimiter_token(&mut self, bytes_read: u64) -> Option<P10Token> {
    match self.entries.last() {
      Some(LocationEntry::Sequence {
        tag,
        ends_at: Some(ends_at),
        ..
      }) if *ends_at <= bytes_read => {
        let tag = *tag;
        self.entries.pop();
        Some(P10Token::SequenceDelimiter { tag })
      }

      Some(LocationEntry::Item {
        ends_at: Some(ends_at),
        ..
      }) if *ends_at <= bytes_read => {
        self.entries.pop();
        Some(P10Token::SequenceItemDelimiter)
      }

      _ => None,
    }
  }

  /// Returns all delimiter tokens needed to close this location's open
  /// sequences and items, ending with the final [`P10Token::End`].
  ///
  pub fn pending_delimiter_tokens(&self) -> Vec<P10Token> {
    self
      .entries
      .iter()
      .rev()
      .map(|entry| match entry {
        LocationEntry::Sequence { tag, .. } => {
          P10Token::SequenceDelimiter { tag: *tag }
        }
        LocationEntry::Item { .. } => P10Token::SequenceItemDelimiter,
        LocationEntry::RootDataSet { .. } => P10Token::End,
      })
      .collect()
  }

  /// Pushes a new sequence onto this location.
  ///
  pub fn add_sequence(
    &mut self,
    tag: DataElementTag,
    is_implicit_vr: bool,
    ends_at: Option<u64>,
  ) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::RootDataSet { .. })
      | Some(LocationEntry::Item { .. }) => {
        self.entries.push(LocationEntry::Sequence {
          tag,
          is_implicit_vr,
          ends_at,
          item_count: 0,
        });

        Ok(())
      }

      _ => Err(format!(
        "Sequence data element '{}' encountered outside of the root data \
         set or an item",
        dictionary::tag_with_name(
          tag,
          self.clarifying_elements().private_creator_for_tag(tag)
        )
      )),
    }
  }

  /// Pops the current sequence off this location, returning its tag.
  ///
  pub fn end_sequence(&mut self) -> Result<DataElementTag, String> {
    match self.entries.last() {
      Some(LocationEntry::Sequence { tag, .. }) => {
        let tag = *tag;
        self.entries.pop();
        Ok(tag)
      }

      _ => {
        Err("Sequence delimiter encountered outside of a sequence".to_string())
      }
    }
  }

  /// Pushes a new item onto this location, returning the item's index. The
  /// active clarifying data elements carry over as the item's initial
  /// state.
  ///
  pub fn add_item(
    &mut self,
    ends_at: Option<u64>,
    length: ValueLength,
  ) -> Result<usize, String> {
    let clarifying_elements = self.clarifying_elements().clone();

    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        let index = *item_count;
        *item_count += 1;

        self.entries.push(LocationEntry::Item {
          clarifying_elements,
          last_data_element_tag: DataElementTag::ZERO,
          ends_at,
        });

        Ok(index)
      }

      _ => Err(format!(
        "Item encountered outside of a sequence, length: {length}"
      )),
    }
  }

  /// Increments the item count of the current sequence and returns the new
  /// item's index. Encapsulated pixel data items are counted this way
  /// because they are never pushed as item entries.
  ///
  pub fn add_pixel_data_item(&mut self) -> Result<usize, String> {
    match self.entries.last_mut() {
      Some(LocationEntry::Sequence { item_count, .. }) => {
        let index = *item_count;
        *item_count += 1;
        Ok(index)
      }

      _ => {
        Err("Pixel data item encountered outside of a sequence".to_string())
      }
    }
  }

  /// Pops the current item off this location.
  ///
  pub fn end_item(&mut self) -> Result<(), String> {
    match self.entries.last() {
      Some(LocationEntry::Item { .. }) => {
        self.entries.pop();
        Ok(())
      }

      _ => Err("Item delimiter encountered outside of an item".to_string()),
    }
  }

  /// Returns the clarifying data elements that apply at the current
  /// location: the innermost item's, or the root data set's.
  ///
  fn clarifying_elements(&self) -> &ClarifyingElements {
    for entry in self.entries.iter().rev() {
      match entry {
        LocationEntry::RootDataSet {
          clarifying_elements,
          ..
        }
        | LocationEntry::Item {
          clarifying_elements,
          ..
        } => return clarifying_elements,

        _ => (),
      }
    }

    unreachable!();
  }

  fn clarifying_elements_mut(&mut self) -> &mut ClarifyingElements {
    for entry in self.entries.iter_mut().rev() {
      match entry {
        LocationEntry::RootDataSet {
          clarifying_elements,
          ..
        }
        | LocationEntry::Item {
          clarifying_elements,
          ..
        } => return clarifying_elements,

        _ => (),
      }
    }

    unreachable!();
  }

  /// Stores a clarifying data element's materialized value. The value bytes
  /// are only altered for *'(0008,0005) Specific Character Set'*, which is
  /// rewritten to declare UTF-8 since all emitted strings are UTF-8.
  ///
  pub fn add_clarifying_data_element(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    value_bytes: &mut RcBytes,
  ) -> Result<(), P10Error> {
    if tag == dictionary::SPECIFIC_CHARACTER_SET.tag {
      self.update_specific_character_set(value_bytes)?;
    } else if vr == ValueRepresentation::UnsignedShort {
      let bytes: &[u8] = value_bytes;
      if let Ok(bytes) = TryInto::<[u8; 2]>::try_into(bytes) {
        self.update_unsigned_short(tag, u16::from_le_bytes(bytes));
      }
    } else if vr == ValueRepresentation::LongString
      && tag.is_private_creator()
    {
      if let Ok(private_creator) = std::str::from_utf8(value_bytes) {
        self.clarifying_elements_mut().private_creators.insert(
          tag,
          private_creator.trim_end_matches(' ').to_string(),
        );
      }
    }

    Ok(())
  }

  fn update_specific_character_set(
    &mut self,
    value_bytes: &mut RcBytes,
  ) -> Result<(), P10Error> {
    let specific_character_set =
      std::str::from_utf8(value_bytes).map_err(|_| {
        P10Error::SpecificCharacterSetInvalid {
          specific_character_set: utils::inspect_u8_slice(value_bytes, 64),
          details: "Invalid UTF-8".to_string(),
        }
      })?;

    self.clarifying_elements_mut().specific_character_set =
      SpecificCharacterSet::from_string(specific_character_set).map_err(
        |details| P10Error::SpecificCharacterSetInvalid {
          specific_character_set: specific_character_set
            .chars()
            .take(64)
            .collect(),
          details,
        },
      )?;

    *value_bytes = b"ISO_IR 192".to_vec().into();

    Ok(())
  }

  fn update_unsigned_short(&mut self, tag: DataElementTag, value: u16) {
    let clarifying_elements = self.clarifying_elements_mut();

    if tag == dictionary::BITS_ALLOCATED.tag {
      clarifying_elements.bits_allocated = Some(value);
    } else if tag == dictionary::PIXEL_REPRESENTATION.tag {
      clarifying_elements.pixel_representation = Some(value);
    } else if tag == dictionary::WAVEFORM_BITS_STORED.tag {
      clarifying_elements.waveform_bits_stored = Some(value);
    } else if tag == dictionary::WAVEFORM_BITS_ALLOCATED.tag {
      clarifying_elements.waveform_bits_allocated = Some(value);
    }
  }

  /// Returns whether the active Specific Character Set is byte compatible
  /// with UTF-8.
  ///
  pub fn is_specific_character_set_utf8_compatible(&self) -> bool {
    self
      .clarifying_elements()
      .specific_character_set
      .is_utf8_compatible()
  }

  /// Decodes encoded string bytes with the active Specific Character Set,
  /// returning UTF-8 bytes padded to even length.
  ///
  pub fn decode_string_bytes(
    &self,
    vr: ValueRepresentation,
    value_bytes: &[u8],
  ) -> Vec<u8> {
    let string_type = match vr {
      ValueRepresentation::PersonName => StringType::PersonName,

      ValueRepresentation::LongString
      | ValueRepresentation::ShortString
      | ValueRepresentation::UnlimitedCharacters => StringType::MultiValue,

      _ => StringType::SingleValue,
    };

    let mut bytes = self
      .clarifying_elements()
      .specific_character_set
      .decode_bytes(value_bytes, string_type)
      .into_bytes();

    vr.pad_bytes_to_even_length(&mut bytes);

    bytes
  }

  /// Determines the VR of a data element read with the 'Implicit VR Little
  /// Endian' transfer syntax. Most tags have a single VR in the
  /// dictionary; tags that allow several VRs are resolved using the
  /// clarifying data elements. On failure, the tag of the clarifying data
  /// element that was missing or invalid is returned.
  ///
  pub fn infer_vr_for_tag(
    &self,
    tag: DataElementTag,
  ) -> Result<ValueRepresentation, DataElementTag> {
    let clarifying_elements = self.clarifying_elements();

    let allowed_vrs = match dictionary::find(
      tag,
      clarifying_elements.private_creator_for_tag(tag),
    ) {
      Ok(entry) => entry.vrs,
      Err(()) => &[],
    };

    match allowed_vrs {
      [vr] => Ok(*vr),

      // OB is not usable for '(7FE0,0010) Pixel Data' in an implicit VR
      // transfer syntax. Ref: PS3.5 8.2.
      [
        ValueRepresentation::OtherByteString,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::PIXEL_DATA.tag => {
        Ok(ValueRepresentation::OtherWordString)
      }

      // US/SS tags are resolved through '(0028,0103) Pixel Representation'
      [
        ValueRepresentation::UnsignedShort,
        ValueRepresentation::SignedShort,
      ] => match clarifying_elements.pixel_representation {
        Some(0) => Ok(ValueRepresentation::UnsignedShort),
        Some(1) => Ok(ValueRepresentation::SignedShort),
        _ => Err(dictionary::PIXEL_REPRESENTATION.tag),
      },

      // OB/OW waveform channel tags are resolved through '(003A,021A)
      // Waveform Bits Stored'
      [
        ValueRepresentation::OtherByteString,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::CHANNEL_MINIMUM_VALUE.tag
        || tag == dictionary::CHANNEL_MAXIMUM_VALUE.tag =>
      {
        match clarifying_elements.waveform_bits_stored {
          Some(8) => Ok(ValueRepresentation::OtherByteString),
          Some(16) => Ok(ValueRepresentation::OtherWordString),
          _ => Err(dictionary::WAVEFORM_BITS_STORED.tag),
        }
      }

      // OB/OW waveform data tags are resolved through '(5400,1004)
      // Waveform Bits Allocated'
      [
        ValueRepresentation::OtherByteString,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::WAVEFORM_PADDING_VALUE.tag
        || tag == dictionary::WAVEFORM_DATA.tag =>
      {
        match clarifying_elements.waveform_bits_allocated {
          Some(8) => Ok(ValueRepresentation::OtherByteString),
          Some(16) => Ok(ValueRepresentation::OtherWordString),
          _ => Err(dictionary::WAVEFORM_BITS_ALLOCATED.tag),
        }
      }

      // '(0028,3006) LUT Data' has the same binary form for both of its
      // VRs, and OW also covers tightly packed 8-bit entries.
      // Ref: PS3.3 C.11.1.1.1.
      [
        ValueRepresentation::UnsignedShort,
        ValueRepresentation::OtherWordString,
      ] if tag == dictionary::LUT_DATA.tag => {
        Ok(ValueRepresentation::OtherWordString)
      }

      // '(60xx,3000) Overlay Data' is always OW in an implicit VR transfer
      // syntax. Ref: PS3.5 8.1.2.
      [
        ValueRepresentation::OtherByteString,
        ValueRepresentation::OtherWordString,
      ] if (0x6000..=0x60FF).contains(&tag.group)
        && tag.element == 0x3000 =>
      {
        Ok(ValueRepresentation::OtherWordString)
      }

      _ => Ok(ValueRepresentation::Unknown),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_test() {
    let mut location = P10Location::new();

    assert!(
      location
        .check_data_element_ordering(DataElementTag::new(8, 0x20))
        .is_ok()
    );
    assert!(
      location
        .check_data_element_ordering(DataElementTag::new(8, 0x21))
        .is_ok()
    );
    assert!(
      location
        .check_data_element_ordering(DataElementTag::new(8, 0x21))
        .is_err()
    );
  }

  #[test]
  fn sequence_and_item_test() {
    let mut location = P10Location::new();

    assert!(
      location
        .add_sequence(DataElementTag::new(8, 0x1140), false, None)
        .is_ok()
    );
    assert_eq!(location.add_item(None, ValueLength::Undefined), Ok(0));
    assert_eq!(location.end_item(), Ok(()));
    assert_eq!(location.add_item(None, ValueLength::Undefined), Ok(1));
    assert_eq!(location.end_item(), Ok(()));
    assert_eq!(
      location.end_sequence(),
      Ok(DataElementTag::new(8, 0x1140))
    );

    assert!(location.end_sequence().is_err());
    assert!(location.end_item().is_err());
  }

  #[test]
  fn defined_length_delimiters_test() {
    let mut location = P10Location::new();

    location
      .add_sequence(DataElementTag::new(8, 0x1140), false, Some(100))
      .unwrap();
    location
      .add_item(Some(50), ValueLength::new(42))
      .unwrap();

    assert_eq!(location.next_delimiter_token(49), None);
    assert_eq!(
      location.next_delimiter_token(50),
      Some(P10Token::SequenceItemDelimiter)
    );
    assert_eq!(
      location.next_delimiter_token(100),
      Some(P10Token::SequenceDelimiter {
        tag: DataElementTag::new(8, 0x1140)
      })
    );
  }

  #[test]
  fn infer_vr_for_tag_test() {
    let mut location = P10Location::new();

    assert_eq!(
      location.infer_vr_for_tag(dictionary::ROWS.tag),
      Ok(ValueRepresentation::UnsignedShort)
    );

    assert_eq!(
      location.infer_vr_for_tag(dictionary::PIXEL_DATA.tag),
      Ok(ValueRepresentation::OtherWordString)
    );

    assert_eq!(
      location.infer_vr_for_tag(dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag),
      Err(dictionary::PIXEL_REPRESENTATION.tag)
    );

    location
      .add_clarifying_data_element(
        dictionary::PIXEL_REPRESENTATION.tag,
        ValueRepresentation::UnsignedShort,
        &mut vec![1, 0].into(),
      )
      .unwrap();

    assert_eq!(
      location.infer_vr_for_tag(dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag),
      Ok(ValueRepresentation::SignedShort)
    );

    assert_eq!(
      location.infer_vr_for_tag(DataElementTag::new(0x6002, 0x3000)),
      Ok(ValueRepresentation::OtherWordString)
    );

    assert_eq!(
      location.infer_vr_for_tag(DataElementTag::new(0x0099, 0x0001)),
      Ok(ValueRepresentation::Unknown)
    );
  }
}
