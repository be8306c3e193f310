//! A data element value that can hold any of the DICOM value
//! representations. Data element values are usually stored in a [`DataSet`]
//! that maps data element tags to values.

use byteorder::ByteOrder;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
  DataElementTag, DataError, DataSet, RcBytes, StructuredAge, StructuredDate,
  StructuredDateTime, StructuredPersonName, StructuredTime,
  ValueRepresentation, dictionary, utils,
};

pub mod age_string;
pub mod attribute_tag;
pub mod date;
pub mod date_time;
pub mod decimal_string;
pub mod integer_string;
pub mod person_name;
pub mod time;
pub mod unique_identifier;

/// A DICOM data element value holding one of the following kinds of data:
///
/// 1. **Binary value.** Raw bytes for a specific VR. This is the most common
///    case. String VRs hold UTF-8 encoded bytes, and binary data is always
///    little endian.
///
/// 2. **Lookup table descriptor value.** A six-byte value holding three
///    16-bit integers, where the first and last are unsigned and the middle
///    one's signedness follows the VR, which must be either
///    [`ValueRepresentation::SignedShort`] or
///    [`ValueRepresentation::UnsignedShort`].
///
/// 3. **Encapsulated pixel data value.** The raw items of an encapsulated
///    pixel data sequence: an optional Basic Offset Table item followed by
///    one or more fragments of encoded pixel data.
///
/// 4. **Sequence value.** A list of nested data sets.
///
/// Binary payloads are stored as [`RcBytes`] and parsed into a usable type
/// only on request, so non-conformant data can still be passed through
/// unaltered.
///
/// Ref: PS3.5 6.2.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DataElementValue(ValueKind);

#[derive(Clone, Debug, PartialEq)]
enum ValueKind {
  Binary {
    vr: ValueRepresentation,
    bytes: RcBytes,
  },
  LookupTableDescriptor {
    vr: ValueRepresentation,
    bytes: RcBytes,
  },
  EncapsulatedPixelData {
    vr: ValueRepresentation,
    items: Vec<RcBytes>,
  },
  Sequence {
    items: Vec<DataSet>,
  },
}

impl DataElementValue {
  /// Constructs a new binary data element value with the specified VR, which
  /// can be anything other than [`ValueRepresentation::Sequence`]. The bytes
  /// are validated against the VR's character repertoire and length
  /// requirements.
  ///
  pub fn new_binary(
    vr: ValueRepresentation,
    bytes: RcBytes,
  ) -> Result<Self, DataError> {
    if vr == ValueRepresentation::Sequence {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for binary data",
        vr
      )));
    }

    if vr.is_encoded_string() {
      if std::str::from_utf8(&bytes).is_err() {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' are not valid UTF-8",
          vr
        )));
      }
    } else if vr.is_string() {
      // Non-encoded string VRs are restricted to the default repertoire
      let invalid_byte = bytes.iter().find(|b| {
        !matches!(**b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x1B)
          && !(0x20..=0x7E).contains(*b)
      });

      if let Some(invalid_byte) = invalid_byte {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' have disallowed byte: 0x{:02X}",
          vr, invalid_byte
        )));
      }
    }

    let value = Self::new_binary_unchecked(vr, bytes);
    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new binary data element value without validating the VR or
  /// bytes.
  ///
  pub fn new_binary_unchecked(
    vr: ValueRepresentation,
    bytes: RcBytes,
  ) -> Self {
    Self(ValueKind::Binary { vr, bytes })
  }

  /// Constructs a new lookup table descriptor value. The VR must be
  /// [`ValueRepresentation::SignedShort`] or
  /// [`ValueRepresentation::UnsignedShort`], and there must be exactly six
  /// bytes.
  ///
  pub fn new_lookup_table_descriptor(
    vr: ValueRepresentation,
    bytes: RcBytes,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::SignedShort
      && vr != ValueRepresentation::UnsignedShort
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for lookup table descriptor \
         data",
        vr
      )));
    }

    let value = Self::new_lookup_table_descriptor_unchecked(vr, bytes);
    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new lookup table descriptor value without validating the
  /// VR or bytes.
  ///
  pub fn new_lookup_table_descriptor_unchecked(
    vr: ValueRepresentation,
    bytes: RcBytes,
  ) -> Self {
    Self(ValueKind::LookupTableDescriptor { vr, bytes })
  }

  /// Constructs a new encapsulated pixel data value. The VR must be
  /// [`ValueRepresentation::OtherByteString`] or
  /// [`ValueRepresentation::OtherWordString`], and every item must be of
  /// even length. The first item is the Basic Offset Table, which may be
  /// empty. Ref: PS3.5 A.4.
  ///
  pub fn new_encapsulated_pixel_data(
    vr: ValueRepresentation,
    items: Vec<RcBytes>,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::OtherByteString
      && vr != ValueRepresentation::OtherWordString
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for encapsulated pixel data",
        vr
      )));
    }

    let value = Self::new_encapsulated_pixel_data_unchecked(vr, items);
    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new encapsulated pixel data value without validating the
  /// VR or items.
  ///
  pub fn new_encapsulated_pixel_data_unchecked(
    vr: ValueRepresentation,
    items: Vec<RcBytes>,
  ) -> Self {
    Self(ValueKind::EncapsulatedPixelData { vr, items })
  }

  /// Creates a new `Sequence` data element value.
  ///
  pub fn new_sequence(items: Vec<DataSet>) -> Self {
    Self(ValueKind::Sequence { items })
  }

  /// Creates a new `AgeString` data element value.
  ///
  pub fn new_age_string(value: &StructuredAge) -> Result<Self, DataError> {
    Ok(Self::new_binary_unchecked(
      ValueRepresentation::AgeString,
      value.to_bytes()?.into(),
    ))
  }

  /// Creates a new `ApplicationEntity` data element value.
  ///
  pub fn new_application_entity(value: &str) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::ApplicationEntity,
      &[value.trim_matches(' ')],
    )
  }

  /// Creates a new `AttributeTag` data element value.
  ///
  pub fn new_attribute_tag(
    value: &[DataElementTag],
  ) -> Result<Self, DataError> {
    Self::new_binary(
      ValueRepresentation::AttributeTag,
      attribute_tag::to_bytes(value).into(),
    )
  }

  /// Creates a new `CodeString` data element value.
  ///
  pub fn new_code_string(value: &[&str]) -> Result<Self, DataError> {
    let value: Vec<&str> = value.iter().map(|s| s.trim_matches(' ')).collect();

    new_string_list(ValueRepresentation::CodeString, &value)
  }

  /// Creates a new `Date` data element value.
  ///
  pub fn new_date(value: &StructuredDate) -> Result<Self, DataError> {
    Ok(Self::new_binary_unchecked(
      ValueRepresentation::Date,
      value.to_bytes()?.into(),
    ))
  }

  /// Creates a new `DateTime` data element value.
  ///
  pub fn new_date_time(
    value: &StructuredDateTime,
  ) -> Result<Self, DataError> {
    Ok(Self::new_binary_unchecked(
      ValueRepresentation::DateTime,
      value.to_bytes()?.into(),
    ))
  }

  /// Creates a new `DecimalString` data element value.
  ///
  pub fn new_decimal_string(value: &[f64]) -> Result<Self, DataError> {
    Self::new_binary(
      ValueRepresentation::DecimalString,
      decimal_string::to_bytes(value).into(),
    )
  }

  /// Creates a new `FloatingPointDouble` data element value.
  ///
  pub fn new_floating_point_double(value: &[f64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_f64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointDouble, bytes.into())
  }

  /// Creates a new `FloatingPointSingle` data element value.
  ///
  pub fn new_floating_point_single(value: &[f32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_f32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointSingle, bytes.into())
  }

  /// Creates a new `IntegerString` data element value.
  ///
  pub fn new_integer_string(value: &[i32]) -> Result<Self, DataError> {
    Self::new_binary(
      ValueRepresentation::IntegerString,
      integer_string::to_bytes(value).into(),
    )
  }

  /// Creates a new `LongString` data element value.
  ///
  pub fn new_long_string(value: &[&str]) -> Result<Self, DataError> {
    let value: Vec<&str> = value.iter().map(|s| s.trim_matches(' ')).collect();

    new_string_list(ValueRepresentation::LongString, &value)
  }

  /// Creates a new `LongText` data element value.
  ///
  pub fn new_long_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::LongText, value)
  }

  /// Creates a new `OtherByteString` data element value.
  ///
  pub fn new_other_byte_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherByteString, value.into())
  }

  /// Creates a new `OtherDoubleString` data element value.
  ///
  pub fn new_other_double_string(value: &[f64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_f64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::OtherDoubleString, bytes.into())
  }

  /// Creates a new `OtherFloatString` data element value.
  ///
  pub fn new_other_float_string(value: &[f32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_f32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::OtherFloatString, bytes.into())
  }

  /// Creates a new `OtherLongString` data element value.
  ///
  pub fn new_other_long_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherLongString, value.into())
  }

  /// Creates a new `OtherVeryLongString` data element value.
  ///
  pub fn new_other_very_long_string(
    value: Vec<u8>,
  ) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherVeryLongString, value.into())
  }

  /// Creates a new `OtherWordString` data element value.
  ///
  pub fn new_other_word_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherWordString, value.into())
  }

  /// Creates a new `PersonName` data element value.
  ///
  pub fn new_person_name(
    value: &[StructuredPersonName],
  ) -> Result<Self, DataError> {
    Ok(Self::new_binary_unchecked(
      ValueRepresentation::PersonName,
      person_name::to_bytes(value)?.into(),
    ))
  }

  /// Creates a new `ShortString` data element value.
  ///
  pub fn new_short_string(value: &[&str]) -> Result<Self, DataError> {
    let value: Vec<&str> = value.iter().map(|s| s.trim_matches(' ')).collect();

    new_string_list(ValueRepresentation::ShortString, &value)
  }

  /// Creates a new `ShortText` data element value.
  ///
  pub fn new_short_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::ShortText, value)
  }

  /// Creates a new `SignedLong` data element value.
  ///
  pub fn new_signed_long(value: &[i32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_i32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedLong, bytes.into())
  }

  /// Creates a new `SignedShort` data element value.
  ///
  pub fn new_signed_short(value: &[i16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_i16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedShort, bytes.into())
  }

  /// Creates a new `SignedVeryLong` data element value.
  ///
  pub fn new_signed_very_long(value: &[i64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_i64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedVeryLong, bytes.into())
  }

  /// Creates a new `Time` data element value.
  ///
  pub fn new_time(value: &StructuredTime) -> Result<Self, DataError> {
    Ok(Self::new_binary_unchecked(
      ValueRepresentation::Time,
      value.to_bytes()?.into(),
    ))
  }

  /// Creates a new `UniqueIdentifier` data element value.
  ///
  pub fn new_unique_identifier(value: &[&str]) -> Result<Self, DataError> {
    Self::new_binary(
      ValueRepresentation::UniqueIdentifier,
      unique_identifier::to_bytes(value)?.into(),
    )
  }

  /// Creates a new `UniversalResourceIdentifier` data element value.
  ///
  pub fn new_universal_resource_identifier(
    value: &str,
  ) -> Result<Self, DataError> {
    new_text(
      ValueRepresentation::UniversalResourceIdentifier,
      value.trim_matches(' '),
    )
  }

  /// Creates a new `Unknown` data element value.
  ///
  pub fn new_unknown(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::Unknown, value.into())
  }

  /// Creates a new `UnlimitedCharacters` data element value.
  ///
  pub fn new_unlimited_characters(value: &[&str]) -> Result<Self, DataError> {
    let value: Vec<&str> =
      value.iter().map(|s| s.trim_end_matches(' ')).collect();

    new_string_list(ValueRepresentation::UnlimitedCharacters, &value)
  }

  /// Creates a new `UnlimitedText` data element value.
  ///
  pub fn new_unlimited_text(value: &str) -> Result<Self, DataError> {
    new_text(ValueRepresentation::UnlimitedText, value)
  }

  /// Creates a new `UnsignedLong` data element value.
  ///
  pub fn new_unsigned_long(value: &[u32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_u32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedLong, bytes.into())
  }

  /// Creates a new `UnsignedShort` data element value.
  ///
  pub fn new_unsigned_short(value: &[u16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_u16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedShort, bytes.into())
  }

  /// Creates a new `UnsignedVeryLong` data element value.
  ///
  pub fn new_unsigned_very_long(value: &[u64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_u64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedVeryLong, bytes.into())
  }

  /// Returns the value representation of a data element value.
  ///
  pub fn value_representation(&self) -> ValueRepresentation {
    match &self.0 {
      ValueKind::Binary { vr, .. }
      | ValueKind::LookupTableDescriptor { vr, .. }
      | ValueKind::EncapsulatedPixelData { vr, .. } => *vr,
      ValueKind::Sequence { .. } => ValueRepresentation::Sequence,
    }
  }

  /// For values that hold binary data, returns that data.
  ///
  pub fn bytes(&self) -> Result<&RcBytes, DataError> {
    match &self.0 {
      ValueKind::Binary { bytes, .. }
      | ValueKind::LookupTableDescriptor { bytes, .. } => Ok(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// For values that hold binary data, returns that data if the value's VR
  /// is one of the allowed VRs.
  ///
  pub fn vr_bytes(
    &self,
    allowed_vrs: &[ValueRepresentation],
  ) -> Result<&RcBytes, DataError> {
    if allowed_vrs.contains(&self.value_representation()) {
      self.bytes()
    } else {
      Err(DataError::new_value_not_present())
    }
  }

  /// For encapsulated pixel data values, returns the raw items.
  ///
  pub fn encapsulated_pixel_data(&self) -> Result<&Vec<RcBytes>, DataError> {
    match &self.0 {
      ValueKind::EncapsulatedPixelData { items, .. } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// For sequence values, returns the sequence's items.
  ///
  pub fn sequence_items(&self) -> Result<&[DataSet], DataError> {
    match &self.0 {
      ValueKind::Sequence { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// For sequence values, returns a mutable reference to the sequence's
  /// items.
  ///
  pub fn sequence_items_mut(&mut self) -> Result<&mut Vec<DataSet>, DataError> {
    match &mut self.0 {
      ValueKind::Sequence { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the size in bytes of a data element value, recursing through
  /// sequence items and including a fixed per-value overhead.
  ///
  pub fn total_byte_size(&self) -> u64 {
    let data_size = match &self.0 {
      ValueKind::Binary { bytes, .. }
      | ValueKind::LookupTableDescriptor { bytes, .. } => bytes.len() as u64,

      ValueKind::EncapsulatedPixelData { items, .. } => {
        items.iter().fold(0, |acc, item| acc + 8 + item.len() as u64)
      }

      ValueKind::Sequence { items } => items
        .iter()
        .fold(0, |acc, item| acc + item.total_byte_size()),
    };

    data_size + core::mem::size_of::<Self>() as u64
  }

  /// Returns the string contained in a data element value. Supported for
  /// string VRs without multiplicity, and for string VRs with multiplicity
  /// when exactly one value is present.
  ///
  pub fn get_string(&self) -> Result<&str, DataError> {
    match &self.0 {
      ValueKind::Binary { vr, bytes }
        if matches!(
          vr,
          ValueRepresentation::ApplicationEntity
            | ValueRepresentation::LongText
            | ValueRepresentation::ShortText
            | ValueRepresentation::UniversalResourceIdentifier
            | ValueRepresentation::UnlimitedText
        ) =>
      {
        let string = std::str::from_utf8(bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let string = match vr {
          ValueRepresentation::ApplicationEntity
          | ValueRepresentation::UniversalResourceIdentifier => {
            string.trim_matches(' ')
          }
          _ => string.trim_end_matches(' '),
        };

        Ok(string)
      }

      _ => match self.get_strings()?.as_slice() {
        [s] => Ok(s),
        _ => Err(DataError::new_multiplicity_mismatch()),
      },
    }
  }

  /// Returns the strings contained in a data element value. Supported for
  /// string VRs that allow multiplicity.
  ///
  pub fn get_strings(&self) -> Result<Vec<&str>, DataError> {
    match &self.0 {
      ValueKind::Binary { vr, bytes }
        if matches!(
          vr,
          ValueRepresentation::CodeString
            | ValueRepresentation::UniqueIdentifier
            | ValueRepresentation::LongString
            | ValueRepresentation::ShortString
            | ValueRepresentation::UnlimitedCharacters
        ) =>
      {
        let string = std::str::from_utf8(bytes).map_err(|_| {
          DataError::new_value_invalid(
            "String bytes are not valid UTF-8".to_string(),
          )
        })?;

        let strings = string
          .split('\\')
          .map(|s| match vr {
            ValueRepresentation::UniqueIdentifier => s.trim_end_matches('\0'),
            ValueRepresentation::UnlimitedCharacters => {
              s.trim_end_matches(' ')
            }
            _ => utils::trim_end_padding(s).trim_start_matches(' '),
          })
          .collect();

        Ok(strings)
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the integer contained in a data element value when exactly one
  /// integer is present.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<T, DataError> {
    match self.get_ints()?.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the integers contained in a data element value. Supported for
  /// the IS, SL, SS, UL, and US VRs, and for lookup table descriptors.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    match &self.0 {
      ValueKind::Binary { vr, bytes } => match vr {
        ValueRepresentation::IntegerString => integer_string::from_bytes(bytes)?
          .into_iter()
          .map(|i| convert_int(i64::from(i)))
          .collect(),

        ValueRepresentation::SignedLong => {
          decode_ints(bytes, 4, "Int32", |b| {
            i64::from(byteorder::LittleEndian::read_i32(b))
          })
        }

        ValueRepresentation::SignedShort => {
          decode_ints(bytes, 2, "Int16", |b| {
            i64::from(byteorder::LittleEndian::read_i16(b))
          })
        }

        ValueRepresentation::UnsignedLong => {
          decode_ints(bytes, 4, "Uint32", |b| {
            i64::from(byteorder::LittleEndian::read_u32(b))
          })
        }

        ValueRepresentation::UnsignedShort => {
          decode_ints(bytes, 2, "Uint16", |b| {
            i64::from(byteorder::LittleEndian::read_u16(b))
          })
        }

        _ => Err(DataError::new_value_not_present()),
      },

      ValueKind::LookupTableDescriptor { .. } => {
        let (entry_count, first_input_value, bits_per_entry) =
          self.get_lookup_table_descriptor()?;

        Ok(vec![
          convert_int(i64::from(entry_count))?,
          convert_int(i64::from(first_input_value))?,
          convert_int(i64::from(bits_per_entry))?,
        ])
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the three integers contained in a lookup table descriptor data
  /// element value.
  ///
  pub fn get_lookup_table_descriptor(
    &self,
  ) -> Result<(u16, i32, u16), DataError> {
    match &self.0 {
      ValueKind::LookupTableDescriptor { vr, bytes }
        if bytes.len() == 6
          && (*vr == ValueRepresentation::SignedShort
            || *vr == ValueRepresentation::UnsignedShort) =>
      {
        let entry_count = byteorder::LittleEndian::read_u16(&bytes[0..2]);

        // The VR determines the signedness of the second 16-bit integer
        let first_input_value: i32 = if *vr == ValueRepresentation::SignedShort
        {
          byteorder::LittleEndian::read_i16(&bytes[2..4]).into()
        } else {
          byteorder::LittleEndian::read_u16(&bytes[2..4]).into()
        };

        let bits_per_entry = byteorder::LittleEndian::read_u16(&bytes[4..6]);

        Ok((entry_count, first_input_value, bits_per_entry))
      }

      ValueKind::LookupTableDescriptor { .. } => Err(
        DataError::new_value_invalid(
          "Invalid lookup table descriptor".to_string(),
        ),
      ),

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the big integer contained in a data element value when exactly
  /// one big integer is present.
  ///
  pub fn get_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<T, DataError> {
    match self.get_big_ints()?.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the big integers contained in a data element value. Supported
  /// for the SV and UV VRs.
  ///
  pub fn get_big_ints<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    fn convert<T: num_traits::PrimInt + TryFrom<i128>>(
      i: i128,
    ) -> Result<T, DataError> {
      T::try_from(i).map_err(|_| {
        DataError::new_value_invalid(format!(
          "Value '{}' is out of range for the target integer type",
          i
        ))
      })
    }

    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::SignedVeryLong,
        bytes,
      } => {
        if bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Int64 data".to_string(),
          ));
        }

        bytes
          .chunks_exact(8)
          .map(|b| convert(i128::from(byteorder::LittleEndian::read_i64(b))))
          .collect()
      }

      ValueKind::Binary {
        vr: ValueRepresentation::UnsignedVeryLong,
        bytes,
      } => {
        if bytes.len() % 8 != 0 {
          return Err(DataError::new_value_invalid(
            "Invalid Uint64 data".to_string(),
          ));
        }

        bytes
          .chunks_exact(8)
          .map(|b| convert(i128::from(byteorder::LittleEndian::read_u64(b))))
          .collect()
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the float contained in a data element value when exactly one
  /// float is present.
  ///
  pub fn get_float(&self) -> Result<f64, DataError> {
    match self.get_floats()?.as_slice() {
      [f] => Ok(*f),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the floats contained in a data element value. Supported for
  /// the DS, FD, FL, OD, and OF VRs.
  ///
  pub fn get_floats(&self) -> Result<Vec<f64>, DataError> {
    match &self.0 {
      ValueKind::Binary { vr, bytes } => match vr {
        ValueRepresentation::DecimalString => decimal_string::from_bytes(bytes),

        ValueRepresentation::FloatingPointDouble
        | ValueRepresentation::OtherDoubleString => {
          if bytes.len() % 8 != 0 {
            return Err(DataError::new_value_invalid(
              "Invalid Float64 data".to_string(),
            ));
          }

          Ok(
            bytes
              .chunks_exact(8)
              .map(byteorder::LittleEndian::read_f64)
              .collect(),
          )
        }

        ValueRepresentation::FloatingPointSingle
        | ValueRepresentation::OtherFloatString => {
          if bytes.len() % 4 != 0 {
            return Err(DataError::new_value_invalid(
              "Invalid Float32 data".to_string(),
            ));
          }

          Ok(
            bytes
              .chunks_exact(4)
              .map(|b| f64::from(byteorder::LittleEndian::read_f32(b)))
              .collect(),
          )
        }

        _ => Err(DataError::new_value_not_present()),
      },

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured age contained in an `AgeString` value.
  ///
  pub fn get_age(&self) -> Result<StructuredAge, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::AgeString,
        bytes,
      } => StructuredAge::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the data element tags contained in an `AttributeTag` value.
  ///
  pub fn get_attribute_tags(&self) -> Result<Vec<DataElementTag>, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::AttributeTag,
        bytes,
      } => attribute_tag::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured date contained in a `Date` value.
  ///
  pub fn get_date(&self) -> Result<StructuredDate, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::Date,
        bytes,
      } => StructuredDate::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured date/time contained in a `DateTime` value.
  ///
  pub fn get_date_time(&self) -> Result<StructuredDateTime, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::DateTime,
        bytes,
      } => StructuredDateTime::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured time contained in a `Time` value.
  ///
  pub fn get_time(&self) -> Result<StructuredTime, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::Time,
        bytes,
      } => StructuredTime::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the structured person name contained in a `PersonName` value
  /// when exactly one person name is present.
  ///
  pub fn get_person_name(&self) -> Result<StructuredPersonName, DataError> {
    match self.get_person_names()?.as_slice() {
      [name] => Ok(name.clone()),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the structured person names contained in a `PersonName` value.
  ///
  pub fn get_person_names(
    &self,
  ) -> Result<Vec<StructuredPersonName>, DataError> {
    match &self.0 {
      ValueKind::Binary {
        vr: ValueRepresentation::PersonName,
        bytes,
      } => person_name::from_bytes(bytes),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Checks that the number of bytes stored in a data element value is valid
  /// for its value representation.
  ///
  pub fn validate_length(&self) -> Result<(), DataError> {
    match &self.0 {
      ValueKind::LookupTableDescriptor { vr, bytes } => {
        if bytes.len() != 6 {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            "Lookup table descriptor length must be exactly 6 bytes"
              .to_string(),
          ));
        }
      }

      ValueKind::Binary { vr, bytes } => {
        let requirements = vr.length_requirements();
        let bytes_multiple_of = requirements.bytes_multiple_of.unwrap_or(2);

        if bytes.len() > requirements.bytes_max {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            format!("Must not exceed {} bytes", requirements.bytes_max),
          ));
        }

        if bytes.len() % bytes_multiple_of != 0 {
          return Err(DataError::new_value_length_invalid(
            *vr,
            bytes.len() as u64,
            format!("Must be a multiple of {} bytes", bytes_multiple_of),
          ));
        }
      }

      ValueKind::EncapsulatedPixelData { vr, items } => {
        for item in items {
          if item.len() > 0xFFFFFFFE {
            return Err(DataError::new_value_length_invalid(
              *vr,
              item.len() as u64,
              format!("Must not exceed {} bytes", 0xFFFFFFFEu32),
            ));
          }

          if item.len() % 2 != 0 {
            return Err(DataError::new_value_length_invalid(
              *vr,
              item.len() as u64,
              "Must be a multiple of 2 bytes".to_string(),
            ));
          }
        }
      }

      ValueKind::Sequence { .. } => (),
    };

    Ok(())
  }

  /// Formats a data element value as a human-readable single line of text.
  /// Values longer than the output width are truncated with a trailing
  /// ellipsis.
  ///
  pub fn to_string(&self, output_width: usize) -> String {
    // Maximum number of items needed in a comma-separated list of values
    // before the output width is reached
    let max_list_size = output_width.div_ceil(3);

    let (formatted, suffix) = match &self.0 {
      ValueKind::Binary { vr, bytes } if vr.is_string() => {
        match std::str::from_utf8(bytes) {
          Ok(value) => {
            let formatted = format_string_value(*vr, bytes, value);

            // Append a descriptive suffix for recognized UIDs
            let suffix = if *vr == ValueRepresentation::UniqueIdentifier {
              dictionary::uid_name(value.trim_end_matches('\0'))
                .ok()
                .map(|name| format!(" ({})", name))
            } else {
              None
            };

            (formatted, suffix)
          }

          Err(_) => ("!! Invalid UTF-8 data".to_string(), None),
        }
      }

      ValueKind::Binary { vr, bytes }
      | ValueKind::LookupTableDescriptor { vr, bytes } => {
        let formatted = match vr {
          ValueRepresentation::AttributeTag => {
            match attribute_tag::from_bytes(bytes) {
              Ok(tags) => join_list(
                tags.iter().map(|tag| tag.to_string()),
                max_list_size,
              ),
              Err(_) => "<error converting to string>".to_string(),
            }
          }

          ValueRepresentation::FloatingPointDouble
          | ValueRepresentation::FloatingPointSingle => {
            match self.get_floats() {
              Ok(floats) => join_list(
                floats.iter().map(|f| {
                  if *f == f64::INFINITY {
                    "Infinity".to_string()
                  } else if *f == f64::NEG_INFINITY {
                    "-Infinity".to_string()
                  } else {
                    format!("{:?}", f)
                  }
                }),
                max_list_size,
              ),
              Err(_) => "<error converting to string>".to_string(),
            }
          }

          ValueRepresentation::SignedLong
          | ValueRepresentation::SignedShort
          | ValueRepresentation::UnsignedLong
          | ValueRepresentation::UnsignedShort => {
            match self.get_ints::<i64>() {
              Ok(ints) => {
                join_list(ints.iter().map(|i| i.to_string()), max_list_size)
              }
              Err(_) => "<error converting to string>".to_string(),
            }
          }

          ValueRepresentation::SignedVeryLong
          | ValueRepresentation::UnsignedVeryLong => {
            match self.get_big_ints::<i128>() {
              Ok(ints) => {
                join_list(ints.iter().map(|i| i.to_string()), max_list_size)
              }
              Err(_) => "<error converting to string>".to_string(),
            }
          }

          _ => utils::inspect_u8_slice(bytes, max_list_size),
        };

        (formatted, None)
      }

      ValueKind::EncapsulatedPixelData { items, .. } => {
        let total_size: usize = items.iter().map(|item| item.len()).sum();

        (
          format!("Items: {}, bytes: {}", items.len(), total_size),
          None,
        )
      }

      ValueKind::Sequence { items } => {
        (format!("Items: {}", items.len()), None)
      }
    };

    let suffix = suffix.unwrap_or_default();

    // Width available to the value once the suffix is taken into account,
    // with a floor of ten characters
    let output_width =
      core::cmp::max(output_width.saturating_sub(suffix.len()), 10);

    if formatted.len() > output_width {
      let graphemes =
        UnicodeSegmentation::graphemes(formatted.as_str(), true)
          .collect::<Vec<&str>>();

      if graphemes.len() > output_width {
        return format!(
          "{} …{}",
          graphemes[0..output_width - 2].join(""),
          suffix
        );
      }
    }

    format!("{}{}", formatted, suffix)
  }
}

/// Formats the preview of a string-VR value that parsed as UTF-8.
///
fn format_string_value(
  vr: ValueRepresentation,
  bytes: &[u8],
  value: &str,
) -> String {
  match vr {
    ValueRepresentation::AgeString => StructuredAge::from_bytes(bytes)
      .map(|age| age.to_string())
      .unwrap_or_else(|_| format!("{:?}", value)),

    ValueRepresentation::Date => StructuredDate::from_bytes(bytes)
      .map(|date| date.to_iso8601())
      .unwrap_or_else(|_| format!("{:?}", value)),

    ValueRepresentation::DateTime => StructuredDateTime::from_bytes(bytes)
      .map(|date_time| date_time.to_iso8601())
      .unwrap_or_else(|_| format!("{:?}", value)),

    ValueRepresentation::Time => StructuredTime::from_bytes(bytes)
      .map(|time| time.to_iso8601())
      .unwrap_or_else(|_| format!("{:?}", value)),

    // String VRs that allow multiplicity
    ValueRepresentation::CodeString
    | ValueRepresentation::DecimalString
    | ValueRepresentation::IntegerString
    | ValueRepresentation::LongString
    | ValueRepresentation::ShortString
    | ValueRepresentation::UniqueIdentifier
    | ValueRepresentation::UnlimitedCharacters => value
      .split('\\')
      .map(|s| match vr {
        ValueRepresentation::UniqueIdentifier => {
          format!("{:?}", s.trim_end_matches('\0'))
        }
        ValueRepresentation::UnlimitedCharacters => {
          format!("{:?}", s.trim_end_matches(' '))
        }
        _ => format!("{:?}", s.trim_matches(' ')),
      })
      .collect::<Vec<String>>()
      .join(", "),

    ValueRepresentation::ApplicationEntity => {
      format!("{:?}", value.trim_matches(' '))
    }

    _ => format!("{:?}", value.trim_end_matches(' ')),
  }
}

fn join_list(
  items: impl Iterator<Item = String>,
  max_list_size: usize,
) -> String {
  items.take(max_list_size).collect::<Vec<String>>().join(", ")
}

fn convert_int<T: num_traits::PrimInt + TryFrom<i64>>(
  i: i64,
) -> Result<T, DataError> {
  T::try_from(i).map_err(|_| {
    DataError::new_value_invalid(format!(
      "Value '{}' is out of range for the target integer type",
      i
    ))
  })
}

fn decode_ints<T: num_traits::PrimInt + TryFrom<i64>>(
  bytes: &[u8],
  word_size: usize,
  type_name: &str,
  read: fn(&[u8]) -> i64,
) -> Result<Vec<T>, DataError> {
  if bytes.len() % word_size != 0 {
    return Err(DataError::new_value_invalid(format!(
      "Invalid {} data",
      type_name
    )));
  }

  bytes
    .chunks_exact(word_size)
    .map(|b| convert_int(read(b)))
    .collect()
}

/// Creates a data element value containing a multi-valued string. The
/// individual values are validated and then joined with backslashes.
///
fn new_string_list(
  vr: ValueRepresentation,
  value: &[&str],
) -> Result<DataElementValue, DataError> {
  let string_characters_max = vr
    .length_requirements()
    .string_characters_max
    .unwrap_or(0xFFFFFFFE);

  for s in value {
    if s.len() > string_characters_max {
      return Err(DataError::new_value_invalid(format!(
        "String list item is longer than the max length of {}",
        string_characters_max
      )));
    }

    if s.contains('\\') {
      return Err(DataError::new_value_invalid(
        "String list item contains backslashes".to_string(),
      ));
    }
  }

  let mut bytes = value.join("\\").into_bytes();
  vr.pad_bytes_to_even_length(&mut bytes);

  DataElementValue::new_binary(vr, bytes.into())
}

/// Creates a data element value for a single-valued text VR.
///
fn new_text(
  vr: ValueRepresentation,
  value: &str,
) -> Result<DataElementValue, DataError> {
  let mut bytes = value.trim_end_matches(' ').to_string().into_bytes();
  vr.pad_bytes_to_even_length(&mut bytes);

  DataElementValue::new_binary(vr, bytes.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn value_representation_test() {
    assert_eq!(
      DataElementValue::new_long_string(&["123"])
        .unwrap()
        .value_representation(),
      ValueRepresentation::LongString
    );

    assert_eq!(
      DataElementValue::new_sequence(vec![]).value_representation(),
      ValueRepresentation::Sequence
    );

    assert_eq!(
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherWordString,
        vec![]
      )
      .value_representation(),
      ValueRepresentation::OtherWordString
    );
  }

  #[test]
  fn new_binary_test() {
    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::Sequence,
        RcBytes::empty()
      )
      .is_err()
    );

    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::ShortText,
        vec![0xD0].into()
      )
      .is_err()
    );

    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::CodeString,
        vec![0xD0, 0x20].into()
      )
      .is_err()
    );

    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::UnsignedShort,
        vec![0, 1].into()
      )
      .is_ok()
    );

    assert_eq!(
      DataElementValue::new_binary(
        ValueRepresentation::UnsignedShort,
        vec![0].into()
      ),
      Err(DataError::new_value_length_invalid(
        ValueRepresentation::UnsignedShort,
        1,
        "Must be a multiple of 2 bytes".to_string()
      ))
    );
  }

  #[test]
  fn get_string_test() {
    assert_eq!(
      DataElementValue::new_long_text("A").unwrap().get_string(),
      Ok("A")
    );

    assert_eq!(
      DataElementValue::new_long_string(&["A"])
        .unwrap()
        .get_string(),
      Ok("A")
    );

    assert_eq!(
      DataElementValue::new_long_string(&["A", "B"])
        .unwrap()
        .get_string(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[1])
        .unwrap()
        .get_string(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_strings_test() {
    assert_eq!(
      DataElementValue::new_code_string(&["A", "B"])
        .unwrap()
        .get_strings(),
      Ok(vec!["A", "B"])
    );

    assert_eq!(
      DataElementValue::new_unique_identifier(&["1.2", "3.4"])
        .unwrap()
        .get_strings(),
      Ok(vec!["1.2", "3.4"])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::ShortString,
        vec![0xD0].into()
      )
      .get_strings(),
      Err(DataError::new_value_invalid(
        "String bytes are not valid UTF-8".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_long_text("A").unwrap().get_strings(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_int_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::IntegerString,
        b"  123   ".to_vec().into()
      )
      .get_int(),
      Ok(123)
    );

    assert_eq!(
      DataElementValue::new_unsigned_long(&[1234])
        .unwrap()
        .get_int(),
      Ok(1234)
    );

    assert_eq!(
      DataElementValue::new_unsigned_long(&[123, 456])
        .unwrap()
        .get_int::<i32>(),
      Err(DataError::new_multiplicity_mismatch())
    );

    assert_eq!(
      DataElementValue::new_long_text("123")
        .unwrap()
        .get_int::<i32>(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn get_ints_test() {
    assert_eq!(
      DataElementValue::new_signed_long(&[i32::MIN, i32::MAX])
        .unwrap()
        .get_ints::<i32>(),
      Ok(vec![i32::MIN, i32::MAX])
    );

    assert_eq!(
      DataElementValue::new_signed_short(&[-2, 3])
        .unwrap()
        .get_ints::<i16>(),
      Ok(vec![-2, 3])
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[u16::MAX])
        .unwrap()
        .get_ints::<u16>(),
      Ok(vec![u16::MAX])
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::SignedLong,
        vec![0].into()
      )
      .get_ints::<i32>(),
      Err(DataError::new_value_invalid(
        "Invalid Int32 data".to_string()
      ))
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[256])
        .unwrap()
        .get_ints::<u8>(),
      Err(DataError::new_value_invalid(
        "Value '256' is out of range for the target integer type".to_string()
      ))
    );
  }

  #[test]
  fn get_lookup_table_descriptor_test() {
    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::SignedShort,
        vec![0x34, 0x12, 0x00, 0x80, 0x78, 0x56].into()
      )
      .get_ints(),
      Ok(vec![0x1234, -0x8000, 0x5678])
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0x34, 0x12, 0x00, 0x80, 0x78, 0x56].into()
      )
      .get_ints(),
      Ok(vec![0x1234, 0x8000, 0x5678])
    );

    assert_eq!(
      DataElementValue::new_lookup_table_descriptor_unchecked(
        ValueRepresentation::UnsignedShort,
        vec![0, 0, 0, 0].into()
      )
      .get_ints::<i32>(),
      Err(DataError::new_value_invalid(
        "Invalid lookup table descriptor".to_string()
      ))
    );
  }

  #[test]
  fn get_big_ints_test() {
    assert_eq!(
      DataElementValue::new_signed_very_long(&[i64::MIN, i64::MAX])
        .unwrap()
        .get_big_ints::<i64>(),
      Ok(vec![i64::MIN, i64::MAX])
    );

    assert_eq!(
      DataElementValue::new_unsigned_very_long(&[u64::MAX])
        .unwrap()
        .get_big_int::<u64>(),
      Ok(u64::MAX)
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::SignedVeryLong,
        vec![0].into()
      )
      .get_big_ints::<i64>(),
      Err(DataError::new_value_invalid(
        "Invalid Int64 data".to_string()
      ))
    );
  }

  #[test]
  fn get_floats_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::DecimalString,
        b" 1.2  \\3.4".to_vec().into()
      )
      .get_floats(),
      Ok(vec![1.2, 3.4])
    );

    assert_eq!(
      DataElementValue::new_floating_point_double(&[1.0, 2.0])
        .unwrap()
        .get_floats(),
      Ok(vec![1.0, 2.0])
    );

    assert_eq!(
      DataElementValue::new_floating_point_single(&[f32::INFINITY])
        .unwrap()
        .get_float(),
      Ok(f64::INFINITY)
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::FloatingPointDouble,
        vec![0, 0, 0, 0].into()
      )
      .get_floats(),
      Err(DataError::new_value_invalid(
        "Invalid Float64 data".to_string()
      ))
    );
  }

  #[test]
  fn get_structured_values_test() {
    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::AgeString,
        b"001D".to_vec().into()
      )
      .get_age(),
      Ok(StructuredAge {
        number: 1,
        unit: crate::AgeUnit::Days
      })
    );

    assert_eq!(
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::Date,
        b"20240702".to_vec().into()
      )
      .get_date(),
      Ok(StructuredDate {
        year: 2024,
        month: 7,
        day: 2
      })
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[1]).unwrap().get_age(),
      Err(DataError::new_value_not_present())
    );
  }

  #[test]
  fn to_string_test() {
    assert_eq!(
      DataElementValue::new_code_string(&["DERIVED", "PRIMARY"])
        .unwrap()
        .to_string(80),
      "\"DERIVED\", \"PRIMARY\""
    );

    assert_eq!(
      DataElementValue::new_unique_identifier(&["1.2.840.10008.1.2.1"])
        .unwrap()
        .to_string(80),
      "\"1.2.840.10008.1.2.1\" (Explicit VR Little Endian)"
    );

    assert_eq!(
      DataElementValue::new_unsigned_short(&[10, 20])
        .unwrap()
        .to_string(80),
      "10, 20"
    );

    assert_eq!(
      DataElementValue::new_sequence(vec![])
        .to_string(80),
      "Items: 0"
    );

    assert_eq!(
      DataElementValue::new_other_byte_string(vec![0x1A, 0x2B])
        .unwrap()
        .to_string(80),
      "[1A 2B]"
    );
  }
}
