//! A DICOM data set: an ordered mapping of data element tags to data element
//! values.

pub mod print;

use std::collections::BTreeMap;

use crate::data_element_value::{age_string, person_name};
use crate::data_set_path::DataSetPathEntry;
use crate::{
  DataElementTag, DataElementValue, DataError, DataSetPath, RcBytes,
  StructuredAge, StructuredDate, StructuredDateTime, StructuredTime,
  TransferSyntax, ValueRepresentation, dictionary,
};

use print::DataSetPrintOptions;

/// A DICOM data set that maps data element tags to data element values,
/// ordered by tag.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet(BTreeMap<DataElementTag, DataElementValue>);

/// The result of looking up a [`DataSetPath`] in a data set: either a data
/// element value or a nested data set (a sequence item or the root).
///
#[derive(Clone, Copy)]
enum LookupResult<'a> {
  Value(&'a DataElementValue),
  DataSet(&'a DataSet),
}

impl DataSet {
  /// Returns a new empty data set.
  ///
  pub fn new() -> Self {
    Self(BTreeMap::new())
  }

  /// Returns the number of data elements in a data set.
  ///
  pub fn size(&self) -> usize {
    self.0.len()
  }

  /// Returns whether a data set contains no data elements.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns whether a data element with the given tag exists in a data set.
  ///
  pub fn has(&self, tag: DataElementTag) -> bool {
    self.0.contains_key(&tag)
  }

  /// Inserts a data element tag and value into a data set, replacing any
  /// existing value for the tag.
  ///
  pub fn insert(&mut self, tag: DataElementTag, value: DataElementValue) {
    self.0.insert(tag, value);
  }

  /// Inserts a new binary value into a data set.
  ///
  pub fn insert_binary_value(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: RcBytes,
  ) -> Result<(), DataError> {
    self.insert(tag, DataElementValue::new_binary(vr, bytes)?);

    Ok(())
  }

  /// Inserts a data element with an age value. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_age_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &StructuredAge,
  ) -> Result<(), DataError> {
    let value = match entry.vrs {
      [ValueRepresentation::AgeString] => {
        DataElementValue::new_age_string(value)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with attribute tag values. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_attribute_tag_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[DataElementTag],
  ) -> Result<(), DataError> {
    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let value = match entry.vrs {
      [ValueRepresentation::AttributeTag] => {
        DataElementValue::new_attribute_tag(value)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with a date value. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_date_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &StructuredDate,
  ) -> Result<(), DataError> {
    let value = match entry.vrs {
      [ValueRepresentation::Date] => DataElementValue::new_date(value),
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with a date/time value. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_date_time_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &StructuredDateTime,
  ) -> Result<(), DataError> {
    let value = match entry.vrs {
      [ValueRepresentation::DateTime] => {
        DataElementValue::new_date_time(value)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with a time value. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_time_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &StructuredTime,
  ) -> Result<(), DataError> {
    let value = match entry.vrs {
      [ValueRepresentation::Time] => DataElementValue::new_time(value),
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with float values, choosing the construction
  /// matching the dictionary entry's VR.
  ///
  pub fn insert_float_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[f64],
  ) -> Result<(), DataError> {
    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let singles: Vec<f32> = value.iter().map(|f| *f as f32).collect();

    let value = match entry.vrs {
      [ValueRepresentation::DecimalString] => {
        DataElementValue::new_decimal_string(value)
      }
      [ValueRepresentation::FloatingPointDouble] => {
        DataElementValue::new_floating_point_double(value)
      }
      [ValueRepresentation::FloatingPointSingle] => {
        DataElementValue::new_floating_point_single(&singles)
      }
      [ValueRepresentation::OtherDoubleString] => {
        DataElementValue::new_other_double_string(value)
      }
      [ValueRepresentation::OtherFloatString] => {
        DataElementValue::new_other_float_string(&singles)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with integer values, choosing the construction
  /// matching the dictionary entry's VR.
  ///
  pub fn insert_int_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[i64],
  ) -> Result<(), DataError> {
    fn convert_all<T: TryFrom<i64>>(
      value: &[i64],
      vr: ValueRepresentation,
    ) -> Result<Vec<T>, DataError> {
      value
        .iter()
        .map(|i| {
          T::try_from(*i).map_err(|_| {
            DataError::new_value_invalid(format!(
              "Value {} is out of range for the {} VR",
              i, vr
            ))
          })
        })
        .collect()
    }

    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let value = match entry.vrs {
      [vr @ ValueRepresentation::IntegerString] => {
        DataElementValue::new_integer_string(&convert_all(value, *vr)?)
      }
      [vr @ ValueRepresentation::SignedLong] => {
        DataElementValue::new_signed_long(&convert_all(value, *vr)?)
      }
      [vr @ ValueRepresentation::SignedShort] => {
        DataElementValue::new_signed_short(&convert_all(value, *vr)?)
      }
      [vr @ ValueRepresentation::UnsignedLong] => {
        DataElementValue::new_unsigned_long(&convert_all(value, *vr)?)
      }
      [vr @ ValueRepresentation::UnsignedShort] => {
        DataElementValue::new_unsigned_short(&convert_all(value, *vr)?)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with 64-bit integer values, choosing the
  /// construction matching the dictionary entry's VR.
  ///
  pub fn insert_big_int_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[i128],
  ) -> Result<(), DataError> {
    fn convert_all<T: TryFrom<i128>>(
      value: &[i128],
      vr: ValueRepresentation,
    ) -> Result<Vec<T>, DataError> {
      value
        .iter()
        .map(|i| {
          T::try_from(*i).map_err(|_| {
            DataError::new_value_invalid(format!(
              "Value {} is out of range for the {} VR",
              i, vr
            ))
          })
        })
        .collect()
    }

    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let value = match entry.vrs {
      [vr @ ValueRepresentation::SignedVeryLong] => {
        DataElementValue::new_signed_very_long(&convert_all(value, *vr)?)
      }
      [vr @ ValueRepresentation::UnsignedVeryLong] => {
        DataElementValue::new_unsigned_very_long(&convert_all(value, *vr)?)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with person name values. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_person_name_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[person_name::StructuredPersonName],
  ) -> Result<(), DataError> {
    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let value = match entry.vrs {
      [ValueRepresentation::PersonName] => {
        DataElementValue::new_person_name(value)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with a sequence value. The data element is
  /// referenced through its dictionary entry.
  ///
  pub fn insert_sequence_value(
    &mut self,
    entry: &dictionary::Entry,
    items: Vec<Self>,
  ) -> Result<(), DataError> {
    let value = match entry.vrs {
      [ValueRepresentation::Sequence] => {
        Ok(DataElementValue::new_sequence(items))
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Inserts a data element with string values, choosing the construction
  /// matching the dictionary entry's VR.
  ///
  pub fn insert_string_value(
    &mut self,
    entry: &dictionary::Entry,
    value: &[&str],
  ) -> Result<(), DataError> {
    if !entry.multiplicity.contains(value.len()) {
      return invalid_insert_error(entry);
    }

    let value = match (entry.vrs, value) {
      ([ValueRepresentation::ApplicationEntity], [value]) => {
        DataElementValue::new_application_entity(value)
      }
      ([ValueRepresentation::CodeString], _) => {
        DataElementValue::new_code_string(value)
      }
      ([ValueRepresentation::LongString], _) => {
        DataElementValue::new_long_string(value)
      }
      ([ValueRepresentation::LongText], [value]) => {
        DataElementValue::new_long_text(value)
      }
      ([ValueRepresentation::ShortString], _) => {
        DataElementValue::new_short_string(value)
      }
      ([ValueRepresentation::ShortText], [value]) => {
        DataElementValue::new_short_text(value)
      }
      ([ValueRepresentation::UniqueIdentifier], _) => {
        DataElementValue::new_unique_identifier(value)
      }
      ([ValueRepresentation::UniversalResourceIdentifier], [value]) => {
        DataElementValue::new_universal_resource_identifier(value)
      }
      ([ValueRepresentation::UnlimitedCharacters], _) => {
        DataElementValue::new_unlimited_characters(value)
      }
      ([ValueRepresentation::UnlimitedText], [value]) => {
        DataElementValue::new_unlimited_text(value)
      }
      _ => invalid_insert_error(entry),
    }?;

    self.0.insert(entry.tag, value);

    Ok(())
  }

  /// Merges another data set into this one. Data elements from the other
  /// data set take precedence on collision.
  ///
  pub fn merge(&mut self, other: Self) {
    self.0.extend(other.0);
  }

  /// Deletes the data element with the given tag, if present.
  ///
  pub fn delete(&mut self, tag: DataElementTag) {
    self.0.remove(&tag);
  }

  /// Retains only the data elements for which the predicate returns true.
  ///
  pub fn retain(
    &mut self,
    f: impl FnMut(&DataElementTag, &mut DataElementValue) -> bool,
  ) {
    self.0.retain(f);
  }

  /// Returns the tags in a data set, in ascending order.
  ///
  pub fn tags(&self) -> Vec<DataElementTag> {
    self.0.keys().copied().collect()
  }

  /// Returns an iterator over a data set's elements, in ascending tag order.
  ///
  pub fn iter(
    &self,
  ) -> std::collections::btree_map::Iter<'_, DataElementTag, DataElementValue>
  {
    self.0.iter()
  }

  /// Returns a new data set holding this data set's File Meta Information
  /// data elements, i.e. those with a group of 2, excluding any that don't
  /// hold binary data.
  ///
  /// The *'(0002,0002) Media Storage SOP Class UID'* and *'(0002,0003) Media
  /// Storage SOP Instance UID'* data elements are synchronized with the
  /// *'(0008,0016) SOP Class UID'* and *'(0008,0018) SOP Instance UID'*
  /// values in this data set.
  ///
  pub fn file_meta_information(&self) -> DataSet {
    let mut fmi: DataSet = self
      .0
      .range(
        DataElementTag::new(2, 0x0000)..=DataElementTag::new(2, 0xFFFF),
      )
      .filter(|(_, value)| value.bytes().is_ok())
      .map(|(tag, value)| (*tag, value.clone()))
      .collect();

    for (source, target) in [
      (dictionary::SOP_CLASS_UID, dictionary::MEDIA_STORAGE_SOP_CLASS_UID),
      (
        dictionary::SOP_INSTANCE_UID,
        dictionary::MEDIA_STORAGE_SOP_INSTANCE_UID,
      ),
    ] {
      match self.0.get(&source.tag) {
        Some(value) => fmi.insert(target.tag, value.clone()),
        None => fmi.delete(target.tag),
      }
    }

    fmi
  }

  /// Looks up a data set path and returns the data element value or nested
  /// data set it points at.
  ///
  fn lookup(&self, path: &DataSetPath) -> Result<LookupResult, DataError> {
    let mut result = LookupResult::DataSet(self);

    for entry in path.entries() {
      match (result, entry) {
        (
          LookupResult::DataSet(data_set),
          DataSetPathEntry::DataElement { tag },
        ) => {
          if let Some(value) = data_set.0.get(tag) {
            result = LookupResult::Value(value);
            continue;
          }
        }

        (
          LookupResult::Value(value),
          DataSetPathEntry::SequenceItem { index },
        ) => {
          if let Some(item) =
            value.sequence_items().ok().and_then(|items| items.get(*index))
          {
            result = LookupResult::DataSet(item);
            continue;
          }
        }

        _ => (),
      }

      return Err(DataError::new_tag_not_present().with_path(path));
    }

    Ok(result)
  }

  /// Returns the data element value for the given tag.
  ///
  pub fn get_value(
    &self,
    tag: DataElementTag,
  ) -> Result<&DataElementValue, DataError> {
    self.0.get(&tag).ok_or_else(|| {
      DataError::new_tag_not_present()
        .with_path(&DataSetPath::new_with_data_element(tag))
    })
  }

  /// Returns the data element value at the given path, which must end with
  /// a data element entry.
  ///
  pub fn get_value_at_path(
    &self,
    path: &DataSetPath,
  ) -> Result<&DataElementValue, DataError> {
    match self.lookup(path) {
      Ok(LookupResult::Value(value)) => Ok(value),
      _ => Err(DataError::new_tag_not_present().with_path(path)),
    }
  }

  /// Returns the nested data set at the given path, which must be empty or
  /// end with a sequence item entry.
  ///
  pub fn get_data_set_at_path(
    &self,
    path: &DataSetPath,
  ) -> Result<&DataSet, DataError> {
    match self.lookup(path) {
      Ok(LookupResult::DataSet(data_set)) => Ok(data_set),
      _ => Err(DataError::new_tag_not_present().with_path(path)),
    }
  }

  /// Returns the raw value bytes for the given tag when its value has the
  /// given VR.
  ///
  pub fn get_value_bytes(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> Result<&RcBytes, DataError> {
    let value = self.get_value(tag)?;

    if value.value_representation() == vr {
      value
        .bytes()
        .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
    } else {
      Err(
        DataError::new_value_not_present()
          .with_path(&DataSetPath::new_with_data_element(tag)),
      )
    }
  }

  /// Returns the singular string value of the data element with the given
  /// tag.
  ///
  pub fn get_string(&self, tag: DataElementTag) -> Result<&str, DataError> {
    self
      .get_value(tag)?
      .get_string()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all string values of the data element with the given tag.
  ///
  pub fn get_strings(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<&str>, DataError> {
    self
      .get_value(tag)?
      .get_strings()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the singular integer value of the data element with the given
  /// tag.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<T, DataError> {
    self
      .get_value(tag)?
      .get_int()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the singular integer value of the data element with the given
  /// tag, or the given default when the tag is absent.
  ///
  pub fn get_int_with_default<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
    default: T,
  ) -> Result<T, DataError> {
    match self.get_int(tag) {
      Ok(value) => Ok(value),
      Err(e) if e.is_tag_not_present() => Ok(default),
      Err(e) => Err(e),
    }
  }

  /// Returns all integer values of the data element with the given tag.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<T>, DataError> {
    self
      .get_value(tag)?
      .get_ints()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the singular big integer value of the data element with the
  /// given tag.
  ///
  pub fn get_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
    tag: DataElementTag,
  ) -> Result<T, DataError> {
    self
      .get_value(tag)?
      .get_big_int()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the singular float value of the data element with the given
  /// tag.
  ///
  pub fn get_float(&self, tag: DataElementTag) -> Result<f64, DataError> {
    self
      .get_value(tag)?
      .get_float()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all float values of the data element with the given tag.
  ///
  pub fn get_floats(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<f64>, DataError> {
    self
      .get_value(tag)?
      .get_floats()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the age value of the data element with the given tag.
  ///
  pub fn get_age(
    &self,
    tag: DataElementTag,
  ) -> Result<age_string::StructuredAge, DataError> {
    self
      .get_value(tag)?
      .get_age()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the date value of the data element with the given tag.
  ///
  pub fn get_date(
    &self,
    tag: DataElementTag,
  ) -> Result<StructuredDate, DataError> {
    self
      .get_value(tag)?
      .get_date()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the date/time value of the data element with the given tag.
  ///
  pub fn get_date_time(
    &self,
    tag: DataElementTag,
  ) -> Result<StructuredDateTime, DataError> {
    self
      .get_value(tag)?
      .get_date_time()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the time value of the data element with the given tag.
  ///
  pub fn get_time(
    &self,
    tag: DataElementTag,
  ) -> Result<StructuredTime, DataError> {
    self
      .get_value(tag)?
      .get_time()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the singular person name value of the data element with the
  /// given tag.
  ///
  pub fn get_person_name(
    &self,
    tag: DataElementTag,
  ) -> Result<person_name::StructuredPersonName, DataError> {
    self
      .get_value(tag)?
      .get_person_name()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns all person name values of the data element with the given tag.
  ///
  pub fn get_person_names(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<person_name::StructuredPersonName>, DataError> {
    self
      .get_value(tag)?
      .get_person_names()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the three integers of the lookup table descriptor with the
  /// given tag.
  ///
  pub fn get_lookup_table_descriptor(
    &self,
    tag: DataElementTag,
  ) -> Result<(u16, i32, u16), DataError> {
    self
      .get_value(tag)?
      .get_lookup_table_descriptor()
      .map_err(|e| e.with_path(&DataSetPath::new_with_data_element(tag)))
  }

  /// Returns the transfer syntax specified by the *'(0002,0010) Transfer
  /// Syntax UID'* data element, if present and recognized.
  ///
  pub fn get_transfer_syntax(
    &self,
  ) -> Result<&'static TransferSyntax, DataError> {
    let uid = self.get_string(dictionary::TRANSFER_SYNTAX_UID.tag)?;

    TransferSyntax::from_uid(uid).map_err(|_| {
      DataError::new_value_invalid(format!(
        "Unrecognized transfer syntax UID: '{}'",
        uid
      ))
    })
  }

  /// Returns the size in bytes of all data elements in a data set.
  ///
  pub fn total_byte_size(&self) -> u64 {
    self
      .iter()
      .fold(0, |acc, (_, value)| acc + value.total_byte_size())
  }

  /// Returns the display name for a data element tag, using the data set's
  /// private creator data elements to resolve private tags where possible.
  ///
  pub fn tag_name(&self, tag: DataElementTag) -> &'static str {
    dictionary::tag_name(tag, self.private_creator_for_tag(tag).ok())
  }

  /// Formats a data element tag as `"(GROUP,ELEMENT) NAME"` using the data
  /// set's private creator data elements to resolve private tags.
  ///
  pub fn tag_with_name(&self, tag: DataElementTag) -> String {
    dictionary::tag_with_name(tag, self.private_creator_for_tag(tag).ok())
  }

  /// Returns the value of the *'(gggg,00xx) Private Creator'* data element
  /// for the given private tag.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn private_creator_for_tag(
    &self,
    tag: DataElementTag,
  ) -> Result<&str, ()> {
    if !tag.is_private() {
      return Err(());
    }

    let private_creator_tag = DataElementTag::new(tag.group, tag.element >> 8);
    if !private_creator_tag.is_private_creator() {
      return Err(());
    }

    self.get_string(private_creator_tag).map_err(|_| ())
  }

  /// Removes all private tags from a data set, recursing into sequence
  /// items.
  ///
  pub fn delete_private_elements(&mut self) {
    self.0.retain(|tag, value| {
      if tag.is_private() {
        return false;
      }

      if let Ok(items) = value.sequence_items_mut() {
        for item in items.iter_mut() {
          item.delete_private_elements();
        }
      }

      true
    })
  }

  /// Returns a new data set containing the private data elements in the
  /// given group that belong to the named private creator. The group number
  /// must be odd and the private creator name must match exactly.
  ///
  /// Ref: PS3.5 7.8.1.
  ///
  pub fn private_block(
    &self,
    group: u16,
    private_creator: &str,
  ) -> Result<Self, String> {
    if group & 1 == 0 {
      return Err("Private group number is even".to_string());
    }

    // Search for the matching '(gggg,00XX) Private Creator' data element
    let element = (0x10..=0xFF)
      .find(|element| {
        self
          .get_string(DataElementTag::new(group, *element))
          .map(|value| value == private_creator)
          .unwrap_or(false)
      })
      .ok_or(format!("Private creator '{}' not found", private_creator))?;

    let element_start = element << 8;
    let element_end = element_start | 0xFF;

    Ok(
      self
        .0
        .range(
          DataElementTag::new(group, element_start)
            ..=DataElementTag::new(group, element_end),
        )
        .map(|(tag, value)| (*tag, value.clone()))
        .collect(),
    )
  }

  /// Prints a data set to stdout formatted for readability.
  ///
  pub fn print(&self) {
    self.print_with_options(&DataSetPrintOptions::default());
  }

  /// Prints a data set to stdout formatted for readability using the given
  /// print options.
  ///
  pub fn print_with_options(&self, print_options: &DataSetPrintOptions) {
    self.to_lines(print_options, &mut |line| println!("{}", line));
  }

  /// Converts a data set to printable lines using the given print options.
  /// The lines are returned through the callback.
  ///
  pub fn to_lines(
    &self,
    print_options: &DataSetPrintOptions,
    callback: &mut impl FnMut(String),
  ) {
    print::data_set_to_lines(self, print_options, callback, 0);
  }
}

impl FromIterator<(DataElementTag, DataElementValue)> for DataSet {
  fn from_iter<T: IntoIterator<Item = (DataElementTag, DataElementValue)>>(
    iter: T,
  ) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl IntoIterator for DataSet {
  type Item = (DataElementTag, DataElementValue);

  type IntoIter =
    std::collections::btree_map::IntoIter<DataElementTag, DataElementValue>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl Extend<(DataElementTag, DataElementValue)> for DataSet {
  fn extend<T: IntoIterator<Item = (DataElementTag, DataElementValue)>>(
    &mut self,
    iter: T,
  ) {
    self.0.extend(iter);
  }
}

/// The error returned when an `insert_*_value` function is called with
/// arguments incompatible with the dictionary entry.
///
fn invalid_insert_error<T>(
  entry: &dictionary::Entry,
) -> Result<T, DataError> {
  match entry.vrs {
    [vr] => Err(DataError::new_value_invalid(format!(
      "Data element '{}' (VR: '{}', multiplicity: {}) does not support the \
       provided data",
      entry.name, vr, entry.multiplicity
    ))),

    vrs => Err(DataError::new_value_invalid(format!(
      "Data element '{}' supports multiple VRs: {}",
      entry.name,
      vrs
        .iter()
        .map(|vr| vr.to_string())
        .collect::<Vec<String>>()
        .join(", ")
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_data_set() -> DataSet {
    let mut data_set = DataSet::new();

    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["123456"])
      .unwrap();
    data_set
      .insert_int_value(&dictionary::ROWS, &[256])
      .unwrap();

    let mut item = DataSet::new();
    item
      .insert_string_value(
        &dictionary::REFERENCED_SOP_INSTANCE_UID,
        &["1.2.3"],
      )
      .unwrap();

    data_set
      .insert_sequence_value(&dictionary::REFERENCED_IMAGE_SEQUENCE, vec![
        item,
      ])
      .unwrap();

    data_set
  }

  #[test]
  fn insert_and_get_test() {
    let mut data_set = test_data_set();

    assert_eq!(data_set.size(), 3);
    assert!(data_set.has(dictionary::PATIENT_ID.tag));
    assert_eq!(data_set.get_string(dictionary::PATIENT_ID.tag), Ok("123456"));
    assert_eq!(data_set.get_int(dictionary::ROWS.tag), Ok(256));
    assert_eq!(
      data_set.get_int_with_default(dictionary::COLUMNS.tag, 512),
      Ok(512)
    );

    assert!(
      data_set
        .insert_int_value(&dictionary::PATIENT_NAME, &[1])
        .is_err()
    );
  }

  #[test]
  fn tags_are_ordered_test() {
    let data_set = test_data_set();

    assert_eq!(data_set.tags(), vec![
      dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
      dictionary::PATIENT_ID.tag,
      dictionary::ROWS.tag,
    ]);
  }

  #[test]
  fn lookup_at_path_test() {
    let data_set = test_data_set();

    let path = DataSetPath::from_string("00081140/[0]/00081155").unwrap();

    assert_eq!(
      data_set
        .get_value_at_path(&path)
        .and_then(|value| value.get_string()),
      Ok("1.2.3")
    );

    let item_path = DataSetPath::from_string("00081140/[0]").unwrap();
    assert!(data_set.get_data_set_at_path(&item_path).is_ok());

    let missing_path = DataSetPath::from_string("00081140/[1]").unwrap();
    assert!(data_set.get_data_set_at_path(&missing_path).is_err());
  }

  #[test]
  fn file_meta_information_test() {
    let mut data_set = test_data_set();

    data_set
      .insert_string_value(&dictionary::TRANSFER_SYNTAX_UID, &[
        "1.2.840.10008.1.2.1",
      ])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::SOP_CLASS_UID, &[
        "1.2.840.10008.5.1.4.1.1.7",
      ])
      .unwrap();

    let fmi = data_set.file_meta_information();

    assert_eq!(fmi.tags(), vec![
      dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag,
      dictionary::TRANSFER_SYNTAX_UID.tag,
    ]);

    assert_eq!(
      fmi.get_string(dictionary::MEDIA_STORAGE_SOP_CLASS_UID.tag),
      Ok("1.2.840.10008.5.1.4.1.1.7")
    );

    assert_eq!(
      data_set.get_transfer_syntax(),
      Ok(&crate::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN)
    );
  }

  #[test]
  fn private_creator_test() {
    let mut data_set = DataSet::new();

    data_set.insert(
      DataElementTag::new(0x0009, 0x0010),
      DataElementValue::new_long_string(&["ACME 1.0"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0009, 0x1001),
      DataElementValue::new_long_string(&["value"]).unwrap(),
    );

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0009, 0x1001)),
      Ok("ACME 1.0")
    );

    let block = data_set.private_block(0x0009, "ACME 1.0").unwrap();
    assert_eq!(block.tags(), vec![DataElementTag::new(0x0009, 0x1001)]);

    assert!(data_set.private_block(0x0008, "ACME 1.0").is_err());
    assert!(data_set.private_block(0x0009, "OTHER").is_err());

    let mut data_set = data_set;
    data_set.delete_private_elements();
    assert!(data_set.is_empty());
  }

  #[test]
  fn get_lookup_table_descriptor_test() {
    let mut data_set = DataSet::new();

    data_set.insert(
      dictionary::LUT_DESCRIPTOR.tag,
      DataElementValue::new_lookup_table_descriptor(
        ValueRepresentation::UnsignedShort,
        vec![0x00, 0x01, 0x00, 0x80, 0x10, 0x00].into(),
      )
      .unwrap(),
    );

    assert_eq!(
      data_set.get_lookup_table_descriptor(dictionary::LUT_DESCRIPTOR.tag),
      Ok((0x0100, 0x8000, 0x0010))
    );

    assert!(
      data_set
        .get_lookup_table_descriptor(dictionary::LUT_DATA.tag)
        .is_err()
    );
  }

  #[test]
  fn merge_test() {
    let mut a = DataSet::new();
    a.insert_string_value(&dictionary::PATIENT_ID, &["A"]).unwrap();

    let mut b = DataSet::new();
    b.insert_string_value(&dictionary::PATIENT_ID, &["B"]).unwrap();
    b.insert_int_value(&dictionary::ROWS, &[1]).unwrap();

    a.merge(b);

    assert_eq!(a.get_string(dictionary::PATIENT_ID.tag), Ok("B"));
    assert_eq!(a.size(), 2);
  }
}
