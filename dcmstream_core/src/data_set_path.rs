//! A path to a specific data element or sequence item in a data set.

use crate::{DataElementTag, dictionary};

/// A path in a data set that specifies the location of a data element or
/// sequence item. The empty path points at the root data set. Entries are
/// separated by a forward slash when formatted as a string:
///
/// - `""`: the root data set.
/// - `"00100010"`: the *'(0010,0010) Patient Name'* data element.
/// - `"00082112/[0]"`: the first item of the *'(0008,2112) Source Image
///   Sequence'* data element.
/// - `"00082112/[0]/00081150"`: a data element inside that item.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSetPath(Vec<DataSetPathEntry>);

/// An individual entry in a [`DataSetPath`].
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DataSetPathEntry {
  DataElement { tag: DataElementTag },
  SequenceItem { index: usize },
}

impl DataSetPath {
  /// Constructs an empty data set path pointing at the root data set.
  ///
  pub fn new() -> Self {
    Self(vec![])
  }

  /// Constructs a data set path with a single entry for the given data
  /// element.
  ///
  pub fn new_with_data_element(tag: DataElementTag) -> Self {
    Self(vec![DataSetPathEntry::DataElement { tag }])
  }

  /// Returns the entries of a data set path.
  ///
  pub fn entries(&self) -> &[DataSetPathEntry] {
    &self.0
  }

  /// Returns the number of entries in a data set path.
  ///
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns whether a data set path has no entries.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns whether a data set path is empty or points at a root-level
  /// data element.
  ///
  pub fn is_root(&self) -> bool {
    matches!(
      self.0.as_slice(),
      [] | [DataSetPathEntry::DataElement { .. }]
    )
  }

  /// Returns the number of sequence items in a data set path.
  ///
  pub fn sequence_item_count(&self) -> usize {
    self
      .0
      .iter()
      .filter(|entry| matches!(entry, DataSetPathEntry::SequenceItem { .. }))
      .count()
  }

  /// Returns the final entry of a data set path as a data element tag, or an
  /// error if the final entry is not a data element.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn final_data_element(&self) -> Result<DataElementTag, ()> {
    match self.0.last() {
      Some(DataSetPathEntry::DataElement { tag }) => Ok(*tag),
      _ => Err(()),
    }
  }

  /// Appends a data element entry. This is only valid when the path is
  /// empty or currently points at a sequence item.
  ///
  pub fn add_data_element(
    &mut self,
    tag: DataElementTag,
  ) -> Result<(), String> {
    match self.0.last() {
      None | Some(DataSetPathEntry::SequenceItem { .. }) => {
        self.0.push(DataSetPathEntry::DataElement { tag });
        Ok(())
      }

      _ => Err(format!(
        "Invalid data set path entry: {}",
        tag.to_hex_string()
      )),
    }
  }

  /// Appends a sequence item entry. This is only valid when the path
  /// currently points at a data element.
  ///
  pub fn add_sequence_item(&mut self, index: usize) -> Result<(), String> {
    match self.0.last() {
      Some(DataSetPathEntry::DataElement { .. }) => {
        self.0.push(DataSetPathEntry::SequenceItem { index });
        Ok(())
      }

      _ => Err(format!("Invalid data set path entry: [{}]", index)),
    }
  }

  /// Removes the last entry of a data set path.
  ///
  pub fn pop(&mut self) -> Result<(), String> {
    match self.0.pop() {
      Some(_) => Ok(()),
      None => Err("Data set path is empty".to_string()),
    }
  }

  /// Parses a data set path from a string of slash-separated entries.
  ///
  pub fn from_string(s: &str) -> Result<Self, String> {
    let mut result = Self::new();

    if s.is_empty() {
      return Ok(result);
    }

    for entry in s.split('/') {
      if let Ok(tag) = DataElementTag::from_hex_string(entry) {
        result.add_data_element(tag)?;
        continue;
      }

      if let Some(index) = entry
        .strip_prefix('[')
        .and_then(|e| e.strip_suffix(']'))
        .and_then(|e| e.parse::<usize>().ok())
      {
        result.add_sequence_item(index)?;
        continue;
      }

      return Err(format!("Invalid data set path entry: {}", entry));
    }

    Ok(result)
  }

  /// Formats a data set path with full details on each entry, including the
  /// dictionary names of its data element tags.
  ///
  pub fn to_detailed_string(&self) -> String {
    self
      .0
      .iter()
      .map(|entry| match entry {
        DataSetPathEntry::DataElement { tag } => {
          dictionary::tag_with_name(*tag, None)
        }
        DataSetPathEntry::SequenceItem { index } => format!("Item {}", index),
      })
      .collect::<Vec<_>>()
      .join(" / ")
  }
}

impl core::fmt::Display for DataSetPath {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let path = self
      .0
      .iter()
      .map(|entry| match entry {
        DataSetPathEntry::DataElement { tag } => tag.to_hex_string(),
        DataSetPathEntry::SequenceItem { index } => format!("[{}]", index),
      })
      .collect::<Vec<_>>()
      .join("/");

    f.write_str(&path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_and_pop_test() {
    let mut path = DataSetPath::new();
    assert!(path.is_root());

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x0008, 0x2112)),
      Ok(())
    );
    assert!(path.is_root());

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x0008, 0x2112)),
      Err("Invalid data set path entry: 00082112".to_string())
    );

    assert_eq!(path.add_sequence_item(2), Ok(()));
    assert!(!path.is_root());

    assert_eq!(
      path.add_sequence_item(2),
      Err("Invalid data set path entry: [2]".to_string())
    );

    assert_eq!(
      path.add_data_element(DataElementTag::new(0x0008, 0x1150)),
      Ok(())
    );

    assert_eq!(path.to_string(), "00082112/[2]/00081150");
    assert_eq!(path.sequence_item_count(), 1);
    assert_eq!(
      path.final_data_element(),
      Ok(DataElementTag::new(0x0008, 0x1150))
    );

    assert_eq!(path.pop(), Ok(()));
    assert_eq!(path.to_string(), "00082112/[2]");

    assert_eq!(path.final_data_element(), Err(()));
  }

  #[test]
  fn from_string_test() {
    assert_eq!(DataSetPath::from_string(""), Ok(DataSetPath::new()));

    let path = DataSetPath::from_string("00082112/[2]/00081150").unwrap();
    assert_eq!(path.to_string(), "00082112/[2]/00081150");

    assert!(DataSetPath::from_string("[0]").is_err());
    assert!(DataSetPath::from_string("00082112/??").is_err());
  }
}
