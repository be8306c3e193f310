//! The [`DataError`] type describing errors that occur when creating or
//! retrieving data element values.

use crate::{DataSetPath, DcmError, ValueRepresentation, dictionary};

/// An error that occurred when retrieving or creating data elements in data
/// sets:
///
/// - **Tag not present**: a requested tag was not in the data set.
/// - **Value not present**: the requested type is not held by the value,
///   e.g. an integer was requested from a string value.
/// - **Multiplicity mismatch**: the value does not have the required
///   multiplicity, e.g. a single string was requested but several are
///   present.
/// - **Value invalid**: the value's bytes could not be decoded, or the
///   supplied input was not valid for the value being created.
/// - **Value length invalid**: a length constraint of the value
///   representation was not respected.
///
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
  TagNotPresent {
    path: DataSetPath,
  },
  ValueNotPresent {
    path: Option<DataSetPath>,
  },
  MultiplicityMismatch {
    path: Option<DataSetPath>,
  },
  ValueInvalid {
    details: String,
    path: Option<DataSetPath>,
  },
  ValueLengthInvalid {
    vr: ValueRepresentation,
    length: u64,
    details: String,
    path: Option<DataSetPath>,
  },
}

impl core::fmt::Display for DataError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let path_to_string = |path: &Option<DataSetPath>| {
      path
        .as_ref()
        .map(|path| path.to_detailed_string())
        .unwrap_or_else(|| "<unknown>".to_string())
    };

    match self {
      Self::TagNotPresent { path } => {
        write!(f, "Tag not present at {}", path.to_detailed_string())
      }
      Self::ValueNotPresent { path } => {
        write!(f, "Value not present at {}", path_to_string(path))
      }
      Self::MultiplicityMismatch { path } => {
        write!(f, "Multiplicity mismatch at {}", path_to_string(path))
      }
      Self::ValueInvalid { details, path } => {
        write!(
          f,
          "Invalid value at {}, details: {}",
          path_to_string(path),
          details
        )
      }
      Self::ValueLengthInvalid { details, path, .. } => {
        write!(
          f,
          "Invalid value length at {}, details: {}",
          path_to_string(path),
          details
        )
      }
    }
  }
}

impl DataError {
  /// Constructs a new 'Tag not present' data error.
  ///
  pub fn new_tag_not_present() -> Self {
    Self::TagNotPresent {
      path: DataSetPath::new(),
    }
  }

  /// Constructs a new 'Value not present' data error.
  ///
  pub fn new_value_not_present() -> Self {
    Self::ValueNotPresent { path: None }
  }

  /// Constructs a new 'Multiplicity mismatch' data error.
  ///
  pub fn new_multiplicity_mismatch() -> Self {
    Self::MultiplicityMismatch { path: None }
  }

  /// Constructs a new 'Value invalid' data error.
  ///
  pub fn new_value_invalid(details: String) -> Self {
    Self::ValueInvalid {
      details,
      path: None,
    }
  }

  /// Constructs a new 'Value length invalid' data error.
  ///
  pub fn new_value_length_invalid(
    vr: ValueRepresentation,
    length: u64,
    details: String,
  ) -> Self {
    Self::ValueLengthInvalid {
      vr,
      length,
      details,
      path: None,
    }
  }

  /// Returns whether this is a 'Tag not present' error.
  ///
  pub fn is_tag_not_present(&self) -> bool {
    matches!(self, Self::TagNotPresent { .. })
  }

  /// Attaches a data set path to a data error, indicating the exact location
  /// in the data set that the error occurred.
  ///
  pub fn with_path(self, path: &DataSetPath) -> Self {
    match self {
      Self::TagNotPresent { .. } => Self::TagNotPresent { path: path.clone() },
      Self::ValueNotPresent { .. } => Self::ValueNotPresent {
        path: Some(path.clone()),
      },
      Self::MultiplicityMismatch { .. } => Self::MultiplicityMismatch {
        path: Some(path.clone()),
      },
      Self::ValueInvalid { details, .. } => Self::ValueInvalid {
        details,
        path: Some(path.clone()),
      },
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => Self::ValueLengthInvalid {
        vr,
        length,
        details,
        path: Some(path.clone()),
      },
    }
  }

  /// Returns the name of a data error as a human-readable string.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      Self::TagNotPresent { .. } => "Tag not present",
      Self::ValueNotPresent { .. } => "Value not present",
      Self::MultiplicityMismatch { .. } => "Multiplicity mismatch",
      Self::ValueInvalid { .. } => "Invalid value",
      Self::ValueLengthInvalid { .. } => "Invalid value length",
    }
  }

  /// Returns the data set path attached to a data error, if any.
  ///
  pub fn path(&self) -> Option<&DataSetPath> {
    match self {
      Self::TagNotPresent { path } => Some(path),
      Self::ValueNotPresent { path }
      | Self::MultiplicityMismatch { path }
      | Self::ValueInvalid { path, .. }
      | Self::ValueLengthInvalid { path, .. } => path.as_ref(),
    }
  }
}

impl DcmError for DataError {
  /// Returns lines of text that describe a data error in a human-readable
  /// format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM data error {}", task_description),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    if let Some(path) = self.path() {
      if !path.is_empty() {
        if let Ok(tag) = path.final_data_element() {
          lines.push(format!("  Tag: {tag}"));
          lines.push(format!("  Name: {}", dictionary::tag_name(tag, None)));
        }

        lines.push(format!("  Path: {}", path.to_detailed_string()));
      }
    }

    match self {
      Self::ValueInvalid { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => {
        lines.push(format!("  VR: {vr}"));
        lines.push(format!("  Length: {length} bytes"));
        lines.push(format!("  Details: {details}"));
      }
      _ => (),
    };

    lines
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::DcmError;

  #[test]
  fn to_lines_test() {
    assert_eq!(
      DataError::new_tag_not_present()
        .with_path(&DataSetPath::from_string("00100010").unwrap())
        .to_lines("reading")
        .join("\n"),
      "DICOM data error reading\n\
       \n  \
       Error: Tag not present\n  \
       Tag: (0010,0010)\n  \
       Name: PatientName\n  \
       Path: (0010,0010) PatientName"
    );

    assert_eq!(
      DataError::new_value_invalid("bad bytes".to_string())
        .to_lines("reading")
        .join("\n"),
      "DICOM data error reading\n\
       \n  \
       Error: Invalid value\n  \
       Details: bad bytes"
    );
  }
}
