//! The error type for reading and writing DICOM P10 data.

use dcmstream_core::{DataSetPath, DcmError};

use crate::P10Token;

/// The configured maximum that was crossed by a
/// [`P10Error::MaximumExceeded`] error.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaximumKind {
  TokenSize,
  StringSize,
  SequenceDepth,
}

/// An error that occurred when reading or writing DICOM P10 data.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Error {
  /// The supplied data specifies a transfer syntax that isn't supported.
  TransferSyntaxNotSupported { transfer_syntax_uid: String },

  /// The supplied data contains a *'(0008,0005) Specific Character Set'*
  /// data element that can't be decoded.
  SpecificCharacterSetInvalid {
    specific_character_set: String,
    details: String,
  },

  /// More data needs to be written to the read context before the next
  /// token can be read. This signals suspension, not failure.
  DataRequired { when: String },

  /// The input ended part way through a data element or sequence and no
  /// more data can be added, i.e. the supplied data is truncated.
  PrematureEnd {
    when: String,
    path: DataSetPath,
    offset: u64,
  },

  /// The supplied data does not have 'DICM' at offset 128 and the read
  /// config requires it.
  DicmPrefixNotPresent,

  /// The next token couldn't be read because the supplied bytes are
  /// malformed, or a value couldn't be serialized when writing.
  DataInvalid {
    when: String,
    details: String,
    path: DataSetPath,
    offset: u64,
  },

  /// One of the configured maximums that bound memory usage was crossed.
  MaximumExceeded {
    kind: MaximumKind,
    details: String,
    path: DataSetPath,
    offset: u64,
  },

  /// A token was rejected because it is invalid at the current position in
  /// the token stream, e.g. a [`P10Token::DataElementValueBytes`] token
  /// that doesn't follow a [`P10Token::DataElementHeader`], or a data
  /// element out of ascending tag order.
  WriteError {
    when: String,
    details: String,
    token: P10Token,
  },

  /// Bytes were written to a read context after its final bytes had
  /// already been written.
  WriteAfterCompletion,

  /// An error produced by a caller-supplied byte source or sink.
  ExternalSinkError { when: String, details: String },

  /// A general-purpose error for cases not covered by the other variants.
  OtherError { error_type: String, details: String },
}

impl core::fmt::Display for P10Error {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    write!(f, "DICOM P10 error: {}", self.name())
  }
}

impl P10Error {
  /// Returns the name of the error as a human-readable string.
  ///
  pub fn name(&self) -> &str {
    match self {
      Self::TransferSyntaxNotSupported { .. } => {
        "Transfer syntax not supported"
      }
      Self::SpecificCharacterSetInvalid { .. } => {
        "Specific character set invalid"
      }
      Self::DataRequired { .. } => "Data required",
      Self::PrematureEnd { .. } => "Unexpected end of data",
      Self::DicmPrefixNotPresent => "'DICM' prefix is not present",
      Self::DataInvalid { .. } => "Invalid data",
      Self::MaximumExceeded { kind, .. } => match kind {
        MaximumKind::TokenSize => "Maximum token size exceeded",
        MaximumKind::StringSize => "Maximum string size exceeded",
        MaximumKind::SequenceDepth => "Maximum sequence depth exceeded",
      },
      Self::WriteError { .. } => "P10 token stream invalid",
      Self::WriteAfterCompletion => "Write after completion",
      Self::ExternalSinkError { .. } => "External sink failure",
      Self::OtherError { error_type, .. } => error_type,
    }
  }

  /// Returns the `details` field of the error, if one exists.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::SpecificCharacterSetInvalid { details, .. }
      | Self::DataInvalid { details, .. }
      | Self::MaximumExceeded { details, .. }
      | Self::WriteError { details, .. }
      | Self::ExternalSinkError { details, .. }
      | Self::OtherError { details, .. } => details,

      _ => "",
    }
  }
}

impl DcmError for P10Error {
  /// Returns lines of text that describe a DICOM P10 error in a
  /// human-readable format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM P10 error {task_description}"),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    match self {
      P10Error::DataRequired { when }
      | P10Error::PrematureEnd { when, .. }
      | P10Error::DataInvalid { when, .. }
      | P10Error::WriteError { when, .. }
      | P10Error::ExternalSinkError { when, .. } => {
        lines.push(format!("  When: {when}"));
      }

      _ => (),
    };

    match self {
      P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid,
      } => {
        lines.push(format!("  Transfer syntax UID: {transfer_syntax_uid}"));
      }

      P10Error::SpecificCharacterSetInvalid {
        specific_character_set,
        details,
      } => {
        lines.push(format!(
          "  Specific character set: {specific_character_set}"
        ));

        if !details.is_empty() {
          lines.push(format!("  Details: {details}"));
        }
      }

      P10Error::WriteError { details, token, .. } => {
        lines.push(format!("  Details: {details}"));
        lines.push(format!("  Token: {token}"));
      }

      P10Error::DataInvalid { details, .. }
      | P10Error::MaximumExceeded { details, .. }
      | P10Error::ExternalSinkError { details, .. }
      | P10Error::OtherError { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }

      _ => (),
    };

    match self {
      P10Error::PrematureEnd { path, offset, .. }
      | P10Error::DataInvalid { path, offset, .. }
      | P10Error::MaximumExceeded { path, offset, .. } => {
        lines.push(format!("  Path: {}", path.to_detailed_string()));
        lines.push(format!("  Offset: 0x{offset:X}"));
      }

      _ => (),
    };

    lines
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_lines_test() {
    assert_eq!(
      P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: "Tag is garbage".to_string(),
        path: DataSetPath::from_string("00100010").unwrap(),
        offset: 0x1234,
      }
      .to_lines("reading file"),
      vec![
        "DICOM P10 error reading file".to_string(),
        "".to_string(),
        "  Error: Invalid data".to_string(),
        "  When: Reading data element header".to_string(),
        "  Details: Tag is garbage".to_string(),
        "  Path: (0010,0010) PatientName".to_string(),
        "  Offset: 0x1234".to_string(),
      ]
    );

    assert_eq!(
      P10Error::MaximumExceeded {
        kind: MaximumKind::SequenceDepth,
        details: "Depth of 10000 reached".to_string(),
        path: DataSetPath::new(),
        offset: 0,
      }
      .name(),
      "Maximum sequence depth exceeded"
    );
  }
}
