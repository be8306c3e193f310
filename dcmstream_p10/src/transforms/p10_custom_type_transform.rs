//! A transform that gathers a fixed set of data elements from a stream of
//! DICOM P10 tokens and converts them into a custom type.

use dcmstream_core::{DataElementTag, DataError, DataSet, DcmError};

use crate::{DataSetBuilder, P10Error, P10FilterTransform, P10Token};

/// Builds a custom type from a stream of DICOM P10 tokens by collecting the
/// data elements with the specified tags into a data set and, once the
/// stream has moved past the highest wanted tag, passing that data set to a
/// conversion function.
///
/// [`P10CustomTypeTransform::get_output`] returns `None` until the custom
/// type has been constructed.
///
pub struct P10CustomTypeTransform<T> {
  filter: Option<(P10FilterTransform, DataSetBuilder)>,
  highest_tag: DataElementTag,
  target_from_data_set: TargetFromDataSetFn<T>,
  target: Option<T>,
}

type TargetFromDataSetFn<T> = fn(&DataSet) -> Result<T, DataError>;

/// An error from converting a stream of DICOM P10 tokens to a custom type.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10CustomTypeTransformError {
  /// The stream of DICOM P10 tokens was itself invalid.
  P10Error(P10Error),

  /// The custom type couldn't be created from the gathered data elements.
  DataError(DataError),
}

impl core::fmt::Display for P10CustomTypeTransformError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::P10Error(e) => e.fmt(f),
      Self::DataError(e) => e.fmt(f),
    }
  }
}

impl DcmError for P10CustomTypeTransformError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    match self {
      Self::P10Error(e) => e.to_lines(task_description),
      Self::DataError(e) => e.to_lines(task_description),
    }
  }
}

impl<T> P10CustomTypeTransform<T> {
  /// Creates a new transform that builds a custom type out of the data
  /// elements with the given tags.
  ///
  pub fn new(
    tags: &'static [DataElementTag],
    target_from_data_set: TargetFromDataSetFn<T>,
  ) -> Self {
    let filter =
      P10FilterTransform::new(Box::new(move |tag, _vr, _length, _path| {
        tags.contains(&tag)
      }));

    Self {
      filter: Some((filter, DataSetBuilder::new())),
      highest_tag: tags.iter().max().copied().unwrap_or(DataElementTag::ZERO),
      target_from_data_set,
      target: None,
    }
  }

  /// Adds the next token in the DICOM P10 token stream.
  ///
  pub fn add_token(
    &mut self,
    token: &P10Token,
  ) -> Result<(), P10CustomTypeTransformError> {
    let Some((filter, data_set_builder)) = self.filter.as_mut() else {
      return Ok(());
    };

    let is_at_root = filter.is_at_root();

    if filter
      .add_token(token)
      .map_err(P10CustomTypeTransformError::P10Error)?
    {
      data_set_builder
        .add_token(token)
        .map_err(P10CustomTypeTransformError::P10Error)?;
    }

    // Once the stream has moved past the highest wanted tag at the root
    // level, everything needed has been gathered and the custom type can
    // be constructed
    let is_complete = is_at_root
      && match token {
        P10Token::DataElementHeader { tag, .. }
        | P10Token::SequenceStart { tag, .. } => *tag > self.highest_tag,

        P10Token::DataElementValueBytes {
          tag,
          bytes_remaining: 0,
          ..
        }
        | P10Token::SequenceDelimiter { tag } => *tag == self.highest_tag,

        P10Token::End => true,

        _ => false,
      };

    if is_complete {
      data_set_builder.force_end();
      let data_set = data_set_builder.final_data_set().unwrap();

      let target = (self.target_from_data_set)(&data_set)
        .map_err(P10CustomTypeTransformError::DataError)?;

      self.target = Some(target);
      self.filter = None;
    }

    Ok(())
  }

  /// Returns the custom type once it has been constructed.
  ///
  pub fn get_output(&self) -> Option<&T> {
    self.target.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dcmstream_core::{DataSetPath, ValueRepresentation, dictionary};

  #[derive(Debug, PartialEq)]
  struct Dimensions {
    rows: u16,
    columns: u16,
  }

  #[test]
  fn gathers_custom_type_test() {
    let mut transform = P10CustomTypeTransform::<Dimensions>::new(
      &[
        DataElementTag {
          group: 0x0028,
          element: 0x0010,
        },
        DataElementTag {
          group: 0x0028,
          element: 0x0011,
        },
      ],
      |data_set| {
        Ok(Dimensions {
          rows: data_set.get_int(dictionary::ROWS.tag)?,
          columns: data_set.get_int(dictionary::COLUMNS.tag)?,
        })
      },
    );

    let element_tokens = |tag: DataElementTag, bytes: &[u8]| {
      vec![
        P10Token::DataElementHeader {
          tag,
          vr: ValueRepresentation::UnsignedShort,
          length: bytes.len() as u32,
          path: DataSetPath::new_with_data_element(tag),
        },
        P10Token::DataElementValueBytes {
          tag,
          vr: ValueRepresentation::UnsignedShort,
          data: bytes.to_vec().into(),
          bytes_remaining: 0,
        },
      ]
    };

    for token in [
      element_tokens(dictionary::ROWS.tag, &[0, 1]),
      element_tokens(dictionary::COLUMNS.tag, &[0, 2]),
    ]
    .concat()
    {
      transform.add_token(&token).unwrap();
    }

    assert_eq!(
      transform.get_output(),
      Some(&Dimensions {
        rows: 256,
        columns: 512
      })
    );
  }
}
