//! A transform that filters data elements out of a stream of DICOM P10
//! tokens.

use dcmstream_core::{
  DataElementTag, DataSet, DataSetPath, ValueRepresentation,
};

use crate::{DataSetBuilder, P10Error, P10Token};

/// Applies a data element predicate to a stream of DICOM P10 tokens.
/// Elements for which the predicate returns false are removed from the
/// stream, including, for sequences, their whole subtree, keeping the
/// output well-bracketed.
///
/// The removed data elements can optionally be captured into a side data
/// set for later inspection.
///
pub struct P10FilterTransform {
  predicate: Box<PredicateFunction>,
  path: DataSetPath,
  path_filter_results: Vec<bool>,
  filtered_out_capture: Option<DataSetBuilder>,
}

/// The predicate called for each data element in the stream. Returning true
/// keeps the element.
///
pub type PredicateFunction = dyn FnMut(
  DataElementTag,
  ValueRepresentation,
  Option<u32>,
  &DataSetPath,
) -> bool;

impl P10FilterTransform {
  /// Creates a new filter transform with the given predicate.
  ///
  pub fn new(predicate: Box<PredicateFunction>) -> Self {
    Self {
      predicate,
      path: DataSetPath::new(),
      path_filter_results: vec![],
      filtered_out_capture: None,
    }
  }

  /// Creates a new filter transform that also captures the data elements it
  /// removes into a data set, retrievable from
  /// [`Self::filtered_out_data_set`] once the stream ends.
  ///
  pub fn new_with_filtered_out_capture(
    predicate: Box<PredicateFunction>,
  ) -> Self {
    Self {
      filtered_out_capture: Some(DataSetBuilder::new()),
      ..Self::new(predicate)
    }
  }

  /// Returns whether the transform's current position is at the root data
  /// set, i.e. no sequences are open.
  ///
  pub fn is_at_root(&self) -> bool {
    self.path.is_empty()
  }

  /// Adds the next token and returns whether it passes the filter and
  /// should be included in the output stream.
  ///
  pub fn add_token(&mut self, token: &P10Token) -> Result<bool, P10Error> {
    let current_state = *self.path_filter_results.last().unwrap_or(&true);

    let map_path_error = |details: String| P10Error::WriteError {
      when: "Filtering P10 token stream".to_string(),
      details,
      token: token.clone(),
    };

    let filter_result = match token {
      // A new data element or sequence runs the predicate, unless an
      // enclosing element has already been filtered out
      P10Token::DataElementHeader { tag, vr, .. }
      | P10Token::SequenceStart { tag, vr, .. } => {
        let length = match token {
          P10Token::DataElementHeader { length, .. } => Some(*length),
          _ => None,
        };

        let filter_result = current_state
          && (self.predicate)(*tag, *vr, length, &self.path);

        self.path.add_data_element(*tag).map_err(map_path_error)?;
        self.path_filter_results.push(filter_result);

        filter_result
      }

      P10Token::SequenceItemStart { index } => {
        self
          .path
          .add_sequence_item(*index)
          .map_err(map_path_error)?;

        current_state
      }

      P10Token::SequenceItemDelimiter => {
        self.path.pop().map_err(map_path_error)?;

        current_state
      }

      P10Token::PixelDataItem { index, .. } => {
        self
          .path
          .add_sequence_item(*index)
          .map_err(map_path_error)?;

        self.path_filter_results.push(current_state);

        current_state
      }

      // The end of the element at the head of the path
      P10Token::SequenceDelimiter { .. }
      | P10Token::DataElementValueBytes {
        bytes_remaining: 0, ..
      } => {
        self.path.pop().map_err(map_path_error)?;
        self.path_filter_results.pop();

        current_state
      }

      _ => current_state,
    };

    // Filtered out tokens stream into the capture builder when one is
    // active
    if let Some(capture) = self.filtered_out_capture.as_mut() {
      if !filter_result && !token.is_header_token() {
        capture.add_token(token)?;
      }
    }

    Ok(filter_result)
  }

  /// Returns the data set of captured filtered-out data elements. Returns
  /// an empty data set when capture wasn't enabled.
  ///
  pub fn filtered_out_data_set(&mut self) -> Result<DataSet, P10Error> {
    match self.filtered_out_capture.as_mut() {
      Some(capture) => {
        capture.force_end();
        Ok(capture.final_data_set().unwrap_or_default())
      }

      None => Ok(DataSet::new()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dcmstream_core::dictionary;

  fn element_tokens(
    tag: DataElementTag,
    bytes: &[u8],
  ) -> Vec<P10Token> {
    let vr = ValueRepresentation::LongString;

    vec![
      P10Token::DataElementHeader {
        tag,
        vr,
        length: bytes.len() as u32,
        path: DataSetPath::new_with_data_element(tag),
      },
      P10Token::DataElementValueBytes {
        tag,
        vr,
        data: bytes.to_vec().into(),
        bytes_remaining: 0,
      },
    ]
  }

  #[test]
  fn filters_data_elements_test() {
    let mut filter =
      P10FilterTransform::new(Box::new(|tag, _vr, _length, _path| {
        tag != dictionary::PATIENT_ID.tag
      }));

    let kept: Vec<bool> = [
      element_tokens(dictionary::PATIENT_NAME.tag, b"Doe^Jane"),
      element_tokens(dictionary::PATIENT_ID.tag, b"1234"),
      vec![P10Token::End],
    ]
    .concat()
    .iter()
    .map(|token| filter.add_token(token).unwrap())
    .collect();

    assert_eq!(kept, vec![true, true, false, false, true]);
  }

  #[test]
  fn filters_whole_sequence_subtree_test() {
    let sequence_tag = dictionary::REFERENCED_IMAGE_SEQUENCE.tag;

    let mut filter =
      P10FilterTransform::new(Box::new(move |tag, _vr, _length, _path| {
        tag != sequence_tag
      }));

    let tokens: Vec<P10Token> = [
      vec![
        P10Token::SequenceStart {
          tag: sequence_tag,
          vr: ValueRepresentation::Sequence,
          path: DataSetPath::new_with_data_element(sequence_tag),
        },
        P10Token::SequenceItemStart { index: 0 },
      ],
      element_tokens(dictionary::PATIENT_ID.tag, b"1234"),
      vec![
        P10Token::SequenceItemDelimiter,
        P10Token::SequenceDelimiter { tag: sequence_tag },
      ],
    ]
    .concat();

    let kept: Vec<bool> = tokens
      .iter()
      .map(|token| filter.add_token(token).unwrap())
      .collect();

    assert_eq!(kept, vec![false; 6]);
    assert!(filter.is_at_root());
  }

  #[test]
  fn captures_filtered_out_elements_test() {
    let mut filter = P10FilterTransform::new_with_filtered_out_capture(
      Box::new(|tag, _vr, _length, _path| tag != dictionary::PATIENT_ID.tag),
    );

    for token in [
      element_tokens(dictionary::PATIENT_NAME.tag, b"Doe^Jane"),
      element_tokens(dictionary::PATIENT_ID.tag, b"1234"),
      vec![P10Token::End],
    ]
    .concat()
    {
      filter.add_token(&token).unwrap();
    }

    let filtered_out = filter.filtered_out_data_set().unwrap();

    assert_eq!(filtered_out.tags(), vec![dictionary::PATIENT_ID.tag]);
    assert_eq!(
      filtered_out.get_string(dictionary::PATIENT_ID.tag),
      Ok("1234")
    );
  }
}
