//! A transform that inserts data elements into a stream of DICOM P10
//! tokens.

use dcmstream_core::{DataElementTag, DataElementValue, DataSet, DataSetPath};

use crate::{P10Error, P10FilterTransform, P10Token, p10_token};

/// Merges a data set of data elements into the root level of a stream of
/// DICOM P10 tokens, preserving ascending tag order. On a tag collision the
/// inserted value replaces the one in the stream. Data elements inside
/// sequence items pass through untouched.
///
pub struct P10InsertTransform {
  data_elements_to_insert: Vec<(DataElementTag, DataElementValue)>,
  filter_transform: P10FilterTransform,
}

impl P10InsertTransform {
  /// Creates a new insert transform that merges the given data set into the
  /// root data set of a token stream.
  ///
  pub fn new(data_elements_to_insert: DataSet) -> Self {
    let tags_to_insert = data_elements_to_insert.tags();

    // Incoming versions of the inserted data elements are filtered out of
    // the stream so the output never holds duplicates
    let filter_transform =
      P10FilterTransform::new(Box::new(move |tag, _vr, _length, path| {
        !path.is_root() || !tags_to_insert.contains(&tag)
      }));

    Self {
      data_elements_to_insert: data_elements_to_insert
        .into_iter()
        .rev()
        .collect(),
      filter_transform,
    }
  }

  /// Adds the next token to the transform and returns the tokens of the
  /// resulting stream.
  ///
  pub fn add_token(
    &mut self,
    token: &P10Token,
  ) -> Result<Vec<P10Token>, P10Error> {
    // Once everything is inserted the stream passes straight through
    if self.data_elements_to_insert.is_empty() {
      return Ok(vec![token.clone()]);
    }

    let is_at_root = self.filter_transform.is_at_root();

    if !self.filter_transform.add_token(token)? {
      return Ok(vec![]);
    }

    // Insertion only happens at the root data set
    if !is_at_root {
      return Ok(vec![token.clone()]);
    }

    let mut output_tokens = vec![];

    match token {
      // Emit pending inserts whose tags precede the next element of the
      // stream
      P10Token::DataElementHeader { tag, path, .. }
      | P10Token::SequenceStart { tag, path, .. } => {
        while let Some(data_element) = self.data_elements_to_insert.pop() {
          if data_element.0 >= *tag {
            self.data_elements_to_insert.push(data_element);
            break;
          }

          let path_error = || P10Error::WriteError {
            when: "Inserting data elements into P10 token stream".to_string(),
            details: "Failed altering path for data element to insert"
              .to_string(),
            token: token.clone(),
          };

          let mut insert_path = path.clone();
          insert_path.pop().map_err(|_| path_error())?;
          insert_path
            .add_data_element(data_element.0)
            .map_err(|_| path_error())?;

          append_data_element_tokens(
            data_element,
            &insert_path,
            &mut output_tokens,
          );
        }

        output_tokens.push(token.clone());
      }

      // Any inserts remaining at the end of the stream are flushed before
      // the end token
      P10Token::End => {
        while let Some(data_element) = self.data_elements_to_insert.pop() {
          let path = DataSetPath::new_with_data_element(data_element.0);

          append_data_element_tokens(data_element, &path, &mut output_tokens);
        }

        output_tokens.push(P10Token::End);
      }

      _ => output_tokens.push(token.clone()),
    };

    Ok(output_tokens)
  }
}

fn append_data_element_tokens(
  data_element: (DataElementTag, DataElementValue),
  path: &DataSetPath,
  output_tokens: &mut Vec<P10Token>,
) {
  p10_token::data_element_to_tokens::<()>(
    data_element.0,
    &data_element.1,
    path,
    &mut |token: &P10Token| {
      output_tokens.push(token.clone());
      Ok(())
    },
  )
  .unwrap();
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::ValueRepresentation;

  #[test]
  fn insertion_preserves_tag_order_test() {
    let data_elements_to_insert: DataSet = [0u16, 1, 3, 4, 6, 7]
      .iter()
      .map(|group| {
        (
          DataElementTag::new(*group, 0),
          DataElementValue::new_long_text(&format!("0{group}")).unwrap(),
        )
      })
      .collect();

    let mut insert_transform = P10InsertTransform::new(data_elements_to_insert);

    let input_tokens: Vec<P10Token> = [
      tokens_for_tag(DataElementTag::new(2, 0), b"12"),
      tokens_for_tag(DataElementTag::new(5, 0), b"15"),
      tokens_for_tag(DataElementTag::new(6, 0), b"16"),
      vec![P10Token::End],
    ]
    .concat();

    let mut output_tokens = vec![];
    for token in input_tokens {
      output_tokens
        .extend_from_slice(&insert_transform.add_token(&token).unwrap());
    }

    assert_eq!(
      output_tokens,
      [
        tokens_for_tag(DataElementTag::new(0, 0), b"00"),
        tokens_for_tag(DataElementTag::new(1, 0), b"01"),
        tokens_for_tag(DataElementTag::new(2, 0), b"12"),
        tokens_for_tag(DataElementTag::new(3, 0), b"03"),
        tokens_for_tag(DataElementTag::new(4, 0), b"04"),
        tokens_for_tag(DataElementTag::new(5, 0), b"15"),
        tokens_for_tag(DataElementTag::new(6, 0), b"06"),
        tokens_for_tag(DataElementTag::new(7, 0), b"07"),
        vec![P10Token::End],
      ]
      .concat()
    );
  }

  fn tokens_for_tag(tag: DataElementTag, value_bytes: &[u8]) -> Vec<P10Token> {
    vec![
      P10Token::DataElementHeader {
        tag,
        vr: ValueRepresentation::LongText,
        length: value_bytes.len() as u32,
        path: DataSetPath::new_with_data_element(tag),
      },
      P10Token::DataElementValueBytes {
        tag,
        vr: ValueRepresentation::LongText,
        data: value_bytes.to_vec().into(),
        bytes_remaining: 0,
      },
    ]
  }
}
