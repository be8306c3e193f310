//! A transform that renders a stream of DICOM P10 tokens as printable text.

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPrintOptions,
  ValueRepresentation, data_set::print, dictionary,
};

use crate::P10Token;

/// Converts a stream of DICOM P10 tokens into styled, width-bounded lines
/// of text describing the structure and content of the DICOM data. Output
/// is produced incrementally as tokens are added, so arbitrarily large
/// streams print with bounded memory.
///
pub struct P10PrintTransform {
  print_options: DataSetPrintOptions,

  indent: usize,
  value_max_width: usize,
  ignore_data_element_value_bytes: bool,

  // Private creator values are tracked per nesting level so private tags
  // print with their proper names where known
  private_creators: Vec<DataSet>,
  pending_private_creator_tag: Option<DataElementTag>,
}

impl P10PrintTransform {
  /// Creates a new print transform with the given print options.
  ///
  pub fn new(print_options: &DataSetPrintOptions) -> Self {
    Self {
      print_options: print_options.clone(),
      indent: 0,
      value_max_width: 0,
      ignore_data_element_value_bytes: false,
      private_creators: vec![DataSet::new()],
      pending_private_creator_tag: None,
    }
  }

  /// Adds the next DICOM P10 token and returns the text output it produces,
  /// which is often empty.
  ///
  pub fn add_token(&mut self, token: &P10Token) -> String {
    match token {
      P10Token::FileMetaInformation { data_set } => {
        let mut s = String::new();

        data_set.to_lines(&self.print_options, &mut |line| {
          s.push_str(&line);
          s.push('\n');
        });

        s
      }

      P10Token::DataElementHeader {
        tag, vr, length, ..
      } => {
        let (s, width) = print::format_data_element_prefix(
          *tag,
          self.private_creators.last().unwrap().tag_name(*tag),
          Some(*vr),
          Some(*length as usize),
          self.indent,
          &self.print_options,
        );

        self.value_max_width = core::cmp::max(
          self.print_options.max_width.saturating_sub(width),
          10,
        );

        // The next value bytes token prints a preview of this element's
        // value
        self.ignore_data_element_value_bytes = false;

        // Private creator values are kept so later private tags in this
        // data set print with their names
        self.pending_private_creator_tag = (*vr
          == ValueRepresentation::LongString
          && tag.is_private_creator())
        .then_some(*tag);

        s
      }

      P10Token::DataElementValueBytes { vr, data, .. }
        if !self.ignore_data_element_value_bytes =>
      {
        let value = DataElementValue::new_binary_unchecked(*vr, data.clone());

        // Only the first value bytes token contributes to the preview
        self.ignore_data_element_value_bytes = true;

        if let Some(tag) = self.pending_private_creator_tag.take() {
          self.private_creators.last_mut().unwrap().insert(
            tag,
            DataElementValue::new_binary_unchecked(
              ValueRepresentation::LongString,
              data.clone(),
            ),
          );
        }

        format!("{}\n", value.to_string(self.value_max_width))
      }

      P10Token::SequenceStart { tag, vr, .. } => {
        let s = print::format_data_element_prefix(
          *tag,
          self.private_creators.last().unwrap().tag_name(*tag),
          Some(*vr),
          None,
          self.indent,
          &self.print_options,
        )
        .0;

        self.indent += 1;

        format!("{s}\n")
      }

      P10Token::SequenceDelimiter { .. } => {
        self.indent = self.indent.saturating_sub(1);

        let s = print::format_data_element_prefix(
          dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
          dictionary::SEQUENCE_DELIMITATION_ITEM.name,
          None,
          None,
          self.indent,
          &self.print_options,
        )
        .0;

        format!("{s}\n")
      }

      P10Token::SequenceItemStart { .. } => {
        let s = print::format_data_element_prefix(
          dictionary::ITEM.tag,
          dictionary::ITEM.name,
          None,
          None,
          self.indent,
          &self.print_options,
        )
        .0;

        self.indent += 1;
        self.private_creators.push(DataSet::new());

        format!("{s}\n")
      }

      P10Token::SequenceItemDelimiter => {
        self.indent = self.indent.saturating_sub(1);
        self.private_creators.pop();

        let s = print::format_data_element_prefix(
          dictionary::ITEM_DELIMITATION_ITEM.tag,
          dictionary::ITEM_DELIMITATION_ITEM.name,
          None,
          None,
          self.indent,
          &self.print_options,
        )
        .0;

        format!("{s}\n")
      }

      P10Token::PixelDataItem { length, .. } => {
        let (s, width) = print::format_data_element_prefix(
          dictionary::ITEM.tag,
          dictionary::ITEM.name,
          None,
          Some(*length as usize),
          self.indent,
          &self.print_options,
        );

        self.value_max_width = core::cmp::max(
          self.print_options.max_width.saturating_sub(width),
          10,
        );

        self.ignore_data_element_value_bytes = false;

        s
      }

      _ => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dcmstream_core::DataSetPath;

  #[test]
  fn add_token_test() {
    let print_options = DataSetPrintOptions::new().styled(false).max_width(80);
    let mut transform = P10PrintTransform::new(&print_options);

    let tag = dictionary::PATIENT_ID.tag;
    let vr = ValueRepresentation::LongString;

    let header_output = transform.add_token(&P10Token::DataElementHeader {
      tag,
      vr,
      length: 4,
      path: DataSetPath::new_with_data_element(tag),
    });

    assert!(header_output.starts_with("(0010,0020) LO PatientID"));

    let value_output = transform.add_token(&P10Token::DataElementValueBytes {
      tag,
      vr,
      data: b"1234".to_vec().into(),
      bytes_remaining: 0,
    });

    assert_eq!(value_output, "\"1234\"\n");

    // A second value bytes token for the same element produces no output
    let value_output = transform.add_token(&P10Token::DataElementValueBytes {
      tag,
      vr,
      data: b"5678".to_vec().into(),
      bytes_remaining: 0,
    });

    assert_eq!(value_output, "");
  }
}
