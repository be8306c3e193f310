//! Renders a data set as styled, width-bounded lines of text.

use std::io::IsTerminal;

use crate::{DataElementTag, DataSet, ValueRepresentation, dictionary};

/// Options used when printing a data set to stdout.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DataSetPrintOptions {
  /// Whether to style the output with color and bold text. Defaults to
  /// whether stdout is a terminal that supports color.
  pub styled: bool,

  /// The maximum output width. Lines that would be longer are truncated
  /// with an ellipsis. Defaults to the detected terminal width, or 80.
  pub max_width: usize,
}

impl DataSetPrintOptions {
  /// Constructs new print options, auto-detecting output settings where
  /// possible.
  ///
  pub fn new() -> Self {
    let styled = std::io::stdout().is_terminal()
      && supports_color::on(supports_color::Stream::Stdout).is_some();

    let max_width = terminal_size::terminal_size()
      .map(|(terminal_size::Width(width), _)| usize::from(width))
      .unwrap_or(80);

    Self { styled, max_width }
  }

  /// Sets the [`DataSetPrintOptions::styled`] value.
  ///
  pub fn styled(self, styled: bool) -> Self {
    Self { styled, ..self }
  }

  /// Sets the [`DataSetPrintOptions::max_width`] value.
  ///
  pub fn max_width(self, max_width: usize) -> Self {
    Self { max_width, ..self }
  }
}

impl Default for DataSetPrintOptions {
  fn default() -> Self {
    Self::new()
  }
}

/// Recursively converts a data set to printable lines that are returned via
/// the callback.
///
pub fn data_set_to_lines(
  data_set: &DataSet,
  print_options: &DataSetPrintOptions,
  callback: &mut impl FnMut(String),
  indent: usize,
) {
  let delimiter_line = |name: &'static str,
                        tag: DataElementTag,
                        indent: usize| {
    format_data_element_prefix(tag, name, None, None, indent, print_options).0
  };

  for (tag, value) in data_set.iter() {
    let (header, header_width) = format_data_element_prefix(
      *tag,
      data_set.tag_name(*tag),
      Some(value.value_representation()),
      value.bytes().map(|bytes| bytes.len()).ok(),
      indent,
      print_options,
    );

    if let Ok(items) = value.sequence_items() {
      // Sequences print their items recursively
      callback(header);

      for item in items {
        callback(delimiter_line(
          dictionary::ITEM.name,
          dictionary::ITEM.tag,
          indent + 1,
        ));

        data_set_to_lines(item, print_options, callback, indent + 2);

        callback(delimiter_line(
          dictionary::ITEM_DELIMITATION_ITEM.name,
          dictionary::ITEM_DELIMITATION_ITEM.tag,
          indent + 1,
        ));
      }

      callback(delimiter_line(
        dictionary::SEQUENCE_DELIMITATION_ITEM.name,
        dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
        indent,
      ));
    } else if let Ok(items) = value.encapsulated_pixel_data() {
      // Encapsulated pixel data prints one line per item
      callback(header);

      for item in items {
        callback(
          format_data_element_prefix(
            dictionary::ITEM.tag,
            dictionary::ITEM.name,
            None,
            Some(item.len()),
            indent + 1,
            print_options,
          )
          .0,
        );
      }

      callback(delimiter_line(
        dictionary::SEQUENCE_DELIMITATION_ITEM.name,
        dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
        indent,
      ));
    } else {
      let value_max_width = core::cmp::max(
        print_options.max_width.saturating_sub(header_width),
        10,
      );

      callback(format!("{header}{}", value.to_string(value_max_width)));
    }
  }
}

/// Formats the details of a data element for display, excluding its value.
/// Returns the formatted string along with its printable width.
///
pub fn format_data_element_prefix(
  tag: DataElementTag,
  tag_name: &str,
  vr: Option<ValueRepresentation>,
  length: Option<usize>,
  indent: usize,
  print_options: &DataSetPrintOptions,
) -> (String, usize) {
  let tag_and_vr_width = if vr.is_some() { 15 } else { 12 };

  let header = if print_options.styled {
    match vr {
      Some(vr) => format!(
        "{}{} {}{} {}{}{}",
        BLUE, tag, GREEN, vr, RESET_TO_BOLD, tag_name, RESET
      ),
      None => {
        format!("{}{} {}{}{}", BLUE, tag, RESET_TO_BOLD, tag_name, RESET)
      }
    }
  } else {
    match vr {
      Some(vr) => format!("{} {} {}", tag, vr, tag_name),
      None => format!("{} {}", tag, tag_name),
    }
  };

  let length_text = match length {
    Some(length) => {
      let mut s = format!("[{length:6} bytes]");
      if vr.is_some() {
        s.push(' ');
      }
      s
    }
    None => "".to_string(),
  };

  let length_width = length_text.len();

  let length_text = if print_options.styled && !length_text.is_empty() {
    format!("{}{}{}", CYAN, length_text, RESET)
  } else {
    length_text
  };

  let padding = if length.is_some() {
    core::cmp::max(50 - (tag_and_vr_width + tag_name.len()) as i64, 0)
      as usize
      + 2
  } else {
    0
  };

  let s = format!(
    "{empty:indent$}{header}{empty:<padding$}{length_text}",
    empty = "",
    indent = indent * 2,
  );

  let width =
    indent * 2 + tag_and_vr_width + tag_name.len() + padding + length_width;

  (s, width)
}

// Minimal ANSI styling codes. These are used instead of a styling crate
// because the requirements here are a handful of fixed escape sequences.

const BLUE: &str = "\u{001b}[34m";
const CYAN: &str = "\u{001b}[36m";
const GREEN: &str = "\u{001b}[32m";
const RESET: &str = "\u{001b}[0m";
const RESET_TO_BOLD: &str = "\u{001b}[0m\u{001b}[1m";

#[cfg(test)]
mod tests {
  use super::*;
  use crate::DataElementValue;

  #[test]
  fn format_data_element_prefix_test() {
    let print_options =
      DataSetPrintOptions::new().styled(false).max_width(80);

    let (s, _) = format_data_element_prefix(
      dictionary::PATIENT_AGE.tag,
      dictionary::PATIENT_AGE.name,
      Some(ValueRepresentation::AgeString),
      Some(4),
      0,
      &print_options,
    );

    assert!(s.starts_with("(0010,1010) AS PatientAge"));
    assert!(s.ends_with("[     4 bytes] "));
  }

  #[test]
  fn data_set_to_lines_test() {
    let mut item = DataSet::new();
    item
      .insert_string_value(&dictionary::PATIENT_ID, &["12345"])
      .unwrap();

    let mut data_set = DataSet::new();
    data_set
      .insert_sequence_value(&dictionary::REFERENCED_IMAGE_SEQUENCE, vec![
        item,
      ])
      .unwrap();

    let print_options =
      DataSetPrintOptions::new().styled(false).max_width(80);

    let mut lines = vec![];
    data_set_to_lines(&data_set, &print_options, &mut |line| lines.push(line), 0);

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("(0008,1140) SQ ReferencedImageSequence"));
    assert!(lines[1].starts_with("  (FFFE,E000) Item"));
    assert!(lines[2].contains("(0010,0020) LO PatientID"));
    assert!(lines[2].ends_with("\"12345\""));
    assert!(lines[3].starts_with("  (FFFE,E00D) ItemDelimitationItem"));
    assert!(lines[4].starts_with("(FFFE,E0DD) SequenceDelimitationItem"));
  }
}
