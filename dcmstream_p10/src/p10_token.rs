//! The tokens that DICOM P10 data is broken into by the streaming reader,
//! and that the streaming writer serializes back to bytes.

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, RcBytes,
  TransferSyntax, ValueRepresentation, dictionary,
};

/// A DICOM P10 token is the smallest piece of structured DICOM P10 data. A
/// stream of these tokens is most commonly produced by progressively
/// reading raw DICOM P10 bytes, or by converting an in-memory data set for
/// serialization.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10Token {
  /// The 128-byte File Preamble and the "DICM" prefix. When the input has
  /// no preamble this token carries 128 zero bytes.
  FilePreambleAndDICMPrefix { preamble: Box<[u8; 128]> },

  /// The File Meta Information data set. When the input has no File Meta
  /// Information this token carries an empty data set.
  FileMetaInformation { data_set: DataSet },

  /// The start of the next data element. Always followed by one or more
  /// [`P10Token::DataElementValueBytes`] tokens carrying the element's
  /// value bytes.
  DataElementHeader {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    path: DataSetPath,
  },

  /// A chunk of value bytes for the current data element. Values larger
  /// than the maximum token size are split over several of these tokens,
  /// and `bytes_remaining` is zero on the final chunk.
  DataElementValueBytes {
    tag: DataElementTag,
    vr: ValueRepresentation,
    data: RcBytes,
    bytes_remaining: u32,
  },

  /// The start of a sequence. For the start of an encapsulated pixel data
  /// sequence the VR is [`ValueRepresentation::OtherByteString`] or
  /// [`ValueRepresentation::OtherWordString`], otherwise it is
  /// [`ValueRepresentation::Sequence`].
  SequenceStart {
    tag: DataElementTag,
    vr: ValueRepresentation,
    path: DataSetPath,
  },

  /// The end of the current sequence.
  SequenceDelimiter { tag: DataElementTag },

  /// The start of a new item in the current sequence.
  SequenceItemStart { index: usize },

  /// The end of the current sequence item.
  SequenceItemDelimiter,

  /// The start of a new item in the current encapsulated pixel data
  /// sequence. The item's bytes follow in one or more
  /// [`P10Token::DataElementValueBytes`] tokens.
  PixelDataItem { index: usize, length: u32 },

  /// The end of the DICOM P10 data. Emitted exactly once as the final
  /// token.
  End,
}

impl core::fmt::Display for P10Token {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      P10Token::FilePreambleAndDICMPrefix { .. } => {
        write!(f, "FilePreambleAndDICMPrefix")
      }

      P10Token::FileMetaInformation { data_set } => {
        let elements = data_set
          .iter()
          .map(|(tag, value)| {
            format!(
              "{}: {}",
              dictionary::tag_with_name(*tag, None),
              value.to_string(80)
            )
          })
          .collect::<Vec<String>>()
          .join(", ");

        write!(f, "FileMetaInformation: {elements}")
      }

      P10Token::DataElementHeader {
        tag, vr, length, ..
      } => write!(
        f,
        "DataElementHeader: {}, name: {}, vr: {}, length: {} bytes",
        tag,
        dictionary::tag_name(*tag, None),
        vr,
        length
      ),

      P10Token::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => write!(
        f,
        "DataElementValueBytes: {} bytes of data, {} bytes remaining",
        data.len(),
        bytes_remaining
      ),

      P10Token::SequenceStart { tag, vr, .. } => write!(
        f,
        "SequenceStart: {}, name: {}, vr: {}",
        tag,
        dictionary::tag_name(*tag, None),
        vr
      ),

      P10Token::SequenceDelimiter { .. } => write!(f, "SequenceDelimiter"),

      P10Token::SequenceItemStart { index } => {
        write!(f, "SequenceItemStart: item {index}")
      }

      P10Token::SequenceItemDelimiter => write!(f, "SequenceItemDelimiter"),

      P10Token::PixelDataItem { index, length } => {
        write!(f, "PixelDataItem: item {index}, {length} bytes")
      }

      P10Token::End => write!(f, "End"),
    }
  }
}

impl P10Token {
  /// Returns whether this token precedes the main data set, i.e. whether it
  /// is a [`P10Token::FilePreambleAndDICMPrefix`] or
  /// [`P10Token::FileMetaInformation`] token.
  ///
  pub fn is_header_token(&self) -> bool {
    matches!(
      self,
      P10Token::FilePreambleAndDICMPrefix { .. }
        | P10Token::FileMetaInformation { .. }
    )
  }

  /// For a [`P10Token::FileMetaInformation`] token, changes the transfer
  /// syntax it specifies. Other tokens are unchanged.
  ///
  pub fn change_transfer_syntax(
    &mut self,
    new_transfer_syntax: &TransferSyntax,
  ) {
    if let P10Token::FileMetaInformation { data_set } = self {
      data_set
        .insert_string_value(
          &dictionary::TRANSFER_SYNTAX_UID,
          &[new_transfer_syntax.uid],
        )
        .unwrap();
    }
  }
}

/// Converts all data elements of a data set into DICOM P10 tokens, returned
/// one at a time via the callback.
///
pub fn data_elements_to_tokens<E>(
  data_set: &DataSet,
  path: &DataSetPath,
  token_callback: &mut impl FnMut(&P10Token) -> Result<(), E>,
) -> Result<(), E> {
  for (tag, value) in data_set.iter() {
    let mut path = path.clone();
    path.add_data_element(*tag).unwrap();

    data_element_to_tokens(*tag, value, &path, token_callback)?;
  }

  Ok(())
}

/// Converts a single data element into DICOM P10 tokens, returned one at a
/// time via the callback.
///
pub fn data_element_to_tokens<E>(
  tag: DataElementTag,
  value: &DataElementValue,
  path: &DataSetPath,
  token_callback: &mut impl FnMut(&P10Token) -> Result<(), E>,
) -> Result<(), E> {
  let vr = value.value_representation();

  // Values with their bytes directly available are written out as-is
  if let Ok(bytes) = value.bytes() {
    token_callback(&P10Token::DataElementHeader {
      tag,
      vr,
      length: bytes.len() as u32,
      path: path.clone(),
    })?;

    return token_callback(&P10Token::DataElementValueBytes {
      tag,
      vr,
      data: bytes.clone(),
      bytes_remaining: 0,
    });
  }

  // Encapsulated pixel data is written item by item, followed by a sequence
  // delimiter
  if let Ok(items) = value.encapsulated_pixel_data() {
    token_callback(&P10Token::SequenceStart {
      tag,
      vr,
      path: path.clone(),
    })?;

    for (index, item) in items.iter().enumerate() {
      token_callback(&P10Token::PixelDataItem {
        index,
        length: item.len() as u32,
      })?;

      token_callback(&P10Token::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr,
        data: item.clone(),
        bytes_remaining: 0,
      })?;
    }

    return token_callback(&P10Token::SequenceDelimiter { tag });
  }

  // Sequences write their item data sets recursively, each item and the
  // sequence itself followed by a delimiter
  if let Ok(items) = value.sequence_items() {
    token_callback(&P10Token::SequenceStart {
      tag,
      vr,
      path: path.clone(),
    })?;

    for (index, item) in items.iter().enumerate() {
      token_callback(&P10Token::SequenceItemStart { index })?;

      let mut path = path.clone();
      path.add_sequence_item(index).unwrap();

      data_elements_to_tokens(item, &path, token_callback)?;

      token_callback(&P10Token::SequenceItemDelimiter)?;
    }

    return token_callback(&P10Token::SequenceDelimiter { tag });
  }

  // One of the branches above always applies
  unreachable!();
}
