//! Folds a stream of DICOM P10 tokens back into an in-memory data set.

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, RcBytes, ValueRepresentation,
  dictionary,
};

use crate::{P10Error, P10Token};

/// A data set builder is fed a stream of DICOM P10 tokens and materializes
/// them into an in-memory data set. It maintains an explicit stack of open
/// frames rather than recursing, so its depth is bounded by the reader's
/// maximum sequence depth and a partial build can always be salvaged with
/// [`DataSetBuilder::force_end`].
///
#[derive(Debug, PartialEq)]
pub struct DataSetBuilder {
  file_preamble: Option<Box<[u8; 128]>>,
  file_meta_information: Option<DataSet>,
  frames: Vec<BuilderFrame>,
  pending_data_element: Option<PendingDataElement>,
  is_complete: bool,
}

/// An open frame of the data set under construction.
///
#[derive(Debug, PartialEq)]
enum BuilderFrame {
  RootDataSet {
    data_set: DataSet,
  },
  Sequence {
    tag: DataElementTag,
    items: Vec<DataSet>,
  },
  SequenceItem {
    data_set: DataSet,
  },
  EncapsulatedPixelData {
    vr: ValueRepresentation,
    items: Vec<RcBytes>,
  },
}

/// A data element whose header token has been received but whose value
/// bytes are still arriving.
///
#[derive(Debug, PartialEq)]
struct PendingDataElement {
  tag: DataElementTag,
  vr: ValueRepresentation,
  data: Vec<RcBytes>,
}

impl DataSetBuilder {
  /// Creates a new, empty data set builder.
  ///
  pub fn new() -> Self {
    Self {
      file_preamble: None,
      file_meta_information: None,
      frames: vec![BuilderFrame::RootDataSet {
        data_set: DataSet::new(),
      }],
      pending_data_element: None,
      is_complete: false,
    }
  }

  /// Returns whether the builder has received the final [`P10Token::End`]
  /// token and its data set is complete.
  ///
  pub fn is_complete(&self) -> bool {
    self.is_complete
  }

  /// Returns the 128-byte File Preamble, if one has been received.
  ///
  pub fn file_preamble(&self) -> Option<&[u8; 128]> {
    self.file_preamble.as_deref()
  }

  /// Returns the completed data set, with the File Meta Information merged
  /// in. Errors when the token stream hasn't ended yet.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn final_data_set(&mut self) -> Result<DataSet, ()> {
    let mut data_set = match (self.is_complete, self.frames.as_mut_slice()) {
      (true, [BuilderFrame::RootDataSet { data_set }]) => {
        core::mem::take(data_set)
      }
      _ => return Err(()),
    };

    if let Some(file_meta_information) = self.file_meta_information.take() {
      data_set.merge(file_meta_information);
    }

    Ok(data_set)
  }

  /// Closes all open sequences and items and marks the builder complete, so
  /// that a partially built data set can be read out. Only needed when the
  /// source of the tokens failed or was abandoned part way.
  ///
  pub fn force_end(&mut self) {
    self.pending_data_element = None;

    while !self.is_complete {
      let token = match self.frames.last() {
        Some(BuilderFrame::Sequence { tag, .. }) => {
          P10Token::SequenceDelimiter { tag: *tag }
        }

        Some(BuilderFrame::EncapsulatedPixelData { .. }) => {
          P10Token::SequenceDelimiter {
            tag: dictionary::PIXEL_DATA.tag,
          }
        }

        Some(BuilderFrame::SequenceItem { .. }) => {
          P10Token::SequenceItemDelimiter
        }

        Some(BuilderFrame::RootDataSet { .. }) | None => P10Token::End,
      };

      self.add_token(&token).unwrap();
    }
  }

  /// Adds the next DICOM P10 token to the builder, checking that it is
  /// valid at the current position in the token stream.
  ///
  pub fn add_token(&mut self, token: &P10Token) -> Result<(), P10Error> {
    if self.is_complete {
      return Err(P10Error::WriteError {
        when: "Building data set".to_string(),
        details: "Token received after the token stream has ended"
          .to_string(),
        token: token.clone(),
      });
    }

    // A pending data element only accepts its value bytes
    if self.pending_data_element.is_some() {
      return self.add_token_to_pending_data_element(token);
    }

    match (token, self.frames.last()) {
      (P10Token::FilePreambleAndDICMPrefix { preamble }, _) => {
        self.file_preamble = Some(preamble.clone());
        Ok(())
      }

      (P10Token::FileMetaInformation { data_set }, _) => {
        self.file_meta_information = Some(data_set.clone());
        Ok(())
      }

      (
        P10Token::SequenceItemStart { .. },
        Some(BuilderFrame::Sequence { .. }),
      ) => {
        self.frames.push(BuilderFrame::SequenceItem {
          data_set: DataSet::new(),
        });

        Ok(())
      }

      (
        P10Token::SequenceDelimiter { .. },
        Some(BuilderFrame::Sequence { .. }),
      ) => {
        if let Some(BuilderFrame::Sequence { tag, items }) = self.frames.pop()
        {
          self.insert_data_element(tag, DataElementValue::new_sequence(items));
        }

        Ok(())
      }

      (
        P10Token::PixelDataItem { .. },
        Some(BuilderFrame::EncapsulatedPixelData { .. }),
      ) => {
        self.pending_data_element = Some(PendingDataElement {
          tag: dictionary::ITEM.tag,
          vr: ValueRepresentation::OtherByteString,
          data: vec![],
        });

        Ok(())
      }

      (
        P10Token::SequenceDelimiter { .. },
        Some(BuilderFrame::EncapsulatedPixelData { .. }),
      ) => {
        if let Some(BuilderFrame::EncapsulatedPixelData { vr, items }) =
          self.frames.pop()
        {
          self.insert_data_element(
            dictionary::PIXEL_DATA.tag,
            DataElementValue::new_encapsulated_pixel_data_unchecked(vr, items),
          );
        }

        Ok(())
      }

      // The remaining tokens are valid when the current frame is the root
      // data set or a sequence item
      (
        token,
        Some(BuilderFrame::RootDataSet { .. })
        | Some(BuilderFrame::SequenceItem { .. }),
      ) => self.add_token_to_data_set(token),

      (token, _) => self.unexpected_token_error(token),
    }
  }

  /// Handles the next token when the current frame is a data set, i.e. the
  /// root data set or a sequence item.
  ///
  fn add_token_to_data_set(
    &mut self,
    token: &P10Token,
  ) -> Result<(), P10Error> {
    match token {
      // A data element header opens a pending data element that collects
      // the value bytes that follow
      P10Token::DataElementHeader { tag, vr, .. } => {
        self.pending_data_element = Some(PendingDataElement {
          tag: *tag,
          vr: *vr,
          data: vec![],
        });

        Ok(())
      }

      P10Token::SequenceStart { tag, vr, .. } => {
        let frame = match vr {
          ValueRepresentation::OtherByteString
          | ValueRepresentation::OtherWordString => {
            BuilderFrame::EncapsulatedPixelData {
              vr: *vr,
              items: vec![],
            }
          }

          _ => BuilderFrame::Sequence {
            tag: *tag,
            items: vec![],
          },
        };

        self.frames.push(frame);

        Ok(())
      }

      P10Token::SequenceItemDelimiter => match self.frames.as_slice() {
        [
          ..,
          BuilderFrame::Sequence { .. },
          BuilderFrame::SequenceItem { .. },
        ] => {
          if let Some(BuilderFrame::SequenceItem { data_set }) =
            self.frames.pop()
          {
            if let Some(BuilderFrame::Sequence { items, .. }) =
              self.frames.last_mut()
            {
              items.push(data_set);
            }
          }

          Ok(())
        }

        _ => Err(P10Error::WriteError {
          when: "Building data set".to_string(),
          details: "Received sequence item delimiter token outside of an \
            item"
            .to_string(),
          token: token.clone(),
        }),
      },

      P10Token::End => match self.frames.as_slice() {
        [BuilderFrame::RootDataSet { .. }] => {
          self.is_complete = true;
          Ok(())
        }

        _ => Err(P10Error::WriteError {
          when: "Building data set".to_string(),
          details: "Received end token outside of the root data set"
            .to_string(),
          token: token.clone(),
        }),
      },

      token => self.unexpected_token_error(token),
    }
  }

  /// Handles the next token when a pending data element is collecting its
  /// value bytes.
  ///
  fn add_token_to_pending_data_element(
    &mut self,
    token: &P10Token,
  ) -> Result<(), P10Error> {
    match (token, self.pending_data_element.as_mut()) {
      (
        P10Token::DataElementValueBytes {
          data,
          bytes_remaining,
          ..
        },
        Some(pending),
      ) => {
        pending.data.push(data.clone());

        if *bytes_remaining == 0 {
          let pending = self.pending_data_element.take().unwrap();

          let value = build_data_element_value(
            pending.tag,
            pending.vr,
            &pending.data,
          );

          // A completed pixel data item appends to the encapsulated items
          // rather than the current data set
          if let (
            Some(BuilderFrame::EncapsulatedPixelData { items, .. }),
            Ok(bytes),
          ) = (self.frames.last_mut(), value.bytes())
          {
            items.push(bytes.clone());
          } else {
            self.insert_data_element(pending.tag, value);
          }
        }

        Ok(())
      }

      (token, _) => self.unexpected_token_error(token),
    }
  }

  /// Inserts a completed data element into the current frame's data set.
  ///
  fn insert_data_element(
    &mut self,
    tag: DataElementTag,
    value: DataElementValue,
  ) {
    match self.frames.last_mut() {
      Some(BuilderFrame::RootDataSet { data_set })
      | Some(BuilderFrame::SequenceItem { data_set }) => {
        data_set.insert(tag, value);
      }

      // Other frames never complete a data element
      _ => unreachable!(),
    }
  }

  fn unexpected_token_error(&self, token: &P10Token) -> Result<(), P10Error> {
    let frames = self
      .frames
      .iter()
      .map(|frame| match frame {
        BuilderFrame::RootDataSet { .. } => "RootDataSet".to_string(),
        BuilderFrame::Sequence { tag, .. } => format!("Sequence{}", tag),
        BuilderFrame::SequenceItem { .. } => "SequenceItem".to_string(),
        BuilderFrame::EncapsulatedPixelData { .. } => {
          "EncapsulatedPixelData".to_string()
        }
      })
      .collect::<Vec<String>>()
      .join(".");

    Err(P10Error::WriteError {
      when: "Building data set".to_string(),
      details: format!("Received unexpected P10 token at: {}", frames),
      token: token.clone(),
    })
  }
}

impl Default for DataSetBuilder {
  fn default() -> Self {
    Self::new()
  }
}

/// Concatenates the received value bytes of a completed data element and
/// wraps them in the right kind of data element value.
///
fn build_data_element_value(
  tag: DataElementTag,
  vr: ValueRepresentation,
  value_bytes: &[RcBytes],
) -> DataElementValue {
  let bytes: RcBytes = match value_bytes {
    [bytes] => bytes.clone(),

    _ => {
      let total_length = value_bytes.iter().map(|b| b.len()).sum();
      let mut bytes = Vec::with_capacity(total_length);

      for data in value_bytes {
        bytes.extend_from_slice(data);
      }

      bytes.into()
    }
  };

  // Lookup table descriptors interpret their bytes in a way that doesn't
  // follow directly from the VR
  if dictionary::is_lut_descriptor_tag(tag) {
    DataElementValue::new_lookup_table_descriptor_unchecked(vr, bytes)
  } else {
    DataElementValue::new_binary_unchecked(vr, bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dcmstream_core::DataSetPath;

  fn element_tokens(
    tag: DataElementTag,
    vr: ValueRepresentation,
    bytes: &[u8],
  ) -> Vec<P10Token> {
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
  fn build_simple_data_set_test() {
    let mut builder = DataSetBuilder::new();

    let tokens: Vec<P10Token> = [
      vec![P10Token::FilePreambleAndDICMPrefix {
        preamble: Box::new([0; 128]),
      }],
      vec![P10Token::FileMetaInformation {
        data_set: DataSet::new(),
      }],
      element_tokens(
        dictionary::PATIENT_ID.tag,
        ValueRepresentation::LongString,
        b"1234",
      ),
      vec![P10Token::End],
    ]
    .concat();

    for token in &tokens {
      builder.add_token(token).unwrap();
    }

    assert!(builder.is_complete());
    assert!(builder.file_preamble().is_some());

    let data_set = builder.final_data_set().unwrap();
    assert_eq!(data_set.get_string(dictionary::PATIENT_ID.tag), Ok("1234"));
  }

  #[test]
  fn build_sequence_test() {
    let mut builder = DataSetBuilder::new();

    let tokens: Vec<P10Token> = [
      vec![
        P10Token::SequenceStart {
          tag: dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
          vr: ValueRepresentation::Sequence,
          path: DataSetPath::new_with_data_element(
            dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
          ),
        },
        P10Token::SequenceItemStart { index: 0 },
      ],
      element_tokens(
        dictionary::REFERENCED_SOP_INSTANCE_UID.tag,
        ValueRepresentation::UniqueIdentifier,
        b"1.2\0",
      ),
      vec![
        P10Token::SequenceItemDelimiter,
        P10Token::SequenceDelimiter {
          tag: dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
        },
        P10Token::End,
      ],
    ]
    .concat();

    for token in &tokens {
      builder.add_token(token).unwrap();
    }

    let data_set = builder.final_data_set().unwrap();
    let items = data_set
      .get_value(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
      .unwrap()
      .sequence_items()
      .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(
      items[0].get_string(dictionary::REFERENCED_SOP_INSTANCE_UID.tag),
      Ok("1.2")
    );
  }

  #[test]
  fn build_encapsulated_pixel_data_test() {
    let mut builder = DataSetBuilder::new();

    let vr = ValueRepresentation::OtherByteString;

    let tokens = vec![
      P10Token::SequenceStart {
        tag: dictionary::PIXEL_DATA.tag,
        vr,
        path: DataSetPath::new_with_data_element(dictionary::PIXEL_DATA.tag),
      },
      P10Token::PixelDataItem {
        index: 0,
        length: 0,
      },
      P10Token::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr,
        data: RcBytes::empty(),
        bytes_remaining: 0,
      },
      P10Token::PixelDataItem {
        index: 1,
        length: 4,
      },
      P10Token::DataElementValueBytes {
        tag: dictionary::ITEM.tag,
        vr,
        data: vec![1, 2, 3, 4].into(),
        bytes_remaining: 0,
      },
      P10Token::SequenceDelimiter {
        tag: dictionary::PIXEL_DATA.tag,
      },
      P10Token::End,
    ];

    for token in &tokens {
      builder.add_token(token).unwrap();
    }

    let data_set = builder.final_data_set().unwrap();
    let items = data_set
      .get_value(dictionary::PIXEL_DATA.tag)
      .unwrap()
      .encapsulated_pixel_data()
      .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(&*items[1], &[1, 2, 3, 4]);
  }

  #[test]
  fn force_end_salvages_partial_build_test() {
    let mut builder = DataSetBuilder::new();

    let tokens: Vec<P10Token> = [
      element_tokens(
        dictionary::PATIENT_ID.tag,
        ValueRepresentation::LongString,
        b"1234",
      ),
      vec![
        P10Token::SequenceStart {
          tag: dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
          vr: ValueRepresentation::Sequence,
          path: DataSetPath::new_with_data_element(
            dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
          ),
        },
        P10Token::SequenceItemStart { index: 0 },
      ],
    ]
    .concat();

    for token in &tokens {
      builder.add_token(token).unwrap();
    }

    assert!(builder.final_data_set().is_err());

    builder.force_end();

    let data_set = builder.final_data_set().unwrap();
    assert_eq!(data_set.get_string(dictionary::PATIENT_ID.tag), Ok("1234"));
    assert!(data_set.has(dictionary::REFERENCED_IMAGE_SEQUENCE.tag));
  }

  #[test]
  fn rejects_tokens_after_end_test() {
    let mut builder = DataSetBuilder::new();

    builder.add_token(&P10Token::End).unwrap();

    assert!(matches!(
      builder.add_token(&P10Token::End),
      Err(P10Error::WriteError { .. })
    ));
  }
}
