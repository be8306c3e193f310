//! Serializes streams of DICOM P10 tokens, and whole data sets, into raw
//! DICOM P10 bytes.

use byteorder::ByteOrder;

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, RcBytes,
  TransferSyntax, dictionary, transfer_syntax, transfer_syntax::Endianness,
};

use crate::internal::data_element_header::{
  DataElementHeader, ValueLength, ValueLengthSize,
};
use crate::{
  P10Error, P10FilterTransform, P10InsertTransform, P10Token, P10WriteConfig,
  p10_token,
};

/// Data is compressed in chunks of this size when writing a deflated
/// transfer syntax.
///
const ZLIB_DEFLATE_CHUNK_SIZE: usize = 64 * 1024;

/// A write context holds the state of an in-progress DICOM P10 write.
/// Tokens are written with [`Self::write_token`], and the serialized bytes
/// are drained with [`Self::read_bytes`], allowing a slow sink to exert
/// backpressure.
///
pub struct P10WriteContext {
  config: P10WriteConfig,
  p10_bytes: Vec<RcBytes>,
  p10_total_byte_count: u64,
  is_ended: bool,
  transfer_syntax: &'static TransferSyntax,
  zlib_stream: Option<flate2::Compress>,
  path: DataSetPath,
  sequence_item_counts: Vec<usize>,
  last_tags: Vec<DataElementTag>,
}

impl P10WriteContext {
  /// Creates a new write context with the given config.
  ///
  pub fn new(config: P10WriteConfig) -> Self {
    Self {
      config,
      p10_bytes: vec![],
      p10_total_byte_count: 0,
      is_ended: false,
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      zlib_stream: None,
      path: DataSetPath::new(),
      sequence_item_counts: vec![],
      last_tags: vec![DataElementTag::ZERO],
    }
  }

  /// Drains the DICOM P10 bytes generated by recent calls to
  /// [`Self::write_token`].
  ///
  pub fn read_bytes(&mut self) -> Vec<RcBytes> {
    core::mem::take(&mut self.p10_bytes)
  }

  /// Writes a DICOM P10 token to the write context. The bytes it generates
  /// are appended to the pending output, retrievable with
  /// [`Self::read_bytes`].
  ///
  pub fn write_token(&mut self, token: &P10Token) -> Result<(), P10Error> {
    if self.is_ended {
      return Err(P10Error::WriteError {
        when: "Writing DICOM P10 token".to_string(),
        details: "Received a further token after the write was completed"
          .to_string(),
        token: token.clone(),
      });
    }

    match token {
      P10Token::FilePreambleAndDICMPrefix { preamble } => {
        let preamble = match &self.config.preamble {
          Some(preamble) => preamble,
          None => preamble,
        };

        let mut bytes = Vec::with_capacity(132);
        bytes.extend_from_slice(preamble.as_ref());
        bytes.extend_from_slice(b"DICM");

        self.push_bytes(bytes.into());

        Ok(())
      }

      // The File Meta Information sets the transfer syntax for the rest of
      // the write, and starts a zlib compressor when it's deflated
      P10Token::FileMetaInformation { data_set } => {
        let mut fmi = data_set.clone();

        if let Some(transfer_syntax) = self.config.transfer_syntax_override {
          fmi
            .insert_string_value(&dictionary::TRANSFER_SYNTAX_UID, &[
              transfer_syntax.uid,
            ])
            .unwrap();
        }

        let transfer_syntax_uid = fmi
          .get_string(dictionary::TRANSFER_SYNTAX_UID.tag)
          .unwrap_or(transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN.uid);

        self.transfer_syntax = TransferSyntax::from_uid(transfer_syntax_uid)
          .map_err(|_| P10Error::TransferSyntaxNotSupported {
            transfer_syntax_uid: transfer_syntax_uid.to_string(),
          })?;

        if self.transfer_syntax.is_deflated {
          self.zlib_stream = Some(flate2::Compress::new(
            flate2::Compression::new(self.config.zlib_compression_level),
            false,
          ));
        }

        let fmi_bytes = self.file_meta_information_to_bytes(fmi)?;
        self.push_bytes(fmi_bytes);

        Ok(())
      }

      // The end token flushes any remaining deflated data
      P10Token::End => {
        if let Some(zlib_stream) = self.zlib_stream.as_mut() {
          loop {
            let mut output = vec![0u8; ZLIB_DEFLATE_CHUNK_SIZE];

            let total_out = zlib_stream.total_out();
            let status = zlib_stream
              .compress(&[], &mut output, flate2::FlushCompress::Finish)
              .unwrap();
            output.truncate((zlib_stream.total_out() - total_out) as usize);

            if !output.is_empty() {
              self.p10_total_byte_count += output.len() as u64;
              self.p10_bytes.push(output.into());
            }

            if status == flate2::Status::StreamEnd {
              break;
            }
          }

          self.zlib_stream = None;
        }

        self.is_ended = true;

        Ok(())
      }

      _ => {
        self.check_token_stream_position(token)?;

        let token_bytes = self.token_to_bytes(token)?;

        // Update the path and ordering state now that the token is known
        // to serialize
        let pop_path = |path: &mut DataSetPath| {
          path.pop().map_err(|details| P10Error::WriteError {
            when: "Writing token to write context".to_string(),
            details,
            token: token.clone(),
          })
        };

        match token {
          P10Token::DataElementValueBytes {
            bytes_remaining: 0, ..
          } => pop_path(&mut self.path)?,

          P10Token::SequenceItemDelimiter => {
            self.last_tags.pop();
            pop_path(&mut self.path)?;
          }

          P10Token::SequenceDelimiter { .. } => {
            self.sequence_item_counts.pop();
            pop_path(&mut self.path)?;
          }

          _ => (),
        };

        // Deflated transfer syntaxes pass the bytes through the zlib
        // compressor
        if self.zlib_stream.is_some() {
          self.deflate_bytes(&token_bytes);
        } else {
          self.push_bytes(token_bytes);
        }

        Ok(())
      }
    }
  }

  /// Validates that a token is acceptable at the current position in the
  /// token stream: brackets must balance and data elements must be in
  /// ascending tag order. Updates the position state for accepted tokens.
  ///
  fn check_token_stream_position(
    &mut self,
    token: &P10Token,
  ) -> Result<(), P10Error> {
    let write_error = |details: String| P10Error::WriteError {
      when: "Writing token to write context".to_string(),
      details,
      token: token.clone(),
    };

    match token {
      P10Token::DataElementHeader { tag, .. }
      | P10Token::SequenceStart { tag, .. } => {
        let last_tag = self.last_tags.last_mut().ok_or_else(|| {
          write_error("Data element is not inside an item".to_string())
        })?;

        if *tag <= *last_tag {
          return Err(write_error(format!(
            "Data element '{}' is not in ascending order",
            dictionary::tag_with_name(*tag, None)
          )));
        }

        *last_tag = *tag;

        if let P10Token::SequenceStart { .. } = token {
          self.sequence_item_counts.push(0);
        }

        self
          .path
          .add_data_element(*tag)
          .map_err(&write_error)?;
      }

      P10Token::SequenceItemStart { .. } | P10Token::PixelDataItem { .. } => {
        let index =
          self.sequence_item_counts.last_mut().ok_or_else(|| {
            write_error("Item is not inside a sequence".to_string())
          })?;

        *index += 1;

        self
          .path
          .add_sequence_item(*index - 1)
          .map_err(&write_error)?;

        if let P10Token::SequenceItemStart { .. } = token {
          self.last_tags.push(DataElementTag::ZERO);
        }
      }

      _ => (),
    }

    Ok(())
  }

  /// Serializes a single token to raw DICOM P10 bytes.
  ///
  fn token_to_bytes(&self, token: &P10Token) -> Result<RcBytes, P10Error> {
    match token {
      P10Token::DataElementHeader { tag, vr, length, .. } => {
        let vr = match self.transfer_syntax.vr_serialization {
          transfer_syntax::VrSerialization::VrExplicit => Some(*vr),
          transfer_syntax::VrSerialization::VrImplicit => None,
        };

        self.data_element_header_to_bytes(
          &DataElementHeader {
            tag: *tag,
            vr,
            length: ValueLength::new(*length),
          },
          self.transfer_syntax.endianness,
        )
      }

      P10Token::DataElementValueBytes { vr, data, .. } => {
        if self.transfer_syntax.endianness.is_big() {
          let mut data = data.clone().into_vec();
          vr.swap_endianness(&mut data);
          Ok(data.into())
        } else {
          Ok(data.clone())
        }
      }

      P10Token::SequenceStart { tag, vr, .. } => {
        let vr = match self.transfer_syntax.vr_serialization {
          transfer_syntax::VrSerialization::VrExplicit => Some(*vr),
          transfer_syntax::VrSerialization::VrImplicit => None,
        };

        self.data_element_header_to_bytes(
          &DataElementHeader {
            tag: *tag,
            vr,
            length: ValueLength::Undefined,
          },
          self.transfer_syntax.endianness,
        )
      }

      P10Token::SequenceDelimiter { .. } => self
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::SEQUENCE_DELIMITATION_ITEM.tag,
            vr: None,
            length: ValueLength::ZERO,
          },
          self.transfer_syntax.endianness,
        ),

      P10Token::SequenceItemStart { .. } => self
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::ITEM.tag,
            vr: None,
            length: ValueLength::Undefined,
          },
          self.transfer_syntax.endianness,
        ),

      P10Token::SequenceItemDelimiter => self.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::ITEM_DELIMITATION_ITEM.tag,
          vr: None,
          length: ValueLength::ZERO,
        },
        self.transfer_syntax.endianness,
      ),

      P10Token::PixelDataItem { length, .. } => self
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::ITEM.tag,
            vr: None,
            length: ValueLength::new(*length),
          },
          self.transfer_syntax.endianness,
        ),

      P10Token::FilePreambleAndDICMPrefix { .. }
      | P10Token::FileMetaInformation { .. }
      | P10Token::End => unreachable!(),
    }
  }

  /// Serializes File Meta Information in 'Explicit VR Little Endian' with
  /// a recomputed *'(0002,0000) File Meta Information Group Length'* and
  /// this library's implementation details. Ref: PS3.10 7.1.
  ///
  fn file_meta_information_to_bytes(
    &self,
    mut fmi: DataSet,
  ) -> Result<RcBytes, P10Error> {
    fmi.insert(
      dictionary::FILE_META_INFORMATION_VERSION.tag,
      DataElementValue::new_other_byte_string(vec![0, 1]).unwrap(),
    );

    fmi.insert(
      dictionary::IMPLEMENTATION_CLASS_UID.tag,
      DataElementValue::new_unique_identifier(&[
        &self.config.implementation_class_uid,
      ])
      .map_err(|_| P10Error::DataInvalid {
        when: "Serializing File Meta Information".to_string(),
        details: "Implementation class UID is invalid".to_string(),
        path: DataSetPath::new_with_data_element(
          dictionary::IMPLEMENTATION_CLASS_UID.tag,
        ),
        offset: self.p10_total_byte_count,
      })?,
    );

    fmi.insert(
      dictionary::IMPLEMENTATION_VERSION_NAME.tag,
      DataElementValue::new_short_string(&[
        &self.config.implementation_version_name,
      ])
      .map_err(|_| P10Error::DataInvalid {
        when: "Serializing File Meta Information".to_string(),
        details: "Implementation version name is invalid".to_string(),
        path: DataSetPath::new_with_data_element(
          dictionary::IMPLEMENTATION_VERSION_NAME.tag,
        ),
        offset: self.p10_total_byte_count,
      })?,
    );

    let mut fmi_bytes = Vec::with_capacity(256);

    // The group length element is written with a placeholder length that
    // is filled in once the rest of the bytes are known
    fmi_bytes
      .extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x55, 0x4C, 0x04, 0x00]);
    fmi_bytes.extend_from_slice(&[0, 0, 0, 0]);

    for (tag, value) in fmi.into_iter() {
      if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
        continue;
      }

      let vr = value.value_representation();

      let value_bytes = value.bytes().map_err(|_| P10Error::DataInvalid {
        when: "Serializing File Meta Information".to_string(),
        details: format!(
          "Tag '{}' with value representation '{}' is not allowed in File \
           Meta Information",
          tag, vr
        ),
        path: self.path.clone(),
        offset: self.p10_total_byte_count,
      })?;

      let header_bytes = self.data_element_header_to_bytes(
        &DataElementHeader {
          tag,
          vr: Some(vr),
          length: ValueLength::new(value_bytes.len() as u32),
        },
        Endianness::LittleEndian,
      )?;

      fmi_bytes.extend_from_slice(&header_bytes);
      fmi_bytes.extend_from_slice(value_bytes);
    }

    let group_length = fmi_bytes.len() as u32 - 12;
    byteorder::LittleEndian::write_u32(
      &mut fmi_bytes[8..12],
      group_length,
    );

    Ok(fmi_bytes.into())
  }

  /// Serializes a data element header. A header without a VR is written in
  /// implicit VR form.
  ///
  fn data_element_header_to_bytes(
    &self,
    header: &DataElementHeader,
    endianness: Endianness,
  ) -> Result<RcBytes, P10Error> {
    let length = header.length.to_u32();

    let mut bytes = Vec::with_capacity(12);

    let push_u16 = |bytes: &mut Vec<u8>, value: u16| match endianness {
      Endianness::LittleEndian => {
        bytes.extend_from_slice(&value.to_le_bytes())
      }
      Endianness::BigEndian => bytes.extend_from_slice(&value.to_be_bytes()),
    };

    let push_u32 = |bytes: &mut Vec<u8>, value: u32| match endianness {
      Endianness::LittleEndian => {
        bytes.extend_from_slice(&value.to_le_bytes())
      }
      Endianness::BigEndian => bytes.extend_from_slice(&value.to_be_bytes()),
    };

    push_u16(&mut bytes, header.tag.group);
    push_u16(&mut bytes, header.tag.element);

    match header.vr {
      None => push_u32(&mut bytes, length),

      Some(vr) => {
        bytes.extend_from_slice(&vr.to_bytes());

        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => {
            if length > 0xFFFF {
              return Err(P10Error::DataInvalid {
                when: "Serializing data element header".to_string(),
                details: format!(
                  "Length 0x{:X} exceeds the maximum of 0xFFFF",
                  length
                ),
                path: self.path.clone(),
                offset: self.p10_total_byte_count,
              });
            }

            push_u16(&mut bytes, length as u16);
          }

          // 32-bit lengths are preceded by two reserved bytes
          ValueLengthSize::U32 => {
            bytes.extend_from_slice(&[0, 0]);
            push_u32(&mut bytes, length);
          }
        }
      }
    }

    Ok(bytes.into())
  }

  fn push_bytes(&mut self, bytes: RcBytes) {
    self.p10_total_byte_count += bytes.len() as u64;
    self.p10_bytes.push(bytes);
  }

  /// Passes bytes through the active zlib compressor, appending any
  /// compressed output to the pending P10 bytes.
  ///
  fn deflate_bytes(&mut self, bytes: &[u8]) {
    let zlib_stream = self.zlib_stream.as_mut().unwrap();

    let mut remaining = bytes;

    while !remaining.is_empty() {
      let mut output = vec![0u8; ZLIB_DEFLATE_CHUNK_SIZE];

      let total_in = zlib_stream.total_in();
      let total_out = zlib_stream.total_out();

      zlib_stream
        .compress(remaining, &mut output, flate2::FlushCompress::None)
        .unwrap();

      output.truncate((zlib_stream.total_out() - total_out) as usize);

      if !output.is_empty() {
        self.p10_total_byte_count += output.len() as u64;
        self.p10_bytes.push(output.into());
      }

      let consumed = (zlib_stream.total_in() - total_in) as usize;
      assert!(consumed > 0, "zlib compressor consumed no bytes");

      remaining = &remaining[consumed..];
    }
  }
}

impl Default for P10WriteContext {
  fn default() -> Self {
    Self::new(P10WriteConfig::default())
  }
}

/// Converts a data set into a stream of DICOM P10 tokens, returned one at a
/// time via the callback: preamble, File Meta Information, then the main
/// data set with a guaranteed *'(0008,0005) Specific Character Set'* of
/// UTF-8, and a final end token.
///
pub fn data_set_to_tokens<E>(
  data_set: &DataSet,
  path: &DataSetPath,
  token_callback: &mut impl FnMut(&P10Token) -> Result<(), E>,
) -> Result<(), E> {
  // File Meta Information data elements are carried by the File Meta
  // Information token, not the main data set token stream
  let mut remove_fmi_transform =
    P10FilterTransform::new(Box::new(|tag, _vr, _length, _path| {
      tag.group != 0x0002
    }));

  // All strings in an in-memory data set are UTF-8, which the emitted
  // stream declares explicitly
  let mut charset_data_set = DataSet::new();
  charset_data_set
    .insert_string_value(&dictionary::SPECIFIC_CHARACTER_SET, &["ISO_IR 192"])
    .unwrap();
  let mut insert_charset_transform =
    P10InsertTransform::new(charset_data_set);

  let mut process_token = |token: &P10Token| -> Result<(), E> {
    if !token.is_header_token() && !matches!(token, P10Token::End) {
      // Filtering a freshly generated token stream can't fail
      if !remove_fmi_transform.add_token(token).unwrap() {
        return Ok(());
      }

      for token in insert_charset_transform.add_token(token).unwrap() {
        token_callback(&token)?;
      }

      return Ok(());
    }

    token_callback(token)
  };

  process_token(&P10Token::FilePreambleAndDICMPrefix {
    preamble: Box::new([0; 128]),
  })?;

  process_token(&P10Token::FileMetaInformation {
    data_set: data_set.file_meta_information(),
  })?;

  p10_token::data_elements_to_tokens(data_set, path, &mut process_token)?;

  // End is routed through the insert transform so any remaining data
  // elements to insert are flushed first
  for token in insert_charset_transform.add_token(&P10Token::End).unwrap() {
    token_callback(&token)?;
  }

  Ok(())
}

/// Converts a data set into DICOM P10 bytes, returned in chunks via the
/// callback.
///
pub fn data_set_to_bytes(
  data_set: &DataSet,
  bytes_callback: &mut impl FnMut(RcBytes) -> Result<(), P10Error>,
  config: P10WriteConfig,
) -> Result<(), P10Error> {
  let mut context = P10WriteContext::new(config);

  data_set_to_tokens(
    data_set,
    &DataSetPath::new(),
    &mut |token: &P10Token| -> Result<(), P10Error> {
      context.write_token(token)?;

      for bytes in context.read_bytes() {
        bytes_callback(bytes)?;
      }

      Ok(())
    },
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  use dcmstream_core::ValueRepresentation;

  #[test]
  fn data_element_header_to_bytes_test() {
    let context = P10WriteContext::default();

    assert_eq!(
      context
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::WAVEFORM_DATA.tag,
            vr: None,
            length: ValueLength::new(0x12345678),
          },
          Endianness::LittleEndian,
        )
        .as_deref(),
      Ok([0x00, 0x54, 0x10, 0x10, 0x78, 0x56, 0x34, 0x12].as_slice())
    );

    assert_eq!(
      context
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::WAVEFORM_DATA.tag,
            vr: None,
            length: ValueLength::new(0x12345678),
          },
          Endianness::BigEndian,
        )
        .as_deref(),
      Ok([0x54, 0x00, 0x10, 0x10, 0x12, 0x34, 0x56, 0x78].as_slice())
    );

    assert_eq!(
      context
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::PATIENT_AGE.tag,
            vr: Some(ValueRepresentation::UnlimitedText),
            length: ValueLength::new(0x1234),
          },
          Endianness::LittleEndian,
        )
        .as_deref(),
      Ok(
        [0x10, 0x00, 0x10, 0x10, 0x55, 0x54, 0x00, 0x00, 0x34, 0x12, 0x00,
          0x00]
          .as_slice()
      )
    );

    assert_eq!(
      context
        .data_element_header_to_bytes(
          &DataElementHeader {
            tag: dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag,
            vr: Some(ValueRepresentation::SignedShort),
            length: ValueLength::new(0x1234),
          },
          Endianness::LittleEndian,
        )
        .as_deref(),
      Ok([0x28, 0x00, 0x06, 0x01, 0x53, 0x53, 0x34, 0x12].as_slice())
    );

    assert_eq!(
      context.data_element_header_to_bytes(
        &DataElementHeader {
          tag: dictionary::PATIENT_AGE.tag,
          vr: Some(ValueRepresentation::AgeString),
          length: ValueLength::new(0x12345),
        },
        Endianness::LittleEndian,
      ),
      Err(P10Error::DataInvalid {
        when: "Serializing data element header".to_string(),
        details: "Length 0x12345 exceeds the maximum of 0xFFFF".to_string(),
        path: DataSetPath::new(),
        offset: 0
      })
    );
  }

  #[test]
  fn out_of_order_tokens_are_rejected_test() {
    let mut context = P10WriteContext::default();

    let header = |group: u16| P10Token::DataElementHeader {
      tag: DataElementTag::new(group, 0x0010),
      vr: ValueRepresentation::UnsignedShort,
      length: 2,
      path: DataSetPath::new(),
    };

    let value_bytes = P10Token::DataElementValueBytes {
      tag: DataElementTag::new(0x0028, 0x0010),
      vr: ValueRepresentation::UnsignedShort,
      data: vec![0, 0].into(),
      bytes_remaining: 0,
    };

    assert!(context.write_token(&header(0x0028)).is_ok());
    assert!(context.write_token(&value_bytes).is_ok());

    assert!(matches!(
      context.write_token(&header(0x0010)),
      Err(P10Error::WriteError { .. })
    ));
  }
}
