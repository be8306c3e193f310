//! Converts incoming chunks of raw DICOM P10 bytes into DICOM P10 tokens.
//!
//! Reading is incremental: chunks of any size are written to a read context
//! with [`P10ReadContext::write_bytes`], and tokens become available from
//! [`P10ReadContext::read_tokens`] as their bytes arrive. Data that is fully
//! in memory can equally be written as a single final chunk, so the same
//! API covers streaming and one-shot reads.
//!
//! Memory usage during reading is bounded by the limits in
//! [`P10ReadConfig`].

use byteorder::ByteOrder;

use dcmstream_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, RcBytes,
  TransferSyntax, ValueRepresentation, dictionary, transfer_syntax,
};

use crate::internal::byte_stream::{ByteStream, ByteStreamError};
use crate::internal::data_element_header::{
  DataElementHeader, ValueLength, ValueLengthSize,
};
use crate::internal::p10_location::{self, P10Location};
use crate::{MaximumKind, P10Error, P10ReadConfig, P10Token};

/// A read context holds the state of an in-progress DICOM P10 read. Raw
/// bytes are added with [`Self::write_bytes`] and tokens are read out with
/// [`Self::read_tokens`].
///
#[derive(Debug)]
pub struct P10ReadContext {
  config: P10ReadConfig,
  stream: ByteStream,
  next_action: NextAction,
  transfer_syntax: &'static TransferSyntax,
  path: DataSetPath,
  location: P10Location,
  has_emitted_specific_character_set: bool,
}

/// What the read context will attempt to read next from its byte stream.
///
#[derive(Debug)]
enum NextAction {
  ReadFilePreambleAndDICMPrefix,
  ReadFileMetaInformation {
    starts_at: u64,
    ends_at: Option<u64>,
    data_set: DataSet,
  },
  ReadDataElementHeader,
  ReadDataElementValueBytes {
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
    bytes_remaining: u32,
    emit_tokens: bool,
  },
  ReadPixelDataItem {
    vr: ValueRepresentation,
  },
}

impl P10ReadContext {
  /// Creates a new read context with the given config.
  ///
  pub fn new(config: P10ReadConfig) -> Self {
    Self {
      config,
      stream: ByteStream::new(),
      next_action: NextAction::ReadFilePreambleAndDICMPrefix,
      transfer_syntax: config
        .force_transfer_syntax
        .unwrap_or(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN),
      path: DataSetPath::new(),
      location: P10Location::new(),
      has_emitted_specific_character_set: false,
    }
  }

  /// Returns the transfer syntax of the data being read. This starts as
  /// 'Implicit VR Little Endian' and is updated when the File Meta
  /// Information declares a different one, unless a forced transfer syntax
  /// is configured.
  ///
  pub fn transfer_syntax(&self) -> &'static TransferSyntax {
    self.transfer_syntax
  }

  /// Writes raw DICOM P10 bytes to the read context. `done` signals the end
  /// of the input, after which further writes error.
  ///
  /// Fails when the internal buffer would grow past the point that the
  /// configured maximum token and string sizes can explain, which happens
  /// when bytes keep being written without tokens being read out.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: RcBytes,
    done: bool,
  ) -> Result<(), P10Error> {
    let when = "Writing data to DICOM P10 read context";

    // The largest unread run that parsing can require is one fully
    // materialized string value plus one token-sized chunk and its header
    let buffer_cap = u64::from(self.config.max_string_size)
      .saturating_add(u64::from(self.config.max_token_size))
      .saturating_add(16);

    if self.stream.available() + bytes.len() as u64 > buffer_cap {
      return Err(P10Error::MaximumExceeded {
        kind: MaximumKind::TokenSize,
        details: format!(
          "Unread input buffer would exceed {} bytes; tokens must be read \
           out before more bytes are written",
          buffer_cap
        ),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      });
    }

    self
      .stream
      .write(bytes, done)
      .map_err(|e| map_byte_stream_error(e, when, &self.stream, &self.path))
  }

  /// Reads the next DICOM P10 tokens out of the read context. On success,
  /// zero or more tokens are returned and this function can be called
  /// again.
  ///
  /// A [`P10Error::DataRequired`] error means the read context needs more
  /// bytes written to it before the next token can be read.
  ///
  pub fn read_tokens(&mut self) -> Result<Vec<P10Token>, P10Error> {
    match self.next_action {
      NextAction::ReadFilePreambleAndDICMPrefix => {
        self.read_file_preamble_and_dicm_prefix_token()
      }

      NextAction::ReadFileMetaInformation { .. } => {
        self.read_file_meta_information_token()
      }

      NextAction::ReadDataElementHeader => {
        // Emit a pending delimiter for a defined-length sequence or item if
        // one is due
        if let Some(token) =
          self.location.next_delimiter_token(self.stream.bytes_read())
        {
          if matches!(
            token,
            P10Token::SequenceDelimiter { .. }
              | P10Token::SequenceItemDelimiter
          ) {
            self.path.pop().unwrap();
          }

          return Ok(vec![token]);
        }

        // At the end of the input, close any open sequences and items and
        // emit the final end token. Data truncated exactly on a data
        // element boundary is accepted.
        if self.stream.is_fully_consumed() {
          return Ok(self.location.pending_delimiter_tokens());
        }

        let is_at_root = self.path.is_empty();

        let (mut tokens, tag) = self.read_data_element_header_token()?;

        // Guarantee that a Specific Character Set data element is present
        // in the emitted token stream, inserting one that declares UTF-8
        // when the input has none
        if !self.has_emitted_specific_character_set
          && is_at_root
          && tag >= dictionary::SPECIFIC_CHARACTER_SET.tag
        {
          if tag > dictionary::SPECIFIC_CHARACTER_SET.tag {
            tokens.splice(0..0, specific_character_set_utf8_tokens());
          }

          self.has_emitted_specific_character_set = true;
        }

        Ok(tokens)
      }

      NextAction::ReadDataElementValueBytes {
        tag,
        vr,
        length,
        bytes_remaining,
        emit_tokens,
      } => self.read_data_element_value_bytes_token(
        tag,
        vr,
        length,
        bytes_remaining,
        emit_tokens,
      ),

      NextAction::ReadPixelDataItem { vr } => {
        self.read_pixel_data_item_token(vr)
      }
    }
  }

  /// Reads the 128-byte File Preamble and the "DICM" prefix that follows
  /// it. When the "DICM" bytes aren't at the expected offset the input is
  /// assumed to have no preamble: a zeroed preamble token is emitted and
  /// parsing continues from offset zero.
  ///
  fn read_file_preamble_and_dicm_prefix_token(
    &mut self,
  ) -> Result<Vec<P10Token>, P10Error> {
    let preamble = match self.stream.peek(132) {
      Ok(data) => {
        if &data[128..132] == b"DICM" {
          self.stream.read(132).map_err(|e| {
            map_byte_stream_error(
              e,
              "Reading file header",
              &self.stream,
              &self.path,
            )
          })?;

          let mut preamble = [0u8; 128];
          preamble.copy_from_slice(&data[0..128]);

          Box::new(preamble)
        } else if self.config.require_dicm_prefix {
          return Err(P10Error::DicmPrefixNotPresent);
        } else {
          Box::new([0u8; 128])
        }
      }

      // Inputs shorter than 132 bytes have no preamble
      Err(ByteStreamError::DataEnd) if !self.config.require_dicm_prefix => {
        Box::new([0u8; 128])
      }

      Err(e) => {
        return Err(map_byte_stream_error(
          e,
          "Reading file header",
          &self.stream,
          &self.path,
        ));
      }
    };

    self.next_action = NextAction::ReadFileMetaInformation {
      starts_at: self.stream.bytes_read(),
      ends_at: None,
      data_set: DataSet::new(),
    };

    Ok(vec![P10Token::FilePreambleAndDICMPrefix { preamble }])
  }

  /// Reads the File Meta Information into a data set and emits its token
  /// once complete. A *'(0002,0000) File Meta Information Group Length'*
  /// value, when present, determines where the File Meta Information ends;
  /// otherwise elements are read until one outside group 0x0002 is seen.
  ///
  fn read_file_meta_information_token(
    &mut self,
  ) -> Result<Vec<P10Token>, P10Error> {
    let NextAction::ReadFileMetaInformation {
      starts_at,
      ends_at,
      data_set: fmi_data_set,
    } = &mut self.next_action
    else {
      unreachable!();
    };

    let when = "Reading File Meta Information";

    loop {
      if let Some(ends_at) = ends_at {
        if self.stream.bytes_read() >= *ends_at {
          break;
        }
      }

      // Peek the tag, VR, and the 16-bit length field
      let data = self.stream.peek(8).map_err(|e| {
        map_byte_stream_error(e, when, &self.stream, &self.path)
      })?;

      let tag = DataElementTag::new(
        byteorder::LittleEndian::read_u16(&data[0..2]),
        byteorder::LittleEndian::read_u16(&data[2..4]),
      );

      if tag.group != 0x0002 {
        // When the length of the File Meta Information is unknown, a tag
        // outside group 0x0002 marks its end
        if ends_at.is_none() {
          break;
        }

        return Err(P10Error::DataInvalid {
          when: when.to_string(),
          details: "Data element in File Meta Information does not have the \
            group 0x0002"
            .to_string(),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      let vr =
        ValueRepresentation::from_bytes(&data[4..6]).map_err(|_| {
          P10Error::DataInvalid {
            when: when.to_string(),
            details: "Data element has invalid VR".to_string(),
            path: DataSetPath::new_with_data_element(tag),
            offset: self.stream.bytes_read(),
          }
        })?;

      if vr == ValueRepresentation::Sequence {
        return Err(P10Error::DataInvalid {
          when: when.to_string(),
          details: "Data element in File Meta Information is a sequence"
            .to_string(),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      // 32-bit lengths require another four bytes to be peeked
      let (value_offset, value_length) =
        match DataElementHeader::value_length_size(vr) {
          ValueLengthSize::U16 => (
            8usize,
            usize::from(byteorder::LittleEndian::read_u16(&data[6..8])),
          ),

          ValueLengthSize::U32 => {
            let data = self.stream.peek(12).map_err(|e| {
              map_byte_stream_error(e, when, &self.stream, &self.path)
            })?;

            (
              12usize,
              byteorder::LittleEndian::read_u32(&data[8..12]) as usize,
            )
          }
        };

      // The whole File Meta Information is bounded by the max token size
      if fmi_data_set.total_byte_size() + (value_offset + value_length) as u64
        > u64::from(self.config.max_token_size)
      {
        return Err(P10Error::MaximumExceeded {
          kind: MaximumKind::TokenSize,
          details: format!(
            "File Meta Information exceeds the max token size of {} bytes",
            self.config.max_token_size
          ),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      let data =
        self.stream.read(value_offset + value_length).map_err(|e| {
          map_byte_stream_error(
            e,
            "Reading File Meta Information data element value",
            &self.stream,
            &self.path,
          )
        })?;

      let value =
        DataElementValue::new_binary_unchecked(vr, data.drop_front(value_offset));

      // The group length element determines the end offset of the File
      // Meta Information and is not stored
      if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
        if ends_at.is_none() && fmi_data_set.is_empty() {
          match value.get_int::<u32>() {
            Ok(group_length) => {
              *ends_at = Some(*starts_at + 12 + u64::from(group_length));
            }
            Err(e) => {
              return Err(P10Error::DataInvalid {
                when: when.to_string(),
                details: format!("Group length is invalid: {e}"),
                path: DataSetPath::new_with_data_element(tag),
                offset: self.stream.bytes_read(),
              });
            }
          }
        }

        continue;
      }

      // Update the transfer syntax unless one is being forced
      if tag == dictionary::TRANSFER_SYNTAX_UID.tag
        && self.config.force_transfer_syntax.is_none()
      {
        match value.get_string() {
          Ok(uid) => {
            self.transfer_syntax =
              TransferSyntax::from_uid(uid).map_err(|_| {
                P10Error::TransferSyntaxNotSupported {
                  transfer_syntax_uid: uid.to_string(),
                }
              })?;
          }

          Err(e) => {
            return Err(P10Error::DataInvalid {
              when: when.to_string(),
              details: e.to_string(),
              path: DataSetPath::new_with_data_element(tag),
              offset: self.stream.bytes_read(),
            });
          }
        }
      }

      fmi_data_set.insert(tag, value);
    }

    // The data following deflated File Meta Information passes through
    // zlib inflate
    if self.transfer_syntax.is_deflated {
      self.stream.start_zlib_inflate();
    }

    // Record the final transfer syntax in the emitted File Meta
    // Information
    if self.transfer_syntax != &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN {
      fmi_data_set
        .insert_string_value(&dictionary::TRANSFER_SYNTAX_UID, &[
          self.transfer_syntax.uid,
        ])
        .unwrap();
    }

    let token = P10Token::FileMetaInformation {
      data_set: core::mem::take(fmi_data_set),
    };

    self.next_action = NextAction::ReadDataElementHeader;

    Ok(vec![token])
  }

  /// Reads the next data element header and emits the tokens it gives rise
  /// to, also returning the header's tag.
  ///
  fn read_data_element_header_token(
    &mut self,
  ) -> Result<(Vec<P10Token>, DataElementTag), P10Error> {
    let when = "Reading data element header";

    let header = self.read_data_element_header()?;

    // A VR of UN is inferred through the dictionary and the clarifying
    // data elements
    let vr = match header.vr {
      Some(ValueRepresentation::Unknown) => {
        Some(self.location.infer_vr_for_tag(header.tag).map_err(
          |missing_tag| P10Error::DataInvalid {
            when: format!(
              "Inferring VR for data element '{}'",
              dictionary::tag_with_name(header.tag, None)
            ),
            details: format!(
              "The value for the '{}' data element is missing or invalid",
              dictionary::tag_with_name(missing_tag, None)
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?)
      }
      vr => vr,
    };

    match (header.tag, vr, header.length) {
      // The start of a sequence. An explicit VR of UN with undefined
      // length is a sequence whose content must be read as 'Implicit VR
      // Little Endian'. Ref: DICOM Correction Proposal CP-246.
      (tag, Some(ValueRepresentation::Sequence), _)
      | (tag, Some(ValueRepresentation::Unknown), ValueLength::Undefined) => {
        self.check_data_element_ordering(&header)?;

        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        let is_implicit_vr = header.vr == Some(ValueRepresentation::Unknown);

        self
          .location
          .add_sequence(tag, is_implicit_vr, ends_at)
          .map_err(|details| P10Error::DataInvalid {
            when: when.to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        if self.path.len() / 2 >= self.config.max_sequence_depth {
          return Err(P10Error::MaximumExceeded {
            kind: MaximumKind::SequenceDepth,
            details: "Maximum allowed sequence depth reached".to_string(),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        self.path.add_data_element(tag).unwrap();

        let token = P10Token::SequenceStart {
          tag,
          vr: ValueRepresentation::Sequence,
          path: self.path.clone(),
        };

        Ok((vec![token], tag))
      }

      // The start of a sequence item
      (tag, None, _) if tag == dictionary::ITEM.tag => {
        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        let index =
          self.location.add_item(ends_at, header.length).map_err(
            |details| P10Error::DataInvalid {
              when: when.to_string(),
              details,
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            },
          )?;

        self.path.add_sequence_item(index).unwrap();

        Ok((vec![P10Token::SequenceItemStart { index }], tag))
      }

      // The start of encapsulated pixel data
      (tag, Some(vr), ValueLength::Undefined)
        if tag == dictionary::PIXEL_DATA.tag
          && (vr == ValueRepresentation::OtherByteString
            || vr == ValueRepresentation::OtherWordString) =>
      {
        self.check_data_element_ordering(&header)?;

        self.location.add_sequence(tag, false, None).map_err(
          |details| P10Error::DataInvalid {
            when: when.to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?;

        self.path.add_data_element(tag).unwrap();

        self.next_action = NextAction::ReadPixelDataItem { vr };

        let token = P10Token::SequenceStart {
          tag,
          vr,
          path: self.path.clone(),
        };

        Ok((vec![token], tag))
      }

      // The end of the current sequence. Rogue sequence delimiters outside
      // any sequence have been observed in the wild and are skipped.
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag =>
      {
        let tokens = match self.location.end_sequence() {
          Ok(tag) => {
            self.path.pop().unwrap();
            vec![P10Token::SequenceDelimiter { tag }]
          }

          Err(_) => vec![],
        };

        Ok((tokens, tag))
      }

      // The end of the current item
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::ITEM_DELIMITATION_ITEM.tag =>
      {
        self.location.end_item().map_err(|details| {
          P10Error::DataInvalid {
            when: when.to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          }
        })?;

        self.path.pop().unwrap();

        Ok((vec![P10Token::SequenceItemDelimiter], tag))
      }

      // All other data elements have their value bytes read next
      (tag, Some(vr), ValueLength::Defined { length }) => {
        self.check_data_element_ordering(&header)?;

        let materialize = self.is_materialized_value_required(tag, vr);

        // Materialized values are converted to UTF-8 in full, so they are
        // bounded by the max string size rather than the max token size
        if materialize && length > self.config.max_string_size {
          return Err(P10Error::MaximumExceeded {
            kind: MaximumKind::StringSize,
            details: format!(
              "Value for '{}' with VR {} and length {} bytes exceeds the \
               maximum allowed string size of {} bytes",
              dictionary::tag_with_name(tag, None),
              vr,
              length,
              self.config.max_string_size
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        self.path.add_data_element(tag).map_err(|_| {
          P10Error::DataInvalid {
            when: when.to_string(),
            details: format!(
              "Data element '{}' is not valid for the current path",
              header
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          }
        })?;

        // Group length elements and '(FFFC,FFFC) Data Set Trailing
        // Padding' are consumed without emitting tokens.
        // Ref: PS3.5 7.2, PS3.10 7.2.
        let emit_tokens = tag != dictionary::DATA_SET_TRAILING_PADDING.tag
          && tag.element != 0x0000;

        // The header token for a materialized value is deferred until its
        // bytes are available, because conversion to UTF-8 can change the
        // value length
        let tokens = if emit_tokens && !materialize {
          vec![P10Token::DataElementHeader {
            tag,
            vr,
            length,
            path: self.path.clone(),
          }]
        } else {
          vec![]
        };

        self.next_action = NextAction::ReadDataElementValueBytes {
          tag,
          vr,
          length,
          bytes_remaining: length,
          emit_tokens,
        };

        Ok((tokens, tag))
      }

      (_, _, _) => Err(P10Error::DataInvalid {
        when: when.to_string(),
        details: format!("Invalid data element '{}'", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      }),
    }
  }

  /// Reads a data element header: the tag, the VR when the active transfer
  /// syntax stores VRs explicitly, and the value length.
  ///
  fn read_data_element_header(
    &mut self,
  ) -> Result<DataElementHeader, P10Error> {
    let transfer_syntax = self.active_transfer_syntax();

    let tag = match self.stream.peek(4) {
      Ok(data) => {
        let (group, element) = match transfer_syntax.endianness {
          transfer_syntax::Endianness::LittleEndian => (
            byteorder::LittleEndian::read_u16(&data[0..2]),
            byteorder::LittleEndian::read_u16(&data[2..4]),
          ),

          transfer_syntax::Endianness::BigEndian => (
            byteorder::BigEndian::read_u16(&data[0..2]),
            byteorder::BigEndian::read_u16(&data[2..4]),
          ),
        };

        DataElementTag::new(group, element)
      }

      Err(e) => {
        return Err(map_byte_stream_error(
          e,
          "Reading data element header",
          &self.stream,
          &self.path,
        ));
      }
    };

    // File Meta Information data elements aren't allowed in the root of
    // the main data set. They are tolerated inside sequence items because
    // such data has been observed in the wild.
    if tag.group == 0x0002 && self.path.is_root() {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "File Meta Information data element '{}' found in the main data \
           set",
          tag
        ),
        path: DataSetPath::new_with_data_element(tag),
        offset: self.stream.bytes_read(),
      });
    }

    // Items and delimiters always use implicit VR serialization
    let is_delimiter_tag = tag == dictionary::ITEM.tag
      || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
      || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag;

    let vr_serialization = if is_delimiter_tag {
      transfer_syntax::VrSerialization::VrImplicit
    } else {
      transfer_syntax.vr_serialization
    };

    match vr_serialization {
      transfer_syntax::VrSerialization::VrExplicit => {
        self.read_explicit_vr_and_length(tag)
      }
      transfer_syntax::VrSerialization::VrImplicit => {
        self.read_implicit_vr_and_length(tag, is_delimiter_tag)
      }
    }
  }

  /// Reads the value length of a data element in an implicit VR transfer
  /// syntax. The VR itself is returned as UN for later inference, or `None`
  /// for item and delimiter tags.
  ///
  fn read_implicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
    is_delimiter_tag: bool,
  ) -> Result<DataElementHeader, P10Error> {
    let data = self.stream.read(8).map_err(|e| {
      map_byte_stream_error(
        e,
        "Reading data element header",
        &self.stream,
        &self.path,
      )
    })?;

    let length = match self.active_transfer_syntax().endianness {
      transfer_syntax::Endianness::LittleEndian => {
        byteorder::LittleEndian::read_u32(&data[4..8])
      }
      transfer_syntax::Endianness::BigEndian => {
        byteorder::BigEndian::read_u32(&data[4..8])
      }
    };

    let vr = if is_delimiter_tag {
      None
    } else {
      Some(ValueRepresentation::Unknown)
    };

    Ok(DataElementHeader {
      tag,
      vr,
      length: ValueLength::new(length),
    })
  }

  /// Reads the explicit VR and value length of a data element. The header
  /// is 8 or 12 bytes in total depending on the VR.
  ///
  fn read_explicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<DataElementHeader, P10Error> {
    let when = "Reading explicit VR data element header";

    let vr = match self.stream.peek(6) {
      Ok(data) => match ValueRepresentation::from_bytes(&data[4..6]) {
        Ok(vr) => vr,

        // VR bytes of two NULs or two spaces are read as UN unless the
        // config forbids it. Not conformant, but seen in the wild.
        Err(()) => match &data[4..6] {
          [0x00, 0x00] | [0x20, 0x20]
            if !self.config.require_explicit_vr_for_unknown_tags =>
          {
            ValueRepresentation::Unknown
          }

          vr_bytes => {
            return Err(P10Error::DataInvalid {
              when: "Reading data element VR".to_string(),
              details: format!(
                "Unrecognized VR {:?} for tag '{}'",
                vr_bytes,
                dictionary::tag_with_name(tag, None)
              ),
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            });
          }
        },
      },

      Err(e) => {
        return Err(map_byte_stream_error(e, when, &self.stream, &self.path));
      }
    };

    let header_size = match DataElementHeader::value_length_size(vr) {
      ValueLengthSize::U16 => 8,
      ValueLengthSize::U32 => 12,
    };

    let data = self.stream.read(header_size).map_err(|e| {
      map_byte_stream_error(e, when, &self.stream, &self.path)
    })?;

    let is_big = self.active_transfer_syntax().endianness.is_big();

    let length = if header_size == 12 {
      if is_big {
        byteorder::BigEndian::read_u32(&data[8..12])
      } else {
        byteorder::LittleEndian::read_u32(&data[8..12])
      }
    } else if is_big {
      byteorder::BigEndian::read_u16(&data[6..8]).into()
    } else {
      byteorder::LittleEndian::read_u16(&data[6..8]).into()
    };

    Ok(DataElementHeader {
      tag,
      vr: Some(vr),
      length: ValueLength::new(length),
    })
  }

  /// Checks that the given data element tag is greater than the previous
  /// one at the current location, when the config requires ordering.
  ///
  fn check_data_element_ordering(
    &mut self,
    header: &DataElementHeader,
  ) -> Result<(), P10Error> {
    if !self.config.require_ordered_data_elements {
      return Ok(());
    }

    self
      .location
      .check_data_element_ordering(header.tag)
      .map_err(|_| P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "Data element '{}' is not in ascending order",
          header
        ),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      })
  }

  /// Returns the transfer syntax to decode the current data with. This is
  /// the transfer syntax from the File Meta Information except inside
  /// sequences that force 'Implicit VR Little Endian' per CP-246.
  ///
  fn active_transfer_syntax(&self) -> &'static TransferSyntax {
    if self.location.is_implicit_vr_forced() {
      &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
    } else {
      self.transfer_syntax
    }
  }

  /// Reads the next chunk of value bytes for the current data element.
  ///
  fn read_data_element_value_bytes_token(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    value_length: u32,
    bytes_remaining: u32,
    emit_tokens: bool,
  ) -> Result<Vec<P10Token>, P10Error> {
    let materialize = self.is_materialized_value_required(tag, vr);

    // Materialized values are read in one piece so they can be converted
    // to UTF-8; everything else streams in chunks of up to the max token
    // size
    let bytes_to_read = if materialize {
      value_length
    } else {
      core::cmp::min(bytes_remaining, self.config.max_token_size)
    };

    let data = match self.stream.read(bytes_to_read as usize) {
      Ok(data) => data,

      // When the input ends mid-value, emit the value bytes that did
      // arrive before failing on the next read. Callers then know
      // exactly how much of the value was received.
      Err(ByteStreamError::DataEnd)
        if !materialize
          && emit_tokens
          && self.stream.available() > 0
          && (self.stream.available() as u32) < bytes_to_read =>
      {
        let available = self.stream.available() as u32;
        let mut data = self.stream.read(available as usize).unwrap();

        if self.active_transfer_syntax().endianness.is_big() {
          let mut raw_data = data.into_vec();
          self.location.swap_endianness(tag, vr, &mut raw_data);
          data = raw_data.into();
        }

        self.next_action = NextAction::ReadDataElementValueBytes {
          tag,
          vr,
          length: value_length,
          bytes_remaining: bytes_remaining - available,
          emit_tokens,
        };

        return Ok(vec![P10Token::DataElementValueBytes {
          tag,
          vr,
          data,
          bytes_remaining: bytes_remaining - available,
        }]);
      }

      Err(e) => {
        let when = format!(
          "Reading {} data element value bytes, VR: {}",
          bytes_to_read, vr
        );

        return Err(map_byte_stream_error(
          e,
          &when,
          &self.stream,
          &self.path,
        ));
      }
    };

    // Value bytes always stream in little endian
    let mut data = data;
    if self.active_transfer_syntax().endianness.is_big() {
      let mut raw_data = data.into_vec();
      self.location.swap_endianness(tag, vr, &mut raw_data);
      data = raw_data.into();
    }

    let bytes_remaining = bytes_remaining - bytes_to_read;

    let data = if materialize {
      self.process_materialized_value(tag, vr, data)?
    } else {
      data
    };

    let mut tokens = Vec::with_capacity(2);

    if emit_tokens {
      // The header token of a materialized value is emitted now that the
      // final length after UTF-8 conversion is known
      if materialize {
        let max_length = DataElementHeader::value_length_size(vr).max_length();

        if data.len() > max_length {
          return Err(P10Error::DataInvalid {
            when: "Reading data element value bytes".to_string(),
            details: format!(
              "Length of {} bytes exceeds the maximum of {} bytes after \
               conversion to UTF-8",
              data.len(),
              max_length
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        tokens.push(P10Token::DataElementHeader {
          tag,
          vr,
          length: data.len() as u32,
          path: self.path.clone(),
        });
      }

      tokens.push(P10Token::DataElementValueBytes {
        tag,
        vr,
        data,
        bytes_remaining,
      });
    }

    if bytes_remaining == 0 {
      self.path.pop().unwrap();

      // Pixel data items return to reading further items once complete
      self.next_action = if tag == dictionary::ITEM.tag {
        NextAction::ReadPixelDataItem { vr }
      } else {
        NextAction::ReadDataElementHeader
      };
    } else {
      self.next_action = NextAction::ReadDataElementValueBytes {
        tag,
        vr,
        length: value_length,
        bytes_remaining,
        emit_tokens,
      };
    }

    Ok(tokens)
  }

  /// Returns whether the given data element's value must be read in one
  /// piece rather than streamed: clarifying data elements, and string
  /// values that need conversion to UTF-8 or sanitisation against the
  /// default repertoire.
  ///
  fn is_materialized_value_required(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> bool {
    if p10_location::is_clarifying_data_element(tag) {
      return true;
    }

    if vr.is_encoded_string() {
      return !self.location.is_specific_character_set_utf8_compatible();
    }

    // ISO 646 strings should already be valid UTF-8, but data with stray
    // high bytes exists and is sanitized by replacing them
    vr.is_string()
  }

  /// Processes the value bytes of a materialized data element: character
  /// set conversion for strings and capture of clarifying data elements.
  ///
  fn process_materialized_value(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    mut value_bytes: RcBytes,
  ) -> Result<RcBytes, P10Error> {
    if vr.is_string() {
      // Private creator values are restricted to the default repertoire.
      // Ref: PS3.5 7.8.1.
      if vr.is_encoded_string() && !tag.is_private_creator() {
        value_bytes =
          self.location.decode_string_bytes(vr, &value_bytes).into();
      } else {
        let mut data = value_bytes.into_vec();
        dcmstream_charset::sanitize_default_charset_bytes(&mut data);
        value_bytes = data.into();
      }
    }

    self
      .location
      .add_clarifying_data_element(tag, vr, &mut value_bytes)?;

    Ok(value_bytes)
  }

  /// Reads the header of the next encapsulated pixel data item, or the
  /// sequence delimiter that ends the encapsulated pixel data.
  ///
  fn read_pixel_data_item_token(
    &mut self,
    vr: ValueRepresentation,
  ) -> Result<Vec<P10Token>, P10Error> {
    let header = self.read_data_element_header()?;

    match header {
      // Pixel data items have no VR and a defined length
      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::Defined { length },
      } if tag == dictionary::ITEM.tag => {
        self.next_action = NextAction::ReadDataElementValueBytes {
          tag: dictionary::ITEM.tag,
          vr,
          length,
          bytes_remaining: length,
          emit_tokens: true,
        };

        let index =
          self.location.add_pixel_data_item().map_err(|details| {
            P10Error::DataInvalid {
              when: "Reading encapsulated pixel data item".to_string(),
              details,
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            }
          })?;

        self.path.add_sequence_item(index).unwrap();

        Ok(vec![P10Token::PixelDataItem { index, length }])
      }

      DataElementHeader {
        tag,
        vr: None,
        length: ValueLength::ZERO,
      } if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag => {
        self.location.end_sequence().map_err(|details| {
          P10Error::DataInvalid {
            when: "Reading encapsulated pixel data item".to_string(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          }
        })?;

        self.path.pop().unwrap();

        self.next_action = NextAction::ReadDataElementHeader;

        Ok(vec![P10Token::SequenceDelimiter {
          tag: dictionary::PIXEL_DATA.tag,
        }])
      }

      _ => Err(P10Error::DataInvalid {
        when: "Reading encapsulated pixel data item".to_string(),
        details: format!("Invalid data element '{}'", header),
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      }),
    }
  }
}

impl Default for P10ReadContext {
  fn default() -> Self {
    Self::new(P10ReadConfig::default())
  }
}

/// The two tokens for a '(0008,0005) Specific Character Set' data element
/// declaring UTF-8 (ISO_IR 192).
///
fn specific_character_set_utf8_tokens() -> [P10Token; 2] {
  let tag = dictionary::SPECIFIC_CHARACTER_SET.tag;
  let vr = ValueRepresentation::CodeString;
  let data = b"ISO_IR 192";

  [
    P10Token::DataElementHeader {
      tag,
      vr,
      length: data.len() as u32,
      path: DataSetPath::new(),
    },
    P10Token::DataElementValueBytes {
      tag,
      vr,
      data: data.to_vec().into(),
      bytes_remaining: 0,
    },
  ]
}

/// Maps a byte stream error to the equivalent P10 error.
///
fn map_byte_stream_error(
  error: ByteStreamError,
  when: &str,
  stream: &ByteStream,
  path: &DataSetPath,
) -> P10Error {
  let offset = stream.bytes_read();

  match error {
    ByteStreamError::DataRequired => P10Error::DataRequired {
      when: when.to_string(),
    },

    ByteStreamError::DataEnd => P10Error::PrematureEnd {
      when: when.to_string(),
      path: path.clone(),
      offset,
    },

    ByteStreamError::ZlibDataError => P10Error::DataInvalid {
      when: when.to_string(),
      details: "Zlib data is invalid".to_string(),
      path: path.clone(),
      offset,
    },

    ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
  }
}
