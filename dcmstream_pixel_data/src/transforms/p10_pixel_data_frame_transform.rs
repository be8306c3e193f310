//! Extracts frames of pixel data from a stream of DICOM P10 tokens.

use std::collections::VecDeque;

use byteorder::ByteOrder;

use dcmstream_core::{
  DataElementValue, DataError, DataSet, DcmError, RcBytes,
  ValueRepresentation, dictionary,
};
use dcmstream_p10::{
  P10CustomTypeTransform, P10CustomTypeTransformError, P10Error,
  P10FilterTransform, P10Token,
};

use crate::PixelDataFrame;

/// Takes a stream of DICOM P10 tokens and emits the frames of pixel data it
/// contains as they complete, without copying pixel data. Native and
/// encapsulated pixel data are both supported.
///
/// For encapsulated pixel data the frame boundaries come from, in order of
/// precedence: the Extended Offset Table, a *'(0028,0008) Number of
/// Frames'* equal to the fragment count, or the Basic Offset Table. With
/// none of these, all fragments form a single frame.
///
pub struct P10PixelDataFrameTransform {
  is_encapsulated: bool,

  // Gathers the data elements that describe the pixel data
  details: P10CustomTypeTransform<PixelDataDetails>,

  // Passes only the '(7FE0,0010) Pixel Data' data element at the root
  pixel_data_filter: P10FilterTransform,

  // The size in bits of one frame of native pixel data
  native_frame_size: u64,

  // Chunks of pixel data not yet emitted as part of a frame, each with the
  // bit offset where its unconsumed data begins. Offsets are only nonzero
  // for native 1-bit pixel data.
  pixel_data: VecDeque<(RcBytes, u64)>,

  pixel_data_write_offset: u64,
  pixel_data_read_offset: u64,

  // Frame boundaries for encapsulated pixel data, read from the Basic or
  // Extended Offset Table. Entries are (offset, length), with lengths only
  // present for the Extended Offset Table.
  offset_table: Option<OffsetTable>,

  next_frame_index: usize,

  warnings: Vec<String>,
}

type OffsetTable = VecDeque<(u64, Option<u64>)>;

#[derive(Clone, Debug, PartialEq)]
struct PixelDataDetails {
  number_of_frames: Option<usize>,
  rows: u16,
  columns: u16,
  bits_allocated: u16,
  extended_offset_table: Option<DataElementValue>,
  extended_offset_table_lengths: Option<DataElementValue>,
}

impl PixelDataDetails {
  fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    let number_of_frames =
      match data_set.get_int(dictionary::NUMBER_OF_FRAMES.tag) {
        Ok(number_of_frames) => Some(number_of_frames),
        Err(e) if e.is_tag_not_present() => None,
        Err(e) => return Err(e),
      };

    Ok(Self {
      number_of_frames,
      rows: data_set.get_int(dictionary::ROWS.tag)?,
      columns: data_set.get_int(dictionary::COLUMNS.tag)?,
      bits_allocated: data_set.get_int(dictionary::BITS_ALLOCATED.tag)?,
      extended_offset_table: data_set
        .get_value(dictionary::EXTENDED_OFFSET_TABLE.tag)
        .ok()
        .cloned(),
      extended_offset_table_lengths: data_set
        .get_value(dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag)
        .ok()
        .cloned(),
    })
  }
}

/// An error from extracting frames of pixel data out of a stream of DICOM
/// P10 tokens.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10PixelDataFrameTransformError {
  /// The stream of DICOM P10 tokens was itself invalid.
  P10Error(P10Error),

  /// The pixel data or its describing data elements were invalid.
  DataError(DataError),
}

impl core::fmt::Display for P10PixelDataFrameTransformError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::P10Error(e) => e.fmt(f),
      Self::DataError(e) => e.fmt(f),
    }
  }
}

impl DcmError for P10PixelDataFrameTransformError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    match self {
      Self::P10Error(e) => e.to_lines(task_description),
      Self::DataError(e) => e.to_lines(task_description),
    }
  }
}

impl P10PixelDataFrameTransform {
  /// Creates a new transform for extracting frames of pixel data from a
  /// stream of DICOM P10 tokens.
  ///
  pub fn new() -> Self {
    let details = P10CustomTypeTransform::new(
      &[
        dictionary::NUMBER_OF_FRAMES.tag,
        dictionary::ROWS.tag,
        dictionary::COLUMNS.tag,
        dictionary::BITS_ALLOCATED.tag,
        dictionary::EXTENDED_OFFSET_TABLE.tag,
        dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag,
      ],
      PixelDataDetails::from_data_set,
    );

    let pixel_data_filter =
      P10FilterTransform::new(Box::new(|tag, _vr, _length, path| {
        tag == dictionary::PIXEL_DATA.tag && path.is_root()
      }));

    Self {
      is_encapsulated: false,
      details,
      pixel_data_filter,
      native_frame_size: 0,
      pixel_data: VecDeque::new(),
      pixel_data_write_offset: 0,
      pixel_data_read_offset: 0,
      offset_table: None,
      next_frame_index: 0,
      warnings: vec![],
    }
  }

  /// Warnings recorded while extracting frames, e.g. a frame count that
  /// disagrees with *'(0028,0008) Number of Frames'*.
  ///
  pub fn warnings(&self) -> &[String] {
    &self.warnings
  }

  /// Adds the next DICOM P10 token, returning any frames of pixel data that
  /// completed.
  ///
  pub fn add_token(
    &mut self,
    token: &P10Token,
  ) -> Result<Vec<PixelDataFrame>, P10PixelDataFrameTransformError> {
    match self.details.add_token(token) {
      Ok(()) => (),
      Err(P10CustomTypeTransformError::P10Error(e)) => {
        return Err(P10PixelDataFrameTransformError::P10Error(e));
      }
      Err(P10CustomTypeTransformError::DataError(e)) => {
        return Err(P10PixelDataFrameTransformError::DataError(e));
      }
    };

    if !token.is_header_token()
      && self
        .pixel_data_filter
        .add_token(token)
        .map_err(P10PixelDataFrameTransformError::P10Error)?
    {
      self
        .process_pixel_data_token(token)
        .map_err(P10PixelDataFrameTransformError::DataError)
    } else {
      Ok(vec![])
    }
  }

  /// Returns the value of *'(0028,0008) Number of Frames'*, defaulting to
  /// one when it is absent.
  ///
  pub fn number_of_frames(&self) -> usize {
    self
      .details
      .get_output()
      .and_then(|details| details.number_of_frames)
      .unwrap_or(1)
  }

  fn process_pixel_data_token(
    &mut self,
    token: &P10Token,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    match token {
      // The start of native pixel data
      P10Token::DataElementHeader { length, .. } => {
        self.is_encapsulated = false;

        let number_of_frames = self.number_of_frames();

        if number_of_frames > 0 {
          let details = self.details.get_output().unwrap();

          self.native_frame_size = if details.bits_allocated == 1 {
            // 1-bit frames are bit-packed with no padding between frames
            let pixel_count = u64::from(details.rows) * u64::from(details.columns);
            let expected_length =
              (pixel_count * number_of_frames as u64).div_ceil(8);

            if u64::from(*length) != expected_length {
              return Err(DataError::new_value_invalid(format!(
                "Bitmap pixel data has length {} bytes but {} bytes were \
                 expected",
                length, expected_length
              )));
            }

            pixel_count
          } else {
            if u64::from(*length) % number_of_frames as u64 != 0 {
              return Err(DataError::new_value_invalid(format!(
                "Multi-frame pixel data of length {} bytes does not divide \
                 evenly into {} frames",
                length, number_of_frames
              )));
            }

            u64::from(*length) * 8 / number_of_frames as u64
          };
        }

        Ok(vec![])
      }

      // The start of encapsulated pixel data
      P10Token::SequenceStart { .. } => {
        self.is_encapsulated = true;
        Ok(vec![])
      }

      // The end of encapsulated pixel data: any remaining fragments form
      // the final frame
      P10Token::SequenceDelimiter { .. } => {
        let mut frames = vec![];

        if !self.pixel_data.is_empty() {
          let mut frame = PixelDataFrame::new(self.next_frame_index);
          self.next_frame_index += 1;

          for (chunk, _) in self.pixel_data.drain(..) {
            frame.push_fragment(chunk);
          }

          if let Some(offset_table) = self.offset_table.as_ref() {
            if let Some((_, Some(frame_length))) = offset_table.front() {
              apply_length_to_frame(&mut frame, *frame_length)?;
            }
          }

          frames.push(frame);
        }

        // A declared frame count that disagrees with the frames actually
        // present is recorded rather than failing the read
        if let Some(number_of_frames) = self
          .details
          .get_output()
          .and_then(|details| details.number_of_frames)
        {
          if self.next_frame_index != number_of_frames {
            self.warnings.push(format!(
              "Encapsulated pixel data has {} frames but the Number of \
               Frames data element specifies {}",
              self.next_frame_index, number_of_frames
            ));
          }
        }

        Ok(frames)
      }

      // A new encapsulated pixel data item. Its 8-byte item header counts
      // towards the offsets used by the Basic Offset Table.
      P10Token::PixelDataItem { .. } => {
        self.pixel_data_write_offset += 64;
        Ok(vec![])
      }

      P10Token::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        self.pixel_data.push_back((data.clone(), 0));
        self.pixel_data_write_offset += data.len() as u64 * 8;

        if self.is_encapsulated {
          if *bytes_remaining == 0 {
            self.pending_encapsulated_frames()
          } else {
            Ok(vec![])
          }
        } else if self.native_frame_size > 0 {
          self.pending_native_frames()
        } else {
          Ok(vec![])
        }
      }

      _ => Ok(vec![]),
    }
  }

  /// Consumes native pixel data into as many complete frames as possible.
  ///
  fn pending_native_frames(
    &mut self,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    let mut frames = vec![];

    let frame_size = self.native_frame_size;

    while self.pixel_data_read_offset + frame_size
      <= self.pixel_data_write_offset
    {
      let mut frame = PixelDataFrame::new(self.next_frame_index);
      frame.set_bit_offset((self.pixel_data_read_offset % 8) as usize);

      while frame.len_bits() < frame_size {
        let (chunk, chunk_offset) = self.pixel_data.pop_front().unwrap();

        let chunk_bits = chunk.len() as u64 * 8 - chunk_offset;

        if chunk_bits <= frame_size - frame.len_bits() {
          // The rest of this chunk belongs to the current frame
          frame.push_fragment(chunk.drop_front((chunk_offset / 8) as usize));
          self.pixel_data_read_offset += chunk_bits;
        } else {
          // Take only the bits of this chunk that the frame needs, and
          // keep the remainder for the next frame
          let bits_needed = frame_size - frame.len_bits();

          frame.push_fragment(chunk.slice(
            (chunk_offset / 8) as usize,
            (chunk_offset + bits_needed).div_ceil(8) as usize,
          ));

          self
            .pixel_data
            .push_front((chunk, chunk_offset + bits_needed));
          self.pixel_data_read_offset += bits_needed;
        }
      }

      // Never emit more frames than Number of Frames specifies. 1bpp data
      // can have trailing unused bits that would otherwise read as bogus
      // extra frames when a single frame is eight bits or fewer.
      if self.next_frame_index < self.number_of_frames() {
        frames.push(frame);
      }

      self.next_frame_index += 1;
    }

    Ok(frames)
  }

  /// Consumes encapsulated pixel data fragments into as many complete
  /// frames as possible.
  ///
  fn pending_encapsulated_frames(
    &mut self,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    match self.offset_table.as_mut() {
      // The first completed item is the Basic Offset Table
      None => {
        self.offset_table = Some(self.read_offset_table()?);
        self.pixel_data.clear();
        self.pixel_data_write_offset = 0;
        self.pixel_data_read_offset = 0;

        Ok(vec![])
      }

      Some(offset_table) => {
        let mut frames = vec![];

        if offset_table.is_empty() {
          // With no offset table and more than one frame, every fragment
          // is its own frame. A single frame accumulates all fragments
          // and is emitted at the sequence delimiter instead.
          if self.number_of_frames() > 1 {
            let mut frame = PixelDataFrame::new(self.next_frame_index);
            self.next_frame_index += 1;

            for (chunk, _) in self.pixel_data.drain(..) {
              frame.push_fragment(chunk);
            }

            self.pixel_data_read_offset = self.pixel_data_write_offset;

            frames.push(frame);
          }
        } else {
          // The offset table's next entry decides where the current frame
          // ends
          while let Some((next_frame_offset, _)) =
            offset_table.get(1).copied()
          {
            if self.pixel_data_write_offset < next_frame_offset * 8 {
              break;
            }

            let mut frame = PixelDataFrame::new(self.next_frame_index);
            self.next_frame_index += 1;

            while self.pixel_data_read_offset < next_frame_offset * 8 {
              match self.pixel_data.pop_front() {
                Some((chunk, _)) => {
                  self.pixel_data_read_offset +=
                    (8 + chunk.len() as u64) * 8;
                  frame.push_fragment(chunk);
                }
                None => break,
              }
            }

            if self.pixel_data_read_offset != next_frame_offset * 8 {
              return Err(DataError::new_value_invalid(
                "Pixel data offset table is malformed".to_string(),
              ));
            }

            let (_, frame_length) = offset_table.pop_front().unwrap();

            if let Some(frame_length) = frame_length {
              apply_length_to_frame(&mut frame, frame_length)?;
            }

            frames.push(frame);
          }
        }

        Ok(frames)
      }
    }
  }

  /// Determines the offset table to use from the Basic Offset Table item
  /// and the Extended Offset Table data elements.
  ///
  fn read_offset_table(&self) -> Result<OffsetTable, DataError> {
    let basic_offset_table = self.read_basic_offset_table()?;
    let extended_offset_table = self.read_extended_offset_table()?;

    if basic_offset_table.is_empty() {
      return Ok(extended_offset_table.unwrap_or_default());
    }

    // Only one of the two offset tables is allowed. Ref: PS3.5 A.4.
    if extended_offset_table.is_some() {
      return Err(DataError::new_value_invalid(
        "Extended Offset Table must be absent when there is a Basic Offset \
         Table"
          .to_string(),
      ));
    }

    Ok(basic_offset_table)
  }

  fn read_basic_offset_table(&self) -> Result<OffsetTable, DataError> {
    let mut offset_table_data = vec![];
    for (chunk, _) in self.pixel_data.iter() {
      offset_table_data.extend_from_slice(chunk);
    }

    if offset_table_data.is_empty() {
      return Ok(VecDeque::new());
    }

    if offset_table_data.len() % 4 != 0 {
      return Err(DataError::new_value_invalid(
        "Basic Offset Table length is not a multiple of 4".to_string(),
      ));
    }

    let mut offsets = vec![0u32; offset_table_data.len() / 4];
    byteorder::LittleEndian::read_u32_into(&offset_table_data, &mut offsets);

    // The first frame's offset is always zero. Ref: PS3.5 A.4.
    if offsets.first() != Some(&0) {
      return Err(DataError::new_value_invalid(
        "Basic Offset Table first value must be zero".to_string(),
      ));
    }

    if !offsets.is_sorted() {
      return Err(DataError::new_value_invalid(
        "Basic Offset Table values are not sorted".to_string(),
      ));
    }

    Ok(offsets.iter().map(|offset| (u64::from(*offset), None)).collect())
  }

  fn read_extended_offset_table(
    &self,
  ) -> Result<Option<OffsetTable>, DataError> {
    let Some(PixelDataDetails {
      extended_offset_table: Some(extended_offset_table),
      extended_offset_table_lengths: Some(extended_offset_table_lengths),
      ..
    }) = self.details.get_output()
    else {
      return Ok(None);
    };

    let offsets = read_u64_list(
      extended_offset_table,
      "Extended Offset Table",
    )?;

    if offsets.first().copied().unwrap_or(0) != 0 {
      return Err(DataError::new_value_invalid(
        "Extended Offset Table first value must be zero".to_string(),
      ));
    }

    if !offsets.is_sorted() {
      return Err(DataError::new_value_invalid(
        "Extended Offset Table values are not sorted".to_string(),
      ));
    }

    let lengths = read_u64_list(
      extended_offset_table_lengths,
      "Extended Offset Table Lengths",
    )?;

    if offsets.len() != lengths.len() {
      return Err(DataError::new_value_invalid(
        "Extended Offset Table and Lengths don't have the same number of \
         items"
          .to_string(),
      ));
    }

    Ok(Some(
      offsets
        .iter()
        .zip(lengths.iter())
        .map(|(offset, length)| (*offset, Some(*length)))
        .collect(),
    ))
  }
}

impl Default for P10PixelDataFrameTransform {
  fn default() -> Self {
    Self::new()
  }
}

/// Reads the 64-bit little endian integers of an Extended Offset Table
/// data element value.
///
fn read_u64_list(
  value: &DataElementValue,
  name: &str,
) -> Result<Vec<u64>, DataError> {
  let bytes =
    value.vr_bytes(&[ValueRepresentation::OtherVeryLongString])?;

  if bytes.len() % 8 != 0 {
    return Err(DataError::new_value_invalid(format!(
      "{} has invalid size",
      name
    )));
  }

  let mut values = vec![0u64; bytes.len() / 8];
  byteorder::LittleEndian::read_u64_into(bytes, &mut values);

  Ok(values)
}

/// Trims a frame down to the length given by the Extended Offset Table,
/// which is how odd-length frames are stored in even-length fragments.
///
fn apply_length_to_frame(
  frame: &mut PixelDataFrame,
  frame_length: u64,
) -> Result<(), DataError> {
  let len = frame.len() as u64;

  if len > frame_length {
    frame.drop_end_bytes((len - frame_length) as usize);
  } else if len < frame_length {
    return Err(DataError::new_value_invalid(format!(
      "Extended Offset Table Length value '{}' is invalid for frame of \
       length '{}'",
      frame_length, len
    )));
  }

  Ok(())
}
