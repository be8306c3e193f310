//! A byte stream that accepts incoming chunks of binary data of any size
//! and lets the result be read and peeked as one contiguous stream.
//!
//! Incoming bytes can optionally be passed through streaming zlib inflate
//! before being made available, which is used for deflated transfer
//! syntaxes.

use std::collections::VecDeque;

use dcmstream_core::RcBytes;

/// Zlib data is inflated in chunks of at most this size so that a zlib bomb
/// can't balloon memory.
///
const ZLIB_INFLATE_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct ByteStream {
  chunks: VecDeque<RcBytes>,
  chunks_size: u64,
  bytes_read: u64,
  is_writing_finished: bool,
  zlib_stream: Option<flate2::Decompress>,
  zlib_input: VecDeque<RcBytes>,
  zlib_inflate_complete: bool,
}

#[derive(Debug, PartialEq)]
pub enum ByteStreamError {
  /// The byte stream doesn't hold the requested number of bytes and more
  /// bytes need to be written to it first.
  DataRequired,

  /// The read would go past the end of the byte stream.
  DataEnd,

  /// Bytes written to a byte stream with zlib inflate active were not valid
  /// zlib data.
  ZlibDataError,

  /// Bytes were written after the stream's final bytes had already been
  /// written.
  WriteAfterCompletion,
}

impl ByteStream {
  /// Creates a new empty byte stream.
  ///
  pub fn new() -> Self {
    Self {
      chunks: VecDeque::new(),
      chunks_size: 0,
      bytes_read: 0,
      is_writing_finished: false,
      zlib_stream: None,
      zlib_input: VecDeque::new(),
      zlib_inflate_complete: false,
    }
  }

  /// Returns the total number of bytes read out of this byte stream so far.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.bytes_read
  }

  /// Returns the number of bytes currently available to read without
  /// further writes. When zlib inflate is active this only counts bytes
  /// that have already been inflated.
  ///
  pub fn available(&self) -> u64 {
    self.chunks_size
  }

  /// Returns whether the final bytes have been written to this byte stream.
  ///
  pub fn is_writing_finished(&self) -> bool {
    self.is_writing_finished
  }

  /// Returns whether the byte stream is fully consumed: all written bytes
  /// have been read and the final bytes have been written.
  ///
  pub fn is_fully_consumed(&self) -> bool {
    self.chunks_size == 0
      && self.is_writing_finished
      && (self.zlib_stream.is_none() || self.zlib_inflate_complete)
  }

  /// Writes bytes to the byte stream. `done` signals that no more bytes
  /// will follow, after which further writes error.
  ///
  pub fn write(
    &mut self,
    data: RcBytes,
    done: bool,
  ) -> Result<(), ByteStreamError> {
    if self.is_writing_finished {
      return Err(ByteStreamError::WriteAfterCompletion);
    }

    self.is_writing_finished = done;

    if data.is_empty() {
      return Ok(());
    }

    if self.zlib_stream.is_some() {
      self.zlib_input.push_back(data);
    } else {
      self.chunks_size += data.len() as u64;
      self.chunks.push_back(data);
    }

    Ok(())
  }

  /// Reads the given number of bytes out of the byte stream.
  ///
  pub fn read(
    &mut self,
    byte_count: usize,
  ) -> Result<RcBytes, ByteStreamError> {
    if byte_count == 0 {
      return Ok(RcBytes::empty());
    }

    self.inflate_up_to_read_size(byte_count)?;

    if byte_count as u64 > self.chunks_size {
      if self.is_writing_finished {
        return Err(ByteStreamError::DataEnd);
      } else {
        return Err(ByteStreamError::DataRequired);
      }
    }

    self.chunks_size -= byte_count as u64;
    self.bytes_read += byte_count as u64;

    let front_len = self.chunks.front().unwrap().len();

    match byte_count.cmp(&front_len) {
      // The whole read is served from inside the first chunk without a copy
      core::cmp::Ordering::Less => {
        let front = self.chunks.front_mut().unwrap();
        let result = front.take_front(byte_count);
        *front = front.drop_front(byte_count);

        Ok(result)
      }

      core::cmp::Ordering::Equal => Ok(self.chunks.pop_front().unwrap()),

      // The read spans chunks, so a new buffer is needed
      core::cmp::Ordering::Greater => {
        let mut result = Vec::with_capacity(byte_count);

        while result.len() < byte_count {
          let chunk = self.chunks.front_mut().unwrap();

          let take = core::cmp::min(chunk.len(), byte_count - result.len());
          result.extend_from_slice(&chunk[..take]);

          *chunk = chunk.drop_front(take);

          if chunk.is_empty() {
            self.chunks.pop_front();
          }
        }

        Ok(result.into())
      }
    }
  }

  /// Peeks at the next bytes without consuming them.
  ///
  pub fn peek(
    &mut self,
    byte_count: usize,
  ) -> Result<Vec<u8>, ByteStreamError> {
    if byte_count == 0 {
      return Ok(vec![]);
    }

    self.inflate_up_to_read_size(byte_count)?;

    if byte_count as u64 > self.chunks_size {
      if self.is_writing_finished {
        return Err(ByteStreamError::DataEnd);
      } else {
        return Err(ByteStreamError::DataRequired);
      }
    }

    let mut result = Vec::with_capacity(byte_count);

    for chunk in self.chunks.iter() {
      let take = core::cmp::min(chunk.len(), byte_count - result.len());
      result.extend_from_slice(&chunk[..take]);

      if result.len() == byte_count {
        break;
      }
    }

    Ok(result)
  }

  /// Switches this byte stream to inflating zlib data. All currently unread
  /// bytes and all subsequently written bytes are passed through streaming
  /// zlib decompression.
  ///
  pub fn start_zlib_inflate(&mut self) {
    self.zlib_stream = Some(flate2::Decompress::new(false));
    self.zlib_input.append(&mut self.chunks);
    self.chunks_size = 0;
  }

  /// When zlib inflate is active, inflates pending input until at least
  /// `read_size` bytes are available or the input is exhausted. Inflation
  /// stops at the read size so that memory use stays bounded regardless of
  /// the compression ratio of the input.
  ///
  fn inflate_up_to_read_size(
    &mut self,
    read_size: usize,
  ) -> Result<(), ByteStreamError> {
    let Some(zlib_stream) = self.zlib_stream.as_mut() else {
      return Ok(());
    };

    while self.chunks_size < read_size as u64 {
      let Some(input) = self.zlib_input.pop_front() else {
        return Ok(());
      };

      let initial_total_in = zlib_stream.total_in();
      let initial_total_out = zlib_stream.total_out();

      let mut output = vec![0u8; ZLIB_INFLATE_CHUNK_SIZE];

      match zlib_stream.decompress(
        &input,
        &mut output,
        flate2::FlushDecompress::None,
      ) {
        Ok(status) => {
          let bytes_consumed = zlib_stream.total_in() - initial_total_in;
          let bytes_produced = zlib_stream.total_out() - initial_total_out;

          // Keep unconsumed input for the next decompression call
          if bytes_consumed < input.len() as u64 {
            self
              .zlib_input
              .push_front(input.drop_front(bytes_consumed as usize));
          }

          if bytes_produced > 0 {
            output.truncate(bytes_produced as usize);
            self.chunks_size += bytes_produced;
            self.chunks.push_back(output.into());
          }

          if status == flate2::Status::StreamEnd {
            self.zlib_inflate_complete = true;
            return Ok(());
          }

          if bytes_produced == 0 {
            break;
          }
        }

        Err(_) => return Err(ByteStreamError::ZlibDataError),
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn read_and_peek_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![0, 1, 2].into(), false).unwrap();
    stream.write(vec![3, 4, 5].into(), false).unwrap();

    assert_eq!(stream.peek(4), Ok(vec![0, 1, 2, 3]));
    assert_eq!(stream.read(2).as_deref(), Ok([0u8, 1].as_slice()));
    assert_eq!(stream.read(3).as_deref(), Ok([2u8, 3, 4].as_slice()));
    assert_eq!(stream.bytes_read(), 5);
    assert_eq!(stream.available(), 1);

    assert_eq!(stream.read(2), Err(ByteStreamError::DataRequired));

    stream.write(vec![6].into(), true).unwrap();
    assert_eq!(stream.read(2).as_deref(), Ok([5u8, 6].as_slice()));

    assert!(stream.is_fully_consumed());
    assert_eq!(stream.read(1), Err(ByteStreamError::DataEnd));
  }

  #[test]
  fn write_after_completion_test() {
    let mut stream = ByteStream::new();

    stream.write(vec![0].into(), true).unwrap();

    assert_eq!(
      stream.write(vec![1].into(), true),
      Err(ByteStreamError::WriteAfterCompletion)
    );
  }

  #[test]
  fn zlib_inflate_test() {
    use std::io::Write;

    let mut encoder = flate2::write::DeflateEncoder::new(
      Vec::new(),
      flate2::Compression::default(),
    );
    encoder.write_all(b"Hello, world!").unwrap();
    let deflated = encoder.finish().unwrap();

    let mut stream = ByteStream::new();
    stream.start_zlib_inflate();
    stream.write(deflated.into(), true).unwrap();

    assert_eq!(
      stream.read(13).as_deref(),
      Ok(b"Hello, world!".as_slice())
    );
    assert!(stream.is_fully_consumed());
  }
}
