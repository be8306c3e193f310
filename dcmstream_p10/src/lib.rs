//! Reads and writes the DICOM Part 10 (P10) binary format used to store and
//! transmit DICOM-based medical imaging information.
//!
//! The streaming core is [`P10ReadContext`] and [`P10WriteContext`], which
//! convert between raw bytes and [`P10Token`] streams with bounded memory.
//! This module adds convenience functions over `std::io` streams and files,
//! plus a partial-read mode that stops as soon as a requested set of data
//! elements has been seen.

pub mod data_set_builder;
pub mod p10_error;
pub mod p10_read;
pub mod p10_read_config;
pub mod p10_token;
pub mod p10_write;
pub mod p10_write_config;
pub mod transforms;
pub mod uids;

mod internal;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use dcmstream_core::{DataElementTag, DataSet, DataSetPath, RcBytes};

pub use data_set_builder::DataSetBuilder;
pub use p10_error::{MaximumKind, P10Error};
pub use p10_read::P10ReadContext;
pub use p10_read_config::P10ReadConfig;
pub use p10_token::P10Token;
pub use p10_write::P10WriteContext;
pub use p10_write_config::P10WriteConfig;
pub use transforms::p10_custom_type_transform::{
  P10CustomTypeTransform, P10CustomTypeTransformError,
};
pub use transforms::p10_filter_transform::P10FilterTransform;
pub use transforms::p10_insert_transform::P10InsertTransform;
pub use transforms::p10_print_transform::P10PrintTransform;

/// Returns whether a file contains DICOM P10 data by checking for the
/// 'DICM' prefix at offset 128.
///
pub fn is_valid_file<P: AsRef<Path>>(filename: P) -> bool {
  match File::open(filename) {
    Ok(mut file) => {
      let mut buffer = [0u8; 132];
      match file.read_exact(&mut buffer) {
        Ok(()) => is_valid_bytes(&buffer),
        Err(_) => false,
      }
    }
    Err(_) => false,
  }
}

/// Returns whether the given bytes contain DICOM P10 data by checking for
/// the 'DICM' prefix at offset 128.
///
pub fn is_valid_bytes(bytes: &[u8]) -> bool {
  bytes.len() >= 132 && &bytes[128..132] == b"DICM"
}

/// Reads DICOM P10 data from a file into an in-memory data set.
///
pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<DataSet, P10Error> {
  read_file_returning_builder_on_error(filename).map_err(|(e, _)| e)
}

/// Reads DICOM P10 data from a file into an in-memory data set. On error,
/// the data set builder at the time of the error is returned alongside it,
/// allowing the data read prior to the error to be salvaged with
/// [`DataSetBuilder::force_end`].
///
pub fn read_file_returning_builder_on_error<P: AsRef<Path>>(
  filename: P,
) -> Result<DataSet, (P10Error, Box<DataSetBuilder>)> {
  match File::open(filename) {
    Ok(mut file) => read_stream(&mut file),
    Err(e) => Err((
      P10Error::ExternalSinkError {
        when: "Opening file".to_string(),
        details: e.to_string(),
      },
      Box::new(DataSetBuilder::new()),
    )),
  }
}

/// Reads DICOM P10 data from a read stream into an in-memory data set,
/// consuming the stream to its end.
///
pub fn read_stream(
  stream: &mut dyn Read,
) -> Result<DataSet, (P10Error, Box<DataSetBuilder>)> {
  let mut context = P10ReadContext::default();
  let mut builder = Box::new(DataSetBuilder::new());

  loop {
    let tokens = match read_tokens_from_stream(stream, &mut context) {
      Ok(tokens) => tokens,
      Err(e) => return Err((e, builder)),
    };

    for token in tokens {
      if let Err(e) = builder.add_token(&token) {
        return Err((e, builder));
      }
    }

    if builder.is_complete() {
      return Ok(builder.final_data_set().unwrap());
    }
  }
}

/// Reads the next DICOM P10 tokens from a read stream, reading bytes from
/// the stream in 256 KiB chunks until the read context makes at least one
/// token available.
///
pub fn read_tokens_from_stream(
  stream: &mut dyn Read,
  context: &mut P10ReadContext,
) -> Result<Vec<P10Token>, P10Error> {
  loop {
    match context.read_tokens() {
      Ok(tokens) => {
        if !tokens.is_empty() {
          return Ok(tokens);
        }
      }

      // Feed the read context more bytes from the stream and try again
      Err(P10Error::DataRequired { .. }) => {
        let mut buffer = vec![0u8; 256 * 1024];

        match stream.read(&mut buffer) {
          Ok(0) => context.write_bytes(RcBytes::empty(), true)?,

          Ok(bytes_count) => {
            buffer.truncate(bytes_count);
            context.write_bytes(buffer.into(), false)?;
          }

          Err(e) => {
            return Err(P10Error::ExternalSinkError {
              when: "Reading from stream".to_string(),
              details: e.to_string(),
            });
          }
        }
      }

      Err(e) => return Err(e),
    }
  }
}

/// Reads DICOM P10 data already in memory into a data set.
///
pub fn read_bytes(
  bytes: RcBytes,
) -> Result<DataSet, (P10Error, Box<DataSetBuilder>)> {
  let mut context = P10ReadContext::default();
  let mut builder = Box::new(DataSetBuilder::new());

  if let Err(e) = context.write_bytes(bytes, true) {
    return Err((e, builder));
  }

  while !builder.is_complete() {
    match context.read_tokens() {
      Ok(tokens) => {
        for token in tokens {
          if let Err(e) = builder.add_token(&token) {
            return Err((e, builder));
          }
        }
      }

      Err(e) => return Err((e, builder)),
    }
  }

  Ok(builder.final_data_set().unwrap())
}

/// Reads only the specified root-level data elements of a DICOM P10 file
/// into a data set. The file is read just far enough to return the
/// requested data elements.
///
pub fn read_file_partial<P: AsRef<Path>>(
  filename: P,
  tags: &[DataElementTag],
  config: P10ReadConfig,
) -> Result<DataSet, P10Error> {
  match File::open(filename) {
    Ok(mut file) => read_stream_partial(&mut file, tags, config),
    Err(e) => Err(P10Error::ExternalSinkError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

/// Reads only the specified root-level data elements of a DICOM P10 stream
/// into a data set. The stream is read just far enough to return the
/// requested data elements: reading stops once a root-level data element
/// past the largest requested tag is seen, or at the end of the stream.
///
/// File Meta Information data elements are only returned when explicitly
/// requested.
///
pub fn read_stream_partial(
  stream: &mut dyn Read,
  tags: &[DataElementTag],
  config: P10ReadConfig,
) -> Result<DataSet, P10Error> {
  let mut context = P10ReadContext::new(config);

  let largest_tag = tags.iter().max().copied().unwrap_or(DataElementTag::ZERO);

  // Only the wanted root-level data elements pass into the builder
  let mut filter = {
    let tags = tags.to_vec();
    P10FilterTransform::new(Box::new(move |tag, _vr, _length, path| {
      !path.is_root() || tags.contains(&tag)
    }))
  };

  let mut builder = DataSetBuilder::new();

  'read: loop {
    let tokens = read_tokens_from_stream(stream, &mut context)?;

    for token in tokens {
      if filter.add_token(&token)? {
        builder.add_token(&token)?;
      }

      // Stop reading once the stream is past the largest requested tag
      match token {
        P10Token::DataElementHeader { tag, ref path, .. }
        | P10Token::SequenceStart { tag, ref path, .. } => {
          if tag > largest_tag && path.is_root() {
            break 'read;
          }
        }

        P10Token::End => break 'read,

        _ => (),
      }
    }
  }

  builder.force_end();
  let mut data_set = builder.final_data_set().unwrap();

  // File Meta Information tags come along with the FileMetaInformation
  // token, so excess ones are removed here
  data_set.retain(|tag, _value| {
    !tag.is_file_meta_information() || tags.contains(tag)
  });

  Ok(data_set)
}

/// Writes a data set to a DICOM P10 file, overwriting any existing file
/// with the given name.
///
pub fn write_file<P: AsRef<Path>>(
  filename: P,
  data_set: &DataSet,
  config: P10WriteConfig,
) -> Result<(), P10Error> {
  match File::create(filename) {
    Ok(mut file) => write_stream(&mut file, data_set, config),
    Err(e) => Err(P10Error::ExternalSinkError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

/// Writes a data set as DICOM P10 bytes to a write stream.
///
pub fn write_stream(
  stream: &mut dyn Write,
  data_set: &DataSet,
  config: P10WriteConfig,
) -> Result<(), P10Error> {
  let mut bytes_callback = |bytes: RcBytes| -> Result<(), P10Error> {
    stream
      .write_all(&bytes)
      .map_err(|e| P10Error::ExternalSinkError {
        when: "Writing DICOM P10 data to stream".to_string(),
        details: e.to_string(),
      })
  };

  p10_write::data_set_to_bytes(data_set, &mut bytes_callback, config)?;

  stream.flush().map_err(|e| P10Error::ExternalSinkError {
    when: "Writing DICOM P10 data to stream".to_string(),
    details: e.to_string(),
  })
}

/// Writes DICOM P10 tokens to a write stream through the given write
/// context. Returns whether a [`P10Token::End`] token was written, which
/// flushes the stream.
///
pub fn write_tokens_to_stream(
  tokens: &[P10Token],
  stream: &mut dyn Write,
  context: &mut P10WriteContext,
) -> Result<bool, P10Error> {
  for token in tokens {
    context.write_token(token)?;
  }

  for bytes in context.read_bytes() {
    stream
      .write_all(&bytes)
      .map_err(|e| P10Error::ExternalSinkError {
        when: "Writing to output stream".to_string(),
        details: e.to_string(),
      })?;
  }

  if tokens.last() == Some(&P10Token::End) {
    stream.flush().map_err(|e| P10Error::ExternalSinkError {
      when: "Writing to output stream".to_string(),
      details: e.to_string(),
    })?;

    Ok(true)
  } else {
    Ok(false)
  }
}

/// Adds functions to [`DataSet`] for converting to and from the DICOM P10
/// format.
///
pub trait DataSetP10Extensions
where
  Self: Sized,
{
  /// Reads DICOM P10 data from a file into an in-memory data set.
  ///
  fn read_p10_file<P: AsRef<Path>>(filename: P) -> Result<Self, P10Error>;

  /// Reads DICOM P10 data from a read stream into an in-memory data set.
  ///
  fn read_p10_stream(stream: &mut dyn Read) -> Result<Self, P10Error>;

  /// Reads DICOM P10 data already in memory into a data set.
  ///
  fn read_p10_bytes(
    bytes: RcBytes,
  ) -> Result<Self, (P10Error, Box<DataSetBuilder>)>;

  /// Writes a data set to a DICOM P10 file, overwriting any existing file
  /// with the given name.
  ///
  fn write_p10_file<P: AsRef<Path>>(
    &self,
    filename: P,
    config: P10WriteConfig,
  ) -> Result<(), P10Error>;

  /// Writes a data set as DICOM P10 bytes to a write stream.
  ///
  fn write_p10_stream(
    &self,
    stream: &mut dyn Write,
    config: P10WriteConfig,
  ) -> Result<(), P10Error>;

  /// Converts a data set into DICOM P10 tokens returned via a callback.
  ///
  fn to_p10_tokens<E>(
    &self,
    token_callback: &mut impl FnMut(&P10Token) -> Result<(), E>,
  ) -> Result<(), E>;

  /// Converts a data set into DICOM P10 bytes returned via a callback.
  ///
  fn to_p10_bytes(
    &self,
    bytes_callback: &mut impl FnMut(RcBytes) -> Result<(), P10Error>,
    config: P10WriteConfig,
  ) -> Result<(), P10Error>;
}

impl DataSetP10Extensions for DataSet {
  fn read_p10_file<P: AsRef<Path>>(filename: P) -> Result<Self, P10Error> {
    read_file(filename)
  }

  fn read_p10_stream(stream: &mut dyn Read) -> Result<DataSet, P10Error> {
    read_stream(stream).map_err(|(e, _)| e)
  }

  fn read_p10_bytes(
    bytes: RcBytes,
  ) -> Result<Self, (P10Error, Box<DataSetBuilder>)> {
    read_bytes(bytes)
  }

  fn write_p10_file<P: AsRef<Path>>(
    &self,
    filename: P,
    config: P10WriteConfig,
  ) -> Result<(), P10Error> {
    write_file(filename, self, config)
  }

  fn write_p10_stream(
    &self,
    stream: &mut dyn Write,
    config: P10WriteConfig,
  ) -> Result<(), P10Error> {
    write_stream(stream, self, config)
  }

  fn to_p10_tokens<E>(
    &self,
    token_callback: &mut impl FnMut(&P10Token) -> Result<(), E>,
  ) -> Result<(), E> {
    p10_write::data_set_to_tokens(self, &DataSetPath::new(), token_callback)
  }

  fn to_p10_bytes(
    &self,
    bytes_callback: &mut impl FnMut(RcBytes) -> Result<(), P10Error>,
    config: P10WriteConfig,
  ) -> Result<(), P10Error> {
    p10_write::data_set_to_bytes(self, bytes_callback, config)
  }
}
