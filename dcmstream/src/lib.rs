//! dcmstream is a collection of libraries for reading, writing, and
//! transforming DICOM P10 data in a streaming, bounded-memory fashion.

/// Core DICOM concepts: data sets, data elements, value representations,
/// transfer syntaxes, and the data element dictionary.
///
/// This module is a re-export of the `dcmstream_core` crate.
///
pub mod core {
  pub use dcmstream_core::*;
}

/// Decoding of DICOM Specific Character Sets into UTF-8.
///
/// This module is a re-export of the `dcmstream_charset` crate.
///
pub mod charset {
  pub use dcmstream_charset::*;
}

/// Reading and writing of the DICOM Part 10 (P10) binary format as streams
/// of tokens.
///
/// This module is a re-export of the `dcmstream_p10` crate.
///
pub mod p10 {
  pub use dcmstream_p10::*;
}

/// Extraction of pixel data frames from data sets and streams of DICOM P10
/// tokens.
///
/// This module is a re-export of the `dcmstream_pixel_data` crate.
///
pub mod pixel_data {
  pub use dcmstream_pixel_data::*;
}

#[cfg(test)]
mod integration_tests;
