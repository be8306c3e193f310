//! Extracts frames of pixel data from data sets and streams of DICOM P10
//! tokens.
//!
//! Only the pixel data container is handled here: native pixel data is
//! split into its frames, and encapsulated pixel data is split into frames
//! of raw codec fragments. Decoding those fragments is the concern of a
//! codec for the relevant transfer syntax, not of this crate.

pub mod pixel_data_frame;
pub mod transforms;

use dcmstream_core::DataSet;
use dcmstream_p10::DataSetP10Extensions;

pub use pixel_data_frame::PixelDataFrame;
pub use transforms::p10_pixel_data_frame_transform::{
  P10PixelDataFrameTransform, P10PixelDataFrameTransformError,
};

/// Adds functions to [`DataSet`] for reading its pixel data.
///
pub trait DataSetPixelDataExtensions
where
  Self: Sized,
{
  /// Returns all frames of pixel data in a data set. The *'(7FE0,0010)
  /// Pixel Data'* data element must be present, along with the data
  /// elements describing its shape. The *'(0028,0008) Number of Frames'*
  /// and Extended Offset Table data elements are honored when present.
  ///
  fn get_pixel_data_frames(
    &self,
  ) -> Result<Vec<PixelDataFrame>, P10PixelDataFrameTransformError>;
}

impl DataSetPixelDataExtensions for DataSet {
  fn get_pixel_data_frames(
    &self,
  ) -> Result<Vec<PixelDataFrame>, P10PixelDataFrameTransformError> {
    let mut transform = P10PixelDataFrameTransform::new();
    let mut frames = vec![];

    self.to_p10_tokens(&mut |token| {
      frames.extend(transform.add_token(token)?);
      Ok(())
    })?;

    Ok(frames)
  }
}
