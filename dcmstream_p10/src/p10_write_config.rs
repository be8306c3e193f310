use dcmstream_core::TransferSyntax;

use crate::uids;

/// Configuration used when writing DICOM P10 data.
///
#[derive(Clone, Debug, PartialEq)]
pub struct P10WriteConfig {
  pub(crate) implementation_class_uid: String,
  pub(crate) implementation_version_name: String,
  pub(crate) preamble: Option<Box<[u8; 128]>>,
  pub(crate) transfer_syntax_override: Option<&'static TransferSyntax>,
  pub(crate) zlib_compression_level: u32,
}

impl Default for P10WriteConfig {
  fn default() -> Self {
    Self {
      implementation_class_uid: uids::IMPLEMENTATION_CLASS_UID.to_string(),
      implementation_version_name: uids::IMPLEMENTATION_VERSION_NAME
        .to_string(),
      preamble: None,
      transfer_syntax_override: None,
      zlib_compression_level: 6,
    }
  }
}

impl P10WriteConfig {
  /// The implementation class UID written into the File Meta Information of
  /// serialized DICOM P10 data.
  ///
  /// Defaults to [`uids::IMPLEMENTATION_CLASS_UID`].
  ///
  pub fn implementation_class_uid(mut self, value: String) -> Self {
    self.implementation_class_uid = value;
    self
  }

  /// The implementation version name written into the File Meta Information
  /// of serialized DICOM P10 data.
  ///
  /// Defaults to [`uids::IMPLEMENTATION_VERSION_NAME`].
  ///
  pub fn implementation_version_name(mut self, value: String) -> Self {
    self.implementation_version_name = value;
    self
  }

  /// Overrides the content of the 128-byte File Preamble.
  ///
  /// Defaults to the preamble bytes of the incoming token stream, which are
  /// all zero for data sets serialized from memory.
  ///
  pub fn preamble(mut self, value: [u8; 128]) -> Self {
    self.preamble = Some(Box::new(value));
    self
  }

  /// Overrides the transfer syntax declared by the incoming File Meta
  /// Information. The data set is serialized with this transfer syntax.
  ///
  /// Note that this changes only the binary encoding of the data set, it
  /// never transcodes encapsulated pixel data.
  ///
  pub fn transfer_syntax_override(
    mut self,
    value: &'static TransferSyntax,
  ) -> Self {
    self.transfer_syntax_override = Some(value);
    self
  }

  /// The zlib compression level used when the transfer syntax is deflated,
  /// from 0 (no compression) to 9 (best compression).
  ///
  /// Default: 6.
  ///
  pub fn zlib_compression_level(mut self, value: u32) -> Self {
    self.zlib_compression_level = value.clamp(0, 9);
    self
  }
}
