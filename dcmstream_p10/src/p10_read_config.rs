use dcmstream_core::TransferSyntax;

/// Configuration used when reading DICOM P10 data.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P10ReadConfig {
  pub(crate) max_token_size: u32,
  pub(crate) max_string_size: u32,
  pub(crate) max_sequence_depth: usize,
  pub(crate) require_dicm_prefix: bool,
  pub(crate) require_ordered_data_elements: bool,
  pub(crate) require_explicit_vr_for_unknown_tags: bool,
  pub(crate) force_transfer_syntax: Option<&'static TransferSyntax>,
}

impl Default for P10ReadConfig {
  fn default() -> Self {
    Self {
      max_token_size: 256 * 1024,
      max_string_size: 0xFFFFFFFE,
      max_sequence_depth: 10_000,
      require_dicm_prefix: false,
      require_ordered_data_elements: true,
      require_explicit_vr_for_unknown_tags: false,
      force_transfer_syntax: None,
    }
  }
}

impl P10ReadConfig {
  /// The maximum size in bytes of a token emitted by a read context, which
  /// bounds memory use during a streaming read. The value is rounded down
  /// to a multiple of 8 so that chunk boundaries never split a multi-byte
  /// word.
  ///
  /// This cap applies to [`crate::P10Token::DataElementValueBytes`] data,
  /// splitting larger values over multiple tokens, and to the total size of
  /// the File Meta Information. Non-UTF-8 string values are exempt, see
  /// [`P10ReadConfig::max_string_size()`].
  ///
  /// Default: 256 KiB.
  ///
  pub fn max_token_size(mut self, value: u32) -> Self {
    self.max_token_size = (value / 8) * 8;
    self.max_string_size = core::cmp::max(self.max_string_size, value);
    self
  }

  /// The maximum size in bytes of a non-UTF-8 string value. Such values are
  /// converted to UTF-8, which requires materializing the whole value in
  /// memory, so they are exempt from the maximum token size and bounded by
  /// this limit instead. Values that exceed it fail the read, so it should
  /// not be set too low.
  ///
  /// This is never less than the maximum token size. Default: unlimited.
  ///
  pub fn max_string_size(mut self, value: u32) -> Self {
    self.max_string_size = core::cmp::max(value, self.max_token_size);
    self
  }

  /// The maximum sequence nesting depth that can be read. Bounds memory use
  /// and rejects malicious data.
  ///
  /// Default: 10,000.
  ///
  pub fn max_sequence_depth(mut self, value: usize) -> Self {
    self.max_sequence_depth = value;
    self
  }

  /// Whether input data must have 'DICM' at offset 128. Well-formed DICOM
  /// P10 data always does, but it is absent in some data seen in practice,
  /// which is readable when this is off.
  ///
  /// Default: false.
  ///
  pub fn require_dicm_prefix(mut self, value: bool) -> Self {
    self.require_dicm_prefix = value;
    self
  }

  /// Whether to error when data elements are out of ascending tag order.
  /// Such data is malformed, and reading it can give incorrect results:
  /// a late *'(0008,0005) Specific Character Set'* means earlier strings
  /// decode with the wrong character set, and a late private creator means
  /// its private data elements read with a VR of UN.
  ///
  /// Default: true.
  ///
  pub fn require_ordered_data_elements(mut self, value: bool) -> Self {
    self.require_ordered_data_elements = value;
    self
  }

  /// Whether unrecognized VR bytes in explicit VR data are an error. When
  /// off, VR bytes of two NULs or two spaces are read with a VR of UN,
  /// which is not conformant but has been seen in the wild.
  ///
  /// Default: false.
  ///
  pub fn require_explicit_vr_for_unknown_tags(mut self, value: bool) -> Self {
    self.require_explicit_vr_for_unknown_tags = value;
    self
  }

  /// A transfer syntax that overrides whatever the File Meta Information
  /// declares. Useful for data whose File Meta Information is wrong or
  /// missing.
  ///
  /// Default: none.
  ///
  pub fn force_transfer_syntax(
    mut self,
    value: &'static TransferSyntax,
  ) -> Self {
    self.force_transfer_syntax = Some(value);
    self
  }
}
