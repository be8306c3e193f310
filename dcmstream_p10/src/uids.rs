//! The root UID prefix and implementation details stored into the File Meta
//! Information of serialized DICOM P10 data.

/// The project's root UID prefix under which new UIDs are generated.
///
pub const ROOT_UID_PREFIX: &str = "1.2.826.0.1.3680043.10.1104.";

/// The implementation class UID written into the File Meta Information of
/// serialized DICOM P10 data.
///
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1104.0";

/// The implementation version name written into the File Meta Information
/// of serialized DICOM P10 data.
///
pub static IMPLEMENTATION_VERSION_NAME: std::sync::LazyLock<String> =
  std::sync::LazyLock::new(|| {
    format!("DCMSTREAM {}", env!("CARGO_PKG_VERSION"))
  });
