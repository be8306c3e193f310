//! The DICOM transfer syntaxes supported by this library.

/// How a transfer syntax serializes value representations: implicitly, where
/// the VR is looked up in the dictionary, or explicitly, where the VR is
/// stored in the data element header.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VrSerialization {
  VrImplicit,
  VrExplicit,
}

/// The byte order of a transfer syntax.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endianness {
  LittleEndian,
  BigEndian,
}

impl Endianness {
  /// Returns whether this is big endian byte order.
  ///
  pub fn is_big(&self) -> bool {
    *self == Endianness::BigEndian
  }
}

/// A single DICOM transfer syntax: its name, UID, VR serialization mode,
/// endianness, whether its data set is zlib deflated, and whether its pixel
/// data is stored encapsulated.
///
#[derive(Debug, PartialEq)]
pub struct TransferSyntax {
  pub name: &'static str,
  pub uid: &'static str,
  pub vr_serialization: VrSerialization,
  pub endianness: Endianness,
  pub is_deflated: bool,
  pub is_encapsulated: bool,
}

const fn uncompressed(
  name: &'static str,
  uid: &'static str,
  vr_serialization: VrSerialization,
  endianness: Endianness,
) -> TransferSyntax {
  TransferSyntax {
    name,
    uid,
    vr_serialization,
    endianness,
    is_deflated: false,
    is_encapsulated: false,
  }
}

const fn encapsulated(
  name: &'static str,
  uid: &'static str,
) -> TransferSyntax {
  TransferSyntax {
    name,
    uid,
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: false,
    is_encapsulated: true,
  }
}

pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = uncompressed(
  "Implicit VR Little Endian",
  "1.2.840.10008.1.2",
  VrSerialization::VrImplicit,
  Endianness::LittleEndian,
);

pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = uncompressed(
  "Explicit VR Little Endian",
  "1.2.840.10008.1.2.1",
  VrSerialization::VrExplicit,
  Endianness::LittleEndian,
);

pub const ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax =
  encapsulated(
    "Encapsulated Uncompressed Explicit VR Little Endian",
    "1.2.840.10008.1.2.1.98",
  );

pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Deflated Explicit VR Little Endian",
  uid: "1.2.840.10008.1.2.1.99",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: true,
  is_encapsulated: false,
};

pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = uncompressed(
  "Explicit VR Big Endian",
  "1.2.840.10008.1.2.2",
  VrSerialization::VrExplicit,
  Endianness::BigEndian,
);

pub const JPEG_BASELINE_8BIT: TransferSyntax =
  encapsulated("JPEG Baseline (Process 1)", "1.2.840.10008.1.2.4.50");

pub const JPEG_EXTENDED_12BIT: TransferSyntax =
  encapsulated("JPEG Extended (Process 2 & 4)", "1.2.840.10008.1.2.4.51");

pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = encapsulated(
  "JPEG Lossless, Non-Hierarchical (Process 14)",
  "1.2.840.10008.1.2.4.57",
);

pub const JPEG_LOSSLESS_NON_HIERARCHICAL_SV1: TransferSyntax = encapsulated(
  "JPEG Lossless, Non-Hierarchical, First-Order Prediction (Process 14 \
   [Selection Value 1])",
  "1.2.840.10008.1.2.4.70",
);

pub const JPEG_LS_LOSSLESS: TransferSyntax = encapsulated(
  "JPEG-LS Lossless Image Compression",
  "1.2.840.10008.1.2.4.80",
);

pub const JPEG_LS_LOSSY_NEAR_LOSSLESS: TransferSyntax = encapsulated(
  "JPEG-LS Lossy (Near-Lossless) Image Compression",
  "1.2.840.10008.1.2.4.81",
);

pub const JPEG_2K_LOSSLESS_ONLY: TransferSyntax = encapsulated(
  "JPEG 2000 Image Compression (Lossless Only)",
  "1.2.840.10008.1.2.4.90",
);

pub const JPEG_2K: TransferSyntax =
  encapsulated("JPEG 2000 Image Compression", "1.2.840.10008.1.2.4.91");

pub const JPEG_2K_MULTI_COMPONENT_LOSSLESS_ONLY: TransferSyntax =
  encapsulated(
    "JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)",
    "1.2.840.10008.1.2.4.92",
  );

pub const JPEG_2K_MULTI_COMPONENT: TransferSyntax = encapsulated(
  "JPEG 2000 Part 2 Multi-component Image Compression",
  "1.2.840.10008.1.2.4.93",
);

pub const JPIP_REFERENCED: TransferSyntax = uncompressed(
  "JPIP Referenced",
  "1.2.840.10008.1.2.4.94",
  VrSerialization::VrExplicit,
  Endianness::LittleEndian,
);

pub const JPIP_REFERENCED_DEFLATE: TransferSyntax = TransferSyntax {
  name: "JPIP Referenced Deflate",
  uid: "1.2.840.10008.1.2.4.95",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: true,
  is_encapsulated: false,
};

pub const MPEG2_MAIN_PROFILE_MAIN_LEVEL: TransferSyntax = encapsulated(
  "MPEG2 Main Profile @ Main Level",
  "1.2.840.10008.1.2.4.100",
);

pub const FRAGMENTABLE_MPEG2_MAIN_PROFILE_MAIN_LEVEL: TransferSyntax =
  encapsulated(
    "Fragmentable MPEG2 Main Profile @ Main Level",
    "1.2.840.10008.1.2.4.100.1",
  );

pub const MPEG2_MAIN_PROFILE_HIGH_LEVEL: TransferSyntax = encapsulated(
  "MPEG2 Main Profile @ High Level",
  "1.2.840.10008.1.2.4.101",
);

pub const FRAGMENTABLE_MPEG2_MAIN_PROFILE_HIGH_LEVEL: TransferSyntax =
  encapsulated(
    "Fragmentable MPEG2 Main Profile @ High Level",
    "1.2.840.10008.1.2.4.101.1",
  );

pub const MPEG4_AVC_H264_HIGH_PROFILE: TransferSyntax = encapsulated(
  "MPEG-4 AVC/H.264 High Profile / Level 4.1",
  "1.2.840.10008.1.2.4.102",
);

pub const FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE: TransferSyntax =
  encapsulated(
    "Fragmentable MPEG-4 AVC/H.264 High Profile / Level 4.1",
    "1.2.840.10008.1.2.4.102.1",
  );

pub const MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE: TransferSyntax =
  encapsulated(
    "MPEG-4 AVC/H.264 BD-compatible High Profile / Level 4.1",
    "1.2.840.10008.1.2.4.103",
  );

pub const FRAGMENTABLE_MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE:
  TransferSyntax = encapsulated(
  "Fragmentable MPEG-4 AVC/H.264 BD-compatible High Profile / Level 4.1",
  "1.2.840.10008.1.2.4.103.1",
);

pub const MPEG4_AVC_H264_HIGH_PROFILE_FOR_2D_VIDEO: TransferSyntax =
  encapsulated(
    "MPEG-4 AVC/H.264 High Profile / Level 4.2 For 2D Video",
    "1.2.840.10008.1.2.4.104",
  );

pub const FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE_FOR_2D_VIDEO:
  TransferSyntax = encapsulated(
  "Fragmentable MPEG-4 AVC/H.264 High Profile / Level 4.2 For 2D Video",
  "1.2.840.10008.1.2.4.104.1",
);

pub const MPEG4_AVC_H264_HIGH_PROFILE_FOR_3D_VIDEO: TransferSyntax =
  encapsulated(
    "MPEG-4 AVC/H.264 High Profile / Level 4.2 For 3D Video",
    "1.2.840.10008.1.2.4.105",
  );

pub const FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE_FOR_3D_VIDEO:
  TransferSyntax = encapsulated(
  "Fragmentable MPEG-4 AVC/H.264 High Profile / Level 4.2 For 3D Video",
  "1.2.840.10008.1.2.4.105.1",
);

pub const MPEG4_AVC_H264_STEREO_HIGH_PROFILE: TransferSyntax = encapsulated(
  "MPEG-4 AVC/H.264 Stereo High Profile / Level 4.2",
  "1.2.840.10008.1.2.4.106",
);

pub const FRAGMENTABLE_MPEG4_AVC_H264_STEREO_HIGH_PROFILE: TransferSyntax =
  encapsulated(
    "Fragmentable MPEG-4 AVC/H.264 Stereo High Profile / Level 4.2",
    "1.2.840.10008.1.2.4.106.1",
  );

pub const HEVC_H265_MAIN_PROFILE: TransferSyntax = encapsulated(
  "HEVC/H.265 Main Profile / Level 5.1",
  "1.2.840.10008.1.2.4.107",
);

pub const HEVC_H265_MAIN_10_PROFILE: TransferSyntax = encapsulated(
  "HEVC/H.265 Main 10 Profile / Level 5.1",
  "1.2.840.10008.1.2.4.108",
);

pub const JPEG_XL_LOSSLESS: TransferSyntax =
  encapsulated("JPEG XL Lossless", "1.2.840.10008.1.2.4.110");

pub const JPEG_XL_JPEG_RECOMPRESSION: TransferSyntax = encapsulated(
  "JPEG XL JPEG Recompression",
  "1.2.840.10008.1.2.4.111",
);

pub const JPEG_XL: TransferSyntax =
  encapsulated("JPEG XL", "1.2.840.10008.1.2.4.112");

pub const HIGH_THROUGHPUT_JPEG_2K_LOSSLESS_ONLY: TransferSyntax =
  encapsulated(
    "High-Throughput JPEG 2000 (Lossless Only)",
    "1.2.840.10008.1.2.4.201",
  );

pub const HIGH_THROUGHPUT_JPEG_2K_WITH_RPCL_OPTIONS_LOSSLESS_ONLY:
  TransferSyntax = encapsulated(
  "High-Throughput JPEG 2000 with RPCL Options (Lossless Only)",
  "1.2.840.10008.1.2.4.202",
);

pub const HIGH_THROUGHPUT_JPEG_2K: TransferSyntax =
  encapsulated("High-Throughput JPEG 2000", "1.2.840.10008.1.2.4.203");

pub const JPIP_HIGH_THROUGHPUT_JPEG_2K_REFERENCED: TransferSyntax =
  uncompressed(
    "JPIP HTJ2K Referenced",
    "1.2.840.10008.1.2.4.204",
    VrSerialization::VrExplicit,
    Endianness::LittleEndian,
  );

pub const JPIP_HIGH_THROUGHPUT_JPEG_2K_REFERENCED_DEFLATE: TransferSyntax =
  TransferSyntax {
    name: "JPIP HTJ2K Referenced Deflate",
    uid: "1.2.840.10008.1.2.4.205",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_deflated: true,
    is_encapsulated: false,
  };

pub const RLE_LOSSLESS: TransferSyntax =
  encapsulated("RLE Lossless", "1.2.840.10008.1.2.5");

pub const SMPTE_ST_2110_20_UNCOMPRESSED_PROGRESSIVE_ACTIVE_VIDEO:
  TransferSyntax = encapsulated(
  "SMPTE ST 2110-20 Uncompressed Progressive Active Video",
  "1.2.840.10008.1.2.7.1",
);

pub const SMPTE_ST_2110_20_UNCOMPRESSED_INTERLACED_ACTIVE_VIDEO:
  TransferSyntax = encapsulated(
  "SMPTE ST 2110-20 Uncompressed Interlaced Active Video",
  "1.2.840.10008.1.2.7.2",
);

pub const SMPTE_ST_2110_30_PCM_AUDIO: TransferSyntax = uncompressed(
  "SMPTE ST 2110-30 PCM Audio",
  "1.2.840.10008.1.2.7.3",
  VrSerialization::VrExplicit,
  Endianness::LittleEndian,
);

pub const DEFLATED_IMAGE_FRAME_COMPRESSION: TransferSyntax = encapsulated(
  "Deflated Image Frame Compression",
  "1.2.840.10008.1.2.8.1",
);

/// All supported transfer syntaxes, ordered by UID.
///
pub static ALL: [TransferSyntax; 46] = [
  IMPLICIT_VR_LITTLE_ENDIAN,
  EXPLICIT_VR_LITTLE_ENDIAN,
  ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
  DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  EXPLICIT_VR_BIG_ENDIAN,
  JPEG_BASELINE_8BIT,
  JPEG_EXTENDED_12BIT,
  JPEG_LOSSLESS_NON_HIERARCHICAL,
  JPEG_LOSSLESS_NON_HIERARCHICAL_SV1,
  JPEG_LS_LOSSLESS,
  JPEG_LS_LOSSY_NEAR_LOSSLESS,
  JPEG_2K_LOSSLESS_ONLY,
  JPEG_2K,
  JPEG_2K_MULTI_COMPONENT_LOSSLESS_ONLY,
  JPEG_2K_MULTI_COMPONENT,
  JPIP_REFERENCED,
  JPIP_REFERENCED_DEFLATE,
  MPEG2_MAIN_PROFILE_MAIN_LEVEL,
  FRAGMENTABLE_MPEG2_MAIN_PROFILE_MAIN_LEVEL,
  MPEG2_MAIN_PROFILE_HIGH_LEVEL,
  FRAGMENTABLE_MPEG2_MAIN_PROFILE_HIGH_LEVEL,
  MPEG4_AVC_H264_HIGH_PROFILE,
  FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE,
  MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE,
  FRAGMENTABLE_MPEG4_AVC_H264_BD_COMPATIBLE_HIGH_PROFILE,
  MPEG4_AVC_H264_HIGH_PROFILE_FOR_2D_VIDEO,
  FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE_FOR_2D_VIDEO,
  MPEG4_AVC_H264_HIGH_PROFILE_FOR_3D_VIDEO,
  FRAGMENTABLE_MPEG4_AVC_H264_HIGH_PROFILE_FOR_3D_VIDEO,
  MPEG4_AVC_H264_STEREO_HIGH_PROFILE,
  FRAGMENTABLE_MPEG4_AVC_H264_STEREO_HIGH_PROFILE,
  HEVC_H265_MAIN_PROFILE,
  HEVC_H265_MAIN_10_PROFILE,
  JPEG_XL_LOSSLESS,
  JPEG_XL_JPEG_RECOMPRESSION,
  JPEG_XL,
  HIGH_THROUGHPUT_JPEG_2K_LOSSLESS_ONLY,
  HIGH_THROUGHPUT_JPEG_2K_WITH_RPCL_OPTIONS_LOSSLESS_ONLY,
  HIGH_THROUGHPUT_JPEG_2K,
  JPIP_HIGH_THROUGHPUT_JPEG_2K_REFERENCED,
  JPIP_HIGH_THROUGHPUT_JPEG_2K_REFERENCED_DEFLATE,
  RLE_LOSSLESS,
  SMPTE_ST_2110_20_UNCOMPRESSED_PROGRESSIVE_ACTIVE_VIDEO,
  SMPTE_ST_2110_20_UNCOMPRESSED_INTERLACED_ACTIVE_VIDEO,
  SMPTE_ST_2110_30_PCM_AUDIO,
  DEFLATED_IMAGE_FRAME_COMPRESSION,
];

impl TransferSyntax {
  /// Returns the transfer syntax with the given UID, or an error if the UID
  /// isn't recognized.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_uid(uid: &str) -> Result<&'static Self, ()> {
    ALL.iter().find(|ts| ts.uid == uid).ok_or(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_uid_test() {
    for ts in ALL.iter() {
      assert_eq!(TransferSyntax::from_uid(ts.uid), Ok(ts));
    }

    assert_eq!(TransferSyntax::from_uid("1.2.3.4"), Err(()));
  }

  #[test]
  fn uids_are_unique_test() {
    for (i, a) in ALL.iter().enumerate() {
      for b in ALL.iter().skip(i + 1) {
        assert_ne!(a.uid, b.uid);
      }
    }
  }

  #[test]
  fn flags_test() {
    assert!(!EXPLICIT_VR_LITTLE_ENDIAN.is_encapsulated);
    assert!(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.is_deflated);
    assert!(EXPLICIT_VR_BIG_ENDIAN.endianness.is_big());
    assert!(JPEG_BASELINE_8BIT.is_encapsulated);
    assert!(DEFLATED_IMAGE_FRAME_COMPRESSION.is_encapsulated);
    assert!(!DEFLATED_IMAGE_FRAME_COMPRESSION.is_deflated);
  }
}
