//! A dictionary of data element tags covering the attributes needed to read
//! and write DICOM P10 data, plus the common patient, study, series, and
//! image module attributes. This is a condensed dictionary, not a full
//! reproduction of the PS3.6 registry: unrecognized tags are reported as
//! `unknown_tag` and read with a VR of UN in implicit VR transfer syntaxes.

use crate::{
  DataElementTag, TransferSyntax, ValueMultiplicity, ValueRepresentation,
};

/// A single dictionary entry for a data element tag: its name, allowed VRs,
/// and value multiplicity. Delimiter tags have no VR.
///
pub struct Entry {
  pub tag: DataElementTag,
  pub name: &'static str,
  pub vrs: &'static [ValueRepresentation],
  pub multiplicity: ValueMultiplicity,
}

const fn vm(min: u32, max: u32) -> ValueMultiplicity {
  ValueMultiplicity {
    min,
    max: if max == 0 { None } else { Some(max) },
  }
}

const fn entry(
  group: u16,
  element: u16,
  name: &'static str,
  vrs: &'static [ValueRepresentation],
  multiplicity: ValueMultiplicity,
) -> Entry {
  Entry {
    tag: DataElementTag::new(group, element),
    name,
    vrs,
    multiplicity,
  }
}

use ValueRepresentation::*;

pub const FILE_META_INFORMATION_GROUP_LENGTH: Entry = entry(
  0x0002,
  0x0000,
  "FileMetaInformationGroupLength",
  &[UnsignedLong],
  vm(1, 1),
);
pub const FILE_META_INFORMATION_VERSION: Entry = entry(
  0x0002,
  0x0001,
  "FileMetaInformationVersion",
  &[OtherByteString],
  vm(1, 1),
);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Entry = entry(
  0x0002,
  0x0002,
  "MediaStorageSOPClassUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Entry = entry(
  0x0002,
  0x0003,
  "MediaStorageSOPInstanceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const TRANSFER_SYNTAX_UID: Entry = entry(
  0x0002,
  0x0010,
  "TransferSyntaxUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const IMPLEMENTATION_CLASS_UID: Entry = entry(
  0x0002,
  0x0012,
  "ImplementationClassUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const IMPLEMENTATION_VERSION_NAME: Entry = entry(
  0x0002,
  0x0013,
  "ImplementationVersionName",
  &[ShortString],
  vm(1, 1),
);
pub const SOURCE_APPLICATION_ENTITY_TITLE: Entry = entry(
  0x0002,
  0x0016,
  "SourceApplicationEntityTitle",
  &[ApplicationEntity],
  vm(1, 1),
);

pub const SPECIFIC_CHARACTER_SET: Entry = entry(
  0x0008,
  0x0005,
  "SpecificCharacterSet",
  &[CodeString],
  vm(1, 0),
);
pub const IMAGE_TYPE: Entry =
  entry(0x0008, 0x0008, "ImageType", &[CodeString], vm(2, 0));
pub const INSTANCE_CREATION_DATE: Entry =
  entry(0x0008, 0x0012, "InstanceCreationDate", &[Date], vm(1, 1));
pub const INSTANCE_CREATION_TIME: Entry =
  entry(0x0008, 0x0013, "InstanceCreationTime", &[Time], vm(1, 1));
pub const SOP_CLASS_UID: Entry =
  entry(0x0008, 0x0016, "SOPClassUID", &[UniqueIdentifier], vm(1, 1));
pub const SOP_INSTANCE_UID: Entry = entry(
  0x0008,
  0x0018,
  "SOPInstanceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const STUDY_DATE: Entry =
  entry(0x0008, 0x0020, "StudyDate", &[Date], vm(1, 1));
pub const SERIES_DATE: Entry =
  entry(0x0008, 0x0021, "SeriesDate", &[Date], vm(1, 1));
pub const ACQUISITION_DATE_TIME: Entry =
  entry(0x0008, 0x002A, "AcquisitionDateTime", &[DateTime], vm(1, 1));
pub const STUDY_TIME: Entry =
  entry(0x0008, 0x0030, "StudyTime", &[Time], vm(1, 1));
pub const SERIES_TIME: Entry =
  entry(0x0008, 0x0031, "SeriesTime", &[Time], vm(1, 1));
pub const ACCESSION_NUMBER: Entry =
  entry(0x0008, 0x0050, "AccessionNumber", &[ShortString], vm(1, 1));
pub const MODALITY: Entry =
  entry(0x0008, 0x0060, "Modality", &[CodeString], vm(1, 1));
pub const MANUFACTURER: Entry =
  entry(0x0008, 0x0070, "Manufacturer", &[LongString], vm(1, 1));
pub const INSTITUTION_NAME: Entry =
  entry(0x0008, 0x0080, "InstitutionName", &[LongString], vm(1, 1));
pub const REFERRING_PHYSICIAN_NAME: Entry = entry(
  0x0008,
  0x0090,
  "ReferringPhysicianName",
  &[PersonName],
  vm(1, 1),
);
pub const STUDY_DESCRIPTION: Entry =
  entry(0x0008, 0x1030, "StudyDescription", &[LongString], vm(1, 1));
pub const SERIES_DESCRIPTION: Entry =
  entry(0x0008, 0x103E, "SeriesDescription", &[LongString], vm(1, 1));
pub const REFERENCED_IMAGE_SEQUENCE: Entry = entry(
  0x0008,
  0x1140,
  "ReferencedImageSequence",
  &[Sequence],
  vm(1, 1),
);
pub const REFERENCED_SOP_CLASS_UID: Entry = entry(
  0x0008,
  0x1150,
  "ReferencedSOPClassUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const REFERENCED_SOP_INSTANCE_UID: Entry = entry(
  0x0008,
  0x1155,
  "ReferencedSOPInstanceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);

pub const PATIENT_NAME: Entry =
  entry(0x0010, 0x0010, "PatientName", &[PersonName], vm(1, 1));
pub const PATIENT_ID: Entry =
  entry(0x0010, 0x0020, "PatientID", &[LongString], vm(1, 1));
pub const PATIENT_BIRTH_DATE: Entry =
  entry(0x0010, 0x0030, "PatientBirthDate", &[Date], vm(1, 1));
pub const PATIENT_SEX: Entry =
  entry(0x0010, 0x0040, "PatientSex", &[CodeString], vm(1, 1));
pub const PATIENT_AGE: Entry =
  entry(0x0010, 0x1010, "PatientAge", &[AgeString], vm(1, 1));
pub const PATIENT_SIZE: Entry =
  entry(0x0010, 0x1020, "PatientSize", &[DecimalString], vm(1, 1));
pub const PATIENT_WEIGHT: Entry =
  entry(0x0010, 0x1030, "PatientWeight", &[DecimalString], vm(1, 1));
pub const PATIENT_COMMENTS: Entry =
  entry(0x0010, 0x4000, "PatientComments", &[LongText], vm(1, 1));

pub const BODY_PART_EXAMINED: Entry =
  entry(0x0018, 0x0015, "BodyPartExamined", &[CodeString], vm(1, 1));
pub const SLICE_THICKNESS: Entry =
  entry(0x0018, 0x0050, "SliceThickness", &[DecimalString], vm(1, 1));
pub const KVP: Entry = entry(0x0018, 0x0060, "KVP", &[DecimalString], vm(1, 1));
pub const FRAME_TIME: Entry =
  entry(0x0018, 0x1063, "FrameTime", &[DecimalString], vm(1, 1));
pub const PATIENT_POSITION: Entry =
  entry(0x0018, 0x5100, "PatientPosition", &[CodeString], vm(1, 1));

pub const STUDY_INSTANCE_UID: Entry = entry(
  0x0020,
  0x000D,
  "StudyInstanceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const SERIES_INSTANCE_UID: Entry = entry(
  0x0020,
  0x000E,
  "SeriesInstanceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const STUDY_ID: Entry =
  entry(0x0020, 0x0010, "StudyID", &[ShortString], vm(1, 1));
pub const SERIES_NUMBER: Entry =
  entry(0x0020, 0x0011, "SeriesNumber", &[IntegerString], vm(1, 1));
pub const INSTANCE_NUMBER: Entry =
  entry(0x0020, 0x0013, "InstanceNumber", &[IntegerString], vm(1, 1));
pub const IMAGE_POSITION_PATIENT: Entry = entry(
  0x0020,
  0x0032,
  "ImagePositionPatient",
  &[DecimalString],
  vm(3, 3),
);
pub const IMAGE_ORIENTATION_PATIENT: Entry = entry(
  0x0020,
  0x0037,
  "ImageOrientationPatient",
  &[DecimalString],
  vm(6, 6),
);
pub const FRAME_OF_REFERENCE_UID: Entry = entry(
  0x0020,
  0x0052,
  "FrameOfReferenceUID",
  &[UniqueIdentifier],
  vm(1, 1),
);
pub const IMAGE_COMMENTS: Entry =
  entry(0x0020, 0x4000, "ImageComments", &[LongText], vm(1, 1));

pub const SAMPLES_PER_PIXEL: Entry =
  entry(0x0028, 0x0002, "SamplesPerPixel", &[UnsignedShort], vm(1, 1));
pub const PHOTOMETRIC_INTERPRETATION: Entry = entry(
  0x0028,
  0x0004,
  "PhotometricInterpretation",
  &[CodeString],
  vm(1, 1),
);
pub const PLANAR_CONFIGURATION: Entry = entry(
  0x0028,
  0x0006,
  "PlanarConfiguration",
  &[UnsignedShort],
  vm(1, 1),
);
pub const NUMBER_OF_FRAMES: Entry =
  entry(0x0028, 0x0008, "NumberOfFrames", &[IntegerString], vm(1, 1));
pub const ROWS: Entry =
  entry(0x0028, 0x0010, "Rows", &[UnsignedShort], vm(1, 1));
pub const COLUMNS: Entry =
  entry(0x0028, 0x0011, "Columns", &[UnsignedShort], vm(1, 1));
pub const PIXEL_SPACING: Entry =
  entry(0x0028, 0x0030, "PixelSpacing", &[DecimalString], vm(2, 2));
pub const BITS_ALLOCATED: Entry =
  entry(0x0028, 0x0100, "BitsAllocated", &[UnsignedShort], vm(1, 1));
pub const BITS_STORED: Entry =
  entry(0x0028, 0x0101, "BitsStored", &[UnsignedShort], vm(1, 1));
pub const HIGH_BIT: Entry =
  entry(0x0028, 0x0102, "HighBit", &[UnsignedShort], vm(1, 1));
pub const PIXEL_REPRESENTATION: Entry = entry(
  0x0028,
  0x0103,
  "PixelRepresentation",
  &[UnsignedShort],
  vm(1, 1),
);
pub const SMALLEST_VALID_PIXEL_VALUE: Entry = entry(
  0x0028,
  0x0104,
  "SmallestValidPixelValue",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const LARGEST_VALID_PIXEL_VALUE: Entry = entry(
  0x0028,
  0x0105,
  "LargestValidPixelValue",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const SMALLEST_IMAGE_PIXEL_VALUE: Entry = entry(
  0x0028,
  0x0106,
  "SmallestImagePixelValue",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const LARGEST_IMAGE_PIXEL_VALUE: Entry = entry(
  0x0028,
  0x0107,
  "LargestImagePixelValue",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const SMALLEST_PIXEL_VALUE_IN_SERIES: Entry = entry(
  0x0028,
  0x0108,
  "SmallestPixelValueInSeries",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const LARGEST_PIXEL_VALUE_IN_SERIES: Entry = entry(
  0x0028,
  0x0109,
  "LargestPixelValueInSeries",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const SMALLEST_IMAGE_PIXEL_VALUE_IN_PLANE: Entry = entry(
  0x0028,
  0x0111,
  "SmallestImagePixelValueInPlane",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const LARGEST_IMAGE_PIXEL_VALUE_IN_PLANE: Entry = entry(
  0x0028,
  0x0112,
  "LargestImagePixelValueInPlane",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const PIXEL_PADDING_VALUE: Entry = entry(
  0x0028,
  0x0120,
  "PixelPaddingValue",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const PIXEL_PADDING_RANGE_LIMIT: Entry = entry(
  0x0028,
  0x0121,
  "PixelPaddingRangeLimit",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const WINDOW_CENTER: Entry =
  entry(0x0028, 0x1050, "WindowCenter", &[DecimalString], vm(1, 0));
pub const WINDOW_WIDTH: Entry =
  entry(0x0028, 0x1051, "WindowWidth", &[DecimalString], vm(1, 0));
pub const RESCALE_INTERCEPT: Entry = entry(
  0x0028,
  0x1052,
  "RescaleIntercept",
  &[DecimalString],
  vm(1, 1),
);
pub const RESCALE_SLOPE: Entry =
  entry(0x0028, 0x1053, "RescaleSlope", &[DecimalString], vm(1, 1));
pub const RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Entry = entry(
  0x0028,
  0x1101,
  "RedPaletteColorLookupTableDescriptor",
  &[UnsignedShort, SignedShort],
  vm(3, 3),
);
pub const GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Entry = entry(
  0x0028,
  0x1102,
  "GreenPaletteColorLookupTableDescriptor",
  &[UnsignedShort, SignedShort],
  vm(3, 3),
);
pub const BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Entry = entry(
  0x0028,
  0x1103,
  "BluePaletteColorLookupTableDescriptor",
  &[UnsignedShort, SignedShort],
  vm(3, 3),
);
pub const LUT_DESCRIPTOR: Entry = entry(
  0x0028,
  0x3002,
  "LUTDescriptor",
  &[UnsignedShort, SignedShort],
  vm(3, 3),
);
pub const LUT_DATA: Entry = entry(
  0x0028,
  0x3006,
  "LUTData",
  &[UnsignedShort, OtherWordString],
  vm(1, 0),
);

pub const WAVEFORM_BITS_STORED: Entry = entry(
  0x003A,
  0x021A,
  "WaveformBitsStored",
  &[UnsignedShort],
  vm(1, 1),
);

pub const REAL_WORLD_VALUE_LAST_VALUE_MAPPED: Entry = entry(
  0x0040,
  0x9211,
  "RealWorldValueLastValueMapped",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);
pub const REAL_WORLD_VALUE_FIRST_VALUE_MAPPED: Entry = entry(
  0x0040,
  0x9216,
  "RealWorldValueFirstValueMapped",
  &[UnsignedShort, SignedShort],
  vm(1, 1),
);

pub const CHANNEL_MINIMUM_VALUE: Entry = entry(
  0x5400,
  0x0110,
  "ChannelMinimumValue",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);
pub const CHANNEL_MAXIMUM_VALUE: Entry = entry(
  0x5400,
  0x0112,
  "ChannelMaximumValue",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);
pub const WAVEFORM_BITS_ALLOCATED: Entry = entry(
  0x5400,
  0x1004,
  "WaveformBitsAllocated",
  &[UnsignedShort],
  vm(1, 1),
);
pub const WAVEFORM_PADDING_VALUE: Entry = entry(
  0x5400,
  0x100A,
  "WaveformPaddingValue",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);
pub const WAVEFORM_DATA: Entry = entry(
  0x5400,
  0x1010,
  "WaveformData",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);

pub const OVERLAY_ROWS: Entry =
  entry(0x6000, 0x0010, "OverlayRows", &[UnsignedShort], vm(1, 1));
pub const OVERLAY_COLUMNS: Entry =
  entry(0x6000, 0x0011, "OverlayColumns", &[UnsignedShort], vm(1, 1));
pub const OVERLAY_BITS_ALLOCATED: Entry = entry(
  0x6000,
  0x0100,
  "OverlayBitsAllocated",
  &[UnsignedShort],
  vm(1, 1),
);
pub const OVERLAY_DATA: Entry = entry(
  0x6000,
  0x3000,
  "OverlayData",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);

pub const EXTENDED_OFFSET_TABLE: Entry = entry(
  0x7FE0,
  0x0001,
  "ExtendedOffsetTable",
  &[OtherVeryLongString],
  vm(1, 1),
);
pub const EXTENDED_OFFSET_TABLE_LENGTHS: Entry = entry(
  0x7FE0,
  0x0002,
  "ExtendedOffsetTableLengths",
  &[OtherVeryLongString],
  vm(1, 1),
);
pub const FLOAT_PIXEL_DATA: Entry = entry(
  0x7FE0,
  0x0008,
  "FloatPixelData",
  &[OtherFloatString],
  vm(1, 1),
);
pub const DOUBLE_FLOAT_PIXEL_DATA: Entry = entry(
  0x7FE0,
  0x0009,
  "DoubleFloatPixelData",
  &[OtherDoubleString],
  vm(1, 1),
);
pub const PIXEL_DATA: Entry = entry(
  0x7FE0,
  0x0010,
  "PixelData",
  &[OtherByteString, OtherWordString],
  vm(1, 1),
);

pub const DATA_SET_TRAILING_PADDING: Entry = entry(
  0xFFFC,
  0xFFFC,
  "DataSetTrailingPadding",
  &[OtherByteString],
  vm(1, 1),
);

pub const ITEM: Entry = entry(0xFFFE, 0xE000, "Item", &[], vm(1, 1));
pub const ITEM_DELIMITATION_ITEM: Entry =
  entry(0xFFFE, 0xE00D, "ItemDelimitationItem", &[], vm(1, 1));
pub const SEQUENCE_DELIMITATION_ITEM: Entry =
  entry(0xFFFE, 0xE0DD, "SequenceDelimitationItem", &[], vm(1, 1));

/// All dictionary entries, sorted by tag.
///
static ENTRIES: [&Entry; 102] = [
  &FILE_META_INFORMATION_GROUP_LENGTH,
  &FILE_META_INFORMATION_VERSION,
  &MEDIA_STORAGE_SOP_CLASS_UID,
  &MEDIA_STORAGE_SOP_INSTANCE_UID,
  &TRANSFER_SYNTAX_UID,
  &IMPLEMENTATION_CLASS_UID,
  &IMPLEMENTATION_VERSION_NAME,
  &SOURCE_APPLICATION_ENTITY_TITLE,
  &SPECIFIC_CHARACTER_SET,
  &IMAGE_TYPE,
  &INSTANCE_CREATION_DATE,
  &INSTANCE_CREATION_TIME,
  &SOP_CLASS_UID,
  &SOP_INSTANCE_UID,
  &STUDY_DATE,
  &SERIES_DATE,
  &ACQUISITION_DATE_TIME,
  &STUDY_TIME,
  &SERIES_TIME,
  &ACCESSION_NUMBER,
  &MODALITY,
  &MANUFACTURER,
  &INSTITUTION_NAME,
  &REFERRING_PHYSICIAN_NAME,
  &STUDY_DESCRIPTION,
  &SERIES_DESCRIPTION,
  &REFERENCED_IMAGE_SEQUENCE,
  &REFERENCED_SOP_CLASS_UID,
  &REFERENCED_SOP_INSTANCE_UID,
  &PATIENT_NAME,
  &PATIENT_ID,
  &PATIENT_BIRTH_DATE,
  &PATIENT_SEX,
  &PATIENT_AGE,
  &PATIENT_SIZE,
  &PATIENT_WEIGHT,
  &PATIENT_COMMENTS,
  &BODY_PART_EXAMINED,
  &SLICE_THICKNESS,
  &KVP,
  &FRAME_TIME,
  &PATIENT_POSITION,
  &STUDY_INSTANCE_UID,
  &SERIES_INSTANCE_UID,
  &STUDY_ID,
  &SERIES_NUMBER,
  &INSTANCE_NUMBER,
  &IMAGE_POSITION_PATIENT,
  &IMAGE_ORIENTATION_PATIENT,
  &FRAME_OF_REFERENCE_UID,
  &IMAGE_COMMENTS,
  &SAMPLES_PER_PIXEL,
  &PHOTOMETRIC_INTERPRETATION,
  &PLANAR_CONFIGURATION,
  &NUMBER_OF_FRAMES,
  &ROWS,
  &COLUMNS,
  &PIXEL_SPACING,
  &BITS_ALLOCATED,
  &BITS_STORED,
  &HIGH_BIT,
  &PIXEL_REPRESENTATION,
  &SMALLEST_VALID_PIXEL_VALUE,
  &LARGEST_VALID_PIXEL_VALUE,
  &SMALLEST_IMAGE_PIXEL_VALUE,
  &LARGEST_IMAGE_PIXEL_VALUE,
  &SMALLEST_PIXEL_VALUE_IN_SERIES,
  &LARGEST_PIXEL_VALUE_IN_SERIES,
  &SMALLEST_IMAGE_PIXEL_VALUE_IN_PLANE,
  &LARGEST_IMAGE_PIXEL_VALUE_IN_PLANE,
  &PIXEL_PADDING_VALUE,
  &PIXEL_PADDING_RANGE_LIMIT,
  &WINDOW_CENTER,
  &WINDOW_WIDTH,
  &RESCALE_INTERCEPT,
  &RESCALE_SLOPE,
  &RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  &LUT_DESCRIPTOR,
  &LUT_DATA,
  &WAVEFORM_BITS_STORED,
  &REAL_WORLD_VALUE_LAST_VALUE_MAPPED,
  &REAL_WORLD_VALUE_FIRST_VALUE_MAPPED,
  &CHANNEL_MINIMUM_VALUE,
  &CHANNEL_MAXIMUM_VALUE,
  &WAVEFORM_BITS_ALLOCATED,
  &WAVEFORM_PADDING_VALUE,
  &WAVEFORM_DATA,
  &OVERLAY_ROWS,
  &OVERLAY_COLUMNS,
  &OVERLAY_BITS_ALLOCATED,
  &OVERLAY_DATA,
  &EXTENDED_OFFSET_TABLE,
  &EXTENDED_OFFSET_TABLE_LENGTHS,
  &FLOAT_PIXEL_DATA,
  &DOUBLE_FLOAT_PIXEL_DATA,
  &PIXEL_DATA,
  &DATA_SET_TRAILING_PADDING,
  &ITEM,
  &ITEM_DELIMITATION_ITEM,
  &SEQUENCE_DELIMITATION_ITEM,
];

/// Finds the dictionary entry for the given tag. The private creator is
/// accepted for API consistency but this condensed dictionary carries no
/// well-known private data elements, so private tags always resolve to an
/// error.
///
#[allow(clippy::result_unit_err)]
pub fn find(
  tag: DataElementTag,
  _private_creator: Option<&str>,
) -> Result<&'static Entry, ()> {
  // Repeating overlay groups (60xx) are normalized to group 0x6000
  let tag = if (0x6000..=0x60FF).contains(&tag.group) {
    DataElementTag::new(0x6000, tag.element)
  } else {
    tag
  };

  ENTRIES
    .binary_search_by(|e| e.tag.cmp(&tag))
    .map(|index| ENTRIES[index])
    .map_err(|_| ())
}

/// Returns the display name for a data element tag, or `"unknown_tag"` when
/// the tag is not in the dictionary.
///
pub fn tag_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> &'static str {
  match find(tag, private_creator) {
    Ok(entry) => entry.name,
    Err(()) => "unknown_tag",
  }
}

/// Formats a data element tag as `"(GROUP,ELEMENT) NAME"`, e.g.
/// `"(0008,0020) StudyDate"`.
///
pub fn tag_with_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> String {
  format!("{} {}", tag, tag_name(tag, private_creator))
}

/// Returns whether the given tag holds a lookup table descriptor, i.e. a
/// six-byte value holding three 16-bit integers whose middle integer's
/// signedness follows the VR.
///
pub fn is_lut_descriptor_tag(tag: DataElementTag) -> bool {
  tag == LUT_DESCRIPTOR.tag
    || tag == RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
}

/// Returns the display name of a well-known UID: all supported transfer
/// syntaxes plus the common storage SOP classes.
///
#[allow(clippy::result_unit_err)]
pub fn uid_name(uid: &str) -> Result<&'static str, ()> {
  if let Ok(transfer_syntax) = TransferSyntax::from_uid(uid) {
    return Ok(transfer_syntax.name);
  }

  match uid {
    "1.2.840.10008.1.1" => Ok("Verification SOP Class"),
    "1.2.840.10008.1.3.10" => Ok("Media Storage Directory Storage"),
    "1.2.840.10008.5.1.4.1.1.1" => Ok("Computed Radiography Image Storage"),
    "1.2.840.10008.5.1.4.1.1.2" => Ok("CT Image Storage"),
    "1.2.840.10008.5.1.4.1.1.2.1" => Ok("Enhanced CT Image Storage"),
    "1.2.840.10008.5.1.4.1.1.4" => Ok("MR Image Storage"),
    "1.2.840.10008.5.1.4.1.1.4.1" => Ok("Enhanced MR Image Storage"),
    "1.2.840.10008.5.1.4.1.1.6.1" => Ok("Ultrasound Image Storage"),
    "1.2.840.10008.5.1.4.1.1.7" => Ok("Secondary Capture Image Storage"),
    "1.2.840.10008.5.1.4.1.1.77.1.6" => {
      Ok("VL Whole Slide Microscopy Image Storage")
    }
    "1.2.840.10008.5.1.4.1.1.128" => {
      Ok("Positron Emission Tomography Image Storage")
    }
    _ => Err(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn find_test() {
    assert_eq!(
      find(DataElementTag::new(0x7FE0, 0x0010), None).map(|e| e.name),
      Ok("PixelData")
    );

    assert_eq!(
      find(DataElementTag::new(0x601E, 0x3000), None).map(|e| e.name),
      Ok("OverlayData")
    );

    assert!(find(DataElementTag::new(0x0009, 0x0001), None).is_err());
  }

  #[test]
  fn entries_are_sorted_test() {
    for pair in ENTRIES.windows(2) {
      assert!(pair[0].tag < pair[1].tag, "{} out of order", pair[1].tag);
    }
  }

  #[test]
  fn tag_name_test() {
    assert_eq!(tag_name(STUDY_DATE.tag, None), "StudyDate");
    assert_eq!(tag_name(DataElementTag::new(0x0099, 0), None), "unknown_tag");
  }

  #[test]
  fn tag_with_name_test() {
    assert_eq!(
      tag_with_name(PATIENT_AGE.tag, None),
      "(0010,1010) PatientAge"
    );
  }

  #[test]
  fn uid_name_test() {
    assert_eq!(
      uid_name("1.2.840.10008.1.2.1"),
      Ok("Explicit VR Little Endian")
    );
    assert_eq!(uid_name("1.2.840.10008.5.1.4.1.1.2"), Ok("CT Image Storage"));
    assert_eq!(uid_name("9.9.9"), Err(()));
  }
}
