use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use dcmstream_core::*;
use dcmstream_p10::*;
use dcmstream_pixel_data::*;

const RNG_SEED: u64 = 1023;

/// Serializes a data set to DICOM P10 bytes in memory.
///
fn data_set_to_bytes(data_set: &DataSet, config: P10WriteConfig) -> Vec<u8> {
  let mut bytes = vec![];

  data_set
    .to_p10_bytes(
      &mut |chunk| {
        bytes.extend_from_slice(&chunk);
        Ok(())
      },
      config,
    )
    .unwrap();

  bytes
}

/// Reads DICOM P10 bytes into the tokens they parse into.
///
fn bytes_to_tokens(bytes: &[u8]) -> Vec<P10Token> {
  let mut context = P10ReadContext::default();
  context.write_bytes(bytes.to_vec().into(), true).unwrap();

  let mut tokens = vec![];

  loop {
    let new_tokens = context.read_tokens().unwrap();

    for token in new_tokens {
      let is_end = token == P10Token::End;
      tokens.push(token);

      if is_end {
        return tokens;
      }
    }
  }
}

/// Removes the data elements that are regenerated on every write: the File
/// Meta Information and the Specific Character Set.
///
fn strip_generated_elements(mut data_set: DataSet) -> DataSet {
  data_set.retain(|tag, _value| {
    !tag.is_file_meta_information()
      && *tag != dictionary::SPECIFIC_CHARACTER_SET.tag
  });

  data_set
}

/// A data set covering the common value representations, nested sequences,
/// and native pixel data.
///
fn test_data_set() -> DataSet {
  let mut data_set = DataSet::new();

  data_set
    .insert_string_value(&dictionary::SOP_CLASS_UID, &[
      "1.2.840.10008.5.1.4.1.1.7",
    ])
    .unwrap();
  data_set
    .insert_date_value(&dictionary::STUDY_DATE, &StructuredDate {
      year: 2024,
      month: 7,
      day: 2,
    })
    .unwrap();
  data_set
    .insert_time_value(&dictionary::STUDY_TIME, &StructuredTime {
      hour: 14,
      minute: Some(25),
      second: Some(30.0),
    })
    .unwrap();
  data_set
    .insert_string_value(&dictionary::MODALITY, &["OT"])
    .unwrap();

  let mut nested_item = DataSet::new();
  nested_item
    .insert_string_value(&dictionary::REFERENCED_SOP_INSTANCE_UID, &["1.2.3"])
    .unwrap();

  let mut item = DataSet::new();
  item
    .insert_string_value(&dictionary::REFERENCED_SOP_CLASS_UID, &[
      "1.2.840.10008.5.1.4.1.1.7",
    ])
    .unwrap();
  item
    .insert_sequence_value(&dictionary::REFERENCED_IMAGE_SEQUENCE, vec![
      nested_item,
    ])
    .unwrap();

  data_set
    .insert_sequence_value(&dictionary::REFERENCED_IMAGE_SEQUENCE, vec![
      item,
      DataSet::new(),
    ])
    .unwrap();

  data_set
    .insert_person_name_value(&dictionary::PATIENT_NAME, &[
      StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          last_name: "Doe".to_string(),
          first_name: "Jane".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None,
      },
    ])
    .unwrap();
  data_set
    .insert_string_value(&dictionary::PATIENT_ID, &["123456"])
    .unwrap();
  data_set
    .insert_age_value(&dictionary::PATIENT_AGE, &StructuredAge {
      number: 42,
      unit: AgeUnit::Years,
    })
    .unwrap();
  data_set
    .insert_float_value(&dictionary::PATIENT_SIZE, &[1.83])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::SERIES_NUMBER, &[7])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
    .unwrap();
  data_set
    .insert_string_value(&dictionary::PHOTOMETRIC_INTERPRETATION, &[
      "MONOCHROME2",
    ])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::ROWS, &[2])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[2])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_ALLOCATED, &[8])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_STORED, &[8])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::HIGH_BIT, &[7])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::PIXEL_REPRESENTATION, &[0])
    .unwrap();

  // Dual US/SS tags aren't insertable through the dictionary, so this one
  // is constructed directly as US to match the pixel representation
  data_set.insert(
    dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag,
    DataElementValue::new_unsigned_short(&[1]).unwrap(),
  );
  data_set
    .insert_float_value(&dictionary::WINDOW_CENTER, &[40.0, 80.0])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_word_string(vec![1, 2, 3, 4]).unwrap(),
  );

  data_set
}

fn with_transfer_syntax(
  mut data_set: DataSet,
  transfer_syntax: &TransferSyntax,
) -> DataSet {
  data_set
    .insert_string_value(&dictionary::TRANSFER_SYNTAX_UID, &[
      transfer_syntax.uid,
    ])
    .unwrap();

  data_set
}

#[test]
fn round_trip_explicit_vr_little_endian() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());

  assert!(is_valid_bytes(&bytes));

  let rewritten = read_bytes(bytes.into()).unwrap();

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn round_trip_implicit_vr_little_endian() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let rewritten = read_bytes(bytes.into()).unwrap();

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn round_trip_explicit_vr_big_endian() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_BIG_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let rewritten = read_bytes(bytes.into()).unwrap();

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn round_trip_deflated_explicit_vr_little_endian() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let rewritten = read_bytes(bytes.into()).unwrap();

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn transfer_syntax_override_rewrites_declared_transfer_syntax() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let config = P10WriteConfig::default()
    .transfer_syntax_override(&transfer_syntax::EXPLICIT_VR_BIG_ENDIAN);

  let bytes = data_set_to_bytes(&data_set, config);
  let rewritten = read_bytes(bytes.into()).unwrap();

  assert_eq!(
    rewritten.get_string(dictionary::TRANSFER_SYNTAX_UID.tag),
    Ok(transfer_syntax::EXPLICIT_VR_BIG_ENDIAN.uid)
  );

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn jittered_chunked_read_matches_single_shot_read() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let expected = read_bytes(bytes.clone().into()).unwrap();

  let mut rng = SmallRng::seed_from_u64(RNG_SEED);

  for _ in 0..10 {
    let mut context = P10ReadContext::default();
    let mut builder = DataSetBuilder::new();
    let mut remaining = bytes.as_slice();

    while !builder.is_complete() {
      match context.read_tokens() {
        Ok(tokens) => {
          for token in tokens {
            builder.add_token(&token).unwrap();
          }
        }

        Err(P10Error::DataRequired { .. }) => {
          let chunk_size =
            core::cmp::min(rng.gen_range(1..256), remaining.len());
          let (chunk, rest) = remaining.split_at(chunk_size);
          remaining = rest;

          context
            .write_bytes(chunk.to_vec().into(), remaining.is_empty())
            .unwrap();
        }

        Err(e) => panic!("Jittered read failed: {e}"),
      }
    }

    assert_eq!(builder.final_data_set().unwrap(), expected);
  }
}

#[test]
fn token_streams_are_well_bracketed() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let tokens = bytes_to_tokens(&bytes);

  let mut depth = 0i64;
  let mut end_count = 0;

  for token in &tokens {
    match token {
      P10Token::SequenceStart { .. } | P10Token::SequenceItemStart { .. } => {
        depth += 1;
      }

      P10Token::SequenceDelimiter { .. } | P10Token::SequenceItemDelimiter => {
        depth -= 1;
        assert!(depth >= 0);
      }

      P10Token::End => end_count += 1,

      _ => (),
    }
  }

  assert_eq!(depth, 0);
  assert_eq!(end_count, 1);
  assert_eq!(tokens.last(), Some(&P10Token::End));
}

#[test]
fn partial_read_returns_only_requested_data_elements() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());

  let mut stream = bytes.as_slice();
  let partial = read_stream_partial(
    &mut stream,
    &[dictionary::ROWS.tag, dictionary::COLUMNS.tag],
    P10ReadConfig::default(),
  )
  .unwrap();

  assert_eq!(partial.tags(), vec![
    dictionary::ROWS.tag,
    dictionary::COLUMNS.tag
  ]);
  assert_eq!(partial.get_int(dictionary::ROWS.tag), Ok(2));
}

#[test]
fn truncated_input_emits_partial_value_bytes_then_premature_end() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  // Cut the input two bytes into the four-byte pixel data value
  let bytes = data_set_to_bytes(&data_set, P10WriteConfig::default());
  let truncated = &bytes[..bytes.len() - 2];

  let mut context = P10ReadContext::default();
  context.write_bytes(truncated.to_vec().into(), true).unwrap();

  let mut tokens = vec![];
  let error = loop {
    match context.read_tokens() {
      Ok(new_tokens) => tokens.extend(new_tokens),
      Err(e) => break e,
    }
  };

  assert!(matches!(error, P10Error::PrematureEnd { .. }));

  assert_eq!(
    tokens.last(),
    Some(&P10Token::DataElementValueBytes {
      tag: dictionary::PIXEL_DATA.tag,
      vr: ValueRepresentation::OtherWordString,
      data: vec![1, 2].into(),
      bytes_remaining: 2,
    })
  );
}

#[test]
fn native_single_frame() {
  let mut data_set = test_data_set();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(vec![1, 2, 3, 4]).unwrap(),
  );

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 1);
  assert_eq!(&*frames[0].to_bytes(), &[1, 2, 3, 4]);
}

#[test]
fn native_multi_frame_splits_evenly() {
  let mut data_set = test_data_set();
  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[2])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::ROWS, &[1])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[2])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(vec![1, 2, 3, 4]).unwrap(),
  );

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 2);
  assert_eq!(&*frames[0].to_bytes(), &[1, 2]);
  assert_eq!(&*frames[1].to_bytes(), &[3, 4]);
}

#[test]
fn native_multi_frame_with_uneven_split_fails() {
  let mut data_set = test_data_set();
  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[3])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(vec![1, 2, 3, 4]).unwrap(),
  );

  assert!(matches!(
    data_set.get_pixel_data_frames(),
    Err(P10PixelDataFrameTransformError::DataError(_))
  ));
}

#[test]
fn native_one_bit_frames_straddle_byte_boundaries() {
  let mut data_set = test_data_set();
  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[3])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::ROWS, &[3])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[5])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_ALLOCATED, &[1])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(vec![1, 2, 3, 4, 5, 6]).unwrap(),
  );

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 3);

  // Each frame is 15 bits, so frames 1 and 2 start partway through a byte
  assert_eq!(frames[0].bit_offset(), 0);
  assert_eq!(&*frames[0].to_bytes(), &[0x01, 0x02]);

  assert_eq!(frames[1].bit_offset(), 7);
  assert_eq!(&*frames[1].to_bytes(), &[0x06, 0x08, 0x00]);

  assert_eq!(frames[2].bit_offset(), 6);
  assert_eq!(&*frames[2].to_bytes(), &[0x14, 0x18, 0x00]);
}

fn encapsulated_test_data_set(items: Vec<RcBytes>) -> DataSet {
  let mut data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::JPEG_BASELINE_8BIT,
  );

  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_encapsulated_pixel_data(
      ValueRepresentation::OtherByteString,
      items,
    )
    .unwrap(),
  );

  data_set
}

#[test]
fn encapsulated_fragments_form_single_frame() {
  // Taken from the DICOM standard. Ref: PS3.5 Table A.4-1.
  let data_set = encapsulated_test_data_set(vec![
    RcBytes::empty(),
    vec![b'1'; 0x4C6].into(),
    vec![b'2'; 0x24A].into(),
    vec![b'3'; 0x628].into(),
  ]);

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 1);
  assert_eq!(frames[0].fragments().len(), 3);
  assert_eq!(frames[0].len(), 0x4C6 + 0x24A + 0x628);
}

#[test]
fn encapsulated_fragments_map_one_to_one_when_frame_count_matches() {
  let mut data_set = encapsulated_test_data_set(vec![
    RcBytes::empty(),
    vec![b'1'; 0x4C6].into(),
    vec![b'2'; 0x24A].into(),
    vec![b'3'; 0x628].into(),
  ]);

  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[3])
    .unwrap();

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 3);
  assert_eq!(frames[0].len(), 0x4C6);
  assert_eq!(frames[1].len(), 0x24A);
  assert_eq!(frames[2].len(), 0x628);
}

#[test]
fn encapsulated_basic_offset_table_groups_fragments() {
  // Taken from the DICOM standard. Ref: PS3.5 Table A.4-2.
  let data_set = encapsulated_test_data_set(vec![
    vec![0x00, 0x00, 0x00, 0x00, 0x46, 0x06, 0x00, 0x00].into(),
    vec![b'A'; 0x2C8].into(),
    vec![b'a'; 0x36E].into(),
    vec![b'B'; 0xBC8].into(),
  ]);

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 2);
  assert_eq!(frames[0].fragments().len(), 2);
  assert_eq!(frames[0].len(), 0x2C8 + 0x36E);
  assert_eq!(frames[1].fragments().len(), 1);
  assert_eq!(frames[1].len(), 0xBC8);
}

#[test]
fn encapsulated_extended_offset_table_defines_frame_lengths() {
  let mut data_set = encapsulated_test_data_set(vec![
    RcBytes::empty(),
    vec![b'1'; 0x4C6].into(),
    vec![b'2'; 0x24A].into(),
  ]);

  let mut offsets = vec![];
  for offset in [0u64, 0x4C6 + 8] {
    offsets.extend_from_slice(&offset.to_le_bytes());
  }

  let mut lengths = vec![];
  for length in [0x4C6u64, 0x249] {
    lengths.extend_from_slice(&length.to_le_bytes());
  }

  data_set.insert(
    dictionary::EXTENDED_OFFSET_TABLE.tag,
    DataElementValue::new_other_very_long_string(offsets).unwrap(),
  );
  data_set.insert(
    dictionary::EXTENDED_OFFSET_TABLE_LENGTHS.tag,
    DataElementValue::new_other_very_long_string(lengths).unwrap(),
  );

  let frames = data_set.get_pixel_data_frames().unwrap();

  assert_eq!(frames.len(), 2);
  assert_eq!(frames[0].len(), 0x4C6);

  // The second frame's length trims the even-length padding byte
  assert_eq!(frames[1].len(), 0x249);
}

#[test]
fn encapsulated_frame_count_mismatch_records_warning() {
  let data_set = encapsulated_test_data_set(vec![
    RcBytes::empty(),
    vec![b'1'; 0x4C6].into(),
    vec![b'2'; 0x24A].into(),
  ]);

  let mut transform = P10PixelDataFrameTransform::new();
  let mut frames = vec![];

  let mut number_of_frames_data_set = data_set;
  number_of_frames_data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[4])
    .unwrap();

  number_of_frames_data_set
    .to_p10_tokens(&mut |token| {
      frames.extend(transform.add_token(token)?);
      Ok::<(), P10PixelDataFrameTransformError>(())
    })
    .unwrap();

  // With no offset table and a frame count that doesn't match the fragment
  // count, each fragment is its own frame and the mismatch is recorded
  assert_eq!(frames.len(), 2);
  assert_eq!(transform.warnings().len(), 1);
}

#[test]
fn file_round_trip() {
  let data_set = with_transfer_syntax(
    test_data_set(),
    &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
  );

  let temp_dir = tempfile::tempdir().unwrap();
  let path = temp_dir.path().join("test.dcm");

  data_set
    .write_p10_file(&path, P10WriteConfig::default())
    .unwrap();

  assert!(is_valid_file(&path));

  let rewritten = DataSet::read_p10_file(&path).unwrap();

  assert_eq!(
    strip_generated_elements(data_set),
    strip_generated_elements(rewritten)
  );
}

#[test]
fn read_rejects_unknown_transfer_syntax() {
  // Construct File Meta Information declaring an unknown transfer syntax
  let mut bytes = vec![0u8; 128];
  bytes.extend_from_slice(b"DICM");
  bytes.extend_from_slice(&[0x02, 0x00, 0x10, 0x00]);
  bytes.extend_from_slice(b"UI");
  bytes.extend_from_slice(&8u16.to_le_bytes());
  bytes.extend_from_slice(b"1.2.3.4\0");

  let mut context = P10ReadContext::default();
  context.write_bytes(bytes.into(), true).unwrap();

  let error = loop {
    match context.read_tokens() {
      Ok(_) => (),
      Err(e) => break e,
    }
  };

  assert_eq!(
    error,
    P10Error::TransferSyntaxNotSupported {
      transfer_syntax_uid: "1.2.3.4".to_string()
    }
  );
}
