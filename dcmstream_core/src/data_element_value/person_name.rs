//! Work with the DICOM `PersonName` value representation.

use crate::DataError;

/// The five caret-separated components of a single person name.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersonNameComponents {
  pub last_name: String,
  pub first_name: String,
  pub middle_name: String,
  pub prefix: String,
  pub suffix: String,
}

/// A structured person name that can be converted to/from a `PersonName`
/// value. A person name has three optional component groups: alphabetic,
/// ideographic, and phonetic. Commonly only the alphabetic group is used.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredPersonName {
  pub alphabetic: Option<PersonNameComponents>,
  pub ideographic: Option<PersonNameComponents>,
  pub phonetic: Option<PersonNameComponents>,
}

/// Parses a `PersonName` value into a list of structured person names.
///
pub fn from_bytes(
  bytes: &[u8],
) -> Result<Vec<StructuredPersonName>, DataError> {
  let person_name_string = std::str::from_utf8(bytes).map_err(|_| {
    DataError::new_value_invalid("PersonName is invalid UTF-8".to_string())
  })?;

  person_name_string
    .split('\\')
    .map(parse_person_name)
    .collect()
}

/// Parses one person name by splitting it on `=` into component groups, and
/// each component group on `^` into its individual components.
///
fn parse_person_name(s: &str) -> Result<StructuredPersonName, DataError> {
  let component_groups: Vec<&str> = s.split('=').collect();

  if component_groups.len() > 3 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many component groups: {}",
      component_groups.len()
    )));
  }

  let mut groups = component_groups
    .iter()
    .map(|group| parse_component_group(group))
    .collect::<Result<Vec<Option<PersonNameComponents>>, DataError>>()?;

  groups.resize(3, None);

  Ok(StructuredPersonName {
    alphabetic: groups[0].clone(),
    ideographic: groups[1].clone(),
    phonetic: groups[2].clone(),
  })
}

fn parse_component_group(
  group: &str,
) -> Result<Option<PersonNameComponents>, DataError> {
  let mut components: Vec<&str> =
    group.split('^').map(|s| s.trim_end_matches(' ')).collect();

  if components.len() > 5 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many components: {}",
      components.len()
    )));
  }

  // A component group with nothing in it is not returned
  if components.iter().all(|c| c.is_empty()) {
    return Ok(None);
  }

  components.resize(5, "");

  Ok(Some(PersonNameComponents {
    last_name: components[0].to_string(),
    first_name: components[1].to_string(),
    middle_name: components[2].to_string(),
    prefix: components[3].to_string(),
    suffix: components[4].to_string(),
  }))
}

/// Serializes a list of structured person names into a `PersonName` value.
///
pub fn to_bytes(
  values: &[StructuredPersonName],
) -> Result<Vec<u8>, DataError> {
  let names = values
    .iter()
    .map(|value| {
      let groups =
        [&value.alphabetic, &value.ideographic, &value.phonetic]
          .iter()
          .map(|group| match group {
            Some(components) => components_to_string(components),
            None => Ok("".to_string()),
          })
          .collect::<Result<Vec<String>, DataError>>()?;

      Ok(groups.join("=").trim_end_matches('=').to_string())
    })
    .collect::<Result<Vec<String>, DataError>>()?;

  let mut bytes = names.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x20);
  }

  Ok(bytes)
}

fn components_to_string(
  components: &PersonNameComponents,
) -> Result<String, DataError> {
  let components: [&str; 5] = [
    components.last_name.trim_end_matches(' '),
    components.first_name.trim_end_matches(' '),
    components.middle_name.trim_end_matches(' '),
    components.prefix.trim_end_matches(' '),
    components.suffix.trim_end_matches(' '),
  ];

  for component in components {
    if component.len() > 64 {
      return Err(DataError::new_value_invalid(
        "PersonName component is too long".to_string(),
      ));
    }

    if component.contains(['^', '=', '\\']) {
      return Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string(),
      ));
    }
  }

  Ok(components.join("^").trim_end_matches('^').to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn alphabetic(last: &str, first: &str) -> Option<PersonNameComponents> {
    Some(PersonNameComponents {
      last_name: last.to_string(),
      first_name: first.to_string(),
      ..Default::default()
    })
  }

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      from_bytes(b"Doe^Jane"),
      Ok(vec![StructuredPersonName {
        alphabetic: alphabetic("Doe", "Jane"),
        ideographic: None,
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes(b"=Doe^Jane"),
      Ok(vec![StructuredPersonName {
        alphabetic: None,
        ideographic: alphabetic("Doe", "Jane"),
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes(b"A\\B"),
      Ok(vec![
        StructuredPersonName {
          alphabetic: Some(PersonNameComponents {
            last_name: "A".to_string(),
            ..Default::default()
          }),
          ideographic: None,
          phonetic: None
        },
        StructuredPersonName {
          alphabetic: Some(PersonNameComponents {
            last_name: "B".to_string(),
            ..Default::default()
          }),
          ideographic: None,
          phonetic: None
        }
      ])
    );

    assert_eq!(
      from_bytes(b"A=B=C=D"),
      Err(DataError::new_value_invalid(
        "PersonName has too many component groups: 4".to_string()
      ))
    );

    assert_eq!(
      from_bytes(b"A^B^C^D^E^F"),
      Err(DataError::new_value_invalid(
        "PersonName has too many components: 6".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: alphabetic("Doe", "Jane"),
        ideographic: None,
        phonetic: None
      }]),
      Ok(b"Doe^Jane".to_vec())
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: None,
        ideographic: alphabetic("Doe", "Jane"),
        phonetic: None
      }]),
      Ok(b"=Doe^Jane ".to_vec())
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          last_name: "A=B".to_string(),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None
      }]),
      Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string()
      ))
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(PersonNameComponents {
          last_name: "A".repeat(65),
          ..Default::default()
        }),
        ideographic: None,
        phonetic: None
      }]),
      Err(DataError::new_value_invalid(
        "PersonName component is too long".to_string()
      ))
    );
  }

  #[test]
  fn round_trip_test() {
    let name = StructuredPersonName {
      alphabetic: alphabetic("Doe", "Jane"),
      ideographic: None,
      phonetic: alphabetic("D", "J"),
    };

    assert_eq!(
      from_bytes(&to_bytes(&[name.clone()]).unwrap()),
      Ok(vec![name])
    );
  }
}
