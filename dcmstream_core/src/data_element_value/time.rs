//! Work with the DICOM `Time` value representation.

use regex::Regex;

use crate::{DataError, utils};

/// A structured time that can be converted to/from a `Time` value in
/// `HH[MM[SS[.FFFFFF]]]` form. Each finer component requires all coarser
/// components to be present.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredTime {
  pub hour: u8,
  pub minute: Option<u8>,
  pub second: Option<f64>,
}

static TIME_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
  Regex::new(r"^(\d{2})((\d{2})((\d{2})(\.\d{1,6})?)?)?$").unwrap()
});

impl StructuredTime {
  /// Parses a `Time` value into a structured time.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let time_string = std::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("Time is invalid UTF-8".to_string())
    })?;

    let time_string = utils::trim_end_padding(time_string);

    match TIME_REGEX.captures(time_string) {
      Some(caps) => Ok(StructuredTime {
        hour: caps[1].parse::<u8>().unwrap(),
        minute: caps.get(3).map(|m| m.as_str().parse::<u8>().unwrap()),
        second: caps.get(4).map(|s| s.as_str().parse::<f64>().unwrap()),
      }),

      None => Err(DataError::new_value_invalid(format!(
        "Time is invalid: '{}'",
        time_string
      ))),
    }
  }

  /// Serializes a structured time into a `Time` value.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    Ok(self.to_time_string()?.into_bytes())
  }

  /// Returns the `Time` string form of a structured time.
  ///
  pub fn to_time_string(&self) -> Result<String, DataError> {
    if self.second.is_some() && self.minute.is_none() {
      return Err(DataError::new_value_invalid(
        "Time minute value must be present when there is a second value"
          .to_string(),
      ));
    }

    if self.hour > 23 {
      return Err(DataError::new_value_invalid(format!(
        "Time hour value is invalid: {}",
        self.hour
      )));
    }

    let mut s = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      if minute > 59 {
        return Err(DataError::new_value_invalid(format!(
          "Time minute value is invalid: {}",
          minute
        )));
      }

      s.push_str(&format!("{:02}", minute));
    }

    // A second value of exactly 60 is permitted to accommodate leap seconds
    if let Some(second) = self.second {
      if !(0.0..=60.0).contains(&second) {
        return Err(DataError::new_value_invalid(format!(
          "Time second value is invalid: {}",
          second
        )));
      }

      s.push_str(&Self::format_second(second));
    }

    Ok(s)
  }

  /// Formats a structured time as an ISO 8601 time. Components that aren't
  /// present are omitted.
  ///
  pub fn to_iso8601(&self) -> String {
    let mut s = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      s.push_str(&format!(":{:02}", minute));

      if let Some(second) = self.second {
        s.push(':');
        s.push_str(&Self::format_second(second));
      }
    }

    s
  }

  /// Formats a number of seconds as `SS[.FFFFFF]`. The fractional part is
  /// only included when the seconds are not a whole number.
  ///
  fn format_second(seconds: f64) -> String {
    let whole = format!("{:02}", seconds.floor() as u8);

    let fractional = (seconds.fract() * 1_000_000.0).round() as u32;

    if fractional == 0 {
      whole
    } else {
      // The fractional digits are microseconds, so they're padded to six
      // digits before trailing zeros are trimmed
      let fractional = format!("{:06}", fractional);

      format!("{}.{}", whole, fractional.trim_end_matches('0'))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredTime::from_bytes(b"010203.289"),
      Ok(StructuredTime {
        hour: 1,
        minute: Some(2),
        second: Some(3.289)
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"1115"),
      Ok(StructuredTime {
        hour: 11,
        minute: Some(15),
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"14"),
      Ok(StructuredTime {
        hour: 14,
        minute: None,
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"10pm"),
      Err(DataError::new_value_invalid(
        "Time is invalid: '10pm'".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredTime {
        hour: 1,
        minute: Some(2),
        second: Some(3.289)
      }
      .to_bytes(),
      Ok(b"010203.289".to_vec())
    );

    assert_eq!(
      StructuredTime {
        hour: 23,
        minute: Some(14),
        second: None
      }
      .to_bytes(),
      Ok(b"2314".to_vec())
    );

    assert_eq!(
      StructuredTime {
        hour: 1,
        minute: Some(2),
        second: Some(3.000289)
      }
      .to_bytes(),
      Ok(b"010203.000289".to_vec())
    );

    assert_eq!(
      StructuredTime {
        hour: 23,
        minute: None,
        second: Some(1.0)
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Time minute value must be present when there is a second value"
          .to_string()
      ))
    );

    assert_eq!(
      StructuredTime {
        hour: 24,
        minute: None,
        second: None
      }
      .to_bytes(),
      Err(DataError::new_value_invalid(
        "Time hour value is invalid: 24".to_string()
      ))
    );
  }

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredTime {
        hour: 1,
        minute: Some(2),
        second: Some(3.289)
      }
      .to_iso8601(),
      "01:02:03.289"
    );

    assert_eq!(
      StructuredTime {
        hour: 1,
        minute: None,
        second: None
      }
      .to_iso8601(),
      "01"
    );
  }
}
