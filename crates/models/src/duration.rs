use std::time::Duration;

use crate::error::ScalerError;

/// Parse a human-readable duration string like `"30s"`, `"5m"`, `"2h"`,
/// `"1d"` or `"500ms"` into a [`Duration`].
///
/// The format is a non-negative integer followed by exactly one unit suffix.
/// Anything else is rejected so that manifests parse deterministically.
pub fn parse_duration(input: &str) -> Result<Duration, ScalerError> {
    let s = input.trim();
    let err = || ScalerError::InvalidDuration {
        input: input.to_string(),
    };

    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) if idx > 0 => s.split_at(idx),
        _ => return Err(err()),
    };

    let value: u64 = digits.parse().map_err(|_| err())?;

    let millis = match unit {
        "ms" => value,
        "s" => value.checked_mul(1_000).ok_or_else(err)?,
        "m" => value.checked_mul(60_000).ok_or_else(err)?,
        "h" => value.checked_mul(3_600_000).ok_or_else(err)?,
        "d" => value.checked_mul(86_400_000).ok_or_else(err)?,
        _ => return Err(err()),
    };

    Ok(Duration::from_millis(millis))
}

pub(crate) mod serde_duration {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::parse_duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(D::Error::custom)
    }

    pub fn serialize<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ms = d.as_millis();
        if ms % 60_000 == 0 && ms > 0 {
            serializer.serialize_str(&format!("{}m", ms / 60_000))
        } else if ms % 1_000 == 0 {
            serializer.serialize_str(&format!("{}s", ms / 1_000))
        } else {
            serializer.serialize_str(&format!("{}ms", ms))
        }
    }
}
