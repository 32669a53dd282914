//! Datapoint type identifiers (the tag that selects a field program).

use std::{fmt, str::FromStr};

use crate::errors::ParseDptError;

/// A KNX datapoint type identifier such as `9.001`.
///
/// The main number selects the encoding family (size and shape), the sub
/// number the concrete meaning (unit, range). Two identifiers are only equal
/// when both parts match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DptId {
    pub main: u16,
    pub sub: u16,
}

impl DptId {
    pub const fn new(main: u16, sub: u16) -> Self {
        DptId { main, sub }
    }
}

impl fmt::Display for DptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.main, self.sub)
    }
}

/// Accepts `9.001`, `DPT9.001`, `DPT 9.001` and the ETS form `DPST-9-1`.
impl FromStr for DptId {
    type Err = ParseDptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseDptError(trimmed.to_string());

        let (main, sub) = if let Some(rest) = trimmed.strip_prefix("DPST-") {
            rest.split_once('-').ok_or_else(err)?
        } else {
            let rest = trimmed
                .strip_prefix("DPT")
                .map(str::trim_start)
                .unwrap_or(trimmed);
            rest.split_once('.').ok_or_else(err)?
        };

        let parse = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse::<u16>().map_err(|_| err())
        };

        Ok(DptId::new(parse(main)?, parse(sub)?))
    }
}

impl TryFrom<&str> for DptId {
    type Error = ParseDptError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DptId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DptId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
