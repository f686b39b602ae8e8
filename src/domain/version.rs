//! Semantic versions attached to registered resource blocks.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

/// `major.minor.patch`; missing components read as zero. Pre-release and
/// build suffixes are accepted but do not take part in ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl BlockVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for BlockVersion {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        if core.is_empty() {
            return Err(DomainError::validation(format!(
                "version `{value}` is empty"
            )));
        }

        let mut parts = [0_u64; 3];
        for (index, part) in core.split('.').enumerate() {
            if index >= parts.len() {
                return Err(DomainError::validation(format!(
                    "version `{value}` has more than three components"
                )));
            }
            parts[index] = part.parse().map_err(|_| {
                DomainError::validation(format!("version `{value}` has a non-numeric component"))
            })?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for BlockVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for BlockVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_and_prefixed_versions() {
        assert_eq!("1".parse::<BlockVersion>().unwrap(), BlockVersion::new(1, 0, 0));
        assert_eq!("v2.3".parse::<BlockVersion>().unwrap(), BlockVersion::new(2, 3, 0));
        assert_eq!(
            "1.4.2-beta.1".parse::<BlockVersion>().unwrap(),
            BlockVersion::new(1, 4, 2)
        );
    }

    #[test]
    fn orders_numerically_not_lexically() {
        let older: BlockVersion = "1.9.0".parse().unwrap();
        let newer: BlockVersion = "1.10.0".parse().unwrap();
        assert!(newer > older);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<BlockVersion>().is_err());
        assert!("one.two".parse::<BlockVersion>().is_err());
        assert!("1.2.3.4".parse::<BlockVersion>().is_err());
    }
}
