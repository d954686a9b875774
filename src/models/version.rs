// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Model version tags

use std::str::FromStr;

use crate::errors::AtlasError;

/// `MAJOR.MINOR.PATCH` tag of a stored model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModelVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

/// Which part of the version a save bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VersionBump {
    Major,
    Minor,
    #[default]
    Patch,
}

impl ModelVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Next version after this one
    pub fn bump(self, bump: VersionBump) -> Self {
        match bump {
            VersionBump::Major => Self::new(self.major + 1, 0, 0),
            VersionBump::Minor => Self::new(self.major, self.minor + 1, 0),
            VersionBump::Patch => Self::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl FromStr for ModelVersion {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AtlasError::InvalidModelVersion {
            version: s.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid());
        };

        let number = |part: &str| part.parse::<u64>().map_err(|_| invalid());
        Ok(Self::new(number(*major)?, number(*minor)?, number(*patch)?))
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump() {
        let v = ModelVersion::new(1, 2, 3);
        assert_eq!(v.bump(VersionBump::Major).to_string(), "2.0.0");
        assert_eq!(v.bump(VersionBump::Minor).to_string(), "1.3.0");
        assert_eq!(v.bump(VersionBump::Patch).to_string(), "1.2.4");
        assert_eq!(ModelVersion::default().bump(VersionBump::default()).to_string(), "0.0.1");
    }

    #[test]
    fn test_parse() {
        assert_eq!("0.10.2".parse::<ModelVersion>().unwrap(), ModelVersion::new(0, 10, 2));
        assert!("1.2".parse::<ModelVersion>().is_err());
        assert!("1.2.x".parse::<ModelVersion>().is_err());
        assert!("v1.2.3".parse::<ModelVersion>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let mut versions: Vec<ModelVersion> = ["0.10.0", "0.9.1", "0.2.0"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();
        let sorted: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(sorted, vec!["0.2.0", "0.9.1", "0.10.0"]);
    }
}
