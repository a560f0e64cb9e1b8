// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Install version stamps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `maj.min.rev` version as stamped into the install tree.
///
/// Ordering is field order, which matches the packed form the upgrade
/// eligibility check compares against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct InstallVersion {
    pub maj: u16,
    pub min: u16,
    pub rev: u32,
}

impl InstallVersion {
    pub const fn new(maj: u16, min: u16, rev: u32) -> Self {
        Self { maj, min, rev }
    }

    /// Packed 64-bit form: major in the top 16 bits, minor in the next
    /// 16, revision in the low 32.
    pub fn packed(self) -> u64 {
        ((self.maj as u64) << 48) | ((self.min as u64) << 32) | self.rev as u64
    }

    /// `maj_min_rev`, the form used in recovery directory names.
    pub fn underscored(self) -> String {
        format!("{}_{}_{}", self.maj, self.min, self.rev)
    }
}

impl fmt::Display for InstallVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.maj, self.min, self.rev)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version string: {0}")]
pub struct VersionParseError(pub String);

impl FromStr for InstallVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || VersionParseError(s.to_string());
        let mut parts = s.split('.');
        let maj = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let min = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let rev = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(Self { maj, min, rev })
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
