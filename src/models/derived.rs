//! Astronomically relevant parameters derived per hour

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a derived value came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Supplied directly by a provider
    Native,
    /// Approximated from other fields of the hour
    Estimated,
}

/// A value tagged with its provenance
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    #[must_use]
    pub fn native(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Native,
        }
    }

    #[must_use]
    pub fn estimated(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Estimated,
        }
    }

    #[must_use]
    pub fn is_estimated(&self) -> bool {
        self.provenance == Provenance::Estimated
    }
}

/// Seeing, transparency and lifted index for one hour.
///
/// Absent values are `None`, never zero.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct DerivedParameters {
    /// Seeing in arcseconds
    pub seeing: Option<Sourced<f64>>,
    /// Transparency index in [0,1], 1 = pristine sky
    pub transparency: Option<Sourced<f64>>,
    /// Lifted index proxy in °C
    pub lifted_index: Option<Sourced<f64>>,
}

impl DerivedParameters {
    /// Plain description of the lifted index, if present
    #[must_use]
    pub fn lifted_index_plain(&self) -> Option<&'static str> {
        self.lifted_index.map(|li| lifted_index_plain(li.value))
    }
}

/// Plain description of a lifted index value in °C
#[must_use]
pub fn lifted_index_plain(value: f64) -> &'static str {
    match value {
        v if v < -6.0 => "Below -6, very unstable",
        v if v < -4.0 => "-6 to -4, very unstable",
        v if v < -1.5 => "-4 to -1.5, unstable",
        v if v < 0.0 => "-1.5 to 0, slightly unstable",
        v if v < 1.5 => "0 to 1.5, stable",
        v if v < 4.0 => "1.5 to 4, stable",
        v if v <= 6.0 => "4 to 6, very stable",
        _ => "Over 6, very stable",
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Native => write!(f, "native"),
            Provenance::Estimated => write!(f, "estimated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_absent() {
        let derived = DerivedParameters::default();
        assert!(derived.seeing.is_none());
        assert!(derived.transparency.is_none());
        assert!(derived.lifted_index_plain().is_none());
    }

    #[test]
    fn test_lifted_index_plain() {
        assert_eq!(lifted_index_plain(-7.0), "Below -6, very unstable");
        assert_eq!(lifted_index_plain(-1.0), "-1.5 to 0, slightly unstable");
        assert_eq!(lifted_index_plain(2.0), "1.5 to 4, stable");
        assert_eq!(lifted_index_plain(7.0), "Over 6, very stable");
    }

    #[test]
    fn test_sourced_provenance() {
        assert!(Sourced::estimated(1.2).is_estimated());
        assert!(!Sourced::native(1.2).is_estimated());
        assert_eq!(Provenance::Estimated.to_string(), "estimated");
    }
}
