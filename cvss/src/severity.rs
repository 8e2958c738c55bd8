use serde::{Deserialize, Serialize, de, ser};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Qualitative Severity Rating Scale
///
/// Described in CVSS v3.1 Specification: Section 5:
/// <https://www.first.org/cvss/specification-document#t17>
///
/// The dashboard only distinguishes the four bands the feed renders; scores
/// below 4.0, including 0.0, all classify as `Low`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, ToSchema)]
pub enum Severity {
    /// Low: CVSS Score 0.0 - 3.9
    Low,

    /// Medium: CVSS Score 4.0 - 6.9
    Medium,

    /// High: CVSS Score 7.0 - 8.9
    High,

    /// Critical: CVSS Score 9.0 - 10.0
    Critical,
}

impl Severity {
    /// Get a `str` describing the severity level
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Classify a base score. Callers clamp to `[0, 10]` before calling;
    /// the comparisons themselves are total over any finite input.
    pub fn from_f64(value: f64) -> Severity {
        match value {
            x if x < 4.0 => Severity::Low,
            x if x < 7.0 => Severity::Medium,
            x if x < 9.0 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

impl From<f64> for Severity {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeverityError {
    #[error("invalid severity: {name}")]
    Invalid { name: String },
}

impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(SeverityError::Invalid { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for Severity {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn thresholds() {
        assert_eq!(Severity::from_f64(0.0), Severity::Low);
        assert_eq!(Severity::from_f64(3.999), Severity::Low);
        assert_eq!(Severity::from_f64(4.0), Severity::Medium);
        assert_eq!(Severity::from_f64(6.999), Severity::Medium);
        assert_eq!(Severity::from_f64(7.0), Severity::High);
        assert_eq!(Severity::from_f64(8.999), Severity::High);
        assert_eq!(Severity::from_f64(9.0), Severity::Critical);
        assert_eq!(Severity::from_f64(10.0), Severity::Critical);
    }

    #[test]
    fn round_trip() {
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }

        assert!("unknown".parse::<Severity>().is_err());
    }

    #[test]
    fn serde_wire_form() {
        assert_eq!(
            serde_json::to_value(Severity::Critical).unwrap(),
            serde_json::json!("Critical")
        );
        assert_eq!(
            serde_json::from_value::<Severity>(serde_json::json!("high")).unwrap(),
            Severity::High
        );
    }
}
