//! Mod version strings and comparisons.
//!
//! Versions are dot-separated lists of non-negative integers (`"0.0.24"`,
//! `"5.3"`). Components are compared left to right; when one version is a
//! prefix of the other, the shorter one is the smaller, so `5.3 < 5.3.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::ModError;

// ---------------------------------------------------------------------------
// ComparisonOp
// ---------------------------------------------------------------------------

/// Relational operator used in dependency declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    /// Whether `ordering` (version compared to required) satisfies the operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Le => ordering != Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            other => Err(ModError::UnknownOperator {
                op: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(Vec<u64>);

impl Version {
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for Version {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModError::InvalidVersion {
            version: s.to_owned(),
        };
        if s.is_empty() {
            return Err(invalid());
        }
        s.split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lexicographic over components; a strict prefix sorts first.
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{c}")?;
            first = false;
        }
        Ok(())
    }
}

/// Evaluate `version <op> required`, e.g. `("0.0.9", "<", "0.1.0")`.
pub fn compare_version_strings(version: &str, op: &str, required: &str) -> Result<bool, ModError> {
    let op: ComparisonOp = op.parse()?;
    let version: Version = version.parse()?;
    let required: Version = required.parse()?;
    Ok(op.accepts(version.cmp(&required)))
}
