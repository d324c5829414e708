use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far apart skip links are placed on a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipDistance {
    /// ⌊√n⌋ for a list of length n.
    #[default]
    Sqrt,
    /// A constant distance, independent of list length.
    Fixed(usize),
    /// No skip links.
    None,
}

impl SkipDistance {
    /// Concrete distance for a list of `len` postings, `None` when no links apply.
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            SkipDistance::Sqrt if len > 0 => Some(((len as f64).sqrt() as usize).max(1)),
            SkipDistance::Fixed(d) if d > 0 => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for SkipDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipDistance::Sqrt => write!(f, "sqrt"),
            SkipDistance::Fixed(d) => write!(f, "{d}"),
            SkipDistance::None => write!(f, "none"),
        }
    }
}

impl FromStr for SkipDistance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqrt" => Ok(SkipDistance::Sqrt),
            "none" | "off" => Ok(SkipDistance::None),
            other => match other.parse::<usize>() {
                Ok(0) => Err("skip distance must be at least 1".into()),
                Ok(d) => Ok(SkipDistance::Fixed(d)),
                Err(_) => Err(format!("invalid skip distance {s:?}, expected sqrt, none or a number")),
            },
        }
    }
}

/// Skip targets for a list of `len` postings placed every `distance` positions.
///
/// Position `i` links to `i + distance` when `i` is a multiple of `distance`
/// and the target lies inside the list; every other position has no link.
pub fn skip_targets(len: usize, distance: usize) -> Vec<Option<usize>> {
    let mut targets = vec![None; len];
    if distance == 0 {
        return targets;
    }
    for i in (0..len).step_by(distance) {
        let target = i + distance;
        if target < len {
            targets[i] = Some(target);
        }
    }
    targets
}
