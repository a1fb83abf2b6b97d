//! Version classification and ordering.
//!
//! Package versions arrive as free-form strings: release numbers such as
//! `2.0.13` or `2.0.13.1`, pre-releases such as `2.0.0-alpha`, and moving
//! branch references such as `dev-master`. This module classifies them and
//! defines the ordering used when slicing changelogs.

use std::cmp::Ordering;
use std::fmt;

/// Coarse classification of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    /// Dot-separated release number, optionally with a pre-release suffix.
    Numeric,
    /// Anything else, e.g. a development branch.
    BranchLike,
}

/// Fine-grained shape of a parsed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionShape {
    Numeric,
    NumericAlpha,
    BranchLike,
}

/// Classify a version string by its lexical form.
///
/// Never fails: anything that is not a release number is branch-like.
pub fn classify(version: &str) -> VersionKind {
    VersionToken::parse(version).kind()
}

/// A parsed release number: 2 to 4 integer components plus optional suffix.
///
/// Equality follows the ordering, so `2.0` equals `2.0.0`.
#[derive(Debug, Clone)]
pub struct NumericVersion {
    components: Vec<u64>,
    pre_release: Option<String>,
}

impl NumericVersion {
    fn parse(version: &str) -> Option<Self> {
        let (number, pre_release) = match version.split_once('-') {
            Some((number, suffix)) => (number, Some(suffix)),
            None => (version, None),
        };

        let parts: Vec<&str> = number.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return None;
        }

        let mut components = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            components.push(part.parse().ok()?);
        }

        if let Some(suffix) = pre_release
            && (suffix.is_empty()
                || !suffix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'))
        {
            return None;
        }

        Some(Self {
            components,
            pre_release: pre_release.map(String::from),
        })
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl Ord for NumericVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..4 {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        match (&self.pre_release, &other.pre_release) {
            (None, None) => Ordering::Equal,
            // a pre-release precedes the release it leads up to
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_pre_release(a, b),
        }
    }
}

impl PartialEq for NumericVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumericVersion {}

impl PartialOrd for NumericVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two pre-release labels, e.g. `alpha` < `beta.2` < `RC1`.
fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let (word_a, rest_a) = split_label(a);
    let (word_b, rest_b) = split_label(b);

    match (stability_rank(&word_a), stability_rank(&word_b)) {
        (Some(x), Some(y)) if x != y => return x.cmp(&y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) if word_a != word_b => return word_a.cmp(&word_b),
        _ => {}
    }

    let trailing_number = |s: &str| -> Option<u64> {
        s.trim_start_matches(['.', '-'])
            .split(['.', '-'])
            .next()
            .and_then(|n| n.parse().ok())
    };

    match (trailing_number(rest_a), trailing_number(rest_b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| rest_a.cmp(rest_b)),
        _ => rest_a.cmp(rest_b),
    }
}

/// Split a label into its lowercase leading word and the remainder.
fn split_label(label: &str) -> (String, &str) {
    let end = label
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(label.len());
    (label[..end].to_ascii_lowercase(), &label[end..])
}

fn stability_rank(word: &str) -> Option<u8> {
    match word {
        "dev" => Some(0),
        "alpha" | "a" => Some(1),
        "beta" | "b" => Some(2),
        "rc" => Some(3),
        _ => None,
    }
}

/// A version identifier, parsed once and compared many times.
///
/// Branch-like tokens all compare equal to each other: none of them can be
/// placed relative to another without asking the host.
#[derive(Debug, Clone)]
pub enum VersionToken {
    Numeric(NumericVersion),
    Branch(String),
}

impl VersionToken {
    pub fn parse(version: &str) -> Self {
        match NumericVersion::parse(version.trim()) {
            Some(numeric) => VersionToken::Numeric(numeric),
            None => VersionToken::Branch(version.trim().to_string()),
        }
    }

    pub fn kind(&self) -> VersionKind {
        match self {
            VersionToken::Numeric(_) => VersionKind::Numeric,
            VersionToken::Branch(_) => VersionKind::BranchLike,
        }
    }

    pub fn shape(&self) -> VersionShape {
        match self {
            VersionToken::Numeric(n) if n.pre_release.is_some() => VersionShape::NumericAlpha,
            VersionToken::Numeric(_) => VersionShape::Numeric,
            VersionToken::Branch(_) => VersionShape::BranchLike,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == VersionKind::Numeric
    }

    /// Truncate a release number to major.minor.patch, dropping any fourth
    /// component and pre-release suffix. Branch-like tokens are returned as-is.
    pub fn patch_floor(&self) -> VersionToken {
        match self {
            VersionToken::Numeric(n) => VersionToken::Numeric(NumericVersion {
                components: n.components.iter().copied().take(3).collect(),
                pre_release: None,
            }),
            VersionToken::Branch(_) => self.clone(),
        }
    }
}

impl Ord for VersionToken {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VersionToken::Numeric(a), VersionToken::Numeric(b)) => a.cmp(b),
            // a branch stands for "latest"
            (VersionToken::Numeric(_), VersionToken::Branch(_)) => Ordering::Less,
            (VersionToken::Branch(_), VersionToken::Numeric(_)) => Ordering::Greater,
            (VersionToken::Branch(_), VersionToken::Branch(_)) => Ordering::Equal,
        }
    }
}

impl PartialEq for VersionToken {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionToken {}

impl PartialOrd for VersionToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionToken::Numeric(n) => {
                let parts: Vec<String> = n.components.iter().map(u64::to_string).collect();
                write!(f, "{}", parts.join("."))?;
                if let Some(pre) = &n.pre_release {
                    write!(f, "-{}", pre)?;
                }
                Ok(())
            }
            VersionToken::Branch(name) => write!(f, "{}", name),
        }
    }
}
