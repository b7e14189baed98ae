//! Plugin and QGIS version handling.
//!
//! QGIS does not use semantic versioning for plugins. Its plugin installer
//! compares free-form version strings with its own legacy algorithm, and this
//! module reproduces that algorithm so that ordering decisions match the host
//! application exactly.
//!
//! # Overview
//!
//! A [`Version`] is an immutable sequence of string elements plus the
//! original, unparsed string. Two factories build it:
//!
//! - [`Version::from_plugin_version`] - free-form plugin versions such as
//!   `"v1.2-beta"`, split into runs of digits and non-digits
//! - [`Version::from_qgis_version`] - dotted host versions such as `"3.16"`,
//!   always three numeric fragments
//!
//! # Ordering
//!
//! Elements are compared pairwise. Two numeric elements (no leading zero)
//! compare as integers, everything else compares as text. The stability
//! suffixes `ALPHA`, `BETA`, `PREVIEW`, `RC` and `TRUNK` rank below every
//! other element, including a missing one, so `1.2` is greater than
//! `1.2 alpha` while `1.2.1` is greater than `1.2`.
//!
//! ```
//! use pluginmeta::version::Version;
//!
//! let stable = Version::from_plugin_version("1.2").unwrap();
//! let alpha = Version::from_plugin_version("1.2 alpha").unwrap();
//!
//! assert!(stable > alpha);
//! assert!(!alpha.is_stable());
//! assert_eq!(alpha.to_string(), "1.2.ALPHA");
//! ```

mod compare;
mod parse;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub use compare::UNSTABLE_SUFFIXES;
pub use parse::{DELIMITERS, PREFIXES};

/// Version of a plugin or of QGIS itself.
///
/// Equality and hashing only look at the normalized elements; the original
/// string is kept for display and serialization.
#[derive(Clone)]
pub struct Version {
    elements: Vec<String>,
    original: String,
}

impl Version {
    /// Build a version from already normalized elements.
    ///
    /// The original string becomes the elements joined with `.`.
    #[cfg(test)]
    pub(crate) fn from_elements<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        let original = elements.join(".");
        Self { elements, original }
    }

    pub(crate) fn with_original(elements: Vec<String>, original: impl Into<String>) -> Self {
        Self {
            elements,
            original: original.into(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the version has no elements.
    ///
    /// Parsed versions always have at least one element.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.elements.get(index).map(String::as_str)
    }

    /// All elements in order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// The string this version was parsed from, unmodified.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Whether no element is a stability suffix such as `BETA` or `RC`.
    ///
    /// ```
    /// use pluginmeta::version::Version;
    ///
    /// assert!(Version::from_plugin_version("1.2").unwrap().is_stable());
    /// assert!(!Version::from_plugin_version("1.2 rc 3.5").unwrap().is_stable());
    /// ```
    pub fn is_stable(&self) -> bool {
        !self
            .elements
            .iter()
            .any(|element| UNSTABLE_SUFFIXES.contains(&element.as_str()))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elements.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        if compare::greater_than(self, other) {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.elements.join("."))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({} from {:?})", self, self.original)
    }
}
