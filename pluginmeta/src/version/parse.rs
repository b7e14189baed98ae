//! Version string parsing.
//!
//! Plugin versions are free-form: an optional prefix word is removed, then
//! the remainder is cut into runs of digits and runs of other characters.
//! QGIS versions are strictly dotted numbers.

use super::Version;
use crate::error::VersionValueError;

/// Prefix words removed from plugin versions, in the order they are tried.
///
/// Every prefix is checked in turn against what is left after the previous
/// ones, so `"VER.R1"` loses both `VER.` and `R`.
pub const PREFIXES: &[&str] = &[
    "VERSION", "VER.", "VER", "V.", "V", "REVISION", "REV.", "REV", "R.", "R",
];

/// Characters separating version elements. They never end up in an element.
pub const DELIMITERS: &[char] = &['.', '-', '_', ' '];

/// Whitespace trimmed around the version and after each removed prefix.
const TRIMMED: &[char] = &[' ', '\t', '\n'];

/// Middle fragment that marks a pre-release of the next major QGIS version.
const PRE_RELEASE_MINOR: &str = "99";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Delimiter,
    Digit,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if DELIMITERS.contains(&c) {
            CharClass::Delimiter
        } else if c.is_ascii_digit() {
            CharClass::Digit
        } else {
            CharClass::Other
        }
    }
}

/// Uppercase and strip known prefix words.
fn normalize(raw: &str) -> String {
    let mut normalized = raw.to_uppercase().trim_matches(TRIMMED).to_string();
    for prefix in PREFIXES {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            normalized = rest.trim_matches(TRIMMED).to_string();
        }
    }
    normalized
}

/// Split into maximal runs of digits and of other characters.
fn split(normalized: &str) -> Vec<String> {
    let mut elements: Vec<String> = Vec::new();
    let mut previous = CharClass::Delimiter;

    for c in normalized.chars() {
        let class = CharClass::of(c);
        match class {
            CharClass::Delimiter => {}
            _ if class == previous => {
                if let Some(last) = elements.last_mut() {
                    last.push(c);
                }
            }
            _ => elements.push(c.to_string()),
        }
        previous = class;
    }

    elements
}

impl Version {
    /// Parse a plugin version string.
    ///
    /// The string is uppercased, known prefix words (`VERSION`, `REV.`,
    /// `V`, ...) are removed, and the rest is split at delimiters and at
    /// every change between digits and other characters.
    ///
    /// ```
    /// use pluginmeta::version::Version;
    ///
    /// let v = Version::from_plugin_version("Version 2.0-rc1").unwrap();
    /// assert_eq!(v.elements(), ["2", "0", "RC", "1"]);
    /// assert_eq!(v.original(), "Version 2.0-rc1");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`VersionValueError::Empty`] for an empty string and
    /// [`VersionValueError::NoElements`] when only a prefix or delimiters
    /// are present.
    pub fn from_plugin_version(raw: &str) -> Result<Self, VersionValueError> {
        if raw.is_empty() {
            return Err(VersionValueError::Empty);
        }

        let elements = split(&normalize(raw));
        if elements.is_empty() {
            return Err(VersionValueError::NoElements(raw.to_string()));
        }

        Ok(Self::with_original(elements, raw))
    }

    /// Parse a QGIS version string such as `"3.16"` or `"3.22.4"`.
    ///
    /// Up to three numeric, dot-separated fragments are accepted; missing
    /// trailing fragments become `0`. With `fix_compatibility`, a pre-release
    /// track `X.99.Z` is treated as the next major release `(X+1).0.0`, which
    /// is how QGIS checks plugin compatibility.
    ///
    /// ```
    /// use pluginmeta::version::Version;
    ///
    /// let dev = Version::from_qgis_version("3.99.1", true).unwrap();
    /// assert_eq!(dev, Version::from_qgis_version("4.0.0", false).unwrap());
    /// assert_eq!(dev.original(), "3.99.1");
    /// ```
    ///
    /// # Errors
    ///
    /// Fails for empty input, more than three fragments, or any empty or
    /// non-numeric fragment.
    pub fn from_qgis_version(raw: &str, fix_compatibility: bool) -> Result<Self, VersionValueError> {
        if raw.is_empty() {
            return Err(VersionValueError::Empty);
        }

        let mut fragments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if fragments.len() > 3 {
            return Err(VersionValueError::TooManyFragments(raw.to_string()));
        }
        let numeric = |fragment: &String| {
            !fragment.is_empty() && fragment.chars().all(|c| c.is_ascii_digit())
        };
        if !fragments.iter().all(numeric) {
            return Err(VersionValueError::NonNumericFragment(raw.to_string()));
        }
        fragments.resize(3, "0".to_string());

        if fix_compatibility && fragments[1] == PRE_RELEASE_MINOR {
            fragments = vec![increment(&fragments[0]), "0".to_string(), "0".to_string()];
        }

        Ok(Self::with_original(fragments, raw))
    }
}

/// Add one to a decimal digit string of any length.
fn increment(digits: &str) -> String {
    let mut bytes: Vec<u8> = digits.trim_start_matches('0').bytes().collect();
    let mut index = bytes.len();
    loop {
        if index == 0 {
            bytes.insert(0, b'1');
            break;
        }
        index -= 1;
        if bytes[index] == b'9' {
            bytes[index] = b'0';
        } else {
            bytes[index] += 1;
            break;
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
