//! Element-wise version comparison.
//!
//! Mirrors the plugin installer of QGIS: numeric elements compare as
//! integers, everything else as strings, and stability suffixes rank below
//! any other element, even a missing one.

use std::cmp::Ordering;

use super::Version;

/// Elements marking a non-stable release, from lowest to highest rank.
pub const UNSTABLE_SUFFIXES: &[&str] = &["ALPHA", "BETA", "PREVIEW", "RC", "TRUNK"];

/// Stand-in for the element a shorter version lacks.
const MISSING_ELEMENT: &str = " ";

/// Sorts after every stability suffix.
const ORDINARY_RANK_PREFIX: char = 'Z';

/// Decide whether `a` is greater than `b`. The versions must not be equal.
pub(super) fn greater_than(a: &Version, b: &Version) -> bool {
    let shared = a.len().min(b.len());

    for (x, y) in a.elements.iter().zip(&b.elements) {
        match compare_elements(x, y) {
            Ordering::Equal => continue,
            ordering => return ordering == Ordering::Greater,
        }
    }

    if a.len() > shared {
        return compare_elements(&a.elements[shared], MISSING_ELEMENT) == Ordering::Greater;
    }
    if b.len() > shared {
        return compare_elements(MISSING_ELEMENT, &b.elements[shared]) == Ordering::Greater;
    }

    a.original > b.original
}

/// Compare two single version elements.
pub(super) fn compare_elements(x: &str, y: &str) -> Ordering {
    if x == y {
        return Ordering::Equal;
    }

    if is_numeric(x) && is_numeric(y) {
        return compare_digits(x, y);
    }

    rank(x).cmp(&rank(y))
}

/// Non-empty, digits only, no leading zero.
fn is_numeric(element: &str) -> bool {
    !element.is_empty()
        && element.bytes().all(|b| b.is_ascii_digit())
        && !element.starts_with('0')
}

/// Integer comparison of digit strings without leading zeros.
fn compare_digits(x: &str, y: &str) -> Ordering {
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

fn rank(element: &str) -> String {
    if UNSTABLE_SUFFIXES.contains(&element) {
        element.to_string()
    } else {
        format!("{ORDINARY_RANK_PREFIX}{element}")
    }
}
