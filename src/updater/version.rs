//! Plugin version ordering
//!
//! Versions are split into numeric and alphabetic parts (`1.0.0-beta2` →
//! `1 0 0 beta 2`). Numbers compare numerically; the alphabetic markers
//! order as `dev < alpha/a < beta/b < RC/rc < <number> < pl/p`, and any
//! other word sorts before `dev`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Number(u64),
    Word(String),
}

fn canonicalize(version: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let flush = |current: &mut String, is_digit: bool, parts: &mut Vec<Part>| {
        if current.is_empty() {
            return;
        }
        let part = if is_digit {
            Part::Number(current.parse().unwrap_or(u64::MAX))
        } else {
            Part::Word(current.to_ascii_lowercase())
        };
        parts.push(part);
        current.clear();
    };

    for c in version.trim().chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, current_is_digit, &mut parts);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut parts);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit, &mut parts);
    parts
}

fn word_rank(word: &str) -> i8 {
    match word {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "rc" => 3,
        "#" => 4,
        "pl" | "p" => 5,
        _ => -1,
    }
}

fn compare_parts(left: &Part, right: &Part) -> Ordering {
    match (left, right) {
        (Part::Number(a), Part::Number(b)) => a.cmp(b),
        (Part::Number(_), Part::Word(w)) => word_rank("#").cmp(&word_rank(w)),
        (Part::Word(w), Part::Number(_)) => word_rank(w).cmp(&word_rank("#")),
        (Part::Word(a), Part::Word(b)) => word_rank(a).cmp(&word_rank(b)),
    }
}

/// Compare two version strings
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left_parts = canonicalize(left);
    let right_parts = canonicalize(right);

    for (l, r) in left_parts.iter().zip(right_parts.iter()) {
        let ordering = compare_parts(l, r);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    // A longer version wins if its next part is a number or `pl`, loses if
    // it is a pre-release marker.
    let trailing = |part: &Part| match part {
        Part::Number(_) => Ordering::Greater,
        Part::Word(w) => word_rank(w).cmp(&word_rank("#")),
    };
    match left_parts.len().cmp(&right_parts.len()) {
        Ordering::Greater => trailing(&left_parts[right_parts.len()]),
        Ordering::Less => trailing(&right_parts[left_parts.len()]).reverse(),
        Ordering::Equal => Ordering::Equal,
    }
}

/// True when `candidate` is strictly newer than `installed`
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(candidate, installed) == Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parts_compare_numerically() {
        assert!(is_newer("2.10.0", "2.9.9"));
        assert!(is_newer("2.1.0", "2.0.0"));
        assert!(!is_newer("2.0.0", "2.0.0"));
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_pre_release_markers() {
        assert!(is_newer("1.0.0", "1.0.0-beta"));
        assert!(is_newer("1.0.0-rc1", "1.0.0-beta2"));
        assert!(is_newer("1.0.0-beta", "1.0.0-alpha"));
        assert!(is_newer("1.0.0-alpha", "1.0.0-dev"));
        assert!(is_newer("1.0.0-pl1", "1.0.0"));
        assert!(is_newer("1.0.0-beta2", "1.0.0-beta1"));
    }

    #[test]
    fn test_separator_and_case_insensitivity() {
        assert_eq!(compare_versions("1_0-RC1", "1.0rc1"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0+build", "1.0.0+other"), Ordering::Equal);
    }

    #[test]
    fn test_unknown_words_sort_first() {
        assert!(is_newer("1.0.0-dev", "1.0.0-snapshot"));
    }
}
