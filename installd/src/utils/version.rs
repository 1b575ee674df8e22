//! rpm style version ordering.
//!
//! Versions are split into alternating runs of digits and letters, anything
//! else acts as a separator. Digit runs compare numerically and rank above
//! letter runs. A `~` sorts before everything, including the end of the
//! string, so `1.0~rc1` comes before `1.0`.

use std::cmp::Ordering;

pub fn compare(left: &str, right: &str) -> Ordering {
    let mut left = left.as_bytes();
    let mut right = right.as_bytes();

    loop {
        left = skip_separators(left);
        right = skip_separators(right);

        match (left.first(), right.first()) {
            (Some(b'~'), Some(b'~')) => {
                left = &left[1..];
                right = &right[1..];
                continue;
            }
            (Some(b'~'), _) => return Ordering::Less,
            (_, Some(b'~')) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(_), Some(_)) => {}
        }

        let numeric = left[0].is_ascii_digit();
        let (left_segment, left_rest) = split_segment(left, numeric);
        let (right_segment, right_rest) = split_segment(right, numeric);

        // the right side starts with the other kind of segment
        if right_segment.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ordering = if numeric {
            compare_numeric(left_segment, right_segment)
        } else {
            left_segment.cmp(right_segment)
        };

        if ordering != Ordering::Equal {
            return ordering;
        }

        left = left_rest;
        right = right_rest;
    }
}

fn skip_separators(version: &[u8]) -> &[u8] {
    let start = version
        .iter()
        .position(|byte| byte.is_ascii_alphanumeric() || *byte == b'~')
        .unwrap_or(version.len());
    &version[start..]
}

fn split_segment(version: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let end = version
        .iter()
        .position(|byte| {
            if numeric {
                !byte.is_ascii_digit()
            } else {
                !byte.is_ascii_alphabetic()
            }
        })
        .unwrap_or(version.len());
    version.split_at(end)
}

fn compare_numeric(left: &[u8], right: &[u8]) -> Ordering {
    let left = trim_leading_zeros(left);
    let right = trim_leading_zeros(right);
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let start = digits
        .iter()
        .position(|byte| *byte != b'0')
        .unwrap_or(digits.len());
    &digits[start..]
}

#[cfg(test)]
mod tests {
    use super::compare;
    use std::cmp::Ordering;

    #[test]
    fn numeric_segments_compare_by_value() {
        assert_eq!(
            compare("5.14.10-300.fc35.x86_64", "5.9.1-100.fc35.x86_64"),
            Ordering::Greater
        );
        assert_eq!(compare("1.010", "1.9"), Ordering::Greater);
        assert_eq!(compare("1.001", "1.1"), Ordering::Equal);
    }

    #[test]
    fn equal_versions() {
        assert_eq!(
            compare("6.5.6-300.fc39.x86_64", "6.5.6-300.fc39.x86_64"),
            Ordering::Equal
        );
        assert_eq!(compare("1.0", "1_0"), Ordering::Equal);
    }

    #[test]
    fn tilde_sorts_first() {
        assert_eq!(compare("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(compare("1.0", "1.0~rc1"), Ordering::Greater);
        assert_eq!(compare("1.0~rc1", "1.0~rc2"), Ordering::Less);
    }

    #[test]
    fn leftover_characters_win() {
        assert_eq!(compare("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn digits_rank_above_letters() {
        assert_eq!(compare("1.1", "1.a"), Ordering::Greater);
        assert_eq!(compare("1.a", "1.1"), Ordering::Less);
        assert_eq!(compare("fc35", "fc36"), Ordering::Less);
    }
}
