//! Edit distances for spelling correction.
//!
//! Adjacent transpositions count as a single edit (optimal string alignment
//! distance), which matches how chat typos such as `teh` or `recieve` arise.

use std::cmp::min;

/// Calculate the Damerau-Levenshtein (optimal string alignment) distance.
#[allow(clippy::needless_range_loop)]
pub fn damerau_levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];
    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = usize::from(s1_chars[i - 1] != s2_chars[j - 1]);

            matrix[i][j] = min(
                min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );

            if i > 1
                && j > 1
                && s1_chars[i - 1] == s2_chars[j - 2]
                && s1_chars[i - 2] == s2_chars[j - 1]
            {
                matrix[i][j] = min(matrix[i][j], matrix[i - 2][j - 2] + 1); // transposition
            }
        }
    }

    matrix[len1][len2]
}

/// Damerau-Levenshtein distance with early termination.
///
/// Returns `None` as soon as the distance is known to exceed `threshold`.
pub fn damerau_levenshtein_threshold(s1: &str, s2: &str, threshold: usize) -> Option<usize> {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1.abs_diff(len2) > threshold {
        return None;
    }

    // three rolling rows: i-2, i-1, i
    let mut before_prev: Vec<usize> = vec![0; len2 + 1];
    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row: Vec<usize> = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;
        let mut min_in_row = i;

        for j in 1..=len2 {
            let cost = usize::from(s1_chars[i - 1] != s2_chars[j - 1]);
            let mut value = min(min(prev_row[j] + 1, curr_row[j - 1] + 1), prev_row[j - 1] + cost);

            if i > 1
                && j > 1
                && s1_chars[i - 1] == s2_chars[j - 2]
                && s1_chars[i - 2] == s2_chars[j - 1]
            {
                value = min(value, before_prev[j - 2] + 1);
            }

            curr_row[j] = value;
            min_in_row = min(min_in_row, value);
        }

        if min_in_row > threshold {
            return None;
        }

        std::mem::swap(&mut before_prev, &mut prev_row);
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    let distance = prev_row[len2];
    (distance <= threshold).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damerau_levenshtein_distance() {
        assert_eq!(damerau_levenshtein_distance("", "abc"), 3);
        assert_eq!(damerau_levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(damerau_levenshtein_distance("teh", "the"), 1);
        assert_eq!(damerau_levenshtein_distance("recieve", "receive"), 1);
        assert_eq!(damerau_levenshtein_distance("happy", "happy"), 0);
    }

    #[test]
    fn test_threshold_agrees_with_full_distance() {
        let pairs = [
            ("teh", "the"),
            ("happi", "happy"),
            ("sadd", "sad"),
            ("kitten", "sitting"),
            ("abc", "cab"),
            ("wrold", "world"),
        ];
        for (a, b) in pairs {
            let full = damerau_levenshtein_distance(a, b);
            assert_eq!(damerau_levenshtein_threshold(a, b, 3), Some(full), "{a} {b}");
        }
    }

    #[test]
    fn test_threshold_cutoff() {
        assert_eq!(damerau_levenshtein_threshold("kitten", "sitting", 2), None);
        assert_eq!(damerau_levenshtein_threshold("a", "abcd", 2), None);
        assert_eq!(damerau_levenshtein_threshold("", "ab", 2), Some(2));
    }
}
