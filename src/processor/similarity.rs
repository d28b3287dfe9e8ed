use std::collections::HashMap;

/// Similarity of two strings in `[0, 1]`: twice the number of characters in
/// common matching blocks over the total length. Blocks are found by taking
/// the longest common substring and recursing on both sides of it.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &positions, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }

        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common run of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`. On ties the
/// run starting earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);

    // run length of the match ending at (i - 1, j), keyed by j
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();
    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_run_lengths = HashMap::new();
        for &j in positions.get(c).map(Vec::as_slice).unwrap_or_default() {
            if j < b_lo {
                continue;
            }
            if j >= b_hi {
                break;
            }
            let size = j
                .checked_sub(1)
                .and_then(|prev| run_lengths.get(&prev))
                .copied()
                .unwrap_or(0)
                + 1;
            next_run_lengths.insert(j, size);
            if size > best_size {
                best_i = i + 1 - size;
                best_j = j + 1 - size;
                best_size = size;
            }
        }
        run_lengths = next_run_lengths;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::ratio;

    fn assert_close(expected: f64, actual: f64) {
        assert!((expected - actual).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_identical_strings() {
        assert_close(1.0, ratio("Acme Corp", "Acme Corp"));
        assert_close(1.0, ratio("", ""));
    }

    #[test]
    fn test_disjoint_strings() {
        assert_close(0.0, ratio("abc", "xyz"));
        assert_close(0.0, ratio("abc", ""));
    }

    #[test]
    fn test_known_ratios() {
        // "abxcd" vs "abcd": blocks "ab" and "cd"
        assert_close(8.0 / 9.0, ratio("abxcd", "abcd"));
        assert_close(0.75, ratio("abcd", "bcde"));
        // only "Acme " is shared
        assert_close(10.0 / 18.0, ratio("Acme Corp", "Acme Inc."));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 株式会社アクメ vs アクメ: 3 common of 7 + 3
        assert_close(0.6, ratio("株式会社アクメ", "アクメ"));
    }

    #[test]
    fn test_is_symmetric_for_simple_inputs() {
        assert_close(
            ratio("Tanaka Shoji", "Tanaka Shouji"),
            ratio("Tanaka Shouji", "Tanaka Shoji"),
        );
    }
}
