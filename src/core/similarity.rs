/// Normalized edit-distance similarity between generated descriptions.

/// Levenshtein distance over characters, case-insensitive.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    levenshtein(&a, &b, usize::MAX).unwrap_or(usize::MAX)
}

/// Similarity in `[0, 1]`: `(longer - distance) / longer`.
///
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let (longer, shorter) = order(a, b);
    let longer_len = longer.chars().count();
    if longer_len == 0 {
        return 1.0;
    }
    let distance = edit_distance(longer, shorter);
    (longer_len - distance.min(longer_len)) as f64 / longer_len as f64
}

/// Whether `similarity(a, b) > threshold`, computed with an early exit once
/// the distance can no longer fall under the bound.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let longer_len = a.len().max(b.len());
    if longer_len == 0 {
        return 1.0 > threshold;
    }

    // similarity > t  <=>  distance < (1 - t) * longer
    let bound = (1.0 - threshold) * longer_len as f64;
    if bound <= 0.0 {
        return false;
    }
    let max_distance = bound.ceil() as usize;
    if a.len().abs_diff(b.len()) > max_distance {
        return false;
    }

    match levenshtein(&a, &b, max_distance) {
        Some(d) => (longer_len - d.min(longer_len)) as f64 / longer_len as f64 > threshold,
        None => false,
    }
}

fn order<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Single-row Levenshtein. Returns `None` as soon as every cell in a row
/// exceeds `limit`.
fn levenshtein(a: &[char], b: &[char], limit: usize) -> Option<usize> {
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        let mut row_min = row[0];

        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = if ca == cb { prev_diag } else { prev_diag.min(above).min(row[j]) + 1 };
            prev_diag = above;
            row[j + 1] = cost;
            row_min = row_min.min(cost);
        }

        if row_min > limit {
            return None;
        }
    }

    let d = row[b.len()];
    if d > limit {
        None
    } else {
        Some(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("ABC", "abc"), 0);
        assert_eq!(edit_distance("古老城堡", "古老寺庙"), 2);
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abcd", "abcd"), 1.0);
        assert_eq!(similarity("abcd", ""), 0.0);
        assert!((similarity("kitten", "sitting") - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn is_similar_agrees_with_similarity() {
        let pairs = [
            ("kitten", "sitting"),
            ("abcdefghij", "abcdefghiz"),
            ("abcdefghij", "zyxwvutsrq"),
            ("在古老城堡的大厅里", "在古老城堡的大厅中"),
            ("", ""),
            ("same", "same"),
        ];
        for (a, b) in pairs {
            for t in [0.3, 0.5, 0.7, 0.9] {
                assert_eq!(
                    is_similar(a, b, t),
                    similarity(a, b) > t,
                    "mismatch for {:?}/{:?} at {}",
                    a,
                    b,
                    t
                );
            }
        }
    }
}
