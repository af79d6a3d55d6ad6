/// Levenshtein edit distance over scalar values, two-row dynamic programming.
pub fn levenshtein_distance(left: &str, right: &str) -> usize {
    let a: Vec<char> = left.chars().collect();
    let b: Vec<char> = right.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Row length follows the second string; swap so it is the shorter one.
    let (a, b) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            row[j + 1] = substitution.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}

/// Edit-distance similarity scaled to [0, 100]: identical strings score 100,
/// fully dissimilar strings score 0. Two empty strings count as identical.
pub fn similarity_ratio(left: &str, right: &str) -> u8 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 100;
    }
    let distance = levenshtein_distance(left, right);
    (100.0 * (1.0 - distance as f64 / longest as f64)).round() as u8
}
