//! OCR confuses the digit `0` with the uppercase letter `O`. Given an id
//! read off an image, enumerate every binary substitution of the two at the
//! ambiguous positions so the caller can retry verification with each.

use std::collections::HashSet;

/// Char positions in `id` holding `'0'` or `'O'` (uppercase only, by
/// construction of the ids the banks issue). Char positions, not byte
/// offsets: ids arrive from user input and OCR, which can smuggle in
/// multibyte characters.
pub fn ambiguous_positions(id: &str) -> Vec<usize> {
    id.chars()
        .enumerate()
        .filter(|(_, c)| *c == '0' || *c == 'O')
        .map(|(i, _)| i)
        .collect()
}

/// Enumerate all `2^k` candidate ids for the `k` ambiguous positions, in
/// bitmask order: bit `j` set means position `j` is swapped. Mask 0 is the
/// original id, so it always appears exactly once, first. `max_positions`
/// caps `k` (positions beyond the cap are left untouched) since `2^k` grows
/// without bound on badly smudged receipts.
pub fn generate_candidates(id: &str, max_positions: usize) -> Vec<String> {
    let mut positions = ambiguous_positions(id);
    positions.truncate(max_positions);
    let chars: Vec<char> = id.chars().collect();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(1 << positions.len());
    for mask in 0u32..(1u32 << positions.len()) {
        let mut candidate = chars.clone();
        for (bit, &pos) in positions.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                candidate[pos] = if chars[pos] == '0' { 'O' } else { '0' };
            }
        }
        let candidate: String = candidate.into_iter().collect();
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ambiguous_characters_yields_singleton() {
        let candidates = generate_candidates("FT25188TN19J", 10);
        assert_eq!(candidates, vec!["FT25188TN19J".to_string()]);
    }

    #[test]
    fn two_positions_yield_four_unique_candidates() {
        let candidates = generate_candidates("F0O1234567", 10);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], "F0O1234567"); // mask 0: the original
        assert_eq!(candidates[1], "FOO1234567"); // bit 0: first position swapped
        assert_eq!(candidates[2], "F001234567"); // bit 1: second position swapped
        assert_eq!(candidates[3], "FO01234567"); // both swapped
    }

    #[test]
    fn candidates_differ_only_at_ambiguous_positions() {
        let id = "A0B0C0D0";
        let positions = ambiguous_positions(id);
        assert_eq!(positions, vec![1, 3, 5, 7]);
        let candidates = generate_candidates(id, 10);
        assert_eq!(candidates.len(), 1 << positions.len());
        for candidate in &candidates {
            assert_eq!(candidate.len(), id.len());
            for (i, (a, b)) in id.chars().zip(candidate.chars()).enumerate() {
                if !positions.contains(&i) {
                    assert_eq!(a, b, "position {i} must be untouched");
                }
            }
        }
        let original_count = candidates.iter().filter(|c| c.as_str() == id).count();
        assert_eq!(original_count, 1);
    }

    #[test]
    fn multibyte_prefix_does_not_shift_positions() {
        let id = "ክፍ0A567890";
        assert_eq!(ambiguous_positions(id), vec![2, 9]);
        let candidates = generate_candidates(id, 10);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], id);
        assert_eq!(candidates[1], "ክፍOA567890");
        assert_eq!(candidates[2], "ክፍ0A56789O");
        assert_eq!(candidates[3], "ክፍOA56789O");
    }

    #[test]
    fn lowercase_o_is_not_ambiguous() {
        assert!(ambiguous_positions("Fo1234").is_empty());
    }

    #[test]
    fn position_cap_bounds_the_enumeration() {
        let id = "0000000000000000"; // 16 ambiguous positions
        let candidates = generate_candidates(id, 3);
        assert_eq!(candidates.len(), 8);
        for candidate in &candidates {
            assert!(candidate[3..].chars().all(|c| c == '0'));
        }
    }
}
