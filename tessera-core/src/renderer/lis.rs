//! Longest increasing subsequence.

/// Indices of a longest strictly increasing subsequence of `positions`.
///
/// `None` entries never take part in a subsequence. Runs in O(n log n): for
/// each length the index of the smallest tail seen so far is kept, found by
/// binary search, and each entry remembers its predecessor so the sequence can
/// be rebuilt from the last tail.
pub fn longest_increasing_subsequence(positions: &[Option<usize>]) -> Vec<usize> {
    let mut predecessors: Vec<Option<usize>> = vec![None; positions.len()];
    // tails[k] = index of the smallest tail of an increasing run of length k+1
    let mut tails: Vec<usize> = Vec::new();

    for (i, position) in positions.iter().enumerate() {
        let Some(value) = *position else {
            continue;
        };
        let slot = tails.partition_point(|&t| positions[t].is_some_and(|tail| tail < value));
        if slot > 0 {
            predecessors[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut sequence = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        sequence.push(i);
        cursor = predecessors[i];
    }
    sequence.reverse();
    sequence
}
