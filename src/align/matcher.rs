//! Longest-matching-block search.
//!
//! [`matching_blocks`] repeatedly takes the longest run common to both
//! sequences inside the current window, then searches the regions before
//! and after it independently.  The result is the list of matched runs in
//! increasing order of both indices.

/// A run of `len` equal items: `expected[expected..expected + len]` equals
/// `actual[actual..actual + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub expected: usize,
    pub actual: usize,
    pub len: usize,
}

/// Find the longest common run of `expected[alo..ahi]` and `actual[blo..bhi]`.
///
/// Ties are broken by the smallest start in `expected`, then the smallest
/// start in `actual`.  Returns a zero-length block at `(alo, blo)` when the
/// windows share nothing.
pub fn longest_match<T: PartialEq>(
    expected: &[T],
    actual: &[T],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> Block {
    let mut best = Block {
        expected: alo,
        actual: blo,
        len: 0,
    };

    // prev[jj] = length of the run ending at (i - 1, blo + jj - 1)
    let width = bhi.saturating_sub(blo);
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for jj in 0..width {
            let j = blo + jj;
            cur[jj + 1] = if expected[i] == actual[j] {
                let len = prev[jj] + 1;
                // Scanning ends in increasing (i, j) order with a strict
                // comparison keeps the earliest start among equal lengths.
                if len > best.len {
                    best = Block {
                        expected: i + 1 - len,
                        actual: j + 1 - len,
                        len,
                    };
                }
                len
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

/// All matched runs between `expected` and `actual`, sorted by position.
pub fn matching_blocks<T: PartialEq>(expected: &[T], actual: &[T]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending = vec![((0, expected.len()), (0, actual.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        let block = longest_match(expected, actual, (alo, ahi), (blo, bhi));
        if block.len == 0 {
            continue;
        }
        let (i, j, k) = (block.expected, block.actual, block.len);
        blocks.push(block);

        if alo < i && blo < j {
            pending.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            pending.push(((i + k, ahi), (j + k, bhi)));
        }
    }

    blocks.sort_by_key(|b| (b.expected, b.actual));
    blocks
}
