//! Word-level alignment between an expected and a transcribed token sequence.
//!
//! # Algorithm
//!
//! ```text
//! expected:  the  cat  sat  on  the  mat
//! actual:    the  cat       on  the  hat
//!            ───────── ──── ─────── ────
//!            match     del  match   sub
//! ```
//!
//! 1. [`matching_blocks`] decomposes both sequences into longest common runs
//!    (earliest run wins ties).
//! 2. Runs become [`AlignmentOp::Match`] ops.
//! 3. Each gap between runs is paired off positionally as
//!    [`AlignmentOp::Substitute`]; whatever is left on the expected side is
//!    [`AlignmentOp::Delete`], on the transcript side [`AlignmentOp::Insert`].
//!
//! The op list covers every index of both sequences exactly once and is
//! ordered by position in both.

pub mod matcher;

use serde::{Deserialize, Serialize};

pub use matcher::{longest_match, matching_blocks, Block};

// ---------------------------------------------------------------------------
// AlignmentOp
// ---------------------------------------------------------------------------

/// One step of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AlignmentOp {
    /// `expected[expected] == actual[actual]`.
    Match { expected: usize, actual: usize },
    /// The reader said `actual[actual]` where `expected[expected]` was written.
    Substitute { expected: usize, actual: usize },
    /// `expected[expected]` has no counterpart in the transcript.
    Delete { expected: usize },
    /// `actual[actual]` has no counterpart in the expected text.
    Insert { actual: usize },
}

impl AlignmentOp {
    /// Index into the expected sequence, if this op covers one.
    pub fn expected_index(&self) -> Option<usize> {
        match *self {
            AlignmentOp::Match { expected, .. }
            | AlignmentOp::Substitute { expected, .. }
            | AlignmentOp::Delete { expected } => Some(expected),
            AlignmentOp::Insert { .. } => None,
        }
    }

    /// Index into the transcript sequence, if this op covers one.
    pub fn actual_index(&self) -> Option<usize> {
        match *self {
            AlignmentOp::Match { actual, .. }
            | AlignmentOp::Substitute { actual, .. }
            | AlignmentOp::Insert { actual } => Some(actual),
            AlignmentOp::Delete { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, AlignmentOp::Match { .. })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Align `actual` against `expected`.
///
/// ```
/// use reading_tutor::align::{align, AlignmentOp};
///
/// let ops = align(&["the", "cat"], &["the", "hat"]);
/// assert_eq!(
///     ops,
///     vec![
///         AlignmentOp::Match { expected: 0, actual: 0 },
///         AlignmentOp::Substitute { expected: 1, actual: 1 },
///     ]
/// );
/// ```
pub fn align<T: PartialEq>(expected: &[T], actual: &[T]) -> Vec<AlignmentOp> {
    let mut ops = Vec::with_capacity(expected.len().max(actual.len()));
    let (mut i, mut j) = (0, 0);

    let sentinel = Block {
        expected: expected.len(),
        actual: actual.len(),
        len: 0,
    };

    for block in matching_blocks(expected, actual)
        .into_iter()
        .chain(std::iter::once(sentinel))
    {
        push_gap(&mut ops, i..block.expected, j..block.actual);
        ops.extend((0..block.len).map(|d| AlignmentOp::Match {
            expected: block.expected + d,
            actual: block.actual + d,
        }));
        i = block.expected + block.len;
        j = block.actual + block.len;
    }

    ops
}

/// Similarity in `[0, 1]`: twice the matched count over the total length of
/// both sequences.  Two empty sequences are identical (`1.0`).
pub fn matched_ratio(ops: &[AlignmentOp], expected_len: usize, actual_len: usize) -> f64 {
    let total = expected_len + actual_len;
    if total == 0 {
        return 1.0;
    }
    let matches = ops.iter().filter(|op| op.is_match()).count();
    (2 * matches) as f64 / total as f64
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn push_gap(
    ops: &mut Vec<AlignmentOp>,
    expected: std::ops::Range<usize>,
    actual: std::ops::Range<usize>,
) {
    let paired = expected.len().min(actual.len());

    ops.extend(
        expected
            .clone()
            .zip(actual.clone())
            .map(|(e, a)| AlignmentOp::Substitute {
                expected: e,
                actual: a,
            }),
    );
    ops.extend(
        expected
            .skip(paired)
            .map(|e| AlignmentOp::Delete { expected: e }),
    );
    ops.extend(actual.skip(paired).map(|a| AlignmentOp::Insert { actual: a }));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
