//! Longest common subsequence via Myers' O(ND) diff algorithm.
//!
//! Ported from the reference's `longest_common_subsequence`, which keeps one
//! history per d-path (Chris Marchetti's technique) rather than per node,
//! and trims any common prefix/suffix before the main search.

use std::collections::HashMap;

/// Returns a maximal set of index pairs `(i, j)` such that `eq(A[i], B[j])`
/// holds for every pair, and the pairs are strictly increasing in both `i`
/// and `j`. The matcher calls this with an identity-via-match-map equality;
/// the character differ calls it with plain `char` equality.
///
/// Tie-break: when two d-paths reach the same furthest x, the downward move
/// (no new delete from the left sequence) is preferred, matching the
/// reference implementation exactly.
pub fn longest_common_subsequence<T>(
    left: &[T],
    right: &[T],
    eq: impl Fn(&T, &T) -> bool,
) -> Vec<(usize, usize)> {
    let lslen = left.len();
    let rslen = right.len();

    let mut start = 0usize;
    let mut lend = lslen;
    let mut rend = rslen;

    while start < lend && start < rend && eq(&left[start], &right[start]) {
        start += 1;
    }
    while start < lend && start < rend && eq(&left[lend - 1], &right[rend - 1]) {
        lend -= 1;
        rend -= 1;
    }

    let l = &left[start..lend];
    let r = &right[start..rend];
    let lmax = l.len() as i64;
    let rmax = r.len() as i64;

    if lmax + rmax == 0 {
        // The sequences are equal.
        return (0..lslen).map(|i| (i, i)).collect();
    }

    // k -> (furthest x reached on this diagonal, history of matches to get there)
    let mut furthest: HashMap<i64, (i64, Vec<(usize, usize)>)> = HashMap::new();
    furthest.insert(1, (0, Vec::new()));

    let dmax = lmax + rmax;
    for d in 0..=dmax {
        let mut k = -d;
        while k <= d {
            let left_entry = furthest.get(&(k - 1)).cloned();
            let right_entry = furthest.get(&(k + 1)).cloned();

            let go_down = k == -d
                || (k != d
                    && left_entry.as_ref().map(|e| e.0).unwrap_or(0)
                        < right_entry.as_ref().map(|e| e.0).unwrap_or(0));

            let (mut x, mut history) = if go_down {
                right_entry.unwrap_or((0, Vec::new()))
            } else {
                let (old_x, history) = left_entry.unwrap_or((0, Vec::new()));
                (old_x + 1, history)
            };

            let mut y = x - k;
            while x < lmax && y >= 0 && y < rmax && eq(&l[x as usize], &r[y as usize]) {
                history.push((x as usize + start, y as usize + start));
                x += 1;
                y += 1;
            }

            if x >= lmax && y >= rmax {
                let mut result: Vec<(usize, usize)> = (0..start).map(|e| (e, e)).collect();
                result.extend(history);
                result.extend((lend..lslen).zip(rend..rslen));
                return result;
            }

            furthest.insert(k, (x, history));
            k += 2;
        }
    }

    // Every reachable d-path is explored by d == lmax + rmax at the latest,
    // so the loop above always returns before falling through here.
    (0..start).map(|e| (e, e)).collect()
}
