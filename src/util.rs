/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * util.c
 *
 * This function contains various utility routines
 *
 * Started 9/28/95
 * George
 */

use crate::error::{Error, Result};
use crate::idx_t;

/// Runs the trailing statements when `$flag` is set in `$lvl`
#[macro_export]
macro_rules! ifset {
    ($lvl:expr, $flag:expr, $($stmt:stmt);+ $(;)?) => {
        if $lvl.contains($flag) {
            $($stmt;)+
        }
    };
}

/// Allocates `n` copies of `val`, reporting a failed reservation instead of aborting.
///
/// `what` names the allocation in the error, like the gk_malloc messages.
pub fn try_vec<T: Clone>(n: usize, val: T, what: &str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|e| Error::alloc(what, e))?;
    v.resize(n, val);
    Ok(v)
}

/// An empty vector with room for `n` elements
pub fn try_with_capacity<T>(n: usize, what: &str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|e| Error::alloc(what, e))?;
    Ok(v)
}

/// Returns the index of the first maximum element of `x`
///
/// ```
/// # use mlpart::util::iargmax;
/// assert_eq!(iargmax(&[1, 5, 2, 5]), 1);
/// assert_eq!(iargmax::<i32>(&[]), 0);
/// ```
#[inline(always)]
pub fn iargmax<T: PartialOrd + Copy>(x: &[T]) -> usize {
    let mut max = 0;
    for j in 1..x.len() {
        if x[j] > x[max] {
            max = j;
        }
    }
    max
}

/// Returns the index of the first minimum element of `x`
#[inline(always)]
pub fn iargmin<T: PartialOrd + Copy>(x: &[T]) -> usize {
    let mut min = 0;
    for j in 1..x.len() {
        if x[j] < x[min] {
            min = j;
        }
    }
    min
}

/// Equivalent of MAKECSR in gk_macros.h
///
/// Turns the counts in `a[..n]` into start offsets, `a` must have room for `n + 1` entries.
#[inline(always)]
pub fn make_csr(n: usize, a: &mut [usize]) {
    assert!(n < a.len(), "making a csr indexes up to n");
    for i in 1..n {
        a[i] += a[i - 1];
    }
    for i in (1..=n).rev() {
        a[i] = a[i - 1];
    }
    a[0] = 0;
}

/// Equivalent of SHIFTCSR in gk_macros.h
///
/// Undoes the advance of the offsets done while filling a csr structure.
#[inline(always)]
pub fn shift_csr(n: usize, a: &mut [usize]) {
    assert!(n < a.len(), "shifting a csr indexes up to n");
    for i in (1..=n).rev() {
        a[i] = a[i - 1];
    }
    a[0] = 0;
}

/// Returns a random number in `0..max`, `max` must be positive
#[inline]
pub fn rand_in_range(rng: &mut fastrand::Rng, max: usize) -> usize {
    rng.usize(0..max)
}

/// Randomly permutes the elements of `p`, optionally starting from the identity.
///
/// Mirrors irandArrayPermute: arrays of at least 10 entries get `nshuffles`
/// block swaps, smaller ones get `len` random swaps.
pub fn rand_array_permute(rng: &mut fastrand::Rng, p: &mut [usize], nshuffles: usize, init: bool) {
    let n = p.len();
    if init {
        for (i, x) in p.iter_mut().enumerate() {
            *x = i;
        }
    }

    if n < 10 {
        if n < 2 {
            return;
        }
        for _ in 0..n {
            let v = rng.usize(0..n);
            let u = rng.usize(0..n);
            p.swap(v, u);
        }
    } else {
        for _ in 0..nshuffles {
            let v = rng.usize(0..n - 3);
            let u = rng.usize(0..n - 3);
            p.swap(v, u + 2);
            p.swap(v + 1, u + 3);
            p.swap(v + 2, u);
            p.swap(v + 3, u + 1);
        }
    }
}

/// Sums `x` into an `i64` so overflow can be reported
pub fn wide_sum(x: &[idx_t]) -> i64 {
    x.iter().map(|&v| v as i64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_roundtrip_offsets() {
        let mut a = vec![2, 0, 3, 1, 0];
        make_csr(4, &mut a);
        assert_eq!(a, [0, 2, 2, 5, 6]);

        // simulate filling: every slot advanced to the next start
        let mut b = vec![2, 2, 5, 6, 6];
        shift_csr(4, &mut b);
        assert_eq!(b, [0, 2, 2, 5, 6]);
    }

    #[test]
    fn argmax_first_wins() {
        assert_eq!(iargmax(&[3, 9, 9, 1]), 1);
        assert_eq!(iargmin(&[3, 1, 9, 1]), 1);
        assert_eq!(iargmax(&[0.5f32, 0.25]), 0);
    }

    #[test]
    fn permute_is_permutation() {
        let mut rng = fastrand::Rng::with_seed(7);
        for n in [0, 1, 5, 9, 10, 37] {
            let mut p = vec![0; n];
            rand_array_permute(&mut rng, &mut p, n / 2, true);
            let mut sorted = p.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn try_vec_fills() {
        let v = try_vec(4, 7i32, "test").unwrap();
        assert_eq!(v, [7, 7, 7, 7]);
        let w: Vec<u8> = try_with_capacity(16, "test").unwrap();
        assert!(w.capacity() >= 16 && w.is_empty());
    }
}
