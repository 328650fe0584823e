/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * bucketsort.c
 *
 * This file contains code that implement a variety of counting sorting
 * algorithms
 *
 * Started 7/25/97
 * George
 */

use crate::util;

/// Counting sort of the vertices of `tperm` by increasing `keys`.
///
/// `keys[v]` is in `0..=max`. Vertices with equal keys keep their relative order in
/// `tperm`, so a random `tperm` yields a random order within each bucket. The sorted
/// permutation is written to `perm`. This is the visiting order used during matching.
pub fn bucket_sort_keys_inc(max: usize, keys: &[usize], tperm: &[usize], perm: &mut [usize]) {
    debug_assert_eq!(keys.len(), tperm.len());
    debug_assert_eq!(perm.len(), tperm.len());

    let mut counts = vec![0usize; max + 2];

    for &k in keys {
        counts[k] += 1;
    }

    util::make_csr(max + 1, &mut counts);

    for &i in tperm {
        let cnt = &mut counts[keys[i]];
        perm[*cnt] = i;
        *cnt += 1;
    }
}
