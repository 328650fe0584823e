//! Constant definitions, corresponds to defs.h

/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * defs.h
 *
 * This file contains constant definitions
 *
 * Started 8/27/94
 * George
 */

use crate::real_t;

/// Number of random initial partitions tried on graphs with a small coarsest level
pub const SMALLNIPARTS: usize = 5;
/// Number of random initial partitions tried otherwise
pub const LARGENIPARTS: usize = 7;

/// Node reduction between successive coarsening levels
pub const COARSEN_FRACTION: real_t = 0.85;

/// The fraction of unmatched vertices that triggers 2-hop matching
pub const UNMATCHEDFOR2HOP: real_t = 0.10;

/// Size of the hash table used when contracting large adjacency lists
pub const HTLENGTH: usize = (1 << 13) - 1;

/// Switch to minimum degree ordering below this many vertices
pub const MMDSWITCH: usize = 120;

/// Fraction of vertices a compressed graph must retain to be worth using
pub const COMPRESSION_FRACTION: real_t = 0.85;

/// Default imbalance tolerances
pub const DEFAULT_UFACTOR: real_t = 0.10;
pub const LARGE_NPARTS_UFACTOR: real_t = 0.20;
pub const OMETIS_DEFAULT_UFACTOR: real_t = 0.20;
/// Parts at or above this count use [`LARGE_NPARTS_UFACTOR`]
pub const LARGE_NPARTS: usize = 16;

pub const DEFAULT_SEED: u64 = 4321;
pub const DEFAULT_NITER: usize = 10;

/// METIS release whose formats and defaults are followed
pub const METIS_VER_MAJOR: u32 = 5;
pub const METIS_VER_MINOR: u32 = 1;
pub const METIS_VER_SUBMINOR: u32 = 0;
