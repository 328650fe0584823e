/*
\file
\brief This file contains the option record and the per-call run parameters (ctrl).

\date   Started 5/12/2011
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use std::ops::BitOr;

use crate::defs::*;
use crate::error::{ensure_input, Result};
use crate::timing::Timers;
use crate::{idx_t, real_t};

/// Partitioning scheme used when the operation does not imply one (mesh partitioning)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ptype {
    /// multilevel recursive bisection
    Rb,
    /// multilevel k-way
    #[default]
    Kway,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Objtype {
    /// minimize the weight of the edges crossing parts
    #[default]
    Cut,
    /// minimize the total communication volume
    Vol,
    /// minimize the separator (orderings only)
    Node,
}

/// Coarsening scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ctype {
    /// random matching
    Rm,
    /// sorted heavy-edge matching
    #[default]
    Shem,
}

/// Initial partitioning scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Iptype {
    /// greedy region growing from a random seed
    Grow,
    /// random assignment
    Random,
    /// region growing from a random edge; for separators, edge bisection followed by a vertex cover
    Edge,
    /// node based region growing (separators)
    Node,
    /// k-way only: recursive bisection of the coarsest graph
    MetisRb,
}

/// Refinement scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rtype {
    /// Fiduccia-Mattheyses with hill climbing and rollback
    Fm,
    /// positive gain moves only
    Greedy,
    /// two-sided separator refinement
    Sep2Sided,
    /// one-sided separator refinement
    Sep1Sided,
}

/// Debug/instrumentation flags, bit-compatible with the METIS `dbglvl` option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DbgLvl(u32);

impl DbgLvl {
    pub const NONE: DbgLvl = DbgLvl(0);
    /// Shows various diagnostic messages
    pub const INFO: DbgLvl = DbgLvl(1);
    /// Perform timing analysis
    pub const TIME: DbgLvl = DbgLvl(2);
    /// Show the coarsening progress
    pub const COARSEN: DbgLvl = DbgLvl(4);
    /// Show the refinement progress
    pub const REFINE: DbgLvl = DbgLvl(8);
    /// Show info on initial partitioning
    pub const IPART: DbgLvl = DbgLvl(16);
    /// Show info on vertex moves during refinement
    pub const MOVEINFO: DbgLvl = DbgLvl(32);
    /// Show info on vertex moves during sep refinement
    pub const SEPINFO: DbgLvl = DbgLvl(64);

    pub const fn from_bits(bits: u32) -> Self {
        DbgLvl(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: DbgLvl) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// The flags of `self` that are not in `other`
    pub const fn without(self, other: DbgLvl) -> DbgLvl {
        DbgLvl(self.0 & !other.0)
    }
}

impl BitOr for DbgLvl {
    type Output = DbgLvl;

    fn bitor(self, rhs: Self) -> Self::Output {
        DbgLvl(self.0 | rhs.0)
    }
}

/// Options recognized by the partitioning and ordering routines.
///
/// Every field has a default; `None` means "pick the default for the operation".
#[derive(Clone, Debug)]
pub struct Options {
    pub ptype: Ptype,
    pub objtype: Objtype,
    pub ctype: Ctype,
    pub iptype: Option<Iptype>,
    pub rtype: Option<Rtype>,
    /// refinement passes per level
    pub niter: usize,
    /// independent partitionings computed, the best is returned
    pub ncuts: usize,
    /// separators computed at each bisection of an ordering
    pub nseps: usize,
    /// initial partitions tried on the coarsest graph
    pub niparts: Option<usize>,
    pub seed: Option<u64>,
    /// allowed imbalance as a fraction, e.g. `0.10` for 10%
    pub ufactor: Option<real_t>,
    /// per-constraint imbalance factors, e.g. `1.05`; overrides `ufactor`
    pub ubvec: Option<Vec<real_t>>,
    /// target weight fraction of each part, `nparts * ncon` entries
    pub tpwgts: Option<Vec<real_t>>,
    pub no2hop: bool,
    /// merge vertices with identical adjacency before ordering
    pub compress: bool,
    /// order connected components separately
    pub ccorder: bool,
    /// remove vertices of degree above `pfactor * avgdegree` before ordering
    pub pfactor: real_t,
    pub dbglvl: DbgLvl,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ptype: Ptype::default(),
            objtype: Objtype::default(),
            ctype: Ctype::default(),
            iptype: None,
            rtype: None,
            niter: DEFAULT_NITER,
            ncuts: 1,
            nseps: 1,
            niparts: None,
            seed: None,
            ufactor: None,
            ubvec: None,
            tpwgts: None,
            no2hop: false,
            compress: true,
            ccorder: false,
            pfactor: 0.0,
            dbglvl: DbgLvl::NONE,
        }
    }
}

/// Operation being set up, selects the defaults
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Optype {
    Pmetis,
    Kmetis,
    Ometis,
}

/// Resolved run parameters for one call.
pub(crate) struct Ctrl {
    pub optype: Optype,
    pub objtype: Objtype,
    pub ctype: Ctype,
    pub iptype: Iptype,
    pub rtype: Rtype,
    pub dbglvl: DbgLvl,

    pub niter: usize,
    pub ncuts: usize,
    pub nseps: usize,
    pub niparts: Option<usize>,
    pub no2hop: bool,
    pub compress: bool,
    pub ccorder: bool,
    pub pfactor: real_t,

    pub ncon: usize,
    pub nparts: usize,

    /// coarsening stops once a level has at most this many vertices
    pub coarsen_to: usize,
    /// maximum coarse vertex weight, per constraint
    pub maxvwgt: Vec<idx_t>,

    /// target fractions, `nparts * ncon`
    pub tpwgts: Vec<real_t>,
    /// allowed imbalance factors, per constraint
    pub ubfactors: Vec<real_t>,
    /// `1 / (tpwgts * tvwgt)`, filled in once the graph is known
    pub pijbm: Vec<real_t>,

    pub rng: fastrand::Rng,
    pub timers: Timers,
}

impl Ctrl {
    /// Resolves `options` for an operation of type `optype`, validating every field.
    pub fn new(optype: Optype, options: &Options, ncon: usize, nparts: usize) -> Result<Ctrl> {
        ensure_input!(nparts >= 1, "nparts must be at least 1, got {nparts}");
        ensure_input!(ncon >= 1, "ncon must be at least 1");
        ensure_input!(
            ncon == 1,
            "multi-constraint graphs (ncon = {ncon}) are not supported"
        );
        ensure_input!(options.niter >= 1, "niter must be at least 1");
        ensure_input!(options.ncuts >= 1, "ncuts must be at least 1");
        ensure_input!(options.nseps >= 1, "nseps must be at least 1");
        ensure_input!(
            options.niparts.map_or(true, |n| n >= 1),
            "niparts must be at least 1"
        );
        ensure_input!(options.pfactor >= 0.0, "pfactor must not be negative");

        let objtype = match optype {
            Optype::Ometis => Objtype::Node,
            _ => {
                ensure_input!(
                    options.objtype != Objtype::Node,
                    "the node objective only applies to orderings"
                );
                options.objtype
            }
        };

        let iptype = match (optype, options.iptype) {
            (Optype::Ometis, None) => Iptype::Edge,
            (Optype::Ometis, Some(ip @ (Iptype::Edge | Iptype::Node))) => ip,
            (Optype::Ometis, Some(ip)) => {
                return Err(crate::Error::input(format!(
                    "initial partitioning {ip:?} does not apply to orderings"
                )))
            }
            (Optype::Pmetis, Some(Iptype::MetisRb)) => {
                return Err(crate::Error::input(
                    "MetisRb initial partitioning only applies to k-way partitioning",
                ))
            }
            (_, None) => Iptype::Grow,
            (_, Some(ip)) => ip,
        };

        let rtype = match (optype, options.rtype) {
            (Optype::Pmetis, None) => Rtype::Fm,
            (Optype::Kmetis, None) => Rtype::Greedy,
            (Optype::Ometis, None) => Rtype::Sep2Sided,
            (Optype::Ometis, Some(rt @ (Rtype::Sep1Sided | Rtype::Sep2Sided))) => rt,
            (Optype::Pmetis | Optype::Kmetis, Some(rt @ (Rtype::Fm | Rtype::Greedy))) => rt,
            (_, Some(rt)) => {
                return Err(crate::Error::input(format!(
                    "refinement {rt:?} does not apply to this operation"
                )))
            }
        };

        let ubfactors = match &options.ubvec {
            Some(ubvec) => {
                ensure_input!(
                    ubvec.len() == ncon,
                    "ubvec has {} entries, expected {ncon}",
                    ubvec.len()
                );
                ensure_input!(
                    ubvec.iter().all(|&ub| ub.is_finite() && ub >= 1.0),
                    "ubvec entries must be at least 1.0"
                );
                ubvec.clone()
            }
            None => {
                let ufactor = match options.ufactor {
                    Some(uf) => {
                        ensure_input!(uf.is_finite() && uf >= 0.0, "ufactor must not be negative");
                        uf
                    }
                    None if optype == Optype::Ometis => OMETIS_DEFAULT_UFACTOR,
                    None if nparts >= LARGE_NPARTS => LARGE_NPARTS_UFACTOR,
                    None => DEFAULT_UFACTOR,
                };
                vec![1.0 + ufactor; ncon]
            }
        };

        let tpwgts = match &options.tpwgts {
            Some(tpwgts) => {
                ensure_input!(
                    tpwgts.len() == nparts * ncon,
                    "tpwgts has {} entries, expected {}",
                    tpwgts.len(),
                    nparts * ncon
                );
                for j in 0..ncon {
                    let mut sum = 0.0;
                    for i in 0..nparts {
                        let t = tpwgts[i * ncon + j];
                        ensure_input!(t.is_finite() && t >= 0.0, "tpwgts entries must be >= 0");
                        sum += t;
                    }
                    ensure_input!(
                        (sum - 1.0).abs() <= 1e-3,
                        "tpwgts for constraint {j} sum to {sum}, expected 1.0"
                    );
                }
                tpwgts.clone()
            }
            None => vec![1.0 / nparts as real_t; nparts * ncon],
        };

        let seed = options.seed.unwrap_or(DEFAULT_SEED);

        Ok(Ctrl {
            optype,
            objtype,
            ctype: options.ctype,
            iptype,
            rtype,
            dbglvl: options.dbglvl,
            niter: options.niter,
            ncuts: options.ncuts,
            nseps: options.nseps,
            niparts: options.niparts,
            no2hop: options.no2hop,
            compress: options.compress,
            ccorder: options.ccorder,
            pfactor: options.pfactor,
            ncon,
            nparts,
            coarsen_to: 20,
            maxvwgt: vec![0; ncon],
            tpwgts,
            ubfactors,
            pijbm: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
            timers: Timers::default(),
        })
    }

    /// Computes the balance multipliers `pijbm = 1 / (tpwgts * tvwgt)` for `tvwgt`.
    pub fn setup_kway_balance_multipliers(&mut self, tvwgt: &[idx_t]) {
        let ncon = self.ncon;
        self.pijbm = (0..self.nparts * ncon)
            .map(|k| {
                let t = self.tpwgts[k] * tvwgt[k % ncon].max(1) as real_t;
                if t > 0.0 {
                    1.0 / t
                } else {
                    // an empty target can never be exceeded by zero weight
                    1.0 / real_t::EPSILON
                }
            })
            .collect();
    }

    pub fn log_options(&self) {
        log::info!(
            "{:?}: nparts={} ncon={} objtype={:?} ctype={:?} iptype={:?} rtype={:?} niter={} ncuts={} nseps={} ubfactors={:?}",
            self.optype,
            self.nparts,
            self.ncon,
            self.objtype,
            self.ctype,
            self.iptype,
            self.rtype,
            self.niter,
            self.ncuts,
            self.nseps,
            self.ubfactors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_operation() {
        let opts = Options::default();
        let ctrl = Ctrl::new(Optype::Kmetis, &opts, 1, 4).unwrap();
        assert_eq!(ctrl.rtype, Rtype::Greedy);
        assert_eq!(ctrl.iptype, Iptype::Grow);
        assert!((ctrl.ubfactors[0] - 1.10).abs() < 1e-6);

        let ctrl = Ctrl::new(Optype::Pmetis, &opts, 1, 32).unwrap();
        assert_eq!(ctrl.rtype, Rtype::Fm);
        assert!((ctrl.ubfactors[0] - 1.20).abs() < 1e-6);

        let ctrl = Ctrl::new(Optype::Ometis, &opts, 1, 3).unwrap();
        assert_eq!(ctrl.objtype, Objtype::Node);
        assert_eq!(ctrl.rtype, Rtype::Sep2Sided);
        assert_eq!(ctrl.iptype, Iptype::Edge);
    }

    #[test]
    fn rejects_bad_values() {
        let opts = Options::default();
        assert!(Ctrl::new(Optype::Kmetis, &opts, 1, 0).is_err());

        let opts = Options {
            tpwgts: Some(vec![0.5, 0.6]),
            ..Options::default()
        };
        assert!(Ctrl::new(Optype::Pmetis, &opts, 1, 2).is_err());

        let opts = Options {
            ubvec: Some(vec![0.9]),
            ..Options::default()
        };
        assert!(Ctrl::new(Optype::Pmetis, &opts, 1, 2).is_err());

        let opts = Options {
            rtype: Some(Rtype::Sep1Sided),
            ..Options::default()
        };
        assert!(Ctrl::new(Optype::Kmetis, &opts, 1, 2).is_err());

        let opts = Options {
            objtype: Objtype::Node,
            ..Options::default()
        };
        assert!(Ctrl::new(Optype::Kmetis, &opts, 1, 2).is_err());
    }

    #[test]
    fn dbglvl_flags() {
        let lvl = DbgLvl::COARSEN | DbgLvl::REFINE;
        assert!(lvl.contains(DbgLvl::COARSEN));
        assert!(!lvl.contains(DbgLvl::IPART));
        assert!(!lvl.contains(DbgLvl::NONE));
        assert_eq!(DbgLvl::from_bits(lvl.bits()), lvl);
        assert_eq!(lvl.without(DbgLvl::REFINE), DbgLvl::COARSEN);
    }
}
