/*
 * mcutil.c
 *
 * This file contains various utility functions for measuring the balance
 * of a partitioning
 *
 * Started 2/15/98
 * George
 */

use crate::graph::WorkGraph;
use crate::options::Ctrl;
use crate::{idx_t, real_t};

impl Ctrl {
    /// Multipliers for a bisection with target fractions `ntpwgts` (Setup2WayBalMultipliers)
    pub fn setup_2way_balance_multipliers(&mut self, graph: &WorkGraph, ntpwgts: &[real_t]) {
        let ncon = graph.ncon;
        self.pijbm = (0..2 * ncon)
            .map(|k| {
                let t = ntpwgts[k];
                if t > 0.0 {
                    graph.invtvwgt[k % ncon] / t
                } else {
                    1.0 / real_t::EPSILON
                }
            })
            .collect();
    }
}

/*************************************************************************/
/* Computes the maximum load imbalance of a partitioning solution over
   all the constraints.
*/
/**************************************************************************/
pub fn compute_load_imbalance(pwgts: &[idx_t], nparts: usize, ncon: usize, pijbm: &[real_t]) -> real_t {
    let mut max: real_t = 1.0;
    for i in 0..ncon {
        for j in 0..nparts {
            let cur = pwgts[j * ncon + i] as real_t * pijbm[j * ncon + i];
            if cur > max {
                max = cur;
            }
        }
    }
    max
}

/*************************************************************************/
/* Computes the maximum load imbalance difference of a partitioning
   solution over all the constraints.
   The difference is defined with respect to the allowed maximum
   unbalance for the respective constraint.
*/
/**************************************************************************/
pub fn compute_load_imbalance_diff(
    pwgts: &[idx_t],
    nparts: usize,
    ncon: usize,
    pijbm: &[real_t],
    ubvec: &[real_t],
) -> real_t {
    let mut max: real_t = -1.0;
    for i in 0..ncon {
        for j in 0..nparts {
            let cur = pwgts[j * ncon + i] as real_t * pijbm[j * ncon + i] - ubvec[i];
            if cur > max {
                max = cur;
            }
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imbalance_figures() {
        let pijbm = [0.1, 0.1];
        assert!((compute_load_imbalance(&[4, 6], 2, 1, &pijbm) - 1.0).abs() < 1e-6);
        assert!((compute_load_imbalance(&[3, 18], 2, 1, &pijbm) - 1.8).abs() < 1e-6);
        let diff = compute_load_imbalance_diff(&[4, 6], 2, 1, &[0.2, 0.2], &[1.1]);
        assert!((diff - 0.1).abs() < 1e-6);
    }
}
