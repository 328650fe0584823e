/*
\file
\brief This file contains code for the node-based FM refinement of vertex separators

\date   Started 8/1/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use crate::error::Result;
use crate::graph::WorkGraph;
use crate::options::{Ctrl, DbgLvl};
use crate::pqueue::PQueue;
use crate::util::{self, try_vec, try_with_capacity};
use crate::{idx_t, ifset, real_t};

/// Per-pass state of a vertex in the two-sided refinement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mv {
    /// not touched in this pass; separator vertices are in both queues
    Untouched,
    /// pulled into the separator by a move to `side`, queued for that side only
    Pulled(usize),
    /// moved out of the separator
    Moved,
}

/// Bound on the gain `vwgt[i] - edegrees[side]` of any vertex
fn max_node_gain(graph: &WorkGraph) -> idx_t {
    (0..graph.nvtxs)
        .map(|i| graph.vwgt[i] + graph.adj(i).map(|j| graph.vwgt[graph.adjncy[j]]).sum::<idx_t>())
        .max()
        .unwrap_or(0)
}

/// Undo log of a pass: the moved vertices and, per move, the vertices it
/// pulled into the separator
struct MoveLog {
    swaps: Vec<usize>,
    mptr: Vec<usize>,
    mind: Vec<usize>,
}

impl MoveLog {
    fn new(nvtxs: usize) -> Result<MoveLog> {
        let mut mptr = try_with_capacity(nvtxs + 1, "FM_2WayNodeRefine: mptr")?;
        mptr.push(0);
        Ok(MoveLog {
            swaps: try_with_capacity(nvtxs, "FM_2WayNodeRefine: swaps")?,
            mptr,
            mind: try_with_capacity(nvtxs, "FM_2WayNodeRefine: mind")?,
        })
    }

    fn clear(&mut self) {
        self.swaps.clear();
        self.mptr.truncate(1);
        self.mind.clear();
    }

    /// Rolls back every move after the first `keep`
    fn rollback(&mut self, graph: &mut WorkGraph, keep: usize) {
        for nswaps in (keep..self.swaps.len()).rev() {
            let higain = self.swaps[nswaps];
            let to = graph.where_[higain];
            let other = to ^ 1;
            let hw = graph.vwgt[higain];

            graph.pwgts[2] += hw;
            graph.pwgts[to] -= hw;
            graph.where_[higain] = 2;
            graph.bnd.insert(higain);

            let mut edegrees = [0, 0];
            for j in graph.adj(higain) {
                let k = graph.adjncy[j];
                if graph.where_[k] == 2 {
                    graph.nrinfo[k][to] -= hw;
                } else {
                    edegrees[graph.where_[k]] += graph.vwgt[k];
                }
            }
            graph.nrinfo[higain] = edegrees;

            /* Push nodes out of the separator */
            for &k in &self.mind[self.mptr[nswaps]..self.mptr[nswaps + 1]] {
                debug_assert_eq!(graph.where_[k], 2);
                graph.where_[k] = other;
                graph.pwgts[other] += graph.vwgt[k];
                graph.pwgts[2] -= graph.vwgt[k];
                graph.bnd.delete(k);
                for jj in graph.adj(k) {
                    let kk = graph.adjncy[jj];
                    if graph.where_[kk] == 2 {
                        graph.nrinfo[kk][other] += graph.vwgt[k];
                    }
                }
            }
        }
        self.swaps.truncate(keep);
        self.mptr.truncate(keep + 1);
    }
}

/// Degree updates caused by moving a vertex out of the separator
#[derive(Clone, Copy, Debug)]
enum SepEvent {
    /// separator neighbor `k` of the moved vertex, `gain` towards the side opposite to `to`
    Neighbor { k: usize, gain: idx_t },
    /// separator vertex `k` next to a pulled vertex, `gain` towards `to`
    NextToPulled { k: usize, gain: idx_t },
    /// `k` was pulled into the separator, `gain` towards `to`
    Pulled { k: usize, gain: idx_t },
}

/// Moves separator vertex `higain` to side `to`, pulling its neighbors on the
/// other side into the separator.
fn move_to_side(graph: &mut WorkGraph, higain: usize, to: usize, mut on_event: impl FnMut(SepEvent)) {
    let other = to ^ 1;
    let hw = graph.vwgt[higain];

    graph.pwgts[2] -= hw - graph.nrinfo[higain][other];
    graph.bnd.delete(higain);
    graph.pwgts[to] += hw;
    graph.where_[higain] = to;

    /**********************************************************
     * Update the degrees of the affected nodes
     ***********************************************************/
    for j in graph.adj(higain) {
        let k = graph.adjncy[j];
        if graph.where_[k] == 2 {
            /* For the in-separator vertices modify their edegree[to] */
            graph.nrinfo[k][to] += hw;
            on_event(SepEvent::Neighbor {
                k,
                gain: graph.vwgt[k] - graph.nrinfo[k][to],
            });
        } else if graph.where_[k] == other {
            /* This vertex is pulled into the separator */
            debug_assert!(!graph.bnd.contains(k));
            graph.bnd.insert(k);
            graph.where_[k] = 2;
            graph.pwgts[other] -= graph.vwgt[k];

            let mut edegrees = [0, 0];
            for jj in graph.adj(k) {
                let kk = graph.adjncy[jj];
                if graph.where_[kk] != 2 {
                    edegrees[graph.where_[kk]] += graph.vwgt[kk];
                } else {
                    graph.nrinfo[kk][other] -= graph.vwgt[k];
                    on_event(SepEvent::NextToPulled {
                        k: kk,
                        gain: graph.vwgt[kk] - graph.nrinfo[kk][other],
                    });
                }
            }
            graph.nrinfo[k] = edegrees;
            on_event(SepEvent::Pulled {
                k,
                gain: graph.vwgt[k] - edegrees[other],
            });
        }
    }
}

/// The separator vertices in a random order
fn shuffled_separator(ctrl: &mut Ctrl, graph: &WorkGraph) -> Vec<usize> {
    let nbnd = graph.bnd.len();
    let mut perm = vec![0; nbnd];
    util::rand_array_permute(&mut ctrl.rng, &mut perm, nbnd, true);
    perm.iter().map(|&ii| graph.bnd.as_slice()[ii]).collect()
}

/*************************************************************************/
/* This function performs a node-based FM refinement. Vertices leave the
   separator towards either side, the side with the better gain first.
*/
/**************************************************************************/
pub(crate) fn fm_2way_node_refine_2sided(ctrl: &mut Ctrl, graph: &mut WorkGraph, niter: usize) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let maxgain = max_node_gain(graph);
    let mut queues = [PQueue::new(nvtxs, maxgain), PQueue::new(nvtxs, maxgain)];
    let mut moved = try_vec(nvtxs, Mv::Untouched, "FM_2WayNodeRefine2Sided: moved")?;
    let mut log = MoveLog::new(nvtxs)?;

    let mult = 0.5 * ctrl.ubfactors[0];
    let badmaxpwgt = (mult * (graph.pwgts[0] + graph.pwgts[1] + graph.pwgts[2]) as real_t) as idx_t;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Partitions-N2: [{:6} {:6}] Nv-Nb[{:6} {:6}]. ISep: {:6}",
            graph.pwgts[0],
            graph.pwgts[1],
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    for pass in 0..niter {
        moved.fill(Mv::Untouched);
        queues[0].reset();
        queues[1].reset();
        log.clear();

        let mut mincutorder: Option<usize> = None;
        let initcut = graph.mincut;
        let mut mincut = graph.mincut;

        for i in shuffled_separator(ctrl, graph) {
            debug_assert_eq!(graph.where_[i], 2);
            queues[0].insert(i, graph.vwgt[i] - graph.nrinfo[i][1]);
            queues[1].insert(i, graph.vwgt[i] - graph.nrinfo[i][0]);
        }

        debug_assert!(crate::debug::check_node_partition_params(graph));

        let nbnd = graph.bnd.len();
        let limit = if ctrl.compress {
            (5 * nbnd).min(400)
        } else {
            (2 * nbnd).min(300)
        };

        /******************************************************
         * Get into the FM loop
         *******************************************************/
        let mut mindiff = (graph.pwgts[0] - graph.pwgts[1]).abs();
        while log.swaps.len() < nvtxs {
            let u = [queues[0].peek(), queues[1].peek()];
            let to = match u {
                [Some(u0), Some(u1)] => {
                    let g0 = graph.vwgt[u0] - graph.nrinfo[u0][1];
                    let g1 = graph.vwgt[u1] - graph.nrinfo[u1][0];
                    let mut to = match g0.cmp(&g1) {
                        std::cmp::Ordering::Greater => 0,
                        std::cmp::Ordering::Less => 1,
                        std::cmp::Ordering::Equal => pass % 2,
                    };
                    let ut = if to == 0 { u0 } else { u1 };
                    if graph.pwgts[to] + graph.vwgt[ut] > badmaxpwgt {
                        to ^= 1;
                    }
                    to
                }
                [None, None] => break,
                [Some(u0), _] if graph.pwgts[0] + graph.vwgt[u0] <= badmaxpwgt => 0,
                [_, Some(u1)] if graph.pwgts[1] + graph.vwgt[u1] <= badmaxpwgt => 1,
                _ => break,
            };
            let other = to ^ 1;

            let Some(higain) = queues[to].pop() else {
                break;
            };
            if moved[higain] == Mv::Untouched {
                /* Delete if it was in the separator originally */
                queues[other].delete(higain);
            }
            debug_assert!(graph.bnd.contains(higain));

            let nswaps = log.swaps.len();
            let newsep = graph.pwgts[2] - (graph.vwgt[higain] - graph.nrinfo[higain][other]);
            let newdiff = (graph.pwgts[to] + graph.vwgt[higain]
                - (graph.pwgts[other] - graph.nrinfo[higain][other]))
                .abs();
            if newsep < mincut || (newsep == mincut && newdiff < mindiff) {
                mincut = newsep;
                mincutorder = Some(nswaps);
                mindiff = newdiff;
            } else {
                let since = nswaps - mincutorder.map_or(0, |o| o + 1);
                if since >= 2 * limit || (since >= limit && newsep as real_t > 1.10 * mincut as real_t) {
                    /* No further improvement, break out */
                    break;
                }
            }

            moved[higain] = Mv::Moved;
            log.swaps.push(higain);

            move_to_side(graph, higain, to, |ev| match ev {
                SepEvent::Neighbor { k, gain } => {
                    if moved[k] == Mv::Untouched || moved[k] == Mv::Pulled(other) {
                        queues[other].update(k, gain);
                    }
                }
                SepEvent::NextToPulled { k, gain } => {
                    if moved[k] == Mv::Untouched || moved[k] == Mv::Pulled(to) {
                        queues[to].update(k, gain);
                    }
                }
                SepEvent::Pulled { k, gain } => {
                    /* Keep track for rollback */
                    log.mind.push(k);
                    /* Insert the new vertex into the priority queue. Only one side! */
                    if moved[k] == Mv::Untouched {
                        queues[to].insert(k, gain);
                        moved[k] = Mv::Pulled(to);
                    }
                }
            });
            log.mptr.push(log.mind.len());

            ifset!(
                ctrl.dbglvl,
                DbgLvl::MOVEINFO,
                log::debug!(
                    "Moved {:6} to {:3}, [{:5} {:5} {:5}]",
                    higain,
                    to,
                    graph.pwgts[0],
                    graph.pwgts[1],
                    graph.pwgts[2]
                )
            );
        }

        /****************************************************************
         * Roll back computation
         *****************************************************************/
        log.rollback(graph, mincutorder.map_or(0, |o| o + 1));
        debug_assert_eq!(mincut, graph.pwgts[2]);

        ifset!(
            ctrl.dbglvl,
            DbgLvl::REFINE,
            log::debug!(
                "\tMinimum sep: {:6} at {:5?}, PWGTS: [{:6} {:6}], NBND: {:6}",
                mincut,
                mincutorder,
                graph.pwgts[0],
                graph.pwgts[1],
                graph.bnd.len()
            )
        );

        graph.mincut = mincut;

        if mincutorder.is_none() || mincut >= initcut {
            break;
        }
    }

    Ok(())
}

/*************************************************************************/
/* This function performs a node-based FM refinement.
    Each refinement iteration is split into two sub-iterations.
    In each sub-iteration only moves to one of the left/right partitions
    is allowed; hence, it is one-sided.
*/
/**************************************************************************/
pub(crate) fn fm_2way_node_refine_1sided(ctrl: &mut Ctrl, graph: &mut WorkGraph, niter: usize) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let mut queue = PQueue::new(nvtxs, max_node_gain(graph));
    let mut log = MoveLog::new(nvtxs)?;

    let mult = 0.5 * ctrl.ubfactors[0];
    let badmaxpwgt = (mult * (graph.pwgts[0] + graph.pwgts[1] + graph.pwgts[2]) as real_t) as idx_t;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Partitions-N1: [{:6} {:6}] Nv-Nb[{:6} {:6}]. ISep: {:6}",
            graph.pwgts[0],
            graph.pwgts[1],
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    let mut to = if graph.pwgts[0] < graph.pwgts[1] { 1 } else { 0 };
    /* the 2*niter is for the two sides */
    for pass in 0..2 * niter {
        let other = to;
        to ^= 1;

        queue.reset();
        log.clear();

        let mut mincutorder: Option<usize> = None;
        let initcut = graph.mincut;
        let mut mincut = graph.mincut;

        for i in shuffled_separator(ctrl, graph) {
            debug_assert_eq!(graph.where_[i], 2);
            queue.insert(i, graph.vwgt[i] - graph.nrinfo[i][other]);
        }

        debug_assert!(crate::debug::check_node_partition_params(graph));

        let nbnd = graph.bnd.len();
        let limit = if ctrl.compress {
            (5 * nbnd).min(500)
        } else {
            (3 * nbnd).min(300)
        };

        /******************************************************
         * Get into the FM loop
         *******************************************************/
        let mut mindiff = (graph.pwgts[0] - graph.pwgts[1]).abs();
        while log.swaps.len() < nvtxs {
            let Some(higain) = queue.pop() else {
                break;
            };
            debug_assert!(graph.bnd.contains(higain));

            if graph.pwgts[to] + graph.vwgt[higain] > badmaxpwgt {
                /* No point going any further. Balance will be bad */
                break;
            }

            let nswaps = log.swaps.len();
            let newsep = graph.pwgts[2] - (graph.vwgt[higain] - graph.nrinfo[higain][other]);
            let newdiff = (graph.pwgts[to] + graph.vwgt[higain]
                - (graph.pwgts[other] - graph.nrinfo[higain][other]))
                .abs();
            if newsep < mincut || (newsep == mincut && newdiff < mindiff) {
                mincut = newsep;
                mincutorder = Some(nswaps);
                mindiff = newdiff;
            } else {
                let since = nswaps - mincutorder.map_or(0, |o| o + 1);
                if since >= 3 * limit || (since >= limit && newsep as real_t > 1.10 * mincut as real_t) {
                    /* No further improvement, break out */
                    break;
                }
            }

            log.swaps.push(higain);

            move_to_side(graph, higain, to, |ev| match ev {
                /* moves are one-sided, the gains towards `to` did not change */
                SepEvent::Neighbor { .. } => {}
                SepEvent::NextToPulled { k, gain } => queue.update(k, gain),
                SepEvent::Pulled { k, gain } => {
                    log.mind.push(k);
                    queue.insert(k, gain);
                }
            });
            log.mptr.push(log.mind.len());

            ifset!(
                ctrl.dbglvl,
                DbgLvl::MOVEINFO,
                log::debug!(
                    "Moved {:6} to {:3}, [{:5} {:5} {:5}] [{:3} {:2}]",
                    higain,
                    to,
                    graph.pwgts[0],
                    graph.pwgts[1],
                    graph.pwgts[2],
                    nswaps,
                    limit
                )
            );
        }

        /****************************************************************
         * Roll back computation
         *****************************************************************/
        log.rollback(graph, mincutorder.map_or(0, |o| o + 1));
        debug_assert_eq!(mincut, graph.pwgts[2]);

        ifset!(
            ctrl.dbglvl,
            DbgLvl::REFINE,
            log::debug!(
                "\tMinimum sep: {:6} at {:5?}, PWGTS: [{:6} {:6}], NBND: {:6}",
                mincut,
                mincutorder,
                graph.pwgts[0],
                graph.pwgts[1],
                graph.bnd.len()
            )
        );

        graph.mincut = mincut;

        if pass % 2 == 1 && (mincutorder.is_none() || mincut >= initcut) {
            break;
        }
    }

    Ok(())
}

/*************************************************************************/
/* This function balances the left/right partitions of a separator
tri-section */
/*************************************************************************/
pub(crate) fn fm_2way_node_balance(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let mult = 0.5 * ctrl.ubfactors[0];

    let badmaxpwgt = (mult * (graph.pwgts[0] + graph.pwgts[1]) as real_t) as idx_t;
    if graph.pwgts[0].max(graph.pwgts[1]) < badmaxpwgt {
        return Ok(());
    }
    if (graph.pwgts[0] - graph.pwgts[1]).abs() < 3 * graph.tvwgt[0] / nvtxs.max(1) as idx_t {
        return Ok(());
    }

    let to = if graph.pwgts[0] < graph.pwgts[1] { 0 } else { 1 };
    let other = to ^ 1;

    let mut queue = PQueue::new(nvtxs, max_node_gain(graph));
    let mut moved = try_vec(nvtxs, false, "FM_2WayNodeBalance: moved")?;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Partitions: [{:6} {:6}] Nv-Nb[{:6} {:6}]. ISep: {:6} [B]",
            graph.pwgts[0],
            graph.pwgts[1],
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    for i in shuffled_separator(ctrl, graph) {
        debug_assert_eq!(graph.where_[i], 2);
        queue.insert(i, graph.vwgt[i] - graph.nrinfo[i][other]);
    }

    debug_assert!(crate::debug::check_node_partition_params(graph));

    /******************************************************
     * Get into the FM loop
     *******************************************************/
    let mut nswaps = 0;
    while nswaps < nvtxs {
        let Some(higain) = queue.pop() else {
            break;
        };
        nswaps += 1;
        moved[higain] = true;

        let gain = graph.vwgt[higain] - graph.nrinfo[higain][other];
        let badmaxpwgt = (mult * (graph.pwgts[0] + graph.pwgts[1]) as real_t) as idx_t;

        /* break if other is now underwight */
        if graph.pwgts[to] > graph.pwgts[other] {
            break;
        }

        /* break if balance is achieved and no +ve or zero gain */
        if gain < 0 && graph.pwgts[other] < badmaxpwgt {
            break;
        }

        /* skip this vertex if it will violate balance on the other side */
        if graph.pwgts[to] + graph.vwgt[higain] > badmaxpwgt {
            continue;
        }

        move_to_side(graph, higain, to, |ev| match ev {
            SepEvent::Neighbor { .. } => {}
            SepEvent::NextToPulled { k, gain } => {
                if !moved[k] {
                    queue.update(k, gain);
                }
            }
            /* Insert the new vertex into the priority queue */
            SepEvent::Pulled { k, gain } => queue.insert(k, gain),
        });

        ifset!(
            ctrl.dbglvl,
            DbgLvl::MOVEINFO,
            log::debug!(
                "Moved {:6} to {:3}, Gain: {:3}, \t[{:5} {:5} {:5}]",
                higain,
                to,
                gain,
                graph.pwgts[0],
                graph.pwgts[1],
                graph.pwgts[2]
            )
        );
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "\tBalanced sep: {:6} at {:4}, PWGTS: [{:6} {:6}], NBND: {:6}",
            graph.pwgts[2],
            nswaps,
            graph.pwgts[0],
            graph.pwgts[1],
            graph.bnd.len()
        )
    );

    graph.mincut = graph.pwgts[2];
    Ok(())
}
