/*
\file
\brief Functions for the edge-based FM refinement

\date Started 7/23/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use crate::error::Result;
use crate::graph::WorkGraph;
use crate::options::{Ctrl, DbgLvl, Rtype};
use crate::pqueue::PQueue;
use crate::refine::{max_weighted_degree, move_2way, BndEvent};
use crate::util::{self, try_vec};
use crate::{idx_t, ifset, real_t};

/*************************************************************************/
/* This function performs a cut-focused FM refinement of a bisection.
   Each pass moves vertices one at a time from the side that is further
   above its target, keeping the best prefix of moves. With the greedy
   refinement a pass stops at the first move that would increase the cut.
*/
/*************************************************************************/
pub(crate) fn fm_2way_refine(
    ctrl: &mut Ctrl,
    graph: &mut WorkGraph,
    ntpwgts: &[real_t],
    niter: usize,
) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let greedy = ctrl.rtype == Rtype::Greedy;

    let mut moved = try_vec(nvtxs, false, "FM_2WayCutRefine: moved")?;
    let mut swaps: Vec<usize> = util::try_with_capacity(nvtxs, "FM_2WayCutRefine: swaps")?;

    let tvwgt = graph.tvwgt[0];
    let tpwgt0 = (tvwgt as real_t * ntpwgts[0]) as idx_t;
    let tpwgts = [tpwgt0, tvwgt - tpwgt0];

    let limit = (0.01 * nvtxs as f64).clamp(15.0, 100.0) as usize;
    let ptotal = graph.pwgts[0] + graph.pwgts[1];
    let avgvwgt = (ptotal / 20).min(2 * ptotal / nvtxs.max(1) as idx_t);

    let maxgain = max_weighted_degree(graph);
    let mut queues = [PQueue::new(nvtxs, maxgain), PQueue::new(nvtxs, maxgain)];

    ifset!(ctrl.dbglvl, DbgLvl::REFINE, print_2way_refine_stats(graph, &tpwgts, None));

    let origdiff = (tpwgts[0] - graph.pwgts[0]).abs();
    for _pass in 0..niter {
        /* Do a number of passes */
        queues[0].reset();
        queues[1].reset();
        swaps.clear();

        let mut mincutorder: Option<usize> = None;
        let initcut = graph.mincut;
        let mut newcut = initcut;
        let mut mincut = initcut;
        let mut mindiff = (tpwgts[0] - graph.pwgts[0]).abs();

        debug_assert_eq!(crate::debug::compute_cut(graph, &graph.where_), graph.mincut);
        debug_assert!(crate::debug::check_bnd(graph));

        /* Insert boundary nodes in the priority queues */
        let nbnd = graph.bnd.len();
        let mut perm = vec![0; nbnd];
        util::rand_array_permute(&mut ctrl.rng, &mut perm, nbnd, true);
        for &ii in &perm {
            let i = graph.bnd.as_slice()[ii];
            queues[graph.where_[i]].insert(i, graph.ed[i] - graph.id[i]);
        }

        while swaps.len() < nvtxs {
            let from = if tpwgts[0] - graph.pwgts[0] < tpwgts[1] - graph.pwgts[1] {
                0
            } else {
                1
            };
            let to = from ^ 1;

            let Some(higain) = queues[from].pop() else {
                break;
            };
            debug_assert!(graph.bnd.contains(higain));

            let gain = graph.ed[higain] - graph.id[higain];
            if greedy && gain < 0 {
                break;
            }

            newcut -= gain;
            let w = graph.vwgt[higain];
            let newp0 = if to == 0 {
                graph.pwgts[0] + w
            } else {
                graph.pwgts[0] - w
            };
            let newdiff = (tpwgts[0] - newp0).abs();

            let nswaps = swaps.len();
            if (newcut < mincut && newdiff <= origdiff + avgvwgt)
                || (newcut == mincut && newdiff < mindiff)
            {
                mincut = newcut;
                mindiff = newdiff;
                mincutorder = Some(nswaps);
            } else if nswaps - mincutorder.map_or(0, |o| o + 1) >= limit {
                /* We hit the limit, the move is not made */
                break;
            }

            moved[higain] = true;
            swaps.push(higain);

            ifset!(
                ctrl.dbglvl,
                DbgLvl::MOVEINFO,
                log::debug!(
                    "Moved {:6} from {}. [{:3} {:3}] {:5} [{:4} {:4}]",
                    higain,
                    from,
                    gain,
                    w,
                    newcut,
                    newp0,
                    tvwgt - newp0
                )
            );

            /**************************************************************
             * Update the id[i]/ed[i] values of the affected nodes
             ***************************************************************/
            move_2way(graph, higain, |nbr| {
                if moved[nbr.k] {
                    return;
                }
                let q = &mut queues[nbr.part];
                match nbr.event {
                    BndEvent::Left => q.delete(nbr.k),
                    BndEvent::Stayed => q.update(nbr.k, nbr.gain),
                    BndEvent::Joined => q.insert(nbr.k, nbr.gain),
                }
            });
        }

        /****************************************************************
         * Roll back computations
         *****************************************************************/
        for &v in &swaps {
            moved[v] = false;
        }
        let keep = mincutorder.map_or(0, |o| o + 1);
        for &higain in swaps[keep..].iter().rev() {
            move_2way(graph, higain, |_| {});
        }

        graph.mincut = mincut;

        ifset!(ctrl.dbglvl, DbgLvl::REFINE, print_2way_refine_stats(graph, &tpwgts, mincutorder));

        if mincutorder.map_or(true, |o| o == 0) || mincut == initcut {
            break;
        }
    }

    Ok(())
}

/*************************************************************************/
/* Prints statistics about the refinement */
/*************************************************************************/
fn print_2way_refine_stats(graph: &WorkGraph, tpwgts: &[idx_t; 2], mincutorder: Option<usize>) {
    match mincutorder {
        None => log::debug!(
            "Parts: Nv-Nb[{:6} {:6}] ICut: {:6} [{:5} {:5}] T:[{:5} {:5}]",
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut,
            graph.pwgts[0],
            graph.pwgts[1],
            tpwgts[0],
            tpwgts[1]
        ),
        Some(order) => log::debug!(
            "\tMincut: {:6} at {:5} NBND {:6} NPwgts: [{:5} {:5}]",
            graph.mincut,
            order,
            graph.bnd.len(),
            graph.pwgts[0],
            graph.pwgts[1]
        ),
    }
}
