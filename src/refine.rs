/*
\file
\brief This file contains the driving routines for multilevel refinement

\date   Started 7/24/1997
\author George
\author Copyright 1997-2009, Regents of the University of Minnesota
*/

use crate::balance::balance_2way;
use crate::error::Result;
use crate::fm::fm_2way_refine;
use crate::graph::{BndList, WorkGraph};
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;
use crate::util::try_vec;
use crate::{idx_t, ifset, real_t};

/*************************************************************************/
/* This function is the entry point of refinement. It refines the coarsest
   level of `levels`, projects the partition one level down and repeats
   until the partition reaches level 0, which is the only level left.
*/
/*************************************************************************/
pub(crate) fn refine_2way(ctrl: &mut Ctrl, levels: &mut Vec<WorkGraph>, tpwgts: &[real_t]) -> Result<()> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Uncoarsen));

    /* Compute the parameters of the coarsest graph */
    if let Some(graph) = levels.last_mut() {
        compute_2way_partition_params(graph);
    }

    while let Some(mut graph) = levels.pop() {
        debug_assert!(crate::debug::check_bnd(&graph));

        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Refine));
        balance_2way(ctrl, &mut graph, tpwgts)?;
        let niter = ctrl.niter;
        fm_2way_refine(ctrl, &mut graph, tpwgts, niter)?;
        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Refine));

        match levels.last_mut() {
            None => {
                levels.push(graph);
                break;
            }
            Some(finer) => {
                ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Project));
                project_2way_partition(finer, &graph)?;
                ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Project));
            }
        }
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Uncoarsen));
    Ok(())
}

/*************************************************************************/
/* This function computes the initial id/ed, the part weights, the
   boundary and the cut of a 2-way partition stored in where_.
*/
/*************************************************************************/
pub(crate) fn compute_2way_partition_params(graph: &mut WorkGraph) {
    let nvtxs = graph.nvtxs;
    let ncon = graph.ncon;

    graph.pwgts.clear();
    graph.pwgts.resize(2 * ncon, 0);
    graph.id.resize(nvtxs, 0);
    graph.ed.resize(nvtxs, 0);
    graph.bnd = BndList::new(nvtxs);

    /* Compute pwgts */
    for i in 0..nvtxs {
        let me = graph.where_[i];
        debug_assert!(me <= 1);
        for c in 0..ncon {
            graph.pwgts[me * ncon + c] += graph.vwgt[i * ncon + c];
        }
    }

    /* Compute the required info for refinement  */
    let mut mincut: idx_t = 0;
    for i in 0..nvtxs {
        let me = graph.where_[i];
        let (mut tid, mut ted) = (0, 0);
        for j in graph.adj(i) {
            if me == graph.where_[graph.adjncy[j]] {
                tid += graph.adjwgt[j];
            } else {
                ted += graph.adjwgt[j];
            }
        }
        graph.id[i] = tid;
        graph.ed[i] = ted;

        if ted > 0 || graph.degree(i) == 0 {
            graph.bnd.insert(i);
            mincut += ted;
        }
    }

    graph.mincut = mincut / 2;
}

/*************************************************************************/
/* Projects the partition of `cgraph` onto `graph` and computes the
   refinement params. Only vertices that came from the coarser boundary
   need their external degree computed.
*/
/*************************************************************************/
pub(crate) fn project_2way_partition(graph: &mut WorkGraph, cgraph: &WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    graph.alloc_2way()?;

    let mut from_bnd = try_vec(nvtxs, false, "Project2WayPartition: from_bnd")?;
    for i in 0..nvtxs {
        let j = graph.cmap[i];
        graph.where_[i] = cgraph.where_[j];
        from_bnd[i] = cgraph.bnd.contains(j);
    }

    for i in 0..nvtxs {
        let (mut tid, mut ted) = (0, 0);
        if !from_bnd[i] {
            /* interior node */
            for j in graph.adj(i) {
                tid += graph.adjwgt[j];
            }
        } else {
            /* potentially an interface node */
            let me = graph.where_[i];
            for j in graph.adj(i) {
                if me == graph.where_[graph.adjncy[j]] {
                    tid += graph.adjwgt[j];
                } else {
                    ted += graph.adjwgt[j];
                }
            }
        }
        graph.id[i] = tid;
        graph.ed[i] = ted;

        if ted > 0 || graph.degree(i) == 0 {
            graph.bnd.insert(i);
        }
    }

    graph.mincut = cgraph.mincut;
    graph.pwgts.copy_from_slice(&cgraph.pwgts);

    Ok(())
}

/// How a neighbor's boundary membership changed when a vertex moved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BndEvent {
    /// was on the boundary and left it
    Left,
    /// was on the boundary and still is
    Stayed,
    /// joined the boundary
    Joined,
}

/// A neighbor whose id/ed changed because of a 2-way move
#[derive(Clone, Copy, Debug)]
pub(crate) struct NbrUpdate {
    pub k: usize,
    pub part: usize,
    /// ed - id after the move
    pub gain: idx_t,
    pub vwgt: idx_t,
    pub event: BndEvent,
}

/*************************************************************************/
/* Moves v to the other side of a 2-way partition, updating where_, the
   part weights, id/ed and the boundary. `f` is told about every neighbor
   that is or was on the boundary so the caller can maintain its queues.
*/
/*************************************************************************/
pub(crate) fn move_2way<F: FnMut(NbrUpdate)>(graph: &mut WorkGraph, v: usize, mut f: F) {
    let ncon = graph.ncon;
    let from = graph.where_[v];
    let to = from ^ 1;

    graph.where_[v] = to;
    for c in 0..ncon {
        let w = graph.vwgt[v * ncon + c];
        graph.pwgts[to * ncon + c] += w;
        graph.pwgts[from * ncon + c] -= w;
    }

    std::mem::swap(&mut graph.id[v], &mut graph.ed[v]);
    if graph.ed[v] == 0 && graph.bnd.contains(v) && graph.degree(v) > 0 {
        graph.bnd.delete(v);
    } else if graph.ed[v] > 0 && !graph.bnd.contains(v) {
        graph.bnd.insert(v);
    }

    for j in graph.adj(v) {
        let k = graph.adjncy[j];
        let kwgt = if to == graph.where_[k] {
            graph.adjwgt[j]
        } else {
            -graph.adjwgt[j]
        };
        graph.id[k] += kwgt;
        graph.ed[k] -= kwgt;

        /* Update its boundary information */
        let event = if graph.bnd.contains(k) {
            if graph.ed[k] == 0 {
                graph.bnd.delete(k);
                BndEvent::Left
            } else {
                BndEvent::Stayed
            }
        } else if graph.ed[k] > 0 {
            graph.bnd.insert(k);
            BndEvent::Joined
        } else {
            continue;
        };
        f(NbrUpdate {
            k,
            part: graph.where_[k],
            gain: graph.ed[k] - graph.id[k],
            vwgt: graph.vwgt[k * ncon],
            event,
        });
    }
}

/// Largest total edge weight incident to a vertex, the bound on any 2-way gain
pub(crate) fn max_weighted_degree(graph: &WorkGraph) -> idx_t {
    (0..graph.nvtxs)
        .map(|i| graph.adj(i).map(|j| graph.adjwgt[j]).sum::<idx_t>())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::grid_graph;

    #[test]
    fn params_of_split_grid() {
        let mut g = WorkGraph::from_graph(&grid_graph(4, 4)).unwrap();
        g.alloc_2way().unwrap();
        // left two columns in part 0
        for i in 0..16 {
            g.where_[i] = usize::from(i % 4 >= 2);
        }
        compute_2way_partition_params(&mut g);
        assert_eq!(g.mincut, 4);
        assert_eq!(g.pwgts, [8, 8]);
        assert_eq!(g.bnd.len(), 8);
        assert!(crate::debug::check_bnd(&g));
        assert_eq!(crate::debug::compute_cut(&g, &g.where_), 4);
    }
}
