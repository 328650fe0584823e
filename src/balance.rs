/*
\file
\brief Functions for the edge-based balancing

\date Started 7/28/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use crate::error::Result;
use crate::graph::WorkGraph;
use crate::mcutil::compute_load_imbalance_diff;
use crate::options::{Ctrl, DbgLvl};
use crate::pqueue::PQueue;
use crate::refine::{max_weighted_degree, move_2way, BndEvent};
use crate::util::{self, try_vec};
use crate::{idx_t, ifset, real_t};

/*************************************************************************
* This function is the entry point of the bisection balancing algorithms.
**************************************************************************/
pub(crate) fn balance_2way(ctrl: &mut Ctrl, graph: &mut WorkGraph, ntpwgts: &[real_t]) -> Result<()> {
    if compute_load_imbalance_diff(&graph.pwgts, 2, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors) <= 0.0 {
        return Ok(());
    }

    /* return right away if the balance is OK */
    let tvwgt = graph.tvwgt[0] as real_t;
    if (ntpwgts[0] * tvwgt - graph.pwgts[0] as real_t).abs() < 3.0 * tvwgt / graph.nvtxs as real_t {
        return Ok(());
    }

    if graph.bnd.len() > 0 {
        bnd_2way_balance(ctrl, graph, ntpwgts)
    } else {
        general_2way_balance(ctrl, graph, ntpwgts)
    }
}

/// Target weights of the two sides and the side that has to shed weight
fn balance_targets(graph: &WorkGraph, ntpwgts: &[real_t]) -> ([idx_t; 2], idx_t, usize) {
    let tvwgt = graph.tvwgt[0];
    let tpwgt0 = (tvwgt as real_t * ntpwgts[0]) as idx_t;
    let tpwgts = [tpwgt0, tvwgt - tpwgt0];
    let mindiff = (tpwgts[0] - graph.pwgts[0]).abs();
    let from = if graph.pwgts[0] < tpwgts[0] { 1 } else { 0 };
    (tpwgts, mindiff, from)
}

/*************************************************************************
* This function balances two partitions by moving boundary nodes
* from the domain that is overweight to the one that is underweight.
**************************************************************************/
fn bnd_2way_balance(ctrl: &mut Ctrl, graph: &mut WorkGraph, ntpwgts: &[real_t]) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let (tpwgts, mindiff, from) = balance_targets(graph, ntpwgts);
    let to = from ^ 1;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Partitions: [{:6} {:6}] T[{:6} {:6}], Nv-Nb[{:6} {:6}]. ICut: {:6} [B]",
            graph.pwgts[0],
            graph.pwgts[1],
            tpwgts[0],
            tpwgts[1],
            nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    let mut queue = PQueue::new(nvtxs, max_weighted_degree(graph));
    let mut moved = try_vec(nvtxs, false, "Bnd2WayBalance: moved")?;

    debug_assert_eq!(crate::debug::compute_cut(graph, &graph.where_), graph.mincut);
    debug_assert!(crate::debug::check_bnd(graph));

    /* Insert the boundary nodes of the proper partition whose size is OK in the priority queue */
    let nbnd = graph.bnd.len();
    let mut perm = vec![0; nbnd];
    util::rand_array_permute(&mut ctrl.rng, &mut perm, nbnd / 5, true);
    for &ii in &perm {
        let i = graph.bnd.as_slice()[ii];
        if graph.where_[i] == from && graph.vwgt[i] <= mindiff {
            queue.insert(i, graph.ed[i] - graph.id[i]);
        }
    }

    let mut mincut = graph.mincut;
    for _nswaps in 0..nvtxs {
        let Some(higain) = queue.pop() else {
            break;
        };
        debug_assert!(graph.bnd.contains(higain));

        if graph.pwgts[to] + graph.vwgt[higain] > tpwgts[to] {
            break;
        }

        mincut -= graph.ed[higain] - graph.id[higain];
        moved[higain] = true;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::MOVEINFO,
            log::debug!(
                "Moved {:6} from {}. [{:3} {:3}] {:5} [{:4} {:4}]",
                higain,
                from,
                graph.ed[higain] - graph.id[higain],
                graph.vwgt[higain],
                mincut,
                graph.pwgts[0],
                graph.pwgts[1]
            )
        );

        move_2way(graph, higain, |nbr| {
            if moved[nbr.k] || nbr.part != from || nbr.vwgt > mindiff {
                return;
            }
            match nbr.event {
                BndEvent::Left => queue.delete(nbr.k),
                BndEvent::Stayed => queue.update(nbr.k, nbr.gain),
                BndEvent::Joined => queue.insert(nbr.k, nbr.gain),
            }
        });
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "\tMinimum cut: {:6}, PWGTS: [{:6} {:6}], NBND: {:6}",
            mincut,
            graph.pwgts[0],
            graph.pwgts[1],
            graph.bnd.len()
        )
    );

    graph.mincut = mincut;
    Ok(())
}

/*************************************************************************
* This function balances two partitions by moving the highest gain
* (including negative gain) vertices to the other domain.
* It is used only when the unbalance is due to non contiguous
* subdomains. That is, the are no boundary vertices.
* It moves vertices from the domain that is overweight to the one that
* is underweight.
**************************************************************************/
fn general_2way_balance(ctrl: &mut Ctrl, graph: &mut WorkGraph, ntpwgts: &[real_t]) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let (tpwgts, mindiff, from) = balance_targets(graph, ntpwgts);
    let to = from ^ 1;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Partitions: [{:6} {:6}] T[{:6} {:6}], Nv-Nb[{:6} {:6}]. ICut: {:6} [B]",
            graph.pwgts[0],
            graph.pwgts[1],
            tpwgts[0],
            tpwgts[1],
            nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    let mut queue = PQueue::new(nvtxs, max_weighted_degree(graph));
    let mut moved = try_vec(nvtxs, false, "General2WayBalance: moved")?;

    /* Insert the nodes of the proper partition whose size is OK in the priority queue */
    let mut perm = try_vec(nvtxs, 0, "General2WayBalance: perm")?;
    util::rand_array_permute(&mut ctrl.rng, &mut perm, nvtxs / 5, true);
    for &i in &perm {
        if graph.where_[i] == from && graph.vwgt[i] <= mindiff {
            queue.insert(i, graph.ed[i] - graph.id[i]);
        }
    }

    let mut mincut = graph.mincut;
    for _nswaps in 0..nvtxs {
        let Some(higain) = queue.pop() else {
            break;
        };

        if graph.pwgts[to] + graph.vwgt[higain] > tpwgts[to] {
            break;
        }

        mincut -= graph.ed[higain] - graph.id[higain];
        moved[higain] = true;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::MOVEINFO,
            log::debug!(
                "Moved {:6} from {}. [{:3} {:3}] {:5} [{:4} {:4}]",
                higain,
                from,
                graph.ed[higain] - graph.id[higain],
                graph.vwgt[higain],
                mincut,
                graph.pwgts[0],
                graph.pwgts[1]
            )
        );

        /* every unmoved vertex of the source side is queued, boundary or not */
        move_2way(graph, higain, |nbr| {
            if !moved[nbr.k] && nbr.part == from && nbr.vwgt <= mindiff {
                queue.update(nbr.k, nbr.gain);
            }
        });
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "\tMinimum cut: {:6}, PWGTS: [{:6} {:6}], NBND: {:6}",
            mincut,
            graph.pwgts[0],
            graph.pwgts[1],
            graph.bnd.len()
        )
    );

    graph.mincut = mincut;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Optype, Options};
    use crate::refine::compute_2way_partition_params;
    use crate::tests::grid_graph;

    #[test]
    fn balances_a_lopsided_bisection() {
        let mut ctrl = Ctrl::new(Optype::Pmetis, &Options::default(), 1, 2).unwrap();
        let mut g = WorkGraph::from_graph(&grid_graph(10, 10)).unwrap();
        g.alloc_2way().unwrap();
        // first two rows against the rest
        for i in 0..100 {
            g.where_[i] = usize::from(i >= 20);
        }
        compute_2way_partition_params(&mut g);
        ctrl.setup_2way_balance_multipliers(&g, &[0.5, 0.5]);

        balance_2way(&mut ctrl, &mut g, &[0.5, 0.5]).unwrap();

        assert!(g.pwgts[0] > 20);
        assert!(g.pwgts[0] <= 50);
        assert_eq!(crate::debug::compute_cut(&g, &g.where_), g.mincut);
        assert!(crate::debug::check_bnd(&g));
    }

    #[test]
    fn balances_without_boundary() {
        // two disconnected triangles and an isolated edge, all on one side
        let g = crate::Graph::new(
            vec![0, 2, 4, 6, 8, 10, 12, 13, 14],
            vec![1, 2, 0, 2, 0, 1, 4, 5, 3, 5, 3, 4, 7, 6],
        )
        .unwrap();
        let mut ctrl = Ctrl::new(Optype::Pmetis, &Options::default(), 1, 2).unwrap();
        let mut g = WorkGraph::from_graph(&g).unwrap();
        g.alloc_2way().unwrap();
        compute_2way_partition_params(&mut g);
        assert_eq!(g.bnd.len(), 0);
        ctrl.setup_2way_balance_multipliers(&g, &[0.5, 0.5]);

        balance_2way(&mut ctrl, &mut g, &[0.5, 0.5]).unwrap();

        assert_eq!(g.pwgts[0], 4);
        assert_eq!(g.pwgts[1], 4);
        assert_eq!(crate::debug::compute_cut(&g, &g.where_), g.mincut);
    }
}
