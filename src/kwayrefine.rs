/*
\file
\brief This file contains the driving routines for multilevel k-way refinement

\date   Started 7/28/1997
\author George
\author Copyright 1997-2009, Regents of the University of Minnesota
\version $Id: kwayrefine.c 10737 2011-09-13 13:37:25Z karypis $
*/

use crate::debug;
use crate::error::Result;
use crate::graph::{BndList, KwayInfo, Nbr, WorkGraph};
use crate::kwayfm::{greedy_kway_optimize, move_kway_vertex, BndType, Omode};
use crate::mcutil::compute_load_imbalance_diff;
use crate::options::{Ctrl, DbgLvl, Objtype};
use crate::timing::Timer;
use crate::util::{try_vec, try_with_capacity};
use crate::{idx_t, ifset, real_t};

/*************************************************************************/
/* This function is the entry point of refinement. It refines the coarsest
   level of `levels`, projects the partition one level down and repeats
   until the partition reaches level 0, which is the only level left.
*/
/*************************************************************************/
pub(crate) fn refine_kway(ctrl: &mut Ctrl, levels: &mut Vec<WorkGraph>) -> Result<()> {
    let nlevels = levels.len();

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Uncoarsen));

    /* Compute the parameters of the coarsest graph */
    if let Some(graph) = levels.last_mut() {
        compute_kway_partition_params(ctrl, graph)?;
    }

    /* Refine each successively finer graph */
    let mut i = 0;
    while let Some(mut graph) = levels.pop() {
        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Refine));

        /* Balance only once the hierarchy is half way through */
        if 2 * i >= nlevels && !is_balanced(ctrl, &graph, 0.02) {
            compute_kway_boundary(&mut graph, BndType::Balance);
            greedy_kway_optimize(ctrl, &mut graph, 1, Omode::Balance)?;
            compute_kway_boundary(&mut graph, BndType::Refine);
        }

        let niter = ctrl.niter;
        greedy_kway_optimize(ctrl, &mut graph, niter, Omode::Refine)?;

        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Refine));

        match levels.last_mut() {
            None => {
                /* Deal with the balance requirement at the end */
                if !is_balanced(ctrl, &graph, 0.0) {
                    compute_kway_boundary(&mut graph, BndType::Balance);
                    greedy_kway_optimize(ctrl, &mut graph, 10, Omode::Balance)?;
                    compute_kway_boundary(&mut graph, BndType::Refine);
                    greedy_kway_optimize(ctrl, &mut graph, niter, Omode::Refine)?;
                }
                levels.push(graph);
                break;
            }
            Some(finer) => {
                ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Project));
                project_kway_partition(ctrl, finer, &graph)?;
                ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Project));
            }
        }
        i += 1;
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Uncoarsen));
    Ok(())
}

/// True when no part exceeds its allowed weight by more than `ffactor`
pub(crate) fn is_balanced(ctrl: &Ctrl, graph: &WorkGraph, ffactor: real_t) -> bool {
    compute_load_imbalance_diff(&graph.pwgts, ctrl.nparts, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors) <= ffactor
}

/// Internal/external degrees of `i` and the weight of its edges into every
/// neighboring part. Zero-weight edges are not listed.
fn vertex_kway_info(graph: &WorkGraph, i: usize) -> KwayInfo {
    let me = graph.where_[i];
    let mut info = KwayInfo::default();
    for j in graph.adj(i) {
        let other = graph.where_[graph.adjncy[j]];
        let w = graph.adjwgt[j];
        if other == me {
            info.id += w;
        } else {
            info.ed += w;
            if w > 0 {
                match info.nbrs.iter_mut().find(|n| n.pid == other) {
                    Some(n) => n.ed += w,
                    None => info.nbrs.push(Nbr { pid: other, ed: w }),
                }
            }
        }
    }
    info
}

/*************************************************************************/
/* This function computes the initial id/ed for cut-based partitioning
   (and the total volume for volume-based partitioning).
*/
/**************************************************************************/
pub(crate) fn compute_kway_partition_params(ctrl: &Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let ncon = graph.ncon;

    graph.pwgts.clear();
    graph.pwgts.resize(ctrl.nparts * ncon, 0);
    for i in 0..nvtxs {
        let me = graph.where_[i];
        for c in 0..ncon {
            graph.pwgts[me * ncon + c] += graph.vwgt[i * ncon + c];
        }
    }

    let mut ckrinfo: Vec<KwayInfo> = try_with_capacity(nvtxs, "ComputeKWayPartitionParams: ckrinfo")?;
    let mut bnd = BndList::new(nvtxs);
    let mut mincut: idx_t = 0;
    for i in 0..nvtxs {
        let info = vertex_kway_info(graph, i);
        mincut += info.ed;

        /* Only ed-id>=0 nodes are considered to be in the boundary */
        if BndType::Refine.admits(&info) {
            bnd.insert(i);
        }
        ckrinfo.push(info);
    }

    graph.ckrinfo = ckrinfo;
    graph.bnd = bnd;
    graph.mincut = mincut / 2;
    if ctrl.objtype == Objtype::Vol {
        graph.minvol = debug::compute_volume(graph, &graph.where_);
    }

    debug_assert!(debug::check_kway_params(graph));
    Ok(())
}

/*************************************************************************/
/* This function projects a partition, and at the same time computes the
   parameters for refinement.
*/
/*************************************************************************/
pub(crate) fn project_kway_partition(ctrl: &Ctrl, graph: &mut WorkGraph, cgraph: &WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    graph.alloc_kway(ctrl.nparts)?;

    /* Project the partition */
    for i in 0..nvtxs {
        graph.where_[i] = cgraph.where_[graph.cmap[i]];
    }

    for i in 0..nvtxs {
        let info = if cgraph.ckrinfo[graph.cmap[i]].ed == 0 {
            /* coarse interior vertices only hold interior vertices */
            KwayInfo {
                id: graph.adj(i).map(|j| graph.adjwgt[j]).sum(),
                ..KwayInfo::default()
            }
        } else {
            vertex_kway_info(graph, i)
        };
        if BndType::Refine.admits(&info) {
            graph.bnd.insert(i);
        }
        graph.ckrinfo[i] = info;
    }

    graph.pwgts.copy_from_slice(&cgraph.pwgts);
    graph.mincut = cgraph.mincut;
    if ctrl.objtype == Objtype::Vol {
        graph.minvol = debug::compute_volume(graph, &graph.where_);
    }

    debug_assert!(debug::check_kway_params(graph));
    Ok(())
}

/*************************************************************************/
/* This function computes the boundary definition for balancing or
   refinement.
*/
/*************************************************************************/
pub(crate) fn compute_kway_boundary(graph: &mut WorkGraph, bndtype: BndType) {
    graph.bnd.clear();
    for i in 0..graph.nvtxs {
        if bndtype.admits(&graph.ckrinfo[i]) {
            graph.bnd.insert(i);
        }
    }
}

/*************************************************************************/
/* Last pass over a k-way partition of the input graph. Every empty part
   gets a vertex when there are at least as many vertices as parts, then
   vertices leave the parts above their allowed weight for the parts that
   can take them, cheapest cut first. When no part can take a vertex within
   its bound, a move still happens if it lowers the heaviest load, so the
   partition ends at the closest balance these moves reach.

   The graph must have its k-way parameters computed.
*/
/*************************************************************************/
pub(crate) fn fix_kway_partition(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let nparts = ctrl.nparts;
    ctrl.setup_kway_balance_multipliers(&graph.tvwgt);

    let mut psize = try_vec(nparts, 0usize, "FixKWayPartition: psize")?;
    for &p in &graph.where_ {
        psize[p] += 1;
    }

    /* Fill the empty parts */
    if nvtxs >= nparts {
        for p in 0..nparts {
            if psize[p] > 0 {
                continue;
            }
            let rel = |q: usize| graph.pwgts[q] as real_t * ctrl.pijbm[q];
            let Some(donor) = (0..nparts)
                .filter(|&q| psize[q] > 1)
                .max_by(|&a, &b| rel(a).total_cmp(&rel(b)))
            else {
                break;
            };
            let Some(v) = (0..nvtxs)
                .filter(|&v| graph.where_[v] == donor)
                .min_by_key(|&v| (graph.ckrinfo[v].id, graph.vwgt[v]))
            else {
                break;
            };
            ifset!(
                ctrl.dbglvl,
                DbgLvl::REFINE,
                log::debug!("Moving {v} from part {donor} into empty part {p}")
            );
            move_kway_vertex(graph, v, p, BndType::Refine, |_, _, _, _| {});
            psize[donor] -= 1;
            psize[p] += 1;
        }
    }

    /* Drain the overweight parts */
    let tvwgt = graph.tvwgt[0] as real_t;
    let maxpwgts: Vec<real_t> = (0..nparts)
        .map(|p| ctrl.tpwgts[p] * tvwgt * ctrl.ubfactors[0])
        .collect();
    let load = |pwgt: idx_t, p: usize| {
        if maxpwgts[p] > 0.0 {
            pwgt as real_t / maxpwgts[p]
        } else if pwgt > 0 {
            real_t::INFINITY
        } else {
            0.0
        }
    };

    let mut nmoved = 0;
    for _ in 0..nvtxs {
        let Some(from) =
            (0..nparts).max_by(|&a, &b| load(graph.pwgts[a], a).total_cmp(&load(graph.pwgts[b], b)))
        else {
            break;
        };
        let maxload = load(graph.pwgts[from], from);
        if maxload <= 1.0 || psize[from] <= 1 {
            break;
        }
        let Some(lightest) =
            (0..nparts).min_by(|&a, &b| load(graph.pwgts[a], a).total_cmp(&load(graph.pwgts[b], b)))
        else {
            break;
        };
        /* Some(true) within the bound of 'to', Some(false) over it but below the current maximum */
        let fits = |to: usize, vwgt: idx_t| {
            let after = graph.pwgts[to] + vwgt;
            if to == from {
                None
            } else if after as real_t <= maxpwgts[to] {
                Some(true)
            } else if load(after, to) < maxload {
                Some(false)
            } else {
                None
            }
        };

        /* (within bound, gain, vertex, target) of the best move out of 'from' */
        let mut best: Option<(bool, idx_t, usize, usize)> = None;
        for v in 0..nvtxs {
            if graph.where_[v] != from || graph.vwgt[v] == 0 {
                continue;
            }
            let info = &graph.ckrinfo[v];
            let vwgt = graph.vwgt[v];
            let mut consider = |inside: bool, gain: idx_t, to: usize| {
                if best.map_or(true, |(bi, bg, _, _)| (inside, gain) > (bi, bg)) {
                    best = Some((inside, gain, v, to));
                }
            };
            for n in &info.nbrs {
                if let Some(inside) = fits(n.pid, vwgt) {
                    consider(inside, n.ed - info.id, n.pid);
                }
            }
            if !info.nbrs.iter().any(|n| n.pid == lightest) {
                if let Some(inside) = fits(lightest, vwgt) {
                    consider(inside, -info.id, lightest);
                }
            }
        }
        let Some((_, _, v, to)) = best else {
            break;
        };

        move_kway_vertex(graph, v, to, BndType::Refine, |_, _, _, _| {});
        psize[from] -= 1;
        psize[to] += 1;
        nmoved += 1;
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "Balance fix-up moved {nmoved} vertices, cut: {}, imbalance: {:.3}",
            graph.mincut,
            compute_load_imbalance_diff(&graph.pwgts, nparts, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors)
        )
    );

    if ctrl.objtype == Objtype::Vol {
        graph.minvol = debug::compute_volume(graph, &graph.where_);
    }
    debug_assert!(debug::check_kway_params(graph));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Optype, Options};
    use crate::tests::grid_graph;
    use crate::Graph;

    fn ctrl(nparts: usize) -> Ctrl {
        Ctrl::new(Optype::Kmetis, &Options::default(), 1, nparts).unwrap()
    }

    #[test]
    fn params_of_a_striped_grid() {
        let ctrl = ctrl(4);
        let mut g = WorkGraph::from_graph(&grid_graph(8, 2)).unwrap();
        g.alloc_kway(4).unwrap();
        for i in 0..g.nvtxs {
            g.where_[i] = (i % 8) / 2;
        }
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        assert_eq!(g.pwgts, vec![4, 4, 4, 4]);
        assert_eq!(g.mincut, 6);
        // vertex 2 sits left in part 1, next to part 0
        assert_eq!(g.ckrinfo[2].nbrs, vec![Nbr { pid: 0, ed: 1 }]);
        assert_eq!(g.ckrinfo[2].id, 2);
    }

    #[test]
    fn projection_carries_the_cut() {
        let mut ctrl = ctrl(2);
        let g = WorkGraph::from_graph(&grid_graph(12, 12)).unwrap();
        ctrl.setup_kway_balance_multipliers(&g.tvwgt);
        ctrl.coarsen_to = 30;
        let mut levels = crate::coarsen::coarsen_graph(&mut ctrl, g).unwrap();
        assert!(levels.len() > 1);

        let coarsest = levels.len() - 1;
        let cg = &mut levels[coarsest];
        cg.alloc_kway(2).unwrap();
        for i in 0..cg.nvtxs {
            cg.where_[i] = i % 2;
        }
        compute_kway_partition_params(&ctrl, cg).unwrap();

        let (finer, coarser) = levels.split_at_mut(coarsest);
        let fine = &mut finer[coarsest - 1];
        project_kway_partition(&ctrl, fine, &coarser[0]).unwrap();
        assert_eq!(fine.mincut, coarser[0].mincut);
        assert_eq!(debug::compute_cut(fine, &fine.where_), fine.mincut);
        assert!(debug::check_kway_params(fine));
    }

    #[test]
    fn refinement_returns_the_finest_level() {
        let mut ctrl = ctrl(4);
        let g = WorkGraph::from_graph(&grid_graph(16, 16)).unwrap();
        ctrl.setup_kway_balance_multipliers(&g.tvwgt);
        ctrl.coarsen_to = 120;
        let mut levels = crate::coarsen::coarsen_graph(&mut ctrl, g).unwrap();
        let coarsest = levels.len() - 1;
        let cg = &mut levels[coarsest];
        cg.alloc_kway(4).unwrap();
        for i in 0..cg.nvtxs {
            cg.where_[i] = i * 4 / cg.nvtxs;
        }

        refine_kway(&mut ctrl, &mut levels).unwrap();
        assert_eq!(levels.len(), 1);
        let g = &levels[0];
        assert_eq!(g.nvtxs, 256);
        assert_eq!(debug::compute_cut(g, &g.where_), g.mincut);
        assert!(is_balanced(&ctrl, g, 0.0), "{:?}", g.pwgts);
    }

    #[test]
    fn fix_up_fills_empty_parts_and_drains_heavy_ones() {
        let mut ctrl = ctrl(3);
        let mut g = WorkGraph::from_graph(&grid_graph(6, 5)).unwrap();
        g.alloc_kway(3).unwrap();
        for i in 0..g.nvtxs {
            g.where_[i] = usize::from(i % 6 >= 5);
        }
        ctrl.setup_kway_balance_multipliers(&g.tvwgt);
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        assert_eq!(g.pwgts, vec![25, 5, 0]);

        fix_kway_partition(&mut ctrl, &mut g).unwrap();
        assert!(g.pwgts.iter().all(|&w| w > 0));
        // 10 * 1.10
        assert!(g.pwgts.iter().all(|&w| w <= 11), "{:?}", g.pwgts);
        assert_eq!(debug::compute_cut(&g, &g.where_), g.mincut);
    }

    fn isolated_vertices(where_: &[usize], nparts: usize) -> (Ctrl, WorkGraph) {
        let n = where_.len();
        let ctrl = ctrl(nparts);
        let mut g = WorkGraph::from_graph(&Graph::new(vec![0; n + 1], vec![]).unwrap()).unwrap();
        g.alloc_kway(nparts).unwrap();
        g.where_.copy_from_slice(where_);
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        (ctrl, g)
    }

    #[test]
    fn fix_up_evens_out_when_no_part_has_room() {
        // 31 vertices in 9 parts allow 3.79 per part; every part but the last is already at 3 or 4
        let sizes: [idx_t; 9] = [3, 3, 3, 4, 3, 4, 3, 3, 5];
        let where_: Vec<usize> = sizes.iter().enumerate().flat_map(|(p, &s)| vec![p; s as usize]).collect();
        let (mut ctrl, mut g) = isolated_vertices(&where_, 9);
        assert_eq!(g.pwgts, sizes.to_vec());

        fix_kway_partition(&mut ctrl, &mut g).unwrap();
        assert_eq!(g.pwgts.iter().max(), Some(&4), "{:?}", g.pwgts);
        assert_eq!(g.pwgts.iter().sum::<idx_t>(), 31);
        assert_eq!(g.mincut, 0);
    }

    #[test]
    fn fix_up_spreads_a_part_holding_everything() {
        let (mut ctrl, mut g) = isolated_vertices(&[4, 4], 5);
        fix_kway_partition(&mut ctrl, &mut g).unwrap();
        assert_eq!(g.pwgts.iter().max(), Some(&1), "{:?}", g.pwgts);
    }
}
