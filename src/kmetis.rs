/*!
\file
\brief The top-level routines for  multilevel k-way partitioning that minimizes
       the edge cut.

\date   Started 7/28/1997
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
\version\verbatim $Id: kmetis.c 20398 2016-11-22 17:17:12Z karypis $ \endverbatim
*/

use std::collections::VecDeque;

use crate::coarsen::coarsen_graph;
use crate::debug;
use crate::error::{Error, Result};
use crate::graph::{Graph, WorkGraph};
use crate::kwayfm::{greedy_kway_optimize, BndType, Omode};
use crate::kwayrefine::{
    compute_kway_boundary, compute_kway_partition_params, fix_kway_partition, is_balanced, refine_kway,
};
use crate::mcutil::compute_load_imbalance_diff;
use crate::options::{Ctrl, DbgLvl, Iptype, Objtype, Optype, Options};
use crate::pmetis::recursive_partition;
use crate::pqueue::RPQueue;
use crate::timing::Timer;
use crate::util::{self, try_vec};
use crate::{idx_t, ifset, real_t, Partition};

/// Marks a vertex that no region has claimed yet
const UNASSIGNED: usize = usize::MAX;

/*************************************************************************/
/* This function is the entry point for KMETIS */
/*************************************************************************/
pub fn part_graph_kway(graph: &Graph, nparts: usize, options: &Options) -> Result<Partition> {
    let mut ctrl = Ctrl::new(Optype::Kmetis, options, graph.ncon(), nparts)?;
    ifset!(ctrl.dbglvl, DbgLvl::INFO, ctrl.log_options());

    let nvtxs = graph.vertex_count();
    let mut part = try_vec(nvtxs, 0 as idx_t, "PartGraphKway: part")?;
    let mut objval = 0;

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Total));

    if nparts > 1 && nvtxs > 0 {
        let wgraph = WorkGraph::from_graph(graph)?;

        /* set up multipliers for making balance computations easier */
        ctrl.setup_kway_balance_multipliers(&wgraph.tvwgt);

        /* set various run parameters that depend on the graph */
        ctrl.coarsen_to = (nvtxs / (40 * nparts.ilog2() as usize)).max(30 * nparts);
        if ctrl.niparts.is_none() {
            ctrl.niparts = Some(if ctrl.coarsen_to == 30 * nparts { 4 } else { 5 });
        }

        let mut wgraph = mlevel_kway_partitioning(&mut ctrl, wgraph)?;
        fix_kway_partition(&mut ctrl, &mut wgraph)?;

        objval = match ctrl.objtype {
            Objtype::Vol => debug::compute_volume(&wgraph, &wgraph.where_),
            Objtype::Cut | Objtype::Node => debug::compute_cut(&wgraph, &wgraph.where_),
        };
        for (p, &w) in part.iter_mut().zip(&wgraph.where_) {
            *p = w as idx_t;
        }
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Total));
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.report());

    Ok(Partition { part, objval })
}

/// The objective value the k-way routines minimize
fn kway_objective(ctrl: &Ctrl, graph: &WorkGraph) -> idx_t {
    match ctrl.objtype {
        Objtype::Vol => graph.minvol,
        Objtype::Cut | Objtype::Node => graph.mincut,
    }
}

/*************************************************************************/
/* This function computes a k-way partitioning of a graph that minimizes
    the specified objective function.

    \param ctrl is the control structure
    \param graph is the graph to be partitioned

    \returns the graph with the best of the ctrl.ncuts partitionings in
             graph.where_ and its k-way parameters computed.
*/
/*************************************************************************/
fn mlevel_kway_partitioning(ctrl: &mut Ctrl, graph: WorkGraph) -> Result<WorkGraph> {
    let nparts = ctrl.nparts;
    let mut graph = graph;
    let mut bestwhere: Vec<usize> = Vec::new();
    let (mut bestobj, mut bestbal): (idx_t, real_t) = (0, 0.0);
    let mut best_is_current = true;

    for i in 0..ctrl.ncuts {
        let mut levels = coarsen_graph(ctrl, graph)?;

        let coarsest = levels.len() - 1;
        init_kway_partitioning(ctrl, &mut levels[coarsest])?;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::IPART,
            log::info!(
                "Initial {}-way partitioning cut: {}",
                nparts,
                debug::compute_cut(&levels[coarsest], &levels[coarsest].where_)
            )
        );

        refine_kway(ctrl, &mut levels)?;
        graph = levels
            .pop()
            .ok_or_else(|| Error::internal("refinement lost the partitioned graph"))?;

        let curobj = kway_objective(ctrl, &graph);
        let curbal = compute_load_imbalance_diff(&graph.pwgts, nparts, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors);

        if i == 0 || (curbal <= 0.0005 && bestobj > curobj) || (bestbal > 0.0005 && curbal < bestbal) {
            bestwhere.clone_from(&graph.where_);
            bestobj = curobj;
            bestbal = curbal;
            best_is_current = true;
        } else {
            best_is_current = false;
        }

        if bestobj == 0 {
            break;
        }
    }

    if !best_is_current {
        graph.where_ = bestwhere;
        compute_kway_partition_params(ctrl, &mut graph)?;
    }

    Ok(graph)
}

/*************************************************************************/
/* This function computes the initial k-way partitioning of the coarsest
   graph. The result is left in graph.where_; the k-way parameters are
   computed by the refinement that follows.
*/
/*************************************************************************/
fn init_kway_partitioning(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let dbglvl = ctrl.dbglvl;
    ctrl.dbglvl = dbglvl.without(DbgLvl::REFINE).without(DbgLvl::MOVEINFO);
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::InitPart));

    let res = graph.alloc_kway(ctrl.nparts).and_then(|()| match ctrl.iptype {
        Iptype::MetisRb => init_kway_by_bisection(ctrl, graph),
        _ => init_kway_by_growing(ctrl, graph),
    });

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::InitPart));
    ctrl.dbglvl = dbglvl;

    res
}

/*************************************************************************/
/* This function partitions the coarsest graph by recursive bisection,
   running it as a separate bisection problem whose tolerance is
   ub^(1/ln nparts).
*/
/*************************************************************************/
fn init_kway_by_bisection(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let nparts = ctrl.nparts;
    let ubvec = ctrl
        .ubfactors
        .iter()
        .map(|&ub| ub.powf(1.0 / (nparts as real_t).ln()))
        .collect();

    let options = Options {
        niter: ctrl.niter,
        ncuts: ctrl.niparts.unwrap_or(1),
        ctype: ctrl.ctype,
        no2hop: ctrl.no2hop,
        seed: Some(ctrl.rng.u64(..)),
        ubvec: Some(ubvec),
        tpwgts: Some(ctrl.tpwgts.clone()),
        dbglvl: ctrl.dbglvl.without(DbgLvl::TIME),
        ..Options::default()
    };
    let mut rbctrl = Ctrl::new(Optype::Pmetis, &options, graph.ncon, nparts)?;

    let cgraph = WorkGraph::from_csr(
        graph.xadj.clone(),
        graph.adjncy.clone(),
        graph.vwgt.clone(),
        graph.adjwgt.clone(),
        graph.ncon,
    );
    let (where_, _) = recursive_partition(&mut rbctrl, cgraph)?;
    graph.where_ = where_;

    Ok(())
}

/*************************************************************************/
/* This function computes ctrl.niparts initial partitionings of the
   coarsest graph, either by growing regions or by a random assignment,
   balances and refines each one and keeps the best.
*/
/*************************************************************************/
fn init_kway_by_growing(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let nparts = ctrl.nparts;
    let niparts = ctrl.niparts.unwrap_or(1);
    let niter = ctrl.niter;

    let mut bestwhere = try_vec(nvtxs, 0, "InitKWayPartitioning: bestwhere")?;
    let mut perm = try_vec(nvtxs, 0, "InitKWayPartitioning: perm")?;
    let (mut bestobj, mut bestbal): (idx_t, real_t) = (0, 0.0);

    for inbfs in 0..niparts {
        match ctrl.iptype {
            Iptype::Random => {
                for w in graph.where_.iter_mut() {
                    *w = util::rand_in_range(&mut ctrl.rng, nparts);
                }
            }
            _ => grow_kway_regions(ctrl, graph, &mut perm)?,
        }

        compute_kway_partition_params(ctrl, graph)?;
        if !is_balanced(ctrl, graph, 0.0) {
            compute_kway_boundary(graph, BndType::Balance);
            greedy_kway_optimize(ctrl, graph, 4, Omode::Balance)?;
            compute_kway_boundary(graph, BndType::Refine);
        }
        greedy_kway_optimize(ctrl, graph, niter, Omode::Refine)?;

        let curobj = kway_objective(ctrl, graph);
        let curbal = compute_load_imbalance_diff(&graph.pwgts, nparts, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors);

        ifset!(
            ctrl.dbglvl,
            DbgLvl::IPART,
            log::debug!("Initial k-way try {inbfs}: objective {curobj}, imbalance {curbal:.3}")
        );

        if inbfs == 0 || (curbal <= 0.0005 && bestobj > curobj) || (bestbal > 0.0005 && curbal < bestbal) {
            bestwhere.copy_from_slice(&graph.where_);
            bestobj = curobj;
            bestbal = curbal;
        }

        if bestobj == 0 && bestbal <= 0.0005 {
            break;
        }
    }

    graph.where_.copy_from_slice(&bestwhere);
    Ok(())
}

/*************************************************************************/
/* This function grows ctrl.nparts regions at the same time. The region
   that is lightest relative to its target always takes the next vertex,
   in breadth-first order from its frontier; a region whose frontier is
   exhausted is reseeded at a random unassigned vertex, preferably one no
   region touches yet, which is how the regions reach the other components
   of the graph.
*/
/*************************************************************************/
fn grow_kway_regions(ctrl: &mut Ctrl, graph: &mut WorkGraph, perm: &mut [usize]) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let nparts = ctrl.nparts;

    util::rand_array_permute(&mut ctrl.rng, perm, nvtxs / 4, true);

    graph.where_.fill(UNASSIGNED);
    let mut pwgts = try_vec(nparts, 0 as idx_t, "GrowKWayRegions: pwgts")?;
    let mut frontier: Vec<VecDeque<usize>> = vec![VecDeque::new(); nparts];

    let mut queue = RPQueue::new(nparts);
    for p in 0..nparts {
        queue.insert(p, 0.0);
    }

    let (mut next, mut fresh) = (0, 0);
    let mut nleft = nvtxs;
    while nleft > 0 {
        let Some(p) = queue.pop() else {
            break;
        };

        let mut v = UNASSIGNED;
        while let Some(u) = frontier[p].pop_front() {
            if graph.where_[u] == UNASSIGNED {
                v = u;
                break;
            }
        }
        if v == UNASSIGNED {
            /* reseed away from the other regions if possible; a vertex that
            touches a region never becomes untouched again */
            while fresh < nvtxs
                && (graph.where_[perm[fresh]] != UNASSIGNED
                    || graph.adj(perm[fresh]).any(|j| graph.where_[graph.adjncy[j]] != UNASSIGNED))
            {
                fresh += 1;
            }
            if fresh < nvtxs {
                v = perm[fresh];
            } else {
                /* nleft > 0 guarantees an unassigned vertex past 'next' */
                while graph.where_[perm[next]] != UNASSIGNED {
                    next += 1;
                }
                v = perm[next];
            }
        }

        graph.where_[v] = p;
        pwgts[p] += graph.vwgt[v];
        nleft -= 1;
        for j in graph.adj(v) {
            let k = graph.adjncy[j];
            if graph.where_[k] == UNASSIGNED {
                frontier[p].push_back(k);
            }
        }

        queue.insert(p, -(pwgts[p] as real_t * ctrl.pijbm[p]));
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::IPART,
        log::debug!("Grown regions: {:?}", pwgts)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{grid_graph, part_weights};

    fn ctrl_for(g: &WorkGraph, nparts: usize, options: &Options) -> Ctrl {
        let mut ctrl = Ctrl::new(Optype::Kmetis, options, 1, nparts).unwrap();
        ctrl.setup_kway_balance_multipliers(&g.tvwgt);
        ctrl
    }

    #[test]
    fn grown_regions_stay_within_one_vertex() {
        let mut g = WorkGraph::from_graph(&grid_graph(10, 10)).unwrap();
        let mut ctrl = ctrl_for(&g, 4, &Options::default());
        g.alloc_kway(4).unwrap();
        let mut perm = vec![0; 100];
        grow_kway_regions(&mut ctrl, &mut g, &mut perm).unwrap();

        let mut sizes = [0; 4];
        for &w in &g.where_ {
            sizes[w] += 1;
        }
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1, "{sizes:?}");
    }

    #[test]
    fn growing_reaches_every_component() {
        // three disjoint edges, two regions
        let graph = Graph::new(vec![0, 1, 2, 3, 4, 5, 6], vec![1, 0, 3, 2, 5, 4]).unwrap();
        let mut g = WorkGraph::from_graph(&graph).unwrap();
        let mut ctrl = ctrl_for(&g, 2, &Options::default());
        g.alloc_kway(2).unwrap();
        let mut perm = vec![0; 6];
        grow_kway_regions(&mut ctrl, &mut g, &mut perm).unwrap();
        assert!(g.where_.iter().all(|&w| w < 2));
        assert_eq!(g.where_.iter().filter(|&&w| w == 0).count(), 3);
    }

    #[test]
    fn new_regions_start_in_untouched_components() {
        // two triangles
        let graph = Graph::new(vec![0, 2, 4, 6, 8, 10, 12], vec![1, 2, 0, 2, 0, 1, 4, 5, 3, 5, 3, 4]).unwrap();
        for seed in 0..8 {
            let mut g = WorkGraph::from_graph(&graph).unwrap();
            let opts = Options {
                seed: Some(seed),
                ..Options::default()
            };
            let mut ctrl = ctrl_for(&g, 2, &opts);
            g.alloc_kway(2).unwrap();
            let mut perm = vec![0; 6];
            grow_kway_regions(&mut ctrl, &mut g, &mut perm).unwrap();
            assert!(g.where_[..3].iter().all(|&w| w == g.where_[0]), "{:?}", g.where_);
            assert!(g.where_[3..].iter().all(|&w| w == g.where_[3]), "{:?}", g.where_);
            assert_ne!(g.where_[0], g.where_[3]);
        }
    }

    #[test]
    fn initial_partitionings_are_complete() {
        for iptype in [Iptype::Grow, Iptype::Random, Iptype::MetisRb] {
            let opts = Options {
                iptype: Some(iptype),
                ..Options::default()
            };
            let mut g = WorkGraph::from_graph(&grid_graph(12, 10)).unwrap();
            let mut ctrl = ctrl_for(&g, 3, &opts);
            ctrl.niparts = Some(3);
            init_kway_partitioning(&mut ctrl, &mut g).unwrap();
            assert!(g.where_.iter().all(|&w| w < 3), "{iptype:?}");
            assert!((0..3).all(|p| g.where_.contains(&p)), "{iptype:?}");
        }
    }

    #[test]
    fn kway_partition_of_a_grid() {
        let g = grid_graph(16, 16);
        let p = part_graph_kway(&g, 4, &Options::default()).unwrap();
        let pw = part_weights(&p.part, 4);
        assert!(pw.iter().all(|&w| w > 0 && w <= 70), "{pw:?}");
        assert_eq!(p.objval, crate::stat::compute_cut(&g, &p.part).unwrap());
        // four 8x8 blocks cut 32 edges
        assert!(p.objval <= 48, "{}", p.objval);
    }

    #[test]
    fn volume_objective_reports_the_volume() {
        let g = grid_graph(12, 12);
        let opts = Options {
            objtype: Objtype::Vol,
            ..Options::default()
        };
        let p = part_graph_kway(&g, 3, &opts).unwrap();
        assert_eq!(p.objval, crate::stat::compute_volume(&g, &p.part).unwrap());
    }

    #[test]
    fn several_cuts_keep_the_best() {
        let g = grid_graph(20, 12);
        let one = part_graph_kway(&g, 5, &Options::default()).unwrap();
        let opts = Options {
            ncuts: 4,
            ..Options::default()
        };
        let four = part_graph_kway(&g, 5, &opts).unwrap();
        let pw = part_weights(&four.part, 5);
        assert!(pw.iter().all(|&w| w > 0 && w <= 53), "{pw:?}");
        assert_eq!(four.objval, crate::stat::compute_cut(&g, &four.part).unwrap());
        assert!(one.objval > 0 && four.objval > 0);
    }

    #[test]
    fn more_parts_than_vertices() {
        let g = grid_graph(2, 2);
        let p = part_graph_kway(&g, 6, &Options::default()).unwrap();
        assert!(p.part.iter().all(|&x| (0..6).contains(&x)));
        assert_eq!(p.objval, crate::stat::compute_cut(&g, &p.part).unwrap());
    }
}
