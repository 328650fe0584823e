/**
\file
\brief This file contains the top level routines for the multilevel recursive bisection
       algorithm PMETIS.

\date   Started 7/24/1997
\author George
\author Copyright 1997-2009, Regents of the University of Minnesota
\version\verbatim $Id: pmetis.c 10513 2011-07-07 22:06:03Z karypis $ \endverbatim
*/

use crate::coarsen::coarsen_graph;
use crate::debug;
use crate::defs::{LARGENIPARTS, SMALLNIPARTS};
use crate::error::{Error, Result};
use crate::graph::{Graph, WorkGraph};
use crate::initpart::init_2way_partition;
use crate::kwayrefine::{compute_kway_partition_params, fix_kway_partition};
use crate::mcutil::compute_load_imbalance_diff;
use crate::options::{Ctrl, DbgLvl, Objtype, Optype, Options};
use crate::refine::{compute_2way_partition_params, refine_2way};
use crate::timing::Timer;
use crate::util::try_vec;
use crate::{idx_t, ifset, real_t, Partition};

/*************************************************************************/
/* \ingroup api
    \brief Recursive partitioning routine.

    This function computes a partitioning of a graph based on multilevel
    recursive bisection. It can be used to partition a graph into \e k
    parts. The objective of the partitioning is to minimize the edgecut
    subject to the balancing constraint.

    \param graph is the graph to be partitioned.
    \param nparts is the number of parts requested.
    \param options are the options of the run; `tpwgts` gives the target
           fraction of the total vertex weight for every part and
           `ufactor`/`ubvec` the allowed imbalance.

    \returns the part of every vertex and the edgecut of the partitioning
             (the communication volume when `objtype` is `Vol`).
*/
/*************************************************************************/
pub fn part_graph_recursive(graph: &Graph, nparts: usize, options: &Options) -> Result<Partition> {
    let mut ctrl = Ctrl::new(Optype::Pmetis, options, graph.ncon(), nparts)?;
    ifset!(ctrl.dbglvl, DbgLvl::INFO, ctrl.log_options());
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Total));

    let nvtxs = graph.vertex_count();
    let mut part = try_vec(nvtxs, 0 as idx_t, "PartGraphRecursive: part")?;
    let mut objval = 0;

    if nparts > 1 && nvtxs > 0 {
        let (where_, _) = recursive_partition(&mut ctrl, WorkGraph::from_graph(graph)?)?;

        let mut wgraph = WorkGraph::from_graph(graph)?;
        wgraph.alloc_kway(nparts)?;
        wgraph.where_ = where_;
        ctrl.setup_kway_balance_multipliers(&wgraph.tvwgt);
        compute_kway_partition_params(&ctrl, &mut wgraph)?;
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

/*************************************************************************/
/* Computes a ctrl.nparts-way partition of `graph` by multilevel recursive
   bisection. Every bisection gets the tolerance ub^(1/ceil(log2 nparts)),
   so that the tolerances of the nested bisections multiply up to the
   requested one.

   \returns the part of every vertex and the sum of the bisection cuts.
*/
/*************************************************************************/
pub(crate) fn recursive_partition(ctrl: &mut Ctrl, graph: WorkGraph) -> Result<(Vec<usize>, idx_t)> {
    let nparts = ctrl.nparts;
    let mut part = try_vec(graph.nvtxs, 0, "MlevelRecursiveBisection: part")?;
    if nparts == 1 {
        return Ok((part, 0));
    }

    let ubfactors = ctrl.ubfactors.clone();
    let depth = (nparts as real_t).log2().ceil().max(1.0);
    for ub in ctrl.ubfactors.iter_mut() {
        *ub = ub.powf(1.0 / depth);
    }

    let mut tpwgts = ctrl.tpwgts.clone();
    let res = mlevel_recursive_bisection(ctrl, graph, nparts, &mut part, &mut tpwgts, 0);
    ctrl.ubfactors = ubfactors;

    Ok((part, res?))
}

/*************************************************************************/
/* This function is the top-level driver of the recursive bisection
   routine. `tpwgts` holds the target fractions of the `nparts` parts of
   this subproblem and is rescaled in place for the recursive calls.
*/
/*************************************************************************/
fn mlevel_recursive_bisection(
    ctrl: &mut Ctrl,
    graph: WorkGraph,
    nparts: usize,
    part: &mut [usize],
    tpwgts: &mut [real_t],
    fpart: usize,
) -> Result<idx_t> {
    let nvtxs = graph.nvtxs;
    if nvtxs == 0 {
        log::warn!("\t***Cannot bisect a graph with 0 vertices!\n\t***You are trying to partition a graph into too many parts!");
        return Ok(0);
    }

    /* determine the weights of the two partitions as a function of the weight of the
    target partition weights */
    let half = nparts >> 1;
    let wsum: real_t = tpwgts[..half].iter().sum();
    let tpwgts2 = [wsum, 1.0 - wsum];

    /* perform the bisection */
    let graph = multilevel_bisect(ctrl, graph, &tpwgts2)?;
    let mut objval = graph.mincut;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::IPART,
        log::info!(
            "Bisection of {} vertices into parts {}..{}: cut {}, weights {:?}",
            nvtxs,
            fpart,
            fpart + nparts,
            graph.mincut,
            graph.pwgts
        )
    );

    for i in 0..nvtxs {
        part[graph.label[i]] = graph.where_[i] + fpart;
    }

    /* split the graph into its two halves and recurse */
    if nparts > 2 {
        let (lgraph, rgraph) = split_graph_part(ctrl, &graph)?;
        drop(graph);

        /* Scale the fractions in the tpwgts according to the true weight */
        let (ltpwgts, rtpwgts) = tpwgts.split_at_mut(half);
        rescale(ltpwgts, wsum);
        rescale(rtpwgts, 1.0 - wsum);

        /* Do the recursive call */
        if nparts > 3 {
            objval += mlevel_recursive_bisection(ctrl, lgraph, half, part, ltpwgts, fpart)?;
            objval += mlevel_recursive_bisection(ctrl, rgraph, nparts - half, part, rtpwgts, fpart + half)?;
        } else if nparts == 3 {
            drop(lgraph);
            objval += mlevel_recursive_bisection(ctrl, rgraph, nparts - half, part, rtpwgts, fpart + half)?;
        }
    }

    Ok(objval)
}

/// Divides the fractions by `wsum` so that they add up to one again
fn rescale(tpwgts: &mut [real_t], wsum: real_t) {
    if wsum > 0.0 {
        for t in tpwgts.iter_mut() {
            *t /= wsum;
        }
    } else {
        let n = tpwgts.len() as real_t;
        tpwgts.fill(1.0 / n);
    }
}

/*************************************************************************/
/* This function performs a multilevel bisection. The best of ctrl.ncuts
   runs is kept: a run replaces the best one when it is balanced and cuts
   less, or when the best one is unbalanced and the run is less so.
*/
/*************************************************************************/
fn multilevel_bisect(ctrl: &mut Ctrl, graph: WorkGraph, tpwgts: &[real_t; 2]) -> Result<WorkGraph> {
    ctrl.setup_2way_balance_multipliers(&graph, tpwgts);

    let mut graph = graph;
    let mut bestwhere: Vec<usize> = Vec::new();
    let (mut bestobj, mut bestbal): (idx_t, real_t) = (0, 0.0);
    let mut best_is_current = true;

    for i in 0..ctrl.ncuts {
        let mut levels = coarsen_graph(ctrl, graph)?;

        let coarsest = levels.len() - 1;
        let niparts = ctrl.niparts.unwrap_or(if levels[coarsest].nvtxs <= ctrl.coarsen_to {
            SMALLNIPARTS
        } else {
            LARGENIPARTS
        });
        init_2way_partition(ctrl, &mut levels[coarsest], tpwgts, niparts)?;

        refine_2way(ctrl, &mut levels, tpwgts)?;
        graph = levels
            .pop()
            .ok_or_else(|| Error::internal("refinement lost the bisected graph"))?;

        let curobj = graph.mincut;
        let curbal = compute_load_imbalance_diff(&graph.pwgts, 2, graph.ncon, &ctrl.pijbm, &ctrl.ubfactors);

        if i == 0 || (curbal <= 0.0005 && bestobj > curobj) || (bestbal > 0.0005 && curbal < bestbal) {
            bestobj = curobj;
            bestbal = curbal;
            bestwhere.clone_from(&graph.where_);
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
        compute_2way_partition_params(&mut graph);
    }

    Ok(graph)
}

/*************************************************************************/
/* This function splits a graph into two based on its bisection. Only the
   edges inside each half survive; vertex and edge weights and labels are
   carried over.
*/
/*************************************************************************/
fn split_graph_part(ctrl: &mut Ctrl, graph: &WorkGraph) -> Result<(WorkGraph, WorkGraph)> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Split));

    let nvtxs = graph.nvtxs;
    let ncon = graph.ncon;
    let where_ = &graph.where_;

    debug_assert!(debug::check_bnd(graph));

    let mut rename = try_vec(nvtxs, 0, "SplitGraphPart: rename")?;
    let mut snvtxs = [0usize; 2];
    let mut snedges = [0usize; 2];
    for i in 0..nvtxs {
        let mypart = where_[i];
        rename[i] = snvtxs[mypart];
        snvtxs[mypart] += 1;
        snedges[mypart] += graph.degree(i);
    }

    let mut sgraphs = [
        WorkGraph::with_capacity(snvtxs[0], snedges[0], ncon)?,
        WorkGraph::with_capacity(snvtxs[1], snedges[1], ncon)?,
    ];
    for sgraph in &mut sgraphs {
        sgraph.xadj.push(0);
    }

    for i in 0..nvtxs {
        let mypart = where_[i];
        let sgraph = &mut sgraphs[mypart];

        if !graph.bnd.contains(i) {
            /* This is an interior vertex */
            for j in graph.adj(i) {
                sgraph.adjncy.push(rename[graph.adjncy[j]]);
                sgraph.adjwgt.push(graph.adjwgt[j]);
            }
        } else {
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                if where_[k] == mypart {
                    sgraph.adjncy.push(rename[k]);
                    sgraph.adjwgt.push(graph.adjwgt[j]);
                }
            }
        }

        /* copy vertex weights */
        sgraph.vwgt.extend_from_slice(&graph.vwgt[i * ncon..(i + 1) * ncon]);
        sgraph.label.push(graph.label[i]);
        sgraph.xadj.push(sgraph.adjncy.len());
    }

    for sgraph in &mut sgraphs {
        sgraph.nvtxs = sgraph.xadj.len() - 1;
        sgraph.nedges = sgraph.adjncy.len();
        sgraph.setup_tvwgt();
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Split));

    let [lgraph, rgraph] = sgraphs;
    Ok((lgraph, rgraph))
}
