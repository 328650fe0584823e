/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * ometis.c
 *
 * This file contains the top level routines for the multilevel nested
 * dissection ordering OMETIS.
 *
 * Started 7/24/97
 * George
 *
 * $Id: ometis.c 10513 2011-07-07 22:06:03Z karypis $
 *
 */

use std::collections::VecDeque;

use crate::coarsen::{coarsen_graph, coarsen_graph_nlevels};
use crate::compress::{compress_graph, prune_graph};
use crate::defs::{LARGENIPARTS, MMDSWITCH};
use crate::error::{ensure_input, Error, Result};
use crate::graph::{Graph, WorkGraph};
use crate::initpart::init_separator;
use crate::mmd::genmmd;
use crate::options::{Ctrl, DbgLvl, Optype, Options};
use crate::srefine::{compute_2way_node_partition_params, refine_2way_node};
use crate::timing::Timer;
use crate::util::{self, try_vec, try_with_capacity};
use crate::{idx_t, ifset, real_t, Ordering};

/*************************************************************************/
/* This function is the entry point for the multilevel nested dissection
    ordering code. At each bisection, a node-separator is computed using
    a node-based refinement approach.

    The returned `perm` and `iperm` are such that if A and A' are the
    original and permuted matrices, then A'[i] = A[perm[i]] and
    A[i] = A'[iperm[i]].
*/
/*************************************************************************/
pub fn node_nd(graph: &Graph, options: &Options) -> Result<Ordering> {
    ensure_input!(
        graph.ncon() == 1,
        "orderings take a single vertex weight, the graph has ncon = {}",
        graph.ncon()
    );

    /* set up the run time parameters */
    let mut ctrl = Ctrl::new(Optype::Ometis, options, 1, 3)?;
    ifset!(ctrl.dbglvl, DbgLvl::INFO, ctrl.log_options());
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Total));

    let nvtxs = graph.vertex_count();
    let mut iperm = try_vec(nvtxs, 0usize, "OMETIS: iperm")?;

    /* prune the dense columns */
    let mut pruned = None;
    if ctrl.pfactor > 0.0 {
        pruned = prune_graph(&ctrl, graph, ctrl.pfactor)?;
        if pruned.is_some() {
            /* disable compression if pruning took place */
            ctrl.compress = false;
        }
    }

    /* compress the graph; note that compression only happens if no pruning
    has taken place. */
    let mut compressed = None;
    if ctrl.compress {
        compressed = compress_graph(&ctrl, graph)?;
        if let Some(c) = &compressed {
            let cfactor = nvtxs as real_t / c.graph.nvtxs as real_t;
            if cfactor > 1.5 && ctrl.nseps == 1 {
                ctrl.nseps = 2;
            }
        }
    }

    /* if no pruning and no compression, setup the graph in the normal way. */
    let wgraph = match (&mut pruned, &mut compressed) {
        (Some((pgraph, _)), _) => std::mem::take(pgraph),
        (None, Some(c)) => std::mem::take(&mut c.graph),
        (None, None) => {
            let mut wgraph = WorkGraph::from_graph(graph)?;
            /* the separator refinement counts vertices, not edges */
            wgraph.adjwgt.fill(1);
            wgraph
        }
    };

    /* do the nested dissection ordering  */
    let nnvtxs = wgraph.nvtxs;
    let mut order = try_vec(nnvtxs, 0usize, "OMETIS: order")?;
    order_subgraph(&mut ctrl, wgraph, &mut order, nnvtxs)?;

    if let Some((_, piperm)) = &pruned {
        /* Order any pruned vertices */
        for i in 0..nnvtxs {
            iperm[piperm[i]] = order[i];
        }
        for i in nnvtxs..nvtxs {
            iperm[piperm[i]] = i;
        }
    } else if let Some(c) = &compressed {
        /* Uncompress the ordering: construct perm from iperm */
        let mut cperm = try_vec(nnvtxs, 0usize, "OMETIS: cperm")?;
        for i in 0..nnvtxs {
            cperm[order[i]] = i;
        }
        let mut l = 0;
        for &i in &cperm {
            for &v in &c.cind[c.cptr[i]..c.cptr[i + 1]] {
                iperm[v] = l;
                l += 1;
            }
        }
    } else {
        iperm = order;
    }

    let mut perm = try_vec(nvtxs, 0 as idx_t, "OMETIS: perm")?;
    for i in 0..nvtxs {
        perm[iperm[i]] = i as idx_t;
    }
    let iperm: Vec<idx_t> = iperm.into_iter().map(|p| p as idx_t).collect();

    if !is_inverse_pair(&perm, &iperm) {
        return Err(Error::internal("nested dissection produced an invalid permutation"));
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Total));
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.report());

    Ok(Ordering { perm, iperm })
}

/// True if `perm` and `iperm` are permutations of `0..n` and inverse to each other
fn is_inverse_pair(perm: &[idx_t], iperm: &[idx_t]) -> bool {
    let n = perm.len();
    iperm.len() == n
        && (0..n).all(|i| {
            let p = iperm[i];
            p >= 0 && (p as usize) < n && perm[p as usize] as usize == i
        })
}

/// Orders `graph` into `order[.. lastvtx]`, by nested dissection if it is
/// large enough, by minimum degree otherwise.
fn order_subgraph(ctrl: &mut Ctrl, graph: WorkGraph, order: &mut [usize], lastvtx: usize) -> Result<()> {
    if graph.nvtxs > MMDSWITCH && graph.nedges > 0 {
        if ctrl.ccorder {
            mlevel_nested_dissection_cc(ctrl, graph, order, lastvtx)
        } else {
            mlevel_nested_dissection(ctrl, graph, order, lastvtx)
        }
    } else {
        mmd_order(ctrl, &graph, order, lastvtx)
    }
}

/// Bisects `graph` and numbers its separator vertices from `lastvtx` downwards.
/// Returns the bisected graph and the position below the separator.
fn bisect_and_order_separator(
    ctrl: &mut Ctrl,
    graph: WorkGraph,
    order: &mut [usize],
    mut lastvtx: usize,
) -> Result<(WorkGraph, usize)> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Sep));
    let graph = mlevel_node_bisection_multiple(ctrl, graph)?;
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Sep));

    ifset!(
        ctrl.dbglvl,
        DbgLvl::SEPINFO,
        log::debug!(
            "Nvtxs: {:6}, [{:6} {:6} {:6}]",
            graph.nvtxs,
            graph.pwgts[0],
            graph.pwgts[1],
            graph.pwgts[2]
        )
    );

    /* Order the nodes in the separator */
    for &i in graph.bnd.as_slice() {
        lastvtx -= 1;
        order[graph.label[i]] = lastvtx;
    }
    Ok((graph, lastvtx))
}

/*************************************************************************/
/* This is the driver for the recursive tri-section of a graph into the
   left, separator, and right partitions. The graphs correspond to the
   left and right parts are further tri-sected in a recursive fashion.
   The nodes in the separator are ordered at the end of the left & right
   nodes.
*/
/*************************************************************************/
fn mlevel_nested_dissection(ctrl: &mut Ctrl, graph: WorkGraph, order: &mut [usize], lastvtx: usize) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let (graph, lastvtx) = bisect_and_order_separator(ctrl, graph, order, lastvtx)?;

    let (lgraph, rgraph) = split_graph_order(ctrl, &graph)?;

    /* a bisection that separated nothing would recurse forever */
    if lgraph.nvtxs == nvtxs || rgraph.nvtxs == nvtxs {
        return mmd_order(ctrl, &graph, order, lastvtx + graph.bnd.len());
    }
    drop(graph);

    /* Recurse on lgraph first, its positions sit below rgraph's */
    let rnvtxs = rgraph.nvtxs;
    order_subgraph(ctrl, lgraph, order, lastvtx - rnvtxs)?;
    order_subgraph(ctrl, rgraph, order, lastvtx)
}

/*************************************************************************/
/* This routine is similar to its non 'CC' counterpart. The difference is
    that after each tri-section, the connected components of the original
    graph that result after removing the separator vertices are ordered
    independently (i.e., this may lead to more than just the left and
    the right subgraphs).
*/
/*************************************************************************/
fn mlevel_nested_dissection_cc(
    ctrl: &mut Ctrl,
    graph: WorkGraph,
    order: &mut [usize],
    lastvtx: usize,
) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let (graph, lastvtx) = bisect_and_order_separator(ctrl, graph, order, lastvtx)?;

    let (cptr, mut cind) = find_sep_induced_components(&graph)?;
    let ncmps = cptr.len() - 1;

    ifset!(
        ctrl.dbglvl,
        DbgLvl::INFO,
        if ncmps > 2 {
            log::info!("  Bisection resulted in {} connected components", ncmps)
        }
    );

    let sgraphs = split_graph_order_cc(ctrl, &graph, &cptr, &mut cind)?;

    if sgraphs.iter().any(|s| s.nvtxs == nvtxs) {
        return mmd_order(ctrl, &graph, order, lastvtx + graph.bnd.len());
    }
    drop(graph);

    /* Go and process the subgraphs */
    let mut rnvtxs = 0;
    for sgraph in sgraphs {
        let snvtxs = sgraph.nvtxs;
        order_subgraph(ctrl, sgraph, order, lastvtx - rnvtxs)?;
        rnvtxs += snvtxs;
    }
    Ok(())
}

/*************************************************************************/
/* This function performs multilevel node bisection (i.e., tri-section).
It performs multiple bisections and selects the best. */
/*************************************************************************/
pub(crate) fn mlevel_node_bisection_multiple(ctrl: &mut Ctrl, graph: WorkGraph) -> Result<WorkGraph> {
    /* if the graph is small, just find a single vertex separator */
    let small = if ctrl.compress { 1000 } else { 2000 };
    if ctrl.nseps == 1 || graph.nvtxs < small {
        return mlevel_node_bisection_l2(ctrl, graph, LARGENIPARTS);
    }

    let mut graph = graph;
    let mut bestwhere: Vec<usize> = Vec::new();
    let mut mincut = graph.tvwgt[0];
    for i in 0..ctrl.nseps {
        graph = mlevel_node_bisection_l2(ctrl, graph, LARGENIPARTS)?;

        if i == 0 || graph.mincut < mincut {
            mincut = graph.mincut;
            if i < ctrl.nseps - 1 {
                bestwhere.clone_from(&graph.where_);
            }
        }

        if mincut == 0 {
            break;
        }
    }

    if mincut != graph.mincut {
        graph.where_ = bestwhere;
        compute_2way_node_partition_params(&mut graph)?;
    }

    Ok(graph)
}

/*************************************************************************/
/* This function performs multilevel node bisection (i.e., tri-section).
Large graphs are coarsened a few levels first and the coarse graph is
bisected multiple times, keeping the best. */
/*************************************************************************/
fn mlevel_node_bisection_l2(ctrl: &mut Ctrl, graph: WorkGraph, niparts: usize) -> Result<WorkGraph> {
    const NRUNS: usize = 5;

    /* if the graph is small, just find a single vertex separator */
    if graph.nvtxs < 5000 {
        return mlevel_node_bisection_l1(ctrl, graph, niparts);
    }

    ctrl.coarsen_to = (graph.nvtxs / 30).max(100);

    let mut levels = coarsen_graph_nlevels(ctrl, graph, 4)?;
    let Some(mut cgraph) = levels.pop() else {
        return Err(Error::internal("coarsening returned no levels"));
    };

    let mut bestwhere: Vec<usize> = Vec::new();
    let mut mincut = cgraph.tvwgt[0];
    let subparts = ((0.7 * niparts as real_t) as usize).max(1);
    for i in 0..NRUNS {
        cgraph = mlevel_node_bisection_l1(ctrl, cgraph, subparts)?;

        if i == 0 || cgraph.mincut < mincut {
            mincut = cgraph.mincut;
            if i < NRUNS - 1 {
                bestwhere.clone_from(&cgraph.where_);
            }
        }

        if mincut == 0 {
            break;
        }
    }

    if mincut != cgraph.mincut {
        cgraph.where_ = bestwhere;
    }

    levels.push(cgraph);
    refine_2way_node(ctrl, &mut levels)?;
    levels.pop().ok_or_else(|| Error::internal("uncoarsening lost the finest level"))
}

/*************************************************************************/
/* The top-level routine of the actual multilevel node bisection */
/*************************************************************************/
fn mlevel_node_bisection_l1(ctrl: &mut Ctrl, graph: WorkGraph, niparts: usize) -> Result<WorkGraph> {
    ctrl.coarsen_to = (graph.nvtxs / 8).clamp(40, 100);

    let mut levels = coarsen_graph(ctrl, graph)?;

    let nlevels = levels.len();
    let cgraph = &mut levels[nlevels - 1];
    let niparts = if cgraph.nvtxs <= ctrl.coarsen_to {
        niparts / 2
    } else {
        niparts
    }
    .max(1);
    init_separator(ctrl, cgraph, niparts)?;

    refine_2way_node(ctrl, &mut levels)?;
    levels.pop().ok_or_else(|| Error::internal("uncoarsening lost the finest level"))
}

/*************************************************************************/
/* This function takes a graph and a tri-section (left, right, separator)
    and splits it into two graphs, dropping the separator.

    The split graphs have all their edge weights set to 1.
*/
/*************************************************************************/
fn split_graph_order(ctrl: &mut Ctrl, graph: &WorkGraph) -> Result<(WorkGraph, WorkGraph)> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Split));

    let nvtxs = graph.nvtxs;
    let where_ = &graph.where_;

    let mut rename = try_vec(nvtxs, 0, "SplitGraphOrder: rename")?;
    let mut snvtxs = [0usize; 3];
    let mut snedges = [0usize; 3];
    for i in 0..nvtxs {
        let k = where_[i];
        rename[i] = snvtxs[k];
        snvtxs[k] += 1;
        snedges[k] += graph.degree(i);
    }

    let mut sgraphs = [
        WorkGraph::with_capacity(snvtxs[0], snedges[0], 1)?,
        WorkGraph::with_capacity(snvtxs[1], snedges[1], 1)?,
    ];
    for sgraph in &mut sgraphs {
        sgraph.xadj.push(0);
    }

    for i in 0..nvtxs {
        let mypart = where_[i];
        if mypart == 2 {
            continue;
        }
        let sgraph = &mut sgraphs[mypart];

        /* the separator is the only other neighbor a vertex can have */
        for j in graph.adj(i) {
            let k = graph.adjncy[j];
            if where_[k] == mypart {
                sgraph.adjncy.push(rename[k]);
            }
        }

        sgraph.vwgt.push(graph.vwgt[i]);
        sgraph.label.push(graph.label[i]);
        sgraph.xadj.push(sgraph.adjncy.len());
    }

    for sgraph in &mut sgraphs {
        sgraph.nvtxs = sgraph.xadj.len() - 1;
        sgraph.nedges = sgraph.adjncy.len();
        sgraph.adjwgt.resize(sgraph.nedges, 1);
        sgraph.setup_tvwgt();
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Split));

    let [lgraph, rgraph] = sgraphs;
    Ok((lgraph, rgraph))
}

/*************************************************************************/
/* This function returns the connected components of the graph that
    result after removing the separator vertices, in CSR form
    (cptr, cind).
*/
/*************************************************************************/
fn find_sep_induced_components(graph: &WorkGraph) -> Result<(Vec<usize>, Vec<usize>)> {
    let nvtxs = graph.nvtxs;
    let where_ = &graph.where_;

    /* mark the separator vertices as already touched */
    let mut touched = try_vec(nvtxs, false, "FindSepInducedComponents: touched")?;
    for &i in graph.bnd.as_slice() {
        touched[i] = true;
    }

    let mut cptr: Vec<usize> = try_with_capacity(nvtxs + 1, "FindSepInducedComponents: cptr")?;
    let mut cind: Vec<usize> = try_with_capacity(nvtxs, "FindSepInducedComponents: cind")?;
    let mut queue = VecDeque::new();
    cptr.push(0);
    for root in 0..nvtxs {
        if touched[root] {
            continue;
        }
        touched[root] = true;
        queue.push_back(root);
        while let Some(i) = queue.pop_front() {
            cind.push(i);
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                if !touched[k] {
                    debug_assert_eq!(where_[k], where_[i]);
                    touched[k] = true;
                    queue.push_back(k);
                }
            }
        }
        cptr.push(cind.len());
    }

    Ok((cptr, cind))
}

/*************************************************************************/
/* This function takes a graph and generates a set of graphs, each of
    which is a connected component of the graph without its separator.

    The split graphs have all their edge weights set to 1.
*/
/*************************************************************************/
fn split_graph_order_cc(
    ctrl: &mut Ctrl,
    graph: &WorkGraph,
    cptr: &[usize],
    cind: &mut [usize],
) -> Result<Vec<WorkGraph>> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Split));

    let nvtxs = graph.nvtxs;
    let ncmps = cptr.len() - 1;
    let mut rename = try_vec(nvtxs, 0, "SplitGraphOrderCC: rename")?;
    let mut sgraphs = try_with_capacity(ncmps, "SplitGraphOrderCC: sgraphs")?;

    /* Go and split the graph a component at a time */
    for c in 0..ncmps {
        let cmp = &mut cind[cptr[c]..cptr[c + 1]];
        let n = cmp.len();
        util::rand_array_permute(&mut ctrl.rng, cmp, n, false);

        let mut snedges = 0;
        for (ii, &i) in cmp.iter().enumerate() {
            rename[i] = ii;
            snedges += graph.degree(i);
        }

        let mut sgraph = WorkGraph::with_capacity(n, snedges, 1)?;
        sgraph.xadj.push(0);
        for &i in cmp.iter() {
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                if graph.where_[k] != 2 {
                    sgraph.adjncy.push(rename[k]);
                }
            }
            sgraph.vwgt.push(graph.vwgt[i]);
            sgraph.label.push(graph.label[i]);
            sgraph.xadj.push(sgraph.adjncy.len());
        }

        sgraph.nvtxs = n;
        sgraph.nedges = sgraph.adjncy.len();
        sgraph.adjwgt.resize(sgraph.nedges, 1);
        sgraph.setup_tvwgt();
        sgraphs.push(sgraph);
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Split));

    Ok(sgraphs)
}

/*************************************************************************/
/* This function uses MMD to order the graph. The vertices are numbered
from lastvtx downwards. */
/*************************************************************************/
fn mmd_order(_ctrl: &mut Ctrl, graph: &WorkGraph, order: &mut [usize], lastvtx: usize) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let iperm = genmmd(&graph.xadj, &graph.adjncy, 1)?;

    let firstvtx = lastvtx - nvtxs;
    for i in 0..nvtxs {
        order[graph.label[i]] = firstvtx + iperm[i];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::grid_graph;

    fn assert_valid(o: &Ordering, n: usize) {
        assert_eq!(o.perm.len(), n);
        assert!(is_inverse_pair(&o.perm, &o.iperm));
        for i in 0..n {
            assert_eq!(o.iperm[o.perm[i] as usize] as usize, i);
        }
    }

    #[test]
    fn orders_a_small_grid_by_minimum_degree() {
        let o = node_nd(&grid_graph(6, 6), &Options::default()).unwrap();
        assert_valid(&o, 36);
    }

    #[test]
    fn orders_a_large_grid_by_dissection() {
        let g = grid_graph(30, 30);
        for ccorder in [false, true] {
            let opts = Options {
                ccorder,
                ..Options::default()
            };
            let o = node_nd(&g, &opts).unwrap();
            assert_valid(&o, 900);
        }
    }

    #[test]
    fn top_separator_comes_last() {
        // with compression off, the last positions hold a separator of the grid
        let g = grid_graph(20, 20);
        let opts = Options {
            compress: false,
            ..Options::default()
        };
        let o = node_nd(&g, &opts).unwrap();
        assert_valid(&o, 400);

        // removing the last 40 vertices of the ordering must disconnect the grid
        let removed: Vec<bool> = (0..400).map(|v| o.iperm[v] >= 360).collect();
        let mut seen = vec![false; 400];
        let start = (0..400).find(|&v| !removed[v]).unwrap();
        let mut stack = vec![start];
        seen[start] = true;
        let mut reached = 0;
        while let Some(v) = stack.pop() {
            reached += 1;
            for &u in g.neighbors(v) {
                let u = u as usize;
                if !removed[u] && !seen[u] {
                    seen[u] = true;
                    stack.push(u);
                }
            }
        }
        assert!(reached < 360);
    }

    #[test]
    fn pruning_orders_dense_vertices_last() {
        // a 12x12 grid plus a hub joined to every vertex
        let grid = grid_graph(12, 12);
        let n = 145;
        let mut xadj = vec![0];
        let mut adjncy = vec![];
        for v in 0..144 {
            adjncy.extend_from_slice(grid.neighbors(v));
            adjncy.push(144);
            xadj.push(adjncy.len() as idx_t);
        }
        adjncy.extend(0..144);
        xadj.push(adjncy.len() as idx_t);
        let g = Graph::new(xadj, adjncy).unwrap();

        let opts = Options {
            pfactor: 3.0,
            ..Options::default()
        };
        let o = node_nd(&g, &opts).unwrap();
        assert_valid(&o, n);
        assert_eq!(o.iperm[144], 144);
    }

    #[test]
    fn compression_keeps_twins_together() {
        // each grid vertex doubled: twins have identical closed neighborhoods
        let grid = grid_graph(15, 15);
        let mut xadj = vec![0];
        let mut adjncy = vec![];
        for v in 0..450usize {
            let base = v / 2;
            adjncy.push((base * 2 + (1 - v % 2)) as idx_t);
            for &u in grid.neighbors(base) {
                adjncy.push(2 * u);
                adjncy.push(2 * u + 1);
            }
            xadj.push(adjncy.len() as idx_t);
        }
        let g = Graph::new(xadj, adjncy).unwrap();
        let o = node_nd(&g, &Options::default()).unwrap();
        assert_valid(&o, 450);
        for v in 0..225 {
            assert_eq!((o.iperm[2 * v] - o.iperm[2 * v + 1]).abs(), 1);
        }
    }

    #[test]
    fn empty_and_edgeless_graphs() {
        let o = node_nd(&Graph::new(vec![0], vec![]).unwrap(), &Options::default()).unwrap();
        assert!(o.perm.is_empty());
        let o = node_nd(&Graph::new(vec![0; 301], vec![]).unwrap(), &Options::default()).unwrap();
        assert_valid(&o, 300);
    }

    #[test]
    fn rejects_multi_constraint_graphs() {
        let g = Graph::with_weights(vec![0, 1, 2], vec![1, 0], Some(vec![1, 1, 1, 1]), None, 2).unwrap();
        assert!(matches!(node_nd(&g, &Options::default()), Err(Error::InvalidInput(_))));
    }
}
