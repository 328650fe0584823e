/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * debug.c
 *
 * This file contains code that performs self debugging
 *
 * Started 7/24/97
 * George
 *
 */

use crate::graph::WorkGraph;
use crate::idx_t;

/// Computes the total edgecut
pub(crate) fn compute_cut(graph: &WorkGraph, where_: &[usize]) -> idx_t {
    let mut cut = 0;
    for i in 0..graph.nvtxs {
        for j in graph.adj(i) {
            if where_[i] != where_[graph.adjncy[j]] {
                cut += graph.adjwgt[j];
            }
        }
    }
    cut / 2
}

/// Computes the total volume: each vertex counts once for every other part
/// among its neighbors
pub(crate) fn compute_volume(graph: &WorkGraph, where_: &[usize]) -> idx_t {
    let nparts = where_.iter().copied().max().map_or(0, |m| m + 1);
    let mut marker = vec![usize::MAX; nparts];

    let mut totalv = 0;
    for i in 0..graph.nvtxs {
        marker[where_[i]] = i;
        for j in graph.adj(i) {
            let k = where_[graph.adjncy[j]];
            if marker[k] != i {
                marker[k] = i;
                totalv += 1;
            }
        }
    }
    totalv
}

/// Checks that the boundary list and id/ed of a 2-way partition are consistent
pub(crate) fn check_bnd(graph: &WorkGraph) -> bool {
    for i in 0..graph.nvtxs {
        let (mut id, mut ed) = (0, 0);
        for j in graph.adj(i) {
            if graph.where_[i] == graph.where_[graph.adjncy[j]] {
                id += graph.adjwgt[j];
            } else {
                ed += graph.adjwgt[j];
            }
        }
        if graph.id.len() == graph.nvtxs && (graph.id[i] != id || graph.ed[i] != ed) {
            log::error!(
                "vertex {i}: id/ed {}/{} but computed {id}/{ed}",
                graph.id[i],
                graph.ed[i]
            );
            return false;
        }
        let onbnd = ed > 0 || graph.degree(i) == 0;
        if onbnd != graph.bnd.contains(i) {
            log::error!("vertex {i}: boundary membership is {}", graph.bnd.contains(i));
            return false;
        }
    }
    true
}

/// Checks the k-way refinement info against a recomputation
pub(crate) fn check_kway_params(graph: &WorkGraph) -> bool {
    for i in 0..graph.nvtxs {
        let me = graph.where_[i];
        let info = &graph.ckrinfo[i];
        let mut id = 0;
        let mut ed = 0;
        for j in graph.adj(i) {
            let other = graph.where_[graph.adjncy[j]];
            if other == me {
                id += graph.adjwgt[j];
            } else {
                ed += graph.adjwgt[j];
                let listed = info.nbrs.iter().find(|n| n.pid == other).map_or(0, |n| n.ed);
                let actual: idx_t = graph
                    .adj(i)
                    .filter(|&jj| graph.where_[graph.adjncy[jj]] == other)
                    .map(|jj| graph.adjwgt[jj])
                    .sum();
                if listed != actual {
                    log::error!("vertex {i}: ed to part {other} is {listed}, computed {actual}");
                    return false;
                }
            }
        }
        if id != info.id || ed != info.ed {
            log::error!("vertex {i}: id/ed {}/{} but computed {id}/{ed}", info.id, info.ed);
            return false;
        }
        if info.nbrs.iter().any(|n| n.pid == me) {
            log::error!("vertex {i} lists its own part as a neighbor");
            return false;
        }
    }
    true
}

/// Checks the correctness of the node-separator refinement data
pub(crate) fn check_node_partition_params(graph: &WorkGraph) -> bool {
    let mut pwgts = [0; 3];
    for i in 0..graph.nvtxs {
        let me = graph.where_[i];
        pwgts[me] += graph.vwgt[i];

        if me == 2 {
            let mut edegrees = [0; 2];
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                let other = graph.where_[k];
                if other != 2 {
                    edegrees[other] += graph.vwgt[k];
                }
            }
            if edegrees != graph.nrinfo[i] {
                log::error!(
                    "Something wrong with edegrees: {i} {:?} {:?}",
                    edegrees,
                    graph.nrinfo[i]
                );
                return false;
            }
            if !graph.bnd.contains(i) {
                log::error!("separator vertex {i} is not on the boundary");
                return false;
            }
        } else if graph.bnd.contains(i) {
            log::error!("vertex {i} of part {me} is on the boundary");
            return false;
        }
    }

    if pwgts[..] != graph.pwgts[..3] {
        log::error!(
            "Something wrong with part-weights: {:?} {:?}",
            pwgts,
            &graph.pwgts[..3]
        );
        return false;
    }
    true
}

/// Checks if the separator is indeed a separator
pub(crate) fn is_separable(graph: &WorkGraph) -> bool {
    for i in 0..graph.nvtxs {
        let me = graph.where_[i];
        if me == 2 {
            continue;
        }
        let other = (me + 1) % 2;
        if graph.adj(i).any(|j| graph.where_[graph.adjncy[j]] == other) {
            log::error!("vertex {i} in part {me} touches part {other}");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::grid_graph;

    #[test]
    fn cut_and_volume_of_grid_halves() {
        let g = WorkGraph::from_graph(&grid_graph(3, 3)).unwrap();
        // rows 0 and 1 against row 2
        let where_: Vec<usize> = (0..9).map(|i| usize::from(i >= 6)).collect();
        assert_eq!(compute_cut(&g, &where_), 3);
        assert_eq!(compute_volume(&g, &where_), 6);
    }

    #[test]
    fn separator_check() {
        let mut g = WorkGraph::from_graph(&grid_graph(3, 1)).unwrap();
        g.where_ = vec![0, 2, 1];
        assert!(is_separable(&g));
        g.where_ = vec![0, 1, 2];
        assert!(!is_separable(&g));
    }
}
