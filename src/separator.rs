/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * separator.c
 *
 * This file contains code for separator extraction
 *
 * Started 8/1/97
 * George
 *
 * $Id: separator.c 10481 2011-07-05 18:01:23Z karypis $
 *
 */

use std::collections::VecDeque;

use crate::error::{ensure_input, Result};
use crate::graph::{Graph, WorkGraph};
use crate::options::{Ctrl, DbgLvl, Optype, Options};
use crate::sfm::{fm_2way_node_refine_1sided, fm_2way_node_refine_2sided};
use crate::srefine::compute_2way_node_partition_params;
use crate::timing::Timer;
use crate::util::{try_vec, try_with_capacity};
use crate::{idx_t, ifset, Separator};

const NIL: usize = usize::MAX;

/*************************************************************************
* This function takes a bisection and constructs a minimum weight vertex
* separator out of it. The cut edges form a bipartite graph; a minimum
* vertex cover of it (Koenig's theorem on a maximum matching) becomes the
* separator, which is then improved by the node-based refinement.
**************************************************************************/
pub(crate) fn construct_separator(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<()> {
    let mut where_ = std::mem::take(&mut graph.where_);

    /* Put the cover of the cut edges into the separator */
    for v in cut_edge_cover(graph, &where_)? {
        where_[v] = 2;
    }

    graph.free_rdata();
    graph.alloc_2way_node()?;
    graph.where_ = where_;

    debug_assert!(crate::debug::is_separable(graph));

    compute_2way_node_partition_params(graph)?;

    debug_assert!(crate::debug::check_node_partition_params(graph));

    fm_2way_node_refine_2sided(ctrl, graph, 1)?;
    fm_2way_node_refine_1sided(ctrl, graph, 4)?;

    debug_assert!(crate::debug::is_separable(graph));
    Ok(())
}

/// Minimum vertex cover of the edges between part 0 and part 1.
///
/// Only the boundary vertices of the bisection can be endpoints of cut edges,
/// so the bipartite graph is built from `graph.bnd`.
fn cut_edge_cover(graph: &WorkGraph, where_: &[usize]) -> Result<Vec<usize>> {
    let nvtxs = graph.nvtxs;

    /* local numbering of the left (part 0) and right (part 1) endpoints */
    let mut local = try_vec(nvtxs, NIL, "ConstructSeparator: local")?;
    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();
    for &i in graph.bnd.as_slice() {
        if graph.adj(i).all(|j| where_[graph.adjncy[j]] == where_[i]) {
            /* islands and vertices without cut edges */
            continue;
        }
        let side = if where_[i] == 0 { &mut left } else { &mut right };
        local[i] = side.len();
        side.push(i);
    }

    let mut bxadj: Vec<usize> = try_with_capacity(left.len() + 1, "ConstructSeparator: bxadj")?;
    let mut badjncy: Vec<usize> = Vec::new();
    bxadj.push(0);
    for &i in &left {
        for j in graph.adj(i) {
            let k = graph.adjncy[j];
            if where_[k] == 1 {
                badjncy.push(local[k]);
            }
        }
        bxadj.push(badjncy.len());
    }

    let matching = BipartiteMatching::hopcroft_karp(&bxadj, &badjncy, right.len());
    let (lcover, rcover) = matching.koenig_cover(&bxadj, &badjncy);

    let mut cover = Vec::with_capacity(matching.size);
    cover.extend(lcover.into_iter().map(|u| left[u]));
    cover.extend(rcover.into_iter().map(|r| right[r]));
    debug_assert_eq!(cover.len(), matching.size);
    Ok(cover)
}

/// A maximum matching of a bipartite graph given as CSR from the left side
struct BipartiteMatching {
    mate_l: Vec<usize>,
    mate_r: Vec<usize>,
    size: usize,
}

impl BipartiteMatching {
    /// Hopcroft-Karp: BFS layers from the free left vertices, then vertex-disjoint
    /// shortest augmenting paths along the layers, until no augmenting path is left.
    fn hopcroft_karp(xadj: &[usize], adjncy: &[usize], nright: usize) -> BipartiteMatching {
        let nleft = xadj.len() - 1;
        let mut m = BipartiteMatching {
            mate_l: vec![NIL; nleft],
            mate_r: vec![NIL; nright],
            size: 0,
        };
        let mut dist = vec![NIL; nleft];
        let mut next = vec![0; nleft];
        let mut queue = VecDeque::with_capacity(nleft);
        let mut stack = Vec::new();

        loop {
            /* BFS phase */
            queue.clear();
            for u in 0..nleft {
                if m.mate_l[u] == NIL {
                    dist[u] = 0;
                    queue.push_back(u);
                } else {
                    dist[u] = NIL;
                }
            }
            let mut found = false;
            while let Some(u) = queue.pop_front() {
                for &r in &adjncy[xadj[u]..xadj[u + 1]] {
                    let w = m.mate_r[r];
                    if w == NIL {
                        found = true;
                    } else if dist[w] == NIL {
                        dist[w] = dist[u] + 1;
                        queue.push_back(w);
                    }
                }
            }
            if !found {
                break;
            }

            /* DFS phase */
            next.copy_from_slice(&xadj[..nleft]);
            for root in 0..nleft {
                if m.mate_l[root] != NIL {
                    continue;
                }
                stack.clear();
                stack.push(root);
                while let Some(&u) = stack.last() {
                    if next[u] == xadj[u + 1] {
                        /* dead end */
                        dist[u] = NIL;
                        stack.pop();
                        continue;
                    }
                    let r = adjncy[next[u]];
                    next[u] += 1;
                    let w = m.mate_r[r];
                    if w == NIL {
                        /* augment along the stack */
                        for &v in &stack {
                            let rv = adjncy[next[v] - 1];
                            m.mate_l[v] = rv;
                            m.mate_r[rv] = v;
                        }
                        m.size += 1;
                        break;
                    } else if dist[w] != NIL && dist[w] == dist[u] + 1 {
                        stack.push(w);
                    }
                }
            }
        }

        m
    }

    /// Koenig's construction: with Z the vertices reachable from the free left
    /// vertices by alternating paths, (L \ Z) + (R & Z) is a minimum cover.
    fn koenig_cover(&self, xadj: &[usize], adjncy: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let nleft = self.mate_l.len();
        let mut zl = vec![false; nleft];
        let mut zr = vec![false; self.mate_r.len()];

        let mut queue: VecDeque<usize> = (0..nleft).filter(|&u| self.mate_l[u] == NIL).collect();
        for &u in &queue {
            zl[u] = true;
        }
        while let Some(u) = queue.pop_front() {
            for &r in &adjncy[xadj[u]..xadj[u + 1]] {
                if zr[r] || self.mate_l[u] == r {
                    continue;
                }
                zr[r] = true;
                let w = self.mate_r[r];
                if w != NIL && !zl[w] {
                    zl[w] = true;
                    queue.push_back(w);
                }
            }
        }

        let lcover = (0..nleft).filter(|&u| !zl[u]).collect();
        let rcover = (0..zr.len()).filter(|&r| zr[r]).collect();
        (lcover, rcover)
    }
}

/*************************************************************************/
/* This function computes a vertex separator of a graph: every vertex is
   assigned to part 0, part 1 or the separator (2), and no edge joins
   part 0 and part 1.
*/
/*************************************************************************/
pub fn compute_vertex_separator(graph: &Graph, options: &Options) -> Result<Separator> {
    ensure_input!(
        graph.ncon() == 1,
        "separators take a single vertex weight, the graph has ncon = {}",
        graph.ncon()
    );
    let mut ctrl = Ctrl::new(Optype::Ometis, options, 1, 3)?;
    ifset!(ctrl.dbglvl, DbgLvl::INFO, ctrl.log_options());
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Total));

    let nvtxs = graph.vertex_count();
    let mut part = try_vec(nvtxs, 0 as idx_t, "ComputeVertexSeparator: part")?;
    let mut sepsize = 0;
    if nvtxs > 1 {
        let mut wgraph = WorkGraph::from_graph(graph)?;
        wgraph.adjwgt.fill(1);
        let wgraph = crate::ometis::mlevel_node_bisection_multiple(&mut ctrl, wgraph)?;
        for (p, &w) in part.iter_mut().zip(&wgraph.where_) {
            *p = w as idx_t;
        }
        sepsize = wgraph.pwgts[2];
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Total));
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.report());

    Ok(Separator { sepsize, part })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initpart::random_bisection;
    use crate::refine::compute_2way_partition_params;
    use crate::tests::grid_graph;

    fn cover_of(xadj: &[usize], adjncy: &[usize], nright: usize) -> (usize, Vec<usize>, Vec<usize>) {
        let m = BipartiteMatching::hopcroft_karp(xadj, adjncy, nright);
        let (l, r) = m.koenig_cover(xadj, adjncy);
        (m.size, l, r)
    }

    #[test]
    fn koenig_cover_is_minimum() {
        // left 0 sees rights 0,1,2; lefts 1 and 2 only see right 0
        let (size, l, r) = cover_of(&[0, 3, 4, 5], &[0, 1, 2, 0, 0], 3);
        assert_eq!(size, 2);
        assert_eq!(l, vec![0]);
        assert_eq!(r, vec![0]);
    }

    #[test]
    fn perfect_matching_on_a_ladder() {
        // u_i - r_i and u_i - r_{i+1}
        let xadj = [0, 2, 4, 6, 7];
        let adjncy = [0, 1, 1, 2, 2, 3, 3];
        let (size, l, r) = cover_of(&xadj, &adjncy, 4);
        assert_eq!(size, 4);
        assert_eq!(l.len() + r.len(), 4);
    }

    #[test]
    fn separator_from_a_bisection() {
        let mut ctrl = Ctrl::new(Optype::Ometis, &Options::default(), 1, 3).unwrap();
        let mut g = WorkGraph::from_graph(&grid_graph(8, 6)).unwrap();
        ctrl.setup_2way_balance_multipliers(&g, &[0.5, 0.5]);
        random_bisection(&mut ctrl, &mut g, &[0.5, 0.5], 2).unwrap();
        compute_2way_partition_params(&mut g);
        let cut = g.mincut;

        construct_separator(&mut ctrl, &mut g).unwrap();

        assert!(crate::debug::is_separable(&g));
        assert!(crate::debug::check_node_partition_params(&g));
        assert!(g.pwgts[2] <= cut);
        assert_eq!(g.pwgts.iter().sum::<idx_t>(), 48);
    }

    #[test]
    fn vertex_separator_of_a_grid() {
        let g = grid_graph(15, 15);
        let sep = compute_vertex_separator(&g, &Options::default()).unwrap();
        let mut pw = [0; 3];
        for &p in &sep.part {
            pw[p as usize] += 1;
        }
        assert_eq!(pw[2], sep.sepsize);
        assert!(pw[0] > 0 && pw[1] > 0);
        assert!(sep.sepsize <= 30, "{}", sep.sepsize);
        for v in 0..g.vertex_count() {
            for &u in g.neighbors(v) {
                assert!(sep.part[v] + sep.part[u as usize] != 1, "edge {v}-{u} crosses");
            }
        }
    }

    #[test]
    fn single_vertex_has_no_separator() {
        let g = Graph::new(vec![0, 0], vec![]).unwrap();
        let sep = compute_vertex_separator(&g, &Options::default()).unwrap();
        assert_eq!(sep.sepsize, 0);
        assert_eq!(sep.part, vec![0]);
    }
}
