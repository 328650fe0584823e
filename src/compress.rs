/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * compress.c
 *
 * This file contains code for compressing nodes with identical adjacency
 * structure and for prunning dense columns
 *
 * Started 9/17/97
 * George
 */

use crate::defs::COMPRESSION_FRACTION;
use crate::error::Result;
use crate::graph::{Graph, WorkGraph};
use crate::options::{Ctrl, DbgLvl};
use crate::util::{try_vec, try_with_capacity};
use crate::{idx_t, ifset, real_t};

const UNMAPPED: usize = usize::MAX;

/// A graph whose vertices with identical closed neighborhoods have been merged.
///
/// `cind[cptr[i]..cptr[i + 1]]` lists the original vertices of compressed vertex `i`.
pub(crate) struct Compressed {
    pub graph: WorkGraph,
    pub cptr: Vec<usize>,
    pub cind: Vec<usize>,
}

/*************************************************************************/
/* This function compresses a graph by merging identical vertices
    The compression should lead to at least 15% reduction.

    The compressed graph that is generated has its adjwgts set to 1.

    \returns None if the compression was not worth it.
*/
/**************************************************************************/
pub(crate) fn compress_graph(ctrl: &Ctrl, graph: &Graph) -> Result<Option<Compressed>> {
    let nvtxs = graph.vertex_count();
    let xadj = graph.xadj();
    let adjncy = graph.adjncy();
    let adj = |i: usize| xadj[i] as usize..xadj[i + 1] as usize;

    let mut mark = try_vec(nvtxs, UNMAPPED, "CompressGraph: mark")?;
    let mut map = try_vec(nvtxs, UNMAPPED, "CompressGraph: map")?;

    /* Compute a key for each adjacency list */
    let mut keys: Vec<(i64, usize)> = try_with_capacity(nvtxs, "CompressGraph: keys")?;
    for i in 0..nvtxs {
        /* Add the diagonal entry as well */
        let k: i64 = adj(i).map(|j| adjncy[j] as i64).sum::<i64>() + i as i64;
        keys.push((k, i));
    }
    keys.sort_unstable();

    let mut cptr: Vec<usize> = try_with_capacity(nvtxs + 1, "CompressGraph: cptr")?;
    let mut cind: Vec<usize> = try_with_capacity(nvtxs, "CompressGraph: cind")?;
    cptr.push(0);
    let mut cnvtxs = 0;
    for i in 0..nvtxs {
        let (key, ii) = keys[i];
        if map[ii] != UNMAPPED {
            continue;
        }

        mark[ii] = i;
        for j in adj(ii) {
            mark[adjncy[j] as usize] = i;
        }

        map[ii] = cnvtxs;
        cind.push(ii);

        for &(jkey, iii) in &keys[i + 1..] {
            /* Break if keys or degrees are different */
            if key != jkey || graph.degree(ii) != graph.degree(iii) {
                break;
            }

            /* Do a comparison if iii has not been mapped */
            if map[iii] == UNMAPPED && adj(iii).all(|jj| mark[adjncy[jj] as usize] == i) {
                /* Identical adjacency structure */
                map[iii] = cnvtxs;
                cind.push(iii);
            }
        }

        cnvtxs += 1;
        cptr.push(cind.len());
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::INFO,
        log::info!("  Compression: reduction in # of vertices: {}.", nvtxs - cnvtxs)
    );

    if cnvtxs as real_t >= COMPRESSION_FRACTION * nvtxs as real_t {
        return Ok(None);
    }

    /* Sufficient compression is possible, so go ahead and create the
    compressed graph */
    let cnedges: usize = (0..cnvtxs).map(|i| graph.degree(cind[cptr[i]])).sum();
    let mut cgraph = WorkGraph::with_capacity(cnvtxs, cnedges, 1)?;
    cgraph.xadj.push(0);

    /* Now go and compress the graph */
    mark.fill(UNMAPPED);
    for i in 0..cnvtxs {
        /* Remove any diagonal entries in the compressed graph */
        mark[i] = i;
        let mut cvwgt: idx_t = 0;
        for &ii in &cind[cptr[i]..cptr[i + 1]] {
            /* accumulate the vertex weights of the constituent vertices */
            cvwgt += graph.vertex_weight(ii, 0);

            /* generate the combined adjacency list */
            for jj in adj(ii) {
                let k = map[adjncy[jj] as usize];
                if mark[k] != i {
                    mark[k] = i;
                    cgraph.adjncy.push(k);
                }
            }
        }
        cgraph.vwgt.push(cvwgt);
        cgraph.xadj.push(cgraph.adjncy.len());
    }

    cgraph.nvtxs = cnvtxs;
    cgraph.nedges = cgraph.adjncy.len();
    cgraph.adjwgt.resize(cgraph.nedges, 1);
    cgraph.setup_tvwgt();
    cgraph.setup_label();

    Ok(Some(Compressed {
        graph: cgraph,
        cptr,
        cind,
    }))
}

/*************************************************************************/
/* This function prunes all the vertices in a graph with degree greater
    than factor*average.

    \returns the pruned graph and iperm, where the kept vertices come first
    (in their original order) and the pruned ones fill the tail, or None if
    nothing (or everything) would be pruned.
*/
/*************************************************************************/
pub(crate) fn prune_graph(ctrl: &Ctrl, graph: &Graph, factor: real_t) -> Result<Option<(WorkGraph, Vec<usize>)>> {
    let nvtxs = graph.vertex_count();
    let xadj = graph.xadj();
    let adjncy = graph.adjncy();

    let mut perm = try_vec(nvtxs, 0, "PruneGraph: perm")?;
    let mut iperm = try_vec(nvtxs, 0, "PruneGraph: iperm")?;

    let factor = factor * xadj[nvtxs] as real_t / nvtxs.max(1) as real_t;

    let (mut pnvtxs, mut pnedges, mut nlarge) = (0, 0, 0);
    for i in 0..nvtxs {
        if (graph.degree(i) as real_t) < factor {
            perm[i] = pnvtxs;
            iperm[pnvtxs] = i;
            pnvtxs += 1;
            pnedges += graph.degree(i);
        } else {
            nlarge += 1;
            perm[i] = nvtxs - nlarge;
            iperm[nvtxs - nlarge] = i;
        }
    }

    ifset!(
        ctrl.dbglvl,
        DbgLvl::INFO,
        log::info!("  Pruned {} of {} vertices.", nlarge, nvtxs)
    );

    if nlarge == 0 {
        return Ok(None);
    }
    if nlarge == nvtxs {
        ifset!(
            ctrl.dbglvl,
            DbgLvl::INFO,
            log::info!("  Pruning is ignored as it removes all vertices.")
        );
        return Ok(None);
    }

    /* Pruning is possible, so go ahead and create the pruned graph */
    let mut pgraph = WorkGraph::with_capacity(pnvtxs, pnedges, 1)?;
    pgraph.xadj.push(0);
    for i in 0..nvtxs {
        if perm[i] >= pnvtxs {
            continue;
        }
        pgraph.vwgt.push(graph.vertex_weight(i, 0));
        for j in xadj[i] as usize..xadj[i + 1] as usize {
            let k = perm[adjncy[j] as usize];
            if k < pnvtxs {
                pgraph.adjncy.push(k);
            }
        }
        pgraph.xadj.push(pgraph.adjncy.len());
    }

    pgraph.nvtxs = pnvtxs;
    pgraph.nedges = pgraph.adjncy.len();
    pgraph.adjwgt.resize(pgraph.nedges, 1);
    pgraph.setup_tvwgt();
    pgraph.setup_label();

    Ok(Some((pgraph, iperm)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Optype, Options};

    fn ctrl() -> Ctrl {
        Ctrl::new(Optype::Ometis, &Options::default(), 1, 3).unwrap()
    }

    #[test]
    fn compresses_a_clique_with_twins() {
        // K4 plus a pendant vertex 4 hanging off 0: 1, 2, 3 have identical
        // closed neighborhoods
        let g = Graph::new(
            vec![0, 4, 7, 10, 13, 14],
            vec![1, 2, 3, 4, 0, 2, 3, 0, 1, 3, 0, 1, 2, 0],
        )
        .unwrap();
        let c = compress_graph(&ctrl(), &g).unwrap().unwrap();
        assert_eq!(c.graph.nvtxs, 3);
        assert_eq!(c.cptr.len(), 4);
        assert_eq!(c.cind.len(), 5);
        assert_eq!(c.graph.tvwgt[0], 5);
        assert!(c.graph.vwgt.contains(&3));
        // no self loops survive
        for i in 0..c.graph.nvtxs {
            assert!(c.graph.adj(i).all(|j| c.graph.adjncy[j] != i));
        }
    }

    #[test]
    fn skips_useless_compression() {
        let g = crate::tests::grid_graph(4, 4);
        assert!(compress_graph(&ctrl(), &g).unwrap().is_none());
    }

    #[test]
    fn prunes_the_hub_of_a_star() {
        let mut xadj = vec![0, 8];
        let mut adjncy: Vec<idx_t> = (1..9).collect();
        for _ in 1..9 {
            adjncy.push(0);
            xadj.push(adjncy.len() as idx_t);
        }
        let g = Graph::new(xadj, adjncy).unwrap();
        let (pg, iperm) = prune_graph(&ctrl(), &g, 2.0).unwrap().unwrap();
        assert_eq!(pg.nvtxs, 8);
        assert_eq!(pg.nedges, 0);
        assert_eq!(iperm[8], 0);
        assert_eq!(&iperm[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
