/*
\file
\brief Functions for computing matchings during graph coarsening

\date Started 7/23/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

/*
 * The hierarchy is a Vec of graphs: level 0 is the graph handed in, every level but the
 * last carries a cmap into the next one.
 */

use crate::bucketsort::bucket_sort_keys_inc;
use crate::defs::*;
use crate::error::Result;
use crate::graph::WorkGraph;
use crate::options::{Ctrl, Ctype, DbgLvl};
use crate::timing::Timer;
use crate::util::{self, try_vec, try_with_capacity};
use crate::{idx_t, ifset, real_t};

const UNMATCHED: usize = usize::MAX;

/*************************************************************************/
/* This function takes a graph and creates a sequence of coarser graphs.
   It implements the coarsening phase of the multilevel paradigm.
*/
/*************************************************************************/
pub(crate) fn coarsen_graph(ctrl: &mut Ctrl, graph: WorkGraph) -> Result<Vec<WorkGraph>> {
    coarsen_graph_nlevels(ctrl, graph, usize::MAX)
}

/*************************************************************************/
/* This function takes a graph and creates a sequence of at most nlevels
   coarser graphs.
*/
/*************************************************************************/
pub(crate) fn coarsen_graph_nlevels(ctrl: &mut Ctrl, graph: WorkGraph, nlevels: usize) -> Result<Vec<WorkGraph>> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Coarsen));

    /* determine if the weights on the edges are all the same */
    let mut eqewgts = graph.equal_edge_weights();

    /* set the maximum allowed coarsest vertex weight */
    let coarsen_to = ctrl.coarsen_to.max(1);
    ctrl.maxvwgt = graph
        .tvwgt
        .iter()
        .map(|&t| ((3 * t as i64) / (2 * coarsen_to as i64)).max(1) as idx_t)
        .collect();

    let mut levels = vec![graph];
    loop {
        let nlevel = levels.len();
        let graph = &mut levels[nlevel - 1];
        if graph.nvtxs <= coarsen_to || graph.nvtxs == 0 || nlevel > nlevels {
            break;
        }
        ifset!(ctrl.dbglvl, DbgLvl::COARSEN, print_cgraph_stats(ctrl, graph));

        /* determine which matching scheme you will use */
        let cgraph = match ctrl.ctype {
            Ctype::Rm => match_rm(ctrl, graph)?,
            Ctype::Shem => {
                if eqewgts || graph.nedges == 0 {
                    match_rm(ctrl, graph)?
                } else {
                    match_shem(ctrl, graph)?
                }
            }
        };
        eqewgts = false;

        let finer = graph.nvtxs;
        let done = !((cgraph.nvtxs as real_t) < COARSEN_FRACTION * finer as real_t
            && cgraph.nedges > cgraph.nvtxs / 2);
        levels.push(cgraph);
        if done {
            break;
        }
    }

    if let Some(coarsest) = levels.last() {
        ifset!(ctrl.dbglvl, DbgLvl::COARSEN, print_cgraph_stats(ctrl, coarsest));
    }
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Coarsen));

    Ok(levels)
}

/// Computes the vertex visiting order for matching: a random permutation bucket
/// sorted by (a compressed form of) the vertex degree, low degrees first.
fn matching_order(ctrl: &mut Ctrl, graph: &WorkGraph) -> Result<Vec<usize>> {
    let nvtxs = graph.nvtxs;
    let mut tperm = try_vec(nvtxs, 0usize, "Match: tperm")?;
    let mut perm = try_vec(nvtxs, 0usize, "Match: perm")?;
    util::rand_array_permute(&mut ctrl.rng, &mut tperm, nvtxs / 8, true);

    let avgdegree = 4 * (graph.nedges / nvtxs.max(1));
    let degrees: Vec<usize> = (0..nvtxs)
        .map(|i| {
            let bnum = ((1 + graph.degree(i)) as f64).sqrt() as usize;
            bnum.min(avgdegree)
        })
        .collect();
    bucket_sort_keys_inc(avgdegree, &degrees, &tperm, &mut perm);
    Ok(perm)
}

/*************************************************************************/
/* This function finds a matching by randomly selecting one of the
    unmatched adjacent vertices.
 */
/**************************************************************************/
pub(crate) fn match_rm(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<WorkGraph> {
    match_with(ctrl, graph, |graph, i, match_, maxvwgt| {
        let vwgt = &graph.vwgt;
        graph
            .adj(i)
            .map(|j| graph.adjncy[j])
            .find(|&k| match_[k] == UNMATCHED && vwgt[i] + vwgt[k] <= maxvwgt)
    })
}

/**************************************************************************/
/* This function finds a matching using the HEM heuristic. The vertices
    are visited based on increasing degree to ensure that all vertices are
    given a chance to match with something.
 */
/**************************************************************************/
pub(crate) fn match_shem(ctrl: &mut Ctrl, graph: &mut WorkGraph) -> Result<WorkGraph> {
    match_with(ctrl, graph, |graph, i, match_, maxvwgt| {
        let vwgt = &graph.vwgt;
        let mut best: Option<(idx_t, usize)> = None;
        for j in graph.adj(i) {
            let k = graph.adjncy[j];
            if match_[k] != UNMATCHED || vwgt[i] + vwgt[k] > maxvwgt {
                continue;
            }
            let w = graph.adjwgt[j];
            best = match best {
                Some((bw, bk)) if bw > w || (bw == w && bk < k) => Some((bw, bk)),
                _ => Some((w, k)),
            };
        }
        best.map(|(_, k)| k)
    })
}

/// The matching loop shared by RM and SHEM; `pick` chooses the partner of a
/// non-island vertex among its unmatched neighbors.
fn match_with<F>(ctrl: &mut Ctrl, graph: &mut WorkGraph, pick: F) -> Result<WorkGraph>
where
    F: Fn(&WorkGraph, usize, &[usize], idx_t) -> Option<usize>,
{
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Match));

    let nvtxs = graph.nvtxs;
    let maxvwgt = ctrl.maxvwgt[0];
    let mut match_ = try_vec(nvtxs, UNMATCHED, "Match: match")?;
    let perm = matching_order(ctrl, graph)?;

    let mut nunmatched = 0;
    let mut last_unmatched = 0;
    for pi in 0..nvtxs {
        let i = perm[pi];
        if match_[i] != UNMATCHED {
            continue;
        }

        let mut maxidx = Some(i);
        if graph.vwgt[i] < maxvwgt {
            if graph.xadj[i] == graph.xadj[i + 1] {
                /* Deal with island vertices. Find a non-island and match it with.
                The matching ignores ctrl.maxvwgt requirements */
                last_unmatched = last_unmatched.max(pi) + 1;
                while last_unmatched < nvtxs {
                    let j = perm[last_unmatched];
                    if match_[j] == UNMATCHED {
                        maxidx = Some(j);
                        break;
                    }
                    last_unmatched += 1;
                }
            } else if let Some(k) = pick(graph, i, &match_, maxvwgt) {
                maxidx = Some(k);
            } else if 3 * graph.vwgt[i] < maxvwgt {
                /* If it did not match, record for a 2-hop matching. */
                nunmatched += 1;
                maxidx = None;
            }
        }

        if let Some(k) = maxidx {
            match_[i] = k;
            match_[k] = i;
        }
    }

    /* see if a 2-hop matching is required/allowed */
    if !ctrl.no2hop && nunmatched as real_t > UNMATCHEDFOR2HOP * nvtxs as real_t {
        match_2hop(graph, &perm, &mut match_, nunmatched)?;
    }

    /* match the final unmatched vertices with themselves and reorder the vertices
    of the coarse graph for memory-friendly contraction */
    let mut cmap = try_vec(nvtxs, 0usize, "Match: cmap")?;
    let mut cnvtxs = 0;
    for i in 0..nvtxs {
        if match_[i] == UNMATCHED {
            match_[i] = i;
            cmap[i] = cnvtxs;
            cnvtxs += 1;
        } else if i <= match_[i] {
            cmap[i] = cnvtxs;
            cmap[match_[i]] = cnvtxs;
            cnvtxs += 1;
        }
    }
    graph.cmap = cmap;

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Match));

    create_coarse_graph(ctrl, graph, cnvtxs, &match_)
}

/*************************************************************************/
/* This function matches the unmatched vertices using a 2-hop matching
    that involves vertices that are two hops away from each other.
 */
/**************************************************************************/
fn match_2hop(
    graph: &WorkGraph,
    perm: &[usize],
    match_: &mut [usize],
    mut nunmatched: usize,
) -> Result<()> {
    let nvtxs = graph.nvtxs as real_t;

    nunmatched = match_2hop_any(graph, perm, match_, nunmatched, 2)?;
    nunmatched = match_2hop_all(graph, perm, match_, nunmatched, 64);
    if nunmatched as real_t > 1.5 * UNMATCHEDFOR2HOP * nvtxs {
        nunmatched = match_2hop_any(graph, perm, match_, nunmatched, 3)?;
    }
    if nunmatched as real_t > 2.0 * UNMATCHEDFOR2HOP * nvtxs {
        match_2hop_any(graph, perm, match_, nunmatched, graph.nvtxs)?;
    }
    Ok(())
}

/*************************************************************************/
/* This function matches pairs of unmatched vertices that share a neighbor.
    Only vertices of degree below maxdegree take part.
 */
/**************************************************************************/
fn match_2hop_any(
    graph: &WorkGraph,
    perm: &[usize],
    match_: &mut [usize],
    mut nunmatched: usize,
    maxdegree: usize,
) -> Result<usize> {
    let nvtxs = graph.nvtxs;

    /* create the inverted index */
    let mut colptr = try_vec(nvtxs + 1, 0usize, "Match_2HopAny: colptr")?;
    for i in 0..nvtxs {
        if match_[i] == UNMATCHED && graph.degree(i) < maxdegree {
            for j in graph.adj(i) {
                colptr[graph.adjncy[j]] += 1;
            }
        }
    }
    util::make_csr(nvtxs, &mut colptr);

    let mut rowind = try_vec(colptr[nvtxs], 0usize, "Match_2HopAny: rowind")?;
    for &i in perm {
        if match_[i] == UNMATCHED && graph.degree(i) < maxdegree {
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                rowind[colptr[k]] = i;
                colptr[k] += 1;
            }
        }
    }
    util::shift_csr(nvtxs, &mut colptr);

    /* compute matchings by going down the inverted index */
    for &i in perm {
        if colptr[i + 1] - colptr[i] < 2 {
            continue;
        }

        let mut jj = colptr[i + 1];
        let mut j = colptr[i];
        while j < jj {
            if match_[rowind[j]] == UNMATCHED {
                jj -= 1;
                while jj > j {
                    if match_[rowind[jj]] == UNMATCHED {
                        match_[rowind[j]] = rowind[jj];
                        match_[rowind[jj]] = rowind[j];
                        nunmatched -= 2;
                        break;
                    }
                    jj -= 1;
                }
            }
            j += 1;
        }
    }

    Ok(nunmatched)
}

/*************************************************************************/
/* This function matches pairs of unmatched vertices whose adjacency lists
    are identical. Only vertices of degree below maxdegree take part.
 */
/**************************************************************************/
fn match_2hop_all(
    graph: &WorkGraph,
    perm: &[usize],
    match_: &mut [usize],
    mut nunmatched: usize,
    maxdegree: usize,
) -> usize {
    let mask = (i64::MAX as u64 / maxdegree as u64) as usize;

    /* key each candidate by a hash of its adjacency list and its degree */
    let mut keys: Vec<(u64, usize)> = Vec::with_capacity(nunmatched);
    for &i in perm {
        let idegree = graph.degree(i);
        if match_[i] == UNMATCHED && idegree > 1 && idegree < maxdegree {
            let k = graph
                .adj(i)
                .fold(0usize, |acc, j| acc.wrapping_add(graph.adjncy[j] % mask));
            keys.push((((k % mask) * maxdegree + idegree) as u64, i));
        }
    }
    keys.sort_unstable();

    let mut mark = vec![UNMATCHED; graph.nvtxs];
    for pi in 0..keys.len() {
        let i = keys[pi].1;
        if match_[i] != UNMATCHED {
            continue;
        }

        for j in graph.adj(i) {
            mark[graph.adjncy[j]] = i;
        }

        for pk in pi + 1..keys.len() {
            let k = keys[pk].1;
            if match_[k] != UNMATCHED {
                continue;
            }
            if keys[pi].0 != keys[pk].0 || graph.degree(i) != graph.degree(k) {
                break;
            }

            if graph.adj(k).all(|jj| mark[graph.adjncy[jj]] == i) {
                match_[i] = k;
                match_[k] = i;
                nunmatched -= 2;
                break;
            }
        }
    }

    nunmatched
}

/*************************************************************************/
/* This function prints various stats for each graph during coarsening
 */
/*************************************************************************/
fn print_cgraph_stats(ctrl: &Ctrl, graph: &WorkGraph) {
    log::debug!(
        "{:10} {:10} {:10} [{}] [ {:?}:{:?} ]",
        graph.nvtxs,
        graph.nedges,
        graph.adjwgt.iter().map(|&w| w as i64).sum::<i64>(),
        ctrl.coarsen_to,
        ctrl.maxvwgt,
        graph.tvwgt
    );
}

/*************************************************************************/
/* This function creates the coarser graph. Depending on the size of the
   candidate adjancency lists it either uses a hash table or an array
   to do duplicate detection.
*/
/*************************************************************************/
pub(crate) fn create_coarse_graph(
    ctrl: &mut Ctrl,
    graph: &WorkGraph,
    cnvtxs: usize,
    match_: &[usize],
) -> Result<WorkGraph> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Contract));

    let nvtxs = graph.nvtxs;
    let ncon = graph.ncon;
    let cmap = &graph.cmap;
    let mask = HTLENGTH;

    let mut cxadj: Vec<usize> = try_with_capacity(cnvtxs + 1, "CreateCoarseGraph: xadj")?;
    let mut cvwgt: Vec<idx_t> = try_with_capacity(cnvtxs * ncon, "CreateCoarseGraph: vwgt")?;
    let mut cadjncy: Vec<usize> = try_with_capacity(graph.nedges, "CreateCoarseGraph: adjncy")?;
    let mut cadjwgt: Vec<idx_t> = try_with_capacity(graph.nedges, "CreateCoarseGraph: adjwgt")?;

    let mut htable = vec![UNMATCHED; mask + 1]; /* hash table */
    let mut dtable = try_vec(cnvtxs, UNMATCHED, "CreateCoarseGraph: dtable")?; /* direct table */

    cxadj.push(0);
    let mut cv = 0;
    for v in 0..nvtxs {
        let u = match_[v];
        if u < v {
            continue;
        }
        debug_assert_eq!(cmap[v], cv);
        debug_assert_eq!(cmap[u], cv);

        /* take care of the vertices */
        for c in 0..ncon {
            let mut w = graph.vwgt[v * ncon + c];
            if u != v {
                w += graph.vwgt[u * ncon + c];
            }
            cvwgt.push(w);
        }

        /* take care of the edges */
        let start = cadjncy.len();
        let members: &[usize] = if u != v { &[v, u] } else { &[v] };
        if graph.degree(v) + graph.degree(u) < (mask >> 2) {
            /* small adjacency: hash on the coarse id with linear probing */
            for &x in members {
                for j in graph.adj(x) {
                    let k = cmap[graph.adjncy[j]];
                    if k == cv {
                        continue;
                    }
                    let mut kk = k & mask;
                    loop {
                        let m = htable[kk];
                        if m == UNMATCHED {
                            htable[kk] = cadjncy.len();
                            cadjncy.push(k);
                            cadjwgt.push(graph.adjwgt[j]);
                            break;
                        } else if cadjncy[m] == k {
                            cadjwgt[m] += graph.adjwgt[j];
                            break;
                        }
                        kk = (kk + 1) & mask;
                    }
                }
            }
            /* reset the htable */
            for &k in &cadjncy[start..] {
                let mut kk = k & mask;
                while htable[kk] == UNMATCHED || cadjncy[htable[kk]] != k {
                    kk = (kk + 1) & mask;
                }
                htable[kk] = UNMATCHED;
            }
        } else {
            for &x in members {
                for j in graph.adj(x) {
                    let k = cmap[graph.adjncy[j]];
                    if k == cv {
                        continue;
                    }
                    let m = dtable[k];
                    if m == UNMATCHED {
                        dtable[k] = cadjncy.len();
                        cadjncy.push(k);
                        cadjwgt.push(graph.adjwgt[j]);
                    } else {
                        cadjwgt[m] += graph.adjwgt[j];
                    }
                }
            }
            for &k in &cadjncy[start..] {
                dtable[k] = UNMATCHED;
            }
        }

        cxadj.push(cadjncy.len());
        cv += 1;
    }
    debug_assert_eq!(cv, cnvtxs);

    let cgraph = WorkGraph::from_csr(cxadj, cadjncy, cvwgt, cadjwgt, ncon);

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Contract));

    Ok(cgraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Optype, Options};
    use crate::tests::grid_graph;

    fn ctrl(ctype: Ctype) -> Ctrl {
        let opts = Options {
            ctype,
            ..Options::default()
        };
        let mut ctrl = Ctrl::new(Optype::Pmetis, &opts, 1, 2).unwrap();
        ctrl.coarsen_to = 10;
        ctrl
    }

    fn check_level(fine: &WorkGraph, coarse: &WorkGraph) {
        assert_eq!(fine.cmap.len(), fine.nvtxs);
        assert!(fine.cmap.iter().all(|&c| c < coarse.nvtxs));
        assert_eq!(coarse.tvwgt, fine.tvwgt);
        assert_eq!(coarse.vwgt.iter().sum::<idx_t>(), fine.vwgt.iter().sum::<idx_t>());

        // the weight of the cut between coarse groups is preserved
        let crossing: idx_t = (0..fine.nvtxs)
            .flat_map(|i| fine.adj(i).map(move |j| (i, j)))
            .filter(|&(i, j)| fine.cmap[i] != fine.cmap[fine.adjncy[j]])
            .map(|(_, j)| fine.adjwgt[j])
            .sum();
        assert_eq!(coarse.adjwgt.iter().sum::<idx_t>(), crossing);

        for v in 0..coarse.nvtxs {
            let nbrs: Vec<usize> = coarse.adj(v).map(|j| coarse.adjncy[j]).collect();
            assert!(!nbrs.contains(&v), "self loop on coarse vertex {v}");
            let mut dedup = nbrs.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), nbrs.len(), "parallel edges on coarse vertex {v}");
        }
    }

    #[test]
    fn coarsen_grid_rm_and_shem() {
        for ctype in [Ctype::Rm, Ctype::Shem] {
            let mut ctrl = ctrl(ctype);
            let graph = WorkGraph::from_graph(&grid_graph(12, 12)).unwrap();
            let levels = coarsen_graph(&mut ctrl, graph).unwrap();
            assert!(levels.len() > 2);
            for w in levels.windows(2) {
                check_level(&w[0], &w[1]);
                assert!(w[1].nvtxs < w[0].nvtxs);
            }
        }
    }

    #[test]
    fn shem_prefers_heavy_edges() {
        // 4-cycle whose edges 0-1 and 2-3 are heavy
        let g = crate::Graph::with_weights(
            vec![0, 2, 4, 6, 8],
            vec![1, 3, 0, 2, 1, 3, 2, 0],
            None,
            Some(vec![5, 1, 5, 1, 1, 5, 5, 1]),
            1,
        )
        .unwrap();
        let mut ctrl = ctrl(Ctype::Shem);
        ctrl.maxvwgt = vec![4];
        ctrl.no2hop = true;
        let mut graph = WorkGraph::from_graph(&g).unwrap();
        let cgraph = match_shem(&mut ctrl, &mut graph).unwrap();
        assert_eq!(graph.cmap[0], graph.cmap[1]);
        assert_eq!(graph.cmap[2], graph.cmap[3]);
        assert_eq!(cgraph.nvtxs, 2);
        assert_eq!(cgraph.adjwgt, [2, 2]);
    }

    #[test]
    fn islands_pair_up() {
        let g = crate::Graph::new(vec![0; 8], vec![]).unwrap();
        let mut ctrl = ctrl(Ctype::Rm);
        ctrl.maxvwgt = vec![10];
        let mut graph = WorkGraph::from_graph(&g).unwrap();
        let cgraph = match_rm(&mut ctrl, &mut graph).unwrap();
        assert_eq!(cgraph.nvtxs, 4);
        assert_eq!(cgraph.nedges, 0);
    }
}
