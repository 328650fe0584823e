//! # Multiple Minimum Degree (mmd)
//!
//! Orders the small subgraphs left at the bottom of nested dissection, which have at most
//! [`MMDSWITCH`](crate::defs::MMDSWITCH) vertices or no edges at all. The elimination graph is
//! kept explicitly instead of as SPARSPAK's quotient graph: eliminating a vertex turns its
//! neighborhood into a clique.
//!
//! Like `genmmd`, each round eliminates an independent set of vertices whose degree is within
//! `delta` of the current minimum (multiple elimination), and isolated vertices are numbered
//! first.
//!
//! References:
//! - [A Fast Implementation of the Minimum Degree Algorithm Using Quotient Graphs][MMD intro]
//! - [Modification of the minimum degree algorithm by multiple elimination][MMD modification]
//!
//! [MMD intro]: https://doi.org/10.1145/355900.355906
//! [MMD modification]: https://doi.org/10.1145/214392.214398

use crate::error::Result;
use crate::util::{try_vec, try_with_capacity};

/*************************************************************************
*  genmmd  -- multiple minimum degree
*  Input parameters --
*     (xadj, adjncy) -- the adjacency structure.
*     delta  -- tolerance value for multiple elimination.
*  Output --
*     iperm -- iperm[v] is the (0-based) elimination position of v.
**************************************************************************/
pub(crate) fn genmmd(xadj: &[usize], adjncy: &[usize], delta: usize) -> Result<Vec<usize>> {
    let neqns = xadj.len().saturating_sub(1);
    let mut iperm = try_vec(neqns, 0, "genmmd: iperm")?;
    if neqns == 0 {
        return Ok(iperm);
    }

    /* 'num' counts the number of ordered nodes */
    let mut num = 0;

    /* eliminate all isolated nodes */
    let mut alive = try_vec(neqns, true, "genmmd: alive")?;
    for i in 0..neqns {
        if xadj[i] == xadj[i + 1] {
            iperm[i] = num;
            num += 1;
            alive[i] = false;
        }
    }
    if num == neqns {
        return Ok(iperm);
    }

    let mut adj: Vec<Vec<usize>> = try_with_capacity(neqns, "genmmd: adj")?;
    for i in 0..neqns {
        adj.push(adjncy[xadj[i]..xadj[i + 1]].to_vec());
    }

    /* 'waiting' holds the round in which a node was next to an eliminated node */
    let mut waiting = try_vec(neqns, 0usize, "genmmd: waiting")?;
    let mut marker = try_vec(neqns, 0usize, "genmmd: marker")?;
    let (mut round, mut tag) = (0, 0);
    let mut cands: Vec<usize> = try_with_capacity(neqns, "genmmd: cands")?;

    while num < neqns {
        /* search for nodes of the minimum degree */
        cands.clear();
        cands.extend((0..neqns).filter(|&i| alive[i]));
        cands.sort_unstable_by_key(|&i| (adj[i].len(), i));
        let mdlmt = adj[cands[0]].len() + delta;

        round += 1;
        for &node in &cands {
            if waiting[node] == round {
                continue;
            }
            if adj[node].len() > mdlmt {
                break;
            }

            iperm[node] = num;
            num += 1;
            alive[node] = false;

            /* turn the reachable set of 'node' into a clique */
            let reach = std::mem::take(&mut adj[node]);
            for &rnode in &reach {
                waiting[rnode] = round;

                tag += 1;
                marker[rnode] = tag;
                let mut merged = std::mem::take(&mut adj[rnode]);
                merged.retain(|&k| k != node);
                for &k in &merged {
                    marker[k] = tag;
                }
                for &k in &reach {
                    if marker[k] != tag {
                        marker[k] = tag;
                        merged.push(k);
                    }
                }
                adj[rnode] = merged;
            }
        }
    }

    Ok(iperm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csr(n: usize, edges: &[(usize, usize)]) -> (Vec<usize>, Vec<usize>) {
        let mut adj = vec![Vec::new(); n];
        for &(u, v) in edges {
            adj[u].push(v);
            adj[v].push(u);
        }
        let mut xadj = vec![0];
        let mut adjncy = vec![];
        for a in adj {
            adjncy.extend(a);
            xadj.push(adjncy.len());
        }
        (xadj, adjncy)
    }

    fn assert_permutation(iperm: &[usize]) {
        let mut seen = vec![false; iperm.len()];
        for &p in iperm {
            assert!(!seen[p]);
            seen[p] = true;
        }
    }

    #[test]
    fn star_center_goes_last() {
        let (xadj, adjncy) = csr(6, &[(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]);
        let iperm = genmmd(&xadj, &adjncy, 1).unwrap();
        assert_permutation(&iperm);
        assert_eq!(iperm[0], 5);
    }

    #[test]
    fn isolated_vertices_first() {
        let (xadj, adjncy) = csr(5, &[(1, 2), (2, 3)]);
        let iperm = genmmd(&xadj, &adjncy, 1).unwrap();
        assert_permutation(&iperm);
        assert_eq!(iperm[0], 0);
        assert_eq!(iperm[4], 1);
    }

    #[test]
    fn path_orders_every_vertex() {
        let edges: Vec<_> = (0..29).map(|i| (i, i + 1)).collect();
        let (xadj, adjncy) = csr(30, &edges);
        let iperm = genmmd(&xadj, &adjncy, 1).unwrap();
        assert_permutation(&iperm);
        // the endpoints have the minimum degree
        assert!(iperm[0] < 2 && iperm[29] < 2);
    }
}
