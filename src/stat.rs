/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * stat.c
 *
 * This file computes various statistics
 *
 * Started 7/25/97
 * George
 *
 * $Id: stat.c 17513 2014-08-05 16:20:50Z dominique $
 *
 */

use std::collections::VecDeque;
use std::fmt;

use crate::error::{ensure_input, Result};
use crate::graph::Graph;
use crate::util::{iargmax, try_vec};
use crate::{idx_t, real_t};

/// Checks that `part` holds a non-negative part id for every vertex and
/// returns the number of parts it uses (largest id + 1).
fn check_part(graph: &Graph, part: &[idx_t]) -> Result<usize> {
    ensure_input!(
        part.len() == graph.vertex_count(),
        "partition vector has {} entries for {} vertices",
        part.len(),
        graph.vertex_count()
    );
    ensure_input!(part.iter().all(|&p| p >= 0), "part ids must not be negative");
    Ok(part.iter().max().map_or(0, |&p| p as usize + 1))
}

/// Weight of edge `j` of the adjacency array
#[inline]
fn edge_weight(graph: &Graph, j: usize) -> idx_t {
    graph.adjwgt().map_or(1, |a| a[j])
}

/*************************************************************************
* This function computes the edgecut of a partitioning: the total weight
* of the edges whose endpoints are in different parts.
**************************************************************************/
pub fn compute_cut(graph: &Graph, part: &[idx_t]) -> Result<idx_t> {
    check_part(graph, part)?;
    let xadj = graph.xadj();
    let adjncy = graph.adjncy();

    let mut cut = 0;
    for i in 0..graph.vertex_count() {
        for j in xadj[i] as usize..xadj[i + 1] as usize {
            if part[i] != part[adjncy[j] as usize] {
                cut += edge_weight(graph, j);
            }
        }
    }
    Ok(cut / 2)
}

/*************************************************************************
* This function computes the total communication volume: every vertex
* counts once for each foreign part among its neighbors.
**************************************************************************/
pub fn compute_volume(graph: &Graph, part: &[idx_t]) -> Result<idx_t> {
    let nparts = check_part(graph, part)?;
    let mut marker = try_vec(nparts, usize::MAX, "ComputeVolume: marker")?;

    let mut totalv = 0;
    for i in 0..graph.vertex_count() {
        marker[part[i] as usize] = i;
        for &k in graph.neighbors(i) {
            let other = part[k as usize] as usize;
            if marker[other] != i {
                marker[other] = i;
                totalv += 1;
            }
        }
    }
    Ok(totalv)
}

/// Summary of the part weights of a partitioning
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionBalance {
    pub min: idx_t,
    pub max: idx_t,
    pub avg: real_t,
    /// `nparts * max / total`, 1.0 for a perfect balance
    pub imbalance: real_t,
}

/*************************************************************************
* This function computes the balance of the partitioning
**************************************************************************/
pub fn partition_balance(graph: &Graph, part: &[idx_t], nparts: usize) -> Result<PartitionBalance> {
    let used = check_part(graph, part)?;
    ensure_input!(nparts >= 1 && used <= nparts, "part ids must lie in 0..{nparts}");

    let pwgts = part_weights(graph, part, nparts)?;
    Ok(balance_of(&pwgts))
}

fn balance_of(pwgts: &[idx_t]) -> PartitionBalance {
    let nparts = pwgts.len();
    let total: i64 = pwgts.iter().map(|&w| w as i64).sum();
    let max = pwgts.iter().copied().max().unwrap_or(0);
    PartitionBalance {
        min: pwgts.iter().copied().min().unwrap_or(0),
        max,
        avg: total as real_t / nparts.max(1) as real_t,
        imbalance: if total > 0 {
            nparts as real_t * max as real_t / total as real_t
        } else {
            1.0
        },
    }
}

/// Total weight of every part, first constraint only
fn part_weights(graph: &Graph, part: &[idx_t], nparts: usize) -> Result<Vec<idx_t>> {
    let mut pwgts = try_vec(nparts, 0 as idx_t, "ComputePartitionBalance: kpwgts")?;
    for (i, &p) in part.iter().enumerate() {
        pwgts[p as usize] += graph.vertex_weight(i, 0);
    }
    Ok(pwgts)
}

/// The statistics `gpmetis` reports after partitioning a graph
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionInfo {
    pub nparts: usize,
    pub edgecut: idx_t,
    pub volume: idx_t,
    pub pwgts: Vec<idx_t>,
    pub balance: PartitionBalance,
    /// largest `pwgt / (tpwgt * total)` over the parts and the part attaining it
    pub max_overweight: (usize, real_t),
    /// the balance the heaviest vertex alone forces, `nparts * max vwgt / total`
    pub vertex_bound: real_t,
    /// min, max and average number of adjacent parts
    pub connectivity: (usize, usize, real_t),
    /// connected components left after removing the cut edges
    pub ncomponents: usize,
}

impl PartitionInfo {
    /*************************************************************************
    * This function computes cuts and balance information
    **************************************************************************/
    pub fn compute(graph: &Graph, part: &[idx_t], nparts: usize, tpwgts: Option<&[real_t]>) -> Result<Self> {
        let used = check_part(graph, part)?;
        ensure_input!(nparts >= 1 && used <= nparts, "part ids must lie in 0..{nparts}");
        if let Some(tpwgts) = tpwgts {
            ensure_input!(tpwgts.len() >= nparts, "tpwgts has fewer than {nparts} entries");
        }

        let nvtxs = graph.vertex_count();
        let pwgts = part_weights(graph, part, nparts)?;
        let balance = balance_of(&pwgts);
        let total = pwgts.iter().map(|&w| w as real_t).sum::<real_t>().max(1.0);

        /* Report on balance */
        let target = |p: usize| tpwgts.map_or(1.0 / nparts as real_t, |t| t[p]);
        let ratios: Vec<real_t> = (0..nparts)
            .map(|p| {
                let desired = target(p) * total;
                if desired > 0.0 {
                    pwgts[p] as real_t / desired
                } else if pwgts[p] > 0 {
                    real_t::INFINITY
                } else {
                    0.0
                }
            })
            .collect();
        let k = iargmax(&ratios);
        let maxvwgt = (0..nvtxs).map(|i| graph.vertex_weight(i, 0)).max().unwrap_or(0);

        /* Compute subdomain adjacency information */
        let mut pdom = try_vec(nparts * nparts, false, "ComputePartitionInfo: pdom")?;
        for i in 0..nvtxs {
            let me = part[i] as usize;
            for &nbr in graph.neighbors(i) {
                let other = part[nbr as usize] as usize;
                if other != me {
                    pdom[me * nparts + other] = true;
                }
            }
        }
        let ndoms: Vec<usize> = pdom
            .chunks(nparts)
            .map(|row| row.iter().filter(|&&b| b).count())
            .collect();
        let connectivity = (
            ndoms.iter().copied().min().unwrap_or(0),
            ndoms.iter().copied().max().unwrap_or(0),
            ndoms.iter().sum::<usize>() as real_t / nparts as real_t,
        );

        Ok(PartitionInfo {
            nparts,
            edgecut: compute_cut(graph, part)?,
            volume: compute_volume(graph, part)?,
            balance,
            max_overweight: (k, ratios[k]),
            vertex_bound: nparts as real_t * maxvwgt as real_t / total,
            connectivity,
            ncomponents: count_components(graph, Some(part))?,
            pwgts,
        })
    }

    /// True when every non-empty part is connected
    pub fn is_contiguous(&self) -> bool {
        self.ncomponents <= self.pwgts.iter().filter(|&&w| w > 0).count()
    }
}

impl fmt::Display for PartitionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            " - Edgecut: {}, communication volume: {}.\n",
            self.edgecut, self.volume
        )?;
        writeln!(f, " - Balance:")?;
        writeln!(
            f,
            "     constraint #0:  {:5.3} out of {:5.3}\n",
            self.max_overweight.1, self.vertex_bound
        )?;
        let (pid, ratio) = self.max_overweight;
        writeln!(
            f,
            " - Most overweight partition:\n     pid: {}, actual: {}, ratio: {:.2}.\n",
            pid, self.pwgts[pid], ratio
        )?;
        let (min, max, avg) = self.connectivity;
        writeln!(
            f,
            " - Subdomain connectivity: max: {max}, min: {min}, avg: {avg:.2}\n"
        )?;
        if self.is_contiguous() {
            write!(f, " - Each partition is contiguous.")
        } else {
            write!(
                f,
                " - {} components remain after removing the cut edges.",
                self.ncomponents
            )
        }
    }
}

/*************************************************************************/
/* Counts the connected components of the graph. With `part` only edges
   whose endpoints share a part are followed, which gives the components
   the partitioning induces.
*/
/*************************************************************************/
pub(crate) fn count_components(graph: &Graph, part: Option<&[idx_t]>) -> Result<usize> {
    let nvtxs = graph.vertex_count();
    let mut touched = try_vec(nvtxs, false, "FindPartitionInducedComponents: touched")?;
    let mut queue = VecDeque::new();

    let mut ncmps = 0;
    for root in 0..nvtxs {
        if touched[root] {
            continue;
        }
        ncmps += 1;
        touched[root] = true;
        queue.push_back(root);
        while let Some(i) = queue.pop_front() {
            for &k in graph.neighbors(i) {
                let k = k as usize;
                if !touched[k] && part.map_or(true, |p| p[k] == p[i]) {
                    touched[k] = true;
                    queue.push_back(k);
                }
            }
        }
    }
    Ok(ncmps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::grid_graph;

    #[test]
    fn cut_and_volume_of_a_striped_grid() {
        let g = grid_graph(4, 4);
        let part: Vec<idx_t> = (0..16).map(|v| (v % 4 >= 2) as idx_t).collect();
        assert_eq!(compute_cut(&g, &part).unwrap(), 4);
        assert_eq!(compute_volume(&g, &part).unwrap(), 8);
    }

    #[test]
    fn weighted_cut() {
        let g = Graph::with_weights(vec![0, 1, 3, 4], vec![1, 0, 2, 1], None, Some(vec![5, 5, 2, 2]), 1).unwrap();
        assert_eq!(compute_cut(&g, &[0, 0, 1]).unwrap(), 2);
        assert_eq!(compute_cut(&g, &[0, 1, 1]).unwrap(), 5);
        assert!(compute_cut(&g, &[0, 1]).is_err());
        assert!(compute_cut(&g, &[0, -1, 1]).is_err());
    }

    #[test]
    fn balance_figures() {
        let g = grid_graph(3, 3);
        let part = [0, 0, 0, 0, 0, 1, 1, 1, 1];
        let b = partition_balance(&g, &part, 2).unwrap();
        assert_eq!((b.min, b.max), (4, 5));
        assert!((b.avg - 4.5).abs() < 1e-6);
        assert!((b.imbalance - 10.0 / 9.0).abs() < 1e-5);
        assert!(partition_balance(&g, &part, 1).is_err());
    }

    #[test]
    fn info_reports_components_and_connectivity() {
        let g = grid_graph(4, 1);
        // part 0 is split in two by part 1
        let part = [0, 1, 0, 0];
        let info = PartitionInfo::compute(&g, &part, 2, None).unwrap();
        assert_eq!(info.edgecut, 2);
        assert_eq!(info.ncomponents, 3);
        assert!(!info.is_contiguous());
        assert_eq!(info.connectivity, (1, 1, 1.0));
        assert_eq!(info.max_overweight.0, 0);
        assert!((info.max_overweight.1 - 1.5).abs() < 1e-6);
        assert!(info.to_string().contains("Edgecut: 2"));
    }

    #[test]
    fn components_of_the_whole_graph() {
        let g = Graph::new(vec![0, 1, 2, 2], vec![1, 0]).unwrap();
        assert_eq!(count_components(&g, None).unwrap(), 2);
    }
}
