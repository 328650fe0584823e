/*
\file
\brief Functions that deal with setting up the graphs.

\date   Started 7/25/1997
\author George
\author Copyright 1997-2009, Regents of the University of Minnesota
*/

use crate::error::{ensure_input, Error, Result};
use crate::util::{try_vec, try_with_capacity, wide_sum};
use crate::{idx_t, real_t};

/// An undirected graph in compressed sparse row form.
///
/// The neighbors of vertex `v` are `adjncy[xadj[v]..xadj[v + 1]]`; every edge is
/// stored from both endpoints. Vertex weights hold `ncon` entries per vertex and
/// edge weights are aligned with `adjncy`. Missing weights default to 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    ncon: usize,
    xadj: Vec<idx_t>,
    adjncy: Vec<idx_t>,
    vwgt: Option<Vec<idx_t>>,
    adjwgt: Option<Vec<idx_t>>,
}

impl Graph {
    /// Creates an unweighted graph
    pub fn new(xadj: Vec<idx_t>, adjncy: Vec<idx_t>) -> Result<Self> {
        Self::with_weights(xadj, adjncy, None, None, 1)
    }

    /// Creates a graph with optional vertex weights (`ncon` per vertex) and edge weights.
    ///
    /// Fails with [`Error::InvalidInput`] when `xadj` is not a valid offset array for
    /// `adjncy`, a neighbor id is out of range, a vertex lists itself, a weight array
    /// has the wrong length or holds negative values, or an edge is listed twice or
    /// lacks its reverse edge of the same weight.
    pub fn with_weights(
        xadj: Vec<idx_t>,
        adjncy: Vec<idx_t>,
        vwgt: Option<Vec<idx_t>>,
        adjwgt: Option<Vec<idx_t>>,
        ncon: usize,
    ) -> Result<Self> {
        ensure_input!(!xadj.is_empty(), "xadj must have at least one entry");
        ensure_input!(ncon >= 1, "ncon must be at least 1");
        ensure_input!(xadj[0] == 0, "xadj[0] must be 0, got {}", xadj[0]);
        let nvtxs = xadj.len() - 1;
        for (i, w) in xadj.windows(2).enumerate() {
            ensure_input!(
                w[0] <= w[1],
                "xadj decreases at vertex {i} ({} > {})",
                w[0],
                w[1]
            );
        }
        ensure_input!(
            xadj[nvtxs] as usize == adjncy.len(),
            "xadj[{nvtxs}] = {} but adjncy has {} entries",
            xadj[nvtxs],
            adjncy.len()
        );
        for i in 0..nvtxs {
            for &k in &adjncy[xadj[i] as usize..xadj[i + 1] as usize] {
                ensure_input!(
                    k >= 0 && (k as usize) < nvtxs,
                    "vertex {i} has neighbor {k} outside 0..{nvtxs}"
                );
                ensure_input!(k as usize != i, "vertex {i} has a self loop");
            }
        }

        if let Some(vwgt) = &vwgt {
            ensure_input!(
                vwgt.len() == nvtxs * ncon,
                "vwgt has {} entries, expected {}",
                vwgt.len(),
                nvtxs * ncon
            );
            ensure_input!(vwgt.iter().all(|&w| w >= 0), "vertex weights must be >= 0");
            for c in 0..ncon {
                let sum: i64 = (0..nvtxs).map(|i| vwgt[i * ncon + c] as i64).sum();
                ensure_input!(
                    sum <= (idx_t::MAX / 2) as i64,
                    "total vertex weight {sum} overflows"
                );
            }
        }
        if let Some(adjwgt) = &adjwgt {
            ensure_input!(
                adjwgt.len() == adjncy.len(),
                "adjwgt has {} entries, expected {}",
                adjwgt.len(),
                adjncy.len()
            );
            ensure_input!(adjwgt.iter().all(|&w| w >= 0), "edge weights must be >= 0");
            ensure_input!(
                wide_sum(adjwgt) <= (idx_t::MAX / 2) as i64,
                "total edge weight overflows"
            );
        }

        let graph = Graph {
            ncon,
            xadj,
            adjncy,
            vwgt,
            adjwgt,
        };
        graph.check()?;
        Ok(graph)
    }

    pub fn vertex_count(&self) -> usize {
        self.xadj.len() - 1
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjncy.len() / 2
    }

    pub fn degree(&self, v: usize) -> usize {
        (self.xadj[v + 1] - self.xadj[v]) as usize
    }

    /// The neighbors of `v`, borrowed from the adjacency array
    pub fn neighbors(&self, v: usize) -> &[idx_t] {
        &self.adjncy[self.xadj[v] as usize..self.xadj[v + 1] as usize]
    }

    /// The weights of the edges of `v`, aligned with [`Graph::neighbors`]
    pub fn edge_weights(&self, v: usize) -> Option<&[idx_t]> {
        self.adjwgt
            .as_deref()
            .map(|w| &w[self.xadj[v] as usize..self.xadj[v + 1] as usize])
    }

    pub fn ncon(&self) -> usize {
        self.ncon
    }

    pub fn xadj(&self) -> &[idx_t] {
        &self.xadj
    }

    pub fn adjncy(&self) -> &[idx_t] {
        &self.adjncy
    }

    pub fn vwgt(&self) -> Option<&[idx_t]> {
        self.vwgt.as_deref()
    }

    pub fn adjwgt(&self) -> Option<&[idx_t]> {
        self.adjwgt.as_deref()
    }

    /// Weight `c` of vertex `v`
    pub fn vertex_weight(&self, v: usize, c: usize) -> idx_t {
        self.vwgt.as_ref().map_or(1, |w| w[v * self.ncon + c])
    }

    /// Sum of the vertex weights, per constraint
    pub fn total_vertex_weight(&self) -> Vec<idx_t> {
        match &self.vwgt {
            None => vec![self.vertex_count() as idx_t; self.ncon],
            Some(vwgt) => (0..self.ncon)
                .map(|c| vwgt.iter().skip(c).step_by(self.ncon).sum())
                .collect(),
        }
    }

    /// Verifies that the adjacency structure is symmetric and that both directions
    /// of every edge carry the same weight.
    pub fn check(&self) -> Result<()> {
        let nvtxs = self.vertex_count();
        let mut htable: Vec<Option<idx_t>> = vec![None; nvtxs];
        for i in 0..nvtxs {
            let (lo, hi) = (self.xadj[i] as usize, self.xadj[i + 1] as usize);
            for j in lo..hi {
                let k = self.adjncy[j] as usize;
                if htable[k].is_some() {
                    return Err(Error::input(format!("edge {i}-{k} is listed twice")));
                }
                htable[k] = Some(self.adjwgt.as_ref().map_or(1, |w| w[j]));
            }
            for j in lo..hi {
                let k = self.adjncy[j] as usize;
                let w = self.adjwgt.as_ref().map_or(1, |w| w[j]);
                let back = (self.xadj[k] as usize..self.xadj[k + 1] as usize)
                    .find(|&jj| self.adjncy[jj] as usize == i);
                match back {
                    None => {
                        return Err(Error::input(format!(
                            "edge {i}-{k} has no matching edge {k}-{i}"
                        )))
                    }
                    Some(jj) => {
                        let wb = self.adjwgt.as_ref().map_or(1, |w| w[jj]);
                        if wb != w {
                            return Err(Error::input(format!(
                                "edge {i}-{k} has weight {w} but {k}-{i} has {wb}"
                            )));
                        }
                    }
                }
            }
            for j in lo..hi {
                htable[self.adjncy[j] as usize] = None;
            }
        }
        Ok(())
    }

    /// Consumes the graph, returning `(xadj, adjncy, vwgt, adjwgt)`
    pub fn into_parts(self) -> (Vec<idx_t>, Vec<idx_t>, Option<Vec<idx_t>>, Option<Vec<idx_t>>) {
        (self.xadj, self.adjncy, self.vwgt, self.adjwgt)
    }
}

/// Sentinel for "not in the list"
const NOT_IN_LIST: usize = usize::MAX;

/// Indexed set of boundary vertices with O(1) insert/delete (the bndptr/bndind pair).
#[derive(Clone, Debug, Default)]
pub(crate) struct BndList {
    ptr: Vec<usize>,
    ind: Vec<usize>,
}

impl BndList {
    pub fn new(nvtxs: usize) -> Self {
        BndList {
            ptr: vec![NOT_IN_LIST; nvtxs],
            ind: Vec::with_capacity(nvtxs),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ind.len()
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.ptr[i] != NOT_IN_LIST
    }

    #[inline]
    pub fn insert(&mut self, i: usize) {
        debug_assert!(!self.contains(i), "{i} already on the boundary");
        self.ptr[i] = self.ind.len();
        self.ind.push(i);
    }

    #[inline]
    pub fn delete(&mut self, i: usize) {
        debug_assert!(self.contains(i), "{i} not on the boundary");
        let pos = self.ptr[i];
        let last = self.ind.pop().unwrap_or(i);
        if last != i {
            self.ind[pos] = last;
            self.ptr[last] = pos;
        }
        self.ptr[i] = NOT_IN_LIST;
    }

    /// The vertices in insertion order, modulo deletions
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.ind
    }

    pub fn clear(&mut self) {
        for &i in &self.ind {
            self.ptr[i] = NOT_IN_LIST;
        }
        self.ind.clear();
    }
}

/// Neighboring-part information of a vertex for k-way refinement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Nbr {
    pub pid: usize,
    pub ed: idx_t,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct KwayInfo {
    pub id: idx_t,
    pub ed: idx_t,
    pub nbrs: Vec<Nbr>,
}

/// Graph as used inside the multilevel routines, one per hierarchy level or subgraph.
#[derive(Clone, Debug, Default)]
pub(crate) struct WorkGraph {
    pub nvtxs: usize,
    /// length of adjncy (each undirected edge counted twice)
    pub nedges: usize,
    pub ncon: usize,
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgt: Vec<idx_t>,
    pub adjwgt: Vec<idx_t>,
    pub tvwgt: Vec<idx_t>,
    pub invtvwgt: Vec<real_t>,

    /// vertex id in the graph the recursion started from
    pub label: Vec<usize>,
    /// vertex of the next coarser level this vertex was contracted into
    pub cmap: Vec<usize>,

    /* partition state */
    pub mincut: idx_t,
    pub minvol: idx_t,
    pub where_: Vec<usize>,
    pub pwgts: Vec<idx_t>,
    pub bnd: BndList,

    /* 2-way refinement */
    pub id: Vec<idx_t>,
    pub ed: Vec<idx_t>,

    /* node refinement: weight of the neighbors in part 0 and part 1 */
    pub nrinfo: Vec<[idx_t; 2]>,

    /* k-way refinement */
    pub ckrinfo: Vec<KwayInfo>,
}

impl WorkGraph {
    /// Sets up the working copy of a user graph (SetupGraph)
    pub fn from_graph(graph: &Graph) -> Result<WorkGraph> {
        let nvtxs = graph.vertex_count();
        let nedges = graph.adjncy.len();
        let ncon = graph.ncon;

        let mut wg = WorkGraph::with_capacity(nvtxs, nedges, ncon)?;
        wg.xadj.extend(graph.xadj.iter().map(|&x| x as usize));
        wg.adjncy.extend(graph.adjncy.iter().map(|&k| k as usize));
        match &graph.vwgt {
            Some(vwgt) => wg.vwgt.extend_from_slice(vwgt),
            None => wg.vwgt.resize(nvtxs * ncon, 1),
        }
        match &graph.adjwgt {
            Some(adjwgt) => wg.adjwgt.extend_from_slice(adjwgt),
            None => wg.adjwgt.resize(nedges, 1),
        }
        wg.nvtxs = nvtxs;
        wg.nedges = nedges;
        wg.setup_tvwgt();
        wg.setup_label();
        Ok(wg)
    }

    /// Builds a graph from raw CSR arrays already in internal form
    pub fn from_csr(
        xadj: Vec<usize>,
        adjncy: Vec<usize>,
        vwgt: Vec<idx_t>,
        adjwgt: Vec<idx_t>,
        ncon: usize,
    ) -> WorkGraph {
        let nvtxs = xadj.len() - 1;
        let mut wg = WorkGraph {
            nvtxs,
            nedges: adjncy.len(),
            ncon,
            xadj,
            adjncy,
            vwgt,
            adjwgt,
            ..WorkGraph::default()
        };
        wg.setup_tvwgt();
        wg.setup_label();
        wg
    }

    /// Allocates an empty graph with room for `nvtxs` vertices and `nedges` adjacency
    /// entries (SetupSplitGraph / SetupCoarseGraph)
    pub fn with_capacity(nvtxs: usize, nedges: usize, ncon: usize) -> Result<WorkGraph> {
        Ok(WorkGraph {
            nvtxs: 0,
            nedges: 0,
            ncon,
            xadj: try_with_capacity(nvtxs + 1, "WorkGraph: xadj")?,
            adjncy: try_with_capacity(nedges, "WorkGraph: adjncy")?,
            vwgt: try_with_capacity(nvtxs * ncon, "WorkGraph: vwgt")?,
            adjwgt: try_with_capacity(nedges, "WorkGraph: adjwgt")?,
            label: try_with_capacity(nvtxs, "WorkGraph: label")?,
            ..WorkGraph::default()
        })
    }

    /// Computes the total vertex weight and its inverse
    pub fn setup_tvwgt(&mut self) {
        let ncon = self.ncon;
        self.tvwgt = (0..ncon)
            .map(|c| self.vwgt.iter().skip(c).step_by(ncon).sum())
            .collect();
        self.invtvwgt = self
            .tvwgt
            .iter()
            .map(|&t| 1.0 / (if t > 0 { t as real_t } else { 1.0 }))
            .collect();
    }

    /// Sets the label to the identity
    pub fn setup_label(&mut self) {
        self.label.clear();
        self.label.extend(0..self.nvtxs);
    }

    #[inline]
    pub fn adj(&self, i: usize) -> std::ops::Range<usize> {
        self.xadj[i]..self.xadj[i + 1]
    }

    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        self.xadj[i + 1] - self.xadj[i]
    }

    /// True when all edges carry the same weight
    pub fn equal_edge_weights(&self) -> bool {
        self.adjwgt.windows(2).all(|w| w[0] == w[1])
    }

    /// Allocates the 2-way partition arrays
    pub fn alloc_2way(&mut self) -> Result<()> {
        let n = self.nvtxs;
        self.where_ = try_vec(n, 0, "Allocate2WayPartitionMemory: where")?;
        self.pwgts = vec![0; 2 * self.ncon];
        self.id = try_vec(n, 0, "Allocate2WayPartitionMemory: id")?;
        self.ed = try_vec(n, 0, "Allocate2WayPartitionMemory: ed")?;
        self.bnd = BndList::new(n);
        Ok(())
    }

    /// Allocates the node-separator refinement arrays
    pub fn alloc_2way_node(&mut self) -> Result<()> {
        let n = self.nvtxs;
        self.where_ = try_vec(n, 0, "Allocate2WayNodePartitionMemory: where")?;
        self.pwgts = vec![0; 3];
        self.nrinfo = try_vec(n, [0; 2], "Allocate2WayNodePartitionMemory: nrinfo")?;
        self.bnd = BndList::new(n);
        Ok(())
    }

    /// Allocates the k-way partition arrays
    pub fn alloc_kway(&mut self, nparts: usize) -> Result<()> {
        let n = self.nvtxs;
        self.where_ = try_vec(n, 0, "AllocateKWayPartitionMemory: where")?;
        self.pwgts = vec![0; nparts * self.ncon];
        self.ckrinfo = try_vec(n, KwayInfo::default(), "AllocateKWayPartitionMemory: ckrinfo")?;
        self.bnd = BndList::new(n);
        Ok(())
    }

    /// Drops the refinement data (FreeRData)
    pub fn free_rdata(&mut self) {
        self.where_ = Vec::new();
        self.pwgts = Vec::new();
        self.id = Vec::new();
        self.ed = Vec::new();
        self.nrinfo = Vec::new();
        self.ckrinfo = Vec::new();
        self.bnd = BndList::default();
    }

    /// Copies the working graph back into a [`Graph`]
    #[cfg(test)]
    pub fn to_graph(&self) -> Graph {
        Graph {
            ncon: self.ncon,
            xadj: self.xadj.iter().map(|&x| x as idx_t).collect(),
            adjncy: self.adjncy.iter().map(|&x| x as idx_t).collect(),
            vwgt: Some(self.vwgt.clone()),
            adjwgt: Some(self.adjwgt.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Graph {
        Graph::new(vec![0, 2, 4, 6, 8], vec![1, 3, 0, 2, 1, 3, 0, 2]).unwrap()
    }

    #[test]
    fn accessors() {
        let g = square();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.degree(2), 2);
        assert_eq!(g.neighbors(3), &[0, 2]);
        assert_eq!(g.total_vertex_weight(), vec![4]);
        assert!(g.edge_weights(0).is_none());
        g.check().unwrap();
    }

    #[test]
    fn rejects_malformed() {
        assert!(Graph::new(vec![], vec![]).is_err());
        assert!(Graph::new(vec![1, 2], vec![0, 0]).is_err());
        assert!(Graph::new(vec![0, 2, 1], vec![1, 0]).is_err());
        assert!(Graph::new(vec![0, 1, 2], vec![1, 5]).is_err());
        assert!(Graph::new(vec![0, 1, 3], vec![1, 0]).is_err());
        assert!(Graph::new(vec![0, 1, 2], vec![0, 1]).is_err(), "self loop");
        assert!(Graph::with_weights(vec![0, 1, 2], vec![1, 0], Some(vec![1]), None, 1).is_err());
        assert!(
            Graph::with_weights(vec![0, 1, 2], vec![1, 0], None, Some(vec![1, -1]), 1).is_err()
        );
    }

    #[test]
    fn check_finds_asymmetry() {
        // 0 -> 1 without 1 -> 0, built directly to get past construction
        let g = Graph {
            ncon: 1,
            xadj: vec![0, 1, 2, 2],
            adjncy: vec![1, 2],
            vwgt: None,
            adjwgt: None,
        };
        assert!(g.check().is_err());
    }

    #[test]
    fn construction_rejects_one_sided_edges() {
        let one_sided = Graph::new(vec![0, 1, 1], vec![1]);
        assert!(matches!(one_sided, Err(Error::InvalidInput(_))), "{one_sided:?}");
        assert!(Graph::new(vec![0, 1, 2, 2], vec![1, 2]).is_err());
        assert!(Graph::new(vec![0, 2, 4], vec![1, 1, 0, 0]).is_err(), "duplicate edge");
        let uneven = Graph::with_weights(vec![0, 1, 2], vec![1, 0], None, Some(vec![2, 3]), 1);
        assert!(matches!(uneven, Err(Error::InvalidInput(_))));
        assert!(Graph::with_weights(vec![0, 1, 2], vec![1, 0], None, Some(vec![3, 3]), 1).is_ok());
    }

    #[test]
    fn bnd_list_ops() {
        let mut b = BndList::new(5);
        b.insert(3);
        b.insert(1);
        b.insert(4);
        b.delete(3);
        assert!(!b.contains(3));
        assert_eq!(b.len(), 2);
        let mut v = b.as_slice().to_vec();
        v.sort();
        assert_eq!(v, [1, 4]);
        b.clear();
        assert_eq!(b.len(), 0);
        assert!(!b.contains(1));
    }

    #[test]
    fn work_graph_defaults() {
        let wg = WorkGraph::from_graph(&square()).unwrap();
        assert_eq!(wg.nvtxs, 4);
        assert_eq!(wg.nedges, 8);
        assert_eq!(wg.tvwgt, vec![4]);
        assert_eq!(wg.adjwgt, vec![1; 8]);
        assert_eq!(wg.label, vec![0, 1, 2, 3]);
        assert!(wg.equal_edge_weights());
        assert_eq!(wg.to_graph().vertex_count(), 4);
    }
}
