/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * mesh.c
 *
 * This file contains routines for converting 3D and 4D finite element
 * meshes into dual or nodal graphs
 *
 * Started 8/18/97
 * George
 *
 * $Id: mesh.c 13804 2013-03-04 23:49:08Z karypis $
 *
 */

use crate::error::{ensure_input, Error, Result};
use crate::graph::Graph;
use crate::idx_t;
use crate::util::{make_csr, shift_csr, try_vec};

/// A finite element mesh: element `e` is made of the nodes
/// `eind[eptr[e]..eptr[e + 1]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mesh {
    pub(crate) nn: usize,
    pub(crate) eptr: Vec<idx_t>,
    pub(crate) eind: Vec<idx_t>,
    /// element weights, used when the dual graph is partitioned
    pub(crate) ewgt: Option<Vec<idx_t>>,
    /// node weights, used when the nodal graph is partitioned
    pub(crate) nwgt: Option<Vec<idx_t>>,
}

impl Mesh {
    /// Builds a mesh whose node count is one more than the largest node id.
    pub fn new(eptr: Vec<idx_t>, eind: Vec<idx_t>) -> Result<Self> {
        let nn = eind.iter().copied().max().map_or(0, |m| (m + 1).max(0) as usize);
        Self::with_nodes(eptr, eind, nn)
    }

    /// Builds a mesh over `nn` nodes; nodes that no element uses are allowed,
    /// nodes repeated within one element are not.
    pub fn with_nodes(eptr: Vec<idx_t>, eind: Vec<idx_t>, nn: usize) -> Result<Self> {
        ensure_input!(!eptr.is_empty(), "eptr must have ne+1 entries");
        ensure_input!(eptr[0] == 0, "eptr[0] must be 0, got {}", eptr[0]);
        for (e, w) in eptr.windows(2).enumerate() {
            ensure_input!(w[0] < w[1], "element {e} has no nodes");
        }
        let ne = eptr.len() - 1;
        ensure_input!(
            eptr[ne] as usize == eind.len(),
            "eptr[ne] = {} does not match the {} node entries",
            eptr[ne],
            eind.len()
        );
        ensure_input!(nn <= idx_t::MAX as usize, "too many nodes: {nn}");
        if let Some(&bad) = eind.iter().find(|&&k| k < 0 || k as usize >= nn) {
            return Err(Error::input(format!(
                "node id {bad} is out of range for {nn} nodes"
            )));
        }
        let mut seen = try_vec(nn, usize::MAX, "Mesh: marker")?;
        for e in 0..ne {
            for &k in &eind[eptr[e] as usize..eptr[e + 1] as usize] {
                ensure_input!(seen[k as usize] != e, "element {e} lists node {k} twice");
                seen[k as usize] = e;
            }
        }

        Ok(Mesh {
            nn,
            eptr,
            eind,
            ewgt: None,
            nwgt: None,
        })
    }

    /// Attaches one weight per element.
    pub fn with_element_weights(mut self, ewgt: Vec<idx_t>) -> Result<Self> {
        ensure_input!(
            ewgt.len() == self.element_count(),
            "{} element weights for {} elements",
            ewgt.len(),
            self.element_count()
        );
        ensure_input!(ewgt.iter().all(|&w| w >= 0), "element weights must not be negative");
        self.ewgt = Some(ewgt);
        Ok(self)
    }

    /// Attaches one weight per node.
    pub fn with_node_weights(mut self, nwgt: Vec<idx_t>) -> Result<Self> {
        ensure_input!(
            nwgt.len() == self.nn,
            "{} node weights for {} nodes",
            nwgt.len(),
            self.nn
        );
        ensure_input!(nwgt.iter().all(|&w| w >= 0), "node weights must not be negative");
        self.nwgt = Some(nwgt);
        Ok(self)
    }

    pub fn element_count(&self) -> usize {
        self.eptr.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.nn
    }

    /// The nodes of element `e`
    pub fn element_nodes(&self, e: usize) -> &[idx_t] {
        &self.eind[self.eptr[e] as usize..self.eptr[e + 1] as usize]
    }

    pub fn eptr(&self) -> &[idx_t] {
        &self.eptr
    }

    pub fn eind(&self) -> &[idx_t] {
        &self.eind
    }

    pub fn element_weights(&self) -> Option<&[idx_t]> {
        self.ewgt.as_deref()
    }

    pub fn node_weights(&self) -> Option<&[idx_t]> {
        self.nwgt.as_deref()
    }

    /// The node-element list in CSR form `(nptr, nind)`
    pub(crate) fn node_elements(&self) -> Result<(Vec<usize>, Vec<usize>)> {
        let ne = self.element_count();
        let nn = self.nn;

        let mut nptr = try_vec(nn + 1, 0usize, "CreateGraphDual: nptr")?;
        let mut nind = try_vec(self.eind.len(), 0usize, "CreateGraphDual: nind")?;

        for &k in &self.eind {
            nptr[k as usize] += 1;
        }
        make_csr(nn, &mut nptr);
        for e in 0..ne {
            for &k in self.element_nodes(e) {
                nind[nptr[k as usize]] = e;
                nptr[k as usize] += 1;
            }
        }
        shift_csr(nn, &mut nptr);

        Ok((nptr, nind))
    }
}

/*****************************************************************************/
/* This function creates the dual of a finite element mesh: two elements are
    adjacent when they share at least ncommon nodes. Elements with fewer
    than ncommon nodes have no neighbors.
*/
/*****************************************************************************/
pub fn mesh_to_dual(mesh: &Mesh, ncommon: usize) -> Result<Graph> {
    ensure_input!(ncommon >= 1, "ncommon must be at least 1");
    let ne = mesh.element_count();

    /* construct the node-element list first */
    let (nptr, nind) = mesh.node_elements()?;

    let mut marker = try_vec(ne, 0usize, "CreateGraphDual: marker")?;
    let mut nbrs = Vec::new();
    let mut xadj: Vec<idx_t> = Vec::with_capacity(ne + 1);
    let mut adjncy: Vec<idx_t> = Vec::new();
    xadj.push(0);

    for e in 0..ne {
        find_common_elements(mesh, e, &nptr, &nind, ncommon, &mut marker, &mut nbrs);
        adjncy.extend(nbrs.iter().map(|&f| f as idx_t));
        xadj.push(adjncy.len() as idx_t);
    }

    Graph::new(xadj, adjncy)
}

/*****************************************************************************/
/* This function finds all elements that share at least ncommon nodes with
    the ``query'' element. `marker` is all zeros on entry and on return.
*/
/*****************************************************************************/
fn find_common_elements(
    mesh: &Mesh,
    qid: usize,
    nptr: &[usize],
    nind: &[usize],
    ncommon: usize,
    marker: &mut [usize],
    nbrs: &mut Vec<usize>,
) {
    nbrs.clear();

    /* find all elements that share at least one node with qid */
    for &k in mesh.element_nodes(qid) {
        for &f in &nind[nptr[k as usize]..nptr[k as usize + 1]] {
            if marker[f] == 0 {
                nbrs.push(f);
            }
            marker[f] += 1;
        }
    }
    marker[qid] = 0;

    /* compact the list to contain only those with at least ncommon nodes */
    nbrs.retain(|&f| {
        let overlap = std::mem::take(&mut marker[f]);
        f != qid && overlap >= ncommon
    });
}

/*****************************************************************************/
/* This function creates the nodal graph of a finite element mesh: two nodes
    are adjacent when some element contains both.
*/
/*****************************************************************************/
pub fn mesh_to_nodal(mesh: &Mesh) -> Result<Graph> {
    let nn = mesh.nn;

    /* construct the node-element list first */
    let (nptr, nind) = mesh.node_elements()?;

    let mut marker = try_vec(nn, false, "CreateGraphNodal: marker")?;
    let mut nbrs: Vec<usize> = Vec::new();
    let mut xadj: Vec<idx_t> = Vec::with_capacity(nn + 1);
    let mut adjncy: Vec<idx_t> = Vec::new();
    xadj.push(0);

    for i in 0..nn {
        /* find the union of nodes that are in the same elements with i */
        nbrs.clear();
        marker[i] = true;
        for &e in &nind[nptr[i]..nptr[i + 1]] {
            for &k in mesh.element_nodes(e) {
                let k = k as usize;
                if !marker[k] {
                    marker[k] = true;
                    nbrs.push(k);
                }
            }
        }
        marker[i] = false;
        for &k in &nbrs {
            marker[k] = false;
        }

        adjncy.extend(nbrs.iter().map(|&k| k as idx_t));
        xadj.push(adjncy.len() as idx_t);
    }

    Graph::new(xadj, adjncy)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles sharing the edge 1-2, plus a quad sharing node 3
    fn small_mesh() -> Mesh {
        Mesh::new(vec![0, 3, 6, 10], vec![0, 1, 2, 1, 2, 3, 3, 4, 5, 6]).unwrap()
    }

    fn sorted(g: &Graph, v: usize) -> Vec<idx_t> {
        let mut n = g.neighbors(v).to_vec();
        n.sort_unstable();
        n
    }

    #[test]
    fn validates_the_mesh() {
        assert!(Mesh::new(vec![], vec![]).is_err());
        assert!(Mesh::new(vec![1, 2], vec![0, 1]).is_err());
        assert!(Mesh::new(vec![0, 0, 2], vec![0, 1]).is_err(), "empty element");
        assert!(Mesh::new(vec![0, 2], vec![0, 1, 2]).is_err());
        assert!(Mesh::new(vec![0, 2], vec![0, -1]).is_err());
        assert!(Mesh::with_nodes(vec![0, 2], vec![0, 3], 3).is_err());
        assert!(small_mesh().with_element_weights(vec![1, 2]).is_err());
        assert!(small_mesh().with_node_weights(vec![1; 7]).is_ok());
        assert_eq!(small_mesh().node_count(), 7);
        assert_eq!(small_mesh().element_nodes(2), &[3, 4, 5, 6]);
    }

    #[test]
    fn repeated_nodes_within_an_element_are_rejected() {
        // [0, 1, 1] and [1, 2, 3] share only node 1
        let bad = Mesh::new(vec![0, 3, 6], vec![0, 1, 1, 1, 2, 3]);
        assert!(matches!(bad, Err(Error::InvalidInput(_))), "{bad:?}");
        let m = Mesh::new(vec![0, 3, 6], vec![0, 1, 4, 1, 2, 3]).unwrap();
        assert_eq!(mesh_to_dual(&m, 2).unwrap().edge_count(), 0);
        assert_eq!(mesh_to_dual(&m, 1).unwrap().edge_count(), 1);
    }

    #[test]
    fn node_element_lists() {
        let (nptr, nind) = small_mesh().node_elements().unwrap();
        assert_eq!(nptr, vec![0, 1, 3, 5, 7, 8, 9, 10]);
        assert_eq!(&nind[nptr[3]..nptr[4]], &[1, 2]);
    }

    #[test]
    fn dual_with_one_and_two_common_nodes() {
        let m = small_mesh();
        let g1 = mesh_to_dual(&m, 1).unwrap();
        assert_eq!(sorted(&g1, 0), vec![1]);
        assert_eq!(sorted(&g1, 1), vec![0, 2]);
        assert_eq!(sorted(&g1, 2), vec![1]);

        let g2 = mesh_to_dual(&m, 2).unwrap();
        assert_eq!(sorted(&g2, 0), vec![1]);
        assert_eq!(sorted(&g2, 1), vec![0]);
        assert!(g2.neighbors(2).is_empty());
        g2.check().unwrap();
    }

    #[test]
    fn elements_smaller_than_ncommon_are_isolated() {
        // two segments sharing both nodes, asked for three common nodes
        let m = Mesh::new(vec![0, 2, 4], vec![0, 1, 1, 0]).unwrap();
        let g = mesh_to_dual(&m, 3).unwrap();
        assert_eq!(g.edge_count(), 0);
        assert!(mesh_to_dual(&m, 0).is_err());
    }

    #[test]
    fn nodal_graph() {
        let g = mesh_to_nodal(&small_mesh()).unwrap();
        assert_eq!(g.vertex_count(), 7);
        assert_eq!(sorted(&g, 0), vec![1, 2]);
        assert_eq!(sorted(&g, 3), vec![1, 2, 4, 5, 6]);
        assert_eq!(sorted(&g, 6), vec![3, 4, 5]);
        g.check().unwrap();
    }

    #[test]
    fn unused_nodes_have_no_neighbors() {
        let m = Mesh::with_nodes(vec![0, 2], vec![0, 1], 4).unwrap();
        let g = mesh_to_nodal(&m).unwrap();
        assert_eq!(g.vertex_count(), 4);
        assert!(g.neighbors(3).is_empty());
    }
}
