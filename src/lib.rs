//! Multilevel graph partitioning, mesh partitioning and fill-reducing ordering.
//!
//! Graphs are handed in as [`Graph`] (CSR adjacency with optional weights) and
//! meshes as [`Mesh`]. Every operation takes an [`Options`] record whose
//! defaults match the METIS command line tools and returns its result by value.
//!
//! ```
//! use mlpart::{part_graph_kway, Graph, Options};
//!
//! // a 4-cycle
//! let graph = Graph::new(vec![0, 2, 4, 6, 8], vec![1, 3, 0, 2, 1, 3, 0, 2]).unwrap();
//! let p = part_graph_kway(&graph, 2, &Options::default()).unwrap();
//! assert_eq!(p.objval, 2);
//! ```

#![allow(clippy::needless_range_loop, clippy::too_many_arguments)]

#[macro_use]
pub mod util;

mod balance;
mod bucketsort;
mod coarsen;
mod compress;
mod debug;
mod defs;
mod fm;
mod initpart;
mod kwayfm;
mod kwayrefine;
mod mcutil;
mod mmd;
mod pqueue;
mod refine;
mod sfm;
mod srefine;
mod timing;

pub mod error;
pub mod graph;
pub mod graphio;
pub mod kmetis;
pub mod mesh;
pub mod meshpart;
pub mod ometis;
pub mod options;
pub mod pmetis;
pub mod separator;
pub mod stat;

#[cfg(test)]
mod tests;

#[allow(non_camel_case_types)]
pub type idx_t = i32;
#[allow(non_camel_case_types)]
pub type real_t = f32;

pub use error::{Error, Result};
pub use graph::Graph;
pub use kmetis::part_graph_kway;
pub use mesh::{mesh_to_dual, mesh_to_nodal, Mesh};
pub use meshpart::{part_mesh_dual, part_mesh_nodal};
pub use ometis::node_nd;
pub use options::{Ctype, DbgLvl, Iptype, Objtype, Options, Ptype, Rtype};
pub use pmetis::part_graph_recursive;
pub use separator::compute_vertex_separator;

/// Result of a graph partitioning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// part of every vertex, in `0..nparts`
    pub part: Vec<idx_t>,
    /// edge-cut or communication volume, depending on the objective
    pub objval: idx_t,
}

/// Result of a mesh partitioning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshPartition {
    pub epart: Vec<idx_t>,
    pub npart: Vec<idx_t>,
    /// objective of the partitioned dual or nodal graph
    pub objval: idx_t,
}

/// A fill-reducing ordering. Vertex `i` of the original graph is eliminated
/// `iperm[i]`-th, and `perm[k]` is the vertex eliminated `k`-th.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub perm: Vec<idx_t>,
    pub iperm: Vec<idx_t>,
}

/// A vertex separator: `part[i]` is 0 or 1 for the two sides and 2 for the
/// separator; `sepsize` is the total weight of the separator vertices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Separator {
    pub sepsize: idx_t,
    pub part: Vec<idx_t>,
}

/// The METIS release whose formats and defaults this crate follows, plus the crate version
pub fn version() -> String {
    format!(
        "{}.{}.{} (mlpart {})",
        defs::METIS_VER_MAJOR,
        defs::METIS_VER_MINOR,
        defs::METIS_VER_SUBMINOR,
        env!("CARGO_PKG_VERSION")
    )
}
