#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

pub use mlpart::{idx_t, real_t, Graph, Mesh, Objtype, Options, Ptype};

/// Routes `log` records through the test harness; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `nx` by `ny` grid with 4-neighbor connectivity
pub fn grid(nx: usize, ny: usize) -> Graph {
    let mut xadj = vec![0 as idx_t];
    let mut adjncy = Vec::new();
    for v in 0..nx * ny {
        let (row, col) = (v / nx, v % nx);
        if row > 0 {
            adjncy.push((v - nx) as idx_t);
        }
        if col > 0 {
            adjncy.push((v - 1) as idx_t);
        }
        if col + 1 < nx {
            adjncy.push((v + 1) as idx_t);
        }
        if row + 1 < ny {
            adjncy.push((v + nx) as idx_t);
        }
        xadj.push(adjncy.len() as idx_t);
    }
    Graph::new(xadj, adjncy).unwrap()
}

/// Cycle over `n` vertices
pub fn cycle(n: usize) -> Graph {
    let mut xadj = vec![0 as idx_t];
    let mut adjncy = Vec::new();
    for v in 0..n {
        adjncy.push(((v + n - 1) % n) as idx_t);
        adjncy.push(((v + 1) % n) as idx_t);
        xadj.push(adjncy.len() as idx_t);
    }
    Graph::new(xadj, adjncy).unwrap()
}

/// Builds a graph from an undirected edge list, dropping self loops and duplicates
pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Graph {
    let mut adj = vec![Vec::new(); n];
    for &(u, v) in edges {
        if u != v && !adj[u].contains(&(v as idx_t)) {
            adj[u].push(v as idx_t);
            adj[v].push(u as idx_t);
        }
    }
    let mut xadj = vec![0 as idx_t];
    let mut adjncy = Vec::new();
    for list in adj {
        adjncy.extend(list);
        xadj.push(adjncy.len() as idx_t);
    }
    Graph::new(xadj, adjncy).unwrap()
}

/// Hexahedral mesh of `nx * ny * nz` cells
pub fn hex_mesh(nx: usize, ny: usize, nz: usize) -> Mesh {
    let node = |x: usize, y: usize, z: usize| ((z * (ny + 1) + y) * (nx + 1) + x) as idx_t;
    let mut eptr = vec![0];
    let mut eind = Vec::new();
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                eind.extend([
                    node(x, y, z),
                    node(x + 1, y, z),
                    node(x + 1, y + 1, z),
                    node(x, y + 1, z),
                    node(x, y, z + 1),
                    node(x + 1, y, z + 1),
                    node(x + 1, y + 1, z + 1),
                    node(x, y + 1, z + 1),
                ]);
                eptr.push(eind.len() as idx_t);
            }
        }
    }
    Mesh::new(eptr, eind).unwrap()
}

/// Weight of every part, first constraint
pub fn part_weights(graph: &Graph, part: &[idx_t], nparts: usize) -> Vec<idx_t> {
    let mut pwgts = vec![0; nparts];
    for (v, &p) in part.iter().enumerate() {
        pwgts[p as usize] += graph.vertex_weight(v, 0);
    }
    pwgts
}

/// Checks the part range and the balance bound, allowing one vertex of
/// slack for the granularity of the vertex weights.
pub fn assert_valid_partition(graph: &Graph, part: &[idx_t], nparts: usize) {
    assert_eq!(part.len(), graph.vertex_count());
    assert!(
        part.iter().all(|&p| p >= 0 && (p as usize) < nparts),
        "part ids out of range: {part:?}"
    );

    let pwgts = part_weights(graph, part, nparts);
    let total: idx_t = pwgts.iter().sum();
    let maxvwgt = (0..graph.vertex_count()).map(|v| graph.vertex_weight(v, 0)).max().unwrap_or(0);
    let tol = if nparts >= 16 { 0.20 } else { 0.10 };
    let bound = (1.0 + tol) * total as f64 / nparts as f64 + maxvwgt as f64;
    assert!(
        pwgts.iter().all(|&w| w as f64 <= bound),
        "part weights {pwgts:?} exceed {bound}"
    );
}

/// Runs the `gpmetis` binary with `args`
pub fn gpmetis(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gpmetis"))
        .args(args)
        .output()
        .expect("failed to run gpmetis")
}

/// A fresh scratch directory for one test
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mlpart-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
