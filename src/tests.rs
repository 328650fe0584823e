#![cfg(test)]

use crate::graph::Graph;
use crate::mesh::Mesh;
use crate::options::{Iptype, Objtype, Options, Ptype};
use crate::{idx_t, part_graph_kway, part_graph_recursive, stat};

/// `nx` by `ny` grid with 4-neighbor connectivity, vertex `row * nx + col`
pub(crate) fn grid_graph(nx: usize, ny: usize) -> Graph {
    let mut xadj = vec![0 as idx_t];
    let mut adjncy = Vec::new();
    for row in 0..ny {
        for col in 0..nx {
            let v = row * nx + col;
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
    }
    Graph::new(xadj, adjncy).unwrap()
}

/// Number of vertices in each part
pub(crate) fn part_weights(part: &[idx_t], nparts: usize) -> Vec<idx_t> {
    let mut pwgts = vec![0; nparts];
    for &p in part {
        pwgts[p as usize] += 1;
    }
    pwgts
}

/// `nx * ny` quadrilaterals over a `(nx + 1) * (ny + 1)` grid of nodes
pub(crate) fn quad_mesh(nx: usize, ny: usize) -> Mesh {
    let node = |col: usize, row: usize| (row * (nx + 1) + col) as idx_t;
    let mut eptr = vec![0];
    let mut eind = Vec::new();
    for row in 0..ny {
        for col in 0..nx {
            eind.extend([node(col, row), node(col + 1, row), node(col + 1, row + 1), node(col, row + 1)]);
            eptr.push(eind.len() as idx_t);
        }
    }
    Mesh::new(eptr, eind).unwrap()
}

/// Random vertex weights in `0..10` and symmetric edge weights in `1..=5`
fn create_dummy_weights(graph: &Graph, seed: u64) -> (Vec<idx_t>, Vec<idx_t>) {
    let mut rng = fastrand::Rng::with_seed(seed);
    let xadj = graph.xadj();
    let adjncy = graph.adjncy();
    let nvtxs = graph.vertex_count();

    let vwgt = Vec::from_iter((0..nvtxs).map(|_| rng.i32(0..10)));

    let mut adjwgt = vec![0; adjncy.len()];
    for i in 0..nvtxs {
        for j in xadj[i] as usize..xadj[i + 1] as usize {
            let k = adjncy[j] as usize;
            if i < k {
                adjwgt[j] = rng.i32(1..=5);
                for jj in xadj[k] as usize..xadj[k + 1] as usize {
                    if adjncy[jj] as usize == i {
                        adjwgt[jj] = adjwgt[j];
                        break;
                    }
                }
            }
        }
    }
    (vwgt, adjwgt)
}

/// Checks that `part` is a valid `nparts`-way partitioning of `graph` whose
/// objective is `objval` and whose heaviest part is within `ub` of the
/// average, up to one vertex.
fn verify_part(graph: &Graph, part: &[idx_t], objval: idx_t, nparts: usize, objtype: Objtype, ub: f64) {
    assert_eq!(part.len(), graph.vertex_count());
    assert!(part.iter().all(|&p| p >= 0 && (p as usize) < nparts));

    let expected = match objtype {
        Objtype::Vol => stat::compute_volume(graph, part).unwrap(),
        _ => stat::compute_cut(graph, part).unwrap(),
    };
    assert_eq!(objval, expected, "objval does not match the partitioning");

    let mut pwgts = vec![0 as i64; nparts];
    for (i, &p) in part.iter().enumerate() {
        pwgts[p as usize] += graph.vertex_weight(i, 0) as i64;
    }
    let total: i64 = pwgts.iter().sum();
    let maxvwgt = (0..graph.vertex_count()).map(|i| graph.vertex_weight(i, 0)).max().unwrap_or(0);
    let max = *pwgts.iter().max().unwrap();
    assert!(
        max as f64 <= ub * total as f64 / nparts as f64 + maxvwgt as f64,
        "part weights {pwgts:?} are out of balance"
    );
    if graph.vwgt().is_none() && graph.vertex_count() >= 2 * nparts {
        assert!(pwgts.iter().all(|&w| w > 0), "empty part in {pwgts:?}");
    }
}

fn part_graph_and_verify(options: &Options, nparts: usize, use_vwgt: bool, use_adjwgt: bool) {
    let grid = grid_graph(30, 30);
    let (vwgt, adjwgt) = create_dummy_weights(&grid, 7);
    let (xadj, adjncy, _, _) = grid.into_parts();
    let graph = Graph::with_weights(
        xadj,
        adjncy,
        use_vwgt.then_some(vwgt),
        use_adjwgt.then_some(adjwgt),
        1,
    )
    .unwrap();

    let p = match options.ptype {
        Ptype::Kway => part_graph_kway(&graph, nparts, options),
        Ptype::Rb => part_graph_recursive(&graph, nparts, options),
    }
    .unwrap();

    // default tolerance plus a little slack for the coarse vertex granularity
    let ub = if nparts >= 16 { 1.25 } else { 1.15 };
    verify_part(&graph, &p.part, p.objval, nparts, options.objtype, ub);
}

macro_rules! part_test {
    (
    name: $name:ident,
    options: $options:expr,
    nparts: $nparts:literal,
    vwgt: $use_vwgt:literal,
    adjwgt: $use_adjwgt:literal,
    ) => {
        #[test]
        fn $name() {
            let options = $options;
            part_graph_and_verify(&options, $nparts, $use_vwgt, $use_adjwgt);
        }
    };
}

macro_rules! make_options {
    ($ptype:ident $objtype:ident $iptype:ident) => {
        Options {
            ptype: Ptype::$ptype,
            objtype: Objtype::$objtype,
            iptype: Some(Iptype::$iptype),
            ..Options::default()
        }
    };
}

#[test]
fn basic_part_graph_recursive() {
    let graph = Graph::new(vec![0, 1, 2], vec![1, 0]).unwrap();
    let p = part_graph_recursive(&graph, 2, &Options::default()).unwrap();
    assert_ne!(p.part[0], p.part[1]);
    assert_eq!(p.objval, 1);
}

#[test]
fn basic_part_graph_kway() {
    let graph = Graph::new(vec![0, 1, 2], vec![1, 0]).unwrap();
    let p = part_graph_kway(&graph, 2, &Options::default()).unwrap();
    assert_ne!(p.part[0], p.part[1]);
    assert_eq!(p.objval, 1);
}

part_test! {
    name: large_kway_basic,
    options: make_options!(Kway Cut Grow),
    nparts: 20,
    vwgt: false,
    adjwgt: false,
}

part_test! {
    name: large_kway_vwgt,
    options: make_options!(Kway Cut Grow),
    nparts: 20,
    vwgt: true,
    adjwgt: false,
}

part_test! {
    name: large_kway_vwgt_adjwgt,
    options: make_options!(Kway Cut Grow),
    nparts: 20,
    vwgt: true,
    adjwgt: true,
}

part_test! {
    name: large_kway_halve,
    options: make_options!(Kway Cut Grow),
    nparts: 2,
    vwgt: false,
    adjwgt: false,
}

part_test! {
    name: large_kway_adjwgt,
    options: make_options!(Kway Cut Grow),
    nparts: 20,
    vwgt: false,
    adjwgt: true,
}

part_test! {
    name: large_kway_rb_init,
    options: make_options!(Kway Cut MetisRb),
    nparts: 12,
    vwgt: false,
    adjwgt: true,
}

part_test! {
    name: large_kway_random_init,
    options: make_options!(Kway Cut Random),
    nparts: 8,
    vwgt: false,
    adjwgt: false,
}

part_test! {
    name: large_kway_vol_basic,
    options: make_options!(Kway Vol Grow),
    nparts: 20,
    vwgt: false,
    adjwgt: false,
}

part_test! {
    name: large_kway_vol_vwgt,
    options: make_options!(Kway Vol Grow),
    nparts: 20,
    vwgt: true,
    adjwgt: false,
}

part_test! {
    name: large_rb_basic,
    options: make_options!(Rb Cut Grow),
    nparts: 20,
    vwgt: false,
    adjwgt: false,
}

part_test! {
    name: large_rb_vwgt_adjwgt,
    options: make_options!(Rb Cut Grow),
    nparts: 7,
    vwgt: true,
    adjwgt: true,
}

part_test! {
    name: large_rb_random_init,
    options: make_options!(Rb Cut Random),
    nparts: 4,
    vwgt: false,
    adjwgt: true,
}

part_test! {
    name: large_rb_vol,
    options: make_options!(Rb Vol Grow),
    nparts: 6,
    vwgt: false,
    adjwgt: false,
}
