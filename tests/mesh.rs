mod common;

use common::*;
use mlpart::graphio::parse_mesh;
use mlpart::{mesh_to_dual, mesh_to_nodal, part_mesh_dual, part_mesh_nodal};

fn sorted_adjacency(g: &Graph) -> Vec<Vec<idx_t>> {
    (0..g.vertex_count())
        .map(|v| {
            let mut n = g.neighbors(v).to_vec();
            n.sort_unstable();
            n
        })
        .collect()
}

#[test]
fn hex_mesh_graphs() {
    let mesh = hex_mesh(3, 3, 3);
    assert_eq!(mesh.element_count(), 27);
    assert_eq!(mesh.node_count(), 64);

    // faces, then faces and edges, then everything touching
    let faces = mesh_to_dual(&mesh, 4).unwrap();
    assert_eq!(faces.neighbors(13).len(), 6);
    assert_eq!(faces.edge_count(), 3 * 2 * 9);
    let edges = mesh_to_dual(&mesh, 2).unwrap();
    assert_eq!(edges.neighbors(13).len(), 18);
    let corners = mesh_to_dual(&mesh, 1).unwrap();
    assert_eq!(corners.neighbors(13).len(), 26);

    let nodal = mesh_to_nodal(&mesh).unwrap();
    assert_eq!(nodal.vertex_count(), 64);
    // an interior node shares an element with every node of its 3x3x3 block
    assert_eq!(nodal.neighbors(21).len(), 26);
    nodal.check().unwrap();
}

#[test]
fn conversions_are_repeatable() {
    let mesh = hex_mesh(4, 3, 2);
    for ncommon in 1..=4 {
        let a = mesh_to_dual(&mesh, ncommon).unwrap();
        let b = mesh_to_dual(&mesh, ncommon).unwrap();
        assert_eq!(sorted_adjacency(&a), sorted_adjacency(&b));
    }
    assert_eq!(
        sorted_adjacency(&mesh_to_nodal(&mesh).unwrap()),
        sorted_adjacency(&mesh_to_nodal(&mesh).unwrap())
    );
}

#[test]
fn dual_partition_of_a_hex_mesh() {
    init_logging();
    let mesh = hex_mesh(6, 6, 4);
    let p = part_mesh_dual(&mesh, 4, 6, &Options::default()).unwrap();
    let dual = mesh_to_dual(&mesh, 4).unwrap();
    assert_valid_partition(&dual, &p.epart, 6);
    assert_eq!(p.objval, mlpart::stat::compute_cut(&dual, &p.epart).unwrap());

    assert_eq!(p.npart.len(), mesh.node_count());
    assert!(p.npart.iter().all(|&x| (0..6).contains(&x)));
    for n in 0..mesh.node_count() {
        let owner = p.npart[n];
        assert!(
            (0..mesh.element_count())
                .any(|e| p.epart[e] == owner && mesh.element_nodes(e).contains(&(n as idx_t))),
            "node {n} is not in a part of its elements"
        );
    }
}

#[test]
fn nodal_partition_by_recursive_bisection() {
    let mesh = hex_mesh(5, 4, 3);
    let opts = Options {
        ptype: Ptype::Rb,
        ..Options::default()
    };
    let p = part_mesh_nodal(&mesh, 3, &opts).unwrap();
    let nodal = mesh_to_nodal(&mesh).unwrap();
    assert_valid_partition(&nodal, &p.npart, 3);
    assert_eq!(p.objval, mlpart::stat::compute_cut(&nodal, &p.npart).unwrap());
    assert_eq!(p.epart.len(), 60);
    for e in 0..60 {
        assert!(mesh.element_nodes(e).iter().any(|&n| p.npart[n as usize] == p.epart[e]));
    }
}

#[test]
fn mesh_file_to_partition() {
    // two triangles and a quad, 1-based
    let text = "% mixed mesh\n3\n1 2 3\n2 3 4\n4 5 6 7\n";
    let mesh = parse_mesh(text.as_bytes()).unwrap();
    assert_eq!(mesh.element_count(), 3);
    assert_eq!(mesh.node_count(), 7);
    let p = part_mesh_dual(&mesh, 1, 2, &Options::default()).unwrap();
    assert_eq!(p.epart.len(), 3);
    assert_eq!(p.npart.len(), 7);
}
