mod common;

use common::*;
use mlpart::stat::{compute_cut, compute_volume, PartitionInfo};
use mlpart::{part_graph_kway, part_graph_recursive, Error, Iptype};

#[test]
fn four_cycle_bisection() {
    init_logging();
    let g = Graph::new(vec![0, 2, 4, 6, 8], vec![1, 3, 0, 2, 1, 3, 0, 2]).unwrap();
    for p in [
        part_graph_kway(&g, 2, &Options::default()).unwrap(),
        part_graph_recursive(&g, 2, &Options::default()).unwrap(),
    ] {
        assert!(p.objval <= 2, "cut {}", p.objval);
        assert_eq!(p.objval, compute_cut(&g, &p.part).unwrap());
        assert_valid_partition(&g, &p.part, 2);
    }
}

#[test]
fn disjoint_triangles_are_not_cut() {
    init_logging();
    let g = from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    for p in [
        part_graph_kway(&g, 2, &Options::default()).unwrap(),
        part_graph_recursive(&g, 2, &Options::default()).unwrap(),
    ] {
        assert_eq!(p.objval, 0, "{:?}", p.part);
        assert_eq!(p.part[0], p.part[1]);
        assert_eq!(p.part[1], p.part[2]);
        assert_ne!(p.part[0], p.part[3]);
    }
}

#[test]
fn same_seed_same_partition() {
    let g = grid(20, 20);
    let opts = Options {
        seed: Some(99),
        ..Options::default()
    };
    let a = part_graph_kway(&g, 6, &opts).unwrap();
    let b = part_graph_kway(&g, 6, &opts).unwrap();
    assert_eq!(a, b);

    let a = part_graph_recursive(&g, 6, &opts).unwrap();
    let b = part_graph_recursive(&g, 6, &opts).unwrap();
    assert_eq!(a, b);
}

#[test]
fn grid_partitions_are_balanced_and_reported() {
    init_logging();
    let g = grid(32, 32);
    for nparts in [2, 3, 8, 16] {
        let p = part_graph_kway(&g, nparts, &Options::default()).unwrap();
        assert_valid_partition(&g, &p.part, nparts);
        assert!(part_weights(&g, &p.part, nparts).iter().all(|&w| w > 0));

        let info = PartitionInfo::compute(&g, &p.part, nparts, None).unwrap();
        assert_eq!(info.edgecut, p.objval);
        assert_eq!(info.pwgts.iter().sum::<idx_t>(), 1024);
    }
}

#[test]
fn volume_objective() {
    let g = grid(24, 24);
    let opts = Options {
        objtype: Objtype::Vol,
        ..Options::default()
    };
    let p = part_graph_kway(&g, 4, &opts).unwrap();
    assert_eq!(p.objval, compute_volume(&g, &p.part).unwrap());
    assert_valid_partition(&g, &p.part, 4);
}

#[test]
fn target_weights_are_followed() {
    let g = grid(20, 10);
    let opts = Options {
        tpwgts: Some(vec![0.2, 0.3, 0.5]),
        ..Options::default()
    };
    for p in [
        part_graph_kway(&g, 3, &opts).unwrap(),
        part_graph_recursive(&g, 3, &opts).unwrap(),
    ] {
        let pw = part_weights(&g, &p.part, 3);
        for (w, t) in pw.iter().zip([0.2, 0.3, 0.5]) {
            assert!(*w as f64 <= 1.1 * t * 200.0 + 1.0, "{pw:?}");
        }
    }
}

#[test]
fn heavy_vertices_and_edges() {
    // a path whose middle edge is light: cutting there is optimal
    let g = Graph::with_weights(
        vec![0, 1, 3, 5, 7, 9, 10],
        vec![1, 0, 2, 1, 3, 2, 4, 3, 5, 4],
        Some(vec![2, 2, 2, 2, 2, 2]),
        Some(vec![9, 9, 9, 9, 1, 1, 9, 9, 9, 9]),
        1,
    )
    .unwrap();
    let p = part_graph_recursive(&g, 2, &Options::default()).unwrap();
    assert_eq!(p.objval, 1);
    assert_eq!(&p.part[..3], &[p.part[0]; 3]);
    assert_ne!(p.part[0], p.part[3]);
}

#[test]
fn small_sparse_graphs_end_up_evenly_split() {
    let isolated = Graph::new(vec![0; 32], vec![]).unwrap();
    let path: Vec<(usize, usize)> = (1..20).map(|i| (i - 1, i)).collect();
    let cases = [
        (isolated, 9),
        (from_edges(20, &path), 9),
        (from_edges(20, &[(0, 1), (5, 6), (11, 12)]), 9),
        (from_edges(2, &[]), 5),
    ];
    for (g, nparts) in cases {
        let n = g.vertex_count();
        for seed in 0..5 {
            let opts = Options { seed: Some(seed), ..Options::default() };
            let p = part_graph_recursive(&g, nparts, &opts).unwrap();
            assert_valid_partition(&g, &p.part, nparts);
            let heaviest = part_weights(&g, &p.part, nparts).into_iter().max().unwrap();
            assert!(heaviest as usize <= n.div_ceil(nparts), "n={n} nparts={nparts} {:?}", p.part);
        }
    }
}

#[test]
fn single_part_and_empty_graph() {
    let g = grid(5, 5);
    let p = part_graph_kway(&g, 1, &Options::default()).unwrap();
    assert!(p.part.iter().all(|&x| x == 0));
    assert_eq!(p.objval, 0);

    let empty = Graph::new(vec![0], vec![]).unwrap();
    assert!(part_graph_kway(&empty, 4, &Options::default()).unwrap().part.is_empty());
    assert!(part_graph_recursive(&empty, 4, &Options::default()).unwrap().part.is_empty());
}

#[test]
fn invalid_requests_are_rejected() {
    let g = cycle(8);
    assert!(matches!(part_graph_kway(&g, 0, &Options::default()), Err(Error::InvalidInput(_))));

    let bad_ub = Options {
        ubvec: Some(vec![0.9]),
        ..Options::default()
    };
    assert!(matches!(part_graph_kway(&g, 2, &bad_ub), Err(Error::InvalidInput(_))));

    let bad_tp = Options {
        tpwgts: Some(vec![0.5, 0.6]),
        ..Options::default()
    };
    assert!(matches!(part_graph_recursive(&g, 2, &bad_tp), Err(Error::InvalidInput(_))));

    let rb_init = Options {
        iptype: Some(Iptype::MetisRb),
        ..Options::default()
    };
    assert!(part_graph_recursive(&g, 2, &rb_init).is_err());
    assert!(part_graph_kway(&g, 2, &rb_init).is_ok());

    assert!(Graph::new(vec![0, 1, 1], vec![1]).is_err(), "asymmetric adjacency");
    assert!(Graph::new(vec![0, 1], vec![0]).is_err(), "self loop");
}

#[test]
fn ptype_selects_the_driver_for_rb() {
    let g = grid(12, 12);
    let opts = Options {
        ptype: Ptype::Rb,
        ncuts: 3,
        ..Options::default()
    };
    let p = part_graph_recursive(&g, 4, &opts).unwrap();
    assert_valid_partition(&g, &p.part, 4);
    assert_eq!(p.objval, compute_cut(&g, &p.part).unwrap());
}
