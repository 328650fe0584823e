mod common;

use common::*;
use mlpart::graphio::{partition_path, write_graph};

#[test]
fn partitions_a_graph_file() {
    let dir = scratch_dir("gpmetis-basic");
    let file = dir.join("grid.graph");
    write_graph(&grid(16, 16), &file).unwrap();

    let out = gpmetis(&[file.to_str().unwrap(), "4"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Edgecut"), "{stdout}");
    assert!(stdout.contains("Direct k-way Partitioning"));

    let text = std::fs::read_to_string(partition_path(&file, 4)).unwrap();
    let part: Vec<idx_t> = text.lines().map(|l| l.trim().parse().unwrap()).collect();
    assert_valid_partition(&grid(16, 16), &part, 4);
}

#[test]
fn recursive_bisection_with_options() {
    let dir = scratch_dir("gpmetis-rb");
    let file = dir.join("grid.graph");
    let outfile = dir.join("grid.out");
    write_graph(&grid(12, 9), &file).unwrap();

    let out = gpmetis(&[
        "--ptype",
        "rb",
        "--ufactor",
        "50",
        "--seed",
        "3",
        "--outfile",
        outfile.to_str().unwrap(),
        file.to_str().unwrap(),
        "3",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Recursive Partitioning"));
    assert_eq!(std::fs::read_to_string(outfile).unwrap().lines().count(), 108);
    assert!(!partition_path(&file, 3).exists());
}

#[test]
fn bad_input_fails() {
    let dir = scratch_dir("gpmetis-bad");
    let file = dir.join("broken.graph");
    std::fs::write(&file, "3 2\n2\n1 3\n").unwrap();

    let out = gpmetis(&[file.to_str().unwrap(), "2"]);
    assert!(!out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).is_empty());

    let out = gpmetis(&[file.to_str().unwrap(), "1"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("greater than 1"));
}
