//! Partitions a graph file: `gpmetis [options] graphfile nparts`.
//!
//! The partition is written to `graphfile.part.nparts`, one part id per line,
//! and the quality of the partitioning is reported on stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use mlpart::graphio::{partition_path, read_graph, read_tpwgts, write_partition};
use mlpart::stat::PartitionInfo;
use mlpart::{idx_t, real_t, DbgLvl, Graph, Options};

#[derive(Parser)]
#[command(name = "gpmetis", version, about = "Multilevel graph partitioning")]
struct Cli {
    /// Stores the graph to be partitioned.
    graph_file: PathBuf,

    /// The number of partitions to split the graph.
    nparts: usize,

    /// Scheme used for computing the k-way partitioning
    #[arg(long, default_value = "kway")]
    ptype: Ptype,

    /// Objective the partitioning routines optimize
    #[arg(long, default_value = "cut")]
    objtype: Objtype,

    /// Scheme used to match the vertices of the graph during coarsening
    #[arg(long, default_value = "shem")]
    ctype: Ctype,

    /// Scheme used to compute the initial partitioning
    #[arg(long)]
    iptype: Option<Iptype>,

    /// Do not perform 2-hop matchings when the standard matching fails to
    /// sufficiently contract the graph
    #[arg(long)]
    no2hop: bool,

    /// File with the target weight of each partition; by default all
    /// partitions are assumed to be of the same size
    #[arg(long)]
    tpwgts: Option<PathBuf>,

    /// Maximum allowed load imbalance: x means 1+x/1000. Defaults to 100,
    /// or 200 for 16 or more parts.
    #[arg(long)]
    ufactor: Option<u32>,

    /// Allowed load imbalance as a factor, e.g. "1.05"; takes priority over ufactor
    #[arg(long)]
    ubvec: Option<String>,

    /// Number of initial partitions to compute
    #[arg(long)]
    niparts: Option<usize>,

    /// Number of refinement iterations at each stage of the uncoarsening process
    #[arg(long, default_value = "10")]
    niter: usize,

    /// Number of different partitionings to compute; the best one is kept
    #[arg(long, default_value = "1")]
    ncuts: usize,

    /// Seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Debug level, a sum of the METIS dbglvl flags
    #[arg(long, default_value = "0")]
    dbglvl: u32,

    /// Do not write the partition file
    #[arg(long)]
    nooutput: bool,

    /// Write the partition here instead of graphfile.part.nparts
    #[arg(long)]
    outfile: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Ptype {
    /// Recursive bisectioning
    Rb,
    /// Direct k-way partitioning
    Kway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Objtype {
    /// Minimize the edgecut
    Cut,
    /// Minimize the total communication volume
    Vol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Ctype {
    /// Random matching
    Rm,
    /// Sorted heavy-edge matching
    Shem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Iptype {
    /// Grow a partitioning using a greedy scheme
    Grow,
    /// Compute a partitioning at random
    Random,
    /// Recursive bisection of the coarsest graph (kway only)
    Rb,
}

fn error<T: std::fmt::Display>(msg: T) -> ExitCode {
    eprintln!("{msg}");
    ExitCode::FAILURE
}

fn parse_ubvec(s: &str) -> Result<Vec<real_t>, String> {
    s.split_whitespace()
        .enumerate()
        .map(|(i, ub)| {
            ub.parse::<real_t>()
                .map_err(|e| format!("Error parsing entry {i} of ubvec [{s}]: {e}"))
        })
        .collect()
}

fn make_options(cli: &Cli, tpwgts: Option<Vec<real_t>>) -> Result<Options, String> {
    Ok(Options {
        ptype: match cli.ptype {
            Ptype::Rb => mlpart::Ptype::Rb,
            Ptype::Kway => mlpart::Ptype::Kway,
        },
        objtype: match cli.objtype {
            Objtype::Cut => mlpart::Objtype::Cut,
            Objtype::Vol => mlpart::Objtype::Vol,
        },
        ctype: match cli.ctype {
            Ctype::Rm => mlpart::Ctype::Rm,
            Ctype::Shem => mlpart::Ctype::Shem,
        },
        iptype: cli.iptype.map(|ip| match ip {
            Iptype::Grow => mlpart::Iptype::Grow,
            Iptype::Random => mlpart::Iptype::Random,
            Iptype::Rb => mlpart::Iptype::MetisRb,
        }),
        niter: cli.niter,
        ncuts: cli.ncuts,
        niparts: cli.niparts,
        seed: cli.seed,
        ufactor: cli.ufactor.map(|u| u as real_t / 1000.0),
        ubvec: cli.ubvec.as_deref().map(parse_ubvec).transpose()?,
        tpwgts,
        no2hop: cli.no2hop,
        dbglvl: DbgLvl::from_bits(cli.dbglvl),
        ..Options::default()
    })
}

fn print_gp_info(cli: &Cli, graph: &Graph, options: &Options) {
    println!("******************************************************************************");
    println!("mlpart {}", mlpart::version());
    println!(
        " size of idx_t: {}bits, real_t: {}bits",
        idx_t::BITS,
        8 * std::mem::size_of::<real_t>()
    );
    println!();
    println!("Graph Information -----------------------------------------------------------");
    println!(
        " Name: {}, #Vertices: {}, #Edges: {}, #Parts: {}",
        cli.graph_file.display(),
        graph.vertex_count(),
        graph.edge_count(),
        cli.nparts
    );
    println!();
    println!("Options ---------------------------------------------------------------------");
    println!(
        " ptype={:?}, objtype={:?}, ctype={:?}, iptype={}",
        options.ptype,
        options.objtype,
        options.ctype,
        options.iptype.map_or("default".to_string(), |ip| format!("{ip:?}"))
    );
    println!(
        " dbglvl={}, ufactor={}, no2hop={}, nooutput={}",
        cli.dbglvl,
        options.ufactor.map_or("default".to_string(), |u| format!("{:.3}", 1.0 + u)),
        if cli.no2hop { "YES" } else { "NO" },
        if cli.nooutput { "YES" } else { "NO" }
    );
    println!(
        " seed={}, niparts={}, niter={}, ncuts={}",
        options.seed.map_or("default".to_string(), |s| s.to_string()),
        options.niparts.map_or("default".to_string(), |n| n.to_string()),
        options.niter,
        options.ncuts
    );
    if let Some(ubvec) = options.ubvec.as_deref() {
        let ubs: Vec<String> = ubvec.iter().map(|ub| format!("{ub:.2}")).collect();
        println!(" ubvec=({})", ubs.join(" "));
    }
    println!();
    match options.ptype {
        mlpart::Ptype::Rb => println!("Recursive Partitioning ------------------------------------------------------"),
        mlpart::Ptype::Kway => println!("Direct k-way Partitioning ---------------------------------------------------"),
    }
}

fn report_gp_results(info: &PartitionInfo, iotime: Duration, parttime: Duration, reporttime: Duration) {
    println!(" {info}");
    println!();
    println!("Timing Information ----------------------------------------------------------");
    println!("  I/O:          \t\t {:7.3} sec", iotime.as_secs_f64());
    println!("  Partitioning: \t\t {:7.3} sec", parttime.as_secs_f64());
    println!("  Reporting:    \t\t {:7.3} sec", reporttime.as_secs_f64());
    println!("******************************************************************************");
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.dbglvl > 0 { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if cli.nparts < 2 {
        return error("The number of partitions must be greater than 1!");
    }

    let start = Instant::now();
    let graph = match read_graph(&cli.graph_file) {
        Ok(graph) => graph,
        Err(e) => return error(format_args!("Failed to read {}: {e}", cli.graph_file.display())),
    };
    let tpwgts = match cli.tpwgts.as_deref().map(|p| read_tpwgts(p, cli.nparts)).transpose() {
        Ok(tpwgts) => tpwgts,
        Err(e) => return error(format_args!("Failed to read the target weights: {e}")),
    };
    let mut iotime = start.elapsed();

    let options = match make_options(&cli, tpwgts) {
        Ok(options) => options,
        Err(e) => return error(e),
    };
    print_gp_info(&cli, &graph, &options);

    let start = Instant::now();
    let result = match options.ptype {
        mlpart::Ptype::Rb => mlpart::part_graph_recursive(&graph, cli.nparts, &options),
        mlpart::Ptype::Kway => mlpart::part_graph_kway(&graph, cli.nparts, &options),
    };
    let parttime = start.elapsed();

    let partition = match result {
        Ok(p) => p,
        Err(e) => return error(format_args!("\n***Partitioning failed: {e}")),
    };

    if !cli.nooutput {
        let start = Instant::now();
        let path = cli
            .outfile
            .clone()
            .unwrap_or_else(|| partition_path(&cli.graph_file, cli.nparts));
        if let Err(e) = write_partition(&path, &partition.part) {
            return error(format_args!("Failed to write {}: {e}", path.display()));
        }
        iotime += start.elapsed();
    }

    let start = Instant::now();
    let info = match PartitionInfo::compute(&graph, &partition.part, cli.nparts, options.tpwgts.as_deref()) {
        Ok(info) => info,
        Err(e) => return error(e),
    };
    let reporttime = start.elapsed();
    report_gp_results(&info, iotime, parttime, reporttime);

    ExitCode::SUCCESS
}
