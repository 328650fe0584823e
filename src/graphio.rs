/*
* Copyright 1997, Regents of the University of Minnesota
*
* io.c
*
* This file contains routines related to I/O
*
* Started 8/28/94
* George
*
* $Id: io.c 17513 2014-08-05 16:20:50Z dominique $
*
*/

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::mesh::Mesh;
use crate::util::try_with_capacity;
use crate::{idx_t, real_t};

fn parse_err(line: usize, msg: impl Into<String>) -> Error {
    Error::Parse { line, msg: msg.into() }
}

/// Lines of a METIS input file with their 1-based line numbers, comments
/// (lines starting with `%`) removed.
struct Lines<R> {
    inner: std::io::Lines<R>,
    lineno: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Lines {
            inner: reader.lines(),
            lineno: 0,
        }
    }

    /// The next non-comment line, `None` at the end of the input
    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        for line in self.inner.by_ref() {
            let line = line?;
            self.lineno += 1;
            if !line.starts_with('%') {
                return Ok(Some((self.lineno, line)));
            }
        }
        Ok(None)
    }

    /// The next line that is neither a comment nor blank
    fn next_nonblank(&mut self) -> Result<Option<(usize, String)>> {
        while let Some((lineno, line)) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some((lineno, line)));
            }
        }
        Ok(None)
    }
}

/// Parses the whitespace separated integers of `line`
fn integers(lineno: usize, line: &str) -> Result<Vec<i64>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<i64>()
                .map_err(|e| parse_err(lineno, format!("'{tok}' is not an integer [{e}]")))
        })
        .collect()
}

fn to_idx(lineno: usize, v: i64, what: &str) -> Result<idx_t> {
    idx_t::try_from(v).map_err(|_| parse_err(lineno, format!("{what} {v} does not fit the index type")))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/*************************************************************************/
/* This function reads in a sparse graph */
/*************************************************************************/
pub fn read_graph(path: impl AsRef<Path>) -> Result<Graph> {
    parse_graph(open(path.as_ref())?)
}

/// Reads a graph in the METIS text format from `reader`.
///
/// The header is `n m [fmt [ncon]]` where the digits of `fmt` turn on vertex
/// sizes, vertex weights and edge weights. Vertex lines follow, one per vertex
/// with 1-based neighbor ids; a blank line is a vertex without neighbors.
/// Vertex sizes are read and checked but not kept.
pub fn parse_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut lines = Lines::new(reader);

    let Some((hline, header)) = lines.next_nonblank()? else {
        return Err(Error::input("the graph file is empty"));
    };
    let fields = integers(hline, &header)?;
    if fields.len() < 2 || fields.len() > 4 {
        return Err(parse_err(hline, "the header must be 'nvtxs nedges [fmt [ncon]]'"));
    }
    let (nvtxs, nedges) = (fields[0], fields[1]);
    let fmt = fields.get(2).copied().unwrap_or(0);
    let ncon = fields.get(3).copied().unwrap_or(0);

    if nvtxs < 0 || nedges < 0 {
        return Err(Error::input(format!(
            "The supplied nvtxs:{nvtxs} and nedges:{nedges} must not be negative."
        )));
    }
    if !(0..=111).contains(&fmt) || fmt % 10 > 1 || (fmt / 10) % 10 > 1 {
        return Err(parse_err(hline, format!("Cannot read this type of file format [fmt={fmt}]!")));
    }
    let readvs = fmt / 100 == 1;
    let readvw = (fmt / 10) % 10 == 1;
    let readew = fmt % 10 == 1;

    if ncon > 0 && !readvw {
        return Err(Error::input(format!(
            "You specified ncon={ncon}, but the fmt parameter does not specify vertex weights"
        )));
    }
    if ncon < 0 {
        return Err(parse_err(hline, format!("ncon must not be negative, got {ncon}")));
    }

    let nvtxs = nvtxs as usize;
    let nedges = 2 * nedges as usize;
    let ncon = (ncon as usize).max(1);

    let mut xadj: Vec<idx_t> = try_with_capacity(nvtxs + 1, "ReadGraph: xadj")?;
    let mut adjncy: Vec<idx_t> = try_with_capacity(nedges, "ReadGraph: adjncy")?;
    let mut vwgt: Vec<idx_t> = try_with_capacity(if readvw { nvtxs * ncon } else { 0 }, "ReadGraph: vwgt")?;
    let mut adjwgt: Vec<idx_t> = try_with_capacity(if readew { nedges } else { 0 }, "ReadGraph: adjwgt")?;
    xadj.push(0);

    /*----------------------------------------------------------------------
     * Read the sparse graph file
     *---------------------------------------------------------------------*/
    for i in 0..nvtxs {
        let Some((lineno, line)) = lines.next_line()? else {
            return Err(Error::input(format!(
                "Premature end of input file while reading vertex {}",
                i + 1
            )));
        };
        let mut fields = integers(lineno, &line)?.into_iter();

        /* Read vertex sizes */
        if readvs {
            match fields.next() {
                Some(s) if s >= 0 => {}
                Some(s) => return Err(parse_err(lineno, format!("The size for vertex {} must be >= 0, got {s}", i + 1))),
                None => return Err(parse_err(lineno, format!("The line for vertex {} does not have vsize information", i + 1))),
            }
        }

        /* Read vertex weights */
        if readvw {
            for l in 0..ncon {
                let Some(w) = fields.next() else {
                    return Err(parse_err(
                        lineno,
                        format!("The line for vertex {} does not have enough weights for the {ncon} constraints.", i + 1),
                    ));
                };
                if w < 0 {
                    return Err(parse_err(
                        lineno,
                        format!("The weight vertex {} and constraint {l} must be >= 0", i + 1),
                    ));
                }
                vwgt.push(to_idx(lineno, w, "weight")?);
            }
        }

        while let Some(edge) = fields.next() {
            if edge < 1 || edge > nvtxs as i64 {
                return Err(parse_err(lineno, format!("Edge {edge} for vertex {} is out of bounds", i + 1)));
            }
            if readew {
                let Some(ewgt) = fields.next() else {
                    return Err(parse_err(lineno, format!("Premature end of line for vertex {}", i + 1)));
                };
                if ewgt <= 0 {
                    return Err(parse_err(
                        lineno,
                        format!("The weight ({ewgt}) for edge ({}, {edge}) must be positive.", i + 1),
                    ));
                }
                adjwgt.push(to_idx(lineno, ewgt, "edge weight")?);
            }

            if adjncy.len() == nedges {
                return Err(Error::input(format!(
                    "There are more edges in the file than the {} specified.",
                    nedges / 2
                )));
            }
            adjncy.push((edge - 1) as idx_t);
        }
        xadj.push(adjncy.len() as idx_t);
    }

    if adjncy.len() != nedges {
        let hint = if 2 * adjncy.len() == nedges {
            " It looks like the header counts every edge twice; each edge between u and v counts once."
        } else {
            ""
        };
        return Err(Error::input(format!(
            "In the first line of the file, you specified that the graph contained {} edges. \
             However, I only found {} edges in the file.{hint}",
            nedges / 2,
            adjncy.len() / 2
        )));
    }

    Graph::with_weights(
        xadj,
        adjncy,
        readvw.then_some(vwgt),
        readew.then_some(adjwgt),
        ncon,
    )
}

/*************************************************************************/
/* This function writes a graph into a file  */
/*************************************************************************/
pub fn write_graph(graph: &Graph, path: impl AsRef<Path>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_graph_to(graph, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Writes `graph` in the METIS text format. Weights are written only when
/// some of them differ from 1.
pub fn write_graph_to<W: Write>(graph: &Graph, out: &mut W) -> Result<()> {
    let nvtxs = graph.vertex_count();
    let ncon = graph.ncon();

    /* determine if the graph has non-unity vwgt or adjwgt */
    let hasvwgt = graph.vwgt().is_some_and(|w| w.iter().any(|&x| x != 1)) || ncon > 1;
    let hasewgt = graph.adjwgt().is_some_and(|w| w.iter().any(|&x| x != 1));

    /* write the header line */
    write!(out, "{} {}", nvtxs, graph.edge_count())?;
    if hasvwgt || hasewgt {
        write!(out, " 0{}{}", u8::from(hasvwgt), u8::from(hasewgt))?;
        if ncon > 1 {
            write!(out, " {ncon}")?;
        }
    }
    writeln!(out)?;

    /* write the rest of the graph */
    for i in 0..nvtxs {
        let mut sep = "";
        if hasvwgt {
            for c in 0..ncon {
                write!(out, "{sep}{}", graph.vertex_weight(i, c))?;
                sep = " ";
            }
        }
        let ewgts = graph.edge_weights(i);
        for (j, &k) in graph.neighbors(i).iter().enumerate() {
            write!(out, "{sep}{}", k + 1)?;
            sep = " ";
            if hasewgt {
                write!(out, " {}", ewgts.map_or(1, |w| w[j]))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/*************************************************************************/
/* This function reads in a mesh */
/*************************************************************************/
pub fn read_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    parse_mesh(open(path.as_ref())?)
}

/// Reads a mesh: a header `ne [ncon]` followed by one line per element with
/// its 1-based node ids, preceded by the element weight when `ncon` is 1.
pub fn parse_mesh<R: BufRead>(reader: R) -> Result<Mesh> {
    let mut lines = Lines::new(reader);

    let Some((hline, header)) = lines.next_nonblank()? else {
        return Err(Error::input("the mesh file is empty"));
    };
    let fields = integers(hline, &header)?;
    let (ne, ncon) = match fields[..] {
        [ne] => (ne, 0),
        [ne, ncon] => (ne, ncon),
        _ => return Err(parse_err(hline, "the header must be 'ne [ncon]'")),
    };
    if ne < 0 || !(0..=1).contains(&ncon) {
        return Err(Error::input(format!(
            "The supplied ne:{ne} must not be negative and ncon:{ncon} must be 0 or 1."
        )));
    }

    let ne = ne as usize;
    let mut eptr: Vec<idx_t> = Vec::with_capacity(ne + 1);
    let mut eind: Vec<idx_t> = Vec::new();
    let mut ewgt: Vec<idx_t> = Vec::new();
    eptr.push(0);

    for e in 0..ne {
        let Some((lineno, line)) = lines.next_nonblank()? else {
            return Err(Error::input(format!(
                "Premature end of input file while reading element {}",
                e + 1
            )));
        };
        let mut fields = integers(lineno, &line)?.into_iter();
        if ncon == 1 {
            match fields.next() {
                Some(w) if w >= 0 => ewgt.push(to_idx(lineno, w, "weight")?),
                _ => return Err(parse_err(lineno, format!("Element {} has no valid weight", e + 1))),
            }
        }
        for node in fields {
            if node < 1 {
                return Err(parse_err(lineno, format!("Node {node} of element {} is out of bounds", e + 1)));
            }
            eind.push(to_idx(lineno, node - 1, "node id")?);
        }
        eptr.push(eind.len() as idx_t);
    }

    let mesh = Mesh::new(eptr, eind)?;
    if ncon == 1 {
        mesh.with_element_weights(ewgt)
    } else {
        Ok(mesh)
    }
}

/*************************************************************************/
/* This function reads in the target partition weights. Every line is
   `from[-to] = wgt`; parts without a line share what is left of 1.0.
*/
/*************************************************************************/
pub fn read_tpwgts(path: impl AsRef<Path>, nparts: usize) -> Result<Vec<real_t>> {
    parse_tpwgts(open(path.as_ref())?, nparts)
}

pub fn parse_tpwgts<R: BufRead>(reader: R, nparts: usize) -> Result<Vec<real_t>> {
    let mut lines = Lines::new(reader);
    let mut tpwgts: Vec<real_t> = vec![-1.0; nparts];

    while let Some((lineno, line)) = lines.next_nonblank()? {
        let line = line.replace(' ', "");
        let Some((range, wgt)) = line.split_once('=') else {
            return Err(parse_err(lineno, format!("The 'wgt' component of line <{line}> is missing.")));
        };
        let bound = |s: &str| {
            s.parse::<usize>()
                .map_err(|e| parse_err(lineno, format!("The range of line <{line}> is incorrect [{e}]")))
        };
        let (from, to) = match range.split_once('-') {
            Some((from, to)) => (bound(from)?, bound(to)?),
            None => (bound(range)?, bound(range)?),
        };
        let awgt: real_t = wgt
            .parse()
            .map_err(|e| parse_err(lineno, format!("The 'wgt' component of line <{line}> is incorrect [{e}]")))?;

        if from > to || to >= nparts {
            return Err(Error::input(format!("Invalid partition range for {from}:{to}")));
        }
        if awgt <= 0.0 || awgt >= 1.0 {
            return Err(Error::input(format!("Invalid partition weight of {awgt}")));
        }
        tpwgts[from..=to].fill(awgt);
    }

    /* Assign the left-over weight to the remaining partitions */
    let twgt: real_t = tpwgts.iter().filter(|&&t| t > 0.0).sum();
    let nleft = tpwgts.iter().filter(|&&t| t < 0.0).count();
    if nleft == 0 {
        for t in tpwgts.iter_mut() {
            *t /= twgt;
        }
    } else {
        if twgt > 1.0 {
            return Err(Error::input(format!(
                "The total specified target partition weights of {twgt} exceeds 1.0."
            )));
        }
        let awgt = (1.0 - twgt) / nleft as real_t;
        for t in tpwgts.iter_mut().filter(|t| **t < 0.0) {
            *t = awgt;
        }
    }
    Ok(tpwgts)
}

/// `<graphfile>.part.<nparts>`, where `gpmetis` puts its result
pub fn partition_path(graphfile: &Path, nparts: usize) -> PathBuf {
    let mut name = OsString::from(graphfile.as_os_str());
    name.push(format!(".part.{nparts}"));
    PathBuf::from(name)
}

/*************************************************************************/
/* This function writes out the partition vector, one part per line */
/*************************************************************************/
pub fn write_partition(path: impl AsRef<Path>, part: &[idx_t]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for p in part {
        writeln!(out, "{p}")?;
    }
    out.flush()?;
    Ok(())
}
