/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * meshpart.c
 *
 * This file contains routines for partitioning finite element meshes.
 *
 * Started 9/29/97
 * George
 *
 * $Id: meshpart.c 17513 2014-08-05 16:20:50Z dominique $
 *
 */

use crate::error::Result;
use crate::graph::Graph;
use crate::kmetis::part_graph_kway;
use crate::mesh::{mesh_to_dual, mesh_to_nodal, Mesh};
use crate::options::{Options, Ptype};
use crate::pmetis::part_graph_recursive;
use crate::util::{iargmax, iargmin, try_vec};
use crate::{idx_t, real_t, MeshPartition, Partition};

/// Marks a row that has not been given a part yet
const UNASSIGNED: idx_t = -1;

/// Partitions `graph` with the algorithm `options.ptype` selects
fn partition_by_ptype(graph: &Graph, nparts: usize, options: &Options) -> Result<Partition> {
    match options.ptype {
        Ptype::Kway => part_graph_kway(graph, nparts, options),
        Ptype::Rb => part_graph_recursive(graph, nparts, options),
    }
}

/// Puts `vwgt` on a graph that was built without vertex weights
fn with_vertex_weights(graph: Graph, vwgt: Option<&[idx_t]>) -> Result<Graph> {
    match vwgt {
        None => Ok(graph),
        Some(vwgt) => {
            let (xadj, adjncy, _, adjwgt) = graph.into_parts();
            Graph::with_weights(xadj, adjncy, Some(vwgt.to_vec()), adjwgt, 1)
        }
    }
}

/*************************************************************************
* This function partitions a finite element mesh by partitioning its nodal
* graph using KMETIS (or PMETIS) and then assigning elements in a load
* balanced fashion.
**************************************************************************/
pub fn part_mesh_nodal(mesh: &Mesh, nparts: usize, options: &Options) -> Result<MeshPartition> {
    /* get the nodal graph */
    let graph = with_vertex_weights(mesh_to_nodal(mesh)?, mesh.node_weights())?;

    /* partition the graph */
    let Partition { part: npart, objval } = partition_by_ptype(&graph, nparts, options)?;

    /* partition the other side of the mesh */
    let eptr: Vec<usize> = mesh.eptr.iter().map(|&x| x as usize).collect();
    let eind: Vec<usize> = mesh.eind.iter().map(|&x| x as usize).collect();
    let epart = induce_row_part_from_column_part(&eptr, &eind, &npart, nparts, options.tpwgts.as_deref())?;

    Ok(MeshPartition { epart, npart, objval })
}

/*************************************************************************
* This function partitions a finite element mesh by partitioning its dual
* graph using KMETIS (or PMETIS) and then assigning nodes in a load
* balanced fashion.
**************************************************************************/
pub fn part_mesh_dual(mesh: &Mesh, ncommon: usize, nparts: usize, options: &Options) -> Result<MeshPartition> {
    /* get the dual graph */
    let graph = with_vertex_weights(mesh_to_dual(mesh, ncommon)?, mesh.element_weights())?;

    /* partition the graph */
    let Partition { part: epart, objval } = partition_by_ptype(&graph, nparts, options)?;

    /* construct the node-element list and partition the other side */
    let (nptr, nind) = mesh.node_elements()?;
    let npart = induce_row_part_from_column_part(&nptr, &nind, &epart, nparts, options.tpwgts.as_deref())?;

    Ok(MeshPartition { epart, npart, objval })
}

/*************************************************************************/
/* Induces a partitioning of the rows based on a partitioning of the
   columns. It is used by both the Nodal and Dual routines.

   A row whose columns all share a part joins that part. A row spanning
   several parts joins the one it has most columns in unless that part is
   above its share, in which case the first spanned part that is less
   overloaded takes it. Empty rows go to the part with fewest rows.
*/
/*************************************************************************/
fn induce_row_part_from_column_part(
    rowptr: &[usize],
    rowind: &[usize],
    cpart: &[idx_t],
    nparts: usize,
    tpwgts: Option<&[real_t]>,
) -> Result<Vec<idx_t>> {
    let nrows = rowptr.len() - 1;
    let mut rpart = try_vec(nrows, UNASSIGNED, "InduceRowPartFromColumnPart: rpart")?;
    let mut pwgts = try_vec(nparts, 0 as idx_t, "InduceRowPartFromColumnPart: pwgts")?;
    let mut nbrmrk = try_vec(nparts, usize::MAX, "InduceRowPartFromColumnPart: nbrmrk")?;
    let mut nbrdom: Vec<usize> = Vec::new();
    let mut nbrwgt: Vec<idx_t> = Vec::new();

    /* setup the integer target partition weights */
    let itpwgts: Vec<idx_t> = match tpwgts {
        Some(tpwgts) => tpwgts
            .iter()
            .take(nparts)
            .map(|&t| (1.0 + nrows as real_t * t) as idx_t)
            .collect(),
        None => vec![1 + (nrows / nparts) as idx_t; nparts],
    };

    /* first assign the rows consisting only of columns that belong to
    a single partition */
    for i in 0..nrows {
        let row = &rowind[rowptr[i]..rowptr[i + 1]];
        let Some(&first) = row.first() else {
            continue;
        };
        let me = cpart[first];
        if row.iter().all(|&c| cpart[c] == me) {
            rpart[i] = me;
            pwgts[me as usize] += 1;
        }
    }

    /* next assign the rows consisting of columns belonging to multiple
    partitions in a balanced way */
    for i in 0..nrows {
        let row = &rowind[rowptr[i]..rowptr[i + 1]];
        if rpart[i] != UNASSIGNED || row.is_empty() {
            continue;
        }

        nbrdom.clear();
        nbrwgt.clear();
        for &c in row {
            let me = cpart[c] as usize;
            if nbrmrk[me] == usize::MAX {
                nbrmrk[me] = nbrdom.len();
                nbrdom.push(me);
                nbrwgt.push(1);
            } else {
                nbrwgt[nbrmrk[me]] += 1;
            }
        }

        /* assign it first to the domain with most things in common */
        let mut r = nbrdom[iargmax(&nbrwgt)];

        /* if overweight, assign it to the light domain */
        if pwgts[r] > itpwgts[r] {
            if let Some(&d) = nbrdom
                .iter()
                .find(|&&d| pwgts[d] < itpwgts[d] || pwgts[d] - itpwgts[d] < pwgts[r] - itpwgts[r])
            {
                r = d;
            }
        }
        rpart[i] = r as idx_t;
        pwgts[r] += 1;

        /* reset nbrmrk array */
        for &d in &nbrdom {
            nbrmrk[d] = usize::MAX;
        }
    }

    /* rows without columns */
    for i in 0..nrows {
        if rpart[i] == UNASSIGNED {
            let r = iargmin(&pwgts);
            rpart[i] = r as idx_t;
            pwgts[r] += 1;
        }
    }

    Ok(rpart)
}
