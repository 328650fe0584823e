/*
\file
\brief This file contains code for the separator refinement algorithms

\date   Started 8/1/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use crate::error::Result;
use crate::graph::{BndList, WorkGraph};
use crate::options::{Ctrl, DbgLvl, Rtype};
use crate::sfm::{fm_2way_node_balance, fm_2way_node_refine_1sided, fm_2way_node_refine_2sided};
use crate::timing::Timer;
use crate::util::try_vec;
use crate::{idx_t, ifset};

/*************************************************************************/
/* This function is the entry point of the separator refinement.
   The coarsest level of `levels` already carries a refined separator;
   it is projected level by level and balanced/refined on the way down
   until only level 0 is left.
*/
/*************************************************************************/
pub(crate) fn refine_2way_node(ctrl: &mut Ctrl, levels: &mut Vec<WorkGraph>) -> Result<()> {
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Uncoarsen));

    if levels.len() == 1 {
        compute_2way_node_partition_params(&mut levels[0])?;
    }

    while levels.len() > 1 {
        let Some(cgraph) = levels.pop() else {
            break;
        };
        let Some(graph) = levels.last_mut() else {
            break;
        };

        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Project));
        project_2way_node_partition(graph, &cgraph)?;
        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Project));
        drop(cgraph);

        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::Refine));
        fm_2way_node_balance(ctrl, graph)?;

        let niter = ctrl.niter;
        match ctrl.rtype {
            Rtype::Sep1Sided => fm_2way_node_refine_1sided(ctrl, graph, niter)?,
            _ => fm_2way_node_refine_2sided(ctrl, graph, niter)?,
        }
        ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Refine));
    }

    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::Uncoarsen));
    Ok(())
}

/*************************************************************************/
/* This function computes the part weights, the separator boundary and
   the weight of the neighbors of each separator vertex on either side.
   where_ must already hold a tri-section (2 marks the separator).
*/
/*************************************************************************/
pub(crate) fn compute_2way_node_partition_params(graph: &mut WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;

    graph.pwgts.clear();
    graph.pwgts.resize(3, 0);
    graph.bnd = BndList::new(nvtxs);
    if graph.nrinfo.len() != nvtxs {
        graph.nrinfo = try_vec(nvtxs, [0; 2], "Compute2WayNodePartitionParams: nrinfo")?;
    }

    /*------------------------------------------------------------
    / Compute now the separator external degrees
    /------------------------------------------------------------*/
    for i in 0..nvtxs {
        let me = graph.where_[i];
        debug_assert!(me <= 2);
        graph.pwgts[me] += graph.vwgt[i];

        if me == 2 {
            /* If it is on the separator do some computations */
            graph.bnd.insert(i);

            let mut edegrees: [idx_t; 2] = [0, 0];
            for j in graph.adj(i) {
                let k = graph.adjncy[j];
                let other = graph.where_[k];
                if other != 2 {
                    edegrees[other] += graph.vwgt[k];
                }
            }
            graph.nrinfo[i] = edegrees;
        }
    }

    graph.mincut = graph.pwgts[2];
    Ok(())
}

/*************************************************************************/
/* This function projects the node-based bisection */
/*************************************************************************/
pub(crate) fn project_2way_node_partition(graph: &mut WorkGraph, cgraph: &WorkGraph) -> Result<()> {
    let nvtxs = graph.nvtxs;
    graph.alloc_2way_node()?;

    /* Project the partition */
    for i in 0..nvtxs {
        graph.where_[i] = cgraph.where_[graph.cmap[i]];
        debug_assert!(graph.where_[i] <= 2);
    }

    compute_2way_node_partition_params(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::grid_graph;

    #[test]
    fn node_params_of_a_column_separator() {
        let mut g = WorkGraph::from_graph(&grid_graph(5, 3)).unwrap();
        g.alloc_2way_node().unwrap();
        for i in 0..15 {
            g.where_[i] = match i % 5 {
                0 | 1 => 0,
                2 => 2,
                _ => 1,
            };
        }
        compute_2way_node_partition_params(&mut g).unwrap();
        assert_eq!(g.pwgts, [6, 6, 3]);
        assert_eq!(g.mincut, 3);
        assert_eq!(g.bnd.len(), 3);
        assert_eq!(g.nrinfo[2], [1, 1]);
        assert!(crate::debug::check_node_partition_params(&g));
        assert!(crate::debug::is_separable(&g));
    }
}
