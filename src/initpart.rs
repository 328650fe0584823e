/*
\file
\brief This file contains code that performs the initial partition of the
      coarsest graph

\date   Started 7/23/97
\author George
\author Copyright 1997-2011, Regents of the University of Minnesota
*/

use crate::balance::balance_2way;
use crate::error::Result;
use crate::fm::fm_2way_refine;
use crate::graph::WorkGraph;
use crate::options::{Ctrl, DbgLvl, Iptype};
use crate::pqueue::PQueue;
use crate::refine::{compute_2way_partition_params, max_weighted_degree};
use crate::separator::construct_separator;
use crate::sfm::{fm_2way_node_refine_1sided, fm_2way_node_refine_2sided};
use crate::srefine::compute_2way_node_partition_params;
use crate::timing::Timer;
use crate::util::{self, try_vec};
use crate::{idx_t, ifset, real_t};

/*************************************************************************/
/* This function computes the initial bisection of the coarsest graph */
/*************************************************************************/
pub(crate) fn init_2way_partition(
    ctrl: &mut Ctrl,
    graph: &mut WorkGraph,
    ntpwgts: &[real_t],
    niparts: usize,
) -> Result<()> {
    debug_assert!(graph.tvwgt[0] >= 0);

    let dbglvl = ctrl.dbglvl;
    ctrl.dbglvl = dbglvl.without(DbgLvl::REFINE).without(DbgLvl::MOVEINFO);
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::InitPart));

    let res = match ctrl.iptype {
        Iptype::Random => random_bisection(ctrl, graph, ntpwgts, niparts),
        _ if graph.nedges == 0 => random_bisection(ctrl, graph, ntpwgts, niparts),
        Iptype::Edge => grow_bisection(ctrl, graph, ntpwgts, niparts, Seed::Edge),
        Iptype::Grow | Iptype::Node | Iptype::MetisRb => {
            grow_bisection(ctrl, graph, ntpwgts, niparts, Seed::Vertex)
        }
    };

    ifset!(ctrl.dbglvl, DbgLvl::IPART, log::info!("Initial Cut: {}", graph.mincut));
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::InitPart));
    ctrl.dbglvl = dbglvl;

    res
}

/*************************************************************************/
/* This function computes the initial separator of the coarsest graph */
/*************************************************************************/
pub(crate) fn init_separator(ctrl: &mut Ctrl, graph: &mut WorkGraph, niparts: usize) -> Result<()> {
    let ntpwgts = [0.5, 0.5];

    let dbglvl = ctrl.dbglvl;
    ctrl.dbglvl = dbglvl.without(DbgLvl::REFINE).without(DbgLvl::MOVEINFO);
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.start(Timer::InitPart));

    /* this is required for the cut-based part of the refinement */
    ctrl.setup_2way_balance_multipliers(graph, &ntpwgts);

    let res = match ctrl.iptype {
        Iptype::Node => grow_bisection_node(ctrl, graph, niparts),
        _ => {
            let bisected = if graph.nedges == 0 {
                random_bisection(ctrl, graph, &ntpwgts, niparts)
            } else {
                grow_bisection(ctrl, graph, &ntpwgts, niparts, Seed::Vertex)
            };
            bisected.and_then(|()| {
                compute_2way_partition_params(graph);
                construct_separator(ctrl, graph)
            })
        }
    };

    ifset!(ctrl.dbglvl, DbgLvl::IPART, log::info!("Initial Sep: {}", graph.mincut));
    ifset!(ctrl.dbglvl, DbgLvl::TIME, ctrl.timers.stop(Timer::InitPart));
    ctrl.dbglvl = dbglvl;

    res
}

/*************************************************************************/
/* This function computes a bisection of a graph by randomly assigning
    the vertices followed by a bisection refinement.
    The resulting partition is returned in graph.where_.
*/
/*************************************************************************/
pub(crate) fn random_bisection(
    ctrl: &mut Ctrl,
    graph: &mut WorkGraph,
    ntpwgts: &[real_t],
    niparts: usize,
) -> Result<()> {
    let nvtxs = graph.nvtxs;
    graph.alloc_2way()?;

    let mut bestwhere = try_vec(nvtxs, 0, "RandomBisection: bestwhere")?;
    let mut perm = try_vec(nvtxs, 0, "RandomBisection: perm")?;
    let mut bestcut = 0;

    let zeromaxpwgt = ctrl.ubfactors[0] * graph.tvwgt[0] as real_t * ntpwgts[0];

    for inbfs in 0..niparts {
        graph.where_.fill(1);

        if inbfs > 0 {
            util::rand_array_permute(&mut ctrl.rng, &mut perm, nvtxs / 2, true);
            let mut pwgt0: idx_t = 0;
            for &i in &perm {
                if ((pwgt0 + graph.vwgt[i]) as real_t) < zeromaxpwgt {
                    graph.where_[i] = 0;
                    pwgt0 += graph.vwgt[i];
                    if pwgt0 as real_t > zeromaxpwgt {
                        break;
                    }
                }
            }
        }

        /* Do some partition refinement  */
        compute_2way_partition_params(graph);
        balance_2way(ctrl, graph, ntpwgts)?;
        fm_2way_refine(ctrl, graph, ntpwgts, 4)?;

        if inbfs == 0 || bestcut > graph.mincut {
            bestcut = graph.mincut;
            bestwhere.copy_from_slice(&graph.where_);
            if bestcut == 0 {
                break;
            }
        }
    }

    graph.mincut = bestcut;
    graph.where_.copy_from_slice(&bestwhere);
    Ok(())
}

/// How a growing attempt picks its starting vertices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Seed {
    /// a random vertex
    Vertex,
    /// both endpoints of a random edge
    Edge,
}

/// Part 0 of a bisection that grows one vertex at a time, always taking the
/// part-1 vertex with the largest cut gain.
struct Grower {
    queue: PQueue,
    /// weight of the edges to part 0 minus those to part 1
    gain: Vec<idx_t>,
    pwgts: [idx_t; 2],
}

impl Grower {
    fn new(graph: &WorkGraph) -> Result<Grower> {
        let nvtxs = graph.nvtxs;
        let mut gain = try_vec(nvtxs, 0, "GrowBisection: gain")?;
        for (i, g) in gain.iter_mut().enumerate() {
            *g = -graph.adj(i).map(|j| graph.adjwgt[j]).sum::<idx_t>();
        }
        Ok(Grower {
            queue: PQueue::new(nvtxs, max_weighted_degree(graph)),
            gain,
            pwgts: [0, graph.tvwgt[0]],
        })
    }

    /// Moves `i` into part 0 and queues its part-1 neighbors
    fn add(&mut self, graph: &mut WorkGraph, i: usize) {
        if self.queue.contains(i) {
            self.queue.delete(i);
        }
        graph.where_[i] = 0;
        self.pwgts[0] += graph.vwgt[i];
        self.pwgts[1] -= graph.vwgt[i];

        for j in graph.adj(i) {
            let k = graph.adjncy[j];
            if graph.where_[k] != 1 {
                continue;
            }
            self.gain[k] += 2 * graph.adjwgt[j];
            if self.queue.contains(k) {
                self.queue.update(k, self.gain[k]);
            } else {
                self.queue.insert(k, self.gain[k]);
            }
        }
    }
}

/// Picks a random part-1 vertex that is not already waiting in the queue
fn random_untouched(ctrl: &mut Ctrl, graph: &WorkGraph, queue: &PQueue, skipped: &[bool]) -> Option<usize> {
    let free = |i: &usize| graph.where_[*i] == 1 && !queue.contains(*i) && !skipped[*i];
    let nleft = (0..graph.nvtxs).filter(free).count();
    if nleft == 0 {
        return None;
    }
    let k = util::rand_in_range(&mut ctrl.rng, nleft);
    (0..graph.nvtxs).filter(free).nth(k)
}

/*************************************************************************/
/* This function takes a graph and produces a bisection by growing part 0
    from a random seed, taking the highest gain frontier vertex each time,
    until it reaches its target weight. Disconnected graphs are reseeded.
    The resulting bisection is refined using FM.
    The resulting partition is returned in graph.where_.
*/
/*************************************************************************/
fn grow_bisection(
    ctrl: &mut Ctrl,
    graph: &mut WorkGraph,
    ntpwgts: &[real_t],
    niparts: usize,
    seed: Seed,
) -> Result<()> {
    let nvtxs = graph.nvtxs;
    graph.alloc_2way()?;

    let mut bestwhere = try_vec(nvtxs, 0, "GrowBisection: bestwhere")?;
    let mut skipped = try_vec(nvtxs, false, "GrowBisection: skipped")?;
    let mut bestcut = 0;

    let tvwgt = graph.tvwgt[0] as real_t;
    let onemaxpwgt = (ctrl.ubfactors[0] * tvwgt * ntpwgts[1]) as idx_t;
    let oneminpwgt = ((1.0 / ctrl.ubfactors[0]) * tvwgt * ntpwgts[1]) as idx_t;

    for inbfs in 0..niparts {
        graph.where_.fill(1);
        skipped.fill(false);
        let mut grower = Grower::new(graph)?;

        let first = util::rand_in_range(&mut ctrl.rng, nvtxs);
        grower.add(graph, first);
        if seed == Seed::Edge && graph.degree(first) > 0 {
            let j = graph.xadj[first] + util::rand_in_range(&mut ctrl.rng, graph.degree(first));
            let other = graph.adjncy[j];
            if grower.pwgts[1] - graph.vwgt[other] >= oneminpwgt {
                grower.add(graph, other);
            }
        }

        /* Grow part 0 from the queue to get a partition */
        let mut drain = false;
        while grower.pwgts[1] > onemaxpwgt {
            let i = match grower.queue.pop() {
                Some(i) => i,
                None => {
                    /* Empty. Disconnected graph! */
                    if drain {
                        break;
                    }
                    match random_untouched(ctrl, graph, &grower.queue, &skipped) {
                        Some(i) => i,
                        None => break,
                    }
                }
            };

            if grower.pwgts[0] > 0 && grower.pwgts[1] - graph.vwgt[i] < oneminpwgt {
                skipped[i] = true;
                drain = true;
                continue;
            }

            grower.add(graph, i);
            drain = false;
        }

        /* Check to see if we hit any bad limiting cases */
        if grower.pwgts[1] == 0 {
            graph.where_[util::rand_in_range(&mut ctrl.rng, nvtxs)] = 1;
        }
        if grower.pwgts[0] == 0 {
            graph.where_[util::rand_in_range(&mut ctrl.rng, nvtxs)] = 0;
        }

        /*************************************************************
         * Do some partition refinement
         **************************************************************/
        compute_2way_partition_params(graph);
        balance_2way(ctrl, graph, ntpwgts)?;
        let niter = ctrl.niter;
        fm_2way_refine(ctrl, graph, ntpwgts, niter)?;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::IPART,
            log::debug!(
                "IPART: {:3} [{:5} {:5}] {:5}",
                inbfs,
                graph.pwgts[0],
                graph.pwgts[1],
                graph.mincut
            )
        );

        if inbfs == 0 || bestcut > graph.mincut {
            bestcut = graph.mincut;
            bestwhere.copy_from_slice(&graph.where_);
            if bestcut == 0 {
                break;
            }
        }
    }

    graph.mincut = bestcut;
    graph.where_.copy_from_slice(&bestwhere);
    Ok(())
}

/*************************************************************************/
/* This function takes a graph and produces a tri-section into left, right,
   and separator by growing a bisection, moving its boundary into the
   separator and refining the result using node FM.
   The resulting partition is returned in graph.where_.
*/
/**************************************************************************/
fn grow_bisection_node(ctrl: &mut Ctrl, graph: &mut WorkGraph, niparts: usize) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let ntpwgts = [0.5, 0.5];

    let mut bestwhere = try_vec(nvtxs, 0, "GrowBisectionNode: bestwhere")?;
    let mut bestcut = 0;

    for inbfs in 0..niparts {
        if graph.nedges == 0 {
            random_bisection(ctrl, graph, &ntpwgts, 1)?;
        } else {
            grow_bisection(ctrl, graph, &ntpwgts, 1, Seed::Vertex)?;
        }
        compute_2way_partition_params(graph);

        /* Construct and refine the vertex separator */
        let bnd: Vec<usize> = graph.bnd.as_slice().to_vec();
        for j in bnd {
            /* ignore islands */
            if graph.degree(j) > 0 {
                graph.where_[j] = 2;
            }
        }

        compute_2way_node_partition_params(graph)?;
        fm_2way_node_refine_2sided(ctrl, graph, 1)?;
        fm_2way_node_refine_1sided(ctrl, graph, 4)?;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::IPART,
            log::debug!(
                "ISep: [{} {} {} {}] {}",
                inbfs,
                graph.pwgts[0],
                graph.pwgts[1],
                graph.pwgts[2],
                bestcut
            )
        );

        if inbfs == 0 || bestcut > graph.mincut {
            bestcut = graph.mincut;
            bestwhere.copy_from_slice(&graph.where_);
        }
    }

    graph.where_.copy_from_slice(&bestwhere);
    compute_2way_node_partition_params(graph)?;
    debug_assert_eq!(graph.mincut, bestcut);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Optype, Options};
    use crate::tests::grid_graph;

    fn check_bisection(g: &WorkGraph) {
        let mut p = [0; 2];
        for i in 0..g.nvtxs {
            p[g.where_[i]] += g.vwgt[i];
        }
        assert!(p[0] > 0 && p[1] > 0, "{p:?}");
    }

    #[test]
    fn every_bisection_scheme_splits_a_grid() {
        for iptype in [Iptype::Grow, Iptype::Random, Iptype::Edge] {
            let opts = Options {
                iptype: Some(iptype),
                ..Options::default()
            };
            let mut ctrl = Ctrl::new(Optype::Pmetis, &opts, 1, 2).unwrap();
            let mut g = WorkGraph::from_graph(&grid_graph(6, 6)).unwrap();
            ctrl.setup_2way_balance_multipliers(&g, &[0.5, 0.5]);
            init_2way_partition(&mut ctrl, &mut g, &[0.5, 0.5], 4).unwrap();
            check_bisection(&g);
            assert_eq!(crate::debug::compute_cut(&g, &g.where_), g.mincut);
        }
    }

    #[test]
    fn grow_finds_the_bridge() {
        // two 4-cliques joined by a single edge 3-4
        let mut xadj = vec![0];
        let mut adjncy = vec![];
        for v in 0..8usize {
            let base = if v < 4 { 0 } else { 4 };
            adjncy.extend((base..base + 4).filter(|&u| u != v).map(|u| u as idx_t));
            if v == 3 {
                adjncy.push(4);
            }
            if v == 4 {
                adjncy.push(3);
            }
            xadj.push(adjncy.len() as idx_t);
        }
        let g = crate::Graph::new(xadj, adjncy).unwrap();
        let mut ctrl = Ctrl::new(Optype::Pmetis, &Options::default(), 1, 2).unwrap();
        let mut g = WorkGraph::from_graph(&g).unwrap();
        ctrl.setup_2way_balance_multipliers(&g, &[0.5, 0.5]);
        init_2way_partition(&mut ctrl, &mut g, &[0.5, 0.5], 5).unwrap();
        assert_eq!(g.mincut, 1);
    }

    #[test]
    fn node_separator_of_a_grid() {
        let opts = Options {
            iptype: Some(Iptype::Node),
            ..Options::default()
        };
        let mut ctrl = Ctrl::new(Optype::Ometis, &opts, 1, 2).unwrap();
        let mut g = WorkGraph::from_graph(&grid_graph(7, 7)).unwrap();
        init_separator(&mut ctrl, &mut g, 3).unwrap();
        assert!(crate::debug::is_separable(&g));
        assert!(g.pwgts[0] > 0 && g.pwgts[1] > 0 && g.pwgts[2] > 0);
        assert_eq!(g.mincut, g.pwgts[2]);
    }
}
