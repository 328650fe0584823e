/*
\file
\brief Routines for k-way refinement

\date Started 7/28/97
\author George
\author Copyright 1997-2009, Regents of the University of Minnesota
\version $Id: kwayfm.c 17513 2014-08-05 16:20:50Z dominique $
*/

use crate::debug;
use crate::error::Result;
use crate::graph::{KwayInfo, Nbr, WorkGraph};
use crate::mcutil::compute_load_imbalance;
use crate::options::{Ctrl, DbgLvl, Objtype};
use crate::pqueue::RPQueue;
use crate::util::{self, iargmin, try_vec};
use crate::{idx_t, ifset, real_t};

/// What a pass of the greedy optimizer is after
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Omode {
    /// improve the objective within the balance constraint
    Refine,
    /// move vertices out of overweight parts, even at a loss
    Balance,
}

/// Which vertices are kept on the boundary list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BndType {
    /// external degree at least the internal degree
    Refine,
    /// any external degree
    Balance,
}

impl BndType {
    #[inline]
    pub fn admits(self, info: &KwayInfo) -> bool {
        match self {
            BndType::Refine => info.ed - info.id >= 0,
            BndType::Balance => info.ed > 0,
        }
    }
}

impl From<Omode> for BndType {
    fn from(omode: Omode) -> Self {
        match omode {
            Omode::Refine => BndType::Refine,
            Omode::Balance => BndType::Balance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VStatus {
    /// not in the queue and not extracted during this pass
    NotPresent,
    Present,
    Extracted,
}

/*************************************************************************/
/* Top-level routine for k-way partitioning refinement. This routine just
   calls the appropriate refinement routine based on the objective.
*/
/*************************************************************************/
pub(crate) fn greedy_kway_optimize(ctrl: &mut Ctrl, graph: &mut WorkGraph, niter: usize, omode: Omode) -> Result<()> {
    match ctrl.objtype {
        Objtype::Vol => greedy_kway_vol_optimize(ctrl, graph, niter, omode),
        Objtype::Cut | Objtype::Node => greedy_kway_cut_optimize(ctrl, graph, niter, omode),
    }
}

/// The allowed `(min, max)` weight of every part.
///
/// Refinement tolerates the current imbalance when it is already above the
/// target so that it never has to fix balance before it can move anything.
fn part_weight_bounds(ctrl: &Ctrl, graph: &WorkGraph, omode: Omode) -> (Vec<idx_t>, Vec<idx_t>) {
    let nparts = ctrl.nparts;
    let ubfactor = match omode {
        Omode::Balance => ctrl.ubfactors[0],
        Omode::Refine => ctrl.ubfactors[0].max(compute_load_imbalance(&graph.pwgts, nparts, 1, &ctrl.pijbm)),
    };
    let tvwgt = graph.tvwgt[0] as real_t;
    let maxpwgts = (0..nparts)
        .map(|i| (ctrl.tpwgts[i] * tvwgt * ubfactor) as idx_t)
        .collect();
    let minpwgts = (0..nparts)
        .map(|i| (ctrl.tpwgts[i] * tvwgt / ubfactor) as idx_t)
        .collect();
    (minpwgts, maxpwgts)
}

/// Queue priority of a vertex: its external degree damped by the number of
/// neighboring parts, minus its internal degree
#[inline]
fn cut_priority(info: &KwayInfo) -> real_t {
    let nnbrs = info.nbrs.len();
    let spread = if nnbrs > 0 {
        info.ed as real_t / (nnbrs as real_t).sqrt()
    } else {
        0.0
    };
    spread - info.id as real_t
}

/// Weight limits and targets a move is judged against
struct MoveBounds<'a> {
    pwgts: &'a [idx_t],
    tpwgts: &'a [real_t],
    minpwgts: &'a [idx_t],
    maxpwgts: &'a [idx_t],
}

impl MoveBounds<'_> {
    /// moving `vwgt` from `from` to `to` leaves them closer to their targets
    #[inline]
    fn improves_balance(&self, from: usize, to: usize, vwgt: idx_t) -> bool {
        self.tpwgts[from] * (self.pwgts[to] as real_t)
            < self.tpwgts[to] * (self.pwgts[from] - vwgt) as real_t
    }

    /// `to` is relatively lighter than `than`
    #[inline]
    fn lighter(&self, to: usize, than: usize) -> bool {
        self.tpwgts[than] * (self.pwgts[to] as real_t) < self.tpwgts[to] * (self.pwgts[than] as real_t)
    }

    /// neither part leaves its interval, or the move improves balance anyway
    #[inline]
    fn fits(&self, from: usize, to: usize, vwgt: idx_t) -> bool {
        (self.pwgts[from] - vwgt >= self.minpwgts[from] || self.improves_balance(from, to, vwgt))
            && (self.pwgts[to] + vwgt <= self.maxpwgts[to] || self.improves_balance(from, to, vwgt))
    }

    /// Picks the neighboring part with the largest gain that keeps the
    /// partition within bounds. Zero-gain moves are taken when they improve
    /// balance.
    fn refine_target(&self, info: &KwayInfo, from: usize, vwgt: idx_t) -> Option<usize> {
        let nbrs = &info.nbrs;
        let mut k = (0..nbrs.len()).rev().find(|&k| {
            let to = nbrs[k].pid;
            (nbrs[k].ed > info.id && self.fits(from, to, vwgt))
                || (nbrs[k].ed == info.id && self.improves_balance(from, to, vwgt))
        })?;

        for j in (0..k).rev() {
            let to = nbrs[j].pid;
            if (nbrs[j].ed > nbrs[k].ed && self.fits(from, to, vwgt))
                || (nbrs[j].ed == nbrs[k].ed && self.lighter(to, nbrs[k].pid))
            {
                k = j;
            }
        }
        Some(k)
    }

    /// Picks the relatively lightest neighboring part that the vertex can go
    /// to, unless the move only costs cut without helping an overweight part.
    fn balance_target(&self, info: &KwayInfo, from: usize, vwgt: idx_t) -> Option<usize> {
        let nbrs = &info.nbrs;
        let mut k = (0..nbrs.len()).rev().find(|&k| {
            let to = nbrs[k].pid;
            self.pwgts[to] + vwgt <= self.maxpwgts[to] || self.improves_balance(from, to, vwgt)
        })?;

        for j in (0..k).rev() {
            if self.lighter(nbrs[j].pid, nbrs[k].pid) {
                k = j;
            }
        }

        let to = nbrs[k].pid;
        if self.pwgts[from] < self.maxpwgts[from]
            && self.pwgts[to] > self.minpwgts[to]
            && nbrs[k].ed - info.id < 0
        {
            return None;
        }
        Some(k)
    }
}

/*************************************************************************/
/* K-way partitioning optimization in which the vertices are visited in
   decreasing ed/sqrt(nnbrs)-id order. Note this is just an
   approximation, as the ed is often split across different subdomains
   and the sqrt(nnbrs) is just a crude approximation.

  \param graph is the graph that is being refined.
  \param niter is the number of refinement iterations.
  \param omode is the type of optimization that will performed among
         Omode::Refine and Omode::Balance
*/
/**************************************************************************/
fn greedy_kway_cut_optimize(ctrl: &mut Ctrl, graph: &mut WorkGraph, niter: usize, omode: Omode) -> Result<()> {
    let nvtxs = graph.nvtxs;
    let nparts = ctrl.nparts;
    let bndtype = BndType::from(omode);

    /* Setup the weight intervals of the various subdomains */
    let (minpwgts, maxpwgts) = part_weight_bounds(ctrl, graph, omode);
    let tpwgts = ctrl.tpwgts.clone();

    let mut perm = try_vec(nvtxs, 0, "Greedy_KWayCutOptimize: perm")?;
    let mut vstatus = try_vec(nvtxs, VStatus::NotPresent, "Greedy_KWayCutOptimize: vstatus")?;
    /* the vertices whose vstatus needs to be reset after a pass */
    let mut touched: Vec<usize> = Vec::new();
    let mut queue = RPQueue::new(nvtxs);

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "{}: [{:6} {:6}]-[{:6} {:6}], Bal: {:5.3}, Nv-Nb[{:6} {:6}], Cut: {:6}",
            if omode == Omode::Refine { "GRC" } else { "GBC" },
            graph.pwgts[iargmin(&graph.pwgts)],
            graph.pwgts.iter().max().copied().unwrap_or(0),
            minpwgts[0],
            maxpwgts[0],
            compute_load_imbalance(&graph.pwgts, nparts, 1, &ctrl.pijbm),
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut
        )
    );

    for _pass in 0..niter {
        debug_assert_eq!(debug::compute_cut(graph, &graph.where_), graph.mincut);

        if omode == Omode::Balance
            && (0..nparts).all(|i| graph.pwgts[i] <= maxpwgts[i] && graph.pwgts[i] >= minpwgts[i])
        {
            /* Things are balanced. Return right away */
            break;
        }

        let oldcut = graph.mincut;

        /* Insert the boundary vertices in the priority queue */
        let nbnd = graph.bnd.len();
        util::rand_array_permute(&mut ctrl.rng, &mut perm[..nbnd], nbnd / 4, true);
        for &p in &perm[..nbnd] {
            let i = graph.bnd.as_slice()[p];
            queue.insert(i, cut_priority(&graph.ckrinfo[i]));
            vstatus[i] = VStatus::Present;
            touched.push(i);
        }

        /* Start extracting vertices from the queue and try to move them */
        let mut nmoved = 0;
        while let Some(i) = queue.pop() {
            vstatus[i] = VStatus::Extracted;

            let from = graph.where_[i];
            let vwgt = graph.vwgt[i];
            let bounds = MoveBounds {
                pwgts: &graph.pwgts,
                tpwgts: &tpwgts,
                minpwgts: &minpwgts,
                maxpwgts: &maxpwgts,
            };
            let info = &graph.ckrinfo[i];
            let k = match omode {
                Omode::Refine => bounds.refine_target(info, from, vwgt),
                Omode::Balance => bounds.balance_target(info, from, vwgt),
            };
            let Some(k) = k else {
                continue;
            };
            let to = info.nbrs[k].pid;

            /*=====================================================================
             * If we got here, we can now move the vertex from 'from' to 'to'
             *======================================================================*/
            nmoved += 1;
            move_kway_vertex(graph, i, to, bndtype, |graph, ii, me, oldnnbrs| {
                update_queue_info(
                    &mut queue,
                    &mut vstatus,
                    &mut touched,
                    &graph.ckrinfo[ii],
                    ii,
                    me != from && me != to && oldnnbrs == graph.ckrinfo[ii].nbrs.len(),
                    bndtype,
                );
            });

            ifset!(
                ctrl.dbglvl,
                DbgLvl::MOVEINFO,
                log::trace!(
                    "\t\tMoving {:6} from {:3} to {:3} [{:6} {:6}]. Cut: {:6}",
                    i,
                    from,
                    to,
                    graph.pwgts[from],
                    graph.pwgts[to],
                    graph.mincut
                )
            );
        }

        /* Reset the vstatus and associated data structures */
        for &i in &touched {
            vstatus[i] = VStatus::NotPresent;
        }
        touched.clear();

        ifset!(
            ctrl.dbglvl,
            DbgLvl::REFINE,
            log::debug!(
                "\t[{:6} {:6}], Bal: {:5.3}, Nb: {:6}. Nmoves: {:5}, Cut: {:6}, Vol: {:6}",
                graph.pwgts[iargmin(&graph.pwgts)],
                graph.pwgts.iter().max().copied().unwrap_or(0),
                compute_load_imbalance(&graph.pwgts, nparts, 1, &ctrl.pijbm),
                graph.bnd.len(),
                nmoved,
                graph.mincut,
                debug::compute_volume(graph, &graph.where_)
            )
        );

        if nmoved == 0 || (omode == Omode::Refine && graph.mincut == oldcut) {
            break;
        }
    }

    Ok(())
}

/// Keeps the queue in step with a neighbor whose refinement info changed.
/// Vertices already extracted in this pass stay out.
fn update_queue_info(
    queue: &mut RPQueue,
    vstatus: &mut [VStatus],
    touched: &mut Vec<usize>,
    info: &KwayInfo,
    vid: usize,
    unchanged: bool,
    bndtype: BndType,
) {
    if unchanged {
        return;
    }
    let admits = bndtype.admits(info);
    match vstatus[vid] {
        VStatus::Present => {
            if admits {
                queue.update(vid, cut_priority(info));
            } else {
                queue.delete(vid);
                vstatus[vid] = VStatus::NotPresent;
            }
        }
        VStatus::NotPresent => {
            if admits {
                queue.insert(vid, cut_priority(info));
                vstatus[vid] = VStatus::Present;
                touched.push(vid);
            }
        }
        VStatus::Extracted => {}
    }
}

/*************************************************************************/
/* K-way refinement that minimizes the communication volume. This is a
   greedy routine: the boundary vertices are visited in random order and
   each one goes to the neighboring part with the largest decrease of the
   total volume, the cut gain breaking ties.
*/
/**************************************************************************/
fn greedy_kway_vol_optimize(ctrl: &mut Ctrl, graph: &mut WorkGraph, niter: usize, omode: Omode) -> Result<()> {
    let nparts = ctrl.nparts;
    let bndtype = BndType::from(omode);
    let (minpwgts, maxpwgts) = part_weight_bounds(ctrl, graph, omode);
    let tpwgts = ctrl.tpwgts.clone();

    let mut cands: Vec<usize> = Vec::new();

    ifset!(
        ctrl.dbglvl,
        DbgLvl::REFINE,
        log::debug!(
            "{}: [{:6} {:6}]-[{:6} {:6}], Bal: {:5.3}, Nv-Nb[{:6} {:6}], Cut: {:5}, Vol: {:5}",
            if omode == Omode::Refine { "GRV" } else { "GBV" },
            graph.pwgts[iargmin(&graph.pwgts)],
            graph.pwgts.iter().max().copied().unwrap_or(0),
            minpwgts[0],
            maxpwgts[0],
            compute_load_imbalance(&graph.pwgts, nparts, 1, &ctrl.pijbm),
            graph.nvtxs,
            graph.bnd.len(),
            graph.mincut,
            graph.minvol
        )
    );

    for _pass in 0..niter {
        debug_assert_eq!(debug::compute_volume(graph, &graph.where_), graph.minvol);

        if omode == Omode::Balance
            && (0..nparts).all(|i| graph.pwgts[i] <= maxpwgts[i] && graph.pwgts[i] >= minpwgts[i])
        {
            break;
        }

        let (oldcut, oldvol) = (graph.mincut, graph.minvol);

        cands.clear();
        cands.extend_from_slice(graph.bnd.as_slice());
        let ncands = cands.len();
        util::rand_array_permute(&mut ctrl.rng, &mut cands, ncands / 4, false);

        let mut nmoved = 0;
        for &i in &cands {
            let from = graph.where_[i];
            let vwgt = graph.vwgt[i];
            let bounds = MoveBounds {
                pwgts: &graph.pwgts,
                tpwgts: &tpwgts,
                minpwgts: &minpwgts,
                maxpwgts: &maxpwgts,
            };
            let info = &graph.ckrinfo[i];

            /* (volume gain, cut gain, target) of the best admissible move */
            let mut best: Option<(idx_t, idx_t, usize)> = None;
            for nbr in &info.nbrs {
                let to = nbr.pid;
                let admissible = match omode {
                    Omode::Refine => bounds.fits(from, to, vwgt),
                    Omode::Balance => {
                        graph.pwgts[to] + vwgt <= maxpwgts[to] || bounds.improves_balance(from, to, vwgt)
                    }
                };
                if !admissible {
                    continue;
                }
                let vgain = volume_gain(graph, i, to);
                let cgain = nbr.ed - info.id;
                if best.map_or(true, |(bv, bc, _)| (vgain, cgain) > (bv, bc)) {
                    best = Some((vgain, cgain, to));
                }
            }
            let Some((vgain, cgain, to)) = best else {
                continue;
            };

            let accept = match omode {
                Omode::Refine => vgain > 0 || (vgain == 0 && cgain > 0),
                Omode::Balance => {
                    !(graph.pwgts[from] < maxpwgts[from]
                        && graph.pwgts[to] > minpwgts[to]
                        && (vgain, cgain) < (0, 0))
                }
            };
            if !accept {
                continue;
            }

            graph.minvol -= vgain;
            move_kway_vertex(graph, i, to, bndtype, |_, _, _, _| {});
            nmoved += 1;
        }

        ifset!(
            ctrl.dbglvl,
            DbgLvl::REFINE,
            log::debug!(
                "\t[{:6} {:6}], Bal: {:5.3}, Nb: {:6}. Nmoves: {:5}, Cut: {:6}, Vol: {:6}",
                graph.pwgts[iargmin(&graph.pwgts)],
                graph.pwgts.iter().max().copied().unwrap_or(0),
                compute_load_imbalance(&graph.pwgts, nparts, 1, &ctrl.pijbm),
                graph.bnd.len(),
                nmoved,
                graph.mincut,
                graph.minvol
            )
        );

        if nmoved == 0 || (omode == Omode::Refine && graph.minvol == oldvol && graph.mincut == oldcut) {
            break;
        }
    }

    Ok(())
}

/// Exact decrease of the total communication volume if `i` moves to `to`.
///
/// A vertex contributes one unit for every part other than its own among
/// its neighbors, so only `i` and its neighbors can change.
pub(crate) fn volume_gain(graph: &WorkGraph, i: usize, to: usize) -> idx_t {
    let from = graph.where_[i];
    let has_other_in = |u: usize, part: usize| {
        graph
            .adj(u)
            .any(|jj| graph.adjncy[jj] != i && graph.where_[graph.adjncy[jj]] == part)
    };

    /* i stops counting 'to' and starts counting 'from', each only if it has neighbors there */
    let mut gain = idx_t::from(graph.adj(i).any(|j| graph.where_[graph.adjncy[j]] == to));
    if graph.adj(i).any(|j| graph.where_[graph.adjncy[j]] == from) {
        gain -= 1;
    }

    for j in graph.adj(i) {
        let u = graph.adjncy[j];
        let me = graph.where_[u];
        if me != from && !has_other_in(u, from) {
            gain += 1;
        }
        if me != to && !has_other_in(u, to) {
            gain -= 1;
        }
    }
    gain
}

/// Moves `i` to part `to` and updates the part weights, the cut, the
/// refinement info of `i` and its neighbors, and the boundary of type
/// `bndtype`. `on_neighbor(graph, ii, where[ii], old nnbrs of ii)` runs after
/// every neighbor is updated.
pub(crate) fn move_kway_vertex(
    graph: &mut WorkGraph,
    i: usize,
    to: usize,
    bndtype: BndType,
    mut on_neighbor: impl FnMut(&WorkGraph, usize, usize, usize),
) {
    let from = graph.where_[i];
    debug_assert_ne!(from, to);
    let vwgt = graph.vwgt[i];
    graph.pwgts[to] += vwgt;
    graph.pwgts[from] -= vwgt;
    graph.where_[i] = to;

    /* Update ID/ED and BND related information for the moved vertex */
    let info = &mut graph.ckrinfo[i];
    let k = match info.nbrs.iter().position(|n| n.pid == to) {
        Some(k) => k,
        None => {
            info.nbrs.push(Nbr { pid: to, ed: 0 });
            info.nbrs.len() - 1
        }
    };
    let ked = info.nbrs[k].ed;
    graph.mincut -= ked - info.id;
    info.ed += info.id - ked;
    let oldid = std::mem::replace(&mut info.id, ked);
    if oldid == 0 {
        info.nbrs.swap_remove(k);
    } else {
        info.nbrs[k] = Nbr { pid: from, ed: oldid };
    }
    let onbnd = bndtype.admits(info);
    if onbnd != graph.bnd.contains(i) {
        if onbnd {
            graph.bnd.insert(i);
        } else {
            graph.bnd.delete(i);
        }
    }

    /* Update the degrees of adjacent vertices */
    for j in graph.adj(i) {
        let ii = graph.adjncy[j];
        let me = graph.where_[ii];
        let oldnnbrs = graph.ckrinfo[ii].nbrs.len();
        update_adjacent_vertex_info_and_bnd(graph, ii, me, from, to, graph.adjwgt[j], bndtype);
        on_neighbor(graph, ii, me, oldnnbrs);
    }
}

fn update_adjacent_vertex_info_and_bnd(
    graph: &mut WorkGraph,
    vid: usize,
    me: usize,
    from: usize,
    to: usize,
    ewgt: idx_t,
    bndtype: BndType,
) {
    let info = &mut graph.ckrinfo[vid];

    /* Update global ID/ED and boundary */
    if me == from {
        info.ed += ewgt;
        info.id -= ewgt;
    } else if me == to {
        info.id += ewgt;
        info.ed -= ewgt;
    }

    /* Remove contribution from the .ed of 'from' */
    if me != from {
        if let Some(p) = info.nbrs.iter().position(|n| n.pid == from) {
            if info.nbrs[p].ed <= ewgt {
                info.nbrs.swap_remove(p);
            } else {
                info.nbrs[p].ed -= ewgt;
            }
        }
    }

    /* Add contribution to the .ed of 'to' */
    if me != to && ewgt > 0 {
        match info.nbrs.iter_mut().find(|n| n.pid == to) {
            Some(n) => n.ed += ewgt,
            None => info.nbrs.push(Nbr { pid: to, ed: ewgt }),
        }
    }

    let onbnd = bndtype.admits(info);
    if onbnd != graph.bnd.contains(vid) {
        if onbnd {
            graph.bnd.insert(vid);
        } else {
            graph.bnd.delete(vid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kwayrefine::compute_kway_partition_params;
    use crate::options::{Optype, Options};
    use crate::tests::grid_graph;

    fn setup(nx: usize, ny: usize, nparts: usize, objtype: Objtype) -> (Ctrl, WorkGraph) {
        let opts = Options {
            objtype,
            ..Options::default()
        };
        let mut ctrl = Ctrl::new(Optype::Kmetis, &opts, 1, nparts).unwrap();
        let mut g = WorkGraph::from_graph(&grid_graph(nx, ny)).unwrap();
        g.alloc_kway(nparts).unwrap();
        ctrl.setup_kway_balance_multipliers(&g.tvwgt);
        (ctrl, g)
    }

    #[test]
    fn moving_keeps_the_refinement_info_exact() {
        let (ctrl, mut g) = setup(6, 6, 3, Objtype::Cut);
        for i in 0..g.nvtxs {
            g.where_[i] = (i % 6) / 2;
        }
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..40 {
            let i = rng.usize(0..g.nvtxs);
            let to = (g.where_[i] + 1 + rng.usize(0..2)) % 3;
            move_kway_vertex(&mut g, i, to, BndType::Refine, |_, _, _, _| {});
            assert!(debug::check_kway_params(&g));
            assert_eq!(debug::compute_cut(&g, &g.where_), g.mincut);
        }
        let mut sum = [0; 3];
        for i in 0..g.nvtxs {
            sum[g.where_[i]] += 1;
        }
        assert_eq!(&sum[..], &g.pwgts[..]);
    }

    #[test]
    fn volume_gain_matches_recomputation() {
        let (_ctrl, mut g) = setup(5, 4, 3, Objtype::Vol);
        let mut rng = fastrand::Rng::with_seed(11);
        for i in 0..g.nvtxs {
            g.where_[i] = rng.usize(0..3);
        }
        for i in 0..g.nvtxs {
            for to in 0..3 {
                if to == g.where_[i] {
                    continue;
                }
                let before = debug::compute_volume(&g, &g.where_);
                let gain = volume_gain(&g, i, to);
                let mut moved = g.where_.clone();
                moved[i] = to;
                assert_eq!(before - debug::compute_volume(&g, &moved), gain, "vertex {i} to {to}");
            }
        }
    }

    #[test]
    fn volume_gain_into_a_part_with_no_neighbors() {
        // path 0-1-2 split as [0, 0, 1]; vertex 0 has no neighbor in part 1
        let (_ctrl, mut g) = setup(3, 1, 2, Objtype::Vol);
        g.where_.copy_from_slice(&[0, 0, 1]);
        assert_eq!(debug::compute_volume(&g, &g.where_), 2);
        assert_eq!(volume_gain(&g, 0, 1), -1);
        assert_eq!(debug::compute_volume(&g, &[1, 0, 1]), 3);
        // vertex 2 into part 0 removes both boundary terms
        assert_eq!(volume_gain(&g, 2, 0), 2);
    }

    #[test]
    fn greedy_refinement_straightens_a_ragged_cut() {
        let (mut ctrl, mut g) = setup(8, 8, 2, Objtype::Cut);
        // left/right halves with a few vertices poking across the middle
        for r in 0..8 {
            for c in 0..8 {
                g.where_[r * 8 + c] = usize::from(c >= 4);
            }
        }
        for &v in &[3 * 8 + 4, 6 * 8 + 3] {
            g.where_[v] = 1 - g.where_[v];
        }
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        let before = g.mincut;
        assert_eq!(before, 12);
        let niter = ctrl.niter;
        greedy_kway_optimize(&mut ctrl, &mut g, niter, Omode::Refine).unwrap();
        assert!(g.mincut < before);
        assert_eq!(g.mincut, 8);
        assert!(debug::check_kway_params(&g));
    }

    #[test]
    fn balance_mode_drains_an_overweight_part() {
        let (mut ctrl, mut g) = setup(8, 4, 2, Objtype::Cut);
        for r in 0..4 {
            for c in 0..8 {
                g.where_[r * 8 + c] = usize::from(c >= 6);
            }
        }
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        crate::kwayrefine::compute_kway_boundary(&mut g, BndType::Balance);
        greedy_kway_optimize(&mut ctrl, &mut g, 10, Omode::Balance).unwrap();
        assert!(g.pwgts[0] <= 17, "{:?}", g.pwgts);
        assert!(debug::check_kway_params(&g));
    }

    #[test]
    fn volume_refinement_does_not_increase_volume() {
        let (mut ctrl, mut g) = setup(8, 8, 4, Objtype::Vol);
        for r in 0..8 {
            for c in 0..8 {
                g.where_[r * 8 + c] = 2 * usize::from(r >= 4) + usize::from(c >= 4);
            }
        }
        g.where_[3 * 8 + 3] = 3;
        compute_kway_partition_params(&ctrl, &mut g).unwrap();
        let before = g.minvol;
        let niter = ctrl.niter;
        greedy_kway_optimize(&mut ctrl, &mut g, niter, Omode::Refine).unwrap();
        assert!(g.minvol < before);
        assert_eq!(debug::compute_volume(&g, &g.where_), g.minvol);
    }
}
