/*
 * Copyright 1997, Regents of the University of Minnesota
 *
 * timing.c
 *
 * This file contains routines that deal with timing the multilevel phases
 *
 * Started 7/24/97
 * George
 */

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    Total,
    InitPart,
    Match,
    Contract,
    Coarsen,
    Uncoarsen,
    Refine,
    Project,
    Split,
    Sep,
}

const NTIMERS: usize = 10;

/// Accumulating wall-clock timers, one per multilevel phase
#[derive(Debug, Default)]
pub struct Timers {
    acc: [Duration; NTIMERS],
    started: [Option<Instant>; NTIMERS],
}

impl Timers {
    pub fn start(&mut self, t: Timer) {
        self.started[t as usize] = Some(Instant::now());
    }

    pub fn stop(&mut self, t: Timer) {
        if let Some(at) = self.started[t as usize].take() {
            self.acc[t as usize] += at.elapsed();
        }
    }

    pub fn get(&self, t: Timer) -> Duration {
        self.acc[t as usize]
    }

    /// Logs the accumulated times
    pub fn report(&self) {
        let secs = |t| self.get(t).as_secs_f64();
        log::info!("Timing Information -------------------------------------------------");
        log::info!(" Multilevel: \t\t {:7.3}", secs(Timer::Total));
        log::info!("     Coarsening: \t\t {:7.3}", secs(Timer::Coarsen));
        log::info!("            Matching: \t\t\t {:7.3}", secs(Timer::Match));
        log::info!("            Contract: \t\t\t {:7.3}", secs(Timer::Contract));
        log::info!("     Initial Partition: \t {:7.3}", secs(Timer::InitPart));
        log::info!("     Uncoarsening: \t\t {:7.3}", secs(Timer::Uncoarsen));
        log::info!("          Refinement: \t\t\t {:7.3}", secs(Timer::Refine));
        log::info!("          Projection: \t\t\t {:7.3}", secs(Timer::Project));
        log::info!("     Splitting: \t\t {:7.3}", secs(Timer::Split));
        log::info!("     Separators: \t\t {:7.3}", secs(Timer::Sep));
        log::info!("********************************************************************");
    }
}
