//! Incremental energy terms.

use crate::plan::{Plan, Shift};
use crate::{SLOTS_DAY, SLOT_LENGTH};

/// Mean squared difference between the staffing and target curves over
/// one week window.
///
/// The delta form is the exact first-order expansion of the squared error
/// after swapping one agent's weekly contribution; the annealer relies on
/// it matching the full evaluation, so re-deriving it must preserve the
/// formula bit for bit.
pub struct StaffingEnergy {
    slot0: usize,
    slot1: usize,
}

impl StaffingEnergy {
    /// Energy term for `week` of `plan`.
    pub fn new(plan: &Plan, week: u32) -> Self {
        let slot0 = week as usize * 7 * SLOTS_DAY;
        StaffingEnergy {
            slot0,
            slot1: slot0 + plan.week_slots(),
        }
    }

    /// Full evaluation over the week window.
    pub fn energy(&self, plan: &Plan) -> f64 {
        let mut e = 0.0;
        for i in self.slot0..self.slot1 {
            let d = plan.staffing[i] - plan.target[i];
            e += d * d;
        }
        e / (self.slot1 - self.slot0) as f64
    }

    /// Energy change caused by replacing one agent's weekly staffing
    /// contribution `prev_stf` with `mutd_stf` (both restricted to the
    /// week window).
    pub fn delta(&self, plan: &Plan, prev_stf: &[f64], mutd_stf: &[f64]) -> f64 {
        let n = plan.week_slots();
        let mut de = 0.0;
        for i in 0..n {
            let e1 = mutd_stf[i] - prev_stf[i];
            let e2 = mutd_stf[i] - prev_stf[i] + 2.0 * plan.staffing[self.slot0 + i]
                - 2.0 * plan.target[self.slot0 + i];
            de += e1 * e2;
        }
        de / n as f64
    }

    /// Local squared error over the two days starting at `day` if
    /// `sh_prev` were swapped for `sh_cand` on that day.
    pub fn fitness(&self, plan: &Plan, day: u32, sh_prev: &Shift, sh_cand: &Shift) -> f64 {
        let off = day as usize * SLOTS_DAY;
        let mut fit = 0.0;
        for i in 0..2 * SLOTS_DAY {
            if off + i >= plan.staffing.len() {
                break;
            }
            let t = (i as u32) * SLOT_LENGTH;
            let f = plan.target[off + i]
                - (plan.staffing[off + i] - f64::from(sh_prev.staff(t)) + f64::from(sh_cand.staff(t)));
            fit += f * f;
        }
        fit / SLOTS_DAY as f64
    }
}

/// Spread of entry times across consecutive working days of the week:
/// the mean over the week of squared start-time jumps, in slots.
pub struct ComfortEnergy {
    week: u32,
}

impl ComfortEnergy {
    /// Energy term for `week` of the plan.
    pub fn new(_plan: &Plan, week: u32) -> Self {
        ComfortEnergy { week }
    }

    /// Full evaluation over every agent of the plan.
    pub fn energy(&self, plan: &Plan) -> f64 {
        let day1 = (self.week * 7 + 1) as usize;
        let day7 = ((self.week + 1) * 7) as usize;
        let mut e = 0.0;
        for line in &plan.assignments {
            for i in day1..day7 {
                e += Self::jump(&line[i - 1], &line[i]);
            }
        }
        e / 7.0
    }

    /// Energy change caused by replacing agent `mutd_idx`'s week with
    /// `mutd_pln`.
    pub fn delta(&self, plan: &Plan, mutd_idx: usize, mutd_pln: &[Shift]) -> f64 {
        let day1 = (self.week * 7 + 1) as usize;
        let day7 = ((self.week + 1) * 7) as usize;
        let line = &plan.assignments[mutd_idx];
        let mut e_curr = 0.0;
        for i in day1..day7 {
            e_curr += Self::jump(&line[i - 1], &line[i]);
        }
        let mut e_mutd = 0.0;
        for i in 1..7 {
            e_mutd += Self::jump(&mutd_pln[i - 1], &mutd_pln[i]);
        }
        (e_mutd - e_curr) / 7.0
    }

    /// Signed contribution of replacing `sh_prev` with `sh_cand` after
    /// the last day of the partial line `pln`.
    pub fn fitness(&self, pln: &[Shift], sh_prev: &Shift, sh_cand: &Shift) -> f64 {
        let Some(shp) = pln.last() else {
            return 0.0;
        };
        let mut fit = 0.0;
        if shp.work() && sh_prev.work() {
            fit -= Self::jump(shp, sh_prev);
        }
        if shp.work() && sh_cand.work() {
            fit += Self::jump(shp, sh_cand);
        }
        fit
    }

    fn jump(sh0: &Shift, sh1: &Shift) -> f64 {
        if sh0.work() && sh1.work() {
            let d = (f64::from(sh1.t0()) - f64::from(sh0.t0())) / f64::from(SLOT_LENGTH);
            d * d
        } else {
            0.0
        }
    }
}
