//! Target staffing curve.

use crate::error::Error;
use crate::{SLOTS_DAY, SLOT_LENGTH};

/// The staffing level to aim for, one value per 5-minute slot.
///
/// User data arrives at a coarser slot length (any multiple of 5
/// minutes) and is upsampled by repetition, then zero-padded up to the
/// next full day so a plan with a positive midnight offset always finds
/// slots past its last day.
pub struct Target {
    days: u32,
    target: Vec<f64>,
    shift_offset: u32,
    staff_hours: Vec<f64>,
}

impl Target {
    /// Builds a target from `days · (24·60 / slot_length)` points sampled
    /// at `slot_length` minutes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `slot_length` is not a multiple of 5
    /// minutes, is smaller than 5, or fewer points are supplied than the
    /// requested number of days needs.
    pub fn new(slot_length: u32, days: u32, points: &[f64]) -> Result<Self, Error> {
        if slot_length < SLOT_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "invalid slot length {slot_length}, should be a multiple of {SLOT_LENGTH} minutes"
            )));
        }
        if slot_length % SLOT_LENGTH != 0 {
            return Err(Error::InvalidArgument(format!(
                "invalid subsampling ratio {slot_length}, must be a multiple of {SLOT_LENGTH} minutes"
            )));
        }
        let slots = (days * (24 * 60 / slot_length)) as usize;
        if points.len() < slots {
            return Err(Error::InvalidArgument(format!(
                "too few target points, should be at least {slots} for {days} days and {slot_length} minutes slots"
            )));
        }

        // Upsample by repetition to the 5-minute grid.
        let ratio = (slot_length / SLOT_LENGTH) as usize;
        let mut target = Vec::with_capacity(points.len() * ratio + SLOTS_DAY);
        for &t in points {
            for _ in 0..ratio {
                target.push(t);
            }
        }

        // Pad with zeros up to the next planning day. An aligned curve
        // still gains a full day: the overflow window of shifts crossing
        // midnight on the last day must exist.
        let mut n = target.len() % SLOTS_DAY;
        while n < SLOTS_DAY {
            target.push(0.0);
            n += 1;
        }

        Ok(Target {
            days,
            target,
            shift_offset: 0,
            staff_hours: Vec::new(),
        })
    }

    /// Length in days.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Target hours over one day of the curve, starting `offset` minutes
    /// into `day`.
    pub fn hours(&self, offset: u32, day: u32) -> f64 {
        let i0 = day as usize * SLOTS_DAY + (offset / SLOT_LENGTH) as usize;
        let i1 = i0 + SLOTS_DAY;
        let mut h = 0.0;
        for i in i0..i1.min(self.target.len()) {
            h += self.target[i] * f64::from(SLOT_LENGTH);
        }
        h / 60.0
    }

    /// The curve without daily rescaling.
    pub fn unrescaled(&self) -> &[f64] {
        &self.target
    }

    /// The curve, rescaled day by day to the staff-hour budgets recorded
    /// by [`rescale_staff`](Target::rescale_staff) (untouched when no
    /// budgets are set).
    pub fn rescaled(&self) -> Vec<f64> {
        if self.staff_hours.is_empty() {
            return self.target.clone();
        }
        let mut s = self.target.clone();
        for day in 0..self.days {
            let h0 = self.hours(self.shift_offset, day);
            let h1 = self.staff_hours[day as usize % self.staff_hours.len()];
            let i0 = day as usize * SLOTS_DAY + (self.shift_offset / SLOT_LENGTH) as usize;
            let i1 = i0 + SLOTS_DAY;
            let factor = if h1 == 0.0 { 1.0 } else { h1 / h0 };
            for i in i0..i1.min(s.len()) {
                s[i] = self.target[i] * factor;
            }
        }
        s
    }

    /// Records per-day staff-hour budgets used by
    /// [`rescaled`](Target::rescaled); budgets repeat cyclically over the
    /// plan. `offset` is the shift starting time in minutes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `offset` exceeds 24·60.
    pub fn rescale_staff(&mut self, offset: u32, staff_hours: Vec<f64>) -> Result<(), Error> {
        if offset > 24 * 60 {
            return Err(Error::InvalidArgument(
                "invalid offset (should be less than 24*60)".into(),
            ));
        }
        self.shift_offset = offset;
        self.staff_hours = staff_hours;
        Ok(())
    }
}
