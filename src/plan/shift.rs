//! Work and rest shifts.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::Error;
use crate::{SLOTS_DAY, SLOT_LENGTH};

/// A shift assignable to an agent for one day: a code plus a sorted list
/// of non-overlapping half-open `[start, end)` spans in minutes from
/// midnight. A shift without spans is a rest shift.
///
/// Two rest shifts are equal iff their codes match; two working shifts
/// are equal iff their span lists match, whatever their codes. Ordering
/// is total and consistent with equality: working shifts sort by their
/// spans (entry time first), rest shifts by code, and working shifts
/// precede rest shifts. Hashing follows equality.
#[derive(Debug, Clone, Default)]
pub struct Shift {
    work: bool,
    code: String,
    span: Vec<(u32, u32)>,
}

impl Shift {
    /// Creates a working shift from its code and spans.
    ///
    /// Spans are sorted by start time; each must satisfy `start < end`
    /// and they must not overlap. An empty span list produces a rest
    /// shift.
    pub fn new(code: impl Into<String>, span: &[(u32, u32)]) -> Result<Self, Error> {
        let mut span = span.to_vec();
        span.sort_by_key(|s| s.0);
        for s in &span {
            if s.0 >= s.1 {
                return Err(Error::InvalidArgument(format!(
                    "invalid time span [{}, {})",
                    s.0, s.1
                )));
            }
        }
        for w in span.windows(2) {
            if w[1].0 < w[0].1 {
                return Err(Error::InvalidArgument(format!(
                    "overlapping time spans [{}, {}) and [{}, {})",
                    w[0].0, w[0].1, w[1].0, w[1].1
                )));
            }
        }
        Ok(Shift {
            work: !span.is_empty(),
            code: code.into(),
            span,
        })
    }

    /// Creates a rest shift.
    pub fn rest(code: impl Into<String>) -> Self {
        Shift {
            work: false,
            code: code.into(),
            span: Vec::new(),
        }
    }

    /// Entry time in minutes (0 for rest shifts).
    pub fn t0(&self) -> u32 {
        self.span.first().map_or(0, |s| s.0)
    }

    /// Exit time in minutes (24·60 for rest shifts).
    pub fn t1(&self) -> u32 {
        self.span.last().map_or(24 * 60, |s| s.1)
    }

    /// Whether this is a working shift.
    pub fn work(&self) -> bool {
        self.work
    }

    /// The shift code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The working spans, sorted by start time.
    pub fn span(&self) -> &[(u32, u32)] {
        &self.span
    }

    /// Staffing contribution at minute `t`: 1 inside any span.
    pub fn staff(&self, t: u32) -> u32 {
        match (self.span.first(), self.span.last()) {
            (Some(first), Some(last)) if t >= first.0 && t <= last.1 => {
                for s in &self.span {
                    if s.0 <= t && t < s.1 {
                        return 1;
                    }
                }
                0
            }
            _ => 0,
        }
    }

    /// Adds `c` to the staffing curve slots covered by the shift on
    /// `day`, clipped to the curve length.
    pub fn add_staff(&self, day: usize, c: f64, curve: &mut [f64]) {
        for s in &self.span {
            let s0 = day * SLOTS_DAY + (s.0 / SLOT_LENGTH) as usize;
            let s1 = day * SLOTS_DAY + (s.1 / SLOT_LENGTH) as usize;
            for slot in curve.iter_mut().take(s1).skip(s0) {
                *slot += c;
            }
        }
    }
}

impl PartialEq for Shift {
    fn eq(&self, other: &Self) -> bool {
        if !self.work && !other.work {
            return self.code == other.code;
        }
        self.work == other.work && self.span == other.span
    }
}

impl Eq for Shift {}

impl PartialOrd for Shift {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Shift {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.work, other.work) {
            (false, false) => self.code.cmp(&other.code),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Lexicographic on spans: entry time dominates.
            (true, true) => self.span.cmp(&other.span),
        }
    }
}

impl Hash for Shift {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.work.hash(state);
        if self.work {
            self.span.hash(state);
        } else {
            self.code.hash(state);
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Equi-probable partition over shifts:
///
/// 1. rest shifts,
/// 2. early-morning shifts (entering up to 8:00),
/// 3. morning and afternoon shifts (entering up to 16:00),
/// 4. evening shifts.
pub fn shift_epp(s: &Shift) -> u32 {
    if !s.work() {
        return 1;
    }
    if s.t0() <= 8 * 60 {
        return 2;
    }
    if s.t0() <= 16 * 60 {
        return 3;
    }
    4
}
