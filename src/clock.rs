//! Time source for timestamps and relative due dates.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local, NaiveDate, SubsecRound, Utc};

/// Supplies "now" and "today" to the task manager.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The calendar date relative dates and overdue checks are measured from.
    fn today(&self) -> NaiveDate;
}

/// Wall clock. Timestamps are truncated to whole seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A hand-driven clock. Clones share the same instant, so a test can keep one
/// handle and move time forward under a manager that owns another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Rc::new(Cell::new(now)) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}
