use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

/// Source of local wall-clock time. Store logic never reads the system clock directly.
///
/// `timestamp_millis` is only used for id assignment; the default treats `now` as UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }

    fn timestamp_millis(&self) -> i64 {
        self.now().and_utc().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn timestamp_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_start_of(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add_days(Days::new(days)) {
            *now = next;
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock();
        *now += chrono::Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
