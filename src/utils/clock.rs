use chrono::{DateTime, Utc};

use spese_core::Clock;

/// Wall clock used by the shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
