//! Daily camouflage statistics
//!
//! Visit count and accumulated cover time, reset when the calendar day
//! changes. Persisted inside the configuration record so a restart picks
//! up where the last session left off.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// How many times the boss showed up today
    #[serde(default)]
    pub boss_visit_count: u32,
    /// Accumulated disguised time today, in seconds
    #[serde(default)]
    pub cover_seconds: u64,
    /// Day the counters belong to
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
}

impl Statistics {
    /// Called when disguise mode is armed. If the stored day is not
    /// `today`, both counters reset before anything else this session.
    pub fn on_armed(&mut self, today: NaiveDate) {
        if self.last_active_date != Some(today) {
            self.boss_visit_count = 0;
            self.cover_seconds = 0;
            self.last_active_date = Some(today);
        }
    }

    /// One elapsed second of armed time
    pub fn tick(&mut self) {
        self.cover_seconds += 1;
    }

    /// The boss arrived once more
    pub fn record_visit(&mut self) {
        self.boss_visit_count += 1;
    }

    /// Human-readable snapshot for the tray tooltip
    pub fn snapshot(&self) -> String {
        let hours = self.cover_seconds / 3600;
        let minutes = (self.cover_seconds % 3600) / 60;
        let seconds = self.cover_seconds % 60;
        format!(
            "Boss came {} time(s) today, covered for {}h {}m {}s",
            self.boss_visit_count, hours, minutes, seconds
        )
    }
}
