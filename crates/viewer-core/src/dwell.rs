//! Per-page dwell time.
//!
//! A visit starts with [`DwellTracker::record_arrival`] and ends with
//! [`DwellTracker::record_departure`], which appends the elapsed seconds to the
//! departed page's list. Lists keep visit order.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwellRecord {
    pages: BTreeMap<u32, Vec<f64>>,
}

impl DwellRecord {
    pub fn durations(&self, page: u32) -> &[f64] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pages(&self) -> impl Iterator<Item = (u32, &[f64])> + '_ {
        self.pages.iter().map(|(page, durations)| (*page, durations.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn report(&self) -> DwellReport {
        let pages = self
            .pages
            .iter()
            .map(|(page, durations)| PageDwell {
                page: *page,
                visits: durations.len(),
                total_seconds: durations.iter().sum(),
            })
            .collect();

        DwellReport { pages }
    }

    fn push(&mut self, page: u32, seconds: f64) {
        self.pages.entry(page).or_default().push(seconds);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellReport {
    pub pages: Vec<PageDwell>,
}

impl DwellReport {
    pub fn total_seconds(&self) -> f64 {
        self.pages.iter().map(|page| page.total_seconds).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDwell {
    pub page: u32,
    pub visits: usize,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DwellTracker {
    arrival: Option<Instant>,
    record: DwellRecord,
}

impl DwellTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_arrival(&mut self, at: Instant) {
        self.arrival = Some(at);
    }

    /// Closes the visit on `page` and returns the seconds recorded for it.
    ///
    /// Returns `None` without recording anything when no arrival has been seen.
    /// A departure earlier than the arrival counts as zero seconds.
    pub fn record_departure(&mut self, page: u32, at: Instant) -> Option<f64> {
        let Some(arrival) = self.arrival else {
            log::debug!("departure from page {page} without an arrival; not recorded");
            return None;
        };

        let seconds = at.saturating_duration_since(arrival).as_secs_f64();
        self.record.push(page, seconds);
        Some(seconds)
    }

    pub fn record(&self) -> &DwellRecord {
        &self.record
    }

    /// Hands back everything recorded so far and starts over.
    pub fn take_record(&mut self) -> DwellRecord {
        self.arrival = None;
        std::mem::take(&mut self.record)
    }

    pub fn reset(&mut self) {
        self.arrival = None;
        self.record = DwellRecord::default();
    }
}
