//! Daily slot deduplication.
//!
//! Keeps the set of slot URLs seen since the last local-day rollover and
//! reports which slots in a poll cycle have not been seen yet.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::models::Slot;

/// Seen-slot bookkeeping for one calendar day.
#[derive(Debug, Clone)]
pub struct SlotTracker {
    date: NaiveDate,
    seen: HashSet<String>,
    daily_counts: HashMap<String, usize>,
}

impl SlotTracker {
    /// Create an empty tracker for `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            seen: HashSet::new(),
            daily_counts: HashMap::new(),
        }
    }

    /// Reset all state if `today` differs from the recorded date.
    ///
    /// `today` must be a single clock read; it is both compared and stored.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if today == self.date {
            return false;
        }
        log::info!(
            "Date changed {} -> {}; clearing {} seen slot(s)",
            self.date,
            today,
            self.seen.len()
        );
        self.date = today;
        self.seen.clear();
        self.daily_counts.clear();
        true
    }

    /// Record a cycle's slots and return the ones not seen before, keyed by URL.
    pub fn observe<I>(&mut self, slots: I) -> BTreeMap<String, Slot>
    where
        I: IntoIterator<Item = Slot>,
    {
        let mut new_slots = BTreeMap::new();
        for slot in slots {
            if self.seen.insert(slot.url.clone()) {
                new_slots.insert(slot.url.clone(), slot);
            }
        }
        new_slots
    }

    /// Add notified slot counts per appointment type.
    pub fn record(&mut self, increments: &HashMap<String, usize>) {
        for (kind, count) in increments {
            *self.daily_counts.entry(kind.clone()).or_default() += count;
        }
    }

    pub fn daily_counts(&self) -> &HashMap<String, usize> {
        &self.daily_counts
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn slot(url: &str) -> Slot {
        Slot {
            url: url.to_string(),
            appointment_type: "REAL ID".to_string(),
            location: "EDISON".to_string(),
            date: "2024-05-20".to_string(),
            time: "830".to_string(),
        }
    }

    fn urls(map: &BTreeMap<String, Slot>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_new_is_set_difference_across_cycles() {
        let mut tracker = SlotTracker::new(day(1));

        let first = tracker.observe(vec![slot("A"), slot("B")]);
        assert_eq!(urls(&first), vec!["A", "B"]);
        assert_eq!(tracker.seen_count(), 2);

        let second = tracker.observe(vec![slot("B"), slot("C")]);
        assert_eq!(urls(&second), vec!["C"]);

        assert!(!tracker.roll_over(day(1)));
        let third = tracker.observe(vec![slot("A"), slot("B"), slot("C")]);
        assert!(third.is_empty());
    }

    #[test]
    fn test_rollover_allows_renotification() {
        let mut tracker = SlotTracker::new(day(1));
        tracker.observe(vec![slot("A"), slot("B")]);
        tracker.observe(vec![slot("B"), slot("C")]);
        tracker.record(&HashMap::from([("REAL ID".to_string(), 3)]));

        assert!(tracker.roll_over(day(2)));
        assert_eq!(tracker.seen_count(), 0);
        assert!(tracker.daily_counts().is_empty());
        assert_eq!(tracker.date(), day(2));

        let after = tracker.observe(vec![slot("B")]);
        assert_eq!(urls(&after), vec!["B"]);
    }

    #[test]
    fn test_duplicates_within_cycle_collapse() {
        let mut tracker = SlotTracker::new(day(1));
        let new = tracker.observe(vec![slot("A"), slot("A")]);
        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_record_accumulates() {
        let mut tracker = SlotTracker::new(day(1));
        tracker.record(&HashMap::from([("REAL ID".to_string(), 2)]));
        tracker.record(&HashMap::from([("REAL ID".to_string(), 1)]));
        assert_eq!(tracker.daily_counts()["REAL ID"], 3);
    }
}
