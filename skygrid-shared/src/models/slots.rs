use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Index offset for per-day additional slots, keeping their index space
/// disjoint from the base slots.
pub const ADDITIONAL_SLOT_OFFSET: u32 = 100;

/// The day's time rows: a base slot list shared by every day, plus
/// per-day label overrides and appended additional slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    /// Labels of the base slots, indexed 0..n.
    pub base_slots: Vec<String>,
    /// Per-day replacements for base slot labels.
    #[serde(default)]
    pub overrides: BTreeMap<u32, String>,
    /// Extra slots for this day only, keyed at `ADDITIONAL_SLOT_OFFSET + n`.
    #[serde(default)]
    pub additional: BTreeMap<u32, String>,
}

impl DaySchedule {
    pub fn new(date: NaiveDate, base_slots: Vec<String>) -> Self {
        Self {
            date,
            base_slots,
            overrides: BTreeMap::new(),
            additional: BTreeMap::new(),
        }
    }

    /// Label shown for a time row, honoring per-day overrides
    pub fn label_for(&self, time_row: u32) -> Option<&str> {
        if let Some(label) = self.overrides.get(&time_row) {
            return Some(label);
        }
        if time_row >= ADDITIONAL_SLOT_OFFSET {
            return self.additional.get(&time_row).map(String::as_str);
        }
        self.base_slots.get(time_row as usize).map(String::as_str)
    }

    /// Replace the label of an existing base slot for this day only
    pub fn override_label(&mut self, time_row: u32, label: String) {
        self.overrides.insert(time_row, label);
    }

    /// Append an additional slot; returns its row index in the offset space
    pub fn append_slot(&mut self, label: String) -> u32 {
        let next = self
            .additional
            .keys()
            .next_back()
            .map_or(ADDITIONAL_SLOT_OFFSET, |k| k + 1);
        self.additional.insert(next, label);
        next
    }

    /// All time rows for the day in display order: base first, then additional
    pub fn rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = (0..self.base_slots.len() as u32).collect();
        rows.extend(self.additional.keys().copied());
        rows
    }

    pub fn row_count(&self) -> usize {
        self.base_slots.len() + self.additional.len()
    }
}
