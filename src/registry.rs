// 📋 Contestant Registry
//
// Owns the name -> record mapping. Every operation re-reads the whole
// snapshot from the store; every mutating operation writes the whole
// snapshot back. Nothing is cached between operations.

use crate::calculator::Calculations;
use crate::contestant::{
    parse_date_of_birth, validate_name, ContestantRecord, ContestantView, DATE_FORMAT,
};
use crate::error::{RegistryError, RegistryResult};
use crate::rankings::Leaderboard;
use crate::store::{FlatStore, Snapshot};
use chrono::{Local, NaiveDate};
use tracing::info;

/// Fields an edit may change; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestantEdit {
    pub date_of_birth: Option<String>,
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
}

impl ContestantEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_of_birth(mut self, dob: impl Into<String>) -> Self {
        self.date_of_birth = Some(dob.into());
        self
    }

    pub fn starting_weight(mut self, weight: f64) -> Self {
        self.starting_weight = Some(weight);
        self
    }

    pub fn current_weight(mut self, weight: f64) -> Self {
        self.current_weight = Some(weight);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date_of_birth.is_none() && self.starting_weight.is_none() && self.current_weight.is_none()
    }
}

pub struct ContestantRegistry<S: FlatStore> {
    store: S,
    calculations: Calculations,
    /// Fixed "today" for age and future-date checks; `None` uses the local clock
    today: Option<NaiveDate>,
}

impl<S: FlatStore> ContestantRegistry<S> {
    pub fn new(store: S) -> Self {
        ContestantRegistry {
            store,
            calculations: Calculations::local(),
            today: None,
        }
    }

    pub fn with_calculations(mut self, calculations: Calculations) -> Self {
        self.calculations = calculations;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn calculations(&self) -> &Calculations {
        &self.calculations
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn persist(&self, snapshot: &Snapshot) -> RegistryResult<()> {
        self.store.save(snapshot).map_err(RegistryError::from)
    }

    /// Validate a date of birth; returns its canonical form and the age for it
    fn checked_date_of_birth(&self, date_of_birth: &str) -> RegistryResult<(String, u32)> {
        let today = self.today();
        let dob = parse_date_of_birth(date_of_birth, today)?;
        Ok((
            dob.format(DATE_FORMAT).to_string(),
            self.calculations.age(dob, today),
        ))
    }

    /// Derived values must stay finite: JSON has no encoding for NaN or
    /// infinity, and a snapshot holding one no longer loads.
    fn recompute_derived(&self, record: &mut ContestantRecord) -> RegistryResult<()> {
        let lost = self
            .calculations
            .weight_lost(record.starting_weight, record.current_weight);
        let percentage = self.calculations.percentage_lost(lost, record.starting_weight);

        if !lost.is_finite() || !percentage.is_finite() {
            return Err(RegistryError::InvalidNumber {
                field: "Weight",
                input: record.current_weight.to_string(),
            });
        }

        record.set_derived(lost, percentage);
        Ok(())
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Register a new contestant at their starting weight
    pub fn add(&self, name: &str, starting_weight: f64, date_of_birth: &str) -> RegistryResult<()> {
        validate_name(name)?;
        let mut snapshot = self.store.load();

        if snapshot.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        if !starting_weight.is_finite() {
            return Err(RegistryError::InvalidNumber {
                field: "Weight",
                input: starting_weight.to_string(),
            });
        }

        let (date_of_birth, age) = self.checked_date_of_birth(date_of_birth)?;
        snapshot.insert(
            name.to_string(),
            ContestantRecord::new(date_of_birth, age, starting_weight),
        );
        self.persist(&snapshot)?;

        info!(contestant = name, starting_weight, age, "contestant added");
        Ok(())
    }

    /// Record a new current weight
    pub fn update_weight(&self, name: &str, current_weight: f64) -> RegistryResult<()> {
        let mut snapshot = self.store.load();
        let record = snapshot
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        record.current_weight = current_weight;
        self.recompute_derived(record)?;
        let (lost, percentage) = (record.weight_lost, record.percentage_lost);
        self.persist(&snapshot)?;

        info!(contestant = name, current_weight, weight_lost = lost, percentage_lost = percentage, "weight updated");
        Ok(())
    }

    /// Change any of date of birth, starting weight, current weight
    ///
    /// Applied in that order; derived values are recomputed once both weights
    /// hold their final values. An invalid date or weight leaves the store untouched.
    pub fn edit(&self, name: &str, changes: &ContestantEdit) -> RegistryResult<()> {
        let mut snapshot = self.store.load();
        if !snapshot.contains_key(name) {
            return Err(RegistryError::NotFound(name.to_string()));
        }

        let date_of_birth = match &changes.date_of_birth {
            Some(dob) => Some(self.checked_date_of_birth(dob)?),
            None => None,
        };

        let record = snapshot
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if let Some((dob, age)) = date_of_birth {
            record.date_of_birth = dob;
            record.age = age;
        }
        if let Some(weight) = changes.starting_weight {
            record.starting_weight = weight;
        }
        if let Some(weight) = changes.current_weight {
            record.current_weight = weight;
        }
        if changes.starting_weight.is_some() || changes.current_weight.is_some() {
            self.recompute_derived(record)?;
        }

        self.persist(&snapshot)?;

        info!(contestant = name, ?changes, "contestant edited");
        Ok(())
    }

    pub fn delete(&self, name: &str) -> RegistryResult<()> {
        let mut snapshot = self.store.load();
        if snapshot.shift_remove(name).is_none() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        self.persist(&snapshot)?;

        info!(contestant = name, "contestant deleted");
        Ok(())
    }

    /// Names in stored (insertion) order
    pub fn list_names(&self) -> Vec<String> {
        self.store.load().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> RegistryResult<ContestantView> {
        let snapshot = self.store.load();
        snapshot
            .get(name)
            .map(|record| ContestantView::from_record(name, record))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Full stored record including derived values
    pub fn record(&self, name: &str) -> RegistryResult<ContestantRecord> {
        self.store
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn rankings(&self) -> Leaderboard {
        Leaderboard::from_snapshot(&self.store.load())
    }
}

// ============================================================================
// TESTS
// ============================================================================
