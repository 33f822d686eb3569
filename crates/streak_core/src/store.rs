use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    filter,
    habit::{Habit, HabitDraft, HabitError, HabitId, ResetOutcome},
    storage::{self, HabitStorage, MemoryStorage, STORAGE_KEY},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub habit_id: HabitId,
    pub habit_name: String,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed(CompletionEvent),
    Uncompleted { habit_id: HabitId, streak: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub rolled_over: usize,
    pub streaks_broken: usize,
}

impl ResetSummary {
    pub fn changed(&self) -> usize {
        self.rolled_over + self.streaks_broken
    }
}

/// Habits shipped on first run.
pub fn seed_habits() -> Vec<Habit> {
    [
        (1, "Morning Exercise", 3, "health"),
        (2, "Read 30 minutes", 5, "learning"),
        (3, "Meditate", 2, "mindfulness"),
    ]
    .into_iter()
    .map(|(id, name, streak, category_id)| Habit {
        id,
        name: name.to_string(),
        streak,
        completed: false,
        last_completed_date: None,
        goal: None,
        target_days: None,
        category_id: category_id.to_string(),
    })
    .collect()
}

/// Ordered, persisted collection of habits. Every mutation rewrites the whole collection.
pub struct HabitStore {
    habits: Vec<Habit>,
    storage: Box<dyn HabitStorage>,
    clock: Arc<dyn Clock>,
    last_issued_id: HabitId,
}

pub struct HabitStoreBuilder {
    storage: Option<Box<dyn HabitStorage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl HabitStoreBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            clock: None,
        }
    }

    pub fn with_storage(mut self, storage: Box<dyn HabitStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<HabitStore> {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let start = Instant::now();
        let habits = load_or_seed(storage.as_ref());
        let last_issued_id = habits.iter().map(|habit| habit.id).max().unwrap_or(0);
        info!(
            habit_count = habits.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "habit store loaded"
        );
        Ok(HabitStore {
            habits,
            storage,
            clock,
            last_issued_id,
        })
    }
}

impl Default for HabitStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn load_or_seed(storage: &dyn HabitStorage) -> Vec<Habit> {
    match storage.get(STORAGE_KEY) {
        Ok(Some(blob)) => match storage::decode_habits(&blob) {
            Ok(habits) => habits,
            Err(err) => {
                warn!(%err, "stored habits unreadable; starting from seed habits");
                seed_habits()
            }
        },
        Ok(None) => {
            debug!("no stored habits; starting from seed habits");
            seed_habits()
        }
        Err(err) => {
            warn!(%err, "failed to read stored habits; starting from seed habits");
            seed_habits()
        }
    }
}

impl HabitStore {
    pub fn builder() -> HabitStoreBuilder {
        HabitStoreBuilder::new()
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Flips completion for `id`. Unknown ids are ignored and return `None`.
    pub fn toggle(&mut self, id: HabitId) -> Option<ToggleOutcome> {
        let today = self.clock.today();
        let habit = self.habits.iter_mut().find(|habit| habit.id == id)?;
        let outcome = if habit.completed {
            habit.mark_uncompleted();
            ToggleOutcome::Uncompleted {
                habit_id: id,
                streak: habit.streak,
            }
        } else {
            habit.mark_completed(today);
            ToggleOutcome::Completed(CompletionEvent {
                habit_id: id,
                habit_name: habit.name.clone(),
                streak: habit.streak,
            })
        };
        debug!(habit_id = id, ?outcome, "habit toggled");
        self.persist();
        Some(outcome)
    }

    pub fn add(&mut self, draft: HabitDraft) -> Result<HabitId, HabitError> {
        draft.validate()?;
        let id = self.next_id().ok_or(HabitError::IdsExhausted)?;
        let habit = draft.into_habit(id);
        info!(habit_id = id, name = %habit.name, category = %habit.category_id, "habit added");
        self.habits.push(habit);
        self.persist();
        Ok(id)
    }

    pub fn remove(&mut self, id: HabitId) -> bool {
        let before = self.habits.len();
        self.habits.retain(|habit| habit.id != id);
        if self.habits.len() == before {
            return false;
        }
        info!(habit_id = id, "habit removed");
        self.persist();
        true
    }

    /// Moves `id` to `destination` within the view filtered by `category`. The habit takes the
    /// full-collection slot of whichever habit is displayed there; out-of-range destinations
    /// clamp to the last position.
    pub fn reorder(&mut self, id: HabitId, destination: usize, category: Option<&str>) -> bool {
        let view = filter::filter_by_category(&self.habits, category);
        if !view.iter().any(|habit| habit.id == id) {
            return false;
        }
        let Some(target) = view.get(destination.min(view.len() - 1)).map(|habit| habit.id) else {
            return false;
        };
        if target == id {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(id), self.position(target)) else {
            return false;
        };
        let habit = self.habits.remove(from);
        self.habits.insert(to, habit);
        debug!(habit_id = id, from, to, "habit reordered");
        self.persist();
        true
    }

    pub fn daily_reset(&mut self) -> ResetSummary {
        let today = self.clock.today();
        let yesterday = self.clock.yesterday();
        let mut summary = ResetSummary::default();
        for habit in &mut self.habits {
            match habit.apply_daily_reset(today, yesterday) {
                ResetOutcome::StreakBroken => {
                    debug!(habit_id = habit.id, "streak broken");
                    summary.streaks_broken += 1;
                }
                ResetOutcome::RolledOver => summary.rolled_over += 1,
                ResetOutcome::Unchanged => {}
            }
        }
        if summary.changed() > 0 {
            info!(
                %today,
                rolled_over = summary.rolled_over,
                streaks_broken = summary.streaks_broken,
                "daily reset applied"
            );
            self.persist();
        }
        summary
    }

    fn position(&self, id: HabitId) -> Option<usize> {
        self.habits.iter().position(|habit| habit.id == id)
    }

    // Creation timestamp, bumped past every id seen so far.
    fn next_id(&mut self) -> Option<HabitId> {
        let stamp = HabitId::try_from(self.clock.timestamp_millis()).unwrap_or(0);
        let id = stamp.max(self.last_issued_id.checked_add(1)?);
        self.last_issued_id = id;
        Some(id)
    }

    fn persist(&self) {
        let result = storage::encode_habits(&self.habits)
            .and_then(|blob| self.storage.set(STORAGE_KEY, &blob));
        if let Err(err) = result {
            warn!(%err, "failed to persist habits");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::StorageError;
    use chrono::NaiveDate;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at_start_of(
            NaiveDate::from_ymd_opt(2025, 10, 24).unwrap(),
        ))
    }

    fn store_with(clock: Arc<ManualClock>) -> HabitStore {
        HabitStore::builder()
            .with_clock(clock)
            .build()
            .expect("store")
    }

    fn ids(store: &HabitStore) -> Vec<HabitId> {
        store.habits().iter().map(|habit| habit.id).collect()
    }

    #[test]
    fn starts_from_seed_habits() {
        let store = store_with(clock());
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(store.get(2).unwrap().streak, 5);
    }

    #[test]
    fn toggle_round_trip_and_celebration_payload() {
        let mut store = store_with(clock());
        let outcome = store.toggle(3).expect("known habit");
        assert_eq!(
            outcome,
            ToggleOutcome::Completed(CompletionEvent {
                habit_id: 3,
                habit_name: "Meditate".into(),
                streak: 3,
            })
        );
        assert_eq!(
            store.get(3).unwrap().last_completed_date,
            NaiveDate::from_ymd_opt(2025, 10, 24)
        );
        assert_eq!(
            store.toggle(3),
            Some(ToggleOutcome::Uncompleted {
                habit_id: 3,
                streak: 2
            })
        );
        let habit = store.get(3).unwrap();
        assert!(!habit.completed);
        assert_eq!(habit.last_completed_date, None);
    }

    #[test]
    fn toggle_unknown_id_changes_nothing() {
        let mut store = store_with(clock());
        let before = store.habits().to_vec();
        assert!(store.toggle(999).is_none());
        assert_eq!(store.habits(), before.as_slice());
    }

    #[test]
    fn add_appends_with_fresh_id() {
        let clock = clock();
        let mut store = store_with(clock.clone());
        let id = store
            .add(HabitDraft::new("Drink Water", "health"))
            .expect("valid draft");
        let habit = store.habits().last().unwrap();
        assert_eq!(habit.id, id);
        assert_eq!(habit.streak, 0);
        assert!(!habit.completed);
        assert!(![1, 2, 3].contains(&id));

        // Same millisecond: still unique and increasing.
        let second = store.add(HabitDraft::new("Stretch", "health")).unwrap();
        assert!(second > id);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut store = store_with(clock());
        assert_eq!(
            store.add(HabitDraft::new("  ", "health")),
            Err(HabitError::EmptyName)
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn remove_is_noop_for_unknown_id() {
        let mut store = store_with(clock());
        assert!(!store.remove(42));
        assert!(store.remove(1));
        assert_eq!(ids(&store), vec![2, 3]);
    }

    #[test]
    fn reorder_moves_first_to_last() {
        let mut store = store_with(clock());
        assert!(store.reorder(1, 2, None));
        assert_eq!(ids(&store), vec![2, 3, 1]);
        assert!(!store.reorder(77, 0, None));
        assert!(!store.reorder(1, 99, None));
    }

    #[test]
    fn reorder_past_the_end_clamps_to_last_slot() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = HabitStore::builder()
            .with_storage(Box::new(storage.clone()))
            .with_clock(clock())
            .build()
            .unwrap();
        assert!(store.reorder(1, 99, None));
        assert_eq!(ids(&store), vec![2, 3, 1]);
        assert_eq!(stored_ids(&storage), vec![2, 3, 1]);
    }

    #[test]
    fn reorder_within_filter_preserves_hidden_order() {
        let mut store = store_with(clock());
        let a = store.add(HabitDraft::new("Flashcards", "learning")).unwrap();
        let b = store.add(HabitDraft::new("Run", "health")).unwrap();
        // full: [1 health, 2 learning, 3 mindfulness, a learning, b health]
        assert!(store.reorder(a, 0, Some("learning")));
        assert_eq!(ids(&store), vec![1, a, 2, 3, b]);
        assert!(!store.reorder(a, 0, Some("health")));
    }

    #[test]
    fn daily_reset_rolls_over_and_breaks_streaks() {
        let clock = clock();
        let mut store = store_with(clock.clone());
        store.toggle(1);
        store.toggle(2);
        clock.advance_days(1);
        store.daily_reset();
        store.toggle(2);
        clock.advance_days(1);

        let summary = store.daily_reset();
        // Habit 1 last done two days ago; habit 2 yesterday.
        assert_eq!(summary.streaks_broken, 1);
        assert_eq!(summary.rolled_over, 1);
        let one = store.get(1).unwrap();
        assert_eq!((one.streak, one.completed, one.last_completed_date), (0, false, None));
        let two = store.get(2).unwrap();
        assert_eq!(two.streak, 7);
        assert!(!two.completed);

        let snapshot = store.habits().to_vec();
        assert_eq!(store.daily_reset(), ResetSummary::default());
        assert_eq!(store.habits(), snapshot.as_slice());
    }

    #[test]
    fn streak_never_negative_under_toggles() {
        let mut store = store_with(clock());
        for _ in 0..7 {
            store.toggle(3);
            assert!(matches!(store.get(3).unwrap().streak, 2 | 3));
        }
        store.toggle(3);
        assert_eq!(store.get(3).unwrap().streak, 2);
    }

    struct FailingStorage;

    impl HabitStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(Some("{\"broken\":".into()))
        }

        fn set(&self, key: &str, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::other("read-only"),
            })
        }
    }

    #[test]
    fn unreadable_storage_falls_back_and_write_failures_do_not_block() {
        let mut store = HabitStore::builder()
            .with_storage(Box::new(FailingStorage))
            .with_clock(clock())
            .build()
            .expect("store");
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert!(store.toggle(1).is_some());
        assert!(store.get(1).unwrap().completed);
    }

    fn stored_ids(storage: &MemoryStorage) -> Vec<HabitId> {
        let blob = storage.get(STORAGE_KEY).unwrap().expect("written");
        storage::decode_habits(&blob)
            .unwrap()
            .iter()
            .map(|habit| habit.id)
            .collect()
    }

    #[test]
    fn every_mutation_rewrites_the_collection() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = HabitStore::builder()
            .with_storage(Box::new(storage.clone()))
            .with_clock(clock())
            .build()
            .unwrap();
        store.reorder(3, 0, None);
        assert_eq!(stored_ids(&storage), vec![3, 1, 2]);

        assert!(store.remove(1));
        assert_eq!(stored_ids(&storage), vec![3, 2]);

        let id = store.add(HabitDraft::new("Drink Water", "health")).unwrap();
        assert_eq!(stored_ids(&storage), vec![3, 2, id]);

        store.toggle(2);
        let blob = storage.get(STORAGE_KEY).unwrap().unwrap();
        let stored = storage::decode_habits(&blob).unwrap();
        assert!(stored.iter().any(|habit| habit.id == 2 && habit.completed));
    }

    #[test]
    fn exhausted_id_space_rejects_add_without_panicking() {
        let blob = r#"{"version":1,"habits":[{"id":18446744073709551615,"name":"Read","streak":1,"completed":false,"categoryId":"learning"}]}"#;
        let mut store = HabitStore::builder()
            .with_storage(Box::new(MemoryStorage::with_entry(STORAGE_KEY, blob)))
            .with_clock(clock())
            .build()
            .unwrap();
        assert_eq!(ids(&store), vec![u64::MAX]);
        assert_eq!(
            store.add(HabitDraft::new("Drink Water", "health")),
            Err(HabitError::IdsExhausted)
        );
        assert_eq!(store.len(), 1);
    }
}
