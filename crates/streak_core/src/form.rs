use crate::{
    habit::{HabitDraft, HabitError, HabitId, TargetDays},
    store::HabitStore,
};

/// Editable state behind the "Add New Habit" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitForm {
    pub name: String,
    pub goal: String,
    pub target_days: Option<TargetDays>,
    pub category_id: Option<String>,
    open: bool,
}

impl HabitForm {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty() && self.category_id.is_some()
    }

    pub fn select_category(&mut self, category_id: &str) {
        self.category_id = Some(category_id.to_string());
    }

    /// Sets the target from the raw select value; `0` clears it.
    pub fn set_target_days(&mut self, days: u32) -> Result<(), HabitError> {
        self.target_days = TargetDays::from_days(days)?;
        Ok(())
    }

    pub fn to_draft(&self) -> Result<HabitDraft, HabitError> {
        let draft = HabitDraft {
            name: self.name.clone(),
            goal: Some(self.goal.clone()),
            target_days: self.target_days,
            category_id: self
                .category_id
                .clone()
                .ok_or(HabitError::MissingCategory)?,
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn submit(&mut self, store: &mut HabitStore) -> Result<HabitId, HabitError> {
        let draft = self.to_draft()?;
        let id = store.add(draft)?;
        self.cancel();
        Ok(id)
    }
}
