use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::category;

pub type HabitId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub streak: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_target_days"
    )]
    pub target_days: Option<TargetDays>,
    pub category_id: String,
}

/// Habit-building targets offered by the add form.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "u32")]
pub enum TargetDays {
    TwentyOne,
    Thirty,
    SixtySix,
    Ninety,
}

impl TargetDays {
    pub const ALL: [TargetDays; 4] = [
        TargetDays::TwentyOne,
        TargetDays::Thirty,
        TargetDays::SixtySix,
        TargetDays::Ninety,
    ];

    pub fn days(self) -> u32 {
        match self {
            TargetDays::TwentyOne => 21,
            TargetDays::Thirty => 30,
            TargetDays::SixtySix => 66,
            TargetDays::Ninety => 90,
        }
    }

    pub fn from_days(days: u32) -> Result<Option<Self>, HabitError> {
        match days {
            0 => Ok(None),
            21 => Ok(Some(TargetDays::TwentyOne)),
            30 => Ok(Some(TargetDays::Thirty)),
            66 => Ok(Some(TargetDays::SixtySix)),
            90 => Ok(Some(TargetDays::Ninety)),
            other => Err(HabitError::InvalidTargetDays(other)),
        }
    }
}

impl From<TargetDays> for u32 {
    fn from(value: TargetDays) -> Self {
        value.days()
    }
}

// Stored records predate the enum: 0 meant "unset" and anything unrecognised is dropped.
fn deserialize_target_days<'de, D>(deserializer: D) -> Result<Option<TargetDays>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<u32> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|days| TargetDays::from_days(days).ok().flatten()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    #[error("habit name must not be empty")]
    EmptyName,
    #[error("a category must be selected")]
    MissingCategory,
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("{0} is not a supported target; choose 21, 30, 66 or 90 days")]
    InvalidTargetDays(u32),
    #[error("no unused habit id is left")]
    IdsExhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub goal: Option<String>,
    pub target_days: Option<TargetDays>,
    pub category_id: String,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_id: category_id.into(),
            ..Self::default()
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn with_target_days(mut self, target: TargetDays) -> Self {
        self.target_days = Some(target);
        self
    }

    pub fn validate(&self) -> Result<(), HabitError> {
        if self.name.trim().is_empty() {
            return Err(HabitError::EmptyName);
        }
        let category_id = self.category_id.trim();
        if category_id.is_empty() {
            return Err(HabitError::MissingCategory);
        }
        if !category::is_known_category(category_id) {
            return Err(HabitError::UnknownCategory(category_id.to_string()));
        }
        Ok(())
    }

    pub(crate) fn into_habit(self, id: HabitId) -> Habit {
        let goal = self
            .goal
            .map(|goal| goal.trim().to_string())
            .filter(|goal| !goal.is_empty());
        Habit {
            id,
            name: self.name.trim().to_string(),
            streak: 0,
            completed: false,
            last_completed_date: None,
            goal,
            target_days: self.target_days,
            category_id: self.category_id.trim().to_string(),
        }
    }
}

/// What a daily reset did to a single habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Last completion is older than yesterday: streak and date cleared.
    StreakBroken,
    /// Today's checkbox was cleared; streak kept.
    RolledOver,
    Unchanged,
}

impl Habit {
    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed && self.last_completed_date == Some(day)
    }

    pub fn category(&self) -> Option<&'static category::Category> {
        category::category_by_id(&self.category_id)
    }

    pub fn mark_completed(&mut self, today: NaiveDate) {
        self.completed = true;
        self.streak = self.streak.saturating_add(1);
        self.last_completed_date = Some(today);
    }

    pub fn mark_uncompleted(&mut self) {
        self.completed = false;
        self.streak = self.streak.saturating_sub(1);
        self.last_completed_date = None;
    }

    /// Re-evaluates completion against the calendar. The `< yesterday` comparison is strict:
    /// a habit last done yesterday keeps its streak.
    pub fn apply_daily_reset(&mut self, today: NaiveDate, yesterday: NaiveDate) -> ResetOutcome {
        match self.last_completed_date {
            Some(last) if last < yesterday => {
                self.completed = false;
                self.streak = 0;
                self.last_completed_date = None;
                ResetOutcome::StreakBroken
            }
            Some(last) if last == today => ResetOutcome::Unchanged,
            _ if self.completed => {
                self.completed = false;
                ResetOutcome::RolledOver
            }
            _ => ResetOutcome::Unchanged,
        }
    }
}
