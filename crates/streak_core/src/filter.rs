use crate::{category::Category, habit::Habit};

/// Habits whose category matches `category`, in store order. `None` selects everything.
pub fn filter_by_category<'a>(habits: &'a [Habit], category: Option<&str>) -> Vec<&'a Habit> {
    habits
        .iter()
        .filter(|habit| category.map_or(true, |id| habit.category_id == id))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    selected: Option<String>,
}

impl CategoryFilter {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, category: &Category) -> bool {
        self.selected.as_deref() == Some(category.id)
    }

    pub fn toggle(&mut self, category_id: &str) {
        if self.selected.as_deref() == Some(category_id) {
            self.selected = None;
        } else {
            self.selected = Some(category_id.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn apply<'a>(&self, habits: &'a [Habit]) -> Vec<&'a Habit> {
        filter_by_category(habits, self.selected())
    }

    pub fn empty_message(&self) -> &'static str {
        if self.selected.is_some() {
            "No habits in this category yet"
        } else {
            "No habits added yet"
        }
    }
}
