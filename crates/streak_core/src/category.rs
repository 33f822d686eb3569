use serde::Serialize;

/// Presentation token for a category badge. The UI layer maps it to concrete colors.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoryColor {
    Green,
    Blue,
    Purple,
    Yellow,
    Pink,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub color: CategoryColor,
    pub icon: &'static str,
}

const CATEGORIES: [Category; 5] = [
    Category {
        id: "health",
        name: "Health & Fitness",
        color: CategoryColor::Green,
        icon: "💪",
    },
    Category {
        id: "learning",
        name: "Learning",
        color: CategoryColor::Blue,
        icon: "📚",
    },
    Category {
        id: "mindfulness",
        name: "Mindfulness",
        color: CategoryColor::Purple,
        icon: "🧘",
    },
    Category {
        id: "productivity",
        name: "Productivity",
        color: CategoryColor::Yellow,
        icon: "⚡",
    },
    Category {
        id: "creativity",
        name: "Creativity",
        color: CategoryColor::Pink,
        icon: "🎨",
    },
];

/// Every known category, in display order.
pub fn categories() -> &'static [Category] {
    &CATEGORIES
}

/// Looks up a category by id. A miss is not an error: callers render the habit as uncategorized.
pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

pub fn is_known_category(id: &str) -> bool {
    category_by_id(id).is_some()
}
