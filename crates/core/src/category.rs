use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An expense category. Owned by the external catalog; the engine only ever
/// reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    /// Hex display color, e.g. "#FF6B6B".
    pub color: Option<String>,
}

impl Category {
    pub fn new(name: &str, description: &str, color: &str) -> Self {
        Category {
            id: None,
            name: name.to_string(),
            description: Some(description.to_string()),
            color: Some(color.to_string()),
        }
    }
}

/// Seed catalog for fresh installations: (name, description, color).
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "Food & Dining",
        "Restaurants, groceries, food delivery",
        "#FF6B6B",
    ),
    (
        "Transportation",
        "Gas, public transport, ride sharing, car maintenance",
        "#4ECDC4",
    ),
    (
        "Shopping",
        "Clothing, electronics, general purchases",
        "#45B7D1",
    ),
    (
        "Bills & Utilities",
        "Electricity, water, internet, phone, rent",
        "#FFA07A",
    ),
    (
        "Entertainment",
        "Movies, streaming, games, hobbies",
        "#98D8C8",
    ),
    (
        "Healthcare",
        "Medical, dental, pharmacy, insurance",
        "#F7DC6F",
    ),
    (
        "Education",
        "Courses, books, training, subscriptions",
        "#BB8FCE",
    ),
    ("Travel", "Flights, hotels, vacation expenses", "#85C1E9"),
    ("Other", "Miscellaneous expenses", "#D5DBDB"),
];
