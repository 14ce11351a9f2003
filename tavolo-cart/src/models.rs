use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The identity-bearing part of a cart line: two lines for the same menu item
/// with equal customizations are the same line and must be merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Customization {
    pub choices: BTreeSet<Uuid>,
    pub removed_ingredients: BTreeSet<Uuid>,
    pub instructions: Option<String>,
}

impl Customization {
    /// Build a customization with set semantics for ids and normalized instructions
    pub fn new(
        choices: impl IntoIterator<Item = Uuid>,
        removed_ingredients: impl IntoIterator<Item = Uuid>,
        instructions: Option<String>,
    ) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            removed_ingredients: removed_ingredients.into_iter().collect(),
            instructions: normalize_instructions(instructions),
        }
    }

    pub fn plain() -> Self {
        Self::new([], [], None)
    }
}

/// Trimmed, empty-to-absent
fn normalize_instructions(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// One customization variant of a menu item in an unconfirmed cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    /// Price captured when the line was first added; live menu changes do not touch it
    pub unit_price_cents: i32,
    pub quantity: u32,
    pub customization: Customization,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn line_total_cents(&self) -> i32 {
        self.unit_price_cents * self.quantity as i32
    }
}

/// Immutable, ordered view of a cart, taken for checkout and quoting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub store_id: Option<Uuid>,
    pub lines: Vec<CartLine>,
    pub total_quantity: u32,
    pub subtotal_cents: i32,
    pub taken_at: DateTime<Utc>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
