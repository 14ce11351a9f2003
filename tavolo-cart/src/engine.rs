use crate::models::{CartLine, CartSnapshot, Customization};
use chrono::Utc;
use std::sync::Arc;
use tavolo_core::catalog::{CatalogError, MenuCatalog};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(Uuid),

    #[error("Menu item not available: {0}")]
    MenuItemUnavailable(Uuid),

    #[error("Cart line not found: {0}")]
    LineNotFound(Uuid),

    #[error("Cart holds items from store {current}, cannot add from store {attempted}")]
    StoreMismatch { current: Uuid, attempted: Uuid },

    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

struct CartState {
    store_id: Option<Uuid>,
    lines: Vec<CartLine>,
}

/// One customer session's cart. Mutations serialize on the inner lock, so two
/// browser tabs hammering the same session cannot lose updates.
pub struct SessionCart {
    session_id: String,
    catalog: Arc<dyn MenuCatalog>,
    inner: Mutex<CartState>,
}

impl SessionCart {
    pub fn new(session_id: impl Into<String>, catalog: Arc<dyn MenuCatalog>) -> Self {
        Self {
            session_id: session_id.into(),
            catalog,
            inner: Mutex::new(CartState { store_id: None, lines: Vec::new() }),
        }
    }

    /// Add a menu item to the cart. A line with the same customization identity
    /// absorbs the quantity; otherwise a new line is appended.
    pub async fn add_item(
        &self,
        menu_item_id: Uuid,
        quantity: u32,
        choices: impl IntoIterator<Item = Uuid>,
        removed_ingredients: impl IntoIterator<Item = Uuid>,
        instructions: Option<String>,
    ) -> Result<CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let item = self
            .catalog
            .get_item(menu_item_id)
            .await?
            .ok_or(CartError::MenuItemNotFound(menu_item_id))?;
        if !item.is_available {
            return Err(CartError::MenuItemUnavailable(menu_item_id));
        }

        let customization = Customization::new(choices, removed_ingredients, instructions);

        let mut state = self.inner.lock().await;

        if let Some(current) = state.store_id {
            if current != item.store_id {
                return Err(CartError::StoreMismatch { current, attempted: item.store_id });
            }
        } else {
            state.store_id = Some(item.store_id);
        }

        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|l| l.menu_item_id == menu_item_id && l.customization == customization)
        {
            // Merged lines keep the price captured by the first add
            line.quantity += quantity;
            tracing::debug!(session = %self.session_id, line_id = %line.id, "merged repeat add");
            return Ok(line.clone());
        }

        let line = CartLine {
            id: Uuid::new_v4(),
            menu_item_id,
            store_id: item.store_id,
            name: item.name,
            unit_price_cents: item.price_cents,
            quantity,
            customization,
            added_at: Utc::now(),
        };
        state.lines.push(line.clone());
        Ok(line)
    }

    /// Replace a line's customization in place. If the new identity collides with
    /// another line, the two merge: quantities sum, the edited line is removed.
    pub async fn update_customization(
        &self,
        line_id: Uuid,
        choices: impl IntoIterator<Item = Uuid>,
        removed_ingredients: impl IntoIterator<Item = Uuid>,
        instructions: Option<String>,
    ) -> Result<CartLine, CartError> {
        let customization = Customization::new(choices, removed_ingredients, instructions);

        let mut state = self.inner.lock().await;

        let edited_idx = state
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;
        let menu_item_id = state.lines[edited_idx].menu_item_id;

        let collision_idx = state
            .lines
            .iter()
            .position(|l| l.id != line_id && l.menu_item_id == menu_item_id && l.customization == customization);

        match collision_idx {
            Some(other_idx) => {
                let edited = state.lines.remove(edited_idx);
                // removal above may shift the surviving line's index
                let other_idx = if other_idx > edited_idx { other_idx - 1 } else { other_idx };
                let survivor = &mut state.lines[other_idx];
                survivor.quantity += edited.quantity;
                tracing::debug!(
                    session = %self.session_id,
                    merged_into = %survivor.id,
                    "customization edit collided, lines merged"
                );
                Ok(survivor.clone())
            }
            None => {
                let line = &mut state.lines[edited_idx];
                line.customization = customization;
                Ok(line.clone())
            }
        }
    }

    /// Set a line's quantity; zero removes the line
    pub async fn set_quantity(&self, line_id: Uuid, quantity: u32) -> Result<(), CartError> {
        let mut state = self.inner.lock().await;

        let idx = state
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;

        if quantity == 0 {
            state.lines.remove(idx);
            if state.lines.is_empty() {
                state.store_id = None;
            }
        } else {
            state.lines[idx].quantity = quantity;
        }
        Ok(())
    }

    pub async fn remove_line(&self, line_id: Uuid) -> Result<(), CartError> {
        self.set_quantity(line_id, 0).await
    }

    /// Empty the cart. Never fails, even on an already-empty cart.
    pub async fn clear(&self) {
        let mut state = self.inner.lock().await;
        state.lines.clear();
        state.store_id = None;
    }

    /// Immutable ordered view with aggregate quantity and subtotal.
    /// The subtotal is recomputed from line snapshots on every call.
    pub async fn snapshot(&self) -> CartSnapshot {
        let state = self.inner.lock().await;
        CartSnapshot {
            store_id: state.store_id,
            lines: state.lines.clone(),
            total_quantity: state.lines.iter().map(|l| l.quantity).sum(),
            subtotal_cents: state.lines.iter().map(|l| l.line_total_cents()).sum(),
            taken_at: Utc::now(),
        }
    }
}
