use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an actor presents when invoking an operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    StoreOwner,
    Driver,
}

/// An authenticated principal, resolved by the (external) auth layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: Uuid) -> Self {
        Self { id, role: Role::Customer }
    }

    pub fn store_owner(id: Uuid) -> Self {
        Self { id, role: Role::StoreOwner }
    }

    pub fn driver(id: Uuid) -> Self {
        Self { id, role: Role::Driver }
    }
}
