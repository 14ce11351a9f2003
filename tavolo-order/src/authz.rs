use crate::models::Order;
use serde::{Deserialize, Serialize};
use tavolo_core::directory::FulfillmentType;
use tavolo_core::identity::{Actor, Role};

/// The named lifecycle transitions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionEvent {
    Accept,
    Reject,
    Cancel,
    StartPreparing,
    MarkReady,
    StartDelivering,
    Complete,
}

/// How an actor relates to a specific order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    OrderCustomer,
    StoreOwner,
    AssignedDriver,
    UnassignedDriver,
    Stranger,
}

/// Pure function of (actor role, actor identity, order ownership)
pub fn relationship_of(actor: &Actor, order: &Order) -> Relationship {
    match actor.role {
        Role::Customer if actor.id == order.customer_id => Relationship::OrderCustomer,
        Role::StoreOwner if actor.id == order.store_owner_id => Relationship::StoreOwner,
        Role::Driver => match order.assigned_driver_id {
            Some(driver_id) if driver_id == actor.id => Relationship::AssignedDriver,
            Some(_) => Relationship::Stranger,
            None => Relationship::UnassignedDriver,
        },
        _ => Relationship::Stranger,
    }
}

/// The capability set for each transition: which relationships may invoke it
pub fn capability_set(event: TransitionEvent, fulfillment: FulfillmentType) -> &'static [Relationship] {
    use Relationship::*;
    match event {
        TransitionEvent::Accept => &[StoreOwner],
        TransitionEvent::Reject => &[StoreOwner],
        TransitionEvent::Cancel => &[OrderCustomer, StoreOwner],
        TransitionEvent::StartPreparing => &[StoreOwner],
        TransitionEvent::MarkReady => &[StoreOwner],
        TransitionEvent::StartDelivering => &[StoreOwner, AssignedDriver, UnassignedDriver],
        TransitionEvent::Complete => match fulfillment {
            FulfillmentType::Pickup => &[StoreOwner],
            FulfillmentType::Delivery => &[StoreOwner, AssignedDriver],
        },
    }
}

pub fn is_permitted(event: TransitionEvent, actor: &Actor, order: &Order) -> Option<Relationship> {
    let relationship = relationship_of(actor, order);
    capability_set(event, order.fulfillment)
        .contains(&relationship)
        .then_some(relationship)
}
