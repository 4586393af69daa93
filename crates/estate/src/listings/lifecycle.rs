//! Guarded sale lifecycle transitions.
//!
//! Only the sold/canceled exits are enforced here. Moving a property into
//! `offer_received` or `offer_accepted` belongs to the offer handling flow.

use serde::Serialize;

use super::domain::{PropertyId, PropertyState};

/// Refusals caused by the current state of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("a canceled property cannot be sold")]
    CanceledCannotBeSold,
    #[error("a sold property cannot be canceled")]
    SoldCannotBeCanceled,
}

/// Externally invocable property actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    MarkSold,
    MarkCanceled,
}

impl LifecycleAction {
    pub const fn label(self) -> &'static str {
        match self {
            LifecycleAction::MarkSold => "mark_sold",
            LifecycleAction::MarkCanceled => "mark_canceled",
        }
    }

    /// State the property moves to when `self` is applied from `current`.
    pub fn apply(self, current: PropertyState) -> Result<PropertyState, LifecycleError> {
        match self {
            LifecycleAction::MarkSold => mark_sold(current),
            LifecycleAction::MarkCanceled => mark_canceled(current),
        }
    }
}

pub fn mark_sold(current: PropertyState) -> Result<PropertyState, LifecycleError> {
    if current == PropertyState::Canceled {
        return Err(LifecycleError::CanceledCannotBeSold);
    }
    Ok(PropertyState::Sold)
}

pub fn mark_canceled(current: PropertyState) -> Result<PropertyState, LifecycleError> {
    if current == PropertyState::Sold {
        return Err(LifecycleError::SoldCannotBeCanceled);
    }
    Ok(PropertyState::Canceled)
}

/// Per-record result of a batch action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub property_id: PropertyId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionOutcome {
    pub fn succeeded(property_id: PropertyId, state: PropertyState) -> Self {
        Self {
            property_id,
            success: true,
            state: Some(state.label()),
            reason: None,
        }
    }

    pub fn failed(property_id: PropertyId, reason: impl ToString) -> Self {
        Self {
            property_id,
            success: false,
            state: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Outcomes of one action applied across several properties, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub action: LifecycleAction,
    pub outcomes: Vec<ActionOutcome>,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }
}
