//! Explicit load states for data the view may be waiting on.

use serde::{Deserialize, Serialize};

/// A lookup that distinguishes "not looked up yet" from "looked up, nothing there".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Loadable<T> {
    NotLoaded,
    Absent,
    Present(T),
}

impl<T> Loadable<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Loadable::Present(v),
            None => Loadable::Absent,
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Loadable::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, Loadable::NotLoaded)
    }
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::NotLoaded
    }
}

/// State of one list-level fetch (head-to-head, form, maps, history).
///
/// `Ready` with an empty payload is a valid "no matches" state; `Failed` is
/// the retryable error state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FetchSlot<T> {
    Idle,
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> FetchSlot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchSlot::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchSlot::Failed(_))
    }

    /// True when a fetch should be issued for this slot.
    pub fn needs_fetch(&self) -> bool {
        matches!(self, FetchSlot::Idle | FetchSlot::Failed(_))
    }
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        FetchSlot::Idle
    }
}
