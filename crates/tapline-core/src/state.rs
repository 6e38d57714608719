//! # Data State Envelope
//!
//! `DataState<T>` is what every use-case sequence emits and what the UI
//! renders. It carries one payload plus an independent loading overlay.
//!
//! ## Overlay Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Loading Over Last-Known-Good                         │
//! │                                                                         │
//! │  shown:  { loading: false, Data([weissbier, Punk Ipa]) }               │
//! │  next:   { loading: true,  Idle }                                      │
//! │       │                                                                 │
//! │       ▼ overlay(shown, next)                                            │
//! │  shown:  { loading: true,  Data([weissbier, Punk Ipa]) }  ← kept       │
//! │                                                                         │
//! │  next:   { loading: false, Error("Unable to download item list") }     │
//! │       │                                                                 │
//! │       ▼ overlay(shown, next)                                            │
//! │  shown:  { loading: false, Error(...) }                   ← replaced   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// The meaningful part of a [`DataState`]. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload<T> {
    /// Nothing known yet (or an error was dismissed).
    Idle,
    /// A value to render.
    Data(T),
    /// The server answered with nothing.
    Empty,
    /// A user-readable failure message.
    Error(String),
}

/// A single emission of a use-case sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataState<T> {
    /// Transient overlay; may sit on top of any payload.
    pub loading: bool,

    /// The payload carried by this emission.
    pub payload: Payload<T>,
}

impl<T> DataState<T> {
    /// The loading marker: overlay set, nothing else known.
    pub fn loading() -> Self {
        DataState {
            loading: true,
            payload: Payload::Idle,
        }
    }

    /// A settled state carrying data.
    pub fn data(value: T) -> Self {
        DataState {
            loading: false,
            payload: Payload::Data(value),
        }
    }

    /// The "server had nothing" state.
    pub fn empty() -> Self {
        DataState {
            loading: false,
            payload: Payload::Empty,
        }
    }

    /// A settled failure state.
    pub fn error(message: impl Into<String>) -> Self {
        DataState {
            loading: false,
            payload: Payload::Error(message.into()),
        }
    }

    /// A settled state with no payload.
    pub fn idle() -> Self {
        DataState {
            loading: false,
            payload: Payload::Idle,
        }
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the data, if this state carries any.
    pub fn as_data(&self) -> Option<&T> {
        match &self.payload {
            Payload::Data(value) => Some(value),
            Payload::Idle | Payload::Empty | Payload::Error(_) => None,
        }
    }

    /// Returns the error message, if this state is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match &self.payload {
            Payload::Error(message) => Some(message),
            Payload::Idle | Payload::Data(_) | Payload::Empty => None,
        }
    }

    /// Returns true for the "server had nothing" state.
    pub fn is_empty(&self) -> bool {
        matches!(self.payload, Payload::Empty)
    }
}

impl<T: Clone> DataState<T> {
    /// Returns a copy with the loading overlay changed.
    pub fn with_loading(&self, loading: bool) -> Self {
        DataState {
            loading,
            payload: self.payload.clone(),
        }
    }

    /// Dismisses an error: an `Error` payload becomes `Idle`, anything else
    /// is kept. The loading flag is untouched.
    pub fn consume_error(&self) -> Self {
        let payload = match &self.payload {
            Payload::Error(_) => Payload::Idle,
            other => other.clone(),
        };
        DataState {
            loading: self.loading,
            payload,
        }
    }

    /// Merges the next emission onto what is currently shown.
    ///
    /// A `loading` emission only raises the overlay on `previous`; any other
    /// emission replaces it.
    pub fn overlay(previous: &DataState<T>, next: DataState<T>) -> DataState<T> {
        if next.loading {
            previous.with_loading(true)
        } else {
            next
        }
    }
}

impl<T> Default for DataState<T> {
    fn default() -> Self {
        DataState::loading()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
