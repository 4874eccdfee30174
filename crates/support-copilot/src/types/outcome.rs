//! Best-effort results that distinguish success from a degraded default

use serde::Serialize;

/// Result of a best-effort stage.
///
/// `Degraded` carries the reason the stage fell back; callers that only
/// want a value use [`Outcome::value_or_default`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Outcome<T> {
    Ok(T),
    Degraded(String),
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(_))
    }

    /// Reason for degradation, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded(reason) => Some(reason),
        }
    }

    pub fn value_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Outcome::Ok(value) => value,
            Outcome::Degraded(_) => T::default(),
        }
    }
}
