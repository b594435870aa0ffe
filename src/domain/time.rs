//! Wire timestamps and the service clock.
//!
//! Every timestamp crossing the HTTP boundary is a zone-less local time in
//! the `yyyy-MM-dd HH:mm:ss` format. The [`wire`] and [`wire_option`]
//! modules plug that format into serde via `#[serde(with = ...)]`.

use std::fmt;
use std::sync::RwLock;

use chrono::{Duration, Local, NaiveDateTime, SubsecRound};

use crate::error::ServiceError;

/// Wire format for every timestamp.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a timestamp in the wire format.
#[must_use]
pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(DATE_TIME_FORMAT).to_string()
}

/// Parses a wire-format timestamp.
///
/// # Errors
///
/// Returns [`ServiceError::BadRequest`] if `raw` is not `yyyy-MM-dd HH:mm:ss`.
pub fn parse(raw: &str) -> Result<NaiveDateTime, ServiceError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT).map_err(|e| {
        ServiceError::BadRequest(format!(
            "invalid date/time '{raw}', expected yyyy-MM-dd HH:mm:ss: {e}"
        ))
    })
}

/// Current local time truncated to whole seconds.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Serde adapter for a required wire timestamp.
pub mod wire {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `ts` as `yyyy-MM-dd HH:mm:ss`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(ts))
    }

    /// Deserializes a `yyyy-MM-dd HH:mm:ss` string.
    ///
    /// # Errors
    ///
    /// Fails when the string is not in the wire format.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, super::DATE_TIME_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for an optional wire timestamp (`null` ⇔ `None`).
pub mod wire_option {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `Some(ts)` in the wire format and `None` as `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        ts: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional wire-format string.
    ///
    /// # Errors
    ///
    /// Fails when a present string is not in the wire format.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                NaiveDateTime::parse_from_str(&raw, super::DATE_TIME_FORMAT)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

/// Source of "now" for every date rule.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current local time, whole seconds.
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in server-local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        local_now()
    }
}

/// A settable clock for deterministic date rules in tests and fixtures.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        let mut guard = self
            .now
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self
            .now
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self
            .now
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "wire")]
        at: NaiveDateTime,
        #[serde(default, with = "wire_option")]
        maybe: Option<NaiveDateTime>,
    }

    #[test]
    fn parse_and_format_use_wire_format() {
        let Ok(ts) = parse("2024-06-01 10:00:00") else {
            panic!("valid timestamp");
        };
        assert_eq!(format(&ts), "2024-06-01 10:00:00");
    }

    #[test]
    fn parse_rejects_iso_format() {
        let Err(err) = parse("2024-06-01T10:00:00") else {
            panic!("iso format must be rejected");
        };
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[test]
    fn serde_adapters_round_trip_null() {
        let Ok(value) = serde_json::from_str::<Stamped>(r#"{"at":"2024-06-01 10:00:00"}"#) else {
            panic!("deserialize");
        };
        assert!(value.maybe.is_none());
        let Ok(json) = serde_json::to_string(&value) else {
            panic!("serialize");
        };
        assert_eq!(json, r#"{"at":"2024-06-01 10:00:00","maybe":null}"#);
    }

    #[test]
    fn fixed_clock_advances() {
        let Ok(start) = parse("2024-06-01 10:00:00") else {
            panic!("valid timestamp");
        };
        let clock = FixedClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(format(&clock.now()), "2024-06-01 12:00:00");
    }
}
