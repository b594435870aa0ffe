//! Query-string access for list endpoints.
//!
//! List parameters may be repeated (`ids=1&ids=2`) or comma-separated
//! (`ids=1,2`), so the query string is kept as raw pairs and parsed per key
//! instead of through a derived struct.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use chrono::NaiveDateTime;

use crate::domain::{Page, time};
use crate::error::ServiceError;

/// Raw query pairs in request order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(Self(pairs))
    }
}

impl QueryParams {
    /// Builds params from literal pairs.
    #[must_use]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Every non-empty value of `key`, comma-separated lists flattened.
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// The first value of `key`, untouched.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parses the first non-blank value of `key`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the value does not parse.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ServiceError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.string(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|raw| parse_value(key, raw))
            .transpose()
    }

    /// Parses every value of `key`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if any value does not parse.
    pub fn list<T>(&self, key: &str) -> Result<Vec<T>, ServiceError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.values(key).map(|raw| parse_value(key, raw)).collect()
    }

    /// Id list of `key`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if an id is not an integer.
    pub fn ids(&self, key: &str) -> Result<Vec<i64>, ServiceError> {
        self.list(key)
    }

    /// Boolean flag of `key`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] unless the value is `true` or `false`.
    pub fn bool(&self, key: &str) -> Result<Option<bool>, ServiceError> {
        self.parse(key)
    }

    /// Timestamp of `key` in `yyyy-MM-dd HH:mm:ss`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] on a malformed timestamp.
    pub fn timestamp(&self, key: &str) -> Result<Option<NaiveDateTime>, ServiceError> {
        self.string(key)
            .filter(|v| !v.trim().is_empty())
            .map(time::parse)
            .transpose()
    }

    /// Like [`QueryParams::timestamp`] but the key must be present.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] if the key is missing or malformed.
    pub fn required_timestamp(&self, key: &str) -> Result<NaiveDateTime, ServiceError> {
        self.timestamp(key)?.ok_or_else(|| {
            ServiceError::BadRequest(format!("required parameter '{key}' is not present"))
        })
    }

    /// `from`/`size` paging, defaulting to the first ten rows.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadRequest`] on non-numeric or out-of-range values.
    pub fn page(&self) -> Result<Page, ServiceError> {
        let from = self.parse("from")?.unwrap_or(0);
        let size = self.parse("size")?.unwrap_or(Page::DEFAULT_SIZE);
        Page::new(from, size)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| ServiceError::BadRequest(format!("invalid value '{raw}' for '{key}': {e}")))
}
