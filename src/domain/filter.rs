//! Composable filter predicates and offset paging.
//!
//! A [`Predicate`] is a small boolean tree over the columns of one record
//! kind. The same tree is evaluated in memory through [`Record`] and
//! translated to parameterised SQL by the Postgres store, so a filter is
//! built once and honoured identically by every backend.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::ServiceError;

/// A column of some record kind.
pub trait Field: Copy + fmt::Debug + Send + Sync + 'static {
    /// Fully qualified SQL column, e.g. `e.event_date`.
    fn column(self) -> &'static str;
}

/// Exposes field values of a record for in-memory evaluation.
pub trait Record<F: Field> {
    /// Value of `field` on this record.
    fn value(&self, field: F) -> Value;
}

/// A scalar operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer column (ids, counters).
    Int(i64),
    /// Boolean column.
    Bool(bool),
    /// Text column, including enum states stored as text.
    Text(String),
    /// Timestamp column.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Orders two values of the same kind; mixed kinds are incomparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

/// Comparison operator of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// Boolean filter tree over the fields `F`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<F: Field> {
    /// Conjunction; empty is `TRUE`.
    And(Vec<Predicate<F>>),
    /// Disjunction; empty is `FALSE`.
    Or(Vec<Predicate<F>>),
    /// `field <op> value`.
    Compare {
        /// Left operand.
        field: F,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        value: Value,
    },
    /// `field IN (values)`; empty is `FALSE`.
    In {
        /// Tested field.
        field: F,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Case-insensitive substring match.
    ContainsIgnoreCase {
        /// Text field.
        field: F,
        /// Needle, matched literally.
        text: String,
    },
    /// `left < right` between two fields of the same record.
    FieldLessThan {
        /// Left field.
        left: F,
        /// Right field.
        right: F,
    },
}

impl<F: Field> Predicate<F> {
    /// The predicate that matches everything.
    #[must_use]
    pub const fn always() -> Self {
        Self::And(Vec::new())
    }

    /// Conjunction of all supplied parts; `None` parts are skipped.
    #[must_use]
    pub fn all_of(parts: impl IntoIterator<Item = Option<Self>>) -> Self {
        let mut parts: Vec<Self> = parts.into_iter().flatten().filter(|p| !p.is_always()).collect();
        if parts.len() == 1
            && let Some(only) = parts.pop()
        {
            return only;
        }
        Self::And(parts)
    }

    /// Disjunction of two predicates.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(vec![self, other])
    }

    /// `field = value`.
    #[must_use]
    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field <op> value`.
    #[must_use]
    pub fn compare(field: F, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    /// `field IN (values)`, or `None` when `values` is empty (filter not supplied).
    #[must_use]
    pub fn in_list<V: Into<Value>>(field: F, values: impl IntoIterator<Item = V>) -> Option<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            None
        } else {
            Some(Self::In { field, values })
        }
    }

    /// Case-insensitive substring match.
    #[must_use]
    pub fn contains(field: F, text: &str) -> Self {
        Self::ContainsIgnoreCase {
            field,
            text: text.to_string(),
        }
    }

    /// Returns `true` for an empty conjunction.
    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self, Self::And(parts) if parts.is_empty())
    }

    /// Evaluates the predicate against `record`.
    #[must_use]
    pub fn matches<R: Record<F>>(&self, record: &R) -> bool {
        match self {
            Self::And(parts) => parts.iter().all(|p| p.matches(record)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Self::Compare { field, op, value } => record
                .value(*field)
                .compare(value)
                .is_some_and(|ord| op.holds(ord)),
            Self::In { field, values } => {
                let actual = record.value(*field);
                values.iter().any(|v| *v == actual)
            }
            Self::ContainsIgnoreCase { field, text } => match record.value(*field) {
                Value::Text(haystack) => haystack.to_lowercase().contains(&text.to_lowercase()),
                _ => false,
            },
            Self::FieldLessThan { left, right } => record
                .value(*left)
                .compare(&record.value(*right))
                .is_some_and(|ord| ord == Ordering::Less),
        }
    }
}

/// Builds the inclusive `[start, end]` window on `field`.
///
/// # Errors
///
/// Returns [`ServiceError::BadTime`] when both bounds are present and
/// `start > end`.
pub fn time_window<F: Field>(
    field: F,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<Option<Predicate<F>>, ServiceError> {
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(ServiceError::BadTime(format!(
            "rangeStart {} must not be after rangeEnd {}",
            super::time::format(&s),
            super::time::format(&e)
        )));
    }
    let lower = start.map(|s| Predicate::compare(field, CompareOp::Ge, s));
    let upper = end.map(|e| Predicate::compare(field, CompareOp::Le, e));
    Ok(match (lower, upper) {
        (None, None) => None,
        (lower, upper) => Some(Predicate::all_of([lower, upper])),
    })
}

// ── Paging ──

/// Offset paging as exposed by the API (`from`, `size`).
///
/// Offsets are aligned down to a multiple of `size`, so `from=5,size=10`
/// reads the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    from: i64,
    size: i64,
}

impl Page {
    /// Default `size` when the caller omits it.
    pub const DEFAULT_SIZE: i64 = 10;

    /// Validates and builds a page.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadRequest`] if `from < 0` or `size < 1`.
    pub fn new(from: i64, size: i64) -> Result<Self, ServiceError> {
        if from < 0 {
            return Err(ServiceError::BadRequest(format!(
                "from must be non-negative, got {from}"
            )));
        }
        if size < 1 {
            return Err(ServiceError::BadRequest(format!(
                "size must be positive, got {size}"
            )));
        }
        Ok(Self { from, size })
    }

    /// A page covering every row.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            from: 0,
            size: i64::MAX,
        }
    }

    /// Row offset, aligned to a multiple of `size`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.from / self.size) * self.size
    }

    /// Maximum number of rows.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.size
    }

    /// Applies the page to an already ordered sequence.
    #[must_use]
    pub fn apply<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        rows.into_iter().skip(skip).take(take).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            from: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}
