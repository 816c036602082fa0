//! Field reconciliation shared by every entity merge.
//!
//! [`reconcile`] folds two optional values for the same field into one:
//! an absent side yields the other side, two present scalars must be
//! equal, and two present lists are unioned in first-seen order.

use crate::error::{CoreError, CoreResult};
use std::fmt::Debug;

/// A field value that can be combined with another present value.
pub trait Reconcile: Clone + Debug {
    /// Combines two present values, or returns `None` if they disagree.
    fn combine(&self, other: &Self) -> Option<Self>;
}

macro_rules! reconcile_by_equality {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Reconcile for $ty {
                fn combine(&self, other: &Self) -> Option<Self> {
                    (self == other).then(|| self.clone())
                }
            }
        )+
    };
}

reconcile_by_equality!(bool, u64, String);

impl<T: PartialEq + Clone + Debug> Reconcile for Vec<T> {
    fn combine(&self, other: &Self) -> Option<Self> {
        Some(union(self, other))
    }
}

/// Reconciles two optional values of `field`.
///
/// # Errors
///
/// Returns [`CoreError::Conflict`] if both values are present and cannot be
/// combined.
pub fn reconcile<T: Reconcile>(
    field: &str,
    current: Option<&T>,
    incoming: Option<&T>,
) -> CoreResult<Option<T>> {
    match (current, incoming) {
        (None, None) => Ok(None),
        (Some(value), None) | (None, Some(value)) => Ok(Some(value.clone())),
        (Some(a), Some(b)) => a
            .combine(b)
            .map(Some)
            .ok_or_else(|| CoreError::conflict(field, a, b)),
    }
}

/// Set union of two lists in first-seen order.
///
/// Elements of `first` keep their positions (duplicates within `first` are
/// dropped after their first occurrence); elements of `second` not already
/// present are appended in their own order.
pub fn union<T: PartialEq + Clone>(first: &[T], second: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Reconciles the named `Option` fields of two records into a new record.
///
/// Fields listed after the braces are copied from the given expressions.
macro_rules! reconcile_fields {
    ($ty:ident, $current:expr, $incoming:expr, { $($field:ident),+ $(,)? } $(, $rest:ident: $value:expr)* $(,)?) => {
        $ty {
            $(
                $field: $crate::reconcile::reconcile(
                    stringify!($field),
                    $current.$field.as_ref(),
                    $incoming.$field.as_ref(),
                )?,
            )+
            $( $rest: $value, )*
        }
    };
}

pub(crate) use reconcile_fields;
