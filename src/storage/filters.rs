//! Named filters over [`QueryBuilder`].
//!
//! A soft-deleting model exposes `deleted` and `notDeleted` on top of
//! whatever filters it declares itself, so eager-load expressions such as
//! `items(notDeleted)` work without knowing the configured column.

use std::fmt;
use std::sync::Arc;

use softdel_core::{DELETED_FILTER, NOT_DELETED_FILTER, NamedFilters};

use super::query::QueryBuilder;
use crate::error::Result;
use crate::model::Model;

type FilterFn = dyn for<'a> Fn(QueryBuilder<'a>) -> QueryBuilder<'a> + Send + Sync;

/// A reusable query modifier.
#[derive(Clone)]
pub struct NamedFilter(Arc<FilterFn>);

impl NamedFilter {
    #[must_use]
    pub fn new<F>(filter: F) -> Self
    where
        F: for<'a> Fn(QueryBuilder<'a>) -> QueryBuilder<'a> + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    #[must_use]
    pub fn apply<'a>(&self, query: QueryBuilder<'a>) -> QueryBuilder<'a> {
        (self.0)(query)
    }
}

impl fmt::Debug for NamedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NamedFilter(..)")
    }
}

pub type FilterRegistry = NamedFilters<NamedFilter>;

/// The `deleted` and `notDeleted` filters.
#[must_use]
pub fn soft_delete_filters() -> FilterRegistry {
    FilterRegistry::new()
        .with(DELETED_FILTER, NamedFilter::new(|query| query.where_deleted()))
        .with(
            NOT_DELETED_FILTER,
            NamedFilter::new(|query| query.where_not_deleted()),
        )
}

/// The filters a query over `model` can name.
///
/// # Errors
///
/// Returns `FilterCollision` when the model declares `deleted` or
/// `notDeleted` itself and asks for [`CollisionPolicy::Reject`].
///
/// [`CollisionPolicy::Reject`]: softdel_core::CollisionPolicy::Reject
pub fn effective_filters(model: &dyn Model) -> Result<FilterRegistry> {
    let own = model.named_filters();
    if model.soft_delete().is_none() {
        return Ok(own);
    }
    Ok(own.merge(soft_delete_filters(), model.filter_collision())?)
}
