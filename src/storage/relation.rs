//! Relations and eager loading.
//!
//! Each requested relation is loaded with one query for all owner rows,
//! ordered by the related model's id column. The owner's key travels in an
//! extra `__owner_key` column so related rows can be matched back without
//! knowing the relation kind.

use std::fmt;
use std::rc::Rc;

use softdel_core::{ColumnRef, Condition, RelationExpr, Value};
use tracing::debug;

use super::Database;
use super::filters::NamedFilter;
use super::query::{Order, QueryBuilder};
use super::sql::{Join, OWNER_KEY};
use crate::error::{Result, SoftdelError};
use crate::model::{Model, Related, Row};

/// Join table of a many-to-many relation.
///
/// `from` references the owner's key column, `to` the related model's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    pub table: String,
    pub from: String,
    pub to: String,
}

impl Through {
    #[must_use]
    pub fn new(table: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// How owner rows reach related rows. `from` is always an owner column and
/// `to` a related column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    HasMany {
        from: String,
        to: String,
    },
    BelongsTo {
        from: String,
        to: String,
    },
    ManyToMany {
        from: String,
        through: Through,
        to: String,
    },
}

impl RelationKind {
    #[must_use]
    pub fn owner_column(&self) -> &str {
        match self {
            Self::HasMany { from, .. }
            | Self::BelongsTo { from, .. }
            | Self::ManyToMany { from, .. } => from,
        }
    }
}

/// A named relation from one model to another.
#[derive(Clone)]
pub struct Relation {
    name: String,
    kind: RelationKind,
    related: Rc<dyn Model>,
    filter: Option<NamedFilter>,
}

impl Relation {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RelationKind, related: Rc<dyn Model>) -> Self {
        Self {
            name: name.into(),
            kind,
            related,
            filter: None,
        }
    }

    /// Related rows whose `to` column equals the owner's `from` column.
    #[must_use]
    pub fn has_many(
        name: impl Into<String>,
        related: impl Model + 'static,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        let kind = RelationKind::HasMany {
            from: from.into(),
            to: to.into(),
        };
        Self::new(name, kind, Rc::new(related))
    }

    /// At most one related row, found through the owner's `from` column.
    #[must_use]
    pub fn belongs_to(
        name: impl Into<String>,
        related: impl Model + 'static,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        let kind = RelationKind::BelongsTo {
            from: from.into(),
            to: to.into(),
        };
        Self::new(name, kind, Rc::new(related))
    }

    #[must_use]
    pub fn many_to_many(
        name: impl Into<String>,
        related: impl Model + 'static,
        from: impl Into<String>,
        through: Through,
        to: impl Into<String>,
    ) -> Self {
        let kind = RelationKind::ManyToMany {
            from: from.into(),
            through,
            to: to.into(),
        };
        Self::new(name, kind, Rc::new(related))
    }

    /// Apply `filter` to every load of this relation.
    #[must_use]
    pub fn with_filter(mut self, filter: NamedFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &RelationKind {
        &self.kind
    }

    #[must_use]
    pub fn related(&self) -> &dyn Model {
        &*self.related
    }

    /// The query fetching related rows for the given owner keys, each row
    /// tagged with its owner key.
    fn related_query<'a>(&'a self, db: &'a Database, keys: Vec<Value>) -> QueryBuilder<'a> {
        let related = self.related();
        let table = related.table_name();
        let query = match &self.kind {
            RelationKind::HasMany { to, .. } | RelationKind::BelongsTo { to, .. } => {
                let key = ColumnRef::qualified(table, to);
                db.query(related)
                    .select_owner_key(key.clone())
                    .where_condition(Condition::is_in(key, keys))
            }
            RelationKind::ManyToMany { through, to, .. } => {
                let key = ColumnRef::qualified(&through.table, &through.from);
                db.query(related)
                    .join(Join {
                        table: through.table.clone(),
                        left: ColumnRef::qualified(&through.table, &through.to),
                        right: ColumnRef::qualified(table, to),
                    })
                    .select_owner_key(key.clone())
                    .where_condition(Condition::is_in(key, keys))
            }
        };
        let query =
            query.order_by_column(ColumnRef::qualified(table, related.id_column()), Order::Asc);
        match &self.filter {
            Some(filter) => filter.apply(query),
            None => query,
        }
    }

    fn load(&self, db: &Database, rows: &mut [Row], expr: &RelationExpr) -> Result<()> {
        let owner_column = self.kind.owner_column();
        let mut keys: Vec<Value> = Vec::new();
        for row in rows.iter() {
            if let Some(key) = row.get(owner_column) {
                if !key.is_null() && !keys.iter().any(|seen| seen.sql_is(key)) {
                    keys.push(key.clone());
                }
            }
        }

        let tagged: Vec<(Value, Row)> = if keys.is_empty() {
            Vec::new()
        } else {
            let mut query = self.related_query(db, keys);
            for filter in &expr.filters {
                query = query.modify(filter);
            }
            query
                .with_children(expr.children.clone())
                .fetch_all()?
                .into_iter()
                .map(|mut row| (row.take(OWNER_KEY).unwrap_or_default(), row))
                .collect()
        };
        debug!(
            relation = %self.name,
            related = tagged.len(),
            "loaded relation"
        );

        for row in rows.iter_mut() {
            let matched: Vec<Row> = match row.get(owner_column) {
                Some(key) if !key.is_null() => tagged
                    .iter()
                    .filter(|(owner, _)| owner.sql_is(key))
                    .map(|(_, related)| related.clone())
                    .collect(),
                _ => Vec::new(),
            };
            let related = match self.kind {
                RelationKind::BelongsTo { .. } => {
                    Related::One(matched.into_iter().next().map(Box::new))
                }
                RelationKind::HasMany { .. } | RelationKind::ManyToMany { .. } => {
                    Related::Many(matched)
                }
            };
            row.set_related(self.name.clone(), related);
        }
        Ok(())
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("related", &self.related.table_name())
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Attach the relations named by `exprs` to `rows`.
pub(crate) fn load_related(
    db: &Database,
    model: &dyn Model,
    rows: &mut [Row],
    exprs: &[RelationExpr],
) -> Result<()> {
    if exprs.is_empty() {
        return Ok(());
    }
    let relations = model.relations();
    let mut plan = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let relation = relations
            .iter()
            .find(|relation| relation.name == expr.name)
            .ok_or_else(|| SoftdelError::UnknownRelation {
                table: model.table_name().to_string(),
                relation: expr.name.clone(),
            })?;
        plan.push((relation, expr));
    }
    if rows.is_empty() {
        return Ok(());
    }
    for (relation, expr) in plan {
        relation.load(db, rows, expr)?;
    }
    Ok(())
}
