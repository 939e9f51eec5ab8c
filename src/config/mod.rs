//! Workspace configuration for the `sd` CLI.
//!
//! A YAML file (`softdel.yaml` by default) names the database and describes
//! each table the CLI may touch:
//!
//! ```yaml
//! database: app.db
//! filter_collision: override
//! tables:
//!   RelatedObjects:
//!     soft_delete: {}
//!     relations:
//!       testObjects:
//!         kind: many_to_many
//!         table: TestObjects
//!         from: id
//!         through: { table: JoinTable, from: relatedObjectId, to: testObjectId }
//!         to: id
//!   TestObjects:
//!     soft_delete:
//!       column_name: inactive
//!     filters:
//!       named: { name: a }
//! ```
//!
//! Each entry under `filters` is an equality filter, usable as
//! `sd list --filter named` or `relation(named)` in an eager-load
//! expression. `deleted` and `notDeleted` collide with the soft-delete
//! filters and are resolved by `filter_collision`.
//!
//! The database path can be overridden with `--db` or `SOFTDEL_DB`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use softdel_core::{CollisionPolicy, LifecycleHooks, SoftDeleteConfig, Value};
use tracing::{debug, warn};

use crate::error::{Result, SoftdelError};
use crate::model::Model;
use crate::storage::{FilterRegistry, NamedFilter, Relation, RelationKind, Through};
use crate::validation::ConfigValidator;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "softdel.yaml";

fn default_id_column() -> String {
    "id".to_string()
}

/// Top-level workspace configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Database file, relative to the config file.
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub filter_collision: CollisionPolicy,
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
}

/// One table the CLI knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default)]
    pub soft_delete: Option<SoftDeleteConfig>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationConfig>,
    /// Named equality filters: filter name to `column: value` pairs.
    #[serde(default)]
    pub filters: BTreeMap<String, BTreeMap<String, Value>>,
    /// Overrides the workspace-wide policy for this table.
    #[serde(default)]
    pub filter_collision: Option<CollisionPolicy>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            soft_delete: None,
            relations: BTreeMap::new(),
            filters: BTreeMap::new(),
            filter_collision: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKindConfig {
    HasMany,
    BelongsTo,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationConfig {
    pub kind: RelationKindConfig,
    /// Related table; must itself be configured.
    pub table: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub through: Option<ThroughConfig>,
    /// Named filter of the related table applied on every load.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThroughConfig {
    pub table: String,
    pub from: String,
    pub to: String,
}

impl WorkspaceConfig {
    /// Parse and validate YAML.
    ///
    /// # Errors
    ///
    /// Returns `Yaml` for malformed input (including invalid soft-delete
    /// sentinels) and `Validation` listing every structural problem.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file does not exist, otherwise as
    /// [`WorkspaceConfig::from_yaml`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SoftdelError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        debug!(path = %path.display(), tables = config.tables.len(), "loaded workspace config");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `Validation` with all problems found.
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate(self).map_err(|errors| SoftdelError::Validation { errors })
    }

    /// Database path: the override if given, else `database` resolved
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Config` when neither is set.
    pub fn database_path(&self, db_override: Option<&Path>, base_dir: &Path) -> Result<PathBuf> {
        if let Some(path) = db_override {
            return Ok(path.to_path_buf());
        }
        let database = self.database.as_ref().ok_or_else(|| {
            SoftdelError::config("no database configured (set `database`, --db or SOFTDEL_DB)")
        })?;
        if database.is_absolute() {
            Ok(database.clone())
        } else {
            Ok(base_dir.join(database))
        }
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    /// Collision policy in force for `table`.
    #[must_use]
    pub fn collision_policy(&self, table: &TableConfig) -> CollisionPolicy {
        table.filter_collision.unwrap_or(self.filter_collision)
    }
}

/// A validated workspace handing out models for its tables.
#[derive(Debug, Clone)]
pub struct Workspace {
    config: Rc<WorkspaceConfig>,
}

impl Workspace {
    #[must_use]
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// The model for a configured table.
    ///
    /// # Errors
    ///
    /// Returns `TableNotConfigured` for an unknown table.
    pub fn model(&self, table: &str) -> Result<ConfiguredModel> {
        let definition = self
            .config
            .table(table)
            .ok_or_else(|| SoftdelError::TableNotConfigured {
                table: table.to_string(),
            })?;
        Ok(ConfiguredModel {
            workspace: self.clone(),
            table: table.to_string(),
            definition: definition.clone(),
        })
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.config.tables.keys().map(String::as_str)
    }
}

/// A [`Model`] described by the workspace configuration. Relations are
/// resolved on demand, so configured tables may refer to each other.
#[derive(Debug, Clone)]
pub struct ConfiguredModel {
    workspace: Workspace,
    table: String,
    definition: TableConfig,
}

impl ConfiguredModel {
    fn build_relation(&self, name: &str, config: &RelationConfig) -> Result<Relation> {
        let related = Rc::new(self.workspace.model(&config.table)?);
        let kind = match (config.kind, &config.through) {
            (RelationKindConfig::HasMany, _) => RelationKind::HasMany {
                from: config.from.clone(),
                to: config.to.clone(),
            },
            (RelationKindConfig::BelongsTo, _) => RelationKind::BelongsTo {
                from: config.from.clone(),
                to: config.to.clone(),
            },
            (RelationKindConfig::ManyToMany, Some(through)) => RelationKind::ManyToMany {
                from: config.from.clone(),
                through: Through::new(&through.table, &through.from, &through.to),
                to: config.to.clone(),
            },
            (RelationKindConfig::ManyToMany, None) => {
                return Err(SoftdelError::config(format!(
                    "relation '{name}' on '{}' needs `through`",
                    self.table
                )));
            }
        };
        let relation = Relation::new(name, kind, related);
        Ok(match &config.filter {
            Some(filter) => {
                let filter = filter.clone();
                relation.with_filter(NamedFilter::new(move |query| query.modify(&filter)))
            }
            None => relation,
        })
    }
}

impl LifecycleHooks for ConfiguredModel {}

impl Model for ConfiguredModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn id_column(&self) -> &str {
        &self.definition.id_column
    }

    fn soft_delete(&self) -> Option<&SoftDeleteConfig> {
        self.definition.soft_delete.as_ref()
    }

    fn relations(&self) -> Vec<Relation> {
        self.definition
            .relations
            .iter()
            .filter_map(|(name, config)| match self.build_relation(name, config) {
                Ok(relation) => Some(relation),
                Err(err) => {
                    warn!(table = %self.table, relation = %name, error = %err, "skipping relation");
                    None
                }
            })
            .collect()
    }

    fn named_filters(&self) -> FilterRegistry {
        self.definition
            .filters
            .iter()
            .fold(FilterRegistry::new(), |registry, (name, columns)| {
                let columns = columns.clone();
                registry.with(
                    name.as_str(),
                    NamedFilter::new(move |query| {
                        columns
                            .iter()
                            .fold(query, |query, (column, value)| query.where_eq(column, value.clone()))
                    }),
                )
            })
    }

    fn filter_collision(&self) -> CollisionPolicy {
        self.workspace.config.collision_policy(&self.definition)
    }
}
