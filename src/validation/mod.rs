//! Validation helpers for `softdel`.
//!
//! These routines check a workspace configuration for structural problems
//! and return every error found, without touching the database. Whether the
//! configured columns actually exist is `sd doctor`'s job.

use softdel_core::ident::is_valid_identifier;
use softdel_core::{CollisionPolicy, DELETED_FILTER, NOT_DELETED_FILTER};

use crate::config::{RelationConfig, RelationKindConfig, TableConfig, WorkspaceConfig};
use crate::error::ValidationError;

/// Validates a workspace configuration.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the whole workspace and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate(config: &WorkspaceConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, table) in &config.tables {
            let field = format!("tables.{name}");
            if !is_valid_identifier(name) {
                errors.push(ValidationError::new(&field, "invalid table name"));
            }
            validate_table(config, &field, table, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_ident(errors: &mut Vec<ValidationError>, field: String, value: &str) {
    if !is_valid_identifier(value) {
        errors.push(ValidationError::new(
            field,
            format!("'{value}' is not a valid identifier"),
        ));
    }
}

fn validate_table(
    config: &WorkspaceConfig,
    field: &str,
    table: &TableConfig,
    errors: &mut Vec<ValidationError>,
) {
    check_ident(errors, format!("{field}.id_column"), &table.id_column);
    validate_filters(config, field, table, errors);

    // Soft-delete sentinels are validated while deserializing.
    for (name, relation) in &table.relations {
        validate_relation(config, &format!("{field}.relations.{name}"), name, relation, errors);
    }
}

fn is_soft_delete_filter(name: &str) -> bool {
    name == DELETED_FILTER || name == NOT_DELETED_FILTER
}

fn validate_filters(
    config: &WorkspaceConfig,
    field: &str,
    table: &TableConfig,
    errors: &mut Vec<ValidationError>,
) {
    let reject = table.soft_delete.is_some()
        && config.collision_policy(table) == CollisionPolicy::Reject;
    for (name, columns) in &table.filters {
        let field = format!("{field}.filters.{name}");
        if !is_valid_identifier(name) {
            errors.push(ValidationError::new(&field, "invalid filter name"));
        }
        if reject && is_soft_delete_filter(name) {
            errors.push(ValidationError::new(
                &field,
                format!("'{name}' collides with the soft-delete filter (filter_collision: reject)"),
            ));
        }
        if columns.is_empty() {
            errors.push(ValidationError::new(&field, "needs at least one column"));
        }
        for column in columns.keys() {
            check_ident(errors, format!("{field}.{column}"), column);
        }
    }
}

fn validate_relation(
    config: &WorkspaceConfig,
    field: &str,
    name: &str,
    relation: &RelationConfig,
    errors: &mut Vec<ValidationError>,
) {
    if !is_valid_identifier(name) {
        errors.push(ValidationError::new(field, "invalid relation name"));
    }
    check_ident(errors, format!("{field}.from"), &relation.from);
    check_ident(errors, format!("{field}.to"), &relation.to);

    let target = config.table(&relation.table);
    if target.is_none() {
        errors.push(ValidationError::new(
            format!("{field}.table"),
            format!("table '{}' is not configured", relation.table),
        ));
    }

    match (relation.kind, &relation.through) {
        (RelationKindConfig::ManyToMany, None) => {
            errors.push(ValidationError::new(
                format!("{field}.through"),
                "required for many_to_many",
            ));
        }
        (RelationKindConfig::ManyToMany, Some(through)) => {
            check_ident(errors, format!("{field}.through.table"), &through.table);
            check_ident(errors, format!("{field}.through.from"), &through.from);
            check_ident(errors, format!("{field}.through.to"), &through.to);
        }
        (RelationKindConfig::HasMany | RelationKindConfig::BelongsTo, Some(_)) => {
            errors.push(ValidationError::new(
                format!("{field}.through"),
                "only allowed for many_to_many",
            ));
        }
        (RelationKindConfig::HasMany | RelationKindConfig::BelongsTo, None) => {}
    }

    if let Some(filter) = &relation.filter {
        let soft = target.is_some_and(|table| table.soft_delete.is_some());
        let declared = target.is_some_and(|table| table.filters.contains_key(filter));
        let known = declared || is_soft_delete_filter(filter);
        if !known {
            errors.push(ValidationError::new(
                format!("{field}.filter"),
                format!("unknown filter '{filter}'"),
            ));
        }
        if !declared && known && target.is_some() && !soft {
            errors.push(ValidationError::new(
                format!("{field}.filter"),
                format!("'{filter}' needs soft_delete on '{}'", relation.table),
            ));
        }
    }
}
