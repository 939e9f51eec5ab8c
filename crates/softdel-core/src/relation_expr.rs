//! Eager-load expressions.
//!
//! ```text
//! testObjects
//! testObjects(notDeleted)
//! [owner, testObjects(notDeleted, recent)]
//! testObjects.related(deleted)
//! testObjects.[related, owner]
//! ```
//!
//! Filters in parentheses are names looked up in the related model's
//! named-filter registry.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SoftDeleteError};

/// Deepest relation path accepted, e.g. `a.b.c` is three levels.
pub const MAX_DEPTH: usize = 16;

static TOKEN_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("valid identifier regex"));

/// One relation to load, with its filters and nested relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationExpr {
    pub name: String,
    pub filters: Vec<String>,
    pub children: Vec<RelationExpr>,
}

impl RelationExpr {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse an eager-load expression into its top-level relations.
    ///
    /// Repeated relation names are merged, so `[a.b, a(f).c]` yields one
    /// `a` with filter `f` and children `b` and `c`.
    ///
    /// # Errors
    ///
    /// Returns `RelationExpr` when the expression is empty, malformed or
    /// nested deeper than [`MAX_DEPTH`].
    pub fn parse(input: &str) -> Result<Vec<Self>> {
        let mut parser = Parser {
            input,
            pos: 0,
            depth: 0,
        };
        parser.skip_ws();
        let items = if parser.eat('[') {
            let items = parser.items()?;
            parser.expect(']')?;
            items
        } else {
            parser.items()?
        };
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(merge(items))
    }
}

fn merge(items: Vec<RelationExpr>) -> Vec<RelationExpr> {
    let mut merged: Vec<RelationExpr> = Vec::new();
    for item in items {
        if let Some(existing) = merged.iter_mut().find(|e| e.name == item.name) {
            for filter in item.filters {
                if !existing.filters.contains(&filter) {
                    existing.filters.push(filter);
                }
            }
            let children = std::mem::take(&mut existing.children);
            existing.children = merge(children.into_iter().chain(item.children).collect());
        } else {
            let children = merge(item.children);
            merged.push(RelationExpr { children, ..item });
        }
    }
    merged
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn error(&self, reason: &str) -> SoftDeleteError {
        SoftDeleteError::relation_expr(self.input, format!("{reason} at offset {}", self.pos))
    }

    fn ident(&mut self) -> Result<String> {
        self.skip_ws();
        let found = TOKEN_IDENT.find(self.rest()).map(|m| m.as_str().to_string());
        match found {
            Some(ident) => {
                self.pos += ident.len();
                Ok(ident)
            }
            None => Err(self.error("expected identifier")),
        }
    }

    fn items(&mut self) -> Result<Vec<RelationExpr>> {
        let mut items = vec![self.item()?];
        while self.eat(',') {
            items.push(self.item()?);
        }
        Ok(items)
    }

    fn item(&mut self) -> Result<RelationExpr> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(&format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let expr = self.relation();
        self.depth -= 1;
        expr
    }

    fn relation(&mut self) -> Result<RelationExpr> {
        let mut expr = RelationExpr::new(self.ident()?);
        if self.eat('(') {
            expr.filters.push(self.ident()?);
            while self.eat(',') {
                expr.filters.push(self.ident()?);
            }
            self.expect(')')?;
        }
        if self.eat('.') {
            if self.eat('[') {
                expr.children = self.items()?;
                self.expect(']')?;
            } else {
                expr.children = vec![self.item()?];
            }
        }
        Ok(expr)
    }
}
