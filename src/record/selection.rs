//! Selections (`where` clauses) and assignments (`set` clauses)

use super::field::{Field, FieldValue};
use super::types::{Record, RecordDraft};

/// How conditions in a selection are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// A set of equality conditions. An empty selection matches every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    conditions: Vec<FieldValue>,
    combinator: Combinator,
}

impl Selection {
    /// Match every record
    pub fn all() -> Self {
        Self {
            conditions: Vec::new(),
            combinator: Combinator::And,
        }
    }

    /// Match on a single condition
    pub fn by(condition: FieldValue) -> Self {
        Self {
            conditions: vec![condition],
            combinator: Combinator::And,
        }
    }

    /// Match records satisfying every condition
    pub fn all_of(conditions: Vec<FieldValue>) -> Self {
        Self {
            conditions,
            combinator: Combinator::And,
        }
    }

    /// Match records satisfying at least one condition
    pub fn any_of(conditions: Vec<FieldValue>) -> Self {
        Self {
            conditions,
            combinator: Combinator::Or,
        }
    }

    pub fn conditions(&self) -> &[FieldValue] {
        &self.conditions
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// The condition, when there is exactly one
    pub fn single(&self) -> Option<&FieldValue> {
        match self.conditions.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.combinator {
            Combinator::And => self.conditions.iter().all(|c| c.matches(record)),
            Combinator::Or => self.conditions.iter().any(|c| c.matches(record)),
        }
    }
}

/// A `field = value` assignment. Never targets `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    value: FieldValue,
}

impl Assignment {
    /// Create an assignment; fails for the `id` field.
    pub fn new(value: FieldValue) -> Result<Self, String> {
        if value.field() == Field::Id {
            return Err("id cannot be assigned".to_string());
        }
        Ok(Self { value })
    }

    pub fn field(&self) -> Field {
        self.value.field()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Apply to a draft
    pub fn apply(&self, draft: &mut RecordDraft) {
        self.value.write_to(draft);
    }
}
