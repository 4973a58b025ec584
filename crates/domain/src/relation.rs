//! Relation — a directed, typed edge between two graph nodes.
//!
//! Relations connect objects and widgets into a graph. An edge can carry an
//! `event` name; propagation only follows edges whose `event` matches the
//! event being propagated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomoError, ValidationError};
use crate::id::{NodeId, RelationId};

/// A persisted relation row: `parent_id -> child_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub parent_id: NodeId,
    pub child_id: NodeId,
    /// Semantic label of the edge (`"contains"`, `"triggers"`, …).
    pub kind: String,
    /// Event name this edge reacts to; empty matches nothing.
    pub event: String,
    pub options: Value,
    /// Ordering hint among siblings of the same parent.
    pub order_num: i64,
    pub enabled: bool,
    pub visible: bool,
    pub protected: bool,
}

impl Relation {
    #[must_use]
    pub fn builder() -> RelationBuilder {
        RelationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when an endpoint id is not positive.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.parent_id.as_i64() <= 0 || self.child_id.as_i64() <= 0 {
            return Err(ValidationError::InvalidNodeId.into());
        }
        Ok(())
    }
}

/// Field payload for a relation that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRelation {
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub kind: String,
    pub event: String,
    pub options: Value,
    pub order_num: i64,
    pub enabled: bool,
    pub visible: bool,
    pub protected: bool,
}

impl NewRelation {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when an endpoint id is not positive.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.parent_id.as_i64() <= 0 || self.child_id.as_i64() <= 0 {
            return Err(ValidationError::InvalidNodeId.into());
        }
        Ok(())
    }

    /// Attach the store-assigned id, producing a persisted [`Relation`].
    #[must_use]
    pub fn into_relation(self, id: RelationId) -> Relation {
        Relation {
            id,
            parent_id: self.parent_id,
            child_id: self.child_id,
            kind: self.kind,
            event: self.event,
            options: self.options,
            order_num: self.order_num,
            enabled: self.enabled,
            visible: self.visible,
            protected: self.protected,
        }
    }
}

#[derive(Debug, Default)]
pub struct RelationBuilder {
    parent_id: Option<NodeId>,
    child_id: Option<NodeId>,
    kind: Option<String>,
    event: Option<String>,
    options: Option<Value>,
    order_num: Option<i64>,
    enabled: Option<bool>,
    visible: Option<bool>,
    protected: Option<bool>,
}

impl RelationBuilder {
    #[must_use]
    pub fn parent_id(mut self, parent_id: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn child_id(mut self, child_id: impl Into<NodeId>) -> Self {
        self.child_id = Some(child_id.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn order_num(mut self, order_num: i64) -> Self {
        self.order_num = Some(order_num);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    #[must_use]
    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = Some(protected);
        self
    }

    /// Consume the builder, apply field defaults, validate, and return a
    /// [`NewRelation`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if an endpoint is missing or not a
    /// positive id.
    pub fn build(self) -> Result<NewRelation, DomoError> {
        let relation = NewRelation {
            parent_id: self.parent_id.unwrap_or(NodeId::new(0)),
            child_id: self.child_id.unwrap_or(NodeId::new(0)),
            kind: self.kind.unwrap_or_default(),
            event: self.event.unwrap_or_default(),
            options: self.options.unwrap_or(Value::Null),
            order_num: self.order_num.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            visible: self.visible.unwrap_or(true),
            protected: self.protected.unwrap_or(false),
        };
        relation.validate()?;
        Ok(relation)
    }
}

/// Attribute filter for relation queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct RelationFilter {
    pub parent_id: Option<NodeId>,
    pub child_id: Option<NodeId>,
    pub kind: Option<String>,
    pub event: Option<String>,
    pub enabled: Option<bool>,
    pub visible: Option<bool>,
    pub protected: Option<bool>,
}

impl RelationFilter {
    /// Whether `relation` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, relation: &Relation) -> bool {
        self.parent_id.is_none_or(|v| v == relation.parent_id)
            && self.child_id.is_none_or(|v| v == relation.child_id)
            && self.kind.as_ref().is_none_or(|v| *v == relation.kind)
            && self.event.as_ref().is_none_or(|v| *v == relation.event)
            && self.enabled.is_none_or(|v| v == relation.enabled)
            && self.visible.is_none_or(|v| v == relation.visible)
            && self.protected.is_none_or(|v| v == relation.protected)
    }
}
