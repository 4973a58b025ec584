//! Relation graph store — composing objects and widgets into a graph.
//!
//! Relations are directed edges in a shared id namespace covering both
//! objects and widgets. The graph may contain cycles and self-loops; walks
//! track visited nodes so propagation always terminates. Reads operate on a
//! snapshot taken at call time, so a concurrent `remove_relation` never
//! breaks a walk in progress.

use std::collections::HashSet;

use serde_json::Value;

use domo_domain::error::{DomoError, NotFoundError, ProtectedError, ValidationError};
use domo_domain::id::{NodeId, ObjectId, RelationId, WidgetId};
use domo_domain::relation::{NewRelation, Relation, RelationFilter};

use crate::ports::{ObjectRepository, RelationRepository, WidgetRepository};

/// Outcome report of a [`RelationGraph::propagate`] walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    /// Children visited, in visit order.
    pub visited: Vec<NodeId>,
    /// Number of levels fully expanded.
    pub depth: usize,
    /// Whether eligible edges remained beyond the depth limit.
    pub depth_exceeded: bool,
}

/// Application service for the object/widget relation graph.
pub struct RelationGraph<RR, OR, WR> {
    relations: RR,
    objects: OR,
    widgets: WR,
}

impl<RR, OR, WR> RelationGraph<RR, OR, WR>
where
    RR: RelationRepository,
    OR: ObjectRepository,
    WR: WidgetRepository,
{
    /// Create a new graph service backed by the given repositories.
    pub fn new(relations: RR, objects: OR, widgets: WR) -> Self {
        Self {
            relations,
            objects,
            widgets,
        }
    }

    /// Add a directed relation after checking both endpoints exist.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when an endpoint id is unknown to
    /// both the object and the widget tables, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self, relation), fields(parent = %relation.parent_id, child = %relation.child_id))]
    pub async fn add_relation(&self, relation: NewRelation) -> Result<Relation, DomoError> {
        relation.validate()?;
        self.ensure_node_exists(relation.parent_id).await?;
        self.ensure_node_exists(relation.child_id).await?;
        self.relations.create(relation).await
    }

    /// List the relations leaving `parent`, ordered by `order_num`
    /// ascending. `event`, if given, restricts to edges tagged with that
    /// event name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn children(
        &self,
        parent: NodeId,
        event: Option<&str>,
    ) -> Result<Vec<Relation>, DomoError> {
        self.relations
            .find(RelationFilter {
                parent_id: Some(parent),
                event: event.map(ToOwned::to_owned),
                ..RelationFilter::default()
            })
            .await
    }

    /// Remove a relation by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when the id is absent and
    /// [`DomoError::Protected`] when the relation is protected and
    /// `override_protection` is not set.
    #[tracing::instrument(skip(self))]
    pub async fn remove_relation(
        &self,
        id: RelationId,
        override_protection: bool,
    ) -> Result<(), DomoError> {
        let relation = self
            .relations
            .get_by_id(id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Relation",
                id: id.to_string(),
            })?;
        if relation.protected && !override_protection {
            return Err(ProtectedError {
                entity: "Relation",
                id: id.to_string(),
            }
            .into());
        }
        self.relations.delete(id).await
    }

    /// Walk the graph breadth-first from `start`, following enabled edges
    /// tagged with `event`, and invoke `visit` once per reached child.
    ///
    /// Each node is visited at most once per call, so the walk terminates
    /// on cyclic graphs. Siblings are expanded in `order_num` order. The
    /// walk stops after `max_depth` levels; when eligible edges remain past
    /// the limit the report carries `depth_exceeded` and a warning is
    /// logged, but the call still succeeds.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, payload, visit), fields(start = %start, event))]
    pub async fn propagate<V>(
        &self,
        start: NodeId,
        event: &str,
        payload: &Value,
        max_depth: usize,
        mut visit: V,
    ) -> Result<Propagation, DomoError>
    where
        V: FnMut(NodeId, &Relation, &Value),
    {
        // One read up front: the walk operates on this snapshot even if
        // relations are mutated concurrently.
        let snapshot = self
            .relations
            .find(RelationFilter {
                event: Some(event.to_owned()),
                enabled: Some(true),
                ..RelationFilter::default()
            })
            .await?;

        let mut report = Propagation {
            visited: Vec::new(),
            depth: 0,
            depth_exceeded: false,
        };
        let mut seen = HashSet::from([start]);
        let mut frontier = HashSet::from([start]);

        loop {
            let mut pending: Vec<&Relation> = snapshot
                .iter()
                .filter(|r| frontier.contains(&r.parent_id) && !seen.contains(&r.child_id))
                .collect();
            if pending.is_empty() {
                break;
            }
            if report.depth >= max_depth {
                report.depth_exceeded = true;
                tracing::warn!(
                    start = %start,
                    event,
                    max_depth,
                    "propagation stopped at depth limit"
                );
                break;
            }
            pending.sort_by_key(|r| (r.order_num, r.id.as_i64()));

            let mut next = HashSet::new();
            for relation in pending {
                // Two same-level edges may share a child; visit it once.
                if seen.insert(relation.child_id) {
                    visit(relation.child_id, relation, payload);
                    report.visited.push(relation.child_id);
                    next.insert(relation.child_id);
                }
            }
            frontier = next;
            report.depth += 1;
        }
        Ok(report)
    }

    async fn ensure_node_exists(&self, node: NodeId) -> Result<(), DomoError> {
        if self
            .objects
            .get_by_id(ObjectId::new(node.as_i64()))
            .await?
            .is_some()
        {
            return Ok(());
        }
        if self
            .widgets
            .get_by_id(WidgetId::new(node.as_i64()))
            .await?
            .is_some()
        {
            return Ok(());
        }
        Err(ValidationError::UnknownNode(node).into())
    }
}
