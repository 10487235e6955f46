//! Hiding and showing entities

use std::collections::HashMap;

use erdscope_core::{Entity, EntityId, EntityKind};
use indexmap::IndexMap;

use super::SchemaDiagram;
use crate::node::DiagramNode;

impl SchemaDiagram {
    /// Hide or show tables.
    ///
    /// With `hide` unset each table flips its own state. A schema entity
    /// stands for all of its tables and they follow the schema: an unset
    /// `hide` flips the schema's current state. Hidden nodes are deselected
    /// and schema visibility is recomputed for the whole diagram before a
    /// single push to the canvas.
    pub fn toggle_hide_entities<'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a Entity>,
        hide: Option<bool>,
    ) {
        let mut targets: Vec<(EntityId, Option<bool>)> = Vec::new();
        for entity in entities {
            match entity {
                Entity::Table(table) => targets.push((EntityId::table(table), hide)),
                Entity::Schema(schema) => {
                    let Some(schema_node) = self.nodes.get(&EntityId::schema(&schema.name)) else {
                        tracing::debug!(schema = %schema.name, "toggled schema is not on the diagram");
                        continue;
                    };
                    let hide = hide.unwrap_or(!schema_node.hidden);
                    targets.extend(
                        self.nodes
                            .values()
                            .filter(|n| n.parent_id.as_deref() == Some(schema.name.as_str()))
                            .map(|n| (n.entity_id(), Some(hide))),
                    );
                }
            }
        }

        for (key, hide) in targets {
            match self.nodes.get_mut(&key) {
                Some(node) => set_hidden(node, hide.unwrap_or(!node.hidden)),
                None => tracing::debug!(entity = %key, "toggled entity is not on the diagram"),
            }
        }

        cascade_schema_visibility(&mut self.nodes);
        self.push_nodes();
    }

    pub fn toggle_hide_entity(&mut self, entity: &Entity, hide: Option<bool>) {
        self.toggle_hide_entities([entity], hide);
    }

    /// Hide or show every selected entity
    pub fn toggle_hide_selected_entities(&mut self, hide: Option<bool>) {
        let selected: Vec<Entity> = self
            .nodes
            .values()
            .filter(|node| node.selected)
            .map(|node| node.data.entity())
            .collect();
        self.toggle_hide_entities(&selected, hide);
    }

    /// Show every entity
    pub fn show_all_entities(&mut self) {
        for node in self.nodes.values_mut() {
            node.hidden = false;
        }
        self.push_nodes();
    }
}

fn set_hidden(node: &mut DiagramNode, hidden: bool) {
    node.hidden = hidden;
    if hidden {
        node.selected = false;
    }
}

/// A schema container is hidden exactly when none of its tables is visible.
///
/// Schemas without any table node keep their current state. Returns whether
/// any schema changed.
pub(super) fn cascade_schema_visibility(nodes: &mut IndexMap<EntityId, DiagramNode>) -> bool {
    let mut any_visible: HashMap<String, bool> = HashMap::new();
    for node in nodes.values() {
        if node.kind == EntityKind::Table
            && let Some(parent) = &node.parent_id
        {
            *any_visible.entry(parent.clone()).or_default() |= !node.hidden;
        }
    }

    let mut changed = false;
    for (schema, visible) in any_visible {
        if let Some(node) = nodes.get_mut(&EntityId::schema(schema))
            && node.hidden == visible
        {
            set_hidden(node, !visible);
            changed = true;
        }
    }
    changed
}
