//! Reusable entity blueprints.
//!
//! An [`EntityPreset`] is a named descriptor list kept in a [`PresetLibrary`];
//! preset-typed fields refer to other presets by name. An [`EntityTemplate`]
//! is an authored scene node: a descriptor with activation flags and child
//! nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessera_ecs::prelude::*;

use crate::assembler::assemble;
use crate::descriptor::EntityDescriptor;
use crate::error::AssemblyError;
use crate::registry::TypeRegistry;

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// A named entity blueprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityPreset {
    pub name: String,
    #[serde(default)]
    pub components: EntityDescriptor,
}

impl EntityPreset {
    pub fn new(name: impl Into<String>, components: EntityDescriptor) -> Self {
        Self {
            name: name.into(),
            components,
        }
    }

    /// Assemble one entity from this preset.
    pub fn init_as_entity(&self, world: &mut World, registry: &TypeRegistry) -> Result<EntityId, AssemblyError> {
        let entity = assemble(world, registry, &self.components)?;
        tracing::debug!(preset = %self.name, %entity, "preset instantiated");
        Ok(entity)
    }
}

/// Presets by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetLibrary {
    presets: BTreeMap<String, EntityPreset>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `preset`, returning the one it replaced.
    pub fn insert(&mut self, preset: EntityPreset) -> Option<EntityPreset> {
        self.presets.insert(preset.name.clone(), preset)
    }

    pub fn get(&self, name: &str) -> Option<&EntityPreset> {
        self.presets.get(name)
    }

    /// Preset names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn instantiate(
        &self,
        world: &mut World,
        registry: &TypeRegistry,
        name: &str,
    ) -> Result<EntityId, AssemblyError> {
        self.get(name)
            .ok_or_else(|| AssemblyError::UnknownPreset(name.to_owned()))?
            .init_as_entity(world, registry)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn yes() -> bool {
    true
}

/// An authored scene node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub name: String,
    #[serde(default)]
    pub descriptor: EntityDescriptor,
    /// Inactive nodes are skipped at startup and by
    /// [`init_with_children`](Self::init_with_children).
    #[serde(default = "yes")]
    pub active: bool,
    /// Instantiate at startup even when inactive.
    #[serde(default)]
    pub force_init: bool,
    #[serde(default)]
    pub children: Vec<EntityTemplate>,
}

impl EntityTemplate {
    pub fn new(name: impl Into<String>, descriptor: EntityDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            active: true,
            force_init: false,
            children: Vec::new(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn force_init(mut self) -> Self {
        self.force_init = true;
        self
    }

    pub fn with_child(mut self, child: EntityTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// Whether controller startup instantiates this node.
    pub fn should_init(&self) -> bool {
        self.active || self.force_init
    }

    /// Assemble this node alone.
    pub fn init_as_entity(&self, world: &mut World, registry: &TypeRegistry) -> Result<EntityId, AssemblyError> {
        let entity = assemble(world, registry, &self.descriptor)?;
        tracing::debug!(template = %self.name, %entity, "template instantiated");
        Ok(entity)
    }

    /// Assemble this node and its active descendants, depth first. Inactive
    /// children are skipped along with their subtrees.
    pub fn init_with_children(
        &self,
        world: &mut World,
        registry: &TypeRegistry,
    ) -> Result<Vec<EntityId>, AssemblyError> {
        let mut out = vec![self.init_as_entity(world, registry)?];
        for child in self.children.iter().filter(|c| c.active) {
            out.extend(child.init_with_children(world, registry)?);
        }
        Ok(out)
    }

    /// Startup walk: every node in the tree decides for itself through
    /// [`should_init`](Self::should_init), regardless of its parent.
    pub(crate) fn init_for_startup(
        &self,
        world: &mut World,
        registry: &TypeRegistry,
        out: &mut Vec<EntityId>,
    ) -> Result<(), AssemblyError> {
        if self.should_init() {
            out.push(self.init_as_entity(world, registry)?);
        }
        for child in &self.children {
            child.init_for_startup(world, registry, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ComponentDescriptor, FieldDescriptor, FieldKind, FieldSchema, PresetRef};
    use crate::descriptor::DescribeFields;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Tag {
        label: String,
    }

    impl DescribeFields for Tag {
        fn describe_fields() -> Vec<FieldSchema> {
            vec![FieldSchema::new("label", FieldKind::String)]
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Spawner {
        prefab: PresetRef,
    }

    impl DescribeFields for Spawner {
        fn describe_fields() -> Vec<FieldSchema> {
            vec![FieldSchema::new("prefab", FieldKind::Preset)]
        }
    }

    fn registry() -> Arc<TypeRegistry> {
        TypeRegistry::builder()
            .component::<Tag>("tag")
            .component::<Spawner>("spawner")
            .build()
    }

    fn tagged(label: &str) -> EntityDescriptor {
        EntityDescriptor::new().with(
            ComponentDescriptor::new("tag").with_field(FieldDescriptor::text(FieldKind::String, "label", label)),
        )
    }

    fn label(world: &World, e: EntityId) -> &str {
        &world.get_component::<Tag>(e).unwrap().label
    }

    // -- presets ------------------------------------------------------------

    #[test]
    fn library_instantiates_by_name() {
        let registry = registry();
        let mut world = World::new();
        let mut library = PresetLibrary::new();
        library.insert(EntityPreset::new("crate", tagged("crate")));
        library.insert(EntityPreset::new(
            "crate_spawner",
            EntityDescriptor::new().with(
                ComponentDescriptor::new("spawner")
                    .with_field(FieldDescriptor::preset("prefab", PresetRef::new("crate"))),
            ),
        ));
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["crate", "crate_spawner"]);

        let spawner = library.instantiate(&mut world, &registry, "crate_spawner").unwrap();
        let prefab = world.get_component::<Spawner>(spawner).unwrap().prefab.clone();
        let spawned = library.instantiate(&mut world, &registry, prefab.name()).unwrap();
        assert_eq!(label(&world, spawned), "crate");

        assert!(matches!(
            library.instantiate(&mut world, &registry, "barrel"),
            Err(AssemblyError::UnknownPreset(ref n)) if n == "barrel"
        ));
    }

    // -- templates ----------------------------------------------------------

    #[test]
    fn init_with_children_skips_inactive_subtrees() {
        let registry = registry();
        let mut world = World::new();
        let tree = EntityTemplate::new("root", tagged("root"))
            .with_child(EntityTemplate::new("a", tagged("a")).with_child(EntityTemplate::new("a1", tagged("a1"))))
            .with_child(
                EntityTemplate::new("b", tagged("b"))
                    .inactive()
                    .with_child(EntityTemplate::new("b1", tagged("b1"))),
            );
        let ids = tree.init_with_children(&mut world, &registry).unwrap();
        let labels: Vec<&str> = ids.iter().map(|&e| label(&world, e)).collect();
        assert_eq!(labels, vec!["root", "a", "a1"]);
    }

    #[test]
    fn startup_walk_honours_force_init() {
        let registry = registry();
        let mut world = World::new();
        let tree = EntityTemplate::new("root", tagged("root"))
            .inactive()
            .with_child(EntityTemplate::new("forced", tagged("forced")).inactive().force_init())
            .with_child(EntityTemplate::new("off", tagged("off")).inactive());
        let mut ids = Vec::new();
        tree.init_for_startup(&mut world, &registry, &mut ids).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(label(&world, ids[0]), "forced");
    }

    #[test]
    fn template_json_defaults() {
        let template: EntityTemplate = serde_json::from_str(r#"{"name": "empty"}"#).unwrap();
        assert!(template.active);
        assert!(!template.force_init);
        assert!(template.descriptor.is_empty());
    }
}
