//! Descriptor-driven entity assembly.
//!
//! [`assemble`] turns an [`EntityDescriptor`] into a live entity:
//!
//! 1. every component is resolved up front, so an unknown name or a type
//!    listed twice creates nothing;
//! 2. the entity is spawned;
//! 3. each component, in declaration order, is either the descriptor's native
//!    value or its type's `Default` with the effective field values patched in;
//! 4. each is inserted before the next is built.
//!
//! A field's effective value is the schema's declared default when the field
//! is hidden, otherwise its authored value; a field with no value keeps the
//! type's default. If a component cannot be built the entity is despawned, so
//! callers never see a partially assembled entity.

use std::collections::HashSet;

use serde_json::Map;
use tessera_ecs::prelude::*;

use crate::descriptor::{ComponentDescriptor, EntityDescriptor, FieldKind, FieldSchema};
use crate::error::AssemblyError;
use crate::registry::TypeRegistry;

/// Assemble `descriptor` into a new entity of `world`.
pub fn assemble(
    world: &mut World,
    registry: &TypeRegistry,
    descriptor: &EntityDescriptor,
) -> Result<EntityId, AssemblyError> {
    let ids = descriptor
        .components()
        .iter()
        .map(|component| resolve(world, registry, component))
        .collect::<Result<Vec<_>, _>>()?;
    let mut seen = HashSet::with_capacity(ids.len());
    for (component, id) in descriptor.components().iter().zip(&ids) {
        if !seen.insert(*id) {
            return Err(AssemblyError::DuplicateComponent(component.component.clone()));
        }
    }

    let entity = world.spawn();
    for (component, &id) in descriptor.components().iter().zip(&ids) {
        if let Err(err) = insert(world, registry, entity, id, component) {
            tracing::error!(%entity, component = %component.component, error = %err, "entity assembly aborted");
            // The entity was spawned above and nothing else can have freed it.
            let _ = world.despawn(entity);
            return Err(err);
        }
    }
    tracing::debug!(%entity, components = ids.len(), "entity assembled");
    Ok(entity)
}

/// Store id for a descriptor's component, installing the type into the world
/// if the registry knows it.
fn resolve(
    world: &mut World,
    registry: &TypeRegistry,
    component: &ComponentDescriptor,
) -> Result<ComponentTypeId, AssemblyError> {
    match &component.native {
        Some(native) => {
            if let Some(id) = world.registry().lookup_type_id(native.type_id()) {
                return Ok(id);
            }
            registry
                .component_name_of(native.type_id())
                .and_then(|name| registry.install_component(world, name))
                .ok_or_else(|| AssemblyError::UnknownComponent(native.type_name().to_owned()))
        }
        None => registry
            .install_component(world, &component.component)
            .ok_or_else(|| AssemblyError::UnknownComponent(component.component.clone())),
    }
}

fn insert(
    world: &mut World,
    registry: &TypeRegistry,
    entity: EntityId,
    id: ComponentTypeId,
    component: &ComponentDescriptor,
) -> Result<(), AssemblyError> {
    let value = match &component.native {
        Some(native) => native.clone_value(),
        None => {
            let patch = field_patch(registry, component);
            registry
                .build_component(&component.component, &patch)
                .ok_or_else(|| AssemblyError::UnknownComponent(component.component.clone()))?
                .map_err(|e| AssemblyError::InvalidComponent {
                    component: component.component.clone(),
                    details: e.to_string(),
                })?
        }
    };
    world.insert_erased(id, entity, value)?;
    Ok(())
}

/// JSON object of effective field values for `component`.
fn field_patch(registry: &TypeRegistry, component: &ComponentDescriptor) -> Map<String, serde_json::Value> {
    let schema = registry
        .component_schema(&component.component)
        .unwrap_or_default();
    let schema_of = |name: &str| schema.iter().find(|s| s.name == name);

    let mut patch = Map::new();
    for field in &component.fields {
        let declared = schema_of(&field.name);
        let value = if field.hidden || declared.is_some_and(|s| s.hidden) {
            declared.and_then(|s| s.default.clone())
        } else {
            let variants = match &field.kind {
                FieldKind::Enum(name) => registry.enum_variants(name),
                _ => None,
            };
            field.authored_value(variants)
        };
        if let Some(value) = value {
            patch.insert(field.name.clone(), value.to_json());
        }
    }

    // Hidden fields missing from the descriptor still take their default.
    for FieldSchema { name, default, .. } in schema.iter().filter(|s| s.hidden) {
        if let (false, Some(default)) = (patch.contains_key(name), default) {
            patch.insert(name.clone(), default.to_json());
        }
    }
    patch
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
