//! Name-keyed constructors for systems and components.
//!
//! Schedules and descriptors refer to types by stable names. The
//! [`TypeRegistry`] maps those names to factories. It is built once through a
//! [`TypeRegistryBuilder`], frozen into an `Arc`, and passed explicitly to the
//! pipelines, the controller, and the assembler.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tessera_ecs::prelude::*;

use crate::descriptor::{DescribeFields, FieldSchema};
use crate::system::{FromWorld, System, SystemCategories, SystemCategory};

/// Builds a system instance from the world.
pub type SystemFactory = Box<dyn Fn(&mut World) -> Box<dyn System> + Send + Sync>;

type InstallFn = fn(&mut World, &str) -> ComponentTypeId;
type BuildFn = fn(&Map<String, Value>) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error>;

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// A registered system type.
pub struct SystemRegistration {
    pub name: String,
    /// Categories the type may be scheduled in.
    pub categories: SystemCategories,
    pub type_id: TypeId,
    pub type_name: &'static str,
    factory: SystemFactory,
}

impl SystemRegistration {
    /// Construct a new instance.
    pub fn construct(&self, world: &mut World) -> Box<dyn System> {
        (self.factory)(world)
    }
}

impl fmt::Debug for SystemRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistration")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A registered component type.
pub struct ComponentRegistration {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub schema: Vec<FieldSchema>,
    install: InstallFn,
    build: BuildFn,
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("fields", &self.schema.len())
            .finish()
    }
}

fn install_component<T: Component>(world: &mut World, name: &str) -> ComponentTypeId {
    world.register_component::<T>(name)
}

/// Serialize `T::default()`, overwrite the patched fields, deserialize back.
fn build_component<T: Component + Default>(
    patch: &Map<String, Value>,
) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
    let mut value = serde_json::to_value(T::default())?;
    if let Value::Object(fields) = &mut value {
        for (name, field_value) in patch {
            fields.insert(name.clone(), field_value.clone());
        }
    }
    let typed: T = serde_json::from_value(value)?;
    Ok(Box::new(typed))
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Immutable lookup tables from names to system and component constructors.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    systems: HashMap<String, SystemRegistration>,
    components: HashMap<String, ComponentRegistration>,
    /// Component names in registration order.
    component_order: Vec<String>,
    enums: HashMap<String, Vec<String>>,
}

impl TypeRegistry {
    /// Start building a registry.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn system(&self, name: &str) -> Option<&SystemRegistration> {
        self.systems.get(name)
    }

    /// Names of the systems that declare `category`, sorted.
    pub fn systems_in(&self, category: SystemCategory) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .systems
            .values()
            .filter(|s| s.categories.includes(category))
            .map(|s| s.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn component(&self, name: &str) -> Option<&ComponentRegistration> {
        self.components.get(name)
    }

    /// Registered component name for a Rust type, if any.
    pub fn component_name_of(&self, type_id: TypeId) -> Option<&str> {
        self.component_order
            .iter()
            .find(|name| self.components[name.as_str()].type_id == type_id)
            .map(String::as_str)
    }

    /// Component names in registration order.
    pub fn component_names(&self) -> Vec<&str> {
        self.component_order.iter().map(String::as_str).collect()
    }

    pub fn component_schema(&self, name: &str) -> Option<&[FieldSchema]> {
        self.components.get(name).map(|c| c.schema.as_slice())
    }

    /// Variant names of a registered enum, in declaration order.
    pub fn enum_variants(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    /// Register every component type with `world`, in registration order.
    pub fn install_components(&self, world: &mut World) {
        for name in &self.component_order {
            let registration = &self.components[name];
            (registration.install)(world, name);
        }
    }

    /// Register one component type with `world`; returns its store id, or
    /// `None` if `name` is unknown. Idempotent.
    pub fn install_component(&self, world: &mut World, name: &str) -> Option<ComponentTypeId> {
        self.components
            .get(name)
            .map(|registration| (registration.install)(world, name))
    }

    /// Build a component value from its default with `patch` applied.
    pub fn build_component(
        &self,
        name: &str,
        patch: &Map<String, Value>,
    ) -> Option<Result<Box<dyn Any + Send + Sync>, serde_json::Error>> {
        self.components.get(name).map(|c| (c.build)(patch))
    }
}

// ---------------------------------------------------------------------------
// TypeRegistryBuilder
// ---------------------------------------------------------------------------

/// Collects registrations, then freezes them with [`build`](Self::build).
///
/// ```
/// use tessera_engine::prelude::*;
///
/// #[derive(Default)]
/// struct Gravity;
///
/// impl System for Gravity {
///     fn tick(&mut self, _world: &mut World) {}
/// }
///
/// let registry = TypeRegistry::builder()
///     .system::<Gravity>("gravity", SystemCategories::FIXED_UPDATE)
///     .build();
/// assert_eq!(registry.systems_in(SystemCategory::FixedUpdate), vec!["gravity"]);
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    registry: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// Register a system type constructed through [`FromWorld`].
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn system<T>(self, name: &str, categories: SystemCategories) -> Self
    where
        T: System + FromWorld + 'static,
    {
        self.system_with::<T>(name, categories, T::from_world)
    }

    /// Register a system type with a custom constructor.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn system_with<T>(
        mut self,
        name: &str,
        categories: SystemCategories,
        factory: impl Fn(&mut World) -> T + Send + Sync + 'static,
    ) -> Self
    where
        T: System + 'static,
    {
        assert!(
            !self.registry.systems.contains_key(name),
            "system '{name}' is already registered"
        );
        self.registry.systems.insert(
            name.to_owned(),
            SystemRegistration {
                name: name.to_owned(),
                categories,
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                factory: Box::new(move |world: &mut World| -> Box<dyn System> {
                    Box::new(factory(world))
                }),
            },
        );
        self
    }

    /// Register a component type whose fields come from [`DescribeFields`].
    pub fn component<T>(self, name: &str) -> Self
    where
        T: Component + Default + DescribeFields,
    {
        self.component_with_schema::<T>(name, T::describe_fields())
    }

    /// Register a component type with an explicit field schema (empty for
    /// markers and for types only ever inserted natively).
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn component_with_schema<T>(mut self, name: &str, schema: Vec<FieldSchema>) -> Self
    where
        T: Component + Default,
    {
        assert!(
            !self.registry.components.contains_key(name),
            "component '{name}' is already registered"
        );
        self.registry.components.insert(
            name.to_owned(),
            ComponentRegistration {
                name: name.to_owned(),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                schema,
                install: install_component::<T>,
                build: build_component::<T>,
            },
        );
        self.registry.component_order.push(name.to_owned());
        self
    }

    /// Register the variant names of a unit-variant enum used in fields.
    pub fn enumeration(mut self, name: &str, variants: &[&str]) -> Self {
        self.registry.enums.insert(
            name.to_owned(),
            variants.iter().map(|v| (*v).to_owned()).collect(),
        );
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> Arc<TypeRegistry> {
        tracing::debug!(
            systems = self.registry.systems.len(),
            components = self.registry.components.len(),
            "type registry built"
        );
        Arc::new(self.registry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
