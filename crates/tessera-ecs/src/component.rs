//! Component type registration, metadata, and component masks.
//!
//! Every component type used in the store must be registered in a
//! [`ComponentRegistry`]. Registration produces a [`ComponentTypeId`], the key
//! for storage columns, [`ComponentMask`] bits, and change notifications.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Bound satisfied by every type that can live in the store.
///
/// Components are plain data: cloneable, thread-safe, and serde round-trippable
/// so that they can be assembled from descriptors and inspected as JSON.
pub trait Component:
    Clone + Send + Sync + 'static + serde::Serialize + serde::de::DeserializeOwned
{
}

impl<T> Component for T where
    T: Clone + Send + Sync + 'static + serde::Serialize + serde::de::DeserializeOwned
{
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// Position of this type's bit in a [`ComponentMask`].
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Unique ID assigned at registration time.
    pub id: ComponentTypeId,
    /// Name supplied at registration; used by descriptors and diagnostics.
    pub name: String,
    /// Rust `TypeId` for runtime type checking of erased values.
    pub type_id: TypeId,
    /// `std::any::type_name::<T>()`, for error messages.
    pub type_name: &'static str,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types and names to [`ComponentTypeId`]s.
///
/// A type can only be registered once; registering the same Rust type again
/// returns the existing id and ignores the new name.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by `ComponentTypeId.0`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already taken by a different type.
    pub fn register<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return existing;
        }
        if self.by_name.contains_key(name) {
            panic!("component name '{name}' is already registered for a different type");
        }

        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: rust_type_id,
            type_name: std::any::type_name::<T>(),
        });
        self.by_type.insert(rust_type_id, id);
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Look up a component type by its Rust type.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a component type by its Rust `TypeId`.
    pub fn lookup_type_id(&self, type_id: TypeId) -> Option<ComponentTypeId> {
        self.by_type.get(&type_id).copied()
    }

    /// Look up a component type by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Metadata for a registered id.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Registered name of `id`, or `"<unregistered>"`.
    pub fn name_of(&self, id: ComponentTypeId) -> &str {
        self.get_info(id)
            .map(|info| info.name.as_str())
            .unwrap_or("<unregistered>")
    }

    /// Total number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// ComponentMask
// ---------------------------------------------------------------------------

/// A growable bit set over [`ComponentTypeId`]s.
///
/// Each entity carries the mask of the component types it owns; a filter is a
/// mask that an entity's mask must contain.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask {
    words: Vec<u64>,
}

impl ComponentMask {
    /// An empty mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mask from a list of ids.
    pub fn from_ids(ids: &[ComponentTypeId]) -> Self {
        let mut mask = Self::new();
        for &id in ids {
            mask.insert(id);
        }
        mask
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, id: ComponentTypeId) -> Self {
        self.insert(id);
        self
    }

    /// Set the bit for `id`.
    pub fn insert(&mut self, id: ComponentTypeId) {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    /// Clear the bit for `id`.
    pub fn remove(&mut self, id: ComponentTypeId) {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1 << bit);
        }
    }

    /// Whether the bit for `id` is set.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        let (word, bit) = (id.index() / 64, id.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Whether every bit of `other` is also set in `self`.
    pub fn contains_all(&self, other: &ComponentMask) -> bool {
        other.words.iter().enumerate().all(|(i, &theirs)| {
            let ours = self.words.get(i).copied().unwrap_or(0);
            ours & theirs == theirs
        })
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate set ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.words.iter().enumerate().flat_map(|(word, &bits)| {
            (0..64u32)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| ComponentTypeId(word as u32 * 64 + bit))
        })
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.0)).finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentSet -- tuples of component types
// ---------------------------------------------------------------------------

/// A tuple of component types, resolved to ids against a registry.
///
/// Used to build filter masks: `world.mask_of::<(Position, Velocity)>()`.
pub trait ComponentSet {
    /// Resolve every member; `Err` carries the first unregistered type name.
    fn type_ids(registry: &ComponentRegistry) -> Result<Vec<ComponentTypeId>, &'static str>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: 'static),+> ComponentSet for ($($name,)+) {
            fn type_ids(
                registry: &ComponentRegistry,
            ) -> Result<Vec<ComponentTypeId>, &'static str> {
                Ok(vec![$(
                    registry
                        .lookup::<$name>()
                        .ok_or(std::any::type_name::<$name>())?
                ),+])
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
