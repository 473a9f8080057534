//! Serialized component and entity descriptors.
//!
//! An [`EntityDescriptor`] is the authored form of an entity: an ordered list
//! of [`ComponentDescriptor`]s, each naming a registered component type and
//! carrying one [`FieldDescriptor`] per field. Field values are stored as text
//! for value kinds (ints, floats, vectors, strings, enums) or as references for
//! object and preset kinds. The [`assembler`](crate::assembler) turns a
//! descriptor into a live entity.
//!
//! # Text formats
//!
//! | Kind      | Example       | Empty text means |
//! |-----------|---------------|------------------|
//! | `Int`     | `-12`         | `0`              |
//! | `Float`   | `0.25`        | `0.0`            |
//! | `Vector3` | `1 2.5 -3`    | zero vector      |
//! | `String`  | `hello`       | `""`             |
//! | `Enum`    | `Dynamic`     | first variant    |
//!
//! Numbers are parsed with `str::parse`, which never consults a locale.

use std::any::{Any, TypeId};
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize};
use tessera_ecs::prelude::*;

use crate::error::{AssemblyError, ConfigError, DecodeError};
use crate::registry::TypeRegistry;

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Opaque handle to an engine-owned object (a mesh, a collider, a body).
///
/// Components store the handle; resolving it belongs to the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(pub u64);

/// Reference to a named [`EntityPreset`](crate::preset::EntityPreset).
///
/// A component holding a `PresetRef` can spawn that preset at runtime through
/// a [`PresetLibrary`](crate::preset::PresetLibrary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetRef(pub String);

impl PresetRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// FieldKind / FieldValue
// ---------------------------------------------------------------------------

/// The closed set of field kinds a descriptor can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Int,
    Float,
    Vector3,
    String,
    /// A unit-variant enum, by its registered enum name.
    Enum(String),
    /// An engine object reference.
    Object,
    /// A nested preset reference.
    Preset,
}

impl FieldKind {
    /// Whether values of this kind are stored as references instead of text.
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldKind::Object | FieldKind::Preset)
    }

    /// The value empty text decodes to. `None` for references and for enums
    /// whose variants are unknown.
    pub fn zero_value(&self, variants: Option<&[String]>) -> Option<FieldValue> {
        match self {
            FieldKind::Int => Some(FieldValue::Int(0)),
            FieldKind::Float => Some(FieldValue::Float(0.0)),
            FieldKind::Vector3 => Some(FieldValue::Vector3(Vec3::ZERO)),
            FieldKind::String => Some(FieldValue::String(String::new())),
            FieldKind::Enum(_) => variants
                .and_then(|v| v.first())
                .map(|first| FieldValue::Enum(first.clone())),
            FieldKind::Object | FieldKind::Preset => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Enum(name) => write!(f, "Enum({name})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Float(f32),
    Vector3(Vec3),
    String(String),
    Enum(String),
    Object(ObjectHandle),
    Preset(PresetRef),
}

impl FieldValue {
    /// Decode `text` as a value of `kind`.
    ///
    /// `Ok(None)` means "no value": an empty reference, or an empty enum whose
    /// variants are unknown. `variants` validates enum names when given.
    pub fn decode(
        kind: &FieldKind,
        text: &str,
        variants: Option<&[String]>,
    ) -> Result<Option<FieldValue>, DecodeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() && !matches!(kind, FieldKind::String) {
            return Ok(kind.zero_value(variants));
        }
        let value = match kind {
            FieldKind::Int => FieldValue::Int(parse_number(trimmed, "integer")?),
            FieldKind::Float => FieldValue::Float(parse_number(trimmed, "float")?),
            FieldKind::Vector3 => FieldValue::Vector3(parse_vector3(trimmed)?),
            FieldKind::String => FieldValue::String(text.to_owned()),
            FieldKind::Enum(enum_name) => {
                if let Some(known) = variants {
                    if !known.iter().any(|v| v == trimmed) {
                        return Err(DecodeError::UnknownVariant {
                            enum_name: enum_name.clone(),
                            variant: trimmed.to_owned(),
                        });
                    }
                }
                FieldValue::Enum(trimmed.to_owned())
            }
            FieldKind::Object => FieldValue::Object(ObjectHandle(parse_number(trimmed, "object handle")?)),
            FieldKind::Preset => FieldValue::Preset(PresetRef::new(trimmed)),
        };
        Ok(Some(value))
    }

    /// [`decode`](Self::decode), recovering from errors: the error is logged
    /// and the kind's zero value substituted.
    pub fn decode_or_zero(
        kind: &FieldKind,
        field: &str,
        text: &str,
        variants: Option<&[String]>,
    ) -> Option<FieldValue> {
        match Self::decode(kind, text, variants) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(field, kind = %kind, error = %err, "field decode failed, using zero value");
                kind.zero_value(variants)
            }
        }
    }

    /// Textual form, as stored in a [`FieldDescriptor`].
    pub fn encode(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Vector3(v) => format!("{} {} {}", v.x, v.y, v.z),
            FieldValue::String(s) | FieldValue::Enum(s) => s.clone(),
            FieldValue::Object(handle) => handle.0.to_string(),
            FieldValue::Preset(preset) => preset.0.clone(),
        }
    }

    /// Whether this value can be stored in a field of `kind`.
    pub fn kind_matches(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Int(_), FieldKind::Int)
                | (FieldValue::Float(_), FieldKind::Float)
                | (FieldValue::Vector3(_), FieldKind::Vector3)
                | (FieldValue::String(_), FieldKind::String)
                | (FieldValue::Enum(_), FieldKind::Enum(_))
                | (FieldValue::Object(_), FieldKind::Object)
                | (FieldValue::Preset(_), FieldKind::Preset)
        )
    }

    /// JSON form used to patch a component's serialized default.
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Int(v) => serde_json::json!(v),
            FieldValue::Float(v) => serde_json::json!(v),
            FieldValue::Vector3(v) => serde_json::json!([v.x, v.y, v.z]),
            FieldValue::String(s) | FieldValue::Enum(s) => serde_json::json!(s),
            FieldValue::Object(handle) => serde_json::json!(handle.0),
            FieldValue::Preset(preset) => serde_json::json!(preset.0),
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, expected: &'static str) -> Result<T, DecodeError> {
    text.parse().map_err(|_| DecodeError::InvalidNumber {
        text: text.to_owned(),
        expected,
    })
}

fn parse_vector3(text: &str) -> Result<Vec3, DecodeError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(DecodeError::WrongTokenCount {
            expected: 3,
            found: tokens.len(),
            text: text.to_owned(),
        });
    }
    Ok(Vec3::new(
        parse_number(tokens[0], "float")?,
        parse_number(tokens[1], "float")?,
        parse_number(tokens[2], "float")?,
    ))
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Declared shape of one component field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    /// Value forced into the field when it is hidden.
    pub default: Option<FieldValue>,
    /// Hidden fields are not authored; they always take `default`.
    pub hidden: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            hidden: false,
        }
    }

    /// Hide the field and force `default` into every assembled component.
    pub fn hidden_with(mut self, default: FieldValue) -> Self {
        self.hidden = true;
        self.default = Some(default);
        self
    }

    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Component types that can be assembled from descriptors list their fields.
///
/// ```
/// use tessera_engine::descriptor::{DescribeFields, FieldKind, FieldSchema, FieldValue};
///
/// #[derive(Default, Clone, serde::Serialize, serde::Deserialize)]
/// struct Health { current: i64, max: i64 }
///
/// impl DescribeFields for Health {
///     fn describe_fields() -> Vec<FieldSchema> {
///         vec![
///             FieldSchema::new("current", FieldKind::Int),
///             FieldSchema::new("max", FieldKind::Int).hidden_with(FieldValue::Int(100)),
///         ]
///     }
/// }
/// ```
pub trait DescribeFields {
    fn describe_fields() -> Vec<FieldSchema>;
}

// ---------------------------------------------------------------------------
// FieldDescriptor
// ---------------------------------------------------------------------------

/// Authored value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub name: String,
    /// Textual value for value kinds.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetRef>,
    #[serde(default)]
    pub hidden: bool,
}

impl FieldDescriptor {
    /// A field authored as text.
    pub fn text(kind: FieldKind, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            text: text.into(),
            object: None,
            preset: None,
            hidden: false,
        }
    }

    /// A field referencing an engine object.
    pub fn object(name: impl Into<String>, handle: ObjectHandle) -> Self {
        Self {
            object: Some(handle),
            ..Self::text(FieldKind::Object, name, "")
        }
    }

    /// A field referencing a preset.
    pub fn preset(name: impl Into<String>, preset: PresetRef) -> Self {
        Self {
            preset: Some(preset),
            ..Self::text(FieldKind::Preset, name, "")
        }
    }

    /// An empty field shaped after `schema`.
    pub fn from_schema(schema: &FieldSchema) -> Self {
        Self {
            hidden: schema.hidden,
            ..Self::text(schema.kind.clone(), schema.name.clone(), "")
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Store `value` in this field. Returns whether the stored form changed;
    /// a value of the wrong kind is rejected and reports no change.
    pub fn set_value(&mut self, value: FieldValue) -> bool {
        if !value.kind_matches(&self.kind) {
            tracing::warn!(field = %self.name, kind = %self.kind, ?value, "value of wrong kind ignored");
            return false;
        }
        match value {
            FieldValue::Object(handle) => {
                let changed = self.object != Some(handle);
                self.object = Some(handle);
                changed
            }
            FieldValue::Preset(preset) => {
                let changed = self.preset.as_ref() != Some(&preset);
                self.preset = Some(preset);
                changed
            }
            other => {
                let text = other.encode();
                let changed = self.text != text;
                self.text = text;
                changed
            }
        }
    }

    /// Authored value, ignoring the hidden flag. Decode errors are recovered.
    pub fn authored_value(&self, variants: Option<&[String]>) -> Option<FieldValue> {
        match self.kind {
            FieldKind::Object => self.object.map(FieldValue::Object),
            FieldKind::Preset => self.preset.clone().map(FieldValue::Preset),
            _ => FieldValue::decode_or_zero(&self.kind, &self.name, &self.text, variants),
        }
    }
}

// ---------------------------------------------------------------------------
// NativeComponent
// ---------------------------------------------------------------------------

/// A ready-made component value carried by a descriptor instead of fields.
///
/// This is the pass-through for engine-native components: the value is
/// inserted as-is, by its runtime type. It is runtime-only and never
/// serialized.
pub struct NativeComponent {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    clone_fn: fn(&(dyn Any + Send + Sync)) -> Box<dyn Any + Send + Sync>,
}

fn clone_as<T: Component>(value: &(dyn Any + Send + Sync)) -> Box<dyn Any + Send + Sync> {
    match value.downcast_ref::<T>() {
        Some(v) => Box::new(v.clone()),
        None => unreachable!("NativeComponent clone_fn always matches its stored type"),
    }
}

impl NativeComponent {
    pub fn new<T: Component>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
            clone_fn: clone_as::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A fresh boxed copy of the value, ready for erased insertion.
    pub fn clone_value(&self) -> Box<dyn Any + Send + Sync> {
        (self.clone_fn)(self.value.as_ref())
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl Clone for NativeComponent {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            value: self.clone_value(),
            clone_fn: self.clone_fn,
        }
    }
}

impl fmt::Debug for NativeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeComponent").field(&self.type_name).finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentDescriptor
// ---------------------------------------------------------------------------

/// Authored form of one component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Registered component name. For native components, the Rust type name.
    pub component: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    pub native: Option<NativeComponent>,
}

impl ComponentDescriptor {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            fields: Vec::new(),
            native: None,
        }
    }

    /// Descriptor with one empty field per schema entry of `component`.
    pub fn from_registry(component: &str, registry: &TypeRegistry) -> Result<Self, ConfigError> {
        let schema = registry
            .component_schema(component)
            .ok_or_else(|| ConfigError::UnknownComponent(component.to_owned()))?;
        Ok(Self {
            component: component.to_owned(),
            fields: schema.iter().map(FieldDescriptor::from_schema).collect(),
            native: None,
        })
    }

    /// Descriptor carrying `value` directly.
    pub fn native<T: Component>(value: T) -> Self {
        let native = NativeComponent::new(value);
        Self {
            component: native.type_name().to_owned(),
            fields: Vec::new(),
            native: Some(native),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }
}

// ---------------------------------------------------------------------------
// EntityDescriptor
// ---------------------------------------------------------------------------

/// Ordered component descriptors for one entity. Component names are unique;
/// deserializing a list that repeats a name fails.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EntityDescriptor {
    components: Vec<ComponentDescriptor>,
}

impl TryFrom<Vec<ComponentDescriptor>> for EntityDescriptor {
    type Error = AssemblyError;

    fn try_from(components: Vec<ComponentDescriptor>) -> Result<Self, Self::Error> {
        let mut descriptor = Self::new();
        for component in components {
            if descriptor.contains(&component.component) {
                return Err(AssemblyError::DuplicateComponent(component.component));
            }
            descriptor.components.push(component);
        }
        Ok(descriptor)
    }
}

impl<'de> Deserialize<'de> for EntityDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let components = Vec::<ComponentDescriptor>::deserialize(deserializer)?;
        Self::try_from(components).map_err(serde::de::Error::custom)
    }
}

impl EntityDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `descriptor` unless a component of the same name is present.
    pub fn push(&mut self, descriptor: ComponentDescriptor) -> bool {
        if self.contains(&descriptor.component) {
            tracing::warn!(component = %descriptor.component, "duplicate component ignored");
            return false;
        }
        self.components.push(descriptor);
        true
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, descriptor: ComponentDescriptor) -> Self {
        self.push(descriptor);
        self
    }

    /// Append a registered component with empty fields laid out from its
    /// schema. Returns `Ok(false)` if the entity already has it.
    pub fn add_component(&mut self, name: &str, registry: &TypeRegistry) -> Result<bool, ConfigError> {
        let descriptor = ComponentDescriptor::from_registry(name, registry)?;
        Ok(self.push(descriptor))
    }

    /// Append a native component value.
    pub fn add_native<T: Component>(&mut self, value: T) -> bool {
        self.push(ComponentDescriptor::native(value))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<ComponentDescriptor> {
        (index < self.components.len()).then(|| self.components.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.component == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ComponentDescriptor> {
        self.components.iter_mut().find(|c| c.component == name)
    }

    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- decode ------------------------------------------------------------

    #[test]
    fn decode_numbers() {
        assert_eq!(
            FieldValue::decode(&FieldKind::Int, "5", None),
            Ok(Some(FieldValue::Int(5)))
        );
        assert_eq!(
            FieldValue::decode(&FieldKind::Int, "", None),
            Ok(Some(FieldValue::Int(0)))
        );
        assert_eq!(
            FieldValue::decode(&FieldKind::Float, " 0.5 ", None),
            Ok(Some(FieldValue::Float(0.5)))
        );
        assert!(matches!(
            FieldValue::decode(&FieldKind::Int, "1,5", None),
            Err(DecodeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn decode_vector() {
        assert_eq!(
            FieldValue::decode(&FieldKind::Vector3, "1 2 3", None),
            Ok(Some(FieldValue::Vector3(Vec3::new(1.0, 2.0, 3.0))))
        );
        assert_eq!(
            FieldValue::decode(&FieldKind::Vector3, "1 2", None),
            Err(DecodeError::WrongTokenCount {
                expected: 3,
                found: 2,
                text: "1 2".to_owned()
            })
        );
        assert_eq!(
            FieldValue::decode_or_zero(&FieldKind::Vector3, "pos", "1 2 3 4", None),
            Some(FieldValue::Vector3(Vec3::ZERO))
        );
    }

    #[test]
    fn decode_enum_against_variants() {
        let kind = FieldKind::Enum("BodyKind".into());
        let variants = vec!["Static".to_owned(), "Dynamic".to_owned()];
        assert_eq!(
            FieldValue::decode(&kind, "Dynamic", Some(&variants)),
            Ok(Some(FieldValue::Enum("Dynamic".into())))
        );
        assert_eq!(
            FieldValue::decode(&kind, "", Some(&variants)),
            Ok(Some(FieldValue::Enum("Static".into())))
        );
        assert!(matches!(
            FieldValue::decode(&kind, "Kinematic", Some(&variants)),
            Err(DecodeError::UnknownVariant { .. })
        ));
        assert_eq!(FieldValue::decode(&kind, "", None), Ok(None));
    }

    #[test]
    fn strings_keep_whitespace() {
        assert_eq!(
            FieldValue::decode(&FieldKind::String, "  padded ", None),
            Ok(Some(FieldValue::String("  padded ".into())))
        );
        assert_eq!(
            FieldValue::decode(&FieldKind::String, "", None),
            Ok(Some(FieldValue::String(String::new())))
        );
    }

    // -- encode ------------------------------------------------------------

    #[test]
    fn encode_is_decodable() {
        let v = FieldValue::Vector3(Vec3::new(1.5, -2.0, 0.0));
        assert_eq!(v.encode(), "1.5 -2 0");
        assert_eq!(
            FieldValue::decode(&FieldKind::Vector3, &v.encode(), None),
            Ok(Some(v))
        );
    }

    // -- field descriptors -------------------------------------------------

    #[test]
    fn set_value_reports_change() {
        let mut f = FieldDescriptor::text(FieldKind::Int, "hp", "3");
        assert!(!f.set_value(FieldValue::Int(3)));
        assert!(f.set_value(FieldValue::Int(4)));
        assert_eq!(f.text, "4");
        assert!(!f.set_value(FieldValue::Float(1.0)));
        assert_eq!(f.text, "4");

        let mut o = FieldDescriptor::object("body", ObjectHandle(1));
        assert!(o.set_value(FieldValue::Object(ObjectHandle(2))));
        assert_eq!(o.authored_value(None), Some(FieldValue::Object(ObjectHandle(2))));
    }

    #[test]
    fn empty_reference_has_no_value() {
        let f = FieldDescriptor::text(FieldKind::Preset, "spawn", "");
        assert_eq!(f.authored_value(None), None);
    }

    // -- entity descriptors ------------------------------------------------

    #[test]
    fn entity_descriptor_rejects_duplicates() {
        let mut d = EntityDescriptor::new();
        assert!(d.push(ComponentDescriptor::new("health")));
        assert!(!d.push(ComponentDescriptor::new("health")));
        assert!(d.add_native(7u32));
        assert!(!d.add_native(8u32));
        assert_eq!(d.len(), 2);
        assert!(d.components()[1].is_native());

        assert!(d.remove_at(0).is_some());
        assert!(d.remove_at(5).is_none());
        assert!(!d.contains("health"));
    }

    #[test]
    fn json_with_repeated_component_is_rejected() {
        let json = serde_json::json!([{ "component": "health" }, { "component": "health" }]);
        let err = serde_json::from_value::<EntityDescriptor>(json).unwrap_err();
        assert!(err.to_string().contains("health"), "{err}");
    }

    #[test]
    fn native_component_clones_value() {
        let native = NativeComponent::new(String::from("mesh"));
        let copy = native.clone();
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("mesh"));
        assert_eq!(copy.type_id(), TypeId::of::<String>());
    }

    #[test]
    fn descriptor_json_skips_native() {
        let d = EntityDescriptor::new()
            .with(
                ComponentDescriptor::new("health")
                    .with_field(FieldDescriptor::text(FieldKind::Int, "current", "5")),
            )
            .with(ComponentDescriptor::native(1u8));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json[0]["component"], "health");
        assert_eq!(json[0]["fields"][0]["text"], "5");

        let back: EntityDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 2);
        assert!(!back.components()[1].is_native());
    }
}
