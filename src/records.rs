//! Knowledge-base records as served by the backend, normalized at the
//! deserialization boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A typed record instance.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Object {
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub type_values: Vec<ObjectTypeValue>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub steps: Vec<ObjectStep>,
}

impl Object {
	/// Name shown on the graph; blank names render as "Untitled".
	pub fn display_name(&self) -> &str {
		if self.name.trim().is_empty() {
			"Untitled"
		} else {
			&self.name
		}
	}
}

/// Field values an object holds for one of its object types.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ObjectTypeValue {
	#[serde(rename = "objectTypeId")]
	pub object_type_id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub type_values: Map<String, Value>,
}

/// Membership of an object in a funnel step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ObjectStep {
	#[serde(rename = "stepId")]
	pub step_id: String,
}

/// Declared kind of an object type field.
///
/// Schemas declare a field either with the short form `"object"` or with a
/// descriptor such as `{"type": "object", "required": true}`. Both collapse
/// into [`FieldKind::Object`]; everything else is [`FieldKind::Other`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldKind {
	Object,
	#[default]
	Other,
}

impl FieldKind {
	fn from_value(value: &Value) -> Self {
		let declared = match value {
			Value::String(kind) => Some(kind.as_str()),
			Value::Object(descriptor) => descriptor.get("type").and_then(Value::as_str),
			_ => None,
		};
		match declared {
			Some("object") => Self::Object,
			_ => Self::Other,
		}
	}
}

impl<'de> Deserialize<'de> for FieldKind {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Value::deserialize(deserializer).map(|value| Self::from_value(&value))
	}
}

/// A user-defined schema that objects instantiate.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ObjectType {
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub fields: BTreeMap<String, FieldKind>,
}

impl ObjectType {
	/// Whether `key` is declared as a reference to another object.
	pub fn is_object_field(&self, key: &str) -> bool {
		self.fields.get(key) == Some(&FieldKind::Object)
	}
}

/// An ordered pipeline of steps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Funnel {
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub steps: Vec<FunnelStep>,
}

/// One stage of a [`Funnel`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FunnelStep {
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
}

/// Read-only view of the shared schema state a graph is built against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	pub object_types: Vec<ObjectType>,
	pub funnels: Vec<Funnel>,
}

/// Object ids referenced by a field value.
///
/// A value references objects as `{"id": ...}`, a bare id string, or a list
/// of either. Anything else references nothing.
pub fn referenced_ids(value: &Value) -> Vec<&str> {
	match value {
		Value::Array(items) => items.iter().filter_map(reference_id).collect(),
		single => reference_id(single).into_iter().collect(),
	}
}

fn reference_id(value: &Value) -> Option<&str> {
	let id = match value {
		Value::Object(target) => target.get("id").and_then(Value::as_str),
		Value::String(id) => Some(id.as_str()),
		_ => None,
	}?;
	(!id.is_empty()).then_some(id)
}
