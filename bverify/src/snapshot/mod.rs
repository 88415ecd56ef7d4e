//! Solved-model snapshots
//!
//! A [`Snapshot`] holds the variable bindings the solver produced for one
//! invocation site, in the order the engine reported them, together with the
//! heap of objects those bindings reference. Objects refer to each other by
//! [`ObjectId`], so cyclic structures are representable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Solver variable naming the method receiver
pub const RECEIVER_VARIABLE: &str = "thiz_0";

/// Identity of a heap object within one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A solved value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    /// `null` reference
    Null,
    /// Primitive value, kept as the solver printed it
    Literal(String),
    /// Reference into the snapshot heap
    Object {
        #[serde(rename = "ref")]
        id: ObjectId,
    },
}

impl SnapshotValue {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn object(id: u32) -> Self {
        Self::Object { id: ObjectId(id) }
    }
}

/// Role of a variable at the invocation site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Receiver,
    Parameter,
    StaticField,
    Local,
}

impl BindingKind {
    /// Whether the binding belongs in a counterexample
    pub fn is_relevant(self) -> bool {
        !matches!(self, Self::Local)
    }
}

/// One solver variable and its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub kind: BindingKind,
    pub value: SnapshotValue,
}

/// A heap object: class plus ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapObject {
    pub id: ObjectId,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub fields: Vec<(String, SnapshotValue)>,
}

/// Variable bindings recovered for one invocation site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
    heap: BTreeMap<ObjectId, HeapObject>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries and heap objects. A later heap object with the
    /// same id replaces an earlier one.
    pub fn from_parts(entries: Vec<SnapshotEntry>, objects: Vec<HeapObject>) -> Self {
        let heap = objects.into_iter().map(|o| (o.id, o)).collect();
        Self { entries, heap }
    }

    pub fn push(&mut self, name: impl Into<String>, kind: BindingKind, value: SnapshotValue) {
        self.entries.push(SnapshotEntry {
            name: name.into(),
            kind,
            value,
        });
    }

    pub fn insert_object(&mut self, object: HeapObject) {
        self.heap.insert(object.id, object);
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotValue> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Entries in engine order
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn object(&self, id: ObjectId) -> Option<&HeapObject> {
        self.heap.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &HeapObject> {
        self.heap.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy keeping only receiver, parameter and static-field bindings.
    /// The heap is kept whole since relevant bindings may reach any object.
    pub fn relevant(&self) -> Snapshot {
        Snapshot {
            entries: self
                .entries
                .iter()
                .filter(|e| e.kind.is_relevant())
                .cloned()
                .collect(),
            heap: self.heap.clone(),
        }
    }

    /// Render a value as the solver reported it: `null`, the literal text,
    /// or `Class@id` for objects (`?@id` when the object is unknown)
    pub fn render_raw(&self, value: &SnapshotValue) -> String {
        match value {
            SnapshotValue::Null => "null".to_string(),
            SnapshotValue::Literal(text) => text.clone(),
            SnapshotValue::Object { id } => match self.object(*id) {
                Some(obj) => format!("{}@{}", obj.class_name, id),
                None => format!("?@{id}"),
            },
        }
    }
}
