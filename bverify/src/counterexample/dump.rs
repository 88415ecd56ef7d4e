//! Bounded structural dump of snapshot values
//!
//! Objects render as `Class@id{field=value, ...}`. Traversal stops at
//! [`MAX_DUMP_DEPTH`] nested objects (rendered `Class@id{...}`), lists at most
//! [`MAX_DUMP_BREADTH`] fields per object (then `, ...`), and prints an object
//! already on the current path as a bare `Class@id` back-reference.

use std::collections::HashSet;

use crate::snapshot::{ObjectId, Snapshot, SnapshotValue};

/// Deepest object nesting that is expanded
pub const MAX_DUMP_DEPTH: usize = 5;

/// Most fields listed per object
pub const MAX_DUMP_BREADTH: usize = 5;

/// Dump `value` with the default caps
pub fn dump(snapshot: &Snapshot, value: &SnapshotValue) -> String {
    dump_with_limits(snapshot, value, MAX_DUMP_DEPTH, MAX_DUMP_BREADTH)
}

/// Dump `value` with explicit caps
fn dump_with_limits(snapshot: &Snapshot, value: &SnapshotValue, max_depth: usize, max_breadth: usize) -> String {
    let mut dumper = Dumper {
        snapshot,
        max_depth,
        max_breadth,
        path: HashSet::new(),
        out: String::new(),
    };
    dumper.value(value, 0);
    dumper.out
}

struct Dumper<'a> {
    snapshot: &'a Snapshot,
    max_depth: usize,
    max_breadth: usize,
    path: HashSet<ObjectId>,
    out: String,
}

impl Dumper<'_> {
    fn value(&mut self, value: &SnapshotValue, depth: usize) {
        match value {
            SnapshotValue::Null | SnapshotValue::Literal(_) => {
                let raw = self.snapshot.render_raw(value);
                self.out.push_str(&raw);
            }
            SnapshotValue::Object { id } => self.object(*id, depth),
        }
    }

    fn object(&mut self, id: ObjectId, depth: usize) {
        let snapshot = self.snapshot;
        let Some(obj) = snapshot.object(id) else {
            self.out.push_str(&format!("?@{id}"));
            return;
        };

        self.out.push_str(&format!("{}@{}", obj.class_name, id));
        if self.path.contains(&id) {
            return;
        }
        if depth >= self.max_depth {
            self.out.push_str("{...}");
            return;
        }

        self.path.insert(id);
        self.out.push('{');
        for (i, (name, field)) in obj.fields.iter().take(self.max_breadth).enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(name);
            self.out.push('=');
            self.value(field, depth + 1);
        }
        if obj.fields.len() > self.max_breadth {
            if self.max_breadth > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str("...");
        }
        self.out.push('}');
        self.path.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HeapObject;

    fn node(id: u32, value: &str, next: SnapshotValue) -> HeapObject {
        HeapObject {
            id: ObjectId(id),
            class_name: "Node".to_string(),
            fields: vec![
                ("value".to_string(), SnapshotValue::literal(value)),
                ("next".to_string(), next),
            ],
        }
    }

    /// Linked chain of `len` nodes, ids 1..=len, last `next` is null
    fn chain(len: u32) -> Snapshot {
        let mut snap = Snapshot::new();
        for id in 1..=len {
            let next = if id == len {
                SnapshotValue::Null
            } else {
                SnapshotValue::object(id + 1)
            };
            snap.insert_object(node(id, &id.to_string(), next));
        }
        snap
    }

    #[test]
    fn test_primitives() {
        let snap = Snapshot::new();
        assert_eq!(dump(&snap, &SnapshotValue::Null), "null");
        assert_eq!(dump(&snap, &SnapshotValue::literal("-12")), "-12");
    }

    #[test]
    fn test_small_object() {
        let snap = chain(2);
        assert_eq!(
            dump(&snap, &SnapshotValue::object(1)),
            "Node@1{value=1, next=Node@2{value=2, next=null}}"
        );
    }

    #[test]
    fn test_cycle_is_back_reference() {
        let mut snap = Snapshot::new();
        snap.insert_object(node(1, "a", SnapshotValue::object(2)));
        snap.insert_object(node(2, "b", SnapshotValue::object(1)));
        assert_eq!(
            dump(&snap, &SnapshotValue::object(1)),
            "Node@1{value=a, next=Node@2{value=b, next=Node@1}}"
        );
    }

    #[test]
    fn test_self_loop() {
        let mut snap = Snapshot::new();
        snap.insert_object(node(7, "x", SnapshotValue::object(7)));
        assert_eq!(dump(&snap, &SnapshotValue::object(7)), "Node@7{value=x, next=Node@7}");
    }

    #[test]
    fn test_depth_cap() {
        let snap = chain(8);
        let text = dump(&snap, &SnapshotValue::object(1));
        assert_eq!(
            text,
            "Node@1{value=1, next=Node@2{value=2, next=Node@3{value=3, next=Node@4{value=4, \
             next=Node@5{value=5, next=Node@6{...}}}}}}"
        );
        assert!(!text.contains("Node@7"));
    }

    #[test]
    fn test_breadth_cap() {
        let mut snap = Snapshot::new();
        snap.insert_object(HeapObject {
            id: ObjectId(1),
            class_name: "Wide".to_string(),
            fields: (0..7)
                .map(|i| (format!("f{i}"), SnapshotValue::literal(i.to_string())))
                .collect(),
        });
        assert_eq!(
            dump(&snap, &SnapshotValue::object(1)),
            "Wide@1{f0=0, f1=1, f2=2, f3=3, f4=4, ...}"
        );
    }

    #[test]
    fn test_exact_breadth_not_elided() {
        let mut snap = Snapshot::new();
        snap.insert_object(HeapObject {
            id: ObjectId(1),
            class_name: "Five".to_string(),
            fields: (0..5)
                .map(|i| (format!("f{i}"), SnapshotValue::literal(i.to_string())))
                .collect(),
        });
        assert_eq!(
            dump(&snap, &SnapshotValue::object(1)),
            "Five@1{f0=0, f1=1, f2=2, f3=3, f4=4}"
        );
    }

    #[test]
    fn test_shared_object_expanded_on_each_path() {
        let mut snap = Snapshot::new();
        snap.insert_object(HeapObject {
            id: ObjectId(1),
            class_name: "Pair".to_string(),
            fields: vec![
                ("left".to_string(), SnapshotValue::object(2)),
                ("right".to_string(), SnapshotValue::object(2)),
            ],
        });
        snap.insert_object(HeapObject {
            id: ObjectId(2),
            class_name: "Leaf".to_string(),
            fields: vec![],
        });
        assert_eq!(
            dump(&snap, &SnapshotValue::object(1)),
            "Pair@1{left=Leaf@2{}, right=Leaf@2{}}"
        );
    }

    #[test]
    fn test_unknown_object() {
        let snap = Snapshot::new();
        assert_eq!(dump(&snap, &SnapshotValue::object(3)), "?@3");
    }

    #[test]
    fn test_custom_limits() {
        let snap = chain(3);
        assert_eq!(
            dump_with_limits(&snap, &SnapshotValue::object(1), 1, 1),
            "Node@1{value=1, ...}"
        );
        assert_eq!(dump_with_limits(&snap, &SnapshotValue::object(1), 0, 5), "Node@1{...}");
    }
}
