//! JSON document tree addressed by `/`-separated paths.
//!
//! Every store keeps its data as one [`serde_json::Value`] tree (or one tree
//! per top-level document) and mutates it only through the helpers below, so
//! all backends agree on path rules, pruning and server-value resolution.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine};

const FORBIDDEN_CHARS: [char; 5] = ['.', '$', '#', '[', ']'];
const SERVER_VALUE_KEY: &str = ".sv";
const SERVER_TIMESTAMP: &str = "timestamp";

/// A validated path. The empty path addresses the root of the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<String>);

impl Path {
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(EngineError::InvalidPath(format!(
                    "empty segment in '{raw}'"
                )));
            }
            if segment.contains(FORBIDDEN_CHARS) {
                return Err(EngineError::InvalidPath(format!(
                    "segment '{segment}' contains a forbidden character"
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &Path) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Returns `true` when a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Splits off the first `n` segments.
    pub fn split_at(&self, n: usize) -> (Path, Path) {
        let n = n.min(self.0.len());
        (Path(self.0[..n].to_vec()), Path(self.0[n..].to_vec()))
    }

    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Path(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Returns the value at `path`, if any.
pub fn get<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() { None } else { Some(node) }
}

/// Writes `value` at `path`, creating intermediate objects.
///
/// `null` (or an empty object) removes the node, and parents left empty are
/// pruned so that removed branches never linger as `{}`.
pub fn set(tree: &mut Value, path: &Path, value: Value) {
    let value = prune(value);
    let Some((last, parents)) = path.segments().split_last() else {
        *tree = value;
        return;
    };

    if value.is_null() {
        remove_at(tree, parents, last);
        return;
    }

    let mut node = tree;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

fn remove_at(node: &mut Value, parents: &[String], last: &str) {
    let Value::Object(map) = node else {
        return;
    };
    match parents.split_first() {
        None => {
            map.remove(last);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_at(child, rest, last);
                if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
                    map.remove(head);
                }
            }
        }
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

/// Drops `null` members and empty objects from a value about to be written.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, prune(value)))
                .filter(|(_, value)| !value.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

/// The placeholder a client writes where the store must put its own clock.
pub fn server_timestamp() -> Value {
    let mut map = Map::new();
    map.insert(
        SERVER_VALUE_KEY.to_string(),
        Value::String(SERVER_TIMESTAMP.to_string()),
    );
    Value::Object(map)
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.get(SERVER_VALUE_KEY))
        .and_then(Value::as_str)
        == Some(SERVER_TIMESTAMP)
}

/// Replaces every server-timestamp placeholder in `value` with `now_ms`.
pub fn resolve_server_values(value: &mut Value, now_ms: i64) {
    if is_server_timestamp(value) {
        *value = Value::from(now_ms);
        return;
    }
    match value {
        Value::Object(map) => map
            .values_mut()
            .for_each(|child| resolve_server_values(child, now_ms)),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|child| resolve_server_values(child, now_ms)),
        _ => {}
    }
}

/// A multi-path update applied atomically by a store.
///
/// Keys are absolute paths; a `null` value removes the node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    updates: BTreeMap<String, Value>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn put(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.updates.insert(path.into(), value.into());
        self
    }

    #[must_use]
    pub fn delete(self, path: impl Into<String>) -> Self {
        self.put(path, Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.updates
    }

    /// Parses every path and rejects updates where one path is an ancestor
    /// of another, so the result does not depend on application order.
    pub fn validate(self) -> ResultEngine<Vec<(Path, Value)>> {
        if self.updates.is_empty() {
            return Err(EngineError::InvalidPath("empty update".to_string()));
        }
        let mut parsed = Vec::with_capacity(self.updates.len());
        for (raw, value) in self.updates {
            let path = Path::parse(&raw)?;
            if parsed.iter().any(|(other, _): &(Path, Value)| other.overlaps(&path)) {
                return Err(EngineError::InvalidPath(format!(
                    "'{raw}' overlaps another path in the same update"
                )));
            }
            parsed.push((path, value));
        }
        Ok(parsed)
    }
}

impl From<BTreeMap<String, Value>> for Patch {
    fn from(updates: BTreeMap<String, Value>) -> Self {
        Self { updates }
    }
}

/// Applies validated updates to `tree`, resolving server values with `now_ms`.
pub fn apply(tree: &mut Value, updates: Vec<(Path, Value)>, now_ms: i64) {
    for (path, mut value) in updates {
        resolve_server_values(&mut value, now_ms);
        set(tree, &path, value);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn parse_trims_slashes_and_rejects_bad_segments() {
        assert_eq!(path("/games/ABC123/").segments(), ["games", "ABC123"]);
        assert!(path("").is_root());
        assert!(Path::parse("games//x").is_err());
        assert!(Path::parse("games/a.b").is_err());
        assert!(Path::parse("games/$x").is_err());
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut tree = Value::Null;
        set(&mut tree, &path("games/A/players/p1/balance"), json!(10));
        assert_eq!(tree, json!({"games": {"A": {"players": {"p1": {"balance": 10}}}}}));
    }

    #[test]
    fn removing_last_child_prunes_parents() {
        let mut tree = json!({"games": {"A": {"requests": {"r1": {"amount": 5}}, "id": "A"}}});
        set(&mut tree, &path("games/A/requests/r1"), Value::Null);
        assert_eq!(tree, json!({"games": {"A": {"id": "A"}}}));
        assert!(get(&tree, &path("games/A/requests")).is_none());
    }

    #[test]
    fn writing_empty_object_removes_node() {
        let mut tree = json!({"games": {"A": {"transactions": {"t": 1}}}});
        set(&mut tree, &path("games/A/transactions"), json!({}));
        assert_eq!(tree, Value::Null);
    }

    #[test]
    fn server_timestamps_are_resolved_recursively() {
        let mut value = json!({"createdAt": server_timestamp(), "nested": [server_timestamp()]});
        resolve_server_values(&mut value, 42);
        assert_eq!(value, json!({"createdAt": 42, "nested": [42]}));
    }

    #[test]
    fn overlapping_paths_are_rejected() {
        let patch = Patch::new()
            .put("games/A/players/p1", json!({"balance": 1}))
            .put("games/A/players/p1/balance", json!(2));
        assert!(matches!(patch.validate(), Err(EngineError::InvalidPath(_))));
    }

    #[test]
    fn sibling_paths_apply_together() {
        let mut tree = json!({"games": {"A": {"players": {
            "p1": {"balance": 10}, "p2": {"balance": 0}
        }}}});
        let updates = Patch::new()
            .put("games/A/players/p1/balance", json!(4))
            .put("games/A/players/p2/balance", json!(6))
            .put("games/A/transactions/t1", json!({"timestamp": server_timestamp()}))
            .validate()
            .unwrap();
        apply(&mut tree, updates, 99);
        assert_eq!(get(&tree, &path("games/A/players/p1/balance")), Some(&json!(4)));
        assert_eq!(get(&tree, &path("games/A/players/p2/balance")), Some(&json!(6)));
        assert_eq!(
            get(&tree, &path("games/A/transactions/t1/timestamp")),
            Some(&json!(99))
        );
    }
}
