//! Deterministic fingerprinting of named collections.
//!
//! Signal = lowercase hex SHA-256 of
//! `"bujo-signal/v1\n" + target wire name + "\n" + canonical JSON array`.
//! Canonical JSON sorts object keys and carries no insignificant whitespace.

use crate::signal::{SignalError, SignalResult, UpdateTarget};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

const SIGNAL_DOMAIN: &str = "bujo-signal/v1";
const IDENTITY_FIELD: &str = "id";

/// Opaque fingerprint of one collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSignal(String);

impl ChangeSignal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChangeSignal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether element order is part of a collection's observable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRule {
    /// Hash in the order given.
    Significant,
    /// Sort by the records' `id` field before hashing.
    ByIdentity,
}

impl OrderRule {
    /// Documented default per tracked collection.
    ///
    /// Project listings are user-arranged, so their order is content.
    /// Notification and group listing order is derived from other fields.
    pub fn default_for(target: UpdateTarget) -> Self {
        match target {
            UpdateTarget::OwnedProjects | UpdateTarget::SharedProjects => Self::Significant,
            UpdateTarget::Notifications | UpdateTarget::Groups => Self::ByIdentity,
        }
    }
}

/// Ordered snapshot of presentation records for one tracked collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCollection {
    target: UpdateTarget,
    records: Vec<Value>,
}

impl NamedCollection {
    /// Captures `records` exactly as a client would receive them.
    pub fn from_records<T: Serialize>(target: UpdateTarget, records: &[T]) -> SignalResult<Self> {
        let records = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SignalError::Serialization(err.to_string()))?;
        Ok(Self { target, records })
    }

    pub fn target(&self) -> UpdateTarget {
        self.target
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Computes change signals; holds the per-collection order rules.
#[derive(Debug, Clone)]
pub struct SignalComputer {
    rules: BTreeMap<UpdateTarget, OrderRule>,
}

impl Default for SignalComputer {
    fn default() -> Self {
        Self {
            rules: UpdateTarget::ALL
                .into_iter()
                .map(|target| (target, OrderRule::default_for(target)))
                .collect(),
        }
    }
}

impl SignalComputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the order rule of one collection.
    pub fn with_rule(mut self, target: UpdateTarget, rule: OrderRule) -> Self {
        self.rules.insert(target, rule);
        self
    }

    pub fn rule_for(&self, target: UpdateTarget) -> OrderRule {
        self.rules
            .get(&target)
            .copied()
            .unwrap_or_else(|| OrderRule::default_for(target))
    }

    pub fn compute_signal(&self, collection: &NamedCollection) -> SignalResult<ChangeSignal> {
        let mut rendered = collection
            .records
            .iter()
            .map(|record| {
                let mut text = String::new();
                write_canonical_json(record, &mut text)?;
                Ok((identity_key(record)?, text))
            })
            .collect::<SignalResult<Vec<_>>>()?;

        if self.rule_for(collection.target) == OrderRule::ByIdentity {
            rendered.sort();
        }

        let mut hasher = Sha256::new();
        hasher.update(SIGNAL_DOMAIN.as_bytes());
        hasher.update(b"\n");
        hasher.update(collection.target.wire_name().as_bytes());
        hasher.update(b"\n[");
        for (index, (_, text)) in rendered.iter().enumerate() {
            if index > 0 {
                hasher.update(b",");
            }
            hasher.update(text.as_bytes());
        }
        hasher.update(b"]");
        Ok(ChangeSignal(format!("{:x}", hasher.finalize())))
    }
}

/// Sort key for `ByIdentity`: numeric ids compare numerically, anything
/// else by canonical text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum IdentityKey {
    Missing,
    Number(i64),
    Text(String),
}

fn identity_key(record: &Value) -> SignalResult<IdentityKey> {
    match record.get(IDENTITY_FIELD) {
        None | Some(Value::Null) => Ok(IdentityKey::Missing),
        Some(Value::Number(number)) if number.is_i64() => {
            Ok(number.as_i64().map_or(IdentityKey::Missing, IdentityKey::Number))
        }
        Some(other) => {
            let mut text = String::new();
            write_canonical_json(other, &mut text)?;
            Ok(IdentityKey::Text(text))
        }
    }
}

fn write_canonical_json(value: &Value, out: &mut String) -> SignalResult<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&to_json_text(key)?);
                out.push(':');
                if let Some(child) = map.get(key) {
                    write_canonical_json(child, out)?;
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical_json(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&to_json_text(scalar)?),
    }
    Ok(())
}

fn to_json_text<T: Serialize + ?Sized>(value: &T) -> SignalResult<String> {
    serde_json::to_string(value).map_err(|err| SignalError::Serialization(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{write_canonical_json, NamedCollection, OrderRule, SignalComputer};
    use crate::signal::UpdateTarget;
    use serde_json::json;

    fn signal(target: UpdateTarget, records: &[serde_json::Value]) -> String {
        let collection = NamedCollection::from_records(target, records).unwrap();
        SignalComputer::new()
            .compute_signal(&collection)
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn empty_collection_has_pinned_signal() {
        assert_eq!(
            signal(UpdateTarget::Groups, &[]),
            "5afc7cea669151177ebe7b37548541511e181c2812ba0517eb6dfc24f15fdf30"
        );
    }

    #[test]
    fn nested_record_has_pinned_signal() {
        let record = json!({"id": 2, "b": [1, {"y": "z", "x": null}]});
        assert_eq!(
            signal(UpdateTarget::Notifications, &[record]),
            "3d9a85754399bf1f8c346ab4821b51115154d10ca07361037c12345308c956f3"
        );
    }

    #[test]
    fn canonical_json_sorts_keys_at_every_depth() {
        let mut out = String::new();
        write_canonical_json(&json!({"b": {"d": 1, "c": [true, "x"]}, "a": null}), &mut out)
            .unwrap();
        assert_eq!(out, r#"{"a":null,"b":{"c":[true,"x"],"d":1}}"#);
    }

    #[test]
    fn same_content_under_different_targets_differs() {
        let records = [json!({"id": 1})];
        assert_ne!(
            signal(UpdateTarget::Notifications, &records),
            signal(UpdateTarget::Groups, &records)
        );
    }

    #[test]
    fn identity_order_compares_numeric_ids_numerically() {
        let a = [json!({"id": 10}), json!({"id": 9})];
        let b = [json!({"id": 9}), json!({"id": 10})];
        assert_eq!(signal(UpdateTarget::Groups, &a), signal(UpdateTarget::Groups, &b));
    }

    #[test]
    fn rule_override_makes_order_significant() {
        let computer = SignalComputer::new().with_rule(UpdateTarget::Groups, OrderRule::Significant);
        let a = NamedCollection::from_records(UpdateTarget::Groups, &[json!({"id": 1}), json!({"id": 2})])
            .unwrap();
        let b = NamedCollection::from_records(UpdateTarget::Groups, &[json!({"id": 2}), json!({"id": 1})])
            .unwrap();
        assert_ne!(
            computer.compute_signal(&a).unwrap(),
            computer.compute_signal(&b).unwrap()
        );
        assert_eq!(computer.rule_for(UpdateTarget::Notifications), OrderRule::ByIdentity);
    }
}
