use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::SelectionDecodeError;

// ---------------------------------------------------------------------------
// Host tags and trust
// ---------------------------------------------------------------------------

/// Asset tags carried by a host: lower-cased name to one or more values.
///
/// A name is only present when it has at least one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeMap<String, Vec<String>>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `name`. Empty names or values are ignored.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim().to_lowercase();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return;
        }
        self.0.entry(name).or_default().push(value);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustRecord {
    pub trusted: bool,
    pub tags: TagSet,
}

impl TrustRecord {
    pub fn untrusted() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tag selection
// ---------------------------------------------------------------------------

/// Requested tags: every name must match (AND), any listed value satisfies
/// its name (OR).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection(BTreeMap<String, Vec<String>>);

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionValues {
    One(String),
    Many(Vec<String>),
}

impl TagSelection {
    /// Decode `{"location": ["us", "ca"], "tier": "gold"}`-shaped text.
    pub fn decode(text: &str) -> Result<Self, SelectionDecodeError> {
        let raw: BTreeMap<String, SelectionValues> =
            serde_json::from_str(text).map_err(|e| SelectionDecodeError(e.to_string()))?;

        let mut selection = BTreeMap::new();
        for (name, values) in raw {
            let values = match values {
                SelectionValues::One(v) => vec![v],
                SelectionValues::Many(vs) => vs,
            };
            selection
                .entry(name.trim().to_lowercase())
                .or_insert_with(Vec::new)
                .extend(values);
        }
        Ok(Self(selection))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

/// Host as described by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDescriptor {
    pub hostname: String,
    pub host_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostQuery {
    pub primary_identifier: String,
    pub fallback_identifier: String,
}

impl From<&HostDescriptor> for HostQuery {
    fn from(host: &HostDescriptor) -> Self {
        Self {
            primary_identifier: host.hostname.clone(),
            fallback_identifier: host.host_ip.clone(),
        }
    }
}

/// Stable identity token issued by the host directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostIdentity(pub String);

impl std::fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Workload policy
// ---------------------------------------------------------------------------

pub const TRUST_PROPERTY: &str = "trust";
pub const TAGS_PROPERTY: &str = "tags";
pub const LOCATION_POLICY_PROPERTY: &str = "mtwilson_trustpolicy_location";

/// Image properties attached to the workload being placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadPolicy {
    pub properties: HashMap<String, String>,
}

impl WorkloadPolicy {
    pub fn trust_required(&self) -> bool {
        let flagged = self
            .properties
            .get(TRUST_PROPERTY)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        flagged || self.properties.contains_key(LOCATION_POLICY_PROPERTY)
    }

    /// Raw selection text, or `None` when the image requests no tags.
    pub fn tag_selection(&self) -> Option<&str> {
        let text = self.properties.get(TAGS_PROPERTY)?.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("none") || text == "{}" {
            return None;
        }
        Some(text)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WorkloadPolicy {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TagSelection, TagSet, WorkloadPolicy};

    #[test]
    fn tag_set_normalizes_names_and_drops_empty_values() {
        let mut tags = TagSet::new();
        tags.insert("Location", "US");
        tags.insert("LOCATION", "CA");
        tags.insert("tier", "");
        tags.insert("", "orphan");

        assert_eq!(tags.len(), 1);
        assert_eq!(
            tags.get("location"),
            Some(&["US".to_string(), "CA".to_string()][..])
        );
        assert!(tags.get("tier").is_none());
    }

    #[test]
    fn selection_accepts_lists_and_single_values() {
        let sel = TagSelection::decode(r#"{"Location": ["us", "ca"], "tier": "gold"}"#)
            .expect("decode");
        let entries: Vec<_> = sel.iter().collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "location");
        assert_eq!(entries[0].1, &["us".to_string(), "ca".to_string()][..]);
        assert_eq!(entries[1], ("tier", &["gold".to_string()][..]));
    }

    #[test]
    fn selection_rejects_non_objects() {
        assert!(TagSelection::decode("location=us").is_err());
        assert!(TagSelection::decode(r#"["us"]"#).is_err());
        assert!(TagSelection::decode(r#"{"location": 3}"#).is_err());
    }

    #[test]
    fn trust_flag_or_location_policy_requires_verification() {
        let flagged: WorkloadPolicy = [("trust", "TRUE")].into_iter().collect();
        let location: WorkloadPolicy = [("mtwilson_trustpolicy_location", "")]
            .into_iter()
            .collect();
        let plain: WorkloadPolicy = [("trust", "false")].into_iter().collect();

        assert!(flagged.trust_required());
        assert!(location.trust_required());
        assert!(!plain.trust_required());
        assert!(!WorkloadPolicy::default().trust_required());
    }

    #[test]
    fn placeholder_selections_are_absent() {
        for text in ["", "  ", "None", "{}"] {
            let policy: WorkloadPolicy = [("tags", text)].into_iter().collect();
            assert_eq!(policy.tag_selection(), None, "{text:?}");
        }
        let policy: WorkloadPolicy = [("tags", r#"{"location": ["us"]}"#)]
            .into_iter()
            .collect();
        assert_eq!(policy.tag_selection(), Some(r#"{"location": ["us"]}"#));
    }
}
