//! Version diff engine: decides whether a discovered source list mints a new
//! immutable version, assigns (date, sequence), and normalizes entries.
//!
//! Equality between source lists is judged on a canonical serialization:
//! map keys sorted recursively, no whitespace. Reordered keys or formatting
//! differences in the upstream manifest therefore never create a version;
//! any material change does.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::{SourceRecord, SourceVersion};

/// Key injected into every normalized source entry.
pub const SOURCE_ID_KEY: &str = "source_id";

/// A fully built version candidate, ready for a single-transaction insert.
#[derive(Debug, Clone)]
pub struct NewVersion {
    /// Stable identifier of the version row.
    pub id: Uuid,
    /// Organization the version belongs to.
    pub organization_id: Uuid,
    /// Calendar day of creation.
    pub date: NaiveDate,
    /// 1-based sequence within (organization, date).
    pub sequence: u32,
    /// The source list exactly as discovered.
    pub raw_sources: Vec<Value>,
    /// Copy of the raw list with [`SOURCE_ID_KEY`] assigned per entry.
    pub normalized_sources: Vec<Value>,
    /// Source rows extracted from normalized entries that carry the required
    /// fields; incomplete entries stay in `normalized_sources` only.
    pub source_rows: Vec<SourceRecord>,
}

/// Decide whether `sources` constitutes a new version for the organization.
///
/// Returns `None` when the canonical serialization matches the latest
/// version's raw list; nothing is written in that case, even though a probe
/// just ran.
#[must_use]
pub fn plan_version(
    organization_id: Uuid,
    latest: Option<&SourceVersion>,
    sources: &[Value],
    today: NaiveDate,
) -> Option<NewVersion> {
    if let Some(latest) = latest {
        if canonical_digest(&latest.raw_sources) == canonical_digest(sources) {
            return None;
        }
    }

    let id = Uuid::new_v4();
    let normalized_sources: Vec<Value> = sources.iter().map(normalize_entry).collect();
    let source_rows = normalized_sources
        .iter()
        .filter_map(|entry| source_row(id, entry))
        .collect();

    Some(NewVersion {
        id,
        organization_id,
        date: today,
        sequence: next_sequence(latest, today),
        raw_sources: sources.to_vec(),
        normalized_sources,
        source_rows,
    })
}

/// Sequence for a version created today: continues today's numbering, or
/// restarts at 1 on the first version of a new day.
#[must_use]
pub fn next_sequence(latest: Option<&SourceVersion>, today: NaiveDate) -> u32 {
    latest
        .filter(|version| version.version_date == today)
        .map_or(1, |version| version.sequence + 1)
}

/// Base64 SHA-256 digest of the canonical serialization of a source list.
#[must_use]
pub fn canonical_digest(sources: &[Value]) -> String {
    let canonical = canonical_json(&Value::Array(sources.to_vec()));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Compact serialization with map keys sorted at every nesting level.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        },
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Copy an entry, assigning a fresh stable identifier. Non-mapping entries
/// are carried through untouched (they can never become Source rows).
fn normalize_entry(entry: &Value) -> Value {
    match entry {
        Value::Object(map) => {
            let mut copy = map.clone();
            copy.insert(
                SOURCE_ID_KEY.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
            Value::Object(copy)
        },
        other => other.clone(),
    }
}

/// Extract a Source row from a normalized entry. Entries without a
/// non-empty `path`, `type`, and identifier are silently dropped.
fn source_row(version_id: Uuid, entry: &Value) -> Option<SourceRecord> {
    let id = entry
        .get(SOURCE_ID_KEY)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let path = non_empty(entry.get("path"))?;
    let source_type = non_empty(entry.get("type"))?;
    let declared_version = entry
        .get("version")
        .and_then(Value::as_str)
        .map(std::string::ToString::to_string);
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(SourceRecord {
        id,
        version_id,
        path,
        source_type,
        declared_version,
        name,
    })
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?;
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn version_with(raw: Vec<Value>, date: NaiveDate, sequence: u32) -> SourceVersion {
        SourceVersion {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            version_date: date,
            sequence,
            raw_sources: raw.clone(),
            normalized_sources: raw,
            created_at: Utc::now(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_ignores_key_order_and_whitespace() {
        let a = vec![json!({"path": "a", "type": "rdf"})];
        let b = vec![json!({"type": "rdf", "path": "a"})];
        assert_eq!(canonical_digest(&a), canonical_digest(&b));
    }

    #[test]
    fn canonical_sorts_nested_keys() {
        let a = json!({"outer": {"b": 1, "a": [{"z": 0, "y": 1}]}});
        assert_eq!(
            canonical_json(&a),
            r#"{"outer":{"a":[{"y":1,"z":0}],"b":1}}"#
        );
    }

    #[test]
    fn canonical_distinguishes_list_order() {
        let a = vec![json!({"path": "a"}), json!({"path": "b"})];
        let b = vec![json!({"path": "b"}), json!({"path": "a"})];
        assert_ne!(canonical_digest(&a), canonical_digest(&b));
    }

    #[test]
    fn unchanged_list_plans_no_version() {
        let raw = vec![json!({"path": "a", "type": "rdf"})];
        let latest = version_with(raw.clone(), day(2026, 8, 5), 1);
        let reordered = vec![json!({"type": "rdf", "path": "a"})];

        assert!(plan_version(latest.organization_id, Some(&latest), &reordered, day(2026, 8, 5)).is_none());
    }

    #[test]
    fn first_version_starts_at_one() {
        let org = Uuid::new_v4();
        let sources = vec![json!({"path": "a", "type": "rdf"})];
        let version = plan_version(org, None, &sources, day(2026, 8, 5)).unwrap();
        assert_eq!(version.sequence, 1);
        assert_eq!(version.date, day(2026, 8, 5));
    }

    #[test]
    fn same_day_increments_sequence() {
        let latest = version_with(vec![json!({"path": "a"})], day(2026, 8, 5), 3);
        let sources = vec![json!({"path": "b"})];
        let version =
            plan_version(latest.organization_id, Some(&latest), &sources, day(2026, 8, 5)).unwrap();
        assert_eq!(version.sequence, 4);
    }

    #[test]
    fn new_day_restarts_sequence() {
        let latest = version_with(vec![json!({"path": "a"})], day(2026, 8, 4), 7);
        let sources = vec![json!({"path": "b"})];
        let version =
            plan_version(latest.organization_id, Some(&latest), &sources, day(2026, 8, 5)).unwrap();
        assert_eq!(version.sequence, 1);
    }

    #[test]
    fn normalization_assigns_source_ids() {
        let sources = vec![
            json!({"path": "a", "type": "rdf", "name": "Catalogue", "version": "2.1"}),
            json!({"path": "b", "type": "json"}),
        ];
        let version = plan_version(Uuid::new_v4(), None, &sources, day(2026, 8, 5)).unwrap();

        assert_eq!(version.normalized_sources.len(), 2);
        for entry in &version.normalized_sources {
            let id = entry[SOURCE_ID_KEY].as_str().unwrap();
            assert!(Uuid::parse_str(id).is_ok());
        }
        // Raw list is untouched.
        assert!(version.raw_sources.iter().all(|e| e.get(SOURCE_ID_KEY).is_none()));

        assert_eq!(version.source_rows.len(), 2);
        let first = &version.source_rows[0];
        assert_eq!(first.path, "a");
        assert_eq!(first.source_type, "rdf");
        assert_eq!(first.name, "Catalogue");
        assert_eq!(first.declared_version.as_deref(), Some("2.1"));
        assert_eq!(first.version_id, version.id);
    }

    #[test]
    fn incomplete_entries_stay_normalized_but_grow_no_rows() {
        let sources = vec![
            json!({"path": "a", "type": "rdf"}),
            json!({"path": "", "type": "rdf"}),
            json!({"type": "rdf"}),
            json!("just a string"),
        ];
        let version = plan_version(Uuid::new_v4(), None, &sources, day(2026, 8, 5)).unwrap();

        assert_eq!(version.normalized_sources.len(), 4);
        assert_eq!(version.source_rows.len(), 1);
        assert_eq!(version.source_rows[0].path, "a");
        // Non-mapping entries pass through unchanged.
        assert_eq!(version.normalized_sources[3], json!("just a string"));
    }
}
