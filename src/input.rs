//! Loading records (tags plus optional geometry) from GeoJSON and JSON lines.

use crate::tags::{TagBundle, TagBundleSet};
use crate::values::bool_tag_value;
use anyhow::{Context, Result, anyhow, bail};
use geojson::{Feature, GeoJson, Geometry};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// One input feature.
#[derive(Debug, Clone)]
pub struct Record {
    pub tags: TagBundle,
    pub geometry: Option<Geometry>,
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Input: Failed to read {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let records = match ext.as_str() {
        "geojsonl" | "jsonl" | "ndjson" => parse_lines(&text),
        "geojson" => parse_geojson(&text),
        _ => parse_json(&text),
    }
    .with_context(|| format!("Input: Failed to parse {}", path.display()))?;

    tracing::info!("Input: loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Distinct tag bundles across all records.
pub fn bundle_set(records: &[Record]) -> TagBundleSet {
    records.iter().map(|record| record.tags.clone()).collect()
}

fn parse_lines(text: &str) -> Result<Vec<Record>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value =
                serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
            record_from_value(value).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

fn parse_geojson(text: &str) -> Result<Vec<Record>> {
    let geojson: GeoJson = text.parse()?;
    records_from_geojson(geojson)
}

fn parse_json(text: &str) -> Result<Vec<Record>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items.into_iter().map(record_from_value).collect(),
        value @ Value::Object(_) if value.get("type").is_some() => {
            records_from_geojson(GeoJson::from_json_value(value)?)
        }
        other => bail!("expected an array of objects or a GeoJSON document, got {other}"),
    }
}

fn records_from_geojson(geojson: GeoJson) -> Result<Vec<Record>> {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            Ok(collection.features.into_iter().map(record_from_feature).collect())
        }
        GeoJson::Feature(feature) => Ok(vec![record_from_feature(feature)]),
        GeoJson::Geometry(_) => Err(anyhow!("a bare geometry has no tags")),
    }
}

/// A GeoJSON Feature, or a flat object taken as tags directly.
fn record_from_value(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("Feature") => {
            match GeoJson::from_json_value(Value::Object(map))? {
                GeoJson::Feature(feature) => Ok(record_from_feature(feature)),
                _ => Err(anyhow!("expected a GeoJSON Feature")),
            }
        }
        Value::Object(map) => Ok(Record {
            tags: tags_from_properties(&map),
            geometry: None,
        }),
        other => Err(anyhow!("expected an object, got {other}")),
    }
}

fn record_from_feature(feature: Feature) -> Record {
    let tags = feature
        .properties
        .as_ref()
        .map(tags_from_properties)
        .unwrap_or_default();
    Record {
        tags,
        geometry: feature.geometry,
    }
}

/// Stringify property values the way OSM tags are written. Nulls are dropped.
pub fn tags_from_properties(properties: &Map<String, Value>) -> TagBundle {
    let tags: BTreeMap<String, String> = properties
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Bool(b) => bool_tag_value(*b).to_string(),
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                nested => nested.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect();
    TagBundle::new(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn property_values_are_stringified() {
        let props = json!({"name": "Elm", "oneway": true, "lanes": 2, "note": null, "ref": ["A1"]});
        let tags = tags_from_properties(props.as_object().unwrap());
        assert_eq!(tags.get("name"), Some("Elm"));
        assert_eq!(tags.get("oneway"), Some("yes"));
        assert_eq!(tags.get("lanes"), Some("2"));
        assert_eq!(tags.get("ref"), Some("[\"A1\"]"));
        assert!(!tags.contains_key("note"));
    }

    #[test]
    fn loads_feature_collection() {
        let file = write_temp(
            ".geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                 "properties": {"amenity": "cafe"}},
                {"type": "Feature", "geometry": null, "properties": null}
            ]}"#,
        );
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tags.get("amenity"), Some("cafe"));
        assert!(records[0].geometry.is_some());
        assert!(records[1].tags.is_empty());
    }

    #[test]
    fn loads_json_lines_of_features_and_objects() {
        let file = write_temp(
            ".jsonl",
            "{\"highway\": \"primary\"}\n\n{\"type\": \"Feature\", \"geometry\": null, \"properties\": {\"highway\": \"track\"}}\n",
        );
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tags.get("highway"), Some("track"));
        assert_eq!(bundle_set(&records).len(), 2);
    }

    #[test]
    fn loads_json_array() {
        let file = write_temp(".json", r#"[{"a": "b"}, {"a": "b"}, {"c": "d"}]"#);
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(bundle_set(&records).len(), 2);
    }

    #[test]
    fn rejects_non_objects() {
        let file = write_temp(".jsonl", "[1, 2]\n");
        assert!(load_records(file.path()).is_err());
    }
}
