use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, trace, warn};

use crate::column::{ColumnDescriptor, ContentAlignment};
use crate::domain::{COLUMN_POSITION_PREFIX, INDEX_IDENTIFIER};
use crate::width::{WidthSpec, resolve_width};

/// Sparse user override for one column. `None` fields never touch the column.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub label: Option<String>,
    pub width: Option<WidthSpec>,
    pub help: Option<String>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
    pub required: Option<bool>,
    pub pinned: Option<bool>,
    pub default: Option<Value>,
    pub alignment: Option<ContentAlignment>,
    pub type_config: Option<Map<String, Value>>,
}

pub type ColumnConfigMapping = HashMap<String, ColumnConfig>;

pub fn position_key(position: usize) -> String {
    format!("{COLUMN_POSITION_PREFIX}{position}")
}

/// Parses the serialized column configuration.
///
/// The payload must be a JSON object mapping configuration keys to records. A
/// string value is a shorthand for `{"label": ...}` and `null` hides the
/// column. Entries that don't fit the record shape are skipped with a warning,
/// the rest of the mapping is kept.
pub fn parse_column_config(raw: &str) -> Result<ColumnConfigMapping, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(ColumnConfigMapping::new());
    }
    let entries: Map<String, Value> = serde_json::from_str(raw)?;

    let mut mapping = ColumnConfigMapping::with_capacity(entries.len());
    for (key, value) in entries {
        let config = match value {
            Value::String(label) => ColumnConfig {
                label: Some(label),
                ..Default::default()
            },
            Value::Null => ColumnConfig {
                hidden: Some(true),
                ..Default::default()
            },
            value => match serde_json::from_value::<ColumnConfig>(value) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring column config for \"{key}\": {e}");
                    continue;
                }
            },
        };
        mapping.insert(key, config);
    }
    Ok(mapping)
}

/// Like [`parse_column_config`] but never fails: a malformed payload is logged
/// and treated as an empty configuration.
pub fn parse_column_config_or_empty(raw: Option<&str>) -> ColumnConfigMapping {
    match raw.map(parse_column_config) {
        None => ColumnConfigMapping::new(),
        Some(Ok(mapping)) => mapping,
        Some(Err(e)) => {
            error!("Failed to parse column config: {e}");
            ColumnConfigMapping::new()
        }
    }
}

/// Finds the override that applies to a column.
///
/// Precedence: the column name (data columns only), then the position key,
/// then the shared index key (index columns only).
pub fn lookup<'a>(
    column: &ColumnDescriptor,
    mapping: Option<&'a ColumnConfigMapping>,
) -> Option<&'a ColumnConfig> {
    let mapping = mapping?;

    if !column.is_index
        && let Some(config) = mapping.get(&column.name)
    {
        return Some(config);
    }
    if let Some(config) = mapping.get(&position_key(column.position)) {
        return Some(config);
    }
    if column.is_index {
        return mapping.get(INDEX_IDENTIFIER);
    }
    None
}

/// Merges an override onto a column, copying only the fields it defines.
pub fn apply(mut column: ColumnDescriptor, config: Option<&ColumnConfig>) -> ColumnDescriptor {
    let Some(config) = config else {
        return column;
    };
    trace!("Applying config to column {}: {config:?}", column.position);

    if let Some(label) = &config.label {
        column.title = label.clone();
    }
    if let Some(width) = resolve_width(config.width.as_ref()) {
        column.width = Some(width);
    }
    if let Some(disabled) = config.disabled {
        column.is_editable = !disabled;
    }
    if let Some(hidden) = config.hidden {
        column.is_hidden = hidden;
    }
    if let Some(required) = config.required {
        column.is_required = required;
    }
    if let Some(pinned) = config.pinned {
        column.is_pinned = pinned;
    }
    if let Some(type_config) = &config.type_config {
        column.type_options = Some(type_config.clone());
    }
    if let Some(alignment) = config.alignment {
        column.alignment = Some(alignment);
    }
    if let Some(default) = &config.default {
        column.default_value = Some(default.clone());
    }
    if let Some(help) = &config.help {
        column.help = Some(help.clone());
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use serde_json::json;

    fn mapping(raw: &str) -> ColumnConfigMapping {
        parse_column_config(raw).unwrap()
    }

    #[test]
    fn parses_records_and_shorthands() {
        let m = mapping(
            r#"{
                "a": {"label": "Alpha", "width": "small", "alignment": "right"},
                "b": "Beta",
                "c": null,
                "_pos:3": {"disabled": true, "width": 42}
            }"#,
        );
        assert_eq!(m["a"].label.as_deref(), Some("Alpha"));
        assert_eq!(m["a"].width, Some(WidthSpec::Named("small".into())));
        assert_eq!(m["a"].alignment, Some(ContentAlignment::Right));
        assert_eq!(m["b"].label.as_deref(), Some("Beta"));
        assert_eq!(m["c"].hidden, Some(true));
        assert_eq!(m["_pos:3"].disabled, Some(true));
        assert_eq!(m["_pos:3"].width, Some(WidthSpec::Pixels(42.0)));
    }

    #[test]
    fn skips_malformed_entries() {
        let m = mapping(r#"{"a": {"hidden": "yes"}, "b": {"hidden": true}, "c": 5}"#);
        assert!(!m.contains_key("a"));
        assert!(!m.contains_key("c"));
        assert_eq!(m["b"].hidden, Some(true));
    }

    #[test]
    fn malformed_payload_is_empty() {
        assert!(parse_column_config("not json").is_err());
        assert!(parse_column_config("[1, 2]").is_err());
        assert!(parse_column_config_or_empty(Some("not json")).is_empty());
        assert!(parse_column_config_or_empty(Some("\"a\"")).is_empty());
        assert!(parse_column_config_or_empty(None).is_empty());
        assert!(parse_column_config_or_empty(Some("  ")).is_empty());
    }

    #[test]
    fn null_fields_are_absent() {
        let m = mapping(r#"{"a": {"label": null, "default": null}}"#);
        assert_eq!(m["a"], ColumnConfig::default());
    }

    #[test]
    fn lookup_prefers_name_over_position() {
        let m = mapping(r#"{"a": {"label": "by name"}, "_pos:1": {"label": "by position"}}"#);
        let column = ColumnDescriptor::data("a", 1, DataType::Int64);
        assert_eq!(
            lookup(&column, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("by name")
        );

        let other = ColumnDescriptor::data("b", 1, DataType::Int64);
        assert_eq!(
            lookup(&other, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("by position")
        );
    }

    #[test]
    fn index_is_never_matched_by_name() {
        let m = mapping(r#"{"index": {"label": "shared"}, "idx": {"label": "by name"}}"#);

        let named_index = ColumnDescriptor::index("idx", 0, DataType::Int64);
        assert_eq!(
            lookup(&named_index, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("shared")
        );

        // A data column is never addressed by the reserved key.
        let data = ColumnDescriptor::data("x", 1, DataType::Int64);
        assert!(lookup(&data, Some(&m)).is_none());
    }

    #[test]
    fn position_beats_index_key() {
        let m = mapping(r#"{"index": {"label": "shared"}, "_pos:1": {"label": "second level"}}"#);
        let first = ColumnDescriptor::index("a", 0, DataType::Int64);
        let second = ColumnDescriptor::index("b", 1, DataType::Int64);
        assert_eq!(lookup(&first, Some(&m)).and_then(|c| c.label.as_deref()), Some("shared"));
        assert_eq!(
            lookup(&second, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("second level")
        );
    }

    #[test]
    fn literal_numeric_name_and_position_key_are_distinct() {
        let m = mapping(r#"{"1": {"label": "named one"}, "_pos:1": {"label": "position one"}}"#);
        let named_one = ColumnDescriptor::data("1", 2, DataType::Int64);
        let at_one = ColumnDescriptor::data("z", 1, DataType::Int64);
        assert_eq!(
            lookup(&named_one, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("named one")
        );
        assert_eq!(
            lookup(&at_one, Some(&m)).and_then(|c| c.label.as_deref()),
            Some("position one")
        );
    }

    #[test]
    fn lookup_without_mapping() {
        let column = ColumnDescriptor::data("a", 0, DataType::Int64);
        assert!(lookup(&column, None).is_none());
        assert!(lookup(&column, Some(&ColumnConfigMapping::new())).is_none());
    }

    #[test]
    fn apply_copies_defined_fields() {
        let m = mapping(
            r#"{"a": {
                "label": "Alpha",
                "width": "medium",
                "help": "some help",
                "hidden": false,
                "disabled": true,
                "required": true,
                "default": 7,
                "alignment": "center",
                "type_config": {"type": "number", "min_value": 0}
            }}"#,
        );
        let column = apply(ColumnDescriptor::data("a", 0, DataType::Int64), m.get("a"));
        assert_eq!(column.title, "Alpha");
        assert_eq!(column.width, Some(200.0));
        assert_eq!(column.help.as_deref(), Some("some help"));
        assert!(!column.is_hidden);
        assert!(!column.is_editable);
        assert!(column.is_required);
        assert_eq!(column.default_value, Some(json!(7)));
        assert_eq!(column.alignment, Some(ContentAlignment::Center));
        assert_eq!(column.type_name(), Some("number"));
    }

    #[test]
    fn apply_keeps_base_fields() {
        let base = ColumnDescriptor::data("a", 0, DataType::Int64)
            .with_width(120.0)
            .with_help("base help");

        assert_eq!(apply(base.clone(), Some(&ColumnConfig::default())), base);
        assert_eq!(apply(base.clone(), None), base);

        let bogus_width = ColumnConfig {
            width: Some(WidthSpec::Named("bogus".into())),
            ..Default::default()
        };
        assert_eq!(apply(base.clone(), Some(&bogus_width)).width, Some(120.0));
    }

    #[test]
    fn disabled_false_enables_editing() {
        let config = ColumnConfig {
            disabled: Some(false),
            ..Default::default()
        };
        let index = ColumnDescriptor::index("", 0, DataType::UInt32);
        assert!(apply(index, Some(&config)).is_editable);
    }
}
