use polars::prelude::DataType;
use tracing::{debug, instrument, trace};

use crate::column::ColumnDescriptor;
use crate::config::{ColumnConfigMapping, apply, lookup, parse_column_config_or_empty};
use crate::domain::{EDITABLE_ICON, GridPolicy};
use crate::table::Table;
use crate::types::{GridColumn, resolve_type, type_for_native};

/// Resolves the final, ordered list of grid columns for a table.
///
/// Never fails and never returns an empty list: a malformed configuration is
/// ignored and a grid without visible columns gets a placeholder index column.
#[instrument(skip_all, fields(table = table.name()))]
pub fn load_columns(table: &Table, raw_config: Option<&str>, policy: &GridPolicy) -> Vec<GridColumn> {
    let mapping = parse_column_config_or_empty(raw_config);
    let stretch = policy.stretch_columns();

    let columns: Vec<GridColumn> = table
        .extract_all_columns()
        .into_iter()
        .map(|base| resolve_column(base, &mapping, policy, stretch))
        .filter(|column| !column.props.is_hidden)
        .collect();

    // An empty order means no order was given.
    let columns = match &policy.column_order {
        Some(order) if !order.is_empty() => reorder(columns, order),
        _ => columns,
    };

    if columns.is_empty() {
        debug!("No visible columns, using an empty index column");
        return vec![empty_index_column(stretch)];
    }
    columns
}

/// Applies the user override and the widget policy to one base column.
pub fn resolve_column(
    base: ColumnDescriptor,
    mapping: &ColumnConfigMapping,
    policy: &GridPolicy,
    stretch: bool,
) -> GridColumn {
    let config = lookup(&base, Some(mapping));
    let mut column = apply(base, config);
    column.is_stretched = stretch;

    let column_type = resolve_type(&column);

    // Widget policy and non editable types override any column config.
    if policy.is_read_only() || policy.disabled || !column_type.is_editable_type() {
        column.is_editable = false;
    }
    if !policy.is_read_only() && column.is_editable {
        column.icon = Some(EDITABLE_ICON.to_string());
    }
    trace!(
        "Resolved column {} \"{}\" as {}",
        column.position,
        column.name,
        column_type.kind.name()
    );
    column_type.create(column)
}

/// Index columns keep their place in front, the other columns follow `order`.
/// Columns not named in `order` are dropped.
pub fn reorder(columns: Vec<GridColumn>, order: &[String]) -> Vec<GridColumn> {
    let (mut ordered, data): (Vec<GridColumn>, Vec<GridColumn>) =
        columns.into_iter().partition(|column| column.props.is_index);

    let mut remaining: Vec<Option<GridColumn>> = data.into_iter().map(Some).collect();
    for name in order {
        let found = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|column| column.name() == name))
            .and_then(Option::take);
        match found {
            Some(column) => ordered.push(column),
            None => trace!("Column order entry \"{name}\" matches no visible column"),
        }
    }
    ordered
}

fn empty_index_column(stretch: bool) -> GridColumn {
    let props = ColumnDescriptor::index("", 0, DataType::Null).with_is_stretched(stretch);
    type_for_native(&props.native_type).create(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EditingMode;
    use crate::types::ColumnKind;

    fn resolve(base: ColumnDescriptor, raw: &str, policy: &GridPolicy) -> GridColumn {
        let mapping = crate::config::parse_column_config(raw).unwrap();
        resolve_column(base, &mapping, policy, policy.stretch_columns())
    }

    fn editable_policy() -> GridPolicy {
        GridPolicy {
            editing_mode: EditingMode::Fixed,
            ..Default::default()
        }
    }

    #[test]
    fn read_only_beats_column_config() {
        let base = ColumnDescriptor::data("a", 1, DataType::Int64);
        let column = resolve(base, r#"{"a": {"disabled": false}}"#, &GridPolicy::default());
        assert!(!column.props.is_editable);
        assert_eq!(column.props.icon, None);
    }

    #[test]
    fn disabled_widget_beats_column_config() {
        let base = ColumnDescriptor::data("a", 1, DataType::Int64);
        let policy = GridPolicy {
            disabled: true,
            ..editable_policy()
        };
        let column = resolve(base, r#"{"a": {"disabled": false}}"#, &policy);
        assert!(!column.props.is_editable);
        assert_eq!(column.props.icon, None);
    }

    #[test]
    fn non_editable_type_beats_column_config() {
        let base = ColumnDescriptor::data("a", 1, DataType::Binary);
        let column = resolve(base, r#"{"a": {"disabled": false}}"#, &editable_policy());
        assert_eq!(column.kind, ColumnKind::Object);
        assert!(!column.props.is_editable);
    }

    #[test]
    fn editable_columns_get_the_icon() {
        let base = ColumnDescriptor::data("a", 1, DataType::Int64);
        let column = resolve(base.clone(), "{}", &editable_policy());
        assert!(column.props.is_editable);
        assert_eq!(column.props.icon.as_deref(), Some(EDITABLE_ICON));

        let column = resolve(base, r#"{"_pos:1": {"disabled": true}}"#, &editable_policy());
        assert!(!column.props.is_editable);
        assert_eq!(column.props.icon, None);
    }

    #[test]
    fn stretch_follows_policy() {
        let base = ColumnDescriptor::data("a", 1, DataType::Int64);
        assert!(!resolve(base.clone(), "{}", &GridPolicy::default()).props.is_stretched);

        let policy = GridPolicy {
            width: Some(500),
            ..Default::default()
        };
        assert!(resolve(base.clone(), "{}", &policy).props.is_stretched);

        let policy = GridPolicy {
            width: Some(0),
            ..Default::default()
        };
        assert!(!resolve(base.clone(), "{}", &policy).props.is_stretched);

        let policy = GridPolicy {
            use_container_width: true,
            ..Default::default()
        };
        assert!(resolve(base, "{}", &policy).props.is_stretched);
    }

    #[test]
    fn explicit_type_drives_the_factory() {
        let base = ColumnDescriptor::data("a", 1, DataType::String);
        let column = resolve(
            base.clone(),
            r#"{"a": {"type_config": {"type": "selectbox", "options": ["x"]}}}"#,
            &editable_policy(),
        );
        assert_eq!(column.kind, ColumnKind::Selectbox);

        let column = resolve(
            base,
            r#"{"a": {"type_config": {"type": "nope"}}}"#,
            &editable_policy(),
        );
        assert_eq!(column.kind, ColumnKind::Text);
    }

    #[test]
    fn reorder_skips_unknown_index_and_duplicate_names() {
        let policy = GridPolicy::default();
        let mapping = ColumnConfigMapping::new();
        let columns: Vec<GridColumn> = vec![
            ColumnDescriptor::index("i", 0, DataType::Int64),
            ColumnDescriptor::data("a", 1, DataType::Int64),
            ColumnDescriptor::data("b", 2, DataType::Int64),
        ]
        .into_iter()
        .map(|c| resolve_column(c, &mapping, &policy, false))
        .collect();

        let order: Vec<String> = ["b", "i", "zzz", "b", "a"].map(String::from).to_vec();
        let names: Vec<String> = reorder(columns, &order)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["i", "b", "a"]);
    }

    #[test]
    fn empty_index_column_is_generic() {
        let column = empty_index_column(false);
        assert_eq!(column.kind, ColumnKind::Object);
        assert!(column.props.is_index);
        assert!(!column.props.is_editable);
        assert_eq!(column.title(), "");
    }
}
