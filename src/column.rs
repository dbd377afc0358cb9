use derive_setters::Setters;
use polars::prelude::DataType;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentAlignment {
    Left,
    Center,
    Right,
}

impl From<ContentAlignment> for ratatui::layout::Alignment {
    fn from(alignment: ContentAlignment) -> Self {
        match alignment {
            ContentAlignment::Left => ratatui::layout::Alignment::Left,
            ContentAlignment::Center => ratatui::layout::Alignment::Center,
            ContentAlignment::Right => ratatui::layout::Alignment::Right,
        }
    }
}

/// Everything the grid needs to know about one column, before and after the
/// user configuration is applied.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct ColumnDescriptor {
    pub name: String,
    pub position: usize, // Position in the schema, not the display order
    pub is_index: bool,
    pub native_type: DataType,
    pub title: String,
    pub width: Option<f64>, // Pixels
    pub help: Option<String>,
    pub is_editable: bool,
    pub is_hidden: bool,
    pub is_required: bool,
    pub is_pinned: bool,
    pub default_value: Option<Value>,
    pub alignment: Option<ContentAlignment>,
    pub type_options: Option<Map<String, Value>>,
    pub is_stretched: bool,
    pub icon: Option<String>,
}

impl ColumnDescriptor {
    pub fn data(name: impl Into<String>, position: usize, native_type: DataType) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            position,
            is_index: false,
            native_type,
            width: None,
            help: None,
            is_editable: true,
            is_hidden: false,
            is_required: false,
            is_pinned: false,
            default_value: None,
            alignment: None,
            type_options: None,
            is_stretched: false,
            icon: None,
        }
    }

    /// Index levels are pinned and read only until configured otherwise.
    pub fn index(name: impl Into<String>, position: usize, native_type: DataType) -> Self {
        Self {
            is_index: true,
            is_editable: false,
            is_pinned: true,
            ..Self::data(name, position, native_type)
        }
    }

    /// Explicit type name from the `type` entry of the type options.
    pub fn type_name(&self) -> Option<&str> {
        self.type_options.as_ref()?.get("type")?.as_str()
    }
}
