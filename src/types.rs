use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;
use ratatui::layout::{Alignment, Constraint};
use ratatui::symbols;
use ratatui::text::Line;
use ratatui::widgets::Cell;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::column::{ColumnDescriptor, ContentAlignment};
use crate::domain::GridError;

/// Approximate width of one terminal cell in pixels.
pub const PIXELS_PER_CELL: f64 = 8.0;
pub const PROGRESS_BAR_WIDTH: usize = 10;
const NULL_VALUE: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Object,
    Text,
    Number,
    Checkbox,
    Selectbox,
    List,
    Datetime,
    Date,
    Time,
    Link,
    Progress,
    LineChart,
    BarChart,
    Json,
}

impl ColumnKind {
    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Object => "object",
            ColumnKind::Text => "text",
            ColumnKind::Number => "number",
            ColumnKind::Checkbox => "checkbox",
            ColumnKind::Selectbox => "selectbox",
            ColumnKind::List => "list",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Date => "date",
            ColumnKind::Time => "time",
            ColumnKind::Link => "link",
            ColumnKind::Progress => "progress",
            ColumnKind::LineChart => "line_chart",
            ColumnKind::BarChart => "bar_chart",
            ColumnKind::Json => "json",
        }
    }

    fn default_alignment(self) -> ContentAlignment {
        match self {
            ColumnKind::Number | ColumnKind::Progress => ContentAlignment::Right,
            ColumnKind::Checkbox => ContentAlignment::Center,
            _ => ContentAlignment::Left,
        }
    }
}

type ColumnFactory = fn(ColumnDescriptor) -> GridColumn;

/// Handle to one registered column kind.
#[derive(Debug, Clone, Copy)]
pub struct ColumnType {
    pub kind: ColumnKind,
    editable: bool,
    factory: ColumnFactory,
}

impl ColumnType {
    pub fn is_editable_type(&self) -> bool {
        self.editable
    }

    pub fn create(&self, props: ColumnDescriptor) -> GridColumn {
        (self.factory)(props)
    }
}

const fn register(kind: ColumnKind, editable: bool, factory: ColumnFactory) -> ColumnType {
    ColumnType {
        kind,
        editable,
        factory,
    }
}

static REGISTRY: [ColumnType; 14] = [
    register(ColumnKind::Object, false, object_column),
    register(ColumnKind::Text, true, text_column),
    register(ColumnKind::Number, true, number_column),
    register(ColumnKind::Checkbox, true, checkbox_column),
    register(ColumnKind::Selectbox, true, selectbox_column),
    register(ColumnKind::List, false, list_column),
    register(ColumnKind::Datetime, true, datetime_column),
    register(ColumnKind::Date, true, date_column),
    register(ColumnKind::Time, true, time_column),
    register(ColumnKind::Link, true, link_column),
    register(ColumnKind::Progress, false, progress_column),
    register(ColumnKind::LineChart, false, line_chart_column),
    register(ColumnKind::BarChart, false, bar_chart_column),
    register(ColumnKind::Json, false, json_column),
];

pub fn lookup_registered_type(name: &str) -> Option<ColumnType> {
    REGISTRY.iter().find(|t| t.kind.name() == name).copied()
}

fn registered(kind: ColumnKind) -> ColumnType {
    REGISTRY[kind as usize]
}

/// Column type for a schema dtype. Unknown dtypes map to `object`.
pub fn type_for_native(dtype: &DataType) -> ColumnType {
    let kind = match dtype {
        DataType::Boolean => ColumnKind::Checkbox,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnKind::Number,
        DataType::String => ColumnKind::Text,
        DataType::Date => ColumnKind::Date,
        DataType::Datetime(..) => ColumnKind::Datetime,
        DataType::Time => ColumnKind::Time,
        DataType::Categorical(..) | DataType::Enum(..) => ColumnKind::Selectbox,
        DataType::List(_) => ColumnKind::List,
        DataType::Struct(_) => ColumnKind::Json,
        _ => ColumnKind::Object,
    };
    registered(kind)
}

/// Picks the column type: the explicit `type` option when it is registered,
/// otherwise the type inferred from the schema.
pub fn resolve_type(column: &ColumnDescriptor) -> ColumnType {
    if let Some(name) = column.type_name() {
        if let Some(column_type) = lookup_registered_type(name) {
            return column_type;
        }
        warn!(
            "Unknown column type \"{name}\" for column \"{}\", falling back to the schema type",
            column.name
        );
    }
    type_for_native(&column.native_type)
}

fn is_integer(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

// ------------------------------ Type options ------------------------------ //

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NumberOptions {
    pub format: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectboxOptions {
    pub options: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    pub display_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProgressOptions {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

fn type_options<T: DeserializeOwned + Default>(props: &ColumnDescriptor) -> T {
    let Some(options) = &props.type_options else {
        return T::default();
    };
    match serde_json::from_value(Value::Object(options.clone())) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Invalid type options for column \"{}\": {e}", props.name);
            T::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CellFormat {
    Plain,
    Text(TextOptions),
    Number(NumberOptions),
    Checkbox,
    Selectbox(SelectboxOptions),
    Link(LinkOptions),
    Progress(ProgressOptions),
    Chart { options: ChartOptions, bars: bool },
}

// ------------------------------- Factories -------------------------------- //

fn object_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Object, props, CellFormat::Plain)
}

fn list_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::List, props, CellFormat::Plain)
}

fn datetime_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Datetime, props, CellFormat::Plain)
}

fn date_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Date, props, CellFormat::Plain)
}

fn time_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Time, props, CellFormat::Plain)
}

fn json_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Json, props, CellFormat::Plain)
}

fn text_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(ColumnKind::Text, props, CellFormat::Text(options))
}

fn number_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(ColumnKind::Number, props, CellFormat::Number(options))
}

fn checkbox_column(props: ColumnDescriptor) -> GridColumn {
    GridColumn::new(ColumnKind::Checkbox, props, CellFormat::Checkbox)
}

fn selectbox_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(ColumnKind::Selectbox, props, CellFormat::Selectbox(options))
}

fn link_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(ColumnKind::Link, props, CellFormat::Link(options))
}

fn progress_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(ColumnKind::Progress, props, CellFormat::Progress(options))
}

fn line_chart_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(
        ColumnKind::LineChart,
        props,
        CellFormat::Chart {
            options,
            bars: false,
        },
    )
}

fn bar_chart_column(props: ColumnDescriptor) -> GridColumn {
    let options = type_options(&props);
    GridColumn::new(
        ColumnKind::BarChart,
        props,
        CellFormat::Chart {
            options,
            bars: true,
        },
    )
}

// ------------------------------ Grid column ------------------------------- //

/// A resolved column, ready to render cells and parse edits.
#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub kind: ColumnKind,
    pub props: ColumnDescriptor,
    format: CellFormat,
}

impl GridColumn {
    fn new(kind: ColumnKind, props: ColumnDescriptor, format: CellFormat) -> Self {
        Self {
            kind,
            props,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.props.name
    }

    pub fn title(&self) -> &str {
        &self.props.title
    }

    pub fn alignment(&self) -> ContentAlignment {
        self.props
            .alignment
            .unwrap_or_else(|| self.kind.default_alignment())
    }

    /// Layout constraint for the terminal grid.
    pub fn constraint(&self) -> Constraint {
        let title_width = self.props.title.chars().count().max(3) as u16;
        match (self.props.width, self.props.is_stretched) {
            (Some(px), false) => Constraint::Length(pixels_to_cells(px)),
            (Some(px), true) => Constraint::Min(pixels_to_cells(px)),
            (None, true) => Constraint::Fill(1),
            (None, false) => Constraint::Min(title_width),
        }
    }

    pub fn render(&self, value: &AnyValue) -> Cell<'static> {
        let alignment: Alignment = self.alignment().into();
        Cell::from(Line::from(self.format_value(value)).alignment(alignment))
    }

    pub fn format_value(&self, value: &AnyValue) -> String {
        if value.is_null() {
            return NULL_VALUE.to_string();
        }
        match &self.format {
            CellFormat::Number(options) => format_number(value, options),
            CellFormat::Checkbox => match value {
                AnyValue::Boolean(true) => "[x]".to_string(),
                AnyValue::Boolean(false) => "[ ]".to_string(),
                other => display(other),
            },
            CellFormat::Link(options) => options
                .display_text
                .clone()
                .unwrap_or_else(|| display(value)),
            CellFormat::Progress(options) => format_progress(value, options),
            CellFormat::Chart { options, bars } => format_chart(value, options, *bars),
            _ if self.kind == ColumnKind::List => format_list(value),
            _ => display(value),
        }
    }

    /// Parses user input for a cell of this column.
    ///
    /// Empty input takes the configured default value, or null when the
    /// column is not required.
    pub fn parse_input(&self, input: &str) -> Result<AnyValue<'static>, GridError> {
        if !self.props.is_editable {
            return Err(GridError::NotEditable(self.props.name.clone()));
        }
        let input = input.trim();
        if input.is_empty() {
            return match &self.props.default_value {
                Some(default) => self.parse_input_value(&json_to_input(default)),
                None if self.props.is_required => Err(GridError::MissingValue {
                    column: self.props.name.clone(),
                }),
                None => Ok(AnyValue::Null),
            };
        }
        self.parse_input_value(input)
    }

    fn parse_input_value(&self, input: &str) -> Result<AnyValue<'static>, GridError> {
        let owned = || AnyValue::StringOwned(PlSmallStr::from(input));
        match (&self.format, self.kind) {
            (CellFormat::Text(options), _) => {
                if let Some(max) = options.max_chars
                    && input.chars().count() > max
                {
                    return Err(self.invalid(format!("at most {max} characters allowed")));
                }
                Ok(owned())
            }
            (CellFormat::Number(options), _) => self.parse_number(input, options),
            (CellFormat::Checkbox, _) => match input.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "x" => Ok(AnyValue::Boolean(true)),
                "false" | "0" | "no" => Ok(AnyValue::Boolean(false)),
                _ => Err(self.invalid(format!("\"{input}\" is not a boolean"))),
            },
            (CellFormat::Selectbox(options), _) => {
                if options.options.is_empty() {
                    return Ok(owned());
                }
                options
                    .options
                    .iter()
                    .find(|o| json_to_input(o) == input)
                    .map(json_to_value)
                    .ok_or_else(|| self.invalid(format!("\"{input}\" is not one of the options")))
            }
            (CellFormat::Link(_), _) => Ok(owned()),
            (CellFormat::Plain, ColumnKind::Date) => parse_date(input)
                .map(|date| AnyValue::Date(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
                .ok_or_else(|| self.not_a(input)),
            (CellFormat::Plain, ColumnKind::Time) => parse_time(input)
                .map(|time| AnyValue::Time(time_nanos(time)))
                .ok_or_else(|| self.not_a(input)),
            (CellFormat::Plain, ColumnKind::Datetime) => {
                let unit = match &self.props.native_type {
                    DataType::Datetime(unit, _) => *unit,
                    _ => TimeUnit::Microseconds,
                };
                let datetime = parse_datetime(input).ok_or_else(|| self.not_a(input))?;
                let utc = datetime.and_utc();
                let timestamp = match unit {
                    TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
                    TimeUnit::Microseconds => Some(utc.timestamp_micros()),
                    TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
                };
                timestamp
                    .map(|ts| AnyValue::Datetime(ts, unit, None))
                    .ok_or_else(|| self.invalid(format!("{input} is out of range for {unit}")))
            }
            _ => Err(GridError::NotEditable(self.props.name.clone())),
        }
    }

    fn parse_number(
        &self,
        input: &str,
        options: &NumberOptions,
    ) -> Result<AnyValue<'static>, GridError> {
        let value: f64 = input
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| self.invalid(format!("\"{input}\" is not a number")))?;
        if let Some(min) = options.min_value
            && value < min
        {
            return Err(self.invalid(format!("{value} is below the minimum {min}")));
        }
        if let Some(max) = options.max_value
            && value > max
        {
            return Err(self.invalid(format!("{value} is above the maximum {max}")));
        }
        let dtype = &self.props.native_type;
        if is_integer(dtype) {
            let integer = match input.parse::<i128>() {
                Ok(integer) => integer,
                Err(_) if value.fract() == 0.0 => value as i128,
                Err(_) => return Err(self.invalid(format!("{value} is not an integer"))),
            };
            return integer_value(dtype, integer)
                .ok_or_else(|| self.invalid(format!("{integer} is out of range for {dtype}")));
        }
        match dtype {
            DataType::Float32 => Some(value as f32)
                .filter(|v| v.is_finite())
                .map(AnyValue::Float32)
                .ok_or_else(|| self.invalid(format!("{value} is out of range for {dtype}"))),
            _ => Ok(AnyValue::Float64(value)),
        }
    }

    fn invalid(&self, reason: String) -> GridError {
        GridError::InvalidInput {
            column: self.props.name.clone(),
            reason,
        }
    }

    fn not_a(&self, input: &str) -> GridError {
        self.invalid(format!("\"{input}\" is not a valid {}", self.kind.name()))
    }
}

pub fn pixels_to_cells(px: f64) -> u16 {
    (px / PIXELS_PER_CELL).round().clamp(1.0, u16::MAX as f64) as u16
}

fn display(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn json_to_input(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_to_value(value: &Value) -> AnyValue<'static> {
    match value {
        Value::Null => AnyValue::Null,
        Value::Bool(b) => AnyValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AnyValue::Int64(i),
            None => n.as_f64().map_or(AnyValue::Null, AnyValue::Float64),
        },
        Value::String(s) => AnyValue::StringOwned(PlSmallStr::from(s.as_str())),
        other => AnyValue::StringOwned(PlSmallStr::from(other.to_string())),
    }
}

fn as_f64(value: &AnyValue) -> Option<f64> {
    match value {
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        AnyValue::Boolean(_) => None,
        other => other.extract::<f64>(),
    }
}

fn format_number(value: &AnyValue, options: &NumberOptions) -> String {
    let Some(number) = as_f64(value) else {
        return display(value);
    };
    match options.format.as_deref() {
        Some("%d") | Some("%i") => format!("{:.0}", number.round()),
        Some(format) => match format
            .strip_prefix("%.")
            .and_then(|f| f.strip_suffix('f'))
            .and_then(|p| p.parse::<usize>().ok())
        {
            Some(precision) => format!("{number:.precision$}"),
            None => display(value),
        },
        None => match options.step.filter(|step| *step > 0.0) {
            Some(step) => {
                let precision = step_precision(step);
                format!("{number:.precision$}")
            }
            None => display(value),
        },
    }
}

/// Number of decimals implied by a step, e.g. `0.01` gives 2.
fn step_precision(step: f64) -> usize {
    step.to_string()
        .split_once('.')
        .map(|(_, decimals)| decimals.len())
        .unwrap_or(0)
}

fn format_progress(value: &AnyValue, options: &ProgressOptions) -> String {
    let Some(number) = as_f64(value) else {
        return display(value);
    };
    let min = options.min_value.unwrap_or(0.0);
    let max = options.max_value.unwrap_or(1.0);
    let fraction = if max > min {
        ((number - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * PROGRESS_BAR_WIDTH as f64).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        symbols::bar::FULL.repeat(filled),
        symbols::shade::LIGHT.repeat(PROGRESS_BAR_WIDTH - filled),
        fraction * 100.0
    )
}

fn list_values<'a>(value: &'a AnyValue) -> Option<&'a Series> {
    match value {
        AnyValue::List(series) => Some(series),
        _ => None,
    }
}

fn format_list(value: &AnyValue) -> String {
    let Some(strings) = list_values(value).and_then(|s| s.cast(&DataType::String).ok()) else {
        return display(value);
    };
    let Ok(values) = strings.str() else {
        return display(value);
    };
    values
        .into_iter()
        .map(|v| v.unwrap_or(NULL_VALUE))
        .collect::<Vec<&str>>()
        .join(", ")
}

fn chart_points(value: &AnyValue) -> Option<Vec<f64>> {
    let floats = list_values(value)?.cast(&DataType::Float64).ok()?;
    let points = floats.f64().ok()?.into_iter().flatten().collect();
    Some(points)
}

const LINE_LEVELS: [&str; 4] = ["⡀", "⠄", "⠂", "⠁"];

fn format_chart(value: &AnyValue, options: &ChartOptions, bars: bool) -> String {
    let Some(points) = chart_points(value) else {
        return display(value);
    };
    if points.is_empty() {
        return NULL_VALUE.to_string();
    }
    let min = options
        .y_min
        .unwrap_or_else(|| points.iter().copied().fold(f64::INFINITY, f64::min));
    let max = options
        .y_max
        .unwrap_or_else(|| points.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    let bar_levels = [
        symbols::bar::ONE_EIGHTH,
        symbols::bar::ONE_QUARTER,
        symbols::bar::THREE_EIGHTHS,
        symbols::bar::HALF,
        symbols::bar::FIVE_EIGHTHS,
        symbols::bar::THREE_QUARTERS,
        symbols::bar::SEVEN_EIGHTHS,
        symbols::bar::FULL,
    ];
    let levels: &[&str] = if bars { &bar_levels } else { &LINE_LEVELS };

    points
        .iter()
        .map(|p| {
            let fraction = if max > min {
                ((p - min) / (max - min)).clamp(0.0, 1.0)
            } else {
                1.0
            };
            levels[(fraction * (levels.len() - 1) as f64).round() as usize]
        })
        .collect()
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

fn parse_time(input: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(input, format).ok())
}

/// A bare date is taken as midnight.
fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| parse_date(input).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

fn time_nanos(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64
}

fn integer_value(dtype: &DataType, value: i128) -> Option<AnyValue<'static>> {
    match dtype {
        DataType::Int8 => i8::try_from(value).ok().map(AnyValue::Int8),
        DataType::Int16 => i16::try_from(value).ok().map(AnyValue::Int16),
        DataType::Int32 => i32::try_from(value).ok().map(AnyValue::Int32),
        DataType::Int64 => i64::try_from(value).ok().map(AnyValue::Int64),
        DataType::UInt8 => u8::try_from(value).ok().map(AnyValue::UInt8),
        DataType::UInt16 => u16::try_from(value).ok().map(AnyValue::UInt16),
        DataType::UInt32 => u32::try_from(value).ok().map(AnyValue::UInt32),
        DataType::UInt64 => u64::try_from(value).ok().map(AnyValue::UInt64),
        _ => None,
    }
}
