use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod model;
mod ui;

use controller::Controller;
use model::{Model, Status};
use tvgrid::domain::{Message, PreviewConfig};
use tvgrid::{EditingMode, GridColumn, GridError, GridPolicy, Table, load_columns};
use ui::TableUI;

/// Resolve the grid columns of a data file and preview them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Data file (csv, parquet or arrow)
    path: String,

    /// Column configuration as JSON, or @FILE to read it from a file
    #[arg(short, long)]
    config: Option<String>,

    /// Column to use as (part of) the row index, can be repeated
    #[arg(short, long = "index")]
    index: Vec<String>,

    #[arg(long, value_enum, default_value_t = EditingMode::ReadOnly)]
    mode: EditingMode,

    /// Disable editing for the whole grid
    #[arg(long)]
    disabled: bool,

    #[arg(long)]
    use_container_width: bool,

    /// Grid width, a positive width stretches the columns
    #[arg(long)]
    width: Option<u32>,

    /// Comma separated display order of the columns
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<String>>,

    /// Maximum number of rows to load
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// Open the interactive preview instead of printing the columns
    #[arg(short, long)]
    preview: bool,
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing() {
    // Logs go to stderr so they don't end up in the preview.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();
}

fn expand(path: &str) -> Result<String, GridError> {
    shellexpand::full(path)
        .map(|p| p.into_owned())
        .map_err(|e| GridError::LoadingFailed(e.to_string()))
}

fn read_config(config: &str) -> Result<String, GridError> {
    match config.strip_prefix('@') {
        Some(path) => Ok(fs::read_to_string(expand(path)?)?),
        None => Ok(config.to_string()),
    }
}

fn run(args: Args) -> Result<(), GridError> {
    let path = PathBuf::from(expand(&args.path)?);
    let table = Table::load(path, &args.index, Some(args.rows))?;
    let raw_config = args.config.as_deref().map(read_config).transpose()?;

    let policy = GridPolicy {
        use_container_width: args.use_container_width,
        width: args.width,
        editing_mode: args.mode,
        disabled: args.disabled,
        column_order: args.order,
    };
    let columns = load_columns(&table, raw_config.as_deref(), &policy);
    info!("Resolved {} columns for {}", columns.len(), table.name());

    if !args.preview {
        print_columns(&columns);
        return Ok(());
    }

    let cfg = PreviewConfig {
        event_poll_time: 100,
    };
    let mut model = Model::new(table, columns);
    let mut terminal = ratatui::init();
    let result = preview(&cfg, &mut model, &mut terminal);
    ratatui::restore();
    result
}

fn preview(
    cfg: &PreviewConfig,
    model: &mut Model,
    terminal: &mut DefaultTerminal,
) -> Result<(), GridError> {
    let mut ui = TableUI::new();
    let controller = Controller::new(cfg);

    let size = terminal.size()?;
    model.update(Message::Resize(size.width, size.height));

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event()? {
            model.update(message);
        };
    }
    Ok(())
}

fn print_columns(columns: &[GridColumn]) {
    println!(
        "{:>3}  {:<20} {:<20} {:<10} {:>6}  flags",
        "pos", "name", "title", "type", "width"
    );
    for column in columns {
        let props = &column.props;
        let mut flags = Vec::new();
        if props.is_index {
            flags.push("index");
        }
        if props.is_pinned {
            flags.push("pinned");
        }
        if props.is_editable {
            flags.push("editable");
        }
        if props.is_required {
            flags.push("required");
        }
        if props.is_stretched {
            flags.push("stretched");
        }
        let width = props
            .width
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}  {:<20} {:<20} {:<10} {:>6}  {}",
            props.position,
            props.name,
            props.title,
            column.kind.name(),
            width,
            flags.join(",")
        );
    }
}
