//! Command-line argument parsing for the productshot binary.

use std::path::PathBuf;

use clap::Parser;

use productshot_core::AppConfig;
use productshot_core::config::parse_provider_list;

/// Product models searched when no query is given.
pub const DEFAULT_QUERIES: &[&str] =
    &["Vivobarefoot Primus", "Be Lenka Champ", "Wildling Shoes Tanuki", "Bohempia Herb", "Freet Barefoot Flex"];

/// Find a clean white-background product photo for each query.
#[derive(Parser, Debug)]
#[command(name = "productshot")]
#[command(about = "Retrieve white-background product photos from image search providers")]
#[command(version)]
pub struct Cli {
    /// Product names to search for (defaults to a built-in list of shoe models)
    #[arg(value_name = "QUERY")]
    pub queries: Vec<String>,

    /// Comma-separated providers in fallback order, e.g. `brave-images,bing-images`
    #[arg(long, value_name = "LIST")]
    pub providers: Option<String>,

    /// Directory downloaded candidates are written to
    #[arg(long, value_name = "DIR")]
    pub images_dir: Option<PathBuf>,

    /// Remove the images directory before the run
    #[arg(long)]
    pub clean: bool,

    /// Disable the headless browser providers
    #[arg(long)]
    pub no_render: bool,

    /// Emit JSON log lines instead of human-readable text
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Queries to run, falling back to [`DEFAULT_QUERIES`].
    pub fn queries(&self) -> Vec<String> {
        let given: Vec<String> =
            self.queries.iter().map(|q| q.trim()).filter(|q| !q.is_empty()).map(str::to_string).collect();

        if given.is_empty() { DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect() } else { given }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(list) = &self.providers {
            config.providers = parse_provider_list(list);
        }
        if let Some(dir) = &self.images_dir {
            config.images_dir = dir.clone();
        }
        if self.no_render {
            config.render_enabled = false;
        }
    }
}
