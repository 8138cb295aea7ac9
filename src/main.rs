use std::fs::File;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use globemate::core::config::{self, CliOverrides, PageSource, ResolvedConfig};
use globemate::core::content::{
    ContentSource, DirContentSource, EmbeddedContentSource, HttpContentSource,
};
use globemate::core::markup::Document;
use globemate::core::router::{InitFailurePolicy, Router};
use globemate::core::storage::LocalStore;
use globemate::features::{FeatureDeps, register_all};

const SHELL_PATH: &str = "index.html";

#[derive(Parser)]
#[command(name = "globemate", about = "Travel planning companion for the terminal")]
struct Args {
    /// Where page fragments come from: a directory or an http(s) base URL
    #[arg(long)]
    pages: Option<String>,

    /// Page to open first
    #[arg(long)]
    page: Option<String>,

    /// Directory for saved trips, documents and places
    #[arg(long)]
    storage: Option<String>,

    /// What to do when a page controller fails to start: isolate or propagate
    #[arg(long)]
    on_init_error: Option<InitFailurePolicy>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            pages: args.pages,
            page: args.page,
            storage: args.storage,
            on_init_error: args.on_init_error,
        }
    }
}

fn content_source(config: &ResolvedConfig) -> Arc<dyn ContentSource> {
    match &config.pages {
        PageSource::Embedded => Arc::new(EmbeddedContentSource),
        PageSource::Dir(dir) => Arc::new(DirContentSource::new(dir.clone())),
        PageSource::Http(base) => Arc::new(HttpContentSource::new(
            globemate::api::build_client(config.timeout),
            base.clone(),
        )),
    }
}

/// The shell from the configured source, or the built-in one.
async fn load_shell(source: &dyn ContentSource) -> Document {
    match source.fetch(SHELL_PATH).await {
        Ok(markup) => Document::parse(&markup),
        Err(e) => {
            log::warn!(
                "Could not load {SHELL_PATH} from {}: {e}, using built-in shell",
                source.name()
            );
            Document::parse(EmbeddedContentSource::get(SHELL_PATH).unwrap_or_default())
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {e}, using defaults");
        Default::default()
    });
    let config = config::resolve(&file_config, &CliOverrides::from(args));

    // File logger - writes to globemate.log in the current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = config.log_level.parse().unwrap_or(LevelFilter::Debug);
    if let Ok(log_file) = File::create("globemate.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!(
        "GlobeMate starting up (pages: {:?}, storage: {})",
        config.pages,
        config.storage_dir.display()
    );

    let store = LocalStore::on_disk(&config.storage_dir).unwrap_or_else(|e| {
        log::error!(
            "Storage directory {} unavailable ({e}), nothing will persist",
            config.storage_dir.display()
        );
        LocalStore::in_memory()
    });

    let source = content_source(&config);
    let shell = load_shell(source.as_ref()).await;

    let mut router = Router::new(source, config.router_options());
    register_all(&mut router, &FeatureDeps::from_config(&config, store));

    globemate::tui::run(router, shell)
}
