use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};

mod metrics;
mod page;

use page::{Flash, IndexPage};
use srt_folders::cli::EngineArgs;
use srt_folders::generator::expand_root;
use srt_folders::{BatchOpts, SubtitleGenerator, TranscriptionOutcome};

#[derive(Parser, Debug)]
#[command(name = "srt-folders-server")]
#[command(about = "Web form for generating subtitles in media folders")]
struct Params {
    /// Directory whose subdirectories are offered in the form.
    #[arg(long, env = "SUBTITLE_BASE_DIR", default_value = "/data")]
    base_dir: PathBuf,

    /// Host interface to bind to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Clone)]
struct AppState {
    // One batch at a time: the model handle is not shared between concurrent runs.
    generator: Arc<Mutex<SubtitleGenerator>>,
    base_dir: Arc<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FormInput {
    directories: Vec<String>,
    extra_path: Option<String>,
    recursive: bool,
    overwrite: bool,
}

impl FormInput {
    fn parse(body: &str) -> Self {
        let mut input = FormInput::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "directories" if !value.trim().is_empty() => {
                    input.directories.push(value.into_owned())
                }
                "extra_path" if !value.trim().is_empty() => {
                    input.extra_path = Some(value.trim().to_owned())
                }
                "recursive" => input.recursive = !value.is_empty(),
                "overwrite" => input.overwrite = !value.is_empty(),
                _ => {}
            }
        }
        input
    }

    /// Checked directories followed by the free-form path, if any.
    fn selected(&self) -> Vec<String> {
        self.directories
            .iter()
            .cloned()
            .chain(self.extra_path.clone())
            .collect()
    }

    fn batch_opts(&self) -> BatchOpts {
        BatchOpts {
            recursive: self.recursive,
            overwrite: self.overwrite,
            skip_existing: !self.overwrite,
        }
    }
}

#[tokio::main]
async fn main() {
    srt_folders::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "srt-folders-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    if let Err(err) = metrics::init() {
        warn!(error = ?err, "metrics disabled (init failed)");
    }

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let opts = params
        .engine
        .into_options()
        .context("invalid engine options")?;
    let generator = SubtitleGenerator::new(opts)?;

    let state = AppState {
        generator: Arc::new(Mutex::new(generator)),
        base_dir: Arc::new(expand_root(&params.base_dir)),
    };

    let app = Router::new()
        .route("/", get(index).post(submit))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>) -> Response {
    render(&state.base_dir, StatusCode::OK, None, None)
}

async fn submit(State(state): State<AppState>, body: String) -> Response {
    let form = FormInput::parse(&body);
    let selected = form.selected();

    if selected.is_empty() {
        let flash = Flash::warning("Select at least one directory to process.");
        return render(&state.base_dir, StatusCode::BAD_REQUEST, Some(&flash), None);
    }

    let missing = missing_paths(&selected);
    if !missing.is_empty() {
        let flash = Flash::danger(format!(
            "The following paths do not exist: {}",
            missing.join(", ")
        ));
        return render(&state.base_dir, StatusCode::BAD_REQUEST, Some(&flash), None);
    }

    let batch = form.batch_opts();
    let generator = state.generator.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let mut generator = generator.blocking_lock();
        generator.process(&selected, &batch)
    })
    .await;

    match joined {
        Ok(outcomes) => {
            metrics::record_outcomes(&outcomes);
            render(&state.base_dir, StatusCode::OK, None, Some(&outcomes))
        }
        Err(err) => {
            error!(error = %err, "subtitle batch panicked");
            let flash = Flash::danger("Subtitle generation failed unexpectedly.");
            render(
                &state.base_dir,
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(&flash),
                None,
            )
        }
    }
}

fn render(
    base_dir: &Path,
    status: StatusCode,
    flash: Option<&Flash>,
    results: Option<&[TranscriptionOutcome]>,
) -> Response {
    let directories = list_directories(base_dir).unwrap_or_else(|err| {
        warn!(base_dir = %base_dir.display(), error = %err, "failed to list base directory");
        Vec::new()
    });

    let html = IndexPage {
        base_directory: base_dir,
        directories: &directories,
        flash,
        results,
    }
    .render();

    (status, Html(html)).into_response()
}

/// Immediate subdirectories of `base_dir`, sorted. The directory is created if missing.
fn list_directories(base_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(base_dir)?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(base_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn missing_paths(selected: &[String]) -> Vec<String> {
    selected
        .iter()
        .filter(|p| !expand_root(Path::new(p.as_str())).exists())
        .cloned()
        .collect()
}
