use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{
    discover_pdf_files, CharacterNgramEmbedder, EmbeddingCache, EmbeddingProvider, GeminiEmbedder,
    GeminiGenerator, GenerationProvider, LopdfExtractor, PdfExtractor, QaPipeline, QaResponse,
    Settings, StubGenerator,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question about the PDFs in a folder and print the JSON response.
    Ask {
        /// Natural language question.
        #[arg(short = 'q', long)]
        question: String,
        /// Folder containing PDFs.
        #[arg(long, default_value = "data")]
        data: String,
        /// Override retrieval depth.
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the pipeline decision log before the response.
        #[arg(long, default_value_t = false)]
        show_logs: bool,
        /// Path to save the JSON response.
        #[arg(long)]
        save_json: Option<PathBuf>,
        /// Use the deterministic offline embedder and stub generator
        /// instead of the hosted model clients.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Serve the question-answering pipeline over HTTP.
    Serve {
        /// Address to bind (host:port).
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
        /// Default folder containing PDFs when a request does not name one.
        #[arg(long, default_value = "data")]
        data: String,
        /// Use the deterministic offline providers.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    if settings.api_key.is_none() {
        warn!("GOOGLE_API_KEY not set; hosted model clients will fail at construction");
    }

    match cli.command {
        Command::Ask {
            question,
            data,
            top_k,
            show_logs,
            save_json,
            offline,
        } => {
            if offline {
                let pipeline = QaPipeline::new(
                    LopdfExtractor,
                    CharacterNgramEmbedder::default(),
                    StubGenerator::default(),
                    settings.clone(),
                );
                run_ask(&pipeline, &settings, &question, &data, top_k, show_logs, save_json)
            } else {
                let embedder =
                    GeminiEmbedder::new(settings.api_key.as_deref(), settings.embedding_model.as_str())?;
                let generator = GeminiGenerator::new(
                    settings.api_key.as_deref(),
                    settings.generation_model.as_str(),
                )?;
                let pipeline = QaPipeline::new(LopdfExtractor, embedder, generator, settings.clone());
                run_ask(&pipeline, &settings, &question, &data, top_k, show_logs, save_json)
            }
        }
        Command::Serve { bind, data, offline } => {
            let cache = EmbeddingCache::load(&settings.cache_path);
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;

            if offline {
                let pipeline = QaPipeline::new(
                    LopdfExtractor,
                    CharacterNgramEmbedder::default(),
                    StubGenerator::default(),
                    settings,
                );
                runtime.block_on(serve(bind, data, pipeline, cache))
            } else {
                let embedder =
                    GeminiEmbedder::new(settings.api_key.as_deref(), settings.embedding_model.as_str())?;
                let generator = GeminiGenerator::new(
                    settings.api_key.as_deref(),
                    settings.generation_model.as_str(),
                )?;
                let pipeline = QaPipeline::new(LopdfExtractor, embedder, generator, settings);
                runtime.block_on(serve(bind, data, pipeline, cache))
            }
        }
    }
}

fn run_ask<X, E, G>(
    pipeline: &QaPipeline<X, E, G>,
    settings: &Settings,
    question: &str,
    data: &str,
    top_k: Option<usize>,
    show_logs: bool,
    save_json: Option<PathBuf>,
) -> anyhow::Result<()>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    let pdfs = discover_pdf_files(Path::new(data));
    if pdfs.is_empty() {
        let payload = json!({ "error": format!("No PDFs found in folder: {data}") });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        std::process::exit(1);
    }

    let mut cache = EmbeddingCache::load(&settings.cache_path);
    let response = pipeline.run(&mut cache, &pdfs, question, top_k)?;

    if show_logs {
        println!("\n=== PIPELINE LOGS ===");
        for line in &response.logs {
            println!("{line}");
        }
    }

    let serialized = serde_json::to_string_pretty(&response)?;
    println!("{serialized}");

    if let Some(path) = save_json {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        std::fs::write(&path, &serialized)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nSaved JSON to {}", path.display());
    }

    Ok(())
}

struct AppState<X, E, G>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    pipeline: Arc<QaPipeline<X, E, G>>,
    cache: Arc<Mutex<EmbeddingCache>>,
    default_data_dir: Arc<String>,
}

impl<X, E, G> Clone for AppState<X, E, G>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            cache: Arc::clone(&self.cache),
            default_data_dir: Arc::clone(&self.default_data_dir),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    data_dir: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

async fn serve<X, E, G>(
    bind: String,
    default_data_dir: String,
    pipeline: QaPipeline<X, E, G>,
    cache: EmbeddingCache,
) -> anyhow::Result<()>
where
    X: PdfExtractor + Send + Sync + 'static,
    E: EmbeddingProvider + Send + Sync + 'static,
    G: GenerationProvider + Send + Sync + 'static,
{
    let state = AppState {
        pipeline: Arc::new(pipeline),
        cache: Arc::new(Mutex::new(cache)),
        default_data_dir: Arc::new(default_data_dir),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask_handler::<X, E, G>))
        .with_state(state);

    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    info!("pdf-qa listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server shutdown")?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ask_handler<X, E, G>(
    State(state): State<AppState<X, E, G>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QaResponse>, (StatusCode, Json<ErrorBody>)>
where
    X: PdfExtractor + Send + Sync + 'static,
    E: EmbeddingProvider + Send + Sync + 'static,
    G: GenerationProvider + Send + Sync + 'static,
{
    if request.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let data_dir = request
        .data_dir
        .unwrap_or_else(|| state.default_data_dir.as_ref().clone());
    let folder = PathBuf::from(&data_dir);
    if !folder.exists() {
        return Err(bad_request(format!("data_dir not found: {data_dir}")));
    }

    let pdfs = discover_pdf_files(&folder);
    if pdfs.is_empty() {
        return Err(bad_request(format!("No PDFs found in {data_dir}")));
    }

    let pipeline = Arc::clone(&state.pipeline);
    let cache = Arc::clone(&state.cache);
    let question = request.question;
    let top_k = request.top_k;

    // The pipeline is synchronous and blocking by design.
    let response = tokio::task::spawn_blocking(move || {
        let mut cache = cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pipeline.run(&mut cache, &pdfs, &question, top_k)
    })
    .await
    .map_err(|error| internal_error(error.to_string()))?
    .map_err(|error| internal_error(error.to_string()))?;

    Ok(Json(response))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn internal_error(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}
