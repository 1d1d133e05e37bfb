use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use panelpress::api;
use panelpress::models::{ServerConfig, TranscodeParams};
use panelpress::server;
use panelpress::services::{PackedOutput, Transcoder};

#[derive(Parser)]
#[command(name = "panelpress")]
#[command(about = "Panelpress - image transcoding server for embedded LCD panels")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Transcode a local image file with the same pipeline as POST /optimize
    Transcode {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Target width (1-4096, default 800)
        #[arg(long)]
        w: Option<String>,

        /// Target height (1-4096, default 480)
        #[arg(long)]
        h: Option<String>,

        /// cover, contain, fill, inside or outside (default contain)
        #[arg(long)]
        fit: Option<String>,

        /// png, jpeg or rgb565 (default png)
        #[arg(long)]
        fmt: Option<String>,

        /// JPEG quality (1-100, default 80)
        #[arg(long)]
        q: Option<String>,

        /// Padding color as 6 hex digits (default 000000)
        #[arg(long)]
        bg: Option<String>,

        /// "1" applies EXIF orientation (default on)
        #[arg(long)]
        rotate: Option<String>,

        /// "1" keeps transparency (PNG only)
        #[arg(long)]
        alpha: Option<String>,

        /// "white" keys near-white pixels to transparent (needs --alpha 1)
        #[arg(long)]
        strip: Option<String>,

        /// Keying tolerance (1-120, default 24)
        #[arg(long)]
        strip_tol: Option<String>,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Panelpress API",
        description = "Image transcoding for fixed-geometry LCD panels",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(api::handle_optimize, api::handle_health),
    components(schemas(
        api::UploadForm,
        api::HealthResponse,
        panelpress::error::ErrorResponse,
    )),
    tags(
        (name = "Transcode", description = "Image resizing and re-encoding"),
        (name = "Health", description = "Liveness check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Transcode {
            input,
            output,
            w,
            h,
            fit,
            fmt,
            q,
            bg,
            rotate,
            alpha,
            strip,
            strip_tol,
        }) => {
            let raw = [
                ("w", w),
                ("h", h),
                ("fit", fit),
                ("fmt", fmt),
                ("q", q),
                ("bg", bg),
                ("rotate", rotate),
                ("alpha", alpha),
                ("strip", strip),
                ("strip_tol", strip_tol),
            ];
            let query: HashMap<String, String> = raw
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
                .collect();
            run_transcode_command(&input, &output, &query)
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Transcode a local file (no server needed)
fn run_transcode_command(
    input: &Path,
    output: &Path,
    query: &HashMap<String, String>,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panelpress=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = ServerConfig::from_env();
    let params = TranscodeParams::resolve(query);
    let upload = std::fs::read(input)?;

    let transcoder = Transcoder::with_png_effort(config.png_effort);
    let packed = transcoder
        .transcode(&upload, &params)
        .map_err(|e| anyhow::anyhow!("Transcode failed: {e}"))?;

    std::fs::write(output, packed.bytes())?;
    let len = packed.bytes().len();

    match packed {
        PackedOutput::Rgb565 { width, height, .. } => println!(
            "Wrote {} ({width}x{height} RGB565LE, {len} bytes)",
            output.display()
        ),
        other => println!(
            "Wrote {} ({}, {len} bytes)",
            output.display(),
            other.content_type()
        ),
    }

    Ok(())
}

async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panelpress=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    tracing::info!(
        cors_origin = %config.cors_origin,
        max_upload_bytes = config.max_upload_bytes,
        png_effort = config.png_effort,
        "Configuration loaded"
    );

    let state = server::create_app_state(config);

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Panelpress server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let config = ServerConfig::from_env();
    let config_file = std::env::var("CONFIG_FILE").ok();

    // Header
    println!("Panelpress v{VERSION}");
    println!("Image transcoding server for embedded LCD panels\n");

    println!("Environment Variables:");
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    for key in ["BIND_ADDR", "PORT", "CORS_ORIGIN"] {
        println!(
            "  {key:<11} = {}",
            std::env::var(key).unwrap_or_else(|_| "(not set)".to_string())
        );
    }

    println!("\nEffective Configuration:");
    println!("  Listen address:  {}", config.bind_addr);
    println!("  CORS origin:     {}", config.cors_origin);
    println!("  Max upload:      {} bytes", config.max_upload_bytes);
    println!("  PNG effort:      {}", config.png_effort);

    // Commands section
    println!("\nCommands:");
    println!("  panelpress serve      Start the HTTP server");
    println!("  panelpress transcode  Transcode a local image file");
    println!("\nRun 'panelpress --help' for more details.");
}
