use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::Uri;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use errand::backend::http::HttpBackend;
use errand::cache::ResponseCache;
use errand::cache::sqlite::SqliteCache;
use errand::config::Settings;
use errand::consts::default_cache_path;
use errand::engine::relay::RelayEngine;
use errand::engine::{Engine, InboundRequest};
use errand::server::{self, AppState};

#[derive(Parser)]
#[command(name = "errand", version, about = "Send a request on an errand, serve what comes back.")]
struct Cli {
    /// Defaults to `serve`, configured from the environment
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve HTTP, turning every request into a task run
    Serve {
        #[command(flatten)]
        settings: Settings,
    },
    /// Run the pipeline once for a synthetic request and print the result
    Run {
        #[command(flatten)]
        settings: Settings,

        /// HTTP method of the synthetic request
        method: String,

        /// Path (and optional query) of the synthetic request
        path: String,

        /// Raw request body
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Delete expired cache entries
    PurgeCache {
        /// SQLite path of the response cache
        #[arg(long, env = "ERRAND_CACHE_DB")]
        cache_db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => serve(Settings::from_env()?).await,
        Some(Command::Serve { settings }) => serve(settings).await,
        Some(Command::Run {
            settings,
            method,
            path,
            body,
        }) => run_once(settings, method, path, body).await,
        Some(Command::PurgeCache { cache_db }) => {
            let cache = open_cache(cache_db)?;
            let removed = cache.purge_expired().await?;
            println!("removed {removed} expired cache entries");
            Ok(())
        }
    }
}

fn build_engine(settings: &Settings) -> anyhow::Result<Arc<dyn Engine>> {
    settings.validate()?;
    let backend = Arc::new(HttpBackend::new(settings.backend_config()));
    Ok(Arc::new(RelayEngine::new(backend, settings.relay_config())))
}

fn open_cache(path: Option<PathBuf>) -> anyhow::Result<SqliteCache> {
    let path = path.unwrap_or_else(default_cache_path);
    let path = path
        .to_str()
        .with_context(|| format!("cache path is not valid UTF-8: {}", path.display()))?;
    SqliteCache::open(path)
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let engine = build_engine(&settings)?;

    let cache: Option<Arc<dyn ResponseCache>> = if settings.no_cache {
        None
    } else {
        Some(Arc::new(open_cache(settings.cache_db.clone())?))
    };

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        engine,
        cache,
        cache_ttl: settings.cache_ttl(),
        shutdown: shutdown.clone(),
    });

    let listener = TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;

    let cache_enabled = !settings.no_cache;
    info!(
        listen = %settings.listen,
        profile = %settings.profile,
        task = %settings.task_name,
        cache = cache_enabled,
        "errand listening"
    );

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("shutting down, cancelling in-flight runs");
                shutdown.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    server::serve(listener, state).await?;
    Ok(())
}

async fn run_once(
    settings: Settings,
    method: String,
    path: String,
    body: String,
) -> anyhow::Result<()> {
    let engine = build_engine(&settings)?;

    let uri: Uri = path
        .parse()
        .with_context(|| format!("invalid request path: {path}"))?;
    let request = InboundRequest {
        method: method.to_uppercase(),
        path: uri.path().to_string(),
        query: server::query_map(&uri),
        geo: String::new(),
        body,
    };

    let cancel = CancellationToken::new();

    // Ctrl+C abandons the run instead of leaving it polling
    let rendered = tokio::select! {
        result = engine.handle(&request, &cancel) => result?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            anyhow::bail!("interrupted");
        }
    };

    println!("content-type: {}\n", rendered.media_type);
    println!("{}", rendered.body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_defaults_to_serve() {
        let cli = Cli::try_parse_from(["errand"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn purge_cache_takes_a_path() {
        let cli = Cli::try_parse_from(["errand", "purge-cache", "--cache-db", "/tmp/c.db"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::PurgeCache { cache_db: Some(ref p) }) if p == &PathBuf::from("/tmp/c.db")
        ));
    }
}
