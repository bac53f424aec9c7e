use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelcue_api::{
    config::{Config, GeneratorProvider},
    create_router,
    db::{create_redis_client, Cache, CacheWriterHandle},
    services::{
        catalog::{CatalogSearch, TmdbCatalog},
        generator::{GeminiGenerator, GeneratorClient, OpenAiGenerator, TextGenerator},
        quiz::spawn_expiry_sweeper,
        resolver::ImageUrls,
        CatalogResolver, QuizService, RecommendationPipeline, ResolutionAggregator, SessionStore,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelcue_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let (cache, writer) = Cache::new(create_redis_client(url)?);
            tracing::info!("Catalog cache enabled");
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, catalog cache disabled");
            (None, None)
        }
    };

    let backend: Arc<dyn TextGenerator> = match config.generator_provider {
        GeneratorProvider::Gemini => Arc::new(GeminiGenerator::new(
            config.generator_api_key.clone(),
            config.generator_api_url.clone(),
            config.generator_model.clone(),
        )),
        GeneratorProvider::Openai => Arc::new(OpenAiGenerator::new(
            config.generator_api_key.clone(),
            config.generator_api_url.clone(),
            config.generator_model.clone(),
        )),
    };

    let catalog: Arc<dyn CatalogSearch> = Arc::new(TmdbCatalog::new(
        config.catalog_api_key.clone(),
        config.catalog_api_url.clone(),
        cache,
    ));

    let resolver = CatalogResolver::new(
        catalog.clone(),
        config.catalog_locale.clone(),
        ImageUrls::new(config.catalog_image_base_url.clone()),
        config.match_policy(),
    );
    let mut aggregator = ResolutionAggregator::new(Arc::new(resolver));
    if let Some(max) = config.max_concurrent_lookups {
        aggregator = aggregator.with_max_concurrent(max);
    }

    let pipeline = RecommendationPipeline::new(GeneratorClient::new(backend.clone()), aggregator);

    let ttl = config.session_ttl();
    let sessions = SessionStore::new(chrono::Duration::from_std(ttl)?);
    let sweeper = spawn_expiry_sweeper(sessions.clone(), ttl.min(Duration::from_secs(60)));

    let state = AppState::new(
        pipeline.clone(),
        QuizService::new(sessions, pipeline),
        catalog.clone(),
        config.catalog_locale.clone(),
    );
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        %address,
        generator = backend.name(),
        catalog = catalog.name(),
        policy = ?config.match_policy(),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    flush_cache(cache_writer).await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn flush_cache(writer: Option<CacheWriterHandle>) {
    if let Some(writer) = writer {
        tracing::info!("Flushing pending cache writes");
        writer.shutdown().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
