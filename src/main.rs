use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use bloodboard_server::{
    auth::{run_sweep_loop, watch_sweeper},
    configure_routes, AppError, AppState, Settings,
};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> bloodboard_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Expired sessions are reclaimed on a fixed cadence, independent of traffic
    let sweeper = tokio::spawn(run_sweep_loop(
        state.auth_service.clone(),
        config.auth.sweep_interval_secs,
    ));
    let stop_sweeper = sweeper.abort_handle();
    tokio::spawn(watch_sweeper(sweeper));

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Server is running on http://{}:{}", config.server.host, config.server.port);

    let app_state = state.clone();
    let cors_config = config.cors.clone();
    let result = HttpServer::new(move || {
        let cors = if cors_config.enabled {
            let cors = if cors_config.allow_any_origin {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
            } else {
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_origin("http://127.0.0.1:3000")
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
            };
            cors.max_age(cors_config.max_age as usize)
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()));

    stop_sweeper.abort();
    state.shutdown().await?;

    result
}
