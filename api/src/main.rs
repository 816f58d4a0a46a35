use actix_web::{web, HttpServer};
use dotenvy::dotenv;
use log::info;
use std::env;
use std::sync::Arc;

use tlc_api::app::{create_app, AppState};
use tlc_core::services::{CollectorManager, StaticContextResolver};
use tlc_infra::FsEntityWriter;
use tlc_shared::{CollectorContext, ServerConfig, StorageConfig, TokenConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting timeline collector");

    // Load configuration
    let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let server_port = env::var("SERVER_PORT")
        .unwrap_or_else(|_| "8188".to_string())
        .parse::<u16>()
        .expect("SERVER_PORT must be a valid port number");
    let server_config = ServerConfig::new(server_host, server_port);

    let storage_root =
        env::var("TIMELINE_STORAGE_ROOT").unwrap_or_else(|_| "/tmp/timeline-collector".to_string());
    let cluster_id = env::var("TIMELINE_CLUSTER_ID").unwrap_or_else(|_| "cluster".to_string());
    let storage_config = StorageConfig::new(storage_root, cluster_id);

    let token_config = TokenConfig::from_env();

    // Context handed to applications until a node-manager channel exists
    let default_user = env::var("TIMELINE_DEFAULT_USER").unwrap_or_else(|_| "timeline".to_string());
    let default_context = CollectorContext::new(default_user, "default_flow", "1", 1);

    // Wire up the collector services
    let manager = Arc::new(CollectorManager::new(
        token_config,
        Arc::new(StaticContextResolver::new(default_context)),
    ));
    let writer = Arc::new(FsEntityWriter::new(storage_config));

    let app_state = web::Data::new(AppState {
        manager: Arc::clone(&manager),
        writer,
    });

    let bind_address = server_config.bind_address();
    info!("Server will bind to: {}", bind_address);

    let result = HttpServer::new(move || create_app(app_state.clone()))
        .bind(&bind_address)?
        .run()
        .await;

    // Deactivate collectors and cancel outstanding tokens before exit
    manager.stop().await;

    result
}
