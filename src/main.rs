use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{get, App, HttpServer, Responder};
use dotenvy::dotenv;
use std::sync::Arc;

use sams::config::Config;
use sams::db::init_db;
use sams::docs::ApiDoc;
use sams::engine::{AnnouncementService, AttendanceEngine};
use sams::routes;
use sams::store::MySqlStore;
use sams::utils::day_filter;
use sams::utils::name_cache;

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "School Attendance Management Service"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        // Seed the duplicate-check-in fast path with the last 30 days
        if let Err(e) = day_filter::warmup_day_filter(&pool_for_filter_warmup, 30, 250).await {
            eprintln!("Failed to warmup day filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        if let Err(e) = name_cache::warmup_name_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup name cache: {:?}", e);
        }
    });

    let store = Arc::new(MySqlStore::new(pool.clone()));
    let engine = AttendanceEngine::new(Arc::clone(&store), config.attendance_policy());
    let announcements = AnnouncementService::new(Arc::clone(&store), config.page_size);

    // Fold confirmed ledger writes back into the local projection
    actix_web::rt::spawn(engine.clone().run_reconciler());

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let store_data = Data::from(store);
    let engine_data = Data::new(engine);
    let announcements_data = Data::new(announcements);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store_data.clone())
            .app_data(engine_data.clone())
            .app_data(announcements_data.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure::<MySqlStore>(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
