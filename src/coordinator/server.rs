use crate::coordinator::handlers;
use crate::coordinator::state::CoordinatorState;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Mutex;

pub struct Server;

/// Registers every route from spec.md §6 onto an `actix_web::App`. Shared
/// between the real `run()` below and the `actix_web::test` harness, so the
/// routing table under test is exactly the one that serves traffic.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::banner))
        .route("/register", web::post().to(handlers::register))
        .route("/register-env", web::post().to(handlers::register_env))
        .route(
            "/disconnect-env",
            web::post().to(handlers::disconnect_env),
        )
        .route("/run_info", web::get().to(handlers::run_info))
        .route("/info", web::get().to(handlers::info))
        .route("/batch", web::get().to(handlers::batch))
        .route(
            "/latest_example",
            web::get().to(handlers::latest_example),
        )
        .route("/scored_data", web::post().to(handlers::scored_data))
        .route(
            "/scored_data_list",
            web::post().to(handlers::scored_data_list),
        )
        .route("/status", web::get().to(handlers::status))
        .route("/status-env", web::get().to(handlers::status_env))
        .route("/reset_data", web::get().to(handlers::reset_data))
        .route("/health", web::get().to(handlers::health));
}

impl Server {
    pub async fn run(port: u16) -> Result<(), std::io::Error> {
        let state = web::Data::new(Mutex::new(CoordinatorState::default()));
        log::info!("starting rollout coordinator on port {port}");
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}
