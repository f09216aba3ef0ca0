use crate::coordinator::env::RegisterEnvRequest;
use crate::coordinator::error::ValidationError;
use crate::coordinator::model::EnvId;
use crate::coordinator::model::ScoredGroup;
use crate::coordinator::response::RegisterTrainerResponse;
use crate::coordinator::run::RegisterTrainerRequest;
use crate::coordinator::state::CoordinatorState;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use serde::Deserialize;
use std::sync::Mutex;

pub type Shared = web::Data<Mutex<CoordinatorState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, CoordinatorState> {
    state.lock().expect("coordinator mutex poisoned")
}

fn max_env_id(env_id: EnvId) -> Result<(), ValidationError> {
    if env_id > 65535 {
        Err(ValidationError::on("env_id", "must be in [0, 65535]"))
    } else {
        Ok(())
    }
}

pub async fn banner() -> impl Responder {
    HttpResponse::Ok().body("atropos rollout coordinator")
}

pub async fn register(
    state: Shared,
    req: web::Json<RegisterTrainerRequest>,
) -> actix_web::Result<impl Responder> {
    let req = req.into_inner();
    req.validate()?;
    let uuid = lock(&state).register_trainer(req);
    Ok(HttpResponse::Ok().json(RegisterTrainerResponse { uuid }))
}

pub async fn register_env(
    state: Shared,
    req: web::Json<RegisterEnvRequest>,
) -> actix_web::Result<impl Responder> {
    let req = req.into_inner();
    req.validate()?;
    let response = lock(&state).register_env(req)?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
pub struct DisconnectEnvRequest {
    pub env_id: EnvId,
}

pub async fn disconnect_env(
    state: Shared,
    req: web::Json<DisconnectEnvRequest>,
) -> actix_web::Result<impl Responder> {
    max_env_id(req.env_id)?;
    let response = lock(&state).disconnect_env(req.env_id);
    Ok(HttpResponse::Ok().json(response))
}

pub async fn run_info(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).run_info())
}

pub async fn info(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).info())
}

pub async fn batch(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).serve_batch())
}

pub async fn latest_example(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).latest_example())
}

pub async fn scored_data(
    state: Shared,
    req: web::Json<ScoredGroup>,
) -> actix_web::Result<impl Responder> {
    let group = req.into_inner();
    group.validate()?;
    let response = lock(&state).process_scored(group);
    Ok(HttpResponse::Ok().json(response))
}

pub async fn scored_data_list(
    state: Shared,
    req: web::Json<Vec<ScoredGroup>>,
) -> impl Responder {
    let response = lock(&state).process_scored_list(req.into_inner());
    HttpResponse::Ok().json(response)
}

pub async fn status(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).status())
}

#[derive(Debug, Deserialize)]
pub struct StatusEnvQuery {
    pub env_id: EnvId,
}

pub async fn status_env(
    state: Shared,
    query: web::Query<StatusEnvQuery>,
) -> actix_web::Result<impl Responder> {
    max_env_id(query.env_id)?;
    let response = lock(&state).status_env(query.env_id);
    Ok(HttpResponse::Ok().json(response))
}

pub async fn reset_data(state: Shared) -> impl Responder {
    lock(&state).reset();
    HttpResponse::Ok().body("Reset successful")
}

pub async fn health(state: Shared) -> impl Responder {
    HttpResponse::Ok().json(lock(&state).health())
}
