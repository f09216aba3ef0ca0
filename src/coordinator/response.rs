use crate::coordinator::model::Batch;
use crate::coordinator::model::EnvId;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RegisterTrainerResponse {
    pub uuid: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterEnvResponse {
    Waiting {
        status: &'static str,
    },
    Registered {
        status: &'static str,
        env_id: EnvId,
        run_name: String,
        checkpoint_dir: String,
        starting_step: i64,
        checkpoint_interval: i64,
        num_steps: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct RunInfoResponse {
    pub group: String,
    pub project: String,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub batch_size: u32,
    pub max_token_len: u32,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub batch: Option<Batch>,
}

#[derive(Debug, Serialize)]
pub struct ScoredResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScoredListResponse {
    pub status: &'static str,
    pub groups_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_buffer_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub current_step: i64,
    pub queue_size: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub started: bool,
    pub queue_size: usize,
    pub envs: usize,
    pub step: i64,
}
