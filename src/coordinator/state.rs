use crate::coordinator::assemble;
use crate::coordinator::env::DisconnectResult;
use crate::coordinator::env::EnvRegistry;
use crate::coordinator::env::RegisterEnvRequest;
use crate::coordinator::error::CoordinatorError;
use crate::coordinator::fairshare;
use crate::coordinator::model::EnvId;
use crate::coordinator::model::ScoredGroup;
use crate::coordinator::queue::GroupStore;
use crate::coordinator::regroup::RegroupBuffer;
use crate::coordinator::regroup::RegroupOutcome;
use crate::coordinator::response::BatchResponse;
use crate::coordinator::response::HealthResponse;
use crate::coordinator::response::InfoResponse;
use crate::coordinator::response::RegisterEnvResponse;
use crate::coordinator::response::RunInfoResponse;
use crate::coordinator::response::ScoredListResponse;
use crate::coordinator::response::ScoredResponse;
use crate::coordinator::response::StatusResponse;
use crate::coordinator::run::RegisterTrainerRequest;
use crate::coordinator::run::RunController;

/// The whole coordinator: one mutex-guarded struct, owned exclusively by
/// the process, mutated only through the methods below. Every handler in
/// `handlers.rs` locks this once and runs to completion -- see spec.md §5.
#[derive(Debug, Default)]
pub struct CoordinatorState {
    run: RunController,
    envs: EnvRegistry,
    queue: GroupStore,
    regroup: RegroupBuffer,
    /// Batches `assemble()` produced but `/batch` hasn't served yet, popped
    /// LIFO -- see the "LIFO batch pop" open question in spec.md §9.
    cached_batches: Vec<Vec<ScoredGroup>>,
}

impl CoordinatorState {
    pub fn register_trainer(&mut self, req: RegisterTrainerRequest) -> String {
        let queue_is_empty = self.queue.len() == 0;
        let uuid = self.run.register(req, queue_is_empty);
        if queue_is_empty {
            self.envs.reset();
            self.regroup.reset();
            self.cached_batches.clear();
        }
        uuid
    }

    pub fn run_info(&self) -> RunInfoResponse {
        RunInfoResponse {
            group: self.run.run.run_group.clone(),
            project: self.run.run.run_project.clone(),
        }
    }

    pub fn info(&self) -> InfoResponse {
        InfoResponse {
            batch_size: self.run.run.batch_size,
            max_token_len: self.run.run.max_token_len,
        }
    }

    pub fn register_env(
        &mut self,
        req: RegisterEnvRequest,
    ) -> Result<RegisterEnvResponse, CoordinatorError> {
        if !self.run.run.started {
            return Ok(RegisterEnvResponse::Waiting {
                status: "wait for trainer to start",
            });
        }
        let env_id = self.envs.register(req);
        let env = self
            .envs
            .get(env_id)
            .ok_or_else(|| anyhow::anyhow!("just-registered env_id {env_id} must exist"))?;
        Ok(RegisterEnvResponse::Registered {
            status: "success",
            env_id,
            run_name: env.real_name.clone(),
            checkpoint_dir: self.run.run.checkpoint_dir.clone(),
            starting_step: self.run.run.starting_step,
            checkpoint_interval: self.run.run.save_checkpoint_interval,
            num_steps: self.run.run.num_steps,
        })
    }

    pub fn disconnect_env(&mut self, env_id: EnvId) -> DisconnectResult {
        self.envs.disconnect(env_id)
    }

    /// Ingests one submission: exact-size groups and groups from unknown
    /// envs go straight to the queue; everything else routes through the
    /// regroup buffer. See spec.md §4.3.
    pub fn process_scored(&mut self, group: ScoredGroup) -> ScoredResponse {
        let descriptor = group.env_id.and_then(|id| {
            self.envs
                .get(id)
                .map(|env| (id, env.group_size))
        });
        match descriptor {
            None => {
                let status = if group.env_id.is_some() {
                    "received"
                } else {
                    "accepted"
                };
                self.queue.push(group);
                ScoredResponse {
                    status,
                    buffer_size: None,
                }
            }
            Some((_, expected)) if group.cardinality() as u32 == expected => {
                self.queue.push(group);
                ScoredResponse {
                    status: "received",
                    buffer_size: None,
                }
            }
            Some((env_id, expected)) => match self.regroup.submit(env_id, group, expected) {
                RegroupOutcome::Flushed {
                    groups,
                    remaining_buffer_size,
                } => {
                    for flushed in groups {
                        self.queue.push(flushed);
                    }
                    ScoredResponse {
                        status: "buffered",
                        buffer_size: Some(remaining_buffer_size),
                    }
                }
                RegroupOutcome::Buffered { buffer_size } => ScoredResponse {
                    status: "buffered",
                    buffer_size: Some(buffer_size),
                },
            },
        }
    }

    pub fn process_scored_list(&mut self, groups: Vec<ScoredGroup>) -> ScoredListResponse {
        let mut groups_processed = 0usize;
        let mut buffered = 0usize;
        let mut last_buffer_size = None;
        for group in groups {
            if group.validate().is_err() {
                continue;
            }
            groups_processed += 1;
            let response = self.process_scored(group);
            if response.status == "buffered" {
                buffered += 1;
                last_buffer_size = response.buffer_size;
            }
        }
        ScoredListResponse {
            status: "received",
            groups_processed,
            buffered: (buffered > 0).then_some(buffered),
            last_buffer_size,
        }
    }

    /// Flips `started` on the first call, serves a cached remainder if one
    /// exists, otherwise calls the assembler and caches whatever it didn't
    /// hand back this time. See spec.md §4.4.
    pub fn serve_batch(&mut self) -> BatchResponse {
        self.run.mark_started();
        if let Some(batch) = self.cached_batches.pop() {
            return BatchResponse { batch: Some(batch) };
        }
        let snapshot = self.queue.take();
        let (mut batches, remainder) =
            assemble::assemble(snapshot, self.envs.as_slice(), self.run.run.batch_size);
        self.queue.restore(remainder);
        if batches.is_empty() {
            return BatchResponse { batch: None };
        }
        self.run.run.current_step += batches.len() as i64;
        let last = batches.pop().expect("checked non-empty above");
        self.cached_batches = batches;
        BatchResponse { batch: Some(last) }
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            current_step: self.run.run.current_step,
            queue_size: self.queue.len(),
        }
    }

    pub fn status_env(&mut self, env_id: EnvId) -> fairshare::FairShareStatus {
        fairshare::status_env(
            &mut self.envs,
            self.queue.iter(),
            env_id,
            self.run.run.current_step,
        )
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy",
            started: self.run.run.started,
            queue_size: self.queue.len(),
            envs: self.envs.len(),
            step: self.run.run.current_step,
        }
    }

    pub fn latest_example(&self) -> ScoredGroup {
        self.queue.latest().cloned().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.run = RunController::default();
        self.envs.reset();
        self.queue.reset();
        self.regroup.reset();
        self.cached_batches.clear();
    }
}
