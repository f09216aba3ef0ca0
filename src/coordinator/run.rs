use crate::coordinator::error::ValidationError;
use crate::coordinator::model::RunDescriptor;
use serde::Deserialize;

const MAX_BATCH_SIZE: u32 = 1024;
const MAX_TOKEN_LEN: u32 = 131_072;

#[derive(Debug, Deserialize)]
pub struct RegisterTrainerRequest {
    pub run_group: String,
    pub run_project: String,
    pub batch_size: u32,
    pub max_token_len: u32,
    pub starting_step: i64,
    pub num_steps: i64,
    pub save_checkpoint_interval: i64,
    pub checkpoint_dir: String,
}

impl RegisterTrainerRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ValidationError::on(
                "batch_size",
                format!("must be in [1, {MAX_BATCH_SIZE}]"),
            ));
        }
        if !(1..=MAX_TOKEN_LEN).contains(&self.max_token_len) {
            return Err(ValidationError::on(
                "max_token_len",
                format!("must be in [1, {MAX_TOKEN_LEN}]"),
            ));
        }
        Ok(())
    }
}

/// Holds the live run's parameters, the trainer uuids that have attached to
/// it, and the one-way `started` flag. `register` is the only place run
/// parameters change; everywhere else treats them as read-only.
#[derive(Debug, Default)]
pub struct RunController {
    pub run: RunDescriptor,
    pub trainer_ids: Vec<String>,
}

impl RunController {
    /// Registers a trainer against an empty queue (fresh run, parameters
    /// authoritative) or a non-empty one (additional replica, parameters
    /// ignored). Returns the uuid to hand back to the caller.
    pub fn register(&mut self, req: RegisterTrainerRequest, queue_is_empty: bool) -> String {
        let uuid = uuid::Uuid::new_v4().to_string();
        if queue_is_empty {
            self.run = RunDescriptor {
                run_group: req.run_group,
                run_project: req.run_project,
                batch_size: req.batch_size,
                max_token_len: req.max_token_len,
                starting_step: req.starting_step,
                num_steps: req.num_steps,
                save_checkpoint_interval: req.save_checkpoint_interval,
                checkpoint_dir: req.checkpoint_dir,
                current_step: req.starting_step,
                started: false,
            };
            self.trainer_ids = vec![uuid.clone()];
        } else {
            self.trainer_ids.push(uuid.clone());
        }
        uuid
    }

    /// Flips `started` to true. A no-op after the first call, per spec: the
    /// transition happens exactly once per run.
    pub fn mark_started(&mut self) {
        self.run.started = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(batch_size: u32) -> RegisterTrainerRequest {
        RegisterTrainerRequest {
            run_group: "a".into(),
            run_project: "p".into(),
            batch_size,
            max_token_len: 256,
            starting_step: 0,
            num_steps: 10,
            save_checkpoint_interval: 5,
            checkpoint_dir: "/tmp".into(),
        }
    }

    #[test]
    fn empty_queue_register_replaces_run_state() {
        let mut ctrl = RunController::default();
        ctrl.register(req(4), true);
        assert_eq!(ctrl.run.batch_size, 4);
        assert_eq!(ctrl.trainer_ids.len(), 1);
    }

    #[test]
    fn nonempty_queue_register_only_appends_a_trainer_id() {
        let mut ctrl = RunController::default();
        ctrl.register(req(4), true);
        let second = ctrl.register(req(999), false);
        assert_eq!(ctrl.run.batch_size, 4, "params must stay from the first register");
        assert_eq!(ctrl.trainer_ids.len(), 2);
        assert_eq!(ctrl.trainer_ids[1], second);
    }

    #[test]
    fn validate_rejects_batch_size_out_of_range() {
        assert!(req(0).validate().is_err());
        assert!(req(1025).validate().is_err());
        assert!(req(4).validate().is_ok());
    }
}
