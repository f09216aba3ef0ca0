use crate::coordinator::error::ValidationError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

pub type EnvId = u32;

const MAX_OVERRIDE_KEY: usize = 64;
const MAX_OVERRIDE_STRING: usize = 1024;

/// A tagged value inside an override map -- string, number, or bool, never
/// an array or nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

pub type Overrides = HashMap<String, OverrideValue>;

fn validate_overrides(overrides: &Overrides) -> Result<(), ValidationError> {
    for (key, value) in overrides {
        if key.len() > MAX_OVERRIDE_KEY {
            return Err(ValidationError::on(
                "overrides",
                format!("key '{key}' exceeds {MAX_OVERRIDE_KEY} bytes"),
            ));
        }
        if let OverrideValue::Text(text) = value {
            if text.len() > MAX_OVERRIDE_STRING {
                return Err(ValidationError::on(
                    "overrides",
                    format!("value for '{key}' exceeds {MAX_OVERRIDE_STRING} bytes"),
                ));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// A single submission from an environment: a group of scored, tokenised
/// sequences. Cardinality is `tokens.len()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoredGroup {
    #[serde(default)]
    pub tokens: Vec<Vec<u32>>,
    #[serde(default)]
    pub masks: Vec<Vec<i64>>,
    #[serde(default)]
    pub scores: Vec<f64>,
    #[serde(default)]
    pub advantages: Option<Vec<f64>>,
    #[serde(default)]
    pub ref_logprobs: Option<Vec<f64>>,
    #[serde(default)]
    pub inference_logprobs: Option<Vec<f64>>,
    #[serde(default)]
    pub messages: Option<Vec<Vec<Message>>>,
    #[serde(default)]
    pub generation_params: Option<serde_json::Value>,
    #[serde(default)]
    pub group_overrides: Option<Overrides>,
    #[serde(default)]
    pub overrides: Option<Vec<Overrides>>,
    #[serde(default)]
    pub images: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub env_id: Option<EnvId>,
}

impl ScoredGroup {
    pub fn cardinality(&self) -> usize {
        self.tokens.len()
    }

    /// Checks every parallel-array invariant from the data model. Called
    /// right after deserialization -- never deferred to assembly time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let n = self.tokens.len();
        if self.masks.len() != n {
            return Err(ValidationError::on(
                "masks",
                format!("expected {n} mask rows, got {}", self.masks.len()),
            ));
        }
        for (i, (seq, mask)) in self.tokens.iter().zip(self.masks.iter()).enumerate() {
            if seq.len() != mask.len() {
                return Err(ValidationError::on(
                    "masks",
                    format!(
                        "sequence {i} has {} tokens but mask has {} entries",
                        seq.len(),
                        mask.len()
                    ),
                ));
            }
        }
        if self.scores.len() != n {
            return Err(ValidationError::on(
                "scores",
                format!("expected {n} scores, got {}", self.scores.len()),
            ));
        }
        if let Some(advantages) = &self.advantages {
            if advantages.len() != n {
                return Err(ValidationError::on(
                    "advantages",
                    format!("expected {n} advantages, got {}", advantages.len()),
                ));
            }
        }
        if let Some(ref_logprobs) = &self.ref_logprobs {
            if ref_logprobs.len() != n {
                return Err(ValidationError::on(
                    "ref_logprobs",
                    format!("expected {n} ref_logprobs, got {}", ref_logprobs.len()),
                ));
            }
        }
        if let Some(inference_logprobs) = &self.inference_logprobs {
            if inference_logprobs.len() != n {
                return Err(ValidationError::on(
                    "inference_logprobs",
                    format!(
                        "expected {n} inference_logprobs, got {}",
                        inference_logprobs.len()
                    ),
                ));
            }
        }
        if let Some(messages) = &self.messages {
            if messages.len() != n {
                return Err(ValidationError::on(
                    "messages",
                    format!("expected {n} message lists, got {}", messages.len()),
                ));
            }
        }
        if let Some(overrides) = &self.overrides {
            if overrides.len() != n {
                return Err(ValidationError::on(
                    "overrides",
                    format!("expected {n} override maps, got {}", overrides.len()),
                ));
            }
            for o in overrides {
                validate_overrides(o)?;
            }
        }
        if let Some(images) = &self.images {
            if images.len() != n {
                return Err(ValidationError::on(
                    "images",
                    format!("expected {n} image entries, got {}", images.len()),
                ));
            }
        }
        if let Some(env_id) = self.env_id {
            if env_id > 65535 {
                return Err(ValidationError::on("env_id", "must be in [0, 65535]"));
            }
        }
        if let Some(group_overrides) = &self.group_overrides {
            validate_overrides(group_overrides)?;
        }
        Ok(())
    }
}

/// An environment's self-description, fixed at `/register-env` time save for
/// `group_size` (which the coordinator may raise, see `FairShareReporter`).
#[derive(Debug, Clone)]
pub struct EnvironmentDescriptor {
    pub registered_id: EnvId,
    pub desired_name: String,
    pub real_name: String,
    pub max_context_len: u32,
    pub weight: f64,
    pub group_size: u32,
    pub min_batch_allocation: Option<f64>,
    pub connected: bool,
}

/// The trainer's run parameters, replaced wholesale by `/register` while the
/// queue is empty and otherwise immutable (see `RunController::register`).
#[derive(Debug, Clone, Default)]
pub struct RunDescriptor {
    pub run_group: String,
    pub run_project: String,
    pub batch_size: u32,
    pub max_token_len: u32,
    pub starting_step: i64,
    pub num_steps: i64,
    pub save_checkpoint_interval: i64,
    pub checkpoint_dir: String,
    pub current_step: i64,
    pub started: bool,
}

pub type Batch = Vec<ScoredGroup>;

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_group() -> ScoredGroup {
        ScoredGroup {
            tokens: vec![vec![1, 2], vec![3]],
            masks: vec![vec![-100, 1], vec![1]],
            scores: vec![0.5, -0.5],
            ..Default::default()
        }
    }

    #[test]
    fn well_formed_group_validates() {
        assert!(valid_group().validate().is_ok());
    }

    #[test]
    fn cardinality_is_sequence_count() {
        assert_eq!(valid_group().cardinality(), 2);
    }

    #[test]
    fn mismatched_scores_length_is_rejected() {
        let mut group = valid_group();
        group.scores.pop();
        assert!(group.validate().is_err());
    }

    #[test]
    fn mismatched_mask_row_length_is_rejected() {
        let mut group = valid_group();
        group.masks[0].pop();
        assert!(group.validate().is_err());
    }

    #[test]
    fn env_id_above_max_is_rejected() {
        let mut group = valid_group();
        group.env_id = Some(65536);
        assert!(group.validate().is_err());
    }

    #[test]
    fn override_key_over_length_limit_is_rejected() {
        let mut group = valid_group();
        let mut overrides = Overrides::new();
        overrides.insert("x".repeat(MAX_OVERRIDE_KEY + 1), OverrideValue::Bool(true));
        group.group_overrides = Some(overrides);
        assert!(group.validate().is_err());
    }

    #[test]
    fn zero_value_scored_group_is_the_default() {
        let zero = ScoredGroup::default();
        assert_eq!(zero.cardinality(), 0);
        assert!(zero.validate().is_ok());
    }
}
