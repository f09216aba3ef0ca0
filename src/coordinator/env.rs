use crate::coordinator::error::ValidationError;
use crate::coordinator::model::EnvId;
use crate::coordinator::model::EnvironmentDescriptor;
use serde::Deserialize;
use serde::Serialize;

const MAX_GROUP_SIZE: u32 = 1024;
const MAX_CONTEXT_LEN: u32 = 131_072;
const MAX_WEIGHT: f64 = 100.0;

#[derive(Debug, Deserialize)]
pub struct RegisterEnvRequest {
    pub max_token_length: u32,
    pub desired_name: String,
    #[serde(default)]
    pub weight: Option<f64>,
    pub group_size: u32,
    #[serde(default)]
    pub min_batch_allocation: Option<f64>,
}

impl RegisterEnvRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_GROUP_SIZE).contains(&self.group_size) {
            return Err(ValidationError::on(
                "group_size",
                format!("must be in [1, {MAX_GROUP_SIZE}]"),
            ));
        }
        if !(1..=MAX_CONTEXT_LEN).contains(&self.max_token_length) {
            return Err(ValidationError::on(
                "max_token_length",
                format!("must be in [1, {MAX_CONTEXT_LEN}]"),
            ));
        }
        if let Some(weight) = self.weight {
            if !(weight > 0.0 && weight <= MAX_WEIGHT) {
                return Err(ValidationError::on(
                    "weight",
                    format!("must be in (0, {MAX_WEIGHT}]"),
                ));
            }
        }
        if let Some(min) = self.min_batch_allocation {
            if !(0.0..=1.0).contains(&min) {
                return Err(ValidationError::on(
                    "min_batch_allocation",
                    "must be in [0, 1]",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct DisconnectResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only table of environment descriptors. `registered_id` is always
/// the index into `envs` -- descriptors are never reordered or removed.
#[derive(Debug, Default)]
pub struct EnvRegistry {
    envs: Vec<EnvironmentDescriptor>,
}

impl EnvRegistry {
    pub fn get(&self, env_id: EnvId) -> Option<&EnvironmentDescriptor> {
        self.envs.get(env_id as usize)
    }

    pub fn get_mut(&mut self, env_id: EnvId) -> Option<&mut EnvironmentDescriptor> {
        self.envs.get_mut(env_id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentDescriptor> {
        self.envs.iter()
    }

    pub fn as_slice(&self) -> &[EnvironmentDescriptor] {
        &self.envs
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn register(&mut self, req: RegisterEnvRequest) -> EnvId {
        let registered_id = self.envs.len() as EnvId;
        let prior = self
            .envs
            .iter()
            .filter(|e| e.desired_name == req.desired_name)
            .count();
        let real_name = format!("{}_{}", req.desired_name, prior);
        self.envs.push(EnvironmentDescriptor {
            registered_id,
            desired_name: req.desired_name,
            real_name,
            max_context_len: req.max_token_length,
            weight: req.weight.unwrap_or(1.0),
            group_size: req.group_size,
            min_batch_allocation: req.min_batch_allocation,
            connected: true,
        });
        registered_id
    }

    pub fn disconnect(&mut self, env_id: EnvId) -> DisconnectResult {
        match self.get_mut(env_id) {
            Some(env) => {
                env.connected = false;
                DisconnectResult {
                    status: "success",
                    error: None,
                }
            }
            None => DisconnectResult {
                status: "failure",
                error: Some(format!("env_id {env_id} out of range")),
            },
        }
    }

    pub fn reset(&mut self) {
        self.envs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(desired_name: &str) -> RegisterEnvRequest {
        RegisterEnvRequest {
            max_token_length: 256,
            desired_name: desired_name.to_string(),
            weight: None,
            group_size: 4,
            min_batch_allocation: None,
        }
    }

    #[test]
    fn repeated_names_get_a_disambiguating_suffix() {
        let mut registry = EnvRegistry::default();
        let a = registry.register(req("tictactoe"));
        let b = registry.register(req("tictactoe"));
        let c = registry.register(req("other"));
        assert_eq!(registry.get(a).unwrap().real_name, "tictactoe_0");
        assert_eq!(registry.get(b).unwrap().real_name, "tictactoe_1");
        assert_eq!(registry.get(c).unwrap().real_name, "other_0");
    }

    #[test]
    fn registered_id_is_the_vector_index() {
        let mut registry = EnvRegistry::default();
        let a = registry.register(req("x"));
        let b = registry.register(req("y"));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn disconnect_is_idempotent_and_rejects_out_of_range() {
        let mut registry = EnvRegistry::default();
        let a = registry.register(req("x"));
        assert_eq!(registry.disconnect(a).status, "success");
        assert_eq!(registry.disconnect(a).status, "success");
        assert_eq!(registry.disconnect(99).status, "failure");
        assert!(!registry.get(a).unwrap().connected);
    }

    #[test]
    fn validate_rejects_out_of_range_weight_and_allocation() {
        let mut bad = req("x");
        bad.weight = Some(0.0);
        assert!(bad.validate().is_err());

        let mut bad = req("x");
        bad.min_batch_allocation = Some(1.5);
        assert!(bad.validate().is_err());

        let mut bad = req("x");
        bad.group_size = 0;
        assert!(bad.validate().is_err());
    }
}
