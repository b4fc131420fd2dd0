//! Policy loading at the cs-core boundary.
//!
//! Wraps `cs_config` so callers only ever see [`cs_common::Error`].

use cs_common::{Error, Result};
use cs_config::{LoadedPolicy, Policy, ValidationError};
use std::path::Path;
use tracing::field::display;

use crate::log_event;
use crate::logging::{event_names, Stage};

/// Convert a config validation error into the unified error type.
pub fn policy_error(err: ValidationError) -> Error {
    match err {
        ValidationError::IoError(msg) => Error::Config(msg),
        other => Error::InvalidPolicy(other.to_string()),
    }
}

/// Resolve, parse and validate the policy.
pub fn load_policy(cli_policy: Option<&Path>) -> Result<LoadedPolicy> {
    match cs_config::load_policy(cli_policy) {
        Ok(loaded) => {
            match &loaded.paths.policy {
                Some(path) => log_event!(
                    INFO,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "policy loaded",
                    path = display(path.display()),
                    source = display(&loaded.paths.policy_source),
                    model = display(loaded.policy.estimator.model)
                ),
                None => log_event!(
                    DEBUG,
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "no policy file found, using built-in defaults"
                ),
            }
            Ok(loaded)
        }
        Err(err) => {
            log_event!(
                ERROR,
                event_names::CONFIG_ERROR,
                Stage::Init,
                "policy rejected",
                code = err.code(),
                error = display(&err)
            );
            Err(policy_error(err))
        }
    }
}

/// Validate an in-memory policy.
pub fn validate(policy: &Policy) -> Result<()> {
    policy.validate().map_err(policy_error)
}
