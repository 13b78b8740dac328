//! Cross-field validation pass run after every property settled.

use crate::context::OperationContext;
use formwork_schema::{PostValidateConfig, PostValidation};
use formwork_types::{ErrorAccumulator, VALIDATION_FAILED};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Runs every config whose properties intersect `touched`.
///
/// Configs run in declaration order. Within a config the validators run in
/// order and stop at the first one that fails or errors. Failures for fields
/// outside the config are dropped.
pub(crate) async fn run_post_validation(
    configs: &[PostValidateConfig],
    ctx: &OperationContext,
    touched: &HashSet<String>,
    errors: &mut ErrorAccumulator,
) {
    for (index, config) in configs.iter().enumerate() {
        let provided: Vec<String> = config
            .properties
            .iter()
            .filter(|property| touched.contains(*property))
            .cloned()
            .collect();
        if provided.is_empty() {
            continue;
        }

        for validator in &config.validators {
            match validator.call(ctx.summary(), provided.clone()).await {
                Ok(PostValidation::Pass) => {}
                Ok(PostValidation::Fail(failures)) => {
                    let mut failed = false;
                    for (field, failure) in failures {
                        if !config.properties.contains(&field) {
                            continue;
                        }
                        errors.set(ctx.external_key(&field), failure.into_field_error());
                        failed = true;
                    }
                    if failed {
                        debug!(config = index, "post-validation failed");
                        break;
                    }
                }
                Err(error) => {
                    warn!(config = index, %error, "post-validator errored");
                    for property in &provided {
                        errors.add_reason(ctx.external_key(property), VALIDATION_FAILED);
                    }
                    break;
                }
            }
        }
    }
}
