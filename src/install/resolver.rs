//! Ordered fallback across a dependency's install methods.
use super::{InstallMethod, InstallOutcome, MethodError};
use crate::config::dependencies::DependencySpec;
use crate::error::ProvisionError;
use crate::logging::Log;

/// Try `methods` strictly in order until one succeeds.
///
/// Failures of non-final methods are logged and the next method is tried.
/// When every method has failed, a required dependency yields
/// [`ProvisionError::FatalPrerequisite`]; an optional one degrades to
/// [`InstallOutcome::Skipped`] with a warning.
///
/// # Errors
///
/// Returns [`ProvisionError::FatalPrerequisite`] if `dep` is required and no
/// method succeeded.
pub fn resolve(
    dep: &DependencySpec,
    methods: &[Box<dyn InstallMethod>],
    log: &dyn Log,
) -> Result<InstallOutcome, ProvisionError> {
    let total = methods.len();
    let mut failures = Vec::with_capacity(total);

    for (idx, method) in methods.iter().enumerate() {
        let k = idx + 1;
        let description = method.description();
        log.debug(&format!("{}: trying method {k}/{total}: {description}", dep.name));
        match method.attempt(log) {
            Ok(()) => {
                return Ok(InstallOutcome::Installed {
                    method: k,
                    description,
                });
            }
            Err(MethodError::Unsupported(reason)) => {
                log.debug(&format!("{}: {description} skipped: {reason}", dep.name));
                failures.push(format!("{description}: {reason}"));
            }
            Err(e) => {
                let reason = format!("{e:#}");
                if k < total {
                    log.info(&format!(
                        "{}: {description} failed, trying next method: {reason}",
                        dep.name
                    ));
                }
                failures.push(format!("{description}: {reason}"));
            }
        }
    }

    let reason = if failures.is_empty() {
        "no install methods".to_string()
    } else {
        failures.join("; ")
    };

    if dep.required {
        return Err(ProvisionError::FatalPrerequisite {
            name: dep.name.clone(),
            reason,
        });
    }
    log.warn(
        &ProvisionError::DegradedOptional {
            name: dep.name.clone(),
            reason: reason.clone(),
        }
        .to_string(),
    );
    Ok(InstallOutcome::Skipped { reason })
}
