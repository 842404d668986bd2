//! Dispatcher - runs registered units by name

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::Instrument;

use crate::core::errors::{FrameworkError, Result};
use crate::dispatch::context::ExecutionContext;
use crate::registry::{UnitDescriptor, UnitName, UnitRegistry};

/// Outcome of running every registered unit
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<UnitName>,
    pub failed: Vec<(UnitName, FrameworkError)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the registry and invokes its units
#[derive(Default)]
pub struct Dispatcher {
    registry: UnitRegistry,
    /// Argument schemas compiled on first use, keyed by unit
    validators: DashMap<UnitName, Arc<jsonschema::Validator>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("compiled_schemas", &self.validators.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(registry: UnitRegistry) -> Self {
        Self {
            registry,
            validators: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut UnitRegistry {
        self.validators.clear();
        &mut self.registry
    }

    pub fn compiled_schemas(&self) -> usize {
        self.validators.len()
    }

    /// Run one unit and wait for it to finish.
    ///
    /// A missing name fails with [`FrameworkError::UnitNotFound`] before
    /// anything runs. A unit failure comes back as
    /// [`FrameworkError::UnitExecution`].
    pub async fn run(&self, name: &str, ctx: &ExecutionContext, args: &[Value]) -> Result<()> {
        let descriptor = self.registry.lookup(name)?;
        self.validate_args(descriptor, args)?;

        let span = tracing::info_span!("unit", name = %descriptor.name(), run_id = ctx.run_id());
        descriptor
            .entry()
            .run(ctx, args)
            .instrument(span)
            .await
            .map_err(|e| FrameworkError::unit_execution(name, e))
    }

    /// Run every registered unit once, in registration order.
    ///
    /// A failing unit is logged and recorded; the remaining units still run.
    pub async fn run_all(&self, ctx: &ExecutionContext) -> RunSummary {
        let mut summary = RunSummary::default();
        for name in self.registry.all_names() {
            match self.run(name.as_str(), ctx, &[]).await {
                Ok(()) => {
                    tracing::info!(unit = %name, "Unit completed");
                    summary.succeeded.push(name.clone());
                }
                Err(e) => {
                    tracing::error!(unit = %name, stage = e.stage(), error = %e, "Unit failed");
                    summary.failed.push((name.clone(), e));
                }
            }
        }
        summary
    }

    fn validate_args(&self, descriptor: &UnitDescriptor, args: &[Value]) -> Result<()> {
        let Some(schema) = descriptor.entry().args_schema() else {
            return Ok(());
        };
        let name = descriptor.name().as_str();

        let cached = self
            .validators
            .get(descriptor.name())
            .map(|validator| validator.clone());
        let validator = match cached {
            Some(validator) => validator,
            None => {
                let validator = Arc::new(compile_schema(name, schema)?);
                self.validators
                    .insert(descriptor.name().clone(), validator.clone());
                tracing::debug!(unit = name, stage = "dispatch", "Compiled argument schema");
                validator
            }
        };

        let instance = Value::Array(args.to_vec());
        if let Err(error) = validator.validate(&instance) {
            tracing::warn!(
                unit = name,
                stage = "dispatch",
                %error,
                "Argument validation failed"
            );
            return Err(FrameworkError::invalid_arguments(name, error.to_string()));
        }
        Ok(())
    }
}

// Schema errors are not cached: the next run reports them again.
fn compile_schema(name: &str, schema: &str) -> Result<jsonschema::Validator> {
    let schema: Value = serde_json::from_str(schema).map_err(|e| {
        FrameworkError::invalid_arguments(name, format!("unit declares an unreadable schema: {e}"))
    })?;
    jsonschema::validator_for(&schema).map_err(|e| {
        FrameworkError::invalid_arguments(name, format!("failed to compile argument schema: {e}"))
    })
}
