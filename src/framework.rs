//! Framework composite: discovery, dispatch and the channel exchange

use std::sync::Arc;

use crate::core::config::FrameworkConfig;
use crate::core::errors::{FrameworkError, Result};
use crate::discovery::{
    DirectorySource, DiscoveryReport, LinkedSource, NamingConvention, Scanner, UnitSource,
};
use crate::dispatch::{Dispatcher, ExecutionContext, RunSummary};
use crate::exchange::{Exchange, ExchangeReport, SharedChannel};
use crate::registry::UnitRegistry;

/// Everything a full startup did
#[derive(Debug)]
pub struct InitReport {
    pub project: String,
    pub run_id: String,
    pub discovery: DiscoveryReport,
    pub run: RunSummary,
    pub exchange: ExchangeReport,
}

/// Owns the registry (through the dispatcher), the shared channel and the
/// execution context handed to units.
#[derive(Debug)]
pub struct Framework {
    config: FrameworkConfig,
    scanner: Scanner,
    dispatcher: Dispatcher,
    channel: Arc<SharedChannel>,
    context: ExecutionContext,
}

impl Framework {
    pub fn new(project: impl Into<String>, config: FrameworkConfig) -> Result<Self> {
        config.validate()?;

        let channel = Arc::new(SharedChannel::new(config.exchange.capacity));
        let context = ExecutionContext::new(project, channel.clone());
        let scanner = Scanner::new(NamingConvention::new(
            config.discovery.marker.clone(),
            config.discovery.extension.clone(),
        ));

        tracing::info!(
            project = context.project(),
            run_id = context.run_id(),
            "Framework initialized successfully"
        );
        Ok(Self {
            config,
            scanner,
            dispatcher: Dispatcher::new(UnitRegistry::new()),
            channel,
            context,
        })
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &UnitRegistry {
        self.dispatcher.registry()
    }

    /// Mutable registry access for units registered by hand
    pub fn registry_mut(&mut self) -> &mut UnitRegistry {
        self.dispatcher.registry_mut()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn channel(&self) -> &Arc<SharedChannel> {
        &self.channel
    }

    /// The source configured for discovery: a directory tree when
    /// `discovery.root` is set, the link-time catalog otherwise.
    pub fn default_source(&self) -> Box<dyn UnitSource> {
        match &self.config.discovery.root {
            Some(root) => Box::new(DirectorySource::new(root.clone())),
            None => Box::new(LinkedSource),
        }
    }

    /// Discover units from `source` across the configured categories
    pub fn discover(&mut self, source: &dyn UnitSource) -> DiscoveryReport {
        let report = self.scanner.discover(
            &self.config.discovery.categories,
            source,
            self.dispatcher.registry_mut(),
        );
        tracing::info!(
            registered = report.registered.len(),
            load_failures = report.load_failures.len(),
            duplicates = report.duplicates.len(),
            "Discovery finished"
        );
        report
    }

    pub async fn run(&self, name: &str, args: &[serde_json::Value]) -> Result<()> {
        self.dispatcher.run(name, &self.context, args).await
    }

    pub async fn run_all(&self) -> RunSummary {
        self.dispatcher.run_all(&self.context).await
    }

    /// Start the producer and consumer threads on the framework's channel
    pub fn start_exchange(&self) -> Result<Exchange> {
        Exchange::start(self.channel.clone(), &self.config.exchange)
    }

    /// Full startup: discovery, registration, dispatch of every unit, then
    /// one producer/consumer exchange run to completion.
    pub async fn init(project: impl Into<String>, config: FrameworkConfig) -> Result<InitReport> {
        let project = project.into();
        tracing::info!(project = %project, "Initializing project");

        let mut framework = Self::new(project.clone(), config)?;
        let source = framework.default_source();
        let discovery = framework.discover(source.as_ref());

        let run = framework.run_all().await;
        if !run.all_succeeded() {
            tracing::warn!(failed = run.failed.len(), stage = "execution", "Some units failed");
        }

        let exchange = framework.start_exchange()?;
        let exchange = tokio::task::spawn_blocking(move || exchange.finish())
            .await
            .map_err(|e| FrameworkError::internal(format!("exchange task failed: {e}")))??;

        Ok(InitReport {
            project,
            run_id: framework.context.run_id().to_string(),
            discovery,
            run,
            exchange,
        })
    }
}
