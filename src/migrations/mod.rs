//! Manifest schema migrations
//!
//! Before any build is attempted, the manifest is brought forward across
//! mapping-API revisions by an ordered set of independent migrations. Each
//! migration first evaluates a predicate against the configuration, then
//! either applies itself or reports why it was skipped. Migrations are
//! assumed idempotent and non-conflicting: all of them are dispatched
//! concurrently and joined at a single barrier, with no rollback of
//! already-applied migrations when one of them fails.

pub mod mapping_api_version;

pub use mapping_api_version::MappingApiVersion;

use crate::config::PipelineConfig;
use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;
use tracing::info;

/// What a migration's predicate decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDecision {
    /// The migration applies to this manifest
    Run,
    /// Nothing to do; not worth mentioning beyond the skip itself
    SkipSilently,
    /// Nothing to do, and the operator should know why
    SkipWithReason(String),
}

/// A single versioned manifest migration
#[async_trait]
pub trait MigrationDescriptor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decides whether the migration needs to run for this configuration
    async fn predicate(&self, config: &PipelineConfig) -> anyhow::Result<RunDecision>;

    /// Applies the migration. Must be idempotent.
    async fn apply(&self, config: &PipelineConfig) -> anyhow::Result<()>;
}

/// Migration failures. Either class aborts the pipeline before any build.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration '{name}' failed to evaluate: {source}")]
    Predicate {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("migration '{name}' failed to apply: {source}")]
    Apply {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl MigrationError {
    pub fn migration_name(&self) -> &'static str {
        match self {
            MigrationError::Predicate { name, .. } | MigrationError::Apply { name, .. } => name,
        }
    }
}

/// Outcome of one migration, captured individually before any aggregate
/// result is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationReport {
    Applied {
        name: &'static str,
    },
    Skipped {
        name: &'static str,
        reason: Option<String>,
    },
}

/// The fixed, version-ordered migration set
pub fn registry() -> Vec<Box<dyn MigrationDescriptor>> {
    vec![
        Box::new(MappingApiVersion::to_0_0_1()),
        Box::new(MappingApiVersion::to_0_0_2()),
    ]
}

/// Applies every registered migration, gating the rest of the pipeline.
///
/// All migrations are dispatched concurrently; the barrier fails with the
/// first encountered failure, but migrations already in flight are neither
/// cancelled nor rolled back.
pub async fn apply_migrations(config: &PipelineConfig) -> Result<(), MigrationError> {
    info!("Applying migrations");
    run_all(&registry(), config).await?;
    Ok(())
}

async fn run_all(
    migrations: &[Box<dyn MigrationDescriptor>],
    config: &PipelineConfig,
) -> Result<Vec<MigrationReport>, MigrationError> {
    let tasks = migrations.iter().map(|m| run_one(m.as_ref(), config));

    // Every task settles before the aggregate result is formed; the
    // aggregate is the first failure in registration order.
    let outcomes = join_all(tasks).await;
    outcomes.into_iter().collect()
}

async fn run_one(
    migration: &dyn MigrationDescriptor,
    config: &PipelineConfig,
) -> Result<MigrationReport, MigrationError> {
    let name = migration.name();
    let decision = migration
        .predicate(config)
        .await
        .map_err(|source| MigrationError::Predicate { name, source })?;

    match decision {
        RunDecision::Run => {
            info!("Apply migration: {}", name);
            migration
                .apply(config)
                .await
                .map_err(|source| MigrationError::Apply { name, source })?;
            Ok(MigrationReport::Applied { name })
        }
        RunDecision::SkipSilently => {
            info!("Skip migration: {}", name);
            Ok(MigrationReport::Skipped { name, reason: None })
        }
        RunDecision::SkipWithReason(reason) => {
            info!("Skip migration: {} ({})", name, reason);
            Ok(MigrationReport::Skipped {
                name,
                reason: Some(reason),
            })
        }
    }
}
