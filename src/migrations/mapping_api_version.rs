//! Mapping API version migrations
//!
//! Each revision of the mapping API has a matching migration that bumps the
//! `apiVersion` of every data source mapping in the manifest to that
//! revision. A mapping with a missing or unparseable version is treated as
//! below the target and rewritten.

use super::{MigrationDescriptor, RunDecision};
use crate::config::PipelineConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_yaml::Value;

type Version = (u64, u64, u64);

/// Bumps `dataSources[*].mapping.apiVersion` to a target revision
pub struct MappingApiVersion {
    name: &'static str,
    target: Version,
    target_str: &'static str,
}

impl MappingApiVersion {
    pub fn to_0_0_1() -> Self {
        Self {
            name: "mapping_api_version_0_0_1",
            target: (0, 0, 1),
            target_str: "0.0.1",
        }
    }

    pub fn to_0_0_2() -> Self {
        Self {
            name: "mapping_api_version_0_0_2",
            target: (0, 0, 2),
            target_str: "0.0.2",
        }
    }

    async fn load(&self, config: &PipelineConfig) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&config.manifest)
            .await
            .with_context(|| format!("failed to read manifest {}", config.manifest.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse manifest {}", config.manifest.display()))
    }

    /// Versions of all data source mappings; empty when the manifest has no
    /// data sources
    fn mapping_versions(document: &Value) -> Vec<Option<Version>> {
        let Some(sources) = document.get("dataSources").and_then(Value::as_sequence) else {
            return Vec::new();
        };
        sources
            .iter()
            .filter_map(|source| source.get("mapping"))
            .map(|mapping| {
                mapping
                    .get("apiVersion")
                    .and_then(Value::as_str)
                    .and_then(parse_version)
            })
            .collect()
    }
}

#[async_trait]
impl MigrationDescriptor for MappingApiVersion {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn predicate(&self, config: &PipelineConfig) -> Result<RunDecision> {
        let document = self.load(config).await?;
        let versions = Self::mapping_versions(&document);

        if versions.is_empty() {
            return Ok(RunDecision::SkipSilently);
        }
        if versions
            .iter()
            .all(|v| v.map(|v| v >= self.target).unwrap_or(false))
        {
            return Ok(RunDecision::SkipWithReason("already migrated".to_string()));
        }
        Ok(RunDecision::Run)
    }

    async fn apply(&self, config: &PipelineConfig) -> Result<()> {
        let mut document = self.load(config).await?;

        let sources = document
            .get_mut("dataSources")
            .and_then(Value::as_sequence_mut)
            .ok_or_else(|| anyhow!("manifest has no data sources"))?;

        for source in sources.iter_mut() {
            let current = source
                .get("mapping")
                .and_then(|m| m.get("apiVersion"))
                .and_then(Value::as_str)
                .and_then(parse_version);
            if current.map(|v| v >= self.target).unwrap_or(false) {
                continue;
            }

            let Some(mapping) = source
                .get_mut("mapping")
                .and_then(Value::as_mapping_mut)
            else {
                continue;
            };
            mapping.insert(Value::from("apiVersion"), Value::from(self.target_str));
        }

        let rewritten = serde_yaml::to_string(&document).context("failed to serialize manifest")?;
        tokio::fs::write(&config.manifest, rewritten)
            .await
            .with_context(|| format!("failed to write manifest {}", config.manifest.display()))?;
        Ok(())
    }
}

fn parse_version(s: &str) -> Option<Version> {
    let mut parts = s.split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next()?.ok()?;
    let patch = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(manifest: &Path) -> PipelineConfig {
        PipelineConfig {
            manifest: manifest.to_path_buf(),
            output_dir: manifest.parent().unwrap().join("dist"),
            output_format: OutputFormat::Wasm,
            ipfs: None,
            node: None,
            subgraph_name: None,
            api_key: None,
            verbosity: None,
            watch: false,
        }
    }

    fn write_manifest(dir: &TempDir, api_version: &str) -> PipelineConfig {
        let manifest = dir.path().join("subgraph.yaml");
        fs::write(
            &manifest,
            format!(
                "specVersion: 0.0.1\n\
                 dataSources:\n\
                 \x20 - name: Registry\n\
                 \x20   mapping:\n\
                 \x20     apiVersion: {}\n",
                api_version
            ),
        )
        .unwrap();
        config_for(&manifest)
    }

    #[tokio::test]
    async fn test_predicate_runs_for_old_version() {
        let dir = TempDir::new().unwrap();
        let config = write_manifest(&dir, "0.0.1");
        let migration = MappingApiVersion::to_0_0_2();

        assert_eq!(migration.predicate(&config).await.unwrap(), RunDecision::Run);
    }

    #[tokio::test]
    async fn test_predicate_skips_with_reason_when_current() {
        let dir = TempDir::new().unwrap();
        let config = write_manifest(&dir, "0.0.2");
        let migration = MappingApiVersion::to_0_0_2();

        assert_eq!(
            migration.predicate(&config).await.unwrap(),
            RunDecision::SkipWithReason("already migrated".to_string())
        );
    }

    #[tokio::test]
    async fn test_predicate_skips_silently_without_data_sources() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("subgraph.yaml");
        fs::write(&manifest, "specVersion: 0.0.1\n").unwrap();
        let config = config_for(&manifest);
        let migration = MappingApiVersion::to_0_0_2();

        assert_eq!(
            migration.predicate(&config).await.unwrap(),
            RunDecision::SkipSilently
        );
    }

    #[tokio::test]
    async fn test_apply_rewrites_api_version() {
        let dir = TempDir::new().unwrap();
        let config = write_manifest(&dir, "0.0.1");
        let migration = MappingApiVersion::to_0_0_2();

        migration.apply(&config).await.unwrap();

        let rewritten = fs::read_to_string(&config.manifest).unwrap();
        let document: Value = serde_yaml::from_str(&rewritten).unwrap();
        let version = document["dataSources"][0]["mapping"]["apiVersion"]
            .as_str()
            .unwrap();
        assert_eq!(version, "0.0.2");

        // Idempotent: applying again is a no-op.
        migration.apply(&config).await.unwrap();
        assert_eq!(fs::read_to_string(&config.manifest).unwrap(), rewritten);
    }

    #[tokio::test]
    async fn test_apply_treats_missing_version_as_stale() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("subgraph.yaml");
        fs::write(
            &manifest,
            "specVersion: 0.0.1\ndataSources:\n  - name: Registry\n    mapping:\n      language: wasm\n",
        )
        .unwrap();
        let config = config_for(&manifest);
        let migration = MappingApiVersion::to_0_0_1();

        assert_eq!(migration.predicate(&config).await.unwrap(), RunDecision::Run);
        migration.apply(&config).await.unwrap();

        let document: Value =
            serde_yaml::from_str(&fs::read_to_string(&config.manifest).unwrap()).unwrap();
        assert_eq!(
            document["dataSources"][0]["mapping"]["apiVersion"]
                .as_str()
                .unwrap(),
            "0.0.1"
        );
    }

    #[tokio::test]
    async fn test_predicate_fails_on_unreadable_manifest() {
        let config = config_for(Path::new("/nonexistent/subgraph.yaml"));
        let migration = MappingApiVersion::to_0_0_1();

        assert!(migration.predicate(&config).await.is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("0.0.2"), Some((0, 0, 2)));
        assert_eq!(parse_version("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_version("0.0"), None);
        assert_eq!(parse_version("0.0.2.1"), None);
        assert_eq!(parse_version("abc"), None);
    }
}
