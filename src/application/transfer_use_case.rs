// ============================================================
// Layer 2 — TransferUseCase
// ============================================================
// Runs the full weight transfer in order:
//
//   Step 1: Check paths                  (Layer 6 - infra)
//   Step 2: Load source checkpoint       (Layer 6 - infra)
//   Step 3: Build remap table            (Layer 3 - domain)
//   Step 4: Rewrite layer keys           (Layer 3 - domain)
//   Step 5: Load / build target skeleton (Layer 6 / Layer 5)
//   Step 6: Non-strict merge             (Layer 3 - domain)
//   Step 7: Save + report                (Layer 6 - infra)
//
// Every fatal condition is detected before Step 7, so a failed
// run never leaves an output file behind. Inside Step 7 the
// report is rendered before the checkpoint is saved, and if the
// report file cannot be written the saved checkpoint is removed.
//
// Reference: Rust Book §9 (Error Handling), §10 (Generics)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::{
    checkpoint::Checkpoint,
    layer_key::{parse, DEFAULT_PREFIX},
    merge::{merge_into, MismatchPolicy},
    network::NetworkDescription,
    remap::{InsertionSpec, RemapTable},
    report::{TransferReport, Warning},
    rewrite::rewrite,
    traits::{CheckpointStore, SkeletonBuilder},
};
use crate::infra::{
    paths,
    report_writer::{render_report, write_report},
};

// ─── Transfer Configuration ──────────────────────────────────────────────────
/// Where the target network's initial parameters come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonSource {
    /// A checkpoint already initialised for the target network
    Checkpoint(PathBuf),
    /// A JSON NetworkDescription to initialise from scratch
    Description(PathBuf),
}

impl SkeletonSource {
    /// File the skeleton is read from, whichever kind it is.
    pub fn path(&self) -> &Path {
        match self {
            SkeletonSource::Checkpoint(p) | SkeletonSource::Description(p) => p,
        }
    }
}

/// All inputs of one transfer run. Serialisable so a run can be
/// described in a JSON plan file instead of CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    pub source:        PathBuf,
    pub destination:   PathBuf,
    pub skeleton:      SkeletonSource,
    #[serde(default)]
    pub insertions:    InsertionSpec,
    /// Inferred from the source checkpoint when absent
    #[serde(default)]
    pub source_layers: Option<usize>,
    #[serde(default = "default_prefix")]
    pub prefix:        String,
    #[serde(default)]
    pub on_mismatch:   MismatchPolicy,
    #[serde(default)]
    pub report:        Option<PathBuf>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            source:        PathBuf::from("yolov8n.safetensors"),
            destination:   PathBuf::from("yolov8n_cbam_pretrained.safetensors"),
            skeleton:      SkeletonSource::Description(PathBuf::from("yolov8n_cbam.json")),
            insertions:    InsertionSpec::default(),
            source_layers: None,
            prefix:        default_prefix(),
            on_mismatch:   MismatchPolicy::default(),
            report:        None,
        }
    }
}

impl TransferConfig {
    /// Read a JSON plan file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read transfer plan '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid transfer plan '{}'", path.display()))
    }

    /// Write this configuration as a JSON plan file.
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write transfer plan '{}'", path.display()))
    }
}

/// Number of layers implied by the keys of `ckpt`: highest layer
/// index + 1, or 0 when no key is layer-indexed.
pub fn infer_layer_count(ckpt: &Checkpoint, prefix: &str) -> usize {
    ckpt.parameters
        .keys()
        .filter_map(|k| parse(k, prefix))
        .map(|k| k.index + 1)
        .max()
        .unwrap_or(0)
}

// ─── TransferUseCase ──────────────────────────────────────────────────────────
pub struct TransferUseCase<S, K> {
    config:  TransferConfig,
    store:   S,
    builder: K,
}

impl<S: CheckpointStore, K: SkeletonBuilder> TransferUseCase<S, K> {
    /// Create a use case with the given config, checkpoint store and
    /// skeleton builder.
    pub fn new(config: TransferConfig, store: S, builder: K) -> Self {
        Self { config, store, builder }
    }

    /// Run Steps 1-7. On error nothing is left at the destination
    /// or the report path.
    pub fn execute(&self) -> Result<TransferReport> {
        let cfg = &self.config;

        // ── Step 1: Refuse bad paths before touching anything ─────────────────
        paths::ensure_source_exists(&cfg.source)?;
        paths::ensure_distinct(&cfg.destination, &[cfg.source.as_path(), cfg.skeleton.path()])?;
        if let Some(report) = &cfg.report {
            paths::ensure_distinct(
                report,
                &[cfg.source.as_path(), cfg.skeleton.path(), cfg.destination.as_path()],
            )?;
        }

        // ── Step 2: Load the pretrained weights ───────────────────────────────
        tracing::info!("Loading source checkpoint '{}'", cfg.source.display());
        let source = self
            .store
            .load(&cfg.source)
            .with_context(|| format!("Cannot load source checkpoint '{}'", cfg.source.display()))?;
        tracing::info!(
            "Source has {} tensors ({} parameters)",
            source.parameters.len(),
            source.parameter_count()
        );
        if source.parameters.is_empty() {
            tracing::warn!("Source checkpoint '{}' holds no tensors", cfg.source.display());
        }

        // ── Step 3: Old → new layer indices ───────────────────────────────────
        let source_layers = match cfg.source_layers {
            Some(n) => n,
            None => {
                let n = infer_layer_count(&source, &cfg.prefix);
                tracing::info!("Inferred {} source layers from checkpoint keys", n);
                n
            }
        };
        let table = RemapTable::build(source_layers, &cfg.insertions)?;
        if cfg.insertions.is_empty() {
            tracing::info!("No insertion points given; layer indices stay unchanged");
        }
        if table.is_empty() {
            tracing::warn!("No '{}.<index>' keys in the source; nothing will be remapped", cfg.prefix);
        }
        tracing::info!(
            "Remap table: {} source layers → {} target layers, reserved {:?}",
            table.len(),
            table.target_len(),
            table.reserved()
        );

        // ── Step 4: Rename layer keys ─────────────────────────────────────────
        let rewritten = rewrite(&source, &table, &cfg.prefix);

        // ── Step 5: Target skeleton ───────────────────────────────────────────
        let skeleton = self.load_skeleton(&table)?;

        // ── Step 6: Lay the remapped weights over the skeleton ────────────────
        let merged = merge_into(skeleton, rewritten.checkpoint, &cfg.prefix, cfg.on_mismatch)?;

        // ── Step 7: Persist ───────────────────────────────────────────────────
        let mut warnings = rewritten.warnings;
        warnings.extend(merged.warnings);
        let report = TransferReport {
            rewrite: rewritten.stats,
            merge:   merged.stats,
            warnings,
        };
        let report_json = match &cfg.report {
            Some(_) => Some(render_report(&report)?),
            None => None,
        };

        self.store
            .save(&merged.checkpoint, &cfg.destination)
            .with_context(|| format!("Cannot write checkpoint '{}'", cfg.destination.display()))?;

        if let (Some(path), Some(json)) = (&cfg.report, &report_json) {
            if let Err(e) = write_report(json, path) {
                // a run that fails must not leave a checkpoint behind
                if let Err(rm) = fs::remove_file(&cfg.destination) {
                    tracing::warn!(
                        "Cannot remove '{}' after failed report write: {}",
                        cfg.destination.display(),
                        rm
                    );
                }
                return Err(e);
            }
        }
        tracing::info!("Saved transferred weights to '{}'", cfg.destination.display());

        tracing::info!(
            "Transferred {} tensors, {} kept their initial values, {} warnings ({} shape mismatches, {} unmatched keys)",
            report.merge.applied,
            report.merge.kept_initialized,
            report.warnings.len(),
            report.count(|w| matches!(w, Warning::ShapeMismatch { .. })),
            report.count(|w| matches!(w, Warning::UnmatchedKey { .. }))
        );

        Ok(report)
    }

    fn load_skeleton(&self, table: &RemapTable) -> Result<Checkpoint> {
        let cfg = &self.config;
        match &cfg.skeleton {
            SkeletonSource::Checkpoint(path) => {
                tracing::info!("Loading target skeleton '{}'", path.display());
                self.store
                    .load(path)
                    .with_context(|| format!("Cannot load target skeleton '{}'", path.display()))
            }
            SkeletonSource::Description(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Cannot read network description '{}'", path.display()))?;
                let description = NetworkDescription::from_json(&json)
                    .with_context(|| format!("Invalid network description '{}'", path.display()))?;

                if description.prefix != cfg.prefix {
                    tracing::warn!(
                        "Description prefix '{}' differs from transfer prefix '{}'",
                        description.prefix,
                        cfg.prefix
                    );
                }
                if description.layer_count() != table.target_len() {
                    tracing::warn!(
                        "Description has {} layers but the insertion spec implies {}",
                        description.layer_count(),
                        table.target_len()
                    );
                }
                Ok(self.builder.build(&description)?)
            }
        }
    }
}
