// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   transfer — remap a checkpoint into a network with new layers
//   plan     — print the remap table for an insertion spec
//   inspect  — per-layer summary of a checkpoint
//
// Reference: Rust Book §12 (Building a CLI Program)
//            clap derive tutorial (conflicts and requirements)

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::transfer_use_case::{SkeletonSource, TransferConfig};
use crate::domain::{merge::MismatchPolicy, remap::InsertionSpec};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transfer pretrained weights into a network with spliced-in layers
    Transfer(TransferArgs),

    /// Show the old → new layer index table without touching any file
    Plan(PlanArgs),

    /// Summarise a checkpoint layer by layer
    Inspect(InspectArgs),
}

/// Handling of tensors whose shape differs from the target slot
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnMismatch {
    /// Keep the target's initial value and report the key
    Skip,
    /// Abort without writing anything
    Fail,
}

impl From<OnMismatch> for MismatchPolicy {
    fn from(m: OnMismatch) -> Self {
        match m {
            OnMismatch::Skip => MismatchPolicy::Skip,
            OnMismatch::Fail => MismatchPolicy::Fail,
        }
    }
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// JSON transfer plan; used instead of the individual flags below
    #[arg(long, conflicts_with_all = [
        "source", "destination", "skeleton", "target_description",
        "insert", "source_layers", "prefix", "on_mismatch",
    ])]
    pub plan: Option<PathBuf>,

    /// Pretrained checkpoint to read
    #[arg(long, required_unless_present = "plan")]
    pub source: Option<PathBuf>,

    /// Where to write the transferred checkpoint (must differ from every input)
    #[arg(long, required_unless_present = "plan")]
    pub destination: Option<PathBuf>,

    /// Checkpoint already initialised for the target network
    #[arg(long, conflicts_with = "target_description",
          required_unless_present_any = ["plan", "target_description"])]
    pub skeleton: Option<PathBuf>,

    /// JSON description of the target network, initialised from scratch
    #[arg(long)]
    pub target_description: Option<PathBuf>,

    /// Target positions of the inserted layers, e.g. 9,17,21,25
    #[arg(long, value_delimiter = ',')]
    pub insert: Vec<usize>,

    /// Number of layers in the source network (default: inferred from its keys)
    #[arg(long)]
    pub source_layers: Option<usize>,

    /// Root name of the layer list in parameter keys
    #[arg(long, default_value = "model")]
    pub prefix: String,

    /// What to do when a tensor's shape or dtype differs from its target slot
    #[arg(long, value_enum, default_value_t = OnMismatch::Skip)]
    pub on_mismatch: OnMismatch,

    /// Write the transfer report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl TryFrom<TransferArgs> for TransferConfig {
    type Error = anyhow::Error;

    fn try_from(a: TransferArgs) -> Result<Self> {
        if let Some(plan) = a.plan {
            let mut cfg = TransferConfig::load(&plan)?;
            if a.report.is_some() {
                cfg.report = a.report;
            }
            return Ok(cfg);
        }

        let skeleton = match (a.skeleton, a.target_description) {
            (Some(p), _) => SkeletonSource::Checkpoint(p),
            (None, Some(p)) => SkeletonSource::Description(p),
            (None, None) => anyhow::bail!("either --skeleton or --target-description is required"),
        };

        Ok(TransferConfig {
            source:        a.source.context("--source is required")?,
            destination:   a.destination.context("--destination is required")?,
            skeleton,
            insertions:    InsertionSpec::new(a.insert)?,
            source_layers: a.source_layers,
            prefix:        a.prefix,
            on_mismatch:   a.on_mismatch.into(),
            report:        a.report,
        })
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Number of layers in the source network
    #[arg(long)]
    pub source_layers: usize,

    /// Target positions of the inserted layers
    #[arg(long, value_delimiter = ',')]
    pub insert: Vec<usize>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Checkpoint to summarise
    #[arg(long)]
    pub checkpoint: PathBuf,

    #[arg(long, default_value = "model")]
    pub prefix: String,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}
