// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to a use case. No
// checkpoint logic lives here.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PlanArgs, TransferArgs};

use crate::application::{
    inspect_use_case::InspectUseCase,
    plan_use_case::{build_plan, render_plan},
    transfer_use_case::{TransferConfig, TransferUseCase},
};
use crate::infra::checkpoint_store::SafetensorsStore;
use crate::ml::skeleton::CpuSkeletonBuilder;

#[derive(Parser, Debug)]
#[command(
    name = "weight-transfer",
    version,
    about = "Carry pretrained detector weights over to a network with extra layers spliced in."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the parsed subcommand to its handler.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Transfer(args) => run_transfer(args),
            Commands::Plan(args)     => run_plan(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_transfer(args: TransferArgs) -> Result<()> {
    let config = TransferConfig::try_from(args)?;
    tracing::info!(
        "Transferring '{}' → '{}' with insertions {:?}",
        config.source.display(),
        config.destination.display(),
        config.insertions.points()
    );

    let destination = config.destination.clone();
    let use_case = TransferUseCase::new(config, SafetensorsStore::new(), CpuSkeletonBuilder::cpu());
    let report = use_case.execute()?;

    println!(
        "Done: {} tensors transferred, {} kept their initial values, {} warnings.",
        report.merge.applied,
        report.merge.kept_initialized,
        report.warnings.len()
    );
    println!("Weights saved to '{}'", destination.display());
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let table = build_plan(args.source_layers, args.insert)?;
    println!("{}", render_plan(&table));
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let summary = InspectUseCase::new(SafetensorsStore::new(), args.prefix)
        .summarize(&args.checkpoint)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}
