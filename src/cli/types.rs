//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    compare::CompareArgs, merge::MergeArgs, parse::ParseArgs, run::RunArgs, verify::VerifyArgs,
};

#[derive(Debug, Parser)]
#[command(name = "colorbench")]
#[command(about = "Benchmark runner and result verifier for graph coloring solvers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Extra configuration file, layered over `.colorbench/`
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the solver over an instance set, then parse and verify the logs
    Run(RunArgs),

    /// Extract metrics from a directory of solver logs
    Parse(ParseArgs),

    /// Compare candidate bounds against a baseline ledger
    Compare(CompareArgs),

    /// Check a solution against an instance
    Verify(VerifyArgs),

    /// Fold metrics tables and ledgers into one ledger
    Merge(MergeArgs),
}
