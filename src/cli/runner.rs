//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ConvertConfig, MergeConfig, Partitioning, SplitConfig};
use crate::convert::{convert, ConvertReport};
use crate::engine::{merge, split, SplitReport};
use crate::error::Result;
use crate::schema::CastPolicy;
use bytesize::ByteSize;
use indicatif::HumanCount;
use serde::Serialize;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Merge {
                input,
                output,
                columns,
                coerce_timestamps,
                compression,
                row_group_size,
                strict_casts,
            } => {
                let config = MergeConfig {
                    input: input.clone(),
                    output: output.clone(),
                    columns: columns.clone(),
                    coerce_timestamps: *coerce_timestamps,
                    compression: *compression,
                    row_group_size: *row_group_size,
                    cast_policy: if *strict_casts {
                        CastPolicy::Strict
                    } else {
                        CastPolicy::CastOrKeepOriginal
                    },
                };
                let report = merge(&config)?;
                self.output(&report, || vec![report.summary_line()])
            }
            Commands::Split {
                input,
                output_dir,
                parts,
                rows_per_file,
                prefix,
                compression,
                verify,
                row_group_size,
                batch_size,
            } => {
                let partitioning = Partitioning::from_options(*parts, *rows_per_file)?;
                let mut config = SplitConfig::new(input, output_dir, partitioning)
                    .with_prefix(prefix.clone())
                    .with_flush_rows(*row_group_size)
                    .with_batch_size(*batch_size)
                    .with_verify(*verify);
                config.compression = *compression;

                let report = split(&config)?;
                self.output(&report, || split_lines(&report))
            }
            Commands::Convert {
                in_dir,
                out_dir,
                to,
                compression,
                level,
                threads,
                overwrite,
                ignore_errors,
                temp_directory,
            } => {
                let mut config = ConvertConfig::new(in_dir, out_dir)
                    .with_target(*to)
                    .with_compression(*compression, *level)
                    .with_threads(*threads)
                    .with_overwrite(*overwrite)
                    .with_ignore_errors(*ignore_errors);
                config.temp_directory.clone_from(temp_directory);

                let report: ConvertReport = convert(config)?;
                self.output(&report, || vec![report.summary_line()])
            }
        }
    }

    /// Print a report as JSON or as summary lines
    fn output<T: Serialize>(
        &self,
        report: &T,
        pretty: impl FnOnce() -> Vec<String>,
    ) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(report)?);
            }
            OutputFormat::Pretty => {
                for line in pretty() {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

fn split_lines(report: &SplitReport) -> Vec<String> {
    let detected = report
        .codec
        .detected
        .map_or_else(|| "none".to_string(), |c| c.to_string());
    let mut lines = vec![format!(
        "Split done. Input rows: {}. Target per part: {}. Files written: {}. Codec: {} (auto: {}).",
        HumanCount(report.input_rows as u64),
        HumanCount(report.target_rows as u64),
        report.files_written(),
        report.codec.codec,
        detected
    )];

    if let Some(verification) = &report.verification {
        lines.push("Verification:".to_string());
        for partition in &verification.partitions {
            lines.push(format!(
                "  {}: {} rows, {}",
                partition.name,
                HumanCount(partition.rows as u64),
                ByteSize(partition.size_bytes)
            ));
        }
        lines.push(format!(
            "  Total rows: {}",
            HumanCount(verification.total_rows as u64)
        ));
    }
    lines
}
