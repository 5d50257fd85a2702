
/* Copyright (C) 2024 Philipp Benner
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::path::PathBuf;
use std::process;

use clap::{Arg, ArgAction, Command};

use fastq2bigwig::command::ProcessRunner;
use fastq2bigwig::config::{PipelineConfig, ToolPaths};
use fastq2bigwig::error::Result;
use fastq2bigwig::genome::GenomeReference;
use fastq2bigwig::infologger::Logger;
use fastq2bigwig::pipeline::Pipeline;

/* -------------------------------------------------------------------------- */

fn tool_arg(name: &'static str, env: &'static str, default: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .num_args(1)
        .env(env)
        .default_value(default)
        .help(help)
}

fn string_arg(matches: &clap::ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

/* -------------------------------------------------------------------------- */

fn run(matches: &clap::ArgMatches) -> Result<PathBuf> {

    let tools = ToolPaths {
        samtools          : string_arg(matches, "samtools"),
        bedtools          : string_arg(matches, "bedtools"),
        sort              : string_arg(matches, "sort"),
        bedgraph_to_bigwig: string_arg(matches, "bedgraph-to-bigwig"),
        prefetch          : string_arg(matches, "prefetch"),
        fastq_dump        : string_arg(matches, "fastq-dump"),
    };

    let cores             = matches.get_one::<usize>("cores").copied().unwrap_or(1);
    let working_directory = matches.get_one::<PathBuf>("working-directory").cloned().unwrap_or_else(|| PathBuf::from("."));

    let config = PipelineConfig::new(cores, working_directory, tools)?;

    let input   = string_arg(matches, "file_or_accession");
    let genome  = GenomeReference::new(string_arg(matches, "genome_file"));
    let aligner = string_arg(matches, "aligner_path");

    let mut pipeline = Pipeline::new(config, genome, aligner, ProcessRunner::new())
        .with_bedgraph_check(!matches.get_flag("no-bedgraph-check"));

    let run    = pipeline.new_run(&input);
    let report = pipeline.run(&run)?;

    Ok(report.bigwig.path)
}

/* -------------------------------------------------------------------------- */

fn main() {
    let app = Command::new("fastq-to-bigwig")
        .version("1.0")
        .about("Convert FASTQ or SRR to BigWig.")
        .arg(Arg::new("file_or_accession")
            .required(true)
            .help("Path to the FASTQ file or SRR accession."))
        .arg(Arg::new("genome_file")
            .required(true)
            .help("Path to the genome file."))
        .arg(Arg::new("aligner_path")
            .required(true)
            .help("Path to the aligner executable."))
        .arg(Arg::new("cores")
            .long("cores")
            .num_args(1)
            .default_value("1")
            .value_parser(clap::value_parser!(usize))
            .help("Number of cores to use for processing. Default is 1."))
        .arg(Arg::new("working-directory")
            .long("working-directory")
            .num_args(1)
            .default_value(".")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Directory in which the run directory and downloaded reads are created"))
        .arg(Arg::new("no-bedgraph-check")
            .long("no-bedgraph-check")
            .action(ArgAction::SetTrue)
            .help("Do not verify the sort order of the bedgraph file"))
        // external tools
        .arg(tool_arg("samtools"          , "FASTQ2BIGWIG_SAMTOOLS"          , "samtools"        , "samtools executable"))
        .arg(tool_arg("bedtools"          , "FASTQ2BIGWIG_BEDTOOLS"          , "bedtools"        , "bedtools executable"))
        .arg(tool_arg("sort"              , "FASTQ2BIGWIG_SORT"              , "sort"            , "sort executable"))
        .arg(tool_arg("bedgraph-to-bigwig", "FASTQ2BIGWIG_BEDGRAPH_TO_BIGWIG", "bedGraphToBigWig", "bedGraphToBigWig executable"))
        .arg(tool_arg("prefetch"          , "FASTQ2BIGWIG_PREFETCH"          , "prefetch"        , "SRA toolkit prefetch executable"))
        .arg(tool_arg("fastq-dump"        , "FASTQ2BIGWIG_FASTQ_DUMP"        , "fastq-dump"      , "SRA toolkit fastq-dump executable"))
        // generic options
        .arg(Arg::new("verbose")
            .short('v')
            .action(ArgAction::Count)
            .help("Verbose level [-v or -vv]"));

    let matches = app.get_matches();

    // progress messages are shown by default, -v adds command lines
    Logger::init(matches.get_count("verbose").saturating_add(1));

    match run(&matches) {
        Ok(bigwig) => {
            println!("Done! BigWig file generated at: {}", bigwig.display());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
