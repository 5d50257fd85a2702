
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

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::artifact::{Artifact, ArtifactNamer};
use crate::command::CommandRunner;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::genome::GenomeReference;
use crate::pipeline_stage;
use crate::source;

/* -------------------------------------------------------------------------- */

/// One execution of the pipeline on a single input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineRun {
    pub input_identifier : String,
    pub working_directory: PathBuf,
    pub core_count       : usize,
}

impl PipelineRun {
    pub fn new<P: AsRef<Path>>(input_identifier: &str, working_directory: P, core_count: usize) -> Self {
        PipelineRun {
            input_identifier : input_identifier.to_string(),
            working_directory: working_directory.as_ref().to_path_buf(),
            core_count,
        }
    }
}

/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    ResolvingSource,
    Aligning,
    ConvertingFormat,
    ComputingCoverage,
    EncodingTrack,
    Done,
    Aborted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Ready             => "ready",
            PipelineState::ResolvingSource   => "resolving source",
            PipelineState::Aligning          => "aligning",
            PipelineState::ConvertingFormat  => "converting format",
            PipelineState::ComputingCoverage => "computing coverage",
            PipelineState::EncodingTrack     => "encoding track",
            PipelineState::Done              => "done",
            PipelineState::Aborted           => "aborted",
        };
        f.pad(name)
    }
}

/* -------------------------------------------------------------------------- */

/// Artifacts of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    pub fastq        : PathBuf,
    pub run_directory: PathBuf,
    pub sam          : Artifact,
    pub bam          : Artifact,
    pub bedgraph     : Artifact,
    pub chrom_sizes  : Artifact,
    pub bigwig       : Artifact,
}

/* -------------------------------------------------------------------------- */

/// Drives a run through source resolution and the four stages. Stages are
/// executed strictly one after another; the first error aborts the run and
/// is returned unchanged.
pub struct Pipeline<R: CommandRunner> {
    config        : PipelineConfig,
    genome        : GenomeReference,
    aligner       : PathBuf,
    runner        : R,
    state         : PipelineState,
    check_bedgraph: bool,
}

impl<R: CommandRunner> Pipeline<R> {

    pub fn new<P: AsRef<Path>>(config: PipelineConfig, genome: GenomeReference, aligner: P, runner: R) -> Self {
        Pipeline {
            config,
            genome,
            aligner       : aligner.as_ref().to_path_buf(),
            runner,
            state         : PipelineState::Ready,
            check_bedgraph: true,
        }
    }

    /// Enables or disables the sort order check of the bedgraph file.
    pub fn with_bedgraph_check(mut self, check: bool) -> Self {
        self.check_bedgraph = check;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// A run on the configured working directory and core count.
    pub fn new_run(&self, input_identifier: &str) -> PipelineRun {
        PipelineRun::new(input_identifier, &self.config.working_directory, self.config.cores)
    }

    fn enter(&mut self, state: PipelineState) {
        info!("Pipeline state: {}", state);
        self.state = state;
    }

    pub fn run(&mut self, run: &PipelineRun) -> Result<PipelineReport> {
        match self.execute(run) {
            Ok(report) => {
                self.enter(PipelineState::Done);
                Ok(report)
            }
            Err(err) => {
                error!("Pipeline aborted while {}", self.state);
                self.state = PipelineState::Aborted;
                Err(err)
            }
        }
    }

    fn execute(&mut self, run: &PipelineRun) -> Result<PipelineReport> {

        if run.core_count == 0 {
            return Err(Error::Generic("number of cores must be at least one".to_string()));
        }
        let cores = run.core_count;

        self.enter(PipelineState::ResolvingSource);

        let fastq = source::resolve(&mut self.runner, &self.config.tools, &run.working_directory, &run.input_identifier)?;
        let namer = ArtifactNamer::from_input(&run.working_directory, &fastq.to_string_lossy())?;

        create_run_directory(namer.run_directory())?;

        self.enter(PipelineState::Aligning);

        let sam = pipeline_stage::align(&mut self.runner, &namer, &fastq, &self.genome, &self.aligner, cores)?;

        self.enter(PipelineState::ConvertingFormat);

        let bam = pipeline_stage::sam_to_bam(&mut self.runner, &self.config.tools, &namer, &sam, cores)?;

        self.enter(PipelineState::ComputingCoverage);

        let bedgraph = pipeline_stage::generate_bedgraph(&mut self.runner, &self.config.tools, &namer, &bam, &self.genome, cores, self.check_bedgraph)?;

        self.enter(PipelineState::EncodingTrack);

        let (chrom_sizes, bigwig) = pipeline_stage::bedgraph_to_bigwig(&mut self.runner, &self.config.tools, &namer, &bedgraph, &self.genome)?;

        Ok(PipelineReport {
            fastq,
            run_directory: namer.run_directory().to_path_buf(),
            sam,
            bam,
            bedgraph,
            chrom_sizes,
            bigwig,
        })
    }

}

/* -------------------------------------------------------------------------- */

/// Creates the run directory. An existing directory is reused and its
/// artifacts are overwritten.
pub fn create_run_directory(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => {
            info!("Directory {} created successfully!", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
            info!("Directory {} already exists.", path.display());
            Ok(())
        }
        Err(e) => Err(Error::IO(io::Error::new(e.kind(), format!("creating directory `{}` failed: {}", path.display(), e)))),
    }
}
