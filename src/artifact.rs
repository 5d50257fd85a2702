
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
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/* -------------------------------------------------------------------------- */

/// Name of the chromosome sizes table inside a run directory.
pub const CHROM_SIZES_FILENAME: &str = "chrom.sizes";

/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Align,
    SamToBam,
    BedgraphGenerate,
    BigwigEncode,
}

impl Stage {

    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Align, Stage::SamToBam, Stage::BedgraphGenerate, Stage::BigwigEncode];

    pub fn extension(&self) -> &'static str {
        match self {
            Stage::Align            => "sam",
            Stage::SamToBam         => "sorted.bam",
            Stage::BedgraphGenerate => "bedgraph",
            Stage::BigwigEncode     => "bw",
        }
    }

    pub fn format(&self) -> ArtifactFormat {
        match self {
            Stage::Align            => ArtifactFormat::Sam,
            Stage::SamToBam         => ArtifactFormat::SortedBam,
            Stage::BedgraphGenerate => ArtifactFormat::Bedgraph,
            Stage::BigwigEncode     => ArtifactFormat::BigWig,
        }
    }

}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Align            => "align",
            Stage::SamToBam         => "sam-to-bam",
            Stage::BedgraphGenerate => "bedgraph",
            Stage::BigwigEncode     => "bigwig",
        };
        f.pad(name)
    }
}

/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    Sam,
    SortedBam,
    Bedgraph,
    ChromSizes,
    BigWig,
}

/// A file written by one stage of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path  : PathBuf,
    pub stage : Stage,
    pub format: ArtifactFormat,
}

/* -------------------------------------------------------------------------- */

/// Strips every extension from the file name of `identifier`, i.e.
/// `data/sample.fastq.gz` becomes `sample`. Applying it to its own result
/// returns the same value.
///
/// # Errors
///
/// Fails if nothing is left of the file name, e.g. for `.fastq`.
pub fn base_name(identifier: &str) -> Result<String> {
    let filename = Path::new(identifier)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = match filename.find('.') {
        Some(i) => &filename[..i],
        None    => &filename[..],
    };
    if base.is_empty() {
        return Err(Error::PathDerivation(format!("no base name left for input `{}`", identifier)));
    }
    Ok(base.to_string())
}

/* -------------------------------------------------------------------------- */

/// Maps stages to artifact paths of a single run. All paths are rooted at
/// `<working_directory>/<base_name>/` and depend on nothing else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactNamer {
    run_directory: PathBuf,
    base_name    : String,
}

impl ArtifactNamer {

    pub fn new<P: AsRef<Path>>(working_directory: P, base_name: &str) -> Self {
        ArtifactNamer {
            run_directory: working_directory.as_ref().join(base_name),
            base_name    : base_name.to_string(),
        }
    }

    pub fn from_input<P: AsRef<Path>>(working_directory: P, identifier: &str) -> Result<Self> {
        Ok(ArtifactNamer::new(working_directory, &base_name(identifier)?))
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn run_directory(&self) -> &Path {
        &self.run_directory
    }

    pub fn path(&self, stage: Stage) -> PathBuf {
        self.run_directory.join(format!("{}.{}", self.base_name, stage.extension()))
    }

    pub fn artifact(&self, stage: Stage) -> Artifact {
        Artifact {
            path  : self.path(stage),
            stage,
            format: stage.format(),
        }
    }

    pub fn chrom_sizes(&self) -> PathBuf {
        self.run_directory.join(CHROM_SIZES_FILENAME)
    }

}
