
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

use std::path::Path;

use log::{debug, info};

use crate::artifact::{Artifact, ArtifactFormat, ArtifactNamer, Stage};
use crate::bedgraph::check_sorted_file;
use crate::command::{CommandPipeline, CommandRunner, CommandSpec, Redirect};
use crate::config::ToolPaths;
use crate::error::Result;
use crate::genome::{ChromSizes, GenomeReference};

/* -------------------------------------------------------------------------- */

pub fn align_command(aligner: &Path, genome: &GenomeReference, fastq: &Path, sam: &Path, cores: usize) -> CommandPipeline {
    CommandPipeline::new(
        CommandSpec::new(aligner)
            .arg("-x").arg(genome.path())
            .arg("-U").arg(fastq)
            .arg("-S").arg(sam)
            .arg("-p").arg(cores.to_string())
    )
}

pub fn sam_to_bam_command(tools: &ToolPaths, sam: &Path, bam: &Path, cores: usize) -> CommandPipeline {
    CommandPipeline::new(
        CommandSpec::new(&tools.samtools)
            .arg("view")
            .arg("-@").arg(cores.to_string())
            .arg("-Sb").arg(sam)
    ).pipe(
        CommandSpec::new(&tools.samtools)
            .arg("sort")
            .arg("-@").arg(cores.to_string())
            .arg("-o").arg(bam)
    )
}

/// Coverage is sorted by chromosome and start under the `C` locale, which
/// is the order `bedGraphToBigWig` expects.
pub fn bedgraph_command(tools: &ToolPaths, genome: &GenomeReference, bam: &Path, bedgraph: &Path, cores: usize) -> CommandPipeline {
    CommandPipeline::new(
        CommandSpec::new(&tools.bedtools)
            .args(["genomecov", "-bg", "-ibam"]).arg(bam)
            .arg("-g").arg(genome.path())
    ).pipe(
        CommandSpec::new(&tools.sort)
            .env("LC_ALL", "C")
            .env("LC_COLLATE", "C")
            .args(["-k1,1", "-k2,2n"])
            .arg(format!("--parallel={}", cores))
    ).redirect(Redirect::File(bedgraph.to_path_buf()))
}

pub fn bigwig_command(tools: &ToolPaths, bedgraph: &Path, chrom_sizes: &Path, bigwig: &Path) -> CommandPipeline {
    CommandPipeline::new(
        CommandSpec::new(&tools.bedgraph_to_bigwig)
            .arg(bedgraph)
            .arg(chrom_sizes)
            .arg(bigwig)
    )
}

/* -------------------------------------------------------------------------- */

/// Aligns single-end reads and writes `<base>.sam`.
pub fn align<R: CommandRunner + ?Sized>(
    runner : &mut R,
    namer  : &ArtifactNamer,
    fastq  : &Path,
    genome : &GenomeReference,
    aligner: &Path,
    cores  : usize,
) -> Result<Artifact> {
    let artifact = namer.artifact(Stage::Align);
    runner.run(&align_command(aligner, genome, fastq, &artifact.path, cores))?;
    Ok(artifact)
}

/// Converts the alignment to a coordinate-sorted BAM file.
pub fn sam_to_bam<R: CommandRunner + ?Sized>(
    runner: &mut R,
    tools : &ToolPaths,
    namer : &ArtifactNamer,
    sam   : &Artifact,
    cores : usize,
) -> Result<Artifact> {
    let artifact = namer.artifact(Stage::SamToBam);
    runner.run(&sam_to_bam_command(tools, &sam.path, &artifact.path, cores))?;
    Ok(artifact)
}

/// Computes a sorted coverage track in bedgraph format. If `check` is set
/// the sort order of the result is verified before it is returned.
pub fn generate_bedgraph<R: CommandRunner + ?Sized>(
    runner: &mut R,
    tools : &ToolPaths,
    namer : &ArtifactNamer,
    bam   : &Artifact,
    genome: &GenomeReference,
    cores : usize,
    check : bool,
) -> Result<Artifact> {
    let artifact = namer.artifact(Stage::BedgraphGenerate);
    runner.run(&bedgraph_command(tools, genome, &bam.path, &artifact.path, cores))?;
    if check {
        let n = check_sorted_file(&artifact.path)?;
        debug!("Bedgraph `{}` is sorted ({} records)", artifact.path.display(), n);
    }
    Ok(artifact)
}

/// Writes the two-column chromosome sizes table taken from the FASTA index
/// of the genome into the run directory.
pub fn write_chrom_sizes(namer: &ArtifactNamer, genome: &GenomeReference) -> Result<Artifact> {
    let path = namer.chrom_sizes();

    info!("{}", path.display());

    ChromSizes::import_fai(genome)?.export(&path)?;

    Ok(Artifact {
        path,
        stage : Stage::BigwigEncode,
        format: ArtifactFormat::ChromSizes,
    })
}

/// Encodes the bedgraph as BigWig. Returns the chromosome sizes table and
/// the BigWig file.
pub fn bedgraph_to_bigwig<R: CommandRunner + ?Sized>(
    runner  : &mut R,
    tools   : &ToolPaths,
    namer   : &ArtifactNamer,
    bedgraph: &Artifact,
    genome  : &GenomeReference,
) -> Result<(Artifact, Artifact)> {
    let chrom_sizes = write_chrom_sizes(namer, genome)?;
    let artifact    = namer.artifact(Stage::BigwigEncode);
    runner.run(&bigwig_command(tools, &bedgraph.path, &chrom_sizes.path, &artifact.path))?;
    Ok((chrom_sizes, artifact))
}
