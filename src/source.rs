
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

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::info;
use regex::Regex;

use crate::command::{CommandPipeline, CommandRunner, CommandSpec, Redirect};
use crate::config::ToolPaths;
use crate::error::{Error, Result};

/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// Local reads, used as given.
    Fastq(PathBuf),
    /// SRA run accession that has to be downloaded first.
    Accession(String),
}

/* -------------------------------------------------------------------------- */

pub fn is_fastq(identifier: &str) -> bool {
    identifier.contains(".fastq") || identifier.contains(".fq")
}

// SRA, ENA and DDBJ run accessions
static ACCESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[SED]RR[0-9]+$").expect("invalid accession pattern")
});

pub fn is_sra_accession(identifier: &str) -> bool {
    ACCESSION.is_match(identifier)
}

pub fn classify(identifier: &str) -> Result<InputSource> {
    if is_fastq(identifier) {
        Ok(InputSource::Fastq(PathBuf::from(identifier)))
    } else if is_sra_accession(identifier) {
        Ok(InputSource::Accession(identifier.to_string()))
    } else {
        Err(Error::AmbiguousInput(identifier.to_string()))
    }
}

/* -------------------------------------------------------------------------- */

/// Path of the gzipped reads extracted for `accession`.
pub fn accession_fastq<P: AsRef<Path>>(working_directory: P, accession: &str) -> PathBuf {
    working_directory.as_ref().join(format!("{}_1.fastq.gz", accession))
}

/// Downloads an SRA run with `prefetch` and dumps its first read file
/// as gzip-compressed FASTQ. Both tools run inside `working_directory`.
pub fn download_accession<R: CommandRunner + ?Sized>(
    runner           : &mut R,
    tools            : &ToolPaths,
    working_directory: &Path,
    accession        : &str,
) -> Result<PathBuf> {

    let fastq = accession_fastq(working_directory, accession);

    info!("  -> Downloading {}.sra", accession);

    runner.run(&CommandPipeline::new(
        CommandSpec::new(&tools.prefetch)
            .arg(accession)
            .current_dir(working_directory)
    ))?;

    info!("  -> Convert {}.sra to FASTQ", accession);

    runner.run(&CommandPipeline::new(
        CommandSpec::new(&tools.fastq_dump)
            .args(["--split-files", "-Z", accession])
            .current_dir(working_directory)
        ).redirect(Redirect::GzipFile(fastq.clone()))
    )?;

    Ok(fastq)
}

/* -------------------------------------------------------------------------- */

/// Resolves the input of a run to a FASTQ path.
pub fn resolve<R: CommandRunner + ?Sized>(
    runner           : &mut R,
    tools            : &ToolPaths,
    working_directory: &Path,
    identifier       : &str,
) -> Result<PathBuf> {
    match classify(identifier)? {
        InputSource::Fastq(path) => Ok(path),
        InputSource::Accession(accession) => {
            info!("Given input {} is treated as an SRR accession. Downloading and converting...", accession);
            download_accession(runner, tools, working_directory, &accession)
        }
    }
}
