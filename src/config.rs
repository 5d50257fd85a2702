
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

use crate::error::{Error, Result};

/* -------------------------------------------------------------------------- */

/// Executables of all external tools except the aligner, which is always
/// given explicitly. Bare names are resolved through `PATH`.
#[derive(Clone, Debug)]
pub struct ToolPaths {
    pub samtools          : String,
    pub bedtools          : String,
    pub sort              : String,
    pub bedgraph_to_bigwig: String,
    pub prefetch          : String,
    pub fastq_dump        : String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            samtools          : "samtools".to_string(),
            bedtools          : "bedtools".to_string(),
            sort              : "sort".to_string(),
            bedgraph_to_bigwig: "bedGraphToBigWig".to_string(),
            prefetch          : "prefetch".to_string(),
            fastq_dump        : "fastq-dump".to_string(),
        }
    }
}

/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Thread count forwarded to the external tools.
    pub cores            : usize,
    /// Directory below which the run directory and downloaded reads are placed.
    pub working_directory: PathBuf,
    pub tools            : ToolPaths,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            cores            : 1,
            working_directory: PathBuf::from("."),
            tools            : ToolPaths::default(),
        }
    }
}

impl PipelineConfig {

    pub fn new(cores: usize, working_directory: PathBuf, tools: ToolPaths) -> Result<Self> {
        let config = PipelineConfig { cores, working_directory, tools };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cores == 0 {
            return Err(Error::Generic("number of cores must be at least one".to_string()));
        }
        if self.working_directory.as_os_str().is_empty() {
            return Err(Error::PathDerivation("working directory is empty".to_string()));
        }
        Ok(())
    }

}

/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {

    use std::path::PathBuf;

    use super::{PipelineConfig, ToolPaths};

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();

        assert_eq!(config.cores, 1);
        assert_eq!(config.working_directory, PathBuf::from("."));
        assert_eq!(config.tools.bedgraph_to_bigwig, "bedGraphToBigWig");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_zero_cores() {
        let r = PipelineConfig::new(0, PathBuf::from("."), ToolPaths::default());

        assert!(r.is_err());
    }
}
