
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

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/* -------------------------------------------------------------------------- */

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Generic(String),
    #[error("{0}")]
    IO(#[from] io::Error),
    #[error("executing command `{command}` failed ({status}):\n{stderr}")]
    ExternalTool {
        command: String,
        status : ExitStatus,
        stderr : String,
    },
    #[error("could not start command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source : io::Error,
    },
    #[error("input `{0}` is neither a FASTQ file nor an SRA accession")]
    AmbiguousInput(String),
    #[error("cannot derive output path: {0}")]
    PathDerivation(String),
    #[error("invalid metadata response: {0}")]
    MetadataParse(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/* -------------------------------------------------------------------------- */

impl From<String> for Error {
    fn from(str : String) -> Self {
        Error::Generic(str)
    }
}

impl From<&str> for Error {
    fn from(str : &str) -> Self {
        Error::Generic(str.to_string())
    }
}
