
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

/* -------------------------------------------------------------------------- */

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/* -------------------------------------------------------------------------- */

/// Read-only genome given on the command line. The same path is handed to
/// the aligner as index prefix and to bedtools as genome file; a FASTA
/// index `<path>.fai` must exist next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomeReference {
    path: PathBuf,
}

impl GenomeReference {

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GenomeReference { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fai_path(&self) -> PathBuf {
        let mut s = self.path.clone().into_os_string();
        s.push(".fai");
        PathBuf::from(s)
    }

}

/* -------------------------------------------------------------------------- */

/// Ordered chromosome names and lengths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromSizes {
    pub seqnames: Vec<String>,
    pub lengths : Vec<u64>,
}

/* -------------------------------------------------------------------------- */

impl ChromSizes {

    pub fn new(seqnames: Vec<String>, lengths: Vec<u64>) -> io::Result<Self> {
        if seqnames.len() != lengths.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("{} sequence names but {} lengths", seqnames.len(), lengths.len())));
        }
        Ok(ChromSizes { seqnames, lengths })
    }

    pub fn length(&self) -> usize {
        self.seqnames.len()
    }

    pub fn seq_length(&self, seqname: &str) -> Option<u64> {
        self.seqnames.iter().position(|s| s == seqname).map(|i| self.lengths[i])
    }

    /// Reads the first two columns of a tab separated table, which covers
    /// both `.fai` indices and `chrom.sizes` files.
    pub fn read<R: Read>(reader: R) -> io::Result<Self> {
        let reader = BufReader::new(reader);
        let mut seqnames = Vec::new();
        let mut lengths  = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, format!("line {}: expected at least two columns", i+1)));
            }
            let length: u64 = fields[1].trim().parse().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {}", i+1, e)))?;
            seqnames.push(fields[0].to_string());
            lengths .push(length);
        }
        ChromSizes::new(seqnames, lengths)
    }

    pub fn import<P: AsRef<Path>>(filename: P) -> io::Result<Self> {
        let file = File::open(filename.as_ref()).map_err(|e| io::Error::new(e.kind(), format!("opening `{}` failed: {}", filename.as_ref().display(), e)))?;
        Self::read(file).map_err(|e| io::Error::new(e.kind(), format!("reading `{}` failed: {}", filename.as_ref().display(), e)))
    }

    pub fn import_fai(genome: &GenomeReference) -> io::Result<Self> {
        Self::import(genome.fai_path())
    }

    pub fn write<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        for (seqname, length) in self.seqnames.iter().zip(self.lengths.iter()) {
            writeln!(writer, "{}\t{}", seqname, length)?;
        }
        writer.flush()
    }

    pub fn export<P: AsRef<Path>>(&self, filename: P) -> io::Result<()> {
        let file = File::create(filename.as_ref()).map_err(|e| io::Error::new(e.kind(), format!("creating `{}` failed: {}", filename.as_ref().display(), e)))?;
        self.write(file)
    }

}

/* -------------------------------------------------------------------------- */

impl fmt::Display for ChromSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>10}", "seqnames", "lengths")?;
        for (seqname, length) in self.seqnames.iter().zip(self.lengths.iter()) {
            writeln!(f, "{:<10} {:>10}", seqname, length)?;
        }
        Ok(())
    }
}
