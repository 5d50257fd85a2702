
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

use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/* -------------------------------------------------------------------------- */

/// Orders bedgraph records the way `LC_ALL=C sort -k1,1 -k2,2n` does:
/// chromosome names byte by byte, then start positions numerically. Under
/// this order `chr10` precedes `chr2`.
pub fn compare_records(seqname_a: &str, from_a: u64, seqname_b: &str, from_b: u64) -> Ordering {
    seqname_a.as_bytes().cmp(seqname_b.as_bytes()).then(from_a.cmp(&from_b))
}

/* -------------------------------------------------------------------------- */

/// Verifies that a bedgraph stream is sorted as required by
/// `bedGraphToBigWig`. Returns the number of records.
pub fn check_sorted<R: BufRead>(reader: R) -> io::Result<usize> {

    let mut prev: Option<(String, u64)> = None;
    let mut n = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with("track") || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() != 4 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, format!("line {}: bedgraph file must have four columns", i+1)));
        }
        let from = u64::from_str(fields[1]).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("line {}: invalid integer in column 2", i+1)))?;
        let to   = u64::from_str(fields[2]).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("line {}: invalid integer in column 3", i+1)))?;

        if to < from {
            return Err(io::Error::new(io::ErrorKind::InvalidData, format!("line {}: interval end precedes start", i+1)));
        }
        if let Some((seqname, start)) = &prev {
            if compare_records(seqname, *start, fields[0], from) == Ordering::Greater {
                return Err(io::Error::new(io::ErrorKind::InvalidData, format!("line {}: `{}:{}` is out of order after `{}:{}`", i+1, fields[0], from, seqname, start)));
            }
        }
        prev = Some((fields[0].to_string(), from));
        n   += 1;
    }
    Ok(n)
}

pub fn check_sorted_file<P: AsRef<Path>>(filename: P) -> io::Result<usize> {
    let file = File::open(filename.as_ref()).map_err(|e| io::Error::new(e.kind(), format!("opening `{}` failed: {}", filename.as_ref().display(), e)))?;
    check_sorted(BufReader::new(file)).map_err(|e| io::Error::new(e.kind(), format!("`{}`: {}", filename.as_ref().display(), e)))
}

/* -------------------------------------------------------------------------- */
