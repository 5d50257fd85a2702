
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

#[cfg(test)]
mod tests {

    use std::fs::{self, File};
    use std::io::Read;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
use std::process::Command;

    use flate2::read::GzDecoder;

    use fastq2bigwig::command::ProcessRunner;
    use fastq2bigwig::config::{PipelineConfig, ToolPaths};
    use fastq2bigwig::genome::GenomeReference;
    use fastq2bigwig::pipeline::{Pipeline, PipelineRun, PipelineState};

    /* ---------------------------------------------------------------------- */

    const ALIGNER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -S) out="$2"; shift ;;
    -p) test "$2" = 4 || exit 9; shift ;;
  esac
  shift
done
printf '@HD\tVN:1.6\n' > "$out"
"#;

    const SAMTOOLS: &str = r#"#!/bin/sh
if [ "$1" = view ]; then
  cat "$5"
else
  cat > "$5"
fi
"#;

    const BEDTOOLS: &str = r#"#!/bin/sh
printf 'chr2\t5\t9\t1\nchr10\t5\t8\t1\nchr1\t100\t110\t2\nchr1\t20\t30\t2\n'
"#;

    const BEDGRAPH_TO_BIGWIG: &str = r#"#!/bin/sh
test -s "$2" || exit 1
cp "$1" "$3"
"#;

    const PREFETCH: &str = r#"#!/bin/sh
mkdir -p "$1" && touch "$1/$1.sra"
"#;

    const FASTQ_DUMP: &str = r#"#!/bin/sh
printf '@r1\nACGT\n+\nIIII\n'
"#;

    const FAILING: &str = r#"#!/bin/sh
echo "cannot open index" >&2
exit 1
"#;

    fn write_script(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /* ---------------------------------------------------------------------- */

    // A single test spawns all processes, so that no script is executed
    // while another test thread is still writing one.
    #[test]
    fn test_pipeline_end_to_end() {
        let bin  = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();

        let tools = ToolPaths {
            samtools          : write_script(bin.path(), "samtools", SAMTOOLS),
            bedtools          : write_script(bin.path(), "bedtools", BEDTOOLS),
            sort              : "sort".to_string(),
            bedgraph_to_bigwig: write_script(bin.path(), "bedGraphToBigWig", BEDGRAPH_TO_BIGWIG),
            prefetch          : write_script(bin.path(), "prefetch", PREFETCH),
            fastq_dump        : write_script(bin.path(), "fastq-dump", FASTQ_DUMP),
        };
        let aligner = write_script(bin.path(), "toolX", ALIGNER);
        let failing = write_script(bin.path(), "broken", FAILING);

        let genome = GenomeReference::new(work.path().join("ref.fa"));
        fs::write(genome.path(), ">chr1\nACGT\n").unwrap();
        fs::write(genome.fai_path(), "chr1\t248956422\t112\t70\t71\nchr10\t133797422\t252513167\t70\t71\nchr2\t242193529\t388220300\t70\t71\n").unwrap();

        let config = PipelineConfig::new(4, work.path().to_path_buf(), tools).unwrap();

        // FASTQ input
        let mut pipeline = Pipeline::new(config.clone(), genome.clone(), &aligner, ProcessRunner::new());

        let run    = pipeline.new_run("reads.fastq.gz");
        let report = pipeline.run(&run).unwrap();

        let reads = work.path().join("reads");

        assert_eq!(pipeline.state(), PipelineState::Done);
        assert!(reads.is_dir());
        assert_eq!(report.sam        .path, reads.join("reads.sam"));
        assert_eq!(report.bam        .path, reads.join("reads.sorted.bam"));
        assert_eq!(report.bedgraph   .path, reads.join("reads.bedgraph"));
        assert_eq!(report.chrom_sizes.path, reads.join("chrom.sizes"));
        assert_eq!(report.bigwig     .path, reads.join("reads.bw"));

        assert_eq!(fs::read_to_string(reads.join("reads.sorted.bam")).unwrap(), "@HD\tVN:1.6\n");
        assert_eq!(fs::read_to_string(reads.join("reads.bedgraph")).unwrap(), "chr1\t20\t30\t2\nchr1\t100\t110\t2\nchr10\t5\t8\t1\nchr2\t5\t9\t1\n");
        assert_eq!(fs::read_to_string(reads.join("chrom.sizes")).unwrap(), "chr1\t248956422\nchr10\t133797422\nchr2\t242193529\n");
        assert!(reads.join("reads.bw").exists());

        // re-running overwrites the same paths
        let again = pipeline.run(&run).unwrap();
        assert_eq!(again, report);

        // SRA accession
        let mut pipeline = Pipeline::new(config.clone(), genome.clone(), &aligner, ProcessRunner::new());

        let report = pipeline.run(&PipelineRun::new("SRR000001", work.path(), 4)).unwrap();

        assert_eq!(report.fastq, work.path().join("SRR000001_1.fastq.gz"));
        assert!(work.path().join("SRR000001").join("SRR000001.sra").exists());
        assert_eq!(report.bigwig.path, work.path().join("SRR000001_1").join("SRR000001_1.bw"));

        let mut content = String::new();
        GzDecoder::new(File::open(&report.fastq).unwrap()).read_to_string(&mut content).unwrap();
        assert_eq!(content, "@r1\nACGT\n+\nIIII\n");

        // command line tool
        let output = Command::new(env!("CARGO_BIN_EXE_fastq-to-bigwig"))
            .arg("cli_reads.fastq.gz")
            .arg(genome.path())
            .arg(&aligner)
            .args(["--cores", "4"])
            .arg("--working-directory").arg(work.path())
            .arg("--samtools"          ).arg(&config.tools.samtools)
            .arg("--bedtools"          ).arg(&config.tools.bedtools)
            .arg("--bedgraph-to-bigwig").arg(&config.tools.bedgraph_to_bigwig)
            .output()
            .unwrap();

        let bigwig = work.path().join("cli_reads").join("cli_reads.bw");

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), format!("Done! BigWig file generated at: {}", bigwig.display()));
        assert!(bigwig.exists());

        let output = Command::new(env!("CARGO_BIN_EXE_fastq-to-bigwig"))
            .arg("cli_other.fastq")
            .arg(genome.path())
            .arg(&failing)
            .arg("--working-directory").arg(work.path())
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("cannot open index"));
        assert!(output.stdout.is_empty());

        // failing aligner aborts before any later stage
        let mut pipeline = Pipeline::new(config, genome, &failing, ProcessRunner::new());

        let r = pipeline.run(&PipelineRun::new("other.fastq", work.path(), 4));

        assert!(r.is_err());
        assert!(r.unwrap_err().to_string().contains("cannot open index"));
        assert_eq!(pipeline.state(), PipelineState::Aborted);
        assert!(work.path().join("other").is_dir());
        assert!(!work.path().join("other").join("other.sorted.bam").exists());
        assert!(!work.path().join("other").join("other.bw").exists());
    }
}
