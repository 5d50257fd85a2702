
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

#[cfg(test)]
mod tests {

    use std::fs;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use crate::artifact::Stage;
    use crate::command::{CommandOutput, CommandPipeline, CommandRunner, Redirect};
    use crate::config::PipelineConfig;
    use crate::error::{Error, Result};
    use crate::genome::GenomeReference;
    use crate::pipeline::{Pipeline, PipelineRun, PipelineState};

    /* ---------------------------------------------------------------------- */

    /// Records all pipelines and fails on the `fail_at`-th call.
    struct RecordingRunner {
        calls  : Vec<CommandPipeline>,
        fail_at: Option<usize>,
    }

    impl RecordingRunner {
        fn new(fail_at: Option<usize>) -> Self {
            RecordingRunner { calls: Vec::new(), fail_at }
        }
        fn programs(&self) -> Vec<String> {
            self.calls.iter().map(|p| p.commands[0].program.to_string_lossy().into_owned()).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, pipeline: &CommandPipeline) -> Result<CommandOutput> {
            self.calls.push(pipeline.clone());
            if self.fail_at == Some(self.calls.len()) {
                return Err(Error::ExternalTool {
                    command: pipeline.to_string(),
                    status : ExitStatus::from_raw(1 << 8),
                    stderr : "simulated failure".to_string(),
                });
            }
            match &pipeline.redirect {
                Redirect::File(path) | Redirect::GzipFile(path) => {
                    fs::write(path, "chr1\t0\t10\t1\nchr10\t0\t5\t2\nchr2\t0\t5\t2\n")?;
                }
                Redirect::Capture => (),
            }
            Ok(CommandOutput::default())
        }
    }

    fn setup() -> (tempfile::TempDir, GenomeReference) {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        fs::write(&fasta, ">chr1\nACGT\n").unwrap();
        fs::write(dir.path().join("ref.fa.fai"), "chr1\t4\t6\t4\t5\n").unwrap();
        (dir, GenomeReference::new(fasta))
    }

    /* ---------------------------------------------------------------------- */

    #[test]
    fn test_pipeline_stage_order() {
        let (dir, genome) = setup();

        let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(None));

        assert_eq!(pipeline.state(), PipelineState::Ready);

        let run    = PipelineRun::new("sample.fastq.gz", dir.path(), 2);
        let report = pipeline.run(&run).unwrap();

        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(pipeline.runner().programs(), vec!["toolX", "samtools", "bedtools", "bedGraphToBigWig"]);

        assert_eq!(report.sam     .stage, Stage::Align);
        assert_eq!(report.bam     .stage, Stage::SamToBam);
        assert_eq!(report.bedgraph.stage, Stage::BedgraphGenerate);
        assert_eq!(report.bigwig  .stage, Stage::BigwigEncode);
        assert_eq!(report.bigwig.path, dir.path().join("sample").join("sample.bw"));

        assert_eq!(fs::read_to_string(&report.chrom_sizes.path).unwrap(), "chr1\t4\n");
    }

    #[test]
    fn test_pipeline_abort() {
        for fail_at in 1..=4 {
            let (dir, genome) = setup();

            let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(Some(fail_at)));

            let r = pipeline.run(&PipelineRun::new("sample.fastq", dir.path(), 1));

            assert!(matches!(r, Err(Error::ExternalTool { .. })));
            assert_eq!(pipeline.state(), PipelineState::Aborted);
            // nothing runs after the failing command
            assert_eq!(pipeline.runner().calls.len(), fail_at);
        }
    }

    #[test]
    fn test_pipeline_accession() {
        let (dir, genome) = setup();

        let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(None));

        let report = pipeline.run(&PipelineRun::new("SRR000001", dir.path(), 1)).unwrap();

        assert_eq!(&pipeline.runner().programs()[..2], &["prefetch", "fastq-dump"]);
        assert_eq!(report.fastq, dir.path().join("SRR000001_1.fastq.gz"));
        assert_eq!(report.run_directory, dir.path().join("SRR000001_1"));
    }

    #[test]
    fn test_pipeline_invalid_input() {
        let (dir, genome) = setup();

        let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(None));

        let r = pipeline.run(&PipelineRun::new("reads.txt", dir.path(), 1));

        assert!(matches!(r, Err(Error::AmbiguousInput(_))));
        assert_eq!(pipeline.state(), PipelineState::Aborted);
        assert!(pipeline.runner().calls.is_empty());
    }

    #[test]
    fn test_pipeline_missing_fai() {
        let (dir, _) = setup();

        let genome = GenomeReference::new(dir.path().join("other.fa"));

        let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(None));

        let r = pipeline.run(&PipelineRun::new("sample.fastq", dir.path(), 1));

        assert!(matches!(r, Err(Error::IO(_))));
        // the encoder never runs without chromosome sizes
        assert_eq!(pipeline.runner().calls.len(), 3);
    }

    #[test]
    fn test_pipeline_zero_cores() {
        let (dir, genome) = setup();

        let mut pipeline = Pipeline::new(PipelineConfig::default(), genome, "toolX", RecordingRunner::new(None));

        assert!(pipeline.run(&PipelineRun::new("sample.fastq", dir.path(), 0)).is_err());
        assert!(pipeline.runner().calls.is_empty());
    }
}
