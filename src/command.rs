
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

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;

use crate::error::{Error, Result};

/* -------------------------------------------------------------------------- */

const SIGPIPE: i32 = 13;

/* -------------------------------------------------------------------------- */

/// A single external program with an explicit argument list. Nothing is
/// ever passed through a shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program    : OsString,
    pub args       : Vec<OsString>,
    pub env        : Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {

    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        CommandSpec {
            program    : program.as_ref().to_os_string(),
            args       : Vec::new(),
            env        : Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    pub fn env<K: AsRef<OsStr>, V: AsRef<OsStr>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

}

/* -------------------------------------------------------------------------- */

fn quote(s: &OsStr) -> String {
    let s = s.to_string_lossy();
    let safe = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "-_./,:=+@%".contains(c));
    if safe {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key.to_string_lossy(), quote(value))?;
        }
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/* -------------------------------------------------------------------------- */

/// Destination of the standard output of the last command in a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
    Capture,
    File(PathBuf),
    GzipFile(PathBuf),
}

/// One or more commands whose standard output and input are chained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandPipeline {
    pub commands: Vec<CommandSpec>,
    pub redirect: Redirect,
}

impl CommandPipeline {

    pub fn new(command: CommandSpec) -> Self {
        CommandPipeline {
            commands: vec![command],
            redirect: Redirect::Capture,
        }
    }

    pub fn pipe(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    pub fn redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = redirect;
        self
    }

}

impl fmt::Display for CommandPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", command)?;
        }
        match &self.redirect {
            Redirect::Capture        => Ok(()),
            Redirect::File(path)     => write!(f, " > {}", quote(path.as_os_str())),
            Redirect::GzipFile(path) => write!(f, " | gzip > {}", quote(path.as_os_str())),
        }
    }
}

/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output of the last command, empty if it was redirected.
    pub stdout: Vec<u8>,
}

/// Executes command pipelines. A run either succeeds completely or returns
/// an error; the runner never checks the files a command was supposed to
/// write.
pub trait CommandRunner {
    fn run(&mut self, pipeline: &CommandPipeline) -> Result<CommandOutput>;
}

/* -------------------------------------------------------------------------- */

struct RunningProcess {
    command: String,
    child  : Child,
    stderr : JoinHandle<Vec<u8>>,
}

fn drain_stderr(stderr: Option<ChildStderr>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_end(&mut buf);
        }
        buf
    })
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| Error::IO(io::Error::new(e.kind(), format!("creating `{}` failed: {}", path.display(), e))))
}

fn compress<R: Read>(reader: &mut R, file: File) -> io::Result<()> {
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    io::copy(reader, &mut encoder)?;
    encoder.finish()?.flush()
}

fn kill_all(processes: &mut [RunningProcess]) {
    for process in processes.iter_mut() {
        let _ = process.child.kill();
        let _ = process.child.wait();
    }
}

/// A producer killed by a broken pipe only reflects a failure further
/// down the pipe.
fn is_broken_pipe(status: &ExitStatus) -> bool {
    status.signal() == Some(SIGPIPE) || status.code() == Some(128 + SIGPIPE)
}

/// Picks the failure to report, following `pipefail`: the last failing
/// process that did not die of a broken pipe, else the last failing one.
fn select_failure(mut failed: Vec<(ExitStatus, String)>) -> Option<(ExitStatus, String)> {
    match failed.iter().rposition(|(status, _)| !is_broken_pipe(status)) {
        Some(i) => Some(failed.swap_remove(i)),
        None    => failed.pop(),
    }
}

/* -------------------------------------------------------------------------- */

/// Runs pipelines as operating system processes. Standard error of every
/// process is captured separately and reported when the process fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner
    }
}

impl CommandRunner for ProcessRunner {

    fn run(&mut self, pipeline: &CommandPipeline) -> Result<CommandOutput> {

        if pipeline.commands.is_empty() {
            return Err(Error::Generic("cannot run an empty command pipeline".to_string()));
        }

        let line = pipeline.to_string();

        debug!("Executing `{}`", line);

        let (mut plain, gzip) = match &pipeline.redirect {
            Redirect::Capture        => (None, None),
            Redirect::File(path)     => (Some(create_output(path)?), None),
            Redirect::GzipFile(path) => (None, Some(create_output(path)?)),
        };

        let n = pipeline.commands.len();

        let mut processes: Vec<RunningProcess> = Vec::with_capacity(n);
        let mut upstream = None;

        for (i, spec) in pipeline.commands.iter().enumerate() {
            let mut cmd = spec.to_command();

            match upstream.take() {
                Some(stdout) => cmd.stdin(Stdio::from(stdout)),
                None         => cmd.stdin(Stdio::null()),
            };
            match plain.take() {
                Some(file) if i + 1 == n => cmd.stdout(file),
                file => {
                    plain = file;
                    cmd.stdout(Stdio::piped())
                }
            };
            cmd.stderr(Stdio::piped());

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(source) => {
                    kill_all(&mut processes);
                    return Err(Error::Spawn { command: spec.to_string(), source });
                }
            };
            if i + 1 < n {
                upstream = child.stdout.take();
            }
            let stderr = drain_stderr(child.stderr.take());

            processes.push(RunningProcess { command: spec.to_string(), child, stderr });
        }

        let mut stdout = Vec::new();

        let copied = match processes.last_mut().and_then(|p| p.child.stdout.take()) {
            Some(mut out) => match gzip {
                Some(file) => compress(&mut out, file),
                None       => out.read_to_end(&mut stdout).map(|_| ()),
            },
            None => Ok(()),
        };
        if let Err(e) = copied {
            kill_all(&mut processes);
            return Err(Error::IO(e));
        }

        let mut io_error = None;
        let mut failed   = Vec::new();

        for mut process in processes {
            let status = process.child.wait();
            let stderr = String::from_utf8_lossy(&process.stderr.join().unwrap_or_default()).into_owned();

            match status {
                Err(e) => {
                    if io_error.is_none() {
                        io_error = Some(e);
                    }
                }
                Ok(status) if !status.success() => {
                    debug!("Command `{}` exited with {}", process.command, status);
                    failed.push((status, stderr));
                }
                Ok(_) => {
                    if !stderr.trim().is_empty() {
                        debug!("{}", stderr.trim_end());
                    }
                }
            }
        }

        let failure = select_failure(failed)
            .map(|(status, stderr)| Error::ExternalTool { command: line, status, stderr })
            .or(io_error.map(Error::IO));

        match failure {
            Some(err) => Err(err),
            None      => Ok(CommandOutput { stdout }),
        }
    }

}
