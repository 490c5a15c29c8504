//! External process capability.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs a program to completion, capturing stdout and stderr.
pub trait ProcessRunner {
    /// `Err` only when the program could not be launched or its pipes failed;
    /// a non-zero exit is reported through [`ProcessOutput::success`].
    fn run(&self, program: &Path, args: &[&str], stdin: Option<&[u8]>) -> io::Result<ProcessOutput>;
}

/// Runs programs with `std::process::Command`, blocking until they exit.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str], stdin: Option<&[u8]>) -> io::Result<ProcessOutput> {
        tracing::debug!(program = %program.display(), ?args, "spawning");
        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // The child may fill its stdout pipe before it has read all of stdin,
        // so stdin is fed from its own thread while the pipes are drained here.
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_vec();
                // Dropping the pipe when the thread ends sends EOF.
                Some(thread::spawn(move || pipe.write_all(&input)))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| io::Error::other("stdin writer panicked"))?;
            match written {
                // The child exited without reading everything; its status says why.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
