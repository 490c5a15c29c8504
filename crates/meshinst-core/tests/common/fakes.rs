//! Test doubles for the process and cluster capabilities, plus archive builders.

use flate2::write::GzEncoder;
use flate2::Compression;
use meshinst_core::cluster::{ApplyOptions, ClusterClient, ClusterError};
use meshinst_core::process::{ProcessOutput, ProcessRunner};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Plays istioctl: prints `manifest` on success or `stderr` with exit 1.
pub struct FakeIstioctl {
    pub manifest: String,
    pub fail_with: Option<String>,
    pub invocations: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeIstioctl {
    pub fn printing(manifest: &str) -> Self {
        Self {
            manifest: manifest.to_string(),
            fail_with: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            manifest: String::new(),
            fail_with: Some(stderr.to_string()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeIstioctl {
    fn run(&self, program: &Path, args: &[&str], _stdin: Option<&[u8]>) -> io::Result<ProcessOutput> {
        self.invocations.lock().unwrap().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(match &self.fail_with {
            Some(stderr) => ProcessOutput {
                success: false,
                code: Some(1),
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            },
            None => ProcessOutput {
                success: true,
                code: Some(0),
                stdout: self.manifest.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        })
    }
}

/// Records every manifest it is asked to apply.
#[derive(Default)]
pub struct RecordingCluster {
    pub applied: Mutex<Vec<(Vec<u8>, ApplyOptions)>>,
}

impl RecordingCluster {
    pub fn applied(&self) -> Vec<(Vec<u8>, ApplyOptions)> {
        self.applied.lock().unwrap().clone()
    }
}

impl ClusterClient for RecordingCluster {
    fn apply_manifest(&self, contents: &[u8], opts: &ApplyOptions) -> Result<(), ClusterError> {
        self.applied
            .lock()
            .unwrap()
            .push((contents.to_vec(), opts.clone()));
        Ok(())
    }
}

/// A release `.tar.gz` as published upstream: a single top-level `istioctl`.
pub fn istioctl_tarball(contents: &[u8]) -> Vec<u8> {
    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(enc);
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_mode(0o755);
    header.set_size(contents.len() as u64);
    builder.append_data(&mut header, "istioctl", contents).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}
