//! Runs the external bundle build.
//!
//! The configured program receives the [`BuildRequest`] as JSON on stdin and
//! is run from the project root. Bundles it leaves in the output directory
//! are reported as produced.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use streamer_core::bundles::{BuildCommand, BuildError, BuildRequest, Result};
use tracing::{debug, info};

pub struct ExternalBuild {
    program: String,
    args: Vec<String>,
    root: PathBuf,
}

impl ExternalBuild {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String], root: PathBuf) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            root,
        })
    }
}

impl BuildCommand for ExternalBuild {
    fn build(&self, request: &BuildRequest) -> Result<Vec<String>> {
        let payload = serde_json::to_vec(request).map_err(|e| BuildError::Launch(e.to_string()))?;

        info!(
            "Running {} for {} bundles ({})",
            self.program,
            request.bundles.len(),
            request.platform
        );
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::Launch(format!("{}: {}", self.program, e)))?;

        // Feed stdin from its own thread while the output pipes are drained
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || match stdin.write_all(&payload) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|e| BuildError::Launch(e.to_string()))?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| BuildError::Launch("stdin writer panicked".to_string()))?
                .map_err(|e| BuildError::Launch(e.to_string()))?;
        }
        debug!("Build stdout: {}", String::from_utf8_lossy(&output.stdout).trim());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BuildError::Failed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        let produced = request
            .bundles
            .iter()
            .map(|bundle| format!("{}/{}", request.output_dir.trim_end_matches('/'), bundle.name))
            .filter(|path| self.root.join(path).exists())
            .collect();
        Ok(produced)
    }
}
