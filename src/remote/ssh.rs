// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Transport over OpenSSH.
//!
//! Shells out to the `ssh` and `scp` binaries, so the user's own ssh
//! configuration, agent, and known hosts apply. Both binaries run in batch
//! mode, so a host that wants a password fails instead of blocking.
//!
//! Depending on its version, `scp` either hands the remote path to a remote
//! shell or takes it literally, so no single quoting style is right for both.
//! Uploads are therefore restricted to remote paths made of characters that
//! neither interpretation treats specially.

use crate::{
    config::HostEntry,
    remote::{RemoteOp, Result, Transport, TransportError},
};

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, instrument};

/// Transport that reaches a host through `ssh` and `scp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTransport {
    name: String,
    destination: String,
    port: Option<u16>,
    identity_file: Option<PathBuf>,
    connect_timeout: Option<u64>,
}

impl SshTransport {
    /// Construct new ssh transport from host entry.
    pub fn new(host: &HostEntry) -> Self {
        Self {
            name: host.name.clone(),
            destination: host.destination(),
            port: host.port,
            identity_file: host.identity_file.clone(),
            connect_timeout: host.connect_timeout,
        }
    }

    /// Options shared by `ssh` and `scp`.
    fn common_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-o".into(), "BatchMode=yes".into()];
        if let Some(timeout) = self.connect_timeout {
            args.push("-o".into());
            args.push(format!("ConnectTimeout={timeout}").into());
        }

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".into());
            args.push(identity_file.as_os_str().to_owned());
        }

        args
    }

    /// Full argument listing to run shell command through `ssh`.
    pub fn ssh_args(&self, command: &str) -> Vec<OsString> {
        let mut args = self.common_args();
        if let Some(port) = self.port {
            args.push("-p".into());
            args.push(port.to_string().into());
        }

        args.push(self.destination.as_str().into());
        args.push("--".into());
        args.push(command.into());
        args
    }

    /// Full argument listing to upload local file through `scp`.
    pub fn scp_args(&self, local: &Path, remote: &Path) -> Vec<OsString> {
        let mut args = self.common_args();
        if let Some(port) = self.port {
            args.push("-P".into());
            args.push(port.to_string().into());
        }

        args.push("-q".into());
        args.push(local.as_os_str().to_owned());
        args.push(format!("{}:{}", self.destination, remote.display()).into());
        args
    }
}

impl Transport for SshTransport {
    fn host(&self) -> &str {
        self.name.as_str()
    }

    #[instrument(skip(self), level = "debug")]
    fn upload(&self, local: &Path, remote: &Path) -> Result<()> {
        if !is_scp_safe(remote) {
            return Err(TransportError::UnsafePath {
                path: remote.to_path_buf(),
            });
        }

        syscall_non_interactive(&self.name, "scp", self.scp_args(local, remote))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn execute(&self, op: &RemoteOp) -> Result<String> {
        let command = op.to_shell();
        debug!("{}: {command}", self.name);
        syscall_non_interactive(&self.name, "ssh", self.ssh_args(&command))
    }
}

fn is_scp_safe(path: &Path) -> bool {
    path.to_str().is_some_and(|path| {
        path.chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "/._-+,=@".contains(ch))
    })
}

fn syscall_non_interactive(
    host: &str,
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let args = args.into_iter().map(|arg| arg.as_ref().to_owned()).collect::<Vec<_>>();
    let output = Command::new(cmd.as_ref())
        .args(&args)
        .output()
        .map_err(|err| TransportError::Spawn {
            source: err,
            program: program.clone(),
        })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    // INVARIANT: Chomp trailing newlines.
    let stdout = stdout.trim_end_matches(['\r', '\n']).to_string();

    if !output.status.success() {
        let command = std::iter::once(program.clone())
            .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");
        let mut message = String::new();
        if !stdout.is_empty() {
            message.push_str(format!("stdout: {stdout}\n").as_str());
        }

        if !stderr.is_empty() {
            message.push_str(format!("stderr: {stderr}").as_str());
        }

        return Err(TransportError::CommandFailed {
            host: host.to_string(),
            command,
            status: output.status.to_string(),
            message: message.trim_end().to_string(),
        });
    }

    Ok(stdout)
}
