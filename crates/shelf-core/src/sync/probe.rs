//! Detection of credentials for unattended remote access.

use std::process::{Command, Stdio};

/// Reports whether a background poll could authenticate without prompting.
pub trait CredentialProbe: Send + Sync {
    fn agent_available(&self) -> bool;
}

/// Probe that asks `ssh-add -l` whether the agent holds any identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshAgentProbe;

impl CredentialProbe for SshAgentProbe {
    fn agent_available(&self) -> bool {
        Command::new("ssh-add")
            .arg("-l")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
