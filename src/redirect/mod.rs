//! Traffic redirection subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → hosts.rs: does the table map domain → listener address?
//!         yes → nothing to do
//!         no, elevated → append one line
//!         no, not elevated → privilege.rs relaunch elevated, caller exits
//!     → any failure → manual-edit guidance, startup continues
//! ```
//!
//! # Design Decisions
//! - Check-then-append; the table is never rewritten line by line
//! - Entries are never removed

pub mod hosts;
pub mod privilege;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use hosts::{HostsEntry, HostsTable};
pub use privilege::{platform_privilege, PrivilegeProvider, UnixPrivilege, WindowsPrivilege};

/// Errors raised while redirecting the domain.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// Reading or writing the hosts file failed.
    #[error("cannot access hosts file {}: {source}", path.display())]
    Hosts {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The privilege level could not be determined.
    #[error("cannot determine privilege level: {0}")]
    Privilege(String),

    /// Relaunching elevated failed.
    #[error("failed to acquire administrator privilege: {0}")]
    Elevation(String),
}

/// What [`ensure_redirect`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The mapping already existed.
    AlreadyPresent,
    /// The mapping was appended.
    Added,
    /// An elevated instance was started; this process should exit.
    NeedsElevation,
}

/// Make sure `domain` resolves to `target` through the hosts table.
pub fn ensure_redirect(
    hosts_path: &Path,
    domain: &str,
    target: IpAddr,
    privilege: &dyn PrivilegeProvider,
) -> Result<RedirectOutcome, RedirectError> {
    let hosts_error = |source| RedirectError::Hosts {
        path: hosts_path.to_path_buf(),
        source,
    };

    let mut table = HostsTable::open(hosts_path).map_err(hosts_error)?;
    if table.has(target, domain) {
        tracing::info!(domain, %target, "Hosts table already redirects the domain");
        return Ok(RedirectOutcome::AlreadyPresent);
    }

    for other in table.addresses_for(domain) {
        tracing::warn!(domain, address = %other, "Hosts table maps the domain elsewhere");
    }

    if privilege.is_elevated()? {
        table.append(target, domain).map_err(hosts_error)?;
        tracing::info!(domain, %target, path = %hosts_path.display(), "Added hosts entry");
        Ok(RedirectOutcome::Added)
    } else {
        tracing::info!("Requesting administrator privilege to edit the hosts file");
        privilege.relaunch_elevated()?;
        Ok(RedirectOutcome::NeedsElevation)
    }
}

/// Operator guidance for adding the mapping by hand.
pub fn manual_edit_guidance(hosts_path: &Path, domain: &str, target: IpAddr) -> String {
    [
        "To edit the hosts file manually:".to_string(),
        "\t1) Open a text editor with administrator privileges".to_string(),
        format!("\t2) Open {}", hosts_path.display()),
        "\t3) Add the following line at the end and save".to_string(),
        format!("\t\t{} {}", target, domain),
    ]
    .join("\n")
}
