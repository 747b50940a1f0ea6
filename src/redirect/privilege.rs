//! Process privilege capability.
//!
//! Editing the hosts table needs administrator rights. [`PrivilegeProvider`]
//! answers "are we elevated" and can relaunch the program elevated; the backend
//! is picked at runtime by [`platform_privilege`].

use std::process::Command;

use crate::redirect::RedirectError;

/// Query and acquire elevated privilege.
pub trait PrivilegeProvider: Send + Sync {
    /// Whether the current process may edit system files.
    fn is_elevated(&self) -> Result<bool, RedirectError>;

    /// Start a new elevated instance with the same arguments.
    ///
    /// On success the caller is expected to exit; the new instance takes over.
    fn relaunch_elevated(&self) -> Result<(), RedirectError>;
}

/// Choose the backend for the running platform.
pub fn platform_privilege() -> Box<dyn PrivilegeProvider> {
    if cfg!(windows) {
        Box::new(WindowsPrivilege)
    } else {
        Box::new(UnixPrivilege)
    }
}

fn current_invocation() -> Result<(String, Vec<String>), RedirectError> {
    let exe = std::env::current_exe()
        .map_err(|e| RedirectError::Elevation(format!("cannot locate executable: {}", e)))?;
    let args = std::env::args().skip(1).collect();
    Ok((exe.to_string_lossy().into_owned(), args))
}

/// Administrator check and UAC relaunch.
pub struct WindowsPrivilege;

impl PrivilegeProvider for WindowsPrivilege {
    fn is_elevated(&self) -> Result<bool, RedirectError> {
        // Only administrators may open the raw physical drive.
        Ok(std::fs::File::open(r"\\.\PHYSICALDRIVE0").is_ok())
    }

    fn relaunch_elevated(&self) -> Result<(), RedirectError> {
        let (exe, args) = current_invocation()?;
        let cwd = std::env::current_dir()
            .map_err(|e| RedirectError::Elevation(format!("cannot read working directory: {}", e)))?;

        let mut script = format!(
            "Start-Process -FilePath {} -Verb RunAs -WorkingDirectory {}",
            ps_quote(&exe),
            ps_quote(&cwd.to_string_lossy())
        );
        if !args.is_empty() {
            let quoted: Vec<String> = args.iter().map(|a| ps_quote(a)).collect();
            script.push_str(&format!(" -ArgumentList {}", quoted.join(",")));
        }

        let status = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .status()
            .map_err(|e| RedirectError::Elevation(format!("failed to run powershell: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(RedirectError::Elevation(format!("elevation request was refused ({})", status)))
        }
    }
}

fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Effective-uid check and `sudo` relaunch.
pub struct UnixPrivilege;

impl PrivilegeProvider for UnixPrivilege {
    fn is_elevated(&self) -> Result<bool, RedirectError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            // /proc/self is owned by the effective uid.
            if let Ok(meta) = std::fs::metadata("/proc/self") {
                return Ok(meta.uid() == 0);
            }
        }

        let output = Command::new("id")
            .arg("-u")
            .output()
            .map_err(|e| RedirectError::Privilege(format!("failed to run id: {}", e)))?;
        let uid = String::from_utf8_lossy(&output.stdout);
        uid.trim()
            .parse::<u32>()
            .map(|uid| uid == 0)
            .map_err(|e| RedirectError::Privilege(format!("unexpected id output '{}': {}", uid.trim(), e)))
    }

    fn relaunch_elevated(&self) -> Result<(), RedirectError> {
        let (exe, args) = current_invocation()?;
        let mut command = Command::new("sudo");
        command.arg(exe).args(args);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // exec only returns on failure.
            let err = command.exec();
            Err(RedirectError::Elevation(format!("failed to exec sudo: {}", err)))
        }
        #[cfg(not(unix))]
        {
            let _ = command;
            Err(RedirectError::Elevation("sudo relaunch requires a Unix platform".to_string()))
        }
    }
}
