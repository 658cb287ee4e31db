//! Interpreter discovery.

use std::path::PathBuf;
use tracing::debug;

/// Interpreters available on this host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    /// Path to `bash`, if found.
    pub bash: Option<PathBuf>,

    /// Path to `pwsh` (preferred) or `powershell`, if found.
    pub powershell: Option<PathBuf>,
}

impl Toolchain {
    /// Look up interpreters on `PATH`.
    ///
    /// The cross-platform `pwsh` is preferred over Windows PowerShell.
    pub fn discover() -> Self {
        Self::discover_with(|name| which::which(name).ok())
    }

    /// Resolve interpreters through `lookup` (program name to path).
    pub fn discover_with(lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let bash = lookup("bash");
        let powershell = lookup("pwsh").or_else(|| lookup("powershell"));
        debug!(bash = ?bash, powershell = ?powershell, "discovered lint toolchain");
        Self { bash, powershell }
    }

    /// A toolchain with no interpreters; forces degraded checking.
    pub fn none() -> Self {
        Self::default()
    }

    /// Override the bash interpreter.
    pub fn with_bash(mut self, path: impl Into<PathBuf>) -> Self {
        self.bash = Some(path.into());
        self
    }

    /// Override the PowerShell interpreter.
    pub fn with_powershell(mut self, path: impl Into<PathBuf>) -> Self {
        self.powershell = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_has_no_interpreters() {
        let t = Toolchain::none();
        assert!(t.bash.is_none());
        assert!(t.powershell.is_none());
    }

    #[test]
    fn test_overrides() {
        let t = Toolchain::none()
            .with_bash("/opt/bash")
            .with_powershell("/opt/pwsh");
        assert_eq!(t.bash, Some(PathBuf::from("/opt/bash")));
        assert_eq!(t.powershell, Some(PathBuf::from("/opt/pwsh")));
    }

    fn lookup_in(found: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |name| {
            found
                .iter()
                .any(|f| *f == name)
                .then(|| PathBuf::from(format!("/usr/bin/{name}")))
        }
    }

    #[test]
    fn test_discover_prefers_pwsh() {
        let t = Toolchain::discover_with(lookup_in(&["bash", "pwsh", "powershell"]));
        assert_eq!(t.bash, Some(PathBuf::from("/usr/bin/bash")));
        assert_eq!(t.powershell, Some(PathBuf::from("/usr/bin/pwsh")));
    }

    #[test]
    fn test_discover_falls_back_to_windows_powershell() {
        let t = Toolchain::discover_with(lookup_in(&["powershell"]));
        assert_eq!(t.bash, None);
        assert_eq!(t.powershell, Some(PathBuf::from("/usr/bin/powershell")));
    }

    #[test]
    fn test_discover_with_nothing_found() {
        assert_eq!(Toolchain::discover_with(|_| None), Toolchain::none());
    }
}
