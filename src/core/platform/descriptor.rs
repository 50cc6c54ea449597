use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system families understood by version manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    #[serde(alias = "osx")]
    MacOs,
    Linux,
}

impl OsFamily {
    /// Get the family for the compile target.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    /// Normalized names a rule's OS pattern is matched against.
    pub fn rule_names(&self) -> &'static [&'static str] {
        match self {
            OsFamily::Windows => &["windows"],
            OsFamily::MacOs => &["osx", "macos"],
            OsFamily::Linux => &["linux"],
        }
    }

    /// Keys of a library's `natives` map, in lookup order.
    pub fn native_keys(&self) -> &'static [&'static str] {
        match self {
            OsFamily::Windows => &["windows"],
            OsFamily::MacOs => &["macos", "osx"],
            OsFamily::Linux => &["linux"],
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::MacOs => write!(f, "macos"),
            OsFamily::Linux => write!(f, "linux"),
        }
    }
}

/// The platform artifacts are resolved for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub os: OsFamily,
    pub os_version: String,
    pub arch: String,
}

impl PlatformDescriptor {
    pub fn new(os: OsFamily, os_version: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os,
            os_version: os_version.into(),
            arch: arch.into(),
        }
    }

    /// Describe the running machine.
    pub fn current() -> Self {
        let os_version = sysinfo::System::os_version().unwrap_or_default();
        Self::new(OsFamily::current(), os_version, std::env::consts::ARCH)
    }

    /// Pointer width used to expand `${arch}` in classifier names.
    pub fn arch_bits(&self) -> &'static str {
        if self.arch.contains("64") {
            "64"
        } else {
            "32"
        }
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
