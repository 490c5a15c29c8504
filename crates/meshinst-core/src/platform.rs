//! Host platform descriptor and the per-platform release policy.
//!
//! All platform-conditional behavior (archive format, executable suffix,
//! release asset naming, permission fix-up) is read from [`POLICIES`], so a
//! new platform is one more table row.

use std::fmt;

/// Canonical name of the managed binary.
pub const BINARY_NAME: &str = "istioctl";

/// Operating systems istioctl is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    /// Maps a Rust `target_os` name to a supported OS.
    pub fn from_target(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::Darwin),
            "windows" => Some(Os::Windows),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive format a release is packaged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

/// How releases for one OS are named, packed and fixed up after extraction.
#[derive(Debug, Clone, Copy)]
pub struct PlatformPolicy {
    pub os: Os,
    pub archive: ArchiveFormat,
    /// Appended to binary names (e.g. `.exe`); empty when the OS has no convention.
    pub exe_suffix: &'static str,
    /// Release asset filename; `{version}` and `{arch}` are substituted.
    pub asset_template: &'static str,
    /// Whether the final binary needs its execute bits set explicitly.
    pub set_exec_bits: bool,
}

pub static POLICIES: &[PlatformPolicy] = &[
    PlatformPolicy {
        os: Os::Linux,
        archive: ArchiveFormat::TarGz,
        exe_suffix: "",
        asset_template: "istioctl-{version}-linux-{arch}.tar.gz",
        set_exec_bits: true,
    },
    PlatformPolicy {
        os: Os::Darwin,
        archive: ArchiveFormat::TarGz,
        exe_suffix: "",
        asset_template: "istioctl-{version}-osx.tar.gz",
        set_exec_bits: true,
    },
    PlatformPolicy {
        os: Os::Windows,
        archive: ArchiveFormat::Zip,
        exe_suffix: ".exe",
        asset_template: "istioctl-{version}-win.zip",
        set_exec_bits: false,
    },
];

/// (operating system, CPU architecture) pair, named the way releases are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: String,
}

impl Platform {
    pub fn new(os: Os, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
        }
    }

    /// The platform this process runs on, or `None` if istioctl is not published for it.
    pub fn host() -> Option<Self> {
        let os = Os::from_target(std::env::consts::OS)?;
        Some(Self::new(os, release_arch(std::env::consts::ARCH)))
    }

    pub fn policy(&self) -> &'static PlatformPolicy {
        policy_for(self.os)
    }

    /// Release asset filename for `version` on this platform.
    pub fn asset_name(&self, version: &str) -> String {
        self.policy()
            .asset_template
            .replace("{version}", version)
            .replace("{arch}", &self.arch)
    }

    /// `name` with this platform's executable suffix applied.
    pub fn executable_name(&self, name: &str) -> String {
        format!("{}{}", name, self.policy().exe_suffix)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

pub fn policy_for(os: Os) -> &'static PlatformPolicy {
    POLICIES
        .iter()
        .find(|p| p.os == os)
        .unwrap_or(&POLICIES[0])
}

/// Maps a Rust `target_arch` name to the architecture label used in release names.
pub fn release_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        "arm" => "armv7".to_string(),
        other => other.to_string(),
    }
}

/// Version-qualified binary name, e.g. `istioctl-1.18.0`.
pub fn versioned_name(version: &str) -> String {
    format!("{}-{}", BINARY_NAME, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_os_has_exactly_one_policy() {
        for os in [Os::Linux, Os::Darwin, Os::Windows] {
            assert_eq!(POLICIES.iter().filter(|p| p.os == os).count(), 1, "{os}");
            assert_eq!(policy_for(os).os, os);
        }
    }

    #[test]
    fn asset_names_per_platform() {
        let linux = Platform::new(Os::Linux, "arm64");
        assert_eq!(linux.asset_name("1.18.0"), "istioctl-1.18.0-linux-arm64.tar.gz");
        let mac = Platform::new(Os::Darwin, "arm64");
        assert_eq!(mac.asset_name("1.18.0"), "istioctl-1.18.0-osx.tar.gz");
        let win = Platform::new(Os::Windows, "amd64");
        assert_eq!(win.asset_name("1.18.0"), "istioctl-1.18.0-win.zip");
    }

    #[test]
    fn suffix_only_on_windows() {
        assert_eq!(Platform::new(Os::Windows, "amd64").executable_name("istioctl"), "istioctl.exe");
        assert_eq!(Platform::new(Os::Linux, "amd64").executable_name("istioctl"), "istioctl");
        assert_eq!(Platform::new(Os::Darwin, "amd64").executable_name("istioctl"), "istioctl");
    }

    #[test]
    fn rust_target_names_map_to_release_names() {
        assert_eq!(release_arch("x86_64"), "amd64");
        assert_eq!(release_arch("aarch64"), "arm64");
        assert_eq!(release_arch("arm"), "armv7");
        assert_eq!(release_arch("s390x"), "s390x");
        assert_eq!(Os::from_target("macos"), Some(Os::Darwin));
        assert_eq!(Os::from_target("freebsd"), None);
    }

    #[test]
    fn versioned_name_appends_version() {
        assert_eq!(versioned_name("1.18.0"), "istioctl-1.18.0");
    }
}
