//! Operating system and processor architecture detection.
use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    MacOs,
    /// Anything else Unix-like.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Processor architecture, as used to key release asset tables.
///
/// The set of recognised values is closed: anything else lands in
/// [`Arch::Unknown`], which never matches a lookup table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
    /// 32-bit ARM with hardware float.
    Armv7,
    /// An architecture with no release assets.
    Unknown(String),
}

impl Arch {
    /// Parse an architecture name, accepting `uname -m` and Debian spellings.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            "armv7" | "armv7l" | "armhf" | "arm" => Self::Armv7,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical name used as the key in asset tables, or `None` for
    /// unknown architectures.
    #[must_use]
    pub const fn key(&self) -> Option<&'static str> {
        match self {
            Self::X86_64 => Some("x86_64"),
            Self::Aarch64 => Some("aarch64"),
            Self::Armv7 => Some("armv7"),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "{name}"),
            known => write!(f, "{}", known.key().unwrap_or_default()),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Processor architecture.
    pub arch: Arch,
}

impl Platform {
    /// Detect the current platform, optionally overriding the architecture.
    #[must_use]
    pub fn detect(arch_override: Option<&str>) -> Self {
        Self {
            os: Self::detect_os(),
            arch: Arch::parse(arch_override.unwrap_or(std::env::consts::ARCH)),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Whether this is a Linux system.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Other
        }
    }
}
