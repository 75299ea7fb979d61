use crate::error::{Error, Result};
use std::str::FromStr;
use std::{env, fmt};

/// A CPU architecture as named in box metadata.
///
/// `Display` renders the canonical metadata spelling (`amd64`, `arm64`,
/// `386`, `arm`); `FromStr` accepts the aliases seen in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Arm64,
    Unknown,
}

impl Arch {
    pub fn current() -> Self {
        match env::consts::ARCH {
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            "arm" => Self::Arm,
            "aarch64" | "arm64" => Self::Arm64,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "386",
            Self::X86_64 => "amd64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether `s` spells a recognised architecture.
    pub fn recognizes(s: &str) -> bool {
        s.parse::<Self>().is_ok()
    }
}

impl FromStr for Arch {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "386" | "i386" | "i686" | "x86" => Ok(Self::X86),
            "amd64" | "x86_64" => Ok(Self::X86_64),
            "arm" | "armv7" | "armv7l" => Ok(Self::Arm),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(Error::UnknownArch(s.to_string())),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
