//! Host platform model.
//!
//! localtools supports Linux on `x86_64` and macOS on both Intel and Apple
//! Silicon. Packages publish one artifact per platform; [`MultiPlatform`]
//! carries those per-platform values and resolves them for the running host.
//!
//! # Example
//!
//! ```
//! use localtools_schema::{MultiPlatform, Platform};
//!
//! let urls = MultiPlatform::new("linux.tar.gz", "darwin-x64.tar.gz");
//! // No Apple Silicon build: Rosetta runs the Intel one.
//! assert_eq!(urls.resolve(Platform::DarwinAarch64).unwrap(), "darwin-x64.tar.gz");
//! ```

use thiserror::Error;

/// Errors raised while identifying or resolving a platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The host OS/architecture pair is not one of the supported variants.
    #[error("Platform {os}-{arch} not supported")]
    UnsupportedPlatform {
        /// Operating system name as reported by the host.
        os: String,
        /// CPU architecture as reported by the host.
        arch: String,
    },

    /// A package has no variant for the platform, even after fallback.
    #[error("No package variant available for platform {platform}")]
    NotSupported {
        /// The platform that was requested.
        platform: Platform,
    },
}

/// A supported host OS + architecture combination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Linux on `x86_64`.
    LinuxX86_64,
    /// macOS on Intel.
    DarwinX86_64,
    /// macOS on Apple Silicon.
    DarwinAarch64,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Platform; 3] = [Self::LinuxX86_64, Self::DarwinX86_64, Self::DarwinAarch64];

    /// Detect the platform of the running process.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPlatform`] when the host is none of
    /// the supported variants (e.g. Linux on ARM, Windows).
    pub fn detect() -> Result<Self, PlatformError> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map an OS name and architecture (as in `std::env::consts`) to a platform.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPlatform`] for unknown pairs.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, PlatformError> {
        match (os, arch) {
            ("linux", "x86_64") => Ok(Self::LinuxX86_64),
            ("macos" | "darwin", "x86_64") => Ok(Self::DarwinX86_64),
            ("macos" | "darwin", "aarch64") => Ok(Self::DarwinAarch64),
            _ => Err(PlatformError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Canonical identifier (`linux_x86_64`, `darwin_x86_64`, `darwin_aarch64`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "linux_x86_64",
            Self::DarwinX86_64 => "darwin_x86_64",
            Self::DarwinAarch64 => "darwin_aarch64",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux_x86_64" | "linux-x86_64" | "linux-x64" => Ok(Self::LinuxX86_64),
            "darwin_x86_64" | "darwin-x86_64" | "macos-x64" => Ok(Self::DarwinX86_64),
            "darwin_aarch64" | "darwin-aarch64" | "darwin-arm64" | "macos-arm64" => {
                Ok(Self::DarwinAarch64)
            }
            _ => Err(format!("Unknown platform: {s}")),
        }
    }
}

/// Per-platform variants of a value.
///
/// Maps built with [`MultiPlatform::new`] always carry the Linux and Intel
/// macOS entries; the Apple Silicon entry is optional and falls back to the
/// Intel one on resolution. [`MultiPlatform::empty`] plus [`with`](Self::with)
/// builds partial maps for tools that only ship some platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPlatform<T> {
    linux_x86_64: Option<T>,
    darwin_x86_64: Option<T>,
    darwin_aarch64: Option<T>,
}

impl<T> MultiPlatform<T> {
    /// A map with the two mandatory variants of a distributable package.
    pub fn new(linux_x86_64: T, darwin_x86_64: T) -> Self {
        Self {
            linux_x86_64: Some(linux_x86_64),
            darwin_x86_64: Some(darwin_x86_64),
            darwin_aarch64: None,
        }
    }

    /// A map with no variants at all.
    pub fn empty() -> Self {
        Self {
            linux_x86_64: None,
            darwin_x86_64: None,
            darwin_aarch64: None,
        }
    }

    /// Add a native Apple Silicon variant.
    pub fn with_darwin_aarch64(self, value: T) -> Self {
        self.with(Platform::DarwinAarch64, value)
    }

    /// Set (or replace) the variant for `platform`.
    pub fn with(mut self, platform: Platform, value: T) -> Self {
        *self.slot_mut(platform) = Some(value);
        self
    }

    /// The variant stored for exactly `platform`, without fallback.
    pub fn get(&self, platform: Platform) -> Option<&T> {
        match platform {
            Platform::LinuxX86_64 => self.linux_x86_64.as_ref(),
            Platform::DarwinX86_64 => self.darwin_x86_64.as_ref(),
            Platform::DarwinAarch64 => self.darwin_aarch64.as_ref(),
        }
    }

    /// True if a variant is stored for exactly `platform`.
    pub fn contains(&self, platform: Platform) -> bool {
        self.get(platform).is_some()
    }

    /// Borrowing form of [`resolve`](Self::resolve).
    pub fn resolve_ref(&self, platform: Platform) -> Result<&T, PlatformError> {
        if let Some(value) = self.get(platform) {
            return Ok(value);
        }
        match platform {
            Platform::DarwinAarch64 => self
                .get(Platform::DarwinX86_64)
                .ok_or(PlatformError::NotSupported { platform }),
            _ => Err(PlatformError::NotSupported { platform }),
        }
    }

    /// Take the value for `platform`.
    ///
    /// A missing Apple Silicon variant falls back to the Intel macOS one
    /// (a single level, run under Rosetta). Nothing else falls back.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotSupported`] when no variant applies.
    pub fn resolve(mut self, platform: Platform) -> Result<T, PlatformError> {
        if let Some(value) = self.slot_mut(platform).take() {
            return Ok(value);
        }
        match platform {
            Platform::DarwinAarch64 => self
                .darwin_x86_64
                .take()
                .ok_or(PlatformError::NotSupported { platform }),
            _ => Err(PlatformError::NotSupported { platform }),
        }
    }

    /// Apply `f` to every present variant; absent variants stay absent.
    pub fn map<U, F>(self, mut f: F) -> MultiPlatform<U>
    where
        F: FnMut(T) -> U,
    {
        MultiPlatform {
            linux_x86_64: self.linux_x86_64.map(&mut f),
            darwin_x86_64: self.darwin_x86_64.map(&mut f),
            darwin_aarch64: self.darwin_aarch64.map(&mut f),
        }
    }

    fn slot_mut(&mut self, platform: Platform) -> &mut Option<T> {
        match platform {
            Platform::LinuxX86_64 => &mut self.linux_x86_64,
            Platform::DarwinX86_64 => &mut self.darwin_x86_64,
            Platform::DarwinAarch64 => &mut self.darwin_aarch64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_arch() {
        assert_eq!(
            Platform::from_os_arch("linux", "x86_64"),
            Ok(Platform::LinuxX86_64)
        );
        assert_eq!(
            Platform::from_os_arch("macos", "x86_64"),
            Ok(Platform::DarwinX86_64)
        );
        assert_eq!(
            Platform::from_os_arch("macos", "aarch64"),
            Ok(Platform::DarwinAarch64)
        );
    }

    #[test]
    fn test_unsupported_host() {
        let err = Platform::from_os_arch("linux", "aarch64").unwrap_err();
        assert_eq!(
            err,
            PlatformError::UnsupportedPlatform {
                os: "linux".to_string(),
                arch: "aarch64".to_string()
            }
        );
        assert_eq!(err.to_string(), "Platform linux-aarch64 not supported");
        assert!(Platform::from_os_arch("windows", "x86_64").is_err());
    }

    #[test]
    fn test_detect_matches_build_target() {
        let detected = Platform::detect();
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        assert_eq!(detected, Ok(Platform::LinuxX86_64));
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        assert_eq!(detected, Ok(Platform::DarwinAarch64));
        #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
        assert_eq!(detected, Ok(Platform::DarwinX86_64));
        let _ = detected;
    }

    #[test]
    fn test_platform_string_forms() {
        for p in Platform::ALL {
            assert_eq!(p.as_str().parse::<Platform>(), Ok(p));
        }
        assert_eq!("macos-arm64".parse(), Ok(Platform::DarwinAarch64));
        assert!("solaris".parse::<Platform>().is_err());
        assert_eq!(Platform::DarwinX86_64.to_string(), "darwin_x86_64");
    }

    #[test]
    fn test_resolve_falls_back_to_intel_mac() {
        let map = MultiPlatform::new("A", "B");
        assert_eq!(map.clone().resolve(Platform::DarwinAarch64), Ok("B"));
        assert_eq!(map.resolve_ref(Platform::DarwinAarch64), Ok(&"B"));

        let native = MultiPlatform::new("A", "B").with_darwin_aarch64("C");
        assert_eq!(native.resolve(Platform::DarwinAarch64), Ok("C"));
    }

    #[test]
    fn test_resolve_exact_variants() {
        let map = MultiPlatform::new("A", "B");
        assert_eq!(map.clone().resolve(Platform::LinuxX86_64), Ok("A"));
        assert_eq!(map.resolve(Platform::DarwinX86_64), Ok("B"));
    }

    #[test]
    fn test_fallback_is_single_level() {
        // Only Apple Silicon falls back; Intel mac never borrows from Linux.
        let map = MultiPlatform::empty().with(Platform::LinuxX86_64, 1);
        assert_eq!(
            map.clone().resolve(Platform::DarwinX86_64),
            Err(PlatformError::NotSupported {
                platform: Platform::DarwinX86_64
            })
        );
        assert_eq!(
            map.resolve(Platform::DarwinAarch64),
            Err(PlatformError::NotSupported {
                platform: Platform::DarwinAarch64
            })
        );
    }

    #[test]
    fn test_map_preserves_absence() {
        let lengths = MultiPlatform::new("linux", "darwin").map(str::len);
        assert_eq!(lengths.get(Platform::LinuxX86_64), Some(&5));
        assert_eq!(lengths.get(Platform::DarwinX86_64), Some(&6));
        assert!(!lengths.contains(Platform::DarwinAarch64));

        let full = MultiPlatform::new(1, 2).with_darwin_aarch64(3).map(|v| v * 10);
        assert_eq!(full.get(Platform::DarwinAarch64), Some(&30));
    }
}
