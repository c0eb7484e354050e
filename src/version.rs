//! Build and runtime identification.
//!
//! Version and build time are fixed at compile time through the
//! `APP_VERSION` and `APP_BUILD_TIME` build environment variables:
//!
//! ```text
//! APP_VERSION=1.4.2 APP_BUILD_TIME=$(date -u +%FT%TZ) cargo build --release
//! ```

/// Version reported when none was injected at build time.
pub const DEFAULT_VERSION: &str = "dev";

/// Build time reported when none was injected at build time.
pub const DEFAULT_BUILD_TIME: &str = "unknown";

/// Identification of this build, created once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub build_time: String,
    /// Generic runtime identifier, e.g. `rust/linux-x86_64`.
    pub runtime: String,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, build_time: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            build_time: build_time.into(),
            runtime: runtime_identifier(),
        }
    }

    /// Values injected by the build environment, or their defaults.
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("APP_VERSION").unwrap_or(DEFAULT_VERSION),
            option_env!("APP_BUILD_TIME").unwrap_or(DEFAULT_BUILD_TIME),
        )
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::from_build_env()
    }
}

fn runtime_identifier() -> String {
    format!("rust/{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}
