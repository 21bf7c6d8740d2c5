//! Build metadata accessors shared across the CLI and the update client.
//! This includes the generated version.rs from the build script into a core module,
//! providing a single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version as declared in Cargo.toml
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// User agent sent with every update-server request
pub fn user_agent() -> String {
    format!("{}/{} ({})", env!("CARGO_PKG_NAME"), crate_version(), git_hash())
}

/// Long version string for `--version` output
pub fn long_version() -> String {
    format!("{} (built {}, {})", crate_version(), build_time(), git_hash())
}
