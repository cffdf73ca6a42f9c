pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit the binary was built from, injected through `GIT_REVISION`.
pub const REVISION: &str = match option_env!("GIT_REVISION") {
    Some(revision) => revision,
    None => "unknown",
};

pub fn version_string() -> String {
    format!("k8s-job-cleaner version {}, {}", VERSION, REVISION)
}
