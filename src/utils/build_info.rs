/// Build metadata embedded by `build.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub tree: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    /// Short one-line form, e.g. `spese 0.1.0 (abc1234, clean)`.
    pub fn short(&self) -> String {
        format!("spese {} ({}, {})", self.version, self.commit, self.tree)
    }
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("SPESE_BUILD_HASH").unwrap_or("unknown"),
        tree: option_env!("SPESE_BUILD_STATUS").unwrap_or("unknown"),
        built_at: option_env!("SPESE_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("SPESE_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("SPESE_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("SPESE_BUILD_RUSTC").unwrap_or("unknown"),
    }
}
