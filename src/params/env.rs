//! Values injected from the build environment.

/// Build-time environment values
#[derive(Debug, Clone, Copy)]
pub struct BuildEnv {
    /// Service key placeholder (`VIBETUNNEL_API_KEY`), not used for visuals
    pub api_key: Option<&'static str>,
}

impl BuildEnv {
    pub const fn current() -> Self {
        Self {
            api_key: option_env!("VIBETUNNEL_API_KEY"),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some_and(|key| !key.is_empty())
    }
}
