use std::sync::LazyLock;

use derive_from_env::FromEnv;

#[derive(FromEnv)]
#[from_env(prefix = "CTXLOG")]
#[allow(non_snake_case)]
pub struct CtxlogConfig {
    /// Forces color off for every logger, including the standard streams.
    #[from_env(default = "false")]
    pub NO_COLOR: bool,
}

pub static CTXLOG_CONFIG: LazyLock<CtxlogConfig> =
    LazyLock::new(|| CtxlogConfig::from_env().unwrap());
