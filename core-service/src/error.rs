use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    /// No usable root folder was chosen
    #[error("Root selection failed: {0}")]
    RootSelection(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Remote error: {0}")]
    Remote(#[from] bridge_traits::error::BridgeError),

    #[error(transparent)]
    Mirror(#[from] core_mirror::MirrorError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
