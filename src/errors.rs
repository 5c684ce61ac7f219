use thiserror::Error;

pub type Result<T> = std::result::Result<T, MywmError>;

#[derive(Debug, Error)]
pub enum MywmError {
    #[error("Parsing error: {0}")]
    SerdeParse(#[from] serde_json::error::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("XDG error: {0}")]
    XdgBaseDirError(#[from] xdg::BaseDirectoriesError),
    #[error("X connect error: {0}")]
    XConnect(#[from] x11rb::errors::ConnectError),
    #[error("X connection error: {0}")]
    XConnection(#[from] x11rb::errors::ConnectionError),
    #[error("X reply error: {0}")]
    XReply(#[from] x11rb::errors::ReplyError),
    #[error("X id allocation error: {0}")]
    XIdError(#[from] x11rb::errors::ReplyOrIdError),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("config source exited with code {0}")]
    ConfigExit(i32),
}

impl MywmError {
    /// The short reason token used in `ERR <reason>` replies.
    #[must_use]
    pub fn reply_reason(&self) -> String {
        match self {
            Self::Protocol(reason) => reason.clone(),
            Self::ConfigExit(code) => format!("config {code}"),
            _ => "internal".to_string(),
        }
    }
}
