use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interpreter error: {0}")]
    Lua(#[from] mlua::Error),

    // Interpreter messages already carry the chunk label (the script path).
    #[error("syntax error: {message}")]
    Syntax { chunk: String, message: String },

    #[error("{message}")]
    Eval { chunk: String, message: String },

    #[error("unable to parse rlimit: {0}")]
    RlimitParse(String),

    #[error("unable to apply rlimit {name}: {source}")]
    RlimitApply {
        name: &'static str,
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
