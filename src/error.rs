#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Format(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Settings(String),
    // Froms
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    Template(#[from] tera::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
