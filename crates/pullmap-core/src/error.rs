use thiserror::Error;

#[derive(Debug, Error)]
pub enum PullmapError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("route {0} has no steps")]
    EmptyRoute(usize),

    #[error("no corridor geometry to build a hull from")]
    EmptyHull,

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("canvas rejected layer event: {0}")]
    Canvas(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PullmapError>;
