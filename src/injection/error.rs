//! Bootstrap errors raised while wiring the dependency graph

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("no instance or provider registered for {type_name} (required by {required_by})")]
    Unresolved {
        type_name: String,
        required_by: String,
    },
    #[error("dependency cycle detected: {chain}")]
    Cycle { chain: String },
    #[error("failed to construct {type_name}")]
    Construction {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed data file {path}")]
    MalformedData {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access data file {path}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registered instance is not a {expected}")]
    TypeMismatch { expected: String },
}
