use serde::{Deserialize, Serialize};
use serde_json::Value;

/// SSE event carrying a whole-value snapshot; `data` is the JSON value or
/// `null` when nothing is stored at the watched path.
pub const SNAPSHOT_EVENT: &str = "snapshot";
/// SSE event sent once before the stream closes on a store failure.
pub const ERROR_EVENT: &str = "error";

pub mod documents {
    use std::collections::BTreeMap;

    use super::*;

    /// Body of `PATCH /db`: every entry is applied or none is.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UpdateBody {
        pub updates: BTreeMap<String, Value>,
    }

    /// Body of `GET /db/{path}`.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct ValueResponse {
        pub value: Option<Value>,
    }
}

pub mod status {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HealthResponse {
        pub status: String,
        pub version: String,
    }

    /// Every error response has this shape. `kind` is one of
    /// `validation`, `not_found`, `conflict`, `transport`.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct ErrorResponse {
        pub error: String,
        pub kind: String,
    }
}
