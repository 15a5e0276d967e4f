//! Custom extractors for Axum handlers.
//!
//! Each extractor rejects with [`AppError`](crate::errors::AppError) so that
//! malformed input is reported in the standard error envelope.

pub mod json_body;
pub mod object_id_path;
pub mod query_params;

pub use json_body::JsonBody;
pub use object_id_path::ObjectIdPath;
pub use query_params::QueryParams;
