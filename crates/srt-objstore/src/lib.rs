//! Object-store client scoped to one bucket and base directory.
//!
//! Wraps [`object_store`] so the rest of the backoffice can list, upload,
//! download and address report artifacts with plain string paths. Every
//! relative path is resolved under the client's base directory.

mod address;
mod client;
mod connector;
mod upload;

pub mod error;

pub use address::{DEFAULT_URL_HOST, ObjectUrl, public_url};
pub use client::ObjectStoreClient;
pub use connector::{Acl, Connector, Credentials, MemoryConnector, S3Connector};
pub use error::{Error, Result};
pub use upload::{UploadOptions, UploadSource};
