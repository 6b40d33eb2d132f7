//! parley-protocol: Wire definitions for the parley chat client
//!
//! This crate defines how chat frames are classified and what the upload
//! endpoint sends back. It performs no I/O.

pub mod frames;
pub mod upload;

// Re-export main types at crate root
pub use frames::{InboundFrame, RESPONDER_PREFIX};
pub use upload::{UploadAccepted, UploadErrorBody, UPLOAD_ACCEPTED_STATUS, UPLOAD_FIELD, UPLOAD_PATH};
