//! Business logic services.
//!
//! Services contain the core workflows separated from HTTP handlers. They
//! talk to the stores through traits and to the disk through `UploadStore`.

pub mod auth_service;
pub mod credentials;
pub mod notification_service;
pub mod submission_service;
