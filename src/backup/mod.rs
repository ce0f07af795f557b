//! Periodic datastore backups.
//!
//! - [`uploader`]: the upload contract every backend implements
//! - [`dropbox`]: Dropbox content API backend
//! - [`scheduler`]: the long-lived task that snapshots and uploads on a timer

pub mod dropbox;
pub mod scheduler;
pub mod uploader;

pub use dropbox::DropboxUploader;
pub use scheduler::BackupScheduler;
pub use uploader::{UploadError, Uploader};
