//! Storage service boundary
//!
//! Everything the client asks of a storage array goes through
//! [`StorageClient`], so handlers and the job engine can be exercised against
//! test doubles.

use thiserror::Error;

use crate::domain::{
    AccessType, FileSystem, Initiator, InitiatorType, JobId, JobStatus, NfsExport, Pending,
    Pool, Provisioning, ReplicationType, Snapshot, Volume,
};

/// Failure reported by the storage service itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Connection to a storage array.
pub trait StorageClient: Send + Sync {
    fn pools(&self) -> ServiceResult<Vec<Pool>>;

    fn volumes(&self) -> ServiceResult<Vec<Volume>>;

    fn initiators(&self) -> ServiceResult<Vec<Initiator>>;

    fn file_systems(&self) -> ServiceResult<Vec<FileSystem>>;

    /// Snapshots taken of `fs`.
    fn snapshots(&self, fs: &FileSystem) -> ServiceResult<Vec<Snapshot>>;

    fn exports(&self) -> ServiceResult<Vec<NfsExport>>;

    fn volume_create(
        &self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
        provisioning: Provisioning,
    ) -> ServiceResult<Pending<Volume>>;

    fn volume_delete(&self, volume: &Volume) -> ServiceResult<Option<JobId>>;

    fn volume_resize(&self, volume: &Volume, size_bytes: u64) -> ServiceResult<Pending<Volume>>;

    fn volume_replicate(
        &self,
        pool: &Pool,
        rep_type: ReplicationType,
        source: &Volume,
        name: &str,
    ) -> ServiceResult<Pending<Volume>>;

    fn initiator_create(
        &self,
        name: &str,
        id: &str,
        kind: InitiatorType,
    ) -> ServiceResult<Initiator>;

    fn initiator_delete(&self, initiator: &Initiator) -> ServiceResult<()>;

    fn access_grant(
        &self,
        initiator: &Initiator,
        volume: &Volume,
        access: AccessType,
    ) -> ServiceResult<()>;

    fn access_revoke(&self, initiator: &Initiator, volume: &Volume) -> ServiceResult<()>;

    fn fs_create(&self, pool: &Pool, name: &str, size_bytes: u64)
        -> ServiceResult<Pending<FileSystem>>;

    fn fs_delete(&self, fs: &FileSystem) -> ServiceResult<Option<JobId>>;

    fn fs_resize(&self, fs: &FileSystem, size_bytes: u64) -> ServiceResult<Pending<FileSystem>>;

    fn fs_clone(
        &self,
        source: &FileSystem,
        name: &str,
        snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Pending<FileSystem>>;

    /// Thin clone of a file inside `fs`; paths are relative to the file system root.
    fn file_clone(
        &self,
        fs: &FileSystem,
        src: &str,
        dest: &str,
        snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Option<JobId>>;

    /// Snapshot `files` of `fs`, or the whole file system when `files` is empty.
    fn snapshot_create(
        &self,
        fs: &FileSystem,
        name: &str,
        files: &[String],
    ) -> ServiceResult<Pending<Snapshot>>;

    fn snapshot_delete(&self, fs: &FileSystem, snapshot: &Snapshot)
        -> ServiceResult<Option<JobId>>;

    fn export_fs(&self, export: &NfsExport) -> ServiceResult<NfsExport>;

    fn export_remove(&self, export: &NfsExport) -> ServiceResult<()>;

    fn job_status(&self, job: &JobId) -> ServiceResult<JobStatus>;

    /// Release server-side state of a finished job.
    fn job_free(&self, job: &JobId) -> ServiceResult<()>;

    /// End the session.
    fn close(&self) -> ServiceResult<()>;
}
