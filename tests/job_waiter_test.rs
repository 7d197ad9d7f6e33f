//! Integration tests for the job completion engine against a scripted service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::rstest;

use lsmcli::application::services::{JobWaiter, PollPolicy};
use lsmcli::application::ApplicationError;
use lsmcli::domain::{
    AccessType, FileSystem, Initiator, InitiatorType, JobId, JobStatus, NfsExport, Pending, Pool,
    Provisioning, ReplicationType, Snapshot, StorageObject, Volume,
};
use lsmcli::infrastructure::traits::{ServiceError, ServiceResult, StorageClient};
use lsmcli::util::testing;

/// Service double that answers status polls from a script and counts frees.
#[derive(Default)]
struct ScriptedClient {
    statuses: Mutex<VecDeque<JobStatus>>,
    polls: Mutex<u32>,
    freed: Mutex<Vec<JobId>>,
    fail_free: bool,
}

impl ScriptedClient {
    fn new(statuses: Vec<JobStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Default::default()
        }
    }

    fn polls(&self) -> u32 {
        *self.polls.lock().unwrap()
    }

    fn freed(&self) -> Vec<JobId> {
        self.freed.lock().unwrap().clone()
    }
}

fn unused<T>() -> ServiceResult<T> {
    Err(ServiceError::new(99, "not scripted"))
}

impl StorageClient for ScriptedClient {
    fn pools(&self) -> ServiceResult<Vec<Pool>> {
        unused()
    }
    fn volumes(&self) -> ServiceResult<Vec<Volume>> {
        unused()
    }
    fn initiators(&self) -> ServiceResult<Vec<Initiator>> {
        unused()
    }
    fn file_systems(&self) -> ServiceResult<Vec<FileSystem>> {
        unused()
    }
    fn snapshots(&self, _fs: &FileSystem) -> ServiceResult<Vec<Snapshot>> {
        unused()
    }
    fn exports(&self) -> ServiceResult<Vec<NfsExport>> {
        unused()
    }
    fn volume_create(
        &self,
        _pool: &Pool,
        _name: &str,
        _size_bytes: u64,
        _provisioning: Provisioning,
    ) -> ServiceResult<Pending<Volume>> {
        unused()
    }
    fn volume_delete(&self, _volume: &Volume) -> ServiceResult<Option<JobId>> {
        unused()
    }
    fn volume_resize(&self, _volume: &Volume, _size_bytes: u64) -> ServiceResult<Pending<Volume>> {
        unused()
    }
    fn volume_replicate(
        &self,
        _pool: &Pool,
        _rep_type: ReplicationType,
        _source: &Volume,
        _name: &str,
    ) -> ServiceResult<Pending<Volume>> {
        unused()
    }
    fn initiator_create(
        &self,
        _name: &str,
        _id: &str,
        _kind: InitiatorType,
    ) -> ServiceResult<Initiator> {
        unused()
    }
    fn initiator_delete(&self, _initiator: &Initiator) -> ServiceResult<()> {
        unused()
    }
    fn access_grant(
        &self,
        _initiator: &Initiator,
        _volume: &Volume,
        _access: AccessType,
    ) -> ServiceResult<()> {
        unused()
    }
    fn access_revoke(&self, _initiator: &Initiator, _volume: &Volume) -> ServiceResult<()> {
        unused()
    }
    fn fs_create(
        &self,
        _pool: &Pool,
        _name: &str,
        _size_bytes: u64,
    ) -> ServiceResult<Pending<FileSystem>> {
        unused()
    }
    fn fs_delete(&self, _fs: &FileSystem) -> ServiceResult<Option<JobId>> {
        unused()
    }
    fn fs_resize(&self, _fs: &FileSystem, _size_bytes: u64) -> ServiceResult<Pending<FileSystem>> {
        unused()
    }
    fn fs_clone(
        &self,
        _source: &FileSystem,
        _name: &str,
        _snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Pending<FileSystem>> {
        unused()
    }
    fn file_clone(
        &self,
        _fs: &FileSystem,
        _src: &str,
        _dest: &str,
        _snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Option<JobId>> {
        unused()
    }
    fn snapshot_create(
        &self,
        _fs: &FileSystem,
        _name: &str,
        _files: &[String],
    ) -> ServiceResult<Pending<Snapshot>> {
        unused()
    }
    fn snapshot_delete(
        &self,
        _fs: &FileSystem,
        _snapshot: &Snapshot,
    ) -> ServiceResult<Option<JobId>> {
        unused()
    }
    fn export_fs(&self, _export: &NfsExport) -> ServiceResult<NfsExport> {
        unused()
    }
    fn export_remove(&self, _export: &NfsExport) -> ServiceResult<()> {
        unused()
    }

    fn job_status(&self, _job: &JobId) -> ServiceResult<JobStatus> {
        *self.polls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.len() {
            0 => Err(ServiceError::new(2, "job not found")),
            // The last scripted status repeats forever.
            1 => Ok(statuses[0].clone()),
            _ => Ok(statuses.pop_front().unwrap()),
        }
    }

    fn job_free(&self, job: &JobId) -> ServiceResult<()> {
        self.freed.lock().unwrap().push(job.clone());
        if self.fail_free {
            return Err(ServiceError::new(1, "free refused"));
        }
        Ok(())
    }

    fn close(&self) -> ServiceResult<()> {
        Ok(())
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        ..Default::default()
    }
}

fn volume(id: &str) -> Volume {
    Volume {
        id: id.to_string(),
        name: "vol1".to_string(),
        vpd83: "600a0b80".to_string(),
        block_size: 512,
        num_of_blocks: 2048,
        status: 1,
        pool_id: "POOL_ID_00001".to_string(),
    }
}

fn job() -> JobId {
    JobId("job-1".to_string())
}

fn waiter(client: &Arc<ScriptedClient>, policy: PollPolicy) -> JobWaiter {
    JobWaiter::new(client.clone(), policy)
}

#[test]
fn given_no_job_when_awaiting_then_returns_immediate_without_polling() {
    testing::init_test_setup();
    // Arrange
    let client = Arc::new(ScriptedClient::new(vec![]));
    let sut = waiter(&client, fast_policy());

    // Act
    let result = sut
        .await_completion("create-volume", None, Some(volume("VOL_ID_00001")))
        .expect("immediate result");

    // Assert
    assert_eq!(result, Some(volume("VOL_ID_00001")));
    assert_eq!(client.polls(), 0);
    assert!(client.freed().is_empty());
}

#[test]
fn given_progress_then_complete_when_awaiting_then_returns_job_result_and_frees_once() {
    testing::init_test_setup();
    // Arrange
    let client = Arc::new(ScriptedClient::new(vec![
        JobStatus::InProgress { percent: 10 },
        JobStatus::InProgress { percent: 60 },
        JobStatus::Complete(Some(StorageObject::Volume(volume("VOL_ID_00002")))),
    ]));
    let sut = waiter(&client, fast_policy());

    // Act
    let result = sut
        .await_completion("create-volume", Some(job()), Some(volume("VOL_ID_00001")))
        .expect("job completes");

    // Assert: the job's object replaces the immediate one
    assert_eq!(result, Some(volume("VOL_ID_00002")));
    assert_eq!(client.polls(), 3);
    assert_eq!(client.freed(), vec![job()]);
}

#[test]
fn given_job_error_when_awaiting_then_job_error_and_freed_once() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![
        JobStatus::InProgress { percent: 0 },
        JobStatus::Error {
            code: 5,
            message: "disk full".to_string(),
        },
    ]));
    let sut = waiter(&client, fast_policy());

    let err = sut
        .await_completion::<Volume>("create-volume", Some(job()), None)
        .unwrap_err();

    match err {
        ApplicationError::Job {
            label,
            code,
            message,
        } => {
            assert_eq!(label, "create-volume");
            assert_eq!(code, 5);
            assert_eq!(message, "disk full");
        }
        other => panic!("expected job error, got {other:?}"),
    }
    assert_eq!(client.freed(), vec![job()]);
}

#[rstest]
#[case(1)]
#[case(4)]
fn given_endless_progress_when_max_polls_reached_then_timeout_without_free(#[case] max: u32) {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::InProgress { percent: 50 }]));
    let policy = PollPolicy {
        max_polls: Some(max),
        ..fast_policy()
    };
    let sut = waiter(&client, policy);

    let err = sut.wait("resize-fs", &job()).unwrap_err();

    assert!(
        matches!(err, ApplicationError::JobTimeout { polls, .. } if polls == max),
        "unexpected error: {err:?}"
    );
    assert_eq!(client.polls(), max);
    assert!(client.freed().is_empty(), "running job must not be freed");
}

#[test]
fn given_endless_progress_when_deadline_passes_then_timeout() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::InProgress { percent: 1 }]));
    let policy = PollPolicy {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_millis(20)),
        max_polls: None,
    };
    let sut = waiter(&client, policy);

    let err = sut.wait("clone-fs", &job()).unwrap_err();

    assert!(matches!(err, ApplicationError::JobTimeout { .. }));
    assert!(err.to_string().starts_with("clone-fs: job not complete"));
}

#[test]
fn given_interval_longer_than_deadline_when_waiting_then_returns_near_deadline() {
    testing::init_test_setup();
    // Arrange
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::InProgress { percent: 1 }]));
    let policy = PollPolicy {
        interval: Duration::from_secs(5),
        timeout: Some(Duration::from_millis(50)),
        max_polls: None,
    };
    let sut = waiter(&client, policy);
    let started = std::time::Instant::now();

    // Act
    let err = sut.wait("create-fs", &job()).unwrap_err();

    // Assert: one pause cut short to the deadline, then a final poll
    assert!(matches!(err, ApplicationError::JobTimeout { .. }));
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "waited {:?}",
        started.elapsed()
    );
    assert_eq!(client.polls(), 2);
}

#[test]
fn given_complete_without_object_when_waiting_then_none() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::Complete(None)]));
    let sut = waiter(&client, fast_policy());

    let result = sut.wait("delete-fs", &job()).expect("job completes");

    assert_eq!(result, None);
    assert_eq!(client.freed().len(), 1);
}

#[test]
fn given_free_fails_when_job_completes_then_result_still_returned() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient {
        fail_free: true,
        ..ScriptedClient::new(vec![JobStatus::Complete(Some(StorageObject::Volume(
            volume("VOL_ID_00003"),
        )))])
    });
    let sut = waiter(&client, fast_policy());

    let result = sut
        .await_completion::<Volume>("replicate-volume", Some(job()), None)
        .expect("free failure is not fatal");

    assert_eq!(result, Some(volume("VOL_ID_00003")));
    assert_eq!(client.freed().len(), 1);
}

#[test]
fn given_wrong_object_kind_when_awaiting_then_unexpected_job_result() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![JobStatus::Complete(Some(
        StorageObject::Volume(volume("VOL_ID_00004")),
    ))]));
    let sut = waiter(&client, fast_policy());

    let err = sut
        .await_completion::<FileSystem>("create-fs", Some(job()), None)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::UnexpectedJobResult {
            expected: "file system",
            actual: "volume",
            ..
        }
    ));
}

#[test]
fn given_status_query_fails_when_waiting_then_operation_failed() {
    testing::init_test_setup();
    let client = Arc::new(ScriptedClient::new(vec![]));
    let sut = waiter(&client, fast_policy());

    let err = sut.wait("delete-ss", &job()).unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(client.freed().is_empty());
}
