//! Simulated storage array behind `sim://` URIs
//!
//! Keeps the whole array in memory and persists it as JSON after every change,
//! so consecutive invocations of the client see each other's work. Operations
//! that run asynchronously on a real array hand out jobs here too: a job
//! reports progress for a fixed number of polls before it completes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    AccessType, FileSystem, Initiator, InitiatorType, JobId, JobStatus, NfsExport, Pending, Pool,
    Provisioning, ReplicationType, Snapshot, StorageObject, Volume, GIB, TIB,
};
use crate::infrastructure::traits::{ServiceError, ServiceResult, StorageClient};
use crate::infrastructure::{InfraError, InfraResult};

/// Error codes reported by the simulator.
pub mod codes {
    pub const INTERNAL: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const EXISTS: i32 = 3;
    pub const INSUFFICIENT_SPACE: i32 = 4;
    pub const INVALID_ARGUMENT: i32 = 5;
}

/// Number of in-progress polls before a simulated job finishes.
pub const DEFAULT_JOB_STEPS: u8 = 3;

const BLOCK_SIZE: u64 = 512;
const STATUS_OK: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessGrant {
    initiator_id: String,
    volume_id: String,
    access: AccessType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum JobEnd {
    Complete(Option<StorageObject>),
    Error { code: i32, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimJob {
    polls: u8,
    end: JobEnd,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SimState {
    next_id: u64,
    pools: Vec<Pool>,
    volumes: Vec<Volume>,
    initiators: Vec<Initiator>,
    file_systems: Vec<FileSystem>,
    /// Snapshots per file system id
    snapshots: BTreeMap<String, Vec<Snapshot>>,
    exports: Vec<NfsExport>,
    access: Vec<AccessGrant>,
    jobs: BTreeMap<String, SimJob>,
}

impl SimState {
    fn seeded() -> Self {
        let pool = |n: u32, size: u64| Pool {
            id: format!("POOL_ID_{n:05}"),
            name: format!("Pool {n}"),
            total_space: size,
            free_space: size,
        };
        Self {
            pools: vec![pool(1, 2 * TIB), pool(2, 2 * TIB), pool(3, 100 * GIB)],
            ..Default::default()
        }
    }

    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_ID_{:05}", self.next_id)
    }

    fn pool_mut(&mut self, id: &str) -> ServiceResult<&mut Pool> {
        self.pools
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("pool", id))
    }

    fn volume_index(&self, id: &str) -> ServiceResult<usize> {
        self.volumes
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| not_found("volume", id))
    }

    fn fs_index(&self, id: &str) -> ServiceResult<usize> {
        self.file_systems
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| not_found("file system", id))
    }

    /// Take `bytes` from a pool, or describe why not.
    fn reserve(&mut self, pool_id: &str, bytes: u64) -> ServiceResult<Result<(), JobEnd>> {
        let pool = self.pool_mut(pool_id)?;
        if pool.free_space < bytes {
            return Ok(Err(JobEnd::Error {
                code: codes::INSUFFICIENT_SPACE,
                message: "insufficient space in pool".to_string(),
            }));
        }
        pool.free_space -= bytes;
        Ok(Ok(()))
    }

    fn release(&mut self, pool_id: &str, bytes: u64) {
        if let Some(pool) = self.pools.iter_mut().find(|p| p.id == pool_id) {
            pool.free_space = pool.free_space.saturating_add(bytes).min(pool.total_space);
        }
    }

    fn start_job(&mut self, end: JobEnd) -> JobId {
        let id = Uuid::new_v4().simple().to_string();
        self.jobs.insert(id.clone(), SimJob { polls: 0, end });
        JobId(id)
    }

    fn ensure_unique_name<'a>(
        &self,
        kind: &str,
        name: &str,
        mut names: impl Iterator<Item = &'a str>,
    ) -> ServiceResult<()> {
        if names.any(|n| n == name) {
            return Err(ServiceError::new(
                codes::EXISTS,
                format!("{kind} name {name} already in use"),
            ));
        }
        Ok(())
    }
}

fn not_found(kind: &str, id: &str) -> ServiceError {
    ServiceError::new(codes::NOT_FOUND, format!("{kind} {id} not found"))
}

/// Whole blocks covering `bytes`, and the bytes they occupy.
fn allocation(bytes: u64) -> ServiceResult<(u64, u64)> {
    let blocks = bytes.div_ceil(BLOCK_SIZE);
    let allocated = blocks.checked_mul(BLOCK_SIZE).ok_or_else(|| {
        ServiceError::new(
            codes::INVALID_ARGUMENT,
            format!("size {bytes} exceeds the largest volume the array supports"),
        )
    })?;
    Ok((blocks, allocated))
}

/// Storage array simulator persisted to a JSON state file.
pub struct SimulatorClient {
    state: Mutex<SimState>,
    path: PathBuf,
    job_steps: u8,
}

impl SimulatorClient {
    /// Open the array stored at `path`, creating a fresh one if the file is absent.
    pub fn open(path: &Path, job_steps: u8) -> InfraResult<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
            serde_json::from_str(&content).map_err(|e| InfraError::Connect {
                uri: format!("sim://?statefile={}", path.display()),
                message: format!("corrupt state file: {e}"),
            })?
        } else {
            info!("creating simulator state at {}", path.display());
            SimState::seeded()
        };
        debug!("simulator opened: {}", path.display());

        Ok(Self {
            state: Mutex::new(state),
            path: path.to_path_buf(),
            job_steps,
        })
    }

    fn lock(&self) -> ServiceResult<MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| ServiceError::new(codes::INTERNAL, "simulator state poisoned"))
    }

    fn read<R>(&self, f: impl FnOnce(&SimState) -> ServiceResult<R>) -> ServiceResult<R> {
        let state = self.lock()?;
        f(&state)
    }

    /// Run a change and persist the state when it succeeds.
    fn update<R>(&self, f: impl FnOnce(&mut SimState) -> ServiceResult<R>) -> ServiceResult<R> {
        let mut state = self.lock()?;
        let result = f(&mut state)?;
        self.save(&state)?;
        Ok(result)
    }

    fn save(&self, state: &SimState) -> ServiceResult<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| ServiceError::new(codes::INTERNAL, e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| {
            ServiceError::new(
                codes::INTERNAL,
                format!("write {}: {}", self.path.display(), e),
            )
        })
    }
}

impl StorageClient for SimulatorClient {
    fn pools(&self) -> ServiceResult<Vec<Pool>> {
        self.read(|s| Ok(s.pools.clone()))
    }

    fn volumes(&self) -> ServiceResult<Vec<Volume>> {
        self.read(|s| Ok(s.volumes.clone()))
    }

    fn initiators(&self) -> ServiceResult<Vec<Initiator>> {
        self.read(|s| Ok(s.initiators.clone()))
    }

    fn file_systems(&self) -> ServiceResult<Vec<FileSystem>> {
        self.read(|s| Ok(s.file_systems.clone()))
    }

    fn snapshots(&self, fs: &FileSystem) -> ServiceResult<Vec<Snapshot>> {
        self.read(|s| {
            s.fs_index(&fs.id)?;
            Ok(s.snapshots.get(&fs.id).cloned().unwrap_or_default())
        })
    }

    fn exports(&self) -> ServiceResult<Vec<NfsExport>> {
        self.read(|s| Ok(s.exports.clone()))
    }

    fn volume_create(
        &self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
        provisioning: Provisioning,
    ) -> ServiceResult<Pending<Volume>> {
        self.update(|s| {
            s.ensure_unique_name("volume", name, s.volumes.iter().map(|v| v.name.as_str()))?;
            let (num_of_blocks, allocated) = allocation(size_bytes)?;
            // Thin volumes take space on write, not on creation.
            let reserved = match provisioning {
                Provisioning::Thin => 0,
                Provisioning::Default | Provisioning::Full => allocated,
            };
            if let Err(end) = s.reserve(&pool.id, reserved)? {
                return Ok(Pending::job(s.start_job(end)));
            }

            let volume = Volume {
                id: s.new_id("VOL"),
                name: name.to_string(),
                vpd83: Uuid::new_v4().simple().to_string(),
                block_size: BLOCK_SIZE,
                num_of_blocks,
                status: STATUS_OK,
                pool_id: pool.id.clone(),
            };
            s.volumes.push(volume.clone());
            let end = JobEnd::Complete(Some(StorageObject::Volume(volume)));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn volume_delete(&self, volume: &Volume) -> ServiceResult<Option<JobId>> {
        self.update(|s| {
            let idx = s.volume_index(&volume.id)?;
            let removed = s.volumes.remove(idx);
            s.access.retain(|a| a.volume_id != removed.id);
            s.release(&removed.pool_id, removed.size_bytes());
            Ok(Some(s.start_job(JobEnd::Complete(None))))
        })
    }

    fn volume_resize(&self, volume: &Volume, size_bytes: u64) -> ServiceResult<Pending<Volume>> {
        self.update(|s| {
            let idx = s.volume_index(&volume.id)?;
            let current = s.volumes[idx].clone();
            let (num_of_blocks, new_size) = allocation(size_bytes)?;

            if new_size > current.size_bytes() {
                if let Err(end) = s.reserve(&current.pool_id, new_size - current.size_bytes())? {
                    return Ok(Pending::job(s.start_job(end)));
                }
            } else {
                s.release(&current.pool_id, current.size_bytes() - new_size);
            }

            s.volumes[idx].num_of_blocks = num_of_blocks;
            let end = JobEnd::Complete(Some(StorageObject::Volume(s.volumes[idx].clone())));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn volume_replicate(
        &self,
        pool: &Pool,
        rep_type: ReplicationType,
        source: &Volume,
        name: &str,
    ) -> ServiceResult<Pending<Volume>> {
        self.update(|s| {
            let idx = s.volume_index(&source.id)?;
            s.ensure_unique_name("volume", name, s.volumes.iter().map(|v| v.name.as_str()))?;
            let origin = s.volumes[idx].clone();
            debug!("replicate {} as {} ({})", origin.id, name, rep_type);

            if let Err(end) = s.reserve(&pool.id, origin.size_bytes())? {
                return Ok(Pending::job(s.start_job(end)));
            }
            let replica = Volume {
                id: s.new_id("VOL"),
                name: name.to_string(),
                vpd83: Uuid::new_v4().simple().to_string(),
                pool_id: pool.id.clone(),
                ..origin
            };
            s.volumes.push(replica.clone());
            let end = JobEnd::Complete(Some(StorageObject::Volume(replica)));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn initiator_create(
        &self,
        name: &str,
        id: &str,
        kind: InitiatorType,
    ) -> ServiceResult<Initiator> {
        self.update(|s| {
            if s.initiators.iter().any(|i| i.id == id) {
                return Err(ServiceError::new(
                    codes::EXISTS,
                    format!("initiator {id} already exists"),
                ));
            }
            let initiator = Initiator {
                id: id.to_string(),
                name: name.to_string(),
                kind,
            };
            s.initiators.push(initiator.clone());
            Ok(initiator)
        })
    }

    fn initiator_delete(&self, initiator: &Initiator) -> ServiceResult<()> {
        self.update(|s| {
            let before = s.initiators.len();
            s.initiators.retain(|i| i.id != initiator.id);
            if s.initiators.len() == before {
                return Err(not_found("initiator", &initiator.id));
            }
            s.access.retain(|a| a.initiator_id != initiator.id);
            Ok(())
        })
    }

    fn access_grant(
        &self,
        initiator: &Initiator,
        volume: &Volume,
        access: AccessType,
    ) -> ServiceResult<()> {
        self.update(|s| {
            s.volume_index(&volume.id)?;
            s.access
                .retain(|a| !(a.initiator_id == initiator.id && a.volume_id == volume.id));
            s.access.push(AccessGrant {
                initiator_id: initiator.id.clone(),
                volume_id: volume.id.clone(),
                access,
            });
            Ok(())
        })
    }

    fn access_revoke(&self, initiator: &Initiator, volume: &Volume) -> ServiceResult<()> {
        self.update(|s| {
            let before = s.access.len();
            s.access
                .retain(|a| !(a.initiator_id == initiator.id && a.volume_id == volume.id));
            if s.access.len() == before {
                return Err(ServiceError::new(
                    codes::NOT_FOUND,
                    format!("initiator {} has no access to volume {}", initiator.id, volume.id),
                ));
            }
            Ok(())
        })
    }

    fn fs_create(
        &self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
    ) -> ServiceResult<Pending<FileSystem>> {
        self.update(|s| {
            s.ensure_unique_name(
                "file system",
                name,
                s.file_systems.iter().map(|f| f.name.as_str()),
            )?;
            if let Err(end) = s.reserve(&pool.id, size_bytes)? {
                return Ok(Pending::job(s.start_job(end)));
            }
            let fs = FileSystem {
                id: s.new_id("FS"),
                name: name.to_string(),
                total_space: size_bytes,
                free_space: size_bytes,
                pool_id: pool.id.clone(),
            };
            s.file_systems.push(fs.clone());
            let end = JobEnd::Complete(Some(StorageObject::FileSystem(fs)));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn fs_delete(&self, fs: &FileSystem) -> ServiceResult<Option<JobId>> {
        self.update(|s| {
            let idx = s.fs_index(&fs.id)?;
            let removed = s.file_systems.remove(idx);
            s.snapshots.remove(&removed.id);
            s.exports.retain(|e| e.fs_id != removed.id);
            s.release(&removed.pool_id, removed.total_space);
            Ok(Some(s.start_job(JobEnd::Complete(None))))
        })
    }

    fn fs_resize(&self, fs: &FileSystem, size_bytes: u64) -> ServiceResult<Pending<FileSystem>> {
        self.update(|s| {
            let idx = s.fs_index(&fs.id)?;
            let current = s.file_systems[idx].clone();
            let used = current.total_space - current.free_space;
            if size_bytes < used {
                return Err(ServiceError::new(
                    codes::INVALID_ARGUMENT,
                    format!("file system {} holds {used} bytes", current.id),
                ));
            }

            if size_bytes > current.total_space {
                if let Err(end) = s.reserve(&current.pool_id, size_bytes - current.total_space)? {
                    return Ok(Pending::job(s.start_job(end)));
                }
            } else {
                s.release(&current.pool_id, current.total_space - size_bytes);
            }

            let target = &mut s.file_systems[idx];
            target.total_space = size_bytes;
            target.free_space = size_bytes - used;
            let end = JobEnd::Complete(Some(StorageObject::FileSystem(target.clone())));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn fs_clone(
        &self,
        source: &FileSystem,
        name: &str,
        snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Pending<FileSystem>> {
        self.update(|s| {
            let idx = s.fs_index(&source.id)?;
            s.ensure_unique_name(
                "file system",
                name,
                s.file_systems.iter().map(|f| f.name.as_str()),
            )?;
            let origin = s.file_systems[idx].clone();
            if let Some(ss) = snapshot {
                debug!("clone {} from snapshot {}", origin.id, ss.id);
            }

            if let Err(end) = s.reserve(&origin.pool_id, origin.total_space)? {
                return Ok(Pending::job(s.start_job(end)));
            }
            let clone = FileSystem {
                id: s.new_id("FS"),
                name: name.to_string(),
                ..origin
            };
            s.file_systems.push(clone.clone());
            let end = JobEnd::Complete(Some(StorageObject::FileSystem(clone)));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn file_clone(
        &self,
        fs: &FileSystem,
        src: &str,
        dest: &str,
        snapshot: Option<&Snapshot>,
    ) -> ServiceResult<Option<JobId>> {
        self.update(|s| {
            s.fs_index(&fs.id)?;
            if src == dest {
                return Err(ServiceError::new(
                    codes::INVALID_ARGUMENT,
                    "source and destination are the same file",
                ));
            }
            debug!(
                "clone {src} -> {dest} on {} (snapshot {:?})",
                fs.id,
                snapshot.map(|ss| &ss.id)
            );
            Ok(Some(s.start_job(JobEnd::Complete(None))))
        })
    }

    fn snapshot_create(
        &self,
        fs: &FileSystem,
        name: &str,
        files: &[String],
    ) -> ServiceResult<Pending<Snapshot>> {
        self.update(|s| {
            s.fs_index(&fs.id)?;
            debug!("snapshot {name} of {} covering {} file(s)", fs.id, files.len());
            let snapshot = Snapshot {
                id: s.new_id("SS"),
                name: name.to_string(),
                ts: chrono::Utc::now().timestamp(),
            };
            s.snapshots
                .entry(fs.id.clone())
                .or_default()
                .push(snapshot.clone());
            let end = JobEnd::Complete(Some(StorageObject::Snapshot(snapshot)));
            Ok(Pending::job(s.start_job(end)))
        })
    }

    fn snapshot_delete(
        &self,
        fs: &FileSystem,
        snapshot: &Snapshot,
    ) -> ServiceResult<Option<JobId>> {
        self.update(|s| {
            let list = s
                .snapshots
                .get_mut(&fs.id)
                .ok_or_else(|| not_found("snapshot", &snapshot.id))?;
            let before = list.len();
            list.retain(|ss| ss.id != snapshot.id);
            if list.len() == before {
                return Err(not_found("snapshot", &snapshot.id));
            }
            Ok(Some(s.start_job(JobEnd::Complete(None))))
        })
    }

    fn export_fs(&self, export: &NfsExport) -> ServiceResult<NfsExport> {
        self.update(|s| {
            s.fs_index(&export.fs_id)?;
            if s.exports.iter().any(|e| e.export_path == export.export_path) {
                return Err(ServiceError::new(
                    codes::EXISTS,
                    format!("export path {} already in use", export.export_path),
                ));
            }
            let created = NfsExport {
                id: s.new_id("EXP"),
                ..export.clone()
            };
            s.exports.push(created.clone());
            Ok(created)
        })
    }

    fn export_remove(&self, export: &NfsExport) -> ServiceResult<()> {
        self.update(|s| {
            let before = s.exports.len();
            s.exports.retain(|e| e.id != export.id);
            if s.exports.len() == before {
                return Err(not_found("nfs export", &export.id));
            }
            Ok(())
        })
    }

    fn job_status(&self, job: &JobId) -> ServiceResult<JobStatus> {
        let steps = self.job_steps;
        self.update(|s| {
            let entry = s
                .jobs
                .get_mut(&job.0)
                .ok_or_else(|| not_found("job", &job.0))?;

            if entry.polls < steps {
                let percent = (u32::from(entry.polls) * 100 / u32::from(steps)) as u8;
                entry.polls += 1;
                return Ok(JobStatus::InProgress { percent });
            }
            Ok(match &entry.end {
                JobEnd::Complete(result) => JobStatus::Complete(result.clone()),
                JobEnd::Error { code, message } => JobStatus::Error {
                    code: *code,
                    message: message.clone(),
                },
            })
        })
    }

    fn job_free(&self, job: &JobId) -> ServiceResult<()> {
        self.update(|s| {
            s.jobs
                .remove(&job.0)
                .map(|_| ())
                .ok_or_else(|| not_found("job", &job.0))
        })
    }

    fn close(&self) -> ServiceResult<()> {
        let state = self.lock()?;
        self.save(&state)
    }
}
