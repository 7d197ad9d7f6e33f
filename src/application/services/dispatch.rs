//! Command dispatch
//!
//! Runs exactly one command against the storage service and returns what
//! should be shown to the user.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::jobs::JobWaiter;
use crate::application::{ApplicationError, ApplicationResult, ServiceResultExt};
use crate::domain::{
    parse_size, AccessType, ArgumentOptions, Command, CommandName, DomainError, FileSystem,
    Identified, Initiator, InitiatorType, JobId, JobOutput, ListTarget, NfsExport, OptionName,
    Pending, Pool, Provisioning, ReplicationType, Snapshot, Volume,
};
use crate::infrastructure::traits::StorageClient;

/// Records produced by a command, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Volumes(Vec<Volume>),
    Pools(Vec<Pool>),
    Initiators(Vec<Initiator>),
    FileSystems(Vec<FileSystem>),
    Snapshots(Vec<Snapshot>),
    Exports(Vec<NfsExport>),
    /// Command succeeded with nothing to show
    Done,
}

/// Service executing validated commands.
pub struct CommandService {
    client: Arc<dyn StorageClient>,
    waiter: JobWaiter,
}

impl CommandService {
    pub fn new(client: Arc<dyn StorageClient>, waiter: JobWaiter) -> Self {
        Self { client, waiter }
    }

    /// Run the handler registered for `command`.
    #[instrument(skip_all, fields(command = %command.name, value = %command.value))]
    pub fn dispatch(
        &self,
        command: &Command,
        options: &ArgumentOptions,
    ) -> ApplicationResult<Outcome> {
        let value = command.value.as_str();
        let outcome = match command.name {
            CommandName::List => self.list(value, options),
            CommandName::CreateInitiator => self.create_initiator(value, options),
            CommandName::DeleteInitiator => self.delete_initiator(value),
            CommandName::DeleteFs => self.delete_fs(value),
            CommandName::CreateVolume => self.create_volume(value, options),
            CommandName::CreateFs => self.create_fs(value, options),
            CommandName::CreateSnapshot => self.create_snapshot(value, options),
            CommandName::CloneFs => self.clone_fs(value, options),
            CommandName::CloneFile => self.clone_file(value, options),
            CommandName::DeleteVolume => self.delete_volume(value),
            CommandName::DeleteSnapshot => self.delete_snapshot(value, options),
            CommandName::ReplicateVolume => self.replicate_volume(value, options),
            CommandName::AccessGrant => self.access_grant(value, options),
            CommandName::AccessRevoke => self.access_revoke(value, options),
            CommandName::ResizeVolume => self.resize_volume(value, options),
            CommandName::ResizeFs => self.resize_fs(value, options),
            CommandName::NfsExportRemove => self.nfs_export_remove(value),
            CommandName::NfsExportFs => self.nfs_export_fs(value, options),
        }?;
        info!("{} finished", command.name);
        Ok(outcome)
    }

    fn list(&self, target: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let outcome = match target.parse::<ListTarget>()? {
            ListTarget::Volumes => Outcome::Volumes(self.client.volumes().context("list volumes")?),
            ListTarget::Pools => Outcome::Pools(self.client.pools().context("list pools")?),
            ListTarget::FileSystems => Outcome::FileSystems(
                self.client.file_systems().context("list file systems")?,
            ),
            ListTarget::Initiators => {
                Outcome::Initiators(self.client.initiators().context("list initiators")?)
            }
            ListTarget::Exports => {
                Outcome::Exports(self.client.exports().context("list nfs exports")?)
            }
            ListTarget::Snapshots => {
                let fs_id = required(CommandName::List, OptionName::Fs, &options.fs)?;
                let fs = self.file_system(fs_id)?;
                Outcome::Snapshots(self.client.snapshots(&fs).context("list snapshots")?)
            }
        };
        Ok(outcome)
    }

    fn create_initiator(&self, name: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::CreateInitiator;
        let kind: InitiatorType = required(command, OptionName::Type, &options.kind)?.parse()?;
        let id = required(command, OptionName::Id, &options.id)?;

        let initiator = self
            .client
            .initiator_create(name, id, kind)
            .context("create initiator")?;
        Ok(Outcome::Initiators(vec![initiator]))
    }

    fn delete_initiator(&self, id: &str) -> ApplicationResult<Outcome> {
        let initiator = self.initiator(id)?;
        self.client
            .initiator_delete(&initiator)
            .context("delete initiator")?;
        Ok(Outcome::Done)
    }

    fn delete_fs(&self, id: &str) -> ApplicationResult<Outcome> {
        let fs = self.file_system(id)?;
        let job = self.client.fs_delete(&fs).context("delete file system")?;
        self.finish("delete-fs", job)?;
        Ok(Outcome::Done)
    }

    fn create_volume(&self, name: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::CreateVolume;
        let size = parse_size(required(command, OptionName::Size, &options.size)?)?;
        let provisioning = match &options.provisioning {
            Some(p) => p.parse()?,
            None => Provisioning::Default,
        };
        let pool = self.pool(required(command, OptionName::Pool, &options.pool)?)?;

        let pending = self
            .client
            .volume_create(&pool, name, size, provisioning)
            .context("create volume")?;
        let volume = self.result("create-volume", pending)?;
        Ok(Outcome::Volumes(vec![volume]))
    }

    fn create_fs(&self, name: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::CreateFs;
        let size = parse_size(required(command, OptionName::Size, &options.size)?)?;
        let pool = self.pool(required(command, OptionName::Pool, &options.pool)?)?;

        let pending = self
            .client
            .fs_create(&pool, name, size)
            .context("create file system")?;
        let fs = self.result("create-fs", pending)?;
        Ok(Outcome::FileSystems(vec![fs]))
    }

    fn create_snapshot(&self, name: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let fs_id = required(CommandName::CreateSnapshot, OptionName::Fs, &options.fs)?;
        let fs = self.file_system(fs_id)?;

        let pending = self
            .client
            .snapshot_create(&fs, name, &options.file)
            .context("create snapshot")?;
        let snapshot = self.result("create-ss", pending)?;
        Ok(Outcome::Snapshots(vec![snapshot]))
    }

    fn clone_fs(&self, source_id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let name = required(CommandName::CloneFs, OptionName::Name, &options.name)?;
        let source = self.file_system(source_id)?;
        let snapshot = self.backing_snapshot(&source, options)?;

        let pending = self
            .client
            .fs_clone(&source, name, snapshot.as_ref())
            .context("clone file system")?;
        let fs = self.result("clone-fs", pending)?;
        Ok(Outcome::FileSystems(vec![fs]))
    }

    fn clone_file(&self, fs_id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::CloneFile;
        let src = required(command, OptionName::Src, &options.src)?;
        let dest = required(command, OptionName::Dest, &options.dest)?;
        let fs = self.file_system(fs_id)?;
        let snapshot = self.backing_snapshot(&fs, options)?;

        let job = self
            .client
            .file_clone(&fs, src, dest, snapshot.as_ref())
            .context("clone file")?;
        self.finish("clone-file", job)?;
        Ok(Outcome::Done)
    }

    fn delete_volume(&self, id: &str) -> ApplicationResult<Outcome> {
        let volume = self.volume(id)?;
        let job = self.client.volume_delete(&volume).context("delete volume")?;
        self.finish("delete-volume", job)?;
        Ok(Outcome::Done)
    }

    fn delete_snapshot(&self, id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let fs_id = required(CommandName::DeleteSnapshot, OptionName::Fs, &options.fs)?;
        let fs = self.file_system(fs_id)?;
        let snapshot = self.snapshot(&fs, id)?;

        let job = self
            .client
            .snapshot_delete(&fs, &snapshot)
            .context("delete snapshot")?;
        self.finish("delete-ss", job)?;
        Ok(Outcome::Done)
    }

    fn replicate_volume(&self, id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::ReplicateVolume;
        let rep_type: ReplicationType = required(command, OptionName::Type, &options.kind)?.parse()?;
        let name = required(command, OptionName::Name, &options.name)?;
        let pool = self.pool(required(command, OptionName::Pool, &options.pool)?)?;
        let source = self.volume(id)?;

        let pending = self
            .client
            .volume_replicate(&pool, rep_type, &source, name)
            .context("replicate volume")?;
        let volume = self.result("replicate-volume", pending)?;
        Ok(Outcome::Volumes(vec![volume]))
    }

    fn access_grant(&self, initiator_id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let command = CommandName::AccessGrant;
        let access: AccessType = required(command, OptionName::Access, &options.access)?.parse()?;
        let initiator = self.initiator(initiator_id)?;
        let volume = self.volume(required(command, OptionName::Volume, &options.volume)?)?;

        self.client
            .access_grant(&initiator, &volume, access)
            .context("grant access")?;
        Ok(Outcome::Done)
    }

    fn access_revoke(&self, initiator_id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let volume_id = required(CommandName::AccessRevoke, OptionName::Volume, &options.volume)?;
        let initiator = self.initiator(initiator_id)?;
        let volume = self.volume(volume_id)?;

        self.client
            .access_revoke(&initiator, &volume)
            .context("revoke access")?;
        Ok(Outcome::Done)
    }

    fn resize_volume(&self, id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let size = parse_size(required(CommandName::ResizeVolume, OptionName::Size, &options.size)?)?;
        let volume = self.volume(id)?;

        let pending = self
            .client
            .volume_resize(&volume, size)
            .context("resize volume")?;
        let volume = self.result("resize-volume", pending)?;
        Ok(Outcome::Volumes(vec![volume]))
    }

    fn resize_fs(&self, id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let size = parse_size(required(CommandName::ResizeFs, OptionName::Size, &options.size)?)?;
        let fs = self.file_system(id)?;

        let pending = self
            .client
            .fs_resize(&fs, size)
            .context("resize file system")?;
        let fs = self.result("resize-fs", pending)?;
        Ok(Outcome::FileSystems(vec![fs]))
    }

    fn nfs_export_remove(&self, id: &str) -> ApplicationResult<Outcome> {
        let exports = self.client.exports().context("list nfs exports")?;
        let export = find(exports, id)?;
        self.client
            .export_remove(&export)
            .context("remove nfs export")?;
        Ok(Outcome::Done)
    }

    fn nfs_export_fs(&self, fs_id: &str, options: &ArgumentOptions) -> ApplicationResult<Outcome> {
        let path = required(CommandName::NfsExportFs, OptionName::ExportPath, &options.exportpath)?;
        let fs = self.file_system(fs_id)?;

        if options.root.is_empty() && options.ro.is_empty() && options.rw.is_empty() {
            return Err(ApplicationError::InvalidRequest(
                "please specify --root, --ro or --rw access".to_string(),
            ));
        }

        // The service assigns the id.
        let request = NfsExport {
            id: String::new(),
            fs_id: fs.id.clone(),
            export_path: path.to_string(),
            auth: None,
            root: options.root.clone(),
            rw: options.rw.clone(),
            ro: options.ro.clone(),
            anonuid: options.anonuid.clone(),
            anongid: options.anongid.clone(),
            options: None,
        };
        let export = self.client.export_fs(&request).context("export file system")?;
        Ok(Outcome::Exports(vec![export]))
    }

    /// Await a job that has no result object.
    fn finish(&self, label: &str, job: Option<JobId>) -> ApplicationResult<()> {
        if let Some(job) = job {
            self.waiter.wait(label, &job)?;
        }
        Ok(())
    }

    /// Await an operation that must produce an object.
    fn result<T: JobOutput>(&self, label: &str, pending: Pending<T>) -> ApplicationResult<T> {
        debug!("{label}: job={:?}", pending.job);
        self.waiter
            .await_completion(label, pending.job, pending.item)?
            .ok_or_else(|| ApplicationError::UnexpectedJobResult {
                label: label.to_string(),
                expected: T::KIND,
                actual: "nothing",
            })
    }

    fn pool(&self, id: &str) -> ApplicationResult<Pool> {
        find(self.client.pools().context("list pools")?, id)
    }

    fn volume(&self, id: &str) -> ApplicationResult<Volume> {
        find(self.client.volumes().context("list volumes")?, id)
    }

    fn initiator(&self, id: &str) -> ApplicationResult<Initiator> {
        find(self.client.initiators().context("list initiators")?, id)
    }

    fn file_system(&self, id: &str) -> ApplicationResult<FileSystem> {
        find(self.client.file_systems().context("list file systems")?, id)
    }

    fn snapshot(&self, fs: &FileSystem, id: &str) -> ApplicationResult<Snapshot> {
        find(self.client.snapshots(fs).context("list snapshots")?, id)
    }

    fn backing_snapshot(
        &self,
        fs: &FileSystem,
        options: &ArgumentOptions,
    ) -> ApplicationResult<Option<Snapshot>> {
        options
            .backing_snapshot
            .as_deref()
            .map(|id| self.snapshot(fs, id))
            .transpose()
    }
}

/// Value of an option the command cannot run without.
fn required<'a>(
    command: CommandName,
    option: OptionName,
    value: &'a Option<String>,
) -> ApplicationResult<&'a str> {
    value.as_deref().ok_or_else(|| {
        DomainError::MissingOption {
            command: command.to_string(),
            options: vec![option.to_string()],
        }
        .into()
    })
}

fn find<T: Identified>(items: Vec<T>, id: &str) -> ApplicationResult<T> {
    items
        .into_iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| ApplicationError::ObjectNotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
}
