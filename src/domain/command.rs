//! Command table and option validation
//!
//! Every command takes one positional value and an exact set of argument
//! options. A handful of modifier options (`provisioning`, `file`, host lists,
//! ...) are accepted only by the commands that understand them.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use tracing::debug;

use crate::domain::size::parse_size;
use crate::domain::{DomainError, DomainResult, ListTarget};

/// Name of an argument option, as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionName {
    Size,
    Pool,
    Type,
    Name,
    Volume,
    Access,
    Id,
    Src,
    Dest,
    Fs,
    ExportPath,
    Provisioning,
    BackingSnapshot,
    File,
    Root,
    Ro,
    Rw,
    AnonUid,
    AnonGid,
}

impl OptionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionName::Size => "size",
            OptionName::Pool => "pool",
            OptionName::Type => "type",
            OptionName::Name => "name",
            OptionName::Volume => "volume",
            OptionName::Access => "access",
            OptionName::Id => "id",
            OptionName::Src => "src",
            OptionName::Dest => "dest",
            OptionName::Fs => "fs",
            OptionName::ExportPath => "exportpath",
            OptionName::Provisioning => "provisioning",
            OptionName::BackingSnapshot => "backing-snapshot",
            OptionName::File => "file",
            OptionName::Root => "root",
            OptionName::Ro => "ro",
            OptionName::Rw => "rw",
            OptionName::AnonUid => "anonuid",
            OptionName::AnonGid => "anongid",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every operation the client can perform, one per command flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    List,
    CreateInitiator,
    DeleteInitiator,
    DeleteFs,
    CreateVolume,
    CreateFs,
    CreateSnapshot,
    CloneFs,
    CloneFile,
    DeleteVolume,
    DeleteSnapshot,
    ReplicateVolume,
    AccessGrant,
    AccessRevoke,
    ResizeVolume,
    ResizeFs,
    NfsExportRemove,
    NfsExportFs,
}

impl CommandName {
    pub const ALL: &'static [CommandName] = &[
        CommandName::List,
        CommandName::CreateInitiator,
        CommandName::DeleteInitiator,
        CommandName::DeleteFs,
        CommandName::CreateVolume,
        CommandName::CreateFs,
        CommandName::CreateSnapshot,
        CommandName::CloneFs,
        CommandName::CloneFile,
        CommandName::DeleteVolume,
        CommandName::DeleteSnapshot,
        CommandName::ReplicateVolume,
        CommandName::AccessGrant,
        CommandName::AccessRevoke,
        CommandName::ResizeVolume,
        CommandName::ResizeFs,
        CommandName::NfsExportRemove,
        CommandName::NfsExportFs,
    ];

    /// Flag name without the leading dashes.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::List => "list",
            CommandName::CreateInitiator => "create-initiator",
            CommandName::DeleteInitiator => "delete-initiator",
            CommandName::DeleteFs => "delete-fs",
            CommandName::CreateVolume => "create-volume",
            CommandName::CreateFs => "create-fs",
            CommandName::CreateSnapshot => "create-ss",
            CommandName::CloneFs => "clone-fs",
            CommandName::CloneFile => "clone-file",
            CommandName::DeleteVolume => "delete-volume",
            CommandName::DeleteSnapshot => "delete-ss",
            CommandName::ReplicateVolume => "replicate-volume",
            CommandName::AccessGrant => "access-grant",
            CommandName::AccessRevoke => "access-revoke",
            CommandName::ResizeVolume => "resize-volume",
            CommandName::ResizeFs => "resize-fs",
            CommandName::NfsExportRemove => "nfs-export-remove",
            CommandName::NfsExportFs => "nfs-export-fs",
        }
    }

    /// Argument options that must all be supplied, and nothing else.
    pub fn required_options(&self) -> &'static [OptionName] {
        use OptionName::*;
        match self {
            CommandName::List => &[],
            CommandName::CreateInitiator => &[Id, Type],
            CommandName::DeleteInitiator => &[],
            CommandName::DeleteFs => &[],
            CommandName::CreateVolume => &[Size, Pool],
            CommandName::CreateFs => &[Size, Pool],
            CommandName::CreateSnapshot => &[Fs],
            CommandName::CloneFs => &[Name],
            CommandName::CloneFile => &[Src, Dest],
            CommandName::DeleteVolume => &[],
            CommandName::DeleteSnapshot => &[Fs],
            CommandName::ReplicateVolume => &[Type, Pool, Name],
            CommandName::AccessGrant => &[Volume, Access],
            CommandName::AccessRevoke => &[Volume],
            CommandName::ResizeVolume => &[Size],
            CommandName::ResizeFs => &[Size],
            CommandName::NfsExportRemove => &[],
            CommandName::NfsExportFs => &[ExportPath],
        }
    }

    /// Modifier options this command accepts but does not require.
    pub fn optional_options(&self) -> &'static [OptionName] {
        use OptionName::*;
        match self {
            CommandName::CreateVolume => &[Provisioning],
            CommandName::CreateSnapshot => &[File],
            CommandName::CloneFs | CommandName::CloneFile => &[BackingSnapshot],
            CommandName::NfsExportFs => &[Root, Ro, Rw, AnonUid, AnonGid],
            _ => &[],
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selected command together with its positional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: CommandName,
    pub value: String,
}

impl Command {
    pub fn new(name: CommandName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Required options for this invocation.
    ///
    /// Listing snapshots is the one case that depends on the value: it needs
    /// the file system the snapshots belong to.
    pub fn required_options(&self) -> BTreeSet<OptionName> {
        let mut required: BTreeSet<OptionName> =
            self.name.required_options().iter().copied().collect();
        if self.name == CommandName::List
            && self.value.parse::<ListTarget>() == Ok(ListTarget::Snapshots)
        {
            required.insert(OptionName::Fs);
        }
        required
    }
}

/// Argument options as supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentOptions {
    pub size: Option<String>,
    pub pool: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub volume: Option<String>,
    pub access: Option<String>,
    pub id: Option<String>,
    pub src: Option<String>,
    pub dest: Option<String>,
    pub fs: Option<String>,
    pub exportpath: Option<String>,
    pub provisioning: Option<String>,
    pub backing_snapshot: Option<String>,
    pub file: Vec<String>,
    pub root: Vec<String>,
    pub ro: Vec<String>,
    pub rw: Vec<String>,
    pub anonuid: Option<String>,
    pub anongid: Option<String>,
}

impl ArgumentOptions {
    /// Names of all options that were given a value.
    pub fn supplied(&self) -> BTreeSet<OptionName> {
        let singles = [
            (OptionName::Size, self.size.is_some()),
            (OptionName::Pool, self.pool.is_some()),
            (OptionName::Type, self.kind.is_some()),
            (OptionName::Name, self.name.is_some()),
            (OptionName::Volume, self.volume.is_some()),
            (OptionName::Access, self.access.is_some()),
            (OptionName::Id, self.id.is_some()),
            (OptionName::Src, self.src.is_some()),
            (OptionName::Dest, self.dest.is_some()),
            (OptionName::Fs, self.fs.is_some()),
            (OptionName::ExportPath, self.exportpath.is_some()),
            (OptionName::Provisioning, self.provisioning.is_some()),
            (OptionName::BackingSnapshot, self.backing_snapshot.is_some()),
            (OptionName::File, !self.file.is_empty()),
            (OptionName::Root, !self.root.is_empty()),
            (OptionName::Ro, !self.ro.is_empty()),
            (OptionName::Rw, !self.rw.is_empty()),
            (OptionName::AnonUid, self.anonuid.is_some()),
            (OptionName::AnonGid, self.anongid.is_some()),
        ];
        singles
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

/// Pick the single command that was given a value.
///
/// `candidates` lists every command flag with its value (if any).
pub fn select_command<I, S>(candidates: I) -> DomainResult<Command>
where
    I: IntoIterator<Item = (CommandName, Option<S>)>,
    S: Into<String>,
{
    let mut set: Vec<Command> = candidates
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| Command::new(name, v)))
        .collect();

    match set.len() {
        0 => Err(DomainError::NoCommand),
        1 => Ok(set.remove(0)),
        _ => Err(DomainError::MultipleCommands(
            set.iter().map(|c| c.name.to_string()).collect_vec(),
        )),
    }
}

/// Check that the supplied options fit `command` exactly.
///
/// Required options must all be present; any argument option the command
/// neither requires nor accepts as a modifier is rejected. A supplied size must
/// parse, whatever the command.
pub fn validate(command: &Command, options: &ArgumentOptions) -> DomainResult<()> {
    let required = command.required_options();
    let supplied = options.supplied();
    debug!(
        "validate: command={} required=[{}] supplied=[{}]",
        command.name,
        required.iter().join(","),
        supplied.iter().join(",")
    );

    let missing: Vec<String> = required
        .difference(&supplied)
        .map(|o| o.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::MissingOption {
            command: command.name.to_string(),
            options: missing,
        });
    }

    let optional = command.name.optional_options();
    let unexpected: Vec<String> = supplied
        .iter()
        .filter(|o| !required.contains(o) && !optional.contains(o))
        .map(|o| o.to_string())
        .collect();
    if !unexpected.is_empty() {
        return Err(DomainError::UnexpectedOption {
            command: command.name.to_string(),
            options: unexpected,
        });
    }

    if let Some(size) = &options.size {
        parse_size(size)?;
    }
    Ok(())
}
