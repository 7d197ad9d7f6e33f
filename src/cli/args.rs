//! CLI argument definitions using clap
//!
//! Commands are flags rather than subcommands: exactly one of them must be
//! given, and its value is the object the command acts on.

use clap::{Args, Parser};

use crate::domain::{ArgumentOptions, CommandName};

/// libStorageMgmt command line interface
#[derive(Parser, Debug)]
#[command(name = "lsmcli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Uniform resource identifier of the storage service (env LSMCLI_URI)
    #[arg(short, long)]
    pub uri: Option<String>,

    /// Prompt for password (env LSMCLI_PASSWORD)
    #[arg(short = 'P', long)]
    pub prompt: bool,

    /// Print sizes in human readable format (MiB, GiB, TiB)
    #[arg(short = 'H', long)]
    pub human: bool,

    /// Print output in terse form with SEP as a record separator
    #[arg(short = 't', long = "terse", value_name = "SEP")]
    pub sep: Option<String>,

    /// Give up on asynchronous jobs after SECS seconds
    #[arg(long, value_name = "SECS")]
    pub job_timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,

    #[command(flatten)]
    pub commands: CommandArgs,

    #[command(flatten)]
    pub options: OptionArgs,
}

/// One flag per command; exactly one must be set.
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Commands")]
pub struct CommandArgs {
    /// List records of type [VOLUMES|INITIATORS|POOLS|FS|SNAPSHOTS|EXPORTS] (SNAPSHOTS requires --fs)
    #[arg(short, long, value_name = "TYPE")]
    pub list: Option<String>,

    /// Create an initiator record, requires --id and --type [WWPN|WWNN|ISCSI|HOSTNAME]
    #[arg(long, value_name = "INITIATOR NAME")]
    pub create_initiator: Option<String>,

    /// Delete an initiator record
    #[arg(long, value_name = "INITIATOR ID")]
    pub delete_initiator: Option<String>,

    /// Delete a file system
    #[arg(long, value_name = "FS ID")]
    pub delete_fs: Option<String>,

    /// Create a volume, requires --size and --pool (optional --provisioning)
    #[arg(long, value_name = "VOLUME NAME")]
    pub create_volume: Option<String>,

    /// Create a file system, requires --size and --pool
    #[arg(long, value_name = "FS NAME")]
    pub create_fs: Option<String>,

    /// Create a snapshot, requires --fs (optional --file, repeated)
    #[arg(long = "create-ss", value_name = "SNAPSHOT NAME")]
    pub create_snapshot: Option<String>,

    /// Clone a file system, requires --name (optional --backing-snapshot)
    #[arg(long, value_name = "SOURCE FS ID")]
    pub clone_fs: Option<String>,

    /// Clone a file, requires --src and --dest (optional --backing-snapshot)
    #[arg(long, value_name = "FS ID")]
    pub clone_file: Option<String>,

    /// Delete a volume
    #[arg(long, value_name = "VOLUME ID")]
    pub delete_volume: Option<String>,

    /// Delete a snapshot, requires --fs
    #[arg(long = "delete-ss", value_name = "SNAPSHOT ID")]
    pub delete_snapshot: Option<String>,

    /// Replicate a volume, requires --type [RW_SNAP|CLONE|MIRROR], --pool and --name
    #[arg(short, long, value_name = "VOLUME ID")]
    pub replicate_volume: Option<String>,

    /// Grant an initiator access to a volume, requires --volume and --access [RO|RW]
    #[arg(long, value_name = "INITIATOR ID")]
    pub access_grant: Option<String>,

    /// Remove an initiator's access to a volume, requires --volume
    #[arg(long, value_name = "INITIATOR ID")]
    pub access_revoke: Option<String>,

    /// Resize a volume, requires --size
    #[arg(long, value_name = "VOLUME ID")]
    pub resize_volume: Option<String>,

    /// Resize a file system, requires --size
    #[arg(long, value_name = "FS ID")]
    pub resize_fs: Option<String>,

    /// Remove an NFS export
    #[arg(long, value_name = "EXPORT ID")]
    pub nfs_export_remove: Option<String>,

    /// Export a file system over NFS, requires --exportpath and one of --root/--ro/--rw
    #[arg(long, value_name = "FS ID")]
    pub nfs_export_fs: Option<String>,
}

impl CommandArgs {
    /// Every command flag with the value it was given.
    pub fn candidates(&self) -> Vec<(CommandName, Option<&str>)> {
        vec![
            (CommandName::List, self.list.as_deref()),
            (CommandName::CreateInitiator, self.create_initiator.as_deref()),
            (CommandName::DeleteInitiator, self.delete_initiator.as_deref()),
            (CommandName::DeleteFs, self.delete_fs.as_deref()),
            (CommandName::CreateVolume, self.create_volume.as_deref()),
            (CommandName::CreateFs, self.create_fs.as_deref()),
            (CommandName::CreateSnapshot, self.create_snapshot.as_deref()),
            (CommandName::CloneFs, self.clone_fs.as_deref()),
            (CommandName::CloneFile, self.clone_file.as_deref()),
            (CommandName::DeleteVolume, self.delete_volume.as_deref()),
            (CommandName::DeleteSnapshot, self.delete_snapshot.as_deref()),
            (CommandName::ReplicateVolume, self.replicate_volume.as_deref()),
            (CommandName::AccessGrant, self.access_grant.as_deref()),
            (CommandName::AccessRevoke, self.access_revoke.as_deref()),
            (CommandName::ResizeVolume, self.resize_volume.as_deref()),
            (CommandName::ResizeFs, self.resize_fs.as_deref()),
            (CommandName::NfsExportRemove, self.nfs_export_remove.as_deref()),
            (CommandName::NfsExportFs, self.nfs_export_fs.as_deref()),
        ]
    }
}

/// Options consumed by the commands.
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Command options")]
pub struct OptionArgs {
    /// Size (can use M, G, T postfix)
    #[arg(long)]
    pub size: Option<String>,

    /// Pool ID
    #[arg(long, value_name = "POOL ID")]
    pub pool: Option<String>,

    /// Type specifier
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Human readable name
    #[arg(long)]
    pub name: Option<String>,

    /// Volume ID
    #[arg(long, value_name = "VOLUME ID")]
    pub volume: Option<String>,

    /// [RO|RW], read-only or read-write access
    #[arg(long)]
    pub access: Option<String>,

    /// Initiator ID
    #[arg(long, value_name = "INITIATOR ID")]
    pub id: Option<String>,

    /// Provisioning type [DEFAULT|THIN|FULL]
    #[arg(long)]
    pub provisioning: Option<String>,

    /// Backing snapshot for the operation
    #[arg(long, value_name = "SNAPSHOT ID")]
    pub backing_snapshot: Option<String>,

    /// Source of the operation
    #[arg(long, value_name = "SOURCE FILE")]
    pub src: Option<String>,

    /// Destination of the operation
    #[arg(long, value_name = "DEST FILE")]
    pub dest: Option<String>,

    /// File to include in the operation, can be repeated
    #[arg(long, value_name = "FILE")]
    pub file: Vec<String>,

    /// File system of interest
    #[arg(long, value_name = "FS ID")]
    pub fs: Option<String>,

    /// Desired export path on the array
    #[arg(long, value_name = "PATH")]
    pub exportpath: Option<String>,

    /// Host with no_root_squash, can be repeated
    #[arg(long, value_name = "HOST")]
    pub root: Vec<String>,

    /// Host with read-only access, can be repeated
    #[arg(long, value_name = "HOST")]
    pub ro: Vec<String>,

    /// Host with read/write access, can be repeated
    #[arg(long, value_name = "HOST")]
    pub rw: Vec<String>,

    /// UID to map to anonymous
    #[arg(long, value_name = "UID")]
    pub anonuid: Option<String>,

    /// GID to map to anonymous
    #[arg(long, value_name = "GID")]
    pub anongid: Option<String>,
}

impl From<OptionArgs> for ArgumentOptions {
    fn from(args: OptionArgs) -> Self {
        Self {
            size: args.size,
            pool: args.pool,
            kind: args.kind,
            name: args.name,
            volume: args.volume,
            access: args.access,
            id: args.id,
            src: args.src,
            dest: args.dest,
            fs: args.fs,
            exportpath: args.exportpath,
            provisioning: args.provisioning,
            backing_snapshot: args.backing_snapshot,
            file: args.file,
            root: args.root,
            ro: args.ro,
            rw: args.rw,
            anonuid: args.anonuid,
            anongid: args.anongid,
        }
    }
}
