//! Domain entities: storage objects, request enums and job state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Storage pool that volumes and file systems are carved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub total_space: u64,
    pub free_space: u64,
}

/// Block volume (logical unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    /// SCSI VPD page 0x83 identifier
    pub vpd83: String,
    pub block_size: u64,
    pub num_of_blocks: u64,
    pub status: u32,
    pub pool_id: String,
}

impl Volume {
    pub fn size_bytes(&self) -> u64 {
        self.block_size.saturating_mul(self.num_of_blocks)
    }
}

/// Host-side endpoint that can be granted access to volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiator {
    pub id: String,
    pub name: String,
    pub kind: InitiatorType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystem {
    pub id: String,
    pub name: String,
    pub total_space: u64,
    pub free_space: u64,
    pub pool_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    /// Creation time, seconds since the epoch
    pub ts: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfsExport {
    pub id: String,
    pub fs_id: String,
    pub export_path: String,
    pub auth: Option<String>,
    pub root: Vec<String>,
    pub rw: Vec<String>,
    pub ro: Vec<String>,
    pub anonuid: Option<String>,
    pub anongid: Option<String>,
    pub options: Option<String>,
}

/// Any object an asynchronous job can hand back on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageObject {
    Volume(Volume),
    FileSystem(FileSystem),
    Snapshot(Snapshot),
}

impl StorageObject {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageObject::Volume(_) => "volume",
            StorageObject::FileSystem(_) => "file system",
            StorageObject::Snapshot(_) => "snapshot",
        }
    }
}

impl TryFrom<StorageObject> for Volume {
    type Error = StorageObject;

    fn try_from(value: StorageObject) -> Result<Self, Self::Error> {
        match value {
            StorageObject::Volume(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl TryFrom<StorageObject> for FileSystem {
    type Error = StorageObject;

    fn try_from(value: StorageObject) -> Result<Self, Self::Error> {
        match value {
            StorageObject::FileSystem(fs) => Ok(fs),
            other => Err(other),
        }
    }
}

impl TryFrom<StorageObject> for Snapshot {
    type Error = StorageObject;

    fn try_from(value: StorageObject) -> Result<Self, Self::Error> {
        match value {
            StorageObject::Snapshot(ss) => Ok(ss),
            other => Err(other),
        }
    }
}

/// Objects addressed by id on the command line.
pub trait Identified {
    /// Noun used in "not found" messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty => $kind:literal),+ $(,)?) => {
        $(
            impl Identified for $ty {
                const KIND: &'static str = $kind;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )+
    };
}

identified!(
    Pool => "pool",
    Volume => "volume",
    Initiator => "initiator",
    FileSystem => "file system",
    Snapshot => "snapshot",
    NfsExport => "nfs export",
);

/// Result types an asynchronous job can produce.
pub trait JobOutput: Identified + TryFrom<StorageObject, Error = StorageObject> {}

impl JobOutput for Volume {}
impl JobOutput for FileSystem {}
impl JobOutput for Snapshot {}

/// Opaque handle of a server-side job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    InProgress { percent: u8 },
    Complete(Option<StorageObject>),
    Error { code: i32, message: String },
}

/// Reply of an operation that may run asynchronously.
///
/// Either `job` is set and the result must be awaited, or `item` already holds
/// the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<T> {
    pub job: Option<JobId>,
    pub item: Option<T>,
}

impl<T> Pending<T> {
    pub fn done(item: T) -> Self {
        Self {
            job: None,
            item: Some(item),
        }
    }

    pub fn job(id: JobId) -> Self {
        Self {
            job: Some(id),
            item: None,
        }
    }
}

/// Parses a case-insensitive keyword into one of a fixed set of variants.
macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == upper)
                    .ok_or_else(|| DomainError::InvalidEnumValue {
                        what: $what,
                        value: s.to_string(),
                    })
            }
        }
    };
}

keyword_enum!(
    /// Kind of record shown by `--list`.
    ListTarget, "listing type" {
        Volumes => "VOLUMES",
        Initiators => "INITIATORS",
        Pools => "POOLS",
        FileSystems => "FS",
        Snapshots => "SNAPSHOTS",
        Exports => "EXPORTS",
    }
);

keyword_enum!(InitiatorType, "initiator type" {
    PortWwn => "WWPN",
    NodeWwn => "WWNN",
    Iscsi => "ISCSI",
    Hostname => "HOSTNAME",
});

keyword_enum!(ReplicationType, "replication type" {
    Snapshot => "RW_SNAP",
    Clone => "CLONE",
    Mirror => "MIRROR",
});

keyword_enum!(AccessType, "access type" {
    ReadOnly => "RO",
    ReadWrite => "RW",
});

keyword_enum!(Provisioning, "provisioning type" {
    Default => "DEFAULT",
    Thin => "THIN",
    Full => "FULL",
});
