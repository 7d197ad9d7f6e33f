//! Terminal output: record rendering and colored diagnostics
//!
//! Colors respect NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use chrono::{Local, TimeZone};
use colored::Colorize;

use crate::application::services::Outcome;
use crate::domain::{format_human, FileSystem, Initiator, NfsExport, Pool, Snapshot, Volume};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(prog: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}: {}", prog, "error".red().bold(), msg);
}

/// Print plain output (no color, for record lines)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Turns command outcomes into output lines.
///
/// With a separator, every record is one line of fields joined by it and no
/// header is printed. Without one, records are laid out in fixed-width columns
/// under a header row.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    separator: Option<String>,
    human: bool,
}

impl Renderer {
    pub fn new(separator: Option<String>, human: bool) -> Self {
        Self { separator, human }
    }

    pub fn render(&self, outcome: &Outcome) -> Vec<String> {
        match outcome {
            Outcome::Volumes(v) => self.volumes(v),
            Outcome::Pools(p) => self.pools(p),
            Outcome::Initiators(i) => self.initiators(i),
            Outcome::FileSystems(f) => self.file_systems(f),
            Outcome::Snapshots(s) => self.snapshots(s),
            Outcome::Exports(e) => self.exports(e),
            Outcome::Done => Vec::new(),
        }
    }

    fn size(&self, bytes: u64) -> String {
        format_human(bytes, self.human)
    }

    fn terse(&self, fields: &[&str]) -> Option<String> {
        self.separator.as_deref().map(|sep| fields.join(sep))
    }

    pub fn volumes(&self, volumes: &[Volume]) -> Vec<String> {
        let mut lines = Vec::with_capacity(volumes.len() + 1);
        if self.separator.is_none() {
            lines.push(format!(
                "{:<20}{:<40}{:<34}{:<6}{:<10}{:<8}{:<20}",
                "ID", "Name", "vpd83", "bs", "#blocks", "status", "size"
            ));
        }
        for v in volumes {
            let bs = v.block_size.to_string();
            let blocks = v.num_of_blocks.to_string();
            let status = v.status.to_string();
            let size = self.size(v.size_bytes());
            let line = self
                .terse(&[&v.id, &v.name, &v.vpd83, &bs, &blocks, &status, &size])
                .unwrap_or_else(|| {
                    format!(
                        "{:<20}{:<40}{:<34}{:<6}{:<10}{:<8}{:<20}",
                        v.id, v.name, v.vpd83, bs, blocks, status, size
                    )
                });
            lines.push(line);
        }
        lines
    }

    pub fn pools(&self, pools: &[Pool]) -> Vec<String> {
        let mut lines = Vec::with_capacity(pools.len() + 1);
        if self.separator.is_none() {
            lines.push(format!(
                "{:<40}{:<32}{:<32}{:<32}",
                "ID", "Name", "Total space", "Free space"
            ));
        }
        for p in pools {
            let total = self.size(p.total_space);
            let free = self.size(p.free_space);
            let line = self
                .terse(&[&p.id, &p.name, &total, &free])
                .unwrap_or_else(|| format!("{:<40}{:<32}{:<32}{:<32}", p.id, p.name, total, free));
            lines.push(line);
        }
        lines
    }

    pub fn initiators(&self, initiators: &[Initiator]) -> Vec<String> {
        let mut lines = Vec::with_capacity(initiators.len() + 1);
        if self.separator.is_none() {
            lines.push(format!("{:<40}{:<16}{:<5}", "ID", "Name", "Type"));
        }
        for i in initiators {
            let kind = i.kind.as_str();
            let line = self
                .terse(&[&i.id, &i.name, kind])
                .unwrap_or_else(|| format!("{:<40}{:<16}{:<5}", i.id, i.name, kind));
            lines.push(line);
        }
        lines
    }

    pub fn file_systems(&self, file_systems: &[FileSystem]) -> Vec<String> {
        let mut lines = Vec::with_capacity(file_systems.len() + 1);
        if self.separator.is_none() {
            lines.push(format!(
                "{:<40}{:<32}{:<21}{:<21}{:<32}",
                "ID", "Name", "Total space", "Free space", "Pool ID"
            ));
        }
        for f in file_systems {
            let total = self.size(f.total_space);
            let free = self.size(f.free_space);
            let line = self
                .terse(&[&f.id, &f.name, &total, &free, &f.pool_id])
                .unwrap_or_else(|| {
                    format!(
                        "{:<40}{:<32}{:<21}{:<21}{:<32}",
                        f.id, f.name, total, free, f.pool_id
                    )
                });
            lines.push(line);
        }
        lines
    }

    pub fn snapshots(&self, snapshots: &[Snapshot]) -> Vec<String> {
        let mut lines = Vec::with_capacity(snapshots.len() + 1);
        if self.separator.is_none() {
            lines.push(format!("{:<40}{:<32}{:<32}", "ID", "Name", "Created"));
        }
        for s in snapshots {
            let created = timestamp(s.ts);
            let line = self
                .terse(&[&s.id, &s.name, &created])
                .unwrap_or_else(|| format!("{:<40}{:<32}{:<32}", s.id, s.name, created));
            lines.push(line);
        }
        lines
    }

    pub fn exports(&self, exports: &[NfsExport]) -> Vec<String> {
        let join = self.separator.as_deref().unwrap_or(", ");
        let hosts = |list: &[String]| {
            if list.is_empty() {
                "None".to_string()
            } else {
                list.join(join)
            }
        };
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());

        let mut lines = Vec::new();
        for e in exports {
            let pairs = [
                ("id", e.id.clone()),
                ("export", e.export_path.clone()),
                ("fs_id", e.fs_id.clone()),
                ("root", hosts(&e.root)),
                ("ro", hosts(&e.ro)),
                ("rw", hosts(&e.rw)),
                ("anonuid", opt(&e.anonuid)),
                ("anongid", opt(&e.anongid)),
                ("options", opt(&e.options)),
            ];
            match self.separator.as_deref() {
                Some(sep) => {
                    lines.extend(pairs.iter().map(|(k, v)| format!("{k}{sep}{v}")));
                }
                None => {
                    // Keys of seven or more characters already reach the first tab stop.
                    lines.extend(pairs.iter().map(|(k, v)| {
                        let tabs = if k.len() >= 7 { "\t" } else { "\t\t" };
                        format!("{k}:{tabs}{v}")
                    }));
                    lines.push(String::new());
                }
            }
        }
        lines
    }
}

fn timestamp(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
