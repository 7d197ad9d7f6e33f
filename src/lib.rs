//! lsmcli: storage management from the command line
//!
//! Layers, innermost first: `domain` (command table, entities, size codec),
//! `application` (dispatch and job completion), `infrastructure` (storage
//! clients, prompting, wiring) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
