//! Integration tests for record rendering.

use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use lsmcli::application::services::Outcome;
use lsmcli::cli::{run, Renderer};
use lsmcli::config::Settings;
use lsmcli::domain::{
    ArgumentOptions, Command, CommandName, FileSystem, Initiator, InitiatorType, NfsExport, Pool,
    Volume, GIB, TIB,
};
use lsmcli::infrastructure::di::ServiceContainer;
use lsmcli::infrastructure::simulator::SimulatorClient;

#[fixture]
fn volume() -> Volume {
    Volume {
        id: "VOL_ID_00001".into(),
        name: "vol1".into(),
        vpd83: "6001405abcdef".into(),
        block_size: 512,
        num_of_blocks: 2 * GIB / 512,
        status: 1,
        pool_id: "POOL_ID_00001".into(),
    }
}

#[fixture]
fn export() -> NfsExport {
    NfsExport {
        id: "EXP_ID_00001".into(),
        fs_id: "FS_ID_00001".into(),
        export_path: "/exports/fs1".into(),
        auth: None,
        root: vec![],
        rw: vec!["host1".into(), "host2".into()],
        ro: vec![],
        anonuid: Some("65534".into()),
        anongid: None,
        options: None,
    }
}

#[rstest]
fn given_separator_when_rendering_volumes_then_one_line_per_record(volume: Volume) {
    // Arrange
    let renderer = Renderer::new(Some("|".into()), false);

    // Act
    let lines = renderer.render(&Outcome::Volumes(vec![volume]));

    // Assert: no header in terse mode
    assert_eq!(
        lines,
        vec![format!(
            "VOL_ID_00001|vol1|6001405abcdef|512|{}|1|{}",
            2 * GIB / 512,
            2 * GIB
        )]
    );
}

#[rstest]
fn given_separator_and_human_when_rendering_volumes_then_size_is_scaled(volume: Volume) {
    let renderer = Renderer::new(Some(",".into()), true);

    let lines = renderer.volumes(&[volume]);

    assert!(lines[0].ends_with(",2.00 GiB"), "got {}", lines[0]);
}

#[rstest]
fn given_no_separator_when_rendering_volumes_then_header_and_columns(volume: Volume) {
    let renderer = Renderer::new(None, false);

    let lines = renderer.volumes(&[volume]);

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("{:<20}{:<40}", "ID", "Name")));
    assert!(lines[1].starts_with(&format!("{:<20}{:<40}", "VOL_ID_00001", "vol1")));
}

#[test]
fn given_pools_when_rendering_human_table_then_sizes_scaled() {
    let pools = vec![Pool {
        id: "POOL_ID_00001".into(),
        name: "Pool 1".into(),
        total_space: 2 * TIB,
        free_space: TIB,
    }];
    let renderer = Renderer::new(None, true);

    let lines = renderer.pools(&pools);

    assert_eq!(
        lines[1],
        format!(
            "{:<40}{:<32}{:<32}{:<32}",
            "POOL_ID_00001", "Pool 1", "2.00 TiB", "1.00 TiB"
        )
    );
}

#[test]
fn given_initiators_and_file_systems_when_terse_then_fields_joined() {
    let renderer = Renderer::new(Some(":".into()), false);
    let initiators = vec![Initiator {
        id: "50:06:01:60".into(),
        name: "host".into(),
        kind: InitiatorType::PortWwn,
    }];
    let file_systems = vec![FileSystem {
        id: "FS_ID_00001".into(),
        name: "fs1".into(),
        total_space: 100,
        free_space: 40,
        pool_id: "POOL_ID_00002".into(),
    }];

    assert_eq!(renderer.initiators(&initiators), vec!["50:06:01:60:host:WWPN"]);
    assert_eq!(
        renderer.file_systems(&file_systems),
        vec!["FS_ID_00001:fs1:100:40:POOL_ID_00002"]
    );
}

#[rstest]
fn given_export_when_terse_then_key_value_lines_with_joined_hosts(export: NfsExport) {
    let renderer = Renderer::new(Some(";".into()), false);

    let lines = renderer.exports(&[export]);

    assert_eq!(
        lines,
        vec![
            "id;EXP_ID_00001",
            "export;/exports/fs1",
            "fs_id;FS_ID_00001",
            "root;None",
            "ro;None",
            "rw;host1;host2",
            "anonuid;65534",
            "anongid;None",
            "options;None",
        ]
    );
}

#[rstest]
fn given_export_when_table_then_tabbed_lines_and_blank_separator(export: NfsExport) {
    let renderer = Renderer::new(None, false);

    let lines = renderer.exports(&[export.clone(), export]);

    assert_eq!(lines.len(), 20);
    assert_eq!(lines[5], "rw:\t\thost1, host2");
    assert_eq!(lines[6], "anonuid:\t65534");
    assert_eq!(lines[8], "options:\tNone");
    assert_eq!(lines[9], "");
}

#[test]
fn given_done_when_rendering_then_nothing_printed() {
    assert!(Renderer::default().render(&Outcome::Done).is_empty());
}

#[test]
fn given_simulator_when_run_list_pools_then_rendered_and_closed() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sim.json");
    let client = SimulatorClient::open(&state, 0).unwrap();
    let container = ServiceContainer::with_client(Settings::default(), Arc::new(client));
    let command = Command::new(CommandName::List, "POOLS");
    let renderer = Renderer::new(Some(" ".into()), false);

    // Act
    let lines = run(&container, &command, &ArgumentOptions::default(), &renderer).unwrap();

    // Assert: closing persists the array
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("POOL_ID_00001 Pool 1 {} {}", 2 * TIB, 2 * TIB));
    assert!(state.exists());
}
