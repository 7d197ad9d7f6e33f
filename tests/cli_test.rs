//! Integration tests for argument parsing and exit codes.

use clap::Parser;
use rstest::rstest;

use lsmcli::application::ApplicationError;
use lsmcli::cli::{Cli, CliError};
use lsmcli::domain::{
    select_command, validate, ArgumentOptions, CommandName, DomainError,
};
use lsmcli::exitcode;
use lsmcli::infrastructure::InfraError;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("lsmcli").chain(args.iter().copied()))
        .expect("arguments parse")
}

#[test]
fn given_create_volume_flags_when_parsed_then_command_and_options_validate() {
    // Arrange
    let cli = parse(&[
        "-u",
        "sim://",
        "--create-volume",
        "vol1",
        "--size",
        "10G",
        "--pool",
        "POOL_ID_00001",
    ]);

    // Act
    let command = select_command(cli.commands.candidates()).expect("one command");
    let options = ArgumentOptions::from(cli.options.clone());

    // Assert
    assert_eq!(command.name, CommandName::CreateVolume);
    assert_eq!(command.value, "vol1");
    assert_eq!(validate(&command, &options), Ok(()));
    assert_eq!(cli.uri.as_deref(), Some("sim://"));
}

#[test]
fn given_short_list_and_terse_when_parsed_then_separator_set() {
    let cli = parse(&["-l", "VOLUMES", "-t", ",", "-H"]);

    let command = select_command(cli.commands.candidates()).unwrap();

    assert_eq!(command.name, CommandName::List);
    assert_eq!(cli.sep.as_deref(), Some(","));
    assert!(cli.human);
}

#[test]
fn given_repeated_host_flags_when_parsed_then_all_collected() {
    let cli = parse(&[
        "--nfs-export-fs",
        "FS_ID_00001",
        "--exportpath",
        "/exports/fs1",
        "--rw",
        "host1",
        "--rw",
        "host2",
        "--root",
        "admin",
    ]);

    let options = ArgumentOptions::from(cli.options);

    assert_eq!(options.rw, vec!["host1", "host2"]);
    assert_eq!(options.root, vec!["admin"]);
}

#[test]
fn given_two_commands_when_selected_then_multiple_commands() {
    let cli = parse(&["--delete-ss", "SS_ID_00001", "--delete-fs", "FS_ID_00001"]);

    let err = select_command(cli.commands.candidates()).unwrap_err();

    assert!(matches!(err, DomainError::MultipleCommands(ref names) if names.len() == 2));
}

#[test]
fn given_type_option_when_parsed_then_maps_to_kind() {
    let cli = parse(&[
        "--create-initiator",
        "host1",
        "--id",
        "iqn.1994-05.com.example:host1",
        "--type",
        "ISCSI",
    ]);

    assert_eq!(cli.options.kind.as_deref(), Some("ISCSI"));
}

#[rstest]
#[case::usage(CliError::from(DomainError::NoCommand), exitcode::USAGE)]
#[case::not_found(
    CliError::from(ApplicationError::ObjectNotFound { kind: "pool", id: "P".into() }),
    exitcode::DATAERR
)]
#[case::job(
    CliError::from(ApplicationError::Job { label: "create-fs".into(), code: 4, message: "full".into() }),
    exitcode::SOFTWARE
)]
#[case::config(
    CliError::from(ApplicationError::Config { message: "no uri".into() }),
    exitcode::CONFIG
)]
#[case::unsupported(
    CliError::from(InfraError::UnsupportedUri { uri: "smis://".into() }),
    exitcode::CONFIG
)]
#[case::connect(
    CliError::from(InfraError::Connect { uri: "sim://".into(), message: "down".into() }),
    exitcode::UNAVAILABLE
)]
fn given_error_when_exit_code_then_sysexits_value(#[case] err: CliError, #[case] code: i32) {
    assert_eq!(err.exit_code(), code);
}
