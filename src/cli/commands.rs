//! Command execution: select, validate, connect, dispatch, render

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, info, instrument};

use crate::cli::args::Cli;
use crate::cli::error::CliResult;
use crate::cli::output::{self, Renderer};
use crate::config::Settings;
use crate::domain::{select_command, validate, ArgumentOptions, Command};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::prompt::prompt_password;

/// Run the invocation described by `cli` and print its output.
pub fn execute(cli: &Cli) -> CliResult<()> {
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let command = select_command(cli.commands.candidates())?;
    let options = ArgumentOptions::from(cli.options.clone());
    validate(&command, &options)?;

    let password = if cli.prompt {
        Some(prompt_password()?)
    } else {
        None
    };
    let settings = Settings::load()?.with_overrides(cli.uri.clone(), password, cli.job_timeout);
    let container = ServiceContainer::new(settings)?;

    let renderer = Renderer::new(cli.sep.clone(), cli.human);
    for line in run(&container, &command, &options, &renderer)? {
        output::info(&line);
    }
    Ok(())
}

/// Dispatch a validated command and render its result.
///
/// The connection is closed whether or not the command succeeded; a failed
/// command takes precedence over a failed close.
#[instrument(skip_all, fields(command = %command.name.as_str()))]
pub fn run(
    container: &ServiceContainer,
    command: &Command,
    options: &ArgumentOptions,
    renderer: &Renderer,
) -> CliResult<Vec<String>> {
    let outcome = container.command_service().dispatch(command, options);
    let closed = container.close();

    let outcome = outcome?;
    closed?;
    debug!(?outcome, "command finished");
    info!("{} done", command.name.as_str());
    Ok(renderer.render(&outcome))
}
