mod cli;
mod commands;
mod errors;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands, EditorCommands};
use commands::{distribution, editor, generate, version};
use errors::InstallError;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let config = cli.config;
    let result = match cli.command {
        Commands::Editor { action } => match action {
            EditorCommands::Install { verify, no_sudo } => editor::install(config, verify, no_sudo),
            EditorCommands::Remove { yes, no_sudo } => editor::remove(config, yes, no_sudo),
            EditorCommands::Refresh {
                yes,
                verify,
                no_sudo,
            } => editor::refresh(config, yes, verify, no_sudo),
        },
        Commands::Distribution {
            flavor,
            install_dir,
            version,
            python,
        } => distribution::run(config, flavor, install_dir, version, python),
        Commands::Generate { force } => generate::run(config, force),
        Commands::Version => version::run(),
    };

    if let Err(err) = result {
        log_error!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

/// Installer failures carry their own status; anything else exits with 1.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<InstallError>()
        .map(InstallError::exit_code)
        .unwrap_or(1)
}
