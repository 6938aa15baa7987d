// streamctl - CLI for HTTP+JSON network audio streamers
// Copyright (C) 2024 The streamctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

mod argument;
mod client;
mod config;
mod dispatch;
mod error;
mod nowplaying;
mod query;
mod registry;
mod resolver;
mod seek;
mod selection;
#[cfg(test)]
mod testing;

use crate::client::HttpTransport;
use crate::config::{Config, Scope};
use crate::dispatch::Dispatcher;
use crate::error::CtlError;
use crate::selection::{LinePrompt, Mode};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "streamctl",
    version,
    about = "Control a network audio streamer over its HTTP+JSON API",
    after_help = "Run `streamctl --commands` for every COMMAND, its aliases and ARG grammar."
)]
struct Cli {
    #[arg(long, value_name = "HOST", help = "Device host, IP or base URL (env STREAMCTL_HOST)")]
    host: Option<String>,

    #[arg(long, value_name = "PORT", help = "Device port (default 15081)")]
    port: Option<u16>,

    #[arg(long, value_name = "SECONDS", help = "Request timeout, 1-5 seconds (default 3)")]
    timeout: Option<u64>,

    #[arg(long, value_name = "N", help = "Retries after a connect failure or timeout, 0-1")]
    retries: Option<u8>,

    #[arg(short, long, help = "List selector items instead of prompting")]
    list: bool,

    #[arg(short, long, help = "Debug logging on stderr (RUST_LOG overrides)")]
    verbose: bool,

    #[arg(long, help = "Persist --host/--port/--timeout/--retries to the config file")]
    save: bool,

    #[arg(
        long,
        value_enum,
        default_value_t = ScopeArg::User,
        help = "Where --save writes (local project dir or user config dir)"
    )]
    scope: ScopeArg,

    #[arg(long, help = "Print every command with its aliases and argument grammar")]
    commands: bool,

    #[arg(long, value_enum, value_name = "SHELL", help = "Print a shell completion script")]
    completions: Option<CompletionShell>,

    #[arg(value_name = "COMMAND", help = "Command or alias, e.g. volume, next, input")]
    command: Option<String>,

    #[arg(
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Value, `?` to query, +N/-N for relative changes, or a menu index"
    )]
    arg: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            host: self.host.clone(),
            port: self.port,
            timeout_secs: self.timeout,
            retries: self.retries,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("streamctl: {err:#}");
            let code = err
                .downcast_ref::<CtlError>()
                .map(CtlError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(());
    }

    if cli.commands {
        dispatch::write_commands(&mut io::stdout()).context("writing command table")?;
        return Ok(());
    }

    let cwd = std::env::current_dir().context("reading current directory")?;

    if cli.save {
        let scope = cli.scope.into();
        let existing = config::load_scope(scope, &cwd)?;
        let updated = config::merge(existing, cli.overrides());
        let path = config::save(scope, &updated, &cwd)?;
        println!("Saved device settings to {}", path.display());
        if cli.command.is_none() {
            return Ok(());
        }
    }

    let Some(option) = cli.command.as_deref() else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "a COMMAND is required; run `streamctl --commands` to list them",
            )
            .exit();
    };

    let effective = config::resolve(&cwd, cli.overrides())?;
    debug!(base_url = %effective.base_url, timeout = ?effective.timeout, retries = effective.retries, "resolved device");
    let transport = HttpTransport::new(&effective.base_url, effective.timeout, effective.retries)?;

    let mode = if cli.list || !io::stdin().is_terminal() {
        Mode::Listing
    } else {
        Mode::Interactive
    };
    let mut prompt = LinePrompt::stdio();
    let mut dispatcher = Dispatcher::new(&transport, &mut prompt, mode);

    let mut out = io::stdout();
    dispatcher.run(option, cli.arg.as_deref(), &mut out)?;
    out.flush().context("flushing output")?;
    Ok(())
}

fn print_completions(shell: CompletionShell) {
    use clap_complete::{generate, shells};
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin, &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin, &mut io::stdout()),
        CompletionShell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, bin, &mut io::stdout())
        }
    }
}
