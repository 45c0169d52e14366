// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::sync::Arc;

use fleetshare::{
    cli::{Cli, Commands},
    commands::{dispatch, shell::run_shell, CallerCredentials},
    config::Config,
    credentials::{password_from_env, prompt_password},
    executor::BatchProgress,
    operations::Fleet,
    utils::{init_logging, is_tty},
};

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(parallel) = cli.parallel {
        config.defaults.parallel = Some(parallel);
    }
    if let Some(timeout) = cli.connect_timeout {
        config.defaults.connect_timeout = Some(timeout);
    }
    if cli.no_fallback {
        config.credentials.use_fallback = false;
    }
}

fn caller_credentials(cli: &Cli) -> Result<CallerCredentials> {
    let user = cli
        .user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    let password = match (&user, cli.password) {
        (Some(user), true) => Some(prompt_password(user)?),
        (Some(_), false) => password_from_env(),
        (None, true) => anyhow::bail!("--password requires --user"),
        (None, false) => None,
    };

    Ok(CallerCredentials::new(user, password))
}

/// First Ctrl-C stops dispatching new rows of the current batch; a second
/// one during the same batch exits.
fn install_interrupt_handler(fleet: Arc<Fleet>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !fleet.cancel_current() {
                eprintln!("\nInterrupted again, exiting");
                std::process::exit(130);
            }
            eprintln!("\nInterrupted: finishing rows in progress (press Ctrl+C again to abort)");
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    init_logging(cli.verbose);

    let mut config = Config::load_with_priority(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    let credentials = caller_credentials(&cli)?;

    let progress = if is_tty() {
        BatchProgress::visible()
    } else {
        BatchProgress::hidden()
    };
    let fleet = Arc::new(Fleet::from_config(&config)?.with_progress(progress));

    tracing::debug!(
        "Using {} mount backend, {} worker(s), connect timeout {:?}, fallback identity {}",
        fleet.sessions().driver_name(),
        config.parallel(),
        config.connect_timeout(),
        if fleet.resolver().fallback_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let failed = match command {
        Commands::Shell => {
            if !is_tty() {
                tracing::warn!("The console expects an interactive terminal");
            }
            install_interrupt_handler(Arc::clone(&fleet));
            run_shell(&fleet, credentials).await?;
            false
        }
        command => {
            if cli.is_batch() {
                install_interrupt_handler(Arc::clone(&fleet));
            }
            dispatch(&fleet, &credentials, command).await?
        }
    };

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
