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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleetshare",
    version,
    about = "Check and distribute files across a fleet of Windows shares",
    long_about = "fleetshare reads a roster spreadsheet of stores (CodeMag, ipaddress) and, for every row,\nmounts the host's administrative share, then checks for a file or copies files into a directory.\nMounted sessions are reused across rows and operations, and every batch produces an .xlsx report.\nCredentials can be given per invocation or fall back to the identity in the configuration file.",
    after_help = "EXAMPLES:\n  Check a file on every store:   fleetshare check -r stores.xlsx -f report.txt -d 'data\\in'\n  Push files to every store:     fleetshare -u CORP\\\\ops -P transfer -r stores.xlsx -d 'data\\in' \"out/*.csv\"\n  Probe one host:                fleetshare test-connection 10.0.0.5\n  Probe a whole roster:          fleetshare -u CORP\\\\ops -P test-bulk -r stores.xlsx\n  Interactive console:           fleetshare shell"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        long,
        global = true,
        help = "Configuration file path\nConfig loading priority:\n  1. This flag's value (must exist)\n  2. Current directory (./fleetshare.yaml)\n  3. User config (~/.config/fleetshare/config.yaml)\n  4. Built-in defaults"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'p',
        long,
        global = true,
        help = "Maximum number of hosts processed at once [default: from config, else 1]"
    )]
    pub parallel: Option<usize>,

    #[arg(
        long,
        global = true,
        help = "Seconds to wait for a share to mount before giving up [default: 10]"
    )]
    pub connect_timeout: Option<u64>,

    #[arg(
        short = 'u',
        long,
        global = true,
        help = "Username for mounting shares, e.g. 'DOMAIN\\user'\nWithout a username the fallback identity from the config file is used"
    )]
    pub user: Option<String>,

    #[arg(
        short = 'P',
        long = "password",
        global = true,
        help = "Prompt for the password of --user\nWhen not prompted, FLEETSHARE_PASSWORD is read from the environment"
    )]
    pub password: bool,

    #[arg(
        long,
        global = true,
        help = "Never fall back to the configured identity"
    )]
    pub no_fallback: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Check that a file exists on every host in a roster",
        long_about = "Mounts each roster host and looks for <dir>\\<file> on its share.\nRows are reported as Yes/No with size and last-modified time when found.\nA report_<timestamp>.xlsx is written to the reports directory.\n\nExit codes: 0 (found everywhere), 1 (missing or unreachable on any host)",
        after_help = "Examples:\n  fleetshare check -r stores.xlsx -f report.txt -d 'data\\in'\n  fleetshare -p 8 check -r stores.xlsx -f app.cfg -d 'c$\\app' --disconnect"
    )]
    Check {
        #[arg(
            short = 'r',
            long,
            help = "Roster spreadsheet (.xlsx/.xls), as a path or a name in the data directory"
        )]
        roster: PathBuf,

        #[arg(short = 'f', long, help = "File name to look for")]
        file: String,

        #[arg(
            short = 'd',
            long,
            help = "Directory on each share, e.g. 'data\\in'"
        )]
        dir: String,

        #[arg(long, help = "Disconnect all sessions when the batch finishes")]
        disconnect: bool,
    },

    #[command(
        about = "Copy files into a directory on every host in a roster",
        long_about = "Mounts each roster host and copies every source file into <dir> on its share.\nMissing destination directories are created; modification times are preserved.\nSources may be glob patterns; a source that cannot be read fails only its own rows.\nA transfer_report_<timestamp>.xlsx is written to the reports directory.\n\nExit codes: 0 (all copies succeeded), 1 (any failures)",
        after_help = "Examples:\n  fleetshare transfer -r stores.xlsx -d 'data\\in' prices.csv\n  fleetshare transfer -r stores.xlsx -d 'data\\in' \"out/*.csv\" menu.json"
    )]
    Transfer {
        #[arg(
            short = 'r',
            long,
            help = "Roster spreadsheet (.xlsx/.xls), as a path or a name in the data directory"
        )]
        roster: PathBuf,

        #[arg(
            short = 'd',
            long,
            help = "Destination directory on each share, e.g. 'data\\in'"
        )]
        dir: String,

        #[arg(
            required = true,
            help = "Local files or glob patterns (quote patterns to prevent shell expansion)"
        )]
        files: Vec<PathBuf>,

        #[arg(long, help = "Disconnect all sessions when the batch finishes")]
        disconnect: bool,
    },

    #[command(
        about = "Test connectivity to a single host",
        long_about = "Mounts one host's share and reports whether it succeeded.\nUses --user when given, otherwise the fallback identity from configuration.\nAn existing session for the same host and user is reported as 'Already connected'."
    )]
    TestConnection {
        #[arg(help = "Host address, with or without the leading \\\\")]
        address: String,
    },

    #[command(
        about = "Test connectivity to every address in a roster",
        long_about = "Mounts each unique address in the roster's IP address column with the given identity.\nThe address column is detected by name (ipaddress, IP Address, ip, Adresse IP...).\nRequires --user and a password; the fallback identity is never used.\nA connection_report_<timestamp>.xlsx is written to the reports directory.\n\nExit codes: 0 (all reachable), 1 (any unreachable)"
    )]
    TestBulk {
        #[arg(
            short = 'r',
            long,
            help = "Roster spreadsheet (.xlsx/.xls), as a path or a name in the data directory"
        )]
        roster: PathBuf,

        #[arg(long, help = "Disconnect all sessions when the batch finishes")]
        disconnect: bool,
    },

    #[command(
        about = "List roster spreadsheets in the data directory",
        long_about = "Lists .xlsx and .xls files in the configured data directory.\nOffice lock files (~$...) are skipped."
    )]
    Rosters,

    #[command(
        about = "List or locate generated reports",
        long_about = "Without a name, lists reports in the reports directory, newest first.\nWith a name, looks the report up and prints its path; --output copies it elsewhere.\nNames containing path separators are rejected."
    )]
    Report {
        #[arg(help = "Report file name, e.g. report_20240101_100000.xlsx")]
        name: Option<String>,

        #[arg(short = 'o', long, help = "Copy the report to this path")]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Start an interactive console",
        long_about = "Opens a console where every subcommand can be run repeatedly against one session table,\nso hosts mounted by one batch stay mounted for the next.\n\nConsole-only commands:\n  sessions        - List active sessions\n  disconnect-all  - Tear down every session\n  help            - Show available commands\n  exit, quit      - Leave the console (sessions are disconnected)"
    )]
    Shell,
}

impl Cli {
    /// Whether the selected subcommand runs a batch over many hosts.
    pub fn is_batch(&self) -> bool {
        matches!(
            self.command,
            Some(Commands::Check { .. })
                | Some(Commands::Transfer { .. })
                | Some(Commands::TestBulk { .. })
        )
    }
}
