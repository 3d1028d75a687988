// Copyright 2025 Fernando Borretti
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

use clap::Parser;

use crate::cmd::check::check_collection;
use crate::cmd::drill::DrillArgs;
use crate::cmd::drill::drill;
use crate::cmd::export::export_collection;
use crate::cmd::import::import_sets;
use crate::cmd::remove::remove_set;
use crate::cmd::reset::reset_set;
use crate::cmd::sets::list_sets;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_set_stats;
use crate::error::Fallible;
use crate::session::filter::Filter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Check that the set files in a collection parse.
    Check {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Load the collection's set files into its database.
    Import {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Also delete sets whose files are gone, with their history.
        #[arg(long)]
        replace: bool,
    },
    /// List imported sets.
    Sets {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Drill a set in the browser.
    Drill {
        /// Id or name of the set.
        set: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Which cards to drill.
        #[arg(long, default_value_t = Filter::All)]
        filter: Filter,
        /// Study without recording anything.
        #[arg(long)]
        free: bool,
        /// The port to use for the web server. Overrides the configuration file.
        #[arg(long)]
        port: Option<u16>,
        /// Don't open the browser automatically.
        #[arg(long)]
        no_open: bool,
    },
    /// Print a set's mastery, session history, and weakest cards.
    Stats {
        /// Id or name of the set.
        set: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Forget a set's reviews and sessions. This cannot be undone.
    Reset {
        /// Id or name of the set.
        set: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Delete a set and its history from the database.
    Remove {
        /// Id or name of the set.
        set: String,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Export the database as JSON.
    Export {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Check { directory } => check_collection(directory),
        Command::Import { directory, replace } => import_sets(directory, replace).await,
        Command::Sets { directory } => list_sets(directory).await,
        Command::Drill {
            set,
            directory,
            filter,
            free,
            port,
            no_open,
        } => {
            drill(DrillArgs {
                directory,
                set,
                filter,
                free,
                port,
                no_open,
            })
            .await
        }
        Command::Stats {
            set,
            directory,
            format,
        } => print_set_stats(directory, set, format).await,
        Command::Reset { set, directory } => reset_set(directory, set).await,
        Command::Remove { set, directory } => remove_set(directory, set).await,
        Command::Export { directory } => export_collection(directory).await,
    }
}
