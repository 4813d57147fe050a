// Copyright 2025 eraflo
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

// Inspect asset containers and extract textures.
// Run with: relic <command> <file>

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use relic_sdk::Decoder;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "relic", version, about = "Decode asset containers and extract textures")]
struct Cli {
    /// Configuration file (defaults to `Relic.toml` when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the container layout, classes and object counts.
    Info {
        /// Container file.
        file: PathBuf,
    },
    /// Print decoded objects as JSON.
    Dump {
        /// Container file.
        file: PathBuf,
        /// Only dump the object with this path id.
        #[arg(long)]
        path_id: Option<i64>,
        /// Cut byte buffers to this many bytes.
        #[arg(long, default_value_t = 64)]
        max_bytes: usize,
    },
    /// Write the first convertible texture as an image (format from the extension).
    Extract {
        /// Container file.
        file: PathBuf,
        /// Output image, e.g. `out.png`.
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = config::load_config(cli.config.as_deref())?;
    let decoder = Decoder::new(config.limits);

    match cli.command {
        Command::Info { file } => {
            let bytes = read_input(&file)?;
            print!("{}", commands::info(&decoder, &bytes)?);
        }
        Command::Dump {
            file,
            path_id,
            max_bytes,
        } => {
            let bytes = read_input(&file)?;
            println!("{}", commands::dump(&decoder, &bytes, path_id, max_bytes)?);
        }
        Command::Extract { file, output } => {
            let bytes = read_input(&file)?;
            let texture = commands::extract(&decoder, &bytes)?;
            let format = commands::write_texture(&texture, &output)?;
            log::info!(
                "Wrote texture {:?} ({}x{} {}) to '{}' as {format:?}",
                texture.name,
                texture.image.width(),
                texture.image.height(),
                texture.format,
                output.display()
            );
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read container at '{}'", path.display()))
}
