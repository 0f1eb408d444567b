// main.rs
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
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::path::PathBuf;

use podcatch::downloader::client_builder;
use podcatch::pipeline;
use podcatch::utils::read_feed_urls;

#[derive(Parser, Debug)]
#[command(name = "podcatch", about = "Download new podcast episodes", version)]
struct Opt {
    /// File with one feed url per line; `#` starts a comment.
    url_file: PathBuf,
    /// Directory the shows are downloaded under.
    out_dir: PathBuf,
    /// Log level: error, warn, info, debug or trace.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    let _logger = flexi_logger::Logger::try_with_str(&opt.log_level)
        .context("invalid log level")?
        .start()
        .context("failed to initialize logging")?;

    // An unreadable url file is the one fatal startup error; everything
    // after this point is logged and survived.
    let urls = read_feed_urls(&opt.url_file)
        .with_context(|| format!("failed to read the url file {}", opt.url_file.display()))?;

    let client = client_builder()
        .build()
        .context("failed to construct the http client")?;

    let summary = pipeline::run(&client, &urls, &opt.out_dir);
    info!("{}", summary);

    Ok(())
}
