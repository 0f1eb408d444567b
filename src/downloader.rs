// downloader.rs
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

//! Fetch remote files and publish them atomically.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_LENGTH;
use reqwest::redirect::Policy;

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::DownloadError;
use crate::utils;

/// Suffix of the in-progress sibling file a transfer writes into before the
/// atomic rename.
const PART_SUFFIX: &str = ".part";

/// Builder for the blocking http client shared across a run.
pub fn client_builder() -> reqwest::blocking::ClientBuilder {
    let policy = Policy::custom(|attempt| {
        debug!("Redirect attempt url: {:?}", attempt.url());
        if attempt.previous().len() > 20 {
            attempt.error("too many redirects")
        } else if Some(attempt.url()) == attempt.previous().last() {
            // avoid redirect loops
            attempt.stop()
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .redirect(policy)
        .referer(false)
        .connect_timeout(Duration::from_secs(30))
        .user_agent(crate::USER_AGENT)
}

/// Download `url` into `target`.
///
/// The body is streamed to a sibling `.part` file and a single `rename`
/// publishes it; `target` is either complete and correct, or absent. On
/// failure the part file may be left behind, `target` is never touched.
pub fn download_into(client: &Client, url: &str, target: &Path) -> Result<(), DownloadError> {
    info!("GET request to: {}", url);
    let resp = client.get(url).send()?;
    info!("Status resp: {}", resp.status());

    if !resp.status().is_success() {
        return Err(DownloadError::UnexpectedResponse(resp.status()));
    }

    let ct_len = resp
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|len| len.parse::<u64>().ok());
    if let Some(len) = ct_len {
        info!("File length: {}", len);
    }

    save_stream(resp, target)?;
    info!("Downloading of {} completed successfully.", target.display());
    Ok(())
}

/// Fetch a show's cover image unless one is already cached.
///
/// The cover lives next to the media files as `cover.<ext>`, with the
/// extension taken from the url path. Returns the path of a freshly
/// downloaded cover, `None` when an existing file was kept.
pub fn cache_cover(
    client: &Client,
    show_dir: &Path,
    url: &str,
) -> Result<Option<PathBuf>, DownloadError> {
    let target = cover_path(show_dir, url);

    // Keep whatever is there, even if the remote image changed.
    if target.exists() {
        debug!("Cover already cached at: {}", target.display());
        return Ok(None);
    }

    download_into(client, url, &target)?;
    Ok(Some(target))
}

fn cover_path(show_dir: &Path, url: &str) -> PathBuf {
    match utils::url_extension(url) {
        Some(ext) => show_dir.join(format!("cover.{}", ext)),
        None => show_dir.join("cover"),
    }
}

/// Write a stream to the part file, then rename into place.
///
/// The part file is a sibling of the target on purpose; rename can't move
/// across filesystems.
fn save_stream<R: Read>(mut reader: R, target: &Path) -> Result<(), DownloadError> {
    let part = part_path(target);
    info!("Downloading into: {}", part.display());

    let mut writer = BufWriter::new(File::create(&part)?);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&part, target)?;
    Ok(())
}

fn part_path(target: &Path) -> PathBuf {
    let mut path = target.as_os_str().to_owned();
    path.push(PART_SUFFIX);
    PathBuf::from(path)
}
