// errors.rs
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

use thiserror::Error;

use std::io;

/// Errors raised while fetching, parsing or resolving feed data.
///
/// Each variant is scoped to a single feed or episode so the caller can log
/// it and move on to the next independent unit of work.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Request to {url} failed: {source}")]
    FeedFetch {
        url: String,
        source: reqwest::Error,
    },
    #[error("Failed to parse the feed from {url}: {source}")]
    FeedParse { url: String, source: rss::Error },
    #[error("The feed at {url} carries no title")]
    MissingTitle { url: String },
    #[error("Episode {title:?} has no enclosure with a url")]
    NoEnclosureUrl { title: String },
    #[error("Io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while transferring a single remote file.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Reqwest error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Io error: {0}")]
    Io(#[from] io::Error),
    #[error("Unexpected server response: {0}")]
    UnexpectedResponse(reqwest::StatusCode),
}

/// Errors raised while reading or writing audio metadata tags.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Tagging error: {0}")]
    Lofty(#[from] lofty::error::LoftyError),
    #[error("Io error: {0}")]
    Io(#[from] io::Error),
}
