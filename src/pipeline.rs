// pipeline.rs
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

//! Process feeds end to end.
//!
//! Source url -> GET request -> parse `rss::Channel` -> `Feed` -> resolve
//! each episode -> fetch new enclosures -> write markers -> backfill tags.
//!
//! Feeds run one at a time, episodes in feed order. A failure only ever
//! takes down its own unit of work; the driver collects the outcomes and
//! reports a summary at the end of the run.

use reqwest::blocking::Client;

use std::fmt;
use std::fs::{self, DirBuilder};
use std::io;
use std::path::{Path, PathBuf};

use crate::downloader;
use crate::errors::{DataError, DownloadError};
use crate::feed::{Episode, Feed};
use crate::resolver::{self, ResolvedEpisode};
use crate::tagger;
use crate::utils::sanitize_name;

/// Name of the per-show directory that holds the download markers.
pub const MARKER_DIR: &str = ".db";

/// What happened to a single episode.
#[derive(Debug)]
pub enum EpisodeOutcome {
    /// Freshly fetched, published at the given path and recorded.
    Downloaded(PathBuf),
    /// Target or marker already on disk; no network access was made.
    AlreadyDownloaded,
    /// The resolver refused the episode, e.g. no enclosure url.
    Skipped(DataError),
    /// The transfer or the marker write failed; retried on the next run.
    Failed(DownloadError),
}

/// What happened to a single feed.
#[derive(Debug)]
pub struct FeedReport {
    url: String,
    title: String,
    episodes: Vec<EpisodeOutcome>,
}

impl FeedReport {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn episodes(&self) -> &[EpisodeOutcome] {
        &self.episodes
    }
}

/// Aggregated outcome counts for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub feeds_processed: usize,
    pub feeds_failed: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn absorb(&mut self, report: &FeedReport) {
        self.feeds_processed += 1;
        for outcome in report.episodes() {
            match outcome {
                EpisodeOutcome::Downloaded(_) => self.downloaded += 1,
                EpisodeOutcome::AlreadyDownloaded => self.already_present += 1,
                EpisodeOutcome::Skipped(_) => self.skipped += 1,
                EpisodeOutcome::Failed(_) => self.failed += 1,
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} feeds processed ({} failed), {} episodes downloaded, \
             {} already present, {} skipped, {} failed",
            self.feeds_processed,
            self.feeds_failed,
            self.downloaded,
            self.already_present,
            self.skipped,
            self.failed
        )
    }
}

/// Run the whole url list against `out_dir`.
///
/// Never fails; per-feed errors are logged and counted.
pub fn run(client: &Client, urls: &[String], out_dir: &Path) -> RunSummary {
    let mut summary = RunSummary::default();

    for url in urls {
        match process_feed(client, url, out_dir) {
            Ok(report) => {
                summary.absorb(&report);
                info!("Finished feed: {}", report.title());
            }
            Err(err) => {
                error!("Failed to process feed {}: {}", url, err);
                summary.feeds_failed += 1;
            }
        }
    }

    summary
}

/// Fetch, parse and process one feed.
pub fn process_feed(client: &Client, url: &str, out_dir: &Path) -> Result<FeedReport, DataError> {
    let feed = fetch_feed(client, url)?;
    process_parsed_feed(client, url, &feed, out_dir)
}

fn fetch_feed(client: &Client, url: &str) -> Result<Feed, DataError> {
    info!("GET request to: {}", url);
    let resp = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .map_err(|source| DataError::FeedFetch {
            url: url.to_owned(),
            source,
        })?;

    let body = resp.bytes().map_err(|source| DataError::FeedFetch {
        url: url.to_owned(),
        source,
    })?;

    let channel = rss::Channel::read_from(&body[..]).map_err(|source| DataError::FeedParse {
        url: url.to_owned(),
        source,
    })?;

    Ok(Feed::parse(&channel))
}

/// Process an already parsed feed: create the show layout, cache the cover
/// and walk the episodes in feed order.
pub fn process_parsed_feed(
    client: &Client,
    url: &str,
    feed: &Feed,
    out_dir: &Path,
) -> Result<FeedReport, DataError> {
    if feed.title().is_empty() {
        return Err(DataError::MissingTitle {
            url: url.to_owned(),
        });
    }

    let show_dir = out_dir.join(sanitize_name(feed.title()));
    let marker_dir = show_dir.join(MARKER_DIR);
    DirBuilder::new().recursive(true).create(&marker_dir)?;

    // A missing cover is never worth aborting the feed over.
    if let Some(cover_url) = feed.cover_url() {
        if let Err(err) = downloader::cache_cover(client, &show_dir, cover_url) {
            warn!("Failed to fetch the cover of {}: {}", feed.title(), err);
        }
    }

    let episodes = feed
        .episodes()
        .iter()
        .map(|episode| process_episode(client, feed, episode, &show_dir, &marker_dir))
        .collect();

    Ok(FeedReport {
        url: url.to_owned(),
        title: feed.title().to_owned(),
        episodes,
    })
}

fn process_episode(
    client: &Client,
    feed: &Feed,
    episode: &Episode,
    show_dir: &Path,
    marker_dir: &Path,
) -> EpisodeOutcome {
    let resolved = match resolver::resolve(feed.title(), episode, show_dir, marker_dir) {
        Ok(resolved) => resolved,
        Err(err) => {
            warn!("Skipping an episode of {}: {}", feed.title(), err);
            return EpisodeOutcome::Skipped(err);
        }
    };

    if !resolved.should_download() {
        debug!("{} is already present, skipping.", resolved.file_name());
        return EpisodeOutcome::AlreadyDownloaded;
    }

    info!(
        "Downloading {:?} into: {}",
        episode.title(),
        resolved.target().display()
    );
    if let Err(err) = downloader::download_into(client, resolved.url(), resolved.target()) {
        error!("Failed to download {}: {}", resolved.url(), err);
        return EpisodeOutcome::Failed(err);
    }

    // The marker is written after the rename. A crash in the window between
    // the two re-downloads the episode on the next run; it never corrupts
    // the archive.
    if let Err(err) = write_marker(&resolved) {
        error!(
            "Failed to record the marker {}: {}",
            resolved.marker().display(),
            err
        );
        return EpisodeOutcome::Failed(err.into());
    }

    if tagger::is_taggable(resolved.target()) {
        // Tag trouble does not demote a finished download.
        if let Err(err) = tagger::backfill_tags(resolved.target(), feed.title(), episode) {
            warn!(
                "Failed to backfill tags on {}: {}",
                resolved.target().display(),
                err
            );
        }
    }

    EpisodeOutcome::Downloaded(resolved.target().to_owned())
}

/// The marker content is the target file name, for human debuggability.
fn write_marker(resolved: &ResolvedEpisode) -> io::Result<()> {
    fs::write(resolved.marker(), format!("{}\n", resolved.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::client_builder;
    use crate::feed::{EnclosureBuilder, EpisodeBuilder, FeedBuilder};
    use pretty_assertions::assert_eq;

    use std::fs;

    fn client() -> Client {
        client_builder().build().unwrap()
    }

    fn feed_without_enclosure_urls() -> Feed {
        let episode = EpisodeBuilder::default()
            .title("Teaser".to_owned())
            .build()
            .unwrap();

        FeedBuilder::default()
            .title("The Science Hour")
            .episodes(vec![episode])
            .build()
            .unwrap()
    }

    #[test]
    fn a_feed_without_a_title_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let feed = FeedBuilder::default().build().unwrap();

        let err = process_parsed_feed(&client(), "http://example.com/feed", &feed, tmp.path())
            .unwrap_err();
        assert!(matches!(err, DataError::MissingTitle { .. }));
    }

    #[test]
    fn an_episode_without_an_enclosure_writes_no_files() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let feed = feed_without_enclosure_urls();

        let report = process_parsed_feed(&client(), "http://example.com/feed", &feed, tmp.path())?;

        assert_eq!(report.episodes().len(), 1);
        assert!(matches!(
            report.episodes()[0],
            EpisodeOutcome::Skipped(DataError::NoEnclosureUrl { .. })
        ));

        // The show layout exists, but nothing was written into it.
        let show_dir = tmp.path().join("The_Science_Hour");
        let media: Vec<_> = fs::read_dir(&show_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();
        assert!(media.is_empty());
        assert_eq!(fs::read_dir(show_dir.join(MARKER_DIR))?.count(), 0);
        Ok(())
    }

    #[test]
    fn marked_episodes_are_never_fetched_again() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;

        // An unroutable url; any download attempt would show up as Failed.
        let enclosure = EnclosureBuilder::default()
            .url("http://127.0.0.1:1/ep1.mp3".to_owned())
            .build()
            .unwrap();
        let episode = EpisodeBuilder::default()
            .title("Episode 1".to_owned())
            .guid("ep-1".to_owned())
            .enclosures(vec![enclosure])
            .build()
            .unwrap();
        let feed = FeedBuilder::default()
            .title("The Science Hour")
            .episodes(vec![episode])
            .build()
            .unwrap();

        let marker_dir = tmp.path().join("The_Science_Hour").join(MARKER_DIR);
        fs::create_dir_all(&marker_dir)?;
        fs::write(marker_dir.join("ep-1"), "The_Science_Hour-Episode_1.mp3\n")?;

        let report = process_parsed_feed(&client(), "http://example.com/feed", &feed, tmp.path())?;

        assert!(matches!(
            report.episodes()[0],
            EpisodeOutcome::AlreadyDownloaded
        ));
        Ok(())
    }

    #[test]
    fn summaries_add_up_outcomes() {
        let report = FeedReport {
            url: "http://example.com/feed".to_owned(),
            title: "Show".to_owned(),
            episodes: vec![
                EpisodeOutcome::Downloaded(PathBuf::from("/d/s/a.mp3")),
                EpisodeOutcome::AlreadyDownloaded,
                EpisodeOutcome::AlreadyDownloaded,
                EpisodeOutcome::Skipped(DataError::NoEnclosureUrl {
                    title: "Teaser".to_owned(),
                }),
            ],
        };

        let mut summary = RunSummary::default();
        summary.absorb(&report);

        assert_eq!(summary.feeds_processed, 1);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.already_present, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
    }
}
