// resolver.rs
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

//! Decide where an episode goes on disk and whether it still needs to be
//! fetched.

use crate::errors::DataError;
use crate::feed::Episode;
use crate::utils::{sanitize_name, url_extension};

use std::path::{Path, PathBuf};

/// Everything needed to download one episode: the final media path, the
/// idempotency marker path and the enclosure url.
///
/// Given the same show title and episode metadata the resolved paths are
/// always the same; there is no randomness and no counter-based
/// disambiguation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEpisode {
    target: PathBuf,
    marker: PathBuf,
    url: String,
    file_name: String,
}

impl ResolvedEpisode {
    /// The path the finished download is published at.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The marker file whose existence records a completed download.
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// The enclosure url to fetch.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The bare target file name; also written as the marker content for
    /// debuggability.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the episode still needs to be fetched.
    ///
    /// This only consults the filesystem, never the network, so callers can
    /// bail out early before opening a connection.
    pub fn should_download(&self) -> bool {
        !self.target.exists() && !self.marker.exists()
    }
}

/// Compute the target and marker paths for an episode of `show_title`.
///
/// Fails with [`DataError::NoEnclosureUrl`] when no enclosure entry carries
/// a url; the caller treats that as a per-episode skip, not a feed failure.
pub fn resolve(
    show_title: &str,
    episode: &Episode,
    show_dir: &Path,
    marker_dir: &Path,
) -> Result<ResolvedEpisode, DataError> {
    // First enclosure that actually has a url; entries without one are
    // ignored.
    let (url, mime_type) = episode
        .enclosures()
        .iter()
        .find_map(|enc| enc.url().map(|url| (url.to_owned(), enc.mime_type())))
        .ok_or_else(|| DataError::NoEnclosureUrl {
            title: episode.title().unwrap_or("<untitled>").to_owned(),
        })?;

    let extension = url_extension(&url).or_else(|| {
        // The enclosure declared mpeg audio but the url hides the file name.
        if mime_type == Some("audio/mpeg") {
            Some("mp3".to_owned())
        } else {
            None
        }
    });

    let mut name = sanitize_name(show_title);
    if let Some(date) = episode.published() {
        name = format!("{}-{}", name, date.format("%Y%m%d-%H%M%S"));
    }
    if let Some(title) = episode.title() {
        name = format!("{}-{}", name, title);
    }
    let mut name = name.trim_end_matches('-').to_owned();
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(&ext);
    }
    let file_name = sanitize_name(&name);

    // The guid is the preferred marker identity. Without one, the target
    // file name stands in and title collisions become possible.
    let marker_name = match episode.guid().filter(|guid| !guid.is_empty()) {
        Some(guid) => marker_file_name(guid),
        None => file_name.clone(),
    };

    Ok(ResolvedEpisode {
        target: show_dir.join(&file_name),
        marker: marker_dir.join(marker_name),
        url,
        file_name,
    })
}

/// Substitute the characters of a guid that are unsafe in file names.
fn marker_file_name(guid: &str) -> String {
    guid.chars()
        .map(|c| match c {
            '/' => '~',
            ' ' | '\t' => '_',
            '\n' => '+',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{EnclosureBuilder, EpisodeBuilder};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use std::fs;

    fn science_hour_episode() -> Episode {
        let enclosure = EnclosureBuilder::default()
            .url("https://cdn.example.com/eps/ep1.mp3?src=rss".to_owned())
            .mime_type("audio/mpeg".to_owned())
            .build()
            .unwrap();

        EpisodeBuilder::default()
            .title("Episode 1: A Start!".to_owned())
            .guid("abc/def gh".to_owned())
            .published(Utc.with_ymd_and_hms(2021, 3, 4, 10, 0, 0).unwrap())
            .enclosures(vec![enclosure])
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_builds_the_expected_target_name() {
        let episode = science_hour_episode();
        let resolved = resolve(
            "The Science Hour",
            &episode,
            Path::new("/downloads/show"),
            Path::new("/downloads/show/.db"),
        )
        .unwrap();

        assert_eq!(
            resolved.file_name(),
            "The_Science_Hour-20210304-100000-Episode_1_A_Start.mp3"
        );
        assert_eq!(
            resolved.target(),
            Path::new("/downloads/show/The_Science_Hour-20210304-100000-Episode_1_A_Start.mp3")
        );
        assert_eq!(resolved.url(), "https://cdn.example.com/eps/ep1.mp3?src=rss");
    }

    #[test]
    fn resolve_is_deterministic() {
        let episode = science_hour_episode();
        let show_dir = Path::new("/downloads/show");
        let marker_dir = Path::new("/downloads/show/.db");

        let first = resolve("The Science Hour", &episode, show_dir, marker_dir).unwrap();
        let second = resolve("The Science Hour", &episode, show_dir, marker_dir).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn guid_characters_are_substituted_in_the_marker_name() {
        let episode = science_hour_episode();
        let resolved = resolve(
            "The Science Hour",
            &episode,
            Path::new("/downloads/show"),
            Path::new("/downloads/show/.db"),
        )
        .unwrap();

        assert_eq!(resolved.marker(), Path::new("/downloads/show/.db/abc~def_gh"));
        assert_eq!(marker_file_name("a\tb\nc"), "a_b+c");
    }

    #[test]
    fn marker_falls_back_to_the_file_name_without_a_guid() {
        let enclosure = EnclosureBuilder::default()
            .url("https://cdn.example.com/plain.mp3".to_owned())
            .build()
            .unwrap();
        let episode = EpisodeBuilder::default()
            .title("Plain".to_owned())
            .enclosures(vec![enclosure])
            .build()
            .unwrap();

        let resolved = resolve(
            "Show",
            &episode,
            Path::new("/downloads/show"),
            Path::new("/downloads/show/.db"),
        )
        .unwrap();

        assert_eq!(resolved.file_name(), "Show-Plain.mp3");
        assert_eq!(resolved.marker(), Path::new("/downloads/show/.db/Show-Plain.mp3"));
    }

    #[test]
    fn mp3_extension_defaults_from_the_mime_type() {
        let enclosure = EnclosureBuilder::default()
            .url("https://cdn.example.com/episodes/42".to_owned())
            .mime_type("audio/mpeg".to_owned())
            .build()
            .unwrap();
        let episode = EpisodeBuilder::default()
            .title("NoExt".to_owned())
            .enclosures(vec![enclosure])
            .build()
            .unwrap();

        let resolved = resolve(
            "Show",
            &episode,
            Path::new("/d/s"),
            Path::new("/d/s/.db"),
        )
        .unwrap();
        assert_eq!(resolved.file_name(), "Show-NoExt.mp3");
    }

    #[test]
    fn unknown_mime_types_get_no_extension() {
        let enclosure = EnclosureBuilder::default()
            .url("https://cdn.example.com/episodes/42".to_owned())
            .mime_type("audio/ogg".to_owned())
            .build()
            .unwrap();
        let episode = EpisodeBuilder::default()
            .title("NoExt".to_owned())
            .enclosures(vec![enclosure])
            .build()
            .unwrap();

        let resolved = resolve(
            "Show",
            &episode,
            Path::new("/d/s"),
            Path::new("/d/s/.db"),
        )
        .unwrap();
        assert_eq!(resolved.file_name(), "Show-NoExt");
    }

    #[test]
    fn episodes_without_any_usable_enclosure_are_rejected() {
        let empty_url = EnclosureBuilder::default().build().unwrap();
        let episode = EpisodeBuilder::default()
            .title("Teaser".to_owned())
            .enclosures(vec![empty_url])
            .build()
            .unwrap();

        let err = resolve(
            "Show",
            &episode,
            Path::new("/d/s"),
            Path::new("/d/s/.db"),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::NoEnclosureUrl { .. }));
    }

    #[test]
    fn existing_target_or_marker_suppresses_the_download() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let show_dir = tmp.path().join("show");
        let marker_dir = show_dir.join(".db");
        fs::create_dir_all(&marker_dir)?;

        let episode = science_hour_episode();
        let resolved = resolve("The Science Hour", &episode, &show_dir, &marker_dir)?;
        assert!(resolved.should_download());

        // A present target is enough.
        fs::write(resolved.target(), b"audio")?;
        assert!(!resolved.should_download());
        fs::remove_file(resolved.target())?;

        // So is a present marker, even with the target gone.
        fs::write(resolved.marker(), b"")?;
        assert!(!resolved.should_download());
        Ok(())
    }
}
