// feed.rs
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

//! Feed and episode data parsed out of an `rss::Channel`.
//!
//! Everything here is ephemeral; it is constructed per run from the parse
//! result and discarded once the feed has been processed.

use chrono::{DateTime, Utc};
use rfc822_sanitizer::parse_from_rfc2822_with_fallback as parse_rfc822;

/// A feed-declared attachment for an episode, typically the audio file.
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub struct Enclosure {
    url: Option<String>,
    mime_type: Option<String>,
    file_size: Option<u64>,
}

impl Enclosure {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    fn from_rss(enc: &rss::Enclosure) -> Enclosure {
        let url = Some(enc.url().trim())
            .filter(|url| !url.is_empty())
            .map(str::to_owned);
        let mime_type = Some(enc.mime_type().trim())
            .filter(|mime| !mime.is_empty())
            .map(str::to_owned);
        let file_size = enc.length().trim().parse().ok();

        Enclosure {
            url,
            mime_type,
            file_size,
        }
    }
}

/// A single feed item. All fields are optional; the resolver decides what
/// can still be done with the ones that are present.
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub struct Episode {
    title: Option<String>,
    subtitle: Option<String>,
    description: Option<String>,
    guid: Option<String>,
    published: Option<DateTime<Utc>>,
    enclosures: Vec<Enclosure>,
}

impl Episode {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    pub fn published(&self) -> Option<&DateTime<Utc>> {
        self.published.as_ref()
    }

    pub fn enclosures(&self) -> &[Enclosure] {
        &self.enclosures
    }

    /// Parses an `rss::Item` into an `Episode` struct.
    fn from_rss(item: &rss::Item) -> Episode {
        let title = item.title().map(|s| s.trim().to_owned());
        let subtitle = item
            .itunes_ext()
            .and_then(|ext| ext.subtitle())
            .map(|s| s.trim().to_owned());
        let description = item.description().map(|s| s.trim().to_owned());
        let guid = item
            .guid()
            .map(|g| g.value().trim())
            .filter(|g| !g.is_empty())
            .map(str::to_owned);

        // Treat date information from feeds as invalid by default and let
        // the rfc822 sanitizer clean up the common abominations.
        let published = item
            .pub_date()
            .and_then(|date| parse_rfc822(date).ok())
            .map(|date| date.with_timezone(&Utc));

        let enclosures = item.enclosure().map(Enclosure::from_rss).into_iter().collect();

        Episode {
            title,
            subtitle,
            description,
            guid,
            published,
            enclosures,
        }
    }
}

/// A parsed podcast feed: show metadata plus its episodes in feed order.
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub struct Feed {
    title: String,
    cover_url: Option<String>,
    episodes: Vec<Episode>,
}

impl Feed {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover_url.as_deref()
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Parses an `rss::Channel` into a `Feed` struct.
    pub fn parse(chan: &rss::Channel) -> Feed {
        let title = chan.title().trim().to_owned();

        // Prefer the itunes image, fall back to the rss <image> element.
        let cover_url = chan
            .itunes_ext()
            .and_then(|ext| ext.image())
            .map(|s| s.trim().to_owned())
            .or_else(|| chan.image().map(|image| image.url().trim().to_owned()))
            .filter(|url| !url.is_empty());

        let episodes = chan.items().iter().map(Episode::from_rss).collect();

        Feed {
            title,
            cover_url,
            episodes,
        }
    }
}
