// lib.rs
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

//! Fetch podcast feeds, download the episodes that are not yet on disk and
//! backfill missing audio tags.
//!
//! The only persistent state is the download directory itself: one folder
//! per show, plus a nested marker directory whose files record which
//! episodes were already fetched.

#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;

pub mod downloader;
pub mod errors;
mod feed;
pub mod pipeline;
pub mod resolver;
pub mod tagger;
pub mod utils;

pub use crate::feed::{Enclosure, EnclosureBuilder, Episode, EpisodeBuilder, Feed, FeedBuilder};
pub use crate::resolver::ResolvedEpisode;

// Some feed hosts reject requests that carry a stock client UA.
/// The user-agent to be used for all the requests.
pub const USER_AGENT: &str = concat!("podcatch/", env!("CARGO_PKG_VERSION"));
