// tagger.rs
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

//! Backfill missing audio tags from feed metadata.
//!
//! Only empty fields are ever written; whatever the publisher shipped in
//! the file wins over what the feed claims.

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};

use std::borrow::Cow;
use std::path::Path;

use crate::errors::TagError;
use crate::feed::Episode;

/// Extensions the backfiller knows how to tag.
const AUDIO_EXTENSIONS: &[&str] = &["mp3"];

/// Whether `path` points at a file the backfiller can handle.
pub fn is_taggable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Fill the empty tag fields of a downloaded file from the feed metadata.
///
/// Loads the file's primary tag, creating an empty one if the file has
/// none, and persists only when at least one field was written. Returns
/// whether the file was modified.
pub fn backfill_tags(path: &Path, show_title: &str, episode: &Episode) -> Result<bool, TagError> {
    let mut tagged = Probe::open(path)?.read()?;

    if tagged.primary_tag().is_none() {
        let tag_type = tagged.primary_tag_type();
        tagged.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged.primary_tag_mut() else {
        return Ok(false);
    };

    let changed = backfill_into(tag, show_title, episode);
    if changed {
        tagged.save_to_path(path, WriteOptions::default())?;
        info!("Backfilled tags on: {}", path.display());
    }

    Ok(changed)
}

/// The pure part of the backfill: write feed values into blank fields only.
fn backfill_into(tag: &mut Tag, show_title: &str, episode: &Episode) -> bool {
    let mut changed = false;

    if is_blank(tag.album()) {
        tag.set_album(show_title.to_owned());
        changed = true;
    }

    if let Some(title) = episode.title() {
        if is_blank(tag.title()) {
            tag.set_title(title.to_owned());
            changed = true;
        }
    }

    if let Some(date) = episode.published() {
        if is_blank_item(tag, &ItemKey::RecordingDate) {
            tag.insert_text(ItemKey::RecordingDate, date.format("%Y-%m-%d").to_string());
            changed = true;
        }
    }

    if let Some(description) = episode.description() {
        if is_blank_item(tag, &ItemKey::Comment) {
            tag.insert_text(ItemKey::Comment, description.to_owned());
            changed = true;
        }
    }

    if let Some(subtitle) = episode.subtitle() {
        if is_blank_item(tag, &ItemKey::Description) {
            tag.insert_text(ItemKey::Description, subtitle.to_owned());
            changed = true;
        }
    }

    changed
}

// Whitespace-only values count as empty, publishers ship those too.
fn is_blank(value: Option<Cow<'_, str>>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn is_blank_item(tag: &Tag, key: &ItemKey) -> bool {
    tag.get_string(key).map(|v| v.trim().is_empty()).unwrap_or(true)
}
