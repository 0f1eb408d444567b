// utils.rs
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

//! Helper utilities for accomplishing various tasks.

use deunicode::deunicode;
use url::Url;

use std::fs;
use std::io;
use std::path::Path;

/// Make a string safe to use as a file name.
///
/// Non-ASCII characters are transliterated to a close ASCII approximation,
/// spaces and path separators become underscores, `&` becomes `and` and the
/// characters `` ! * | ' ? : ; \ `` are dropped outright. The result carries
/// no path separators and nothing a shell would trip over.
///
/// The transform is total and idempotent; an empty input yields an empty
/// output.
pub fn sanitize_name(input: &str) -> String {
    let ascii = deunicode(input);
    let mut out = String::with_capacity(ascii.len());

    for c in ascii.chars() {
        match c {
            ' ' | '/' => out.push('_'),
            '&' => out.push_str("and"),
            '!' | '*' | '|' | '\'' | '?' | ':' | ';' | '\\' => (),
            _ => out.push(c),
        }
    }

    out
}

/// The trailing path segment of a url, with any query string removed.
pub fn url_file_name(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_owned(),
        // Not a parseable absolute url, fall back to chopping the string.
        Err(_) => url.split('?').next().unwrap_or(url).trim().to_owned(),
    };

    path.rsplit('/').next().unwrap_or(&path).to_owned()
}

/// The extension (without the dot) of the file a url points at, if it has
/// one.
pub fn url_extension(url: &str) -> Option<String> {
    let name = url_file_name(url);
    Path::new(&name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_owned())
}

/// Read a feed-url list file.
///
/// One url per line; blank lines and lines whose first non-whitespace
/// character is `#` are ignored.
pub fn read_feed_urls(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}
