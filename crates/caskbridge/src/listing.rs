//! # Listing Formatter
//!
//! Renders a filtered listing of the head revision as table-row markup the
//! host can splice into its page. Paths come from user data and may contain
//! anything; every text field is escaped before it touches markup. The only
//! unescaped interpolation is the base64 path token, which is confined to a
//! safe alphabet by construction.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use caskrepo::entry::FileEntry;
use caskrepo::filter::PathFilter;
use caskrepo::repo;
use caskrepo::repo::Repository;

/// Marker prefix carried in a row's download link; the host page intercepts
/// anchors whose href starts with it and hands the token to `read_file`.
pub const DOWNLOAD_PREFIX: &str = "#dl:";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Renders one `<tr>` per entry of the head revision that survives the
/// exclusion list (comma-separated; empty lists everything).
pub async fn render_listing(repo: &dyn Repository, excludes: &str) -> repo::Result<String> {
    let head = repo.head().await?;
    let filter = PathFilter::from_excludes(excludes);
    let entries = repo.list(&head, &filter).await?;

    let mut out = String::new();
    for entry in &entries {
        render_row(&mut out, entry);
    }
    Ok(out)
}

/// Four cells per row: mode, size, name, mtime. Regular files get a
/// human-readable size and a download link; everything else gets an empty
/// size cell and a trailing slash instead of a link.
fn render_row(out: &mut String, entry: &FileEntry) {
    let mode = escape_html(&entry.mode.to_string());
    let size = if entry.mode.is_file() {
        human_size(entry.size)
    } else {
        String::new()
    };
    let name = if entry.mode.is_file() {
        let token = STANDARD.encode(entry.path.as_bytes());
        format!(
            "<a href=\"{}{}\">{}</a>",
            DOWNLOAD_PREFIX,
            token,
            escape_html(&entry.path)
        )
    } else {
        format!("{}/", escape_html(&entry.path))
    };
    let mtime = entry.mtime.format(TIME_FORMAT);

    let _ = writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        mode, size, name, mtime
    );
}

/// Escapes the five markup-sensitive characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Binary-prefixed human size: bytes verbatim, one decimal above that.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
