// Savefile directory handling
// One-time migration away from uid-prefixed names, and the read-only listing used by -l

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

use crate::vg_error::BootstrapError;

/// First line of a savefile that carries a description
pub const SAVE_MAGIC: &str = "VAULTGATE SAVE";

/// Longest description kept from a savefile header
pub const MAX_DESCRIPTION: usize = 80;

/// Column width of the name in the listing
const NAME_COLUMN: usize = 15;

/// Names of the plain files in a directory, in listing order.
/// Subdirectories and names that are not valid UTF-8 are skipped.
fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

/// Rename `<prefix><name>` savefiles to `<name>`.
///
/// A missing or unreadable directory is a no-op. Entries equal to the bare
/// prefix are skipped, as are renames that would replace an existing file.
/// Returns how many files were moved; a second run moves nothing.
pub fn migrate_legacy_names(save_dir: &Path, legacy_prefix: &str) -> usize {
    let names = match file_names(save_dir) {
        Ok(names) => names,
        Err(e) => {
            log::debug!("no savefile migration in {}: {}", save_dir.display(), e);
            return 0;
        }
    };

    let mut moved = 0;
    for name in names {
        let Some(new_name) = name.strip_prefix(legacy_prefix) else {
            continue;
        };
        if new_name.is_empty() {
            log::info!("not renaming '{}': the new name would be empty", name);
            continue;
        }

        let old_path = save_dir.join(&name);
        let new_path = save_dir.join(new_name);
        if new_path.exists() {
            log::warn!(
                "not moving {}: {} already exists",
                old_path.display(),
                new_path.display()
            );
            continue;
        }

        log::info!("Moving {} to {}", old_path.display(), new_path.display());
        match fs::rename(&old_path, &new_path) {
            Ok(()) => moved += 1,
            Err(e) => log::warn!("could not move {}: {}", old_path.display(), e),
        }
    }
    moved
}

/// A savefile as shown to the user
#[derive(Debug, Clone)]
pub struct SaveFileEntry {
    pub name: String,
    pub description: Option<String>,
    pub modified: Option<DateTime<Local>>,
}

/// Lazy walk over a savefile directory; each call to `list_saves` reopens it
pub struct SaveList {
    dir: PathBuf,
    entries: fs::ReadDir,
    prefix: Option<String>,
}

impl Iterator for SaveList {
    type Item = SaveFileEntry;

    fn next(&mut self) -> Option<SaveFileEntry> {
        for entry in self.entries.by_ref() {
            let Ok(entry) = entry else { continue };
            let Ok(meta) = entry.metadata() else { continue };
            if meta.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(prefix) = &self.prefix {
                if !name.starts_with(prefix.as_str()) {
                    continue;
                }
            }

            return Some(SaveFileEntry {
                description: savefile_description(&self.dir.join(&name)),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
                name,
            });
        }
        None
    }
}

/// Open the savefile directory for listing.
/// With `owner_prefix` set only names starting with it are yielded.
pub fn list_saves(save_dir: &Path, owner_prefix: Option<&str>) -> Result<SaveList, BootstrapError> {
    let entries = fs::read_dir(save_dir).map_err(|source| BootstrapError::SaveDirUnreadable {
        path: save_dir.to_path_buf(),
        source,
    })?;
    Ok(SaveList {
        dir: save_dir.to_path_buf(),
        entries,
        prefix: owner_prefix.map(str::to_string),
    })
}

/// Description from a savefile header: `SAVE_MAGIC` on the first line, the description on the second
pub fn savefile_description(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file.take(1024));

    let mut magic = String::new();
    reader.read_line(&mut magic).ok()?;
    if magic.trim_end_matches(['\r', '\n']) != SAVE_MAGIC {
        return None;
    }

    let mut desc = String::new();
    reader.read_line(&mut desc).ok()?;
    let desc = desc.trim();
    if desc.is_empty() {
        None
    } else {
        Some(desc.chars().take(MAX_DESCRIPTION).collect())
    }
}

/// Print the listing the way `-l` shows it
pub fn print_saves(saves: SaveList, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Savefiles you can use are:")?;
    for save in saves {
        let pad = " ".repeat(NAME_COLUMN.saturating_sub(save.name.width()));
        let detail = match (&save.description, &save.modified) {
            (Some(desc), _) => desc.clone(),
            (None, Some(when)) => when.format("last played %Y-%m-%d %H:%M").to_string(),
            (None, None) => String::new(),
        };
        writeln!(out, " {}{}  {}", save.name, pad, detail.trim_end())?;
    }
    writeln!(out)?;
    writeln!(out, "Use vaultgate -u<name> to use savefile <name>.")
}
