use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A profile document found in the corpus directory.
#[derive(Debug, Clone)]
pub struct ProfileFile {
    /// Display name derived from the file stem.
    pub name: String,
    pub path: PathBuf,
}

/// List the `*.txt` profile documents directly inside `dir`, sorted by file name.
/// Whitespace-only documents are left out; a document that cannot be read is
/// kept so resolving it reports the read error.
pub fn scan_profiles(dir: &Path) -> Result<Vec<ProfileFile>> {
    if !dir.is_dir() {
        anyhow::bail!("Profile directory not found: {}", dir.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() || !is_profile_file(entry.path()) {
            continue;
        }

        let Some(name) = display_name(entry.path()) else {
            continue;
        };
        if is_blank(entry.path()) {
            tracing::warn!("Skipping blank profile document {}", entry.path().display());
            continue;
        }
        files.push(ProfileFile {
            name,
            path: entry.path().to_path_buf(),
        });
    }

    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_blank(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|text| text.trim().is_empty())
        .unwrap_or(false)
}

fn is_profile_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// `p_vemavaram.txt` -> `p vemavaram`, `P. Vemavaram.txt` -> `P. Vemavaram`.
fn display_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().replace('_', " ");
    let name = stem.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
