//! Font lookup for card text.
//!
//! Config files name fonts the way design tools do: `"Helvetica, Bold"` is
//! a family, optionally followed by a comma and a style. Lookup walks font
//! directories for `.ttf`/`.otf` files and matches on the file name:
//!
//! 1. Site font directories (`font_dirs` in config), then platform font
//!    directories. The file whose name best matches family and style wins.
//! 2. Well-known fallback paths (DejaVu, Liberation), bold when the requested
//!    style is bold.
//! 3. Any font file found at all.
//!
//! Parsed fonts are cached per requested family string.

use super::backend::BackendError;
use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, warn};
use walkdir::WalkDir;

const FALLBACK_REGULAR: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const FALLBACK_BOLD: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// A parsed `"Family, Style"` request, normalized for file-name matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontQuery {
    pub family: String,
    pub style: String,
}

impl FontQuery {
    pub fn parse(name: &str) -> Self {
        let (family, style) = name.split_once(',').unwrap_or((name, ""));
        Self {
            family: normalize(family),
            style: normalize(style),
        }
    }

    fn wants_bold(&self) -> bool {
        self.style.contains("bold")
    }

    fn is_regular(&self) -> bool {
        self.style.is_empty() || self.style == "regular" || self.style == "book"
    }

    /// Score a font file stem against this query. `None` means the family
    /// does not match at all.
    pub fn score(&self, stem: &str) -> Option<u32> {
        let stem = normalize(stem);
        let rest = stem.strip_prefix(self.family.as_str())?;
        if self.family.is_empty() {
            return None;
        }

        let score = if self.is_regular() {
            match rest {
                "" | "regular" | "book" | "roman" => 3,
                _ => 1,
            }
        } else if rest == self.style {
            3
        } else if rest.contains(self.style.as_str()) {
            2
        } else {
            0
        };
        Some(score)
    }
}

/// Lowercase and drop everything but letters and digits.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Pick the best-scoring candidate for `query`. Ties keep the earliest path.
pub fn pick_font_file<'a>(query: &FontQuery, candidates: &'a [PathBuf]) -> Option<&'a Path> {
    let mut best: Option<(u32, &Path)> = None;
    for path in candidates {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(score) = query.score(stem)
            && best.is_none_or(|(s, _)| score > s)
        {
            best = Some((score, path.as_path()));
        }
    }
    best.map(|(_, p)| p)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

/// Platform font directories, most specific first.
fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(user) = dirs::font_dir() {
        dirs.push(user);
    }
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".fonts"));
    }
    for dir in [
        "/usr/local/share/fonts",
        "/usr/share/fonts",
        "/Library/Fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ] {
        dirs.push(PathBuf::from(dir));
    }
    dirs
}

/// Font resolver and cache shared by all render threads.
pub struct FontBook {
    dirs: Vec<PathBuf>,
    files: OnceLock<Vec<PathBuf>>,
    cache: Mutex<HashMap<String, Arc<Font>>>,
}

impl FontBook {
    /// Search `site_dirs` first, then the platform font directories.
    pub fn new(site_dirs: Vec<PathBuf>) -> Self {
        let mut dirs = site_dirs;
        dirs.extend(system_font_dirs());
        Self::with_dirs(dirs)
    }

    /// Search exactly `dirs` (plus the fallback paths).
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            files: OnceLock::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Font files under the search directories, in directory priority order.
    fn files(&self) -> &[PathBuf] {
        self.files.get_or_init(|| {
            let mut files = Vec::new();
            for dir in self.dirs.iter().filter(|d| d.is_dir()) {
                let mut found: Vec<PathBuf> = WalkDir::new(dir)
                    .follow_links(true)
                    .into_iter()
                    .filter_map(Result::ok)
                    .map(|e| e.into_path())
                    .filter(|p| is_font_file(p))
                    .collect();
                found.sort();
                files.extend(found);
            }
            debug!(count = files.len(), "indexed font files");
            files
        })
    }

    /// Load the font for a `"Family, Style"` string.
    pub fn get(&self, name: &str) -> Result<Arc<Font>, BackendError> {
        if let Some(font) = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(name) {
            return Ok(Arc::clone(font));
        }

        let font = Arc::new(self.load(name)?);
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), Arc::clone(&font));
        Ok(font)
    }

    fn load(&self, name: &str) -> Result<Font, BackendError> {
        let query = FontQuery::parse(name);
        let files = self.files();

        if let Some(path) = pick_font_file(&query, files)
            && let Some(font) = load_font(path)
        {
            debug!(font = name, path = %path.display(), "resolved font");
            return Ok(font);
        }

        let fallbacks = if query.wants_bold() {
            FALLBACK_BOLD.iter().chain(FALLBACK_REGULAR)
        } else {
            FALLBACK_REGULAR.iter().chain(FALLBACK_BOLD)
        };
        let last_resort = files.iter().map(PathBuf::as_path);
        for path in fallbacks.map(Path::new).chain(last_resort) {
            if path.is_file()
                && let Some(font) = load_font(path)
            {
                warn!(font = name, path = %path.display(), "font not found, using fallback");
                return Ok(font);
            }
        }

        Err(BackendError::Font {
            family: name.to_string(),
            searched: self.dirs.len(),
        })
    }
}

fn load_font(path: &Path) -> Option<Font> {
    let data = std::fs::read(path).ok()?;
    match Font::from_bytes(data, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %path.display(), error = e, "failed to parse font");
            None
        }
    }
}
