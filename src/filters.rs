//! Compound search filters and the predicate that applies them to a
//! filesystem entry.

use crate::error::{Result, SearchError};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::str::FromStr;

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "flv"];
const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "wma"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Documents,
    Images,
    Videos,
    Music,
    Folders,
}

impl TypeFilter {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            TypeFilter::Documents => DOCUMENT_EXTENSIONS,
            TypeFilter::Images => IMAGE_EXTENSIONS,
            TypeFilter::Videos => VIDEO_EXTENSIONS,
            TypeFilter::Music => MUSIC_EXTENSIONS,
            TypeFilter::All | TypeFilter::Folders => &[],
        }
    }

    /// Type check only; needs no metadata beyond the directory flag.
    pub fn admits(self, path: &Path, is_dir: bool) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Folders => is_dir,
            _ if is_dir => false,
            category => path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext.to_ascii_lowercase())
                .is_some_and(|ext| category.extensions().contains(&ext.as_str())),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = SearchError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "documents" | "docs" => Ok(TypeFilter::Documents),
            "images" | "pictures" => Ok(TypeFilter::Images),
            "videos" => Ok(TypeFilter::Videos),
            "music" => Ok(TypeFilter::Music),
            "folders" => Ok(TypeFilter::Folders),
            other => Err(SearchError::InvalidFilter(format!(
                "unknown type '{other}' (expected all, documents, images, videos, music, folders)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateDirection {
    Before,
    After,
}

/// Compares the calendar date of the last modification, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateFilter {
    pub direction: DateDirection,
    pub date: NaiveDate,
}

impl DateFilter {
    pub fn before(date: NaiveDate) -> Self {
        Self {
            direction: DateDirection::Before,
            date,
        }
    }

    pub fn after(date: NaiveDate) -> Self {
        Self {
            direction: DateDirection::After,
            date,
        }
    }

    pub fn admits_date(&self, file_date: NaiveDate) -> bool {
        match self.direction {
            DateDirection::Before => file_date <= self.date,
            DateDirection::After => file_date >= self.date,
        }
    }

    fn admits(&self, metadata: &Metadata) -> Option<bool> {
        let modified = metadata.modified().ok()?;
        let file_date = DateTime::<Local>::from(modified).date_naive();
        Some(self.admits_date(file_date))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeFilter {
    min: Option<u64>,
    max: Option<u64>,
}

impl SizeFilter {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Result<Self> {
        match (min, max) {
            (None, None) => Err(SearchError::InvalidFilter(
                "size filter needs a minimum or a maximum".to_string(),
            )),
            (Some(lo), Some(hi)) if lo > hi => Err(SearchError::InvalidFilter(format!(
                "size minimum {lo} is larger than maximum {hi}"
            ))),
            _ => Ok(Self { min, max }),
        }
    }

    pub fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: u64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn min(&self) -> Option<u64> {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }

    pub fn admits_size(&self, size: u64) -> bool {
        if self.min.is_some_and(|min| size < min) {
            return false;
        }
        if self.max.is_some_and(|max| size > max) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchFilters {
    pub date: Option<DateFilter>,
    pub size: Option<SizeFilter>,
    pub kind: TypeFilter,
    pub include_subfolders: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            date: None,
            size: None,
            kind: TypeFilter::All,
            include_subfolders: true,
        }
    }
}

impl SearchFilters {
    pub fn with_date(mut self, date: DateFilter) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_size(mut self, size: SizeFilter) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_kind(mut self, kind: TypeFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn recursive(mut self, include_subfolders: bool) -> Self {
        self.include_subfolders = include_subfolders;
        self
    }
}

/// Decides whether an entry that already matched the name term survives the
/// filters.
///
/// A vanished entry never passes. Any other metadata failure only disables the
/// size and date checks for that entry; it never excludes it.
pub fn passes(path: &Path, is_dir: bool, filters: &SearchFilters) -> bool {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => Some(metadata),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return false,
        Err(_) => None,
    };

    if !filters.kind.admits(path, is_dir) {
        return false;
    }

    let Some(metadata) = metadata else {
        return true;
    };

    if !is_dir {
        if let Some(size) = &filters.size {
            if !size.admits_size(metadata.len()) {
                return false;
            }
        }
    }

    if let Some(date) = &filters.date {
        if date.admits(&metadata) == Some(false) {
            return false;
        }
    }

    true
}

/// Parses `512`, `10KB`, `1.5 mb`, `2G` into bytes (1024-based units).
pub fn parse_size(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        other => {
            return Err(SearchError::InvalidFilter(format!(
                "unknown size unit '{other}' in '{raw}'"
            )))
        }
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier).ok_or_else(|| {
            SearchError::InvalidFilter(format!("size '{raw}' is too large"))
        });
    }
    let value: f64 = number
        .parse()
        .map_err(|_| SearchError::InvalidFilter(format!("invalid size '{raw}'")))?;
    Ok((value * multiplier as f64).round() as u64)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| SearchError::InvalidFilter(format!("invalid date '{raw}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn test_root(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("shadows-filters-{name}-{nonce}"))
    }

    fn write_sized(path: &Path, size: usize) {
        fs::write(path, vec![b'x'; size]).expect("write file");
    }

    fn set_mtime(path: &Path, date: NaiveDate) {
        let local = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).expect("noon"))
            .single()
            .expect("unambiguous local time");
        let file = File::options().write(true).open(path).expect("open file");
        file.set_modified(SystemTime::from(local))
            .expect("set mtime");
    }

    #[test]
    fn minimum_size_is_inclusive() {
        let root = test_root("min-size");
        fs::create_dir_all(&root).expect("create dir");
        let exact = root.join("exact.bin");
        let smaller = root.join("smaller.bin");
        write_sized(&exact, 1000);
        write_sized(&smaller, 999);

        let filters = SearchFilters::default().with_size(SizeFilter::at_least(1000));
        assert!(passes(&exact, false, &filters));
        assert!(!passes(&smaller, false, &filters));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn maximum_size_is_inclusive() {
        let filter = SizeFilter::at_most(10);
        assert!(filter.admits_size(10));
        assert!(!filter.admits_size(11));
        assert!(filter.admits_size(0));
    }

    #[test]
    fn size_filter_never_excludes_directories() {
        let root = test_root("size-dir");
        let folder = root.join("folder");
        fs::create_dir_all(&folder).expect("create dir");

        let filters = SearchFilters::default().with_size(SizeFilter::at_least(u64::MAX));
        assert!(passes(&folder, true, &filters));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn before_date_includes_boundary_day() {
        let root = test_root("before");
        fs::create_dir_all(&root).expect("create dir");
        let boundary = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let on_day = root.join("on.txt");
        let day_after = root.join("after.txt");
        write_sized(&on_day, 1);
        write_sized(&day_after, 1);
        set_mtime(&on_day, boundary);
        set_mtime(&day_after, boundary + ChronoDuration::days(1));

        let filters = SearchFilters::default().with_date(DateFilter::before(boundary));
        assert!(passes(&on_day, false, &filters));
        assert!(!passes(&day_after, false, &filters));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn after_date_excludes_earlier_days() {
        let boundary = NaiveDate::from_ymd_opt(2024, 6, 15).expect("date");
        let filter = DateFilter::after(boundary);
        assert!(filter.admits_date(boundary));
        assert!(filter.admits_date(boundary + ChronoDuration::days(30)));
        assert!(!filter.admits_date(boundary - ChronoDuration::days(1)));
    }

    #[test]
    fn folders_filter_rejects_every_file() {
        let root = test_root("folders");
        fs::create_dir_all(&root).expect("create dir");
        let file = root.join("notes.txt");
        write_sized(&file, 4);

        let filters = SearchFilters::default()
            .with_kind(TypeFilter::Folders)
            .with_size(SizeFilter::at_most(100));
        assert!(!passes(&file, false, &filters));
        assert!(passes(&root, true, &filters));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn category_filters_use_extension_allowlist() {
        assert!(TypeFilter::Images.admits(Path::new("/x/photo.JPG"), false));
        assert!(!TypeFilter::Images.admits(Path::new("/x/photo.txt"), false));
        assert!(!TypeFilter::Images.admits(Path::new("/x/pictures"), true));
        assert!(TypeFilter::Documents.admits(Path::new("/x/report.docx"), false));
        assert!(TypeFilter::Music.admits(Path::new("/x/song.flac"), false));
        assert!(TypeFilter::Videos.admits(Path::new("/x/clip.mkv"), false));
        assert!(!TypeFilter::Documents.admits(Path::new("/x/.txt"), false));
        assert!(TypeFilter::All.admits(Path::new("/x/anything"), true));
    }

    #[test]
    fn vanished_entry_never_passes() {
        let missing = test_root("missing").join("gone.txt");
        assert!(!passes(&missing, false, &SearchFilters::default()));
    }

    #[test]
    fn size_filter_requires_a_bound() {
        assert!(SizeFilter::new(None, None).is_err());
        assert!(SizeFilter::new(Some(5), Some(1)).is_err());
        assert_eq!(
            SizeFilter::new(Some(1), None).expect("min only").min(),
            Some(1)
        );
    }

    #[test]
    fn parse_size_understands_units() {
        assert_eq!(parse_size("512").expect("bytes"), 512);
        assert_eq!(parse_size("10KB").expect("kb"), 10 * 1024);
        assert_eq!(parse_size("1.5 mb").expect("mb"), 1024 * 1024 * 3 / 2);
        assert_eq!(parse_size("2G").expect("gb"), 2 * 1024 * 1024 * 1024);
        assert!(parse_size("12 parsecs").is_err());
        assert!(parse_size("KB").is_err());
    }

    #[test]
    fn parse_date_and_type() {
        assert_eq!(
            parse_date("2024-01-01").expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")
        );
        assert!(parse_date("01/01/2024").is_err());
        assert_eq!("Pictures".parse::<TypeFilter>().expect("type"), TypeFilter::Images);
        assert!("spreadsheets".parse::<TypeFilter>().is_err());
    }
}
