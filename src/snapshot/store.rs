use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};

use crate::records::CourseRecord;

const FILE_PREFIX: &str = "courses_";
const FILE_SUFFIX: &str = ".json";

/// Directory of `courses_YYYYMMDD_HHMMSS.json` files, one per detected change.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed creating output directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("{FILE_PREFIX}{}{FILE_SUFFIX}", at.format("%Y%m%d_%H%M%S"))
    }

    pub fn save<Tz: TimeZone>(&self, records: &[CourseRecord], at: &DateTime<Tz>) -> Result<PathBuf>
    where
        Tz::Offset: std::fmt::Display,
    {
        let path = self.dir.join(Self::file_name(at));
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&path, json)
            .with_context(|| format!("failed writing snapshot: {}", path.display()))?;
        Ok(path)
    }

    /// Newest snapshot by file name; the timestamp format sorts lexically.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        let mut newest: Option<(String, PathBuf)> = None;
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed listing {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !(name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)) {
                continue;
            }
            if newest.as_ref().map_or(true, |(best, _)| name > *best) {
                newest = Some((name, entry.path()));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }

    pub fn load(path: &Path) -> Result<Vec<CourseRecord>> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading snapshot: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed parsing snapshot: {}", path.display()))
    }

    pub fn load_latest(&self) -> Result<Option<(PathBuf, Vec<CourseRecord>)>> {
        match self.latest()? {
            Some(path) => {
                let records = Self::load(&path)?;
                Ok(Some((path, records)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    use super::SnapshotStore;
    use crate::records::semester::Semester;
    use crate::records::CourseRecord;

    fn records() -> Vec<CourseRecord> {
        vec![
            CourseRecord {
                name: "数据结构".to_string(),
                credits: 3.0,
                raw_score: "92".to_string(),
                semester: Semester::from_label("23-24秋冬"),
                is_major: true,
            },
            CourseRecord {
                name: "体育".to_string(),
                credits: 1.0,
                raw_score: "良好".to_string(),
                semester: Semester::Unknown,
                is_major: false,
            },
        ]
    }

    #[test]
    fn open_creates_missing_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("nested/data");
        let store = SnapshotStore::open(&dir).expect("open");
        assert!(store.dir().is_dir());
        assert!(store.latest().expect("list").is_none());
    }

    #[test]
    fn saved_file_uses_timestamped_name_and_portal_keys() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::open(tmp.path()).expect("open");
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 7).unwrap();
        let path = store.save(&records(), &at).expect("save");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("courses_20240115_090507.json")
        );

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        let first = &raw[0];
        assert_eq!(first["name"], "数据结构");
        assert_eq!(first["credits"], 3.0);
        assert_eq!(first["score"], "92");
        assert_eq!(first["semester"], "23-24秋冬");
        assert_eq!(first["is_major"], true);
        assert_eq!(raw[1]["semester"], "未知学期");
    }

    #[test]
    fn latest_picks_newest_snapshot_and_ignores_other_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::open(tmp.path()).expect("open");
        let older = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        store.save(&records()[..1], &older).expect("save");
        store.save(&records(), &newer).expect("save");
        std::fs::write(tmp.path().join("zzz.txt"), "noise").expect("write");

        let (path, loaded) = store.load_latest().expect("load").expect("present");
        assert!(path.ends_with("courses_20240201_080000.json"));
        assert_eq!(loaded, records());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("courses_20240101_000000.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(SnapshotStore::load(&path).is_err());
    }
}
