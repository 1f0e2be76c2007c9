use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::SlotStore;

const SLOT_EXTENSION: &str = "json";
const SLOT_TMP_EXTENSION: &str = "json.tmp";

/// One file per slot under a directory; writes land in a temp file first and
/// are renamed over the slot.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating slot directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SLOT_EXTENSION}"))
    }
}

impl SlotStore for FileSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading slot {}", path.display())),
        }
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        let final_path = self.slot_path(key);
        let tmp_path = final_path.with_extension(SLOT_TMP_EXTENSION);
        fs::write(&tmp_path, value)
            .with_context(|| format!("writing temporary slot {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("atomically persisting slot {}", final_path.display()))?;
        Ok(())
    }
}
