//! Utility functions for filesystem operations

use std::{
   cmp::Ordering,
   fs::{self, File},
   io::{self, Read, Write},
   path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Flushes directory metadata so a preceding rename survives a crash.
#[cfg(unix)]
pub fn fsync_dir(path: &Path) -> io::Result<()> {
   File::open(path)?.sync_all()
}

#[cfg(not(unix))]
pub fn fsync_dir(_path: &Path) -> io::Result<()> {
   Ok(())
}

/// Sibling path used while a file is being written.
pub fn temp_sibling(path: &Path) -> PathBuf {
   let name = path
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or("document");
   path.with_file_name(format!("{name}.tmp-{}", Uuid::new_v4().simple()))
}

pub fn is_temp_name(name: &str) -> bool {
   name.contains(".tmp-")
}

/// Writes `bytes` to `path` through a temp file + rename, so readers observe
/// either the previous contents or the new ones.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
   let parent = path.parent().unwrap_or_else(|| Path::new("."));
   fs::create_dir_all(parent)?;
   let tmp_path = temp_sibling(path);
   let written = (|| {
      let mut file = File::create(&tmp_path)?;
      file.write_all(bytes)?;
      file.sync_all()?;
      fs::rename(&tmp_path, path)
   })();
   if let Err(err) = written {
      let _ = fs::remove_file(&tmp_path);
      return Err(err);
   }
   fsync_dir(parent)
}

/// Hex-encoded SHA-256 of everything `reader` yields.
pub fn sha256_reader(mut reader: impl Read) -> io::Result<String> {
   let mut hasher = Sha256::new();
   let mut buf = [0u8; 64 * 1024];
   loop {
      let n = reader.read(&mut buf)?;
      if n == 0 {
         break;
      }
      hasher.update(&buf[..n]);
   }
   Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
   sha256_reader(File::open(path)?)
}

/// `2015-08-29-14-03-59` style stamp used in exported archive names.
pub fn timestamp_slug<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
   Tz::Offset: std::fmt::Display,
{
   at.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Orders entity ids numerically when both are numbers ("2" < "10"),
/// lexicographically otherwise.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
   match (a.parse::<u64>(), b.parse::<u64>()) {
      (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
      (Ok(_), Err(_)) => Ordering::Less,
      (Err(_), Ok(_)) => Ordering::Greater,
      (Err(_), Err(_)) => a.cmp(b),
   }
}

/// Recursively calculates the total size of a directory in bytes
pub fn get_dir_size(path: &Path) -> io::Result<u64> {
   let mut total = 0u64;

   if path.is_dir() {
      for entry in fs::read_dir(path)? {
         let entry = entry?;
         let metadata = entry.metadata()?;

         if metadata.is_dir() {
            total += get_dir_size(&entry.path())?;
         } else {
            total += metadata.len();
         }
      }
   }

   Ok(total)
}

/// Formats a byte count as a human-readable size string
pub fn format_size(bytes: u64) -> String {
   const KB: u64 = 1024;
   const MB: u64 = KB * 1024;
   const GB: u64 = MB * 1024;

   if bytes < KB {
      format!("{bytes} B")
   } else if bytes < MB {
      format!("{:.1} KB", bytes as f64 / KB as f64)
   } else if bytes < GB {
      format!("{:.1} MB", bytes as f64 / MB as f64)
   } else {
      format!("{:.1} GB", bytes as f64 / GB as f64)
   }
}
