//! Dump-file record source.
//!
//! Some deployments redirect the monitor's console output to a file that is
//! rewritten on every report. [`FileSource`] turns each new version of that
//! file into one record.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{LogRecord, RecordSource};

/// What identifies one version of the dump file.
///
/// A changed length counts as a new version even when the mtime did not
/// advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Version {
    modified: Option<SystemTime>,
    len: u64,
}

impl From<&Metadata> for Version {
    fn from(meta: &Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        }
    }
}

/// A record source that delivers a dump file each time it changes.
///
/// Records carry no emitter name, so the target node filter never drops
/// them. While the file is missing or unreadable, `error()` says why and the
/// last delivered version stays current.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    delivered: Option<Version>,
    error: Option<String>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            description: format!("file: {}", path.display()),
            path,
            delivered: None,
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deliver the current content even if it was delivered before.
    pub fn reread(&mut self) -> Option<LogRecord> {
        self.delivered = None;
        self.poll()
    }

    fn fail(&mut self, err: std::io::Error) -> Option<LogRecord> {
        self.error = Some(format!("Read error: {}", err));
        None
    }
}

impl RecordSource for FileSource {
    fn poll(&mut self) -> Option<LogRecord> {
        let version = match fs::metadata(&self.path) {
            Ok(meta) => Version::from(&meta),
            Err(e) => return self.fail(e),
        };

        if self.delivered == Some(version) {
            return None;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => {
                self.delivered = Some(version);
                self.error = None;
                Some(LogRecord::anonymous(content))
            }
            Err(e) => self.fail(e),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dump(freq: &str) -> String {
        format!(
            "Statistics for topic /odom\nMessage count = 600, Message frequency = {}\n",
            freq
        )
    }

    fn dump_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_source_description() {
        let source = FileSource::new("/tmp/statistics.log");
        assert_eq!(source.path(), Path::new("/tmp/statistics.log"));
        assert_eq!(source.description(), "file: /tmp/statistics.log");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_each_version_is_delivered_once() {
        let file = dump_file(&dump("20.0"));
        let mut source = FileSource::new(file.path());

        let record = source.poll().unwrap();
        assert_eq!(record.msg, dump("20.0"));
        assert!(record.name.is_none());
        assert!(source.poll().is_none());

        assert!(source.reread().is_some());
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_quick_rewrite_with_new_length_is_noticed() {
        let file = dump_file(&dump("20.0"));
        let mut source = FileSource::new(file.path());
        source.poll().unwrap();

        // Likely within the same mtime tick
        fs::write(file.path(), dump("5.25")).unwrap();
        assert_eq!(source.poll().unwrap().msg, dump("5.25"));
    }

    #[test]
    fn test_missing_file_reports_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.log");
        let mut source = FileSource::new(&path);

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().starts_with("Read error"));

        fs::write(&path, dump("20.0")).unwrap();
        assert!(source.poll().is_some());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().is_some());
    }
}
