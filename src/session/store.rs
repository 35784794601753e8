use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{SessionRecord, format_token_ttl, parse_token_ttl};
use crate::{
    constants::{
        self, AWS_ACCESS_KEY_ID, AWS_PROFILE, AWS_SECRET_ACCESS_KEY, AWS_SECURITY_TOKEN,
        AWS_SESSION_TOKEN, AWS_TOKEN_TTL,
    },
    error::{AuthError, ConfigurationError},
};

/// How long to wait for another process holding the session lock
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Single-record session cache backed by a `KEY=VALUE` file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

/// Exclusive lock over the session file, released on drop
#[derive(Debug)]
pub struct SessionLock {
    _file: File,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `AWS_SU_SESSION_FILE` or `~/.awssudo`
    pub fn from_default_path() -> Result<Self, AuthError> {
        let path = constants::get_session_file_path()
            .ok_or(ConfigurationError::PathUndetermined("session file"))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read the stored session.
    ///
    /// Returns `Ok(None)` when the file is missing or does not hold a
    /// complete record. Only unexpected I/O failures are errors.
    pub fn load(&self) -> Result<Option<SessionRecord>, AuthError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(AuthError::storage(&self.path, "read", e)),
        };

        let record = parse_record(&contents);
        if record.is_none() {
            debug!(
                "Session file {} is incomplete, ignoring it",
                self.path.display()
            );
        }
        Ok(record)
    }

    /// Replace the stored session. The new contents appear all at once or
    /// not at all.
    pub fn save(&self, record: &SessionRecord) -> Result<(), AuthError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| AuthError::storage(parent, "created", e))?;

        // NamedTempFile is created with mode 0600 on Unix
        let mut temp =
            NamedTempFile::new_in(parent).map_err(|e| AuthError::storage(parent, "written", e))?;
        temp.write_all(serialize_record(record).as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| AuthError::storage(&self.path, "written", e))?;
        temp.persist(&self.path)
            .map_err(|e| AuthError::storage(&self.path, "written", e.error))?;

        info!("Session for profile {} saved to {}", record.profile, self.path.display());
        Ok(())
    }

    /// Delete the stored session under the lock, so a concurrent
    /// authentication never sees half of a logout. Missing files are not an
    /// error.
    pub fn clear(&self) -> Result<(), AuthError> {
        let _lock = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed session file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::storage(&self.path, "removed", e)),
        }
    }

    /// Take the exclusive lock guarding a load/save sequence.
    pub fn lock(&self) -> Result<SessionLock, AuthError> {
        self.lock_with_timeout(LOCK_TIMEOUT)
    }

    pub fn lock_with_timeout(&self, timeout: Duration) -> Result<SessionLock, AuthError> {
        let path = self.lock_path();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AuthError::storage(parent, "created", e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| AuthError::storage(&path, "locked", e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(SessionLock { _file: file }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Err(AuthError::storage(
                            &path,
                            "locked",
                            io::Error::new(
                                io::ErrorKind::TimedOut,
                                "another awssu process is authenticating",
                            ),
                        ));
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(AuthError::storage(&path, "locked", e)),
            }
        }
    }
}

/// Fields collected from the file before completeness is checked
#[derive(Debug, Default)]
struct SessionFields {
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    security_token: Option<String>,
    token_ttl: Option<String>,
    profile: Option<String>,
}

impl SessionFields {
    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            AWS_ACCESS_KEY_ID => &mut self.access_key_id,
            AWS_SECRET_ACCESS_KEY => &mut self.secret_access_key,
            AWS_SESSION_TOKEN => &mut self.session_token,
            AWS_SECURITY_TOKEN => &mut self.security_token,
            AWS_TOKEN_TTL => &mut self.token_ttl,
            AWS_PROFILE => &mut self.profile,
            _ => return,
        };
        *slot = Some(value.to_string()).filter(|v| !v.is_empty());
    }

    fn into_record(self) -> Option<SessionRecord> {
        Some(SessionRecord {
            profile: self.profile?,
            access_key_id: self.access_key_id?,
            secret_access_key: self.secret_access_key?,
            session_token: self.session_token.or(self.security_token)?,
            expires_at: parse_token_ttl(&self.token_ttl?)?,
        })
    }
}

fn parse_record(contents: &str) -> Option<SessionRecord> {
    let mut fields = SessionFields::default();

    for line in contents.lines() {
        // Values may contain '=' (base64 padding), so split on the first one
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        fields.set(key.trim(), value.trim());
    }

    fields.into_record()
}

fn serialize_record(record: &SessionRecord) -> String {
    [
        (AWS_ACCESS_KEY_ID, record.access_key_id.as_str()),
        (AWS_SECRET_ACCESS_KEY, record.secret_access_key.as_str()),
        (AWS_SESSION_TOKEN, record.session_token.as_str()),
        (AWS_SECURITY_TOKEN, record.security_token()),
        (AWS_TOKEN_TTL, format_token_ttl(record.expires_at).as_str()),
        (AWS_PROFILE, record.profile.as_str()),
    ]
    .iter()
    .map(|(key, value)| format!("{key}={value}\n"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    fn expiry() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    }

    fn record() -> SessionRecord {
        SessionRecord {
            profile: "ds-nonprod".to_string(),
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG".to_string(),
            session_token: "FwoGZXIvYXdzEJr//////////wEaDA==".to_string(),
            expires_at: expiry(),
        }
    }

    #[test]
    fn test_save_then_load_returns_same_record() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));

        store.save(&record()).unwrap();

        assert_eq!(store.load().unwrap(), Some(record()));
    }

    #[test]
    fn test_save_writes_six_lines() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));

        store.save(&record()).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "AWS_ACCESS_KEY_ID=ASIAEXAMPLE",
                "AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI/K7MDENG",
                "AWS_SESSION_TOKEN=FwoGZXIvYXdzEJr//////////wEaDA==",
                "AWS_SECURITY_TOKEN=FwoGZXIvYXdzEJr//////////wEaDA==",
                "AWS_TOKEN_TTL=2030-01-01 20:00:00",
                "AWS_PROFILE=ds-nonprod",
            ]
        );
    }

    #[test]
    fn test_save_replaces_previous_record() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));
        store.save(&record()).unwrap();

        let mut other = record();
        other.profile = "ds-prod".to_string();
        other.access_key_id = "ASIAOTHER".to_string();
        store.save(&other).unwrap();

        assert_eq!(store.load().unwrap(), Some(other));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("awssudo"));

        store.save(&record()).unwrap();

        assert!(store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));
        store.save(&record()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_without_ttl_is_absent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));
        fs::write(
            store.path(),
            "AWS_ACCESS_KEY_ID=AKID\nAWS_SECRET_ACCESS_KEY=SECRET\nAWS_SESSION_TOKEN=TOKEN\n\
             AWS_SECURITY_TOKEN=TOKEN\nAWS_PROFILE=ds-nonprod\n",
        )
        .unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_with_unparseable_ttl_is_absent() {
        let contents = serialize_record(&record()).replace("2030-01-01 20:00:00", "soon");
        assert_eq!(parse_record(&contents), None);
    }

    #[test]
    fn test_load_with_empty_value_is_absent() {
        let contents = serialize_record(&record()).replace("AWS_PROFILE=ds-nonprod", "AWS_PROFILE=");
        assert_eq!(parse_record(&contents), None);
    }

    #[test]
    fn test_parse_skips_malformed_and_unknown_lines() {
        let contents = format!(
            "# cached by awssu\nAWS_ACCESS_KEY_ID\nAWS_REGION=eu-west-2\n\n{}",
            serialize_record(&record())
        );
        assert_eq!(parse_record(&contents), Some(record()));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let contents = "  AWS_ACCESS_KEY_ID = ASIAEXAMPLE  \r\n\
                        AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI/K7MDENG\t\n\
                        AWS_SESSION_TOKEN= FwoGZXIvYXdzEJr//////////wEaDA==\n\
                        AWS_TOKEN_TTL=2030-01-01 20:00:00 \n\
                        AWS_PROFILE=ds-nonprod\n";
        assert_eq!(parse_record(contents), Some(record()));
    }

    #[test]
    fn test_parse_falls_back_to_security_token() {
        let contents = serialize_record(&record())
            .lines()
            .filter(|line| !line.starts_with("AWS_SESSION_TOKEN="))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_record(&contents), Some(record()));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));
        store.save(&record()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_lock_path_sits_next_to_session_file() {
        let store = SessionStore::new("/home/jane/.awssudo");
        assert_eq!(store.lock_path(), PathBuf::from("/home/jane/.awssudo.lock"));
    }

    #[test]
    fn test_second_lock_times_out_while_first_is_held() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("awssudo"));

        let held = store.lock().unwrap();
        let result = store.lock_with_timeout(Duration::from_millis(100));
        assert!(matches!(result, Err(AuthError::Storage { .. })));

        drop(held);
        assert!(store.lock_with_timeout(Duration::from_millis(100)).is_ok());
    }
}
