// Netscape cookie jar parsing
//
// A jar line looks like:
//   .youtube.com<TAB>TRUE<TAB>/<TAB>TRUE<TAB>1767225600<TAB>SID<TAB>value
// Only name and value end up in the credential; the other columns are kept
// on `CookieRecord` for diagnostics.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use time::OffsetDateTime;

/// One parsed jar line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// `None` for session cookies (expiry column `0`) or unparseable values
    pub expires: Option<OffsetDateTime>,
    pub name: String,
    pub value: String,
}

impl CookieRecord {
    /// Parse a single line; `None` for comments, blanks and malformed lines
    pub fn parse_line(line: &str) -> Option<Self> {
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            return None;
        }

        let expires = fields[4]
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|ts| *ts > 0)
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());

        Some(Self {
            domain: fields[0].to_string(),
            include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: fields[5].to_string(),
            value: fields[6].trim_end().to_string(),
        })
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires.map_or(false, |exp| exp <= now)
    }

    fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// `Cookie` header value built from a jar. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn header_value(&self) -> &str {
        &self.0
    }
}

// Cookie values are secrets; keep them out of logs.
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.split("; ").count();
        write!(f, "SessionCredential({} cookies)", count)
    }
}

/// Every well-formed record in the jar, in file order
pub fn parse_records(content: &str) -> Vec<CookieRecord> {
    content.lines().filter_map(CookieRecord::parse_line).collect()
}

/// Join all records into a credential, or `None` when the jar holds no record
pub fn parse_jar(content: &str) -> Option<SessionCredential> {
    credential_from_records(&parse_records(content))
}

fn credential_from_records(records: &[CookieRecord]) -> Option<SessionCredential> {
    if records.is_empty() {
        return None;
    }
    let header = records
        .iter()
        .map(CookieRecord::pair)
        .collect::<Vec<_>>()
        .join("; ");
    Some(SessionCredential(header))
}

/// A jar read once at startup.
///
/// The text is kept verbatim for tools that want a cookie file; the
/// credential is what goes out as the `Cookie` header.
#[derive(Clone)]
pub struct CookieJar {
    text: Arc<str>,
    credential: SessionCredential,
}

impl CookieJar {
    /// `None` when the text holds no valid record
    pub fn parse(text: impl Into<String>) -> Option<Self> {
        let text: String = text.into();
        let credential = parse_jar(&text)?;
        Some(Self {
            text: text.into(),
            credential,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    /// Private on-disk copy for one consumer; removed when dropped.
    /// yt-dlp writes its jar back on exit, so it never gets the original.
    pub fn stage(&self) -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("cookies-")
            .suffix(".txt")
            .tempfile()?;
        file.write_all(self.text.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("credential", &self.credential)
            .finish()
    }
}

/// Read and parse the jar at `path`. I/O errors go to the caller.
pub fn load_jar(path: &Path) -> std::io::Result<Option<CookieJar>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content);

    let now = OffsetDateTime::now_utc();
    let expired = records.iter().filter(|r| r.is_expired_at(now)).count();
    if expired > 0 {
        tracing::warn!(
            "[Cookies] {} of {} cookies in {} are already expired",
            expired,
            records.len(),
            path.display()
        );
    }
    tracing::info!(
        "[Cookies] Loaded {} cookies from {}",
        records.len(),
        path.display()
    );

    Ok(credential_from_records(&records).map(|credential| CookieJar {
        text: content.into(),
        credential,
    }))
}
