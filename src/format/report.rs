use std::{borrow::Cow, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::{EnvMatchError, Result}, format::Scheme};

/// Match id of a file whose format could not be identified
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// Directory name of files sitting at the top of a data object
pub const ROOT_DIRECTORY: &str = "root";

/// Format-identification report as written by the identification tool
///
/// Only the fields needed for ranking are modelled, everything else in the
/// report is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationReport {
    pub identifiers: Vec<ReportIdentifier>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIdentifier {
    pub name: String,
}

/// One file of a data object with its candidate format matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub matches: Vec<FormatMatch>,
}

/// Candidate format of a file
///
/// Candidates are never disambiguated, every one of them counts as if it were
/// the definite format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatMatch {
    pub id: String,
    /// human-readable format name
    #[serde(rename = "format", default)]
    pub label: String,
}

impl FormatMatch {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_FORMAT
    }
}

impl FileEntry {
    /// Directory part of the file path (`\` treated as `/`)
    #[inline]
    pub fn directory(&self) -> Cow<'_, str> {
        directory_of(&self.filename)
    }
}

/// Containing directory of a path inside a data object
///
/// A bare file name belongs to [`ROOT_DIRECTORY`].
pub fn directory_of(path: &str) -> Cow<'_, str> {
    let normalized: Cow<'_, str> = if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    };
    match normalized.rfind('/') {
        None => Cow::Borrowed(ROOT_DIRECTORY),
        Some(pos) => match normalized {
            Cow::Borrowed(s) => Cow::Borrowed(&s[..pos]),
            Cow::Owned(mut s) => {
                s.truncate(pos);
                Cow::Owned(s)
            }
        },
    }
}

/// A named set of files identified with exactly one scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataObject {
    pub name: String,
    pub scheme: Scheme,
    pub files: Vec<FileEntry>,
}

impl DataObject {
    /// Empty object, files are added with [`DataObject::with_file`]
    pub fn new(name: impl Into<String>, scheme: Scheme) -> Self {
        Self { name: name.into(), scheme, files: Vec::new() }
    }

    /// Add a file with the given candidate format ids (labels left empty)
    pub fn with_file(mut self, path: impl Into<String>, ids: &[&str]) -> Self {
        self.files.push(FileEntry {
            filename: path.into(),
            matches: ids.iter().map(|id| FormatMatch::new(*id, "")).collect(),
        });
        self
    }

    /// Validate a parsed report
    ///
    /// The object must have at least one file and declare exactly one known
    /// identifier scheme.
    pub fn from_report(name: impl Into<String>, report: IdentificationReport) -> Result<Self> {
        let name = name.into();
        if report.files.is_empty() {
            return Err(EnvMatchError::EmptyObject(name));
        }
        let scheme = match report.identifiers.as_slice() {
            [] => return Err(EnvMatchError::MissingScheme(name)),
            [single] => single.name.parse::<Scheme>()?,
            many => {
                return Err(EnvMatchError::MultipleSchemes { name, count: many.len() });
            }
        };
        Ok(Self { name, scheme, files: report.files })
    }

    pub fn from_json_str(name: impl Into<String>, raw: &str) -> Result<Self> {
        let report: IdentificationReport = serde_json::from_str(raw)?;
        Self::from_report(name, report)
    }

    /// Read a report file; the object is named after the file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        // 不正な UTF-8 は無視して読む
        let bytes = fs::read(path)?;
        let raw = String::from_utf8_lossy(&bytes);
        Self::from_json_str(name, &raw)
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Parse every regular file of `dir` as a report, in file-name order
///
/// Per-file failures are returned alongside the name so a batch can log and
/// skip them; only an unreadable directory fails the whole call.
pub fn read_report_dir(dir: impl AsRef<Path>) -> Result<Vec<(String, Result<DataObject>)>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(EnvMatchError::MissingState(dir.to_path_buf()));
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (name, DataObject::from_json_file(&path))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "siegfried": "1.9.1",
        "identifiers": [{"name": "pronom", "details": "DROID_SignatureFile_V97.xml"}],
        "files": [
            {"filename": "docs/a.pdf", "filesize": 12, "matches": [{"ns": "pronom", "id": "fmt/276", "format": "Acrobat PDF 1.7"}]},
            {"filename": "b.bin", "filesize": 3, "matches": [{"ns": "pronom", "id": "UNKNOWN", "format": ""}]}
        ]
    }"#;

    #[test]
    fn parses_report_and_ignores_extra_fields() {
        let object = DataObject::from_json_str("obj.json", REPORT).unwrap();
        assert_eq!(object.scheme, Scheme::Pronom);
        assert_eq!(object.file_count(), 2);
        assert_eq!(object.files[0].matches[0].label, "Acrobat PDF 1.7");
        assert!(object.files[1].matches[0].is_unknown());
    }

    #[test]
    fn rejects_objects_without_files() {
        let raw = r#"{"identifiers": [{"name": "wikidata"}], "files": []}"#;
        assert!(matches!(DataObject::from_json_str("x", raw), Err(EnvMatchError::EmptyObject(_))));
    }

    #[test]
    fn rejects_missing_multiple_and_unknown_schemes() {
        let none = r#"{"identifiers": [], "files": [{"filename": "a", "matches": []}]}"#;
        let two = r#"{"identifiers": [{"name": "wikidata"}, {"name": "pronom"}], "files": [{"filename": "a", "matches": []}]}"#;
        let odd = r#"{"identifiers": [{"name": "tika"}], "files": [{"filename": "a", "matches": []}]}"#;
        assert!(matches!(DataObject::from_json_str("x", none), Err(EnvMatchError::MissingScheme(_))));
        assert!(matches!(
            DataObject::from_json_str("x", two),
            Err(EnvMatchError::MultipleSchemes { count: 2, .. })
        ));
        assert!(matches!(DataObject::from_json_str("x", odd), Err(EnvMatchError::UnknownScheme(_))));
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        let err = DataObject::from_json_str("x", r#"{"identifiers": [{"name": "pronom"}]}"#).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn directory_grouping_rules() {
        assert_eq!(directory_of("a.txt"), "root");
        assert_eq!(directory_of("dir/a.txt"), "dir");
        assert_eq!(directory_of("dir/sub/a.txt"), "dir/sub");
        assert_eq!(directory_of("dir\\sub\\a.txt"), "dir/sub");
    }
}
