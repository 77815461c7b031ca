//! Compilation database parsing and per-file entry lookup
//!
//! Headers are never compiled on their own and so never appear in the database.
//! Their flags are borrowed from the most closely related translation unit:
//!
//! 1. a source file with the same stem in the same directory (`foo.h` -> `foo.cpp`)
//! 2. a source file with the same stem anywhere
//! 3. any source file under the header's directory
//! 4. the first entry of the database
//!
//! The last step means a header always gets *some* flags when the database is
//! usable, even if they belong to an unrelated file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::locator::CompilationDatabaseLocator;
use super::paths::{comparison_key, file_name_key, is_absolute_any, is_under_dir};
use super::provider::{FileSystem, RealFileSystem};
use super::read_if_present;
use crate::error::{ResolutionError, ResolutionResult};

/// Header extensions, lowercase without the dot
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl"];

/// Source extensions in the order sibling lookups try them
pub const CODE_EXTENSIONS: &[&str] = &["cpp", "cxx", "cc", "c++", "c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Header,
    Code,
    Other,
}

/// Classify a path by extension (case-insensitive)
pub fn classify(path: &Path) -> FileKind {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return FileKind::Other;
    };
    if HEADER_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Header
    } else if CODE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Code
    } else {
        FileKind::Other
    }
}

/// One translation unit of a `compile_commands.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationDatabaseEntry {
    #[serde(default)]
    file: String,

    #[serde(default)]
    directory: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

impl CompilationDatabaseEntry {
    pub fn new(
        file: impl Into<String>,
        directory: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            directory: directory.into(),
            command: Some(command.into()),
            arguments: None,
            output: None,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// `file`, resolved against `directory` when relative
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(self.resolved_file())
    }

    fn resolved_file(&self) -> String {
        if self.file.is_empty() || self.directory.is_empty() || is_absolute_any(&self.file) {
            self.file.clone()
        } else {
            format!("{}/{}", self.directory.trim_end_matches(['/', '\\']), self.file)
        }
    }

    /// Compiler arguments: the explicit `arguments` array, or `command` split on
    /// unquoted whitespace
    pub fn arguments(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command_line(command),
            (None, None) => Vec::new(),
        }
    }
}

/// Split a command line, honouring single and double quotes and `\"` escapes
pub fn split_command_line(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', q) if q != Some('\'') && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
                in_arg = true;
            }
            ('"' | '\'', None) => {
                quote = Some(c);
                in_arg = true;
            }
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (c, _) => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

/// Parse database content into entries
pub fn parse_database(path: &Path, content: &str) -> ResolutionResult<Vec<CompilationDatabaseEntry>> {
    serde_json::from_str(content).map_err(|e| ResolutionError::malformed(path, e.to_string()))
}

/// Finds the compilation database entry that applies to a file
pub struct CompilationEntryResolver {
    locator: CompilationDatabaseLocator,
    fs: Arc<dyn FileSystem>,
}

impl CompilationEntryResolver {
    pub fn new(locator: CompilationDatabaseLocator) -> Self {
        Self::with_file_system(locator, Arc::new(RealFileSystem))
    }

    pub fn with_file_system(locator: CompilationDatabaseLocator, fs: Arc<dyn FileSystem>) -> Self {
        Self { locator, fs }
    }

    pub fn locator(&self) -> &CompilationDatabaseLocator {
        &self.locator
    }

    /// Entry for `file_path` in the active configuration's database
    pub fn get_config(&self, file_path: &Path) -> ResolutionResult<Option<CompilationDatabaseEntry>> {
        if file_path.as_os_str().is_empty() {
            return Err(ResolutionError::EmptyFilePath);
        }
        let Some(database) = self.locator.locate()? else {
            return Ok(None);
        };
        self.get_config_from(&database, file_path)
    }

    /// Entry for `file_path` in an explicit database file
    pub fn get_config_from(
        &self,
        database: &Path,
        file_path: &Path,
    ) -> ResolutionResult<Option<CompilationDatabaseEntry>> {
        if file_path.as_os_str().is_empty() {
            return Err(ResolutionError::EmptyFilePath);
        }

        let Some(content) = read_if_present(self.fs.as_ref(), database)? else {
            info!("Compilation database {} is not readable", database.display());
            return Ok(None);
        };

        let entries = match parse_database(database, &content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{e}");
                return Ok(None);
            }
        };
        if entries.is_empty() {
            info!("Compilation database {} has no entries", database.display());
            return Ok(None);
        }

        let found = find_entry(&entries, file_path);
        match &found {
            Some(entry) => debug!(
                "Using entry for '{}' to analyze {}",
                entry.file,
                file_path.display()
            ),
            None => info!(
                "No entry for {} in {}",
                file_path.display(),
                database.display()
            ),
        }
        Ok(found.cloned())
    }
}

/// Pick the entry for `file_path`, applying header fallbacks when it is a header
pub fn find_entry<'a>(
    entries: &'a [CompilationDatabaseEntry],
    file_path: &Path,
) -> Option<&'a CompilationDatabaseEntry> {
    let keyed: Vec<(String, &CompilationDatabaseEntry)> = entries
        .iter()
        .filter(|e| !e.file.is_empty())
        .map(|e| (comparison_key(&e.resolved_file()), e))
        .collect();

    let target = file_path.to_string_lossy();

    match classify(file_path) {
        FileKind::Header => find_for_header(&keyed, &target),
        FileKind::Code | FileKind::Other => {
            let key = comparison_key(&target);
            keyed.iter().find(|(k, _)| *k == key).map(|(_, e)| *e)
        }
    }
}

fn find_for_header<'a>(
    keyed: &[(String, &'a CompilationDatabaseEntry)],
    header: &str,
) -> Option<&'a CompilationDatabaseEntry> {
    let header_key = comparison_key(header);
    let (stem_path, _) = header_key.rsplit_once('.')?;
    let stem_name = file_name_key(stem_path);

    // Same directory, same stem
    for ext in CODE_EXTENSIONS {
        let candidate = format!("{stem_path}.{ext}");
        if let Some((_, entry)) = keyed.iter().find(|(k, _)| *k == candidate) {
            return Some(*entry);
        }
    }

    // Same stem anywhere
    for ext in CODE_EXTENSIONS {
        let candidate = format!("{stem_name}.{ext}");
        if let Some((_, entry)) = keyed.iter().find(|(k, _)| file_name_key(k) == candidate) {
            return Some(*entry);
        }
    }

    // Anything under the header's directory
    if let Some((dir, _)) = header_key.rsplit_once('/') {
        // A header directly under `/` splits off an empty directory
        let dir = if dir.is_empty() && header_key.starts_with('/') {
            "/"
        } else {
            dir
        };
        if let Some((_, entry)) = keyed.iter().find(|(k, _)| is_under_dir(k, dir)) {
            return Some(*entry);
        }
    }

    keyed.first().map(|(_, e)| *e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compdb::macros::MacroEvaluationEngine;
    use crate::compdb::provider::FixedWorkspaceRoot;
    use crate::compdb::provider::testing::FailingFileSystem;
    use crate::config::ResolutionConfig;
    use std::io;

    fn failing_resolver(kind: io::ErrorKind) -> CompilationEntryResolver {
        let fs: Arc<dyn FileSystem> = Arc::new(FailingFileSystem { kind });
        let locator = CompilationDatabaseLocator::with_collaborators(
            &ResolutionConfig::default(),
            Arc::new(FixedWorkspaceRoot::new("/proj")),
            fs.clone(),
            MacroEvaluationEngine::new(),
        );
        CompilationEntryResolver::with_file_system(locator, fs)
    }

    fn entries(files: &[&str]) -> Vec<CompilationDatabaseEntry> {
        files
            .iter()
            .map(|f| CompilationDatabaseEntry::new(*f, "/proj/build", format!("cl.exe /c {f}")))
            .collect()
    }

    fn lookup<'a>(entries: &'a [CompilationDatabaseEntry], path: &str) -> Option<&'a str> {
        find_entry(entries, Path::new(path)).map(|e| e.file())
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("/p/a.H")), FileKind::Header);
        assert_eq!(classify(Path::new("/p/a.hpp")), FileKind::Header);
        assert_eq!(classify(Path::new("/p/a.CPP")), FileKind::Code);
        assert_eq!(classify(Path::new("/p/a.c")), FileKind::Code);
        assert_eq!(classify(Path::new("/p/a.txt")), FileKind::Other);
        assert_eq!(classify(Path::new("/p/Makefile")), FileKind::Other);
    }

    #[test]
    fn code_file_matches_exactly_ignoring_case_and_separators() {
        let db = entries(&["C:\\Proj\\Src\\Main.cpp", "/proj/src/util.cpp"]);
        assert_eq!(lookup(&db, "c:/proj/src/main.CPP"), Some("C:\\Proj\\Src\\Main.cpp"));
        assert_eq!(lookup(&db, "/proj/src/../src/util.cpp"), Some("/proj/src/util.cpp"));
        assert_eq!(lookup(&db, "/proj/src/other.cpp"), None);
    }

    #[test]
    fn relative_files_resolve_against_directory() {
        let db = vec![CompilationDatabaseEntry::new("../src/a.cpp", "/proj/build", "cc a.cpp")];
        assert_eq!(lookup(&db, "/proj/src/a.cpp"), Some("../src/a.cpp"));
    }

    #[test]
    fn header_prefers_same_directory_sibling() {
        let db = entries(&["/proj/other/widget.cpp", "/proj/src/widget.cc", "/proj/src/widget.c"]);
        assert_eq!(lookup(&db, "/proj/src/widget.h"), Some("/proj/src/widget.cc"));
    }

    #[test]
    fn header_sibling_follows_extension_priority() {
        let db = entries(&["/proj/src/widget.c", "/proj/src/widget.cpp"]);
        assert_eq!(lookup(&db, "/proj/src/widget.hpp"), Some("/proj/src/widget.cpp"));
    }

    #[test]
    fn header_falls_back_to_same_name_elsewhere() {
        let db = entries(&["/proj/src/main.cpp", "/proj/impl/Widget.CPP"]);
        assert_eq!(lookup(&db, "/proj/include/widget.h"), Some("/proj/impl/Widget.CPP"));
    }

    #[test]
    fn header_falls_back_to_file_under_its_directory() {
        let db = entries(&["/proj/app/main.cpp", "/proj/lib/nested/impl.cpp"]);
        assert_eq!(lookup(&db, "/proj/lib/api.h"), Some("/proj/lib/nested/impl.cpp"));
    }

    #[test]
    fn header_at_filesystem_root_searches_whole_tree() {
        let db = vec![
            CompilationDatabaseEntry::new("x.cpp", "", "cc -c x.cpp"),
            CompilationDatabaseEntry::new("/a/b.cpp", "/a", "cc -c b.cpp"),
        ];
        assert_eq!(lookup(&db, "/api.h"), Some("/a/b.cpp"));
    }

    #[test]
    fn header_falls_back_to_first_entry_with_file() {
        let mut db = vec![CompilationDatabaseEntry::new("", "/proj", "cc")];
        db.extend(entries(&["/proj/app/main.cpp", "/proj/app/other.cpp"]));
        assert_eq!(lookup(&db, "/elsewhere/api.h"), Some("/proj/app/main.cpp"));
    }

    #[test]
    fn header_without_any_named_entry_is_none() {
        let db = vec![CompilationDatabaseEntry::new("", "/proj", "cc")];
        assert_eq!(lookup(&db, "/proj/api.h"), None);
    }

    #[test]
    fn splits_quoted_command_lines() {
        assert_eq!(
            split_command_line(r#"clang++ -DNAME="a b" -I "C:\Program Files\inc" 'x y' -c  a.cpp"#),
            vec!["clang++", "-DNAME=a b", "-I", "C:\\Program Files\\inc", "x y", "-c", "a.cpp"]
        );
        assert_eq!(
            split_command_line(r#"cc -DQ=\"v\" """#),
            vec!["cc", "-DQ=\"v\"", ""]
        );
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn arguments_prefer_explicit_array() {
        let db: Vec<CompilationDatabaseEntry> = serde_json::from_str(
            r#"[{"file": "a.c", "directory": "/p", "arguments": ["cc", "-c", "a.c"], "command": "ignored"}]"#,
        )
        .unwrap();
        assert_eq!(db[0].arguments(), vec!["cc", "-c", "a.c"]);
        assert_eq!(db[0].file_path(), PathBuf::from("/p/a.c"));
    }

    #[test]
    fn parse_error_is_malformed() {
        let err = parse_database(Path::new("compile_commands.json"), "{}").unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed { .. }));
    }

    #[test]
    fn critical_database_read_propagates() {
        let resolver = failing_resolver(io::ErrorKind::OutOfMemory);

        let err = resolver.get_config(Path::new("/proj/a.cpp")).unwrap_err();
        assert!(err.is_critical());

        let err = resolver
            .get_config_from(
                Path::new("/proj/build/compile_commands.json"),
                Path::new("/proj/a.cpp"),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), "CRITICAL_IO_ERROR");
    }

    #[test]
    fn unreadable_database_is_not_found() {
        let resolver = failing_resolver(io::ErrorKind::PermissionDenied);

        assert_eq!(resolver.get_config(Path::new("/proj/a.cpp")).unwrap(), None);
    }
}
