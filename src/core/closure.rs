//! Shared-library closure
//!
//! Starting from the selected executables, every required library name is
//! resolved against an ordered list of search directories and queued for
//! inspection itself. Each name is processed at most once, so the
//! breadth-first walk ends when no new library turns up. A library that
//! cannot be found is fatal; a file whose metadata cannot be read is
//! logged and its dependencies are not scanned.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::ImageError;
use crate::infra::inspect::LibraryInspector;

/// An executable selected for the image
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Executable {
    /// Location in the build tree
    pub path: PathBuf,
    /// Path relative to the build root, kept inside the image
    pub relative: PathBuf,
}

/// Executables plus the complete set of libraries they need
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LibraryClosure {
    /// Selected executables
    pub executables: Vec<Executable>,
    /// Library name -> resolved file
    pub libraries: BTreeMap<String, PathBuf>,
    /// Files whose metadata could not be read
    pub skipped: Vec<PathBuf>,
}

/// Resolve glob patterns (relative to `build_root`) to executable files
///
/// Directories are ignored and a file matched by several patterns is
/// listed once.
pub fn find_executables(
    build_root: &Path,
    patterns: &[String],
) -> Result<Vec<Executable>, ImageError> {
    let mut found = BTreeSet::new();

    for pattern in patterns {
        let root = glob::Pattern::escape(&build_root.to_string_lossy());
        let full = Path::new(&root).join(pattern);
        let paths = glob::glob(&full.to_string_lossy()).map_err(|e| ImageError::Pattern {
            pattern: pattern.clone(),
            error: e.to_string(),
        })?;

        let before = found.len();
        for path in paths.filter_map(Result::ok).filter(|p| p.is_file()) {
            let relative = path
                .strip_prefix(build_root)
                .map_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()), Path::to_path_buf);
            found.insert(Executable { path, relative });
        }

        if found.len() == before {
            tracing::warn!("Executable pattern '{pattern}' matched nothing");
        }
    }

    Ok(found.into_iter().collect())
}

/// First search directory containing `name`
pub fn find_library(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Compute the transitive library closure of `executables`
pub fn resolve_closure(
    executables: Vec<Executable>,
    search_dirs: &[PathBuf],
    inspector: &dyn LibraryInspector,
) -> Result<LibraryClosure, ImageError> {
    let mut closure = LibraryClosure::default();
    let mut queue: VecDeque<PathBuf> = executables.iter().map(|e| e.path.clone()).collect();

    while let Some(binary) = queue.pop_front() {
        let needed = match inspector.needed_libraries(&binary) {
            Ok(needed) => needed,
            Err(e) => {
                tracing::warn!("Skipping dependency scan of {}: {e}", binary.display());
                closure.skipped.push(binary);
                continue;
            }
        };

        for name in needed {
            if closure.libraries.contains_key(&name) {
                continue;
            }
            let path = find_library(&name, search_dirs).ok_or_else(|| {
                ImageError::LibraryNotFound {
                    library: name.clone(),
                    needed_by: binary.clone(),
                }
            })?;
            tracing::debug!("{name} -> {} (needed by {})", path.display(), binary.display());
            closure.libraries.insert(name, path.clone());
            queue.push_back(path);
        }
    }

    closure.executables = executables;
    Ok(closure)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers from a file-name table; unknown files fail like a non-ELF input
    #[derive(Debug, Default)]
    pub(crate) struct FakeInspector {
        needed: HashMap<String, Vec<String>>,
        pub inspected: Mutex<Vec<String>>,
    }

    impl FakeInspector {
        pub(crate) fn new(table: &[(&str, &[&str])]) -> Self {
            Self {
                needed: table
                    .iter()
                    .map(|(file, libs)| {
                        (
                            (*file).to_string(),
                            libs.iter().map(|l| (*l).to_string()).collect(),
                        )
                    })
                    .collect(),
                inspected: Mutex::new(Vec::new()),
            }
        }
    }

    impl LibraryInspector for FakeInspector {
        fn needed_libraries(&self, binary: &Path) -> Result<Vec<String>, ImageError> {
            let file = binary
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.inspected.lock().unwrap().push(file.clone());
            self.needed
                .get(&file)
                .cloned()
                .ok_or_else(|| ImageError::MetadataToolFailure {
                    path: binary.to_path_buf(),
                    error: "not an ELF file".to_string(),
                })
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"\x7fELF").unwrap();
    }

    fn executable(root: &Path, relative: &str) -> Executable {
        let path = root.join(relative);
        touch(&path);
        Executable {
            path,
            relative: PathBuf::from(relative),
        }
    }

    #[test]
    fn test_transitive_libraries_appear_once() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        touch(&lib.join("libl1.so"));
        touch(&lib.join("libl2.so"));

        let inspector = FakeInspector::new(&[
            ("e", &["libl1.so", "libl2.so"]),
            ("f", &["libl2.so"]),
            ("libl1.so", &["libl2.so"]),
            ("libl2.so", &[]),
        ]);

        let closure = resolve_closure(
            vec![executable(temp.path(), "bin/e"), executable(temp.path(), "bin/f")],
            &[lib.clone()],
            &inspector,
        )
        .unwrap();

        assert_eq!(
            closure.libraries.keys().collect::<Vec<_>>(),
            vec!["libl1.so", "libl2.so"]
        );
        assert_eq!(closure.libraries["libl2.so"], lib.join("libl2.so"));

        let inspected = inspector.inspected.lock().unwrap();
        assert_eq!(inspected.iter().filter(|f| *f == "libl2.so").count(), 1);
        assert_eq!(inspected.iter().filter(|f| *f == "libl1.so").count(), 1);
    }

    #[test]
    fn test_search_order_first_match_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("usr/lib");
        let second = temp.path().join("sysroot/lib");
        touch(&first.join("libz.so.1"));
        touch(&second.join("libz.so.1"));
        touch(&second.join("libc.so"));

        let inspector = FakeInspector::new(&[
            ("app", &["libz.so.1", "libc.so"]),
            ("libz.so.1", &[]),
            ("libc.so", &[]),
        ]);

        let closure = resolve_closure(
            vec![executable(temp.path(), "app")],
            &[first.clone(), second.clone()],
            &inspector,
        )
        .unwrap();

        assert_eq!(closure.libraries["libz.so.1"], first.join("libz.so.1"));
        assert_eq!(closure.libraries["libc.so"], second.join("libc.so"));
    }

    #[test]
    fn test_missing_library_is_fatal() {
        let temp = TempDir::new().unwrap();
        let inspector = FakeInspector::new(&[("app", &["libmissing.so"])]);

        match resolve_closure(
            vec![executable(temp.path(), "app")],
            &[temp.path().join("lib")],
            &inspector,
        ) {
            Err(ImageError::LibraryNotFound { library, needed_by }) => {
                assert_eq!(library, "libmissing.so");
                assert!(needed_by.ends_with("app"));
            }
            other => panic!("Expected LibraryNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_metadata_is_skipped() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        touch(&lib.join("libc.so"));

        let inspector = FakeInspector::new(&[("app", &["libc.so"])]);

        let closure = resolve_closure(
            vec![
                executable(temp.path(), "app"),
                executable(temp.path(), "init.sh"),
            ],
            &[lib],
            &inspector,
        )
        .unwrap();

        assert_eq!(closure.executables.len(), 2);
        assert!(closure.libraries.contains_key("libc.so"));
        // init.sh and libc.so (absent from the table) could not be inspected
        assert_eq!(closure.skipped.len(), 2);
    }

    #[test]
    fn test_find_executables_globs() {
        let temp = TempDir::new().unwrap();
        executable(temp.path(), "busybox-1.36/busybox");
        executable(temp.path(), "dropbear-2024/dropbear");
        executable(temp.path(), "dropbear-2024/dbclient");
        std::fs::create_dir_all(temp.path().join("dropbear-2024/dropbear.d")).unwrap();

        let found = find_executables(
            temp.path(),
            &[
                "busybox-*/busybox".to_string(),
                "dropbear-*/d*".to_string(),
                "busybox-1.36/busybox".to_string(),
            ],
        )
        .unwrap();

        let relative: Vec<PathBuf> = found.into_iter().map(|e| e.relative).collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("busybox-1.36/busybox"),
                PathBuf::from("dropbear-2024/dbclient"),
                PathBuf::from("dropbear-2024/dropbear"),
            ]
        );
    }

    #[test]
    fn test_build_root_with_glob_metacharacters() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("work[arm]*?");
        executable(&root, "busybox-1.36/busybox");
        // Would match an unescaped `work[arm]*?` root
        executable(temp.path(), "worka-x/busybox-1.36/busybox");

        let found = find_executables(&root, &["busybox-*/busybox".to_string()]).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, root.join("busybox-1.36/busybox"));
        assert_eq!(found[0].relative, PathBuf::from("busybox-1.36/busybox"));
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            find_executables(temp.path(), &["[".to_string()]),
            Err(ImageError::Pattern { .. })
        ));
    }
}
