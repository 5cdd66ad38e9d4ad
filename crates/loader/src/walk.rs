use std::collections::{HashSet, VecDeque};
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Breadth-first walk below `root`. Symlinks are never followed and
/// unreadable entries are skipped. `skip` sees every entry below the root
/// together with its file type; returning `true` drops the entry (and the
/// whole subtree for directories). Directory entries are visited in name
/// order so the walk is reproducible.
pub fn visit<F, C>(root: &Path, skip: &F, callback: &mut C) -> anyhow::Result<()>
where
    F: Fn(&Path, &FileType) -> bool,
    C: FnMut(&Path) -> anyhow::Result<()>,
{
    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    pending.push_back(root.to_path_buf());

    while let Some(current) = pending.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let metadata = match fs::symlink_metadata(&current) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %current.display(), "Permission denied");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            debug!(path = %current.display(), "Symlink skipped");
            continue;
        }
        if current != root && skip(&current, &file_type) {
            debug!(path = %current.display(), "Path excluded");
            continue;
        }
        if file_type.is_file() {
            callback(&current)?;
        } else if file_type.is_dir() {
            let entries = match fs::read_dir(&current) {
                Ok(e) => e,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    debug!(path = %current.display(), "Permission denied");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let mut children = Vec::new();
            for entry in entries {
                match entry {
                    Ok(e) => children.push(e.path()),
                    Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                        debug!(path = %current.display(), "Permission denied");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            children.sort();
            pending.extend(children);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::visit;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn walk(base: &Path, skip: &dyn Fn(&Path, &fs::FileType) -> bool) -> BTreeSet<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut cb = |p: &Path| {
            seen.insert(p.strip_prefix(base).unwrap().to_path_buf());
            Ok(())
        };
        visit(base, &|p: &Path, t: &fs::FileType| skip(p, t), &mut cb).unwrap();
        seen
    }

    #[test]
    fn visits_nested_directories() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("a/b")).unwrap();
        fs::write(base.join("root.txt"), b"").unwrap();
        fs::write(base.join("a/file.txt"), b"").unwrap();
        fs::write(base.join("a/b/leaf.txt"), b"").unwrap();

        let expected: BTreeSet<PathBuf> = ["root.txt", "a/file.txt", "a/b/leaf.txt"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(walk(base, &|_, _| false), expected);
    }

    #[test]
    fn skipped_directories_prune_their_subtree() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("target/classes")).unwrap();
        fs::write(base.join("target/classes/A.java"), b"").unwrap();
        fs::write(base.join("target.txt"), b"").unwrap();

        let seen = walk(base, &|p, t| t.is_dir() && p.ends_with("target"));
        assert_eq!(seen, BTreeSet::from([PathBuf::from("target.txt")]));
    }

    #[cfg(unix)]
    #[test]
    fn terminates_on_symlink_loop() {
        use std::os::unix::fs as unix_fs;

        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("a")).unwrap();
        fs::write(base.join("root.txt"), b"").unwrap();
        fs::write(base.join("a/file.txt"), b"").unwrap();
        unix_fs::symlink(base, base.join("a/loop")).unwrap();

        let expected: BTreeSet<PathBuf> = ["root.txt", "a/file.txt"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(walk(base, &|_, _| false), expected);
    }
}
