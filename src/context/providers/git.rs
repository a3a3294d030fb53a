use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

use super::{present, ContextProvider, ProviderInput};
use crate::context::models::{ContextKind, GitContext, SubContext};
use crate::error::ShellError;
use crate::settings::GitSearchSettings;
use crate::shell::CommandRunner;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

fn porcelain_entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Leading blank of the first entry may be trimmed away.
        Regex::new(r"^[ MTADRCU?!]?[MTADRCU?!] \S").expect("porcelain entry pattern is valid")
    })
}

/// True when `git status --porcelain` output lists at least one path. Warnings
/// folded in from stderr do not count.
pub fn has_porcelain_entries(output: &str) -> bool {
    output
        .lines()
        .any(|line| porcelain_entry_pattern().is_match(line))
}

/// Reports branch, commit, remote and cleanliness of the first repository found
/// under a fixed set of project roots.
pub struct GitContextProvider {
    shell: Arc<dyn CommandRunner>,
    search: GitSearchSettings,
}

impl GitContextProvider {
    pub fn new(shell: Arc<dyn CommandRunner>, search: GitSearchSettings) -> Self {
        Self { shell, search }
    }

    async fn describe(&self, repo: &Path) -> GitContext {
        let shell = self.shell.as_ref();
        let (branch, commit, remote_url, status) = tokio::join!(
            shell.execute("git rev-parse --abbrev-ref HEAD", Some(repo)),
            shell.execute("git rev-parse --short HEAD", Some(repo)),
            shell.execute("git config --get remote.origin.url", Some(repo)),
            shell.execute("git status --porcelain", Some(repo)),
        );

        let status = match status {
            Ok(output) if has_porcelain_entries(&output) => Some("dirty".to_string()),
            Ok(_) | Err(ShellError::EmptyOutput) => Some("clean".to_string()),
            Err(_) => None,
        };

        GitContext {
            branch: present(branch),
            commit: present(commit),
            remote_url: present(remote_url),
            status,
        }
    }
}

#[async_trait]
impl ContextProvider for GitContextProvider {
    fn kind(&self) -> ContextKind {
        ContextKind::Git
    }

    async fn capture(&self, _input: &ProviderInput) -> Result<SubContext> {
        let search = self.search.clone();
        let repo = tokio::task::spawn_blocking(move || find_git_repo(&search))
            .await
            .context("git repository search worker failed")?;

        let Some(repo) = repo else {
            log_debug!("no git repository under configured roots");
            return Ok(SubContext::Git(GitContext::default()));
        };

        log_debug!("describing git repository at {}", repo.display());
        Ok(SubContext::Git(self.describe(&repo).await))
    }
}

/// First directory containing a `.git` entry, searching each root in order.
pub fn find_git_repo(search: &GitSearchSettings) -> Option<PathBuf> {
    search.search_roots.iter().find_map(|root| {
        find_git_repo_recursive(root, search.max_depth, search.max_entries_per_dir)
    })
}

fn find_git_repo_recursive(path: &Path, depth: usize, max_entries: usize) -> Option<PathBuf> {
    if depth == 0 {
        return None;
    }

    if path.join(".git").exists() {
        return Some(path.to_path_buf());
    }

    let mut children: Vec<PathBuf> = fs::read_dir(path)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    children.sort();

    children
        .into_iter()
        .take(max_entries)
        .filter(|child| child.is_dir())
        .find_map(|child| find_git_repo_recursive(&child, depth - 1, max_entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::providers::testing::ScriptedShell;

    fn search(root: &Path, max_depth: usize) -> GitSearchSettings {
        GitSearchSettings {
            search_roots: vec![root.to_path_buf()],
            max_depth,
            max_entries_per_dir: 10,
        }
    }

    #[test]
    fn finds_repository_within_depth() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("projects").join("app");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(find_git_repo(&search(dir.path(), 2)), None);
        assert_eq!(find_git_repo(&search(dir.path(), 3)), Some(repo));
    }

    #[test]
    fn skips_hidden_directories_and_missing_roots() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".cache").join("repo").join(".git")).unwrap();

        let mut settings = search(dir.path(), 3);
        settings.search_roots.insert(0, dir.path().join("missing"));
        assert_eq!(find_git_repo(&settings), None);
    }

    #[test]
    fn root_itself_can_be_the_repository() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        assert_eq!(
            find_git_repo(&search(dir.path(), 1)),
            Some(dir.path().to_path_buf())
        );
    }

    #[tokio::test]
    async fn no_repository_means_no_commands() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Arc::new(ScriptedShell::new());
        let provider = GitContextProvider::new(shell.clone(), search(dir.path(), 2));

        let context = provider.capture(&ProviderInput::default()).await.unwrap();

        assert_eq!(context, SubContext::Git(GitContext::default()));
        assert!(shell.calls().is_empty());
    }

    #[tokio::test]
    async fn describes_discovered_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("trace");
        fs::create_dir_all(repo.join(".git")).unwrap();

        let shell = Arc::new(
            ScriptedShell::new()
                .respond("--abbrev-ref", Ok("main".into()))
                .respond("--short", Ok("a1b2c3d".into()))
                .respond("remote.origin.url", Err(ShellError::ExecutionFailed(1)))
                .respond("status --porcelain", Err(ShellError::EmptyOutput)),
        );
        let provider = GitContextProvider::new(shell.clone(), search(dir.path(), 2));

        let SubContext::Git(context) = provider.capture(&ProviderInput::default()).await.unwrap()
        else {
            panic!("expected git context");
        };

        assert_eq!(context.branch.as_deref(), Some("main"));
        assert_eq!(context.commit.as_deref(), Some("a1b2c3d"));
        assert_eq!(context.remote_url, None);
        assert_eq!(context.status.as_deref(), Some("clean"));

        let calls = shell.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|(_, dir)| dir.as_deref() == Some(repo.as_path())));
    }

    #[tokio::test]
    async fn porcelain_output_marks_repository_dirty() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        let shell = Arc::new(ScriptedShell::new().respond("status", Ok(" M src/lib.rs".into())));
        let provider = GitContextProvider::new(shell, search(dir.path(), 1));

        let SubContext::Git(context) = provider.capture(&ProviderInput::default()).await.unwrap()
        else {
            panic!("expected git context");
        };
        assert_eq!(context.status.as_deref(), Some("dirty"));
        assert_eq!(context.branch, None);
    }

    #[test]
    fn porcelain_entries_ignore_stderr_noise() {
        assert!(has_porcelain_entries("M src/lib.rs"));
        assert!(has_porcelain_entries("MM Cargo.toml\n?? notes.txt"));
        assert!(has_porcelain_entries(
            "warning: unable to access '/root/.config/git/attributes': Permission denied\n M README.md"
        ));
        assert!(!has_porcelain_entries(
            "warning: unable to access '/root/.config/git/attributes': Permission denied"
        ));
        assert!(!has_porcelain_entries("fatal: not a git repository"));
    }

    #[tokio::test]
    async fn warnings_alone_leave_repository_clean() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        let shell = Arc::new(ScriptedShell::new().respond(
            "status",
            Ok("warning: unable to access '/root/.config/git/attributes': Permission denied".into()),
        ));
        let provider = GitContextProvider::new(shell, search(dir.path(), 1));

        let SubContext::Git(context) = provider.capture(&ProviderInput::default()).await.unwrap()
        else {
            panic!("expected git context");
        };
        assert_eq!(context.status.as_deref(), Some("clean"));
    }
}
