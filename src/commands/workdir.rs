use crate::error::{RatingError, Result};
use git2::build::RepoBuilder;
use git2::{Direction, FetchOptions, Remote};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const WORKDIR_PREFIX: &str = "trustgate-";

#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    // <root>/trustgate-<unix millis>-<uuid>
    pub fn allocate(root: &Path) -> Result<Self> {
        let name = format!(
            "{WORKDIR_PREFIX}{}-{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        );
        let path = root.join(name);

        fs::create_dir_all(root)?;
        // create_dir (not _all) so an existing directory is never adopted.
        fs::create_dir(&path)?;
        log::debug!("allocated working directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clone_path(&self) -> PathBuf {
        self.path.join("repo")
    }

    // Without a branch the remote's HEAD branch is cloned. Depth 0 is full history.
    pub fn clone_repository(&self, url: &str, branch: Option<&str>, depth: u32) -> Result<PathBuf> {
        let target = self.clone_path();
        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => remote_head_branch(url)?,
        };

        let mut fetch = FetchOptions::new();
        if depth > 0 {
            fetch.depth(depth as i32);
        }

        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch);
        builder.branch(&branch);
        builder.remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        builder
            .clone(url, &target)
            .map_err(|e| RatingError::resolution(format!("clone of {url} failed: {e}")))?;
        log::info!("cloned {url} ({branch}) into {}", target.display());
        Ok(target)
    }
}

fn remote_head_branch(url: &str) -> Result<String> {
    let unreachable = |e: git2::Error| RatingError::resolution(format!("cannot reach {url}: {e}"));

    let mut remote = Remote::create_detached(url).map_err(unreachable)?;
    remote.connect(Direction::Fetch).map_err(unreachable)?;
    let head = remote.default_branch().map_err(unreachable)?;
    let branch = head
        .as_str()
        .and_then(|name| name.strip_prefix("refs/heads/"))
        .map(str::to_string)
        .ok_or_else(|| RatingError::resolution(format!("{url} has no default branch")));
    let _ = remote.disconnect();
    branch
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        match force_remove_dir(&self.path) {
            Ok(()) => log::debug!("removed working directory {}", self.path.display()),
            Err(e) => log::error!("failed to remove working directory {}: {e}", self.path.display()),
        }
    }
}

// Retries after clearing read-only bits, which git sets on pack files.
pub fn force_remove_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(_) => make_writable(path),
    }
    fs::remove_dir_all(path)
}

fn make_writable(path: &Path) {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return;
    };
    if metadata.file_type().is_symlink() {
        return;
    }

    let mut permissions = metadata.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    let _ = fs::set_permissions(path, permissions);

    if metadata.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                make_writable(&entry.path());
            }
        }
    }
}
