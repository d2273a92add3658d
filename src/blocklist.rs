use crate::error::Error;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// The persisted set of suspended client names.
///
/// Backed by a flat text file, one name per line, read in full on every
/// operation so the file stays the source of truth. Every
/// read-modify-write runs under an exclusive lock, so two concurrent
/// suspend/unsuspend calls cannot lose an update. Insertion order is
/// preserved across mutations.
pub struct Blocklist {
  path: PathBuf,
  lock: Mutex<()>,
}

impl Blocklist {
  pub fn new(path: PathBuf) -> Self {
    Blocklist {
      path,
      lock: Mutex::new(()),
    }
  }

  /// Read the block-list, preserving order. A missing file is an empty
  /// list; blank lines are skipped.
  pub async fn load(&self) -> Result<Vec<String>, Error> {
    let raw = match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => raw,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(vec![]);
      }
      Err(err) => return Err(err.into()),
    };
    Ok(
      raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect(),
    )
  }

  pub async fn contains(&self, name: &str) -> Result<bool, Error> {
    Ok(self.load().await?.iter().any(|entry| entry == name))
  }

  /// Add `name` to the set. Returns `false` without touching the file
  /// when the name is already present.
  pub async fn add(&self, name: &str) -> Result<bool, Error> {
    let _guard = self.lock.lock().await;
    let mut names = self.load().await?;
    if names.iter().any(|entry| entry == name) {
      debug!(name, "already in block-list");
      return Ok(false);
    }
    names.push(name.to_string());
    self.save(&names).await?;
    Ok(true)
  }

  /// Remove `name` from the set. Returns `false` when the name was not
  /// present or the file does not exist.
  pub async fn remove(&self, name: &str) -> Result<bool, Error> {
    let _guard = self.lock.lock().await;
    let names = self.load().await?;
    let remaining: Vec<String> = names
      .iter()
      .filter(|entry| entry.as_str() != name)
      .cloned()
      .collect();
    if remaining.len() == names.len() {
      return Ok(false);
    }
    self.save(&remaining).await?;
    Ok(true)
  }

  /// Overwrite the file: one name per line, trailing newline iff the set
  /// is non-empty. The file is created if missing.
  async fn save(&self, names: &[String]) -> Result<(), Error> {
    let mut contents = names.join("\n");
    if !names.is_empty() {
      contents.push('\n');
    }
    tokio::fs::write(&self.path, contents).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_blocklist(dir: &tempfile::TempDir) -> Blocklist {
    Blocklist::new(dir.path().join("blocked_clients.txt"))
  }

  #[tokio::test]
  async fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist = scratch_blocklist(&dir);
    assert_eq!(blocklist.load().await.unwrap(), Vec::<String>::new());
    assert!(!blocklist.contains("alice").await.unwrap());
  }

  #[tokio::test]
  async fn test_add_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist = scratch_blocklist(&dir);

    assert!(blocklist.add("alice").await.unwrap());
    assert!(!blocklist.add("alice").await.unwrap());
    assert_eq!(blocklist.load().await.unwrap(), vec!["alice"]);
  }

  #[tokio::test]
  async fn test_remove_absent_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist = scratch_blocklist(&dir);

    assert!(!blocklist.remove("alice").await.unwrap());

    blocklist.add("alice").await.unwrap();
    blocklist.add("bob").await.unwrap();
    assert!(!blocklist.remove("carol").await.unwrap());
    assert_eq!(blocklist.load().await.unwrap(), vec!["alice", "bob"]);
  }

  #[tokio::test]
  async fn test_insertion_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist = scratch_blocklist(&dir);

    blocklist.add("carol").await.unwrap();
    blocklist.add("alice").await.unwrap();
    blocklist.add("bob").await.unwrap();
    blocklist.remove("alice").await.unwrap();
    blocklist.add("alice").await.unwrap();

    assert_eq!(blocklist.load().await.unwrap(), vec!["carol", "bob", "alice"]);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn test_concurrent_mutation_loses_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist = std::sync::Arc::new(scratch_blocklist(&dir));

    let mut tasks = Vec::new();
    for i in 0..16 {
      let blocklist = blocklist.clone();
      tasks.push(tokio::spawn(async move {
        blocklist.add(&format!("client-{}", i)).await.unwrap();
      }));
    }
    for task in tasks {
      task.await.unwrap();
    }

    let mut names = blocklist.load().await.unwrap();
    names.sort();
    let mut expected: Vec<String> =
      (0..16).map(|i| format!("client-{}", i)).collect();
    expected.sort();
    assert_eq!(names, expected);

    // Mixed adds and removes racing against the same file.
    let mut tasks = Vec::new();
    for i in 0..16 {
      let blocklist = blocklist.clone();
      tasks.push(tokio::spawn(async move {
        if i % 2 == 0 {
          assert!(blocklist.remove(&format!("client-{}", i)).await.unwrap());
        } else {
          assert!(!blocklist.add(&format!("client-{}", i)).await.unwrap());
        }
      }));
    }
    for task in tasks {
      task.await.unwrap();
    }

    let names = blocklist.load().await.unwrap();
    assert_eq!(names.len(), 8);
    assert!(names.iter().all(|name| {
      let i: u32 = name.trim_start_matches("client-").parse().unwrap();
      i % 2 == 1
    }));
  }

  #[tokio::test]
  async fn test_trailing_newline_iff_non_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocked_clients.txt");
    let blocklist = Blocklist::new(path.clone());

    blocklist.add("alice").await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "alice\n");

    blocklist.remove("alice").await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
  }

  #[tokio::test]
  async fn test_blank_lines_skipped_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocked_clients.txt");
    std::fs::write(&path, "alice\n\nbob\n   \n").unwrap();

    let blocklist = Blocklist::new(path);
    assert_eq!(blocklist.load().await.unwrap(), vec!["alice", "bob"]);
  }
}
