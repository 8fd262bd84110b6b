// Shared benchmark helpers
// Functions here are used across different benchmark files
#![allow(dead_code)]

use git2::{Repository, Signature};
use repowarden::repository::Database;
use std::path::PathBuf;
use tempfile::TempDir;

/// Unified diff adding `num_files` new files of `lines_per_file` lines each;
/// every `secret_every`-th line carries an AWS key
pub fn generate_diff(num_files: usize, lines_per_file: usize, secret_every: usize) -> String {
    let mut diff = String::new();

    for f in 0..num_files {
        let path = format!("src/dir_{}/file_{}.py", f % 50, f);
        diff.push_str(&format!("diff --git a/{path} b/{path}\n"));
        diff.push_str("new file mode 100644\n");
        diff.push_str("--- /dev/null\n");
        diff.push_str(&format!("+++ b/{path}\n"));
        diff.push_str(&format!("@@ -0,0 +1,{lines_per_file} @@\n"));

        for l in 0..lines_per_file {
            if secret_every > 0 && (f * lines_per_file + l) % secret_every == 0 {
                diff.push_str(&format!("+aws_key = \"AKIA{:016}\"\n", f * lines_per_file + l));
            } else {
                diff.push_str(&format!("+value_{l} = compute(\"item-{f}-{l}\", retries=3)\n"));
            }
        }
    }
    diff
}

/// Create in-memory database for benchmarks
pub async fn setup_bench_db() -> Database {
    let db = Database::new(":memory:").await.unwrap();
    db.init_schema().await.unwrap();
    db
}

/// Create a temporary git repository for benchmarks
pub fn create_bench_repo() -> (TempDir, PathBuf, Repository) {
    let dir = TempDir::new().unwrap();
    let repo_path = dir.path().to_path_buf();
    let repo = Repository::init(&repo_path).unwrap();

    // Configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Bench User").unwrap();
    config.set_str("user.email", "bench@example.com").unwrap();

    (dir, repo_path, repo)
}

/// Add files and create a commit
pub fn add_commit(repo: &Repository, files: &[(&str, &[u8])], message: &str) -> git2::Oid {
    let sig = Signature::now("Bench User", "bench@example.com").unwrap();
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        let full_path = repo.workdir().unwrap().join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        index.add_path(std::path::Path::new(path)).unwrap();
    }

    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());

    if let Some(parent) = parent {
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent]).unwrap()
    } else {
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[]).unwrap()
    }
}

/// Python source files, a few of them with secrets
pub fn generate_files(num_files: usize) -> Vec<(String, Vec<u8>)> {
    (0..num_files)
        .map(|i| {
            let path = format!("src/dir_{}/file_{}.py", i % 50, i);
            let content = if i % 25 == 0 {
                format!("# File {}\naws_key = \"AKIA{:016}\"\n", i, i)
            } else {
                format!("# File {}\ndef func_{}():\n    return {}\n", i, i, i)
            };
            (path, content.into_bytes())
        })
        .collect()
}
