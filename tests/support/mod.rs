use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for daymerge with the directory variables cleared
pub fn daymerge() -> Command {
    let mut cmd = cargo_bin_cmd!("daymerge");
    cmd.env_remove("NOTES_DIR")
        .env_remove("NOTES_QUARTER")
        .env_remove("OUTPUT_DIR")
        .env_remove("DAYMERGE_CONFIG")
        .env_remove("DAYMERGE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// A temporary notes tree with an output directory beside it
pub struct Vault {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Vault {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn notes(&self) -> PathBuf {
        self.dir.path().join("notes")
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Write a file relative to the notes directory
    pub fn write(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.notes().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read_out(&self, name: &str) -> String {
        fs::read_to_string(self.out().join(name)).unwrap()
    }

    pub fn assets(&self) -> Vec<PathBuf> {
        list_dir(&self.out().join("_assets"))
    }

    /// Command with `--notes-dir` and `--output-dir` pointing into the vault
    pub fn cmd(&self) -> Command {
        let mut cmd = daymerge();
        cmd.arg("--notes-dir")
            .arg(self.notes())
            .arg("--output-dir")
            .arg(self.out());
        cmd
    }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<_> = entries.map(|e| e.unwrap().path()).collect();
    paths.sort();
    paths
}
