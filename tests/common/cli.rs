use std::fs;
use std::path::PathBuf;
use std::process::ExitStatus;

use assert_cmd::Command;
use tempfile::TempDir;

use super::{SCHEMA, SEED};

pub const CONFIG: &str = "\
database: test.db
tables:
  RelatedObjects:
    soft_delete: {}
    relations:
      testObjects:
        kind: many_to_many
        table: TestObjects
        from: id
        through: { table: JoinTable, from: relatedObjectId, to: testObjectId }
        to: id
  TestObjects:
    soft_delete: {}
  JoinTable: {}
";

/// A temp directory holding `softdel.yaml` and a seeded `test.db`.
pub struct SdWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl SdWorkspace {
    pub fn new() -> Self {
        Self::with_config(CONFIG)
    }

    pub fn with_config(config: &str) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        fs::write(root.join("softdel.yaml"), config).expect("write config");
        let db = softdel::Database::open(root.join("test.db")).expect("open db");
        db.execute_batch(SCHEMA).expect("create schema");
        db.execute_batch(SEED).expect("seed rows");
        Self { temp_dir, root }
    }
}

#[derive(Debug)]
pub struct SdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_sd<I, S>(workspace: &SdWorkspace, args: I, label: &str) -> SdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::cargo_bin("sd")
        .expect("sd binary")
        .current_dir(&workspace.root)
        .args(args)
        .env_remove("SOFTDEL_DB")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|err| panic!("{label}: failed to run sd: {err}"));
    SdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

pub fn run_sd_json<I, S>(workspace: &SdWorkspace, args: I, label: &str) -> serde_json::Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut all: Vec<std::ffi::OsString> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect();
    all.push("--json".into());
    let output = run_sd(workspace, all, label);
    assert!(
        output.status.success(),
        "{label} failed: {}",
        output.stderr
    );
    serde_json::from_str(&output.stdout)
        .unwrap_or_else(|err| panic!("{label}: invalid JSON ({err}): {}", output.stdout))
}
