//! Provenance sidecars for reports written to disk.
//!
//! Every JSON report written with `--out` gets a `<stem>.provenance.json`
//! next to it recording the code revision, the engine version, the call site
//! and the parameters that produced it.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Write `report` to `out` as pretty JSON, then its sidecar. Returns the
/// sidecar path.
#[track_caller]
pub fn write_with_sidecar(out: &Path, report: &Value, params: Value) -> Result<PathBuf> {
    let callsite = Location::caller();
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(out, serde_json::to_vec_pretty(report)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let sidecar = sidecar_path(out);
    let doc = json!({
        "code_rev": current_git_rev(),
        "flipper_version": flipper::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": params,
        "outputs": [out.to_string_lossy()]
    });
    fs::write(&sidecar, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", sidecar.display()))?;
    Ok(sidecar)
}

fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("report"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// `GIT_COMMIT` at build time, then at run time, then `git rev-parse HEAD`.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|r| !r.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_report() {
        let derived = sidecar_path(Path::new("/tmp/out/s_1_1.json"));
        assert_eq!(derived, Path::new("/tmp/out/s_1_1.provenance.json"));
    }

    #[test]
    fn writes_report_and_sidecar() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("report.json");
        let report = json!({"kind": "periodic", "order": 3});
        let sidecar = write_with_sidecar(&out, &report, json!({"word": "ab"})).unwrap();
        let written: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(written, report);
        let parsed: Value = serde_json::from_slice(&fs::read(sidecar).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], out.to_string_lossy().as_ref());
        assert_eq!(parsed["params"]["word"], "ab");
        assert_eq!(parsed["flipper_version"], flipper::VERSION);
    }
}
