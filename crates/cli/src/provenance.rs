use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Sidecar written next to every layout produced by `move` or `rotate`.
#[derive(Debug, Serialize)]
pub struct Sidecar {
    pub code_rev: String,
    pub engine_version: &'static str,
    pub command: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: Value,
}

impl Sidecar {
    pub fn new(command: &'static str, input: &Path, output: &Path, params: Value) -> Self {
        Self {
            code_rev: code_rev(),
            engine_version: beamfold::VERSION,
            command,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            params,
        }
    }

    /// Write to `<output stem>.provenance.json` and return that path.
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.output.with_extension("provenance.json");
        fs::write(&path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// `GIT_COMMIT` from the environment, else `git rev-parse HEAD`, else "unknown".
fn code_rev() -> String {
    std::env::var("GIT_COMMIT")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| {
            let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
            out.status
                .success()
                .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("moved.json");
        let sidecar = Sidecar::new("move", Path::new("bench.json"), &out, json!({"component": "m1"}));
        let path = sidecar.write().unwrap();
        assert_eq!(path, dir.path().join("moved.provenance.json"));

        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "move");
        assert_eq!(parsed["input"], "bench.json");
        assert_eq!(parsed["params"]["component"], "m1");
        assert_eq!(parsed["engine_version"], beamfold::VERSION);
        assert_eq!(parsed["output"], out.to_string_lossy().as_ref());
        assert!(!parsed["code_rev"].as_str().unwrap().is_empty());
    }
}
