use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detectors::ast::unitdelta::MatchPolicy;
use crate::detectors::language::{test_extension, Dialect};
use crate::error::{Result, SyncError};
use crate::llm::fence::default_languages;
use crate::llm::backend::GenerationRequest;
use crate::llm::prompt::{build_prompt, LlmPrompt, DEFAULT_FRAMEWORK};
use crate::testgen::cache::{FingerprintStore, DEFAULT_CACHE_DIR};
use crate::testgen::suite::MergeOptions;

pub const LOCAL_CONFIG: &str = "testsync.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub framework: String,
    pub group_callees: Vec<String>,
    pub match_policy: MatchPolicy,
    pub fence_languages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            output_dir: PathBuf::from("__tests__"),
            framework: DEFAULT_FRAMEWORK.to_string(),
            group_callees: vec!["describe".to_string()],
            match_policy: MatchPolicy::default(),
            fence_languages: default_languages(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    let mut dir = dirs::config_dir()?;
    dir.push("testsync");
    dir.push("config.toml");
    Some(dir)
}

impl Config {
    /// Explicit path, then `./testsync.toml`, then the user config dir, then
    /// defaults. Environment overrides apply last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidates = [Some(PathBuf::from(LOCAL_CONFIG)), user_config_path()];
                match candidates.into_iter().flatten().find(|p| p.is_file()) {
                    Some(path) => Self::from_file(&path)?,
                    None => Self::default(),
                }
            }
        };

        if let Some(dir) = env("TESTSYNC_CACHE_DIR").filter(|v| !v.is_empty()) {
            cfg.cache_dir = PathBuf::from(dir);
        }
        if let Some(fw) = env("TESTSYNC_FRAMEWORK").filter(|v| !v.is_empty()) {
            cfg.framework = fw;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = toml::from_str(&raw)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn store(&self) -> FingerprintStore {
        FingerprintStore::new(&self.cache_dir)
    }

    /// Merge conventions for a suite file at `suite_path`.
    pub fn merge_options(&self, suite_path: &Path) -> MergeOptions {
        MergeOptions {
            group_callees: self.group_callees.clone(),
            dialect: Dialect::from_path(suite_path),
            ..MergeOptions::default()
        }
    }

    /// `__tests__/<stem>.test.<ext>` for a source file.
    pub fn test_path_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        self.output_dir
            .join(format!("{}.test.{}", stem, test_extension(source)))
    }

    /// The suite a merge writes to: an explicit path wins, otherwise the
    /// conventional test path of `source`.
    pub fn suite_path(&self, into: Option<&Path>, source: Option<&Path>) -> Result<PathBuf> {
        match (into, source) {
            (Some(path), _) => Ok(path.to_path_buf()),
            (None, Some(source)) => Ok(self.test_path_for(source)),
            (None, None) => Err(SyncError::Config(
                "no target suite: pass --into <suite> or --for <source>".into(),
            )),
        }
    }

    /// Prompt for one unit in the configured test framework.
    pub fn prompt_for(&self, request: &GenerationRequest<'_>) -> LlmPrompt {
        build_prompt(request, &self.framework)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testsync.toml");
        fs::write(&path, "framework = \"mocha\"\nmatch_policy = \"name-and-kind\"\n").unwrap();

        let cfg = Config::load_with(Some(path.as_path()), no_env).unwrap();
        assert_eq!(cfg.framework, "mocha");
        assert_eq!(cfg.match_policy, MatchPolicy::NameAndKind);
        assert_eq!(cfg.cache_dir, PathBuf::from(".testgen_cache"));
        assert_eq!(cfg.group_callees, vec!["describe"]);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "cache_dir = \"from-file\"\n").unwrap();

        let env: HashMap<&str, &str> = [("TESTSYNC_CACHE_DIR", "/tmp/elsewhere"), ("TESTSYNC_FRAMEWORK", "vitest")]
            .into_iter()
            .collect();
        let cfg = Config::load_with(Some(path.as_path()), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(cfg.framework, "vitest");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "group_callees = 3\n").unwrap();
        assert!(matches!(
            Config::load_with(Some(path.as_path()), no_env),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn suite_path_prefers_into_then_source() {
        let cfg = Config {
            output_dir: PathBuf::from("spec"),
            ..Config::default()
        };
        assert_eq!(
            cfg.suite_path(Some(Path::new("t/x.test.js")), Some(Path::new("src/x.js")))
                .unwrap(),
            PathBuf::from("t/x.test.js")
        );
        assert_eq!(
            cfg.suite_path(None, Some(Path::new("src/x.jsx"))).unwrap(),
            PathBuf::from("spec/x.test.jsx")
        );
        assert!(matches!(cfg.suite_path(None, None), Err(SyncError::Config(_))));
    }

    #[test]
    fn prompt_uses_the_configured_framework() {
        use crate::detectors::ast::catalog::{CallableUnit, UnitKind};

        let cfg = Config {
            framework: "mocha".into(),
            ..Config::default()
        };
        let unit = CallableUnit::new("f", UnitKind::Function, 1);
        let request = GenerationRequest {
            source_path: None,
            source: "function f() {}",
            unit: &unit,
            known: &[],
        };
        assert!(cfg.prompt_for(&request).user.contains("Test Framework: mocha"));
    }

    #[test]
    fn test_path_keeps_the_source_flavour() {
        let cfg = Config::default();
        assert_eq!(
            cfg.test_path_for(Path::new("src/greeter.ts")),
            PathBuf::from("__tests__/greeter.test.ts")
        );
        assert_eq!(
            cfg.test_path_for(Path::new("lib/util.mjs")),
            PathBuf::from("__tests__/util.test.mjs")
        );
    }
}
