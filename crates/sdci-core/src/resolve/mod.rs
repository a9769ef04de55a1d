use std::path::PathBuf;

use sdci_model::TaskName;
use tracing::trace;

use crate::error::CoreError;

const SCRIPT_EXTENSION: &str = "sh";

/// A resolved task: a valid name bound to an existing script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: TaskName,
    pub script: PathBuf,
}

/// Maps task names to `<tasks_dir>/<name>.sh`.
///
/// Existence is checked on every call; nothing is cached.
#[derive(Debug, Clone)]
pub struct TaskResolver {
    tasks_dir: PathBuf,
}

impl TaskResolver {
    pub fn new(tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks_dir: tasks_dir.into(),
        }
    }

    /// Script location for `name`, whether or not it exists.
    pub fn script_path(&self, name: &TaskName) -> PathBuf {
        self.tasks_dir
            .join(format!("{}.{SCRIPT_EXTENSION}", name.as_str()))
    }

    pub fn resolve(&self, name: &str) -> Result<Task, CoreError> {
        let name = TaskName::new(name).map_err(|e| CoreError::TaskNotFound(e.to_string()))?;
        let script = self.script_path(&name);

        match std::fs::metadata(&script) {
            Ok(meta) if meta.is_file() => {
                trace!(
                    target: "sdci.core.resolve",
                    task = %name,
                    script = %script.display(),
                    "task resolved"
                );
                Ok(Task { name, script })
            }
            _ => Err(CoreError::TaskNotFound(format!(
                "shell file not found on server: {}",
                script.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(scripts: &[&str]) -> (tempfile::TempDir, TaskResolver) {
        let dir = tempfile::tempdir().unwrap();
        for s in scripts {
            std::fs::write(dir.path().join(format!("{s}.sh")), "echo hi\n").unwrap();
        }
        let resolver = TaskResolver::new(dir.path());
        (dir, resolver)
    }

    #[test]
    fn resolves_existing_script() {
        let (dir, resolver) = resolver_with(&["deploy"]);
        let task = resolver.resolve("deploy").unwrap();
        assert_eq!(task.name.as_str(), "deploy");
        assert_eq!(task.script, dir.path().join("deploy.sh"));
    }

    #[test]
    fn missing_script_is_not_found() {
        let (_dir, resolver) = resolver_with(&["deploy"]);
        let err = resolver.resolve("ghost").unwrap_err();
        assert!(matches!(err, CoreError::TaskNotFound(msg) if msg.contains("ghost.sh")));
    }

    #[test]
    fn invalid_name_is_not_found() {
        let (_dir, resolver) = resolver_with(&["deploy"]);
        assert!(matches!(
            resolver.resolve("../deploy"),
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn directory_is_not_a_script() {
        let (dir, resolver) = resolver_with(&[]);
        std::fs::create_dir(dir.path().join("weird.sh")).unwrap();
        assert!(resolver.resolve("weird").is_err());
    }

    #[test]
    fn existence_is_rechecked() {
        let (dir, resolver) = resolver_with(&["deploy"]);
        assert!(resolver.resolve("deploy").is_ok());

        std::fs::remove_file(dir.path().join("deploy.sh")).unwrap();
        assert!(resolver.resolve("deploy").is_err());
    }
}
