//! Shell command execution
//!
//! Build actions, patches and the image packager are opaque shell command
//! lines. They run through `sh -c` in a given working directory with the
//! caller's stdout and stderr, so tool output reaches the console as it is
//! produced.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl Exit {
    /// Successful exit
    pub const SUCCESS: Self = Self { code: Some(0) };

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable failure description
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Quote `word` as a single POSIX shell word
///
/// Embedded single quotes become `'\''`.
pub fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Shell execution facility
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `workdir` with extra environment, waiting for it to finish
    fn run(&self, workdir: &Path, command: &str, env: &BTreeMap<String, String>)
        -> io::Result<Exit>;
}

/// Runs commands with the system shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    /// Runner using `sh`
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        workdir: &Path,
        command: &str,
        env: &BTreeMap<String, String>,
    ) -> io::Result<Exit> {
        tracing::debug!("[{}] $ {command}", workdir.display());

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(workdir)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        Ok(Exit {
            code: status.code(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/work/image"), "'/work/image'");
        assert_eq!(shell_quote("/work/it's here"), r"'/work/it'\''s here'");
    }

    #[cfg(unix)]
    #[test]
    fn test_quoted_path_with_quote_reaches_command() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("it's");
        std::fs::create_dir_all(&dir).unwrap();

        let command = format!("touch {}", shell_quote(&dir.join("done").display().to_string()));
        let exit = ShellRunner::new()
            .run(temp.path(), &command, &BTreeMap::new())
            .unwrap();

        assert!(exit.success());
        assert!(dir.join("done").exists());
    }

    /// A recorded invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Invocation {
        pub workdir: PathBuf,
        pub command: String,
        pub env: BTreeMap<String, String>,
    }

    /// Records commands instead of running them; fails any command containing `fail_on`
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRunner {
        pub invocations: Mutex<Vec<Invocation>>,
        pub fail_on: Option<String>,
    }

    impl RecordingRunner {
        pub(crate) fn failing_on(pattern: &str) -> Self {
            Self {
                invocations: Mutex::new(Vec::new()),
                fail_on: Some(pattern.to_string()),
            }
        }

        pub(crate) fn commands(&self) -> Vec<String> {
            self.invocations
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.command.clone())
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(
            &self,
            workdir: &Path,
            command: &str,
            env: &BTreeMap<String, String>,
        ) -> io::Result<Exit> {
            self.invocations.lock().unwrap().push(Invocation {
                workdir: workdir.to_path_buf(),
                command: command.to_string(),
                env: env.clone(),
            });
            let failed = self
                .fail_on
                .as_deref()
                .is_some_and(|pattern| command.contains(pattern));
            Ok(if failed { Exit { code: Some(2) } } else { Exit::SUCCESS })
        }
    }

    #[test]
    fn test_exit_describe() {
        assert!(Exit::SUCCESS.success());
        assert_eq!(Exit { code: Some(2) }.describe(), "exited with status 2");
        assert_eq!(Exit { code: None }.describe(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_uses_workdir_and_env() {
        let temp = TempDir::new().unwrap();
        let env = BTreeMap::from([("CROSS_COMPILE".to_string(), "arm-linux-".to_string())]);

        let exit = ShellRunner::new()
            .run(temp.path(), "printf '%s' \"$CROSS_COMPILE\" > out.txt", &env)
            .unwrap();

        assert!(exit.success());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("out.txt")).unwrap(),
            "arm-linux-"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_reports_exit_code() {
        let temp = TempDir::new().unwrap();
        let exit = ShellRunner::new()
            .run(temp.path(), "exit 3", &BTreeMap::new())
            .unwrap();
        assert_eq!(exit.code, Some(3));
    }

    #[test]
    fn test_missing_workdir_is_io_error() {
        let result = ShellRunner::new().run(
            Path::new("/nonexistent/crossroot/dir"),
            "true",
            &BTreeMap::new(),
        );
        assert!(result.is_err());
    }
}
