use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

use crate::error::{MappingError, Result};

const STDERR_TAIL_LINES: usize = 20;

/// Runs an external program to completion.
pub trait ToolRunner: Send + Sync {
    /// Blocks until `executable` exits. A non-zero exit status is an error.
    /// With `capture_output`, only lines reporting an `ERROR` are surfaced in the log.
    fn run(&self, executable: &str, args: &[String], capture_output: bool) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, executable: &str, args: &[String], capture_output: bool) -> Result<()> {
        info!(tool = executable, args = ?args, "running external tool");
        let failed = |message: String| MappingError::ToolExecution {
            tool: executable.to_string(),
            message,
        };

        let mut child = command(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("failed to start: {e}")))?;

        // Both pipes are drained while the tool runs.
        let stderr = child.stderr.take();
        let tool = executable.to_string();
        let stderr_reader = std::thread::spawn(move || {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                for line in lines(stderr) {
                    if !capture_output {
                        debug!(tool = %tool, "{line}");
                    }
                    push_tail(&mut tail, line);
                }
            }
            tail
        });

        if let Some(stdout) = child.stdout.take() {
            for line in lines(stdout) {
                if !capture_output {
                    debug!(tool = executable, "{line}");
                } else if line.contains("ERROR") {
                    error!(tool = executable, "{line}");
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| failed(format!("failed to wait: {e}")))?;
        let tail = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            let tail: Vec<String> = tail.into_iter().collect();
            return Err(failed(format!("exited with {status}: {}", tail.join("\n"))));
        }

        Ok(())
    }
}

fn lines(pipe: impl Read) -> impl Iterator<Item = String> {
    BufReader::new(pipe)
        .split(b'\n')
        .map_while(|line| line.ok())
        .map(|line| String::from_utf8_lossy(&line).trim_end().to_string())
}

fn push_tail(tail: &mut VecDeque<String>, line: String) {
    if tail.len() == STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line);
}

fn command(executable: &str) -> Command {
    #[cfg(windows)]
    {
        let lower = executable.to_ascii_lowercase();
        if lower.ends_with(".cmd") || lower.ends_with(".bat") {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(executable);
            return cmd;
        }
    }

    Command::new(executable)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::store::temp_path;
    use std::fs;
    use std::path::Path;

    fn write_script(path: &Path, content: &str) -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
        Ok(())
    }

    #[test]
    fn run_passes_arguments_in_order() -> anyhow::Result<()> {
        let base = temp_path("tool_args");
        let fake_java = base.join("bin").join("java");
        let record = base.join("args.txt");
        write_script(
            &fake_java,
            &format!(
                "#!/bin/sh\necho \"$@\" > '{}'\necho 'INFO: remapping'\n",
                record.display()
            ),
        )?;

        let args = vec!["-jar".to_string(), "tool.jar".to_string(), "in.jar".to_string()];
        ProcessRunner.run(fake_java.to_str().unwrap(), &args, true)?;
        assert_eq!(fs::read_to_string(&record)?.trim(), "-jar tool.jar in.jar");

        let _ = fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn run_reports_nonzero_exit_with_stderr_tail() -> anyhow::Result<()> {
        let base = temp_path("tool_failure");
        let fake_java = base.join("bin").join("java");
        write_script(
            &fake_java,
            "#!/bin/sh\necho 'ERROR: bad class file'\necho 'boom from fake remapper' >&2\nexit 3\n",
        )?;

        let err = ProcessRunner
            .run(fake_java.to_str().unwrap(), &[], false)
            .unwrap_err();
        assert!(matches!(err, MappingError::ToolExecution { .. }));
        assert!(err.to_string().contains("boom from fake remapper"));

        let _ = fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn run_reports_missing_executable() {
        let err = ProcessRunner
            .run("/nonexistent/mapping-finder/java", &[], false)
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn push_tail_keeps_last_lines() {
        let mut tail = VecDeque::new();
        for i in 0..30 {
            push_tail(&mut tail, format!("line {i}"));
        }
        assert_eq!(tail.len(), STDERR_TAIL_LINES);
        assert_eq!(tail.front().map(String::as_str), Some("line 10"));
        assert_eq!(tail.back().map(String::as_str), Some("line 29"));
    }

    #[test]
    fn run_drains_large_output_on_both_pipes() -> anyhow::Result<()> {
        let base = temp_path("tool_large_output");
        let fake_java = base.join("bin").join("java");
        write_script(
            &fake_java,
            "#!/bin/sh\ni=0\nwhile [ $i -lt 20000 ]; do\n  echo \"out $i padding padding padding\"\n  echo \"err $i padding padding padding\" >&2\n  i=$((i+1))\ndone\nexit 1\n",
        )?;

        let err = ProcessRunner
            .run(fake_java.to_str().unwrap(), &[], true)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("err 19999 padding"));
        assert!(message.contains("err 19980 padding"));
        assert!(!message.contains("err 19979 padding"));

        let _ = fs::remove_dir_all(base);
        Ok(())
    }
}
