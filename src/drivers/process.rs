//! External command execution with a hard deadline.
//!
//! Control tools (`ddcutil`, `cec-client`, `xset`, `vcgencmd`, `xdotool`)
//! occasionally hang on a wedged I2C bus or a dead X session.  The child is
//! polled until it exits or the deadline passes, then killed and reaped.
//! Its output pipes are drained on helper threads meanwhile, so a chatty
//! tool never stalls on a full pipe.

use core::time::Duration;
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Instant;

use log::debug;

use crate::app::ports::{CommandRunner, Invocation};
use crate::error::HardwareError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation, timeout: Duration) -> Result<String, HardwareError> {
        debug!("exec: {}", invocation.command_line());
        let program = invocation.program.as_str();

        let mut command = Command::new(program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                HardwareError::Unavailable(program.to_string())
            }
            _ => HardwareError::Rejected {
                program: program.to_string(),
                status: None,
                detail: e.to_string(),
            },
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let (Some(input), Some(mut pipe)) = (&invocation.stdin, child.stdin.take()) {
            // A child that exits without reading closes the pipe; its exit
            // status is what matters.
            let _ = pipe.write_all(input.as_bytes());
        }

        // On timeout the drain threads are left to finish once the killed
        // child's pipes close.
        let status = wait_with_deadline(&mut child, program, timeout)?;
        let stdout = collect(stdout);
        if status.success() {
            return Ok(stdout);
        }
        let stderr = collect(stderr);
        Err(HardwareError::Rejected {
            program: program.to_string(),
            status: status.code(),
            detail: stderr.trim().to_string(),
        })
    }
}

fn wait_with_deadline(
    child: &mut Child,
    program: &str,
    timeout: Duration,
) -> Result<std::process::ExitStatus, HardwareError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HardwareError::Timeout {
                    program: program.to_string(),
                    after: timeout,
                });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(HardwareError::Rejected {
                    program: program.to_string(),
                    status: None,
                    detail: e.to_string(),
                });
            }
        }
    }
}

/// Read `pipe` to its end on a helper thread.
fn drain<P: Read + Send + 'static>(pipe: Option<P>) -> Option<JoinHandle<String>> {
    let mut pipe = pipe?;
    std::thread::Builder::new()
        .name("exec-pipe".into())
        .spawn(move || {
            let mut raw = Vec::new();
            let _ = pipe.read_to_end(&mut raw);
            String::from_utf8_lossy(&raw).into_owned()
        })
        .ok()
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn run(inv: Invocation, timeout_ms: u64) -> Result<String, HardwareError> {
        SystemRunner::new().run(&inv, Duration::from_millis(timeout_ms))
    }

    #[test]
    fn captures_stdout() {
        let out = run(Invocation::new("sh").args(["-c", "echo hello"]), 5000).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn feeds_stdin() {
        let out = run(Invocation::new("cat").stdin("pow 0"), 5000).unwrap();
        assert_eq!(out, "pow 0");
    }

    #[test]
    fn passes_environment() {
        let inv = Invocation::new("sh")
            .args(["-c", "printf %s \"$DISPLAY\""])
            .env("DISPLAY", ":7");
        assert_eq!(run(inv, 5000).unwrap(), ":7");
    }

    #[test]
    fn missing_program_is_unavailable() {
        let err = run(Invocation::new("definitely-not-a-real-tool-xyz"), 1000).unwrap_err();
        assert!(matches!(err, HardwareError::Unavailable(_)));
    }

    #[test]
    fn non_zero_exit_is_rejected_with_stderr() {
        let err = run(Invocation::new("sh").args(["-c", "echo busy >&2; exit 3"]), 5000).unwrap_err();
        assert_eq!(
            err,
            HardwareError::Rejected {
                program: "sh".into(),
                status: Some(3),
                detail: "busy".into()
            }
        );
    }

    #[test]
    fn output_larger_than_a_pipe_buffer_is_captured() {
        let inv = Invocation::new("sh").args(["-c", "head -c 200000 /dev/zero | tr '\\0' x"]);
        let out = run(inv, 5000).unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes().all(|b| b == b'x'));
    }

    #[test]
    fn hung_child_is_killed_at_deadline() {
        let started = Instant::now();
        let err = run(Invocation::new("sleep").arg("10"), 100).unwrap_err();
        assert!(matches!(err, HardwareError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
