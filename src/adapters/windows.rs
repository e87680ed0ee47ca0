//! X11 window control adapter.
//!
//! Implements [`WindowPort`] with `xdotool`, addressing each view's browser
//! by process id.  The browsers are launched by an external supervisor that
//! writes one pid file per view; the pid is re-read on every call so a
//! restarted browser is picked up without restarting this daemon.

use core::time::Duration;
use std::path::PathBuf;

use crate::app::ports::{CommandRunner, Invocation, WindowPort};
use crate::app::state::DisplayView;
use crate::config::ViewConfig;
use crate::error::HardwareError;

const XDOTOOL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct XdotoolWindows<R: CommandRunner> {
    runner: R,
    passive_pid_file: PathBuf,
    interactive_pid_file: PathBuf,
    display: String,
}

impl<R: CommandRunner> XdotoolWindows<R> {
    pub fn new(cfg: &ViewConfig, display: &str, runner: R) -> Self {
        Self {
            runner,
            passive_pid_file: PathBuf::from(&cfg.passive_pid_file),
            interactive_pid_file: PathBuf::from(&cfg.interactive_pid_file),
            display: display.to_string(),
        }
    }

    fn pid(&self, view: DisplayView) -> Result<u32, HardwareError> {
        let path = match view {
            DisplayView::Passive => &self.passive_pid_file,
            DisplayView::Interactive => &self.interactive_pid_file,
        };
        let text = std::fs::read_to_string(path)
            .map_err(|_| HardwareError::Unavailable(format!("pid file {}", path.display())))?;
        text.trim()
            .parse()
            .map_err(|_| HardwareError::Unparseable(text.trim().to_string()))
    }

    fn xdotool(&mut self, pid: u32, action: &str) -> Result<(), HardwareError> {
        let inv = Invocation::new("xdotool")
            .args(["search", "--pid"])
            .arg(pid.to_string())
            .arg(action)
            .env("DISPLAY", self.display.as_str());
        self.runner.run(&inv, XDOTOOL_TIMEOUT).map(|_| ())
    }
}

impl<R: CommandRunner> WindowPort for XdotoolWindows<R> {
    fn show(&mut self, view: DisplayView) -> Result<(), HardwareError> {
        let pid = self.pid(view)?;
        self.xdotool(pid, "windowmap")?;
        self.xdotool(pid, "windowraise")
    }

    fn hide(&mut self, view: DisplayView) -> Result<(), HardwareError> {
        let pid = self.pid(view)?;
        self.xdotool(pid, "windowunmap")
    }
}
