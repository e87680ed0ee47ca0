//! Integration tests for the device control layer: DDC/CI retries, the
//! fallback chain and command de-duplication, driven through
//! [`DisplayPort`] against a scripted shell.

use std::collections::HashSet;
use std::time::Duration;

use hallway_display::app::ports::{CommandRunner, DisplayPort, Invocation};
use hallway_display::app::state::{CommandOutcome, PowerReading, PowerState};
use hallway_display::config::MonitorConfig;
use hallway_display::device::DeviceController;
use hallway_display::error::HardwareError;

/// `which` succeeds for installed tools; programs in `failing` time out.
#[derive(Default)]
struct ScriptedShell {
    installed: HashSet<&'static str>,
    failing: HashSet<&'static str>,
    /// Stdout returned for query commands.
    query_reply: String,
    lines: Vec<String>,
}

impl ScriptedShell {
    fn with_tools(tools: &[&'static str]) -> Self {
        Self {
            installed: tools.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn commands(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with("which"))
            .collect()
    }
}

impl CommandRunner for ScriptedShell {
    fn run(&mut self, inv: &Invocation, timeout: Duration) -> Result<String, HardwareError> {
        let mut line = inv.command_line();
        if let Some(input) = &inv.stdin {
            line.push_str(" <<< ");
            line.push_str(input);
        }
        self.lines.push(line);

        if inv.program == "which" {
            let tool = inv.args.first().map(String::as_str).unwrap_or("");
            return if self.installed.contains(tool) {
                Ok(format!("/usr/bin/{tool}\n"))
            } else {
                Err(HardwareError::Rejected {
                    program: "which".into(),
                    status: Some(1),
                    detail: String::new(),
                })
            };
        }
        if self.failing.contains(inv.program.as_str()) {
            return Err(HardwareError::Timeout {
                program: inv.program.clone(),
                after: timeout,
            });
        }
        Ok(self.query_reply.clone())
    }
}

fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        command_prefix: String::new(),
        retry_backoff_ms: 0,
        ..MonitorConfig::default()
    }
}

#[test]
fn repeated_power_on_issues_one_command() {
    let mut shell = ScriptedShell::with_tools(&["ddcutil"]);
    {
        let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
        assert_eq!(display.set_power(true).unwrap(), CommandOutcome::Applied);
        assert_eq!(display.set_power(true).unwrap(), CommandOutcome::NoOp);
    }
    assert_eq!(
        shell.commands(),
        vec!["ddcutil --sleep-multiplier .1 --bus 1 setvcp --noverify D6 1"]
    );
}

#[test]
fn ddc_retries_then_falls_back_to_cec() {
    let mut shell = ScriptedShell::with_tools(&["ddcutil", "cec-client", "xset"]);
    shell.failing.insert("ddcutil");
    {
        let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
        assert_eq!(display.set_power(false).unwrap(), CommandOutcome::Applied);
        let issued = display.last_issued().unwrap();
        assert_eq!(issued.state, PowerState::Off);
        assert_eq!(issued.mechanism, Some("cec"));
    }
    let commands = shell.commands();
    assert_eq!(commands.iter().filter(|c| c.starts_with("ddcutil")).count(), 3);
    assert_eq!(commands.last(), Some(&"cec-client -s -d 1 <<< standby 0"));
    assert!(!commands.iter().any(|c| c.starts_with("xset")));
}

#[test]
fn missing_tools_are_skipped_in_chain_order() {
    let mut shell = ScriptedShell::with_tools(&["vcgencmd"]);
    {
        let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
        display.set_power(true).unwrap();
        assert_eq!(display.last_issued().unwrap().mechanism, Some("hdmi"));
    }
    let probes: Vec<_> = shell
        .lines
        .iter()
        .filter_map(|l| l.strip_prefix("which "))
        .collect();
    assert_eq!(probes, vec!["ddcutil", "cec-client", "xset", "vcgencmd"]);
}

#[test]
fn exhausted_chain_is_typed_and_retried_next_time() {
    let mut shell = ScriptedShell::with_tools(&["ddcutil"]);
    shell.failing.insert("ddcutil");
    let mut display = DeviceController::from_config(&monitor_config(), &mut shell);

    assert_eq!(
        display.set_power(true),
        Err(HardwareError::Exhausted { attempted: 1 })
    );
    assert_eq!(display.confirmed_power(), None);
    // Not cached as on: the same request goes to hardware again.
    assert!(display.set_power(true).is_err());
}

#[test]
fn brightness_cache_resets_after_power_off() {
    let mut shell = ScriptedShell::with_tools(&["ddcutil"]);
    {
        let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
        display.set_power(true).unwrap();
        assert_eq!(display.set_brightness(40).unwrap(), CommandOutcome::Applied);
        assert_eq!(display.set_brightness(40).unwrap(), CommandOutcome::NoOp);

        display.set_power(false).unwrap();
        assert_eq!(display.set_brightness(40).unwrap(), CommandOutcome::NoOp);

        display.set_power(true).unwrap();
        assert_eq!(display.set_brightness(40).unwrap(), CommandOutcome::Applied);
    }
    let writes = shell
        .commands()
        .iter()
        .filter(|c| c.ends_with("setvcp --noverify 10 40"))
        .count();
    assert_eq!(writes, 2);
}

#[test]
fn query_power_reads_ddc_dpms_state() {
    let mut shell = ScriptedShell::with_tools(&["ddcutil"]);
    shell.query_reply = "VCP code 0xd6 (Power mode): DPMS: Standby (sl=0x04)\n".into();
    let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
    assert_eq!(display.query_power(), PowerReading::Off);
    assert_eq!(display.confirmed_power(), Some(PowerState::Off));
    // Already confirmed off: no command needed.
    assert_eq!(display.set_power(false).unwrap(), CommandOutcome::NoOp);
}

#[test]
fn unknown_power_when_nothing_answers() {
    let mut shell = ScriptedShell::default();
    let mut display = DeviceController::from_config(&monitor_config(), &mut shell);
    assert_eq!(display.query_power(), PowerReading::Unknown);
}
