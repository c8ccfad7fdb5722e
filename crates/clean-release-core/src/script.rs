//! Post-script rendering and execution.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use clean_release_config::ExecConfig;
use regex::{Captures, Regex};
use semver::Version;
use tokio::process::{Child, Command};
use tokio::runtime::Runtime;
use tokio::signal;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult};

/// How long an interrupted script gets to exit after SIGTERM.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Values substituted into post-scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    /// Staging directory, for `[dir]`.
    pub dir: PathBuf,
    /// Released version, for `[version]`.
    pub version: Option<Version>,
    /// Git tag of the release, for `[tag]`.
    pub tag: Option<String>,
}

fn placeholder_regex() -> Regex {
    Regex::new(r"\[(dir|version|tag)\]").expect("invalid regex")
}

/// Replaces `[dir]`, `[version]` and `[tag]` in `script`.
///
/// Other bracketed words are left as they are. A missing version or tag
/// renders as an empty string.
pub fn render(script: &str, ctx: &ScriptContext) -> String {
    placeholder_regex()
        .replace_all(script, |caps: &Captures<'_>| match &caps[1] {
            "dir" => ctx.dir.to_string_lossy().into_owned(),
            "version" => ctx
                .version
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            "tag" => ctx.tag.clone().unwrap_or_default(),
            other => format!("[{other}]"),
        })
        .into_owned()
}

/// Runs post-scripts one at a time through a shell.
pub struct ScriptRunner {
    runtime: Runtime,
    shell: String,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ScriptRunner {
    /// Creates a runner from the `[exec]` options.
    ///
    /// # Errors
    ///
    /// Returns an error if the async runtime cannot be created.
    pub fn new(exec: &ExecConfig) -> CoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            shell: exec.shell.clone().unwrap_or_else(default_shell),
            cwd: exec.cwd.clone(),
            env: exec.env.clone(),
        })
    }

    /// Runs a rendered script and waits for it.
    ///
    /// The script inherits stdin, stdout and stderr and runs in its own
    /// process group, which gets the terminal when stdin is one. A SIGINT or
    /// SIGTERM received meanwhile stops the whole group and yields
    /// [`CoreError::Interrupted`], as does a script killed by either signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be started, the script exits
    /// unsuccessfully, or the run is interrupted.
    pub fn run(&self, script: &str) -> CoreResult<()> {
        info!(%script, "running post-script");
        let status = self.runtime.block_on(self.run_async(script))?;

        if status.success() {
            debug!(%script, "post-script finished");
            Ok(())
        } else if killed_by_interrupt(status) {
            warn!(%script, %status, "post-script was interrupted");
            Err(CoreError::Interrupted)
        } else {
            Err(CoreError::ScriptFailed {
                script: script.to_string(),
                code: status.code(),
            })
        }
    }

    async fn run_async(&self, script: &str) -> CoreResult<ExitStatus> {
        let mut child = self
            .command(script)
            .spawn()
            .map_err(|source| CoreError::Spawn {
                script: script.to_string(),
                source,
            })?;
        let group = child.id();

        #[cfg(unix)]
        let _foreground = group.and_then(process_group::Foreground::hand_over);

        tokio::select! {
            status = child.wait() => Ok(status?),
            () = interrupted() => {
                warn!(%script, "interrupted, stopping post-script");
                terminate(&mut child, group).await;
                Err(CoreError::Interrupted)
            }
        }
    }

    fn command(&self, script: &str) -> Command {
        let mut command = Command::new(&self.shell);
        command
            .arg(shell_flag(&self.shell))
            .arg(script)
            .envs(&self.env)
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

fn default_shell() -> String {
    let shell = if cfg!(windows) { "cmd" } else { "sh" };
    shell.to_string()
}

fn shell_flag(shell: &str) -> &'static str {
    let name = shell.rsplit(['/', '\\']).next().unwrap_or(shell);
    if name.eq_ignore_ascii_case("cmd") || name.eq_ignore_ascii_case("cmd.exe") {
        "/C"
    } else {
        "-c"
    }
}

/// Resolves once SIGINT or SIGTERM arrives.
async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => debug!("received SIGINT"),
        () = terminate => debug!("received SIGTERM"),
    }
}

/// Sends SIGTERM to the script's process group, then SIGKILL to whatever
/// is left of it once the shell exits or the grace period runs out.
#[cfg(unix)]
async fn terminate(child: &mut Child, group: Option<u32>) {
    use nix::sys::signal::Signal;

    if let Some(group) = group {
        if process_group::signal(group, Signal::SIGTERM) {
            match tokio::time::timeout(GRACE_PERIOD, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(%status, "post-script stopped");
                    process_group::signal(group, Signal::SIGKILL);
                    return;
                }
                Ok(Err(e)) => warn!(error = %e, "failed to wait for post-script"),
                Err(_) => warn!(
                    seconds = GRACE_PERIOD.as_secs(),
                    "post-script ignored SIGTERM, killing it"
                ),
            }
        }
        process_group::signal(group, Signal::SIGKILL);
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill post-script");
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child, _group: Option<u32>) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill post-script");
    }
}

#[cfg(unix)]
fn killed_by_interrupt(status: ExitStatus) -> bool {
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    matches!(
        status.signal().and_then(|raw| Signal::try_from(raw).ok()),
        Some(Signal::SIGINT | Signal::SIGTERM)
    )
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: ExitStatus) -> bool {
    false
}

#[cfg(unix)]
mod process_group {
    use std::io::{self, IsTerminal};

    use nix::sys::signal::{SigSet, SigmaskHow, Signal, killpg};
    use nix::unistd::{Pid, getpgrp, tcgetpgrp, tcsetpgrp};
    use tracing::{debug, warn};

    fn pid(group: u32) -> Option<Pid> {
        i32::try_from(group).ok().map(Pid::from_raw)
    }

    /// Signals every process in `group`. Returns `false` if none was reached.
    pub(super) fn signal(group: u32, signal: Signal) -> bool {
        let Some(pgid) = pid(group) else {
            return false;
        };
        match killpg(pgid, signal) {
            Ok(()) => true,
            Err(e) => {
                debug!(group, %signal, error = %e, "failed to signal process group");
                false
            }
        }
    }

    /// Terminal foreground handed to a script's process group, given back
    /// on drop.
    pub(super) struct Foreground {
        previous: Pid,
    }

    impl Foreground {
        /// Hands the terminal to `group` if stdin is a terminal owned by our
        /// process group.
        pub(super) fn hand_over(group: u32) -> Option<Self> {
            if !io::stdin().is_terminal() {
                return None;
            }
            let previous = tcgetpgrp(io::stdin()).ok()?;
            if previous != getpgrp() {
                return None;
            }

            match tcsetpgrp(io::stdin(), pid(group)?) {
                Ok(()) => Some(Self { previous }),
                Err(e) => {
                    debug!(group, error = %e, "failed to hand over the terminal");
                    None
                }
            }
        }
    }

    impl Drop for Foreground {
        fn drop(&mut self) {
            // We are a background group here, so tcsetpgrp raises SIGTTOU.
            let mut ttou = SigSet::empty();
            ttou.add(Signal::SIGTTOU);
            let saved = match ttou.thread_swap_mask(SigmaskHow::SIG_BLOCK) {
                Ok(saved) => saved,
                Err(e) => {
                    warn!(error = %e, "failed to block SIGTTOU");
                    return;
                }
            };

            if let Err(e) = tcsetpgrp(io::stdin(), self.previous) {
                warn!(error = %e, "failed to take back the terminal");
            }
            if let Err(e) = saved.thread_set_mask() {
                warn!(error = %e, "failed to restore the signal mask");
            }
        }
    }
}
