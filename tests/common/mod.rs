// Shared helpers for integration tests.
//
// Provides a simulated machine (`FakeSystem`) that stands in for package
// managers, git, tar and the account database, plus a recording fetcher, so
// each integration test can drive the whole install workflow against a
// temporary home directory without touching the host.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devsetup_cli::config::Config;
use devsetup_cli::exec::{ExecResult, Executor};
use devsetup_cli::identity::TargetIdentity;
use devsetup_cli::install::fetch::{Fetcher, Retry};
use devsetup_cli::logging::{Log, Logger};
use devsetup_cli::platform::{Arch, Os, Platform};
use devsetup_cli::tasks::Context;

#[derive(Debug)]
struct State {
    home: PathBuf,
    on_path: HashSet<String>,
    failing: HashSet<String>,
    login_shell: String,
    calls: Vec<Vec<String>>,
}

/// A scripted machine whose commands mutate an in-memory state.
///
/// Package installs put the package on `PATH`, `git clone` creates the
/// destination directory, `tar` produces an executable named after the
/// archive prefix, and `chsh` updates the account's shell.  `sudo` and
/// `env` prefixes are stripped before dispatch.
#[derive(Debug)]
pub struct FakeSystem {
    state: Mutex<State>,
}

impl FakeSystem {
    /// A machine with only `apt-get` available and `/bin/bash` as login shell.
    pub fn new(home: &Path) -> Self {
        Self {
            state: Mutex::new(State {
                home: home.to_path_buf(),
                on_path: HashSet::from(["apt-get".to_string()]),
                failing: HashSet::new(),
                login_shell: "/bin/bash".to_string(),
                calls: Vec::new(),
            }),
        }
    }

    /// Put `programs` on `PATH`.
    pub fn with_path(self, programs: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .on_path
                .extend(programs.iter().map(ToString::to_string));
        }
        self
    }

    /// Make every command mentioning `word` exit non-zero.
    pub fn failing(self, word: &str) -> Self {
        self.state.lock().unwrap().failing.insert(word.to_string());
        self
    }

    /// Current login shell in the simulated account database.
    pub fn login_shell(&self) -> String {
        self.state.lock().unwrap().login_shell.clone()
    }

    /// Every command line received so far, with privilege prefixes removed.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|c| c.join(" "))
            .collect()
    }

    /// Forget recorded commands.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Whether any recorded command was `program`.
    pub fn ran(&self, program: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .any(|c| c.first().is_some_and(|p| p == program))
    }

    fn dispatch(&self, program: &str, args: &[&str]) -> ExecResult {
        let argv = strip_wrappers(program, args);
        let mut state = self.state.lock().unwrap();
        state.calls.push(argv.clone());

        if argv.iter().any(|w| state.failing.contains(w)) {
            return failure();
        }
        let (program, args) = argv.split_first().unwrap();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match (program.as_str(), args.as_slice()) {
            ("apt-get", ["install", rest @ ..]) | ("pacman", ["-S", rest @ ..]) => {
                let packages = rest.iter().filter(|a| !a.starts_with('-'));
                state.on_path.extend(packages.map(ToString::to_string));
                success("")
            }
            ("git", _) if args.contains(&"clone") => {
                let dest = PathBuf::from(args.last().unwrap());
                std::fs::create_dir_all(&dest).unwrap();
                if args.iter().any(|a| a.contains("ohmyzsh")) {
                    std::fs::write(dest.join("oh-my-zsh.sh"), "# framework\n").unwrap();
                }
                success("")
            }
            ("tar", ["-xf", archive, "-C", dir]) => {
                let name = Path::new(archive)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.split(['_', '-']).next())
                    .unwrap()
                    .to_string();
                let bin = Path::new(dir).join("bin").join(&name);
                std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
                std::fs::write(&bin, "#!/bin/sh\n").unwrap();
                std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
                success("")
            }
            ("install", [.., target]) => {
                let name = Path::new(target).file_name().unwrap().to_string_lossy();
                state.on_path.insert(name.into_owned());
                success("")
            }
            ("bash", [_script, .., dest]) => {
                let conda = Path::new(dest).join("bin/conda");
                std::fs::create_dir_all(conda.parent().unwrap()).unwrap();
                std::fs::write(conda, "#!/bin/sh\n").unwrap();
                success("")
            }
            // Minimal images ship no which(1); lookups go through `resolve`.
            ("which", _) => failure(),
            ("getent", ["passwd", user]) => success(&format!(
                "{user}:x:1000:1000::{}:{}\n",
                state.home.display(),
                state.login_shell
            )),
            ("chsh", ["-s", shell, _user]) => {
                state.login_shell = (*shell).to_string();
                success("")
            }
            _ => success(""),
        }
    }
}

/// Remove `sudo …--` and `env KEY=VALUE…` prefixes.
fn strip_wrappers(program: &str, args: &[&str]) -> Vec<String> {
    let mut argv: Vec<String> = std::iter::once(program)
        .chain(args.iter().copied())
        .map(ToString::to_string)
        .collect();
    loop {
        match argv.first().map(String::as_str) {
            Some("sudo") => {
                let end = argv.iter().position(|a| a == "--").unwrap();
                argv.drain(..=end);
            }
            Some("env") => {
                argv.remove(0);
                while argv.first().is_some_and(|a| a.contains('=')) {
                    argv.remove(0);
                }
            }
            _ => return argv,
        }
    }
}

fn success(stdout: &str) -> ExecResult {
    ExecResult {
        stdout: stdout.to_string(),
        stderr: String::new(),
        success: true,
        code: Some(0),
    }
}

fn failure() -> ExecResult {
    ExecResult {
        stdout: String::new(),
        stderr: "simulated failure".to_string(),
        success: false,
        code: Some(1),
    }
}

fn checked(result: ExecResult, program: &str) -> anyhow::Result<ExecResult> {
    if result.success {
        Ok(result)
    } else {
        anyhow::bail!("{program} failed (exit 1): simulated failure")
    }
}

impl Executor for FakeSystem {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        checked(self.dispatch(program, args), program)
    }

    fn run_in(&self, _dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        checked(self.dispatch(program, args), program)
    }

    fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        _env: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        checked(self.dispatch(program, args), program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.dispatch(program, args))
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .on_path
            .contains(program)
            .then(|| PathBuf::from(format!("/usr/bin/{program}")))
    }
}

/// Fetcher that records URLs and writes placeholder bytes.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    urls: Mutex<Vec<String>>,
    offline: bool,
}

impl RecordingFetcher {
    /// A fetcher whose every download fails.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// URLs requested so far, including failed attempts.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Fetcher for RecordingFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.offline {
            anyhow::bail!("connection refused");
        }
        std::fs::write(dest, b"payload")?;
        Ok(())
    }
}

/// Non-root target `alice` whose home is `home`.
pub fn identity(home: &Path) -> TargetIdentity {
    TargetIdentity {
        user: "alice".into(),
        uid: 1000,
        gid: 1000,
        group: "alice".into(),
        home: home.to_path_buf(),
        process_uid: 1000,
    }
}

/// Workflow context over the built-in manifest for a Linux machine of `arch`.
pub fn context(
    home: &Path,
    arch: Arch,
    system: &Arc<FakeSystem>,
    fetcher: &Arc<RecordingFetcher>,
) -> (Context, Arc<Logger>) {
    let log = Arc::new(Logger::new("test"));
    let mut ctx = Context::new(
        Arc::new(Config::load(None).expect("load embedded manifest")),
        Arc::new(Platform::new(Os::Linux, arch)),
        Arc::new(identity(home)),
        Arc::clone(&log) as Arc<dyn Log>,
        Arc::clone(system) as Arc<dyn Executor>,
        Arc::clone(fetcher) as Arc<dyn Fetcher>,
        false,
    )
    .with_retry(Retry {
        attempts: 2,
        delay: Duration::ZERO,
    });
    ctx.ci = false;
    (ctx, log)
}

/// Mark every required dependency present, as on an already provisioned base.
pub fn provision_base(home: &Path) -> Vec<&'static str> {
    let omz = home.join(".oh-my-zsh");
    std::fs::create_dir_all(&omz).expect("create framework dir");
    std::fs::write(omz.join("oh-my-zsh.sh"), "# framework\n").expect("write framework");
    vec!["zsh", "git", "curl"]
}
