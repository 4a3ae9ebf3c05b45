#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `install` workflow.
//!
//! Each test runs the real step list against a [`common::FakeSystem`] and a
//! temporary home directory, then inspects the files written, the commands
//! issued and the step summary.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{FakeSystem, RecordingFetcher, context, provision_base};
use devsetup_cli::cli::InstallOpts;
use devsetup_cli::commands::install::provision;
use devsetup_cli::config::Config;
use devsetup_cli::error::ProvisionError;
use devsetup_cli::install::InstallOutcome;
use devsetup_cli::logging::{Logger, TaskStatus};
use devsetup_cli::platform::Arch;
use devsetup_cli::resources::shell_config::render;
use devsetup_cli::tasks;

fn rc(home: &Path) -> String {
    std::fs::read_to_string(home.join(".zshrc")).expect("read rc file")
}

fn status_of(log: &Logger, name: &str) -> TaskStatus {
    log.task_entries()
        .into_iter()
        .find(|t| t.name == name)
        .expect("step recorded")
        .status
}

fn backups(home: &Path) -> Vec<String> {
    std::fs::read_dir(home)
        .unwrap()
        .filter_map(|e| e.ok()?.file_name().into_string().ok())
        .filter(|n| n.contains(".devsetup-backup-"))
        .collect()
}

fn only(steps: &[&str]) -> InstallOpts {
    InstallOpts {
        only: steps.iter().map(ToString::to_string).collect(),
        ..InstallOpts::default()
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Step names of the built-in manifest in execution order.
#[test]
fn install_step_names() {
    let config = Config::load(None).unwrap();
    let all_tasks = tasks::install_tasks(&config);
    let names: Vec<&str> = all_tasks.iter().map(|t| t.name()).collect();
    insta::assert_snapshot!("install_step_names", names.join("\n"));
}

/// Rendered rc file when every integration is present.
#[test]
fn rendered_shell_config_with_everything_present() {
    let config = Config::load(None).unwrap();
    let present: Vec<_> = config.dependencies.iter().collect();
    insta::assert_snapshot!("shell_config_full", render(&config.shell, &present));
}

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

/// A fresh machine converges, and a second run changes nothing but the
/// always-refreshed theme.
#[test]
fn fresh_machine_converges_then_second_run_is_idempotent() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(FakeSystem::new(home.path()));
    let fetcher = Arc::new(RecordingFetcher::default());

    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);
    provision(&ctx, &InstallOpts::default(), &log).unwrap();
    assert!(!log.has_failures());
    assert_eq!(system.login_shell(), "/usr/bin/zsh");
    assert!(!system.ran("which"), "shell is located without which(1)");
    let first = rc(home.path());
    assert!(first.contains("ZSH_THEME=\"powerlevel10k/powerlevel10k\""));
    assert!(first.contains("# >>> eza >>>"));
    assert!(first.contains("# >>> miniconda >>>"));

    system.clear_calls();
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);
    provision(&ctx, &InstallOpts::default(), &log).unwrap();
    assert_eq!(rc(home.path()), first);
    assert!(backups(home.path()).is_empty(), "unchanged rc must not be backed up");
    assert!(!system.ran("apt-get"), "{:?}", system.calls());
    assert!(!system.ran("bash"), "{:?}", system.calls());
    assert!(!system.ran("chsh"), "{:?}", system.calls());
    let clones: Vec<String> = system
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("git clone"))
        .collect();
    assert_eq!(clones.len(), 1, "only the theme is re-fetched: {clones:?}");
    assert!(clones[0].contains("powerlevel10k"));
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// When the package manager cannot provide a tool, the release download
/// for the running architecture is used instead.
#[test]
fn package_failure_falls_back_to_release() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(
        FakeSystem::new(home.path())
            .with_path(&provision_base(home.path()))
            .failing("eza"),
    );
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(home.path(), Arch::Aarch64, &system, &fetcher);

    let eza = ctx
        .config
        .dependencies
        .iter()
        .find(|d| d.name == "eza")
        .unwrap();
    let outcome = ctx.installer().install(eza, log.as_ref()).unwrap();
    assert!(
        matches!(outcome, InstallOutcome::Installed { method: 2, .. }),
        "{outcome}"
    );
    assert_eq!(
        fetcher.urls(),
        vec!["https://github.com/eza-community/eza/releases/latest/download/eza_aarch64-unknown-linux-gnu.tar.gz"]
    );
    assert!(
        system
            .calls()
            .iter()
            .any(|c| c.starts_with("install -D -m 755") && c.ends_with("/usr/local/bin/eza")),
        "{:?}",
        system.calls()
    );
}

/// On an architecture without release assets, optional tools are skipped,
/// the run still succeeds, and the rc file leaves them out.
#[test]
fn unsupported_architecture_degrades_optional_tools() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(
        FakeSystem::new(home.path())
            .with_path(&provision_base(home.path()))
            .failing("eza"),
    );
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(
        home.path(),
        Arch::Unknown("riscv64".into()),
        &system,
        &fetcher,
    );

    provision(&ctx, &InstallOpts::default(), &log).unwrap();
    assert_eq!(status_of(&log, "Install eza"), TaskStatus::Skipped);
    assert_eq!(status_of(&log, "Install miniconda"), TaskStatus::Skipped);
    assert_eq!(status_of(&log, "Write shell config"), TaskStatus::Ok);
    assert!(fetcher.urls().is_empty());
    let content = rc(home.path());
    assert!(!content.contains("eza"));
    assert!(!content.contains("conda"));
}

/// Downloads that keep failing degrade an optional tool without aborting.
#[test]
fn offline_download_skips_optional_installer() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(FakeSystem::new(home.path()).with_path(&provision_base(home.path())));
    let fetcher = Arc::new(RecordingFetcher::offline());
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);

    provision(&ctx, &only(&["miniconda"]), &log).unwrap();
    assert_eq!(status_of(&log, "Install miniconda"), TaskStatus::Skipped);
    assert_eq!(fetcher.urls().len(), 2, "bounded retry");
    assert!(!system.ran("bash"));
}

/// A framework directory left half-populated by an earlier run is kept
/// aside and replaced by a complete clone.
#[test]
fn incomplete_framework_checkout_converges() {
    let home = tempfile::tempdir().unwrap();
    let omz = home.path().join(".oh-my-zsh");
    std::fs::create_dir_all(omz.join("custom")).unwrap();
    let system = Arc::new(FakeSystem::new(home.path()).with_path(&["zsh", "git", "curl"]));
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);

    provision(&ctx, &only(&["oh-my-zsh"]), &log).unwrap();
    assert_eq!(status_of(&log, "Install oh-my-zsh"), TaskStatus::Ok);
    assert!(omz.join("oh-my-zsh.sh").is_file());
    let saved = backups(home.path());
    assert_eq!(saved.len(), 1, "{saved:?}");
    assert!(saved[0].starts_with(".oh-my-zsh.devsetup-backup-"));
    assert!(home.path().join(&saved[0]).join("custom").is_dir());

    system.clear_calls();
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);
    provision(&ctx, &only(&["oh-my-zsh"]), &log).unwrap();
    assert!(!system.ran("git"), "{:?}", system.calls());
}

// ---------------------------------------------------------------------------
// Shell config
// ---------------------------------------------------------------------------

/// A hand-written rc file is kept byte for byte before being replaced.
#[test]
fn existing_rc_is_backed_up_before_replacement() {
    let home = tempfile::tempdir().unwrap();
    let original = "# my own settings\nexport EDITOR=vim\n";
    std::fs::write(home.path().join(".zshrc"), original).unwrap();
    let system = Arc::new(FakeSystem::new(home.path()));
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);

    provision(&ctx, &only(&["shell config"]), &log).unwrap();
    let saved = backups(home.path());
    assert_eq!(saved.len(), 1, "{saved:?}");
    assert!(saved[0].starts_with(".zshrc.devsetup-backup-"));
    assert_eq!(
        std::fs::read_to_string(home.path().join(&saved[0])).unwrap(),
        original
    );
    assert!(rc(home.path()).starts_with("# Managed by devsetup."));
}

/// Blocks appear only for integrations whose presence check passes.
#[test]
fn rc_blocks_follow_presence() {
    let home = tempfile::tempdir().unwrap();
    let plugin = home.path().join(".oh-my-zsh/custom/plugins/zsh-autosuggestions");
    std::fs::create_dir_all(&plugin).unwrap();
    let system = Arc::new(FakeSystem::new(home.path()).with_path(&["eza"]));
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);

    provision(&ctx, &only(&["shell config"]), &log).unwrap();
    let content = rc(home.path());
    assert!(content.contains("plugins=(git zsh-autosuggestions)"), "{content}");
    assert!(content.contains("ZSH_THEME=\"robbyrussell\""));
    assert!(content.contains("alias ls='eza --group-directories-first'"));
    assert!(!content.contains("conda"));
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

/// A required dependency that cannot be installed stops the run before any
/// later step starts.
#[test]
fn required_failure_stops_later_steps() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(FakeSystem::new(home.path()).failing("zsh"));
    let fetcher = Arc::new(RecordingFetcher::default());
    let (ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);

    let err = provision(&ctx, &InstallOpts::default(), &log).unwrap_err();
    let provision_err = err.downcast_ref::<ProvisionError>().unwrap();
    assert!(provision_err.is_fatal(), "{provision_err}");
    assert!(err.to_string().contains("zsh"));

    let entries = log.task_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, TaskStatus::Failed);
    assert!(!system.ran("chsh"));
    assert!(!system.ran("git"));
    assert!(!home.path().join(".zshrc").exists());
}

/// Dry run reports every step without changing the machine.
#[test]
fn dry_run_changes_nothing() {
    let home = tempfile::tempdir().unwrap();
    let system = Arc::new(FakeSystem::new(home.path()).with_path(&["zsh"]));
    let fetcher = Arc::new(RecordingFetcher::default());
    let (mut ctx, log) = context(home.path(), Arch::X86_64, &system, &fetcher);
    ctx.dry_run = true;

    provision(&ctx, &InstallOpts::default(), &log).unwrap();
    assert!(
        log.task_entries()
            .iter()
            .all(|t| t.status == TaskStatus::DryRun)
    );
    assert!(!system.ran("apt-get"));
    assert!(!system.ran("chsh"));
    assert!(fetcher.urls().is_empty());
    assert_eq!(std::fs::read_dir(home.path()).unwrap().count(), 0);
}
