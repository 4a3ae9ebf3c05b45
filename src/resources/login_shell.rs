//! The target user's login shell.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::identity::lookup_user;

/// A login shell entry in the account database.
///
/// State is read from `getent passwd`, never from `$SHELL`, which describes
/// whoever launched the process rather than the target account.
#[derive(Debug)]
pub struct LoginShellResource<'a> {
    /// Account whose shell is changed.
    user: String,
    /// Absolute path of the desired shell.
    shell: String,
    /// Reads the account database.
    reader: &'a dyn Executor,
    /// Runs `chsh` with root privileges.
    root: &'a dyn Executor,
}

impl<'a> LoginShellResource<'a> {
    /// Create a new login shell resource.
    #[must_use]
    pub const fn new(
        user: String,
        shell: String,
        reader: &'a dyn Executor,
        root: &'a dyn Executor,
    ) -> Self {
        Self {
            user,
            shell,
            reader,
            root,
        }
    }
}

impl Applicable for LoginShellResource<'_> {
    fn description(&self) -> String {
        format!("login shell of {} → {}", self.user, self.shell)
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.root
            .run("chsh", &["-s", &self.shell, &self.user])?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for LoginShellResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let entry = lookup_user(self.reader, &self.user)?;
        if entry.shell == self.shell {
            Ok(ResourceState::Correct)
        } else if entry.shell.is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Incorrect {
                current: entry.shell,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn reader(shell: &str) -> MockExecutor {
        MockExecutor::new().respond(
            "getent",
            &format!("alice:x:1000:1000::/home/alice:{shell}\n"),
        )
    }

    #[test]
    fn description_names_user_and_shell() {
        let r = reader("/bin/bash");
        let root = MockExecutor::new();
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert_eq!(res.description(), "login shell of alice → /usr/bin/zsh");
    }

    #[test]
    fn matching_shell_is_correct() {
        let r = reader("/usr/bin/zsh");
        let root = MockExecutor::new();
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert_eq!(res.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn different_shell_is_incorrect() {
        let r = reader("/bin/bash");
        let root = MockExecutor::new();
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert_eq!(
            res.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "/bin/bash".into()
            }
        );
    }

    #[test]
    fn empty_shell_field_is_missing() {
        let r = reader("");
        let root = MockExecutor::new();
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert_eq!(res.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn apply_runs_chsh_for_the_target_user() {
        let r = reader("/bin/bash");
        let root = MockExecutor::new();
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert_eq!(res.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(root.calls(), vec!["chsh -s /usr/bin/zsh alice"]);
    }

    #[test]
    fn chsh_failure_propagates() {
        let r = reader("/bin/bash");
        let root = MockExecutor::new().fail_on("chsh");
        let res = LoginShellResource::new("alice".into(), "/usr/bin/zsh".into(), &r, &root);
        assert!(res.apply().is_err());
    }
}
