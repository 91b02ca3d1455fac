use crate::{FlagStore, StorageError};
use doc_model::LoginResponse;

/// Whether the analytics views are available, mirrored to a [`FlagStore`].
///
/// Credentials are checked by the document API; the gate only records the answer.
#[derive(Debug)]
pub struct AuthGate<S> {
    store: S,
    is_admin: bool,
}

impl<S: FlagStore> AuthGate<S> {
    /// Starts from whatever the store remembers. An unreadable store counts as logged out.
    pub fn restore(store: S) -> Self {
        let is_admin = store.get().unwrap_or_else(|err| {
            log::warn!("ignoring unreadable auth flag: {err}");
            false
        });

        Self { store, is_admin }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a login answer and returns whether it granted access.
    ///
    /// A rejected login leaves the current state alone. If the flag cannot be
    /// persisted the gate stays open for this process and the error is returned.
    pub fn apply_login(&mut self, response: LoginResponse) -> Result<bool, StorageError> {
        if !response.success {
            return Ok(false);
        }

        self.is_admin = true;
        self.store.set()?;
        Ok(true)
    }

    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.is_admin = false;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileFlagStore, MemoryFlagStore};

    #[test]
    fn successful_login_opens_gate_and_persists() {
        let mut gate = AuthGate::restore(MemoryFlagStore::new());
        assert!(!gate.is_admin());

        let granted = gate.apply_login(LoginResponse { success: true }).expect("login");

        assert!(granted);
        assert!(gate.is_admin());
        assert!(gate.store().get().expect("get"));
    }

    #[test]
    fn rejected_login_changes_nothing() {
        let mut gate = AuthGate::restore(MemoryFlagStore::new());

        let granted = gate.apply_login(LoginResponse { success: false }).expect("login");

        assert!(!granted);
        assert!(!gate.is_admin());
        assert!(!gate.store().get().expect("get"));
    }

    #[test]
    fn logout_clears_flag() {
        let mut gate = AuthGate::restore(MemoryFlagStore::new());
        gate.apply_login(LoginResponse { success: true }).expect("login");

        gate.logout().expect("logout");

        assert!(!gate.is_admin());
        assert!(!gate.store().get().expect("get"));
    }

    #[test]
    fn restore_reads_persisted_flag() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        {
            let mut gate = AuthGate::restore(FileFlagStore::with_root(temp.path()));
            gate.apply_login(LoginResponse { success: true }).expect("login");
        }

        let gate = AuthGate::restore(FileFlagStore::with_root(temp.path()));
        assert!(gate.is_admin());
    }

    #[test]
    fn unreadable_flag_restores_logged_out() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        std::fs::write(temp.path().join("auth.json"), b"garbage").expect("write");

        let gate = AuthGate::restore(FileFlagStore::with_root(temp.path()));
        assert!(!gate.is_admin());
    }
}
