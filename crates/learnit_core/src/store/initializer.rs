//! Startup hydration and local/remote mode arbitration.
//!
//! # Responsibility
//! - Seed onboarding content into an empty local store on first run.
//! - Always hydrate locally first so there is something to render.
//! - Switch the tree store to remote mode when the capability signal allows
//!   it, and back to local mode when it is lost.
//!
//! # Invariants
//! - Remote hydration runs at most once per capability session; a failed
//!   attempt is retried on the next signal.
//! - The remote flag is set on the store before remote data arrives.
//! - Applying an unchanged signal with nothing pending is a no-op.

use crate::model::defaults::{
    default_content, WELCOME_SUBJECT_ID, WELCOME_SUBTOPIC_ID, WELCOME_TOPIC_ID,
};
use crate::model::entity::now_epoch_ms;
use crate::store::backend::BackendKind;
use crate::store::tree::TreeStore;
use log::{debug, error, info, warn};

/// Authentication/authorization facts that gate remote mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capability {
    pub is_authenticated: bool,
    pub is_authorized_role: bool,
    pub remote_backend_enabled: bool,
    /// Signed-in user, used to mirror remote preferences.
    pub user_id: Option<String>,
}

impl Capability {
    /// Signal for an anonymous session.
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Signal for a signed-in, authorized user with the remote backend on.
    pub fn remote(user_id: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            is_authorized_role: true,
            remote_backend_enabled: true,
            user_id: Some(user_id.into()),
        }
    }

    pub fn use_remote(&self) -> bool {
        self.is_authenticated && self.remote_backend_enabled && self.is_authorized_role
    }
}

/// Lifecycle of the initializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitState {
    #[default]
    Uninitialized,
    LocalHydrated,
    RemoteHydrating,
    RemoteHydrated,
}

impl InitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::LocalHydrated => "local_hydrated",
            Self::RemoteHydrating => "remote_hydrating",
            Self::RemoteHydrated => "remote_hydrated",
        }
    }
}

/// Reacts to capability signals and drives hydration of a [`TreeStore`].
#[derive(Debug, Default)]
pub struct StoreInitializer {
    state: InitState,
    remote_loaded: bool,
    last_signal: Option<Capability>,
}

impl StoreInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn remote_loaded(&self) -> bool {
        self.remote_loaded
    }

    /// Applies one capability signal and returns the resulting state.
    pub fn apply(&mut self, store: &mut TreeStore, signal: Capability) -> InitState {
        let use_remote = signal.use_remote();
        let unchanged = self.last_signal.as_ref() == Some(&signal);

        if unchanged && (!use_remote || self.remote_loaded) {
            debug!(
                "event=init_apply module=store status=skipped state={}",
                self.state.as_str()
            );
            return self.state;
        }

        if !unchanged {
            self.remote_loaded = false;
            self.hydrate_local(store);
            store.set_use_remote(use_remote);
        }

        if use_remote && !self.remote_loaded {
            self.hydrate_remote(store, signal.user_id.as_deref());
        }
        self.last_signal = Some(signal);
        self.state
    }

    fn hydrate_local(&mut self, store: &mut TreeStore) {
        let first_run = self.state == InitState::Uninitialized && store.local_store().is_empty();
        if first_run {
            let seed = default_content(now_epoch_ms());
            match store.local_store().seed(&seed) {
                Ok(()) => info!("event=init_seed module=store status=ok"),
                Err(err) => warn!(
                    "event=init_seed module=store status=error error_code=local_write_failed error={err}"
                ),
            }
        }

        if let Err(err) = store.hydrate_from(BackendKind::Local) {
            error!(
                "event=init_hydrate module=store status=error backend=local error_code={}",
                err.code()
            );
        }

        if first_run {
            if store.subtopic(WELCOME_SUBTOPIC_ID).is_none() {
                store.install(default_content(now_epoch_ms()));
            }
            store.select_chain(
                Some(WELCOME_SUBJECT_ID),
                Some(WELCOME_TOPIC_ID),
                Some(WELCOME_SUBTOPIC_ID),
            );
        }
        self.state = InitState::LocalHydrated;
    }

    fn hydrate_remote(&mut self, store: &mut TreeStore, user_id: Option<&str>) {
        self.state = InitState::RemoteHydrating;
        if let Err(err) = store.hydrate_from(BackendKind::Remote) {
            error!(
                "event=init_hydrate module=store status=error backend=remote error_code={}",
                err.code()
            );
            self.state = InitState::LocalHydrated;
            return;
        }
        self.remote_loaded = true;
        self.state = InitState::RemoteHydrated;

        let Some(user_id) = user_id else {
            return;
        };
        match store.remote_preferences(user_id) {
            Ok(Some(settings)) => {
                if let Err(err) = store.local_store().save_settings(&settings) {
                    warn!(
                        "event=init_preferences module=store status=error error_code=local_write_failed error={err}"
                    );
                }
            }
            Ok(None) => {}
            Err(err) => warn!(
                "event=init_preferences module=store status=error error_code={}",
                err.code()
            ),
        }
    }
}
