//! The unlocked-seed context.
//!
//! "Locked" means the session holds no key chain. Every operation that needs
//! a private key asks the session for one and fails with
//! [`WalletError::Locked`] immediately when it is empty.

use std::sync::{Arc, RwLock};

use crate::error::WalletError;
use crate::keys::KeyChain;

#[derive(Default)]
pub struct Session {
    keys: RwLock<Option<Arc<KeyChain>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unlock(&self, keys: KeyChain) {
        if let Ok(mut slot) = self.keys.write() {
            *slot = Some(Arc::new(keys));
        }
    }

    pub fn lock(&self) {
        if let Ok(mut slot) = self.keys.write() {
            slot.take();
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.keys.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    pub fn keys(&self) -> Result<Arc<KeyChain>, WalletError> {
        self.keys
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or(WalletError::Locked)
    }
}
