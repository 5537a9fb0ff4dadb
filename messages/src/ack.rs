use hookpay_crypto::verify_ack;
use hookpay_types::{AckKey, AckSignature, Hash};
use serde::{Deserialize, Serialize};

use crate::Hashable;

/// Contents countersigned by the custodian's acknowledgement key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged<T> {
    pub contents: T,
    pub acknowledgement: AckSignature,
}

impl<T: Hashable> Acknowledged<T> {
    pub fn new(contents: T, acknowledgement: AckSignature) -> Self {
        Self {
            contents,
            acknowledgement,
        }
    }

    pub fn hash(&self) -> Hash {
        self.contents.hash()
    }

    pub fn verify(&self, key: &AckKey) -> bool {
        verify_ack(key, &self.contents.hash(), &self.acknowledgement)
    }
}
