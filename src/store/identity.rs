//! Learner identity and partition paths.
//!
//! Every document a learner owns lives under `users/{uid}/`.  The uid comes
//! either from a sign-in token or from an anonymous UUID that is minted once
//! and kept in the identity file so later runs reopen the same partition.

use std::path::Path;

use super::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous(String),
    Token(String),
}

impl Identity {
    /// Establish the identity at startup: a non-blank `token` names the
    /// partition, otherwise the anonymous identity stored at `identity_file`
    /// is reused (or created).
    pub fn sign_in(token: Option<&str>, identity_file: &Path) -> Result<Self, StoreError> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Self::from_token(token),
            None => Self::anonymous(identity_file),
        }
    }

    pub fn from_token(token: &str) -> Result<Self, StoreError> {
        let token = token.trim();
        if token.is_empty() || token.contains('/') {
            return Err(StoreError::PersistenceUnavailable(format!(
                "sign-in token {token:?} cannot name a partition"
            )));
        }
        Ok(Identity::Token(token.to_string()))
    }

    /// Load the anonymous uid from `path`, minting and saving a new one when
    /// the file is missing or blank.
    pub fn anonymous(path: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                return Ok(Identity::Anonymous(content.trim().to_string()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let uid = uuid::Uuid::new_v4().to_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &uid)?;
        log::info!("created anonymous identity {uid}");
        Ok(Identity::Anonymous(uid))
    }

    pub fn uid(&self) -> &str {
        match self {
            Identity::Anonymous(uid) | Identity::Token(uid) => uid,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous(_))
    }

    /// `users/{uid}/vocab`
    pub fn vocab_collection(&self) -> String {
        format!("users/{}/vocab", self.uid())
    }

    /// `users/{uid}/vocab/{id}`
    pub fn vocab_doc(&self, id: &str) -> String {
        format!("{}/{id}", self.vocab_collection())
    }

    /// `users/{uid}/stats/main`, holding the `xp` field.
    pub fn stats_doc(&self) -> String {
        format!("users/{}/stats/main", self.uid())
    }

    /// Prefix shared by every document in the partition.
    pub fn partition_prefix(&self) -> String {
        format!("users/{}/", self.uid())
    }
}
