// User Entity - owns Places and Reviews
//
// The password is never kept in clear: `set_password` stores a SHA-256 hex
// digest, and that digest is all the storage layer ever sees.

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub email: String,

    /// Opaque password digest
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, password: &str) -> Self {
        let mut user = User {
            base: BaseModel::new(),
            email: email.into(),
            password: String::new(),
            first_name: None,
            last_name: None,
        };
        user.set_password(password);
        user
    }

    /// Replace the stored digest with the digest of `plain`
    pub fn set_password(&mut self, plain: &str) {
        self.password = hash_password(plain);
    }

    pub fn check_password(&self, plain: &str) -> bool {
        self.password == hash_password(plain)
    }

    /// "First Last", skipping missing parts
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn hash_password(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Entity for User {
    const KIND: Kind = Kind::User;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_stored_as_digest() {
        let user = User::new("test@example.com", "pswrd");

        assert_ne!(user.password, "pswrd");
        assert_eq!(user.password.len(), 64, "SHA-256 hex digest");
        assert!(user.check_password("pswrd"));
        assert!(!user.check_password("other"));
    }

    #[test]
    fn test_set_password_replaces_digest() {
        let mut user = User::new("test@example.com", "old");
        let old_digest = user.password.clone();

        user.set_password("new");

        assert_ne!(user.password, old_digest);
        assert!(user.check_password("new"));
    }

    #[test]
    fn test_full_name() {
        let mut user = User::new("test@example.com", "pswrd");
        assert_eq!(user.full_name(), "");

        user.first_name = Some("Betty".to_string());
        assert_eq!(user.full_name(), "Betty");

        user.last_name = Some("Holberton".to_string());
        assert_eq!(user.full_name(), "Betty Holberton");
    }
}
