//! Login credentials.

use std::collections::BTreeMap;
use std::fmt;

/// Credentials presented at login.
///
/// Besides the user id and password, credentials carry an open set of named
/// attributes that the session exposes to the application.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    user_id: Option<String>,
    password: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl Credentials {
    /// User id and password credentials.
    pub fn simple(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            password: Some(password.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Credentials without a user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute names in sorted order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("attributes", &self.attributes)
            .finish()
    }
}
