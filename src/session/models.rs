use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::shared::AppError;

/// Typed name of a session attribute
///
/// The type parameter fixes what a lookup decodes to, so a stored value of
/// another shape reads back as absent instead of as a zero value.
pub struct SessionKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SessionKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for SessionKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SessionKey<T> {}

impl<T> std::fmt::Debug for SessionKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionKey").field(&self.name).finish()
    }
}

/// Email of the signed-in user, written by the login flow
pub const USER_EMAIL: SessionKey<String> = SessionKey::new("userEmail");

/// Attributes stored for one session in the session backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    values: HashMap<String, Value>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attribute if present and decodable as `T`
    pub fn get<T: DeserializeOwned>(&self, key: SessionKey<T>) -> Option<T> {
        let value = self.values.get(key.name())?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn insert<T: Serialize>(&mut self, key: SessionKey<T>, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value).map_err(|e| {
            AppError::SessionStore(format!("Failed to encode session attribute: {}", e))
        })?;
        self.values.insert(key.name().to_string(), value);
        Ok(())
    }

    /// Removes the attribute, returning whether it was present
    pub fn remove<T>(&mut self, key: SessionKey<T>) -> bool {
        self.values.remove(key.name()).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
