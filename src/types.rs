//! Validated scalar types used throughout the exporter
//!
//! These newtypes enforce their invariants at construction time so the rest
//! of the code never has to re-check them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Length of a WireGuard key in raw bytes
const KEY_LEN: usize = 32;

/// Maximum length of a Linux network interface name (IFNAMSIZ - 1)
const MAX_IFNAME_LEN: usize = 15;

/// Validation errors for scalar types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("interface name cannot be empty")]
    EmptyInterfaceName,

    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("port cannot be 0")]
    InvalidPort,
}

/// Macro to generate validated string newtypes.
///
/// Each type gets a validating `new()` constructor, `as_str()`,
/// `AsRef<str>`, `Deref`, `Display`, `FromStr` and serde impls that
/// re-validate on deserialization.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let $s_param = value.into();
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A validated WireGuard interface name (e.g. `wg0`)
    ///
    /// Enforces the kernel's interface-name rules: non-empty, at most 15
    /// bytes, no whitespace and no `/`.
    ///
    /// # Examples
    /// ```
    /// use wg_exporter::types::InterfaceName;
    ///
    /// let name = InterfaceName::new("wg0").unwrap();
    /// assert_eq!(name.as_str(), "wg0");
    ///
    /// assert!(InterfaceName::new("").is_err());
    /// assert!(InterfaceName::new("wg 0").is_err());
    /// ```
    pub struct InterfaceName(String) {
        validation: |s| {
            if s.is_empty() {
                Err(ValidationError::EmptyInterfaceName)
            } else if s.len() > MAX_IFNAME_LEN
                || s.contains('/')
                || s.chars().any(char::is_whitespace)
            {
                Err(ValidationError::InvalidInterfaceName(s.clone()))
            } else {
                Ok(())
            }
        },
    }
}

/// A canonicalized WireGuard public key
///
/// Constructed from the base64 text form emitted by the kernel/`wg` tool.
/// The constructor decodes and re-encodes the key, so two textual spellings
/// of the same 32-byte key always compare (and label) identically.
///
/// # Examples
/// ```
/// use wg_exporter::types::PublicKey;
///
/// let key = PublicKey::new("HYf+yNzgj3uhARFlNy3Pawuk/yLC+WYoY2qwjjlSxxI=").unwrap();
/// assert_eq!(key.as_str().len(), 44);
///
/// assert!(PublicKey::new("not-a-key").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    /// Decode, validate and canonicalize a base64 public key
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let text = text.as_ref().trim();
        let bytes = BASE64
            .decode(text)
            .map_err(|_| ValidationError::InvalidPublicKey(text.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(ValidationError::InvalidPublicKey(text.to_string()));
        }
        Ok(Self(BASE64.encode(bytes)))
    }

    /// Get the canonical base64 form
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PublicKey {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PublicKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// A validated network port number that cannot be zero
///
/// # Examples
/// ```
/// use wg_exporter::types::Port;
///
/// let port = Port::new(9011).unwrap();
/// assert_eq!(port.get(), 9011);
///
/// assert!(Port::new(0).is_none());
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(NonZeroU16);

impl Port {
    /// Default exporter listen port (9011)
    pub const DEFAULT: Self = match NonZeroU16::new(9011) {
        Some(nz) => Self(nz),
        None => unreachable!(),
    };

    /// Create a new port, returning None if the value is 0
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        match NonZeroU16::new(value) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Get the inner value
    #[must_use]
    #[inline]
    pub const fn get(&self) -> u16 {
        self.0.get()
    }
}

impl Default for Port {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s.parse::<u16>().map_err(|_| ValidationError::InvalidPort)?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl Serialize for Port {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.get())
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u16::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("port cannot be 0"))
    }
}

/// Helper for deserializing Duration from seconds in TOML configs
pub mod duration_serde {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Helper for deserializing Option<Duration> from seconds
pub mod option_duration_serde {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
