//! Record identifiers

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const TEMPORARY_PREFIX: &str = "tmp-";

static NEXT_TEMPORARY: AtomicU64 = AtomicU64::new(1);

/// Identifier of a parent record (todo list or note).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParentId(String);

impl ParentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a child record (todo item or attachment).
///
/// Server-issued ids are opaque. Ids minted by [`ChildId::temporary`] stand in
/// for records the server has not confirmed yet; they are never sent to the
/// server and are replaced wholesale once the real id is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChildId(String);

impl ChildId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a process-unique temporary id.
    ///
    /// Backed by a monotonic counter, so two calls in the same scheduling
    /// turn can never collide.
    #[must_use]
    pub fn temporary() -> Self {
        let n = NEXT_TEMPORARY.fetch_add(1, Ordering::Relaxed);
        Self(format!("{TEMPORARY_PREFIX}{n}"))
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_string_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

impl_string_id!(ParentId);
impl_string_id!(ChildId);

/// Backends disagree on whether ids are strings or integers; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}
