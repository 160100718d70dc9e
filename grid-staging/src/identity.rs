use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SERVER_PREFIX: &str = "srv:";
const TEMP_PREFIX: &str = "tmp:";

/// Identifier issued by the backend for a persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Client-only placeholder for a row that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(u64);

impl TempId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Identity of a row in a working set. Grid widgets key their rows by
/// [`Identity::row_key`] so unsaved rows render before they have a server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity {
    Server(ServerId),
    Temp(TempId),
}

impl Identity {
    pub fn is_temp(&self) -> bool {
        matches!(self, Identity::Temp(_))
    }

    pub fn server_id(&self) -> Option<&ServerId> {
        match self {
            Identity::Server(id) => Some(id),
            Identity::Temp(_) => None,
        }
    }

    pub fn temp_id(&self) -> Option<TempId> {
        match self {
            Identity::Temp(id) => Some(*id),
            Identity::Server(_) => None,
        }
    }

    pub fn row_key(&self) -> String {
        match self {
            Identity::Server(id) => format!("{SERVER_PREFIX}{id}"),
            Identity::Temp(id) => format!("{TEMP_PREFIX}{}", id.raw()),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Server(id) => write!(f, "{id}"),
            Identity::Temp(id) => write!(f, "{id}"),
        }
    }
}

impl From<ServerId> for Identity {
    fn from(id: ServerId) -> Self {
        Identity::Server(id)
    }
}

impl From<TempId> for Identity {
    fn from(id: TempId) -> Self {
        Identity::Temp(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid row key: {0}")]
pub struct RowKeyError(pub String);

impl FromStr for Identity {
    type Err = RowKeyError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        if let Some(id) = key.strip_prefix(SERVER_PREFIX) {
            if id.is_empty() {
                return Err(RowKeyError(key.to_string()));
            }
            return Ok(Identity::Server(ServerId::new(id)));
        }
        if let Some(raw) = key.strip_prefix(TEMP_PREFIX) {
            return raw
                .parse::<u64>()
                .map(|n| Identity::Temp(TempId::new(n)))
                .map_err(|_| RowKeyError(key.to_string()));
        }
        Err(RowKeyError(key.to_string()))
    }
}

/// Serde adapter for master references carried inside detail payloads.
///
/// The wire form is the bare server id. Serializing a reference that still
/// points at a temp id fails: the commit runtime rebinds detail payloads
/// before they are sent.
pub mod as_server_id {
    use super::{Identity, ServerId};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(identity: &Identity, serializer: S) -> Result<S::Ok, S::Error> {
        match identity {
            Identity::Server(id) => serializer.serialize_str(id.as_str()),
            Identity::Temp(id) => Err(serde::ser::Error::custom(format!(
                "master reference {id} has not been persisted"
            ))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Identity, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Identity::Server(ServerId::new(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_keys_parse_back() {
        let server = Identity::Server(ServerId::new("R-17"));
        let temp = Identity::Temp(TempId::new(42));

        assert_eq!(server.row_key(), "srv:R-17");
        assert_eq!(temp.row_key(), "tmp:42");
        assert_eq!(server.row_key().parse::<Identity>().unwrap(), server);
        assert_eq!(temp.row_key().parse::<Identity>().unwrap(), temp);
    }

    #[test]
    fn malformed_row_keys_are_rejected() {
        assert!("R-17".parse::<Identity>().is_err());
        assert!("tmp:abc".parse::<Identity>().is_err());
        assert!("srv:".parse::<Identity>().is_err());
    }

    #[test]
    fn temp_master_reference_does_not_serialize() {
        #[derive(serde::Serialize)]
        struct Detail {
            #[serde(with = "as_server_id")]
            master: Identity,
        }

        let ok = serde_json::to_string(&Detail { master: ServerId::new("9").into() }).unwrap();
        assert_eq!(ok, r#"{"master":"9"}"#);

        let err = serde_json::to_string(&Detail { master: TempId::new(1).into() });
        assert!(err.is_err());
    }
}
