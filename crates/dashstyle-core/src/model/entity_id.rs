// ── Entity identifiers ──
//
// The host names every entity `domain.object_id`. Both halves are
// non-empty and made of lowercase ASCII letters, digits and `_`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated `domain.object_id` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityIdError {
    #[error("entity id must not be empty")]
    Empty,
    #[error("entity id '{0}' must have the form domain.object_id")]
    MissingSeparator(String),
    #[error("entity id '{0}' may only contain lowercase letters, digits and '_'")]
    InvalidCharacter(String),
}

impl EntityId {
    pub fn parse(raw: &str) -> Result<Self, EntityIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EntityIdError::Empty);
        }
        let Some((domain, object_id)) = raw.split_once('.') else {
            return Err(EntityIdError::MissingSeparator(raw.to_owned()));
        };
        if domain.is_empty() || object_id.is_empty() {
            return Err(EntityIdError::MissingSeparator(raw.to_owned()));
        }
        if !is_slug(domain) || !is_slug(object_id) {
            return Err(EntityIdError::InvalidCharacter(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        domain_of(&self.0)
    }

    pub fn object_id(&self) -> &str {
        object_id_of(&self.0)
    }
}

fn is_slug(part: &str) -> bool {
    part.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Domain part of a raw id; the whole string when there is no `.`.
pub fn domain_of(raw: &str) -> &str {
    raw.split_once('.').map_or(raw, |(domain, _)| domain)
}

/// Object-id part of a raw id; the whole string when there is no `.`.
pub fn object_id_of(raw: &str) -> &str {
    raw.split_once('.').map_or(raw, |(_, object_id)| object_id)
}

/// `living_room_lamp` → `living room lamp`.
pub fn humanize_object_id(raw: &str) -> String {
    object_id_of(raw).replace('_', " ")
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_and_object_id() {
        let id: EntityId = "light.kitchen_main".parse().unwrap();
        assert_eq!(id.domain(), "light");
        assert_eq!(id.object_id(), "kitchen_main");
        assert_eq!(id.to_string(), "light.kitchen_main");
    }

    #[test]
    fn rejects_bad_grammar() {
        assert_eq!(EntityId::parse("  "), Err(EntityIdError::Empty));
        assert!(matches!(
            EntityId::parse("kitchen"),
            Err(EntityIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            EntityId::parse("light."),
            Err(EntityIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            EntityId::parse("Light.Kitchen"),
            Err(EntityIdError::InvalidCharacter(_))
        ));
        assert!(matches!(
            EntityId::parse("light.kitchen.main"),
            Err(EntityIdError::InvalidCharacter(_))
        ));
        assert!(matches!(
            EntityId::parse("light.kitchen-main"),
            Err(EntityIdError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn deserialization_validates() {
        let ok: EntityId = serde_json::from_str(r#""sensor.temp_1""#).unwrap();
        assert_eq!(ok.as_str(), "sensor.temp_1");
        assert!(serde_json::from_str::<EntityId>(r#""not an id""#).is_err());
    }

    #[test]
    fn humanizes_object_id() {
        assert_eq!(humanize_object_id("light.living_room_lamp"), "living room lamp");
        assert_eq!(domain_of("weird"), "weird");
    }
}
