//! Lenient deserializers for query strings, where an absent value often
//! arrives as an empty string.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// `""` → `None`; anything else must parse as a UUID and is converted into
/// the target id type.
pub fn deserialize_optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<Uuid>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(|id| Some(T::from(id)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// `""` or whitespace → `None`.
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "empty_string_as_none")]
        semester: Option<String>,
    }

    #[test]
    fn test_empty_values_become_none() {
        let q: Query = serde_json::from_str(r#"{"id":"","semester":"  "}"#).unwrap();
        assert!(q.id.is_none());
        assert!(q.semester.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let q: Query =
            serde_json::from_str(&format!(r#"{{"id":"{}","semester":"Semester 1"}}"#, id))
                .unwrap();
        assert_eq!(q.id, Some(id));
        assert_eq!(q.semester.as_deref(), Some("Semester 1"));
    }

    #[test]
    fn test_invalid_uuid_is_an_error() {
        assert!(serde_json::from_str::<Query>(r#"{"id":"nope"}"#).is_err());
    }
}
