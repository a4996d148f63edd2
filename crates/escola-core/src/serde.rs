use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Treats `?school_id=` the same as a missing parameter. Works for `Uuid`
/// and for every id newtype built from one.
pub fn deserialize_optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<Uuid>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(|uuid| Some(T::from(uuid)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Same as [`deserialize_optional_id`] for booleans sent as query text.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        active: Option<bool>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let f: Filter = serde_json::from_str(r#"{"id":"","active":""}"#).unwrap();
        assert!(f.id.is_none());
        assert!(f.active.is_none());
    }

    #[test]
    fn test_values_parse() {
        let id = Uuid::new_v4();
        let f: Filter =
            serde_json::from_str(&format!(r#"{{"id":"{id}","active":"false"}}"#)).unwrap();
        assert_eq!(f.id, Some(id));
        assert_eq!(f.active, Some(false));
    }

    #[test]
    fn test_invalid_values_error() {
        assert!(serde_json::from_str::<Filter>(r#"{"id":"nope"}"#).is_err());
        assert!(serde_json::from_str::<Filter>(r#"{"active":"maybe"}"#).is_err());
    }
}
