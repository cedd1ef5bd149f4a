use std::str::FromStr;

use serde::{Deserialize, Serialize, de::Visitor};

use crate::SpecVersion;

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SpecVersionVisitor;

        impl Visitor<'_> for SpecVersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a valid Ignition spec version")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                SpecVersion::from_str(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(SpecVersionVisitor)
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize() {
        let version: SpecVersion = serde_json::from_str(r#""3.2.0""#).expect("version is valid");
        assert_eq!(version, SpecVersion::V3_2);
    }

    #[test]
    fn deserialize_invalid() {
        serde_json::from_str::<SpecVersion>(r#""3.2""#).expect_err("version lacks a patch level");
    }

    #[test]
    fn serialize() {
        assert_eq!(
            r#""2.4.0""#,
            serde_json::to_string(&SpecVersion::V2_4).expect("version must serialize")
        );
    }
}
