use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::ValidationError;

/// Video model variants offered by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoModel {
    Ray2,
    RayFlash2,
    Ray16,
}

impl VideoModel {
    /// Model name for display
    pub fn name(&self) -> &str {
        match self {
            Self::Ray2 => "Ray 2",
            Self::RayFlash2 => "Ray Flash 2",
            Self::Ray16 => "Ray 1.6",
        }
    }

    /// Model ID for API communication
    pub fn id(&self) -> &'static str {
        match self {
            Self::Ray2 => "ray-2",
            Self::RayFlash2 => "ray-flash-2",
            Self::Ray16 => "ray-1-6",
        }
    }

    /// Whether the provider accepts a clip duration for this model.
    /// Ray 1.6 has a fixed clip length.
    pub fn supports_duration(&self) -> bool {
        match self {
            Self::Ray2 | Self::RayFlash2 => true,
            Self::Ray16 => false,
        }
    }

    /// All available models
    pub fn all() -> [VideoModel; 3] {
        [Self::Ray2, Self::RayFlash2, Self::Ray16]
    }
}

impl Default for VideoModel {
    fn default() -> Self {
        Self::Ray2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    Landscape16x9,
    Square1x1,
    Portrait9x16,
    Standard4x3,
    Standard3x4,
    Ultrawide21x9,
    Ultratall9x21,
}

impl AspectRatio {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Landscape16x9 => "16:9",
            Self::Square1x1 => "1:1",
            Self::Portrait9x16 => "9:16",
            Self::Standard4x3 => "4:3",
            Self::Standard3x4 => "3:4",
            Self::Ultrawide21x9 => "21:9",
            Self::Ultratall9x21 => "9:21",
        }
    }

    pub fn all() -> [AspectRatio; 7] {
        [
            Self::Landscape16x9,
            Self::Square1x1,
            Self::Portrait9x16,
            Self::Standard4x3,
            Self::Standard3x4,
            Self::Ultrawide21x9,
            Self::Ultratall9x21,
        ]
    }
}

/// Requested clip length, only honoured by models that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipDuration {
    Short5s,
    Long9s,
}

impl ClipDuration {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Short5s => "5s",
            Self::Long9s => "9s",
        }
    }

    pub fn all() -> [ClipDuration; 2] {
        [Self::Short5s, Self::Long9s]
    }
}

// The three enumerations share string-id based parsing, display and serde.
macro_rules! wire_enum {
    ($ty:ty, $field:literal) => {
        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                <$ty>::all()
                    .into_iter()
                    .find(|v| v.id() == s)
                    .ok_or_else(|| ValidationError::UnknownValue {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.id())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum!(VideoModel, "model");
wire_enum!(AspectRatio, "aspectRatio");
wire_enum!(ClipDuration, "duration");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids() {
        assert_eq!(VideoModel::Ray2.id(), "ray-2");
        assert_eq!(VideoModel::RayFlash2.id(), "ray-flash-2");
        assert_eq!(VideoModel::Ray16.id(), "ray-1-6");
    }

    #[test]
    fn test_duration_support() {
        assert!(VideoModel::Ray2.supports_duration());
        assert!(VideoModel::RayFlash2.supports_duration());
        assert!(!VideoModel::Ray16.supports_duration());
    }

    #[test]
    fn test_parse_known_values() {
        assert_eq!("ray-1-6".parse::<VideoModel>().unwrap(), VideoModel::Ray16);
        assert_eq!("21:9".parse::<AspectRatio>().unwrap(), AspectRatio::Ultrawide21x9);
        assert_eq!(" 9s ".parse::<ClipDuration>().unwrap(), ClipDuration::Long9s);
    }

    #[test]
    fn test_parse_unknown_value_names_field() {
        let err = "ray-3".parse::<VideoModel>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownValue { field: "model", value: "ray-3".into() }
        );

        let err = "2:1".parse::<AspectRatio>().unwrap_err();
        assert!(err.to_string().contains("aspectRatio"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(VideoModel::default(), VideoModel::Ray2);
        assert_eq!(AspectRatio::default().id(), "16:9");
    }

    #[test]
    fn test_serde_uses_wire_ids() {
        let json = serde_json::to_string(&AspectRatio::Portrait9x16).unwrap();
        assert_eq!(json, "\"9:16\"");

        let model: VideoModel = serde_json::from_str("\"ray-flash-2\"").unwrap();
        assert_eq!(model, VideoModel::RayFlash2);

        assert!(serde_json::from_str::<ClipDuration>("\"7s\"").is_err());
    }
}
