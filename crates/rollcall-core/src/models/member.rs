use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::format::{blank_to_none, format_phone};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown gender: {0}")]
    UnknownSex(String),

    #[error("Unknown category: {0}")]
    UnknownTrack(String),

    #[error("Name is required")]
    MissingName,
}

/// Sex category of a member. Wire and storage form is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export, rename_all = "lowercase"))]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    /// Spreadsheet-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(ValidationError::UnknownSex(s.to_string())),
        }
    }
}

impl From<Sex> for &'static str {
    fn from(sex: Sex) -> Self {
        sex.as_str()
    }
}

impl TryFrom<String> for Sex {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Class track a member belongs to.
///
/// `Regular` is the main weekly class. The two preparatory tracks meet on
/// their own shorter calendars. Wire and storage form is kebab-case; decoding
/// also accepts upper case and underscores (`TEMPLE_PREP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export, rename_all = "kebab-case"))]
pub enum Track {
    #[default]
    Regular,
    TemplePrep,
    MissionPrep,
}

impl Track {
    pub const PREPARATORY: [Track; 2] = [Track::TemplePrep, Track::MissionPrep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Regular => "regular",
            Track::TemplePrep => "temple-prep",
            Track::MissionPrep => "mission-prep",
        }
    }

    /// Human-readable name used in exported reports
    pub fn label(&self) -> &'static str {
        match self {
            Track::Regular => "REGULAR",
            Track::TemplePrep => "TEMPLE PREP",
            Track::MissionPrep => "MISSION PREP",
        }
    }

    pub fn is_preparatory(&self) -> bool {
        !matches!(self, Track::Regular)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Track {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "regular" => Ok(Track::Regular),
            "temple-prep" => Ok(Track::TemplePrep),
            "mission-prep" => Ok(Track::MissionPrep),
            _ => Err(ValidationError::UnknownTrack(s.to_string())),
        }
    }
}

impl From<Track> for &'static str {
    fn from(track: Track) -> Self {
        track.as_str()
    }
}

impl TryFrom<String> for Track {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Member {
    pub id: i64,
    pub name: String,
    #[serde(rename = "gender")]
    pub sex: Sex,
    #[serde(rename = "category")]
    pub track: Track,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Phone formatted as (XXX) XXX-XXXX when it is a US number
    pub fn formatted_phone(&self) -> Option<String> {
        self.phone.as_deref().map(format_phone)
    }

    pub fn is_regular(&self) -> bool {
        self.track == Track::Regular
    }
}

/// Input shape for creating or replacing a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewMember {
    pub name: String,
    #[serde(rename = "gender")]
    pub sex: Sex,
    #[serde(rename = "category", default)]
    pub track: Track,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, sex: Sex, track: Track) -> Self {
        Self {
            name: name.into(),
            sex,
            track,
            email: None,
            phone: None,
        }
    }

    /// Trim the name and drop blank optional fields, rejecting a blank name.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        self.email = blank_to_none(self.email);
        self.phone = blank_to_none(self.phone);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_from_str_accepts_all_spellings() {
        assert_eq!("regular".parse::<Track>(), Ok(Track::Regular));
        assert_eq!("REGULAR".parse::<Track>(), Ok(Track::Regular));
        assert_eq!("temple-prep".parse::<Track>(), Ok(Track::TemplePrep));
        assert_eq!("TEMPLE_PREP".parse::<Track>(), Ok(Track::TemplePrep));
        assert_eq!("mission_prep".parse::<Track>(), Ok(Track::MissionPrep));
        assert!("elders".parse::<Track>().is_err());
    }

    #[test]
    fn test_track_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&Track::TemplePrep).unwrap(), "\"temple-prep\"");
        let parsed: Track = serde_json::from_str("\"MISSION_PREP\"").unwrap();
        assert_eq!(parsed, Track::MissionPrep);
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!("MALE".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!("f".parse::<Sex>(), Ok(Sex::Female));
        assert!("other".parse::<Sex>().is_err());
    }

    #[test]
    fn test_new_member_defaults_to_regular() {
        let json = r#"{"name": "Ada Lovelace", "gender": "female"}"#;
        let member: NewMember = serde_json::from_str(json).unwrap();
        assert_eq!(member.track, Track::Regular);
        assert_eq!(member.sex, Sex::Female);
    }

    #[test]
    fn test_new_member_validate() {
        let mut input = NewMember::new("  Ada Lovelace ", Sex::Female, Track::Regular);
        input.email = Some("   ".to_string());
        let valid = input.validate().unwrap();
        assert_eq!(valid.name, "Ada Lovelace");
        assert_eq!(valid.email, None);

        let blank = NewMember::new("  ", Sex::Male, Track::Regular);
        assert_eq!(blank.validate(), Err(ValidationError::MissingName));
    }
}
