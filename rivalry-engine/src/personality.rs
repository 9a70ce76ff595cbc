//! Rival personalities and the victory condition each one plays by.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Beat your own rolling average.
    Mirror,
    /// Best two of three categories, head to head.
    #[default]
    Rival,
    /// Out-grow the mentor week over week.
    Mentor,
    /// Composite score with chaos injected into the rival's side.
    Nemesis,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown rival personality {0:?} (expected mirror, rival, mentor or nemesis)")]
pub struct PersonalityParseError(pub String);

impl Personality {
    pub const ALL: [Self; 4] = [Self::Mirror, Self::Rival, Self::Mentor, Self::Nemesis];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mirror => "mirror",
            Self::Rival => "rival",
            Self::Mentor => "mentor",
            Self::Nemesis => "nemesis",
        }
    }

    /// How the opponent is referred to in narrative text.
    #[must_use]
    pub const fn opponent_label(self) -> &'static str {
        match self {
            Self::Mirror => "your past self",
            Self::Rival => "your rival",
            Self::Mentor => "your mentor",
            Self::Nemesis => "your nemesis",
        }
    }

    /// Tolerant parse for callers that accept unvalidated tags.
    ///
    /// Unknown values fall back to [`Personality::Rival`].
    #[must_use]
    pub fn parse_or_default(tag: &str) -> Self {
        tag.parse().unwrap_or_else(|err: PersonalityParseError| {
            log::warn!("{err}; falling back to rival rules");
            Self::Rival
        })
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = PersonalityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirror" => Ok(Self::Mirror),
            "rival" => Ok(Self::Rival),
            "mentor" => Ok(Self::Mentor),
            "nemesis" => Ok(Self::Nemesis),
            _ => Err(PersonalityParseError(s.to_string())),
        }
    }
}

impl From<Personality> for String {
    fn from(value: Personality) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!("Mirror".parse::<Personality>(), Ok(Personality::Mirror));
        assert_eq!(" nemesis ".parse::<Personality>(), Ok(Personality::Nemesis));
        for p in Personality::ALL {
            assert_eq!(p.as_str().parse::<Personality>(), Ok(p));
        }
    }

    #[test]
    fn rejects_unknown_tags() {
        let err = "frenemy".parse::<Personality>().unwrap_err();
        assert_eq!(err, PersonalityParseError("frenemy".to_string()));
        assert!(err.to_string().contains("frenemy"));
    }

    #[test]
    fn tolerant_parse_falls_back_to_rival() {
        assert_eq!(Personality::parse_or_default("frenemy"), Personality::Rival);
        assert_eq!(Personality::parse_or_default("mentor"), Personality::Mentor);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&Personality::Mentor).unwrap();
        assert_eq!(json, "\"mentor\"");
        assert!(serde_json::from_str::<Personality>("\"boss\"").is_err());
    }
}
