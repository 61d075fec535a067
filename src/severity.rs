use std::{fmt::Display, str::FromStr};

use colored::{Color, ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How serious a logged event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A failure on the server side
    Error,
    /// Something worth attention that did not fail
    #[serde(alias = "warn")]
    Warning,
    /// Informational, including client errors
    Info,
}

impl Severity {
    /// Every severity, most serious first.
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    /// The lowercase name of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// The uppercase word shown in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    /// The terminal color used for the label
    pub fn color(&self) -> Color {
        match self {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Blue,
        }
    }

    /// The label wrapped in its terminal color.
    ///
    /// Whether escape codes are actually written depends on `colored`'s terminal
    /// detection (`NO_COLOR`, `CLICOLOR_FORCE`).
    pub fn styled_label(&self) -> ColoredString {
        self.label().color(self.color())
    }

    fn bit(&self) -> u8 {
        match self {
            Severity::Error => 0b001,
            Severity::Warning => 0b010,
            Severity::Info => 0b100,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when a string does not name a [Severity]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown log level {0:?}, expected one of error, warning, info")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// A set of severities that a caller wants logged.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
    /// Every severity. This is the default.
    pub const ALL: LevelSet = LevelSet(0b111);
    /// No severities at all
    pub const NONE: LevelSet = LevelSet(0);

    /// Check if the set includes `severity`
    pub fn contains(&self, severity: Severity) -> bool {
        self.0 & severity.bit() != 0
    }

    /// Return a copy of this set that also includes `severity`
    pub fn with(self, severity: Severity) -> LevelSet {
        LevelSet(self.0 | severity.bit())
    }

    /// True if nothing will be logged
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The severities in this set, most serious first
    pub fn iter(&self) -> impl Iterator<Item = Severity> + '_ {
        Severity::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        LevelSet::ALL
    }
}

impl FromIterator<Severity> for LevelSet {
    fn from_iter<T: IntoIterator<Item = Severity>>(iter: T) -> Self {
        iter.into_iter().fold(LevelSet::NONE, LevelSet::with)
    }
}

impl std::fmt::Debug for LevelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_severity() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!(" WARN ".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("Info".parse::<Severity>().unwrap(), Severity::Info);

        let err = "debug".parse::<Severity>().unwrap_err();
        assert_eq!(err, ParseSeverityError("debug".to_string()));
        assert!(err.to_string().contains("\"debug\""));
    }

    #[test]
    fn labels_and_colors() {
        assert_eq!(Severity::Error.label(), "ERROR");
        assert_eq!(Severity::Warning.label(), "WARNING");
        assert_eq!(Severity::Info.label(), "INFO");

        let styled = Severity::Error.styled_label();
        assert_eq!(styled.fgcolor, Some(Color::Red));
        assert_eq!(styled.input, "ERROR");
        assert_eq!(Severity::Warning.styled_label().fgcolor, Some(Color::Yellow));
        assert_eq!(Severity::Info.styled_label().fgcolor, Some(Color::Blue));
    }

    #[test]
    fn deserialize() {
        let levels: Vec<Severity> =
            serde_json::from_str(r#"["error", "warn", "warning", "info"]"#).unwrap();
        assert_eq!(
            levels,
            vec![
                Severity::Error,
                Severity::Warning,
                Severity::Warning,
                Severity::Info
            ]
        );
    }

    #[test]
    fn level_set() {
        let set: LevelSet = [Severity::Info].into_iter().collect();
        assert!(set.contains(Severity::Info));
        assert!(!set.contains(Severity::Error));
        assert!(!set.contains(Severity::Warning));

        let empty: LevelSet = std::iter::empty().collect();
        assert!(empty.is_empty());
        assert_eq!(empty, LevelSet::NONE);

        assert_eq!(LevelSet::default(), LevelSet::ALL);
        assert_eq!(
            LevelSet::ALL.iter().collect::<Vec<_>>(),
            Severity::ALL.to_vec()
        );
        assert_eq!(format!("{:?}", set), "{Info}");
    }
}
