use std::fmt;

use thiserror::Error;

/// Which enum-like string a parse failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    Level,
    WaveState,
    EvolutionPhase,
    EvolutionDirection,
    TransitionType,
    ParticipationType,
    ParticipationLevel,
    EngagementState,
    RankBy,
    ContributionCategory,
    ContributionStatus,
    VerificationStatus,
    VerificationType,
    ConfidenceLevel,
    ValidationSeverity,
    DomainType,
    DomainState,
    ConceptType,
    RelationType,
    OutputFormat,
    DisplayStyle,
    ReportKind,
}

impl EnumKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EnumKind::Level => "validation level",
            EnumKind::WaveState => "wave state",
            EnumKind::EvolutionPhase => "evolution phase",
            EnumKind::EvolutionDirection => "evolution direction",
            EnumKind::TransitionType => "transition type",
            EnumKind::ParticipationType => "participation type",
            EnumKind::ParticipationLevel => "participation level",
            EnumKind::EngagementState => "engagement state",
            EnumKind::RankBy => "ranking key",
            EnumKind::ContributionCategory => "contribution category",
            EnumKind::ContributionStatus => "contribution status",
            EnumKind::VerificationStatus => "verification status",
            EnumKind::VerificationType => "verification type",
            EnumKind::ConfidenceLevel => "confidence level",
            EnumKind::ValidationSeverity => "validation severity",
            EnumKind::DomainType => "domain type",
            EnumKind::DomainState => "domain state",
            EnumKind::ConceptType => "concept type",
            EnumKind::RelationType => "relation type",
            EnumKind::OutputFormat => "output format",
            EnumKind::DisplayStyle => "display style",
            EnumKind::ReportKind => "report kind",
        }
    }
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value '{raw}'; expected one of: {expected:?}")]
pub struct EnumParseError {
    kind: EnumKind,
    raw: String,
    expected: &'static [&'static str],
}

impl EnumParseError {
    #[must_use]
    pub fn new(kind: EnumKind, raw: impl Into<String>, expected: &'static [&'static str]) -> Self {
        Self {
            kind,
            raw: raw.into(),
            expected,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EnumKind {
        self.kind
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub const fn expected(&self) -> &'static [&'static str] {
        self.expected
    }
}

/// Declares a fieldless enum whose variants map one-to-one onto lowercase
/// strings, with `as_str`, `parse`, `all`, `Display` and `FromStr`.
///
/// Serde derives are left to the caller; pair them with
/// `#[serde(rename_all = "snake_case")]` so both spellings agree.
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            const NAMES: &'static [&'static str] = &[$($text),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            #[must_use]
            pub const fn all() -> &'static [$name] {
                &[$( $name::$variant ),+]
            }

            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::EnumParseError> {
                let trimmed = raw.trim();
                match trimmed.to_ascii_lowercase().as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err($crate::EnumParseError::new(
                        $crate::EnumKind::$kind,
                        trimmed,
                        Self::NAMES,
                    )),
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::EnumParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}
