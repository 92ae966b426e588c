use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which stored channels of a playlist are reconsidered on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionStrategy {
    /// Every stored channel is a candidate for removal.
    All,
    /// Only channels that are not favourites are candidates.
    #[default]
    SkipFavorite,
    /// Nothing is removed; fresh channels are upserted on top.
    KeepAll,
}

impl fmt::Display for RetentionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetentionStrategy::All => "all",
            RetentionStrategy::SkipFavorite => "skip-favorite",
            RetentionStrategy::KeepAll => "keep-all",
        };
        f.write_str(name)
    }
}

impl FromStr for RetentionStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all" => Ok(RetentionStrategy::All),
            "skip-favorite" | "skip-favourite" => Ok(RetentionStrategy::SkipFavorite),
            "keep-all" => Ok(RetentionStrategy::KeepAll),
            other => Err(AppError::InvalidArgument(format!(
                "unknown retention strategy '{}'",
                other
            ))),
        }
    }
}

/// Connect timeout presets for network playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectTimeout {
    #[default]
    Short,
    Medium,
    Long,
}

impl ConnectTimeout {
    pub fn as_millis(self) -> u64 {
        match self {
            ConnectTimeout::Short => 4_000,
            ConnectTimeout::Medium => 6_000,
            ConnectTimeout::Long => 8_000,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl fmt::Display for ConnectTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectTimeout::Short => "short",
            ConnectTimeout::Medium => "medium",
            ConnectTimeout::Long => "long",
        };
        f.write_str(name)
    }
}

impl FromStr for ConnectTimeout {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(ConnectTimeout::Short),
            "medium" => Ok(ConnectTimeout::Medium),
            "long" => Ok(ConnectTimeout::Long),
            other => Err(AppError::InvalidArgument(format!(
                "unknown connect timeout '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_accepts_both_spellings() {
        assert_eq!(
            "skip-favourite".parse::<RetentionStrategy>().unwrap(),
            RetentionStrategy::SkipFavorite
        );
        assert_eq!(
            "SKIP_FAVORITE".parse::<RetentionStrategy>().unwrap(),
            RetentionStrategy::SkipFavorite
        );
        assert!("everything".parse::<RetentionStrategy>().is_err());
    }

    #[test]
    fn timeout_presets_are_ordered() {
        assert!(ConnectTimeout::Short.duration() < ConnectTimeout::Medium.duration());
        assert!(ConnectTimeout::Medium.duration() < ConnectTimeout::Long.duration());
        assert_eq!("long".parse::<ConnectTimeout>().unwrap(), ConnectTimeout::Long);
    }
}
