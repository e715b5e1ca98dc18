use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::warn;

/// Which part of the original message tree a fork carries over.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum ForkOption {
    /// Root-to-target chain only.
    #[default]
    #[serde(alias = "directPath", alias = "direct-path")]
    #[strum(to_string = "DIRECT_PATH", serialize = "directPath", serialize = "direct-path")]
    DirectPath,
    /// The chain plus every sibling branch hanging off it, without their subtrees.
    #[serde(alias = "includeBranches", alias = "include-branches")]
    #[strum(
        to_string = "INCLUDE_BRANCHES",
        serialize = "includeBranches",
        serialize = "include-branches"
    )]
    IncludeBranches,
    /// Every message, in every branch, no deeper than the target.
    #[serde(alias = "targetLevel", alias = "target-level")]
    #[strum(to_string = "TARGET_LEVEL", serialize = "targetLevel", serialize = "target-level")]
    TargetLevel,
}

impl ForkOption {
    /// Parse an option as sent by a client, falling back to `fallback` when it
    /// is missing or not recognized.
    pub fn parse_or(value: Option<&str>, fallback: ForkOption) -> ForkOption {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return fallback;
        };

        ForkOption::from_str(raw).unwrap_or_else(|_| {
            warn!(
                target: "twig::fork",
                option = raw,
                fallback = %fallback,
                "Unrecognized fork option, using fallback"
            );
            fallback
        })
    }
}
