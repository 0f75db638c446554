//! The two collections rewritten by the migration.

use decide_types::UuidEncoding;
use serde::{Deserialize, Serialize};

use crate::transform::{TransformProfile, UuidRecode};

/// Field in `trials` holding the subject UUID.
pub const SUBJECT_FIELD: &str = "subject";

/// A collection the migration knows how to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCollection {
    /// `events`: compound `addr` only.
    Events,
    /// `trials`: compound `addr` and the `subject` UUID.
    Trials,
}

impl TargetCollection {
    /// Every target, in migration order.
    pub const ALL: [Self; 2] = [Self::Events, Self::Trials];

    /// Collection name in the database.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Trials => "trials",
        }
    }

    /// The rewrites that apply to this collection.
    pub fn profile(self, encoding: UuidEncoding) -> TransformProfile {
        match self {
            Self::Events => TransformProfile {
                split_addr: true,
                recode: None,
            },
            Self::Trials => TransformProfile {
                split_addr: true,
                recode: Some(UuidRecode {
                    field: SUBJECT_FIELD.to_owned(),
                    encoding,
                }),
            },
        }
    }
}

impl core::fmt::Display for TargetCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_trials_recode() {
        assert!(TargetCollection::Events.profile(UuidEncoding::Legacy).recode.is_none());
        let trials = TargetCollection::Trials.profile(UuidEncoding::Standard);
        assert!(trials.split_addr);
        assert_eq!(
            trials.recode,
            Some(UuidRecode {
                field: "subject".to_owned(),
                encoding: UuidEncoding::Standard,
            })
        );
    }

    #[test]
    fn names() {
        assert_eq!(TargetCollection::Events.to_string(), "events");
        assert_eq!(TargetCollection::Trials.name(), "trials");
    }
}
