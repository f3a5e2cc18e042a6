use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A kind of document stored by docstore.
///
/// Each kind owns one folder segment (its `group`) beneath the configured
/// root folder, and one metadata filename that marks a real document blob
/// inside a per-key folder. Both are fixed here and never change at runtime,
/// since they are part of the persisted layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Application,
    Pipeline,
    Strategy,
    Project,
    Notification,
    ServiceAccount,
    EntityTags,
}

impl ObjectType {
    /// Every object type, in declaration order.
    pub const ALL: [ObjectType; 7] = [
        Self::Application,
        Self::Pipeline,
        Self::Strategy,
        Self::Project,
        Self::Notification,
        Self::ServiceAccount,
        Self::EntityTags,
    ];

    /// Folder segment under the root folder.
    pub const fn group(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Pipeline => "pipeline",
            Self::Strategy => "pipeline-strategy",
            Self::Project => "project",
            Self::Notification => "notification",
            Self::ServiceAccount => "service-account",
            Self::EntityTags => "entity-tags",
        }
    }

    /// File name identifying the document blob within its per-key folder.
    pub const fn default_metadata_filename(&self) -> &'static str {
        match self {
            Self::Application => "application.json",
            Self::Pipeline => "pipeline.json",
            Self::Strategy => "pipeline-strategy.json",
            Self::Project => "project.json",
            Self::Notification => "notification.json",
            Self::ServiceAccount => "service-account.json",
            Self::EntityTags => "entity-tags.json",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    /// Accepts the group name (`service-account`) or the variant name in
    /// any case (`SERVICE_ACCOUNT`, `serviceaccount`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let squashed: String = wanted.chars().filter(|c| *c != '_' && *c != '-').collect();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.group() == wanted
                    || format!("{t:?}").to_ascii_lowercase() == squashed
            })
            .ok_or_else(|| TypeError::UnknownObjectType(s.to_string()))
    }
}
