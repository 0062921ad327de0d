//! Status and classification enums for the editorial entities.
//!
//! Post status is the only one with a validated transition graph; launch,
//! phase and schedule statuses are free assignments.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Editorial lifecycle of a [`social post`](crate::composer).
///
/// Draft → Pending → Approved → Published, with Canceled reachable from any
/// non-terminal state. Published and Canceled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Approved,
    Published,
    Canceled,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Approved => "approved",
            PostStatus::Published => "published",
            PostStatus::Canceled => "canceled",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Published | PostStatus::Canceled)
    }

    /// Whether the transition `self` → `to` is allowed.
    ///
    /// Self-transitions are allowed (a no-op update must not fail).
    #[must_use]
    pub fn can_transition(self, to: PostStatus) -> bool {
        if self == to {
            return true;
        }
        match (self, to) {
            (PostStatus::Draft, PostStatus::Pending)
            | (PostStatus::Pending, PostStatus::Approved)
            | (PostStatus::Approved, PostStatus::Published) => true,
            (from, PostStatus::Canceled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "pending" => Ok(PostStatus::Pending),
            "approved" => Ok(PostStatus::Approved),
            "published" => Ok(PostStatus::Published),
            "canceled" => Ok(PostStatus::Canceled),
            other => Err(CoreError::UnknownPostStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Reel,
    Story,
    Video,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Reel => "reel",
            ContentType::Story => "story",
            ContentType::Video => "video",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentType::Post),
            "reel" => Ok(ContentType::Reel),
            "story" => Ok(ContentType::Story),
            "video" => Ok(ContentType::Video),
            other => Err(CoreError::UnknownContentType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aspect-ratio class of a post's media. Absent means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Square,
    Portrait,
    Vertical,
    Landscape,
}

impl ContentFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentFormat::Square => "square",
            ContentFormat::Portrait => "portrait",
            ContentFormat::Vertical => "vertical",
            ContentFormat::Landscape => "landscape",
        }
    }

    /// The aspect ratio the format renders at.
    #[must_use]
    pub fn ratio(self) -> &'static str {
        match self {
            ContentFormat::Square => "1:1",
            ContentFormat::Portrait => "4:5",
            ContentFormat::Vertical => "9:16",
            ContentFormat::Landscape => "16:9",
        }
    }
}

impl std::str::FromStr for ContentFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(ContentFormat::Square),
            "portrait" => Ok(ContentFormat::Portrait),
            "vertical" => Ok(ContentFormat::Vertical),
            "landscape" => Ok(ContentFormat::Landscape),
            other => Err(CoreError::UnknownContentFormat(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchStatus {
    Planned,
    Active,
    Completed,
    Canceled,
}

impl LaunchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LaunchStatus::Planned => "planned",
            LaunchStatus::Active => "active",
            LaunchStatus::Completed => "completed",
            LaunchStatus::Canceled => "canceled",
        }
    }
}

impl std::str::FromStr for LaunchStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(LaunchStatus::Planned),
            "active" => Ok(LaunchStatus::Active),
            "completed" => Ok(LaunchStatus::Completed),
            "canceled" => Ok(LaunchStatus::Canceled),
            other => Err(CoreError::UnknownLaunchStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchCategory {
    Product,
    Campaign,
    Event,
    Partnership,
}

impl LaunchCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LaunchCategory::Product => "product",
            LaunchCategory::Campaign => "campaign",
            LaunchCategory::Event => "event",
            LaunchCategory::Partnership => "partnership",
        }
    }
}

impl std::str::FromStr for LaunchCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(LaunchCategory::Product),
            "campaign" => Ok(LaunchCategory::Campaign),
            "event" => Ok(LaunchCategory::Event),
            "partnership" => Ok(LaunchCategory::Partnership),
            other => Err(CoreError::UnknownLaunchCategory(other.to_owned())),
        }
    }
}

impl std::fmt::Display for LaunchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl PhaseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::NotStarted => "not_started",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Blocked => "blocked",
        }
    }
}

impl std::str::FromStr for PhaseStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(PhaseStatus::NotStarted),
            "in_progress" => Ok(PhaseStatus::InProgress),
            "completed" => Ok(PhaseStatus::Completed),
            "blocked" => Ok(PhaseStatus::Blocked),
            other => Err(CoreError::UnknownPhaseStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a queued publish job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Sent,
    Failed,
}

impl ScheduleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Sent => "sent",
            ScheduleStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScheduleStatus::Pending),
            "sent" => Ok(ScheduleStatus::Sent),
            "failed" => Ok(ScheduleStatus::Failed),
            other => Err(CoreError::UnknownScheduleStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_status_forward_edges() {
        assert!(PostStatus::Draft.can_transition(PostStatus::Pending));
        assert!(PostStatus::Pending.can_transition(PostStatus::Approved));
        assert!(PostStatus::Approved.can_transition(PostStatus::Published));
    }

    #[test]
    fn post_status_rejects_skipped_stages() {
        assert!(!PostStatus::Draft.can_transition(PostStatus::Approved));
        assert!(!PostStatus::Draft.can_transition(PostStatus::Published));
        assert!(!PostStatus::Pending.can_transition(PostStatus::Published));
    }

    #[test]
    fn post_status_rejects_backward_edges() {
        assert!(!PostStatus::Approved.can_transition(PostStatus::Pending));
        assert!(!PostStatus::Published.can_transition(PostStatus::Draft));
    }

    #[test]
    fn canceled_is_reachable_from_non_terminal_states_only() {
        assert!(PostStatus::Draft.can_transition(PostStatus::Canceled));
        assert!(PostStatus::Pending.can_transition(PostStatus::Canceled));
        assert!(PostStatus::Approved.can_transition(PostStatus::Canceled));
        assert!(!PostStatus::Published.can_transition(PostStatus::Canceled));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in [
            PostStatus::Draft,
            PostStatus::Pending,
            PostStatus::Approved,
            PostStatus::Published,
        ] {
            assert!(!PostStatus::Canceled.can_transition(to));
        }
        assert!(!PostStatus::Published.can_transition(PostStatus::Canceled));
    }

    #[test]
    fn self_transition_is_a_no_op_not_an_error() {
        assert!(PostStatus::Published.can_transition(PostStatus::Published));
        assert!(PostStatus::Canceled.can_transition(PostStatus::Canceled));
    }

    #[test]
    fn statuses_round_trip_through_storage_strings() {
        for status in [
            PostStatus::Draft,
            PostStatus::Pending,
            PostStatus::Approved,
            PostStatus::Published,
            PostStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert_eq!("not_started".parse::<PhaseStatus>().unwrap(), PhaseStatus::NotStarted);
        assert_eq!("vertical".parse::<ContentFormat>().unwrap().ratio(), "9:16");
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        assert!("archived".parse::<PostStatus>().is_err());
        assert!("paused".parse::<ScheduleStatus>().is_err());
    }
}
