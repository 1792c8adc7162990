/// User-facing notices returned from operations
///
/// Operations hand these back to the caller instead of pushing them into a
/// global notification channel. The presentation layer decides how (and
/// whether) to show them; only the level/kind pairing is part of the contract.

use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Added,
    AlreadyDone,
    Extended,
    Reset,
    FirstCompletion,
    Removed,
    Loaded,
    SignedIn,
    SignedUp,
    SignedOut,
    ResetRequested,
    PasswordUpdated,
    Error,
}

impl NoticeKind {
    /// The level a notice of this kind is always shown with
    pub fn level(self) -> NoticeLevel {
        match self {
            NoticeKind::Added
            | NoticeKind::Extended
            | NoticeKind::Loaded
            | NoticeKind::SignedIn
            | NoticeKind::SignedUp
            | NoticeKind::ResetRequested
            | NoticeKind::PasswordUpdated => NoticeLevel::Success,
            NoticeKind::AlreadyDone
            | NoticeKind::Removed
            | NoticeKind::Reset
            | NoticeKind::FirstCompletion
            | NoticeKind::SignedOut => NoticeLevel::Info,
            NoticeKind::Error => NoticeLevel::Error,
        }
    }
}

/// A transient message describing the result of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Create a notice; the level always follows from the kind
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            level: kind.level(),
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn added() -> Self {
        Self::new(NoticeKind::Added, "New habit added! You can do it.")
    }

    pub fn removed() -> Self {
        Self::new(NoticeKind::Removed, "Habit removed.")
    }

    pub fn loaded(count: usize) -> Self {
        Self::new(
            NoticeKind::Loaded,
            format!("Loaded {} habit{}.", count, if count == 1 { "" } else { "s" }),
        )
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_follow_kinds() {
        assert_eq!(Notice::added().level, NoticeLevel::Success);
        assert_eq!(Notice::removed().level, NoticeLevel::Info);
        assert_eq!(
            Notice::new(NoticeKind::AlreadyDone, "x").level,
            NoticeLevel::Info
        );
        assert_eq!(Notice::new(NoticeKind::Reset, "x").level, NoticeLevel::Info);
        assert!(Notice::error("boom").is_error());
    }

    #[test]
    fn test_loaded_message_pluralizes() {
        assert_eq!(Notice::loaded(1).message, "Loaded 1 habit.");
        assert_eq!(Notice::loaded(3).message, "Loaded 3 habits.");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Notice::removed()).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["kind"], "removed");
        assert_eq!(json["message"], "Habit removed.");
    }
}
