//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod hero;
pub mod like;
pub mod notification;
pub mod payment;
pub mod quota;
pub mod user;

// Re-export commonly used models
pub use hero::Hero;
pub use like::{LikeEdge, LikeKind, LikeResult, LikesBetween, ResolvedEdge};
pub use notification::{CreateNotificationRequest, Notification, NotificationMetadata, NotificationType};
pub use payment::{Payment, PaymentStatus};
pub use quota::{LikesInfo, QuotaKind, QuotaRecord, QuotaSnapshot};
pub use user::{
    CreateUserRequest, GameRole, ModerationStatus, Profile, ProfileHero, ProfileSubmission, ProfileSummary,
    UpdatePreferencesRequest, User, UserRole, MAX_PREFERENCES,
};
