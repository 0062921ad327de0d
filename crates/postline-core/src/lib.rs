pub mod app_config;
pub mod composer;
pub mod config;
pub mod copies;
pub mod error;
pub mod platform;
pub mod status;
pub mod view;

pub use app_config::{AppConfig, Environment};
pub use composer::{CopyDraft, PostComposer, ProfileRef};
pub use config::{load_app_config, load_app_config_from_env};
pub use copies::{encode_copies, parse_copies, PlatformCopy};
pub use error::{ConfigError, CoreError, ValidationError};
pub use platform::Platform;
pub use status::{
    ContentFormat, ContentType, LaunchCategory, LaunchStatus, PhaseStatus, PostStatus,
    ScheduleStatus,
};
pub use view::{day_buckets, DateRange, DayBucket, PostFilter};
