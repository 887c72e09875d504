//! Convenience re-exports for common Pulseboard usage
//!
//! ```rust
//! use pulseboard::prelude::*;
//! ```

// Application context and errors
pub use crate::api::{router, ApiError};
pub use crate::core::AppContext;
pub use crate::errors::PulseboardError;
pub use crate::migration::FALLBACK_SCHEMA;

// Entity services and their filters
pub use crate::services::ads::{AdPlatform, CampaignFilter, CampaignStatus};
pub use crate::services::consumer_voice::VoiceFilter;
pub use crate::services::insight_search::InsightFilter;
pub use crate::services::kol::{KolFilter, VideoFilter};
pub use crate::services::kol_2024::Kol2024Filter;
pub use crate::services::private_channel::{Channel, ChannelQuery};
pub use crate::services::self_media::{AccountFilter, ContentFilter, SelfMediaPlatform};
pub use crate::services::testing::{ExecutionFilter, IdeaFilter, NewTestIdea};
pub use crate::services::tiktok_creator::CreatorFilter;
pub use crate::services::tiktok_product::ProductFilter;
pub use crate::services::{
    AdService, ConsumerVoiceService, InsightSearchService, Kol2024Service, KolService, OrFallback,
    PrivateChannelService, SelfMediaService, ServiceOptions, TestingService, TikTokCreatorService,
    TikTokProductService,
};

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, DatabaseConfig, ServerConfig};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Re-export cache system
pub use cache_system::prelude::*;

// Common external dependencies
pub use tokio;
