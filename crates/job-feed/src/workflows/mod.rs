mod harvest;
pub mod listings;
pub mod syndication;

pub use harvest::{FeedHarvest, HarvestError, HarvestSummary};
