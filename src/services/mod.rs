pub mod recommendations;
pub mod similarity;

pub use recommendations::{
    RecommendationEngine, DEFAULT_RECOMMENDATION_LIMIT, TOP_SIMILAR_USERS,
};
