//! Query system for concept graphs
//!
//! Every algorithm here talks to the graph only through the `GraphStore`
//! trait, so results are the same whichever backend holds the data.

mod engine;
mod learning;
mod path;
mod stats;
mod types;

pub use engine::QueryEngine;
pub use learning::{LearningPathQuery, DEFAULT_LEARNING_DEPTH};
pub use path::PathQuery;
pub use stats::{connected_components, StatisticsQuery};
pub use types::{
    GraphStatistics, LearningPath, LearningStep, PathResult, QueryError, QueryResult,
};
