pub mod eas;
pub mod indexer;
pub mod trainer;
