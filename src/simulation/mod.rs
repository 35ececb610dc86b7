pub mod catalog;
pub mod completion;
pub mod notify;
pub mod predicate_library;
pub mod predicates;
pub mod progress;
pub mod time;
pub mod timed;
pub mod tracker;
pub mod world_query;
