pub mod corpus;
pub mod handlers;
pub mod ingested;
