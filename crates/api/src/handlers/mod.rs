pub mod campaigns;
pub mod engine;
pub mod events;
pub mod jobs;
