pub mod appinfo;
pub mod documents;
pub mod filestore;
pub mod senders;
pub mod tags;
pub mod uploads;
