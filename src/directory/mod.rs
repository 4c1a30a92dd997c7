pub mod api;
pub mod client;
pub mod people_api;

pub use api::{DirectoryApi, GroupPage, PeoplePage};
pub use client::DirectoryClient;
pub use people_api::PeopleApi;
