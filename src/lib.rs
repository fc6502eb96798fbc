// Library for tests to access modules

pub mod clock;
pub mod config;
pub mod feed;
pub mod history_repo;
pub mod models;
pub mod recorder;
pub mod routes;
pub mod version;
pub mod worker;
