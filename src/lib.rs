pub mod api;
pub mod database_ops;
pub mod scrapers;

pub mod util {
    pub mod env;
    pub mod log;
}
