pub mod create_admin;
pub mod initdb;
pub mod openapi;
pub mod serve;

pub use create_admin::create_admin;
pub use initdb::init_database;
pub use openapi::print_openapi;
pub use serve::serve;
