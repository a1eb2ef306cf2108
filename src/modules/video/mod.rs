pub mod handle;
pub mod model;
pub mod repository;
pub mod repository_pg;
pub mod route;
pub mod schema;
pub mod service;


pub use model::VideoConfig;
pub use repository_pg::VideoRepositoryPg;
pub use service::VideoService;
