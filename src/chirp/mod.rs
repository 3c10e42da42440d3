// Public API - what other modules can use
pub use models::ChirpModel;
pub use repository::{ChirpRepository, InMemoryChirpRepository, PostgresChirpRepository};
pub use service::ChirpService;
pub use types::{ChirpResponse, CreateChirpRequest, ListChirpsQuery, SortOrder};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
