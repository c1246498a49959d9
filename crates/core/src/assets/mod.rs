//! Assets module - repository, snapshot persistence, and read-side service.

mod assets_repository;
mod assets_service;
mod assets_traits;
pub mod snapshot;

// Re-export the public interface
pub use assets_repository::AssetRepository;
pub use assets_service::AssetQueryService;
pub use assets_traits::AssetRepositoryTrait;
