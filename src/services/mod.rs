// Service exports
pub mod ark;
pub mod backend;
pub mod storage;
pub mod store;
pub mod weather;

pub use ark::{ArkClient, ArkError, ChatCall, ChatOutput};
pub use backend::{ChatConfig, ConfigError, ConfigResolver, ImageGenConfig};
pub use storage::{is_storage_ref, FileStorage, StorageError};
pub use store::{DocumentStore, QueryOptions, StoreCollections, StoreError};
pub use weather::{WeatherClient, WeatherError};
