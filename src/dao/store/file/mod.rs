mod config;
mod error;
mod store;

pub use config::FileConfig;
pub use error::FileStoreError;
pub use store::FileStore;
