//! Data module - source loading, caching, cleaning and filtering

mod cache;
mod loader;
mod processor;
mod schema;

pub use cache::SessionCache;
pub use loader::{
    parse_timestamp, DataLoader, DataSource, FileSource, HttpSource, LoadedDataset, LoaderError,
};
pub(crate) use loader::string_values;
pub use processor::{DataProcessor, DateRange, FilterParams, ProcessorError};
pub use schema::DatasetSchema;
