//! Certificate adapters.
//!
//! - `HttpCertificateSource` - Downloads certificates over HTTPS
//! - `FileCertificateStore` - Shared on-disk cache, safe across processes
//! - `InMemoryCertificateStore` - Process-local cache for tests

mod file_store;
mod http_source;
mod in_memory_store;

pub use file_store::FileCertificateStore;
pub use http_source::HttpCertificateSource;
pub use in_memory_store::InMemoryCertificateStore;
