pub mod assemble;
pub mod base;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod load;
pub mod parse;
pub mod sample;

pub use assemble::RequestAssembler;
pub use assemble::request::PreparedRequest;
pub use batch::{BatchHandle, BatchResult, Failure, Importer};
pub use dispatch::{DirectorySink, Dispatch};
pub use extract::{BodySource, Operation};
pub use fetch::HttpFetcher;
pub use load::SpecLoader;
pub use parse::spec::SpecDocument;
