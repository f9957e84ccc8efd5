pub mod extractor;
pub mod loader;
pub mod types;
pub mod utils;

pub use extractor::TotalsExtractor;
pub use loader::SheetLoader;
