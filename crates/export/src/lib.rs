//! Portfolio export: turns the mirrored profile and achievement data into a
//! paginated document model.
//!
//! Byte-level output (PDF or otherwise) is an external concern behind the
//! [`PortfolioRenderer`] contract; [`PlainTextRenderer`] is the reference
//! implementation used by the tests.

pub mod document;
pub mod error;
pub mod render;

pub use document::{build_portfolio, Block, Page, PageLayout, PortfolioDocument};
pub use error::{ExportError, Result};
pub use render::{PlainTextRenderer, PortfolioRenderer};
