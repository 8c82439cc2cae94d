//! XPath subset used by patch operations to select document nodes.
//!
//! Only absolute location paths are supported. See [`XPathParser`] for the
//! accepted grammar.

mod eval;
mod parser;
mod types;

pub use eval::XPathEval;
pub use parser::{PathError, XPathParser};
pub use types::*;
