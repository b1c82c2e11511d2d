//! SVG rewriting with quick-xml.
//!
//! Three streaming passes, each reading one document and writing another:
//!
//! - [`optimize`]: drop editor cruft (declaration, doctype, comments,
//!   `<metadata>`, `<title>`, `<desc>`, Inkscape/Sodipodi namespaces) and
//!   whitespace-only text.
//! - [`strip_presentation`]: drop `fill`, `stroke` and `style` so icons take
//!   their colour from CSS.
//! - [`parse_icon`]: split a root `<svg>` into its `viewBox` and inner markup
//!   for embedding as a `<symbol>`.
//!
//! Everything not explicitly removed is copied through with its original
//! escaping.

mod icon;
mod optimize;
mod strip;

pub use icon::{IconMarkup, parse_icon};
pub use optimize::optimize;
pub use strip::{strip_presentation, unescape_gt};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SvgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed SVG: {0}")]
    Xml(String),
    #[error("SVG output is not UTF-8")]
    Encoding,
    #[error("No root <svg> element")]
    MissingRoot,
}

impl From<quick_xml::Error> for SvgError {
    fn from(e: quick_xml::Error) -> Self {
        SvgError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SvgError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        SvgError::Xml(e.to_string())
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String, SvgError> {
    String::from_utf8(bytes).map_err(|_| SvgError::Encoding)
}
