//! Whitespace and comment minifiers for release output.
//!
//! Both minifiers are single-pass scanners, not parsers: they only remove
//! bytes that are insignificant in every context they can recognise, and
//! copy anything they cannot classify verbatim.
//!
//! | Input | Removed | Preserved verbatim |
//! |---|---|---|
//! | HTML | comments, whitespace runs, whitespace inside tags | `pre`, `textarea`, `script`, `style`, conditional comments, quoted attributes |
//! | JS | comments, indentation, blank lines | string, template and regex literals, newlines that may end a statement |

mod html;
mod js;

pub use html::minify_html;
pub use js::minify_js;
