//! Script task: `src/js/*.js` → `<tree>/js/<stem>.min.js`.
//!
//! Development copies the source unchanged; release runs it through
//! [`minify_js`]. Each script is independent, so one unreadable file never
//! blocks the others.

use crate::minify::minify_js;
use crate::naming::{file_stem, min_name};
use crate::paths::Category;
use crate::sources::{self, SourceError};
use crate::task::{BuildContext, TaskOutput, passthrough, write_output};
use std::fs;

pub fn run(ctx: &BuildContext) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(Category::Scripts);
    let files = sources::resolve(&entry.sources)?;
    let release = ctx.mode.is_release();

    Ok(passthrough(&files, |source| {
        let code = fs::read_to_string(&source.path)?;
        let code = if release { minify_js(&code) } else { code };
        let target = entry.output.join(min_name(&file_stem(&source.path), "js"));
        write_output(&target, code)?;
        Ok::<_, std::io::Error>(vec![target])
    }))
}
