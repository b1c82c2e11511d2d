//! Background and content SVG tasks: each file is optimized on its own and
//! written under the same name.

use crate::paths::Category;
use crate::sources::{self, SourceError};
use crate::svg::{self, SvgError};
use crate::task::{BuildContext, TaskOutput, passthrough, write_output};
use std::fs;

pub fn run(ctx: &BuildContext, category: Category) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(category);
    let files = sources::resolve(&entry.sources)?;

    Ok(passthrough(&files, |source| {
        let text = fs::read_to_string(&source.path)?;
        let optimized = svg::optimize(&text)?;
        let target = source.mirrored_path(&entry.output);
        write_output(&target, optimized)?;
        Ok::<_, SvgError>(vec![target])
    }))
}
