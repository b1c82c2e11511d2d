use super::SvgError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An icon split into what a `<symbol>` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconMarkup {
    /// The root `viewBox`, or `0 0 <width> <height>` when only a size is given.
    pub view_box: Option<String>,
    /// Everything between the root `<svg>` tags, verbatim.
    pub inner: String,
}

fn attribute(tag: &BytesStart, name: &[u8]) -> Result<Option<String>, SvgError> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

/// Numeric part of a length like `24`, `24px` or `1.5em`.
fn length(value: &str) -> Option<f64> {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

fn view_box(tag: &BytesStart) -> Result<Option<String>, SvgError> {
    if let Some(vb) = attribute(tag, b"viewBox")? {
        return Ok(Some(vb));
    }
    let width = attribute(tag, b"width")?.as_deref().and_then(length);
    let height = attribute(tag, b"height")?.as_deref().and_then(length);
    Ok(match (width, height) {
        (Some(w), Some(h)) => Some(format!("0 0 {w} {h}")),
        _ => None,
    })
}

/// Split a document into its root `viewBox` and inner markup.
pub fn parse_icon(svg: &str) -> Result<IconMarkup, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut depth = 0usize;
    let mut root: Option<(Option<String>, usize)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Eof => return Err(SvgError::MissingRoot),
            Event::Start(tag) => {
                if root.is_none() {
                    if tag.name().as_ref() != b"svg" {
                        return Err(SvgError::MissingRoot);
                    }
                    root = Some((view_box(&tag)?, reader.buffer_position() as usize));
                } else {
                    depth += 1;
                }
            }
            Event::Empty(tag) if root.is_none() => {
                if tag.name().as_ref() != b"svg" {
                    return Err(SvgError::MissingRoot);
                }
                return Ok(IconMarkup {
                    view_box: view_box(&tag)?,
                    inner: String::new(),
                });
            }
            Event::End(_) => {
                if depth > 0 {
                    depth -= 1;
                } else if let Some((view_box, start)) = root.take() {
                    return Ok(IconMarkup {
                        view_box,
                        inner: svg[start..before].to_string(),
                    });
                }
            }
            _ => {}
        }
    }
}
