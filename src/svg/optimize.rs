use super::{SvgError, into_string};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};

/// Elements removed together with their content.
const DROPPED_ELEMENTS: &[&[u8]] = &[b"metadata", b"title", b"desc"];

/// Namespace prefixes written by drawing tools; their elements, attributes
/// and `xmlns:` declarations are removed.
const EDITOR_PREFIXES: &[&[u8]] = &[b"sodipodi", b"inkscape", b"sketch", b"rdf", b"cc", b"dc"];

fn prefix(name: &[u8]) -> Option<&[u8]> {
    name.iter().position(|&b| b == b':').map(|i| &name[..i])
}

fn is_dropped_element(name: &[u8]) -> bool {
    DROPPED_ELEMENTS.contains(&name) || prefix(name).is_some_and(|p| EDITOR_PREFIXES.contains(&p))
}

fn is_editor_attribute(key: &[u8]) -> bool {
    match prefix(key) {
        Some(b"xmlns") => EDITOR_PREFIXES.contains(&&key[6..]),
        Some(p) => EDITOR_PREFIXES.contains(&p),
        None => false,
    }
}

/// Copy a start tag without editor attributes.
pub(super) fn filter_attributes(
    tag: &BytesStart,
    drop: impl Fn(&[u8]) -> bool,
) -> Result<BytesStart<'static>, SvgError> {
    let mut out = tag.clone().into_owned();
    out.clear_attributes();
    for attr in tag.attributes() {
        let attr = attr?;
        if !drop(attr.key.as_ref()) {
            out.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    Ok(out)
}

/// Remove metadata and editor cruft from an SVG document.
pub fn optimize(svg: &str) -> Result<String, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));
    // Nesting depth inside a dropped element; 0 when copying.
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event()?;
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        match event {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Start(tag) => {
                if is_dropped_element(tag.name().as_ref()) {
                    skip_depth = 1;
                } else {
                    let tag = filter_attributes(&tag, is_editor_attribute)?;
                    writer.write_event(Event::Start(tag))?;
                }
            }
            Event::Empty(tag) => {
                if !is_dropped_element(tag.name().as_ref()) {
                    let tag = filter_attributes(&tag, is_editor_attribute)?;
                    writer.write_event(Event::Empty(tag))?;
                }
            }
            Event::Text(text) => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    writer.write_event(Event::Text(text))?;
                }
            }
            other => writer.write_event(other)?,
        }
    }
    into_string(writer.into_inner())
}
