use super::optimize::filter_attributes;
use super::{SvgError, into_string};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};

/// Presentation attributes removed from sprite icons.
const PRESENTATION_ATTRIBUTES: &[&[u8]] = &[b"fill", b"stroke", b"style"];

/// Remove `fill`, `stroke` and `style` from every element.
///
/// Text is re-serialized through the writer's escaper, which writes `>` as
/// `&gt;`; run [`unescape_gt`] on the result to restore the source markup.
pub fn strip_presentation(svg: &str) -> Result<String, SvgError> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));
    let drop = |key: &[u8]| PRESENTATION_ATTRIBUTES.contains(&key);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(tag) => {
                writer.write_event(Event::Start(filter_attributes(&tag, drop)?))?;
            }
            Event::Empty(tag) => {
                writer.write_event(Event::Empty(filter_attributes(&tag, drop)?))?;
            }
            Event::Text(text) => {
                // Entities XML does not predefine (`&nbsp;`) are kept as written
                match text.unescape().map(|raw| raw.into_owned()).ok() {
                    Some(raw) => writer.write_event(Event::Text(BytesText::new(&raw)))?,
                    None => writer.write_event(Event::Text(text))?,
                }
            }
            other => writer.write_event(other)?,
        }
    }
    into_string(writer.into_inner())
}

/// Replace every `&gt;` with a literal `>`.
pub fn unescape_gt(svg: &str) -> String {
    svg.replace("&gt;", ">")
}
