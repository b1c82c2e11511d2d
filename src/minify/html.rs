/// Elements whose content is copied byte for byte.
const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Strip comments and collapse whitespace in rendered HTML.
///
/// Conditional comments (`<!--[if IE]>…<![endif]-->`) survive. Whitespace
/// runs in text become a single space, so inline spacing between elements
/// is kept.
pub fn minify_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut space = false;

    while let Some(c) = rest.chars().next() {
        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").map(|i| i + 7).unwrap_or(rest.len());
            if body.starts_with("[if") {
                flush_space(&mut out, &mut space);
                out.push_str(&rest[..end]);
            }
            rest = &rest[end..];
            continue;
        }

        if c == '<' && rest[1..].starts_with(|n: char| n.is_ascii_alphabetic() || n == '/' || n == '!') {
            flush_space(&mut out, &mut space);
            let (tag, len) = read_tag(rest);
            rest = &rest[len..];
            if let Some(name) = raw_text_element(&tag) {
                let end = find_closing(rest, name);
                out.push_str(&tag);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            } else {
                out.push_str(&tag);
            }
            continue;
        }

        if c.is_whitespace() {
            space = true;
        } else {
            flush_space(&mut out, &mut space);
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn flush_space(out: &mut String, space: &mut bool) {
    if *space && !out.is_empty() {
        out.push(' ');
    }
    *space = false;
}

/// Read one tag up to and including `>`, collapsing whitespace outside
/// quoted attribute values. Returns the tag and the bytes consumed.
///
/// A quote only opens a value directly after `=`; elsewhere (`title=it's`)
/// it is an ordinary character.
fn read_tag(input: &str) -> (String, usize) {
    let mut tag = String::new();
    let mut quote: Option<char> = None;
    let mut space = false;
    let mut after_eq = false;

    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            tag.push(c);
            if c == q {
                quote = None;
                after_eq = false;
            }
            continue;
        }
        if c.is_whitespace() {
            space = true;
            continue;
        }
        let closes = c == '>' || (c == '/' && input[i + 1..].starts_with('>'));
        if space && !closes {
            tag.push(' ');
        }
        space = false;
        tag.push(c);
        match c {
            '"' | '\'' if after_eq => quote = Some(c),
            '>' => return (tag, i + 1),
            _ => {}
        }
        after_eq = c == '=';
    }
    (tag, input.len())
}

/// Name of a raw-text element opened by `tag`, if any.
fn raw_text_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name: String = tag[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.iter().copied().find(|&raw| raw == name)
}

/// Byte offset of the closing tag for `name`, or the end of input.
fn find_closing(rest: &str, name: &str) -> usize {
    rest.to_ascii_lowercase()
        .find(&format!("</{name}"))
        .unwrap_or(rest.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_between_and_inside_text() {
        let html = "<p>\n    Hello\n    <b>big</b>   world\n</p>\n";
        assert_eq!(minify_html(html), "<p> Hello <b>big</b> world </p>");
    }

    #[test]
    fn strips_comments_but_keeps_conditional_comments() {
        let html = "<div><!-- note --><!--[if IE]><p>old</p><![endif]--></div>";
        assert_eq!(
            minify_html(html),
            "<div><!--[if IE]><p>old</p><![endif]--></div>"
        );
    }

    #[test]
    fn stray_apostrophe_in_unquoted_value_does_not_swallow_the_page() {
        let html = "<img alt=it's   src=a.png>\n\n  <p>\n  next  </p>";
        assert_eq!(minify_html(html), "<img alt=it's src=a.png> <p> next </p>");
    }

    #[test]
    fn quoted_values_after_spaced_equals_keep_whitespace() {
        let html = "<a title =  \"two  words\">x</a>";
        assert_eq!(minify_html(html), "<a title = \"two  words\">x</a>");
    }

    #[test]
    fn keeps_raw_text_elements_verbatim() {
        let html = "<pre>\n  a   b\n</pre>\n<script>\n  if (a <  b) {}\n</script>";
        assert_eq!(
            minify_html(html),
            "<pre>\n  a   b\n</pre> <script>\n  if (a <  b) {}\n</script>"
        );
    }

    #[test]
    fn raw_text_matching_is_case_insensitive() {
        let html = "<TEXTAREA>  x  </TEXTAREA>  <p> y </p>";
        assert_eq!(minify_html(html), "<TEXTAREA>  x  </TEXTAREA> <p> y </p>");
    }

    #[test]
    fn tags_collapse_whitespace_outside_quotes() {
        let html = "<a   class=\"btn   big\"\n   href='/x' >go</a><br />";
        assert_eq!(
            minify_html(html),
            "<a class=\"btn   big\" href='/x'>go</a><br/>"
        );
    }

    #[test]
    fn doctype_and_leading_whitespace() {
        let html = "\n\n<!DOCTYPE html>\n<html>\n</html>\n";
        assert_eq!(minify_html(html), "<!DOCTYPE html> <html> </html>");
    }

    #[test]
    fn less_than_in_text_is_kept() {
        assert_eq!(minify_html("<p>1 < 2</p>"), "<p>1 < 2</p>");
    }

    #[test]
    fn unterminated_comment_drops_rest() {
        assert_eq!(minify_html("<p>a</p><!-- open"), "<p>a</p>");
    }
}
