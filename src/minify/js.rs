/// Keywords after which a `/` starts a regular expression literal.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
    "await",
];

/// Remove comments and insignificant whitespace from a script.
///
/// A whitespace run that contained a newline is kept as a newline unless the
/// surrounding punctuation makes a statement break impossible, so automatic
/// semicolon insertion behaves exactly as in the source.
pub fn minify_js(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    // Pending separator: `Some(true)` if the skipped run contained a newline.
    let mut gap: Option<bool> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            gap = Some(gap.unwrap_or(false) || c == '\n' || c == '\r');
            i += 1;
            continue;
        }
        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            gap = Some(gap.unwrap_or(false));
            continue;
        }
        if c == '/' && next == Some('*') {
            let start = i;
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            let newline = chars[start..i].iter().any(|&ch| ch == '\n');
            gap = Some(gap.unwrap_or(false) || newline);
            continue;
        }

        if let Some(newline) = gap.take() {
            push_separator(&mut out, c, newline);
        }

        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '`' => i = copy_template(&chars, i, &mut out),
            '/' if regex_allowed(&out) => i = copy_regex(&chars, i, &mut out),
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\'
}

fn push_separator(out: &mut String, next: char, newline: bool) {
    let Some(prev) = out.chars().last() else {
        return;
    };
    if newline && !"{([,;".contains(prev) && !")]},;".contains(next) {
        out.push('\n');
    } else if (is_ident(prev) && is_ident(next)) || ((prev == '+' || prev == '-') && next == prev)
    {
        out.push(' ');
    }
}

/// Whether a `/` at this point begins a regex rather than a division.
fn regex_allowed(out: &str) -> bool {
    let Some(prev) = out.chars().last() else {
        return true;
    };
    if "(,=:[!&|?{};+-*%<>~^".contains(prev) || prev == '\n' {
        return true;
    }
    if !is_ident(prev) {
        return false;
    }
    let word: String = out
        .chars()
        .rev()
        .take_while(|&c| is_ident(c))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    REGEX_KEYWORDS.contains(&word.as_str())
}

fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '\n' => break,
            _ if c == quote => break,
            _ => {}
        }
    }
    i
}

/// Copy a template literal, following `${…}` substitutions by brace depth.
fn copy_template(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('`');
    let mut i = start + 1;
    let mut depth = 0usize;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '$' if depth == 0 && chars.get(i) == Some(&'{') => {
                out.push('{');
                i += 1;
                depth = 1;
            }
            '{' if depth > 0 => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '`' if depth == 0 => break,
            _ => {}
        }
    }
    i
}

fn copy_regex(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('/');
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => break,
            '\n' => break,
            _ => {}
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_indentation() {
        let js = "// header\nfunction add(a, b) {\n    /* sum */\n    return a + b;\n}\n";
        assert_eq!(minify_js(js), "function add(a,b){return a+b;}");
    }

    #[test]
    fn keeps_newlines_that_may_end_statements() {
        let js = "let a = 1\nlet b = 2\nconsole.log(a + b)\n";
        assert_eq!(minify_js(js), "let a=1\nlet b=2\nconsole.log(a+b)");
    }

    #[test]
    fn preserves_string_contents() {
        let js = "const s = \"a  // not a comment\";\nconst t = 'it\\'s  /* kept */';";
        assert_eq!(
            minify_js(js),
            "const s=\"a  // not a comment\";const t='it\\'s  /* kept */';"
        );
    }

    #[test]
    fn preserves_template_literals_with_substitutions() {
        let js = "const msg = `Hello,   ${ user.name }  // x`;";
        assert_eq!(minify_js(js), "const msg=`Hello,   ${ user.name }  // x`;");
    }

    #[test]
    fn distinguishes_regex_from_division() {
        let js = "const r = /a\\/b [x]/g;\nconst half = total / 2 / 1;";
        assert_eq!(minify_js(js), "const r=/a\\/b [x]/g;const half=total/2/1;");
    }

    #[test]
    fn regex_after_return_keyword() {
        let js = "function f(s) {\n  return /^\\s+/.test(s);\n}";
        assert_eq!(minify_js(js), "function f(s){return/^\\s+/.test(s);}");
    }

    #[test]
    fn regex_class_may_contain_slash() {
        assert_eq!(minify_js("x = /[/]+/ ;"), "x=/[/]+/;");
    }

    #[test]
    fn keeps_space_between_repeated_plus_and_minus() {
        assert_eq!(minify_js("a = b + +c - -d;"), "a=b+ +c- -d;");
    }

    #[test]
    fn drops_newline_after_opening_punctuation() {
        let js = "foo(\n  1,\n  2\n)\n";
        assert_eq!(minify_js(js), "foo(1,2)");
    }
}
