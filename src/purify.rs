//! Unused-selector detection for release stylesheets.
//!
//! Purification compares the class and id names a stylesheet *defines* with
//! the tokens the site's markup *uses*:
//!
//! ```text
//! selector names (from compiled CSS)
//!   − tokens found in rendered pages, template sources, extra content
//!   − safelist
//!   = unused symbols  →  lightningcss drops every selector naming one
//! ```
//!
//! lightningcss matches unused symbols against keyframes and other named
//! at-rules as well as selectors, so a name that is also an `@keyframes`,
//! `@counter-style` or `@property` identifier is never reported.
//!
//! Token scanning is deliberately greedy (any run of class-name characters
//! counts), so a name is only considered unused when it appears nowhere in
//! the scanned text. Only class and id selectors are ever purified; element,
//! attribute and pseudo selectors are always kept.

use std::collections::{BTreeSet, HashSet};

/// Tracks markup tokens and the safelist for one purification pass.
#[derive(Debug, Default)]
pub struct Purifier {
    used: HashSet<String>,
    safelist: HashSet<String>,
}

impl Purifier {
    pub fn new<I, S>(safelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: HashSet::new(),
            safelist: safelist.into_iter().map(Into::into).collect(),
        }
    }

    /// Record every token in a piece of markup (or any other content).
    pub fn scan(&mut self, text: &str) {
        self.used.extend(markup_tokens(text));
    }

    /// Names defined by `css` that no scanned content mentions.
    pub fn unused(&self, css: &str) -> HashSet<String> {
        let sheet = scan_sheet(css);
        sheet
            .selectors
            .into_iter()
            .filter(|name| {
                !self.used.contains(name)
                    && !self.safelist.contains(name)
                    && !sheet.at_rules.contains(name)
            })
            .collect()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || "-_:/.%@![]".contains(c)
}

/// Split text into candidate class/id tokens.
///
/// `sm:w-1/2` stays whole; dotted runs also contribute their parts so
/// `btn.primary` (as in a selector-like string in a script) yields `btn` and
/// `primary` too.
pub fn markup_tokens(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    for token in text.split(|c: char| !is_token_char(c)) {
        if token.is_empty() {
            continue;
        }
        if token.contains('.') {
            tokens.extend(
                token
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .map(str::to_string),
            );
        }
        tokens.insert(token.to_string());
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// Holds rules: top level, `@media`, `@supports`, ...
    Rules,
    /// Holds declarations or anything else not treated as selectors.
    Other,
}

/// At-rules whose blocks contain ordinary style rules.
const GROUPING_AT_RULES: &[&str] = &["@media", "@supports", "@layer", "@container", "@document"];

/// At-rules that declare a name other rules refer to.
const NAMED_AT_RULES: &[&str] = &[
    "@keyframes",
    "@-webkit-keyframes",
    "@-moz-keyframes",
    "@counter-style",
    "@property",
];

#[derive(Debug, Default)]
struct SheetNames {
    selectors: BTreeSet<String>,
    at_rules: BTreeSet<String>,
}

/// Class and id names used in the selectors of a stylesheet.
///
/// Names are unescaped (`.sm\:flex-row` → `sm:flex-row`). Names only seen
/// inside a functional pseudo-class such as `:not(.x)` are not reported.
pub fn selector_names(css: &str) -> BTreeSet<String> {
    scan_sheet(css).selectors
}

/// Names declared by `@keyframes`, `@counter-style` and `@property` rules.
pub fn at_rule_names(css: &str) -> BTreeSet<String> {
    scan_sheet(css).at_rules
}

fn scan_sheet(css: &str) -> SheetNames {
    let mut names = SheetNames::default();
    let mut stack = vec![Block::Rules];
    let mut prelude = String::new();
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        let in_rules = stack.last() == Some(&Block::Rules);
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' => {
                let mut escaped = false;
                for s in chars.by_ref() {
                    if in_rules {
                        prelude.push(s);
                    }
                    match s {
                        '\\' if !escaped => escaped = true,
                        _ if s == c && !escaped => break,
                        _ => escaped = false,
                    }
                }
            }
            '{' => {
                let head = prelude.trim();
                let block = if !in_rules {
                    Block::Other
                } else if head.starts_with('@') {
                    let mut words = head.split_whitespace();
                    let keyword = words.next().unwrap_or_default().to_ascii_lowercase();
                    if NAMED_AT_RULES.contains(&keyword.as_str())
                        && let Some(name) = words.next()
                    {
                        let name = name.trim_matches(|c: char| c == '"' || c == '\'');
                        names.at_rules.insert(name.to_string());
                    }
                    if GROUPING_AT_RULES.contains(&keyword.as_str()) {
                        Block::Rules
                    } else {
                        Block::Other
                    }
                } else {
                    collect_names(head, &mut names.selectors);
                    Block::Other
                };
                stack.push(block);
                prelude.clear();
            }
            '}' => {
                if stack.len() > 1 {
                    stack.pop();
                }
                prelude.clear();
            }
            ';' if in_rules => prelude.clear(),
            _ if in_rules => prelude.push(c),
            _ => {}
        }
    }
    names
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn collect_names(selector: &str, names: &mut BTreeSet<String>) {
    let mut chars = selector.chars().peekable();
    let mut parens = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            '[' => {
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '.' | '#' => {
                let name = read_name(&mut chars);
                if !name.is_empty() && parens == 0 {
                    names.insert(name);
                }
            }
            _ => {}
        }
    }
}

/// Read an identifier, resolving CSS escapes.
fn read_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '\\' {
            chars.next();
            let mut hex = String::new();
            while hex.len() < 6 && chars.peek().is_some_and(|h| h.is_ascii_hexdigit()) {
                hex.extend(chars.next());
            }
            if hex.is_empty() {
                name.extend(chars.next());
            } else {
                if chars.peek().is_some_and(|w| w.is_whitespace()) {
                    chars.next();
                }
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                name.push(decoded);
            }
        } else if is_name_char(c) {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selector_names_skip_declarations() {
        let css = ".card, #main > p { color: #fff; margin: .5em; }\na.link:hover { top: 0 }";
        assert_eq!(selector_names(css), set(&["card", "link", "main"]));
    }

    #[test]
    fn selector_names_descend_into_media_but_not_keyframes() {
        let css = "@media (min-width: 640px) { .sm\\:flex-row { display: flex } }\n\
                   @keyframes spin { from { transform: rotate(0) } to { transform: rotate(1turn) } }\n\
                   @font-face { font-family: x; src: url(a.woff) }";
        assert_eq!(selector_names(css), set(&["sm:flex-row"]));
    }

    #[test]
    fn selector_names_unescape() {
        let css = ".w-1\\/2 { width: 50% } .\\32 xl { x: y } .hover\\:bg-orange-700:hover { x: y }";
        assert_eq!(
            selector_names(css),
            set(&["2xl", "hover:bg-orange-700", "w-1/2"])
        );
    }

    #[test]
    fn selector_names_ignore_attributes_comments_and_not() {
        let css = "/* .commented { } */ a[href$=\".pdf\"] { x: y } li:not(.first) { x: y }";
        assert!(selector_names(css).is_empty());
    }

    #[test]
    fn at_rule_names_collect_keyframes_counters_and_properties() {
        let css = "@keyframes fade { to { opacity: 0 } }\n\
                   @-webkit-keyframes \"spin\" { to { x: y } }\n\
                   @counter-style thumbs { system: cyclic }\n\
                   @property --angle { syntax: '<angle>' }\n\
                   @media print { .fade { x: y } }";
        assert_eq!(at_rule_names(css), set(&["--angle", "fade", "spin", "thumbs"]));
    }

    #[test]
    fn unused_keeps_names_shared_with_keyframes() {
        let css = ".fade { color: red } .loader { animation: fade 1s } \
                   @keyframes fade { from { opacity: 0 } to { opacity: 1 } }";
        let mut purifier = Purifier::new(Vec::<String>::new());
        purifier.scan("<div class=\"loader\"></div>");

        assert!(purifier.unused(css).is_empty());
    }

    #[test]
    fn markup_tokens_keep_variant_names_whole() {
        let tokens = markup_tokens("<div class=\"sm:w-1/2 btn\" id=\"main\">");
        assert!(tokens.contains("sm:w-1/2"));
        assert!(tokens.contains("btn"));
        assert!(tokens.contains("main"));
    }

    #[test]
    fn markup_tokens_split_dotted_runs() {
        let tokens = markup_tokens("document.querySelector('.menu.open')");
        assert!(tokens.contains("menu"));
        assert!(tokens.contains("open"));
        assert!(tokens.contains("querySelector"));
    }

    #[test]
    fn unused_respects_markup_and_safelist() {
        let css = ".used { } .unused { } .hover\\:text-white:hover { } #hero { }";
        let mut purifier = Purifier::new(["hover:text-white"]);
        purifier.scan("<section id=\"hero\"><p class=\"used\"></p></section>");

        let unused = purifier.unused(css);

        assert_eq!(unused, HashSet::from(["unused".to_string()]));
    }
}
