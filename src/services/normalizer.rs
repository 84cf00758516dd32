//! Text cleanup for message bodies and sender addresses.
//!
//! Bodies come out of mail clients full of HTML, tracking links and ASCII-art
//! separators. None of that helps the classifier, and all of it costs prompt
//! tokens, so it is removed before a record is classified.

use html2text::render::TrivialDecorator;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::MessageRecord;

/// Wide enough that the renderer never wraps; lines are joined afterwards.
const RENDER_WIDTH: usize = 10_000;

/// Upper bound on cleanup passes in `clean_body`.
const MAX_PASSES: usize = 8;

static SPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s\x{200B}-\x{200D}\x{FEFF}]+").expect("valid whitespace regex")
});

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"https?://\S+",
        r"|www\.\S+",
        r"|ftp://\S+",
        r"|\b(?:[a-z0-9](?:[-.a-z0-9]*[a-z0-9])?\.[a-z](?:[-.a-z0-9]*[a-z0-9])+(?::\d+)?\b)",
    ))
    .expect("valid link regex")
});

/// Renders markup to plain text and squeezes whitespace.
///
/// Entities are decoded and `<style>`/`<script>`/`<head>` content is dropped.
/// A `<` that does not open a tag is kept as text. Runs of whitespace,
/// newlines and zero-width characters become a single space and the ends are
/// trimmed.
pub fn strip_markup(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let rendered = match html2text::from_read_with_decorator(
        text.as_bytes(),
        RENDER_WIDTH,
        TrivialDecorator::new(),
    ) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::debug!(error = %e, "markup rendering failed, keeping raw text");
            text.to_string()
        }
    };
    SPACE_RE.replace_all(&rendered, " ").trim().to_string()
}

/// Deletes URLs, `www.` hosts and bare domain names.
pub fn remove_links(text: &str) -> String {
    LINK_RE.replace_all(text, "").into_owned()
}

/// Collapses runs of a repeated non-alphanumeric character to one occurrence.
///
/// `"----hello----"` becomes `"-hello-"`. Letters and digits are never
/// collapsed.
pub fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if prev == Some(c) && !c.is_ascii_alphanumeric() {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

/// Extracts the bare address from a `Name <addr>` header value.
///
/// This is a first-bracket scan, not an RFC 5322 parser: values without a
/// `<...>` pair are returned unchanged.
pub fn normalize_address(raw: &str) -> String {
    if let Some(open) = raw.find('<') {
        let rest = &raw[open + 1..];
        if let Some(close) = rest.find('>') {
            return rest[..close].to_string();
        }
    }
    raw.to_string()
}

/// Runs the full body cleanup until the text stops changing.
///
/// A single pass can expose new work (removing a link may leave two dashes
/// side by side, decoding `&lt;b&gt;` yields a tag), so passes repeat until
/// the output of a pass equals its input.
pub fn clean_body(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = strip_markup(&collapse_repeats(&remove_links(&strip_markup(&current))));
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Cleans every body and normalizes every sender in place.
pub fn normalize_records(records: &mut [MessageRecord]) {
    for record in records.iter_mut() {
        record.body = clean_body(&record.body);
        record.sender = normalize_address(&record.sender);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_removes_tags_and_whitespace() {
        let html = "<html><body><p>Hello\n\n  <b>world</b></p>\u{200c}\u{200b}!</body></html>";
        assert_eq!(strip_markup(html), "Hello world !");
    }

    #[test]
    fn strip_markup_of_empty_is_empty() {
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("   \n\t "), "");
    }

    #[test]
    fn strip_markup_keeps_plain_text() {
        assert_eq!(strip_markup("just text"), "just text");
    }

    #[test]
    fn strip_markup_keeps_comparison_signs() {
        assert_eq!(
            strip_markup("Budget < 5000 and deadline > Friday, please confirm"),
            "Budget < 5000 and deadline > Friday, please confirm"
        );
    }

    #[test]
    fn strip_markup_decodes_entities() {
        assert_eq!(strip_markup("Tom &amp; Jerry&nbsp;show &lt;3"), "Tom & Jerry show <3");
    }

    #[test]
    fn strip_markup_drops_style_and_script() {
        let html = "<html><head><style>p { color: red; } .x { margin: 0 }</style></head><body>Hi</body></html>";
        assert_eq!(strip_markup(html), "Hi");

        let html = "<body><script>track('open');</script><p>Meeting at 3</p></body>";
        assert_eq!(strip_markup(html), "Meeting at 3");
    }

    #[test]
    fn remove_links_deletes_scheme_urls() {
        assert_eq!(remove_links("see https://x.com/y now"), "see  now");
        assert_eq!(remove_links("ftp://files.example.org/a.zip"), "");
    }

    #[test]
    fn remove_links_deletes_www_and_bare_domains() {
        assert_eq!(remove_links("visit www.example.com today"), "visit  today");
        assert_eq!(remove_links("mail example.com:8080 ok"), "mail  ok");
    }

    #[test]
    fn remove_links_keeps_ordinary_words() {
        assert_eq!(remove_links("no links here."), "no links here.");
    }

    #[test]
    fn collapse_repeats_squeezes_separators() {
        assert_eq!(collapse_repeats("----hello----"), "-hello-");
        assert_eq!(collapse_repeats("a**b==c"), "a*b=c");
        assert_eq!(collapse_repeats("!!!"), "!");
    }

    #[test]
    fn collapse_repeats_keeps_letters_and_digits() {
        assert_eq!(collapse_repeats("aaa 1111 bookkeeper"), "aaa 1111 bookkeeper");
    }

    #[test]
    fn normalize_address_extracts_bracketed() {
        assert_eq!(normalize_address("Name <a@b.com>"), "a@b.com");
        assert_eq!(normalize_address("\"Last, First\" <x@y.org>"), "x@y.org");
    }

    #[test]
    fn normalize_address_passes_through_plain() {
        assert_eq!(normalize_address("a@b.com"), "a@b.com");
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_address("broken <a@b.com"), "broken <a@b.com");
    }

    #[test]
    fn clean_body_is_idempotent() {
        let samples = [
            "<p>Hi ====== there</p> https://t.co/abc\n\n---",
            "x-foo.com-",
            "http:://example",
            "Reply <b>now</b> www.site.com!!! ... ok",
            "",
            "plain words only",
            "Tom &amp;lt;b&amp;gt; Jerry",
            "<style>.a{}</style>a < b",
        ];

        for sample in samples {
            let once = clean_body(sample);
            assert_eq!(clean_body(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn clean_body_keeps_text_around_stray_brackets() {
        assert_eq!(
            clean_body("Budget < 5000 and deadline > Friday, please confirm"),
            "Budget < 5000 and deadline > Friday, please confirm"
        );
        assert_eq!(clean_body("Tom &amp; Jerry&nbsp;show &lt;3"), "Tom & Jerry show <3");
    }

    #[test]
    fn clean_body_strips_everything() {
        let body = "<div>Invoice attached ********</div>\n<a href=\"x\">https://pay.example.com/i/1</a>";
        assert_eq!(clean_body(body), "Invoice attached *");
    }

    #[test]
    fn normalize_records_updates_body_and_sender() {
        let mut records = vec![MessageRecord::new("Ann <ann@x.io>", "<p>Hello</p>")];
        normalize_records(&mut records);

        assert_eq!(records[0].sender, "ann@x.io");
        assert_eq!(records[0].body, "Hello");
    }
}
