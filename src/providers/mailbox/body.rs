//! Body selection and charset decoding.

use encoding_rs::Encoding;
use mailparse::ParsedMail;

/// Picks the text to classify from a parsed message.
///
/// Multipart messages use the first `text/plain` part found depth-first;
/// single-part messages use their only payload whatever its type. Anything
/// else yields an empty string.
pub fn extract_body(mail: &ParsedMail<'_>) -> String {
    if is_multipart(mail) {
        return first_plain_part(mail)
            .map(decode_part)
            .unwrap_or_default();
    }
    decode_part(mail)
}

fn is_multipart(mail: &ParsedMail<'_>) -> bool {
    !mail.subparts.is_empty() || mail.ctype.mimetype.starts_with("multipart/")
}

fn first_plain_part<'a, 'b>(mail: &'a ParsedMail<'b>) -> Option<&'a ParsedMail<'b>> {
    for part in &mail.subparts {
        if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
            return Some(part);
        }
        if let Some(found) = first_plain_part(part) {
            return Some(found);
        }
    }
    None
}

fn decode_part(part: &ParsedMail<'_>) -> String {
    let bytes = match part.get_body_raw() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable transfer encoding, skipping body");
            return String::new();
        }
    };
    let charset = part
        .ctype
        .params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.as_str());
    decode_text(&bytes, charset)
}

/// Decodes bytes with a declared charset.
///
/// Missing or unrecognized charsets fall back to UTF-8. Bytes that cannot be
/// decoded are dropped rather than replaced.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = match charset {
        Some(label) => Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            tracing::debug!(charset = label, "unknown charset, decoding as UTF-8");
            encoding_rs::UTF_8
        }),
        None => encoding_rs::UTF_8,
    };

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_declared_latin1() {
        assert_eq!(decode_text(b"caf\xe9", Some("iso-8859-1")), "café");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_text("naïve".as_bytes(), Some("x-made-up")), "naïve");
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        assert_eq!(decode_text(b"ok\xff\xfeok", None), "okok");
    }

    #[test]
    fn single_part_html_is_returned_whole() {
        let raw = b"Content-Type: text/html; charset=utf-8\n\n<p>Hi</p>\n";
        let mail = mailparse::parse_mail(raw).unwrap();
        assert!(extract_body(&mail).contains("<p>Hi</p>"));
    }

    #[test]
    fn multipart_without_plain_text_is_empty() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"B\"\n\n\
--B\n\
Content-Type: text/html\n\n\
<p>only html</p>\n\
--B--\n";
        let mail = mailparse::parse_mail(raw).unwrap();
        assert_eq!(extract_body(&mail), "");
    }

    #[test]
    fn nested_plain_part_is_found() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"OUT\"\n\n\
--OUT\n\
Content-Type: multipart/alternative; boundary=\"IN\"\n\n\
--IN\n\
Content-Type: text/plain; charset=us-ascii\n\n\
nested plain\n\
--IN--\n\
--OUT--\n";
        let mail = mailparse::parse_mail(raw).unwrap();
        assert!(extract_body(&mail).contains("nested plain"));
    }

    #[test]
    fn quoted_printable_is_decoded() {
        let raw = b"Content-Type: text/plain; charset=utf-8\n\
Content-Transfer-Encoding: quoted-printable\n\n\
caf=C3=A9\n";
        let mail = mailparse::parse_mail(raw).unwrap();
        assert!(extract_body(&mail).starts_with("café"));
    }
}
