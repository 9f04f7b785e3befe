//! XML entity decoding.
//!
//! The scanner emits text verbatim; consumers decode on demand. Attribute
//! values are the exception and are decoded by the scanner itself.
use alloc::borrow::Cow;
use alloc::string::String;

/// Decodes the five named XML entities plus numeric character references
/// (`&#65;`, `&#x41;`).
///
/// Anything that does not form a valid reference passes through verbatim, so
/// decoding text that still ends mid-entity is safe.
#[must_use]
pub(crate) fn decode(src: &str) -> Cow<'_, str> {
    if !src.contains('&') {
        return Cow::Borrowed(src);
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_reference(rest) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decodes one reference at the start of `src` (which begins with `&`).
/// Returns the character and the byte length consumed.
fn decode_reference(src: &str) -> Option<(char, usize)> {
    let semi = src.find(';')?;
    let body = &src[1..semi];
    let decoded = match body {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_entities() {
        assert_eq!(decode("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(decode("&quot;hi&apos;"), "\"hi'");
    }

    #[test]
    fn numeric_references() {
        assert_eq!(decode("&#65;&#x42;&#x63;"), "ABc");
    }

    #[test]
    fn malformed_passes_through() {
        assert_eq!(decode("a & b"), "a & b");
        assert_eq!(decode("&bogus;"), "&bogus;");
        assert_eq!(decode("&#xZZ;"), "&#xZZ;");
        // A reference split at a chunk boundary stays verbatim until it is
        // decoded again with the full text.
        assert_eq!(decode("tail &am"), "tail &am");
    }

    #[test]
    fn borrows_when_clean() {
        assert!(matches!(decode("no entities"), Cow::Borrowed(_)));
    }
}
