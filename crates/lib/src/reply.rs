//! Reply formatting and dispatch: one text message (with markup
//! normalization) followed by artifact messages in original order.

use crate::answer::{Answer, ArtifactKind};
use crate::transport::{self, ChatTransport};
use std::path::Path;

/// Rewrite inline markdown emphasis to the transport's rich-text tags:
/// `**bold**` => `<b>bold</b>`, `*italic*` => `<i>italic</i>`. Unpaired
/// markers and everything else pass through unchanged.
pub fn normalize_markup(text: &str) -> String {
    let bolded = rewrite_span(text, "**", "<b>", "</b>");
    rewrite_span(&bolded, "*", "<i>", "</i>")
}

fn rewrite_span(text: &str, marker: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(marker) {
        let after = &rest[start + marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                out.push_str(&rest[..start]);
                out.push_str(open);
                out.push_str(&after[..end]);
                out.push_str(close);
                rest = &after[end + marker.len()..];
            }
            _ => {
                // Unpaired or empty span; keep the marker literal.
                out.push_str(&rest[..start + marker.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Send an answer as chat replies: normalized text first, then each artifact.
/// Delivery is best-effort per message — a failed artifact upload or send is
/// logged and the remaining artifacts are still attempted.
pub async fn deliver_answer(transport: &dyn ChatTransport, message_id: &str, answer: &Answer) {
    let text = normalize_markup(&answer.text);
    if let Err(e) = transport.reply_text(message_id, &text).await {
        log::warn!("reply: sending answer text failed: {}", e);
    }
    for artifact in &answer.artifacts {
        match artifact.kind {
            ArtifactKind::Image => {
                let path = Path::new(&artifact.data);
                match transport::upload_image_file(transport, path).await {
                    Ok(image_key) => {
                        if let Err(e) = transport.reply_image(message_id, &image_key).await {
                            log::warn!("reply: sending image {} failed: {}", image_key, e);
                        }
                    }
                    Err(e) => {
                        log::warn!("reply: uploading image {} failed: {}", artifact.data, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bold_and_italic_spans() {
        assert_eq!(
            normalize_markup("**bold** and *italic*"),
            "<b>bold</b> and <i>italic</i>"
        );
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(normalize_markup("no markers here"), "no markers here");
    }

    #[test]
    fn leaves_unpaired_markers_literal() {
        assert_eq!(normalize_markup("a * b"), "a * b");
        assert_eq!(normalize_markup("2 ** 3"), "2 ** 3");
    }

    #[test]
    fn normalizes_multiple_spans() {
        assert_eq!(
            normalize_markup("*a* then **b** then *c*"),
            "<i>a</i> then <b>b</b> then <i>c</i>"
        );
    }
}
