//! Text-mail fixtures built on the fly.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const DATE: &str = "Fri, 15 Mar 2024 10:00:00 +0000";

/// One MIME attachment: file name, content type, payload.
pub struct Part<'a> {
    pub name: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn new(name: &'a str, content_type: &'a str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            content_type,
            data: data.into(),
        }
    }

    /// An attached email.
    pub fn email(name: &'a str, raw: String) -> Self {
        Self::new(name, "application/octet-stream", raw.into_bytes())
    }
}

/// Build a multipart `.eml` with base64-encoded attachments.
pub fn eml(from: &str, to: Option<&str>, subject: &str, parts: &[Part<'_>]) -> String {
    let boundary = "=_casesort_fixture";
    let mut out = format!("From: {from}\r\n");
    if let Some(to) = to {
        out.push_str(&format!("To: {to}\r\n"));
    }
    out.push_str(&format!(
        "Subject: {subject}\r\n\
Date: {DATE}\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\
\r\n\
--{boundary}\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Please see attached.\r\n"
    ));

    for part in parts {
        out.push_str(&format!(
            "--{boundary}\r\n\
Content-Type: {}; name=\"{}\"\r\n\
Content-Disposition: attachment; filename=\"{}\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n",
            part.content_type, part.name, part.name
        ));
        let encoded = STANDARD.encode(&part.data);
        for line in encoded.as_bytes().chunks(76) {
            out.push_str(std::str::from_utf8(line).unwrap_or_default());
            out.push_str("\r\n");
        }
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

/// `levels + 1` emails nested inside each other, each carrying `d<k>.pdf`.
///
/// The outermost email is depth 0.
pub fn nested_chain(levels: usize) -> String {
    let mut inner: Option<String> = None;
    for depth in (0..=levels).rev() {
        let pdf_name = format!("d{depth}.pdf");
        let nested_name = format!("level{}.eml", depth + 1);
        let mut parts = vec![Part::new(&pdf_name, "application/pdf", vec![b'%'; 64])];
        if let Some(raw) = inner.take() {
            parts.push(Part::email(&nested_name, raw));
        }
        inner = Some(eml(
            "Jane Doe <jane@x.com>",
            None,
            &format!("Level {depth}"),
            &parts,
        ));
    }
    inner.unwrap_or_default()
}
