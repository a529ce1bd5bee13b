//! Email address parsing (RFC 5322 §3.4), reduced to what naming needs.

/// A parsed email address.
///
/// # Examples
/// - `"Jane Doe <jane@x.com>"` → `display_name = "Jane Doe"`, `address = "jane@x.com"`
/// - `"jane.doe@x.com"` → `display_name = ""`, `address = "jane.doe@x.com"`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`), or the raw text when no
    /// address could be recognized.
    pub address: String,
}

impl EmailAddress {
    /// Parse a single address from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Name, Display\" <user@domain.com>"`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        if let (Some(start), Some(end)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if end > start {
                return Self {
                    display_name: strip_quotes(&trimmed[..start]),
                    address: trimmed[start + 1..end].trim().to_string(),
                };
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parse the first entry of an address list.
    ///
    /// Outlook separates recipients with `;`, RFC 5322 with `,`. Separators
    /// inside quotes or angle brackets are ignored.
    pub fn parse_first(raw: &str) -> Self {
        let mut in_quotes = false;
        let mut in_angle = false;

        for (i, ch) in raw.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '<' if !in_quotes => in_angle = true,
                '>' if !in_quotes => in_angle = false,
                ',' | ';' if !in_quotes && !in_angle => {
                    let candidate = Self::parse(&raw[..i]);
                    if !candidate.is_empty() {
                        return candidate;
                    }
                }
                _ => {}
            }
        }

        Self::parse(raw)
    }

    /// `true` when neither a name nor an address was found.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.address.is_empty()
    }

    /// Best human name for this address.
    ///
    /// Prefers the display name. For a bare `john.doe@x.com` the local part
    /// is title-cased with `.` and `_` turned into spaces (`"John Doe"`).
    /// Text that is not an address is returned as-is.
    pub fn human_name(&self) -> Option<String> {
        if !self.display_name.is_empty() {
            return Some(self.display_name.clone());
        }

        if let Some((local, _domain)) = self.address.split_once('@') {
            let spaced = local.replace(['.', '_'], " ");
            let name = title_case(&spaced);
            if !name.trim().is_empty() {
                return Some(name);
            }
        }

        let raw = self.address.trim();
        if raw.is_empty() || raw.starts_with('@') {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.display_name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.display_name, self.address)
        }
    }
}
