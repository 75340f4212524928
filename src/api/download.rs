use crate::format::sanitize_filename;

pub const TEMPLATE_DEFAULT_NAME: &str = "product-sample-template.xlsx";
pub const EXPORT_DEFAULT_NAME: &str = "products.xlsx";

/// A file served by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Extracts the file name from a `Content-Disposition` value. `filename*`
/// (RFC 5987) wins over `filename`. The result is sanitized; `None` when
/// neither parameter carries a usable name.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in header.split(';').map(str::trim) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'lang'percent-encoded
                let encoded = value.trim().splitn(3, '\'').nth(2).unwrap_or(value.trim());
                extended = Some(percent_decode(encoded.trim_matches('"')));
            }
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or_default().to_string())
        .filter(|name| !name.trim().is_empty())
        .map(|name| sanitize_filename(&name))
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_bare_names() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="direct-products.xlsx""#).as_deref(),
            Some("direct-products.xlsx")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=template.csv").as_deref(),
            Some("template.csv")
        );
    }

    #[test]
    fn extended_name_wins_and_is_decoded() {
        let header = r#"attachment; filename="fallback.xlsx"; filename*=UTF-8''stock%20report.xlsx"#;
        assert_eq!(filename_from_disposition(header).as_deref(), Some("stock report.xlsx"));
    }

    #[test]
    fn path_components_are_dropped() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some("passwd")
        );
    }

    #[test]
    fn missing_name_is_none() {
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(r#"inline; filename="""#), None);
    }
}
