//! Project documents. The file itself lives in a blob store; only its URL
//! and metadata are tracked here.

string_enum! {
    #[derive(Default)]
    DocumentType {
        Script = "script",
        Contract = "contract",
        Budget = "budget",
        Schedule = "schedule",
        Brief = "brief",
        Moodboard = "moodboard",
        Footage = "footage",
        Edit = "edit",
        FinalExport = "final_export",
        Media = "media",
        PressKit = "press_kit",
        #[default]
        Other = "other",
    }
}

/// A file reference must be an absolute http(s) URL handed back by the
/// blob store.
pub fn is_valid_file_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_blob_store_urls() {
        assert!(is_valid_file_url("https://files.example.com/a/b.pdf"));
        assert!(is_valid_file_url("http://localhost:9000/bucket/x"));
    }

    #[test]
    fn rejects_non_urls() {
        assert!(!is_valid_file_url("/etc/passwd"));
        assert!(!is_valid_file_url("ftp://host/file"));
        assert!(!is_valid_file_url("https://"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!("scenario".parse::<DocumentType>().is_err());
        assert_eq!("press_kit".parse::<DocumentType>().unwrap(), DocumentType::PressKit);
    }
}
