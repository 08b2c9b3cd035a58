//! Filename convention handling
//!
//! Uploaded documents are named `<customer>_<type>_<date>.xml`. The name is the
//! only metadata the store keeps, so this module is the single place that
//! parses it, maps it to the stored `.json` name and back, and builds the
//! enumeration filters used by search.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Result, StoreError};

const EXT_XML: &str = ".xml";
const EXT_JSON: &str = ".json";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Cached regex for the upload filename convention
static FILENAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn filename_regex() -> &'static Regex {
    FILENAME_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?P<customer>[A-Za-z0-9]+)_(?P<doc_type>[A-Za-z0-9]+)_(?P<date>[0-9]{4}-[0-9]{2}-[0-9]{2})\.xml$",
        )
        .expect("Failed to compile filename regex")
    })
}

/// The three fields encoded in an uploaded filename
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilenameKey {
    pub customer: String,
    pub doc_type: String,
    pub date: NaiveDate,
}

impl FilenameKey {
    /// Parse an original (`.xml`) filename; `None` if it breaks the convention
    /// or the date segment is not a real calendar date.
    pub fn parse(filename: &str) -> Option<Self> {
        let caps = filename_regex().captures(filename)?;
        let date = NaiveDate::parse_from_str(&caps["date"], DATE_FORMAT).ok()?;

        Some(Self {
            customer: caps["customer"].to_owned(),
            doc_type: caps["doc_type"].to_owned(),
            date,
        })
    }

    fn stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.customer,
            self.doc_type,
            self.date.format(DATE_FORMAT)
        )
    }

    pub fn original_name(&self) -> String {
        format!("{}{}", self.stem(), EXT_XML)
    }

    pub fn stored_name(&self) -> String {
        format!("{}{}", self.stem(), EXT_JSON)
    }
}

impl fmt::Display for FilenameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_name())
    }
}

impl FromStr for FilenameKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        FilenameCodec.validate(s)
    }
}

/// Filename segment a search selects on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Customer,
    DocType,
    Date,
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchField::Customer => f.write_str("customer"),
            SearchField::DocType => f.write_str("type"),
            SearchField::Date => f.write_str("date"),
        }
    }
}

/// A single search criterion over the filename segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Customer(String),
    DocType(String),
    Date(NaiveDate),
}

impl SearchQuery {
    pub fn field(&self) -> SearchField {
        match self {
            SearchQuery::Customer(_) => SearchField::Customer,
            SearchQuery::DocType(_) => SearchField::DocType,
            SearchQuery::Date(_) => SearchField::Date,
        }
    }

    pub fn value(&self) -> String {
        match self {
            SearchQuery::Customer(customer) => customer.clone(),
            SearchQuery::DocType(doc_type) => doc_type.clone(),
            SearchQuery::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }

    /// Coarse enumeration filter over stored names
    pub fn glob(&self, codec: &FilenameCodec) -> String {
        codec.glob_for(self.field(), &self.value())
    }

    /// Exact check against an original (`.xml`) filename
    pub fn matches(&self, codec: &FilenameCodec, filename: &str) -> bool {
        match self {
            SearchQuery::Customer(customer) => codec.matches_customer(filename, customer),
            SearchQuery::DocType(doc_type) => codec.matches_type(filename, doc_type),
            SearchQuery::Date(date) => codec.matches_date(filename, *date),
        }
    }
}

/// Bijective mapping between original `.xml` names and stored `.json` names
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameCodec;

impl FilenameCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, filename: &str) -> Result<FilenameKey> {
        FilenameKey::parse(filename).ok_or_else(|| {
            StoreError::validation(format!(
                "Invalid filename format. Expected: customer_type_date.xml. Got: {}",
                filename
            ))
        })
    }

    pub fn derive_stored_name(&self, original_name: &str) -> Result<String> {
        Ok(self.validate(original_name)?.stored_name())
    }

    /// Inverse of [`derive_stored_name`](Self::derive_stored_name). Only the
    /// trailing extension is rewritten; names without `.json` have no original.
    pub fn derive_original_name(&self, stored_name: &str) -> Option<String> {
        stored_name
            .strip_suffix(EXT_JSON)
            .map(|stem| format!("{}{}", stem, EXT_XML))
    }

    pub fn matches_customer(&self, filename: &str, customer: &str) -> bool {
        FilenameKey::parse(filename).is_some_and(|key| key.customer == customer)
    }

    pub fn matches_type(&self, filename: &str, doc_type: &str) -> bool {
        FilenameKey::parse(filename).is_some_and(|key| key.doc_type == doc_type)
    }

    pub fn matches_date(&self, filename: &str, date: NaiveDate) -> bool {
        FilenameKey::parse(filename).is_some_and(|key| key.date == date)
    }

    /// Build a glob over stored names that narrows enumeration for `field`.
    ///
    /// The glob may over-match; callers must confirm each candidate with the
    /// matching `matches_*` predicate. Values that could never appear in a
    /// valid name (or would be read as glob syntax) fall back to every
    /// stored document.
    pub fn glob_for(&self, field: SearchField, value: &str) -> String {
        let plain = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !plain {
            return format!("*{}", EXT_JSON);
        }

        match field {
            SearchField::Customer => format!("{}_*{}", value, EXT_JSON),
            SearchField::DocType => format!("*_{}_*{}", value, EXT_JSON),
            SearchField::Date => format!("*_{}{}", value, EXT_JSON),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::Glob;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_accepts_convention() {
        let codec = FilenameCodec::new();
        let key = codec.validate("acme_invoice_2024-01-05.xml").unwrap();

        assert_eq!(key.customer, "acme");
        assert_eq!(key.doc_type, "invoice");
        assert_eq!(key.date, date(2024, 1, 5));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let codec = FilenameCodec::new();
        let bad = [
            "",
            "bad name.xml",
            "acme_invoice_2024-01-05.json",
            "acme_invoice_2024-01-05.XML",
            "acme_invoice_2024-1-5.xml",
            "acme_inv_oice_2024-01-05.xml",
            "ac-me_invoice_2024-01-05.xml",
            "acme__2024-01-05.xml",
            "acme_invoice_2024-01-05.xml.bak",
            "acme_invoice_2024-02-30.xml",
            "acme_invoice_2024-13-01.xml",
            "../acme_invoice_2024-01-05.xml",
            "acme_invoice_2024-01-05.xml\n",
            "acme_invoice_\u{0661}\u{0662}\u{0663}\u{0664}-01-05.xml",
        ];

        for name in bad {
            let err = codec.validate(name).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Validation, "{name:?}");
        }
    }

    #[test]
    fn test_invalid_name_message_echoes_input() {
        let err = FilenameCodec.validate("bad name.xml").unwrap_err();
        assert!(err.to_string().contains("customer_type_date.xml"));
        assert!(err.to_string().contains("bad name.xml"));
    }

    #[test]
    fn test_key_reconstructs_original_name() {
        for name in [
            "acme_invoice_2024-01-05.xml",
            "ACME42_Receipt7_1999-12-31.xml",
            "a_b_0001-01-01.xml",
        ] {
            let key: FilenameKey = name.parse().unwrap();
            assert_eq!(key.original_name(), name);
            assert_eq!(key.to_string(), name);
        }
    }

    #[test]
    fn test_stored_and_original_names_are_inverse() {
        let codec = FilenameCodec::new();
        for name in [
            "acme_invoice_2024-01-05.xml",
            "xml_json_2020-02-29.xml",
            "jsonxml_xmljson_2021-07-04.xml",
        ] {
            let stored = codec.derive_stored_name(name).unwrap();
            assert!(stored.ends_with(".json"));
            assert_eq!(codec.derive_original_name(&stored).unwrap(), name);
        }
    }

    #[test]
    fn test_only_extension_is_rewritten() {
        let codec = FilenameCodec::new();
        assert_eq!(
            codec.derive_stored_name("xml_json_2020-02-29.xml").unwrap(),
            "xml_json_2020-02-29.json"
        );
        assert_eq!(
            codec.derive_original_name("json_xml_2020-02-29.json").unwrap(),
            "json_xml_2020-02-29.xml"
        );
        assert_eq!(codec.derive_original_name("notes.txt"), None);
        assert_eq!(codec.derive_original_name(".tmp-1.json.part"), None);
    }

    #[test]
    fn test_derive_stored_name_requires_valid_name() {
        let err = FilenameCodec.derive_stored_name("bad name.xml").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_matches_predicates() {
        let codec = FilenameCodec::new();
        let name = "acme_invoice_2024-01-05.xml";

        assert!(codec.matches_customer(name, "acme"));
        assert!(!codec.matches_customer(name, "acm"));
        assert!(!codec.matches_customer(name, "ACME"));
        assert!(codec.matches_type(name, "invoice"));
        assert!(!codec.matches_type(name, "acme"));
        assert!(codec.matches_date(name, date(2024, 1, 5)));
        assert!(!codec.matches_date(name, date(2024, 1, 6)));
    }

    #[test]
    fn test_matches_is_false_for_non_conforming_names() {
        let codec = FilenameCodec::new();
        assert!(!codec.matches_customer("acme_invoice.xml", "acme"));
        assert!(!codec.matches_type("bad name.xml", "name"));
        assert!(!codec.matches_date("acme_invoice_2024-01-05.json", date(2024, 1, 5)));
    }

    #[test]
    fn test_globs_cover_exact_matches() {
        let codec = FilenameCodec::new();
        let stored = "acme_invoice_2024-01-05.json";

        let queries = [
            SearchQuery::Customer("acme".to_string()),
            SearchQuery::DocType("invoice".to_string()),
            SearchQuery::Date(date(2024, 1, 5)),
        ];
        for query in queries {
            let glob = query.glob(&codec);
            let matcher = Glob::new(&glob).unwrap().compile_matcher();
            assert!(matcher.is_match(stored), "{glob} should match {stored}");
            assert!(query.matches(&codec, "acme_invoice_2024-01-05.xml"));
        }
    }

    #[test]
    fn test_globs_narrow_by_field() {
        let codec = FilenameCodec::new();
        assert_eq!(codec.glob_for(SearchField::Customer, "acme"), "acme_*.json");
        assert_eq!(codec.glob_for(SearchField::DocType, "invoice"), "*_invoice_*.json");
        assert_eq!(codec.glob_for(SearchField::Date, "2024-01-05"), "*_2024-01-05.json");

        let matcher = Glob::new(&codec.glob_for(SearchField::Customer, "acme"))
            .unwrap()
            .compile_matcher();
        assert!(!matcher.is_match("other_invoice_2024-01-05.json"));
    }

    #[test]
    fn test_glob_may_over_match() {
        let codec = FilenameCodec::new();
        let glob = codec.glob_for(SearchField::DocType, "acme");
        let matcher = Glob::new(&glob).unwrap().compile_matcher();

        // four segments: admitted by the glob, rejected by the exact predicate
        assert!(matcher.is_match("a_b_acme_2024-01-05.json"));
        assert!(!codec.matches_type("a_b_acme_2024-01-05.xml", "acme"));
    }

    #[test]
    fn test_glob_falls_back_for_unsafe_values() {
        let codec = FilenameCodec::new();
        assert_eq!(codec.glob_for(SearchField::Customer, "*"), "*.json");
        assert_eq!(codec.glob_for(SearchField::DocType, "a[b]"), "*.json");
        assert_eq!(codec.glob_for(SearchField::Customer, ""), "*.json");
    }

    #[test]
    fn test_search_query_field_and_value() {
        let query = SearchQuery::Date(date(2024, 1, 5));
        assert_eq!(query.field(), SearchField::Date);
        assert_eq!(query.value(), "2024-01-05");
        assert_eq!(SearchField::DocType.to_string(), "type");
    }
}
