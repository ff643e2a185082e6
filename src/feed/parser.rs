use super::label::normalize_label_case;
use super::types::{ChangelogEntry, FeedError, ParseError};
use super::xml::{parse_document, Element};

const DOMAIN_CHANGELOG_TYPE: &str = "changelog-type";
const DOMAIN_CHANGELOG_LABEL: &str = "changelog-label";

/// Receives a warning when a feed fails to parse.
///
/// Implementations must not panic or block; the parse error is returned to
/// the caller right after the call.
pub trait Diagnostics: Send + Sync {
    fn warn(&self, message: &str);
}

/// Default sink: a `tracing` warning event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Parses an RSS 2.0 document into changelog entries, in document order.
///
/// On failure the diagnostics sink is notified once before the error is
/// returned, wrapped as [`FeedError::Parse`]. No partial results are
/// returned.
pub fn parse(xml: &str, diagnostics: &dyn Diagnostics) -> Result<Vec<ChangelogEntry>, FeedError> {
    parse_entries(xml).map_err(|err| {
        diagnostics.warn(&format!("Error parsing RSS feed: {}", err));
        FeedError::Parse(err)
    })
}

/// Parses without reporting: the bare [`ParseError`] is returned.
pub fn parse_entries(xml: &str) -> Result<Vec<ChangelogEntry>, ParseError> {
    let root = parse_document(xml)?;

    if root.name != "rss" {
        return Err(ParseError::InvalidStructure);
    }
    let channel = root.child("channel").ok_or(ParseError::InvalidStructure)?;

    // A lone <item> and a run of <item>s are collected the same way
    let items: Vec<&Element> = channel.children_named("item").collect();
    if items.is_empty() {
        return Err(ParseError::InvalidStructure);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| map_item(index, item))
        .collect()
}

fn map_item(index: usize, item: &Element) -> Result<ChangelogEntry, ParseError> {
    let guid = item
        .child("guid")
        .map(|g| GuidValue::from_element(g).resolve().to_string())
        .filter(|g| !g.is_empty())
        .ok_or(ParseError::MissingField {
            index,
            field: "guid",
        })?;

    let content = item
        .child_text("content:encoded")
        .filter(|c| !c.is_empty())
        .or_else(|| item.child_text("description"))
        .unwrap_or_default()
        .to_string();

    let (changelog_type, changelog_label) = extract_categories(item);

    Ok(ChangelogEntry {
        title: required_text(item, index, "title")?,
        link: required_text(item, index, "link")?,
        pub_date: required_text(item, index, "pubDate")?,
        content,
        guid,
        changelog_type,
        changelog_label,
    })
}

fn required_text(item: &Element, index: usize, field: &'static str) -> Result<String, ParseError> {
    item.child_text(field)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(ParseError::MissingField { index, field })
}

/// The two shapes a `<guid>` takes in the wild.
#[derive(Debug, PartialEq, Eq)]
enum GuidValue<'a> {
    /// `<guid>tag:github.com,2008:1</guid>`
    Text(&'a str),
    /// `<guid isPermaLink="true">https://...</guid>`
    Attributed { inner_text: &'a str },
}

impl<'a> GuidValue<'a> {
    fn from_element(element: &'a Element) -> Self {
        if element.attributes.is_empty() {
            GuidValue::Text(&element.text)
        } else {
            GuidValue::Attributed {
                inner_text: &element.text,
            }
        }
    }

    /// Inner text for attributed elements, plain text otherwise. An
    /// attributed element without text resolves to an empty identifier.
    fn resolve(&self) -> &'a str {
        match self {
            GuidValue::Text(text) => text,
            GuidValue::Attributed { inner_text } => inner_text,
        }
    }
}

/// Returns `(changelog_type, changelog_label)`; the last category seen for a
/// domain wins. Categories without text are ignored.
fn extract_categories(item: &Element) -> (Option<String>, Option<String>) {
    let mut changelog_type = None;
    let mut changelog_label = None;

    for category in item.children_named("category") {
        if category.text.is_empty() {
            continue;
        }
        match category.attribute("domain") {
            Some(DOMAIN_CHANGELOG_TYPE) => changelog_type = Some(category.text.clone()),
            Some(DOMAIN_CHANGELOG_LABEL) => {
                changelog_label = Some(normalize_label_case(&category.text))
            }
            _ => {}
        }
    }

    (changelog_type, changelog_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDiagnostics {
        warnings: Mutex<Vec<String>>,
    }

    impl Diagnostics for RecordingDiagnostics {
        fn warn(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    fn item(guid: &str, title: &str) -> String {
        format!(
            "<item><title>{title}</title><link>https://example.com/{guid}</link>\
             <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate><guid>{guid}</guid></item>"
        )
    }

    fn feed(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>GitHub Changelog</title>
    {items}
  </channel>
</rss>"#
        )
    }

    #[test]
    fn test_parses_items_in_order() {
        let xml = feed(
            r#"<item>
                <title>Test Item 1</title>
                <link>https://example.com/1</link>
                <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
                <content:encoded><![CDATA[Test content 1]]></content:encoded>
                <guid>item-1</guid>
              </item>
              <item>
                <title>Test Item 2</title>
                <link>https://example.com/2</link>
                <pubDate>Tue, 02 Jan 2024 12:00:00 GMT</pubDate>
                <description>Test description 2</description>
                <guid>item-2</guid>
              </item>"#,
        );

        let entries = parse_entries(&xml).unwrap();
        assert_eq!(
            entries,
            vec![
                ChangelogEntry {
                    title: "Test Item 1".into(),
                    link: "https://example.com/1".into(),
                    pub_date: "Mon, 01 Jan 2024 12:00:00 GMT".into(),
                    content: "Test content 1".into(),
                    guid: "item-1".into(),
                    changelog_type: None,
                    changelog_label: None,
                },
                ChangelogEntry {
                    title: "Test Item 2".into(),
                    link: "https://example.com/2".into(),
                    pub_date: "Tue, 02 Jan 2024 12:00:00 GMT".into(),
                    content: "Test description 2".into(),
                    guid: "item-2".into(),
                    changelog_type: None,
                    changelog_label: None,
                },
            ]
        );
    }

    #[test]
    fn test_single_item_matches_first_of_many() {
        let single = parse_entries(&feed(&item("only", "Only"))).unwrap();
        let many = parse_entries(&feed(&format!("{}{}", item("only", "Only"), item("b", "B"))))
            .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0], many[0]);
    }

    #[test]
    fn test_encoded_content_preferred_over_description() {
        let xml = feed(
            "<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>\
             <description>plain</description>\
             <content:encoded><![CDATA[<p>rich</p>]]></content:encoded></item>",
        );
        assert_eq!(parse_entries(&xml).unwrap()[0].content, "<p>rich</p>");
    }

    #[test]
    fn test_empty_encoded_content_falls_back_to_description() {
        let xml = feed(
            "<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>\
             <content:encoded></content:encoded><description>plain</description></item>",
        );
        assert_eq!(parse_entries(&xml).unwrap()[0].content, "plain");
    }

    #[test]
    fn test_missing_content_is_empty_string() {
        let entries = parse_entries(&feed(&item("g", "T"))).unwrap();
        assert_eq!(entries[0].content, "");
    }

    #[test]
    fn test_guid_with_attributes_uses_inner_text() {
        let xml = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate>
               <guid isPermaLink="true">https://github.blog/changelog/2024-01-01-x</guid></item>"#,
        );
        assert_eq!(
            parse_entries(&xml).unwrap()[0].guid,
            "https://github.blog/changelog/2024-01-01-x"
        );
    }

    #[test]
    fn test_guid_value_shapes() {
        let plain = Element {
            name: "guid".into(),
            text: "abc".into(),
            ..Default::default()
        };
        assert_eq!(GuidValue::from_element(&plain), GuidValue::Text("abc"));
        assert_eq!(GuidValue::from_element(&plain).resolve(), "abc");

        let attributed = Element {
            name: "guid".into(),
            attributes: vec![("isPermaLink".into(), "false".into())],
            text: "id-1".into(),
            children: vec![],
        };
        assert_eq!(GuidValue::from_element(&attributed).resolve(), "id-1");

        let attributes_only = Element {
            name: "guid".into(),
            attributes: vec![("isPermaLink".into(), "false".into())],
            ..Default::default()
        };
        assert_eq!(GuidValue::from_element(&attributes_only).resolve(), "");
    }

    #[test]
    fn test_changelog_categories() {
        let xml = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>
               <category domain="changelog-type">Improvement</category>
               <category domain="changelog-label">copilot</category>
               <category>ignored</category>
               <category domain="other">ignored too</category></item>"#,
        );
        let entry = &parse_entries(&xml).unwrap()[0];
        assert_eq!(entry.changelog_type.as_deref(), Some("Improvement"));
        assert_eq!(entry.changelog_label.as_deref(), Some("Copilot"));
    }

    #[test]
    fn test_single_category_and_last_seen_wins() {
        let only_label = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>
               <category domain="changelog-label">github actions</category></item>"#,
        );
        let entry = &parse_entries(&only_label).unwrap()[0];
        assert_eq!(entry.changelog_type, None);
        assert_eq!(entry.changelog_label.as_deref(), Some("GitHub Actions"));

        let duplicated = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>
               <category domain="changelog-type">New feature</category>
               <category domain="changelog-type">Retired</category></item>"#,
        );
        let entry = &parse_entries(&duplicated).unwrap()[0];
        assert_eq!(entry.changelog_type.as_deref(), Some("Retired"));
    }

    #[test]
    fn test_escaped_label_entities_are_decoded() {
        let xml = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>
               <category domain="changelog-label">account &amp;amp; profile</category></item>"#,
        );
        let entry = &parse_entries(&xml).unwrap()[0];
        assert_eq!(entry.changelog_label.as_deref(), Some("Account & Profile"));

        let twice = feed(
            r#"<item><title>T</title><link>L</link><pubDate>D</pubDate><guid>g</guid>
               <category domain="changelog-label">&amp;amp;lt;beta&amp;amp;gt;</category></item>"#,
        );
        let entry = &parse_entries(&twice).unwrap()[0];
        assert_eq!(entry.changelog_label.as_deref(), Some("<beta>"));
    }

    #[test]
    fn test_no_categories_leaves_fields_absent() {
        let entry = &parse_entries(&feed(&item("g", "T"))).unwrap()[0];
        assert_eq!(entry.changelog_type, None);
        assert_eq!(entry.changelog_label, None);
    }

    #[test]
    fn test_invalid_structure() {
        for xml in [
            "<invalid>XML</invalid>",
            "<rss version=\"2.0\"></rss>",
            "<rss><channel><title>Empty</title></channel></rss>",
        ] {
            assert_eq!(parse_entries(xml), Err(ParseError::InvalidStructure), "{xml}");
        }
    }

    #[test]
    fn test_missing_required_field() {
        let xml = feed(&format!(
            "{}<item><title>T</title><link>L</link><guid>g</guid></item>",
            item("a", "A")
        ));
        assert_eq!(
            parse_entries(&xml),
            Err(ParseError::MissingField {
                index: 1,
                field: "pubDate"
            })
        );
    }

    #[test]
    fn test_parse_failure_warns_then_wraps() {
        let diagnostics = RecordingDiagnostics::default();
        let err = parse("<invalid>XML</invalid>", &diagnostics).unwrap_err();

        assert!(matches!(err, FeedError::Parse(ParseError::InvalidStructure)));
        assert_eq!(err.to_string(), "Failed to parse RSS feed: Invalid RSS feed structure");
        assert_eq!(
            *diagnostics.warnings.lock().unwrap(),
            vec!["Error parsing RSS feed: Invalid RSS feed structure".to_string()]
        );
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let diagnostics = RecordingDiagnostics::default();
        let err = parse("<rss><channel></rss>", &diagnostics).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse RSS feed:"));
        assert_eq!(diagnostics.warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_success_emits_no_warning() {
        let diagnostics = RecordingDiagnostics::default();
        parse(&feed(&item("g", "T")), &diagnostics).unwrap();
        assert!(diagnostics.warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let xml = feed(&format!("{}{}", item("a", "A"), item("b", "B")));
        assert_eq!(parse_entries(&xml).unwrap(), parse_entries(&xml).unwrap());
    }

    proptest! {
        #[test]
        fn prop_preserves_item_count_and_order(guids in proptest::collection::vec("[a-z0-9-]{1,12}", 1..20)) {
            let items: String = guids.iter().map(|g| item(g, "Title")).collect();
            let entries = parse_entries(&feed(&items)).unwrap();
            let parsed: Vec<&str> = entries.iter().map(|e| e.guid.as_str()).collect();
            let expected: Vec<&str> = guids.iter().map(String::as_str).collect();
            prop_assert_eq!(parsed, expected);
        }
    }
}
