//! Relation document decoding and encoding.
//!
//! Decoding validates in a fixed order and stops at the first failure:
//! document, changeset, id, version, visibility, tags, members. Only the id
//! and version rules depend on the [`Intent`]; every other check produces
//! the same error for both intents.

use log::{debug, trace};

use crate::codec::xml::{self, XmlElement, XmlWriter};
use crate::error::ParseError;
use crate::limits::{DEFAULT_VERSION, MAX_DEPTH, MAX_DOCUMENT_LEN, MAX_MEMBERS, MAX_TAG_LENGTH};
use crate::model::{
    ElementId, ElementType, Intent, Member, MemberList, PROVISIONAL_ID, Relation, TagSet, coerce_id,
    parse_ref,
};
use crate::validate::{check_member_count, check_positive, check_tag, check_update_id, owner_label};

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of members per relation.
    pub max_members: usize,
    /// Maximum number of characters in a tag key or value.
    pub max_tag_length: usize,
    /// Maximum document size in bytes.
    pub max_document_len: usize,
    /// Maximum element nesting depth.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_members: MAX_MEMBERS,
            max_tag_length: MAX_TAG_LENGTH,
            max_document_len: MAX_DOCUMENT_LEN,
            max_depth: MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Creates options with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members;
        self
    }

    pub fn with_max_tag_length(mut self, max_tag_length: usize) -> Self {
        self.max_tag_length = max_tag_length;
        self
    }

    pub fn with_max_document_len(mut self, max_document_len: usize) -> Self {
        self.max_document_len = max_document_len;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Parses a relation document with the default limits.
///
/// The document is either `<osm><relation .../></osm>` or a bare
/// `<relation .../>` element. When `<osm>` holds several relations, the
/// first one is parsed.
pub fn parse_relation(document: &str, intent: Intent) -> Result<Relation, ParseError> {
    parse_relation_with_options(document, intent, &ParseOptions::default())
}

/// Parses a relation document with the given limits.
pub fn parse_relation_with_options(
    document: &str,
    intent: Intent,
    options: &ParseOptions,
) -> Result<Relation, ParseError> {
    let result = decode_document(document, intent, options);
    match &result {
        Ok(relation) => debug!(
            id = relation.id(),
            version = relation.version(),
            changeset = relation.changeset_id(),
            tags = relation.tags().len(),
            members = relation.members().len(),
            intent:?;
            "Parsed relation"
        ),
        Err(err) => debug!(code = err.kind().code(), intent:?; "Rejected relation: {err}"),
    }
    result
}

fn decode_document(
    document: &str,
    intent: Intent,
    options: &ParseOptions,
) -> Result<Relation, ParseError> {
    if document.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }
    if document.len() > options.max_document_len {
        return Err(ParseError::DocumentTooLarge {
            len: document.len(),
            max: options.max_document_len,
        });
    }

    let root = xml::parse_document_with_max_depth(document, options.max_depth)
        .map_err(|e| ParseError::Unparsable { offset: e.offset })?;
    let element = find_relation(&root).ok_or(ParseError::MissingRelation)?;
    decode_relation(element, intent, options)
}

fn find_relation<'e, 'a>(root: &'e XmlElement<'a>) -> Option<&'e XmlElement<'a>> {
    match root.name {
        "osm" => root.child(ElementType::Relation.as_str()),
        "relation" => Some(root),
        _ => None,
    }
}

/// Decodes one `<relation>` element.
pub fn decode_relation(
    element: &XmlElement<'_>,
    intent: Intent,
    options: &ParseOptions,
) -> Result<Relation, ParseError> {
    let changeset_id = element
        .attribute("changeset")
        .ok_or(ParseError::MissingChangeset)
        .and_then(|raw| check_positive("Changeset id", raw))?;

    // A create never adopts the document id: the store assigns it.
    let (id, version) = match intent {
        Intent::Create => {
            let version = match element.attribute("version") {
                Some(raw) => check_positive("Version", raw)?,
                None => DEFAULT_VERSION,
            };
            (PROVISIONAL_ID, version)
        }
        Intent::Update => {
            let raw_id = element.attribute("id").ok_or(ParseError::MissingId)?;
            let id = check_update_id(coerce_id(raw_id))?;
            let raw_version = element.attribute("version").ok_or(ParseError::MissingVersion)?;
            (id, check_positive("Version", raw_version)?)
        }
    };
    let owner = (!intent.is_create()).then_some(id);

    let visible = match element.attribute("visible") {
        None => true,
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            return Err(ParseError::InvalidVisible {
                value: other.to_string(),
            });
        }
    };

    let tags = decode_tags(element, owner, options)?;
    let members = decode_members(element, owner, options)?;

    trace!(owner = owner_label(ElementType::Relation, owner); "Decoded relation element");
    Ok(Relation::from_parts(id, version, changeset_id, visible, tags, members))
}

fn decode_tags(
    element: &XmlElement<'_>,
    owner: Option<ElementId>,
    options: &ParseOptions,
) -> Result<TagSet, ParseError> {
    let mut tags = TagSet::new();
    for tag in element.children_named("tag") {
        let key = tag.attribute("k");
        let value = tag.attribute("v");
        check_tag(key, value, options)?;
        let (key, value) = (key.unwrap_or_default(), value.unwrap_or_default());
        if !tags.insert(key, value) {
            return Err(ParseError::DuplicateTag {
                element: ElementType::Relation,
                id: owner,
                key: key.to_string(),
            });
        }
    }
    Ok(tags)
}

fn decode_members(
    element: &XmlElement<'_>,
    owner: Option<ElementId>,
    options: &ParseOptions,
) -> Result<MemberList, ParseError> {
    let count = element.children_named("member").count();
    check_member_count(owner, count, options)?;

    let mut members = MemberList::with_capacity(count);
    for member in element.children_named("member") {
        members.push(decode_member(member)?);
    }
    Ok(members)
}

fn decode_member(member: &XmlElement<'_>) -> Result<Member, ParseError> {
    let raw_type = member.attribute("type").ok_or(ParseError::MissingMemberType)?;
    let member_type = raw_type
        .parse::<ElementType>()
        .map_err(|e| ParseError::UnknownMemberType { value: e.0 })?;

    let raw_ref = member.attribute("ref").ok_or(ParseError::MissingMemberRef)?;
    let member_id = parse_ref(raw_ref).ok_or_else(|| ParseError::InvalidMemberRef {
        value: raw_ref.to_string(),
    })?;

    let role = member.attribute("role").unwrap_or_default();
    Ok(Member::new(member_type, member_id, role))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a relation as an `<osm>` document.
///
/// Members come before tags, as in API responses. A provisional relation
/// is written without an `id` attribute.
pub fn encode_relation(relation: &Relation) -> String {
    let id = relation.id().to_string();
    let changeset = relation.changeset_id().to_string();
    let version = relation.version().to_string();
    let visible = if relation.is_visible() { "true" } else { "false" };

    let mut attributes = Vec::with_capacity(4);
    if !relation.is_provisional() {
        attributes.push(("id", id.as_str()));
    }
    attributes.push(("changeset", changeset.as_str()));
    attributes.push(("version", version.as_str()));
    attributes.push(("visible", visible));

    let mut writer = XmlWriter::new();
    writer.open("osm", &[("version", crate::API_VERSION)]);

    if relation.members().is_empty() && relation.tags().is_empty() {
        writer.empty("relation", &attributes);
    } else {
        writer.open("relation", &attributes);
        for member in relation.members() {
            let member_ref = member.member_id.to_string();
            writer.empty(
                "member",
                &[
                    ("type", member.member_type.as_str()),
                    ("ref", member_ref.as_str()),
                    ("role", member.role.as_str()),
                ],
            );
        }
        for (key, value) in relation.tags().iter() {
            writer.empty("tag", &[("k", key), ("v", value)]);
        }
        writer.close("relation");
    }

    writer.close("osm");
    writer.into_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::ErrorKind;
    use crate::model::RelationBuilder;

    fn message(document: &str, intent: Intent) -> String {
        parse_relation(document, intent).unwrap_err().to_string()
    }

    #[test]
    fn test_no_id() {
        let noid = "<osm><relation version='12' changeset='23' /></osm>";
        let created = parse_relation(noid, Intent::Create).unwrap();
        assert!(created.is_provisional());
        assert_eq!(created.version(), 12);
        assert_eq!(created.changeset_id(), 23);

        let err = parse_relation(noid, Intent::Update).unwrap_err();
        assert_eq!(err, ParseError::MissingId);
        assert_eq!(err.to_string(), "ID is required when updating");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_no_changeset_id() {
        let nocs = "<osm><relation id='123' version='12' /></osm>";
        assert_eq!(message(nocs, Intent::Create), "Changeset id is missing");
        assert_eq!(message(nocs, Intent::Update), "Changeset id is missing");
    }

    #[test]
    fn test_no_version() {
        let no_version = "<osm><relation id='123' changeset='23' /></osm>";
        let created = parse_relation(no_version, Intent::Create).unwrap();
        assert_eq!(created.version(), 1);
        assert_eq!(message(no_version, Intent::Update), "Version is required when updating");
    }

    #[test]
    fn test_id_zero() {
        for id in ["", "0", "00", "0.0", "a"] {
            let zero_id = format!("<osm><relation id='{id}' changeset='332' version='23' /></osm>");
            assert!(parse_relation(&zero_id, Intent::Create).is_ok(), "create failed for {:?}", id);

            let err = parse_relation(&zero_id, Intent::Update).unwrap_err();
            assert_eq!(err.to_string(), "ID of relation cannot be zero when updating.");
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
        }
    }

    #[test]
    fn test_negative_id_on_update() {
        let doc = "<osm><relation id='-5' changeset='1' version='1' /></osm>";
        assert!(parse_relation(doc, Intent::Create).is_ok());
        assert_eq!(parse_relation(doc, Intent::Update).unwrap_err(), ParseError::NegativeId);
    }

    #[test]
    fn test_no_text() {
        for doc in ["", "   \n"] {
            assert_eq!(message(doc, Intent::Create), "Must specify a string with one or more characters");
            assert_eq!(message(doc, Intent::Update), "Must specify a string with one or more characters");
        }
    }

    #[test]
    fn test_unparsable_and_missing_relation() {
        for intent in [Intent::Create, Intent::Update] {
            assert!(matches!(
                parse_relation("<osm><relation", intent),
                Err(ParseError::Unparsable { .. })
            ));
            assert_eq!(
                parse_relation("<osm><node id='1'/></osm>", intent),
                Err(ParseError::MissingRelation)
            );
            assert_eq!(parse_relation("<way id='1'/>", intent), Err(ParseError::MissingRelation));
        }
    }

    #[test]
    fn test_no_k_v() {
        let nokv = "<osm><relation id='23' changeset='23' version='23'><tag /></relation></osm>";
        assert_eq!(message(nokv, Intent::Create), "tag is missing key");
        assert_eq!(message(nokv, Intent::Update), "tag is missing key");
    }

    #[test]
    fn test_no_v() {
        let no_v = "<osm><relation id='23' changeset='23' version='23'><tag k='key' /></relation></osm>";
        assert_eq!(message(no_v, Intent::Create), "tag is missing value");
        assert_eq!(message(no_v, Intent::Update), "tag is missing value");
    }

    #[test]
    fn test_blank_key_and_value() {
        let blank_k = "<relation id='1' changeset='1' version='1'><tag k=' ' v='x'/></relation>";
        assert_eq!(message(blank_k, Intent::Update), "tag is missing key");
        let blank_v = "<relation id='1' changeset='1' version='1'><tag k='x' v=''/></relation>";
        assert_eq!(message(blank_v, Intent::Update), "tag is missing value");
    }

    #[test]
    fn test_duplicate_k() {
        let dupk = "<osm><relation id='23' changeset='23' version='23'><tag k='dup' v='test'/><tag k='dup' v='tester'/></relation></osm>";
        let create = parse_relation(dupk, Intent::Create).unwrap_err();
        assert_eq!(create.to_string(), "Element relation/ has duplicate tags with key dup");
        assert_eq!(create.kind(), ErrorKind::IntegrityViolation);
        assert_eq!(
            message(dupk, Intent::Update),
            "Element relation/23 has duplicate tags with key dup"
        );
    }

    #[test]
    fn test_changeset_must_be_number() {
        let doc = "<relation id='1' changeset='abc' version='1'/>";
        assert_eq!(message(doc, Intent::Create), "Changeset id is not a valid number: abc");
        let zero = "<relation id='1' changeset='0' version='1'/>";
        assert_eq!(message(zero, Intent::Update), "Changeset id must be a positive integer");
    }

    #[test]
    fn test_version_must_be_number() {
        let doc = "<relation id='1' changeset='1' version='x'/>";
        assert_eq!(message(doc, Intent::Create), "Version is not a valid number: x");
        assert_eq!(message(doc, Intent::Update), "Version is not a valid number: x");
    }

    #[test]
    fn test_check_order() {
        // Changeset is checked before id, id before version.
        let bare = "<relation/>";
        assert_eq!(parse_relation(bare, Intent::Update), Err(ParseError::MissingChangeset));
        let only_cs = "<relation changeset='1'/>";
        assert_eq!(parse_relation(only_cs, Intent::Update), Err(ParseError::MissingId));
        let zero_no_version = "<relation changeset='1' id='0'/>";
        assert_eq!(parse_relation(zero_no_version, Intent::Update), Err(ParseError::ZeroId));
        // Tags are checked before members.
        let both = "<relation changeset='1'><member type='area' ref='1'/><tag/></relation>";
        assert_eq!(parse_relation(both, Intent::Create), Err(ParseError::MissingTagKey));
    }

    #[test]
    fn test_visible() {
        let hidden = "<relation id='2' changeset='1' version='3' visible='false'/>";
        assert!(!parse_relation(hidden, Intent::Update).unwrap().is_visible());
        let shown = "<relation id='2' changeset='1' version='3' visible='true'/>";
        assert!(parse_relation(shown, Intent::Update).unwrap().is_visible());
        let bad = "<relation id='2' changeset='1' version='3' visible='yes'/>";
        assert_eq!(
            parse_relation(bad, Intent::Update),
            Err(ParseError::InvalidVisible {
                value: "yes".to_string()
            })
        );
    }

    #[test]
    fn test_members_in_order() {
        let doc = r#"<osm>
            <relation id="8" changeset="4" version="3">
              <member type="node" ref="15" role="some node"/>
              <member type="way" ref="4" role="some way"/>
              <member type="relation" ref="7" role="some relation"/>
              <member type="relation" ref="8"/>
              <member type="node" ref="-1" role="new"/>
              <tag k="testing" v="added in relation version 3"/>
              <tag k="testing two" v="modified in relation version 4"/>
            </relation>
          </osm>"#;
        let relation = parse_relation(doc, Intent::Update).unwrap();
        assert_eq!(relation.id(), 8);
        assert_eq!(
            relation.member_triples(),
            vec![
                (ElementType::Node, 15, "some node"),
                (ElementType::Way, 4, "some way"),
                (ElementType::Relation, 7, "some relation"),
                (ElementType::Relation, 8, ""),
                (ElementType::Node, -1, "new"),
            ]
        );
        assert_eq!(relation.tags().len(), 2);
        assert_eq!(relation.tags().get("testing"), Some("added in relation version 3"));
        assert_eq!(relation.tags().get("testing two"), Some("modified in relation version 4"));
    }

    #[test]
    fn test_member_errors() {
        let cases = [
            ("<member ref='1'/>", "member is missing type"),
            (
                "<member type='area' ref='1'/>",
                "The area is not allowed only, node, way, relation allowed",
            ),
            ("<member type='node'/>", "member is missing ref"),
            ("<member type='way' ref='x1'/>", "member ref is not a valid number: x1"),
        ];
        for (member, expected) in cases {
            let doc = format!("<relation changeset='1'>{}</relation>", member);
            assert_eq!(message(&doc, Intent::Create), expected);
            let err = parse_relation(&doc, Intent::Create).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput);
        }
    }

    #[test]
    fn test_member_limit() {
        let doc = "<relation id='3' changeset='1' version='1'><member type='node' ref='1'/><member type='node' ref='2'/></relation>";
        let options = ParseOptions::new().with_max_members(1);
        assert_eq!(
            parse_relation_with_options(doc, Intent::Update, &options).unwrap_err().to_string(),
            "The relation 3 has 2 members, but the maximum number of members is 1"
        );
        let relaxed = options.with_max_members(2);
        assert!(parse_relation_with_options(doc, Intent::Update, &relaxed).is_ok());
    }

    #[test]
    fn test_document_limit() {
        let doc = "<relation changeset='1'/>";
        let options = ParseOptions::new().with_max_document_len(8);
        assert_eq!(
            parse_relation_with_options(doc, Intent::Create, &options),
            Err(ParseError::DocumentTooLarge { len: doc.len(), max: 8 })
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!(
            "<osm><relation changeset='1'>{}{}</relation></osm>",
            "<x>".repeat(5_000),
            "</x>".repeat(5_000)
        );
        assert!(matches!(
            parse_relation(&nested, Intent::Create),
            Err(ParseError::Unparsable { .. })
        ));

        let doc = "<osm><relation changeset='1'><member type='node' ref='1'/></relation></osm>";
        assert!(parse_relation(doc, Intent::Create).is_ok());
        let shallow = ParseOptions::new().with_max_depth(2);
        assert!(matches!(
            parse_relation_with_options(doc, Intent::Create, &shallow),
            Err(ParseError::Unparsable { .. })
        ));
        let exact = shallow.with_max_depth(3);
        assert!(parse_relation_with_options(doc, Intent::Create, &exact).is_ok());
    }

    #[test]
    fn test_duplicate_attributes_rejected() {
        for doc in [
            "<osm><relation changeset='1' changeset='2'/></osm>",
            "<osm><relation id='5' changeset='1' version='1' id='0'/></osm>",
        ] {
            let err = parse_relation(doc, Intent::Update).unwrap_err();
            assert!(matches!(err, ParseError::Unparsable { .. }), "got {err:?}");
            assert_eq!(err.kind(), ErrorKind::MalformedInput);
        }
    }

    #[test]
    fn test_tag_too_long() {
        let long = "x".repeat(256);
        let doc = format!("<relation changeset='1'><tag k='name' v='{}'/></relation>", long);
        assert!(matches!(
            parse_relation(&doc, Intent::Create),
            Err(ParseError::TagTooLong { max: 255, .. })
        ));
    }

    #[test]
    fn test_first_relation_wins_and_unknown_children_ignored() {
        let doc = "<osm><relation changeset='1'><nd ref='1'/></relation><relation changeset='2'/></osm>";
        let relation = parse_relation(doc, Intent::Create).unwrap();
        assert_eq!(relation.changeset_id(), 1);
        assert!(relation.members().is_empty());
    }

    #[test]
    fn test_encode_then_parse() {
        let relation = RelationBuilder::new(42)
            .id(9)
            .version(4)
            .node(15, "some node")
            .way(4, "a \"quoted\" & <odd> role")
            .relation(9, "")
            .tag("name", "Ring & Road")
            .tag("type", "route")
            .build();

        let document = encode_relation(&relation);
        let parsed = parse_relation(&document, Intent::Update).unwrap();
        assert_eq!(parsed, relation);
        assert!(parsed.same_content(&relation));
        assert_eq!(parsed.changeset_id(), 42);
    }

    #[test]
    fn test_encode_provisional_omits_id() {
        let relation = RelationBuilder::new(1).build();
        let document = encode_relation(&relation);
        assert!(!document.contains(" id="));
        assert!(document.contains("<relation changeset=\"1\" version=\"1\" visible=\"true\"/>"));
        assert!(parse_relation(&document, Intent::Create).is_ok());
        assert_eq!(parse_relation(&document, Intent::Update), Err(ParseError::MissingId));
    }

    fn member_strategy() -> impl Strategy<Value = (ElementType, i64, String)> {
        (
            prop_oneof![
                Just(ElementType::Node),
                Just(ElementType::Way),
                Just(ElementType::Relation)
            ],
            -1000i64..1_000_000,
            "[a-z ]{0,12}",
        )
    }

    proptest! {
        #[test]
        fn members_and_tags_survive_parsing(
            members in prop::collection::vec(member_strategy(), 0..20),
            tags in prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9&<>\"' ]{0,10}[a-z]", 0..10),
        ) {
            let mut doc = String::from("<osm><relation id='5' changeset='2' version='1'>");
            for (t, id, role) in &members {
                doc.push_str(&format!("<member type='{}' ref='{}' role='{}'/>", t, id, role));
            }
            for (k, v) in &tags {
                doc.push_str(&format!("<tag k='{}' v='{}'/>", k, xml::escape_attribute(v)));
            }
            doc.push_str("</relation></osm>");

            let relation = parse_relation(&doc, Intent::Update).unwrap();
            let parsed: Vec<_> = relation
                .member_triples()
                .into_iter()
                .map(|(t, id, role)| (t, id, role.to_string()))
                .collect();
            prop_assert_eq!(parsed, members);
            prop_assert_eq!(relation.tags().len(), tags.len());
            for (k, v) in &tags {
                prop_assert_eq!(relation.tags().get(k), Some(v.as_str()));
            }
        }
    }
}
