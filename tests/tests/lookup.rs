//! Resolution and existence checks through a session.

use cairn_tests::prelude::*;
use pretty_assertions::assert_eq;

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_node_and_property_by_path() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let article = session.node("/content/article").unwrap();
        let title = session.property("/content/article/title").unwrap();

        // THEN
        assert_eq!(article.identifier(), Some(ARTICLE_ID));
        assert!(article.is_referenceable());
        assert_eq!(article.children().len(), 3);
        assert_eq!(title.text(), Some("Hello <world>"));
    }

    #[test]
    fn test_item_prefers_node() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let node = session.item("/content/article/section[2]").unwrap();
        let property = session.item("/content/article/section[2]/heading").unwrap();

        // THEN
        assert!(node.is_node());
        assert_eq!(property.as_property().and_then(Property::text), Some("two"));
    }

    #[test]
    fn test_missing_item_is_path_not_found() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let result = session.item("/content/nothing");

        assert!(matches!(result, Err(SessionError::PathNotFound { .. })));
    }

    #[test]
    fn test_root_node() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let root = session.root_node().unwrap();

        assert!(root.is_root());
        let names: Vec<_> = root.children().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["content", "archive"]);
    }

    #[test]
    fn test_node_by_identifier() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let section = session.node_by_identifier(SECTION_ID).unwrap();

        // THEN
        assert_eq!(section.path().to_string(), "/content/article/section[3]");
        assert!(matches!(
            session.node_by_identifier("no-such-id"),
            Err(SessionError::IdentifierNotFound { .. })
        ));
    }

    #[test]
    fn test_relative_path_rejected() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.node("content/article"),
            Err(SessionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_indexed_property_segment_not_found() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN/THEN
        assert!(matches!(
            session.property("/content/article/title[1]"),
            Err(SessionError::PathNotFound { .. })
        ));
        assert!(!session.property_exists("/content/article/title[1]").unwrap());
        assert!(!session.item_exists("/content/article/title[1]").unwrap());
        assert_eq!(
            session.lookup_property("/content/article/title[1]").unwrap(),
            Lookup::Missing
        );
        assert!(session.properties(&["/content/article/title[1]"]).unwrap().is_empty());
        assert!(session.property_exists("/content/article/title").unwrap());
        assert!(session.node_exists("/content/article/section[1]").unwrap());
    }
}

mod batches {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nodes_drop_unresolvable_paths() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let nodes = session
            .nodes(&["/archive", "/content/missing", "/content/drafts"])
            .unwrap();

        // THEN
        let paths: Vec<_> = nodes.iter().map(|n| n.path().to_string()).collect();
        assert_eq!(paths, vec!["/archive", "/content/drafts"]);
    }

    #[test]
    fn test_nodes_by_identifier_keyed_by_identifier() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let nodes = session
            .nodes_by_identifier(&[SECTION_ID, "unknown", ARTICLE_ID])
            .unwrap();

        // THEN
        let keys: Vec<_> = nodes.keys().cloned().collect();
        assert_eq!(keys, vec![ARTICLE_ID.to_string(), SECTION_ID.to_string()]);
        assert_eq!(nodes[ARTICLE_ID].path().to_string(), "/content/article");
    }

    #[test]
    fn test_properties_drop_unresolvable_paths() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let properties = session
            .properties(&["/content/article/title", "/content/article/nope"])
            .unwrap();

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name(), "title");
    }
}

mod existence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_always_exists() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(session.item_exists("/").unwrap());
        assert!(session.node_exists("/").unwrap());
    }

    #[test]
    fn test_exists_matches_lookup() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // THEN
        assert!(session.node_exists("/content/article/section[3]").unwrap());
        assert!(!session.node_exists("/content/article/section[4]").unwrap());
        assert!(session.property_exists("/content/article/tags").unwrap());
        assert!(!session.property_exists("/content/article").unwrap());
        assert!(session.item_exists("/content/article/thumbnail").unwrap());
        assert_eq!(session.lookup_node("/archive/x").unwrap(), Lookup::Missing);
    }

    #[test]
    fn test_unreadable_node_does_not_exist() {
        // GIVEN
        let transport = MemoryTransport::builder()
            .workspace("default", content_tree())
            .deny(Path::parse("/content/drafts").unwrap(), Permission::Read)
            .build();
        let fixture = Fixture::with_transport(transport);
        let mut session = fixture.login();

        // THEN
        assert!(!session.node_exists("/content/drafts").unwrap());
        let nodes = session.nodes(&["/content/drafts", "/content/article"]).unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_pending_changes_visible() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        session.add_node("/archive", "old", None).unwrap();
        session.remove_item("/content/drafts").unwrap();

        // THEN
        assert!(session.node_exists("/archive/old").unwrap());
        assert!(!session.node_exists("/content/drafts").unwrap());
        assert!(!fixture.saved().contains(&Path::parse("/archive/old").unwrap()));
    }
}
