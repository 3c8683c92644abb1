//! Local mutations and how they reach the repository on save.

use cairn_tests::prelude::*;
use pretty_assertions::assert_eq;

fn path(s: &str) -> Path {
    Path::parse(s).unwrap()
}

fn heading(session: &mut Session, section: &str) -> String {
    session
        .property(&format!("{}/heading", section))
        .unwrap()
        .text()
        .unwrap()
        .to_string()
}

mod moves {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_then_save() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        session.move_item("/content/drafts", "/archive/drafts").unwrap();
        session.save().unwrap();

        // THEN
        assert!(session.node_exists("/archive/drafts").unwrap());
        assert!(!session.node_exists("/content/drafts").unwrap());
        let saved = fixture.saved();
        assert!(saved.contains(&path("/archive/drafts")));
        assert!(!saved.contains(&path("/content/drafts")));
    }

    #[test]
    fn test_move_onto_existing_item_records_nothing() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let result = session.move_item("/content/drafts", "/archive");

        // THEN
        assert!(matches!(result, Err(SessionError::ItemExists { .. })));
        assert!(!session.has_pending_changes().unwrap());
    }

    #[test]
    fn test_move_onto_existing_property_rejected() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let result = session.move_item("/content/drafts", "/content/article/title");

        assert!(matches!(result, Err(SessionError::ItemExists { .. })));
    }

    #[test]
    fn test_identifier_follows_moved_subtree() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        session.move_item("/content/article", "/archive/article").unwrap();

        // THEN
        let section = session.node_by_identifier(SECTION_ID).unwrap();
        assert_eq!(section.path().to_string(), "/archive/article/section[3]");
        session.save().unwrap();
        assert_eq!(
            fixture.saved().path_for_identifier(SECTION_ID),
            Some(path("/archive/article/section[3]"))
        );
    }
}

mod removals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removing_sibling_renumbers_rest() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        session.remove_item("/content/article/section[2]").unwrap();

        // THEN
        assert_eq!(heading(&mut session, "/content/article/section[1]"), "one");
        assert_eq!(heading(&mut session, "/content/article/section[2]"), "three");
        assert!(!session.node_exists("/content/article/section[3]").unwrap());
    }

    #[test]
    fn test_renumbering_survives_save() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.remove_item("/content/article/section[1]").unwrap();

        // WHEN
        session.save().unwrap();

        // THEN
        assert_eq!(heading(&mut session, "/content/article/section"), "two");
        assert_eq!(
            fixture.saved().path_for_identifier(SECTION_ID),
            Some(path("/content/article/section[2]"))
        );
    }

    #[test]
    fn test_remove_property() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        session.remove_item("/content/article/thumbnail").unwrap();
        session.save().unwrap();

        // THEN
        assert!(!session.property_exists("/content/article/thumbnail").unwrap());
        assert!(fixture
            .saved()
            .property(&path("/content/article/thumbnail"))
            .is_none());
    }

    #[test]
    fn test_remove_missing_item() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.remove_item("/content/ghost"),
            Err(SessionError::PathNotFound { .. })
        ));
    }
}

mod additions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_node_defaults_to_unstructured() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let node = session.add_node("/content/drafts", "note", None).unwrap();

        // THEN
        assert_eq!(node.path().to_string(), "/content/drafts/note");
        assert_eq!(node.primary_type(), "nt:unstructured");
        assert!(session.has_pending_changes().unwrap());
    }

    #[test]
    fn test_add_referenceable_node_and_save() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session
            .add_node("/content/drafts", "note", Some("nt:folder"))
            .unwrap();
        session
            .add_mixin("/content/drafts/note", "mix:referenceable")
            .unwrap();
        session
            .set_property("/content/drafts/note", PropertyData::string("body", "draft"))
            .unwrap();
        let identifier = session
            .node("/content/drafts/note")
            .unwrap()
            .identifier()
            .unwrap()
            .to_string();

        // WHEN
        session.save().unwrap();

        // THEN
        let note = session.node_by_identifier(&identifier).unwrap();
        assert_eq!(note.primary_type(), "nt:folder");
        assert_eq!(note.property("body").and_then(Property::text), Some("draft"));
        assert_eq!(
            fixture.saved().path_for_identifier(&identifier),
            Some(path("/content/drafts/note"))
        );
    }

    #[test]
    fn test_set_property_replaces_value() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let property = session
            .set_property("/content/article", PropertyData::string("title", "Updated"))
            .unwrap();

        // THEN
        assert_eq!(property.path().to_string(), "/content/article/title");
        assert_eq!(property.text(), Some("Updated"));
    }

    #[test]
    fn test_protected_property_rejected() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let result = session.set_property(
            "/content/article",
            PropertyData::string("jcr:uuid", "forged"),
        );

        assert!(matches!(result, Err(SessionError::ConstraintViolation { .. })));
        assert!(!session.has_pending_changes().unwrap());
    }
}
