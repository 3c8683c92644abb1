//! Saving: implicit transactions, application transactions and failures.

use cairn_tests::prelude::*;
use pretty_assertions::assert_eq;

fn path(s: &str) -> Path {
    Path::parse(s).unwrap()
}

mod implicit {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_without_changes_touches_nothing() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let outcome = session.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::Unchanged));
        let stats = fixture.transport.stats();
        assert_eq!((stats.begins, stats.stores, stats.commits), (0, 0, 0));
    }

    #[test]
    fn test_save_commits_once() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.add_node("/archive", "2024", None).unwrap();

        // WHEN
        let outcome = session.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::Committed));
        let stats = fixture.transport.stats();
        assert_eq!((stats.begins, stats.stores, stats.commits, stats.rollbacks), (1, 1, 1, 0));
        assert!(!session.has_pending_changes().unwrap());
        assert!(fixture.saved().contains(&path("/archive/2024")));
    }

    #[test]
    fn test_commit_failure_rolls_back_once() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.remove_item("/content/drafts").unwrap();
        fixture
            .transport
            .fail_next_commit(TransportError::unavailable("connection reset"));

        // WHEN
        let outcome = session.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::RolledBack(SessionError::Repository { .. })));
        assert_eq!(fixture.transport.stats().rollbacks, 1);
        assert!(fixture.saved().contains(&path("/content/drafts")));
        assert!(session.has_pending_changes().unwrap());
    }

    #[test]
    fn test_failed_save_can_be_retried() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.remove_item("/content/drafts").unwrap();
        fixture
            .transport
            .fail_next_store(TransportError::unavailable("timeout"));
        assert!(session.save().is_err());

        // WHEN
        session.save().unwrap();

        // THEN
        assert!(!fixture.saved().contains(&path("/content/drafts")));
        assert_eq!(fixture.transport.stats().rollbacks, 1);
        assert_eq!(fixture.transport.stats().commits, 1);
    }

    #[test]
    fn test_partial_batch_not_applied() {
        // GIVEN
        let transport = MemoryTransport::builder()
            .workspace("default", content_tree())
            .deny(path("/archive"), Permission::AddNode)
            .build();
        let fixture = Fixture::with_transport(transport);
        let mut session = fixture.login();
        session.add_node("/content/drafts", "ok", None).unwrap();
        session.add_node("/archive", "denied", None).unwrap();

        // WHEN
        let result = session.save();

        // THEN
        assert!(matches!(result, Err(SessionError::AccessDenied { .. })));
        assert!(!fixture.saved().contains(&path("/content/drafts/ok")));
        assert_eq!(fixture.transport.stats().rollbacks, 1);
        assert!(session.node_exists("/archive/denied").unwrap());
    }

    #[test]
    fn test_failed_rollback_is_not_joined_by_next_save() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session
            .set_property("/content", PropertyData::string("status", "draft"))
            .unwrap();
        fixture
            .transport
            .fail_next_store(TransportError::unavailable("timeout"));
        fixture
            .transport
            .fail_next_rollback(TransportError::unavailable("connection reset"));
        let first = session.save_with_outcome().unwrap();

        // WHEN
        let second = session.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(first, SaveOutcome::RolledBack(_)));
        assert!(!matches!(second, SaveOutcome::Joined));
        assert!(!second.is_success());
        assert!(!session.workspace().unwrap().transaction_manager().in_transaction());
        assert!(session.has_pending_changes().unwrap());
        assert_eq!(fixture.transport.stats().commits, 0);
        assert!(fixture.saved().property(&path("/content/status")).is_none());
    }

    #[test]
    fn test_logout_releases_abandoned_transaction() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.add_node("/archive", "lost", None).unwrap();
        fixture
            .transport
            .fail_next_store(TransportError::unavailable("timeout"));
        fixture
            .transport
            .fail_next_rollback(TransportError::unavailable("connection reset"));
        assert!(session.save().is_err());

        // WHEN
        session.logout();

        // THEN
        assert!(!fixture.transport.in_transaction());
        let mut next = fixture.login();
        next.add_node("/archive", "kept", None).unwrap();
        next.save().unwrap();
        assert!(fixture.saved().contains(&path("/archive/kept")));
    }
}

mod application {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_joins_application_transaction() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .begin()
            .unwrap();
        session.add_node("/archive", "first", None).unwrap();

        // WHEN
        let outcome = session.save_with_outcome().unwrap();
        session.add_node("/archive", "second", None).unwrap();
        session.save().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::Joined));
        assert_eq!(fixture.transport.stats().commits, 0);
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .commit()
            .unwrap();
        let saved = fixture.saved();
        assert!(saved.contains(&path("/archive/first")));
        assert!(saved.contains(&path("/archive/second")));
    }

    #[test]
    fn test_application_rollback_discards_joined_saves() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .begin()
            .unwrap();
        session.add_node("/archive", "temp", None).unwrap();
        session.save().unwrap();

        // WHEN
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .rollback()
            .unwrap();

        // THEN
        assert!(!fixture.saved().contains(&path("/archive/temp")));
    }

    #[test]
    fn test_failure_inside_application_transaction_is_not_rolled_back() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .begin()
            .unwrap();
        session.add_node("/archive", "x", None).unwrap();
        fixture
            .transport
            .fail_next_store(TransportError::unavailable("timeout"));

        // WHEN
        let outcome = session.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::Failed(_)));
        assert_eq!(fixture.transport.stats().rollbacks, 0);
        assert!(session.workspace().unwrap().transaction_manager().in_transaction());
        assert!(session.has_pending_changes().unwrap());
    }
}

mod independent_sessions {
    use super::*;
    use pretty_assertions::assert_eq;

    fn begin(session: &mut Session) {
        session
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .begin()
            .unwrap();
    }

    #[test]
    fn test_application_transaction_does_not_block_other_sessions() {
        // GIVEN
        let fixture = Fixture::new();
        let mut first = fixture.login();
        let mut second = fixture.login();
        begin(&mut first);
        first.add_node("/archive", "pending", None).unwrap();
        first.save().unwrap();

        // WHEN
        second
            .set_property("/content", PropertyData::string("status", "live"))
            .unwrap();
        let outcome = second.save_with_outcome().unwrap();

        // THEN
        assert!(matches!(outcome, SaveOutcome::Committed));
        assert!(first.workspace().unwrap().transaction_manager().in_transaction());
        assert!(first.node_exists("/archive/pending").unwrap());
        assert!(!second.node_exists("/archive/pending").unwrap());
        assert!(!fixture.saved().contains(&path("/archive/pending")));
    }

    #[test]
    fn test_rollback_keeps_other_sessions_writes() {
        // GIVEN
        let fixture = Fixture::new();
        let mut first = fixture.login();
        let mut second = fixture.login();
        begin(&mut first);
        first.add_node("/archive", "temp", None).unwrap();
        first.save().unwrap();
        second.add_node("/content/drafts", "kept", None).unwrap();
        second.save().unwrap();

        // WHEN
        first
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .rollback()
            .unwrap();

        // THEN
        let saved = fixture.saved();
        assert!(!saved.contains(&path("/archive/temp")));
        assert!(saved.contains(&path("/content/drafts/kept")));
    }

    #[test]
    fn test_both_sessions_in_transactions_commit_independently() {
        // GIVEN
        let fixture = Fixture::new();
        let mut first = fixture.login();
        let mut second = fixture.login();
        begin(&mut first);
        begin(&mut second);
        first.add_node("/archive", "one", None).unwrap();
        first.save().unwrap();
        second.add_node("/archive", "two", None).unwrap();
        second.save().unwrap();

        // WHEN
        second
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .commit()
            .unwrap();
        first
            .workspace_mut()
            .unwrap()
            .transaction_manager_mut()
            .commit()
            .unwrap();

        // THEN
        let saved = fixture.saved();
        assert!(saved.contains(&path("/archive/one")));
        assert!(saved.contains(&path("/archive/two")));
        assert_eq!(fixture.transport.stats().commits, 2);
    }
}
