//! Login, logout and the session surface around the content.

use cairn_session::ImportUuidBehavior;
use cairn_tests::prelude::*;
use pretty_assertions::assert_eq;

fn path(s: &str) -> Path {
    Path::parse(s).unwrap()
}

mod login {
    use super::*;
    use pretty_assertions::assert_eq;

    fn guarded() -> Fixture {
        Fixture::with_transport(
            MemoryTransport::builder()
                .workspace("default", content_tree())
                .workspace("staging", Tree::new())
                .user("alice", "secret")
                .build(),
        )
    }

    #[test]
    fn test_login_with_credentials() {
        // GIVEN
        let fixture = guarded();

        // WHEN
        let session = fixture
            .repository
            .login(
                Credentials::simple("alice", "secret").with_attribute("tenant", "acme"),
                Some("staging"),
            )
            .unwrap();

        // THEN
        assert_eq!(session.user_id().unwrap(), Some("alice"));
        assert_eq!(session.attribute("tenant").unwrap(), Some("acme"));
        assert_eq!(session.attribute_names().unwrap(), vec!["tenant"]);
        assert_eq!(session.workspace().unwrap().name(), "staging");
    }

    #[test]
    fn test_wrong_password_denied() {
        let fixture = guarded();

        let result = fixture
            .repository
            .login(Credentials::simple("alice", "guess"), None);

        assert!(matches!(result, Err(SessionError::AccessDenied { .. })));
        assert!(fixture.repository.sessions().is_empty());
    }

    #[test]
    fn test_unknown_workspace() {
        let fixture = Fixture::new();

        let result = fixture
            .repository
            .login(Credentials::anonymous(), Some("nowhere"));

        assert!(matches!(result, Err(SessionError::Repository { .. })));
    }

    #[test]
    fn test_namespace_conflict_logs_out_again() {
        // GIVEN
        let transport = MemoryTransport::builder()
            .workspace("default", content_tree())
            .namespace("jcr", "urn:example:not-jcr")
            .build();
        let fixture = Fixture::with_transport(transport);

        // WHEN
        let result = fixture.repository.login(Credentials::anonymous(), None);

        // THEN
        assert!(matches!(result, Err(SessionError::Namespace(_))));
        let stats = fixture.transport.stats();
        assert_eq!((stats.logins, stats.logouts), (1, 1));
        assert_eq!(fixture.transport.open_logins(), 0);
        assert!(fixture.repository.sessions().is_empty());
    }

    #[test]
    fn test_default_workspace_from_config() {
        // GIVEN
        let config = RepositoryConfig::from_toml_str("default_workspace = \"staging\"").unwrap();
        let transport = MemoryTransport::builder()
            .workspace("staging", content_tree())
            .build();
        let fixture = Fixture::with_config(transport, config);

        // WHEN
        let session = fixture.login();

        // THEN
        assert_eq!(session.workspace().unwrap().name(), "staging");
    }

    #[test]
    fn test_sessions_registered_independently() {
        // GIVEN
        let fixture = Fixture::new();

        // WHEN
        let mut first = fixture.login();
        let mut second = fixture.login();
        second.add_node("/archive", "mine", None).unwrap();

        // THEN
        let registry = fixture.repository.sessions();
        assert_eq!(registry.len(), 2);
        assert_ne!(first.key().unwrap(), second.key().unwrap());
        assert_eq!(
            registry.lookup(first.key().unwrap()).map(|c| c.workspace),
            Some("default".to_string())
        );
        assert!(!first.node_exists("/archive/mine").unwrap());
    }
}

mod logout {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logout_ends_session() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.add_node("/archive", "unsaved", None).unwrap();

        // WHEN
        session.logout();

        // THEN
        assert!(!session.is_live());
        assert!(fixture.repository.sessions().is_empty());
        assert_eq!(fixture.transport.open_logins(), 0);
        assert!(matches!(session.node("/content"), Err(SessionError::NotLive)));
        assert!(matches!(session.save(), Err(SessionError::NotLive)));
        assert!(matches!(session.user_id(), Err(SessionError::NotLive)));
        assert!(matches!(session.item_exists("/"), Err(SessionError::NotLive)));
        assert!(!fixture.saved().contains(&path("/archive/unsaved")));
    }

    #[test]
    fn test_logout_twice_is_harmless() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        session.logout();
        session.logout();

        assert!(!session.is_live());
    }
}

mod binaries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lazy_binary_loads_through_registry() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();

        // WHEN
        let binary = session.lazy_binary("/content/article/thumbnail", 0).unwrap();

        // THEN
        assert_eq!(binary.session_key(), session.key().unwrap());
        assert_eq!(binary.load(fixture.repository.sessions()).unwrap(), b"png".to_vec());
    }

    #[test]
    fn test_lazy_binary_dies_with_session() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        let binary = session.lazy_binary("/content/article/thumbnail", 0).unwrap();

        // WHEN
        session.logout();

        // THEN
        assert!(matches!(
            binary.load(fixture.repository.sessions()),
            Err(SessionError::NotLive)
        ));
    }

    #[test]
    fn test_lazy_binary_requires_binary_value() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.lazy_binary("/content/article/title", 0),
            Err(SessionError::InvalidArgument { .. })
        ));
        assert!(matches!(
            session.lazy_binary("/content/article/thumbnail", 1),
            Err(SessionError::InvalidArgument { .. })
        ));
    }
}

mod permissions {
    use super::*;

    fn restricted() -> Fixture {
        Fixture::with_transport(
            MemoryTransport::builder()
                .workspace("default", content_tree())
                .deny(path("/archive"), Permission::Remove)
                .build(),
        )
    }

    #[test]
    fn test_has_permission_requires_every_action() {
        let fixture = restricted();
        let mut session = fixture.login();

        assert!(session.has_permission("/archive", "read, add_node").unwrap());
        assert!(!session.has_permission("/archive", "read,remove").unwrap());
        assert!(!session.has_permission("/archive/not/there", "remove").unwrap());
        assert!(session.has_permission("/content", "remove").unwrap());
    }

    #[test]
    fn test_check_permission() {
        let fixture = restricted();
        let mut session = fixture.login();

        assert!(session.check_permission("/content", "set_property").is_ok());
        assert!(matches!(
            session.check_permission("/archive", "remove"),
            Err(SessionError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let fixture = restricted();
        let mut session = fixture.login();

        assert!(matches!(
            session.has_permission("/archive", "read,fly"),
            Err(SessionError::InvalidArgument { .. })
        ));
    }
}

mod namespaces {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_includes_remote_namespaces() {
        // GIVEN
        let transport = MemoryTransport::builder()
            .workspace("default", content_tree())
            .namespace("shop", "urn:example:shop")
            .build();
        let fixture = Fixture::with_transport(transport);
        let session = fixture.login();

        // THEN
        assert_eq!(session.namespace_uri("shop").unwrap(), "urn:example:shop");
        assert_eq!(session.namespace_prefix("http://www.jcp.org/jcr/1.0").unwrap(), "jcr");
        assert_eq!(
            session.namespace_prefixes().unwrap(),
            vec!["jcr", "sv", "nt", "mix", "xml", "", "shop"]
        );
        assert!(matches!(
            session.namespace_uri("nope"),
            Err(SessionError::Namespace(_))
        ));
    }

    #[test]
    fn test_remapping_not_implemented() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.set_namespace_prefix("j", "http://www.jcp.org/jcr/1.0"),
            Err(SessionError::NotImplemented { .. })
        ));
    }
}

mod options {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fetch_depth_from_config() {
        let config = RepositoryConfig::from_toml_str("fetch_depth = 3").unwrap();
        let fixture = Fixture::with_config(MemoryTransport::new(content_tree()), config);
        let session = fixture.login();

        assert_eq!(session.session_option(SessionOption::FetchDepth).unwrap(), 3);
    }

    #[test]
    fn test_prefetch_saves_round_trips() {
        // GIVEN
        let fixture = Fixture::new();
        let mut session = fixture.login();
        session.set_session_option(SessionOption::FetchDepth, 3).unwrap();
        session.node("/content").unwrap();
        let before = fixture.transport.stats().fetches;

        // WHEN
        for section in ["section[1]", "section[2]", "section[3]"] {
            session.node(&format!("/content/article/{}", section)).unwrap();
        }

        // THEN
        assert_eq!(fixture.transport.stats().fetches, before);
    }
}

mod unsupported {
    use super::*;

    #[test]
    fn test_unsupported_operations() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.impersonate(Credentials::simple("bob", "pw")),
            Err(SessionError::UnsupportedOperation { operation: "impersonate" })
        ));
        assert!(matches!(
            session.access_control_manager(),
            Err(SessionError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            session.retention_manager(),
            Err(SessionError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            session.add_lock_token("t"),
            Err(SessionError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            session.lock_tokens(),
            Err(SessionError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            session.remove_lock_token("t"),
            Err(SessionError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_not_implemented_operations() {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        assert!(matches!(
            session.refresh(true),
            Err(SessionError::NotImplemented { operation: "refresh" })
        ));
        let mut input = "<sv:node/>".as_bytes();
        assert!(matches!(
            session.import_xml("/content", &mut input, ImportUuidBehavior::Throw),
            Err(SessionError::NotImplemented { operation: "import_xml" })
        ));
    }
}
