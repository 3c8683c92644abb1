//! Seeded repositories for integration tests.

use std::sync::Arc;

use cairn_core::names::MIX_REFERENCEABLE;
use cairn_core::{Path, PropertyData, PropertyType, Value};
use cairn_session::{Repository, RepositoryConfig, Session};
use cairn_transport::{Credentials, MemoryTransport, Tree};

/// Identifier of `/content/article`.
pub const ARTICLE_ID: &str = "article-1";

/// Identifier of `/content/article/section[3]`.
pub const SECTION_ID: &str = "section-3";

fn path(s: &str) -> Path {
    Path::parse(s).expect("fixture path")
}

/// The content every fixture starts from:
///
/// ```text
/// /
/// ├── content
/// │   ├── article      (referenceable; title, tags, thumbnail)
/// │   │   ├── section[1..3]  (heading)
/// │   └── drafts
/// └── archive
/// ```
pub fn content_tree() -> Tree {
    let mut tree = Tree::new();
    tree.add_node(&Path::root(), "content", "nt:unstructured")
        .expect("content");
    tree.add_node(&Path::root(), "archive", "nt:unstructured")
        .expect("archive");

    let content = path("/content");
    let article = tree
        .add_node(&content, "article", "nt:unstructured")
        .expect("article");
    tree.add_mixin(&article, MIX_REFERENCEABLE, Some(ARTICLE_ID.to_string()))
        .expect("referenceable article");
    tree.set_property(&article, PropertyData::string("title", "Hello <world>"))
        .expect("title");
    tree.set_property(
        &article,
        PropertyData::multiple(
            "tags",
            PropertyType::String,
            vec![Value::from("news"), Value::from("tech")],
        ),
    )
    .expect("tags");
    tree.set_property(&article, PropertyData::binary("thumbnail", b"png".to_vec()))
        .expect("thumbnail");

    for heading in ["one", "two", "three"] {
        let section = tree
            .add_node(&article, "section", "nt:unstructured")
            .expect("section");
        tree.set_property(&section, PropertyData::string("heading", heading))
            .expect("heading");
    }
    tree.add_mixin(
        &path("/content/article/section[3]"),
        MIX_REFERENCEABLE,
        Some(SECTION_ID.to_string()),
    )
    .expect("referenceable section");

    tree.add_node(&content, "drafts", "nt:unstructured")
        .expect("drafts");
    tree
}

/// A repository over a [`MemoryTransport`] the test can inspect.
pub struct Fixture {
    pub transport: Arc<MemoryTransport>,
    pub repository: Repository,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Repository serving [`content_tree`] as the `default` workspace.
    pub fn new() -> Self {
        Self::with_transport(MemoryTransport::new(content_tree()))
    }

    pub fn with_transport(transport: MemoryTransport) -> Self {
        Self::with_config(transport, RepositoryConfig::default())
    }

    pub fn with_config(transport: MemoryTransport, config: RepositoryConfig) -> Self {
        let transport = Arc::new(transport);
        let repository = Repository::with_config(transport.clone(), config);
        Self {
            transport,
            repository,
        }
    }

    /// Anonymous session on the default workspace.
    pub fn login(&self) -> Session {
        self.repository
            .login(Credentials::anonymous(), None)
            .expect("anonymous login")
    }

    /// The saved state of the `default` workspace.
    pub fn saved(&self) -> Tree {
        self.transport.tree("default").expect("default workspace")
    }
}
