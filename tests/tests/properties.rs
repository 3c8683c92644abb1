//! Laws that hold for any path or sibling layout.

use cairn_tests::prelude::*;
use proptest::prelude::*;

const NAMES: [&str; 9] = [
    "content", "article", "section", "drafts", "archive", "title", "heading", "tags", "missing",
];

fn path_text() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::sample::select(NAMES.to_vec()), 1usize..=4), 1..=4).prop_map(
        |segments| {
            segments
                .into_iter()
                .map(|(name, index)| {
                    if index == 1 {
                        format!("/{}", name)
                    } else {
                        format!("/{}[{}]", name, index)
                    }
                })
                .collect()
        },
    )
}

fn siblings(count: usize) -> Tree {
    let mut tree = Tree::new();
    let list = tree.add_node(&Path::root(), "list", "nt:unstructured").unwrap();
    for i in 0..count {
        let item = tree.add_node(&list, "item", "nt:unstructured").unwrap();
        tree.set_property(&item, PropertyData::string("n", i.to_string()))
            .unwrap();
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_exists_iff_lookup_succeeds(path in path_text()) {
        let fixture = Fixture::new();
        let mut session = fixture.login();

        let node_found = match session.node(&path) {
            Ok(_) => true,
            Err(SessionError::PathNotFound { .. }) => false,
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        let property_found = match session.property(&path) {
            Ok(_) => true,
            Err(SessionError::PathNotFound { .. }) => false,
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };

        prop_assert_eq!(session.node_exists(&path).unwrap(), node_found);
        prop_assert_eq!(session.property_exists(&path).unwrap(), property_found);
        prop_assert_eq!(session.item_exists(&path).unwrap(), node_found || property_found);
    }

    #[test]
    fn prop_removal_renumbers_siblings(count in 1usize..6, pick in 0usize..6) {
        let removed = pick % count;
        let fixture = Fixture::with_transport(MemoryTransport::new(siblings(count)));
        let mut session = fixture.login();

        session.remove_item(&format!("/list/item[{}]", removed + 1)).unwrap();

        let mut remaining = Vec::new();
        for index in 1..count {
            let value = session
                .property(&format!("/list/item[{}]/n", index))
                .unwrap();
            remaining.push(value.text().unwrap().to_string());
        }
        let expected: Vec<String> = (0..count)
            .filter(|i| *i != removed)
            .map(|i| i.to_string())
            .collect();
        prop_assert_eq!(remaining, expected);
        let last_path = format!("/list/item[{}]", count);
        prop_assert!(!session.node_exists(&last_path).unwrap());
    }
}
