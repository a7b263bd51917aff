//! Structural operations across the public surface.

use treewatch_dom::{DomError, DomTree, MutationType, TreeObserver};

#[test]
fn build_move_and_remove() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let ul = tree.create_element("ul");
    let li1 = tree.create_element("li");
    let li2 = tree.create_element("li");
    let li3 = tree.create_element("li");

    tree.append_child(root, ul).unwrap();
    tree.append_child(ul, li1).unwrap();
    tree.append_child(ul, li3).unwrap();
    tree.insert_before(ul, li2, Some(li3)).unwrap();
    assert_eq!(tree.children(ul).collect::<Vec<_>>(), vec![li1, li2, li3]);

    // Re-inserting an attached node moves it.
    tree.insert_before(ul, li3, Some(li1)).unwrap();
    assert_eq!(tree.children(ul).collect::<Vec<_>>(), vec![li3, li1, li2]);

    tree.remove_child(ul, li1).unwrap();
    assert_eq!(tree.children(ul).collect::<Vec<_>>(), vec![li3, li2]);
    assert_eq!(tree.parent(li1), None);
    assert!(!tree.contains(root, li1));
    assert!(tree.contains(root, li2));
}

#[test]
fn invalid_operations_error() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = tree.create_element("div");
    let text = tree.create_text("hi");
    tree.append_child(root, div).unwrap();
    tree.append_child(div, text).unwrap();

    // Text nodes take no children.
    let other = tree.create_element("span");
    assert_eq!(tree.append_child(text, other), Err(DomError::InvalidNodeType));
    // The root cannot be inserted anywhere.
    assert_eq!(tree.append_child(div, root), Err(DomError::HierarchyRequest));
    // A node cannot be inserted into its own subtree.
    assert_eq!(tree.append_child(div, div), Err(DomError::HierarchyRequest));
    // Wrong parent.
    assert_eq!(tree.remove_child(root, text), Err(DomError::NotAChild));
    // Attributes only exist on elements.
    assert_eq!(
        tree.set_attribute(text, "foo", "1"),
        Err(DomError::InvalidNodeType)
    );
    // Character data only exists on text and comment nodes.
    assert_eq!(tree.set_text(div, "x"), Err(DomError::InvalidNodeType));
}

#[test]
fn observed_edits_capture_sibling_context() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let a = tree.create_element("a");
    let b = tree.create_element("b");
    let c = tree.create_element("c");
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();
    tree.append_child(root, c).unwrap();

    let mut obs = TreeObserver::new(&mut tree);
    obs.remove_child(root, b).unwrap();
    obs.insert_before(root, b, Some(a)).unwrap();
    let records = obs.take_records();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].mutation_type, MutationType::ChildList);
    assert_eq!(records[0].removed_nodes, vec![b]);
    assert_eq!(records[0].previous_sibling, Some(a));
    assert_eq!(records[0].next_sibling, Some(c));
    assert_eq!(records[1].added_nodes, vec![b]);
    assert_eq!(records[1].previous_sibling, None);
    assert_eq!(records[1].next_sibling, Some(a));

    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![b, a, c]);
}

#[test]
fn rejected_observed_edit_leaves_no_trace() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = tree.create_element("div");
    let text = tree.create_text("hi");
    tree.append_child(root, div).unwrap();
    tree.append_child(div, text).unwrap();
    let stray = tree.create_element("span");

    let mut obs = TreeObserver::new(&mut tree);
    assert_eq!(obs.append_child(text, div), Err(DomError::InvalidNodeType));
    assert_eq!(obs.append_child(div, div), Err(DomError::HierarchyRequest));
    assert_eq!(
        obs.insert_before(root, div, Some(stray)),
        Err(DomError::NotAChild)
    );

    // A rejected edit must not detach the child or log a record.
    assert!(obs.take_records().is_empty());
    assert_eq!(tree.parent(div), Some(root));
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![div]);
    assert_eq!(tree.children(div).collect::<Vec<_>>(), vec![text]);
}

#[test]
fn take_records_drains() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let div = tree.create_element("div");

    let mut obs = TreeObserver::new(&mut tree);
    obs.append_child(root, div).unwrap();
    assert_eq!(obs.take_records().len(), 1);
    assert!(obs.take_records().is_empty());
}
