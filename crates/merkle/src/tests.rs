use super::*;

fn manual_combine(a: &[u8; HASH_SIZE], b: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    let mut buf = Vec::with_capacity(HASH_SIZE * 2);
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    leaf_hash(&buf)
}

#[test]
fn empty_input_has_no_root() {
    let tree = MerkleTree::from_leaves(Vec::new());
    assert!(tree.root_hash().is_none());
}

#[test]
fn single_value_root_is_its_leaf_hash() {
    let tree = MerkleTree::from_values([b"only".as_slice()]);
    assert_eq!(tree.root_hash().unwrap(), leaf_hash(b"only"));
}

#[test]
fn two_values_root_combines_leaves() {
    let la = leaf_hash(b"a");
    let lb = leaf_hash(b"b");
    let tree = MerkleTree::from_leaves(vec![la, lb]);
    assert_eq!(tree.root_hash().unwrap(), manual_combine(&la, &lb));
}

#[test]
fn odd_leaf_is_promoted_unchanged() {
    // Three leaves: level one pairs (a,b) and promotes c; the root then
    // combines hash(a,b) with c itself.
    let la = leaf_hash(b"a");
    let lb = leaf_hash(b"b");
    let lc = leaf_hash(b"c");
    let tree = MerkleTree::from_leaves(vec![la, lb, lc]);

    let ab = manual_combine(&la, &lb);
    assert_eq!(tree.root_hash().unwrap(), manual_combine(&ab, &lc));
}

#[test]
fn deterministic_for_same_input() {
    let values: Vec<Vec<u8>> = (0..100).map(|i| format!("value-{i}").into_bytes()).collect();
    let t1 = MerkleTree::from_values(values.iter());
    let t2 = MerkleTree::from_values(values.iter());
    assert_eq!(t1.root_hash(), t2.root_hash());
}

#[test]
fn different_values_change_the_root() {
    let t1 = MerkleTree::from_values([b"a".as_slice(), b"b".as_slice()]);
    let t2 = MerkleTree::from_values([b"a".as_slice(), b"c".as_slice()]);
    assert_ne!(t1.root_hash(), t2.root_hash());
}

#[test]
fn preorder_starts_with_root_and_counts_nodes() {
    let tree = MerkleTree::from_values([b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);

    let mut out = Vec::new();
    tree.write_preorder(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    // 3 leaves + parent(a,b) + root = 5 nodes.
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], hex::encode(tree.root_hash().unwrap()));
    for line in &lines {
        assert_eq!(line.len(), HASH_SIZE * 2);
    }
}

#[test]
fn preorder_visits_left_subtree_first() {
    let la = leaf_hash(b"a");
    let lb = leaf_hash(b"b");
    let tree = MerkleTree::from_leaves(vec![la, lb]);

    let mut out = Vec::new();
    tree.write_preorder(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[1], hex::encode(la));
    assert_eq!(lines[2], hex::encode(lb));
}

#[test]
fn large_tree_builds_without_recursion() {
    let values: Vec<Vec<u8>> = (0..10_000u32).map(|i| i.to_le_bytes().to_vec()).collect();
    let tree = MerkleTree::from_values(values.iter());
    assert!(tree.root_hash().is_some());

    let mut out = Vec::new();
    tree.write_preorder(&mut out).unwrap();
    assert!(!out.is_empty());
}
