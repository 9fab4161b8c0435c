use bintree::errors::{TreeError, TreeResult};
use bintree::util::testing;
use bintree::{NodeId, Slot, TreeArena};
use rstest::{fixture, rstest};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

//    1
//   / \
//  3   4
#[fixture]
fn small_tree() -> (TreeArena, NodeId) {
    let mut arena = TreeArena::new();
    let root = arena.create(1);
    arena.set_first_child(root, 3).unwrap();
    arena.set_second_child(root, 4).unwrap();
    (arena, root)
}

fn expected_count(arena: &TreeArena, node: NodeId) -> usize {
    let below: usize = Slot::BOTH
        .into_iter()
        .filter_map(|slot| arena.child(node, slot).unwrap())
        .map(|child| arena.node_count(child).unwrap())
        .sum();
    1 + below
}

// ============================================================
// Fresh roots
// ============================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(-7)]
#[case(i32::MAX)]
#[case(i32::MIN)]
fn given_any_value_when_creating_root_then_single_node_tree(#[case] value: i32) -> TreeResult<()> {
    let mut arena = TreeArena::new();
    let root = arena.create(value);

    assert_eq!(arena.value(root)?, value);
    assert_eq!(arena.height(root)?, 1);
    assert_eq!(arena.node_count(root)?, 1);
    assert_eq!(arena.leaf_count(root)?, 1);
    assert!(arena.is_root(root)?);
    assert_eq!(arena.first_child(root)?, None);
    assert_eq!(arena.second_child(root)?, None);
    Ok(())
}

// ============================================================
// Structure queries
// ============================================================

#[rstest]
fn given_small_tree_when_querying_then_reports_shape(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (arena, root) = small_tree;

    assert_eq!(arena.height(root)?, 2);
    assert_eq!(arena.node_count(root)?, 3);
    assert_eq!(arena.leaf_count(root)?, 2);
    assert!(arena.contains(root, 4)?);
    assert!(!arena.contains(root, 99)?);

    let first = arena.first_child(root)?.expect("first child");
    let second = arena.second_child(root)?.expect("second child");
    assert_eq!(arena.value(first)?, 3);
    assert_eq!(arena.value(second)?, 4);
    assert_eq!(arena.parent(first)?, Some(root));
    assert_eq!(arena.root_of(second)?, root);
    Ok(())
}

#[rstest]
fn given_subtree_handle_when_querying_then_counts_only_subtree(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();
    arena.set_second_child(first, 6)?;

    assert_eq!(arena.node_count(first)?, 2);
    assert_eq!(arena.height(first)?, 2);
    assert!(!arena.contains(first, 1)?);
    assert!(arena.contains(first, 6)?);
    Ok(())
}

#[rstest]
fn given_irregular_tree_when_counting_then_count_is_one_plus_children(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();
    let deep = arena.set_second_child(first, 5)?;
    arena.set_first_child(deep, 8)?;
    arena.set_second_child(deep, 9)?;

    let all: Vec<NodeId> = arena.iter_preorder(root)?.map(|(id, _)| id).collect();
    for node in all {
        assert_eq!(arena.node_count(node)?, expected_count(&arena, node));
    }
    assert_eq!(arena.leaf_count(root)?, 3);
    assert_eq!(arena.height(root)?, 4);
    Ok(())
}

#[rstest]
fn given_deep_chain_when_measuring_then_does_not_overflow_stack() -> TreeResult<()> {
    let mut arena = TreeArena::new();
    let root = arena.create(0);
    let mut tip = root;
    for value in 1..20_000 {
        tip = arena.set_first_child(tip, value)?;
    }

    assert_eq!(arena.height(root)?, 20_000);
    assert_eq!(arena.node_count(root)?, 20_000);
    assert_eq!(arena.leaf_count(root)?, 1);
    arena.destroy(root)?;
    assert!(arena.is_empty());
    Ok(())
}

// ============================================================
// Mutation
// ============================================================

#[rstest]
fn given_root_when_setting_value_then_fails_with_immutable_root(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;

    let result = arena.set_value(root, 2);

    assert!(matches!(result, Err(TreeError::ImmutableRoot(id)) if id == root));
    assert_eq!(arena.value(root)?, 1);
    Ok(())
}

#[rstest]
fn given_child_when_setting_value_then_queries_see_new_value(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let second = arena.second_child(root)?.unwrap();

    arena.set_value(second, 42)?;

    assert_eq!(arena.value(second)?, 42);
    assert!(arena.contains(root, 42)?);
    assert!(!arena.contains(root, 4)?);
    Ok(())
}

#[rstest]
#[case(Slot::First)]
#[case(Slot::Second)]
fn given_occupied_slot_when_creating_child_then_fails_and_keeps_tree(
    small_tree: (TreeArena, NodeId),
    #[case] slot: Slot,
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let existing = arena.child(root, slot)?;

    let result = arena.create_child(root, slot, 7);

    assert!(matches!(
        result,
        Err(TreeError::SlotOccupied { node, slot: s }) if node == root && s == slot
    ));
    assert_eq!(arena.child(root, slot)?, existing);
    assert_eq!(arena.node_count(root)?, 3);
    assert_eq!(arena.len(), 3);
    assert!(!arena.contains(root, 7)?);
    Ok(())
}

#[rstest]
fn given_first_child_handle_when_deepening_then_height_follows(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();

    arena.set_first_child(first, 5)?;
    assert_eq!(arena.height(root)?, 3);

    arena.remove_first_child(first)?;
    assert_eq!(arena.height(root)?, 2);
    assert_eq!(arena.value(first)?, 3);
    Ok(())
}

#[rstest]
fn given_both_children_when_removed_then_only_root_remains(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();
    arena.set_first_child(first, 5)?;

    arena.remove_first_child(root)?;
    arena.remove_second_child(root)?;

    assert_eq!(arena.node_count(root)?, 1);
    assert_eq!(arena.len(), 1);
    assert!(matches!(arena.value(first), Err(TreeError::UseAfterDestroy(_))));
    Ok(())
}

#[rstest]
fn given_empty_slot_when_removing_then_fails_with_no_such_child() {
    let mut arena = TreeArena::new();
    let root = arena.create(1);

    assert!(matches!(
        arena.remove_second_child(root),
        Err(TreeError::NoSuchChild { node, slot: Slot::Second }) if node == root
    ));
    assert!(matches!(
        arena.remove_first_child(root),
        Err(TreeError::NoSuchChild { slot: Slot::First, .. })
    ));
}

// ============================================================
// Detach / attach
// ============================================================

#[rstest]
fn given_child_when_detached_then_becomes_independent_root(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;

    let detached = arena.detach(root, Slot::Second)?;

    assert!(arena.is_root(detached)?);
    assert_eq!(arena.second_child(root)?, None);
    assert_eq!(arena.node_count(root)?, 2);
    assert_eq!(arena.len(), 3);
    // a detached node is a root now, so its value is frozen
    assert!(matches!(arena.set_value(detached, 0), Err(TreeError::ImmutableRoot(_))));
    Ok(())
}

#[rstest]
fn given_detached_root_when_attached_elsewhere_then_moves_subtree(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();
    let moved = arena.detach(root, Slot::Second)?;

    arena.attach(first, Slot::Second, moved)?;

    assert_eq!(arena.parent(moved)?, Some(first));
    assert_eq!(arena.height(root)?, 3);
    assert_eq!(arena.node_count(root)?, 3);
    arena.set_value(moved, 10)?;
    assert!(arena.contains(root, 10)?);
    Ok(())
}

#[rstest]
fn given_attached_node_when_attaching_again_then_fails_with_already_attached(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let other = arena.create(9);
    let first = arena.first_child(root)?.unwrap();

    let result = arena.attach(other, Slot::First, first);

    assert!(matches!(result, Err(TreeError::AlreadyAttached(id)) if id == first));
    assert_eq!(arena.first_child(other)?, None);
    assert_eq!(arena.parent(first)?, Some(root));
    Ok(())
}

#[rstest]
fn given_root_when_attached_below_itself_then_fails_with_would_cycle(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();

    assert!(matches!(
        arena.attach(first, Slot::First, root),
        Err(TreeError::WouldCycle { parent, child }) if parent == first && child == root
    ));
    assert!(matches!(
        arena.attach(root, Slot::First, root),
        Err(TreeError::SlotOccupied { .. })
    ));
    assert!(arena.is_root(root)?);
    assert_eq!(arena.first_child(first)?, None);
    Ok(())
}

#[rstest]
fn given_lone_root_when_attached_to_itself_then_fails_with_would_cycle() {
    let mut arena = TreeArena::new();
    let root = arena.create(1);

    assert!(matches!(
        arena.attach(root, Slot::First, root),
        Err(TreeError::WouldCycle { .. })
    ));
}

// ============================================================
// Destroy
// ============================================================

#[rstest]
fn given_destroyed_tree_when_using_any_handle_then_fails_with_use_after_destroy(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let first = arena.first_child(root)?.unwrap();

    arena.destroy(root)?;

    assert!(arena.is_empty());
    for handle in [root, first] {
        assert!(matches!(arena.height(handle), Err(TreeError::UseAfterDestroy(id)) if id == handle));
        assert!(matches!(arena.node_count(handle), Err(TreeError::UseAfterDestroy(_))));
        assert!(matches!(arena.leaf_count(handle), Err(TreeError::UseAfterDestroy(_))));
        assert!(matches!(arena.contains(handle, 1), Err(TreeError::UseAfterDestroy(_))));
        assert!(matches!(arena.first_child(handle), Err(TreeError::UseAfterDestroy(_))));
        assert!(matches!(arena.set_first_child(handle, 1), Err(TreeError::UseAfterDestroy(_))));
        assert!(matches!(arena.destroy(handle), Err(TreeError::UseAfterDestroy(_))));
    }
    Ok(())
}

#[rstest]
fn given_two_trees_when_one_destroyed_then_other_is_untouched(
    small_tree: (TreeArena, NodeId),
) -> TreeResult<()> {
    let (mut arena, root) = small_tree;
    let other = arena.create(100);
    arena.set_first_child(other, 101)?;

    arena.destroy(root)?;

    assert_eq!(arena.len(), 2);
    assert_eq!(arena.node_count(other)?, 2);
    assert!(arena.contains(other, 101)?);
    Ok(())
}
