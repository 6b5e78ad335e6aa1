//! # Reconciler Property Tests
//!
//! Random tree sequences driven through the public API:
//!
//! 1. **Convergence**: after any sequence of patches the surface matches a
//!    fresh build of the last tree
//! 2. **Stability**: patching the same tree twice performs no mutations
//! 3. **Identity**: nodes whose position and tag survive keep their id
//!
//! Run with: cargo test -p asx_ui --test reconciler_properties

use asx_ui::{el, text, DomSurface, Surface, TreeReconciler, VElement, VNode};

fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

const TAGS: [&str; 4] = ["div", "span", "p", "li"];
const CLASSES: [&str; 3] = ["a", "b", "c"];

fn random_tree(state: &mut u64, depth: u32) -> VNode {
    let roll = xorshift(state);
    if depth == 0 || roll % 5 == 0 {
        return text((roll % 7) as i64);
    }

    let mut node = el(TAGS[(roll % 4) as usize]);
    if roll % 3 == 0 {
        node = node.prop("class", CLASSES[(roll % 3) as usize]);
    }
    if roll % 2 == 0 {
        node = node.prop("data-n", (roll % 10) as i64);
    }
    let children = xorshift(state) % 4;
    for _ in 0..children {
        node = node.child(random_tree(state, depth - 1));
    }
    node.into()
}

fn fresh_html(tree: &VNode) -> String {
    let mut dom = DomSurface::default();
    let mut rec = TreeReconciler::new(dom.root());
    rec.patch(&mut dom, tree.clone()).unwrap();
    dom.to_html()
}

#[test]
fn patch_sequences_converge_to_fresh_build() {
    let mut state = 0xC0FF_EE_u64;
    for _ in 0..40 {
        let mut dom = DomSurface::default();
        let mut rec = TreeReconciler::new(dom.root());
        let mut last = None;
        for _ in 0..8 {
            let tree: VNode = el("main").child(random_tree(&mut state, 4)).into();
            rec.patch(&mut dom, tree.clone()).unwrap();
            last = Some(tree);
        }
        let last = last.unwrap();
        assert_eq!(dom.to_html(), fresh_html(&last));
        // Replaced subtrees are destroyed, so the arena holds exactly the live tree.
        assert_eq!(dom.node_count(), last.node_count() + 1);
    }
}

#[test]
fn repeated_patch_is_a_no_op() {
    let mut state = 0xBEEF_u64;
    for _ in 0..20 {
        let tree = random_tree(&mut state, 4);
        let mut dom = DomSurface::default();
        let mut rec = TreeReconciler::new(dom.root());
        rec.patch(&mut dom, tree.clone()).unwrap();
        dom.take_stats();

        rec.patch(&mut dom, tree).unwrap();
        let stats = dom.stats();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.destroyed, 0);
        assert_eq!(stats.text_writes, 0);
        assert_eq!(stats.attached, 0);
        assert_eq!(stats.attribute_removals, 0);
    }
}

#[test]
fn surviving_positions_keep_their_nodes() {
    let items = |n: usize| -> VElement {
        el("ul").children((0..n).map(|i| el("li").prop("data-i", i as i64).child(format!("item {i}"))))
    };

    let mut dom = DomSurface::default();
    let mut rec = TreeReconciler::new(dom.root());
    rec.patch(&mut dom, items(5).into()).unwrap();
    let ul = dom.children(dom.root())[0];
    let before = dom.children(ul).to_vec();

    rec.patch(&mut dom, items(3).into()).unwrap();
    assert_eq!(dom.children(ul), &before[..3]);
    for gone in &before[3..] {
        assert!(!dom.contains(*gone));
    }

    rec.patch(&mut dom, items(6).into()).unwrap();
    assert_eq!(&dom.children(ul)[..3], &before[..3]);
    assert_eq!(dom.child_count(ul), 6);
    assert_eq!(dom.text_content(ul), "item 0item 1item 2item 3item 4item 5");
}

#[test]
fn json_described_trees_patch_like_built_ones() {
    let from_json: VNode = serde_json::from_str(
        r#"{"tag": "section", "props": {"id": "s"}, "children": [{"tag": "h1", "children": ["Title"]}, 3]}"#,
    )
    .unwrap();
    let built: VNode = el("section")
        .prop("id", "s")
        .child(el("h1").child("Title"))
        .child(text(3))
        .into();
    assert_eq!(from_json, built);
    assert_eq!(fresh_html(&from_json), "<section id=\"s\"><h1>Title</h1>3</section>");
}
