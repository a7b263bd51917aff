//! End-to-end walkthrough: edit a small tree through the observer,
//! project the batch, and print the resulting summary.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use treewatch_dom::{DomTree, TreeObserver};
use treewatch_summary::{
    ElementMatcher, Matcher, MutationProjection, ProjectionOptions, SummaryRequest,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut tree = DomTree::new();
    let root = tree.root();

    // <div id="list"><span>A</span><span>B</span><span>C</span></div>
    let list = tree.create_element("div");
    tree.append_child(root, list)?;
    tree.set_attribute(list, "id", "list")?;
    let mut items = Vec::new();
    for label in ["A", "B", "C"] {
        let span = tree.create_element("span");
        let text = tree.create_text(label);
        tree.append_child(list, span)?;
        tree.append_child(span, text)?;
        items.push(span);
    }

    tracing::info!("applying a batch of edits");
    let mut observer = TreeObserver::new(&mut tree);

    // Move A to the end, relabel B, drop C.
    observer.append_child(list, items[0])?;
    observer.set_attribute(items[1], "class", "current")?;
    observer.remove_child(list, items[2])?;
    let records = observer.take_records();

    let matchers: Vec<Box<dyn Matcher>> = vec![Box::new(ElementMatcher::tag("span"))];
    let options = ProjectionOptions {
        calc_reordered: true,
        calc_old_previous_sibling: true,
        character_data_only: false,
    };
    let mut projection = MutationProjection::new(&tree, root, &records, Some(&matchers), options);
    let summary = projection.summarize(&SummaryRequest::all());

    println!("batch of {} records:", records.len());
    println!("  added:     {:?}", summary.added);
    println!("  removed:   {:?}", summary.removed);
    println!("  reparented: {:?}", summary.reparented);
    println!("  reordered:  {:?}", summary.reordered);
    println!("  attributes: {:?}", summary.attribute_changed);

    for &node in summary.reordered.iter().flatten() {
        let old = projection.old_previous_sibling(node)?;
        println!("  {node:?} previously followed {old:?}");
    }

    Ok(())
}
