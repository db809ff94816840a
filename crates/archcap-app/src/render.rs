//! Text rendering of the capability tree

use std::collections::HashSet;
use std::fmt::Write;

use archcap_adapter::InMemoryCatalog;
use archcap_domain::{CapabilityReadModel, RealizationReadModel};

/// Indented tree, one capability per line with its realization counts
///
/// ```text
/// P1 [L1] Payments (direct 0, inherited 1)
///   X [L2] Billing (direct 1, inherited 0)
/// ```
pub fn render_tree(catalog: &InMemoryCatalog) -> anyhow::Result<String> {
    let capabilities = catalog.capabilities();
    let all = capabilities.list_all()?;
    let mut roots: Vec<_> = all
        .iter()
        .filter(|c| {
            c.parent_id
                .as_ref()
                .map_or(true, |p| all.iter().all(|other| &other.id != p))
        })
        .cloned()
        .collect();
    roots.reverse();

    let mut out = String::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<_> = roots.into_iter().map(|c| (c, 0usize)).collect();

    while let Some((node, depth)) = stack.pop() {
        if !visited.insert(node.id.clone()) {
            continue;
        }
        let realizations = catalog.realizations().get_by_capability_id(&node.id)?;
        let direct = realizations.iter().filter(|r| r.is_direct()).count();
        writeln!(
            out,
            "{}{} [{}] {} (direct {}, inherited {})",
            "  ".repeat(depth),
            node.id,
            node.level,
            node.name,
            direct,
            realizations.len() - direct
        )?;

        let mut children = capabilities.get_children(&node.id)?;
        children.reverse();
        stack.extend(children.into_iter().map(|c| (c, depth + 1)));
    }
    Ok(out)
}
