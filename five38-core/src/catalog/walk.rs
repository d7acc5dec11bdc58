//! Depth-bounded flattening of nested catalogs

use std::collections::BTreeMap;

use super::{Catalog, CatalogHandle, Entry};
use crate::error::{CatalogError, Result};

/// Levels expanded when the caller has no preference
pub const DEFAULT_WALK_DEPTH: usize = 3;

/// Get all entries of `catalog` and its nested catalogs.
///
/// Keys are dotted paths (`project.file`). Nested catalogs are opened with
/// default parameters while `depth > 1`; catalogs at the depth limit are
/// still listed, just not expanded. A nested catalog that fails to open or
/// load is logged and left out. Only a failure to load `catalog` itself is
/// returned.
pub fn walk<C: Catalog + ?Sized>(
    catalog: &mut C,
    depth: usize,
) -> Result<BTreeMap<String, Entry>> {
    let entries = catalog.entries()?.clone();

    let mut out = BTreeMap::new();
    let mut prefix = Vec::new();
    walk_entries(&entries, &mut prefix, depth, &mut out);

    Ok(out)
}

fn walk_entries(
    entries: &BTreeMap<String, Entry>,
    prefix: &mut Vec<String>,
    depth: usize,
    out: &mut BTreeMap<String, Entry>,
) {
    for (name, entry) in entries {
        prefix.push(name.clone());
        let dotted = prefix.join(".");

        if let Entry::Catalog(handle) = entry {
            if depth > 1 {
                match descend(handle) {
                    Ok(nested) => walk_entries(&nested, prefix, depth - 1, out),
                    Err(source) => {
                        let failure = CatalogError::DescentFailure {
                            path: dotted.clone(),
                            source: Box::new(source),
                        };
                        tracing::warn!("{}", failure);
                    }
                }
            }
        }

        out.insert(dotted, entry.clone());
        prefix.pop();
    }
}

fn descend(handle: &CatalogHandle) -> Result<BTreeMap<String, Entry>> {
    let mut nested = handle.open()?;
    Ok(nested.entries()?.clone())
}
