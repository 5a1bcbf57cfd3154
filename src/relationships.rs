//! Static dependency tree between feed files.
//!
//! A child file only makes sense in the presence of its parent, so
//! excluding a parent from a run implies excluding every file reachable
//! from it. The tree is declared once; traversal is pure and keeps a
//! visited set so an accidental cycle in a future edit cannot hang it.

use crate::schema::*;
use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};

/// Synthetic root: the feed as a whole.
pub const FEED_NODE: &str = "feed";

struct Node {
    name: &'static str,
    children: &'static [&'static str],
}

static NODES: &[Node] = &[
    Node {
        name: FEED_NODE,
        children: &[
            AGENCY_FILE,
            STOPS_FILE,
            CALENDAR_FILE,
            SHAPES_FILE,
            FARE_ATTRIBUTES_FILE,
            LEVELS_FILE,
            FEED_INFO_FILE,
            ATTRIBUTIONS_FILE,
        ],
    },
    Node {
        name: AGENCY_FILE,
        children: &[ROUTES_FILE],
    },
    Node {
        name: ROUTES_FILE,
        children: &[TRIPS_FILE, FARE_RULES_FILE],
    },
    Node {
        name: TRIPS_FILE,
        children: &[STOP_TIMES_FILE, FREQUENCIES_FILE],
    },
    Node {
        name: STOPS_FILE,
        children: &[TRANSFERS_FILE, PATHWAYS_FILE],
    },
    Node {
        name: CALENDAR_FILE,
        children: &[CALENDAR_DATES_FILE],
    },
    Node {
        name: FEED_INFO_FILE,
        children: &[TRANSLATIONS_FILE],
    },
    Node {
        name: SHAPES_FILE,
        children: &[],
    },
    Node {
        name: FARE_ATTRIBUTES_FILE,
        children: &[],
    },
    Node {
        name: FARE_RULES_FILE,
        children: &[],
    },
    Node {
        name: STOP_TIMES_FILE,
        children: &[],
    },
    Node {
        name: FREQUENCIES_FILE,
        children: &[],
    },
    Node {
        name: TRANSFERS_FILE,
        children: &[],
    },
    Node {
        name: PATHWAYS_FILE,
        children: &[],
    },
    Node {
        name: CALENDAR_DATES_FILE,
        children: &[],
    },
    Node {
        name: TRANSLATIONS_FILE,
        children: &[],
    },
    Node {
        name: LEVELS_FILE,
        children: &[],
    },
    Node {
        name: ATTRIBUTIONS_FILE,
        children: &[],
    },
];

lazy_static! {
    static ref BY_NAME: FxHashMap<&'static str, &'static Node> = {
        let mut map = FxHashMap::default();
        for node in NODES {
            map.insert(node.name, node);
        }
        map
    };
}

/// Depth-first reachability: the named file plus everything that
/// transitively depends on it. Unknown names yield an empty set.
pub fn reachable_from(name: &str) -> FxHashSet<&'static str> {
    let mut visited: FxHashSet<&'static str> = FxHashSet::default();
    let mut stack: Vec<&str> = vec![name];
    while let Some(current) = stack.pop() {
        let node = match BY_NAME.get(current) {
            Some(node) => node,
            None => continue,
        };
        if visited.insert(node.name) {
            stack.extend(node.children);
        }
    }
    visited
}

/// Expands a user exclusion list into its transitive closure.
pub fn expand_exclusions<'a>(
    excluded: impl IntoIterator<Item = &'a str>,
) -> FxHashSet<&'static str> {
    let mut all = FxHashSet::default();
    for name in excluded {
        all.extend(reachable_from(name));
    }
    all
}
