use crate::triconnected_blocks::outside_structures::{Component, ComponentType};

/// Merges split components sharing a virtual edge when both have the same
/// type, excluding R nodes: bonds merge with bonds, polygons with polygons.
/// The shared virtual edge is absorbed by the merge.
///
/// Realised as a union-find over the components: the virtual edges define
/// the merge relation (they form a tree, so every merge edge is absorbed
/// exactly once), and each union class is gathered back into one component.
pub fn merge_components(m: usize, components: &mut Vec<Component>) {
    let k = components.len();
    let mut leader: Vec<usize> = (0..k).collect();

    fn find(leader: &mut [usize], mut x: usize) -> usize {
        while leader[x] != x {
            leader[x] = leader[leader[x]]; // path halving
            x = leader[x];
        }
        x
    }

    // occurrences of every edge id across the components
    let mut occurrences: Vec<Vec<usize>> = vec![Vec::new(); m];
    for (i, component) in components.iter().enumerate() {
        for &eid in &component.edges {
            occurrences[eid].push(i);
        }
    }

    let mut absorbed = vec![false; m];
    for (eid, occ) in occurrences.iter().enumerate() {
        let &[a, b] = occ.as_slice() else { continue };
        let t = components[a].comp_type;
        if t != components[b].comp_type || t == Some(ComponentType::R) {
            continue;
        }
        let (ra, rb) = (find(&mut leader, a), find(&mut leader, b));
        if ra != rb {
            leader[rb] = ra;
            absorbed[eid] = true;
        }
    }

    // gather the classes, keeping the first member's position and type
    let mut slot_of: Vec<Option<usize>> = vec![None; k];
    let mut merged: Vec<Component> = Vec::new();
    for i in 0..k {
        let root = find(&mut leader, i);
        let slot = match slot_of[root] {
            Some(s) => s,
            None => {
                merged.push(Component::new(components[i].comp_type));
                slot_of[root] = Some(merged.len() - 1);
                merged.len() - 1
            }
        };
        for &eid in &components[i].edges {
            if !absorbed[eid] {
                merged[slot].edges.push(eid);
            }
        }
    }
    merged.retain(|c| !c.edges.is_empty());

    *components = merged;
}
