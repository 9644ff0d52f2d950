use crate::jvm::model::LabelId;
use crate::source::{Error, Surrogate, SurrogateKind};
use std::collections::HashMap;

/// Link jumps to their labels, drop labels nothing jumps to, and name the rest
///
/// Labels are named `label0`, `label1`, ... in the order they appear among the surviving labels,
/// independently of the order in which jumps refer to them. A jump to a label that isn't in the
/// method is an error.
pub fn resolve_labels(mut surrogates: Vec<Surrogate>) -> Result<Vec<Surrogate>, Error> {
    // Index labels by identity
    let mut label_positions: HashMap<LabelId, usize> = HashMap::new();
    for (position, surrogate) in surrogates.iter().enumerate() {
        if let SurrogateKind::Label { id, .. } = surrogate.kind {
            label_positions.entry(id).or_insert(position);
        }
    }

    // Link jumps and record backreferences
    let mut links: Vec<(usize, usize)> = vec![];
    for (position, surrogate) in surrogates.iter().enumerate() {
        if let SurrogateKind::Jump { target, .. } = surrogate.kind {
            let label_position = *label_positions
                .get(&target)
                .ok_or(Error::UnresolvedJumpTarget(target))?;
            links.push((position, label_position));
        }
    }
    for (jump_position, label_position) in links {
        let jump_source = surrogates[jump_position].source;
        if let SurrogateKind::Jump { link, .. } = &mut surrogates[jump_position].kind {
            *link = Some(label_position);
        }
        if let SurrogateKind::Label { backreferences, .. } = &mut surrogates[label_position].kind {
            backreferences.push(jump_source);
        }
    }

    // Prune unreferenced labels, remembering where survivors end up
    let label_count = label_positions.len();
    let mut new_positions: Vec<Option<usize>> = Vec::with_capacity(surrogates.len());
    let mut kept: Vec<Surrogate> = Vec::with_capacity(surrogates.len());
    for surrogate in surrogates {
        let unreferenced = matches!(
            &surrogate.kind,
            SurrogateKind::Label { backreferences, .. } if backreferences.is_empty()
        );
        if unreferenced {
            new_positions.push(None);
        } else {
            new_positions.push(Some(kept.len()));
            kept.push(surrogate);
        }
    }

    // Name survivors and re-point jumps
    let mut label_counter = 0;
    for surrogate in &mut kept {
        match &mut surrogate.kind {
            SurrogateKind::Label { name, .. } => {
                *name = Some(format!("label{}", label_counter));
                label_counter += 1;
            }
            SurrogateKind::Jump { link, .. } => {
                *link = link.and_then(|position| new_positions[position]);
            }
            _ => (),
        }
    }

    log::trace!(
        "kept {} of {} labels ({} instructions)",
        label_counter,
        label_count,
        kept.len()
    );
    Ok(kept)
}
