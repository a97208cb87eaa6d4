//! Line justification
//!
//! Sets `length_tweak` on the nodes of one line so the line fills the
//! target width, either by stretching the gaps of the words that fit or
//! by squeezing the next word onto the line.

use super::nodes::{NodeId, TextNodeKind, TextNodeList};
use super::options::RenderOptions;

/// Character gaps inside a word node, plus the gap to a following fragment
fn word_gaps(list: &TextNodeList, id: NodeId) -> i32 {
    let node = list.node(id);
    let mut gaps = node.char_count() as i32 - 1;
    if list.is_crumbled_word(id) {
        gaps += 1;
    }
    gaps
}

/// Justify the line starting at `start` to `target` pixels
pub fn justify_line(list: &mut TextNodeList, start: NodeId, target: f32, options: &RenderOptions) {
    let mut justifiable = false;
    let mut char_gaps = 0i32;
    let mut space_gaps = 0i32;
    let mut consumed = false;
    let mut length = 0.0f32;
    let mut expand_end = start;

    // Nodes that fit as they are
    let mut cursor = Some(start);
    while let Some(id) = cursor {
        let node = list.node(id);
        if node.kind == TextNodeKind::LineBreak {
            break;
        }
        if list.skip_trailing_space(id, length, target) && consumed {
            justifiable = true;
            break;
        }
        if length + node.length < target || !consumed {
            expand_end = id;
            match node.kind {
                TextNodeKind::Space => space_gaps += 1,
                TextNodeKind::Word => char_gaps += word_gaps(list, id),
                TextNodeKind::LineBreak => {}
            }
            consumed = true;
            length += node.length;
        } else {
            justifiable = true;
            break;
        }
        cursor = list.next(id);
    }

    // Cost of pulling the next word onto the line
    let mut extra_length = 0.0f32;
    let mut extra_space_gaps = 0i32;
    let mut extra_char_gaps = 0i32;
    let mut contract_end: Option<NodeId> = None;
    let mut cursor = list.next(expand_end);
    while let Some(id) = cursor {
        let node = list.node(id);
        match node.kind {
            TextNodeKind::LineBreak => break,
            TextNodeKind::Space => {
                extra_length += node.length;
                extra_space_gaps += 1;
            }
            TextNodeKind::Word => {
                contract_end = Some(id);
                extra_length += node.length;
                extra_char_gaps += word_gaps(list, id);
                break;
            }
        }
        cursor = list.next(id);
    }

    if !justifiable {
        return;
    }

    let contract = contract_end.is_some()
        && (extra_length + length - target) * options.justify_contraction_penalty < target - length
        && (target - (length + extra_length + 1.0)) / target > -options.justify_cap_contract;

    if !((!contract && length < target) || (contract && length + extra_length > target)) {
        return;
    }

    if contract {
        length += extra_length;
        char_gaps += extra_char_gaps;
        space_gaps += extra_space_gaps;
    }

    // Floor so a fractional remainder never pushes the line past the target
    let mut total = (target - length).floor() as i32;
    if contract {
        if (total as f32) / target < -options.justify_cap_contract {
            total = (-options.justify_cap_contract * target) as i32;
        }
    } else if (total as f32) / target > options.justify_cap_expand {
        total = (options.justify_cap_expand * target) as i32;
    }

    let (char_pixels, space_pixels) = if char_gaps == 0 {
        (0, total)
    } else if space_gaps == 0 {
        (total, 0)
    } else {
        let weight = if contract {
            options.justify_character_weight_for_contract
        } else {
            options.justify_character_weight_for_expand
        };
        let mut char_pixels = (total as f32 * weight * char_gaps as f32 / space_gaps as f32) as i32;
        if (!contract && char_pixels > total) || (contract && char_pixels < total) {
            char_pixels = total;
        }
        (char_pixels, total - char_pixels)
    };

    let (per_char, mut left_over_char) = if char_gaps != 0 {
        let per = char_pixels / char_gaps;
        (per, char_pixels - per * char_gaps)
    } else {
        (0, 0)
    };
    let (per_space, mut left_over_space) = if space_gaps != 0 {
        let per = space_pixels / space_gaps;
        (per, space_pixels - per * space_gaps)
    } else {
        (0, 0)
    };

    let end = if contract { contract_end } else { Some(expand_end) };
    let mut cursor = Some(start);
    while let Some(id) = cursor {
        match list.node(id).kind {
            TextNodeKind::Space => {
                let mut tweak = per_space;
                if left_over_space > 0 {
                    tweak += 1;
                    left_over_space -= 1;
                } else if left_over_space < 0 {
                    tweak -= 1;
                    left_over_space += 1;
                }
                list.node_mut(id).length_tweak = tweak as f32;
            }
            TextNodeKind::Word => {
                let gaps = word_gaps(list, id);
                let mut tweak = gaps * per_char;
                if left_over_char >= gaps {
                    tweak += gaps;
                    left_over_char -= gaps;
                } else if left_over_char <= -gaps {
                    tweak -= gaps;
                    left_over_char += gaps;
                } else {
                    tweak += left_over_char;
                    left_over_char = 0;
                }
                list.node_mut(id).length_tweak = tweak as f32;
            }
            TextNodeKind::LineBreak => {}
        }
        if Some(id) == end {
            break;
        }
        cursor = list.next(id);
    }
}
