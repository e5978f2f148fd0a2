//! Character diff into capture fields.

use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::ops::Range;

/// Literal runs this short between two changes are absorbed into one field.
const MERGE_GAP: usize = 3;

fn is_delimiter(c: char) -> bool {
    matches!(c, '-' | '.' | '~' | '_' | '/')
}

/// One varying region: `old` indexes the prototype, `new` the candidate.
/// Both are char ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub old: Range<usize>,
    pub new: Range<usize>,
}

/// Varying regions between `old` and `new`, merged over short literal gaps
/// and widened to the delimiter-free pieces around them.
pub fn diff_fields(old: &[char], new: &[char]) -> Vec<Field> {
    let mut fields: Vec<Field> = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, old, new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        match fields.last_mut() {
            Some(last) if last.old.end == old_range.start && last.new.end == new_range.start => {
                last.old.end = old_range.end;
                last.new.end = new_range.end;
            }
            _ => fields.push(Field {
                old: old_range,
                new: new_range,
            }),
        }
    }

    let mut merged: Vec<Field> = Vec::with_capacity(fields.len());
    for field in fields {
        match merged.last_mut() {
            Some(last) if field.old.start - last.old.end <= MERGE_GAP => {
                last.old.end = field.old.end;
                last.new.end = field.new.end;
            }
            _ => merged.push(field),
        }
    }

    extend_boundaries(old, &mut merged);
    merged
}

/// Widen each field across the delimiter-free piece of the literal on
/// either side, as long as that literal has a delimiter to stop at.
fn extend_boundaries(old: &[char], fields: &mut [Field]) {
    let mut grow = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let left_bound = if i == 0 { 0 } else { fields[i - 1].old.end };
        let right_bound = fields.get(i + 1).map_or(old.len(), |next| next.old.start);

        let left = &old[left_bound..field.old.start];
        let left_grow = left
            .iter()
            .rposition(|c| is_delimiter(*c))
            .map_or(0, |pos| left.len() - pos - 1);

        let right = &old[field.old.end..right_bound];
        let right_grow = right.iter().position(|c| is_delimiter(*c)).unwrap_or(0);

        grow.push((left_grow, right_grow));
    }

    for (field, (left, right)) in fields.iter_mut().zip(grow) {
        field.old.start -= left;
        field.new.start -= left;
        field.old.end += right;
        field.new.end += right;
    }
}
