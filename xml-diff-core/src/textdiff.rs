//! Character-level text differ, used by the annotating formatter to mark up
//! the parts of a changed text run that were actually inserted or deleted
//! rather than replacing the run wholesale.

use crate::lcs::longest_common_subsequence;

/// One contiguous run of a character-level diff between two strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOp {
    Equal,
    Delete,
    Insert,
}

/// A maximal run of one [`TextOp`] plus the text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub op: TextOp,
    pub text: String,
}

/// Diff `old` against `new` at the character level, producing a sequence of
/// [`TextSegment`]s that, concatenated in order, alternate between text
/// common to both (`Equal`), text only in `old` (`Delete`), and text only in
/// `new` (`Insert`).
pub fn diff_text(old: &str, new: &str) -> Vec<TextSegment> {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let pairs = longest_common_subsequence(&old_chars, &new_chars, |a, b| a == b);

    let mut segments = Vec::new();
    let mut oi = 0usize;
    let mut ni = 0usize;

    for (pi, pj) in pairs {
        if pi > oi {
            push_run(&mut segments, TextOp::Delete, &old_chars[oi..pi]);
        }
        if pj > ni {
            push_run(&mut segments, TextOp::Insert, &new_chars[ni..pj]);
        }
        push_run(&mut segments, TextOp::Equal, &old_chars[pi..pi + 1]);
        oi = pi + 1;
        ni = pj + 1;
    }

    if oi < old_chars.len() {
        push_run(&mut segments, TextOp::Delete, &old_chars[oi..]);
    }
    if ni < new_chars.len() {
        push_run(&mut segments, TextOp::Insert, &new_chars[ni..]);
    }

    segments
}

fn push_run(segments: &mut Vec<TextSegment>, op: TextOp, chars: &[char]) {
    if chars.is_empty() {
        return;
    }
    let text: String = chars.iter().collect();
    match segments.last_mut() {
        Some(last) if last.op == op => last.text.push_str(&text),
        _ => segments.push(TextSegment { op, text }),
    }
}
