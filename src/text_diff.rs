//! Text Diff - character-level edits for text nodes.
//!
//! Computes an LCS edit script between the previous and next content of a
//! text node and emits it as `InsertData` / `DeleteData` / `ReplaceData`
//! patches. The diff runs over Unicode scalar values; offsets and counts are
//! expressed in the configured [`OffsetUnit`].
//!
//! Operations are emitted in document order and each offset already
//! accounts for the operations before it, so applying them one after another
//! to the previous content yields exactly the next content.

use similar::{Algorithm, DiffOp, capture_diff_slices};

use crate::config::OffsetUnit;
use crate::patch::{DomId, Patch};

/// Patches turning `prev` into `next` for text node `id`.
///
/// Returns nothing when the strings are equal.
pub fn diff(id: &DomId, prev: &str, next: &str, unit: OffsetUnit) -> Vec<Patch> {
    if prev == next {
        return Vec::new();
    }
    let old: Vec<char> = prev.chars().collect();
    let new: Vec<char> = next.chars().collect();

    // Offset of every prefix of `new`, in wire units.
    let mut offsets = Vec::with_capacity(new.len() + 1);
    let mut acc = 0;
    offsets.push(0);
    for &c in &new {
        acc += unit.width(c);
        offsets.push(acc);
    }

    let text = |range: &[char]| range.iter().collect::<String>();

    capture_diff_slices(Algorithm::Lcs, &old, &new)
        .into_iter()
        .filter_map(|op| match op {
            DiffOp::Equal { .. } => None,
            DiffOp::Delete {
                old_index,
                old_len,
                new_index,
            } => Some(Patch::DeleteData {
                id: id.clone(),
                offset: offsets[new_index],
                count: unit.measure(&old[old_index..old_index + old_len]),
            }),
            DiffOp::Insert {
                new_index, new_len, ..
            } => Some(Patch::InsertData {
                id: id.clone(),
                offset: offsets[new_index],
                data: text(&new[new_index..new_index + new_len]),
            }),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => Some(Patch::ReplaceData {
                id: id.clone(),
                offset: offsets[new_index],
                count: unit.measure(&old[old_index..old_index + old_len]),
                data: text(&new[new_index..new_index + new_len]),
            }),
        })
        .collect()
}

/// Like [`diff`], for raw bytes. When either side is not valid UTF-8 the
/// whole content is replaced with a single `SetTextContent` (lossily decoded).
pub fn diff_bytes(id: &DomId, prev: &[u8], next: &[u8], unit: OffsetUnit) -> Vec<Patch> {
    match (std::str::from_utf8(prev), std::str::from_utf8(next)) {
        (Ok(prev), Ok(next)) => diff(id, prev, next, unit),
        _ => {
            tracing::debug!(%id, "text is not valid UTF-8, replacing content");
            vec![Patch::SetTextContent {
                id: id.clone(),
                content: String::from_utf8_lossy(next).into_owned(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Apply splice patches the way the DOM does, on UTF-16 code units.
    fn apply_utf16(prev: &str, patches: &[Patch]) -> String {
        let mut units: Vec<u16> = prev.encode_utf16().collect();
        for patch in patches {
            match patch {
                Patch::InsertData { offset, data, .. } => {
                    units.splice(*offset..*offset, data.encode_utf16());
                }
                Patch::DeleteData { offset, count, .. } => {
                    units.drain(*offset..*offset + *count);
                }
                Patch::ReplaceData {
                    offset,
                    count,
                    data,
                    ..
                } => {
                    units.splice(*offset..*offset + *count, data.encode_utf16());
                }
                Patch::SetTextContent { content, .. } => {
                    units = content.encode_utf16().collect();
                }
                other => panic!("unexpected patch {other:?}"),
            }
        }
        String::from_utf16(&units).expect("valid utf-16")
    }

    /// Apply splice patches on scalar values.
    fn apply_scalar(prev: &str, patches: &[Patch]) -> String {
        let mut chars: Vec<char> = prev.chars().collect();
        for patch in patches {
            match patch {
                Patch::InsertData { offset, data, .. } => {
                    chars.splice(*offset..*offset, data.chars());
                }
                Patch::DeleteData { offset, count, .. } => {
                    chars.drain(*offset..*offset + *count);
                }
                Patch::ReplaceData {
                    offset,
                    count,
                    data,
                    ..
                } => {
                    chars.splice(*offset..*offset + *count, data.chars());
                }
                other => panic!("unexpected patch {other:?}"),
            }
        }
        chars.into_iter().collect()
    }

    fn id() -> DomId {
        DomId::new("t")
    }

    fn check(prev: &str, next: &str) -> Vec<Patch> {
        let patches = diff(&id(), prev, next, OffsetUnit::Utf16);
        assert_eq!(apply_utf16(prev, &patches), next, "{prev:?} -> {next:?}: {patches:?}");
        let scalar = diff(&id(), prev, next, OffsetUnit::Scalar);
        assert_eq!(apply_scalar(prev, &scalar), next);
        patches
    }

    #[test]
    fn test_clear() {
        let patches = check("foobar", "");
        assert_eq!(
            patches,
            vec![Patch::DeleteData {
                id: id(),
                offset: 0,
                count: 6
            }]
        );
    }

    #[test]
    fn test_fill() {
        let patches = check("", "foobar");
        assert_eq!(
            patches,
            vec![Patch::InsertData {
                id: id(),
                offset: 0,
                data: "foobar".into()
            }]
        );
    }

    #[test]
    fn test_append() {
        let patches = check("foo", "foobar");
        assert_eq!(
            patches,
            vec![Patch::InsertData {
                id: id(),
                offset: 3,
                data: "bar".into()
            }]
        );
    }

    #[test]
    fn test_truncate() {
        let patches = check("foobar", "foo");
        assert_eq!(
            patches,
            vec![Patch::DeleteData {
                id: id(),
                offset: 3,
                count: 3
            }]
        );
    }

    #[test]
    fn test_insert_middle() {
        let patches = check("foobaz", "foobarbaz");
        assert_eq!(patches.len(), 1, "one insertion expected: {patches:?}");
    }

    #[test]
    fn test_mixed_edits() {
        check("tjosannnnn", "tjohejsannnn");
        check("kitten", "sitting");
        check("abc", "xyz");
    }

    #[test]
    fn test_equal_is_empty() {
        assert!(diff(&id(), "same", "same", OffsetUnit::Utf16).is_empty());
    }

    #[test]
    fn test_astral_offsets() {
        let patches = check("😀a", "😀ab");
        assert_eq!(
            patches,
            vec![Patch::InsertData {
                id: id(),
                offset: 3,
                data: "b".into()
            }],
            "emoji counts as two UTF-16 units"
        );
        let scalar = diff(&id(), "😀a", "😀ab", OffsetUnit::Scalar);
        assert!(matches!(scalar[0], Patch::InsertData { offset: 2, .. }));
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        let patches = diff_bytes(&id(), b"ok", &[0x66, 0xff, 0x6f], OffsetUnit::Utf16);
        assert_eq!(patches.len(), 1);
        assert!(matches!(&patches[0], Patch::SetTextContent { content, .. } if content == "f\u{fffd}o"));
    }

    #[test]
    fn test_valid_bytes_diff_normally() {
        let patches = diff_bytes(&id(), b"foo", b"foobar", OffsetUnit::Utf16);
        assert!(matches!(patches[0], Patch::InsertData { offset: 3, .. }));
    }

    proptest! {
        #[test]
        fn test_round_trip(prev in "\\PC{0,24}", next in "\\PC{0,24}") {
            let patches = diff(&id(), &prev, &next, OffsetUnit::Utf16);
            prop_assert_eq!(apply_utf16(&prev, &patches), next.clone());
            let scalar = diff(&id(), &prev, &next, OffsetUnit::Scalar);
            prop_assert_eq!(apply_scalar(&prev, &scalar), next);
        }

        #[test]
        fn test_round_trip_small_alphabet(prev in "[ab😀]{0,16}", next in "[ab😀]{0,16}") {
            let patches = diff(&id(), &prev, &next, OffsetUnit::Utf16);
            prop_assert_eq!(apply_utf16(&prev, &patches), next);
        }
    }
}
