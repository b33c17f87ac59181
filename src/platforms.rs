use crate::model::PlatformId;

/// Canonical form of a platform list: sorted ascending, no duplicates.
/// An absent list and an empty list normalize to the same value.
pub fn normalize(platforms: Option<&[PlatformId]>) -> Vec<PlatformId> {
    let mut out = platforms.map(<[PlatformId]>::to_vec).unwrap_or_default();
    out.sort_unstable();
    out.dedup();
    out
}

pub fn same_platforms(a: Option<&[PlatformId]>, b: Option<&[PlatformId]>) -> bool {
    normalize(a) == normalize(b)
}

/// Storage form: an empty set is written as `null`.
pub fn to_stored(platforms: &[PlatformId]) -> Option<Vec<PlatformId>> {
    let normalized = normalize(Some(platforms));
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
