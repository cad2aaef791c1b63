//! Ordered, type-homogeneous collection of conversion inputs.
//!
//! The inventory belongs to the owner (the interactive surface). Jobs never
//! see it directly: they take an [`InventorySnapshot`] at submission and report
//! probe results back by [`ItemId`], which stays valid across reorders.

use crate::config::Resolution;
use crate::error::{CoreError, CoreResult, invalid_parameter};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions classified as video; everything else is treated as an image.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// What an input item is, decided once from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies a path by its extension (case-insensitive).
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        let is_video = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)));
        if is_video { MediaKind::Video } else { MediaKind::Image }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Stable identity of an item within one inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// Per-item probe cache. Empty until a probe fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeData {
    pub dimensions: Option<Resolution>,
    pub bitrate_kbps: Option<u32>,
}

impl ProbeData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_none() && self.bitrate_kbps.is_none()
    }

    /// Fills empty slots from `other`; values already cached win.
    pub fn merge(&mut self, other: ProbeData) {
        self.dimensions = self.dimensions.or(other.dimensions);
        self.bitrate_kbps = self.bitrate_kbps.or(other.bitrate_kbps);
    }
}

/// One input of the conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: ItemId,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub probe: ProbeData,
}

/// The owner's mutable, ordered list of inputs.
#[derive(Debug, Clone, Default)]
pub struct MediaInventory {
    items: Vec<MediaItem>,
    next_id: u64,
}

impl MediaInventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// The shared kind of all items, `None` while empty.
    #[must_use]
    pub fn kind(&self) -> Option<MediaKind> {
        self.items.first().map(|item| item.kind)
    }

    /// Appends `paths` in order. If the result would mix images and videos
    /// nothing is added and `MixedMediaKind` is returned.
    pub fn add<I, P>(&mut self, paths: I) -> CoreResult<Vec<ItemId>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let incoming: Vec<(PathBuf, MediaKind)> = paths
            .into_iter()
            .map(|p| {
                let path = p.into();
                let kind = MediaKind::classify(&path);
                (path, kind)
            })
            .collect();

        let Some(expected) = self.kind().or_else(|| incoming.first().map(|(_, k)| *k)) else {
            return Ok(Vec::new());
        };

        if let Some((path, kind)) = incoming.iter().find(|(_, kind)| *kind != expected) {
            log::warn!(
                "Rejected {} file(s): {} is a {kind} but the inventory holds {expected}s",
                incoming.len(),
                path.display()
            );
            return Err(CoreError::MixedMediaKind(format!(
                "{} is a {kind}, expected only {expected}s",
                path.display()
            )));
        }

        let mut ids = Vec::with_capacity(incoming.len());
        for (path, kind) in incoming {
            let id = ItemId(self.next_id);
            self.next_id += 1;
            self.items.push(MediaItem {
                id,
                path,
                kind,
                probe: ProbeData::default(),
            });
            ids.push(id);
        }
        log::debug!("Inventory now holds {} item(s)", self.items.len());
        Ok(ids)
    }

    /// Removes and returns the item at `index`.
    pub fn remove(&mut self, index: usize) -> CoreResult<MediaItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Moves the item at `old_index` so that it ends up at `new_index`.
    pub fn move_to(&mut self, old_index: usize, new_index: usize) -> CoreResult<()> {
        self.check_index(old_index)?;
        self.check_index(new_index)?;
        if old_index != new_index {
            let item = self.items.remove(old_index);
            self.items.insert(new_index, item);
        }
        Ok(())
    }

    /// Stores probe results for the item with `id`. Returns `false` if that
    /// item is no longer in the inventory.
    pub fn record_probe(&mut self, id: ItemId, probe: ProbeData) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.probe.merge(probe);
                true
            }
            None => false,
        }
    }

    /// Immutable copy of the current contents for a job.
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            items: self.items.clone(),
        }
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(invalid_parameter(format!(
                "index {index} out of range for {} item(s)",
                self.items.len()
            )))
        }
    }
}

/// A frozen view of the inventory taken when a job starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    items: Vec<MediaItem>,
}

impl InventorySnapshot {
    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn has_video(&self) -> bool {
        self.items.iter().any(|item| item.kind == MediaKind::Video)
    }

    /// Copy of this snapshot with probe data merged in, one entry per item.
    #[must_use]
    pub fn with_probes(&self, probes: &[ProbeData]) -> InventorySnapshot {
        let items = self
            .items
            .iter()
            .zip(probes.iter().copied().chain(std::iter::repeat(ProbeData::default())))
            .map(|(item, probe)| {
                let mut item = item.clone();
                item.probe.merge(probe);
                item
            })
            .collect();
        InventorySnapshot { items }
    }
}

// ============================================================================
// NATURAL ORDERING
// ============================================================================

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Text(String),
    Number(u128),
}

fn natural_key(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    // Always starts with a (possibly empty) text chunk so that text and
    // number chunks line up position by position between two keys.
    for ch in text.chars() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits {
            chunks.push(finish_chunk(&current, in_digits));
            current.clear();
            in_digits = is_digit;
        }
        current.push(ch);
    }
    chunks.push(finish_chunk(&current, in_digits));
    chunks
}

fn finish_chunk(text: &str, digits: bool) -> Chunk {
    if digits {
        Chunk::Number(text.parse().unwrap_or(u128::MAX))
    } else {
        Chunk::Text(text.to_lowercase())
    }
}

/// Compares two paths the way people read numbered frames:
/// `frame2.png` sorts before `frame10.png`, letters ignore case.
#[must_use]
pub fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    natural_key(&a.to_string_lossy()).cmp(&natural_key(&b.to_string_lossy()))
}

/// Sorts a selection of paths in natural order.
pub fn natural_sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(MediaKind::classify(Path::new("a.MP4")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("a.mkv")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("dir/a.mov")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("a.avi")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("a.png")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("a.webm")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("noext")), MediaKind::Image);
    }

    #[test]
    fn test_natural_sort() {
        let mut paths: Vec<PathBuf> = ["frame10.png", "Frame2.png", "frame1.png", "frame002b.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        natural_sort_paths(&mut paths);
        let names: Vec<_> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["frame1.png", "Frame2.png", "frame002b.png", "frame10.png"]);
    }

    #[test]
    fn test_natural_key_leading_digits() {
        let mut paths: Vec<PathBuf> = ["10.jpg", "9.jpg", "a.jpg"].iter().map(PathBuf::from).collect();
        natural_sort_paths(&mut paths);
        assert_eq!(paths[0], PathBuf::from("9.jpg"));
        assert_eq!(paths[1], PathBuf::from("10.jpg"));
    }

    #[test]
    fn test_record_probe_after_reorder() {
        let mut inventory = MediaInventory::new();
        let ids = inventory.add(["a.png", "b.png", "c.png"]).unwrap();
        inventory.move_to(0, 2).unwrap();
        let probe = ProbeData {
            dimensions: Some(Resolution::new(10, 20)),
            bitrate_kbps: None,
        };
        assert!(inventory.record_probe(ids[0], probe));
        assert_eq!(inventory.items()[2].path, PathBuf::from("a.png"));
        assert_eq!(inventory.items()[2].probe, probe);
        assert!(inventory.items()[0].probe.is_empty());

        inventory.remove(2).unwrap();
        assert!(!inventory.record_probe(ids[0], probe));
    }
}
