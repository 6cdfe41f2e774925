//! Play queue
//!
//! Ordered track list plus a current-position pointer. Insertion order is
//! play order; shuffle only changes which index gets selected, never the
//! stored order.

use crate::error::{PlaybackError, Result};
use crate::shuffle::pick_random;
use crate::types::{PlaybackMode, Track};
use rand::Rng;
use std::collections::HashSet;

/// Ordered track list with a current index
///
/// Invariant: `current` is `Some(i)` with `i < tracks.len()` whenever the
/// queue is non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    current: Option<usize>,
}

/// Result of removing a track from the queue
#[derive(Debug, Clone)]
pub struct Removal {
    /// The removed track
    pub track: Track,

    /// Index the track occupied
    pub index: usize,

    /// Whether the removed track was at the current index
    pub was_current: bool,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue positioned on its first track
    pub fn from_tracks(tracks: Vec<Track>) -> Result<Self> {
        let mut queue = Self::new();
        queue.replace(tracks)?;
        Ok(queue)
    }

    /// Replace the whole list
    ///
    /// The current index follows the previously current track when it is
    /// still present, otherwise it resets to the first track.
    pub fn replace(&mut self, tracks: Vec<Track>) -> Result<()> {
        let mut seen = HashSet::with_capacity(tracks.len());
        for track in &tracks {
            if !seen.insert(track.id.as_str()) {
                return Err(PlaybackError::DuplicateTrack(track.id.clone()));
            }
        }

        let previous_id = self.current().map(|t| t.id.clone());
        self.tracks = tracks;
        self.current = match previous_id.and_then(|id| self.position_of(&id)) {
            Some(index) => Some(index),
            None if self.tracks.is_empty() => None,
            None => Some(0),
        };
        Ok(())
    }

    /// Append a track at the end
    pub fn push(&mut self, track: Track) -> Result<usize> {
        let end = self.tracks.len();
        self.insert(end, track)
    }

    /// Insert a track before `index` (clamped to the queue length)
    ///
    /// The current index shifts so it keeps pointing at the same track.
    /// Returns the index the track landed at.
    pub fn insert(&mut self, index: usize, track: Track) -> Result<usize> {
        if self.position_of(&track.id).is_some() {
            return Err(PlaybackError::DuplicateTrack(track.id));
        }

        let index = index.min(self.tracks.len());
        self.tracks.insert(index, track);

        self.current = match self.current {
            None => Some(0),
            Some(current) if index <= current => Some(current + 1),
            keep => keep,
        };
        Ok(index)
    }

    /// Remove the track at `index`
    ///
    /// If the current track is removed the index clamps to the nearest valid
    /// position (the track that slid into its place, or the new last track).
    pub fn remove(&mut self, index: usize) -> Result<Removal> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        let track = self.tracks.remove(index);
        let was_current = self.current == Some(index);

        self.current = match self.current {
            _ if self.tracks.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current => Some(current.min(self.tracks.len() - 1)),
            keep => keep,
        };

        Ok(Removal {
            track,
            index,
            was_current,
        })
    }

    /// Remove the track with the given id
    pub fn remove_by_id(&mut self, id: &str) -> Result<Removal> {
        let index = self
            .position_of(id)
            .ok_or_else(|| PlaybackError::TrackNotFound(id.to_string()))?;
        self.remove(index)
    }

    /// Move the current pointer
    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.current = Some(index);
        Ok(())
    }

    /// Index of the track with the given id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Get track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Track at the current index
    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// All tracks in stored order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index that "next" resolves to under `mode`
    ///
    /// Normal and RepeatOne wrap forward; Shuffle picks uniformly from the
    /// whole queue. `None` only when the queue is empty.
    pub fn next<R: Rng + ?Sized>(&self, mode: PlaybackMode, rng: &mut R) -> Option<usize> {
        let current = self.current?;
        let len = self.tracks.len();
        match mode {
            PlaybackMode::Normal | PlaybackMode::RepeatOne => Some((current + 1) % len),
            PlaybackMode::Shuffle => pick_random(len, rng),
        }
    }

    /// Index that "previous" resolves to under `mode`
    pub fn previous<R: Rng + ?Sized>(&self, mode: PlaybackMode, rng: &mut R) -> Option<usize> {
        let current = self.current?;
        let len = self.tracks.len();
        match mode {
            PlaybackMode::Normal | PlaybackMode::RepeatOne => Some((current + len - 1) % len),
            PlaybackMode::Shuffle => pick_random(len, rng),
        }
    }

    /// Uniformly random index, independent of the current one
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        pick_random(self.tracks.len(), rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), "Test Artist", format!("file:///{}.mp3", id))
            .with_duration(180.0)
    }

    fn queue_of(ids: &[&str]) -> Queue {
        Queue::from_tracks(ids.iter().map(|id| create_test_track(id)).collect()).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = Queue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.current_index(), None);
        assert!(queue.current().is_none());
    }

    #[test]
    fn populated_queue_starts_at_first_track() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current().unwrap().id, "a");
    }

    #[test]
    fn replace_rejects_duplicate_ids() {
        let mut queue = Queue::new();
        let result = queue.replace(vec![create_test_track("a"), create_test_track("a")]);
        assert!(matches!(result, Err(PlaybackError::DuplicateTrack(id)) if id == "a"));
        assert!(queue.is_empty());
    }

    #[test]
    fn replace_follows_current_track() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(1).unwrap();

        queue
            .replace(vec![create_test_track("x"), create_test_track("y"), create_test_track("b")])
            .unwrap();
        assert_eq!(queue.current_index(), Some(2));

        queue.replace(vec![create_test_track("z")]).unwrap();
        assert_eq!(queue.current_index(), Some(0));

        queue.replace(Vec::new()).unwrap();
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn push_into_empty_queue_sets_current() {
        let mut queue = Queue::new();
        queue.push(create_test_track("a")).unwrap();
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn insert_before_current_shifts_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(1).unwrap();

        let at = queue.insert(0, create_test_track("new")).unwrap();
        assert_eq!(at, 0);
        assert_eq!(queue.current_index(), Some(2));
        assert_eq!(queue.current().unwrap().id, "b");
    }

    #[test]
    fn insert_after_current_keeps_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(1).unwrap();

        queue.insert(2, create_test_track("new")).unwrap();
        assert_eq!(queue.current().unwrap().id, "b");
    }

    #[test]
    fn insert_index_is_clamped() {
        let mut queue = queue_of(&["a"]);
        let at = queue.insert(100, create_test_track("b")).unwrap();
        assert_eq!(at, 1);
        assert_eq!(queue.get(1).unwrap().id, "b");
    }

    #[test]
    fn insert_rejects_duplicate() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(matches!(
            queue.push(create_test_track("b")),
            Err(PlaybackError::DuplicateTrack(_))
        ));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn remove_before_current_shifts_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(2).unwrap();

        let removal = queue.remove(0).unwrap();
        assert!(!removal.was_current);
        assert_eq!(queue.current().unwrap().id, "c");
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn remove_current_clamps_to_nearest() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_current(1).unwrap();

        let removal = queue.remove(1).unwrap();
        assert!(removal.was_current);
        assert_eq!(removal.track.id, "b");
        assert_eq!(queue.current().unwrap().id, "c");

        // Removing the last track while current clamps backwards
        let removal = queue.remove(1).unwrap();
        assert!(removal.was_current);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current().unwrap().id, "a");
    }

    #[test]
    fn removing_last_track_empties_index() {
        let mut queue = queue_of(&["a"]);
        queue.remove(0).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut queue = queue_of(&["a"]);
        assert!(matches!(queue.remove(3), Err(PlaybackError::IndexOutOfBounds(3))));
    }

    #[test]
    fn remove_by_id_unknown() {
        let mut queue = queue_of(&["a"]);
        assert!(matches!(
            queue.remove_by_id("zzz"),
            Err(PlaybackError::TrackNotFound(_))
        ));
    }

    #[test]
    fn next_and_previous_wrap_in_normal_mode() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let mut rng = rng();

        queue.set_current(2).unwrap();
        assert_eq!(queue.next(PlaybackMode::Normal, &mut rng), Some(0));

        queue.set_current(0).unwrap();
        assert_eq!(queue.previous(PlaybackMode::Normal, &mut rng), Some(2));
    }

    #[test]
    fn repeat_one_navigates_like_normal() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let mut rng = rng();
        queue.set_current(1).unwrap();

        assert_eq!(queue.next(PlaybackMode::RepeatOne, &mut rng), Some(2));
        assert_eq!(queue.previous(PlaybackMode::RepeatOne, &mut rng), Some(0));
    }

    #[test]
    fn shuffle_stays_in_bounds_without_reordering() {
        let queue = queue_of(&["a", "b", "c", "d", "e"]);
        let order_before: Vec<String> = queue.tracks().iter().map(|t| t.id.clone()).collect();
        let mut rng = rng();

        for _ in 0..100 {
            let next = queue.next(PlaybackMode::Shuffle, &mut rng).unwrap();
            let prev = queue.previous(PlaybackMode::Shuffle, &mut rng).unwrap();
            assert!(next < 5);
            assert!(prev < 5);
        }

        let order_after: Vec<String> = queue.tracks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(order_before, order_after);
    }

    #[test]
    fn navigation_on_empty_queue_is_none() {
        let queue = Queue::new();
        let mut rng = rng();
        assert_eq!(queue.next(PlaybackMode::Normal, &mut rng), None);
        assert_eq!(queue.previous(PlaybackMode::Normal, &mut rng), None);
        assert_eq!(queue.next(PlaybackMode::Shuffle, &mut rng), None);
        assert_eq!(queue.random_index(&mut rng), None);
    }

    #[test]
    fn single_track_queue_wraps_to_itself() {
        let queue = queue_of(&["solo"]);
        let mut rng = rng();
        assert_eq!(queue.next(PlaybackMode::Normal, &mut rng), Some(0));
        assert_eq!(queue.previous(PlaybackMode::Normal, &mut rng), Some(0));
    }
}
