use super::frame::FrameDesc;
use crate::error::{Error, Result};
use crate::storage::page::FrameId;

/// Replacer picks the frame to reuse in case the requested page is not
/// resident.
pub trait Replacer {
    /// Find a frame that is either free or holds an unpinned page. The
    /// caller is responsible for writing back and unbinding the page of
    /// the returned frame.
    ///
    /// Return None if no frame can be reused, i.e., all frames are pinned.
    fn victim(&mut self, frames: &mut [FrameDesc]) -> Option<FrameId>;
}

/// ClockReplacer implements the clock (second-chance) replacement policy.
///
/// The hand sweeps the frames circularly. A referenced frame has its
/// reference bit cleared and is skipped once, a pinned frame is always
/// skipped. The first free frame, or unreferenced unpinned frame, wins.
///
/// The search gives up after the hand has come back to its starting
/// position twice, one sweep to clear reference bits and one to evict.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: FrameId,
    num_frames: usize,
}

impl ClockReplacer {
    /// The hand starts at the last frame so the first sweep begins at frame 0.
    pub fn new(num_frames: usize) -> Result<Self> {
        if num_frames == 0 {
            return Err(Error::Value("replacer needs at least one frame".to_string()));
        }
        Ok(ClockReplacer { hand: num_frames - 1, num_frames })
    }

    pub fn hand(&self) -> FrameId {
        self.hand
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.num_frames;
    }
}

impl Replacer for ClockReplacer {
    fn victim(&mut self, frames: &mut [FrameDesc]) -> Option<FrameId> {
        let start = self.hand;
        let mut passes = 0;
        loop {
            self.advance();
            let frame = &mut frames[self.hand];
            if !frame.valid {
                return Some(self.hand);
            }
            if frame.refbit {
                frame.refbit = false;
            } else if frame.pin_count == 0 {
                return Some(self.hand);
            }
            if passes == 2 {
                return None;
            }
            if self.hand == start {
                passes += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::{shared, FileId, MemoryFile};

    fn bound_frames(n: usize) -> Vec<FrameDesc> {
        let file = shared(MemoryFile::new());
        let file_id = FileId::next();
        (0..n)
            .map(|i| {
                let mut frame = FrameDesc::new(i);
                frame.set(file.clone(), file_id, i as u32);
                frame.pin_count = 0;
                frame
            })
            .collect()
    }

    #[test]
    fn test_clock_free_frames_first() -> Result<()> {
        let mut frames: Vec<FrameDesc> = (0..3).map(FrameDesc::new).collect();
        let mut clock = ClockReplacer::new(3)?;
        assert_eq!(2, clock.hand());
        assert_eq!(Some(0), clock.victim(&mut frames));
        assert_eq!(Some(1), clock.victim(&mut frames));
        Ok(())
    }

    #[test]
    fn test_clock_zero_frames() {
        assert!(matches!(ClockReplacer::new(0), Err(Error::Value(_))));
    }

    #[test]
    fn test_clock_second_chance() -> Result<()> {
        let mut frames = bound_frames(4);
        let mut clock = ClockReplacer::new(4)?;

        // Scenario: every frame is referenced, the first sweep clears all
        // reference bits and frame 0 is evicted on the second sweep.
        assert_eq!(Some(0), clock.victim(&mut frames));
        assert!(frames.iter().all(|f| !f.refbit));

        // Scenario: re-referencing frame 1 protects it for one more sweep.
        frames[1].refbit = true;
        assert_eq!(Some(2), clock.victim(&mut frames));
        assert!(!frames[1].refbit);

        // Scenario: pinned frames are skipped.
        frames[3].pin_count = 1;
        assert_eq!(Some(0), clock.victim(&mut frames));
        assert_eq!(Some(1), clock.victim(&mut frames));
        Ok(())
    }

    #[test]
    fn test_clock_all_pinned() -> Result<()> {
        let mut frames = bound_frames(3);
        for frame in frames.iter_mut() {
            frame.pin_count = 1;
        }
        let mut clock = ClockReplacer::new(3)?;
        assert_eq!(None, clock.victim(&mut frames));
        assert!(frames.iter().all(|f| !f.refbit));

        // Scenario: releasing one pin makes its frame the next victim.
        frames[1].pin_count = 0;
        assert_eq!(Some(1), clock.victim(&mut frames));
        Ok(())
    }
}
