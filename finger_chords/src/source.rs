//! Frame acquisition and landmark detection.
//!
//! The poll loop only sees the two traits here.  A camera plus hand model
//! would implement them directly; this crate ships a keyboard-posed hand
//! simulator ([`SimulatedCamera`] + [`PoseDetector`]) and, in
//! [`crate::stream`], a reader for landmarks produced by an external
//! detector process.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use finger_pattern::{Finger, FingerPattern, LandmarkSet, ViewOrientation};
use log::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// One captured image and the moment it was taken.
#[derive(Clone, Debug)]
pub struct Frame<I> {
    pub captured_at: Instant,
    pub image:       I,
}

impl<I> Frame<I> {
    pub fn new(captured_at: Instant, image: I) -> Self { Frame { captured_at, image } }
}

/// Anything that yields frames.  `None` is end-of-stream (or failure to
/// acquire), after which the loop stops.
pub trait FrameSource {
    type Image;
    fn next_frame(&mut self) -> Option<Frame<Self::Image>>;
}

/// Finds hands in an image; zero or more landmark sets, detector order.
pub trait LandmarkDetector<I> {
    fn detect(&mut self, image: &I) -> Vec<LandmarkSet>;
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation input — sent by the visualizer window
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Finger(Finger), // 1–5
    SwitchHand,     // Tab
    ToggleHand,     // H
    Clear,          // Space
    Quit,           // Q
}

/// Number of hands the simulator can pose.
pub const SIM_HANDS: usize = 2;

/// One simulated hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimHand {
    pub pattern: FingerPattern,
    pub visible: bool,
}

/// The simulator's image: the poses currently held, visible hands only,
/// in hand-slot order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimImage {
    pub hands: Vec<(usize, FingerPattern)>,
}

// ════════════════════════════════════════════════════════════════════════════
// SimulatedCamera
// ════════════════════════════════════════════════════════════════════════════

/// Frame source driven by [`SimInput`] events from the visualizer's window.
///
/// Starts with the first hand in view as a fist and the second hand out
/// of view.  Ends when `Quit` arrives or every sender is gone.
pub struct SimulatedCamera {
    rx:       Receiver<SimInput>,
    hands:    [SimHand; SIM_HANDS],
    selected: usize,
    ended:    bool,
}

impl SimulatedCamera {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimulatedCamera {
            rx,
            hands: [
                SimHand { pattern: FingerPattern::FIST, visible: true  },
                SimHand { pattern: FingerPattern::FIST, visible: false },
            ],
            selected: 0,
            ended:    false,
        }
    }

    pub fn hands(&self)    -> &[SimHand; SIM_HANDS] { &self.hands }
    pub fn selected(&self) -> usize                 { self.selected }

    fn apply(&mut self, key: SimKey) {
        let slot = self.selected;
        match key {
            SimKey::Finger(f)  => self.hands[slot].pattern = self.hands[slot].pattern.toggled(f),
            SimKey::Clear      => self.hands[slot].pattern = FingerPattern::FIST,
            SimKey::ToggleHand => self.hands[slot].visible = !self.hands[slot].visible,
            SimKey::SwitchHand => {
                self.selected = (self.selected + 1) % SIM_HANDS;
                // Switching to a hidden hand brings it into view.
                self.hands[self.selected].visible = true;
            }
            SimKey::Quit => {
                info!("simulator: quit");
                self.ended = true;
                return;
            }
        }
        debug!("simulator: hand {} {} ({})",
               self.selected + 1,
               self.hands[self.selected].pattern,
               if self.hands[self.selected].visible { "shown" } else { "hidden" });
    }
}

impl FrameSource for SimulatedCamera {
    type Image = SimImage;

    fn next_frame(&mut self) -> Option<Frame<SimImage>> {
        while !self.ended {
            match self.rx.try_recv() {
                Ok(SimInput::KeyDown(key))      => self.apply(key),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => { self.ended = true; }
            }
        }
        if self.ended { return None; }

        let hands = self.hands.iter().enumerate()
            .filter(|(_, h)| h.visible)
            .map(|(i, h)| (i, h.pattern))
            .collect();
        Some(Frame::new(Instant::now(), SimImage { hands }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PoseDetector
// ════════════════════════════════════════════════════════════════════════════

/// "Detects" simulated hands by synthesising landmarks for each pose.
///
/// Hand slots are drawn side by side so both stay visible in the overlay.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseDetector {
    orientation: ViewOrientation,
}

impl PoseDetector {
    pub fn new(orientation: ViewOrientation) -> Self { PoseDetector { orientation } }
}

impl LandmarkDetector<SimImage> for PoseDetector {
    fn detect(&mut self, image: &SimImage) -> Vec<LandmarkSet> {
        image.hands.iter().map(|&(slot, pattern)| {
            let dx = if slot == 0 { -0.2 } else { 0.2 };
            let mut set = LandmarkSet::posed(pattern, self.orientation);
            for p in &mut set.landmarks { p.x += dx; }
            set.handedness = Some(format!("Hand {}", slot + 1));
            set
        }).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use finger_pattern::Classifier;
    use std::sync::mpsc;

    fn key(k: SimKey) -> SimInput { SimInput::KeyDown(k) }

    #[test]
    fn starts_with_one_fist() {
        let (_tx, rx) = mpsc::channel();
        let mut cam = SimulatedCamera::new(rx);
        let frame = cam.next_frame().unwrap();
        assert_eq!(frame.image.hands, vec![(0, FingerPattern::FIST)]);
    }

    #[test]
    fn finger_keys_toggle_selected_hand() {
        let (tx, rx) = mpsc::channel();
        let mut cam = SimulatedCamera::new(rx);
        tx.send(key(SimKey::Finger(Finger::Index))).unwrap();
        tx.send(key(SimKey::Finger(Finger::Middle))).unwrap();
        let frame = cam.next_frame().unwrap();
        assert_eq!(frame.image.hands, vec![(0, FingerPattern::from_bits([0, 1, 1, 0, 0]))]);

        tx.send(key(SimKey::Finger(Finger::Middle))).unwrap();
        let frame = cam.next_frame().unwrap();
        assert_eq!(frame.image.hands, vec![(0, FingerPattern::from_bits([0, 1, 0, 0, 0]))]);
    }

    #[test]
    fn switch_brings_second_hand_into_view() {
        let (tx, rx) = mpsc::channel();
        let mut cam = SimulatedCamera::new(rx);
        tx.send(key(SimKey::SwitchHand)).unwrap();
        tx.send(key(SimKey::Finger(Finger::Pinky))).unwrap();
        let frame = cam.next_frame().unwrap();
        assert_eq!(cam.selected(), 1);
        assert_eq!(frame.image.hands, vec![
            (0, FingerPattern::FIST),
            (1, FingerPattern::from_bits([0, 0, 0, 0, 1])),
        ]);
    }

    #[test]
    fn hidden_hand_is_not_in_frame() {
        let (tx, rx) = mpsc::channel();
        let mut cam = SimulatedCamera::new(rx);
        tx.send(key(SimKey::ToggleHand)).unwrap();
        assert!(cam.next_frame().unwrap().image.hands.is_empty());
    }

    #[test]
    fn quit_and_disconnect_end_stream() {
        let (tx, rx) = mpsc::channel();
        let mut cam = SimulatedCamera::new(rx);
        tx.send(key(SimKey::Quit)).unwrap();
        assert!(cam.next_frame().is_none());
        assert!(cam.next_frame().is_none());

        let (tx, rx) = mpsc::channel::<SimInput>();
        let mut cam = SimulatedCamera::new(rx);
        drop(tx);
        assert!(cam.next_frame().is_none());
    }

    #[test]
    fn posed_hands_classify_to_their_pattern() {
        for orientation in [ViewOrientation::Mirrored, ViewOrientation::Direct] {
            let mut detector = PoseDetector::new(orientation);
            let classifier = Classifier::new(orientation);
            let image = SimImage { hands: vec![
                (0, FingerPattern::from_bits([1, 1, 0, 0, 0])),
                (1, FingerPattern::from_bits([0, 1, 1, 1, 0])),
            ]};
            let sets = detector.detect(&image);
            assert_eq!(sets.len(), 2);
            for (set, (_, pattern)) in sets.iter().zip(&image.hands) {
                assert_eq!(classifier.classify(set).unwrap(), *pattern);
            }
            assert_eq!(sets[1].handedness.as_deref(), Some("Hand 2"));
        }
    }
}
