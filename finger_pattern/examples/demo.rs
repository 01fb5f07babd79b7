//! Classifies synthetic hands in both view orientations.

use finger_pattern::{Classifier, Finger, FingerPattern, LandmarkSet, ViewOrientation};

fn main() {
    println!("\n=== Finger Pattern Demo ===\n");

    let shapes = [
        ("point",  FingerPattern::from_bits([0, 1, 0, 0, 0])),
        ("peace",  FingerPattern::from_bits([0, 1, 1, 0, 0])),
        ("three",  FingerPattern::from_bits([0, 1, 1, 1, 0])),
        ("horns",  FingerPattern::from_bits([0, 1, 0, 0, 1])),
        ("open",   FingerPattern::OPEN),
    ];

    for orientation in [ViewOrientation::Mirrored, ViewOrientation::Direct] {
        println!("{} view:", orientation);
        let classifier = Classifier::new(orientation);
        for (name, shape) in shapes {
            let set = LandmarkSet::posed(shape, orientation);
            let seen = classifier.classify(&set).unwrap();
            let fingers: Vec<_> = seen.extended().map(Finger::name).collect();
            println!("   {:<6} {}  [{}]", name, seen, fingers.join(", "));
        }

        // The same hand read with the wrong orientation flips the thumb.
        let set = LandmarkSet::posed(FingerPattern::OPEN, orientation);
        let other = match orientation {
            ViewOrientation::Mirrored => ViewOrientation::Direct,
            ViewOrientation::Direct   => ViewOrientation::Mirrored,
        };
        let wrong = Classifier::new(other).classify(&set).unwrap();
        println!("   open hand read as {}: {}\n", other, wrong);
    }
}
