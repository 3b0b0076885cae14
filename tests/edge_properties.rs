mod common;

use std::collections::BTreeSet;

use common::cv1_right;
use proptest::prelude::*;
use xrinput::input::{ButtonChannel, ButtonEdge, LogicalButton, RawInputFrame};
use xrinput::module::{DeviceInput, FrameClock};
use xrinput::ReceiverRegistry;

fn frame_strategy() -> impl Strategy<Value = (f32, f32, bool, bool)> {
    (0.0f32..=1.0, -1.0f32..=1.0, any::<bool>(), any::<bool>())
}

fn to_input((trigger, stick_y, a, thumb_touch): (f32, f32, bool, bool)) -> DeviceInput {
    DeviceInput::new(
        RawInputFrame::new()
            .with_axis("RTrigger", trigger)
            .with_axis("RThumbstickY", stick_y)
            .with_button("JoystickButton0", a)
            .with_button("JoystickButton17", thumb_touch),
    )
}

proptest! {
    #[test]
    fn edges_alternate_per_button_and_channel(frames in prop::collection::vec(frame_strategy(), 1..60)) {
        let registry = ReceiverRegistry::new();
        let mut module = cv1_right(&registry);
        let mut open: BTreeSet<(LogicalButton, ButtonChannel)> = BTreeSet::new();

        for (index, sample) in frames.into_iter().enumerate() {
            let report = module
                .process(FrameClock::new(index as u64 + 1, 0.011), &to_input(sample))
                .unwrap();
            let mut seen = BTreeSet::new();
            for edge in &report.edges {
                let key = (edge.button, edge.channel);
                // At most one edge per key and frame
                prop_assert!(seen.insert(key));
                match edge.edge {
                    ButtonEdge::Down => prop_assert!(open.insert(key)),
                    ButtonEdge::Held => prop_assert!(open.contains(&key)),
                    ButtonEdge::Up => prop_assert!(open.remove(&key)),
                }
            }
            for key in &open {
                prop_assert!(module.is_down(key.0, key.1));
            }
        }

        let (module, report) = module.disable();
        let forced: BTreeSet<_> = report.edges.iter().map(|e| (e.button, e.channel)).collect();
        prop_assert_eq!(forced, open);
        prop_assert!(report.edges.iter().all(|e| e.edge == ButtonEdge::Up));
        prop_assert!(module.event_data().is_cleared());
    }

    #[test]
    fn click_fires_only_on_crossing(values in prop::collection::vec(0.0f32..=1.0, 1..40)) {
        let registry = ReceiverRegistry::new();
        let mut module = cv1_right(&registry);
        let mut previous = 0.0f32;

        for (index, value) in values.into_iter().enumerate() {
            let input = DeviceInput::new(RawInputFrame::new().with_axis("RTrigger", value));
            let report = module
                .process(FrameClock::new(index as u64 + 1, 0.011), &input)
                .unwrap();
            let clicked = report.clicks.contains(&LogicalButton::Trigger);
            prop_assert_eq!(clicked, previous < 1.0 && value >= 1.0);
            previous = value;
        }
    }
}
