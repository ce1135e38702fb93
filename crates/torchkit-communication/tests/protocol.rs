use proptest::prelude::*;
use torchkit_communication::{decode_report, encode, ControllerReport, LineBuffer};
use torchkit_core::ActuatorCommand;

proptest! {
    #[test]
    fn chunking_does_not_change_lines(
        units in proptest::collection::vec(0u32..1000, 1..20),
        split in 1usize..16,
    ) {
        let stream: String = units.iter().map(|u| format!("v{}\r\n", u)).collect();
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();
        for chunk in stream.as_bytes().chunks(split) {
            lines.extend(buffer.push(chunk));
        }

        let expected: Vec<String> = units.iter().map(|u| format!("v{}", u)).collect();
        prop_assert_eq!(lines, expected);
        prop_assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn speed_tokens_decode_to_the_clamped_speed(speed in 0.0f64..500.0) {
        let line = encode(ActuatorCommand::speed(speed));
        prop_assert!(line.ends_with('\n'));

        let Some(ControllerReport::Speed(reported)) = decode_report(&line) else {
            return Err(TestCaseError::fail("speed token did not decode"));
        };
        // one controller unit is 1.25 mm/s, rounding loses at most half of it
        prop_assert!((reported - speed).abs() <= 0.625 + 1e-9);
    }
}
