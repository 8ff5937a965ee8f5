// tests/property/queue_order_test.rs

//! Property-based tests for the command queues: FIFO order survives every
//! requeue cycle, and the high-water mark is enforced exactly.

use proptest::prelude::*;
use spinel_client::core::command::Command;
use spinel_client::core::queue::CommandQueue;

fn drain_offline_names(queue: &mut CommandQueue) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(cmd) = queue.pop_offline() {
        names.push(cmd.name.clone());
    }
    names
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_offline_queue_preserves_submission_order(
        names in prop::collection::vec("[A-Z]{1,10}", 1..=50)
    ) {
        let mut queue = CommandQueue::new(0);
        for name in &names {
            let (cmd, _rx) = Command::new(name.clone(), vec![]);
            queue.enqueue_offline(cmd).unwrap();
        }
        prop_assert_eq!(drain_offline_names(&mut queue), names);
    }

    #[test]
    fn test_requeue_unfulfilled_replays_ahead_of_newer_commands(
        sent in prop::collection::vec("[A-Z]{1,10}", 1..=20),
        queued in prop::collection::vec("[a-z]{1,10}", 0..=20)
    ) {
        let mut queue = CommandQueue::new(0);

        // `sent` commands were written to a transport that then broke...
        for name in &sent {
            let (cmd, _rx) = Command::new(name.clone(), vec![]);
            queue.push_in_flight(cmd);
        }
        // ...while `queued` commands were submitted during the outage.
        for name in &queued {
            let (cmd, _rx) = Command::new(name.clone(), vec![]);
            queue.enqueue_offline(cmd).unwrap();
        }

        queue.requeue_unfulfilled();
        prop_assert_eq!(queue.in_flight_len(), 0);

        let mut expected = sent.clone();
        expected.extend(queued.iter().cloned());
        prop_assert_eq!(drain_offline_names(&mut queue), expected);
    }

    #[test]
    fn test_high_water_mark_accepts_exactly_limit_commands(
        limit in 1usize..=20,
        submissions in 1usize..=40
    ) {
        let mut queue = CommandQueue::new(limit);
        let mut accepted = 0;
        for i in 0..submissions {
            let (cmd, _rx) = Command::new(format!("CMD{i}"), vec![]);
            if queue.enqueue_offline(cmd).is_ok() {
                accepted += 1;
            }
        }
        prop_assert_eq!(accepted, submissions.min(limit));
        prop_assert_eq!(queue.offline_len(), submissions.min(limit));
    }
}
