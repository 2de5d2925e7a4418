//! Report views over protocols loaded through the repository

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use revtrack_core::{
    EngineConfig, Protocol, ProtocolRef, ProtocolStatus, ReviewerAssignment, ReviewerIdentity,
    TemporalPolicy, Urgency,
};
use revtrack_report::{reviewer_queue, reviewer_stats, Dashboard};
use revtrack_store::{InMemoryStore, ProtocolRepository};
use revtrack_test_utils::{current_record, legacy_record, reviewer_entry, seeded_store, ymd};

async fn seeded_protocols() -> Vec<Protocol> {
    ProtocolRepository::new(seeded_store()).load_all().await.unwrap()
}

#[tokio::test]
async fn dashboard_over_seeded_store() {
    let protocols = seeded_protocols().await;
    let dashboard = Dashboard::build(&protocols, ymd(2024, 5, 18), &EngineConfig::default());

    // P-LEGACY (due 2024-03-01) is overdue, P-NESTED's R2 (2024-05-20) is due soon
    assert_eq!(dashboard.overdue.len(), 1);
    assert_eq!(dashboard.overdue[0].reviewer_id, "DRAPL-001");
    assert_eq!(dashboard.due_soon.len(), 1);
    assert_eq!(dashboard.due_soon[0].reference.to_string(), "2024-05/week-2/P-NESTED");

    let badges: Vec<(&str, Urgency)> = dashboard
        .protocols
        .iter()
        .map(|s| (s.protocol_id.as_str(), s.urgency))
        .collect();
    assert_eq!(
        badges,
        vec![
            ("P-LEGACY", Urgency::Overdue),
            ("P-NESTED", Urgency::DueSoon),
            ("P-DONE", Urgency::Done),
        ]
    );
    assert_eq!(dashboard.protocols[2].status, ProtocolStatus::Completed);

    let yu = dashboard.reviewers.iter().find(|r| r.reviewer_id == "R1").unwrap();
    assert_eq!((yu.assigned, yu.completed, yu.overdue), (2, 2, 0));
    assert!(dashboard.speed.is_empty());
}

#[tokio::test]
async fn dashboard_serializes_for_presentation() {
    let protocols = seeded_protocols().await;
    let dashboard = Dashboard::build(&protocols, ymd(2024, 5, 18), &EngineConfig::default());
    let json = serde_json::to_value(&dashboard).unwrap();

    assert_eq!(json["today"], "2024-05-18");
    assert_eq!(json["overdue"][0]["due_date"], "2024-03-01");
    assert_eq!(json["overdue"][0]["reference"], "P-LEGACY");
    assert_eq!(json["periods"][0]["period"], "Unspecified");
}

#[tokio::test]
async fn queue_for_reviewer_spans_layouts() {
    let protocols = seeded_protocols().await;
    let queue = reviewer_queue(
        &protocols,
        &ReviewerIdentity::from_id("R1"),
        ymd(2024, 5, 18),
        &TemporalPolicy::default(),
    );
    let ids: Vec<&str> = queue.iter().map(|e| e.protocol_id.as_str()).collect();
    assert_eq!(ids, vec!["P-DONE", "P-NESTED"]);
    assert!(queue.iter().all(|e| e.urgency == Urgency::Done));
}

#[tokio::test]
async fn stats_and_queue_agree_on_one_reviewer() {
    let store = InMemoryStore::new()
        .with_record(
            ProtocolRef::flat("P-OLD"),
            legacy_record("Dr. Ester Yu", "In Progress", "2024-06-01"),
        )
        .with_record(
            ProtocolRef::nested("2024-05", "week-1", "P-NEW"),
            current_record(
                "Coded",
                vec![reviewer_entry("DRAPL-001", "Dr. Ester Yu", "In Progress", Some("2024-06-10"))],
            ),
        );
    let protocols = ProtocolRepository::new(store).load_all().await.unwrap();
    let today = ymd(2024, 5, 18);

    let stats = reviewer_stats(&protocols, today);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].reviewer_id, "DRAPL-001");

    let queue = reviewer_queue(
        &protocols,
        &ReviewerIdentity::new("DRAPL-001", "Dr. Ester Yu"),
        today,
        &TemporalPolicy::default(),
    );
    assert_eq!(queue.len(), stats[0].assigned);
}

fn arb_protocol() -> impl Strategy<Value = Protocol> {
    let assignment = (0u8..4, proptest::option::of(-30i64..30), any::<bool>()).prop_map(
        |(reviewer, offset, done)| {
            let mut a = ReviewerAssignment::new(format!("R{reviewer}"), format!("Reviewer {reviewer}"));
            a.due_date = offset.map(|days| ymd(2024, 5, 1) + chrono::Duration::days(days));
            if done {
                a.complete(a.due_date);
            }
            a
        },
    );
    (0u16..500, proptest::collection::vec(assignment, 0..5)).prop_map(|(n, assignments)| {
        let mut protocol = Protocol::new(format!("P-{n}"), format!("Protocol {n}"));
        protocol.assignments = assignments;
        protocol
    })
}

proptest! {
    #[test]
    fn overdue_and_due_soon_views_are_disjoint(
        protocols in proptest::collection::vec(arb_protocol(), 0..8),
        offset in -40i64..40,
    ) {
        let today: NaiveDate = ymd(2024, 5, 1) + chrono::Duration::days(offset);
        let dashboard = Dashboard::build(&protocols, today, &EngineConfig::default());

        for row in &dashboard.overdue {
            prop_assert!(row.due_date < today);
            prop_assert!(!dashboard.due_soon.contains(row));
        }
        for row in &dashboard.due_soon {
            prop_assert!(row.due_date >= today);
        }
        let assigned: usize = dashboard.reviewers.iter().map(|r| r.assigned).sum();
        let total: usize = protocols.iter().map(|p| p.assignments.len()).sum();
        prop_assert_eq!(assigned, total);
    }
}
