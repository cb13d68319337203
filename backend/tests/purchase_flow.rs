//! End-to-end coverage of the enrollment transaction engine against the
//! in-memory store adapters.

mod support;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use melody_backend::domain::ports::SelectionRepository;
use melody_backend::domain::{
    CapacityLedger, ErrorCode, PendingSelection, PurchaseRequest, PurchaseService, SubjectId,
};
use support::{InMemoryClasses, InMemoryEnrollments, InMemorySelections, approved_class};

struct Harness {
    classes: Arc<InMemoryClasses>,
    selections: Arc<InMemorySelections>,
    enrollments: Arc<InMemoryEnrollments>,
    service: PurchaseService,
}

fn harness() -> Harness {
    let classes = Arc::new(InMemoryClasses::default());
    let selections = Arc::new(InMemorySelections::default());
    let enrollments = Arc::new(InMemoryEnrollments::default());
    let service = PurchaseService::new(
        CapacityLedger::new(classes.clone()),
        selections.clone(),
        enrollments.clone(),
    );
    Harness {
        classes,
        selections,
        enrollments,
        service,
    }
}

fn student(n: usize) -> SubjectId {
    SubjectId::new(format!("student{n}@example.com")).expect("valid subject")
}

async fn seed_selection(harness: &Harness, student: &SubjectId, class_id: Uuid) -> Uuid {
    let selection = PendingSelection::new(student.clone(), class_id);
    harness
        .selections
        .insert(&selection)
        .await
        .expect("seed selection");
    selection.id
}

fn purchase(student: &SubjectId, selection_id: Uuid, class_id: Uuid, reference: &str) -> PurchaseRequest {
    PurchaseRequest {
        student: student.clone(),
        selection_id,
        class_id,
        payment_reference: reference.to_owned(),
        amount: Decimal::new(4999, 2),
    }
}

#[tokio::test]
async fn successful_purchase_touches_all_three_records() {
    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, 5);
    let class_id = class.id();
    harness.classes.seed(class);

    let buyer = student(1);
    let selection_id = seed_selection(&harness, &buyer, class_id).await;

    let completed = harness
        .service
        .complete_purchase(purchase(&buyer, selection_id, class_id, "pi_1"))
        .await
        .expect("purchase succeeds");

    assert!(completed.selection_cleared);
    assert_eq!(harness.classes.enrolled_count(&class_id), 1);
    assert_eq!(harness.enrollments.len(), 1);
    assert_eq!(harness.selections.len(), 0);
}

#[tokio::test]
async fn concurrent_purchases_never_oversell() {
    const SEATS: i32 = 3;
    const BUYERS: usize = 8;

    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, SEATS);
    let class_id = class.id();
    harness.classes.seed(class);

    let mut selection_ids = Vec::new();
    for n in 0..BUYERS {
        selection_ids.push(seed_selection(&harness, &student(n), class_id).await);
    }

    let mut tasks = Vec::new();
    for (n, selection_id) in selection_ids.into_iter().enumerate() {
        let service = harness.service.clone();
        let buyer = student(n);
        tasks.push(tokio::spawn(async move {
            service
                .complete_purchase(purchase(
                    &buyer,
                    selection_id,
                    class_id,
                    &format!("pi_{n}"),
                ))
                .await
        }));
    }

    let mut successes = 0;
    let mut sold_out = 0;
    for task in tasks {
        match task.await.expect("task completes") {
            Ok(_) => successes += 1,
            Err(err) => {
                assert_eq!(err.code, ErrorCode::Conflict);
                assert_eq!(err.detail_code(), Some("sold_out"));
                sold_out += 1;
            }
        }
    }

    assert_eq!(successes, usize::try_from(SEATS).expect("small"));
    assert_eq!(sold_out, BUYERS - successes);
    assert_eq!(harness.classes.enrolled_count(&class_id), SEATS);
    assert_eq!(harness.enrollments.len(), successes);
}

#[tokio::test]
async fn failed_enrollment_write_leaves_counter_unchanged() {
    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, 5);
    let class_id = class.id();
    harness.classes.seed(class);
    harness.enrollments.fail_appends();

    let buyer = student(1);
    let selection_id = seed_selection(&harness, &buyer, class_id).await;

    let error = harness
        .service
        .complete_purchase(purchase(&buyer, selection_id, class_id, "pi_1"))
        .await
        .expect_err("append fails");

    assert_eq!(error.code, ErrorCode::ServiceUnavailable);
    // Compensation ran: the reserved seat was released.
    assert_eq!(harness.classes.enrolled_count(&class_id), 0);
    assert_eq!(harness.enrollments.len(), 0);
    // The selection survives for a retry with a fresh reference.
    assert_eq!(harness.selections.len(), 1);
}

#[tokio::test]
async fn failed_cleanup_keeps_the_paid_enrollment() {
    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, 5);
    let class_id = class.id();
    harness.classes.seed(class);

    let buyer = student(1);
    let selection_id = seed_selection(&harness, &buyer, class_id).await;
    harness.selections.fail_deletes();

    let completed = harness
        .service
        .complete_purchase(purchase(&buyer, selection_id, class_id, "pi_1"))
        .await
        .expect("purchase succeeds despite cleanup failure");

    assert!(!completed.selection_cleared);
    assert_eq!(harness.classes.enrolled_count(&class_id), 1);
    assert_eq!(harness.enrollments.len(), 1);
}

#[tokio::test]
async fn replayed_reference_does_not_take_a_second_seat() {
    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, 5);
    let class_id = class.id();
    harness.classes.seed(class);

    let buyer = student(1);
    let selection_id = seed_selection(&harness, &buyer, class_id).await;

    let first = harness
        .service
        .complete_purchase(purchase(&buyer, selection_id, class_id, "pi_1"))
        .await
        .expect("first purchase succeeds");
    let replay = harness
        .service
        .complete_purchase(purchase(&buyer, selection_id, class_id, "pi_1"))
        .await
        .expect("replay succeeds");

    assert_eq!(replay.record.id(), first.record.id());
    assert_eq!(harness.classes.enrolled_count(&class_id), 1);
    assert_eq!(harness.enrollments.len(), 1);
}

#[tokio::test]
async fn capacity_reduction_below_enrolment_is_rejected() {
    let harness = harness();
    let instructor = SubjectId::new("ida@example.com").expect("valid subject");
    let class = approved_class(&instructor, 5);
    let class_id = class.id();
    harness.classes.seed(class);

    for n in 0..3 {
        let buyer = student(n);
        let selection_id = seed_selection(&harness, &buyer, class_id).await;
        harness
            .service
            .complete_purchase(purchase(&buyer, selection_id, class_id, &format!("pi_{n}")))
            .await
            .expect("purchase succeeds");
    }

    let ledger = CapacityLedger::new(harness.classes.clone());
    let error = ledger
        .set_capacity(class_id, 2)
        .await
        .expect_err("below enrolment");
    assert_eq!(error.code, ErrorCode::Conflict);
    assert_eq!(error.detail_code(), Some("capacity_below_enrollment"));

    // Capacity was left unchanged; a raise is still possible.
    ledger
        .set_capacity(class_id, 10)
        .await
        .expect("raising capacity succeeds");
}
