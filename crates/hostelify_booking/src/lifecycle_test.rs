#[cfg(test)]
mod tests {
    use crate::error::BookingError;
    use crate::events::DomainEvent;
    use crate::lifecycle::{ArchiveQuery, CreateBookingRequest};
    use crate::memory::{Harness, RecordingNotifier};
    use crate::models::{AssignmentStatus, BookingStatus, PortalSettings, Semester};
    use crate::store::{ArchiveStore, AssignmentStore, BookingStore, RoomStore, SettingsStore};
    use std::sync::Arc;

    fn request(harness: &Harness, student_id: &str, room_id: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            student_id: student_id.to_string(),
            room_id: room_id.to_string(),
            terms_agreed: true,
            period: harness.period(),
        }
    }

    #[tokio::test]
    async fn booking_fills_room_to_capacity_then_rejects() {
        let harness = Harness::new();
        let room = harness.add_room("A101", 2).await;
        let alice = harness.add_student("Alice").await;
        let bob = harness.add_student("Bob").await;
        let carol = harness.add_student("Carol").await;

        harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness
            .lifecycle
            .create_booking(request(&harness, &bob.id, &room.id))
            .await
            .unwrap();

        let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
        assert_eq!(room_state.current_occupancy, 2);
        assert!(!room_state.is_available);

        let err = harness
            .lifecycle
            .create_booking(request(&harness, &carol.id, &room.id))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Capacity { .. }));

        // The losing attempt must not have touched occupancy
        let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
        assert_eq!(room_state.current_occupancy, 2);
    }

    #[tokio::test]
    async fn cancellation_releases_the_slot() {
        let harness = Harness::new();
        let room = harness.add_room("A102", 2).await;
        let alice = harness.add_student("Alice").await;
        let bob = harness.add_student("Bob").await;

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness
            .lifecycle
            .create_booking(request(&harness, &bob.id, &room.id))
            .await
            .unwrap();

        harness.lifecycle.cancel_booking(&booking.id).await.unwrap();

        let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
        assert_eq!(room_state.current_occupancy, 1);
        assert!(room_state.is_available);

        let cancelled = harness.bookings.find(&booking.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, BookingStatus::Inactive);
    }

    #[tokio::test]
    async fn cancelling_twice_is_a_no_op() {
        let harness = Harness::new();
        let room = harness.add_room("A103", 1).await;
        let alice = harness.add_student("Alice").await;

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness.lifecycle.cancel_booking(&booking.id).await.unwrap();
        harness.lifecycle.cancel_booking(&booking.id).await.unwrap();

        let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
        assert_eq!(room_state.current_occupancy, 0);
    }

    #[tokio::test]
    async fn occupancy_always_matches_active_assignment_count() {
        let harness = Harness::new();
        let room = harness.add_room("A104", 3).await;
        let students = [
            harness.add_student("Alice").await,
            harness.add_student("Bob").await,
            harness.add_student("Carol").await,
        ];

        let mut bookings = Vec::new();
        for student in &students {
            bookings.push(
                harness
                    .lifecycle
                    .create_booking(request(&harness, &student.id, &room.id))
                    .await
                    .unwrap(),
            );
            let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
            let count = harness.assignments.count_active_for_room(&room.id).await.unwrap();
            assert_eq!(room_state.current_occupancy, count);
        }

        for booking in &bookings {
            harness.lifecycle.cancel_booking(&booking.id).await.unwrap();
            let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
            let count = harness.assignments.count_active_for_room(&room.id).await.unwrap();
            assert_eq!(room_state.current_occupancy, count);
        }
    }

    #[tokio::test]
    async fn second_active_booking_is_a_conflict() {
        let harness = Harness::new();
        let room_a = harness.add_room("A105", 2).await;
        let room_b = harness.add_room("A106", 2).await;
        let alice = harness.add_student("Alice").await;

        harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room_a.id))
            .await
            .unwrap();
        let err = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room_b.id))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[tokio::test]
    async fn terms_must_be_agreed() {
        let harness = Harness::new();
        let room = harness.add_room("A107", 1).await;
        let alice = harness.add_student("Alice").await;

        let mut req = request(&harness, &alice.id, &room.id);
        req.terms_agreed = false;
        let err = harness.lifecycle.create_booking(req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn closed_portal_rejects_bookings() {
        let harness = Harness::new();
        harness
            .settings
            .save_portal(PortalSettings {
                enabled: false,
                ..Default::default()
            })
            .await
            .unwrap();
        let room = harness.add_room("A108", 1).await;
        let alice = harness.add_student("Alice").await;

        let err = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_room_and_student_are_not_found() {
        let harness = Harness::new();
        let room = harness.add_room("A109", 1).await;
        let alice = harness.add_student("Alice").await;

        let err = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, "missing-room"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));

        let err = harness
            .lifecycle
            .create_booking(request(&harness, "missing-student", &room.id))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn rebooking_reactivates_the_existing_assignment() {
        let harness = Harness::new();
        let room = harness.add_room("A110", 1).await;
        let alice = harness.add_student("Alice").await;

        let first = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness.lifecycle.cancel_booking(&first.id).await.unwrap();

        let second = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();

        // One assignment row for the (room, student, period) tuple, rebound
        // to the new booking
        let rows = harness
            .assignments
            .find_for_period(&room.id, &alice.id, "2025/26", Semester::First)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AssignmentStatus::Active);
        assert_eq!(rows[0].booking_id.as_deref(), Some(second.id.as_str()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_overbook_the_last_slot() {
        let harness = Arc::new(Harness::new());
        let room = harness.add_room("A111", 1).await;
        let alice = harness.add_student("Alice").await;
        let bob = harness.add_student("Bob").await;

        let mut tasks = Vec::new();
        for student_id in [alice.id.clone(), bob.id.clone()] {
            let harness = harness.clone();
            let room_id = room.id.clone();
            tasks.push(tokio::spawn(async move {
                let req = CreateBookingRequest {
                    student_id,
                    room_id,
                    terms_agreed: true,
                    period: harness.period(),
                };
                harness.lifecycle.create_booking(req).await
            }));
        }

        let mut successes = 0;
        let mut capacity_losses = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(BookingError::Capacity { .. }) => capacity_losses += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(capacity_losses, 1);

        let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
        assert_eq!(room_state.current_occupancy, 1);
        assert!(!room_state.is_available);
    }

    #[tokio::test]
    async fn archiving_twice_is_an_integrity_failure() {
        let harness = Harness::new();
        let room = harness.add_room("A112", 1).await;
        let alice = harness.add_student("Alice").await;

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();

        let archive = harness
            .lifecycle
            .archive_booking(&booking, Some("admin-1"))
            .await
            .unwrap();
        assert_eq!(archive.original_booking_id, booking.id);
        assert_eq!(archive.archived_by.as_deref(), Some("admin-1"));
        assert_eq!(archive.room_number, "A112");

        let err = harness
            .lifecycle
            .archive_booking(&booking, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Integrity(_)));

        // Still exactly one archive for the booking
        let existing = harness
            .archives
            .find_by_original(&booking.id)
            .await
            .unwrap();
        assert_eq!(existing.unwrap().id, archive.id);
    }

    #[tokio::test]
    async fn archive_listing_sorts_and_paginates() {
        let harness = Harness::new();
        let room = harness.add_room("A113", 1).await;
        let alice = harness.add_student("Alice").await;

        // Three archived cycles across two academic years
        let periods = [
            ("2024/25", Semester::First),
            ("2024/25", Semester::Second),
            ("2025/26", Semester::First),
        ];
        for (year, semester) in periods {
            let booking = harness
                .lifecycle
                .create_booking(CreateBookingRequest {
                    student_id: alice.id.clone(),
                    room_id: room.id.clone(),
                    terms_agreed: true,
                    period: crate::models::AcademicPeriod {
                        academic_year: year.to_string(),
                        semester,
                    },
                })
                .await
                .unwrap();
            harness
                .lifecycle
                .archive_booking(&booking, None)
                .await
                .unwrap();
            harness.lifecycle.cancel_booking(&booking.id).await.unwrap();
            harness.bookings.delete(&booking.id).await.unwrap();
        }

        let page = harness
            .lifecycle
            .list_archives(
                &alice.id,
                ArchiveQuery {
                    page: 1,
                    limit: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.archives.len(), 2);
        // Newest period first
        assert_eq!(page.archives[0].academic_year, "2025/26");
        assert_eq!(page.archives[1].academic_year, "2024/25");
        assert_eq!(page.archives[1].semester, Semester::Second);

        let page2 = harness
            .lifecycle
            .list_archives(
                &alice.id,
                ArchiveQuery {
                    page: 2,
                    limit: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page2.archives.len(), 1);
        assert_eq!(page2.archives[0].academic_year, "2024/25");
        assert_eq!(page2.archives[0].semester, Semester::First);

        let filtered = harness
            .lifecycle
            .list_archives(
                &alice.id,
                ArchiveQuery {
                    academic_year: Some("2024/25".to_string()),
                    semester: Some(Semester::Second),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.pagination.total, 1);
    }

    #[tokio::test]
    async fn archive_listing_tolerates_huge_page_numbers() {
        let harness = Harness::new();
        let room = harness.add_room("A118", 1).await;
        let alice = harness.add_student("Alice").await;

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness
            .lifecycle
            .archive_booking(&booking, None)
            .await
            .unwrap();

        // An absurd page number is an empty page, never an arithmetic panic
        let page = harness
            .lifecycle
            .list_archives(
                &alice.id,
                ArchiveQuery {
                    page: u32::MAX,
                    limit: 100,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(page.archives.is_empty());
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cancel_and_create_keep_occupancy_consistent() {
        let harness = Arc::new(Harness::new());
        let room = harness.add_room("A119", 1).await;

        for round in 0..20 {
            let holder = harness.add_student(&format!("Holder{round}")).await;
            let booking = harness
                .lifecycle
                .create_booking(request(&harness, &holder.id, &room.id))
                .await
                .unwrap();
            let taker = harness.add_student(&format!("Taker{round}")).await;

            let cancel = {
                let harness = harness.clone();
                let booking_id = booking.id.clone();
                tokio::spawn(async move { harness.lifecycle.cancel_booking(&booking_id).await })
            };
            let create = {
                let harness = harness.clone();
                let room_id = room.id.clone();
                let student_id = taker.id.clone();
                tokio::spawn(async move {
                    let req = CreateBookingRequest {
                        student_id,
                        room_id,
                        terms_agreed: true,
                        period: harness.period(),
                    };
                    harness.lifecycle.create_booking(req).await
                })
            };

            cancel.await.unwrap().unwrap();
            let created = create.await.unwrap();

            // Whatever the interleaving, the derived pair must match the
            // active assignment count once both operations settle
            let room_state = harness.rooms.find(&room.id).await.unwrap().unwrap();
            let active = harness.assignments.count_active_for_room(&room.id).await.unwrap();
            assert_eq!(room_state.current_occupancy, active);
            assert_eq!(room_state.is_available, active < room_state.capacity);

            if let Ok(booking) = created {
                harness.lifecycle.cancel_booking(&booking.id).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn clearing_inactive_bookings_archives_and_removes_them() {
        let harness = Harness::new();
        let room = harness.add_room("A114", 1).await;
        let alice = harness.add_student("Alice").await;

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();
        harness.lifecycle.cancel_booking(&booking.id).await.unwrap();

        let cleared = harness
            .lifecycle
            .clear_inactive_bookings(Some("admin-1"))
            .await
            .unwrap();
        assert_eq!(cleared, 1);
        assert!(harness.bookings.find(&booking.id).await.unwrap().is_none());
        assert!(harness
            .archives
            .find_by_original(&booking.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn booking_publishes_domain_events() {
        let harness = Harness::new();
        let room = harness.add_room("A115", 1).await;
        let alice = harness.add_student("Alice").await;
        let mut events = harness.events.subscribe();

        let booking = harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();

        let first = events.recv().await.unwrap();
        assert!(matches!(
            first,
            DomainEvent::RoomOccupancyChanged {
                current_occupancy: 1,
                ..
            }
        ));
        let second = events.recv().await.unwrap();
        match second {
            DomainEvent::BookingCreated { booking_id, .. } => {
                assert_eq!(booking_id, booking.id)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn booking_sends_a_confirmation_email() {
        let notifier = Arc::new(RecordingNotifier::default());
        let harness = Harness::with_notifier(notifier.clone());
        let room = harness.add_room("A116", 1).await;
        let alice = harness.add_student("Alice").await;

        harness
            .lifecycle
            .create_booking(request(&harness, &alice.id, &room.id))
            .await
            .unwrap();

        // Dispatch is fire-and-forget on a spawned task
        for _ in 0..50 {
            if !notifier.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, alice.email);
        assert!(sent[0].2.contains("A116"));
    }
}
