//! In-memory store implementations and a wiring harness for tests.

use crate::deletion::StudentDeletion;
use crate::events::EventBus;
use crate::lifecycle::BookingLifecycle;
use crate::models::{
    AcademicPeriod, AcademicSettings, AssignmentStatus, Booking, BookingArchive, BookingStatus,
    PortalSettings, Room, RoomAssignment, RoomType, Semester, Student,
};
use crate::occupancy::OccupancyTracker;
use crate::store::{
    ArchiveFilter, ArchiveStore, AssignmentStore, BookingStore, RoomStore, SettingsStore,
    StoreError, StudentStore,
};
use chrono::{DateTime, Utc};
use hostelify_common::{BoxFuture, BoxedError, NotificationResult, NotificationService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn ready<T: Send + 'static>(value: Result<T, StoreError>) -> BoxFuture<'static, T, StoreError> {
    Box::pin(async move { value })
}

#[derive(Default)]
pub struct MemoryRooms {
    inner: Mutex<HashMap<String, Room>>,
}

impl RoomStore for MemoryRooms {
    fn insert(&self, room: Room) -> BoxFuture<'_, Room, StoreError> {
        let mut map = self.inner.lock().unwrap();
        if map.values().any(|r| r.room_number == room.room_number) {
            return ready(Err(StoreError::Constraint(format!(
                "room number {} already exists",
                room.room_number
            ))));
        }
        map.insert(room.id.clone(), room.clone());
        ready(Ok(room))
    }

    fn find(&self, room_id: &str) -> BoxFuture<'_, Option<Room>, StoreError> {
        ready(Ok(self.inner.lock().unwrap().get(room_id).cloned()))
    }

    fn find_by_number(&self, room_number: &str) -> BoxFuture<'_, Option<Room>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .find(|r| r.room_number == room_number)
            .cloned();
        ready(Ok(found))
    }

    fn list(&self) -> BoxFuture<'_, Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.inner.lock().unwrap().values().cloned().collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        ready(Ok(rooms))
    }

    fn update_occupancy(
        &self,
        room_id: &str,
        current_occupancy: u32,
        is_available: bool,
    ) -> BoxFuture<'_, (), StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(room_id) {
            Some(room) => {
                room.current_occupancy = current_occupancy;
                room.is_available = is_available;
                ready(Ok(()))
            }
            None => ready(Err(StoreError::Query(format!(
                "room {} not found",
                room_id
            )))),
        }
    }
}

#[derive(Default)]
pub struct MemoryStudents {
    inner: Mutex<HashMap<String, Student>>,
}

impl StudentStore for MemoryStudents {
    fn insert(&self, student: Student) -> BoxFuture<'_, Student, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .insert(student.id.clone(), student.clone());
        ready(Ok(student))
    }

    fn find(&self, student_id: &str) -> BoxFuture<'_, Option<Student>, StoreError> {
        ready(Ok(self.inner.lock().unwrap().get(student_id).cloned()))
    }

    fn delete(&self, student_id: &str) -> BoxFuture<'_, bool, StoreError> {
        ready(Ok(self.inner.lock().unwrap().remove(student_id).is_some()))
    }
}

#[derive(Default)]
pub struct MemoryBookings {
    inner: Mutex<HashMap<String, Booking>>,
}

impl BookingStore for MemoryBookings {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, Booking, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .insert(booking.id.clone(), booking.clone());
        ready(Ok(booking))
    }

    fn find(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, StoreError> {
        ready(Ok(self.inner.lock().unwrap().get(booking_id).cloned()))
    }

    fn find_active_by_student(
        &self,
        student_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .find(|b| b.student_id == student_id && b.status == BookingStatus::Active)
            .cloned();
        ready(Ok(found))
    }

    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<Booking>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect();
        ready(Ok(found))
    }

    fn find_by_status(&self, status: BookingStatus) -> BoxFuture<'_, Vec<Booking>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        ready(Ok(found))
    }

    fn set_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(booking_id) {
            Some(booking) => {
                booking.status = status;
                booking.updated_at = updated_at;
                ready(Ok(()))
            }
            None => ready(Err(StoreError::Query(format!(
                "booking {} not found",
                booking_id
            )))),
        }
    }

    fn delete(&self, booking_id: &str) -> BoxFuture<'_, bool, StoreError> {
        ready(Ok(self.inner.lock().unwrap().remove(booking_id).is_some()))
    }
}

#[derive(Default)]
pub struct MemoryAssignments {
    inner: Mutex<HashMap<String, RoomAssignment>>,
}

impl AssignmentStore for MemoryAssignments {
    fn insert(&self, assignment: RoomAssignment) -> BoxFuture<'_, RoomAssignment, StoreError> {
        let mut map = self.inner.lock().unwrap();
        let duplicate = map.values().any(|a| {
            a.room_id == assignment.room_id
                && a.student_id == assignment.student_id
                && a.academic_year == assignment.academic_year
                && a.semester == assignment.semester
                && a.status == assignment.status
        });
        if duplicate {
            return ready(Err(StoreError::Constraint(
                "duplicate room assignment".into(),
            )));
        }
        map.insert(assignment.id.clone(), assignment.clone());
        ready(Ok(assignment))
    }

    fn find_for_period(
        &self,
        room_id: &str,
        student_id: &str,
        academic_year: &str,
        semester: Semester,
    ) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|a| {
                a.room_id == room_id
                    && a.student_id == student_id
                    && a.academic_year == academic_year
                    && a.semester == semester
            })
            .cloned()
            .collect();
        ready(Ok(found))
    }

    fn find_by_booking(&self, booking_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.booking_id.as_deref() == Some(booking_id))
            .cloned()
            .collect();
        ready(Ok(found))
    }

    fn find_by_student(&self, student_id: &str) -> BoxFuture<'_, Vec<RoomAssignment>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        ready(Ok(found))
    }

    fn count_active_for_room(&self, room_id: &str) -> BoxFuture<'_, u32, StoreError> {
        let count = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.room_id == room_id && a.status == AssignmentStatus::Active)
            .count() as u32;
        ready(Ok(count))
    }

    fn set_status(
        &self,
        assignment_id: &str,
        status: AssignmentStatus,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(assignment_id) {
            Some(assignment) => {
                assignment.status = status;
                assignment.updated_at = updated_at;
                ready(Ok(()))
            }
            None => ready(Err(StoreError::Query(format!(
                "assignment {} not found",
                assignment_id
            )))),
        }
    }

    fn reactivate(
        &self,
        assignment_id: &str,
        booking_id: &str,
        updated_at: DateTime<Utc>,
    ) -> BoxFuture<'_, (), StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(assignment_id) {
            Some(assignment) => {
                assignment.status = AssignmentStatus::Active;
                assignment.booking_id = Some(booking_id.to_string());
                assignment.updated_at = updated_at;
                ready(Ok(()))
            }
            None => ready(Err(StoreError::Query(format!(
                "assignment {} not found",
                assignment_id
            )))),
        }
    }

    fn delete(&self, assignment_id: &str) -> BoxFuture<'_, bool, StoreError> {
        ready(Ok(self
            .inner
            .lock()
            .unwrap()
            .remove(assignment_id)
            .is_some()))
    }
}

#[derive(Default)]
pub struct MemoryArchives {
    inner: Mutex<HashMap<String, BookingArchive>>,
}

impl ArchiveStore for MemoryArchives {
    fn insert(&self, archive: BookingArchive) -> BoxFuture<'_, BookingArchive, StoreError> {
        let mut map = self.inner.lock().unwrap();
        if map
            .values()
            .any(|a| a.original_booking_id == archive.original_booking_id)
        {
            return ready(Err(StoreError::Constraint(format!(
                "archive for booking {} already exists",
                archive.original_booking_id
            ))));
        }
        map.insert(archive.id.clone(), archive.clone());
        ready(Ok(archive))
    }

    fn find_by_original(
        &self,
        original_booking_id: &str,
    ) -> BoxFuture<'_, Option<BookingArchive>, StoreError> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .values()
            .find(|a| a.original_booking_id == original_booking_id)
            .cloned();
        ready(Ok(found))
    }

    fn list_for_student(
        &self,
        student_id: &str,
        filter: ArchiveFilter,
    ) -> BoxFuture<'_, (Vec<BookingArchive>, u64), StoreError> {
        let mut matching: Vec<BookingArchive> = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.student_id == student_id)
            .filter(|a| {
                filter
                    .academic_year
                    .as_deref()
                    .map_or(true, |year| a.academic_year == year)
            })
            .filter(|a| filter.semester.map_or(true, |s| a.semester == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.academic_year
                .cmp(&a.academic_year)
                .then(b.semester.number().cmp(&a.semester.number()))
                .then(b.archived_at.cmp(&a.archived_at))
        });
        let total = matching.len() as u64;
        // Offset math in u64; a huge caller-supplied page must not overflow
        let offset = ((filter.page.max(1) as u64 - 1) * filter.limit as u64) as usize;
        let page: Vec<BookingArchive> = matching
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();
        ready(Ok((page, total)))
    }
}

#[derive(Default)]
pub struct MemorySettings {
    portal: Mutex<Option<PortalSettings>>,
    academic: Mutex<Option<AcademicSettings>>,
}

impl SettingsStore for MemorySettings {
    fn portal(&self) -> BoxFuture<'_, Option<PortalSettings>, StoreError> {
        ready(Ok(self.portal.lock().unwrap().clone()))
    }

    fn save_portal(&self, settings: PortalSettings) -> BoxFuture<'_, (), StoreError> {
        *self.portal.lock().unwrap() = Some(settings);
        ready(Ok(()))
    }

    fn academic(&self) -> BoxFuture<'_, Option<AcademicSettings>, StoreError> {
        ready(Ok(self.academic.lock().unwrap().clone()))
    }

    fn save_academic(&self, settings: AcademicSettings) -> BoxFuture<'_, (), StoreError> {
        *self.academic.lock().unwrap() = Some(settings);
        ready(Ok(()))
    }
}

/// Notifier that records sent emails instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationService for RecordingNotifier {
    type Error = BoxedError;

    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Box::pin(async move {
            Ok(NotificationResult {
                delivered: true,
                message_id: Some(Uuid::new_v4().to_string()),
            })
        })
    }
}

/// Fully wired booking core over in-memory stores.
pub struct Harness {
    pub rooms: Arc<MemoryRooms>,
    pub students: Arc<MemoryStudents>,
    pub bookings: Arc<MemoryBookings>,
    pub assignments: Arc<MemoryAssignments>,
    pub archives: Arc<MemoryArchives>,
    pub settings: Arc<MemorySettings>,
    pub events: EventBus,
    pub occupancy: Arc<OccupancyTracker>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub deletion: Arc<StudentDeletion>,
}

impl Harness {
    /// Harness with the portal open and a default academic period.
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_notifier(
        notifier: Arc<dyn NotificationService<Error = BoxedError>>,
    ) -> Self {
        Self::build(Some(notifier))
    }

    fn build(notifier: Option<Arc<dyn NotificationService<Error = BoxedError>>>) -> Self {
        let rooms = Arc::new(MemoryRooms::default());
        let students = Arc::new(MemoryStudents::default());
        let bookings = Arc::new(MemoryBookings::default());
        let assignments = Arc::new(MemoryAssignments::default());
        let archives = Arc::new(MemoryArchives::default());
        let settings = Arc::new(MemorySettings::default());
        *settings.portal.lock().unwrap() = Some(PortalSettings {
            enabled: true,
            ..Default::default()
        });
        *settings.academic.lock().unwrap() = Some(AcademicSettings {
            current_academic_year: "2025/26".to_string(),
            current_semester: Semester::First,
            ..Default::default()
        });

        let events = EventBus::default();
        let occupancy = Arc::new(OccupancyTracker::new(
            rooms.clone(),
            assignments.clone(),
            events.clone(),
        ));
        let mut lifecycle = BookingLifecycle::new(
            rooms.clone(),
            students.clone(),
            bookings.clone(),
            assignments.clone(),
            archives.clone(),
            settings.clone(),
            occupancy.clone(),
            events.clone(),
        );
        if let Some(notifier) = notifier {
            lifecycle = lifecycle.with_notifier(notifier);
        }
        let lifecycle = Arc::new(lifecycle);
        let deletion = Arc::new(StudentDeletion::new(
            students.clone(),
            bookings.clone(),
            assignments.clone(),
            lifecycle.clone(),
            occupancy.clone(),
            events.clone(),
        ));

        Self {
            rooms,
            students,
            bookings,
            assignments,
            archives,
            settings,
            events,
            occupancy,
            lifecycle,
            deletion,
        }
    }

    pub fn period(&self) -> AcademicPeriod {
        AcademicPeriod {
            academic_year: "2025/26".to_string(),
            semester: Semester::First,
        }
    }

    pub async fn add_room(&self, room_number: &str, capacity: u32) -> Room {
        let room = Room::new(room_number, capacity, RoomType::Double).unwrap();
        self.rooms.insert(room).await.unwrap()
    }

    pub async fn add_student(&self, full_name: &str) -> Student {
        let student = Student {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: format!("{}@students.example", full_name.to_lowercase().replace(' ', ".")),
            phone: None,
            created_at: Utc::now(),
        };
        self.students.insert(student).await.unwrap()
    }
}
