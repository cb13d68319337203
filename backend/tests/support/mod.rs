//! In-memory port adapters for integration tests.
//!
//! The class adapter evaluates its guards under one lock so the conditional
//! update semantics match the store contract: two tasks racing for the last
//! seat see exactly one success.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use melody_backend::domain::ports::{
    CapacityUpdateOutcome, ClassDetailsUpdate, ClassRepository, ClassRepositoryError,
    EnrollmentRepository, EnrollmentRepositoryError, ReserveSeatOutcome, SelectionInsertOutcome,
    SelectionRepository, SelectionRepositoryError, UserDirectory, UserDirectoryError,
};
use melody_backend::domain::{
    ApprovalStatus, ClassOffering, ClassOfferingDraft, EnrollmentRecord, Identity,
    PendingSelection, Role, SubjectId,
};

/// Rebuild a class offering with individual fields replaced.
fn rebuild(
    class: &ClassOffering,
    enrolled_count: i32,
    capacity: i32,
    status: ApprovalStatus,
    feedback: Option<String>,
    changes: Option<&ClassDetailsUpdate>,
) -> ClassOffering {
    let draft = ClassOfferingDraft {
        id: class.id(),
        instructor: class.instructor().clone(),
        name: changes
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| class.name().to_owned()),
        image_url: changes
            .and_then(|c| c.image_url.clone())
            .or_else(|| class.image_url().map(str::to_owned)),
        capacity,
        enrolled_count,
        status,
        feedback,
        price: changes.and_then(|c| c.price).unwrap_or_else(|| class.price()),
    };
    ClassOffering::new(draft).expect("rebuilt class stays valid")
}

/// Mutex-backed directory keyed by subject.
#[derive(Default)]
pub struct InMemoryDirectory {
    records: Mutex<HashMap<String, Role>>,
}

impl InMemoryDirectory {
    /// Seed a record with the given role.
    pub fn seed(&self, subject: &SubjectId, role: Role) {
        self.records
            .lock()
            .expect("directory lock")
            .insert(subject.as_ref().to_owned(), role);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find(&self, subject: &SubjectId) -> Result<Option<Identity>, UserDirectoryError> {
        let records = self.records.lock().expect("directory lock");
        Ok(records.get(subject.as_ref()).map(|role| Identity {
            subject: subject.clone(),
            role: *role,
        }))
    }

    async fn upsert_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Identity, UserDirectoryError> {
        let mut records = self.records.lock().expect("directory lock");
        let role = *records
            .entry(subject.as_ref().to_owned())
            .or_insert(Role::Unassigned);
        Ok(Identity {
            subject: subject.clone(),
            role,
        })
    }

    async fn set_role(
        &self,
        subject: &SubjectId,
        role: Role,
    ) -> Result<Option<Identity>, UserDirectoryError> {
        let mut records = self.records.lock().expect("directory lock");
        match records.get_mut(subject.as_ref()) {
            Some(stored) => {
                *stored = role;
                Ok(Some(Identity {
                    subject: subject.clone(),
                    role,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Identity>, UserDirectoryError> {
        let records = self.records.lock().expect("directory lock");
        records
            .iter()
            .map(|(subject, role)| {
                SubjectId::new(subject)
                    .map(|subject| Identity {
                        subject,
                        role: *role,
                    })
                    .map_err(|err| UserDirectoryError::query(err.to_string()))
            })
            .collect()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>, UserDirectoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|identity| identity.role == role)
            .collect())
    }
}

/// Mutex-backed class store; guards and writes happen under one lock.
#[derive(Default)]
pub struct InMemoryClasses {
    classes: Mutex<HashMap<Uuid, ClassOffering>>,
}

impl InMemoryClasses {
    /// Seed a class offering.
    pub fn seed(&self, class: ClassOffering) {
        self.classes
            .lock()
            .expect("classes lock")
            .insert(class.id(), class);
    }

    /// Current enrolled count for assertions.
    pub fn enrolled_count(&self, id: &Uuid) -> i32 {
        self.classes
            .lock()
            .expect("classes lock")
            .get(id)
            .map(ClassOffering::enrolled_count)
            .expect("seeded class")
    }
}

#[async_trait]
impl ClassRepository for InMemoryClasses {
    async fn insert(&self, class: &ClassOffering) -> Result<(), ClassRepositoryError> {
        self.seed(class.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(self.classes.lock().expect("classes lock").get(id).cloned())
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(self
            .classes
            .lock()
            .expect("classes lock")
            .values()
            .filter(|class| class.status() == status)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(self
            .classes
            .lock()
            .expect("classes lock")
            .values()
            .cloned()
            .collect())
    }

    async fn list_by_instructor(
        &self,
        instructor: &SubjectId,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(self
            .classes
            .lock()
            .expect("classes lock")
            .values()
            .filter(|class| class.instructor() == instructor)
            .cloned()
            .collect())
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        let mut approved = self.list_by_status(ApprovalStatus::Approved).await?;
        approved.sort_by_key(|class| std::cmp::Reverse(class.enrolled_count()));
        approved.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(approved)
    }

    async fn update_details(
        &self,
        id: &Uuid,
        changes: &ClassDetailsUpdate,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(None);
        };
        let updated = rebuild(
            class,
            class.enrolled_count(),
            class.capacity(),
            class.status(),
            class.feedback().map(str::to_owned),
            Some(changes),
        );
        classes.insert(*id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_status(
        &self,
        id: &Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(None);
        };
        let updated = rebuild(
            class,
            class.enrolled_count(),
            class.capacity(),
            status,
            class.feedback().map(str::to_owned),
            None,
        );
        classes.insert(*id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_feedback(
        &self,
        id: &Uuid,
        feedback: &str,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(None);
        };
        let updated = rebuild(
            class,
            class.enrolled_count(),
            class.capacity(),
            class.status(),
            Some(feedback.to_owned()),
            None,
        );
        classes.insert(*id, updated.clone());
        Ok(Some(updated))
    }

    async fn reserve_seat(&self, id: &Uuid) -> Result<ReserveSeatOutcome, ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(ReserveSeatOutcome::NotFound);
        };
        if class.enrolled_count() >= class.capacity() {
            return Ok(ReserveSeatOutcome::SoldOut);
        }
        let updated = rebuild(
            class,
            class.enrolled_count() + 1,
            class.capacity(),
            class.status(),
            class.feedback().map(str::to_owned),
            None,
        );
        classes.insert(*id, updated);
        Ok(ReserveSeatOutcome::Reserved)
    }

    async fn release_seat(&self, id: &Uuid) -> Result<(), ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(());
        };
        if class.enrolled_count() == 0 {
            return Ok(());
        }
        let updated = rebuild(
            class,
            class.enrolled_count() - 1,
            class.capacity(),
            class.status(),
            class.feedback().map(str::to_owned),
            None,
        );
        classes.insert(*id, updated);
        Ok(())
    }

    async fn set_capacity(
        &self,
        id: &Uuid,
        capacity: i32,
    ) -> Result<CapacityUpdateOutcome, ClassRepositoryError> {
        let mut classes = self.classes.lock().expect("classes lock");
        let Some(class) = classes.get(id) else {
            return Ok(CapacityUpdateOutcome::NotFound);
        };
        if class.enrolled_count() > capacity {
            return Ok(CapacityUpdateOutcome::BelowEnrollment);
        }
        let updated = rebuild(
            class,
            class.enrolled_count(),
            capacity,
            class.status(),
            class.feedback().map(str::to_owned),
            None,
        );
        classes.insert(*id, updated);
        Ok(CapacityUpdateOutcome::Updated)
    }
}

/// Mutex-backed selection store enforcing the one-per-class rule.
#[derive(Default)]
pub struct InMemorySelections {
    selections: Mutex<Vec<PendingSelection>>,
    fail_delete: AtomicBool,
}

impl InMemorySelections {
    /// Make every delete fail, for cleanup-failure coverage.
    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Number of stored selections.
    pub fn len(&self) -> usize {
        self.selections.lock().expect("selections lock").len()
    }
}

#[async_trait]
impl SelectionRepository for InMemorySelections {
    async fn insert(
        &self,
        selection: &PendingSelection,
    ) -> Result<SelectionInsertOutcome, SelectionRepositoryError> {
        let mut selections = self.selections.lock().expect("selections lock");
        let duplicate = selections.iter().any(|existing| {
            existing.student == selection.student && existing.class_id == selection.class_id
        });
        if duplicate {
            return Ok(SelectionInsertOutcome::Duplicate);
        }
        selections.push(selection.clone());
        Ok(SelectionInsertOutcome::Inserted)
    }

    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<PendingSelection>, SelectionRepositoryError> {
        Ok(self
            .selections
            .lock()
            .expect("selections lock")
            .iter()
            .filter(|selection| &selection.student == student)
            .cloned()
            .collect())
    }

    async fn delete(
        &self,
        id: &Uuid,
        student: &SubjectId,
    ) -> Result<bool, SelectionRepositoryError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(SelectionRepositoryError::query("injected delete failure"));
        }
        let mut selections = self.selections.lock().expect("selections lock");
        let before = selections.len();
        selections.retain(|selection| !(&selection.id == id && &selection.student == student));
        Ok(selections.len() < before)
    }
}

/// Mutex-backed enrollment log with an append failure switch.
#[derive(Default)]
pub struct InMemoryEnrollments {
    records: Mutex<Vec<EnrollmentRecord>>,
    fail_append: AtomicBool,
}

impl InMemoryEnrollments {
    /// Make every append fail, for compensation coverage.
    pub fn fail_appends(&self) {
        self.fail_append.store(true, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("enrollments lock").len()
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollments {
    async fn append(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentRepositoryError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(EnrollmentRepositoryError::connection(
                "injected append failure",
            ));
        }
        self.records
            .lock()
            .expect("enrollments lock")
            .push(record.clone());
        Ok(())
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentRepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("enrollments lock")
            .iter()
            .find(|record| record.payment_reference() == reference)
            .cloned())
    }

    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentRepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("enrollments lock")
            .iter()
            .filter(|record| record.student() == student)
            .cloned()
            .collect())
    }
}

/// Seeded approved class used by most scenarios.
pub fn approved_class(instructor: &SubjectId, capacity: i32) -> ClassOffering {
    ClassOffering::new(ClassOfferingDraft {
        id: Uuid::new_v4(),
        instructor: instructor.clone(),
        name: "Beginner violin".to_owned(),
        image_url: None,
        capacity,
        enrolled_count: 0,
        status: ApprovalStatus::Approved,
        feedback: None,
        price: rust_decimal::Decimal::new(4999, 2),
    })
    .expect("valid class")
}
