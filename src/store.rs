use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Company, Input, Offer, OfferStatus, Student};

const STUDENTS_FILE: &str = "students.json";
const OFFERS_FILE: &str = "offers.json";
const COMPANIES_FILE: &str = "companies.json";
const INPUTS_FILE: &str = "inputs.json";

/// Immutable copy of every collection, handed to the report engine.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub offers: Vec<Offer>,
    pub companies: Vec<Company>,
    pub inputs: Vec<Input>,
}

pub trait PlacementStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError>;
}

trait Record: Serialize + DeserializeOwned {
    const KIND: &'static str;
    const FILE: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! record {
    ($ty:ty, $kind:literal, $file:expr) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;
            const FILE: &'static str = $file;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

record!(Student, "student", STUDENTS_FILE);
record!(Offer, "offer", OFFERS_FILE);
record!(Company, "company", COMPANIES_FILE);
record!(Input, "input", INPUTS_FILE);

fn invalid(kind: &'static str, reason: &str) -> StoreError {
    StoreError::Invalid {
        kind,
        reason: reason.to_string(),
    }
}

fn require(kind: &'static str, field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(invalid(kind, &format!("{field} is required")));
    }
    Ok(())
}

/// Keeps each collection as a JSON array in its own file under `dir`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(T::FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Json { path, source })
    }

    fn save<T: Record>(&self, items: &[T]) -> Result<(), StoreError> {
        let path = self.dir.join(T::FILE);
        let raw = serde_json::to_string_pretty(items).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, raw).map_err(|source| StoreError::Io { path, source })?;
        debug!(collection = T::KIND, records = items.len(), "saved collection");
        Ok(())
    }

    fn insert<T: Record>(&self, mut item: T) -> Result<T, StoreError> {
        let mut items = self.load::<T>()?;
        item.set_id(Uuid::new_v4().to_string());
        items.push(item);
        self.save(&items)?;
        items.pop().ok_or_else(|| invalid(T::KIND, "insert lost the new record"))
    }

    fn update<T: Record + Clone>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut T),
        check: impl Fn(&T) -> Result<(), StoreError>,
    ) -> Result<T, StoreError> {
        let mut items = self.load::<T>()?;
        let item = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        apply(item);
        item.set_id(id.to_string());
        check(item)?;
        let updated = item.clone();
        self.save(&items)?;
        Ok(updated)
    }

    fn remove<T: Record>(&self, id: &str) -> Result<(), StoreError> {
        let mut items = self.load::<T>()?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        self.save(&items)
    }

    pub fn students(&self) -> Result<Vec<Student>, StoreError> {
        self.load()
    }

    pub fn offers(&self) -> Result<Vec<Offer>, StoreError> {
        self.load()
    }

    pub fn companies(&self) -> Result<Vec<Company>, StoreError> {
        self.load()
    }

    pub fn inputs(&self) -> Result<Vec<Input>, StoreError> {
        self.load()
    }

    pub fn get_student(&self, id: &str) -> Result<Option<Student>, StoreError> {
        Ok(self.students()?.into_iter().find(|student| student.id == id))
    }

    /// Students whose name, roll number, branch or email contains `query`,
    /// ignoring case. A blank query matches everyone.
    pub fn search_students(&self, query: &str) -> Result<Vec<Student>, StoreError> {
        let needle = query.trim().to_lowercase();
        let mut students = self.students()?;
        students.retain(|student| {
            [&student.name, &student.roll_number, &student.branch, &student.email]
                .into_iter()
                .any(|field| contains_folded(field, &needle))
        });
        Ok(students)
    }

    /// Offers whose student name, student roll number, company or role contains
    /// `query`, ignoring case. A blank query matches everything.
    pub fn search_offers(&self, query: &str) -> Result<Vec<Offer>, StoreError> {
        let needle = query.trim().to_lowercase();
        let students = self.students()?;
        let mut offers = self.offers()?;
        offers.retain(|offer| {
            let student = students.iter().find(|student| student.id == offer.student_id);
            student.is_some_and(|student| {
                contains_folded(&student.name, &needle)
                    || contains_folded(&student.roll_number, &needle)
            }) || contains_folded(&offer.company_name, &needle)
                || contains_folded(&offer.role, &needle)
        });
        Ok(offers)
    }

    pub fn inputs_for_student(&self, student_id: &str) -> Result<Vec<Input>, StoreError> {
        let mut inputs = self.inputs()?;
        inputs.retain(|input| input.student_id.as_deref() == Some(student_id));
        Ok(inputs)
    }

    pub fn add_student(&self, student: Student) -> Result<Student, StoreError> {
        validate_student(&student)?;
        self.insert(student)
    }

    pub fn update_student(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Student),
    ) -> Result<Student, StoreError> {
        self.update(id, apply, validate_student)
    }

    /// Removes the student and every offer made to them. Returns the number of
    /// offers removed.
    pub fn delete_student(&self, id: &str) -> Result<usize, StoreError> {
        self.remove::<Student>(id)?;

        let mut offers = self.offers()?;
        let before = offers.len();
        offers.retain(|offer| offer.student_id != id);
        let removed = before - offers.len();
        if removed > 0 {
            self.save(&offers)?;
        }
        info!(student_id = id, offers_removed = removed, "deleted student");
        Ok(removed)
    }

    pub fn add_offer(&self, offer: Offer) -> Result<Offer, StoreError> {
        validate_offer(&offer)?;
        self.insert(offer)
    }

    pub fn update_offer(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Offer),
    ) -> Result<Offer, StoreError> {
        self.update(id, apply, validate_offer)
    }

    pub fn delete_offer(&self, id: &str) -> Result<(), StoreError> {
        self.remove::<Offer>(id)
    }

    pub fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        validate_company(&company)?;
        self.insert(company)
    }

    pub fn update_company(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Company),
    ) -> Result<Company, StoreError> {
        self.update(id, apply, validate_company)
    }

    /// Offers keep their company name; they simply stop joining to an industry.
    pub fn delete_company(&self, id: &str) -> Result<(), StoreError> {
        self.remove::<Company>(id)
    }

    pub fn add_input(&self, mut input: Input) -> Result<Input, StoreError> {
        require(Input::KIND, "title", &input.title)?;
        require(Input::KIND, "message", &input.message)?;
        input.timestamp.get_or_insert_with(Utc::now);
        self.insert(input)
    }

    /// Upserts the sample records shipped for a first launch.
    pub fn seed(&self) -> Result<(), StoreError> {
        self.upsert(seed_students())?;
        self.upsert(seed_offers())?;
        self.upsert(seed_companies())?;
        Ok(())
    }

    fn upsert<T: Record>(&self, records: Vec<T>) -> Result<(), StoreError> {
        let mut items = self.load::<T>()?;
        for record in records {
            match items.iter_mut().find(|item| item.id() == record.id()) {
                Some(existing) => *existing = record,
                None => items.push(record),
            }
        }
        self.save(&items)
    }

    /// Loads students from a CSV file with `name,rollNumber,branch,batch,email,phone`
    /// headers. Rows whose roll number is already known are skipped.
    pub fn import_students_csv(&self, csv_path: &Path) -> Result<usize, StoreError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CsvRow {
            name: String,
            roll_number: String,
            branch: String,
            batch: String,
            #[serde(default)]
            email: String,
            #[serde(default)]
            phone: String,
        }

        let mut reader = csv::Reader::from_path(csv_path)?;
        let mut students = self.students()?;
        let mut inserted = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            if row.name.trim().is_empty() || row.roll_number.trim().is_empty() {
                continue;
            }
            if students
                .iter()
                .any(|student| student.roll_number == row.roll_number)
            {
                continue;
            }

            students.push(Student {
                id: Uuid::new_v4().to_string(),
                name: row.name,
                roll_number: row.roll_number,
                branch: row.branch,
                batch: row.batch,
                email: row.email,
                phone: row.phone,
            });
            inserted += 1;
        }

        if inserted > 0 {
            self.save(&students)?;
        }
        info!(inserted, path = %csv_path.display(), "imported students");
        Ok(inserted)
    }
}

impl PlacementStore for JsonStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            students: self.students()?,
            offers: self.offers()?,
            companies: self.companies()?,
            inputs: self.inputs()?,
        })
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn validate_student(student: &Student) -> Result<(), StoreError> {
    require(Student::KIND, "name", &student.name)?;
    require(Student::KIND, "rollNumber", &student.roll_number)
}

fn validate_company(company: &Company) -> Result<(), StoreError> {
    require(Company::KIND, "name", &company.name)?;
    require(Company::KIND, "industry", &company.industry)
}

fn validate_offer(offer: &Offer) -> Result<(), StoreError> {
    require(Offer::KIND, "studentId", &offer.student_id)?;
    require(Offer::KIND, "companyName", &offer.company_name)?;
    require(Offer::KIND, "role", &offer.role)?;
    if !offer.package.is_finite() || offer.package < 0.0 {
        return Err(invalid(Offer::KIND, "package must be a non-negative number"));
    }
    Ok(())
}

fn seed_students() -> Vec<Student> {
    vec![
        Student {
            id: "1".to_string(),
            name: "Rahul Sharma".to_string(),
            roll_number: "SVIT20CS001".to_string(),
            branch: "Computer Science".to_string(),
            batch: "2020-2024".to_string(),
            email: "rahul.sharma@example.com".to_string(),
            phone: "9876543210".to_string(),
        },
        Student {
            id: "2".to_string(),
            name: "Priya Patel".to_string(),
            roll_number: "SVIT20EC015".to_string(),
            branch: "Electronics".to_string(),
            batch: "2020-2024".to_string(),
            email: "priya.patel@example.com".to_string(),
            phone: "9876543211".to_string(),
        },
    ]
}

fn seed_offers() -> Vec<Offer> {
    vec![
        Offer {
            id: "1".to_string(),
            student_id: "1".to_string(),
            company_name: "TCS".to_string(),
            role: "Software Engineer".to_string(),
            package: 7.5,
            offer_date: "2023-12-10".to_string(),
            status: OfferStatus::Accepted,
            offer_letter: None,
        },
        Offer {
            id: "2".to_string(),
            student_id: "2".to_string(),
            company_name: "Infosys".to_string(),
            role: "Systems Engineer".to_string(),
            package: 6.5,
            offer_date: "2023-11-25".to_string(),
            status: OfferStatus::Pending,
            offer_letter: None,
        },
    ]
}

fn seed_companies() -> Vec<Company> {
    [
        ("1", "TCS", "hr@tcs.com"),
        ("2", "Infosys", "careers@infosys.com"),
        ("3", "Wipro", "recruitment@wipro.com"),
    ]
    .into_iter()
    .map(|(id, name, contact)| Company {
        id: id.to_string(),
        name: name.to_string(),
        industry: "IT Services".to_string(),
        contact: contact.to_string(),
    })
    .collect()
}
