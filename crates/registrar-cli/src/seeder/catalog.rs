//! Catalog seeding: departments, programs, teachers and courses.
//!
//! Rows are generated in parallel with Rayon and written with multi-value
//! INSERT statements inside a single transaction.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::boolean::en::Boolean;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use registrar_models::{CourseId, DepartmentId, ProgramId, Sex, TeacherId};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use super::models::{CatalogPerDepartment, CourseSeed, DepartmentSeed, ProgramSeed, TeacherSeed};
use super::placeholders;

const BATCH_SIZE: usize = 500;

/// Every Nth course is a general course offered to every program.
const GENERAL_COURSE_EVERY: usize = 5;

const SUBJECTS: [&str; 12] = [
    "Computing",
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "Economics",
    "Accounting",
    "History",
    "Linguistics",
    "Engineering",
    "Nursing",
    "Law",
];

const PROGRAM_KINDS: [&str; 4] = ["Diploma", "Certificate", "Foundation", "Advanced Diploma"];

/// Everything generated for one seeding run.
pub struct Catalog {
    pub departments: Vec<DepartmentSeed>,
    pub programs: Vec<ProgramSeed>,
    pub teachers: Vec<TeacherSeed>,
    pub courses: Vec<CourseSeed>,
}

/// Names stay unique across runs by carrying a short random suffix.
pub fn generate_departments(count: usize) -> Vec<DepartmentSeed> {
    let run: u32 = (1000..10000).fake();
    (0..count)
        .into_par_iter()
        .map(|i| DepartmentSeed {
            id: DepartmentId::new(),
            name: format!("{} {}-{}", SUBJECTS[i % SUBJECTS.len()], run, i + 1),
        })
        .collect()
}

pub fn generate_programs(
    departments: &[DepartmentSeed],
    per_department: usize,
) -> Vec<ProgramSeed> {
    departments
        .par_iter()
        .flat_map_iter(|department| {
            (0..per_department).map(move |i| ProgramSeed {
                id: ProgramId::new(),
                department_id: department.id,
                name: format!(
                    "{} in {}",
                    PROGRAM_KINDS[i % PROGRAM_KINDS.len()],
                    department.name
                ),
            })
        })
        .collect()
}

pub fn generate_teachers(departments: &[DepartmentSeed], per_department: usize) -> Vec<TeacherSeed> {
    let run: u32 = (1000..10000).fake();
    departments
        .par_iter()
        .enumerate()
        .flat_map_iter(|(d, department)| {
            (0..per_department).map(move |i| {
                let first: String = FirstName().fake();
                let last: String = LastName().fake();
                let building: String = BuildingNumber().fake();
                let street: String = StreetName().fake();
                let city: String = CityName().fake();
                let is_female: bool = Boolean(50).fake();
                let serial = d * per_department + i + 1;

                TeacherSeed {
                    id: TeacherId::new(),
                    name: format!("{} {}", first, last),
                    email: format!(
                        "{}.{}.{}{}@staff.registrar.test",
                        first.to_lowercase(),
                        last.to_lowercase(),
                        run,
                        serial
                    ),
                    phone: PhoneNumber().fake(),
                    address: format!("{} {}, {}", building, street, city),
                    sex: if is_female { Sex::Female } else { Sex::Male },
                    staff_number: format!("STF{}{:04}", run, serial),
                    department_id: department.id,
                }
            })
        })
        .collect()
}

/// Courses are attached to a program and to up to two teachers of the same
/// department. General courses get no program links.
pub fn generate_courses(
    programs: &[ProgramSeed],
    teachers: &[TeacherSeed],
    per_program: usize,
) -> Vec<CourseSeed> {
    programs
        .par_iter()
        .enumerate()
        .flat_map_iter(|(p, program)| {
            let staff: Vec<TeacherId> = teachers
                .iter()
                .filter(|t| t.department_id == program.department_id)
                .map(|t| t.id)
                .collect();

            (0..per_program).map(move |i| {
                let serial = p * per_program + i;
                let is_general = serial % GENERAL_COURSE_EVERY == GENERAL_COURSE_EVERY - 1;
                let teacher_ids = if staff.is_empty() {
                    Vec::new()
                } else {
                    let first = serial % staff.len();
                    let mut ids = vec![staff[first]];
                    if staff.len() > 1 && i % 2 == 0 {
                        ids.push(staff[(first + 1) % staff.len()]);
                    }
                    ids
                };

                CourseSeed {
                    id: CourseId::new(),
                    name: format!("{} {}", program.name, i + 1),
                    code: format!("{}{:03}", if is_general { "GEN" } else { "CRS" }, serial + 101),
                    credit_unit: (1..=4).fake(),
                    semester: if i % 2 == 0 { "First" } else { "Second" }.to_string(),
                    is_general,
                    program_ids: if is_general { Vec::new() } else { vec![program.id] },
                    teacher_ids,
                }
            })
        })
        .collect()
}

pub fn generate_catalog(num_departments: usize, per_department: &CatalogPerDepartment) -> Catalog {
    let departments = generate_departments(num_departments);
    let programs = generate_programs(&departments, per_department.programs);
    let teachers = generate_teachers(&departments, per_department.teachers);
    let courses = generate_courses(&programs, &teachers, per_department.courses_per_program);

    Catalog {
        departments,
        programs,
        teachers,
        courses,
    }
}

/// Generates and inserts a catalog for `num_departments` departments.
pub async fn seed_catalog(
    db: &PgPool,
    num_departments: usize,
    per_department: &CatalogPerDepartment,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏛️  Seeding {} departments with programs, teachers and courses...", num_departments);

    let catalog = generate_catalog(num_departments, per_department);
    insert_catalog(db, &catalog).await?;

    println!(
        "   ✓ Inserted {} departments, {} programs, {} teachers and {} courses in {:?}",
        catalog.departments.len(),
        catalog.programs.len(),
        catalog.teachers.len(),
        catalog.courses.len(),
        start_time.elapsed()
    );

    Ok(catalog)
}

pub async fn insert_catalog(
    db: &PgPool,
    catalog: &Catalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    for chunk in catalog.departments.chunks(BATCH_SIZE) {
        insert_departments_chunk(&mut tx, chunk).await?;
    }
    for chunk in catalog.programs.chunks(BATCH_SIZE) {
        insert_programs_chunk(&mut tx, chunk).await?;
    }
    for chunk in catalog.teachers.chunks(BATCH_SIZE) {
        insert_teachers_chunk(&mut tx, chunk).await?;
    }
    for chunk in catalog.courses.chunks(BATCH_SIZE) {
        insert_courses_chunk(&mut tx, chunk).await?;
    }

    let program_links: Vec<(CourseId, ProgramId)> = catalog
        .courses
        .iter()
        .flat_map(|c| c.program_ids.iter().map(move |&p| (c.id, p)))
        .collect();
    for chunk in program_links.chunks(BATCH_SIZE) {
        insert_links_chunk(&mut tx, "course_programs", "program_id", chunk).await?;
    }

    let teacher_links: Vec<(CourseId, TeacherId)> = catalog
        .courses
        .iter()
        .flat_map(|c| c.teacher_ids.iter().map(move |&t| (c.id, t)))
        .collect();
    for chunk in teacher_links.chunks(BATCH_SIZE) {
        insert_links_chunk(&mut tx, "course_teachers", "teacher_id", chunk).await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn insert_departments_chunk(
    tx: &mut Transaction<'_, Postgres>,
    departments: &[DepartmentSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if departments.is_empty() {
        return Ok(());
    }

    let query = format!(
        "INSERT INTO departments (id, name) VALUES {}",
        placeholders(departments.len(), 2)
    );
    let mut q = sqlx::query(&query);
    for department in departments {
        q = q.bind(department.id).bind(&department.name);
    }
    q.execute(&mut **tx).await?;
    Ok(())
}

async fn insert_programs_chunk(
    tx: &mut Transaction<'_, Postgres>,
    programs: &[ProgramSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if programs.is_empty() {
        return Ok(());
    }

    let query = format!(
        "INSERT INTO programs (id, department_id, name) VALUES {}",
        placeholders(programs.len(), 3)
    );
    let mut q = sqlx::query(&query);
    for program in programs {
        q = q
            .bind(program.id)
            .bind(program.department_id)
            .bind(&program.name);
    }
    q.execute(&mut **tx).await?;
    Ok(())
}

async fn insert_teachers_chunk(
    tx: &mut Transaction<'_, Postgres>,
    teachers: &[TeacherSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if teachers.is_empty() {
        return Ok(());
    }

    let query = format!(
        "INSERT INTO teachers (id, name, email, phone, address, sex, staff_number, department_id) VALUES {}",
        placeholders(teachers.len(), 8)
    );
    let mut q = sqlx::query(&query);
    for teacher in teachers {
        q = q
            .bind(teacher.id)
            .bind(&teacher.name)
            .bind(&teacher.email)
            .bind(&teacher.phone)
            .bind(&teacher.address)
            .bind(teacher.sex)
            .bind(&teacher.staff_number)
            .bind(teacher.department_id);
    }
    q.execute(&mut **tx).await?;
    Ok(())
}

async fn insert_courses_chunk(
    tx: &mut Transaction<'_, Postgres>,
    courses: &[CourseSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if courses.is_empty() {
        return Ok(());
    }

    let query = format!(
        "INSERT INTO courses (id, name, code, credit_unit, semester, is_general) VALUES {}",
        placeholders(courses.len(), 6)
    );
    let mut q = sqlx::query(&query);
    for course in courses {
        q = q
            .bind(course.id)
            .bind(&course.name)
            .bind(&course.code)
            .bind(course.credit_unit)
            .bind(&course.semester)
            .bind(course.is_general);
    }
    q.execute(&mut **tx).await?;
    Ok(())
}

async fn insert_links_chunk<T>(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    column: &str,
    links: &[(CourseId, T)],
) -> Result<(), Box<dyn std::error::Error>>
where
    T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Copy + Send + 'static,
{
    if links.is_empty() {
        return Ok(());
    }

    let query = format!(
        "INSERT INTO {} (course_id, {}) VALUES {}",
        table,
        column,
        placeholders(links.len(), 2)
    );
    let mut q = sqlx::query(&query);
    for &(course_id, other) in links {
        q = q.bind(course_id).bind(other);
    }
    q.execute(&mut **tx).await?;
    Ok(())
}
