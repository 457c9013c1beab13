use crate::schema;
use cie_domain::{ApplicationStatus, CampusRepository, CheckoutRequest, Course, Domain, DomainCoordinator,
                 DomainError, Enrollment, FacultyProfile, InventoryItem, InventoryKind, Opportunity,
                 OpportunityApplication, Project, ProjectRequest, RequestFilter, ReviewTicket, StudentProfile,
                 TicketKind, User, ACTIVE_STATUSES};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use uuid::Uuid;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
/// Base SQLite usada cuando no hay `CIE_DB_URL` ni `DATABASE_URL`.
pub const DEFAULT_SQLITE_URL: &str = "cie.db";

#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;

/// Pragmas por conexión para SQLite (cada conexión del pool los necesita).
#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;

#[cfg(not(feature = "pg"))]
impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(conn);
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

/// Repositorio Diesel que implementa `CampusRepository`. Un único pool por
/// proceso; clonar el repositorio comparte el pool.
#[derive(Clone)]
pub struct DieselCampusRepository {
  pool: Arc<DbPool>,
}

impl DieselCampusRepository {
  /// Crea el pool y aplica las migraciones pendientes.
  pub fn new(database_url: &str) -> Result<Self, DomainError> {
    check_url(database_url)?;
    let manager = ConnectionManager::<DbConn>::new(database_url);
    let builder = Pool::builder().max_size(4);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager).map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))?;
    let repo = DieselCampusRepository { pool: Arc::new(pool) };
    let mut conn = repo.conn()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| DomainError::ExternalError(format!("migrations: {}", e)))?;
    if !applied.is_empty() {
      log::info!("cie-persistence: {} migraciones aplicadas", applied.len());
    }
    drop(conn);
    Ok(repo)
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>, DomainError> {
    self.pool.get().map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
  }
}

/// Crear el repositorio desde las variables de entorno (`CIE_DB_URL`, luego
/// `DATABASE_URL`).
pub fn new_from_env() -> Result<DieselCampusRepository, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("CIE_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                       .unwrap_or_else(|_| DEFAULT_SQLITE_URL.to_string());
  DieselCampusRepository::new(&url)
}

#[cfg(feature = "pg")]
fn check_url(url: &str) -> Result<(), DomainError> {
  let l = url.to_lowercase();
  if l.starts_with("postgres") || l.contains('@') {
    Ok(())
  } else {
    Err(DomainError::ExternalError("CIE_DB_URL / DATABASE_URL does not look like a Postgres URL".into()))
  }
}

#[cfg(not(feature = "pg"))]
fn check_url(url: &str) -> Result<(), DomainError> {
  if url.to_lowercase().starts_with("postgres") {
    return Err(DomainError::ExternalError("cie-persistence was compiled without the 'pg' feature; enable it to \
                                           use Postgres"
                                                        .into()));
  }
  Ok(())
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, DomainError> {
  res.map_err(|e| DomainError::ExternalError(format!("db: {}", e)))
}

// Las violaciones de UNIQUE se traducen a `Duplicate` con el mensaje del
// dominio.
fn map_unique<T>(res: std::result::Result<T, DieselError>, msg: &str) -> Result<T, DomainError> {
  match res {
    Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(DomainError::Duplicate(msg.into())),
    other => map_db_err(other),
  }
}

fn millis(at: &DateTime<Utc>) -> i64 {
  at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DomainError> {
  Utc.timestamp_millis_opt(ms)
     .single()
     .ok_or_else(|| DomainError::SerializationError(format!("timestamp fuera de rango: {}", ms)))
}

fn opt_from_millis(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, DomainError> {
  ms.map(from_millis).transpose()
}

fn parse_id(s: &str) -> Result<Uuid, DomainError> {
  Ok(Uuid::parse_str(s)?)
}

fn opt_id(s: Option<String>) -> Result<Option<Uuid>, DomainError> {
  s.as_deref().map(parse_id).transpose()
}

fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DomainError::SerializationError(format!("fecha '{}': {}", s, e)))
}

// Filas Diesel. El orden de los campos sigue al de `schema.rs`.
#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::users, treat_none_as_null = true)]
struct UserRow {
  id: String,
  email: String,
  name: String,
  role: String,
  password_hash: String,
  created_at: i64,
}

impl From<&User> for UserRow {
  fn from(u: &User) -> Self {
    Self { id: u.id.to_string(),
           email: u.email.clone(),
           name: u.name.clone(),
           role: u.role.as_str().to_string(),
           password_hash: u.password_hash.clone(),
           created_at: millis(&u.created_at) }
  }
}

impl TryFrom<UserRow> for User {
  type Error = DomainError;

  fn try_from(r: UserRow) -> Result<Self, Self::Error> {
    Ok(User { id: parse_id(&r.id)?,
              email: r.email,
              name: r.name,
              role: r.role.parse()?,
              password_hash: r.password_hash,
              created_at: from_millis(r.created_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::faculty_profiles, primary_key(user_id), treat_none_as_null = true)]
struct FacultyProfileRow {
  user_id: String,
  department: Option<String>,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::student_profiles, primary_key(user_id), treat_none_as_null = true)]
struct StudentProfileRow {
  user_id: String,
  student_number: Option<String>,
  program: Option<String>,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::inventory_items, treat_none_as_null = true)]
struct ItemRow {
  id: String,
  kind: String,
  name: String,
  description: String,
  specification: Option<String>,
  category: String,
  location: String,
  total_quantity: i64,
  tag_id: Option<String>,
  domain_id: Option<String>,
  invoice_number: Option<String>,
  purchase_value: Option<f64>,
  purchase_currency: String,
  purchase_date: Option<String>,
  created_by: String,
  created_at: i64,
  updated_at: i64,
}

impl From<&InventoryItem> for ItemRow {
  fn from(i: &InventoryItem) -> Self {
    Self { id: i.id.to_string(),
           kind: i.kind.as_str().to_string(),
           name: i.name.clone(),
           description: i.description.clone(),
           specification: i.specification.clone(),
           category: i.category.clone(),
           location: i.location.clone(),
           total_quantity: i.total_quantity,
           tag_id: i.tag_id.clone(),
           domain_id: i.domain_id.map(|d| d.to_string()),
           invoice_number: i.invoice_number.clone(),
           purchase_value: i.purchase_value,
           purchase_currency: i.purchase_currency.clone(),
           purchase_date: i.purchase_date.map(|d| d.to_string()),
           created_by: i.created_by.clone(),
           created_at: millis(&i.created_at),
           updated_at: millis(&i.updated_at) }
  }
}

impl TryFrom<ItemRow> for InventoryItem {
  type Error = DomainError;

  fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
    Ok(InventoryItem { id: parse_id(&r.id)?,
                       kind: r.kind.parse()?,
                       name: r.name,
                       description: r.description,
                       specification: r.specification,
                       category: r.category,
                       location: r.location,
                       total_quantity: r.total_quantity,
                       tag_id: r.tag_id,
                       domain_id: opt_id(r.domain_id)?,
                       invoice_number: r.invoice_number,
                       purchase_value: r.purchase_value,
                       purchase_currency: r.purchase_currency,
                       purchase_date: r.purchase_date.as_deref().map(parse_date).transpose()?,
                       created_by: r.created_by,
                       created_at: from_millis(r.created_at)?,
                       updated_at: from_millis(r.updated_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::checkout_requests, treat_none_as_null = true)]
struct RequestRow {
  id: String,
  kind: String,
  item_id: String,
  student_id: String,
  status: String,
  purpose: Option<String>,
  notes: Option<String>,
  faculty_notes: Option<String>,
  approved_by: Option<String>,
  approved_at: Option<i64>,
  collected_at: Option<i64>,
  returned_at: Option<i64>,
  requested_at: i64,
  updated_at: i64,
}

impl From<&CheckoutRequest> for RequestRow {
  fn from(r: &CheckoutRequest) -> Self {
    Self { id: r.id.to_string(),
           kind: r.kind.as_str().to_string(),
           item_id: r.item_id.to_string(),
           student_id: r.student_id.to_string(),
           status: r.status.as_str().to_string(),
           purpose: r.purpose.clone(),
           notes: r.notes.clone(),
           faculty_notes: r.faculty_notes.clone(),
           approved_by: r.approved_by.map(|a| a.to_string()),
           approved_at: r.approved_at.as_ref().map(millis),
           collected_at: r.collected_at.as_ref().map(millis),
           returned_at: r.returned_at.as_ref().map(millis),
           requested_at: millis(&r.requested_at),
           updated_at: millis(&r.updated_at) }
  }
}

impl TryFrom<RequestRow> for CheckoutRequest {
  type Error = DomainError;

  fn try_from(r: RequestRow) -> Result<Self, Self::Error> {
    Ok(CheckoutRequest { id: parse_id(&r.id)?,
                         kind: r.kind.parse()?,
                         item_id: parse_id(&r.item_id)?,
                         student_id: parse_id(&r.student_id)?,
                         status: r.status.parse()?,
                         purpose: r.purpose,
                         notes: r.notes,
                         faculty_notes: r.faculty_notes,
                         approved_by: opt_id(r.approved_by)?,
                         approved_at: opt_from_millis(r.approved_at)?,
                         collected_at: opt_from_millis(r.collected_at)?,
                         returned_at: opt_from_millis(r.returned_at)?,
                         requested_at: from_millis(r.requested_at)?,
                         updated_at: from_millis(r.updated_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::review_tickets, treat_none_as_null = true)]
struct TicketRow {
  id: String,
  kind: String,
  title: String,
  description: String,
  category: Option<String>,
  image: Option<String>,
  created_by: String,
  status: String,
  approved_by: Option<String>,
  approved_at: Option<i64>,
  completed_at: Option<i64>,
  rejection_reason: Option<String>,
  rectified_image: Option<String>,
  created_at: i64,
  updated_at: i64,
}

impl From<&ReviewTicket> for TicketRow {
  fn from(t: &ReviewTicket) -> Self {
    Self { id: t.id.to_string(),
           kind: t.kind.as_str().to_string(),
           title: t.title.clone(),
           description: t.description.clone(),
           category: t.category.clone(),
           image: t.image.clone(),
           created_by: t.created_by.to_string(),
           status: t.status.as_str().to_string(),
           approved_by: t.approved_by.map(|a| a.to_string()),
           approved_at: t.approved_at.as_ref().map(millis),
           completed_at: t.completed_at.as_ref().map(millis),
           rejection_reason: t.rejection_reason.clone(),
           rectified_image: t.rectified_image.clone(),
           created_at: millis(&t.created_at),
           updated_at: millis(&t.updated_at) }
  }
}

impl TryFrom<TicketRow> for ReviewTicket {
  type Error = DomainError;

  fn try_from(r: TicketRow) -> Result<Self, Self::Error> {
    Ok(ReviewTicket { id: parse_id(&r.id)?,
                      kind: r.kind.parse()?,
                      title: r.title,
                      description: r.description,
                      category: r.category,
                      image: r.image,
                      created_by: parse_id(&r.created_by)?,
                      status: r.status.parse()?,
                      approved_by: opt_id(r.approved_by)?,
                      approved_at: opt_from_millis(r.approved_at)?,
                      completed_at: opt_from_millis(r.completed_at)?,
                      rejection_reason: r.rejection_reason,
                      rectified_image: r.rectified_image,
                      created_at: from_millis(r.created_at)?,
                      updated_at: from_millis(r.updated_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::opportunities, treat_none_as_null = true)]
struct OpportunityRow {
  id: String,
  title: String,
  opportunity_type: String,
  description: String,
  start_date: String,
  end_date: String,
  application_start_date: String,
  application_end_date: String,
  remuneration: Option<String>,
  capacity: i64,
  faculty_id: String,
  status: String,
  created_at: i64,
  updated_at: i64,
  accepted_at: Option<i64>,
}

impl From<&Opportunity> for OpportunityRow {
  fn from(o: &Opportunity) -> Self {
    Self { id: o.id.to_string(),
           title: o.title.clone(),
           opportunity_type: o.opportunity_type.clone(),
           description: o.description.clone(),
           start_date: o.start_date.to_string(),
           end_date: o.end_date.to_string(),
           application_start_date: o.application_start_date.to_string(),
           application_end_date: o.application_end_date.to_string(),
           remuneration: o.remuneration.clone(),
           capacity: o.capacity,
           faculty_id: o.faculty_id.to_string(),
           status: o.status.as_str().to_string(),
           created_at: millis(&o.created_at),
           updated_at: millis(&o.updated_at),
           accepted_at: o.accepted_at.as_ref().map(millis) }
  }
}

impl TryFrom<OpportunityRow> for Opportunity {
  type Error = DomainError;

  fn try_from(r: OpportunityRow) -> Result<Self, Self::Error> {
    Ok(Opportunity { id: parse_id(&r.id)?,
                     title: r.title,
                     opportunity_type: r.opportunity_type,
                     description: r.description,
                     start_date: parse_date(&r.start_date)?,
                     end_date: parse_date(&r.end_date)?,
                     application_start_date: parse_date(&r.application_start_date)?,
                     application_end_date: parse_date(&r.application_end_date)?,
                     remuneration: r.remuneration,
                     capacity: r.capacity,
                     faculty_id: parse_id(&r.faculty_id)?,
                     status: r.status.parse()?,
                     accepted: r.accepted_at.is_some(),
                     accepted_at: opt_from_millis(r.accepted_at)?,
                     created_at: from_millis(r.created_at)?,
                     updated_at: from_millis(r.updated_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::opportunity_applications)]
struct ApplicationRow {
  id: String,
  opportunity_id: String,
  student_id: String,
  status: String,
  resume_name: String,
  resume_key: String,
  applied_at: i64,
  updated_at: i64,
}

impl From<&OpportunityApplication> for ApplicationRow {
  fn from(a: &OpportunityApplication) -> Self {
    Self { id: a.id.to_string(),
           opportunity_id: a.opportunity_id.to_string(),
           student_id: a.student_id.to_string(),
           status: a.status.as_str().to_string(),
           resume_name: a.resume_name.clone(),
           resume_key: a.resume_key.clone(),
           applied_at: millis(&a.applied_at),
           updated_at: millis(&a.updated_at) }
  }
}

impl TryFrom<ApplicationRow> for OpportunityApplication {
  type Error = DomainError;

  fn try_from(r: ApplicationRow) -> Result<Self, Self::Error> {
    Ok(OpportunityApplication { id: parse_id(&r.id)?,
                                opportunity_id: parse_id(&r.opportunity_id)?,
                                student_id: parse_id(&r.student_id)?,
                                status: r.status.parse()?,
                                resume_name: r.resume_name,
                                resume_key: r.resume_key,
                                applied_at: from_millis(r.applied_at)?,
                                updated_at: from_millis(r.updated_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::domains, treat_none_as_null = true)]
struct DomainRow {
  id: String,
  name: String,
  description: Option<String>,
  created_at: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::domain_coordinators)]
struct CoordinatorRow {
  id: String,
  domain_id: String,
  faculty_id: String,
  assigned_by: String,
  assigned_at: i64,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::courses, treat_none_as_null = true)]
struct CourseRow {
  id: String,
  code: String,
  name: String,
  description: Option<String>,
  faculty_id: String,
  created_at: i64,
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::enrollments, treat_none_as_null = true)]
struct EnrollmentRow {
  id: String,
  course_id: String,
  student_id: String,
  section: String,
  grade: Option<String>,
  enrolled_at: i64,
}

impl From<&Enrollment> for EnrollmentRow {
  fn from(e: &Enrollment) -> Self {
    Self { id: e.id.to_string(),
           course_id: e.course_id.to_string(),
           student_id: e.student_id.to_string(),
           section: e.section.clone(),
           grade: e.grade.clone(),
           enrolled_at: millis(&e.enrolled_at) }
  }
}

impl TryFrom<EnrollmentRow> for Enrollment {
  type Error = DomainError;

  fn try_from(r: EnrollmentRow) -> Result<Self, Self::Error> {
    Ok(Enrollment { id: parse_id(&r.id)?,
                    course_id: parse_id(&r.course_id)?,
                    student_id: parse_id(&r.student_id)?,
                    section: r.section,
                    grade: r.grade,
                    enrolled_at: from_millis(r.enrolled_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::projects, treat_none_as_null = true)]
struct ProjectRow {
  id: String,
  name: String,
  description: String,
  /// Ids separados por comas.
  components_needed: String,
  expected_completion_date: String,
  kind: String,
  status: String,
  created_by: String,
  created_at: i64,
  modified_by: Option<String>,
  modified_at: i64,
}

impl From<&Project> for ProjectRow {
  fn from(p: &Project) -> Self {
    Self { id: p.id.to_string(),
           name: p.name.clone(),
           description: p.description.clone(),
           components_needed: p.components_needed.iter().map(Uuid::to_string).collect::<Vec<_>>().join(","),
           expected_completion_date: p.expected_completion_date.to_string(),
           kind: p.kind.as_str().to_string(),
           status: p.status.as_str().to_string(),
           created_by: p.created_by.to_string(),
           created_at: millis(&p.created_at),
           modified_by: p.modified_by.map(|u| u.to_string()),
           modified_at: millis(&p.modified_at) }
  }
}

impl TryFrom<ProjectRow> for Project {
  type Error = DomainError;

  fn try_from(r: ProjectRow) -> Result<Self, Self::Error> {
    let components_needed = r.components_needed
                             .split(',')
                             .filter(|s| !s.is_empty())
                             .map(parse_id)
                             .collect::<Result<Vec<_>, _>>()?;
    Ok(Project { id: parse_id(&r.id)?,
                 name: r.name,
                 description: r.description,
                 components_needed,
                 expected_completion_date: parse_date(&r.expected_completion_date)?,
                 kind: r.kind.parse()?,
                 status: r.status.parse()?,
                 created_by: parse_id(&r.created_by)?,
                 created_at: from_millis(r.created_at)?,
                 modified_by: opt_id(r.modified_by)?,
                 modified_at: from_millis(r.modified_at)? })
  }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::project_requests, treat_none_as_null = true)]
struct ProjectRequestRow {
  id: String,
  project_id: String,
  student_id: String,
  faculty_id: String,
  status: String,
  student_notes: Option<String>,
  faculty_notes: Option<String>,
  request_date: i64,
  accepted_date: Option<i64>,
  rejected_date: Option<i64>,
}

impl From<&ProjectRequest> for ProjectRequestRow {
  fn from(r: &ProjectRequest) -> Self {
    Self { id: r.id.to_string(),
           project_id: r.project_id.to_string(),
           student_id: r.student_id.to_string(),
           faculty_id: r.faculty_id.to_string(),
           status: r.status.as_str().to_string(),
           student_notes: r.student_notes.clone(),
           faculty_notes: r.faculty_notes.clone(),
           request_date: millis(&r.request_date),
           accepted_date: r.accepted_date.as_ref().map(millis),
           rejected_date: r.rejected_date.as_ref().map(millis) }
  }
}

impl TryFrom<ProjectRequestRow> for ProjectRequest {
  type Error = DomainError;

  fn try_from(r: ProjectRequestRow) -> Result<Self, Self::Error> {
    Ok(ProjectRequest { id: parse_id(&r.id)?,
                        project_id: parse_id(&r.project_id)?,
                        student_id: parse_id(&r.student_id)?,
                        faculty_id: parse_id(&r.faculty_id)?,
                        status: r.status.parse()?,
                        student_notes: r.student_notes,
                        faculty_notes: r.faculty_notes,
                        request_date: from_millis(r.request_date)?,
                        accepted_date: opt_from_millis(r.accepted_date)?,
                        rejected_date: opt_from_millis(r.rejected_date)? })
  }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DomainError>
  where T: TryFrom<R, Error = DomainError>
{
  rows.into_iter().map(T::try_from).collect()
}

impl CampusRepository for DieselCampusRepository {
  fn insert_user(&self, user: &User) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let row = UserRow::from(user);
    map_unique(diesel::insert_into(schema::users::table).values(&row).execute(&mut conn),
               "A user with this email already exists")?;
    Ok(())
  }

  fn get_user(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
    use schema::users::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::users.filter(dsl::id.eq(id.to_string())).first::<UserRow>(&mut conn).optional())?;
    row.map(User::try_from).transpose()
  }

  fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
    use schema::users::dsl;
    let mut conn = self.conn()?;
    let email = email.trim().to_lowercase();
    let row = map_db_err(dsl::users.filter(dsl::email.eq(email)).first::<UserRow>(&mut conn).optional())?;
    row.map(User::try_from).transpose()
  }

  fn list_users(&self) -> Result<Vec<User>, DomainError> {
    use schema::users::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::users.order(dsl::created_at.desc()).load::<UserRow>(&mut conn))?;
    convert_all(rows)
  }

  fn save_faculty_profile(&self, profile: &FacultyProfile) -> Result<(), DomainError> {
    use schema::faculty_profiles::dsl;
    let mut conn = self.conn()?;
    let row = FacultyProfileRow { user_id: profile.user_id.to_string(), department: profile.department.clone() };
    map_db_err(diesel::insert_into(dsl::faculty_profiles).values(&row)
                                                         .on_conflict(dsl::user_id)
                                                         .do_update()
                                                         .set(&row)
                                                         .execute(&mut conn))?;
    Ok(())
  }

  fn get_faculty_profile(&self, user_id: &Uuid) -> Result<Option<FacultyProfile>, DomainError> {
    use schema::faculty_profiles::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::faculty_profiles.filter(dsl::user_id.eq(user_id.to_string()))
                                              .first::<FacultyProfileRow>(&mut conn)
                                              .optional())?;
    row.map(|r| Ok(FacultyProfile { user_id: parse_id(&r.user_id)?, department: r.department })).transpose()
  }

  fn save_student_profile(&self, profile: &StudentProfile) -> Result<(), DomainError> {
    use schema::student_profiles::dsl;
    let mut conn = self.conn()?;
    let row = StudentProfileRow { user_id: profile.user_id.to_string(),
                                  student_number: profile.student_number.clone(),
                                  program: profile.program.clone() };
    map_db_err(diesel::insert_into(dsl::student_profiles).values(&row)
                                                         .on_conflict(dsl::user_id)
                                                         .do_update()
                                                         .set(&row)
                                                         .execute(&mut conn))?;
    Ok(())
  }

  fn get_student_profile(&self, user_id: &Uuid) -> Result<Option<StudentProfile>, DomainError> {
    use schema::student_profiles::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::student_profiles.filter(dsl::user_id.eq(user_id.to_string()))
                                              .first::<StudentProfileRow>(&mut conn)
                                              .optional())?;
    row.map(|r| {
         Ok(StudentProfile { user_id: parse_id(&r.user_id)?, student_number: r.student_number, program: r.program })
       })
       .transpose()
  }

  fn save_item(&self, item: &InventoryItem) -> Result<(), DomainError> {
    use schema::inventory_items::dsl;
    let mut conn = self.conn()?;
    let row = ItemRow::from(item);
    map_db_err(diesel::insert_into(dsl::inventory_items).values(&row)
                                                        .on_conflict(dsl::id)
                                                        .do_update()
                                                        .set(&row)
                                                        .execute(&mut conn))?;
    Ok(())
  }

  fn get_item(&self, id: &Uuid) -> Result<Option<InventoryItem>, DomainError> {
    use schema::inventory_items::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::inventory_items.filter(dsl::id.eq(id.to_string())).first::<ItemRow>(&mut conn).optional())?;
    row.map(InventoryItem::try_from).transpose()
  }

  fn list_items(&self, kind: InventoryKind) -> Result<Vec<InventoryItem>, DomainError> {
    use schema::inventory_items::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::inventory_items.filter(dsl::kind.eq(kind.as_str()))
                                              .order(dsl::name.asc())
                                              .load::<ItemRow>(&mut conn))?;
    convert_all(rows)
  }

  fn delete_item(&self, id: &Uuid) -> Result<bool, DomainError> {
    use schema::{checkout_requests, inventory_items};
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let removed = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                                   diesel::delete(checkout_requests::table.filter(checkout_requests::item_id.eq(&id_s)))
                                     .execute(conn)?;
                                   diesel::delete(inventory_items::table.filter(inventory_items::id.eq(&id_s))).execute(conn)
                                 }))?;
    Ok(removed > 0)
  }

  fn save_request(&self, request: &CheckoutRequest) -> Result<(), DomainError> {
    use schema::checkout_requests::dsl;
    let mut conn = self.conn()?;
    let row = RequestRow::from(request);
    map_db_err(diesel::insert_into(dsl::checkout_requests).values(&row)
                                                          .on_conflict(dsl::id)
                                                          .do_update()
                                                          .set(&row)
                                                          .execute(&mut conn))?;
    Ok(())
  }

  fn get_request(&self, id: &Uuid) -> Result<Option<CheckoutRequest>, DomainError> {
    use schema::checkout_requests::dsl;
    let mut conn = self.conn()?;
    let row =
      map_db_err(dsl::checkout_requests.filter(dsl::id.eq(id.to_string())).first::<RequestRow>(&mut conn).optional())?;
    row.map(CheckoutRequest::try_from).transpose()
  }

  fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<CheckoutRequest>, DomainError> {
    use schema::{checkout_requests::dsl, inventory_items};
    let mut conn = self.conn()?;
    let mut query = dsl::checkout_requests.filter(dsl::kind.eq(filter.kind.as_str())).into_boxed();
    if let Some(student) = filter.student_id {
      query = query.filter(dsl::student_id.eq(student.to_string()));
    }
    if let Some(item) = filter.item_id {
      query = query.filter(dsl::item_id.eq(item.to_string()));
    }
    if let Some(status) = filter.status {
      query = query.filter(dsl::status.eq(status.as_str()));
    }
    if let Some(scope) = &filter.scope {
      // ítems del tipo cuyo dominio cae dentro del alcance
      let items = map_db_err(inventory_items::table.filter(inventory_items::kind.eq(filter.kind.as_str()))
                                                   .select((inventory_items::id, inventory_items::domain_id))
                                                   .load::<(String, Option<String>)>(&mut conn))?;
      let mut in_scope = Vec::new();
      for (item_id, domain_id) in items {
        if scope.contains(opt_id(domain_id)?) {
          in_scope.push(item_id);
        }
      }
      query = query.filter(dsl::item_id.eq_any(in_scope));
    }
    let rows = map_db_err(query.order(dsl::requested_at.desc()).load::<RequestRow>(&mut conn))?;
    convert_all(rows)
  }

  fn count_active_requests(&self, item_id: &Uuid) -> Result<i64, DomainError> {
    use schema::checkout_requests::dsl;
    let mut conn = self.conn()?;
    let active: Vec<&str> = ACTIVE_STATUSES.iter().map(|s| s.as_str()).collect();
    map_db_err(dsl::checkout_requests.filter(dsl::item_id.eq(item_id.to_string()))
                                     .filter(dsl::status.eq_any(active))
                                     .count()
                                     .get_result::<i64>(&mut conn))
  }

  fn save_ticket(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
    use schema::review_tickets::dsl;
    let mut conn = self.conn()?;
    let row = TicketRow::from(ticket);
    map_db_err(diesel::insert_into(dsl::review_tickets).values(&row)
                                                       .on_conflict(dsl::id)
                                                       .do_update()
                                                       .set(&row)
                                                       .execute(&mut conn))?;
    Ok(())
  }

  fn get_ticket(&self, id: &Uuid) -> Result<Option<ReviewTicket>, DomainError> {
    use schema::review_tickets::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::review_tickets.filter(dsl::id.eq(id.to_string())).first::<TicketRow>(&mut conn).optional())?;
    row.map(ReviewTicket::try_from).transpose()
  }

  fn list_tickets(&self, kind: TicketKind, created_by: Option<Uuid>) -> Result<Vec<ReviewTicket>, DomainError> {
    use schema::review_tickets::dsl;
    let mut conn = self.conn()?;
    let mut query = dsl::review_tickets.filter(dsl::kind.eq(kind.as_str())).into_boxed();
    if let Some(author) = created_by {
      query = query.filter(dsl::created_by.eq(author.to_string()));
    }
    let rows = map_db_err(query.order(dsl::created_at.desc()).load::<TicketRow>(&mut conn))?;
    convert_all(rows)
  }

  fn save_opportunity(&self, opportunity: &Opportunity) -> Result<(), DomainError> {
    use schema::opportunities::dsl;
    let mut conn = self.conn()?;
    let row = OpportunityRow::from(opportunity);
    map_db_err(diesel::insert_into(dsl::opportunities).values(&row)
                                                      .on_conflict(dsl::id)
                                                      .do_update()
                                                      .set(&row)
                                                      .execute(&mut conn))?;
    Ok(())
  }

  fn get_opportunity(&self, id: &Uuid) -> Result<Option<Opportunity>, DomainError> {
    use schema::opportunities::dsl;
    let mut conn = self.conn()?;
    let row =
      map_db_err(dsl::opportunities.filter(dsl::id.eq(id.to_string())).first::<OpportunityRow>(&mut conn).optional())?;
    row.map(Opportunity::try_from).transpose()
  }

  fn list_opportunities(&self) -> Result<Vec<Opportunity>, DomainError> {
    use schema::opportunities::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::opportunities.order(dsl::created_at.desc()).load::<OpportunityRow>(&mut conn))?;
    convert_all(rows)
  }

  fn delete_opportunity(&self, id: &Uuid) -> Result<bool, DomainError> {
    use schema::{opportunities, opportunity_applications};
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let removed = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                                   diesel::delete(opportunity_applications::table.filter(
                                     opportunity_applications::opportunity_id.eq(&id_s),
                                   ))
                                   .execute(conn)?;
                                   diesel::delete(opportunities::table.filter(opportunities::id.eq(&id_s))).execute(conn)
                                 }))?;
    Ok(removed > 0)
  }

  fn insert_application(&self, application: &OpportunityApplication) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let row = ApplicationRow::from(application);
    map_unique(diesel::insert_into(schema::opportunity_applications::table).values(&row).execute(&mut conn),
               "Already applied to this opportunity.")?;
    Ok(())
  }

  fn update_application(&self, application: &OpportunityApplication) -> Result<(), DomainError> {
    use schema::opportunity_applications::dsl;
    let mut conn = self.conn()?;
    let row = ApplicationRow::from(application);
    let n = map_db_err(diesel::update(dsl::opportunity_applications.filter(dsl::id.eq(&row.id))).set(&row)
                                                                                                .execute(&mut conn))?;
    if n == 0 {
      return Err(DomainError::NotFound("Application not found".to_string()));
    }
    Ok(())
  }

  fn get_application(&self, id: &Uuid) -> Result<Option<OpportunityApplication>, DomainError> {
    use schema::opportunity_applications::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::opportunity_applications.filter(dsl::id.eq(id.to_string()))
                                                      .first::<ApplicationRow>(&mut conn)
                                                      .optional())?;
    row.map(OpportunityApplication::try_from).transpose()
  }

  fn find_application(&self,
                      opportunity_id: &Uuid,
                      student_id: &Uuid)
                      -> Result<Option<OpportunityApplication>, DomainError> {
    use schema::opportunity_applications::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::opportunity_applications.filter(dsl::opportunity_id.eq(opportunity_id.to_string()))
                                                      .filter(dsl::student_id.eq(student_id.to_string()))
                                                      .first::<ApplicationRow>(&mut conn)
                                                      .optional())?;
    row.map(OpportunityApplication::try_from).transpose()
  }

  fn list_applications(&self,
                       opportunity_id: Option<Uuid>,
                       student_id: Option<Uuid>)
                       -> Result<Vec<OpportunityApplication>, DomainError> {
    use schema::opportunity_applications::dsl;
    let mut conn = self.conn()?;
    let mut query = dsl::opportunity_applications.into_boxed();
    if let Some(o) = opportunity_id {
      query = query.filter(dsl::opportunity_id.eq(o.to_string()));
    }
    if let Some(s) = student_id {
      query = query.filter(dsl::student_id.eq(s.to_string()));
    }
    let rows = map_db_err(query.order(dsl::applied_at.desc()).load::<ApplicationRow>(&mut conn))?;
    convert_all(rows)
  }

  fn count_applications(&self, opportunity_id: &Uuid, status: ApplicationStatus) -> Result<i64, DomainError> {
    use schema::opportunity_applications::dsl;
    let mut conn = self.conn()?;
    map_db_err(dsl::opportunity_applications.filter(dsl::opportunity_id.eq(opportunity_id.to_string()))
                                            .filter(dsl::status.eq(status.as_str()))
                                            .count()
                                            .get_result::<i64>(&mut conn))
  }

  fn save_domain(&self, domain: &Domain) -> Result<(), DomainError> {
    use schema::domains::dsl;
    let mut conn = self.conn()?;
    let row = DomainRow { id: domain.id.to_string(),
                          name: domain.name.clone(),
                          description: domain.description.clone(),
                          created_at: millis(&domain.created_at) };
    map_db_err(diesel::insert_into(dsl::domains).values(&row)
                                                .on_conflict(dsl::id)
                                                .do_update()
                                                .set(&row)
                                                .execute(&mut conn))?;
    Ok(())
  }

  fn get_domain(&self, id: &Uuid) -> Result<Option<Domain>, DomainError> {
    use schema::domains::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::domains.filter(dsl::id.eq(id.to_string())).first::<DomainRow>(&mut conn).optional())?;
    row.map(domain_from_row).transpose()
  }

  fn list_domains(&self) -> Result<Vec<Domain>, DomainError> {
    use schema::domains::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::domains.order(dsl::name.asc()).load::<DomainRow>(&mut conn))?;
    rows.into_iter().map(domain_from_row).collect()
  }

  fn delete_domain(&self, id: &Uuid) -> Result<bool, DomainError> {
    use schema::{domain_coordinators, domains};
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let removed = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                                   diesel::delete(domain_coordinators::table.filter(domain_coordinators::domain_id.eq(&id_s)))
                                     .execute(conn)?;
                                   diesel::delete(domains::table.filter(domains::id.eq(&id_s))).execute(conn)
                                 }))?;
    Ok(removed > 0)
  }

  fn insert_coordinator(&self, coordinator: &DomainCoordinator) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let row = CoordinatorRow { id: coordinator.id.to_string(),
                               domain_id: coordinator.domain_id.to_string(),
                               faculty_id: coordinator.faculty_id.to_string(),
                               assigned_by: coordinator.assigned_by.to_string(),
                               assigned_at: millis(&coordinator.assigned_at) };
    map_unique(diesel::insert_into(schema::domain_coordinators::table).values(&row).execute(&mut conn),
               "This faculty is already a coordinator for this domain")?;
    Ok(())
  }

  fn list_coordinators(&self,
                       domain_id: Option<Uuid>,
                       faculty_id: Option<Uuid>)
                       -> Result<Vec<DomainCoordinator>, DomainError> {
    use schema::domain_coordinators::dsl;
    let mut conn = self.conn()?;
    let mut query = dsl::domain_coordinators.into_boxed();
    if let Some(d) = domain_id {
      query = query.filter(dsl::domain_id.eq(d.to_string()));
    }
    if let Some(f) = faculty_id {
      query = query.filter(dsl::faculty_id.eq(f.to_string()));
    }
    let rows = map_db_err(query.order(dsl::assigned_at.desc()).load::<CoordinatorRow>(&mut conn))?;
    rows.into_iter()
        .map(|r| {
          Ok(DomainCoordinator { id: parse_id(&r.id)?,
                                 domain_id: parse_id(&r.domain_id)?,
                                 faculty_id: parse_id(&r.faculty_id)?,
                                 assigned_by: parse_id(&r.assigned_by)?,
                                 assigned_at: from_millis(r.assigned_at)? })
        })
        .collect()
  }

  fn delete_coordinator(&self, id: &Uuid) -> Result<bool, DomainError> {
    use schema::domain_coordinators::dsl;
    let mut conn = self.conn()?;
    let n = map_db_err(diesel::delete(dsl::domain_coordinators.filter(dsl::id.eq(id.to_string()))).execute(&mut conn))?;
    Ok(n > 0)
  }

  fn save_course(&self, course: &Course) -> Result<(), DomainError> {
    use schema::courses::dsl;
    let mut conn = self.conn()?;
    let row = CourseRow { id: course.id.to_string(),
                          code: course.code.clone(),
                          name: course.name.clone(),
                          description: course.description.clone(),
                          faculty_id: course.faculty_id.to_string(),
                          created_at: millis(&course.created_at) };
    map_unique(diesel::insert_into(dsl::courses).values(&row)
                                                .on_conflict(dsl::id)
                                                .do_update()
                                                .set(&row)
                                                .execute(&mut conn),
               "A course with this code already exists")?;
    Ok(())
  }

  fn get_course(&self, id: &Uuid) -> Result<Option<Course>, DomainError> {
    use schema::courses::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::courses.filter(dsl::id.eq(id.to_string())).first::<CourseRow>(&mut conn).optional())?;
    row.map(course_from_row).transpose()
  }

  fn list_courses(&self) -> Result<Vec<Course>, DomainError> {
    use schema::courses::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::courses.order(dsl::code.asc()).load::<CourseRow>(&mut conn))?;
    rows.into_iter().map(course_from_row).collect()
  }

  fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let row = EnrollmentRow::from(enrollment);
    map_unique(diesel::insert_into(schema::enrollments::table).values(&row).execute(&mut conn),
               "Already enrolled in this course")?;
    Ok(())
  }

  fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
    use schema::enrollments::dsl;
    let mut conn = self.conn()?;
    let row = EnrollmentRow::from(enrollment);
    let n = map_db_err(diesel::update(dsl::enrollments.filter(dsl::id.eq(&row.id))).set(&row).execute(&mut conn))?;
    if n == 0 {
      return Err(DomainError::NotFound("Enrollment not found".to_string()));
    }
    Ok(())
  }

  fn get_enrollment(&self, id: &Uuid) -> Result<Option<Enrollment>, DomainError> {
    use schema::enrollments::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::enrollments.filter(dsl::id.eq(id.to_string())).first::<EnrollmentRow>(&mut conn).optional())?;
    row.map(Enrollment::try_from).transpose()
  }

  fn list_enrollments(&self,
                      course_id: Option<Uuid>,
                      student_id: Option<Uuid>)
                      -> Result<Vec<Enrollment>, DomainError> {
    use schema::enrollments::dsl;
    let mut conn = self.conn()?;
    let mut query = dsl::enrollments.into_boxed();
    if let Some(c) = course_id {
      query = query.filter(dsl::course_id.eq(c.to_string()));
    }
    if let Some(s) = student_id {
      query = query.filter(dsl::student_id.eq(s.to_string()));
    }
    let rows = map_db_err(query.order(dsl::enrolled_at.desc()).load::<EnrollmentRow>(&mut conn))?;
    convert_all(rows)
  }

  fn save_project(&self, project: &Project) -> Result<(), DomainError> {
    use schema::projects::dsl;
    let mut conn = self.conn()?;
    let row = ProjectRow::from(project);
    map_db_err(diesel::insert_into(dsl::projects).values(&row)
                                                 .on_conflict(dsl::id)
                                                 .do_update()
                                                 .set(&row)
                                                 .execute(&mut conn))?;
    Ok(())
  }

  fn get_project(&self, id: &Uuid) -> Result<Option<Project>, DomainError> {
    use schema::projects::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::projects.filter(dsl::id.eq(id.to_string())).first::<ProjectRow>(&mut conn).optional())?;
    row.map(Project::try_from).transpose()
  }

  fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
    use schema::projects::dsl;
    let mut conn = self.conn()?;
    let rows = map_db_err(dsl::projects.order(dsl::created_at.desc()).load::<ProjectRow>(&mut conn))?;
    convert_all(rows)
  }

  fn delete_project(&self, id: &Uuid) -> Result<bool, DomainError> {
    use schema::{project_requests, projects};
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let removed = map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                                   diesel::delete(project_requests::table.filter(project_requests::project_id.eq(&id_s)))
                                     .execute(conn)?;
                                   diesel::delete(projects::table.filter(projects::id.eq(&id_s))).execute(conn)
                                 }))?;
    Ok(removed > 0)
  }

  fn save_project_request(&self, request: &ProjectRequest) -> Result<(), DomainError> {
    use schema::project_requests::dsl;
    let mut conn = self.conn()?;
    let row = ProjectRequestRow::from(request);
    map_db_err(diesel::insert_into(dsl::project_requests).values(&row)
                                                         .on_conflict(dsl::id)
                                                         .do_update()
                                                         .set(&row)
                                                         .execute(&mut conn))?;
    Ok(())
  }

  fn get_project_request(&self, id: &Uuid) -> Result<Option<ProjectRequest>, DomainError> {
    use schema::project_requests::dsl;
    let mut conn = self.conn()?;
    let row = map_db_err(dsl::project_requests.filter(dsl::id.eq(id.to_string()))
                                              .first::<ProjectRequestRow>(&mut conn)
                                              .optional())?;
    row.map(ProjectRequest::try_from).transpose()
  }

  fn list_project_requests(&self,
                           project_id: Option<Uuid>,
                           student_id: Option<Uuid>,
                           faculty_id: Option<Uuid>)
                           -> Result<Vec<ProjectRequest>, DomainError> {
    use schema::project_requests::dsl;
    let mut conn = self.conn()?;
    let mut query = dsl::project_requests.into_boxed();
    if let Some(p) = project_id {
      query = query.filter(dsl::project_id.eq(p.to_string()));
    }
    if let Some(s) = student_id {
      query = query.filter(dsl::student_id.eq(s.to_string()));
    }
    if let Some(f) = faculty_id {
      query = query.filter(dsl::faculty_id.eq(f.to_string()));
    }
    let rows = map_db_err(query.order(dsl::request_date.desc()).load::<ProjectRequestRow>(&mut conn))?;
    convert_all(rows)
  }
}

fn domain_from_row(r: DomainRow) -> Result<Domain, DomainError> {
  Ok(Domain { id: parse_id(&r.id)?, name: r.name, description: r.description, created_at: from_millis(r.created_at)? })
}

fn course_from_row(r: CourseRow) -> Result<Course, DomainError> {
  Ok(Course { id: parse_id(&r.id)?,
              code: r.code,
              name: r.name,
              description: r.description,
              faculty_id: parse_id(&r.faculty_id)?,
              created_at: from_millis(r.created_at)? })
}
