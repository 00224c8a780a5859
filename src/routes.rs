use actix_identity::Identity;
use actix_session::Session;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use tera::Context;

use crate::{db, errors::AppError, export, structs::User, utils, AppState, TEMPLATES};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index_handler)
        .service(register_handler)
        .service(register_form_handler)
        .service(login_handler)
        .service(login_form_handler)
        .service(logout_handler)
        .service(dashboard_handler)
        .service(admin_handler)
        .service(promote_form_handler)
        .service(add_overtime_form_handler)
        .service(add_work_entry_form_handler)
        .service(export_handler);
}

fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location.to_owned()))
        .finish()
}

const FLASH_KEY: &str = "flash";

fn put_flash(session: &Session, message: &str) {
    if let Err(e) = session.insert(FLASH_KEY, message) {
        log::error!("Failed to store flash message: {}", e);
    }
}

fn take_flash(session: &Session) -> Option<String> {
    let message = session.get::<String>(FLASH_KEY).ok().flatten();
    if message.is_some() {
        session.remove(FLASH_KEY);
    }
    message
}

/// Resolve the session identity to a user row. A session whose id is
/// malformed or no longer matches a user is logged out and treated as
/// anonymous.
async fn current_user(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Option<User>, AppError> {
    let Some(identity) = identity else {
        return Ok(None);
    };
    let id = identity.id()?;
    let Ok(user_id) = id.parse::<i64>() else {
        log::warn!("Session carries a malformed user id: {}", id);
        identity.logout();
        return Ok(None);
    };
    match db::get_user_by_id(state, user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            log::warn!("Session user {} no longer exists, logging out", user_id);
            identity.logout();
            Ok(None)
        }
    }
}

fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template: {}", e);
        AppError::Template(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

#[get("/")]
pub async fn index_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    Ok(match current_user(&state, identity).await? {
        Some(_) => redirect_to("/dashboard"),
        None => redirect_to("/login"),
    })
}

#[get("/register")]
pub async fn register_handler(session: Session) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("title", "Register");
    context.insert("flash", &take_flash(&session));
    render("register.html", &context)
}

#[derive(Deserialize)]
pub struct RegisterForm {
    username: String,
    password: String,
    password2: String,
}

#[post("/register")]
pub async fn register_form_handler(
    web::Form(form): web::Form<RegisterForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() || form.password2.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if form.password != form.password2 {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    if form.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters long".into(),
        ));
    }

    if db::get_user_by_username(&state, username).await?.is_some() {
        put_flash(&session, "Username is already taken");
        return Ok(redirect_to("/register"));
    }

    // Self-registration never grants the admin flag; see the promote action.
    db::create_user(&state, username, &form.password, false).await?;

    Ok(redirect_to("/login"))
}

#[get("/login")]
pub async fn login_handler(session: Session) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("title", "Login");
    context.insert("flash", &take_flash(&session));
    render("login.html", &context)
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[post("/login")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    session: Session,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }

    let user = db::get_user_by_username(&state, form.username.trim()).await?;
    match user {
        Some(user) if utils::verify_password(&form.password, &user.pwd_hash) => {
            Identity::login(&request.extensions(), user.id.to_string())?;
            log::info!("User {} logged in", user.username);
            Ok(redirect_to("/dashboard"))
        }
        _ => {
            // One message for unknown user and wrong password alike.
            put_flash(&session, "Invalid login. Please try again.");
            Ok(redirect_to("/login"))
        }
    }
}

#[post("/logout")]
pub async fn logout_handler(identity: Option<Identity>) -> HttpResponse {
    if let Some(identity) = identity {
        identity.logout();
    }
    redirect_to("/login")
}

#[get("/dashboard")]
pub async fn dashboard_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };

    let periods = db::list_periods_with_entries(&state, user.id).await?;

    let mut context = Context::new();
    context.insert("title", "Dashboard");
    context.insert("username", &user.username);
    context.insert("is_admin", &user.is_admin);
    context.insert("periods", &periods);
    render("dashboard.html", &context)
}

#[get("/admin")]
pub async fn admin_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };
    if !user.is_admin {
        return Ok(redirect_to("/dashboard"));
    }

    let users = db::get_all_users(&state).await?;

    let mut context = Context::new();
    context.insert("title", "User Administration");
    context.insert("username", &user.username);
    context.insert("users", &users);
    render("admin.html", &context)
}

#[post("/admin/promote/{user_id}")]
pub async fn promote_form_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };
    if !user.is_admin {
        return Ok(redirect_to("/dashboard"));
    }

    let target_id = path.into_inner();
    match db::set_user_admin(&state, target_id).await? {
        Some(promoted) => {
            log::info!(
                "User {} promoted to admin by {}",
                promoted.username,
                user.username
            );
            Ok(redirect_to("/admin"))
        }
        None => Err(AppError::NotFound(format!("No user with id {}", target_id))),
    }
}

#[derive(Deserialize)]
pub struct AddOvertimeForm {
    date: String,
    start_time: String,
    end_time: String,
}

#[post("/add_overtime")]
pub async fn add_overtime_form_handler(
    web::Form(form): web::Form<AddOvertimeForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };

    let date = utils::parse_date(&form.date)?;
    let start_time = utils::parse_time(&form.start_time)?;
    let end_time = utils::parse_time(&form.end_time)?;

    db::create_overtime_period(&state, user.id, date, start_time, end_time).await?;

    Ok(redirect_to("/dashboard"))
}

#[derive(Deserialize)]
pub struct AddWorkEntryForm {
    entry_time: String,
    exit_time: String,
}

#[post("/add_work_entry/{overtime_period_id}")]
pub async fn add_work_entry_form_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<AddWorkEntryForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };

    let period_id = path.into_inner();
    let Some(period) = db::get_overtime_period_by_id(&state, period_id).await? else {
        return Err(AppError::NotFound(format!(
            "No overtime period with id {}",
            period_id
        )));
    };
    if period.user_id != user.id {
        log::warn!(
            "User {} tried to add an entry to period {} owned by user {}",
            user.id,
            period.id,
            period.user_id
        );
        return Err(AppError::Forbidden(
            "Overtime period belongs to another user".into(),
        ));
    }

    let entry_time = utils::parse_time(&form.entry_time)?;
    let exit_time = utils::parse_time(&form.exit_time)?;

    db::create_work_entry(&state, period.id, entry_time, exit_time).await?;

    Ok(redirect_to("/dashboard"))
}

#[get("/export")]
pub async fn export_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect_to("/login"));
    };

    let periods = db::list_periods_with_entries(&state, user.id).await?;
    let rows = export::flatten_report(&periods);
    let buffer = export::build_workbook(&rows)?;

    log::info!("Exporting {} rows for user {}", rows.len(), user.username);

    Ok(HttpResponse::Ok()
        .content_type(export::XLSX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", export::REPORT_FILENAME),
        ))
        .body(buffer))
}
