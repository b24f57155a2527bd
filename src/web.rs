use actix_web::{web, App, HttpServer, HttpResponse, HttpRequest, ResponseError, middleware};
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use log::info;

use crate::error::SchedulerError;
use crate::schedule::calendar::WEEKDAY_NAMES;
use crate::schedule::{ContainerId, CopyCommand, CopyPlan, MonthKey, PoolFilter, ShiftTemplate, SlotKey, Token};
use crate::session::{Role, Session, SessionSettings};
use crate::store::ScheduleStore;

/// The admin editing session plus a copy plan awaiting confirmation
pub struct Workspace {
    pub session: Session,
    pub pending_copy: Option<CopyPlan>,
}

pub struct AppState {
    pub workspace: Mutex<Workspace>,
    pub store: Arc<dyn ScheduleStore>,
    pub template: ShiftTemplate,
    pub admin_password: String,
}

impl ResponseError for SchedulerError {
    fn status_code(&self) -> StatusCode {
        match self {
            SchedulerError::NotAuthorized => StatusCode::UNAUTHORIZED,
            SchedulerError::NotPublished { .. } | SchedulerError::ScheduleMissing { .. } => StatusCode::NOT_FOUND,
            SchedulerError::NotEditing | SchedulerError::UnsavedChanges | SchedulerError::StalePlan { .. } => {
                StatusCode::CONFLICT
            }
            SchedulerError::InvalidMonth { .. } | SchedulerError::InvalidDay(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({"success": false, "error": self.to_string()}))
    }
}

type ApiResult = Result<HttpResponse, SchedulerError>;

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    month: u32,
    year: i32,
}

#[derive(Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    confirm_discard: bool,
}

#[derive(Deserialize)]
pub struct DragStartRequest {
    item: String,
    source: String,
}

#[derive(Deserialize)]
pub struct DragEndRequest {
    target: Option<String>,
}

#[derive(Deserialize)]
pub struct FilterRequest {
    filter: PoolFilter,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    month_label: String,
    days: Vec<DayResponse>,
}

#[derive(Serialize)]
pub struct DayResponse {
    day: u32,
    weekday: String,
    shifts: Vec<ScheduleSlot>,
}

#[derive(Serialize)]
pub struct ScheduleSlot {
    time: String,
    staff: Vec<String>,
    is_empty: bool,
}

fn check_admin(req: &HttpRequest, state: &AppState) -> Result<(), SchedulerError> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if password == state.admin_password {
        Ok(())
    } else {
        Err(SchedulerError::NotAuthorized)
    }
}

fn session_json(workspace: &Workspace) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "session": workspace.session.view(),
        "pendingCopy": workspace.pending_copy.as_ref().map(|p| &p.prompt),
    }))
}

// Admin login endpoint
async fn admin_login(req: web::Json<LoginRequest>, state: web::Data<AppState>) -> ApiResult {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Err(SchedulerError::NotAuthorized)
    }
}

// Public read-only month view; only published months are visible
async fn get_schedule(path: web::Path<(i32, u32)>, state: web::Data<AppState>) -> ApiResult {
    let (year, month) = path.into_inner();
    let month = MonthKey::new(month, year)?;
    let schedule = state
        .store
        .get_schedule(month)
        .await?
        .filter(|s| s.published)
        .ok_or(SchedulerError::NotPublished { month: month.month(), year: month.year() })?;

    let days = (1..=month.days_in_month())
        .map(|day| {
            let shifts = state
                .template
                .windows_for_day(&month, day)
                .iter()
                .enumerate()
                .map(|(shift, window)| {
                    let staff: Vec<String> = schedule
                        .containers
                        .get(&ContainerId::Slot(SlotKey::new(day, shift as u32)))
                        .iter()
                        .map(|t| t.display_name().to_string())
                        .collect();
                    ScheduleSlot { time: window.clone(), is_empty: staff.is_empty(), staff }
                })
                .collect();
            DayResponse {
                day,
                weekday: WEEKDAY_NAMES[month.weekday_of(day as i32) as usize].to_string(),
                shifts,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ScheduleResponse { month_label: month.label(), days }))
}

async fn get_session(req: HttpRequest, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let workspace = state.workspace.lock().await;
    Ok(session_json(&workspace))
}

async fn navigate(req: HttpRequest, body: web::Json<NavigateRequest>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let month = MonthKey::new(body.month, body.year)?;
    let mut workspace = state.workspace.lock().await;
    workspace.session.navigate(month).await?;
    workspace.pending_copy = None;
    Ok(session_json(&workspace))
}

async fn toggle_edit(req: HttpRequest, body: web::Json<EditRequest>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    let outcome = workspace.session.toggle_edit_mode(body.confirm_discard).await?;
    if !workspace.session.is_edit_mode() {
        workspace.pending_copy = None;
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "outcome": outcome,
        "session": workspace.session.view(),
    })))
}

async fn drag_start(req: HttpRequest, body: web::Json<DragStartRequest>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    workspace.session.start_drag(Token::parse(&body.item), ContainerId::parse(&body.source))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn drag_end(req: HttpRequest, body: web::Json<DragEndRequest>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let target = body.target.as_deref().map(ContainerId::parse);
    let mut workspace = state.workspace.lock().await;
    let action = workspace.session.end_drag(target.as_ref())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "changed": action.mutates(),
        "session": workspace.session.view(),
    })))
}

async fn copy_plan(req: HttpRequest, body: web::Json<CopyCommand>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    let plan = workspace.session.plan_copy(body.into_inner()).await?;
    let response = serde_json::json!({
        "success": true,
        "prompt": plan.prompt,
        "targetDays": plan.target_days,
    });
    workspace.pending_copy = Some(plan);
    Ok(HttpResponse::Ok().json(response))
}

async fn copy_apply(req: HttpRequest, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    let written = match workspace.pending_copy.take() {
        Some(plan) => workspace.session.apply_copy(plan).await?,
        None => 0,
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "written": written,
        "session": workspace.session.view(),
    })))
}

async fn toggle_publish(req: HttpRequest, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    let published = workspace.session.toggle_publish().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "published": published})))
}

// Holding the workspace lock across the write keeps saves strictly one at a time
async fn save(req: HttpRequest, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    workspace.session.save().await?;
    Ok(session_json(&workspace))
}

async fn discard(req: HttpRequest, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    workspace.session.discard().await?;
    workspace.pending_copy = None;
    Ok(session_json(&workspace))
}

async fn set_filter(req: HttpRequest, body: web::Json<FilterRequest>, state: web::Data<AppState>) -> ApiResult {
    check_admin(&req, &state)?;
    let mut workspace = state.workspace.lock().await;
    workspace.session.set_pool_filter(body.filter);
    Ok(session_json(&workspace))
}

/// Builds the shared state: one admin session opened on `month`
pub async fn build_state(
    store: Arc<dyn ScheduleStore>,
    settings: SessionSettings,
    month: MonthKey,
    admin_password: String,
) -> Result<AppState, SchedulerError> {
    let template = settings.template.clone();
    let session = Session::open(store.clone(), Role::Admin, month, settings).await?;
    Ok(AppState {
        workspace: Mutex::new(Workspace { session, pending_copy: None }),
        store,
        template,
        admin_password,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/schedule/{year}/{month}", web::get().to(get_schedule))
        .route("/api/session", web::get().to(get_session))
        .route("/api/session/navigate", web::post().to(navigate))
        .route("/api/session/edit", web::post().to(toggle_edit))
        .route("/api/session/drag/start", web::post().to(drag_start))
        .route("/api/session/drag/end", web::post().to(drag_end))
        .route("/api/session/copy/plan", web::post().to(copy_plan))
        .route("/api/session/copy/apply", web::post().to(copy_apply))
        .route("/api/session/publish", web::post().to(toggle_publish))
        .route("/api/session/save", web::post().to(save))
        .route("/api/session/discard", web::post().to(discard))
        .route("/api/session/filter", web::post().to(set_filter));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);
    info!("Listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use crate::schedule::{SalesStaff, StaffType};
    use crate::store::MemoryStore;

    async fn app_state() -> web::Data<AppState> {
        let store = Arc::new(MemoryStore::with_staff(vec![SalesStaff {
            name: "Gio".to_string(),
            staff_type: StaffType::New,
            display_name: String::new(),
        }]));
        let month = MonthKey::new(3, 2024).unwrap();
        let state = build_state(store, SessionSettings::default(), month, "pw".to_string()).await.unwrap();
        web::Data::new(state)
    }

    #[actix_web::test]
    async fn admin_routes_require_the_password() {
        let app = test::init_service(App::new().app_data(app_state().await).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/session").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn drag_save_publish_then_public_read() {
        let app = test::init_service(App::new().app_data(app_state().await).configure(configure)).await;
        let post = |uri: &str, body: serde_json::Value| {
            test::TestRequest::post()
                .uri(uri)
                .insert_header(("X-Admin-Password", "pw"))
                .set_json(body)
                .to_request()
        };

        let resp = test::call_service(&app, post("/api/session/edit", serde_json::json!({}))).await;
        assert!(resp.status().is_success());
        let resp = test::call_service(
            &app,
            post("/api/session/drag/start", serde_json::json!({"item": "new:Gio", "source": "salespeople-list"})),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            post("/api/session/drag/end", serde_json::json!({"target": "5-0"})),
        )
        .await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["session"]["hasChanges"], true);

        let hidden = test::call_service(&app, test::TestRequest::get().uri("/api/schedule/2024/3").to_request()).await;
        assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, post("/api/session/save", serde_json::json!({}))).await;
        assert!(resp.status().is_success());
        let resp = test::call_service(&app, post("/api/session/publish", serde_json::json!({}))).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/schedule/2024/3").to_request()).await;
        assert_eq!(body["days"][4]["shifts"][0]["staff"][0], "Gio");
        assert_eq!(body["days"][4]["weekday"], "Tuesday");
    }

    #[actix_web::test]
    async fn copy_is_planned_then_applied() {
        let app = test::init_service(App::new().app_data(app_state().await).configure(configure)).await;
        let post = |uri: &str, body: serde_json::Value| {
            test::TestRequest::post()
                .uri(uri)
                .insert_header(("X-Admin-Password", "pw"))
                .set_json(body)
                .to_request()
        };

        test::call_service(&app, post("/api/session/edit", serde_json::json!({}))).await;
        test::call_service(
            &app,
            post("/api/session/drag/start", serde_json::json!({"item": "new:Gio", "source": "salespeople-list"})),
        )
        .await;
        test::call_service(&app, post("/api/session/drag/end", serde_json::json!({"target": "5-1"}))).await;

        let plan: serde_json::Value = test::call_and_read_body_json(
            &app,
            post("/api/session/copy/plan", serde_json::json!({"kind": "toFutureWeekdays", "day": 5})),
        )
        .await;
        assert_eq!(plan["targetDays"], serde_json::json!([12, 19, 26]));

        let applied: serde_json::Value =
            test::call_and_read_body_json(&app, post("/api/session/copy/apply", serde_json::json!({}))).await;
        assert_eq!(applied["written"], 3);
        assert_eq!(applied["session"]["containers"]["26-1"][0].as_str().map(|s| s.starts_with("new:Gio::")), Some(true));
    }
}
