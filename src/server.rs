// 🌐 Web Shell - the expense form served over HTTP
//
// Logged out: Register / Login. Logged in: Add Expense / View Report / Logout.
// Outcomes come back to `/` as `?msg=` or `?err=` flash parameters.

use crate::accounts::{self, UserId};
use crate::config::Config;
use crate::credentials;
use crate::error::{TrackerError, TrackerResult};
use crate::ledger::{self, ExpenseRow, NewExpense};
use crate::report;
use crate::session::SessionStore;
use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "expense_session";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    sessions: SessionStore,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            sessions: SessionStore::new(),
            config: Arc::new(config),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Logged-in user for this request
    fn current_user(&self, headers: &HeaderMap) -> TrackerResult<UserId> {
        session_token(headers)
            .and_then(|token| self.sessions.get(&token).current_user())
            .ok_or(TrackerError::NotLoggedIn)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub msg: Option<String>,
    pub err: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Amount arrives as text so a malformed number becomes a message, not a 422
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    pub date: String,
    pub item: String,
    pub amount: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ReportQuery {
    /// Normalised `(start, end)`; blank fields count as absent
    fn range(&self) -> TrackerResult<(Option<String>, Option<String>)> {
        ledger::normalize_range(self.start.as_deref(), self.end.as_deref())
    }
}

impl ExpenseForm {
    fn into_expense(self) -> TrackerResult<NewExpense> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|_| TrackerError::InvalidAmount(self.amount.clone()))?;
        Ok(NewExpense::new(self.date, self.item, amount))
    }
}

// ============================================================================
// Error responses
// ============================================================================

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        if self.is_user_error() {
            return redirect_with("err", &self.to_string()).into_response();
        }

        tracing::error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(page("Error", "<p class=\"err\">Something went wrong. Please try again.</p>")),
        )
            .into_response()
    }
}

fn redirect_with(kind: &str, message: &str) -> Redirect {
    Redirect::to(&format!("/?{}={}", kind, urlencoding::encode(message)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET / - menu for the current session
async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(flash): Query<Flash>,
) -> TrackerResult<Html<String>> {
    let mut body = String::new();

    if let Some(msg) = &flash.msg {
        body.push_str(&format!("<p class=\"msg\">{}</p>", escape_html(msg)));
    }
    if let Some(err) = &flash.err {
        body.push_str(&format!("<p class=\"err\">{}</p>", escape_html(err)));
    }

    match state.current_user(&headers) {
        Ok(user_id) => {
            let (name, recorded) = {
                let conn = state.db();
                let name = accounts::find_user(&conn, user_id)?
                    .map(|user| user.name)
                    .unwrap_or_default();
                (name, ledger::count_expenses(&conn, user_id)?)
            };
            body.push_str(&format!(
                "<p>✅ Logged in as <strong>{}</strong> ({} expenses recorded)</p>",
                escape_html(&name),
                recorded
            ));
            body.push_str(ACTION_MENU);
        }
        Err(_) => body.push_str(LOGIN_MENU),
    }

    Ok(Html(page("💸 Expense Tracker", &body)))
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> TrackerResult<Redirect> {
    accounts::register(&state.db(), &form.name, &form.email, &form.password)?;
    Ok(redirect_with("msg", "User registered successfully!"))
}

/// POST /login - always issues a fresh session token
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> TrackerResult<Response> {
    let user_id = credentials::authenticate(&state.db(), &form.email, &form.password)?;

    if let Some(previous) = session_token(&headers) {
        state.sessions.remove(&previous);
    }

    let token = state.sessions.create();
    let mut session = state.sessions.get(&token);
    session.login(user_id);
    state.sessions.update(&token, session);
    tracing::debug!(active_sessions = state.sessions.len(), "session started");

    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        redirect_with("msg", "Login successful!"),
    )
        .into_response())
}

/// POST /logout - drops the session and clears the cookie
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(mut session) = session_token(&headers).and_then(|t| state.sessions.remove(&t)) {
        if let Some(user_id) = session.current_user() {
            tracing::info!(user_id, "logged out");
        }
        session.logout();
    }

    let cookie = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// POST /expenses - Add Expense
async fn add_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ExpenseForm>,
) -> TrackerResult<Redirect> {
    let user_id = state.current_user(&headers)?;
    form.into_expense()?.save(&state.db(), user_id)?;
    Ok(redirect_with("msg", "Expense saved!"))
}

fn query_rows(
    state: &AppState,
    user_id: UserId,
    query: &ReportQuery,
) -> TrackerResult<Vec<ExpenseRow>> {
    let (start, end) = query.range()?;
    ledger::get_expenses(&state.db(), user_id, start.as_deref(), end.as_deref())
}

/// GET /report - View Report
async fn view_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> TrackerResult<Html<String>> {
    let user_id = state.current_user(&headers)?;
    let rows = query_rows(&state, user_id, &query)?;

    let mut body = String::from("<p><a href=\"/\">← Back</a></p>");
    if rows.is_empty() {
        body.push_str("<p class=\"warn\">No data found.</p>");
        return Ok(Html(page("Report", &body)));
    }

    let rendered = report::render(&rows, &state.config.currency_prefix);
    body.push_str("<h3>Report</h3><ul>");
    for line in rendered.body() {
        body.push_str(&format!("<li>{}</li>", escape_html(line)));
    }
    body.push_str("</ul>");

    let (start, end) = query.range()?;
    body.push_str(&format!(
        "<p><a href=\"/report.pdf?start={}&amp;end={}\">Download PDF</a></p>",
        urlencoding::encode(start.as_deref().unwrap_or_default()),
        urlencoding::encode(end.as_deref().unwrap_or_default()),
    ));

    tracing::info!(user_id, rows = rows.len(), "report viewed");
    Ok(Html(page("Report", &body)))
}

/// GET /report.pdf - PDF download
async fn download_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> TrackerResult<Response> {
    let user_id = state.current_user(&headers)?;
    let rows = query_rows(&state, user_id, &query)?;

    if rows.is_empty() {
        return Ok((StatusCode::NOT_FOUND, "No data found.").into_response());
    }

    let pdf = report::render(&rows, &state.config.currency_prefix).to_pdf();
    tracing::info!(user_id, rows = rows.len(), bytes = pdf.len(), "report generated");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.report_filename.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// GET /api/expenses - the user's rows as JSON
async fn list_expenses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Response {
    let user_id = match state.current_user(&headers) {
        Ok(id) => id,
        Err(e) => return (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
    };

    match query_rows(&state, user_id, &query) {
        Ok(rows) => (StatusCode::OK, Json(ApiResponse::ok(rows))).into_response(),
        Err(e) if e.is_user_error() => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses));

    Router::new()
        .route("/", get(index))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/expenses", post(add_expense))
        .route("/report", get(view_report))
        .route("/report.pdf", get(download_report))
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// ============================================================================
// HTML helpers
// ============================================================================

/// Read the session token from the Cookie header
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>.msg{{color:green}}.err{{color:#b00}}.warn{{color:#a60}}\
         form{{margin:1em 0}}label{{display:block}}</style></head>\
         <body><h1>{title}</h1>{body}</body></html>"
    )
}

const LOGIN_MENU: &str = r#"
<h2>Register</h2>
<form method="post" action="/register">
  <label>Name <input name="name" required></label>
  <label>Email <input name="email" required></label>
  <label>Password <input name="password" type="password" required></label>
  <button type="submit">Register</button>
</form>
<h2>Login</h2>
<form method="post" action="/login">
  <label>Email <input name="email" required></label>
  <label>Password <input name="password" type="password" required></label>
  <button type="submit">Login</button>
</form>
"#;

const ACTION_MENU: &str = r#"
<form method="post" action="/logout"><button type="submit">Logout</button></form>
<h2>Add Expense</h2>
<form method="post" action="/expenses">
  <label>Date <input name="date" type="date" required></label>
  <label>Item/Description <input name="item"></label>
  <label>Amount <input name="amount" type="number" min="0" step="0.01" value="0.00" required></label>
  <button type="submit">Save Expense</button>
</form>
<h2>View Report</h2>
<form method="get" action="/report">
  <label>Start Date <input name="start" type="date"></label>
  <label>End Date <input name="end" type="date"></label>
  <button type="submit">Generate Report</button>
</form>
"#;
