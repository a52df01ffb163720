//! Row API for the employees collection
//!
//! Access scope: a caller only sees and touches rows whose `user_id` is
//! their own. Anonymous reads return nothing; anonymous writes get 401.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Employee, EmployeePayload};

use crate::auth::Caller;
use crate::state::AppState;

type Params = HashMap<String, String>;

fn check_table(state: &AppState, table: &str) -> AppResult<()> {
    if table != state.config.table {
        return Err(AppError::not_found(format!("relation {}", table)));
    }
    Ok(())
}

/// `id=eq.<value>` filter, required on update and delete
fn id_filter(params: &Params) -> AppResult<&str> {
    let raw = params
        .get("id")
        .ok_or_else(|| AppError::invalid_request("An id=eq.<id> filter is required"))?;
    raw.strip_prefix("eq.")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::invalid_request(format!("Unsupported filter: id={}", raw)))
}

fn validate_required_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::required(field));
    }
    Ok(())
}

fn validate_payload(payload: &EmployeePayload) -> AppResult<()> {
    validate_required_text(&payload.name, "name")?;
    validate_required_text(&payload.email, "email")?;
    validate_required_text(&payload.designation, "designation")?;
    validate_required_text(&payload.department, "department")?;
    if payload.salary < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::EmployeeInvalidSalary,
            "salary must not be negative",
        ));
    }
    Ok(())
}

fn check_writes(state: &AppState) -> AppResult<()> {
    if state.fail_writes() {
        return Err(AppError::database("write rejected (fault injection)"));
    }
    Ok(())
}

/// GET /rest/v1/{table}?select=*&order=created_at.desc
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    caller: Caller,
    Query(params): Query<Params>,
) -> AppResult<Json<Vec<Employee>>> {
    check_table(&state, &table)?;
    if state.fail_reads() {
        return Err(AppError::database("read rejected (fault injection)"));
    }
    let Some(user_id) = caller.user_id() else {
        return Ok(Json(Vec::new()));
    };

    let mut rows: Vec<Employee> = state
        .read_rows()
        .iter()
        .filter(|e| e.user_id == user_id)
        .cloned()
        .collect();
    match params.get("order").map(String::as_str) {
        None => {}
        Some("created_at.desc") => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some("created_at.asc") => rows.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        Some(other) => {
            return Err(AppError::invalid_request(format!("Unsupported order: {}", other)));
        }
    }
    tracing::debug!(user_id, count = rows.len(), "Listed employees");
    Ok(Json(rows))
}

/// POST /rest/v1/{table}, body is an array of rows
pub async fn insert(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    caller: Caller,
    Json(payloads): Json<Vec<EmployeePayload>>,
) -> AppResult<(StatusCode, Json<Vec<Employee>>)> {
    check_table(&state, &table)?;
    let (user_id, _) = caller.require_user()?;
    check_writes(&state)?;

    for payload in &payloads {
        validate_payload(payload)?;
        if payload.user_id != user_id {
            return Err(AppError::permission_denied(
                "new row violates row-level access policy",
            ));
        }
    }

    let created: Vec<Employee> = payloads
        .into_iter()
        .map(|p| Employee {
            id: uuid::Uuid::new_v4().to_string(),
            name: p.name,
            email: p.email,
            designation: p.designation,
            department: p.department,
            salary: p.salary,
            date_of_joining: p.date_of_joining,
            last_day_of_working: p.last_day_of_working,
            user_id: p.user_id,
            created_at: state.next_created_at(),
        })
        .collect();
    state.write_rows().extend(created.iter().cloned());
    tracing::info!(user_id, count = created.len(), "Inserted employees");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /rest/v1/{table}?id=eq.<id>, full overwrite
///
/// Nothing in scope matching returns an empty array.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    caller: Caller,
    Query(params): Query<Params>,
    Json(payload): Json<EmployeePayload>,
) -> AppResult<Json<Vec<Employee>>> {
    check_table(&state, &table)?;
    let (user_id, _) = caller.require_user()?;
    let id = id_filter(&params)?;
    check_writes(&state)?;
    validate_payload(&payload)?;

    let mut rows = state.write_rows();
    let Some(row) = rows
        .iter_mut()
        .find(|e| e.id == id && e.user_id == user_id)
    else {
        return Ok(Json(Vec::new()));
    };
    if payload.user_id != row.user_id {
        return Err(AppError::new(ErrorCode::OwnerImmutable).with_detail("id", id));
    }

    row.name = payload.name;
    row.email = payload.email;
    row.designation = payload.designation;
    row.department = payload.department;
    row.salary = payload.salary;
    row.date_of_joining = payload.date_of_joining;
    row.last_day_of_working = payload.last_day_of_working;
    tracing::info!(user_id, id, "Updated employee");
    Ok(Json(vec![row.clone()]))
}

/// DELETE /rest/v1/{table}?id=eq.<id>, returns the removed rows
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    caller: Caller,
    Query(params): Query<Params>,
) -> AppResult<Json<Vec<Employee>>> {
    check_table(&state, &table)?;
    let (user_id, _) = caller.require_user()?;
    let id = id_filter(&params)?;
    check_writes(&state)?;

    let mut rows = state.write_rows();
    let mut removed = Vec::new();
    rows.retain(|e| {
        if e.id == id && e.user_id == user_id {
            removed.push(e.clone());
            false
        } else {
            true
        }
    });
    tracing::info!(user_id, id, removed = removed.len(), "Deleted employees");
    Ok(Json(removed))
}
