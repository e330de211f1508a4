use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;

use crate::advisor::{lessons_prompt, tips_prompt};
use crate::domain::model::{DailyTradeInput, DashboardSummary, Money, TransactionKind, User};
use crate::http::auth::AuthUser;
use crate::http::{pages, AppState};
use crate::utils::error::{JournalError, Result};

type FormFields = HashMap<String, String>;

pub const BAD_CREDENTIALS_MESSAGE: &str = "Bad credentials";

fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn required<'a>(form: &'a FormFields, field: &str) -> Result<&'a str> {
    form.get(field)
        .map(String::as_str)
        .ok_or_else(|| JournalError::ValidationError {
            message: format!("missing form field '{}'", field),
        })
}

fn parse_day(day: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| JournalError::ValidationError {
        message: format!("invalid date '{}', expected YYYY-MM-DD", day),
    })
}

/// 空白欄位視為 0
fn optional_money(field: &str, value: &str) -> Result<Money> {
    if value.trim().is_empty() {
        Ok(Money::ZERO)
    } else {
        Money::parse(field, value)
    }
}

pub async fn health(State(state): State<AppState>) -> Response {
    let check = async {
        let tables = state.store.table_names().await?;
        let user_count = state.store.count_users().await?;
        Ok::<_, JournalError>((tables, user_count))
    };

    match check.await {
        Ok((tables, user_count)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": { "tables": tables, "user_count": user_count }
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("❌ Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn index() -> Response {
    found("/dashboard")
}

pub async fn register_page() -> Html<String> {
    Html(pages::register())
}

pub async fn register(State(state): State<AppState>, Form(form): Form<FormFields>) -> Result<Response> {
    let username = required(&form, "username")?.trim();
    let password = required(&form, "password")?;
    if username.is_empty() || password.is_empty() {
        return Err(JournalError::ValidationError {
            message: "username and password are required".to_string(),
        });
    }

    let user = state
        .store
        .create_user(username, &User::hash_password(password))
        .await?;
    tracing::info!("👤 Registered user {} (id {})", user.username, user.id);

    Ok(found("/login"))
}

pub async fn login_page() -> Html<String> {
    Html(pages::login())
}

pub async fn login(State(state): State<AppState>, Form(form): Form<FormFields>) -> Result<Response> {
    let username = required(&form, "username")?.trim();
    let password = required(&form, "password")?;

    let user = state
        .store
        .find_user_by_name(username)
        .await?
        .filter(|u| u.check_password(password))
        .ok_or_else(|| JournalError::AuthError {
            message: BAD_CREDENTIALS_MESSAGE.to_string(),
        })?;

    let token = state.tokens.issue(user.id)?;
    tracing::debug!("Issued token for user {}", user.id);

    Ok(Json(json!({ "token": token })).into_response())
}

async fn record_transaction(
    state: &AppState,
    user: &User,
    kind: TransactionKind,
    form: &FormFields,
) -> Result<Response> {
    let amount = Money::parse("amount", required(form, "amount")?)?;
    if amount.cents() <= 0 {
        return Err(JournalError::ValidationError {
            message: "amount must be greater than zero".to_string(),
        });
    }

    state.store.add_transaction(user.id, kind, amount).await?;
    tracing::info!("💰 {} of {} for user {}", kind.as_str(), amount, user.id);

    Ok(Json(json!({ "status": "ok" })).into_response())
}

pub async fn deposit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<FormFields>,
) -> Result<Response> {
    record_transaction(&state, &user, TransactionKind::Deposit, &form).await
}

pub async fn withdraw(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<FormFields>,
) -> Result<Response> {
    record_transaction(&state, &user, TransactionKind::Withdraw, &form).await
}

pub async fn daily_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(day): Path<String>,
) -> Result<Html<String>> {
    let date = parse_day(&day)?;
    let record = state.store.daily_trade(user.id, date).await?;
    Ok(Html(pages::daily(date, record.as_ref())))
}

pub async fn save_daily(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(day): Path<String>,
    Form(form): Form<FormFields>,
) -> Result<Response> {
    let date = parse_day(&day)?;
    let input = DailyTradeInput {
        profit: optional_money("profit", required(&form, "profit")?)?,
        loss: optional_money("loss", required(&form, "loss")?)?,
        reason_profit: required(&form, "reason_profit")?.to_string(),
        reason_loss: required(&form, "reason_loss")?.to_string(),
    };

    state.store.upsert_daily_trade(user.id, date, &input).await?;
    tracing::info!("📝 Saved trades for user {} on {}", user.id, date);

    Ok(found("/dashboard"))
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
) -> Result<Response> {
    let (deposits, withdrawals) = state.store.transaction_totals(user.id).await?;
    let (profit, loss) = state.store.pl_totals(user.id).await?;
    let trades = state.store.daily_trades(user.id).await?;

    let profit_reasons = trades
        .iter()
        .map(|t| t.reason_profit.as_str())
        .filter(|r| !r.trim().is_empty());
    let loss_reasons = trades
        .iter()
        .map(|t| t.reason_loss.as_str())
        .filter(|r| !r.trim().is_empty());

    let tips_request = tips_prompt(profit_reasons);
    let lessons_request = lessons_prompt(loss_reasons);
    let (tips, lessons) = tokio::join!(
        state.advisor.advise(&tips_request),
        state.advisor.advise(&lessons_request)
    );

    let summary = DashboardSummary::compute(deposits, withdrawals, profit, loss, tips, lessons);

    if wants_json(&headers) {
        Ok(Json(summary).into_response())
    } else {
        Ok(Html(pages::dashboard(&user, &summary)).into_response())
    }
}
