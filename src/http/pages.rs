//! Server-rendered HTML pages.

use chrono::NaiveDate;

use crate::domain::model::{DailyTrade, DashboardSummary, User};

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title} - Trade Journal</title>
</head>
<body>
  <h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

fn credentials_form(action: &str, submit: &str) -> String {
    format!(
        r#"  <form method="post" action="{action}">
    <label>Username <input name="username" required></label>
    <label>Password <input name="password" type="password" required></label>
    <button type="submit">{submit}</button>
  </form>"#
    )
}

pub fn register() -> String {
    layout("Register", &credentials_form("/register", "Create account"))
}

pub fn login() -> String {
    layout("Login", &credentials_form("/login", "Log in"))
}

pub fn daily(day: NaiveDate, record: Option<&DailyTrade>) -> String {
    let (profit, loss, reason_profit, reason_loss) = match record {
        Some(r) => (
            r.profit.to_string(),
            r.loss.to_string(),
            escape_html(&r.reason_profit),
            escape_html(&r.reason_loss),
        ),
        None => ("0.00".to_string(), "0.00".to_string(), String::new(), String::new()),
    };

    let body = format!(
        r#"  <form method="post" action="/daily/{day}">
    <label>Profit <input name="profit" value="{profit}"></label>
    <label>Loss <input name="loss" value="{loss}"></label>
    <label>Why it worked <textarea name="reason_profit">{reason_profit}</textarea></label>
    <label>What went wrong <textarea name="reason_loss">{reason_loss}</textarea></label>
    <button type="submit">Save</button>
  </form>"#,
        day = day.format("%Y-%m-%d"),
    );

    layout(&format!("Trades for {}", day.format("%Y-%m-%d")), &body)
}

pub fn dashboard(user: &User, summary: &DashboardSummary) -> String {
    let body = format!(
        r#"  <p>Signed in as {username}</p>
  <table>
    <tr><th>Active balance</th><td>{balance}</td></tr>
    <tr><th>Deposits</th><td>{deposits}</td></tr>
    <tr><th>Withdrawals</th><td>{withdrawals}</td></tr>
    <tr><th>Total P/L</th><td>{total_pl}</td></tr>
  </table>
  <h2>Tips</h2>
  <pre>{tips}</pre>
  <h2>Lessons</h2>
  <pre>{lessons}</pre>"#,
        username = escape_html(&user.username),
        balance = summary.active_balance,
        deposits = summary.deposit_amount,
        withdrawals = summary.withdraw_amount,
        total_pl = summary.total_pl,
        tips = escape_html(&summary.tips),
        lessons = escape_html(&summary.lessons),
    );

    layout("Dashboard", &body)
}
