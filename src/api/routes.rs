//! API Routes
//!
//! HTTP endpoint definitions under /api/v1/wallet.

use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    Balances, Currency, OperationContext, PageRequest, WalletError, WalletResponse,
};
use crate::error::AppError;
use crate::handlers::{
    CreateAccountCommand, DepositCommand, DepositResult, TransferCommand, TransferResult,
};
use crate::query::{AccountProfile, AccountSummary, TransactionHistory};

use super::middleware::{identity_middleware, RequestUser};
use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub firstname: String,
    pub surname: String,
    #[serde(default)]
    pub othernames: Option<String>,
    pub email: String,
    pub phonenumber: String,
}

#[derive(Deserialize)]
pub struct CreatePinRequest {
    #[serde(default)]
    pub pin: Value,
}

/// `amount` may be a JSON number or a numeric string
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    #[serde(default)]
    pub amount: Value,
    pub wallet: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub receiver_account_number: Value,
    #[serde(default)]
    pub amount: Value,
    pub wallet: String,
    #[serde(default)]
    pub pin: Value,
}

/// Page parameters are parsed leniently: anything unusable means "default"
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl HistoryQuery {
    fn page_request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<u32>().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Wallet routes; everything except signup requires a caller identity
pub fn wallet_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/create-pin", post(create_pin))
        .route("/account-balance", get(account_balance))
        .route("/deposit-funds", patch(deposit_funds))
        .route("/transfer-funds", patch(transfer_funds))
        .route("/account-summary", get(account_summary))
        .route("/transactions-history", get(transactions_history))
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .route("/signup", post(signup))
        .merge(protected)
}

// =========================================================================
// Body helpers
// =========================================================================

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

/// Numbers and strings both become their textual form
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount_text(value: &Value) -> Result<String, AppError> {
    scalar_text(value)
        .ok_or_else(|| WalletError::InvalidAmount("amount must be a number".to_string()).into())
}

fn parse_wallet(raw: &str) -> Result<Currency, AppError> {
    raw.parse::<Currency>()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

// =========================================================================
// POST /signup
// =========================================================================

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<WalletResponse<AccountProfile>, AppError> {
    let request = body(payload)?;

    require("firstname", &request.firstname)?;
    require("surname", &request.surname)?;
    require("phonenumber", &request.phonenumber)?;
    require("email", &request.email)?;
    if !request.email.contains('@') {
        return Err(AppError::InvalidRequest("email is not valid".to_string()));
    }

    let mut command = CreateAccountCommand::new(
        request.firstname,
        request.surname,
        request.email,
        request.phonenumber,
    );
    if let Some(othernames) = request.othernames {
        command = command.with_othernames(othernames);
    }

    let context = OperationContext::new();
    Ok(state.accounts.execute(command, &context).await?)
}

// =========================================================================
// POST /create-pin
// =========================================================================

async fn create_pin(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
    payload: Result<Json<CreatePinRequest>, JsonRejection>,
) -> Result<WalletResponse<()>, AppError> {
    let request = body(payload)?;
    let pin = scalar_text(&request.pin).ok_or(WalletError::InvalidPinFormat)?;

    Ok(state.guard.set_pin(user.account_id, &pin).await?)
}

// =========================================================================
// GET /account-balance
// =========================================================================

async fn account_balance(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
) -> Result<WalletResponse<Balances>, AppError> {
    Ok(state.query.balance(user.account_id).await?)
}

// =========================================================================
// PATCH /deposit-funds
// =========================================================================

async fn deposit_funds(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<WalletResponse<DepositResult>, AppError> {
    let request = body(payload)?;
    let amount = amount_text(&request.amount)?;
    let currency = parse_wallet(&request.wallet)?;

    let command = DepositCommand::new(user.account_id, currency, amount);
    Ok(state.deposits.execute(command, &context).await?)
}

// =========================================================================
// PATCH /transfer-funds
// =========================================================================

async fn transfer_funds(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<WalletResponse<TransferResult>, AppError> {
    let request = body(payload)?;
    let amount = amount_text(&request.amount)?;
    let currency = parse_wallet(&request.wallet)?;
    let receiver = scalar_text(&request.receiver_account_number).unwrap_or_default();
    // An absent pin can never verify; let the guard decide
    let pin = scalar_text(&request.pin).unwrap_or_default();

    let command = TransferCommand::new(user.account_id, receiver, currency, amount, pin);
    Ok(state.transfers.execute(command, &context).await?)
}

// =========================================================================
// GET /account-summary
// =========================================================================

async fn account_summary(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
) -> Result<WalletResponse<AccountSummary>, AppError> {
    Ok(state.query.summary(user.account_id).await?)
}

// =========================================================================
// GET /transactions-history
// =========================================================================

async fn transactions_history(
    State(state): State<AppState>,
    Extension(user): Extension<RequestUser>,
    query: Option<Query<HistoryQuery>>,
) -> Result<WalletResponse<TransactionHistory>, AppError> {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    Ok(state
        .query
        .history(user.account_id, params.page_request())
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transfer_request_deserialize() {
        let json = r#"{
            "receiverAccountNumber": "1234567890",
            "amount": 100.5,
            "wallet": "NairaWallet",
            "pin": "1234"
        }"#;

        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(scalar_text(&request.amount).as_deref(), Some("100.5"));
        assert_eq!(scalar_text(&request.pin).as_deref(), Some("1234"));
        assert_eq!(
            scalar_text(&request.receiver_account_number).as_deref(),
            Some("1234567890")
        );
    }

    #[test]
    fn test_amount_text_rejects_non_scalars() {
        assert!(amount_text(&json!("250")).is_ok());
        assert!(amount_text(&json!(250)).is_ok());
        for bad in [json!(null), json!(true), json!([1]), json!({"v": 1})] {
            assert!(matches!(
                amount_text(&bad),
                Err(AppError::Wallet(WalletError::InvalidAmount(_)))
            ));
        }
    }

    #[test]
    fn test_history_query_is_lenient() {
        let query = HistoryQuery {
            page: Some("2".to_string()),
            limit: Some("abc".to_string()),
        };
        let req = query.page_request();
        assert_eq!(req.page(), 2);
        assert_eq!(req.limit(), 6);

        assert_eq!(HistoryQuery::default().page_request(), PageRequest::default());
    }

    #[test]
    fn test_parse_wallet() {
        assert_eq!(parse_wallet("DollarWallet").unwrap(), Currency::DollarWallet);
        assert!(matches!(
            parse_wallet("EuroWallet"),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
