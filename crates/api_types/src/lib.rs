//! Request and response bodies exchanged with the SpendSmart backend.
//!
//! Field names follow the backend's JSON exactly: camelCase for transactions
//! and budgets, `DOB` for the date of birth and `created_at` on the user
//! record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier the backend assigns to a user.
pub type UserId = i32;

/// Identifier the backend assigns to a transaction.
pub type TransactionId = i32;

pub mod auth {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RegisterRequest {
        pub name: String,
        pub email: String,
        pub password: String,
        #[serde(rename = "DOB")]
        pub dob: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: UserId,
        pub name: String,
        pub email: String,
        #[serde(rename = "DOB")]
        pub dob: String,
        pub created_at: String,
    }

    /// Body of a successful login.
    ///
    /// `user` is optional on the wire: a backend answering 2xx without it is
    /// treated as a failed login by the client.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub token: String,
        pub user: Option<User>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum TransactionType {
        Income,
        Expense,
    }

    impl TransactionType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "Income",
                Self::Expense => "Expense",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        #[serde(rename = "transactionId")]
        pub id: TransactionId,
        pub user_id: UserId,
        pub category_id: i32,
        /// Signed amount; serialized as a JSON number.
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        /// Calendar date, `YYYY-MM-DD`.
        pub date: String,
        pub description: String,
        #[serde(rename = "type")]
        pub kind: TransactionType,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Budget {
        pub user_id: UserId,
        pub start_date: String,
        pub end_date: String,
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_uses_backend_field_names() {
        let tx = transaction::Transaction {
            id: 7,
            user_id: 1,
            category_id: 2,
            amount: Decimal::new(1250, 2),
            date: "2024-01-05".to_string(),
            description: "lunch".to_string(),
            kind: transaction::TransactionType::Expense,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["transactionId"], 7);
        assert_eq!(json["userId"], 1);
        assert_eq!(json["categoryId"], 2);
        assert_eq!(json["amount"], 12.5);
        assert_eq!(json["type"], "Expense");
    }

    #[test]
    fn register_request_keeps_uppercase_dob() {
        let req = auth::RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            password: "secret1".to_string(),
            dob: "1990-01-01".to_string(),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["DOB"], "1990-01-01");
        assert!(json.get("dob").is_none());
    }

    #[test]
    fn budget_accepts_integer_amounts() {
        let raw = r#"{"userId":3,"startDate":"2024-01-01","endDate":"2024-01-31","amount":500}"#;
        let budget: budget::Budget = serde_json::from_str(raw).unwrap();
        assert_eq!(budget.amount, Decimal::from(500));
        assert_eq!(budget.user_id, 3);
    }

    #[test]
    fn login_response_without_user_still_decodes() {
        let raw = r#"{"token":"abc"}"#;
        let res: auth::AuthResponse = serde_json::from_str(raw).unwrap();
        assert!(res.user.is_none());
    }
}
