// Backend Models
//
// Wire shapes of the gifting backend's responses. Only the fields the
// dashboard reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gifts::status::{GiftSlotStatus, lenient_snapshot};

/// Response of `/loginform`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Generic `{ success, data, error }` envelope used by `/giftslotstatus`
#[derive(Debug, Deserialize)]
pub struct DataEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A linked third-party game account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAccount {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub pavos: i64,
    #[serde(default)]
    pub remaining_gifts: i64,
    #[serde(default, deserialize_with = "lenient_snapshot")]
    pub gift_slot_status: Option<GiftSlotStatus>,
}

/// Response of `/fortniteaccountsofuser` and `/allfortniteaccounts`
#[derive(Debug, Deserialize)]
pub struct AccountsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "gameAccounts")]
    pub game_accounts: Option<Vec<GameAccount>>,
}

/// A completed gift transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct Transaction {
    #[serde(rename(deserialize = "ID"))]
    pub id: String,
    #[serde(rename(deserialize = "GameAccountID"))]
    pub game_account_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, rename(deserialize = "ReceiverID"))]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(rename(deserialize = "ObjectStoreID"))]
    pub object_store_id: String,
    #[serde(default)]
    pub object_store_name: String,
    #[serde(default)]
    pub regular_price: f64,
    #[serde(default)]
    pub final_price: f64,
    #[serde(default)]
    pub gift_image: String,
    pub created_at: String,
}

/// Response of `/transactions`
#[derive(Debug, Deserialize)]
pub struct TransactionsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// An operator account of the dashboard itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct OperatorUser {
    #[serde(rename(deserialize = "ID"))]
    pub id: Value,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accounts_tolerate_broken_gift_status() {
        let envelope: AccountsEnvelope = serde_json::from_value(json!({
            "success": true,
            "gameAccounts": [
                {
                    "id": "a1",
                    "displayName": "Rex",
                    "pavos": 1200,
                    "remainingGifts": 3,
                    "giftSlotStatus": {
                        "remaining_gifts": 3,
                        "max_gifts": 5,
                        "used_gifts": 2,
                        "next_slot_available": "2030-01-01T00:00:00Z",
                        "time_until_next_slot": "3h"
                    }
                },
                { "id": "a2", "displayName": "Nova", "giftSlotStatus": { "remaining_gifts": "lots" } }
            ]
        }))
        .unwrap();

        let accounts = envelope.game_accounts.unwrap();
        assert_eq!(accounts[0].gift_slot_status.as_ref().unwrap().used_gifts, 2);
        assert_eq!(accounts[1].gift_slot_status, None);
        assert_eq!(accounts[1].pavos, 0);
    }

    #[test]
    fn transactions_map_pascal_case_keys() {
        let envelope: TransactionsEnvelope = serde_json::from_value(json!({
            "success": true,
            "transactions": [{
                "ID": "t1",
                "GameAccountID": "a1",
                "SenderName": "Rex",
                "ReceiverID": "r9",
                "ReceiverName": null,
                "ObjectStoreID": "item-1",
                "ObjectStoreName": "Glider",
                "RegularPrice": 800,
                "FinalPrice": 640,
                "GiftImage": "https://img.example/glider.png",
                "CreatedAt": "2025-06-01T10:00:00Z"
            }]
        }))
        .unwrap();

        let tx = &envelope.transactions[0];
        assert_eq!(tx.game_account_id, "a1");
        assert_eq!(tx.receiver_name, None);

        let rendered = serde_json::to_value(tx).unwrap();
        assert_eq!(rendered["objectStoreName"], "Glider");
        assert_eq!(rendered["finalPrice"], 640.0);
    }

    #[test]
    fn operator_users_accept_numeric_ids() {
        let users: Vec<OperatorUser> = serde_json::from_value(json!([
            { "ID": 3, "Username": "mod", "Email": null, "CreatedAt": "2025-01-01" }
        ]))
        .unwrap();
        assert_eq!(users[0].username, "mod");
        assert_eq!(users[0].id, json!(3));
    }
}
