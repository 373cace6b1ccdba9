//! Fund requests: asking another player for money.

use serde::{Deserialize, Serialize};

use crate::{Money, Player, ServerTime};

/// A pending ask for payment.
///
/// `from_id` is the requester, who receives the money once the request is
/// accepted; `to_id` is the asked player, who pays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    pub id: String,
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub to_name: String,
    pub amount: Money,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub timestamp: ServerTime,
}

impl FundRequest {
    pub fn new(
        id: impl Into<String>,
        requester: &Player,
        payer: &Player,
        amount: Money,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from_id: requester.id.clone(),
            from_name: requester.name.clone(),
            to_id: payer.id.clone(),
            to_name: payer.name.clone(),
            amount,
            remarks: remarks.into(),
            timestamp: ServerTime::Pending,
        }
    }
}
