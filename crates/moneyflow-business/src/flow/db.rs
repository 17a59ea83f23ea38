//! Storage-layer income and expense record.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use moneyflow_store::Record;
use serde::{Deserialize, Serialize};

use super::models::Flow;
use super::FlowKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct FlowRecord<K> {
    pub(crate) flow_id: String,
    pub(crate) user_id: String,
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) currency: String,
    pub(crate) amount: i64,
    pub(crate) reoccurrence: i64,
    pub(crate) duration: i64,
    pub(crate) reoccurrence_type: String,
    pub(crate) duration_type: String,
    pub(crate) date_created: DateTime<Utc>,
    pub(crate) date_updated: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) kind: PhantomData<fn() -> K>,
}

impl<K: FlowKind> Record for FlowRecord<K> {
    const TABLE: &'static str = K::TABLE;

    fn id(&self) -> &str {
        &self.flow_id
    }
}

impl<K> From<FlowRecord<K>> for Flow {
    fn from(record: FlowRecord<K>) -> Self {
        Self {
            id: record.flow_id,
            name: record.name,
            category: record.category,
            currency: record.currency,
            amount: record.amount,
            reoccurrence: record.reoccurrence,
            duration: record.duration,
            reoccurrence_type: record.reoccurrence_type,
            duration_type: record.duration_type,
            user_id: record.user_id,
            date_created: record.date_created,
            date_updated: record.date_updated,
        }
    }
}
