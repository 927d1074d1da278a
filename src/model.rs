use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Workflow status of an order. Any state may move to any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Translate the raw payment status stored by the checkout flow.
    /// Unknown or missing values fall back to `Pending`.
    pub fn from_payment_status(raw: Option<&str>) -> Self {
        let normalized = raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
        match normalized.as_str() {
            "processing" | "in_process" | "in_progress" => OrderStatus::Processing,
            "approved" | "paid" | "completed" => OrderStatus::Completed,
            "cancelled" | "canceled" | "refunded" | "rejected" | "charged_back" => {
                OrderStatus::Cancelled
            }
            _ => OrderStatus::Pending,
        }
    }

    /// Value written back into the payment status column.
    pub fn as_payment_status(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "approved",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status '{0}' (expected pending, processing, completed or cancelled)")]
pub struct ParseStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub images: Option<i64>,
}

/// One customer's restoration request.
///
/// `images[0]` is the original upload, `images[1]` the restored result.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub images: Vec<String>,
    pub plan: Plan,
    pub payment_fee: f64,
    pub real_profit: f64,
    pub delivery_methods: Vec<String>,
    pub image_count: Option<i64>,
    pub status: OrderStatus,
    pub notes: Option<String>,
}

impl Order {
    pub fn original_image_url(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn restored_image_url(&self) -> Option<&str> {
        self.images.get(1).map(String::as_str)
    }

    /// Apply a patch that the gateway accepted.
    pub fn apply(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        self.updated_at = patch.updated_at;
    }
}

/// A row of the orders table as the gateway returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    #[serde(deserialize_with = "de_lenient_string")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub order_number: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub image_url: Vec<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub image_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_lenient_string")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub plan_price: Option<f64>,
    #[serde(default)]
    pub plan_images: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub payment_fee: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub real_profit: Option<f64>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub delivery_method: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            status: OrderStatus::from_payment_status(row.payment_status.as_deref()),
            updated_at: row.updated_at.unwrap_or(row.created_at),
            id: row.id,
            order_number: row.order_number,
            created_at: row.created_at,
            name: row.name,
            email: row.email,
            phone: row.phone.filter(|p| !p.trim().is_empty()),
            images: row.image_url,
            plan: Plan {
                id: row.plan_id,
                name: row.plan_name,
                price: row.plan_price,
                images: row.plan_images,
            },
            payment_fee: row.payment_fee.unwrap_or(0.0),
            real_profit: row.real_profit.unwrap_or(0.0),
            delivery_methods: row.delivery_method,
            image_count: row.image_count,
            notes: row.notes,
        }
    }
}

/// Partial update sent to the gateway and applied locally on success.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderPatch {
    #[serde(
        rename = "payment_status",
        serialize_with = "ser_payment_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "image_url", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl OrderPatch {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            notes: None,
            images: None,
            updated_at,
        }
    }
}

/// Timestamp for the next mutation: the current time, but always strictly
/// after `previous` even when the clock has not advanced.
pub fn next_update_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn ser_payment_status<S>(status: &Option<OrderStatus>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match status {
        Some(st) => s.serialize_str(st.as_payment_status()),
        None => s.serialize_none(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

// Ids and order numbers may be stored as numbers; null becomes "".
fn de_lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(d)?
        .map(Scalar::into_string)
        .unwrap_or_default())
}

fn de_opt_lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
}

fn de_string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<Option<String>>),
    }
    Ok(match Option::<OneOrMany>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(items)) => items.into_iter().flatten().collect(),
    })
}

// Postgres numeric columns arrive either as JSON numbers or strings.
fn de_opt_amount<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Num(f64),
        Text(String),
    }
    match Option::<Amount>::deserialize(d)? {
        None => Ok(None),
        Some(Amount::Num(n)) => Ok(Some(n)),
        Some(Amount::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Amount::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_row() -> serde_json::Value {
        json!({
            "id": "9b1f",
            "created_at": "2025-03-02T14:05:00.123456+00:00",
            "name": "Ana Souza",
            "email": "ana@example.com",
            "phone": "+55 11 99999-0000",
            "image_url": [
                "https://proj.supabase.co/storage/v1/object/public/photos/ana/original.jpg",
                "https://proj.supabase.co/storage/v1/object/public/photos/ana/restored.jpg"
            ],
            "payment_status": "approved",
            "image_count": 1,
            "plan_id": 2,
            "plan_name": "Premium",
            "plan_price": "49.90",
            "plan_images": 3,
            "payment_fee": 2.5,
            "real_profit": 47.4,
            "delivery_method": ["email", "whatsapp"],
            "order_number": "PR-0001",
            "notes": null,
            "extra_column": true
        })
    }

    #[test]
    fn row_maps_into_order() {
        let row: OrderRow = serde_json::from_value(sample_row()).unwrap();
        let order = Order::from(row);
        assert_eq!(order.id, "9b1f");
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.plan.price, Some(49.9));
        assert_eq!(order.plan.id.as_deref(), Some("2"));
        assert_eq!(order.updated_at, order.created_at);
        assert_eq!(order.delivery_methods, vec!["email", "whatsapp"]);
        assert!(order.original_image_url().unwrap().ends_with("original.jpg"));
        assert!(order.restored_image_url().unwrap().ends_with("restored.jpg"));
    }

    #[test]
    fn sparse_row_gets_defaults() {
        let row: OrderRow = serde_json::from_value(json!({
            "id": 17,
            "created_at": "2025-01-01T00:00:00Z",
            "name": null,
            "email": "x@y.z",
            "image_url": null,
            "payment_fee": null,
            "phone": ""
        }))
        .unwrap();
        let order = Order::from(row);
        assert_eq!(order.id, "17");
        assert_eq!(order.name, "");
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.images.is_empty());
        assert!(order.original_image_url().is_none());
        assert_eq!(order.payment_fee, 0.0);
        assert!(order.phone.is_none());
    }

    #[test]
    fn payment_status_mapping_is_total() {
        assert_eq!(OrderStatus::from_payment_status(None), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_payment_status(Some("")), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_payment_status(Some("weird")), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_payment_status(Some(" PAID ")), OrderStatus::Completed);
        assert_eq!(OrderStatus::from_payment_status(Some("canceled")), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_payment_status(Some("in_process")), OrderStatus::Processing);
        for st in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_payment_status(Some(st.as_payment_status())), st);
        }
    }

    #[test]
    fn status_from_str_is_strict() {
        assert_eq!("Completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!("approved".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let mut patch = OrderPatch::new(ts);
        patch.status = Some(OrderStatus::Completed);
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body["payment_status"], "approved");
        assert!(body.get("notes").is_none());
        assert!(body.get("image_url").is_none());
        assert_eq!(body["updated_at"], "2025-05-01T12:00:00Z");
    }

    #[test]
    fn next_timestamp_is_strictly_increasing() {
        let prev = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        assert!(next_update_timestamp(prev, prev) > prev);
        assert!(next_update_timestamp(prev, prev - Duration::seconds(5)) > prev);
        let later = prev + Duration::seconds(1);
        assert_eq!(next_update_timestamp(prev, later), later);
    }
}
